pub mod color;
pub mod geometry;
pub mod units;

pub use color::Color;
pub use geometry::{Padding, Position, Rect, Size};
pub use units::{mm2pt, pt2mm, pt2px, px2mm};
