//! Conversions between the three measurement spaces used by the pipeline.
//!
//! Templates are authored in millimetres, output sinks consume PDF points and
//! preview surfaces work in device pixels. Every conversion is a plain
//! multiplication, total over all reals: negative and zero inputs pass through
//! without clamping.

/// Points per millimetre (72 pt per inch, 25.4 mm per inch).
pub const MM_TO_PT_RATIO: f64 = 72.0 / 25.4;

/// Millimetres per point.
pub const PT_TO_MM_RATIO: f64 = 25.4 / 72.0;

/// CSS pixels per point, the default scale for pixel conversions.
pub const PT_TO_PX_RATIO: f64 = 96.0 / 72.0;

pub fn mm2pt(mm: f64) -> f64 {
    mm * MM_TO_PT_RATIO
}

pub fn pt2mm(pt: f64) -> f64 {
    pt / MM_TO_PT_RATIO
}

/// Converts points to pixels at the given scale factor.
pub fn pt2px(pt: f64, scale: f64) -> f64 {
    pt * scale
}

/// Inverse of `mm -> pt -> px` at the given scale factor.
pub fn px2mm(px: f64, scale: f64) -> f64 {
    pt2mm(px / scale)
}
