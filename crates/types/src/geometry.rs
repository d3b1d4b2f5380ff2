use serde::{Deserialize, Serialize};

/// A top-left anchored point. Template positions are in millimetres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn zero() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn center(&self) -> Position {
        Position::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Shrinks the rectangle by `inset` on every side, never below zero size.
    pub fn inset(&self, inset: f64) -> Rect {
        Rect {
            x: self.x + inset,
            y: self.y + inset,
            width: (self.width - 2.0 * inset).max(0.0),
            height: (self.height - 2.0 * inset).max(0.0),
        }
    }

    /// Largest rectangle with the given aspect ratio that fits inside `self`,
    /// centred on both axes.
    pub fn fit_contain(&self, intrinsic: Size) -> Rect {
        if intrinsic.width <= 0.0 || intrinsic.height <= 0.0 {
            return *self;
        }
        let scale = (self.width / intrinsic.width).min(self.height / intrinsic.height);
        let width = intrinsic.width * scale;
        let height = intrinsic.height * scale;
        Rect {
            x: self.x + (self.width - width) / 2.0,
            y: self.y + (self.height - height) / 2.0,
            width,
            height,
        }
    }

    pub fn scaled(&self, factor: f64) -> Rect {
        Rect {
            x: self.x * factor,
            y: self.y * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }
}

/// Page padding in millimetres, serialized as `[top, right, bottom, left]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Padding {
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

impl From<[f64; 4]> for Padding {
    fn from([top, right, bottom, left]: [f64; 4]) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

impl From<Padding> for [f64; 4] {
    fn from(p: Padding) -> Self {
        [p.top, p.right, p.bottom, p.left]
    }
}
