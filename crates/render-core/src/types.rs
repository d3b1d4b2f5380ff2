use std::sync::Arc;
use stencil_types::{Color, Position, Rect};

/// One line of text, positioned by its left edge and baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub font: String,
    /// Always in points, never scaled with the geometry.
    pub size: f64,
    pub color: Color,
    pub x: f64,
    pub baseline: f64,
    /// Extra space between characters, in points.
    pub char_spacing: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapeStyle {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
}

impl ShapeStyle {
    pub fn filled(color: Color) -> Self {
        Self {
            fill: Some(color),
            ..Default::default()
        }
    }

    pub fn stroked(color: Color, width: f64) -> Self {
        Self {
            stroke: Some(color),
            stroke_width: width,
            ..Default::default()
        }
    }

    pub fn is_visible(&self) -> bool {
        self.fill.is_some() || (self.stroke.is_some() && self.stroke_width > 0.0)
    }
}

/// A grid of dark/light modules (QR codes, linear barcodes).
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub rect: Rect,
    pub columns: usize,
    pub rows: usize,
    /// Row-major, `true` for a dark module.
    pub modules: Vec<bool>,
    pub color: Color,
    pub background: Option<Color>,
}

impl Bitmap {
    pub fn is_dark(&self, column: usize, row: usize) -> bool {
        self.modules
            .get(row * self.columns + column)
            .copied()
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Text(TextRun),
    /// Encoded PNG or JPEG bytes stretched over `rect`.
    Image { bytes: Arc<Vec<u8>>, rect: Rect },
    Line {
        from: Position,
        to: Position,
        width: f64,
        color: Color,
    },
    Rectangle {
        rect: Rect,
        style: ShapeStyle,
        radius: f64,
    },
    Ellipse { rect: Rect, style: ShapeStyle },
    Bitmap(Bitmap),
}

/// Clockwise rotation about a pivot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    pub degrees: f64,
    pub pivot: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawOp {
    pub primitive: Primitive,
    pub opacity: f64,
    pub rotation: Option<Rotation>,
}

impl DrawOp {
    pub fn new(primitive: Primitive) -> Self {
        Self {
            primitive,
            opacity: 1.0,
            rotation: None,
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Rotates about `pivot`. A zero angle leaves the op unrotated.
    pub fn rotated(mut self, degrees: f64, pivot: Position) -> Self {
        self.rotation = (degrees % 360.0 != 0.0).then_some(Rotation { degrees, pivot });
        self
    }

    /// Scales every coordinate and length by `factor`. Font sizes and
    /// character spacing are already in points and stay as they are.
    pub fn scaled(&self, factor: f64) -> DrawOp {
        let point = |p: &Position| Position::new(p.x * factor, p.y * factor);
        let primitive = match &self.primitive {
            Primitive::Text(run) => Primitive::Text(TextRun {
                x: run.x * factor,
                baseline: run.baseline * factor,
                ..run.clone()
            }),
            Primitive::Image { bytes, rect } => Primitive::Image {
                bytes: Arc::clone(bytes),
                rect: rect.scaled(factor),
            },
            Primitive::Line {
                from,
                to,
                width,
                color,
            } => Primitive::Line {
                from: point(from),
                to: point(to),
                width: width * factor,
                color: *color,
            },
            Primitive::Rectangle {
                rect,
                style,
                radius,
            } => Primitive::Rectangle {
                rect: rect.scaled(factor),
                style: ShapeStyle {
                    stroke_width: style.stroke_width * factor,
                    ..style.clone()
                },
                radius: radius * factor,
            },
            Primitive::Ellipse { rect, style } => Primitive::Ellipse {
                rect: rect.scaled(factor),
                style: ShapeStyle {
                    stroke_width: style.stroke_width * factor,
                    ..style.clone()
                },
            },
            Primitive::Bitmap(bitmap) => Primitive::Bitmap(Bitmap {
                rect: bitmap.rect.scaled(factor),
                ..bitmap.clone()
            }),
        };
        DrawOp {
            primitive,
            opacity: self.opacity,
            rotation: self.rotation.map(|r| Rotation {
                degrees: r.degrees,
                pivot: point(&r.pivot),
            }),
        }
    }
}
