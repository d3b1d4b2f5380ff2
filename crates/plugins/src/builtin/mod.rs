//! Built-in field types.

mod barcodes;
mod choice;
mod datetime;
mod graphics;
mod shapes;
mod svg;
mod table;
mod text;
mod variables;

#[cfg(test)]
pub(crate) mod test_support;

pub use barcodes::{Code128Plugin, Ean13Plugin, QrCodePlugin};
pub use choice::{CheckboxPlugin, RadioGroupPlugin, SelectPlugin};
pub use datetime::{DateKind, DateTimePlugin};
pub use graphics::{ImagePlugin, SignaturePlugin};
pub use shapes::{EllipsePlugin, LinePlugin, RectanglePlugin};
pub use svg::SvgPlugin;
pub use table::TablePlugin;
pub use text::{DynamicFontSize, TextPlugin, TextProps};
pub use variables::MultiVariableTextPlugin;

use crate::Plugin;
use serde::Serialize;
use std::sync::Arc;
use stencil_render_core::{DrawOp, Primitive};
use stencil_template_core::Schema;
use stencil_types::Color;

/// Every built-in plugin, in registration order.
pub fn all() -> Vec<Arc<dyn Plugin>> {
    vec![
        Arc::new(TextPlugin),
        Arc::new(MultiVariableTextPlugin),
        Arc::new(DateTimePlugin::new(DateKind::Date)),
        Arc::new(DateTimePlugin::new(DateKind::Time)),
        Arc::new(DateTimePlugin::new(DateKind::DateTime)),
        Arc::new(SelectPlugin),
        Arc::new(ImagePlugin),
        Arc::new(SvgPlugin),
        Arc::new(SignaturePlugin),
        Arc::new(TablePlugin),
        Arc::new(QrCodePlugin),
        Arc::new(Code128Plugin),
        Arc::new(Ean13Plugin),
        Arc::new(LinePlugin),
        Arc::new(RectanglePlugin),
        Arc::new(EllipsePlugin),
        Arc::new(CheckboxPlugin),
        Arc::new(RadioGroupPlugin),
    ]
}

/// Attaches the schema's opacity and its rotation about the box centre.
pub(crate) fn finish(schema: &Schema, primitives: Vec<Primitive>) -> Vec<DrawOp> {
    let pivot = schema.rect().center();
    primitives
        .into_iter()
        .map(|p| {
            DrawOp::new(p)
                .with_opacity(schema.opacity)
                .rotated(schema.rotate, pivot)
        })
        .collect()
}

/// `None` for empty, `transparent` and malformed colours.
pub(crate) fn parse_color(value: &str) -> Option<Color> {
    Color::parse_optional(Some(value))
}

/// A default schema whose props are the serialized `props`.
pub(crate) fn props_schema(kind: &str, width: f64, height: f64, props: &impl Serialize) -> Schema {
    let mut schema = Schema::new("", kind).sized(width, height);
    if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(props) {
        schema.props = map;
    }
    schema
}
