//! Raster fields: `image` and `signature`.

use super::{finish, parse_color, props_schema};
use crate::{Plugin, PluginError, RenderContext};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::sync::Arc;
use stencil_layout::cache::{cache_key, domain};
use stencil_render_core::{DrawOp, Primitive, ShapeStyle};
use stencil_resource::{ImageDimensions, decode_data_uri, probe_dimensions};
use stencil_template_core::Schema;
use stencil_types::units::pt2mm;

/// A decoded data URI with its probed size.
#[derive(Debug)]
pub(crate) struct LoadedImage {
    pub bytes: Arc<Vec<u8>>,
    pub dimensions: ImageDimensions,
}

/// Decodes and probes `uri` once per generation call.
pub(crate) fn load_image(ctx: &RenderContext, uri: &str) -> Result<Rc<LoadedImage>, PluginError> {
    let key = cache_key(domain::IMAGE, uri);
    ctx.cache.get_or_try_insert_with(key, || {
        let decoded = decode_data_uri(uri)?;
        let dimensions = probe_dimensions(&decoded.bytes)?;
        log::debug!(
            "Loaded {} image {}x{} for '{}'",
            decoded.mime_type,
            dimensions.width,
            dimensions.height,
            ctx.schema.name
        );
        Ok(LoadedImage {
            bytes: Arc::new(decoded.bytes),
            dimensions,
        })
    })
}

pub struct ImagePlugin;

impl Plugin for ImagePlugin {
    fn type_name(&self) -> &'static str {
        "image"
    }

    fn default_schema(&self) -> Schema {
        Schema::new("", self.type_name()).sized(40.0, 40.0)
    }

    /// Fitted ("contain") and centred in the box.
    fn render(&self, ctx: &RenderContext) -> Result<Vec<DrawOp>, PluginError> {
        let uri = ctx.value.as_text();
        if uri.trim().is_empty() {
            return Ok(Vec::new());
        }
        let image = load_image(ctx, &uri)?;
        let rect = ctx.schema.rect().fit_contain(image.dimensions.size());
        Ok(finish(
            ctx.schema,
            vec![Primitive::Image {
                bytes: Arc::clone(&image.bytes),
                rect,
            }],
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SignatureProps {
    background_color: String,
    border_color: String,
    /// Points.
    border_width: f64,
}

impl Default for SignatureProps {
    fn default() -> Self {
        Self {
            background_color: "#ffffff".into(),
            border_color: "#cccccc".into(),
            border_width: 1.0,
        }
    }
}

pub struct SignaturePlugin;

impl Plugin for SignaturePlugin {
    fn type_name(&self) -> &'static str {
        "signature"
    }

    fn default_schema(&self) -> Schema {
        let mut schema = props_schema(self.type_name(), 62.5, 37.5, &SignatureProps::default());
        schema.required = Some(false);
        schema
    }

    /// Background, the image stretched over the box, then the frame.
    fn render(&self, ctx: &RenderContext) -> Result<Vec<DrawOp>, PluginError> {
        let uri = ctx.value.as_text();
        if uri.trim().is_empty() {
            return Ok(Vec::new());
        }
        let image = load_image(ctx, &uri)?;
        let props: SignatureProps = ctx.schema.props_as()?;
        let rect = ctx.schema.rect();
        let border_color = parse_color(&props.border_color);
        let mut primitives = Vec::new();

        if let Some(background) = parse_color(&props.background_color) {
            primitives.push(Primitive::Rectangle {
                rect,
                style: ShapeStyle::filled(background),
                radius: 0.0,
            });
        }
        primitives.push(Primitive::Image {
            bytes: Arc::clone(&image.bytes),
            rect,
        });
        if let Some(color) = border_color.filter(|_| props.border_width > 0.0) {
            primitives.push(Primitive::Rectangle {
                rect,
                style: ShapeStyle::stroked(color, pt2mm(props.border_width)),
                radius: 0.0,
            });
        }
        Ok(finish(ctx.schema, primitives))
    }
}
