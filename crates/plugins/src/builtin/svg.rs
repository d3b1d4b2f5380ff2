//! `svg`: markup rasterised with resvg and placed like an image.

use super::{finish, props_schema};
use crate::{Plugin, PluginError, RenderContext};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use resvg::{tiny_skia, usvg};
use serde::Serialize;
use std::sync::Arc;
use stencil_layout::cache::{cache_key, domain};
use stencil_render_core::{DrawOp, Primitive};
use stencil_template_core::Schema;
use stencil_types::Size;

const RASTER_DPI: f64 = 300.0;
const MAX_PIXELS_PER_SIDE: f64 = 4096.0;

#[derive(Serialize)]
struct NoProps {}

fn parse(markup: &str) -> Result<usvg::Tree, PluginError> {
    usvg::Tree::from_str(markup, &usvg::Options::default()).map_err(|e| PluginError::Svg(e.to_string()))
}

/// Rasterises `tree` to PNG at `width_mm` x `height_mm`.
fn rasterize(tree: &usvg::Tree, width_mm: f64, height_mm: f64) -> Result<Vec<u8>, PluginError> {
    let to_pixels = |mm: f64| (mm / 25.4 * RASTER_DPI).round().clamp(1.0, MAX_PIXELS_PER_SIDE) as u32;
    let (width, height) = (to_pixels(width_mm), to_pixels(height_mm));
    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| PluginError::Svg(format!("cannot allocate a {width}x{height} raster")))?;

    let size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(tree, transform, &mut pixmap.as_mut());

    // tiny-skia stores premultiplied alpha
    let rgba: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|pixel| {
            let c = pixel.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&rgba, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| PluginError::Svg(e.to_string()))?;
    Ok(png)
}

pub struct SvgPlugin;

impl Plugin for SvgPlugin {
    fn type_name(&self) -> &'static str {
        "svg"
    }

    fn default_schema(&self) -> Schema {
        props_schema(self.type_name(), 40.0, 40.0, &NoProps {})
    }

    /// Fitted ("contain") and centred in the box, like `image`.
    fn render(&self, ctx: &RenderContext) -> Result<Vec<DrawOp>, PluginError> {
        let markup = ctx.value.as_text();
        if markup.trim().is_empty() {
            return Ok(Vec::new());
        }
        let tree = parse(&markup)?;
        let intrinsic = Size::new(tree.size().width() as f64, tree.size().height() as f64);
        let rect = ctx.schema.rect().fit_contain(intrinsic);

        let key = cache_key(
            domain::SVG,
            &(markup.as_ref(), rect.width.to_bits(), rect.height.to_bits()),
        );
        let png = ctx.cache.get_or_try_insert_with(key, || {
            let png = rasterize(&tree, rect.width, rect.height)?;
            log::debug!(
                "Rasterised SVG for '{}' into {} bytes",
                ctx.schema.name,
                png.len()
            );
            Ok::<_, PluginError>(Arc::new(png))
        })?;

        Ok(finish(
            ctx.schema,
            vec![Primitive::Image {
                bytes: Arc::clone(&png),
                rect,
            }],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::test_support::Fixture;
    use stencil_types::Rect;

    const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10" viewBox="0 0 20 10">
        <rect x="0" y="0" width="20" height="10" fill="#cc0000"/>
    </svg>"##;

    #[test]
    fn markup_becomes_a_contained_png() {
        let schema = SvgPlugin.default_schema().at(0.0, 0.0).sized(40.0, 40.0);
        let fixture = Fixture::new(schema, SQUARE);
        let ops = SvgPlugin.render(&fixture.ctx()).unwrap();
        assert_eq!(ops.len(), 1);
        match &ops[0].primitive {
            Primitive::Image { bytes, rect } => {
                assert!(bytes.starts_with(b"\x89PNG"));
                assert_eq!(*rect, Rect::new(0.0, 10.0, 40.0, 20.0));
            }
            other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn repeated_markup_is_rasterised_once() {
        let fixture = Fixture::new(SvgPlugin.default_schema(), SQUARE);
        SvgPlugin.render(&fixture.ctx()).unwrap();
        SvgPlugin.render(&fixture.ctx()).unwrap();
        assert_eq!(fixture.cache.stats().hits, 1);
    }

    #[test]
    fn empty_value_draws_nothing() {
        let fixture = Fixture::new(SvgPlugin.default_schema(), "");
        assert!(SvgPlugin.render(&fixture.ctx()).unwrap().is_empty());
    }

    #[test]
    fn malformed_markup_aborts() {
        let fixture = Fixture::new(SvgPlugin.default_schema(), "<svg");
        assert!(matches!(SvgPlugin.render(&fixture.ctx()), Err(PluginError::Svg(_))));
    }
}
