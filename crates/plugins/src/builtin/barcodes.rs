//! `qrcode`, `code128` and `ean13` as 1-bit module rasters.

use super::{finish, parse_color, props_schema};
use crate::{Plugin, PluginError, RenderContext};
use barcoders::sym::code128::Code128;
use barcoders::sym::ean13::EAN13;
use qrcode::QrCode;
use serde::{Deserialize, Serialize};
use stencil_render_core::{Bitmap, DrawOp, Primitive};
use stencil_template_core::Schema;
use stencil_types::{Color, Rect, Size};

// Selects Code 128 character set B unless the value picks one itself.
const CODE128_SET_B: char = 'Ɓ';
const CODE128_SETS: [char; 3] = ['À', 'Ɓ', 'Ć'];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BarcodeProps {
    background_color: String,
    bar_color: String,
}

impl Default for BarcodeProps {
    fn default() -> Self {
        Self {
            background_color: "#ffffff".into(),
            bar_color: "#000000".into(),
        }
    }
}

/// Dark/light modules of one symbol.
struct Symbol {
    columns: usize,
    rows: usize,
    modules: Vec<bool>,
}

fn encode_qr(value: &str) -> Result<Symbol, PluginError> {
    let code = QrCode::new(value.as_bytes()).map_err(|e| PluginError::Barcode(e.to_string()))?;
    let width = code.width();
    let modules = code
        .to_colors()
        .into_iter()
        .map(|c| c == qrcode::Color::Dark)
        .collect();
    Ok(Symbol {
        columns: width,
        rows: width,
        modules,
    })
}

fn linear(bars: Vec<u8>) -> Symbol {
    Symbol {
        columns: bars.len(),
        rows: 1,
        modules: bars.into_iter().map(|b| b == 1).collect(),
    }
}

fn encode_code128(value: &str) -> Result<Symbol, PluginError> {
    let data = if value.starts_with(CODE128_SETS) {
        value.to_string()
    } else {
        format!("{CODE128_SET_B}{value}")
    };
    let code = Code128::new(data).map_err(|e| PluginError::Barcode(e.to_string()))?;
    Ok(linear(code.encode()))
}

/// EAN-13 check digit for the first twelve digits.
pub fn ean13_check_digit(digits: &[u8]) -> u8 {
    let sum: u32 = digits
        .iter()
        .take(12)
        .enumerate()
        .map(|(i, d)| *d as u32 * if i % 2 == 0 { 1 } else { 3 })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

fn encode_ean13(value: &str) -> Result<Symbol, PluginError> {
    let digits: Vec<u8> = value
        .chars()
        .map(|c| c.to_digit(10).map(|d| d as u8))
        .collect::<Option<_>>()
        .ok_or_else(|| PluginError::Barcode(format!("'{value}' is not all digits")))?;

    match digits.len() {
        12 => {}
        13 => {
            let expected = ean13_check_digit(&digits);
            if digits[12] != expected {
                return Err(PluginError::Barcode(format!(
                    "check digit of '{value}' should be {expected}"
                )));
            }
        }
        n => {
            return Err(PluginError::Barcode(format!(
                "EAN-13 needs 12 or 13 digits, got {n}"
            )));
        }
    }

    let code = EAN13::new(&value[..12]).map_err(|e| PluginError::Barcode(e.to_string()))?;
    Ok(linear(code.encode()))
}

fn render_symbol(
    ctx: &RenderContext,
    encode: fn(&str) -> Result<Symbol, PluginError>,
    fit: impl Fn(Rect) -> Rect,
) -> Result<Vec<DrawOp>, PluginError> {
    let value = ctx.value.as_text();
    if value.is_empty() {
        return Ok(Vec::new());
    }
    let props: BarcodeProps = ctx.schema.props_as()?;
    let symbol = encode(&value)?;
    let bitmap = Bitmap {
        rect: fit(ctx.schema.rect()),
        columns: symbol.columns,
        rows: symbol.rows,
        modules: symbol.modules,
        color: parse_color(&props.bar_color).unwrap_or(Color::BLACK),
        background: parse_color(&props.background_color),
    };
    Ok(finish(ctx.schema, vec![Primitive::Bitmap(bitmap)]))
}

fn barcode_schema(kind: &str, width: f64, height: f64) -> Schema {
    props_schema(kind, width, height, &BarcodeProps::default())
}

pub struct QrCodePlugin;

impl Plugin for QrCodePlugin {
    fn type_name(&self) -> &'static str {
        "qrcode"
    }

    fn default_schema(&self) -> Schema {
        barcode_schema(self.type_name(), 30.0, 30.0)
    }

    fn render(&self, ctx: &RenderContext) -> Result<Vec<DrawOp>, PluginError> {
        render_symbol(ctx, encode_qr, |rect| rect.fit_contain(Size::new(1.0, 1.0)))
    }
}

pub struct Code128Plugin;

impl Plugin for Code128Plugin {
    fn type_name(&self) -> &'static str {
        "code128"
    }

    fn default_schema(&self) -> Schema {
        barcode_schema(self.type_name(), 60.0, 16.0)
    }

    fn render(&self, ctx: &RenderContext) -> Result<Vec<DrawOp>, PluginError> {
        render_symbol(ctx, encode_code128, |rect| rect)
    }
}

pub struct Ean13Plugin;

impl Plugin for Ean13Plugin {
    fn type_name(&self) -> &'static str {
        "ean13"
    }

    fn default_schema(&self) -> Schema {
        barcode_schema(self.type_name(), 40.0, 16.0)
    }

    fn render(&self, ctx: &RenderContext) -> Result<Vec<DrawOp>, PluginError> {
        render_symbol(ctx, encode_ean13, |rect| rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::test_support::Fixture;

    fn bitmap(ops: &[DrawOp]) -> &Bitmap {
        match &ops[0].primitive {
            Primitive::Bitmap(bitmap) => bitmap,
            other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn qr_is_square_and_centred() {
        let schema = QrCodePlugin.default_schema().at(0.0, 0.0).sized(40.0, 30.0);
        let fixture = Fixture::new(schema, "https://example.com");
        let ops = QrCodePlugin.render(&fixture.ctx()).unwrap();
        let qr = bitmap(&ops);
        assert_eq!(qr.columns, qr.rows);
        assert_eq!(qr.modules.len(), qr.columns * qr.rows);
        assert_eq!((qr.rect.x, qr.rect.width), (5.0, 30.0));
        // finder pattern corner
        assert!(qr.is_dark(0, 0));
    }

    #[test]
    fn code128_fills_the_box() {
        let schema = Code128Plugin.default_schema().at(1.0, 2.0);
        let fixture = Fixture::new(schema, "ABC-123");
        let ops = Code128Plugin.render(&fixture.ctx()).unwrap();
        let bars = bitmap(&ops);
        assert_eq!(bars.rows, 1);
        assert!(bars.columns > 0);
        assert_eq!((bars.rect.x, bars.rect.y, bars.rect.width), (1.0, 2.0, 60.0));
    }

    #[test]
    fn ean13_check_digit_is_verified() {
        assert_eq!(ean13_check_digit(&[4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3]), 1);
        assert!(encode_ean13("4006381333931").is_ok());
        assert!(encode_ean13("400638133393").is_ok());
        assert!(matches!(encode_ean13("4006381333932"), Err(PluginError::Barcode(_))));
        assert!(matches!(encode_ean13("12345"), Err(PluginError::Barcode(_))));
        assert!(matches!(encode_ean13("40063813339x1"), Err(PluginError::Barcode(_))));
    }

    #[test]
    fn ean13_has_ninety_five_modules() {
        let symbol = encode_ean13("4006381333931").unwrap();
        assert_eq!(symbol.columns, 95);
    }

    #[test]
    fn empty_value_draws_nothing() {
        let fixture = Fixture::new(QrCodePlugin.default_schema(), "");
        assert!(QrCodePlugin.render(&fixture.ctx()).unwrap().is_empty());
    }
}
