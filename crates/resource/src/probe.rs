//! Header-only image size detection.
//!
//! Only PNG (including Apple's CgBI "fried" variant) and baseline/progressive
//! JPEG are recognised. Nothing beyond the headers is ever inspected.

use crate::data_uri::decode_data_uri;
use crate::error::ResourceError;
use stencil_types::Size;

const PNG_SIGNATURE: &[u8] = b"PNG\r\n\x1a\n";
const PNG_IHDR: &[u8] = b"IHDR";
const PNG_FRIED_CHUNK: &[u8] = b"CgBI";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

/// Intrinsic size of an image in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

impl ImageDimensions {
    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }
}

/// Reads width and height from raw (already base64-decoded) image bytes.
pub fn probe_dimensions(data: &[u8]) -> Result<ImageDimensions, ResourceError> {
    match data.first() {
        Some(0x89) if data.get(1..8) == Some(PNG_SIGNATURE) => probe_png(data),
        Some(0xFF) if data.get(0..2) == Some(&[0xFF, 0xD8][..]) => probe_jpeg(data),
        _ => Err(ResourceError::UnsupportedImageFormat),
    }
}

/// Decodes a data URI and probes its payload.
pub fn probe_data_uri(value: &str) -> Result<ImageDimensions, ResourceError> {
    let uri = decode_data_uri(value)?;
    probe_dimensions(&uri.bytes)
}

fn probe_png(data: &[u8]) -> Result<ImageDimensions, ResourceError> {
    let fried = data.get(12..16) == Some(PNG_FRIED_CHUNK);
    let (chunk_name, width_at, height_at) = if fried {
        (data.get(28..32), 32, 36)
    } else {
        (data.get(12..16), 16, 20)
    };
    if chunk_name != Some(PNG_IHDR) {
        return Err(ResourceError::CorruptImage(
            "PNG first chunk is not IHDR".into(),
        ));
    }

    let width = read_u32_be(data, width_at)
        .ok_or_else(|| ResourceError::CorruptImage("PNG header truncated".into()))?;
    let height = read_u32_be(data, height_at)
        .ok_or_else(|| ResourceError::CorruptImage("PNG header truncated".into()))?;
    Ok(ImageDimensions {
        width,
        height,
        format: ImageFormat::Png,
    })
}

fn probe_jpeg(data: &[u8]) -> Result<ImageDimensions, ResourceError> {
    // Skip SOI and the first APPn marker; the cursor then sits on a length field.
    let mut block = data.get(4..).unwrap_or_default();

    while !block.is_empty() {
        let next_marker = read_u16_be(block, 0).ok_or_else(|| {
            ResourceError::CorruptImage("JPEG segment length truncated".into())
        })? as usize;

        if next_marker > block.len() {
            return Err(ResourceError::CorruptImage(
                "JPEG segment exceeds buffer limits".into(),
            ));
        }
        if block.get(next_marker) != Some(&0xFF) {
            return Err(ResourceError::CorruptImage(
                "JPEG marker table corrupted".into(),
            ));
        }

        // SOF0 baseline, SOF1 extended, SOF2 progressive
        if let Some(0xC0..=0xC2) = block.get(next_marker + 1) {
            let height = read_u16_be(block, next_marker + 5);
            let width = read_u16_be(block, next_marker + 7);
            return match (width, height) {
                (Some(width), Some(height)) => Ok(ImageDimensions {
                    width: width as u32,
                    height: height as u32,
                    format: ImageFormat::Jpeg,
                }),
                _ => Err(ResourceError::CorruptImage("JPEG frame header truncated".into())),
            };
        }

        block = block.get(next_marker + 2..).unwrap_or_default();
    }

    Err(ResourceError::CorruptImage("JPEG has no frame header".into()))
}

fn read_u16_be(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn read_u32_be(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
        bytes
    }

    fn fried_png_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
        bytes.extend_from_slice(&4u32.to_be_bytes());
        bytes.extend_from_slice(b"CgBI");
        bytes.extend_from_slice(&[0x50, 0x00, 0x20, 0x06]);
        bytes.extend_from_slice(&[0, 0, 0, 0]); // crc
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes
    }

    fn jpeg_header(width: u16, height: u16) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.extend_from_slice(&[0x00, 0x10, b'J', b'F', b'I', b'F', 0, 1, 1, 0, 0, 1, 0, 1, 0, 0]);
        bytes.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&[0x03, 0x01, 0x22, 0x00]);
        bytes
    }

    #[test]
    fn minimal_png_is_one_by_one() {
        let dims = probe_dimensions(&png_header(1, 1)).unwrap();
        assert_eq!((dims.width, dims.height), (1, 1));
        assert_eq!(dims.format, ImageFormat::Png);
    }

    #[test]
    fn fried_png_uses_shifted_offsets() {
        let dims = probe_dimensions(&fried_png_header(640, 480)).unwrap();
        assert_eq!((dims.width, dims.height), (640, 480));
    }

    #[test]
    fn png_with_wrong_first_chunk_is_corrupt() {
        let mut bytes = png_header(1, 1);
        bytes[12..16].copy_from_slice(b"IDAT");
        assert!(matches!(
            probe_dimensions(&bytes),
            Err(ResourceError::CorruptImage(_))
        ));
    }

    #[test]
    fn baseline_jpeg() {
        let dims = probe_dimensions(&jpeg_header(64, 32)).unwrap();
        assert_eq!((dims.width, dims.height), (64, 32));
        assert_eq!(dims.format, ImageFormat::Jpeg);
    }

    #[test]
    fn progressive_jpeg_after_extra_segment() {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00];
        // APP1 segment of length 6
        bytes.extend_from_slice(&[0xFF, 0xE1, 0x00, 0x06, 1, 2, 3, 4]);
        bytes.extend_from_slice(&[0xFF, 0xC2, 0x00, 0x11, 0x08, 0x01, 0x00, 0x02, 0x00]);
        let dims = probe_dimensions(&bytes).unwrap();
        assert_eq!((dims.width, dims.height), (512, 256));
    }

    #[test]
    fn jpeg_with_broken_marker_is_corrupt() {
        let mut bytes = jpeg_header(10, 10);
        bytes[20] = 0x00;
        assert!(matches!(
            probe_dimensions(&bytes),
            Err(ResourceError::CorruptImage(_))
        ));
    }

    #[test]
    fn jpeg_length_past_buffer_is_corrupt() {
        let bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x7F, 0xFF, 0x00];
        assert!(matches!(
            probe_dimensions(&bytes),
            Err(ResourceError::CorruptImage(_))
        ));
    }

    #[test]
    fn unknown_signature_is_unsupported() {
        assert_eq!(
            probe_dimensions(&[0x00, 0x01, 0x02, 0x03]),
            Err(ResourceError::UnsupportedImageFormat)
        );
        assert_eq!(
            probe_dimensions(b"GIF89a"),
            Err(ResourceError::UnsupportedImageFormat)
        );
        assert_eq!(probe_dimensions(&[]), Err(ResourceError::UnsupportedImageFormat));
    }

    #[test]
    fn probes_through_data_uri() {
        use base64::{Engine as _, engine::general_purpose::STANDARD};
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(png_header(3, 7)));
        let dims = probe_data_uri(&uri).unwrap();
        assert_eq!((dims.width, dims.height), (3, 7));
    }
}
