//! The resource dictionary shared by every page: fonts, image XObjects and
//! opacity graphics states.

use image::ImageFormat;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use stencil_layout::{FontFace, FontSet};
use stencil_render_core::RenderError;

const FIRST_CHAR: i64 = 32;
const LAST_CHAR: i64 = 255;

// FontDescriptor /Flags: non-symbolic.
const NON_SYMBOLIC: i64 = 32;

pub(crate) fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn deflate(data: &[u8]) -> Vec<u8> {
    miniz_oxide::deflate::compress_to_vec_zlib(data, 6)
}

fn hash_bytes(data: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    data.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Default)]
pub(crate) struct Resources {
    /// Face name to resource name, in order of first use.
    fonts: BTreeMap<String, String>,
    images: HashMap<u64, String>,
    xobjects: BTreeMap<String, ObjectId>,
    /// Opacity quantised to 0..=1000.
    ext_gstates: BTreeMap<u32, String>,
}

impl Resources {
    pub fn font(&mut self, face: &FontFace) -> String {
        let next = format!("F{}", self.fonts.len() + 1);
        self.fonts.entry(face.name.clone()).or_insert(next).clone()
    }

    /// Embeds `bytes` on first sight; identical images share one XObject.
    pub fn image(&mut self, doc: &mut Document, bytes: &[u8]) -> Result<String, RenderError> {
        let hash = hash_bytes(bytes);
        if let Some(name) = self.images.get(&hash) {
            return Ok(name.clone());
        }
        let id = embed_image(doc, bytes)?;
        let name = format!("Im{}", self.images.len() + 1);
        self.images.insert(hash, name.clone());
        self.xobjects.insert(name.clone(), id);
        Ok(name)
    }

    pub fn opacity(&mut self, opacity: f64) -> String {
        let quantised = (opacity.clamp(0.0, 1.0) * 1000.0).round() as u32;
        self.ext_gstates
            .entry(quantised)
            .or_insert_with(|| format!("GS{quantised}"))
            .clone()
    }

    pub fn image_count(&self) -> usize {
        self.xobjects.len()
    }

    /// Writes the used fonts and returns the finished `/Resources` dictionary.
    pub fn into_dictionary(self, doc: &mut Document, fonts: &FontSet) -> Result<Dictionary, RenderError> {
        let mut font_dict = Dictionary::new();
        for (face_name, resource) in &self.fonts {
            let face = fonts.resolve(Some(face_name));
            let id = embed_font(doc, face)?;
            font_dict.set(resource.as_bytes(), id);
        }

        let mut xobject_dict = Dictionary::new();
        for (name, id) in self.xobjects {
            xobject_dict.set(name.as_bytes(), id);
        }

        let mut gstate_dict = Dictionary::new();
        for (quantised, name) in self.ext_gstates {
            let alpha = quantised as f64 / 1000.0;
            gstate_dict.set(
                name.as_bytes(),
                dictionary! { "Type" => "ExtGState", "ca" => real(alpha), "CA" => real(alpha) },
            );
        }

        let mut resources = dictionary! { "Font" => font_dict };
        if !xobject_dict.is_empty() {
            resources.set("XObject", xobject_dict);
        }
        if !gstate_dict.is_empty() {
            resources.set("ExtGState", gstate_dict);
        }
        Ok(resources)
    }
}

/// JPEG data passes through untouched. Everything else is re-encoded as
/// flate-compressed RGB, with a soft mask only when some pixel is translucent.
fn embed_image(doc: &mut Document, bytes: &[u8]) -> Result<ObjectId, RenderError> {
    let format = image::guess_format(bytes).map_err(|e| RenderError::Image(e.to_string()))?;
    let decoded = image::load_from_memory(bytes).map_err(|e| RenderError::Image(e.to_string()))?;
    let (width, height) = (decoded.width() as i64, decoded.height() as i64);

    if format == ImageFormat::Jpeg {
        let color_space = match decoded.color() {
            image::ColorType::L8 | image::ColorType::La8 => "DeviceGray",
            _ => "DeviceRGB",
        };
        let dict = dictionary! {
            "Type" => "XObject", "Subtype" => "Image",
            "Width" => width, "Height" => height,
            "ColorSpace" => color_space, "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        };
        return Ok(doc.add_object(Stream::new(dict, bytes.to_vec())));
    }

    let rgba = decoded.to_rgba8();
    let pixels = (width * height) as usize;
    let mut rgb = Vec::with_capacity(pixels * 3);
    let mut alpha = Vec::with_capacity(pixels);
    let mut translucent = false;
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        translucent |= a != 255;
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    let mut dict = dictionary! {
        "Type" => "XObject", "Subtype" => "Image",
        "Width" => width, "Height" => height,
        "ColorSpace" => "DeviceRGB", "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };
    if translucent {
        let mask = dictionary! {
            "Type" => "XObject", "Subtype" => "Image",
            "Width" => width, "Height" => height,
            "ColorSpace" => "DeviceGray", "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        let mask_id = doc.add_object(Stream::new(mask, deflate(&alpha)));
        dict.set("SMask", mask_id);
    }
    log::debug!("Embedded {}x{} image (soft mask: {})", width, height, translucent);
    Ok(doc.add_object(Stream::new(dict, deflate(&rgb))))
}

fn embed_font(doc: &mut Document, face: &FontFace) -> Result<ObjectId, RenderError> {
    let Some(data) = face.data() else {
        return Ok(doc.add_object(dictionary! {
            "Type" => "Font", "Subtype" => "Type1",
            "BaseFont" => face.name.clone(), "Encoding" => "WinAnsiEncoding",
        }));
    };

    let parsed = ttf_parser::Face::parse(data, 0)
        .map_err(|e| RenderError::Pdf(format!("Font '{}' cannot be embedded: {}", face.name, e)))?;
    let scale = 1000.0 / parsed.units_per_em() as f64;
    let bbox = parsed.global_bounding_box();
    let cap_height = parsed
        .capital_height()
        .map(|h| h as f64 * scale)
        .unwrap_or_else(|| face.ascent_1000());
    let ps_name: String = face.name.chars().filter(|c| !c.is_whitespace()).collect();

    let file = Stream::new(
        dictionary! { "Length1" => data.len() as i64, "Filter" => "FlateDecode" },
        deflate(data),
    );
    let file_id = doc.add_object(file);

    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => ps_name.clone(),
        "Flags" => NON_SYMBOLIC,
        "FontBBox" => vec![
            real(bbox.x_min as f64 * scale),
            real(bbox.y_min as f64 * scale),
            real(bbox.x_max as f64 * scale),
            real(bbox.y_max as f64 * scale),
        ],
        "ItalicAngle" => 0,
        "Ascent" => real(face.ascent_1000()),
        "Descent" => real(face.descent_1000()),
        "CapHeight" => real(cap_height),
        "StemV" => 80,
        "FontFile2" => file_id,
    });

    let widths: Vec<Object> = face.winansi_widths().iter().map(|w| real(*w)).collect();
    Ok(doc.add_object(dictionary! {
        "Type" => "Font", "Subtype" => "TrueType",
        "BaseFont" => ps_name,
        "FirstChar" => FIRST_CHAR, "LastChar" => LAST_CHAR,
        "Widths" => widths,
        "FontDescriptor" => descriptor_id,
        "Encoding" => "WinAnsiEncoding",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_is_quantised() {
        let mut resources = Resources::default();
        assert_eq!(resources.opacity(0.5), "GS500");
        assert_eq!(resources.opacity(0.50004), "GS500");
        assert_eq!(resources.opacity(2.0), "GS1000");
    }

    #[test]
    fn fonts_are_numbered_by_first_use() {
        let fonts = FontSet::new();
        let mut resources = Resources::default();
        let face = fonts.fallback();
        assert_eq!(resources.font(face), "F1");
        assert_eq!(resources.font(face), "F1");
    }

    #[test]
    fn unknown_image_bytes_are_rejected() {
        let mut doc = Document::with_version("1.7");
        let mut resources = Resources::default();
        assert!(matches!(
            resources.image(&mut doc, b"not an image"),
            Err(RenderError::Image(_))
        ));
    }
}
