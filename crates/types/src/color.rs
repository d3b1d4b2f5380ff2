use serde::{Deserialize, Deserializer, Serialize, de};
use std::hash::{Hash, Hasher};

fn default_one() -> f32 {
    1.0
}

fn is_one(num: &f32) -> bool {
    *num == 1.0
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(skip_serializing_if = "is_one", default = "default_one")]
    pub a: f32,
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.r.hash(state);
        self.g.hash(state);
        self.b.hash(state);
        self.a.to_bits().hash(state);
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 1.0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 1.0 };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn gray(value: u8) -> Self {
        Self::rgb(value, value, value)
    }

    /// Parse a hex color string (`#RGB` or `#RRGGBB`, the `#` is optional).
    pub fn from_hex(s: &str) -> Result<Color, String> {
        let s = s.trim();
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.is_ascii() {
            return Err(format!("Invalid hex color: {}", s));
        }

        match hex.len() {
            3 => {
                // #RGB format - expand each digit
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16)
                    .map_err(|e| format!("Invalid red component: {}", e))?;
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16)
                    .map_err(|e| format!("Invalid green component: {}", e))?;
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16)
                    .map_err(|e| format!("Invalid blue component: {}", e))?;
                Ok(Color::rgb(r, g, b))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16)
                    .map_err(|e| format!("Invalid red component: {}", e))?;
                let g = u8::from_str_radix(&hex[2..4], 16)
                    .map_err(|e| format!("Invalid green component: {}", e))?;
                let b = u8::from_str_radix(&hex[4..6], 16)
                    .map_err(|e| format!("Invalid blue component: {}", e))?;
                Ok(Color::rgb(r, g, b))
            }
            _ => Err(format!(
                "Invalid hex color length: expected 3 or 6, got {}",
                hex.len()
            )),
        }
    }

    /// Whether `s` is written exactly as `#RGB` or `#RRGGBB`.
    pub fn is_hex_notation(s: &str) -> bool {
        s.strip_prefix('#').is_some_and(|hex| {
            matches!(hex.len(), 3 | 6) && hex.bytes().all(|b| b.is_ascii_hexdigit())
        })
    }

    /// Parses an optional template colour. Empty strings and `transparent` mean
    /// "no colour"; malformed values are treated the same way.
    pub fn parse_optional(s: Option<&str>) -> Option<Color> {
        match s.map(str::trim) {
            None | Some("") | Some("transparent") => None,
            Some(hex) => Color::from_hex(hex).ok(),
        }
    }

    /// Red, green and blue in the `0.0..=1.0` range.
    pub fn unit_rgb(&self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ColorDef {
            Str(String),
            Map {
                r: u8,
                g: u8,
                b: u8,
                #[serde(default = "default_one")]
                a: f32,
            },
        }

        match ColorDef::deserialize(deserializer)? {
            ColorDef::Str(s) => Self::from_hex(&s).map_err(de::Error::custom),
            ColorDef::Map { r, g, b, a } => Ok(Color { r, g, b, a }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_notation_requires_the_hash() {
        assert!(Color::is_hex_notation("#fff"));
        assert!(Color::is_hex_notation("#A0b1C2"));
        assert!(!Color::is_hex_notation("ff0000"));
        assert!(!Color::is_hex_notation("abc"));
        assert!(!Color::is_hex_notation("#12"));
        assert!(!Color::is_hex_notation("#ggg"));
    }

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!(Color::from_hex("#fff").unwrap(), Color::WHITE);
        assert_eq!(Color::from_hex("#1a2B3c").unwrap(), Color::rgb(0x1a, 0x2b, 0x3c));
        assert_eq!(Color::from_hex("cccccc").unwrap(), Color::gray(0xcc));
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(Color::from_hex("#12").is_err());
        assert!(Color::from_hex("#ggg").is_err());
        assert!(Color::from_hex("#ééé").is_err());
    }

    #[test]
    fn optional_colours() {
        assert_eq!(Color::parse_optional(None), None);
        assert_eq!(Color::parse_optional(Some("")), None);
        assert_eq!(Color::parse_optional(Some("transparent")), None);
        assert_eq!(Color::parse_optional(Some("#000")), Some(Color::BLACK));
    }

    #[test]
    fn deserializes_from_string_or_map() {
        let c: Color = serde_json::from_str("\"#ff0000\"").unwrap();
        assert_eq!(c, Color::rgb(255, 0, 0));
        let c: Color = serde_json::from_str(r#"{"r":1,"g":2,"b":3}"#).unwrap();
        assert_eq!(c, Color::rgb(1, 2, 3));
    }
}
