use crate::error::ResourceError;
use base64::{Engine as _, engine::general_purpose::STANDARD};

const BASE64_MARKER: &str = ";base64,";

/// A decoded `data:<mime>;base64,<payload>` asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Decodes a base64 data URI.
///
/// Whitespace inside the payload is ignored, since templates often carry
/// line-wrapped base64.
pub fn decode_data_uri(value: &str) -> Result<DataUri, ResourceError> {
    let value = value.trim();
    let rest = value
        .strip_prefix("data:")
        .ok_or_else(|| ResourceError::InvalidDataUri("missing 'data:' scheme".into()))?;
    let idx = rest
        .find(BASE64_MARKER)
        .ok_or_else(|| ResourceError::InvalidDataUri("missing ';base64,' marker".into()))?;

    let mime_type = rest[..idx].to_string();
    let payload: String = rest[idx + BASE64_MARKER.len()..]
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| ResourceError::InvalidDataUri(e.to_string()))?;
    log::trace!("Decoded {} bytes of {}", bytes.len(), mime_type);

    Ok(DataUri { mime_type, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_mime_and_payload() {
        let uri = decode_data_uri("data:image/png;base64,AAEC").unwrap();
        assert_eq!(uri.mime_type, "image/png");
        assert_eq!(uri.bytes, vec![0, 1, 2]);
    }

    #[test]
    fn tolerates_wrapped_payload() {
        let uri = decode_data_uri("data:text/plain;base64,aGVs\n bG8=").unwrap();
        assert_eq!(uri.bytes, b"hello");
    }

    #[test]
    fn rejects_missing_marker() {
        assert!(matches!(
            decode_data_uri("data:image/png,AAEC"),
            Err(ResourceError::InvalidDataUri(_))
        ));
        assert!(matches!(
            decode_data_uri("AAEC"),
            Err(ResourceError::InvalidDataUri(_))
        ));
    }

    #[test]
    fn rejects_bad_base64() {
        assert!(decode_data_uri("data:image/png;base64,@@@").is_err());
    }
}
