//! Data-URL parsing for mask payloads and model image exchange

use crate::error::{EditError, Result};
use base64::{engine::general_purpose, Engine as _};

/// Decode an image payload arriving as a data URL or bare base64.
///
/// Accepts `data:image/...;base64,<payload>` and, for lenient callers,
/// a bare base64 string. A `data:` prefix without the base64 marker is
/// malformed rather than treated as bare payload.
///
/// # Errors
/// - `EditError::MalformedDataUrl` for a broken header or payload
pub fn decode_image_data_url(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.trim();

    if let Some(rest) = trimmed.strip_prefix("data:") {
        let marker = rest.find(";base64,").ok_or(EditError::MalformedDataUrl)?;
        let payload = &rest[marker + ";base64,".len()..];
        return general_purpose::STANDARD
            .decode(payload)
            .map_err(|_| EditError::MalformedDataUrl);
    }

    general_purpose::STANDARD
        .decode(trimmed)
        .map_err(|_| EditError::MalformedDataUrl)
}

/// Encode PNG bytes as a `data:image/png;base64,...` URL
pub fn encode_png_data_url(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(png)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_data_url() {
        let url = encode_png_data_url(&[9, 8, 7]);
        assert_eq!(decode_image_data_url(&url).unwrap(), vec![9, 8, 7]);
    }

    #[test]
    fn test_decode_bare_base64() {
        let payload = general_purpose::STANDARD.encode([1u8, 2, 3]);
        assert_eq!(decode_image_data_url(&payload).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_trims_whitespace() {
        let url = format!("  {}\n", encode_png_data_url(&[4, 5]));
        assert_eq!(decode_image_data_url(&url).unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_rejects_missing_base64_marker() {
        assert!(matches!(
            decode_image_data_url("data:image/png,rawbytes"),
            Err(EditError::MalformedDataUrl)
        ));
    }

    #[test]
    fn test_rejects_broken_payload() {
        assert!(matches!(
            decode_image_data_url("data:image/png;base64,!!not-base64!!"),
            Err(EditError::MalformedDataUrl)
        ));
        assert!(matches!(
            decode_image_data_url("!!not-base64!!"),
            Err(EditError::MalformedDataUrl)
        ));
    }

    #[test]
    fn test_round_trip() {
        let bytes: Vec<u8> = (0..=255).collect();
        let url = encode_png_data_url(&bytes);
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(decode_image_data_url(&url).unwrap(), bytes);
    }
}
