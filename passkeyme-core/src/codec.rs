//! Base64URL codec used for every byte field that crosses the JSON boundary.
//!
//! Encoding uses the URL-safe alphabet (`-`, `_`) and never emits `=` padding.
//! Decoding accepts input with or without padding: unpadded input of length
//! `2` or `3` mod 4 is completed with `==` or `=` before decoding, while a
//! length of `1` mod 4 can never be valid Base64 and is rejected.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::error::{PasskeyError, Result};

/// URL-safe engine: no padding on encode, padding optional on decode.
const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode bytes as unpadded Base64URL.
pub fn base64url_encode(bytes: impl AsRef<[u8]>) -> String {
    BASE64URL.encode(bytes)
}

/// Decode Base64URL text (padded or unpadded) into bytes.
pub fn base64url_decode(text: &str) -> Result<Vec<u8>> {
    BASE64URL
        .decode(text)
        .map_err(|e| PasskeyError::DecodeError(format!("{e} (input length {})", text.len())))
}

/// Decode Base64URL text and interpret the bytes as UTF-8.
pub fn base64url_decode_to_text(text: &str) -> Result<String> {
    let bytes = base64url_decode(text)?;
    String::from_utf8(bytes).map_err(|e| PasskeyError::EncodingError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_uses_url_alphabet_without_padding() {
        // 0xfb 0xff encodes to "+/8=" in standard Base64
        assert_eq!(base64url_encode([0xfb, 0xff]), "-_8");
        assert_eq!(base64url_encode(b"a"), "YQ");
        assert_eq!(base64url_encode(b""), "");
    }

    #[test]
    fn test_decode_restores_padding() {
        assert_eq!(base64url_decode("YQ").unwrap(), b"a");
        assert_eq!(base64url_decode("YWI").unwrap(), b"ab");
        assert_eq!(base64url_decode("YWJj").unwrap(), b"abc");
        assert_eq!(base64url_decode("-_8").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_decode_accepts_already_padded_input() {
        assert_eq!(base64url_decode("YQ==").unwrap(), b"a");
        assert_eq!(base64url_decode("YWI=").unwrap(), b"ab");
    }

    #[test]
    fn test_decode_rejects_malformed_input() {
        // Length 1 mod 4 cannot be produced by any byte string
        assert!(matches!(
            base64url_decode("YWJjZ"),
            Err(PasskeyError::DecodeError(_))
        ));
        assert!(matches!(
            base64url_decode("ab$c"),
            Err(PasskeyError::DecodeError(_))
        ));
        // Standard-alphabet characters are not part of Base64URL
        assert!(base64url_decode("+/8").is_err());
    }

    #[test]
    fn test_decode_to_text_rejects_invalid_utf8() {
        let encoded = base64url_encode([0xff, 0xfe, 0xfd]);
        assert!(matches!(
            base64url_decode_to_text(&encoded),
            Err(PasskeyError::EncodingError(_))
        ));
    }

    #[test]
    fn test_decode_to_text() {
        let encoded = base64url_encode("abc123");
        assert_eq!(encoded, "YWJjMTIz");
        assert_eq!(base64url_decode_to_text(&encoded).unwrap(), "abc123");
    }

    #[test]
    fn test_roundtrip_every_length_and_remainder() {
        let data: Vec<u8> = (0..=255u8).collect();
        for len in 0..data.len() {
            let bytes = &data[..len];
            let encoded = base64url_encode(bytes);
            assert!(!encoded.contains('='));
            assert!(!encoded.contains('+') && !encoded.contains('/'));
            assert_eq!(base64url_decode(&encoded).unwrap(), bytes);
            assert_eq!(base64url_encode(base64url_decode(&encoded).unwrap()), encoded);
        }
    }
}
