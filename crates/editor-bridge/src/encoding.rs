//! Boundary string encoding.
//!
//! Hosts pass text that may contain arbitrary Unicode through a channel that only carries
//! ASCII safely, so payloads travel as standard base64 over UTF-8 bytes.

use crate::error::BridgeError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Decode a base64 boundary argument into text.
///
/// Malformed input is an error: it means the host broke the boundary contract.
pub fn decode_base64(encoded: &str) -> Result<String, BridgeError> {
    let bytes = STANDARD.decode(encoded.trim())?;
    Ok(String::from_utf8(bytes)?)
}

/// Encode text the way hosts are expected to send it.
pub fn encode_base64(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_unicode() {
        // "héllo 👋"
        assert_eq!(decode_base64("aMOpbGxvIPCfkYs=").unwrap(), "héllo 👋");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_base64("not base64!"),
            Err(BridgeError::Base64(_))
        ));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        // 0xff 0xfe
        assert!(matches!(decode_base64("//4="), Err(BridgeError::Utf8(_))));
    }
}
