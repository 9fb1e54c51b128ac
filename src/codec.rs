//! Token codec: order chunk <-> compact, URL-safe share token.
//!
//! Encoding is minimized JSON -> zlib at best compression -> base64. QR
//! codes have a hard capacity ceiling and scanning reliability drops sharply
//! as information density rises, so every byte saved here buys readability
//! at typical print/phone-screen sizes.
//!
//! Decoding runs the inverse pipeline with one leniency: if the payload does
//! not inflate, it is retried as plain text. That covers tokens produced by
//! the encoder's uncompressed fallback path.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{DecodeError, EncodeError};
use crate::model::OrderChunk;

/// Encode one chunk into an opaque share token.
///
/// Falls back to base64 of the uncompressed JSON when compression fails;
/// [`decode_token`] handles both forms.
pub fn encode_chunk(chunk: &OrderChunk) -> Result<String, EncodeError> {
    let json =
        serde_json::to_string(chunk).map_err(|e| EncodeError::CompressionFailure(e.to_string()))?;

    let token = match compress(json.as_bytes()) {
        Ok(compressed) => BASE64_STANDARD.encode(compressed),
        Err(e) => {
            warn!(error = %e, "chunk compression failed, encoding uncompressed text");
            BASE64_STANDARD.encode(json.as_bytes())
        }
    };

    if token.is_empty() {
        return Err(EncodeError::CompressionFailure(
            "encoder produced an empty token".to_string(),
        ));
    }

    debug!(
        json_len = json.len(),
        token_len = token.len(),
        part = chunk.part,
        "share token encoded"
    );
    Ok(token)
}

fn compress(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(bytes)?;
    encoder.finish()
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode and validate one scanned token.
///
/// Each pipeline stage maps to its own [`DecodeError`] variant so the UI can
/// tell a damaged scan from a schema mismatch. No retries here — a bad token
/// is terminal for the scan and the user rescans.
pub fn decode_token(token: &str) -> Result<OrderChunk, DecodeError> {
    // Naive query-string handling turns '+' into a space before the token
    // reaches us; restore it rather than failing the base64 stage.
    let cleaned = token.trim().replace(' ', "+");

    let bytes = BASE64_STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| DecodeError::Encoding(e.to_string()))?;

    let text = payload_text(&bytes)?;

    let value: Value =
        serde_json::from_str(&text).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    validate_chunk_shape(&value)?;

    serde_json::from_value(value).map_err(|e| DecodeError::InvalidSchema(e.to_string()))
}

/// Ordered decode strategies: inflate first, then the raw bytes as text.
/// The first success wins; exhaustion is a terminal decompression failure.
fn payload_text(bytes: &[u8]) -> Result<String, DecodeError> {
    const STRATEGIES: &[fn(&[u8]) -> Option<String>] = &[inflate_text, raw_text];
    for strategy in STRATEGIES {
        if let Some(text) = strategy(bytes) {
            return Ok(text);
        }
    }
    Err(DecodeError::Decompression)
}

fn inflate_text(bytes: &[u8]) -> Option<String> {
    let mut text = String::new();
    let mut decoder = ZlibDecoder::new(bytes);
    decoder.read_to_string(&mut text).ok()?;
    Some(text)
}

fn raw_text(bytes: &[u8]) -> Option<String> {
    String::from_utf8(bytes.to_vec()).ok()
}

/// Structural validation ahead of the typed deserialize: `items` must be a
/// sequence, `table` a non-empty string, `total` an unsigned number, and a
/// `part` index must come with its `total_parts` count.
fn validate_chunk_shape(value: &Value) -> Result<(), DecodeError> {
    let obj = value
        .as_object()
        .ok_or_else(|| DecodeError::InvalidSchema("payload is not an object".to_string()))?;

    match obj.get("i") {
        Some(Value::Array(_)) => {}
        Some(_) => {
            return Err(DecodeError::InvalidSchema(
                "items field is not a sequence".to_string(),
            ))
        }
        None => {
            return Err(DecodeError::InvalidSchema(
                "missing items field".to_string(),
            ))
        }
    }

    match obj.get("t").and_then(Value::as_str) {
        Some(table) if !table.trim().is_empty() => {}
        _ => {
            return Err(DecodeError::InvalidSchema(
                "missing or empty table field".to_string(),
            ))
        }
    }

    if obj.get("s").and_then(Value::as_u64).is_none() {
        return Err(DecodeError::InvalidSchema(
            "total is not a non-negative number".to_string(),
        ));
    }

    if obj.contains_key("p") && !obj.contains_key("tp") {
        return Err(DecodeError::InvalidSchema(
            "part index present without total part count".to_string(),
        ));
    }

    Ok(())
}
