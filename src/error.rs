//! Error taxonomy for the order-sharing codec.
//!
//! Encode-side failures are local: an empty order blocks the share action,
//! and a compression failure is recovered via the uncompressed-text fallback
//! before it ever becomes an `EncodeError`. Decode-side failures are always
//! terminal for the current scan and surfaced to the caller so the user can
//! rescan; a partially decoded or inconsistent chunk is never merged.

use thiserror::Error;

/// Failures while producing a share token.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// No items or no table number. The caller should disable the sharing
    /// action instead of producing a token.
    #[error("cannot share an empty order (no items or no table number)")]
    EmptyOrder,

    /// Both the compressed and the uncompressed-text encoding paths failed
    /// to produce a usable token.
    #[error("could not generate share code: {0}")]
    CompressionFailure(String),
}

/// Failures while decoding a scanned token, one variant per pipeline stage.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The token is not valid base64.
    #[error("token is not valid base64: {0}")]
    Encoding(String),

    /// The payload could not be inflated and is not readable as text either.
    #[error("token payload could not be decompressed or read as text")]
    Decompression,

    /// The decompressed text is not valid JSON.
    #[error("order payload is not valid JSON: {0}")]
    Malformed(String),

    /// The JSON is well-formed but does not match the order chunk schema.
    #[error("order payload does not match the expected schema: {0}")]
    InvalidSchema(String),

    /// Part metadata conflicts with previously scanned parts of the same
    /// order (out-of-range part index, or a different total-part count).
    #[error("order part is inconsistent with previously scanned parts: {0}")]
    InconsistentParts(String),

    /// The device-local part store could not be read or written. Terminal
    /// for this scan; the reassembly state is left as it was.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures in a [`PartStore`](crate::PartStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("part store lock poisoned")]
    Poisoned,

    #[error("part store database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored part no longer parses as an order chunk.
    #[error("stored order part is corrupted: {0}")]
    Corrupt(String),
}
