//! Error kinds for the SSZ/Merkle proof core.
//!
//! Every variant here is recoverable at the HTTP boundary; `ProofSelfCheckFailed`
//! is the one kind that should never legitimately fire — it means the composer
//! or the gindex registry disagree with the verifier, which is a bug in this
//! crate, not a data error from the caller.

use crate::primitives::{Root, Version};
use thiserror::Error;

/// Errors surfaced by the codec, Merkleizer, gindex registry, composer, and façade.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("short input: expected at least {expected} bytes, got {got}")]
    ShortInput { expected: usize, got: usize },

    #[error("trailing bytes: expected exactly {expected} bytes, got {got}")]
    TrailingBytes { expected: usize, got: usize },

    #[error("offset out of bounds: offset {offset} exceeds buffer length {limit}")]
    OffsetOutOfBounds { offset: u32, limit: u32 },

    #[error("gindex {gindex} out of range (max supported depth {max_depth})")]
    GindexOutOfRange { gindex: u64, max_depth: u32 },

    #[error("list exceeds declared capacity: length {length} > limit {limit}")]
    ListCapacityExceeded { length: usize, limit: usize },

    #[error("vector length mismatch: expected {expected}, got {got}")]
    VectorLengthMismatch { expected: usize, got: usize },

    #[error("field path not found: {path}")]
    FieldPathNotFound { path: String },

    #[error("unknown block id: {block_id}")]
    NotFound { block_id: String },

    #[error("state unavailable for slot {slot}")]
    StateUnavailable { slot: u64 },

    #[error("proof self-check failed for gindex {gindex} under fork {fork}")]
    ProofSelfCheckFailed { gindex: u64, fork: Version },

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The HTTP status code this error maps to at the service boundary (`spec.md §7`).
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ShortInput { .. }
            | Self::TrailingBytes { .. }
            | Self::OffsetOutOfBounds { .. }
            | Self::GindexOutOfRange { .. }
            | Self::ListCapacityExceeded { .. }
            | Self::VectorLengthMismatch { .. }
            | Self::FieldPathNotFound { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::StateUnavailable { .. } => 503,
            Self::ProofSelfCheckFailed { .. } | Self::Internal(_) => 500,
        }
    }

    /// Whether this error should be logged and alerted on, per `spec.md §7`.
    #[must_use]
    pub fn should_alert(&self) -> bool {
        matches!(self, Self::ProofSelfCheckFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_spec_table() {
        assert_eq!(CoreError::ShortInput { expected: 1, got: 0 }.http_status(), 400);
        assert_eq!(CoreError::NotFound { block_id: "x".into() }.http_status(), 404);
        assert_eq!(CoreError::StateUnavailable { slot: 1 }.http_status(), 503);
        assert_eq!(
            CoreError::ProofSelfCheckFailed { gindex: 1, fork: Version([0; 4]) }.http_status(),
            500
        );
        assert!(CoreError::ProofSelfCheckFailed { gindex: 1, fork: Version([0; 4]) }.should_alert());
        assert!(!CoreError::Internal("x".into()).should_alert());
    }
}
