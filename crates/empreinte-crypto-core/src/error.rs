//! Cryptographic error types for `empreinte-crypto-core`.
//!
//! The taxonomy is closed: every fallible core operation returns exactly
//! one of these variants. Variants carry structured context (field name,
//! observed value, expected value) so embedders can render precise
//! messages without parsing strings.

use thiserror::Error;

/// Errors produced by the fuzzy extractor, BCH codec, and aggregator.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Malformed input — wrong length, out-of-range value, or a set pad bit.
    #[error("invalid {field}: observed {observed}, expected {expected}")]
    InvalidInput {
        /// Name of the offending input field.
        field: &'static str,
        /// Value (or length) actually supplied.
        observed: usize,
        /// Value (or length) the operation requires.
        expected: usize,
    },

    /// Integrity check on secret material failed — a helper-data tag
    /// mismatch, or a revocation key set that does not reproduce the old
    /// master key.
    ///
    /// For helper data this is raised before any biometric processing;
    /// the BCH decoder never runs on a blob that fails the tag check.
    /// No observed/expected values are carried: the compared bytes are
    /// secret.
    #[error("integrity check failed: secret material mismatch")]
    Integrity,

    /// BCH decoding failed — the received word carries more bit errors than
    /// the code can correct.
    #[error("BCH decoding failed: more than {capacity} bit errors in received word")]
    BchFailure {
        /// Error-correction capacity of the code (t = 10).
        capacity: usize,
    },

    /// Fewer fingers verified than the operation requires.
    #[error("insufficient fingers: {verified} verified, {required} required")]
    InsufficientFingers {
        /// Number of fingers that produced a key.
        verified: usize,
        /// Minimum number of fingers for the requested mode.
        required: usize,
    },

    /// Fallback aggregation rejected by the quality gate.
    #[error(
        "quality gate rejected {verified} of {enrolled} fingers: \
         average quality {average:.2}, required {required:.0}, \
         backup factor present: {backup_factor}"
    )]
    QualityThreshold {
        /// Number of fingers that verified.
        verified: usize,
        /// Number of fingers enrolled.
        enrolled: usize,
        /// Average quality of the verified fingers.
        average: f64,
        /// Average quality the fallback mode requires.
        required: f64,
        /// Whether the caller supplied a backup authentication factor.
        backup_factor: bool,
    },

    /// Helper blob declares a format version this build does not support.
    #[error("unsupported helper version {observed} (supported: {supported})")]
    VersionUnsupported {
        /// Version byte found in the blob.
        observed: u8,
        /// Version this build understands.
        supported: u8,
    },
}
