//! Error types for `empreinte-did`.

use empreinte_crypto_core::CryptoError;
use thiserror::Error;

/// Errors produced by DID derivation and metadata building.
#[derive(Debug, Error)]
pub enum DidError {
    /// Cryptographic operation failed (delegated from the crypto core).
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Serialized metadata payload exceeds the hard on-chain budget.
    #[error("metadata payload too large: {size} bytes (limit {limit})")]
    SizeLimitExceeded {
        /// Serialized payload size in bytes.
        size: usize,
        /// The hard limit that was exceeded.
        limit: usize,
    },

    /// Helper URI uses a scheme outside the allow-list.
    #[error("invalid helper URI {uri:?}: scheme {scheme:?} is not one of http, https, ipfs")]
    InvalidUri {
        /// The rejected URI.
        uri: String,
        /// The scheme that was observed (empty if none could be parsed).
        scheme: String,
    },

    /// Wallet address does not match the Cardano bech32 shape.
    #[error("invalid wallet address {address:?}: {reason}")]
    InvalidAddress {
        /// The rejected address.
        address: String,
        /// What the address failed to satisfy.
        reason: &'static str,
    },

    /// Payload declares a schema version this build does not support.
    #[error("unsupported metadata version {observed} (supported: {supported})")]
    VersionUnsupported {
        /// Version found in the payload.
        observed: u16,
        /// Version this build understands.
        supported: u16,
    },

    /// A payload field is missing, has the wrong type, or violates a
    /// consistency rule.
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        /// Name of the offending field.
        field: &'static str,
        /// Observed value and what was expected instead.
        reason: String,
    },

    /// JSON assembly or parsing failed.
    #[error("metadata serialization failed: {0}")]
    Serialization(String),
}
