//! `empreinte-crypto-core` — Fuzzy extraction and key aggregation for EMPREINTE.
//!
//! This crate is the audit target: zero network, zero async, zero I/O.
//! It turns noisy 127-bit biometric captures into reproducible 256-bit
//! keys (BCH-based fuzzy extractor), composes per-finger keys into one
//! master key under a quality-gated fallback policy, and defines the
//! public helper-data wire format.
//!
//! All secret material is zeroized on drop; comparisons on secrets run in
//! constant time; the CSPRNG is injected so enrollment is testable with
//! seeded generators.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;

pub mod vector;

mod gf;
pub mod bch;

pub mod helper;
pub mod extractor;

pub mod aggregate;

pub use aggregate::{
    aggregate, revoke, rotate, AggregationMode, AggregationPolicy, AggregationResult, FingerKey,
    MASTER_KEY_LEN, MAX_FINGERS, MIN_FINGERS,
};
pub use bch::{decode, encode, Decoded, CODEWORD_BITS, ERROR_CAPACITY, MESSAGE_BITS};
pub use error::CryptoError;
pub use extractor::{generate, reproduce, DOMAIN_LABEL, KEY_LEN};
pub use helper::{HelperBlob, HELPER_LEN, HELPER_VERSION};
pub use memory::{Key256, SecretBytes};
pub use vector::{BiometricVector, VECTOR_BITS, VECTOR_BYTES};
