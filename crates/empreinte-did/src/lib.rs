//! `empreinte-did` — Cardano DID derivation and ledger metadata building.
//!
//! Sits on top of `empreinte-crypto-core`: takes the aggregated master key
//! and the public helper blobs and produces (a) a deterministic
//! `did:cardano:…` identifier and (b) a validated, size-bounded metadata
//! payload in the ledger's integer-labelled transaction-metadata shape.
//!
//! No I/O happens here — storage backends and transaction submission are
//! the embedder's concern.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod did;
pub mod error;
pub mod metadata;

pub use did::{id_hash, validate_address, DidIdentifier, Network, DID_METHOD, FRAGMENT_LEN};
pub use error::DidError;
pub use metadata::{
    HelperEntry, HelperStorage, MetadataPayload, SizeReport, DEFAULT_LABEL, HARD_SIZE_LIMIT,
    METADATA_VERSION, SOFT_SIZE_LIMIT,
};
