//! Cardano DID derivation.
//!
//! A DID has the shape `did:cardano:<wallet_address>#<fragment>` where the
//! fragment is the URL-safe base64 encoding (no padding) of the BLAKE3
//! hash of the master key — exactly 43 characters for a 32-byte hash.
//! The fragment is deterministic in the master key: re-enrollment with
//! the same key set reproduces the same DID, rotation changes it.

use crate::error::DidError;
use data_encoding::BASE64URL_NOPAD;
use empreinte_crypto_core::{CryptoError, MASTER_KEY_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;

/// DID method name.
pub const DID_METHOD: &str = "cardano";

/// Length of a DID fragment (base64url of a 32-byte hash, no padding).
pub const FRAGMENT_LEN: usize = 43;

/// Address prefix on mainnet.
const MAINNET_PREFIX: &str = "addr1";

/// Address prefix on the test networks.
const TESTNET_PREFIX: &str = "addr_test1";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Cardano network an identifier is anchored on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production network (`addr1…` addresses).
    Mainnet,
    /// Pre-production test network (`addr_test1…` addresses).
    Preprod,
    /// Preview test network (`addr_test1…` addresses).
    Preview,
}

impl Network {
    /// Wire name of the network.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Preprod => "preprod",
            Self::Preview => "preview",
        }
    }

    /// The bech32 address prefix this network requires.
    #[must_use]
    pub const fn address_prefix(self) -> &'static str {
        match self {
            Self::Mainnet => MAINNET_PREFIX,
            Self::Preprod | Self::Preview => TESTNET_PREFIX,
        }
    }
}

/// A derived decentralized identifier — `did:cardano:<address>#<fragment>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DidIdentifier {
    network: Network,
    wallet_address: String,
    fragment: String,
}

impl DidIdentifier {
    /// Derive the DID for a master key anchored at a wallet address.
    ///
    /// # Errors
    ///
    /// Returns [`DidError::InvalidAddress`] for a malformed address or a
    /// network/prefix mismatch, and a crypto [`CryptoError::InvalidInput`]
    /// if the master key is not 32 bytes.
    pub fn derive(
        network: Network,
        wallet_address: &str,
        master_key: &[u8],
    ) -> Result<Self, DidError> {
        validate_address(wallet_address)?;
        if !wallet_address.starts_with(network.address_prefix()) {
            return Err(DidError::InvalidAddress {
                address: wallet_address.to_owned(),
                reason: "address prefix does not match the declared network",
            });
        }
        let fragment = id_hash(master_key)?;
        Ok(Self {
            network,
            wallet_address: wallet_address.to_owned(),
            fragment,
        })
    }

    /// Parse and validate a `did:cardano:<address>#<fragment>` string.
    ///
    /// The caller supplies the network: the address prefix distinguishes
    /// mainnet from the test networks, but preprod and preview share a
    /// prefix, so the string alone cannot name the network.
    ///
    /// # Errors
    ///
    /// Returns [`DidError::InvalidInput`] for a malformed DID shape and
    /// [`DidError::InvalidAddress`] for an address or prefix violation.
    pub fn parse(did: &str, network: Network) -> Result<Self, DidError> {
        let rest = did
            .strip_prefix("did:cardano:")
            .ok_or_else(|| DidError::InvalidInput {
                field: "did",
                reason: format!("{did:?} does not start with \"did:cardano:\""),
            })?;
        let (address, fragment) = rest.split_once('#').ok_or_else(|| DidError::InvalidInput {
            field: "did",
            reason: "missing #fragment separator".to_owned(),
        })?;
        if fragment.len() != FRAGMENT_LEN
            || !fragment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(DidError::InvalidInput {
                field: "did fragment",
                reason: format!(
                    "expected {FRAGMENT_LEN} base64url characters, got {:?}",
                    fragment
                ),
            });
        }
        validate_address(address)?;
        if !address.starts_with(network.address_prefix()) {
            return Err(DidError::InvalidAddress {
                address: address.to_owned(),
                reason: "address prefix does not match the declared network",
            });
        }
        Ok(Self {
            network,
            wallet_address: address.to_owned(),
            fragment: fragment.to_owned(),
        })
    }

    /// Network this identifier lives on.
    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    /// The anchoring wallet address.
    #[must_use]
    pub fn wallet_address(&self) -> &str {
        &self.wallet_address
    }

    /// The key-derived fragment (43 base64url characters).
    #[must_use]
    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}

impl fmt::Display for DidIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "did:{DID_METHOD}:{}#{}",
            self.wallet_address, self.fragment
        )
    }
}

// ---------------------------------------------------------------------------
// Derivation and validation helpers
// ---------------------------------------------------------------------------

/// Full identity hash: `base64url(BLAKE3(master_key))`, 43 characters.
///
/// # Errors
///
/// Returns a crypto [`CryptoError::InvalidInput`] if the key is not
/// exactly 32 bytes.
pub fn id_hash(master_key: &[u8]) -> Result<String, DidError> {
    if master_key.len() != MASTER_KEY_LEN {
        return Err(CryptoError::InvalidInput {
            field: "master key length",
            observed: master_key.len(),
            expected: MASTER_KEY_LEN,
        }
        .into());
    }
    let digest = blake3::hash(master_key);
    let encoded = BASE64URL_NOPAD.encode(digest.as_bytes());
    debug_assert_eq!(encoded.len(), FRAGMENT_LEN);
    Ok(encoded)
}

/// Validate the Cardano address shape `^(addr1|addr_test1)[0-9a-z]+$`.
///
/// # Errors
///
/// Returns [`DidError::InvalidAddress`] naming the violated rule.
pub fn validate_address(address: &str) -> Result<(), DidError> {
    let body = address
        .strip_prefix(TESTNET_PREFIX)
        .or_else(|| address.strip_prefix(MAINNET_PREFIX))
        .ok_or_else(|| DidError::InvalidAddress {
            address: address.to_owned(),
            reason: "missing addr1 or addr_test1 prefix",
        })?;
    if body.is_empty() {
        return Err(DidError::InvalidAddress {
            address: address.to_owned(),
            reason: "nothing follows the prefix",
        });
    }
    if !body
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    {
        return Err(DidError::InvalidAddress {
            address: address.to_owned(),
            reason: "body contains characters outside [0-9a-z]",
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
