//! Ledger metadata payload — assembly, validation, size policy, exports.
//!
//! This module provides:
//! - [`MetadataPayload`] — the validated, versioned payload linking a DID
//!   to its helper data
//! - [`HelperEntry`] — one helper blob encoded for JSON transport
//! - [`SizeReport`] — pre-flight size estimate against the on-chain budget
//!
//! # Wire form
//!
//! The ledger files transaction metadata under an integer label (default
//! 1990). The wallet form is a single-key map ready to become that field:
//!
//! ```json
//! {
//!   "1990": {
//!     "version": 1,
//!     "walletAddress": "addr1…",
//!     "biometric": {
//!       "idHash": "…",
//!       "helperStorage": "inline",
//!       "helperData": [ { "fingerId": "…", "salt": "…", … } ],
//!       "fingerprintCount": 2,
//!       "aggregationMode": "N/N"
//!     }
//!   }
//! }
//! ```
//!
//! External storage replaces `helperData` with `helperUri` + `helperHash`.
//! Exactly one of the two shapes is valid; keys are treated as a set, so
//! ordering never affects semantics.
//!
//! # Size policy
//!
//! Hard limit 16 KiB (a build above it fails with
//! [`DidError::SizeLimitExceeded`]); soft limit 8 KiB, surfaced through
//! [`SizeReport::soft_limit_exceeded`] so callers can switch to external
//! storage before submitting.

use crate::did::{id_hash, validate_address, DidIdentifier};
use crate::error::DidError;
use data_encoding::BASE64URL_NOPAD;
use empreinte_crypto_core::helper::{HelperBlob, HELPER_VERSION};
use empreinte_crypto_core::{AggregationMode, MAX_FINGERS, MIN_FINGERS};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Current metadata schema version.
pub const METADATA_VERSION: u16 = 1;

/// Default ledger metadata label.
pub const DEFAULT_LABEL: u64 = 1990;

/// Hard serialized-size limit in bytes (16 KiB).
pub const HARD_SIZE_LIMIT: usize = 16 * 1024;

/// Soft serialized-size limit in bytes (8 KiB) — crossing it is a warning.
pub const SOFT_SIZE_LIMIT: usize = 8 * 1024;

/// URI schemes accepted for external helper storage.
const ALLOWED_URI_SCHEMES: [&str; 3] = ["http", "https", "ipfs"];

/// Length of an external content hash: 32 bytes as lowercase hex.
const HELPER_HASH_HEX_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where the helper blobs live relative to the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HelperStorage {
    /// Helper entries are embedded in the payload.
    Inline,
    /// Helper data lives in a CAS backend; the payload carries URI + hash.
    External,
}

impl HelperStorage {
    /// Wire name of the storage mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::External => "external",
        }
    }
}

/// One helper blob encoded for JSON transport.
///
/// Byte fields are base64url without padding. The `codeword` key carries
/// the secure-sketch parity offset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HelperEntry {
    /// Identifier of the finger this blob belongs to.
    #[serde(rename = "fingerId")]
    pub finger_id: String,
    /// Helper format version.
    pub version: u8,
    /// Base64url-encoded 32-byte salt.
    pub salt: String,
    /// Base64url-encoded 32-byte personalization.
    pub personalization: String,
    /// Base64url-encoded 8-byte sketch.
    #[serde(rename = "codeword")]
    pub sketch: String,
    /// Base64url-encoded 32-byte tag.
    pub tag: String,
}

impl HelperEntry {
    /// Encode a helper blob for transport.
    #[must_use]
    pub fn from_blob(finger_id: impl Into<String>, blob: &HelperBlob) -> Self {
        Self {
            finger_id: finger_id.into(),
            version: blob.version,
            salt: BASE64URL_NOPAD.encode(&blob.salt),
            personalization: BASE64URL_NOPAD.encode(&blob.personalization),
            sketch: BASE64URL_NOPAD.encode(&blob.sketch),
            tag: BASE64URL_NOPAD.encode(&blob.tag),
        }
    }

    /// Decode back into a [`HelperBlob`].
    ///
    /// The blob's tag is *not* verified here — integrity is checked at
    /// reproduction time, when it matters.
    ///
    /// # Errors
    ///
    /// Returns [`DidError::InvalidInput`] if any field is not valid
    /// base64url of the expected width.
    pub fn to_blob(&self) -> Result<HelperBlob, DidError> {
        Ok(HelperBlob {
            version: self.version,
            salt: decode_fixed("helper entry salt", &self.salt)?,
            personalization: decode_fixed("helper entry personalization", &self.personalization)?,
            sketch: decode_fixed("helper entry codeword", &self.sketch)?,
            tag: decode_fixed("helper entry tag", &self.tag)?,
        })
    }
}

/// Decode a base64url field into an exact-width array.
fn decode_fixed<const N: usize>(field: &'static str, encoded: &str) -> Result<[u8; N], DidError> {
    let bytes = BASE64URL_NOPAD
        .decode(encoded.as_bytes())
        .map_err(|e| DidError::InvalidInput {
            field,
            reason: format!("invalid base64url: {e}"),
        })?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| DidError::InvalidInput {
        field,
        reason: format!("observed {len} bytes, expected {N}"),
    })
}

/// Pre-flight size estimate for a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct SizeReport {
    /// Exact serialized length of the wallet form, in bytes.
    pub serialized_len: usize,
    /// Whether the payload crossed the 8 KiB soft limit — prefer external
    /// storage when it did.
    pub soft_limit_exceeded: bool,
}

/// A validated metadata payload.
///
/// Construct via [`MetadataPayload::inline`] or
/// [`MetadataPayload::external`]; every constructor (and
/// [`MetadataPayload::from_wallet_map`]) enforces the full schema rule
/// set, so a value of this type is always exportable.
#[derive(Clone, Debug, PartialEq)]
pub struct MetadataPayload {
    label: u64,
    version: u16,
    wallet_address: String,
    id_hash: String,
    storage: HelperStorage,
    helper_entries: Vec<HelperEntry>,
    helper_uri: Option<String>,
    helper_hash: Option<String>,
    finger_count: usize,
    mode: AggregationMode,
}

impl MetadataPayload {
    /// Build an inline payload: helper entries travel with the metadata.
    ///
    /// The finger count is the number of entries — they are the same thing
    /// by construction.
    ///
    /// # Errors
    ///
    /// Any violation of the schema rules (address shape, finger-count
    /// bounds, mode consistency, size budget) is returned as the matching
    /// [`DidError`] variant.
    pub fn inline(
        wallet_address: &str,
        master_key: &[u8],
        entries: Vec<HelperEntry>,
        mode: AggregationMode,
    ) -> Result<Self, DidError> {
        let payload = Self {
            label: DEFAULT_LABEL,
            version: METADATA_VERSION,
            wallet_address: wallet_address.to_owned(),
            id_hash: id_hash(master_key)?,
            storage: HelperStorage::Inline,
            finger_count: entries.len(),
            helper_entries: entries,
            helper_uri: None,
            helper_hash: None,
            mode,
        };
        payload.validate()?;
        Ok(payload)
    }

    /// Build an external payload: helper data lives behind a URI, pinned
    /// by a content hash.
    ///
    /// # Errors
    ///
    /// Any violation of the schema rules (address shape, URI scheme,
    /// hash shape, finger-count bounds, mode consistency) is returned as
    /// the matching [`DidError`] variant.
    pub fn external(
        wallet_address: &str,
        master_key: &[u8],
        helper_uri: &str,
        helper_hash: &str,
        finger_count: usize,
        mode: AggregationMode,
    ) -> Result<Self, DidError> {
        let payload = Self {
            label: DEFAULT_LABEL,
            version: METADATA_VERSION,
            wallet_address: wallet_address.to_owned(),
            id_hash: id_hash(master_key)?,
            storage: HelperStorage::External,
            helper_entries: Vec::new(),
            helper_uri: Some(helper_uri.to_owned()),
            helper_hash: Some(helper_hash.to_owned()),
            finger_count,
            mode,
        };
        payload.validate()?;
        Ok(payload)
    }

    /// Re-file the payload under a non-default ledger label.
    ///
    /// # Errors
    ///
    /// Returns [`DidError::SizeLimitExceeded`] if the longer label key
    /// pushes the payload over the hard budget.
    pub fn with_label(mut self, label: u64) -> Result<Self, DidError> {
        self.label = label;
        self.validate()?;
        Ok(self)
    }

    // -- accessors --

    /// Ledger label the payload is filed under.
    #[must_use]
    pub const fn label(&self) -> u64 {
        self.label
    }

    /// Schema version.
    #[must_use]
    pub const fn version(&self) -> u16 {
        self.version
    }

    /// Anchoring wallet address.
    #[must_use]
    pub fn wallet_address(&self) -> &str {
        &self.wallet_address
    }

    /// Full base64url identity hash of the master key.
    #[must_use]
    pub fn id_hash(&self) -> &str {
        &self.id_hash
    }

    /// Helper storage mode.
    #[must_use]
    pub const fn storage(&self) -> HelperStorage {
        self.storage
    }

    /// Inline helper entries (empty for external storage).
    #[must_use]
    pub fn helper_entries(&self) -> &[HelperEntry] {
        &self.helper_entries
    }

    /// External helper URI, if any.
    #[must_use]
    pub fn helper_uri(&self) -> Option<&str> {
        self.helper_uri.as_deref()
    }

    /// External content hash, if any.
    #[must_use]
    pub fn helper_hash(&self) -> Option<&str> {
        self.helper_hash.as_deref()
    }

    /// Number of enrolled fingers.
    #[must_use]
    pub const fn finger_count(&self) -> usize {
        self.finger_count
    }

    /// Aggregation mode the enrollment used.
    #[must_use]
    pub const fn mode(&self) -> AggregationMode {
        self.mode
    }

    // -- validation --

    /// Enforce every schema rule, ending with the hard size budget.
    ///
    /// # Errors
    ///
    /// One [`DidError`] variant per violated rule; see the module docs.
    pub fn validate(&self) -> Result<(), DidError> {
        if self.version != METADATA_VERSION {
            return Err(DidError::VersionUnsupported {
                observed: self.version,
                supported: METADATA_VERSION,
            });
        }
        validate_address(&self.wallet_address)?;

        if self.finger_count < MIN_FINGERS || self.finger_count > MAX_FINGERS {
            return Err(DidError::InvalidInput {
                field: "fingerprint count",
                reason: format!(
                    "observed {}, expected {MIN_FINGERS}..={MAX_FINGERS}",
                    self.finger_count
                ),
            });
        }

        match self.storage {
            HelperStorage::Inline => {
                if self.helper_uri.is_some() || self.helper_hash.is_some() {
                    return Err(DidError::InvalidInput {
                        field: "helper storage",
                        reason: "inline payload must not carry helperUri or helperHash".to_owned(),
                    });
                }
                if self.helper_entries.len() != self.finger_count {
                    return Err(DidError::InvalidInput {
                        field: "helper entries",
                        reason: format!(
                            "observed {} entries, expected {} (the fingerprint count)",
                            self.helper_entries.len(),
                            self.finger_count
                        ),
                    });
                }
                for entry in &self.helper_entries {
                    if entry.version != HELPER_VERSION {
                        return Err(DidError::VersionUnsupported {
                            observed: u16::from(entry.version),
                            supported: u16::from(HELPER_VERSION),
                        });
                    }
                }
            }
            HelperStorage::External => {
                if !self.helper_entries.is_empty() {
                    return Err(DidError::InvalidInput {
                        field: "helper storage",
                        reason: "external payload must not carry inline helperData".to_owned(),
                    });
                }
                let uri = self.helper_uri.as_deref().ok_or(DidError::InvalidInput {
                    field: "helper uri",
                    reason: "external payload requires helperUri".to_owned(),
                })?;
                validate_uri(uri)?;
                let hash = self.helper_hash.as_deref().ok_or(DidError::InvalidInput {
                    field: "helper hash",
                    reason: "external payload requires helperHash".to_owned(),
                })?;
                validate_helper_hash(hash)?;
            }
        }

        if self.mode != AggregationMode::Full && self.finger_count != 4 {
            return Err(DidError::InvalidInput {
                field: "aggregation mode",
                reason: format!(
                    "mode {:?} requires 4 enrolled fingers, observed {}",
                    self.mode.as_str(),
                    self.finger_count
                ),
            });
        }

        let size = self.serialized_len()?;
        if size > HARD_SIZE_LIMIT {
            return Err(DidError::SizeLimitExceeded {
                size,
                limit: HARD_SIZE_LIMIT,
            });
        }
        Ok(())
    }

    /// Estimate the serialized size before submission.
    ///
    /// # Errors
    ///
    /// Returns [`DidError::Serialization`] if JSON assembly fails.
    pub fn size_report(&self) -> Result<SizeReport, DidError> {
        let serialized_len = self.serialized_len()?;
        Ok(SizeReport {
            serialized_len,
            soft_limit_exceeded: serialized_len > SOFT_SIZE_LIMIT,
        })
    }

    // -- exports --

    /// Wallet form: a single-entry map keyed by the ledger label, ready to
    /// become a transaction-metadata field.
    ///
    /// # Errors
    ///
    /// Returns [`DidError::Serialization`] if JSON assembly fails.
    pub fn to_wallet_map(&self) -> Result<Value, DidError> {
        let mut map = Map::new();
        map.insert(self.label.to_string(), self.inner_payload()?);
        Ok(Value::Object(map))
    }

    /// Wallet-API form: `{ "did": …, "metadata": … }` for programmatic
    /// wallet consumers. The `metadata` value is byte-identical to the
    /// wallet form (both wrap the same inner payload).
    ///
    /// # Errors
    ///
    /// Returns [`DidError::Serialization`] if JSON assembly fails.
    pub fn to_wallet_api(&self, did: &DidIdentifier) -> Result<Value, DidError> {
        Ok(json!({
            "did": did.to_string(),
            "metadata": self.to_wallet_map()?,
        }))
    }

    /// Decode and validate a wallet-form map back into a payload.
    ///
    /// Key order is irrelevant; the map is treated as a set of fields.
    ///
    /// # Errors
    ///
    /// Returns [`DidError::InvalidInput`] (or the specific variant for the
    /// violated rule) if the map is not a valid wallet form.
    pub fn from_wallet_map(value: &Value) -> Result<Self, DidError> {
        let outer = value.as_object().ok_or_else(|| DidError::InvalidInput {
            field: "wallet map",
            reason: "expected a JSON object".to_owned(),
        })?;
        if outer.len() != 1 {
            return Err(DidError::InvalidInput {
                field: "wallet map",
                reason: format!("expected exactly one label key, observed {}", outer.len()),
            });
        }
        let (label_key, inner) = outer.iter().next().ok_or_else(|| DidError::InvalidInput {
            field: "wallet map",
            reason: "expected exactly one label key, observed 0".to_owned(),
        })?;
        let label: u64 = label_key.parse().map_err(|_| DidError::InvalidInput {
            field: "metadata label",
            reason: format!("expected an integer key, observed {label_key:?}"),
        })?;

        let inner = inner.as_object().ok_or_else(|| DidError::InvalidInput {
            field: "metadata payload",
            reason: "expected a JSON object under the label".to_owned(),
        })?;

        let version_raw = require_u64(inner, "version")?;
        let version = u16::try_from(version_raw).map_err(|_| DidError::VersionUnsupported {
            observed: u16::MAX,
            supported: METADATA_VERSION,
        })?;
        let wallet_address = require_str(inner, "walletAddress")?.to_owned();

        let biometric = inner
            .get("biometric")
            .and_then(Value::as_object)
            .ok_or_else(|| DidError::InvalidInput {
                field: "biometric",
                reason: "missing or not an object".to_owned(),
            })?;

        let id_hash = require_str(biometric, "idHash")?.to_owned();
        let storage = match require_str(biometric, "helperStorage")? {
            "inline" => HelperStorage::Inline,
            "external" => HelperStorage::External,
            other => {
                return Err(DidError::InvalidInput {
                    field: "helperStorage",
                    reason: format!("observed {other:?}, expected \"inline\" or \"external\""),
                })
            }
        };

        let helper_entries = match biometric.get("helperData") {
            Some(entries) => serde_json::from_value(entries.clone()).map_err(|e| {
                DidError::InvalidInput {
                    field: "helperData",
                    reason: format!("invalid helper entry array: {e}"),
                }
            })?,
            None => Vec::new(),
        };
        let helper_uri = optional_str(biometric, "helperUri")?;
        let helper_hash = optional_str(biometric, "helperHash")?;

        let finger_count_raw = require_u64(biometric, "fingerprintCount")?;
        let finger_count =
            usize::try_from(finger_count_raw).map_err(|_| DidError::InvalidInput {
                field: "fingerprintCount",
                reason: format!("observed {finger_count_raw}, expected a small integer"),
            })?;

        let mode = match require_str(biometric, "aggregationMode")? {
            "N/N" => AggregationMode::Full,
            "3/4" => AggregationMode::Partial3Of4,
            "2/4" => AggregationMode::Partial2Of4,
            other => {
                return Err(DidError::InvalidInput {
                    field: "aggregationMode",
                    reason: format!("observed {other:?}, expected \"N/N\", \"3/4\", or \"2/4\""),
                })
            }
        };

        let payload = Self {
            label,
            version,
            wallet_address,
            id_hash,
            storage,
            helper_entries,
            helper_uri,
            helper_hash,
            finger_count,
            mode,
        };
        payload.validate()?;
        Ok(payload)
    }

    // -- internals --

    /// The inner payload map shared by both export forms.
    fn inner_payload(&self) -> Result<Value, DidError> {
        let mut biometric = Map::new();
        biometric.insert("idHash".to_owned(), json!(self.id_hash));
        biometric.insert("helperStorage".to_owned(), json!(self.storage.as_str()));
        match self.storage {
            HelperStorage::Inline => {
                let entries = serde_json::to_value(&self.helper_entries)
                    .map_err(|e| DidError::Serialization(e.to_string()))?;
                biometric.insert("helperData".to_owned(), entries);
            }
            HelperStorage::External => {
                biometric.insert("helperUri".to_owned(), json!(self.helper_uri));
                biometric.insert("helperHash".to_owned(), json!(self.helper_hash));
            }
        }
        biometric.insert("fingerprintCount".to_owned(), json!(self.finger_count));
        biometric.insert("aggregationMode".to_owned(), json!(self.mode.as_str()));

        Ok(json!({
            "version": self.version,
            "walletAddress": self.wallet_address,
            "biometric": Value::Object(biometric),
        }))
    }

    /// Exact serialized length of the wallet form.
    fn serialized_len(&self) -> Result<usize, DidError> {
        let bytes = serde_json::to_vec(&self.to_wallet_map()?)
            .map_err(|e| DidError::Serialization(e.to_string()))?;
        Ok(bytes.len())
    }
}

// ---------------------------------------------------------------------------
// Field validators
// ---------------------------------------------------------------------------

/// Accept only http, https, and ipfs URIs with a nonempty authority/path.
fn validate_uri(uri: &str) -> Result<(), DidError> {
    let Some((scheme, rest)) = uri.split_once("://") else {
        let scheme = uri.split(':').next().unwrap_or_default();
        return Err(DidError::InvalidUri {
            uri: uri.to_owned(),
            scheme: scheme.to_owned(),
        });
    };
    let lower = scheme.to_ascii_lowercase();
    if !ALLOWED_URI_SCHEMES.contains(&lower.as_str()) || rest.is_empty() {
        return Err(DidError::InvalidUri {
            uri: uri.to_owned(),
            scheme: scheme.to_owned(),
        });
    }
    Ok(())
}

/// Accept exactly 64 lowercase hex characters (a 32-byte digest).
fn validate_helper_hash(hash: &str) -> Result<(), DidError> {
    let well_formed = hash.len() == HELPER_HASH_HEX_LEN
        && hash
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if well_formed {
        Ok(())
    } else {
        Err(DidError::InvalidInput {
            field: "helper hash",
            reason: format!(
                "observed {} characters, expected {HELPER_HASH_HEX_LEN} lowercase hex",
                hash.len()
            ),
        })
    }
}

/// Fetch a required string field from a JSON map.
fn require_str<'a>(
    map: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, DidError> {
    map.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| DidError::InvalidInput {
            field,
            reason: "missing or not a string".to_owned(),
        })
}

/// Fetch a required unsigned integer field from a JSON map.
fn require_u64(map: &Map<String, Value>, field: &'static str) -> Result<u64, DidError> {
    map.get(field)
        .and_then(Value::as_u64)
        .ok_or_else(|| DidError::InvalidInput {
            field,
            reason: "missing or not an unsigned integer".to_owned(),
        })
}

/// Fetch an optional string field from a JSON map.
fn optional_str(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, DidError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(DidError::InvalidInput {
            field,
            reason: "present but not a string".to_owned(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use empreinte_crypto_core::helper::{PERSONALIZATION_LEN, SALT_LEN, SKETCH_LEN};

    const MASTER_KEY: [u8; 32] = [0x42; 32];
    const ADDR: &str = "addr1qx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzer3n0d3vllmyqw";

    fn sample_entries(count: usize) -> Vec<HelperEntry> {
        (0..count)
            .map(|i| {
                let blob = HelperBlob::seal(
                    [i as u8; SALT_LEN],
                    [0x22; PERSONALIZATION_LEN],
                    [0x44; SKETCH_LEN],
                );
                HelperEntry::from_blob(format!("finger-{i}"), &blob)
            })
            .collect()
    }

    fn sample_hash() -> String {
        "ab".repeat(32)
    }

    #[test]
    fn inline_payload_builds_and_validates() {
        let payload = MetadataPayload::inline(
            ADDR,
            &MASTER_KEY,
            sample_entries(2),
            AggregationMode::Full,
        )
        .expect("inline payload should build");
        assert_eq!(payload.finger_count(), 2);
        assert_eq!(payload.storage(), HelperStorage::Inline);
        assert_eq!(payload.label(), DEFAULT_LABEL);
        assert_eq!(payload.id_hash().len(), 43);
    }

    #[test]
    fn external_payload_builds_and_validates() {
        let payload = MetadataPayload::external(
            ADDR,
            &MASTER_KEY,
            "ipfs://QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG",
            &sample_hash(),
            4,
            AggregationMode::Partial3Of4,
        )
        .expect("external payload should build");
        assert_eq!(payload.storage(), HelperStorage::External);
        assert!(payload.helper_entries().is_empty());
    }

    #[test]
    fn helper_entry_roundtrips_through_base64() {
        let blob = HelperBlob::seal(
            [0xA1; SALT_LEN],
            [0xB2; PERSONALIZATION_LEN],
            [0x1C; SKETCH_LEN],
        );
        let entry = HelperEntry::from_blob("right-thumb", &blob);
        let decoded = entry.to_blob().expect("decode should succeed");
        assert_eq!(decoded, blob);
        decoded.verify_tag().expect("tag must survive the roundtrip");
    }

    #[test]
    fn helper_entry_rejects_wrong_width_fields() {
        let blob = HelperBlob::seal([0; SALT_LEN], [0; PERSONALIZATION_LEN], [0; SKETCH_LEN]);
        let mut entry = HelperEntry::from_blob("x", &blob);
        entry.salt = BASE64URL_NOPAD.encode(&[0u8; 16]);
        assert!(matches!(
            entry.to_blob(),
            Err(DidError::InvalidInput {
                field: "helper entry salt",
                ..
            })
        ));

        let mut entry = HelperEntry::from_blob("x", &blob);
        entry.tag = "!!!not-base64!!!".to_owned();
        assert!(matches!(
            entry.to_blob(),
            Err(DidError::InvalidInput {
                field: "helper entry tag",
                ..
            })
        ));
    }

    #[test]
    fn rejects_bad_address() {
        let result = MetadataPayload::inline(
            "stake1abc",
            &MASTER_KEY,
            sample_entries(2),
            AggregationMode::Full,
        );
        assert!(matches!(result, Err(DidError::InvalidAddress { .. })));
    }

    #[test]
    fn rejects_out_of_range_finger_count() {
        let result = MetadataPayload::inline(
            ADDR,
            &MASTER_KEY,
            sample_entries(1),
            AggregationMode::Full,
        );
        assert!(matches!(
            result,
            Err(DidError::InvalidInput {
                field: "fingerprint count",
                ..
            })
        ));

        let result = MetadataPayload::external(
            ADDR,
            &MASTER_KEY,
            "https://example.com/helpers",
            &sample_hash(),
            11,
            AggregationMode::Full,
        );
        assert!(matches!(
            result,
            Err(DidError::InvalidInput {
                field: "fingerprint count",
                ..
            })
        ));
    }

    #[test]
    fn rejects_partial_mode_without_four_fingers() {
        let result = MetadataPayload::inline(
            ADDR,
            &MASTER_KEY,
            sample_entries(3),
            AggregationMode::Partial3Of4,
        );
        assert!(matches!(
            result,
            Err(DidError::InvalidInput {
                field: "aggregation mode",
                ..
            })
        ));
    }

    #[test]
    fn rejects_disallowed_uri_schemes() {
        for uri in [
            "file:///etc/passwd",
            "javascript:alert(1)",
            "ftp://example.com/x",
            "ipfs:QmMissingSlashes",
            "https://",
            "no-scheme-at-all",
        ] {
            let result = MetadataPayload::external(
                ADDR,
                &MASTER_KEY,
                uri,
                &sample_hash(),
                2,
                AggregationMode::Full,
            );
            assert!(
                matches!(result, Err(DidError::InvalidUri { .. })),
                "{uri} must be rejected"
            );
        }
    }

    #[test]
    fn accepts_allowed_uri_schemes() {
        for uri in [
            "https://example.com/helpers.bin",
            "http://example.com/h",
            "ipfs://QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG",
        ] {
            MetadataPayload::external(
                ADDR,
                &MASTER_KEY,
                uri,
                &sample_hash(),
                2,
                AggregationMode::Full,
            )
            .unwrap_or_else(|e| panic!("{uri} must be accepted: {e}"));
        }
    }

    #[test]
    fn rejects_malformed_helper_hash() {
        for hash in ["", "abcd", &"AB".repeat(32), &"zz".repeat(32)] {
            let result = MetadataPayload::external(
                ADDR,
                &MASTER_KEY,
                "https://example.com/h",
                hash,
                2,
                AggregationMode::Full,
            );
            assert!(
                matches!(
                    result,
                    Err(DidError::InvalidInput {
                        field: "helper hash",
                        ..
                    })
                ),
                "{hash:?} must be rejected"
            );
        }
    }

    #[test]
    fn wallet_map_uses_the_label_key() {
        let payload = MetadataPayload::inline(
            ADDR,
            &MASTER_KEY,
            sample_entries(2),
            AggregationMode::Full,
        )
        .expect("payload should build");
        let map = payload.to_wallet_map().expect("export should succeed");
        assert!(map.get("1990").is_some());

        let relabeled = payload.with_label(721).expect("relabel should succeed");
        let map = relabeled.to_wallet_map().expect("export should succeed");
        assert!(map.get("721").is_some());
        assert!(map.get("1990").is_none());
    }

    #[test]
    fn wallet_api_form_embeds_the_identical_inner_payload() {
        let payload = MetadataPayload::inline(
            ADDR,
            &MASTER_KEY,
            sample_entries(2),
            AggregationMode::Full,
        )
        .expect("payload should build");
        let did = DidIdentifier::derive(crate::did::Network::Mainnet, ADDR, &MASTER_KEY)
            .expect("did should derive");

        let wallet = payload.to_wallet_map().expect("wallet form");
        let api = payload.to_wallet_api(&did).expect("wallet-api form");

        assert_eq!(api.get("metadata"), Some(&wallet));
        assert_eq!(
            api.get("did").and_then(Value::as_str),
            Some(did.to_string().as_str())
        );
        // byte-level equivalence of the inner payload
        let inner_a = serde_json::to_vec(wallet.get("1990").expect("label key"))
            .expect("serialize");
        let inner_b = serde_json::to_vec(
            api.get("metadata")
                .and_then(|m| m.get("1990"))
                .expect("label key"),
        )
        .expect("serialize");
        assert_eq!(inner_a, inner_b);
    }

    #[test]
    fn wallet_map_roundtrip_preserves_the_payload() {
        let inline = MetadataPayload::inline(
            ADDR,
            &MASTER_KEY,
            sample_entries(3),
            AggregationMode::Full,
        )
        .expect("payload should build");
        let decoded = MetadataPayload::from_wallet_map(&inline.to_wallet_map().expect("export"))
            .expect("decode should succeed");
        assert_eq!(decoded, inline);

        let external = MetadataPayload::external(
            ADDR,
            &MASTER_KEY,
            "ipfs://QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG",
            &sample_hash(),
            4,
            AggregationMode::Partial2Of4,
        )
        .expect("payload should build");
        let decoded =
            MetadataPayload::from_wallet_map(&external.to_wallet_map().expect("export"))
                .expect("decode should succeed");
        assert_eq!(decoded, external);
    }

    #[test]
    fn from_wallet_map_rejects_inline_and_external_mixed() {
        let payload = MetadataPayload::inline(
            ADDR,
            &MASTER_KEY,
            sample_entries(2),
            AggregationMode::Full,
        )
        .expect("payload should build");
        let mut map = payload.to_wallet_map().expect("export");

        // Smuggle external fields into an inline payload.
        let biometric = map
            .get_mut("1990")
            .and_then(|v| v.get_mut("biometric"))
            .and_then(Value::as_object_mut)
            .expect("biometric object");
        biometric.insert("helperUri".to_owned(), json!("https://example.com/h"));
        biometric.insert("helperHash".to_owned(), json!(sample_hash()));

        let result = MetadataPayload::from_wallet_map(&map);
        assert!(matches!(
            result,
            Err(DidError::InvalidInput {
                field: "helper storage",
                ..
            })
        ));
    }

    #[test]
    fn from_wallet_map_rejects_neither_inline_nor_external_data() {
        let payload = MetadataPayload::external(
            ADDR,
            &MASTER_KEY,
            "https://example.com/h",
            &sample_hash(),
            2,
            AggregationMode::Full,
        )
        .expect("payload should build");
        let mut map = payload.to_wallet_map().expect("export");

        let biometric = map
            .get_mut("1990")
            .and_then(|v| v.get_mut("biometric"))
            .and_then(Value::as_object_mut)
            .expect("biometric object");
        biometric.remove("helperUri");
        biometric.remove("helperHash");

        let result = MetadataPayload::from_wallet_map(&map);
        assert!(matches!(
            result,
            Err(DidError::InvalidInput {
                field: "helper uri",
                ..
            })
        ));
    }

    #[test]
    fn from_wallet_map_rejects_future_version() {
        let payload = MetadataPayload::inline(
            ADDR,
            &MASTER_KEY,
            sample_entries(2),
            AggregationMode::Full,
        )
        .expect("payload should build");
        let mut map = payload.to_wallet_map().expect("export");
        let inner = map
            .get_mut("1990")
            .and_then(Value::as_object_mut)
            .expect("inner object");
        inner.insert("version".to_owned(), json!(2));

        let result = MetadataPayload::from_wallet_map(&map);
        assert!(matches!(
            result,
            Err(DidError::VersionUnsupported {
                observed: 2,
                supported: 1
            })
        ));
    }

    #[test]
    fn from_wallet_map_rejects_multi_label_maps() {
        let payload = MetadataPayload::inline(
            ADDR,
            &MASTER_KEY,
            sample_entries(2),
            AggregationMode::Full,
        )
        .expect("payload should build");
        let mut map = payload.to_wallet_map().expect("export");
        if let Value::Object(obj) = &mut map {
            obj.insert("674".to_owned(), json!({"msg": ["hello"]}));
        }
        assert!(matches!(
            MetadataPayload::from_wallet_map(&map),
            Err(DidError::InvalidInput {
                field: "wallet map",
                ..
            })
        ));
    }

    #[test]
    fn size_report_reflects_serialized_length() {
        let payload = MetadataPayload::inline(
            ADDR,
            &MASTER_KEY,
            sample_entries(2),
            AggregationMode::Full,
        )
        .expect("payload should build");
        let report = payload.size_report().expect("report should build");
        let bytes =
            serde_json::to_vec(&payload.to_wallet_map().expect("export")).expect("serialize");
        assert_eq!(report.serialized_len, bytes.len());
        assert!(!report.soft_limit_exceeded);
    }
}
