//! Helper-data wire format — version, salt, personalization, sketch, tag.
//!
//! A [`HelperBlob`] is the public output of enrollment. It is stored
//! off-band (or inline in ledger metadata) and later drives key
//! reproduction. The blob is public but tamper-evident: a keyed BLAKE3
//! tag over the header fields is verified — in constant time — before any
//! biometric processing happens.
//!
//! # v1 byte layout (MSB-first within bytes)
//!
//! ```text
//! | Offset | Size | Field                                       |
//! |--------|------|---------------------------------------------|
//! | 0      | 1    | version (= 1)                               |
//! | 1      | 32   | salt                                        |
//! | 33     | 32   | personalization                             |
//! | 65     | 8    | sketch (63 parity-offset bits + 1 pad bit)  |
//! | 73     | 32   | tag                                         |
//! ```
//!
//! Total: 105 bytes. The sketch is `codeword[64..127] XOR vector[64..127]`
//! — the secure-sketch parity offset; the biometric vector itself is never
//! stored.

use crate::error::CryptoError;
use crate::memory::constant_time_eq;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Current helper-data format version.
pub const HELPER_VERSION: u8 = 1;

/// Salt length in bytes.
pub const SALT_LEN: usize = 32;

/// Personalization length in bytes.
pub const PERSONALIZATION_LEN: usize = 32;

/// Sketch length in bytes (63 parity-offset bits plus one zero pad bit).
pub const SKETCH_LEN: usize = 8;

/// Tag length in bytes.
pub const TAG_LEN: usize = 32;

/// Serialized v1 blob length.
pub const HELPER_LEN: usize = 1 + SALT_LEN + PERSONALIZATION_LEN + SKETCH_LEN + TAG_LEN;

/// Domain label mixed into the tag-key derivation.
const TAG_KEY_DOMAIN: &[u8] = b"helper-data-hmac";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Public helper data produced by enrollment.
///
/// Contains no secret material: the sketch leaks at most 63 bits about the
/// biometric vector, which the entropy budget accounts for. Integrity is
/// protected by `tag`; any modification is detected before the BCH decoder
/// runs.
#[must_use = "helper data must be stored for later reproduction"]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HelperBlob {
    /// Format version (currently 1).
    pub version: u8,
    /// Random per-enrollment salt — guarantees unlinkability.
    pub salt: [u8; SALT_LEN],
    /// Hash of the domain label and user tag.
    pub personalization: [u8; PERSONALIZATION_LEN],
    /// Parity offset of the enrolled vector (secure sketch).
    pub sketch: [u8; SKETCH_LEN],
    /// Keyed BLAKE3 tag over version ‖ salt ‖ personalization ‖ sketch.
    pub tag: [u8; TAG_LEN],
}

impl HelperBlob {
    /// Assemble a v1 blob, computing the integrity tag over the header.
    ///
    /// Enrollment calls this; it is public so transport layers can
    /// re-seal a blob they reassembled from encoded fields.
    pub fn seal(
        salt: [u8; SALT_LEN],
        personalization: [u8; PERSONALIZATION_LEN],
        sketch: [u8; SKETCH_LEN],
    ) -> Self {
        let tag = compute_tag(HELPER_VERSION, &salt, &personalization, &sketch);
        Self {
            version: HELPER_VERSION,
            salt,
            personalization,
            sketch,
            tag,
        }
    }

    /// Verify the integrity tag in constant time.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Integrity`] if the stored tag does not match
    /// the tag recomputed from the header fields.
    pub fn verify_tag(&self) -> Result<(), CryptoError> {
        let expected = compute_tag(self.version, &self.salt, &self.personalization, &self.sketch);
        if constant_time_eq(&expected, &self.tag) {
            Ok(())
        } else {
            Err(CryptoError::Integrity)
        }
    }

    /// Serialize to the v1 wire layout (105 bytes).
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HELPER_LEN] {
        let mut out = [0u8; HELPER_LEN];
        out[0] = self.version;
        out[1..33].copy_from_slice(&self.salt);
        out[33..65].copy_from_slice(&self.personalization);
        out[65..73].copy_from_slice(&self.sketch);
        out[73..105].copy_from_slice(&self.tag);
        out
    }

    /// Parse a blob from its wire layout.
    ///
    /// The version byte is gated first so that a future-format blob fails
    /// with [`CryptoError::VersionUnsupported`] rather than a length error.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidInput`] for an empty or wrong-length
    /// input and [`CryptoError::VersionUnsupported`] for any version other
    /// than 1. The tag is *not* verified here — [`Self::verify_tag`] runs
    /// at reproduction time.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CryptoError> {
        let Some(&version) = data.first() else {
            return Err(CryptoError::InvalidInput {
                field: "helper blob length",
                observed: 0,
                expected: HELPER_LEN,
            });
        };
        if version != HELPER_VERSION {
            return Err(CryptoError::VersionUnsupported {
                observed: version,
                supported: HELPER_VERSION,
            });
        }
        if data.len() != HELPER_LEN {
            return Err(CryptoError::InvalidInput {
                field: "helper blob length",
                observed: data.len(),
                expected: HELPER_LEN,
            });
        }

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&data[1..33]);
        let mut personalization = [0u8; PERSONALIZATION_LEN];
        personalization.copy_from_slice(&data[33..65]);
        let mut sketch = [0u8; SKETCH_LEN];
        sketch.copy_from_slice(&data[65..73]);
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&data[73..105]);

        Ok(Self {
            version,
            salt,
            personalization,
            sketch,
            tag,
        })
    }
}

/// Tag = keyed BLAKE3 over the header, with the key derived from the salt.
fn compute_tag(
    version: u8,
    salt: &[u8; SALT_LEN],
    personalization: &[u8; PERSONALIZATION_LEN],
    sketch: &[u8; SKETCH_LEN],
) -> [u8; TAG_LEN] {
    let mut key_input = blake3::Hasher::new();
    key_input.update(salt);
    key_input.update(TAG_KEY_DOMAIN);
    let tag_key: [u8; 32] = key_input.finalize().into();

    let mut header = blake3::Hasher::new_keyed(&tag_key);
    header.update(&[version]);
    header.update(salt);
    header.update(personalization);
    header.update(sketch);
    header.finalize().into()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
