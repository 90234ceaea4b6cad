//! Multi-finger key aggregation with quality-gated fallback.
//!
//! This module provides:
//! - [`aggregate`] — XOR-compose per-finger keys into one master key
//! - [`rotate`] — swap a single finger key without touching the others
//! - [`revoke`] — drop a finger and re-derive the master from the rest
//!
//! # Composition
//!
//! The master key is the XOR of all per-finger keys, so composition is
//! commutative and associative — finger order never matters — and each
//! finger contributes its full entropy independently. Quality scores gate
//! acceptance only; they never enter the key bytes.
//!
//! # Fallback policy
//!
//! With N fingers enrolled and M verified (average quality Q):
//!
//! | Scenario   | Accepted when                          | Mode            |
//! |------------|----------------------------------------|-----------------|
//! | M = N      | always                                 | `Full`          |
//! | N=4, M=3   | Q ≥ 70                                 | `Partial3Of4`   |
//! | N=4, M=2   | Q ≥ 85 and a backup factor is present  | `Partial2Of4`   |
//! | M < 2      | never (`InsufficientFingers`)          |                 |
//! | otherwise  | never (`QualityThreshold`)             |                 |
//!
//! `strict` policies accept only M = N.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;
use crate::memory::{constant_time_eq, Key256};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Master key length in bytes (256 bits).
pub const MASTER_KEY_LEN: usize = 32;

/// Minimum number of fingers for any aggregation (the entropy floor).
pub const MIN_FINGERS: usize = 2;

/// Maximum number of enrollable fingers.
pub const MAX_FINGERS: usize = 10;

/// Maximum quality score.
pub const MAX_QUALITY: u8 = 100;

/// Enrolled count for which partial fallback modes are defined.
const FALLBACK_ENROLLED: usize = 4;

/// Minimum average quality for 3-of-4 fallback.
const THREE_OF_FOUR_MIN_AVG: f64 = 70.0;

/// Minimum average quality for 2-of-4 fallback.
const TWO_OF_FOUR_MIN_AVG: f64 = 85.0;

/// Sentinel threshold reported when no fallback mode exists for the
/// finger-count combination (one above the maximum quality, so it is
/// visibly unreachable).
const NO_FALLBACK_AVG: f64 = 101.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A verified per-finger key with its capture quality.
///
/// Secret material: the key bytes are zeroized when the value drops, which
/// happens as soon as the aggregator consumes it.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct FingerKey {
    finger_id: String,
    key: [u8; MASTER_KEY_LEN],
    quality: u8,
}

impl FingerKey {
    /// Wrap a 32-byte finger key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidInput`] if the key is not exactly
    /// 32 bytes or the quality exceeds 100.
    pub fn new(
        finger_id: impl Into<String>,
        key: &[u8],
        quality: u8,
    ) -> Result<Self, CryptoError> {
        check_key_len("finger key length", key)?;
        if quality > MAX_QUALITY {
            return Err(CryptoError::InvalidInput {
                field: "finger quality",
                observed: quality as usize,
                expected: MAX_QUALITY as usize,
            });
        }
        let mut bytes = [0u8; MASTER_KEY_LEN];
        bytes.copy_from_slice(key);
        Ok(Self {
            finger_id: finger_id.into(),
            key: bytes,
            quality,
        })
    }

    /// Identifier of the finger this key was derived from.
    #[must_use]
    pub fn finger_id(&self) -> &str {
        &self.finger_id
    }

    /// Capture quality, 0–100.
    #[must_use]
    pub const fn quality(&self) -> u8 {
        self.quality
    }
}

impl std::fmt::Debug for FingerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FingerKey {{ finger_id: {:?}, key: ***, quality: {} }}",
            self.finger_id, self.quality
        )
    }
}

/// How the master key was assembled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationMode {
    /// Every enrolled finger verified.
    #[serde(rename = "N/N")]
    Full,
    /// 3 of 4 enrolled fingers verified, average quality ≥ 70.
    #[serde(rename = "3/4")]
    Partial3Of4,
    /// 2 of 4 enrolled fingers verified, average quality ≥ 85, backup factor present.
    #[serde(rename = "2/4")]
    Partial2Of4,
}

impl AggregationMode {
    /// Wire string for metadata payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "N/N",
            Self::Partial3Of4 => "3/4",
            Self::Partial2Of4 => "2/4",
        }
    }
}

/// Caller-selected acceptance policy for [`aggregate`].
#[derive(Clone, Copy, Debug, Default)]
pub struct AggregationPolicy {
    /// Accept only full aggregation — every enrolled finger must verify.
    pub strict: bool,
    /// Whether a backup authentication factor accompanies this request
    /// (required for 2-of-4 fallback).
    pub backup_factor: bool,
}

/// Outcome of a successful aggregation.
///
/// The derived `Debug` is safe: `Key256` masks its bytes.
#[must_use]
#[derive(Debug)]
pub struct AggregationResult {
    /// XOR of the verified per-finger keys.
    pub master_key: Key256,
    /// Number of finger keys that entered the composition.
    pub fingers_used: usize,
    /// Average quality of the verified fingers.
    pub average_quality: f64,
    /// Acceptance mode the policy selected.
    pub mode: AggregationMode,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Combine verified per-finger keys into the master key.
///
/// Consumes the finger keys; they are zeroized as soon as the composition
/// is done. Order of the input keys is irrelevant.
///
/// # Errors
///
/// - [`CryptoError::InvalidInput`] — enrolled count outside 2..=10, or
///   more keys supplied than enrolled
/// - [`CryptoError::InsufficientFingers`] — fewer than 2 verified keys, or
///   a partial set under a `strict` policy
/// - [`CryptoError::QualityThreshold`] — the fallback table rejects the
///   verified set
#[allow(clippy::cast_precision_loss)] // counts are ≤ 10, qualities ≤ 100
pub fn aggregate(
    enrolled: usize,
    fingers: Vec<FingerKey>,
    policy: &AggregationPolicy,
) -> Result<AggregationResult, CryptoError> {
    if enrolled < MIN_FINGERS {
        return Err(CryptoError::InvalidInput {
            field: "enrolled finger count",
            observed: enrolled,
            expected: MIN_FINGERS,
        });
    }
    if enrolled > MAX_FINGERS {
        return Err(CryptoError::InvalidInput {
            field: "enrolled finger count",
            observed: enrolled,
            expected: MAX_FINGERS,
        });
    }

    let verified = fingers.len();
    if verified > enrolled {
        return Err(CryptoError::InvalidInput {
            field: "verified finger count",
            observed: verified,
            expected: enrolled,
        });
    }
    if verified < MIN_FINGERS {
        return Err(CryptoError::InsufficientFingers {
            verified,
            required: MIN_FINGERS,
        });
    }

    let average = fingers.iter().map(|f| f64::from(f.quality)).sum::<f64>() / verified as f64;

    let mode = if verified == enrolled {
        AggregationMode::Full
    } else if policy.strict {
        return Err(CryptoError::InsufficientFingers {
            verified,
            required: enrolled,
        });
    } else if enrolled == FALLBACK_ENROLLED && verified == 3 {
        if average < THREE_OF_FOUR_MIN_AVG {
            return Err(CryptoError::QualityThreshold {
                verified,
                enrolled,
                average,
                required: THREE_OF_FOUR_MIN_AVG,
                backup_factor: policy.backup_factor,
            });
        }
        AggregationMode::Partial3Of4
    } else if enrolled == FALLBACK_ENROLLED && verified == 2 {
        if average < TWO_OF_FOUR_MIN_AVG || !policy.backup_factor {
            return Err(CryptoError::QualityThreshold {
                verified,
                enrolled,
                average,
                required: TWO_OF_FOUR_MIN_AVG,
                backup_factor: policy.backup_factor,
            });
        }
        AggregationMode::Partial2Of4
    } else {
        return Err(CryptoError::QualityThreshold {
            verified,
            enrolled,
            average,
            required: NO_FALLBACK_AVG,
            backup_factor: policy.backup_factor,
        });
    };

    let master = xor_keys(fingers.iter().map(|f| &f.key));
    Ok(AggregationResult {
        master_key: Key256::new(master),
        fingers_used: verified,
        average_quality: average,
        mode,
    })
    // `fingers` drops here; every FingerKey zeroizes its key bytes.
}

// ---------------------------------------------------------------------------
// Rotation and revocation
// ---------------------------------------------------------------------------

/// Replace one finger key inside an existing master key.
///
/// `new_master = old_master ⊕ old_finger_key ⊕ new_finger_key`. The other
/// enrolled fingers are untouched; the caller typically reconstructed
/// `old_master` from them in a fallback-mode aggregation.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidInput`] if any input is not exactly
/// 32 bytes.
pub fn rotate(
    old_master: &[u8],
    old_finger_key: &[u8],
    new_finger_key: &[u8],
) -> Result<Key256, CryptoError> {
    check_key_len("master key length", old_master)?;
    check_key_len("old finger key length", old_finger_key)?;
    check_key_len("new finger key length", new_finger_key)?;

    let mut out = [0u8; MASTER_KEY_LEN];
    for (((o, m), old), new) in out
        .iter_mut()
        .zip(old_master)
        .zip(old_finger_key)
        .zip(new_finger_key)
    {
        *o = m ^ old ^ new;
    }
    Ok(Key256::new(out))
}

/// Remove a finger and derive the reduced master key from the remainder.
///
/// The remaining set must stay at or above the 2-finger entropy floor.
/// The arguments are redundant by construction — `XOR(remaining) ⊕
/// revoked_key` must equal `old_master` — and the cross-check runs in
/// constant time; a mismatch means the caller supplied an inconsistent
/// key set.
///
/// # Errors
///
/// - [`CryptoError::InvalidInput`] — wrong key lengths
/// - [`CryptoError::InsufficientFingers`] — fewer than 2 remaining keys
/// - [`CryptoError::Integrity`] — the supplied keys do not reproduce
///   `old_master`
pub fn revoke(
    old_master: &[u8],
    revoked_key: &[u8],
    remaining: &[FingerKey],
) -> Result<Key256, CryptoError> {
    check_key_len("master key length", old_master)?;
    check_key_len("revoked finger key length", revoked_key)?;
    if remaining.len() < MIN_FINGERS {
        return Err(CryptoError::InsufficientFingers {
            verified: remaining.len(),
            required: MIN_FINGERS,
        });
    }

    let mut master = xor_keys(remaining.iter().map(|f| &f.key));

    let mut check = master;
    for (c, r) in check.iter_mut().zip(revoked_key) {
        *c ^= r;
    }
    let consistent = constant_time_eq(&check, old_master);
    check.zeroize();
    if !consistent {
        master.zeroize();
        return Err(CryptoError::Integrity);
    }

    Ok(Key256::new(master))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// XOR an iterator of 32-byte keys into one accumulator.
fn xor_keys<'a, I>(keys: I) -> [u8; MASTER_KEY_LEN]
where
    I: Iterator<Item = &'a [u8; MASTER_KEY_LEN]>,
{
    let mut acc = [0u8; MASTER_KEY_LEN];
    for key in keys {
        for (a, k) in acc.iter_mut().zip(key) {
            *a ^= k;
        }
    }
    acc
}

/// Reject any key that is not exactly 32 bytes.
fn check_key_len(field: &'static str, bytes: &[u8]) -> Result<(), CryptoError> {
    if bytes.len() == MASTER_KEY_LEN {
        Ok(())
    } else {
        Err(CryptoError::InvalidInput {
            field,
            observed: bytes.len(),
            expected: MASTER_KEY_LEN,
        })
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
