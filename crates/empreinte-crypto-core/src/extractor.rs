//! Fuzzy extractor — `generate` (enrollment) and `reproduce` (verification).
//!
//! Turns a noisy 127-bit biometric vector into a stable 256-bit key plus
//! public [`HelperBlob`]. A query vector within Hamming distance 10 of the
//! enrolled vector reproduces the identical key; anything further fails
//! with [`CryptoError::BchFailure`].
//!
//! # Construction
//!
//! Secure-sketch fuzzy commitment over BCH(127, 64):
//!
//! ```text
//! Gen: m = vector[0..64] ─► BCH encode ─► parity ⊕ vector[64..127] = sketch
//!      key = BLAKE3_keyed(salt; personalization ‖ m)
//! Rep: vector'[0..64] ‖ (vector'[64..127] ⊕ sketch) ─► BCH decode ─► m
//! ```
//!
//! The helper stores only the 63-bit parity offset — never the vector —
//! bounding entropy leakage at 63 bits. Fresh salts make two enrollments
//! of the same finger unlinkable.
//!
//! The CSPRNG is an injected capability so tests can drive enrollment
//! from a seeded generator.

use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::bch;
use crate::error::CryptoError;
use crate::helper::{HelperBlob, HELPER_VERSION, PERSONALIZATION_LEN, SALT_LEN, SKETCH_LEN};
use crate::memory::Key256;
use crate::vector::BiometricVector;

/// Domain label for personalization derivation.
pub const DOMAIN_LABEL: &[u8] = b"biometric-did-cardano";

/// Derived key length in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Byte offset where the parity region of a packed codeword begins
/// (codeword bit 64 falls exactly on the byte boundary).
const PARITY_OFFSET: usize = 8;

// ---------------------------------------------------------------------------
// Gen
// ---------------------------------------------------------------------------

/// Enroll a biometric vector: derive a 256-bit key and public helper data.
///
/// # Arguments
///
/// - `vector` — the 127-bit capture from the external quantizer
/// - `user_tag` — opaque caller identity (e.g. a wallet address), mixed
///   into the personalization for domain separation
/// - `rng` — cryptographically secure randomness source for the salt
///
/// # Errors
///
/// Infallible today (the vector type already enforces its invariants) but
/// returns `Result` so the signature survives future format versions.
pub fn generate<R: RngCore + CryptoRng>(
    vector: &BiometricVector,
    user_tag: &[u8],
    rng: &mut R,
) -> Result<(Key256, HelperBlob), CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);

    let personalization = derive_personalization(user_tag);

    let bytes = vector.as_bytes();
    let mut head = [0u8; PARITY_OFFSET];
    head.copy_from_slice(&bytes[..PARITY_OFFSET]);
    let mut message = u64::from_be_bytes(head);
    head.zeroize();

    let mut codeword = bch::encode(message);
    let mut sketch = [0u8; SKETCH_LEN];
    for ((s, c), v) in sketch
        .iter_mut()
        .zip(&codeword[PARITY_OFFSET..])
        .zip(&bytes[PARITY_OFFSET..])
    {
        *s = c ^ v;
    }

    let key = derive_key(message, &salt, &personalization);
    let helper = HelperBlob::seal(salt, personalization, sketch);

    message.zeroize();
    codeword.zeroize();

    Ok((key, helper))
}

// ---------------------------------------------------------------------------
// Rep
// ---------------------------------------------------------------------------

/// Reproduce the enrolled key from a fresh capture and stored helper data.
///
/// The integrity tag is verified — in constant time — before the biometric
/// vector is touched; a tampered blob never reaches the BCH decoder.
///
/// # Errors
///
/// - [`CryptoError::VersionUnsupported`] — unknown helper format version
/// - [`CryptoError::Integrity`] — helper tag mismatch
/// - [`CryptoError::BchFailure`] — the query vector is more than 10 bits
///   away from the enrolled one
pub fn reproduce(
    vector: &BiometricVector,
    helper: &HelperBlob,
) -> Result<Key256, CryptoError> {
    if helper.version != HELPER_VERSION {
        return Err(CryptoError::VersionUnsupported {
            observed: helper.version,
            supported: HELPER_VERSION,
        });
    }
    helper.verify_tag()?;

    let mut word = *vector.as_bytes();
    for (w, s) in word[PARITY_OFFSET..].iter_mut().zip(&helper.sketch) {
        *w ^= s;
    }

    let decoded = bch::decode(&word);
    word.zeroize();
    let mut decoded = decoded?;

    let key = derive_key(decoded.message, &helper.salt, &helper.personalization);
    decoded.message.zeroize();

    Ok(key)
}

// ---------------------------------------------------------------------------
// Derivations
// ---------------------------------------------------------------------------

/// `personalization = BLAKE3(domain_label ‖ user_tag)`.
fn derive_personalization(user_tag: &[u8]) -> [u8; PERSONALIZATION_LEN] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(DOMAIN_LABEL);
    hasher.update(user_tag);
    hasher.finalize().into()
}

/// 256-bit output key: a salt-keyed BLAKE3 hasher absorbing the
/// personalization and the recovered message.
fn derive_key(
    message: u64,
    salt: &[u8; SALT_LEN],
    personalization: &[u8; PERSONALIZATION_LEN],
) -> Key256 {
    let mut hasher = blake3::Hasher::new_keyed(salt);
    hasher.update(personalization);
    let mut message_bytes = message.to_be_bytes();
    hasher.update(&message_bytes);
    message_bytes.zeroize();
    let key: [u8; KEY_LEN] = hasher.finalize().into();
    Key256::new(key)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
