//! Biometric bit-vector container.
//!
//! A [`BiometricVector`] holds the 127-bit output of the external
//! quantizer, packed MSB-first into 16 bytes: bit `i` of the vector lives
//! in byte `i / 8` under mask `0x80 >> (i % 8)`. Bit 127 — the least
//! significant bit of the final byte — is padding and must be zero.
//!
//! Vectors are secret material: they are zeroized on drop and never
//! persisted by the core.

use crate::error::CryptoError;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Number of significant bits in a biometric vector.
pub const VECTOR_BITS: usize = 127;

/// Packed byte width of a biometric vector (127 bits + 1 pad bit).
pub const VECTOR_BYTES: usize = 16;

/// Mask selecting the pad bit in the final byte.
const PAD_BIT_MASK: u8 = 0x01;

/// A 127-bit biometric feature vector, MSB-first, zero-padded to 16 bytes.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct BiometricVector {
    bytes: [u8; VECTOR_BYTES],
}

impl BiometricVector {
    /// Wrap 16 packed bytes as a biometric vector.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidInput`] if the pad bit (bit 127) is set.
    pub fn from_bytes(bytes: [u8; VECTOR_BYTES]) -> Result<Self, CryptoError> {
        if bytes[VECTOR_BYTES - 1] & PAD_BIT_MASK != 0 {
            return Err(CryptoError::InvalidInput {
                field: "biometric vector pad bit",
                observed: 1,
                expected: 0,
            });
        }
        Ok(Self { bytes })
    }

    /// Borrow the packed bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; VECTOR_BYTES] {
        &self.bytes
    }

    /// Return a copy with the given bit positions flipped.
    ///
    /// Used to model capture noise in tests and calibration harnesses.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidInput`] if any position is ≥ 127.
    pub fn with_flipped_bits(&self, positions: &[usize]) -> Result<Self, CryptoError> {
        let mut bytes = self.bytes;
        for &pos in positions {
            if pos >= VECTOR_BITS {
                bytes.zeroize();
                return Err(CryptoError::InvalidInput {
                    field: "bit position",
                    observed: pos,
                    expected: VECTOR_BITS - 1,
                });
            }
            // pos < 127, so pos / 8 < 16 and the shift amount is < 8.
            #[allow(clippy::arithmetic_side_effects)]
            {
                bytes[pos / 8] ^= 0x80 >> (pos % 8);
            }
        }
        Self::from_bytes(bytes)
    }

    /// Hamming distance to another vector.
    #[must_use]
    pub fn hamming_distance(&self, other: &Self) -> u32 {
        self.bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

impl std::fmt::Debug for BiometricVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BiometricVector(***)")
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
