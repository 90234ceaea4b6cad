//! BCH(127, 64) codec — systematic encoder and bounded-distance decoder.
//!
//! The code has designed distance 21 and corrects up to t = 10 bit errors
//! per 127-bit word. Its generator polynomial is the degree-63 product of
//! the minimal polynomials of α, α^3, …, α^19 over GF(2^7) (see [`crate::gf`]);
//! the constant below is re-derived from the cyclotomic cosets in a test.
//!
//! # Bit ↔ polynomial mapping
//!
//! A codeword is 127 bits packed MSB-first into 16 bytes: codeword bit `i`
//! lives in byte `i / 8` under mask `0x80 >> (i % 8)`, and is the
//! coefficient of `x^(126 - i)`. Bit 127 (the LSB of the last byte) is
//! zero padding. Equivalently, the packed bytes are the big-endian
//! representation of the 127-bit polynomial shifted left by one.
//!
//! Bits 0..64 are the message (bit 0 = most significant message bit),
//! bits 64..127 the parity — `c(x) = x^63·m(x) + (x^63·m(x) mod g(x))`.

// The decoder is index arithmetic over fixed-size tables: syndrome and
// Chien exponents are reduced mod 127 and all array indices are bounded
// by the t = 10 locator degree. Checked variants would obscure the
// algorithm; bounds are exercised by the exhaustive-pattern tests.
#![allow(clippy::arithmetic_side_effects)]

use crate::error::CryptoError;
use crate::gf::{self, EXP, FIELD_ORDER, LOG};

/// Codeword length in bits.
pub const CODEWORD_BITS: usize = 127;

/// Message length in bits.
pub const MESSAGE_BITS: usize = 64;

/// Error-correction capacity (t).
pub const ERROR_CAPACITY: usize = 10;

/// Packed codeword width (127 bits + 1 pad bit).
pub const CODEWORD_BYTES: usize = 16;

/// Number of syndromes the decoder computes (2t).
const SYNDROME_COUNT: usize = 20;

/// Generator polynomial, bit `d` = coefficient of `x^d`. Degree 63.
const GENERATOR_POLY: u64 = 0xA1AB_815B_C7EC_8025;

/// Successful decode: recovered message and the number of bits flipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    /// The 64 message bits (bit 63 of the integer = codeword bit 0).
    pub message: u64,
    /// Number of errors the decoder corrected (0..=10).
    pub errors_corrected: usize,
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Systematically encode a 64-bit message into a packed 127-bit codeword.
///
/// Deterministic; no randomness. The message occupies codeword bits 0..64
/// followed by 63 parity bits.
#[must_use]
pub fn encode(message: u64) -> [u8; CODEWORD_BYTES] {
    let poly = u128::from(message) << 63;
    let mut rem = poly;
    let mut d = 126;
    while d >= 63 {
        if (rem >> d) & 1 == 1 {
            rem ^= u128::from(GENERATOR_POLY) << (d - 63);
        }
        d -= 1;
    }
    debug_assert!(rem < (1u128 << 63));
    pack(poly | rem)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a received 127-bit word, correcting up to 10 bit errors.
///
/// Runs syndrome computation, Berlekamp–Massey, and a Chien search, then
/// verifies that the corrected word satisfies every parity equation.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidInput`] if the pad bit is set, and
/// [`CryptoError::BchFailure`] when the error pattern exceeds the
/// correction capacity. The decoder never silently over-corrects: a
/// success is always a true codeword within distance 10 of the input.
pub fn decode(word: &[u8; CODEWORD_BYTES]) -> Result<Decoded, CryptoError> {
    if word[CODEWORD_BYTES - 1] & 1 != 0 {
        return Err(CryptoError::InvalidInput {
            field: "codeword pad bit",
            observed: 1,
            expected: 0,
        });
    }
    let received = unpack(word);

    let syn = syndromes(received);
    if syn.iter().all(|&s| s == 0) {
        return Ok(Decoded {
            message: (received >> 63) as u64,
            errors_corrected: 0,
        });
    }

    let (sigma, lfsr_len) = berlekamp_massey(&syn);
    let degree = locator_degree(&sigma);
    if degree != lfsr_len || lfsr_len > ERROR_CAPACITY {
        return Err(CryptoError::BchFailure {
            capacity: ERROR_CAPACITY,
        });
    }

    // Chien search: the error term of degree d corresponds to the locator
    // root α^(−d), i.e. σ(α^(127−d)) = 0.
    let mut corrected = received;
    let mut roots = 0usize;
    for d in 0..CODEWORD_BITS {
        let j = (FIELD_ORDER - d) % FIELD_ORDER;
        let mut acc = 0u8;
        for (i, &coef) in sigma.iter().enumerate().take(lfsr_len + 1) {
            if coef != 0 {
                acc ^= EXP[(LOG[coef as usize] as usize + i * j) % FIELD_ORDER];
            }
        }
        if acc == 0 {
            corrected ^= 1u128 << d;
            roots += 1;
        }
    }

    if roots != degree || syndromes(corrected).iter().any(|&s| s != 0) {
        return Err(CryptoError::BchFailure {
            capacity: ERROR_CAPACITY,
        });
    }

    Ok(Decoded {
        message: (corrected >> 63) as u64,
        errors_corrected: degree,
    })
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// Pack a 127-bit polynomial (bit `d` = coeff of `x^d`) into MSB-first bytes.
fn pack(poly: u128) -> [u8; CODEWORD_BYTES] {
    debug_assert!(poly >> CODEWORD_BITS == 0);
    (poly << 1).to_be_bytes()
}

/// Inverse of [`pack`]; the caller has already rejected a set pad bit.
fn unpack(word: &[u8; CODEWORD_BYTES]) -> u128 {
    u128::from_be_bytes(*word) >> 1
}

/// Compute the 2t syndromes `S_k = r(α^k)`, k = 1..=20.
fn syndromes(received: u128) -> [u8; SYNDROME_COUNT] {
    let mut syn = [0u8; SYNDROME_COUNT];
    for d in 0..CODEWORD_BITS {
        if (received >> d) & 1 == 1 {
            for (k, s) in syn.iter_mut().enumerate() {
                *s ^= EXP[((k + 1) * d) % FIELD_ORDER];
            }
        }
    }
    syn
}

/// Berlekamp–Massey: shortest LFSR generating the syndrome sequence.
///
/// Returns the error-locator polynomial σ (σ\[0\] = 1) and the LFSR
/// length L. A decodable pattern has deg σ = L ≤ t.
fn berlekamp_massey(syn: &[u8; SYNDROME_COUNT]) -> ([u8; SYNDROME_COUNT + 1], usize) {
    let mut cur = [0u8; SYNDROME_COUNT + 1];
    let mut prev = [0u8; SYNDROME_COUNT + 1];
    cur[0] = 1;
    prev[0] = 1;
    let mut lfsr_len = 0usize;
    let mut gap = 1usize;
    let mut prev_discrepancy = 1u8;

    for n in 0..SYNDROME_COUNT {
        let mut discrepancy = syn[n];
        for i in 1..=lfsr_len {
            discrepancy ^= gf::mul(cur[i], syn[n - i]);
        }
        if discrepancy == 0 {
            gap += 1;
        } else if 2 * lfsr_len <= n {
            let snapshot = cur;
            let coef = gf::mul(discrepancy, gf::inv(prev_discrepancy));
            for i in 0..=(SYNDROME_COUNT - gap) {
                cur[i + gap] ^= gf::mul(coef, prev[i]);
            }
            lfsr_len = n + 1 - lfsr_len;
            prev = snapshot;
            prev_discrepancy = discrepancy;
            gap = 1;
        } else {
            let coef = gf::mul(discrepancy, gf::inv(prev_discrepancy));
            for i in 0..=(SYNDROME_COUNT - gap) {
                cur[i + gap] ^= gf::mul(coef, prev[i]);
            }
            gap += 1;
        }
    }
    (cur, lfsr_len)
}

/// Degree of the locator polynomial (index of its highest nonzero entry).
fn locator_degree(sigma: &[u8; SYNDROME_COUNT + 1]) -> usize {
    sigma
        .iter()
        .rposition(|&c| c != 0)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Flip codeword bit `pos` (0..127) in a packed word.
    fn flip(word: &mut [u8; CODEWORD_BYTES], pos: usize) {
        word[pos / 8] ^= 0x80 >> (pos % 8);
    }

    #[test]
    fn generator_matches_cyclotomic_derivation() {
        // Union of the cyclotomic cosets of 1..=20 mod 127.
        let mut is_root = [false; 127];
        for e in 1..=2 * ERROR_CAPACITY {
            let mut c = e % 127;
            while !is_root[c] {
                is_root[c] = true;
                c = (c * 2) % 127;
            }
        }
        let root_count = is_root.iter().filter(|&&r| r).count();
        assert_eq!(root_count, 63);

        // g(x) = Π (x + α^e) over the union, coefficients in GF(2^7).
        let mut g = vec![1u8];
        for (e, _) in is_root.iter().enumerate().filter(|&(_, &r)| r) {
            let root = EXP[e];
            let mut next = vec![0u8; g.len() + 1];
            for (d, &coef) in g.iter().enumerate() {
                next[d + 1] ^= coef;
                next[d] ^= gf::mul(coef, root);
            }
            g = next;
        }
        assert_eq!(g.len(), 64, "generator must have degree 63");

        let mut mask = 0u64;
        for (d, &coef) in g.iter().enumerate() {
            assert!(coef <= 1, "generator coefficients must be binary");
            if coef == 1 {
                mask |= 1u64 << d;
            }
        }
        assert_eq!(mask, GENERATOR_POLY);
    }

    #[test]
    fn encode_is_systematic() {
        let message = 0x0123_4567_89AB_CDEFu64;
        let word = encode(message);
        assert_eq!(&word[..8], &message.to_be_bytes());
    }

    #[test]
    fn encode_fixed_vectors() {
        // Known-answer vectors pinning the bit-order convention.
        let cases: [(u64, [u8; CODEWORD_BYTES]); 5] = [
            (0, [0; 16]),
            (
                1,
                [
                    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x43, 0x57, 0x02, 0xB7, 0x8F,
                    0xD9, 0x00, 0x4A,
                ],
            ),
            (
                0x8000_0000_0000_0000,
                [
                    0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xA1, 0xAB, 0x81, 0x5B, 0xC7,
                    0xEC, 0x80, 0x24,
                ],
            ),
            (
                0x0123_4567_89AB_CDEF,
                [
                    0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0x85, 0xA4, 0xD6, 0xB9, 0x8D,
                    0xAA, 0xBD, 0xB4,
                ],
            ),
            (
                0xDEAD_BEEF_CAFE_F00D,
                [
                    0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE, 0xF0, 0x0D, 0xBF, 0x6D, 0x88, 0x6D, 0x78,
                    0xEB, 0x9E, 0x50,
                ],
            ),
        ];
        for (message, expected) in cases {
            assert_eq!(encode(message), expected, "m = {message:#018X}");
        }
    }

    #[test]
    fn all_ones_message_yields_all_ones_codeword() {
        // The all-ones word is a codeword of every binary BCH code whose
        // generator excludes (x + 1).
        let word = encode(u64::MAX);
        let mut expected = [0xFFu8; CODEWORD_BYTES];
        expected[CODEWORD_BYTES - 1] = 0xFE;
        assert_eq!(word, expected);
    }

    #[test]
    fn clean_word_decodes_with_zero_errors() {
        let message = 0xDEAD_BEEF_CAFE_F00Du64;
        let decoded = decode(&encode(message)).expect("clean word must decode");
        assert_eq!(
            decoded,
            Decoded {
                message,
                errors_corrected: 0
            }
        );
    }

    #[test]
    fn corrects_up_to_capacity() {
        let message = 0x0123_4567_89AB_CDEFu64;
        let positions = [3usize, 17, 29, 41, 53, 67, 79, 91, 103, 115];
        for count in 1..=ERROR_CAPACITY {
            let mut word = encode(message);
            for &pos in &positions[..count] {
                flip(&mut word, pos);
            }
            let decoded = decode(&word).expect("within capacity must decode");
            assert_eq!(decoded.message, message, "{count} errors");
            assert_eq!(decoded.errors_corrected, count);
        }
    }

    #[test]
    fn corrects_errors_at_word_boundaries() {
        let message = 0xA5A5_A5A5_5A5A_5A5Au64;
        let mut word = encode(message);
        flip(&mut word, 0);
        flip(&mut word, 126);
        let decoded = decode(&word).expect("boundary errors must decode");
        assert_eq!(decoded.message, message);
        assert_eq!(decoded.errors_corrected, 2);
    }

    #[test]
    fn rejects_eleven_errors() {
        let positions = [3usize, 17, 29, 41, 53, 67, 79, 91, 103, 115, 120];
        let mut word = encode(0);
        for &pos in &positions {
            flip(&mut word, pos);
        }
        let result = decode(&word);
        assert!(
            matches!(result, Err(CryptoError::BchFailure { capacity: 10 })),
            "11 errors must exceed capacity, got {result:?}"
        );
    }

    #[test]
    fn rejects_set_pad_bit() {
        let mut word = encode(7);
        word[CODEWORD_BYTES - 1] |= 1;
        assert!(matches!(
            decode(&word),
            Err(CryptoError::InvalidInput {
                field: "codeword pad bit",
                ..
            })
        ));
    }

    #[test]
    fn every_single_bit_error_is_corrected() {
        let message = 0x5555_AAAA_3333_CCCCu64;
        let clean = encode(message);
        for pos in 0..CODEWORD_BITS {
            let mut word = clean;
            flip(&mut word, pos);
            let decoded = decode(&word).expect("single error must decode");
            assert_eq!(decoded.message, message, "error at bit {pos}");
            assert_eq!(decoded.errors_corrected, 1);
        }
    }
}
