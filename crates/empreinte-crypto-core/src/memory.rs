//! Secret-memory types for key material.
//!
//! Every secret the core touches — biometric vectors, recovered messages,
//! per-finger keys, master keys — is zeroized when dropped. The types here
//! additionally mask `Debug`/`Display` output so secrets cannot leak
//! through logging, and provide a constant-time equality primitive for
//! comparisons on secret bytes.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Constant-time byte comparison.
///
/// Returns `true` iff both slices have equal length and identical contents.
/// Uses bitwise OR accumulation to avoid short-circuit timing leaks.
///
/// Note: The early return on length mismatch is acceptable because every
/// caller compares fixed-width values (32-byte tags and keys) whose length
/// is public information — the constant-time property protects the *value*,
/// not its length.
#[must_use]
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

// ---------------------------------------------------------------------------
// SecretBytes<N> — fixed-size
// ---------------------------------------------------------------------------

/// Fixed-size buffer for keys and other fixed-length secrets.
///
/// Derives `Zeroize` + `ZeroizeOnDrop` so the bytes are securely erased
/// when the value goes out of scope. `Debug` and `Display` are masked.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> SecretBytes<N> {
    /// Wrap the given bytes. The caller should zeroize its own copy
    /// after calling this.
    #[must_use]
    pub const fn new(bytes: [u8; N]) -> Self {
        Self { bytes }
    }

    /// Expose the underlying bytes. Use sparingly — only when the raw
    /// bytes are needed for a cryptographic operation, and prefer using
    /// the reference within a single expression.
    #[must_use]
    pub const fn expose(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Constant-time equality against another secret of the same width.
    #[must_use]
    pub fn ct_eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.bytes, &other.bytes)
    }
}

impl<const N: usize> fmt::Debug for SecretBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBytes(***)")
    }
}

impl<const N: usize> fmt::Display for SecretBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBytes(***)")
    }
}

/// 256-bit key material — the width of every key in the system.
pub type Key256 = SecretBytes<32>;

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
