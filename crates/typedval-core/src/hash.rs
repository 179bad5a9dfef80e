//! Stable hashing helpers.
//!
//! Type identities are hashed with blake3 once, at registration, so the value
//! is stable across processes. Per-value hashes sit on the hot path and use
//! xxh3 over the canonical little-endian encoding.

use xxhash_rust::xxh3::xxh3_64;

/// Hash code of a null element nested inside a structural value.
pub const NULL_HASH_CODE: u64 = 0;

/// Stable 64-bit identity of a type signature (first 8 bytes of blake3).
pub fn identity_hash(signature: &str) -> u64 {
    let digest = blake3::hash(signature.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(head)
}

pub fn hash_bool(v: bool) -> u64 {
    xxh3_64(&[v as u8])
}

pub fn hash_i64(v: i64) -> u64 {
    xxh3_64(&v.to_le_bytes())
}

/// Hash a float after folding `-0.0` onto `0.0` and every NaN onto one NaN,
/// so values that compare equal hash equal.
pub fn hash_f64(v: f64) -> u64 {
    xxh3_64(&canonical_f64_bits(v).to_le_bytes())
}

pub fn canonical_f64_bits(v: f64) -> u64 {
    if v.is_nan() {
        f64::NAN.to_bits()
    } else if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

pub fn hash_bytes(bytes: &[u8]) -> u64 {
    xxh3_64(bytes)
}

/// `31 * acc + next`, wrapping.
#[inline]
pub fn combine(acc: u64, next: u64) -> u64 {
    acc.wrapping_mul(31).wrapping_add(next)
}
