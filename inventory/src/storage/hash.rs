//! Hash function for the identifier index.
//!
//! Slot assignment must be reproducible across runs and across
//! implementations, so the table does not use `std`'s randomly seeded
//! `DefaultHasher`. Keys are hashed with 64-bit FNV-1a over their UTF-8 bytes.

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hash `bytes` with 64-bit FNV-1a.
#[must_use]
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Map `bytes` to a slot in a table of `slot_count` slots.
///
/// # Pre-conditions
///
/// - `slot_count` is greater than zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn slot_for(bytes: &[u8], slot_count: usize) -> usize {
    debug_assert!(slot_count > 0, "slot_count must be positive");
    // The remainder is below slot_count, so it always fits in a usize.
    (fnv1a64(bytes) % slot_count as u64) as usize
}
