//! Deterministic seed for the mock customer data.

/// 32-bit string hash (`h = h * 31 + unit` over UTF-16 code units, wrapping),
/// returned as its absolute value.
///
/// Every generated value derives from this, so the same user id always yields
/// the same profile, insurances and delegations.
pub fn hash_code(input: &str) -> u64 {
    let hash = input.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    });
    u64::from(hash.unsigned_abs())
}

/// Element of `items` at `(seed + offset) % len`.
pub fn pick<T>(items: &[T], seed: u64, offset: u64) -> &T {
    &items[((seed + offset) % items.len() as u64) as usize]
}
