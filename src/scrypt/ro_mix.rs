//! ROMix: scrypt's memory-hard mixing stage (RFC 7914 §5).
//!
//! Fills an array `V` of `N` working blocks by iterated BlockMix, then walks
//! `N` more BlockMix passes over `V` at data-dependent indices. The array
//! must be fully addressable for the whole call — the data-dependent reads
//! are the entire point of the construction.

use zeroize::Zeroize;

use crate::cryptoutil::{read_u64_le, xor};
use crate::error::ScryptError;
use crate::scrypt::block_mix::block_mix;

/// Map a working block to an index into `V` (`0..N`).
///
/// Interprets the first 8 bytes of the final 64-byte sub-block of `x` as a
/// little-endian u64 and reduces it mod `n`. `n` is always a power of two
/// here, so the reduction is a cheap bitmask.
pub fn integerify(x: &[u8], n: usize) -> usize {
    debug_assert!(n.is_power_of_two());
    let mask = (n - 1) as u64;
    let last_block = &x[x.len() - 64..];
    (read_u64_le(&last_block[0..8]) & mask) as usize
}

/// Run ROMix on `b` in place.
///
/// * `b` - the `128*r`-byte block to mix, overwritten with the result.
/// * `n` - the scrypt cost parameter `N` (must be a power of two, `N >= 2`).
///
/// # Errors
/// [`ScryptError::Parameter`] if `b`'s length is not a positive multiple of
/// 128. [`ScryptError::Internal`] if the `N * 128 * r`-byte `V` array cannot
/// be allocated — the parameters are legal, the host just lacks the memory.
pub fn ro_mix(b: &mut [u8], n: usize) -> Result<(), ScryptError> {
    let len = b.len();
    if len == 0 || len % 128 != 0 {
        return Err(ScryptError::Parameter(format!(
            "ro_mix: block length {len} is not a positive multiple of 128"
        )));
    }
    debug_assert!(n.is_power_of_two() && n >= 2);

    let total = len
        .checked_mul(n)
        .ok_or_else(|| ScryptError::Parameter("ro_mix: N * 128 * r overflows".into()))?;

    let mut v: Vec<u8> = Vec::new();
    v.try_reserve_exact(total).map_err(|e| {
        ScryptError::Internal(format!("failed to allocate {total} byte ROMix array: {e}"))
    })?;
    v.resize(total, 0);

    // V[0] = B; V[i] = BlockMix(V[i-1]) for i in 1..N-1; x ends up holding
    // BlockMix(V[N-1]), i.e. the X the second loop starts from.
    let mut x = b.to_vec();
    for chunk in v.chunks_mut(len) {
        chunk.copy_from_slice(&x);
        block_mix(chunk, &mut x)?;
    }

    let mut t = vec![0u8; len];

    for _ in 0..n {
        let j = integerify(&x, n);
        xor(&x, &v[j * len..(j + 1) * len], &mut t);
        block_mix(&t, &mut x)?;
    }

    b.copy_from_slice(&x);

    v.zeroize();

    Ok(())
}
