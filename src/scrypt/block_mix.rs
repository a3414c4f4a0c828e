//! BlockMix: scrypt's Salsa20/8 chaining and even/odd interleave (RFC 7914 §4).

use crate::cryptoutil::xor;
use crate::error::ScryptError;
use crate::scrypt::salsa::salsa20_8_mut;

/// Apply BlockMix to `input`, writing the result to `output`.
///
/// `input` and `output` must both have a length that is a positive multiple
/// of 128 (2r sub-blocks of 64 bytes, r >= 1), and the same length as each
/// other.
///
/// Chains Salsa20/8 across the 2r sub-blocks with XOR feedback from the
/// previous output, then interleaves the results into even-indexed-then-odd
/// order — `(Y[0], Y[2], ..., Y[2r-2], Y[1], Y[3], ..., Y[2r-1])`. Emitting
/// `Y` in its natural order instead of this interleave silently produces the
/// wrong key for every input.
pub fn block_mix(input: &[u8], output: &mut [u8]) -> Result<(), ScryptError> {
    if input.len() == 0 || input.len() % 128 != 0 {
        return Err(ScryptError::Parameter(format!(
            "block_mix: input length {} is not a positive multiple of 128",
            input.len()
        )));
    }
    if output.len() != input.len() {
        return Err(ScryptError::Parameter(
            "block_mix: output length must match input length".into(),
        ));
    }

    let mut x = [0u8; 64];
    x.copy_from_slice(&input[input.len() - 64..]);

    let mut t = [0u8; 64];
    let half = input.len() / 2;

    for (i, chunk) in input.chunks(64).enumerate() {
        xor(&x, chunk, &mut t);
        x = t;
        salsa20_8_mut(&mut x);
        let pos = if i % 2 == 0 { (i / 2) * 64 } else { (i / 2) * 64 + half };
        output[pos..pos + 64].copy_from_slice(&x);
    }

    Ok(())
}
