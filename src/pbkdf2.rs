//! This module implements the PBKDF2 Key Derivation Function as specified in [Specification][1].
//!
//! # Examples
//!
//! ```
//! use scryptkit::{pbkdf2::pbkdf2, hmac};
//!
//! let password = b"password";
//! let salt = b"salt";
//! let c = 2;
//! let mut out = [0u8; 64];
//! pbkdf2::<hmac::SHA256>(password, salt, c, &mut out).unwrap();
//! ```
//!
//! [1]: <https://tools.ietf.org/html/rfc2898>

// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::error::ScryptError;
use crate::hmac;

/// The RFC 2898 output-length ceiling: `(2^32 - 1) * hLen`.
const MAX_BLOCKS: u64 = 0xffff_ffff;

// Calculate a block of the output of size equal to the output_bytes of the underlying Mac function
// `keyed_mac` - A context already keyed with the password, ready to be cloned per iteration
// `salt` - the salt value to use
// `c` - the iteration count
// `idx` - the 1 based index of the block
// `scratch` - a temporary variable the same length as the block
// `block` - the block of the output to calculate
fn calculate_block<D: hmac::Algorithm>(
    keyed_mac: &hmac::Context<D>,
    salt: &[u8],
    c: u32,
    idx: u32,
    scratch: &mut [u8],
    block: &mut [u8],
) {
    let mut mac = keyed_mac.clone();

    // Perform the 1st iteration. The output goes directly into block.
    mac.update(salt);
    mac.update(&idx.to_be_bytes());
    mac.finalize_at(block);
    mac.clone_from(keyed_mac);

    // Perform the 2nd iteration. The input comes from block and is output into scratch. scratch is
    // then exclusive-or added into block. After all this, the input to the next step is now in
    // scratch and block is left to just accumulate the exclusive-or sum of remaining iterations.
    if c > 1 {
        mac.update(block);
        mac.finalize_at(scratch);
        mac.clone_from(keyed_mac);
        for (output, &input) in block.iter_mut().zip(scratch.iter()) {
            *output ^= input;
        }
    }

    // Perform all remaining iterations.
    for _ in 2..c {
        mac.update(scratch);
        mac.finalize_at(scratch);
        mac.clone_from(keyed_mac);
        for (output, &input) in block.iter_mut().zip(scratch.iter()) {
            *output ^= input;
        }
    }
}

/// Execute the PBKDF2 Key Derivation Function. The Scrypt Key Derivation Function generally
/// provides better security, so applications that do not have a requirement to use PBKDF2
/// specifically should consider using that function instead.
///
/// # Arguments
/// * `password` - The password to derive from.
/// * `salt` - The salt value to use.
/// * `c` - The iteration count. Users should carefully determine this value as it is the primary
///   factor in determining the security of the derived key.
/// * `output` - The output buffer to fill with the derived key value.
///
/// # Errors
/// Returns [`ScryptError::Parameter`] if `c == 0` or `output` requests more than
/// `(2^32 - 1) * hLen` bytes (RFC 2898 §5.2).
pub fn pbkdf2<D: hmac::Algorithm>(
    password: &[u8],
    salt: &[u8],
    c: u32,
    output: &mut [u8],
) -> Result<(), ScryptError> {
    if c == 0 {
        return Err(ScryptError::Parameter(
            "pbkdf2: iteration count must be >= 1".into(),
        ));
    }

    let context = hmac::Context::<D>::new(password);
    let os = context.output_bytes();

    let block_count = (output.len() + os - 1) / os.max(1);
    if block_count as u64 > MAX_BLOCKS {
        return Err(ScryptError::Parameter(format!(
            "pbkdf2: requested {} bytes exceeds the (2^32-1)*{} ceiling",
            output.len(),
            os
        )));
    }

    // A temporary storage array needed by calculate_block. This is really only necessary if
    // c > 1, but most callers use a value much larger than 1.
    let mut scratch: Vec<u8> = vec![0; os];

    let mut idx: u32 = 0;

    for chunk in output.chunks_mut(os) {
        // The block index starts at 1.
        idx += 1;

        if chunk.len() == os {
            calculate_block(&context, salt, c, idx, &mut scratch, chunk);
        } else {
            let mut tmp: Vec<u8> = vec![0; os];
            calculate_block(&context, salt, c, idx, &mut scratch[..], &mut tmp[..]);
            let chunk_len = chunk.len();
            chunk[0..chunk_len].copy_from_slice(&tmp[..chunk_len]);
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::pbkdf2;
    use crate::hmac;

    #[test]
    fn rfc6070_sha256_vector() {
        // PBKDF2-HMAC-SHA256 is not in RFC 6070 (which uses SHA-1); this is a
        // well-known cross-implementation vector for the SHA-256 variant,
        // also reproduced by other PBKDF2 implementations in this codebase's
        // lineage.
        let password = b"password";
        let salt = b"salt";
        let mut out = [0u8; 32];
        pbkdf2::<hmac::SHA256>(password, salt, 1, &mut out).unwrap();
        assert_eq!(
            out,
            [
                0x12, 0x0f, 0xb6, 0xcf, 0xfc, 0xf8, 0xb3, 0x2c, 0x43, 0xe7, 0x22, 0x52, 0x56, 0xc4,
                0xf8, 0x37, 0xa8, 0x65, 0x48, 0xc9, 0x2c, 0xcc, 0x35, 0x48, 0x08, 0x05, 0x98, 0x7c,
                0xb7, 0x0b, 0xe1, 0x7b,
            ]
        );
    }

    #[test]
    fn zero_iterations_is_rejected() {
        let mut out = [0u8; 32];
        assert!(pbkdf2::<hmac::SHA256>(b"p", b"s", 0, &mut out).is_err());
    }

    #[test]
    fn output_length_not_a_multiple_of_block_size_is_truncated_correctly() {
        let mut out = [0u8; 5];
        pbkdf2::<hmac::SHA256>(b"password", b"salt", 1, &mut out).unwrap();
        let mut full = [0u8; 32];
        pbkdf2::<hmac::SHA256>(b"password", b"salt", 1, &mut full).unwrap();
        assert_eq!(&out[..], &full[..5]);
    }
}
