//! A self-describing password-hash record built on top of [`crate::scrypt`].
//!
//! The wire format is `$s0$hex8$base64(salt)$base64(key)`, where `hex8` is 8
//! lowercase hex digits packing `(log2(N) << 16) | (r << 8) | p` big-endian,
//! `salt` is 16 bytes and `key` is the 32-byte scrypt output. Grounded on the
//! `pbkdf2_sha256$iterations$salt$hash` record this crate's corpus uses
//! elsewhere (OsRng salt, base64-encoded fields, `subtle::ConstantTimeEq`
//! comparison), adapted to scrypt's three-parameter cost and the `$s0$`
//! packed-hex encoding this format mandates instead of a bare iteration
//! count.
//!
//! # Examples
//!
//! ```
//! use scryptkit::password::{hash_password, verify_password};
//!
//! let encoded = hash_password("correct horse battery staple").unwrap();
//! assert!(verify_password("correct horse battery staple", &encoded));
//! assert!(!verify_password("Correct horse battery staple", &encoded));
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::error::ScryptError;
use crate::scrypt::{scrypt, default_params, ScryptParams};

const VERSION_TAG: &str = "s0";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Hash `passphrase` with the default scrypt parameters (`N=2^14, r=8, p=1`)
/// and a freshly drawn 16-byte salt, returning the `$s0$...` record.
///
/// # Errors
/// [`ScryptError::Rng`] if the OS random source fails to fill the salt.
/// [`ScryptError::Internal`] if the scrypt ROMix working set can't be
/// allocated (parameters are always legal here, so `Parameter` cannot occur).
pub fn hash_password(passphrase: &str) -> Result<String, ScryptError> {
    hash_password_with_params(passphrase, &default_params())
}

/// Hash `passphrase` with caller-chosen scrypt parameters.
///
/// # Errors
/// See [`hash_password`]; additionally [`ScryptError::Parameter`] if `r` or
/// `p` doesn't fit in the record's 8-bit packed-parameter fields (`r > 0xff`
/// or `p > 0xff`) — `ScryptParams::new` only enforces `r*p < 2^30`, which
/// admits values too large for this record format to round-trip.
pub fn hash_password_with_params(
    passphrase: &str,
    params: &ScryptParams,
) -> Result<String, ScryptError> {
    let packed = pack_params(params)?;

    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| ScryptError::Rng(e.to_string()))?;

    let mut key = [0u8; KEY_LEN];
    scrypt(passphrase.as_bytes(), &salt, params, &mut key)?;

    let encoded = encode_record(packed, &salt, &key);
    key.zeroize();
    Ok(encoded)
}

/// Verify `passphrase` against a previously produced `$s0$...` record.
///
/// Returns `false` both for a wrong passphrase and for a malformed record —
/// collapsing the two prevents an oracle that would let a caller distinguish
/// "this hash is corrupt" from "this password is wrong". A malformed record
/// is logged at `debug` level for diagnostics (spec's side-channel
/// allowance), never surfaced to the caller as an error.
pub fn verify_password(passphrase: &str, encoded: &str) -> bool {
    let (params, salt, expected_key) = match decode_record(encoded) {
        Ok(parts) => parts,
        Err(e) => {
            log::debug!("verify_password: malformed record: {e}");
            return false;
        }
    };

    let mut key = [0u8; KEY_LEN];
    if scrypt(passphrase.as_bytes(), &salt, &params, &mut key).is_err() {
        return false;
    }

    let matches = key.ct_eq(&expected_key[..]).into();
    key.zeroize();
    matches
}

/// Pack `(log2(N), r, p)` into the big-endian 32-bit word the `hex8` field
/// of the record encodes: `log2(N)` in bits 31..16, `r` in bits 15..8, `p`
/// in bits 7..0.
///
/// # Errors
/// [`ScryptError::Parameter`] if `r` or `p` doesn't fit in a byte —
/// `ScryptParams::new` allows `r`/`p` combinations that satisfy `r*p < 2^30`
/// but overflow this record format's 8-bit fields, which would otherwise
/// truncate silently and encode a different parameter than was used to
/// derive the key.
fn pack_params(params: &ScryptParams) -> Result<u32, ScryptError> {
    if params.r() > 0xff {
        return Err(ScryptError::Parameter(format!(
            "r ({}) does not fit in the record's 8-bit field",
            params.r()
        )));
    }
    if params.p() > 0xff {
        return Err(ScryptError::Parameter(format!(
            "p ({}) does not fit in the record's 8-bit field",
            params.p()
        )));
    }
    Ok(((params.log_n() as u32) << 16) | (params.r() << 8) | params.p())
}

fn unpack_params(word: u32) -> Result<ScryptParams, ScryptError> {
    let log_n_field = (word >> 16) & 0xffff;
    if log_n_field > u8::MAX as u32 {
        return Err(ScryptError::Format(format!(
            "log2(N) field {log_n_field} does not fit in a byte"
        )));
    }
    let r = (word >> 8) & 0xff;
    let p = word & 0xff;
    ScryptParams::new(log_n_field as u8, r, p)
}

fn encode_record(packed_params: u32, salt: &[u8], key: &[u8]) -> String {
    format!(
        "${}${:08x}${}${}",
        VERSION_TAG,
        packed_params,
        STANDARD.encode(salt),
        STANDARD.encode(key),
    )
}

fn decode_record(encoded: &str) -> Result<(ScryptParams, [u8; SALT_LEN], [u8; KEY_LEN]), ScryptError> {
    let mut parts = encoded.split('$');

    // encoded starts with '$', so the first split segment is empty.
    let leading = parts.next();
    if leading != Some("") {
        return Err(ScryptError::Format("record must start with '$'".into()));
    }

    let tag = parts
        .next()
        .ok_or_else(|| ScryptError::Format("missing version tag".into()))?;
    if tag != VERSION_TAG {
        return Err(ScryptError::Format(format!(
            "unsupported version tag '{tag}', expected '{VERSION_TAG}'"
        )));
    }

    let hex = parts
        .next()
        .ok_or_else(|| ScryptError::Format("missing packed-parameter field".into()))?;
    if hex.len() != 8 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ScryptError::Format(
            "packed-parameter field must be exactly 8 hex digits".into(),
        ));
    }
    let word = u32::from_str_radix(hex, 16)
        .map_err(|e| ScryptError::Format(format!("bad hex in packed-parameter field: {e}")))?;
    let params = unpack_params(word)?;

    let salt_b64 = parts
        .next()
        .ok_or_else(|| ScryptError::Format("missing salt field".into()))?;
    let salt = STANDARD
        .decode(salt_b64)
        .map_err(|e| ScryptError::Format(format!("bad base64 in salt field: {e}")))?;
    if salt.len() != SALT_LEN {
        return Err(ScryptError::Format(format!(
            "salt must decode to {SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }

    let key_b64 = parts
        .next()
        .ok_or_else(|| ScryptError::Format("missing key field".into()))?;
    let key = STANDARD
        .decode(key_b64)
        .map_err(|e| ScryptError::Format(format!("bad base64 in key field: {e}")))?;
    if key.len() != KEY_LEN {
        return Err(ScryptError::Format(format!(
            "key must decode to {KEY_LEN} bytes, got {}",
            key.len()
        )));
    }

    if parts.next().is_some() {
        return Err(ScryptError::Format("trailing data after key field".into()));
    }

    let mut salt_arr = [0u8; SALT_LEN];
    salt_arr.copy_from_slice(&salt);
    let mut key_arr = [0u8; KEY_LEN];
    key_arr.copy_from_slice(&key);

    Ok((params, salt_arr, key_arr))
}
