//! Implements the Scrypt key derivation function, as specified in [Specification][1].
//!
//! # Examples
//!
//! ```
//! use scryptkit::scrypt::{scrypt, ScryptParams};
//!
//! let password = b"password";
//! let salt = b"salt";
//! let params = ScryptParams::new(4, 1, 1).unwrap();
//! let mut out = [0u8; 64];
//! scrypt(password, salt, &params, &mut out).unwrap();
//! ```
//!
//! # References
//! [1]: <http://www.tarsnap.com/scrypt/scrypt.pdf>

mod block_mix;
mod ro_mix;
mod salsa;

use zeroize::Zeroize;

use crate::error::ScryptError;
use crate::hmac;
use crate::pbkdf2::pbkdf2;

/// The Scrypt parameter values: the CPU/memory cost factor `N` (stored as
/// `log2(N)`, per Design Notes §9), the block-size factor `r`, and the
/// parallelization factor `p`.
#[derive(Clone, Copy, Debug)]
pub struct ScryptParams {
    log_n: u8,
    r: u32,
    p: u32,
}

impl ScryptParams {
    /// Create a new instance of `ScryptParams`.
    ///
    /// # Arguments
    /// * `log_n` - The log2 of the Scrypt cost parameter `N`.
    /// * `r` - The Scrypt block-size factor.
    /// * `p` - The Scrypt parallelization factor.
    ///
    /// # Errors
    /// Returns [`ScryptError::Parameter`] if any of the constraints in RFC
    /// 7914 §2 don't hold: `r >= 1`, `p >= 1`, `1 <= log_n < 16*r`, and none
    /// of `r*128`, `N*r*128`, `p*r*128` overflow `usize`.
    pub fn new(log_n: u8, r: u32, p: u32) -> Result<ScryptParams, ScryptError> {
        if r == 0 {
            return Err(ScryptError::Parameter("r must be >= 1".into()));
        }
        if p == 0 {
            return Err(ScryptError::Parameter("p must be >= 1".into()));
        }
        if log_n == 0 {
            return Err(ScryptError::Parameter(
                "log_n must be >= 1 (N must be >= 2)".into(),
            ));
        }
        if (log_n as usize) >= usize::BITS as usize {
            return Err(ScryptError::Parameter(
                "log_n is too large for this platform's usize".into(),
            ));
        }

        let r = r as usize;
        let p = p as usize;
        let n: usize = 1usize
            .checked_shl(log_n as u32)
            .ok_or_else(|| ScryptError::Parameter("N = 2^log_n overflows usize".into()))?;

        let r128 = r
            .checked_mul(128)
            .ok_or_else(|| ScryptError::Parameter("r * 128 overflows".into()))?;
        r128.checked_mul(n)
            .ok_or_else(|| ScryptError::Parameter("N * r * 128 overflows".into()))?;
        r128.checked_mul(p)
            .ok_or_else(|| ScryptError::Parameter("p * r * 128 overflows".into()))?;

        // RFC 7914 §2: N < 2^(128*r/8), i.e. log_n < r*16.
        if (log_n as usize) >= r * 16 {
            return Err(ScryptError::Parameter(format!(
                "log_n ({log_n}) must be < 16*r ({})",
                r * 16
            )));
        }

        // RFC 7914 §2: p <= ((2^32-1)*32) / (128*r), rearranged to avoid the
        // division, matching the teacher's derivation.
        if r * p >= 0x4000_0000 {
            return Err(ScryptError::Parameter(
                "p * r must be < 2^30 (RFC 7914 parallelization bound)".into(),
            ));
        }

        Ok(ScryptParams {
            log_n,
            r: r as u32,
            p: p as u32,
        })
    }

    /// `log2(N)`, the cost factor as stored.
    pub fn log_n(&self) -> u8 {
        self.log_n
    }

    /// The block-size factor `r`.
    pub fn r(&self) -> u32 {
        self.r
    }

    /// The parallelization factor `p`.
    pub fn p(&self) -> u32 {
        self.p
    }
}

/// Default scrypt parameters used by [`crate::password::hash_password`]:
/// `N = 2^14`, `r = 8`, `p = 1`, matching the values recommended for
/// interactive password hashing in RFC 7914 §9.
pub fn default_params() -> ScryptParams {
    ScryptParams::new(14, 8, 1).expect("default scrypt parameters are always valid")
}

/// The scrypt key derivation function.
///
/// # Arguments
/// * `password` - The password to derive from.
/// * `salt` - The salt value to use.
/// * `params` - The [`ScryptParams`] to use.
/// * `output` - The resulting derived key is written here; its length is the
///   caller-chosen `dkLen`.
///
/// # Errors
/// [`ScryptError::Parameter`] if `output` is empty or exceeds the PBKDF2
/// ceiling. [`ScryptError::Internal`] if the `N*128*r`-byte ROMix working
/// set cannot be allocated.
pub fn scrypt(
    password: &[u8],
    salt: &[u8],
    params: &ScryptParams,
    output: &mut [u8],
) -> Result<(), ScryptError> {
    if output.is_empty() {
        return Err(ScryptError::Parameter(
            "scrypt: output length must be >= 1".into(),
        ));
    }
    if output.len() / 32 > 0xffff_ffff {
        return Err(ScryptError::Parameter(
            "scrypt: output length exceeds (2^32-1)*32".into(),
        ));
    }

    // The checks in ScryptParams::new guarantee these multiplications fit.
    let n = 1usize << params.log_n;
    let r128 = (params.r as usize) * 128;
    let p = params.p as usize;
    let pr128 = p * r128;

    log::debug!(
        "scrypt: N=2^{} r={} p={} dkLen={}",
        params.log_n,
        params.r,
        params.p,
        output.len()
    );

    let mut b: Vec<u8> = vec![0; pr128];
    pbkdf2::<hmac::SHA256>(password, salt, 1, &mut b)?;

    run_romix_passes(&mut b, r128, n, p)?;

    pbkdf2::<hmac::SHA256>(password, &b, 1, output)?;

    b.zeroize();

    Ok(())
}

/// Run ROMix over each of the `p` independent `r128`-byte slices of `b`.
///
/// Per spec.md §5, the `p` passes are embarrassingly parallel: each worker
/// owns a disjoint slice and writes only to it, so the final result is
/// deterministic regardless of completion order. For `p == 1` (the common
/// case) this runs on the caller's thread with no extra overhead.
fn run_romix_passes(b: &mut [u8], r128: usize, n: usize, p: usize) -> Result<(), ScryptError> {
    if p == 1 {
        log::trace!("scrypt: running single ROMix pass on the calling thread");
        return ro_mix::ro_mix(b, n);
    }

    log::trace!("scrypt: dispatching {p} ROMix passes across worker threads");
    std::thread::scope(|scope| -> Result<(), ScryptError> {
        let handles: Vec<_> = b
            .chunks_mut(r128)
            .map(|chunk| scope.spawn(move || ro_mix::ro_mix(chunk, n)))
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(result) => result?,
                Err(_) => {
                    return Err(ScryptError::Internal(
                        "a ROMix worker thread panicked".into(),
                    ))
                }
            }
        }
        Ok(())
    })
}

/// Derive `output.len()` bytes from `passphrase` and `salt` with explicit
/// parameters.
pub fn derive(
    passphrase: &[u8],
    salt: &[u8],
    params: &ScryptParams,
    output: &mut [u8],
) -> Result<(), ScryptError> {
    scrypt(passphrase, salt, params, output)
}

/// Derive `dk_len` bytes from `passphrase` and `salt` using the default
/// parameters (`N=2^14, r=8, p=1`).
pub fn derive_default(
    passphrase: &[u8],
    salt: &[u8],
    dk_len: usize,
) -> Result<Vec<u8>, ScryptError> {
    let mut out = vec![0u8; dk_len];
    scrypt(passphrase, salt, &default_params(), &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::{ro_mix, run_romix_passes, scrypt, ScryptParams};
    use crate::hmac;
    use crate::pbkdf2::pbkdf2;

    struct Test {
        password: &'static str,
        salt: &'static str,
        log_n: u8,
        r: u32,
        p: u32,
        expected: &'static [u8],
    }

    // RFC 7914 §12 test vectors. The fourth (N=2^20) is omitted: it needs
    // 1 GiB of working memory and takes too long for a unit test suite.
    fn tests() -> &'static [Test] {
        &[
            Test {
                password: "",
                salt: "",
                log_n: 4,
                r: 1,
                p: 1,
                expected: &[
                    0x77, 0xd6, 0x57, 0x62, 0x38, 0x65, 0x7b, 0x20, 0x3b, 0x19, 0xca, 0x42, 0xc1,
                    0x8a, 0x04, 0x97, 0xf1, 0x6b, 0x48, 0x44, 0xe3, 0x07, 0x4a, 0xe8, 0xdf, 0xdf,
                    0xfa, 0x3f, 0xed, 0xe2, 0x14, 0x42, 0xfc, 0xd0, 0x06, 0x9d, 0xed, 0x09, 0x48,
                    0xf8, 0x32, 0x6a, 0x75, 0x3a, 0x0f, 0xc8, 0x1f, 0x17, 0xe8, 0xd3, 0xe0, 0xfb,
                    0x2e, 0x0d, 0x36, 0x28, 0xcf, 0x35, 0xe2, 0x0c, 0x38, 0xd1, 0x89, 0x06,
                ],
            },
            Test {
                password: "password",
                salt: "NaCl",
                log_n: 10,
                r: 8,
                p: 16,
                expected: &[
                    0xfd, 0xba, 0xbe, 0x1c, 0x9d, 0x34, 0x72, 0x00, 0x78, 0x56, 0xe7, 0x19, 0x0d,
                    0x01, 0xe9, 0xfe, 0x7c, 0x6a, 0xd7, 0xcb, 0xc8, 0x23, 0x78, 0x30, 0xe7, 0x73,
                    0x76, 0x63, 0x4b, 0x37, 0x31, 0x62, 0x2e, 0xaf, 0x30, 0xd9, 0x2e, 0x22, 0xa3,
                    0x88, 0x6f, 0xf1, 0x09, 0x27, 0x9d, 0x98, 0x30, 0xda, 0xc7, 0x27, 0xaf, 0xb9,
                    0x4a, 0x83, 0xee, 0x6d, 0x83, 0x60, 0xcb, 0xdf, 0xa2, 0xcc, 0x06, 0x40,
                ],
            },
            Test {
                password: "pleaseletmein",
                salt: "SodiumChloride",
                log_n: 14,
                r: 8,
                p: 1,
                expected: &[
                    0x70, 0x23, 0xbd, 0xcb, 0x3a, 0xfd, 0x73, 0x48, 0x46, 0x1c, 0x06, 0xcd, 0x81,
                    0xfd, 0x38, 0xeb, 0xfd, 0xa8, 0xfb, 0xba, 0x90, 0x4f, 0x8e, 0x3e, 0xa9, 0xb5,
                    0x43, 0xf6, 0x54, 0x5d, 0xa1, 0xf2, 0xd5, 0x43, 0x29, 0x55, 0x61, 0x3f, 0x0f,
                    0xcf, 0x62, 0xd4, 0x97, 0x05, 0x24, 0x2a, 0x9a, 0xf9, 0xe6, 0x1e, 0x85, 0xdc,
                    0x0d, 0x65, 0x1e, 0x40, 0xdf, 0xcf, 0x01, 0x7b, 0x45, 0x57, 0x58, 0x87,
                ],
            },
        ]
    }

    #[test]
    fn rfc7914_scrypt_vectors() {
        for t in tests().iter() {
            let mut result = vec![0u8; t.expected.len()];
            let params = ScryptParams::new(t.log_n, t.r, t.p).unwrap();
            scrypt(t.password.as_bytes(), t.salt.as_bytes(), &params, &mut result).unwrap();
            assert_eq!(result, t.expected);
        }
    }

    #[test]
    fn p_greater_than_one_completes_and_produces_nonzero_output() {
        // p=1 and p=4 derive from different B slabs (pr128 differs), so the
        // keys are expected to differ from each other; this test only pins
        // that the p>1 threaded dispatch path runs to completion and yields
        // *a* 32-byte key, not the all-zero buffer it started from. The
        // order-independence claim itself is covered by
        // `p_dispatch_is_independent_of_worker_completion_order` below.
        let params_p1 = ScryptParams::new(8, 2, 1).unwrap();
        let params_p4 = ScryptParams::new(8, 2, 4).unwrap();

        let mut out_p1 = [0u8; 32];
        let mut out_p4 = [0u8; 32];
        scrypt(b"hunter2", b"some-salt", &params_p1, &mut out_p1).unwrap();
        scrypt(b"hunter2", b"some-salt", &params_p4, &mut out_p4).unwrap();

        assert_ne!(out_p1, [0u8; 32]);
        assert_ne!(out_p4, [0u8; 32]);
    }

    #[test]
    fn same_params_are_deterministic_across_repeated_calls() {
        let params = ScryptParams::new(8, 2, 4).unwrap();
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        scrypt(b"hunter2", b"some-salt", &params, &mut a).unwrap();
        scrypt(b"hunter2", b"some-salt", &params, &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn p_dispatch_is_independent_of_worker_completion_order() {
        // spec.md §5/§8: the final key must not depend on the order in which
        // the p ROMix workers finish, since each owns a disjoint slice of B.
        // Exercise that directly by running the same PBKDF2-expanded buffer
        // through ROMix two different ways — once sequentially, slice by
        // slice in order, and once through `run_romix_passes`'s p>1 threaded
        // dispatch (where workers may finish in any order) — and comparing
        // the results byte for byte.
        let r = 2usize;
        let log_n = 6u8;
        let n = 1usize << log_n;
        let p = 4usize;
        let r128 = r * 128;

        let mut b_sequential = vec![0u8; p * r128];
        pbkdf2::<hmac::SHA256>(b"hunter2", b"some-salt", 1, &mut b_sequential).unwrap();
        let mut b_threaded = b_sequential.clone();

        for chunk in b_sequential.chunks_mut(r128) {
            ro_mix::ro_mix(chunk, n).unwrap();
        }
        run_romix_passes(&mut b_threaded, r128, n, p).unwrap();

        assert_eq!(b_sequential, b_threaded);
    }

    #[test]
    fn rejects_empty_output() {
        let params = ScryptParams::new(4, 1, 1).unwrap();
        let mut out: [u8; 0] = [];
        assert!(scrypt(b"p", b"s", &params, &mut out).is_err());
    }

    #[test]
    fn params_reject_zero_r_and_p_and_log_n() {
        assert!(ScryptParams::new(4, 0, 1).is_err());
        assert!(ScryptParams::new(4, 1, 0).is_err());
        assert!(ScryptParams::new(0, 1, 1).is_err());
    }

    #[test]
    fn params_reject_log_n_too_large_for_r() {
        // log_n must be < 16*r; with r=1 that caps log_n at 15.
        assert!(ScryptParams::new(16, 1, 1).is_err());
        assert!(ScryptParams::new(15, 1, 1).is_ok());
    }
}
