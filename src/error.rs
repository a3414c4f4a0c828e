//! Error taxonomy for the scrypt KDF and the password-hash record format.
//!
//! The kinds here map directly onto the ones a caller needs to tell apart:
//! bad parameters are the caller's fault and non-retryable, a malformed
//! hash record is a data problem, RNG failure means the host has no usable
//! entropy source, and an allocation failure means the parameters were fine
//! but the host doesn't have the memory to back them.

use thiserror::Error;

/// Errors produced by the scrypt KDF and the password-hash record encoder/decoder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScryptError {
    /// `N`, `r`, `p` or `dkLen` violate one of the constraints in the scrypt
    /// specification (RFC 7914 §6, §2).
    #[error("invalid scrypt parameter: {0}")]
    Parameter(String),

    /// A password-hash record string did not parse: wrong version tag,
    /// malformed hex, malformed base64, or a decoded field of the wrong
    /// length.
    #[error("malformed password hash record: {0}")]
    Format(String),

    /// The secure random source failed to produce a salt.
    #[error("random source failed: {0}")]
    Rng(String),

    /// The host could not provide the memory ROMix's `V` array requires.
    /// Distinct from `Parameter` because the parameters themselves are
    /// legal; the memory just isn't available.
    #[error("allocation failed: {0}")]
    Internal(String),
}

/// Convenience alias for fallible scrypt operations.
pub type ScryptResult<T> = Result<T, ScryptError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn variants_render_distinct_messages() {
        let p = ScryptError::Parameter("r must be >= 1".into());
        let f = ScryptError::Format("missing field".into());
        let r = ScryptError::Rng("OsRng unavailable".into());
        let i = ScryptError::Internal("allocation of 16777216 bytes failed".into());
        assert_ne!(p.to_string(), f.to_string());
        assert_ne!(r.to_string(), i.to_string());
    }
}
