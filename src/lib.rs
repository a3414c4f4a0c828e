// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A pure-Rust implementation of the scrypt password-based key derivation
//! function (Percival, "Stronger Key Derivation via Sequential Memory-Hard
//! Functions"), plus a self-describing password-hash record format on top
//! of it.
//!
//! This is a fork of [cryptoxide](https://github.com/typed-io/cryptoxide/)'s
//! `scrypt` module, narrowed to just scrypt and the HMAC-SHA256/PBKDF2
//! primitives it needs, re-pointed at the `sha2` crate for the SHA-256
//! primitive instead of an in-tree implementation.
//!
//! Notable differences from the original sources:
//!
//! * Only scrypt and its building blocks are kept; the rest of cryptoxide's
//!   algorithm collection (AES, blake2, chacha20, curve25519, ed25519, sha1,
//!   sha3, ...) is dropped.
//! * SHA-256 is supplied by the `sha2` crate rather than reimplemented.
//! * Every `assert!`-style parameter check becomes a `Result::Err`; see
//!   [`error::ScryptError`].
//! * Adds a `$s0$...` password-hash record encoder/verifier (the `password`
//!   module), which the original left as commented-out prose.
//!
//! As with any cryptographic implementation, review and audit before relying
//! on it for anything security-sensitive.

#![allow(unknown_lints)]
#![warn(clippy::all)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::many_single_char_names)]

mod cryptoutil;
pub mod error;
pub mod hmac;
pub mod password;
pub mod pbkdf2;
pub mod scrypt;

pub use error::{ScryptError, ScryptResult};
pub use password::{hash_password, hash_password_with_params, verify_password};
pub use scrypt::{derive, derive_default, scrypt, ScryptParams};
