//! Implements the Hash Message Authentication Code (HMAC), RFC 2104.
//!
//! # Examples
//!
//! HMAC-SHA256 using a 16 bytes key and the incremental interface:
//!
//! ```
//! use scryptkit::{hmac, hmac::SHA256};
//!
//! let key = [0,1,2,3,4,5,6,7,8,9,10,11,12,13,14,15];
//! let mut context = hmac::Context::<SHA256>::new(&key);
//! context.update(b"my ");
//! context.update(b"message");
//! let mac = context.finalize();
//! ```
//!
//! or using the more concise one-shot interface:
//!
//! ```
//! use scryptkit::hmac::{hmac, SHA256};
//!
//! let key = [0,1,2,3,4,5,6,7,8,9,10,11,12,13,14,15];
//! let mac = hmac::<SHA256>(&key, b"my message");
//! ```

use crate::cryptoutil::zero;
use sha2::{Digest as _, Sha256};
use subtle::ConstantTimeEq;

// HMAC is implemented using the following operations:
//
// HMAC(K, m) = H( (K' ⊕ opad) || H( (K' ⊕ ipad) || m ) )
// where
//   K' = H(K) if length K > block size
//      | K    otherwise
//   H is a cryptographic hash function
//   m is the message to be authenticated
//   K is the secret key
//   || denotes concatenation
//   ⊕ denotes bitwise exclusive or (XOR)
//   opad is the block-sized outer padding, consisting of repeated bytes valued 0x5c
//   ipad is the block-sized inner padding, consisting of repeated bytes valued 0x36
//
// The SHA-256 primitive itself is not reimplemented here: it is supplied by
// the `sha2` crate. This module only implements the HMAC construction around
// it.

/// Algorithm defined to do HMAC, parametrized over the underlying hash.
///
/// Only `SHA256` is instantiated by this crate, but the trait is kept
/// generic so the construction itself stays independent of the hash
/// function plugged into it.
pub trait Algorithm {
    const BLOCK_SIZE: usize;
    const OUTPUT_SIZE: usize;

    type Context: Clone;
    type MacOutput;

    fn init(key: &[u8]) -> (Self::Context, Self::Context);
    fn update(context: &mut Self::Context, input: &[u8]);
    fn feed(context: &mut Self::Context, other: &mut Self::Context);
    fn finalize(context: &mut Self::Context) -> Self::MacOutput;
    fn finalize_at(context: &mut Self::Context, out: &mut [u8]);
}

/// HMAC-SHA256, the only MAC this crate instantiates (scrypt's PRF).
#[derive(Clone, Debug)]
pub struct SHA256;

impl SHA256 {
    pub const BLOCK_SIZE: usize = 64;
    pub const OUTPUT_SIZE: usize = 32;
}

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

impl Algorithm for SHA256 {
    const BLOCK_SIZE: usize = Self::BLOCK_SIZE;
    const OUTPUT_SIZE: usize = Self::OUTPUT_SIZE;

    type Context = Sha256;
    type MacOutput = Tag<{ Self::OUTPUT_SIZE }>;

    fn init(key: &[u8]) -> (Self::Context, Self::Context) {
        let mut k = [0u8; Self::BLOCK_SIZE];
        if key.len() <= Self::BLOCK_SIZE {
            k[0..key.len()].copy_from_slice(key);
        } else {
            let digest = Sha256::digest(key);
            k[0..Self::OUTPUT_SIZE].copy_from_slice(&digest);
        }

        let mut mix = [0u8; Self::BLOCK_SIZE];

        let mut inner_ctx = Sha256::new();
        for (m, k_byte) in mix.iter_mut().zip(k.iter()) {
            *m = k_byte ^ IPAD;
        }
        inner_ctx.update(mix);

        let mut outer_ctx = Sha256::new();
        for (m, k_byte) in mix.iter_mut().zip(k.iter()) {
            *m = k_byte ^ OPAD;
        }
        outer_ctx.update(mix);

        zero(&mut k);
        zero(&mut mix);

        (inner_ctx, outer_ctx)
    }

    fn update(context: &mut Self::Context, input: &[u8]) {
        context.update(input);
    }

    fn feed(context: &mut Self::Context, other: &mut Self::Context) {
        let output = other.finalize_reset();
        context.update(output);
    }

    fn finalize(context: &mut Self::Context) -> Self::MacOutput {
        let output = context.finalize_reset();
        Tag(output.into())
    }

    fn finalize_at(context: &mut Self::Context, out: &mut [u8]) {
        let output = context.finalize_reset();
        out.copy_from_slice(&output);
    }
}

/// HMAC Tag with the number of bytes associated as const type parameter.
///
/// Equipped with a constant-time equality via [`subtle::ConstantTimeEq`] and
/// via the standard `PartialEq`, so comparing tags never leaks timing
/// information.
pub struct Tag<const N: usize>(pub [u8; N]);

impl<'a, const N: usize> From<&'a Tag<N>> for &'a [u8] {
    fn from(tag: &'a Tag<N>) -> Self {
        &tag.0
    }
}

impl<const N: usize> PartialEq for Tag<N> {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl<const N: usize> Eq for Tag<N> {}

/// HMAC context parametrized by the hashing function.
///
/// It is composed of 2 hashing contexts, and the construction is meant to
/// hide the initial key from its context, by forcing the key component to
/// be processed by an initial compress step rendering the key not
/// recoverable from the context memory.
pub struct Context<A: Algorithm> {
    inner: A::Context,
    outer: A::Context,
}

impl<A: Algorithm> Clone for Context<A> {
    fn clone(&self) -> Self {
        Context {
            inner: self.inner.clone(),
            outer: self.outer.clone(),
        }
    }
}

impl<A: Algorithm> Context<A> {
    pub(crate) fn output_bytes(&self) -> usize {
        A::OUTPUT_SIZE
    }

    /// Create a new HMAC context instance with the given key.
    ///
    /// The key to use can be any sequence of bytes.
    pub fn new(key: &[u8]) -> Self {
        let (inner, outer) = A::init(key);
        Self { inner, outer }
    }

    /// Update the context with message. This can be called multiple times.
    pub fn update(&mut self, message: &[u8]) {
        A::update(&mut self.inner, message)
    }

    /// Finalize the context and get the associated HMAC Tag output.
    pub fn finalize(mut self) -> A::MacOutput {
        A::feed(&mut self.outer, &mut self.inner);
        A::finalize(&mut self.outer)
    }

    /// Finalize the context and write the HMAC output into `out`.
    pub fn finalize_at(&mut self, out: &mut [u8]) {
        A::feed(&mut self.outer, &mut self.inner);
        A::finalize_at(&mut self.outer, out)
    }
}

/// Generate a HMAC Tag for a given key and message.
///
/// ```
/// use scryptkit::hmac::{hmac, SHA256};
/// hmac::<SHA256>(&[1,2,3], b"message");
/// ```
pub fn hmac<A: Algorithm>(key: &[u8], message: &[u8]) -> A::MacOutput {
    let mut context: Context<A> = Context::new(key);
    context.update(message);
    context.finalize()
}
