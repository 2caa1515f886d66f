//!
//! Code shared throughout the crate: the error type and a few aliases.
//!

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A 32-byte seed as consumed by key generation and sampling.
pub type Seed = [u8; 32];

/// Status every fallible public operation reports. One kind per failure class;
/// verification failure is a defined negative result, not a program error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChipmunkError {
    /// Null-equivalent or malformed input, size mismatch.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// Output capacity insufficient.
    #[error("buffer too small: need {need} bytes, got {got}")]
    BufferTooSmall { need: usize, got: usize },
    /// Operation requested before the module was set up.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
    /// Out-of-range intermediate that 64-bit widening should make unreachable.
    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),
    /// The underlying hash adapter refused the request.
    #[error("hash operation failed")]
    HashFailure,
    /// The random source refused the request.
    #[error("random source failed")]
    RngFailure,
    /// The signature did not verify.
    #[error("signature verification failed")]
    VerificationFailed,
    /// Anything the core assumes cannot happen. Terminal; indicates a bug.
    #[error("internal invariant violation: {0}")]
    InternalInvariantViolation(&'static str),
}

pub type Result<T> = std::result::Result<T, ChipmunkError>;

/// Container pairing a secret key with its public counterpart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyPair<GSecretKey, GPublicKey> {
    pub secret: GSecretKey,
    pub public: GPublicKey,
}

impl<GSecretKey, GPublicKey> KeyPair<GSecretKey, GPublicKey> {
    pub fn new(secret: GSecretKey, public: GPublicKey) -> Self {
        KeyPair { secret, public }
    }
}
