//!
//! Module defining the general interfaces.
//!

use rand_core::{CryptoRng, RngCore};
// ---
use crate::common::{KeyPair, Result};

///
/// An interface for a signature scheme that can generate key pairs, sign a
/// message and verify the signature over it.
///
/// The caller supplies the CSPRNG; everything else the scheme derives
/// deterministically from seeds, so two runs over the same randomness agree
/// bit for bit.
///
pub trait SignatureSchemeTrait {
    type CsPrng: CryptoRng + RngCore;
    type SecretKey;
    type PublicKey;
    type Signature;

    ///
    /// Checks the configured parameters. It is recommended to do the check
    /// during initialization.
    ///
    /// For example that the ring dimension admits the bit-packed layouts.
    fn check_params() -> bool;
    fn gen_key_pair(rng: &mut Self::CsPrng) -> Result<KeyPair<Self::SecretKey, Self::PublicKey>>;
    fn sign(
        msg: &[u8],
        secret_key: &Self::SecretKey,
        rng: &mut Self::CsPrng,
    ) -> Result<Self::Signature>;
    fn verify(msg: &[u8], signature: &Self::Signature, pub_key: &Self::PublicKey) -> Result<()>;
}
