//!
//! The single-signer lattice signature: Fiat-Shamir with aborts over the
//! N = 256 ring, with a hint mechanism that lets the verifier recover the
//! high-order bits of the commitment from A*z - c*h alone.
//!
//! The challenge seed binds the genuine commitment: the signer hashes the
//! packed high bits of w = A*y together with the message, and the verifier
//! reconstructs the same value through the hints. Secrets are small
//! (eta-bounded), which is what makes that reconstruction possible at all.
//!

use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
// ---
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;
use zeroize::Zeroize;
// ---
use crate::common::{ChipmunkError, KeyPair, Result, Seed};
use crate::config::{
    DOMAIN_SIG_KEY, DOMAIN_SIG_MATRIX, SIG_D, SIG_ETA, SIG_GAMMA1, SIG_HINT_WEIGHT, SIG_N,
    SIG_PRIVATE_KEY_SIZE, SIG_PUBLIC_KEY_SIZE, SIG_Q, SIG_SIGNATURE_SIZE, SIG_TAU,
};
use crate::hasher;
use crate::ntt::{Ring, SigRing};
use crate::poly::{NttPoly, TimePoly};
use crate::traits::SignatureSchemeTrait;
use crate::utils;

pub type SigPoly = TimePoly<SigRing>;
pub type SigNttPoly = NttPoly<SigRing>;
pub type SigKeypair = KeyPair<PrivateKey, PublicKey>;

/// How many abort-and-resample rounds the signer tolerates before declaring a
/// broken state. The per-round abort probability is below ten percent.
const MAX_SIGN_ATTEMPTS: usize = 128;

/// Public key: the commitment polynomial h = A*s1 + s2 and the 32-byte seed
/// rho that regenerates A.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublicKey {
    pub h: SigPoly,
    pub rho: Seed,
}

/// Private key. Secret material is wiped on drop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrivateKey {
    s1: SigPoly,
    s2: SigPoly,
    key_seed: Seed,
    /// 48-byte public-key commitment slot; a SHA3-256 digest zero-padded.
    #[serde(with = "BigArray")]
    tr: [u8; 48],
    pub pk: PublicKey,
}

impl Zeroize for PrivateKey {
    fn zeroize(&mut self) {
        self.s1.zeroize();
        self.s2.zeroize();
        self.key_seed.zeroize();
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Signature: challenge seed, response polynomial, hint bitmap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub c_seed: [u8; 32],
    pub z: SigPoly,
    pub hint: Vec<u8>,
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}",
            utils::shorten(&utils::to_hex(&self.to_bytes()), 16)
        )
    }
}

// ***************************************
//      HIGH/LOW DECOMPOSITION, HINTS
// ***************************************

/// Splits a coefficient into (low, high): a = high * 2^(D-1) + low with
/// low in (-2^(D-2), 2^(D-2)], the high part reduced mod 16.
fn decompose(coeff: i32) -> (i32, i32) {
    let a = crate::reduce::lift(coeff, SIG_Q);
    let mut hi = a >> (SIG_D - 1);
    let mut lo = a - (hi << (SIG_D - 1));
    if lo > 1 << (SIG_D - 2) {
        lo -= 1 << (SIG_D - 1);
        hi += 1;
    }
    (lo, hi & 15)
}

/// The high-bits projection of a polynomial.
fn high_bits(p: &SigPoly) -> Vec<i32> {
    p.coeffs().iter().map(|&c| decompose(c).1).collect()
}

/// Packs the 4-bit high parts two to a byte, N/2 bytes total. This is the
/// w-projection that enters the challenge hash.
fn pack_high_bits(w1: &[i32]) -> Vec<u8> {
    w1.chunks_exact(2)
        .map(|pair| (pair[0] & 0xf) as u8 | (((pair[1] & 0xf) as u8) << 4))
        .collect()
}

/// Hint bit i is set iff the high bits of w and of w - cs2 differ there.
/// Returns the bitmap and its weight.
fn make_hint(w: &SigPoly, cs2: &SigPoly) -> (Vec<u8>, usize) {
    let w_prime = w.sub(cs2);
    let mut hint = vec![0u8; SIG_N / 8];
    let mut weight = 0;
    for i in 0..SIG_N {
        if decompose(w.coeffs()[i]).1 != decompose(w_prime.coeffs()[i]).1 {
            hint[i / 8] |= 1 << (i % 8);
            weight += 1;
        }
    }
    (hint, weight)
}

/// Recovers the high bits of the original commitment from w' = w - cs2: where
/// a hint bit is set, the high part moves one step in the direction of the
/// low-bits sign. A set bit always moves the high part, so every hint-bit
/// flip is observable; an honest set bit never lands on zero low bits.
fn use_hint(w_prime: &SigPoly, hint: &[u8]) -> Vec<i32> {
    (0..SIG_N)
        .map(|i| {
            let (lo, hi) = decompose(w_prime.coeffs()[i]);
            if (hint[i / 8] >> (i % 8)) & 1 == 1 {
                if lo > 0 {
                    (hi + 1) & 15
                } else {
                    (hi - 1) & 15
                }
            } else {
                hi
            }
        })
        .collect()
}

fn hint_weight(hint: &[u8]) -> usize {
    hint.iter().map(|b| b.count_ones() as usize).sum()
}

// ***************************************
//          KEYGEN / SIGN / VERIFY
// ***************************************

/// Deterministic key generation from a 32-byte seed: the secret seed and the
/// matrix seed are domain-separated derivations, s1 and s2 are eta-bounded,
/// h = A*s1 + s2 computed through the NTT.
pub fn keygen(seed: &Seed) -> SigKeypair {
    let key_seed = hasher::domain_hash(DOMAIN_SIG_KEY, seed, 0);
    let rho = hasher::domain_hash(DOMAIN_SIG_MATRIX, seed, 0);

    let s1 = SigPoly::bounded(&key_seed, 0, SIG_ETA);
    let s2 = SigPoly::bounded(&key_seed, 1, SIG_ETA);

    let a = SigPoly::uniform(&rho, 0).ntt();
    let h = a.mul_pointwise(&s1.ntt()).inv_ntt().add(&s2);

    let pk = PublicKey { h, rho };

    let mut tr = [0u8; 48];
    tr[..32].copy_from_slice(&hasher::sha3_256(&pk.to_bytes()));

    debug!("keypair generated, pk {}", pk);
    KeyPair::new(
        PrivateKey {
            s1,
            s2,
            key_seed,
            tr,
            pk: pk.clone(),
        },
        pk,
    )
}

/// Signs a message. Samples a fresh masking polynomial per attempt and aborts
/// on the norm bound, the hint weight bound, and a hint self-check, so every
/// emitted signature verifies.
pub fn sign(sk: &PrivateKey, message: &[u8], rng: &mut (impl RngCore + CryptoRng)) -> Result<Signature> {
    let a = SigPoly::uniform(&sk.pk.rho, 0).ntt();
    let s1_ntt = sk.s1.ntt();
    let s2_ntt = sk.s2.ntt();

    for attempt in 0..MAX_SIGN_ATTEMPTS {
        // Zeroizing wipes the mask seed on every exit path out of this scope.
        let mut y_seed = zeroize::Zeroizing::new([0u8; 32]);
        rng.try_fill_bytes(&mut *y_seed)
            .map_err(|_| ChipmunkError::RngFailure)?;
        let y = SigPoly::bounded(&y_seed, 0, SIG_GAMMA1 - 1);

        let w = a.mul_pointwise(&y.ntt()).inv_ntt();
        let w1 = high_bits(&w);

        let c_seed = hasher::sha3_256_parts(&[&pack_high_bits(&w1), message]);
        let c = SigPoly::challenge(&c_seed, SIG_TAU)?;
        let c_ntt = c.ntt();

        let z = y.add(&c_ntt.mul_pointwise(&s1_ntt).inv_ntt());
        if !z.chknorm(SIG_GAMMA1 - 1) {
            trace!("sign attempt {attempt}: z norm rejection");
            continue;
        }

        let cs2 = c_ntt.mul_pointwise(&s2_ntt).inv_ntt();
        let (hint, weight) = make_hint(&w, &cs2);
        if weight > SIG_HINT_WEIGHT {
            trace!("sign attempt {attempt}: hint weight rejection ({weight})");
            continue;
        }

        // The decomposition wraps around q on a negligible fraction of
        // coefficients; resampling keeps verification exact.
        if use_hint(&w.sub(&cs2), &hint) != w1 {
            trace!("sign attempt {attempt}: hint wraparound rejection");
            continue;
        }

        debug!("signature produced after {} attempt(s)", attempt + 1);
        return Ok(Signature { c_seed, z, hint });
    }

    Err(ChipmunkError::InternalInvariantViolation(
        "rejection sampling did not terminate",
    ))
}

/// Verifies a signature: norm and hint-weight bounds, then the challenge
/// seed recomputed from the hint-recovered commitment high bits.
pub fn verify(pk: &PublicKey, message: &[u8], signature: &Signature) -> Result<()> {
    if signature.hint.len() != SIG_N / 8 {
        return Err(ChipmunkError::InvalidArgument("hint bitmap has wrong size"));
    }
    if !signature.z.chknorm(SIG_GAMMA1 - 1) {
        debug!("verify: z norm out of bounds");
        return Err(ChipmunkError::VerificationFailed);
    }
    if hint_weight(&signature.hint) > SIG_HINT_WEIGHT {
        debug!("verify: hint weight out of bounds");
        return Err(ChipmunkError::VerificationFailed);
    }

    let c = SigPoly::challenge(&signature.c_seed, SIG_TAU)?;
    let a = SigPoly::uniform(&pk.rho, 0).ntt();

    // w' = A*z - c*h = w - c*s2 for an honest signature.
    let w_prime = a
        .mul_pointwise(&signature.z.ntt())
        .sub(&c.ntt().mul_pointwise(&pk.h.ntt()))
        .inv_ntt();
    let w1 = use_hint(&w_prime, &signature.hint);

    let expected = hasher::sha3_256_parts(&[&pack_high_bits(&w1), message]);
    if expected == signature.c_seed {
        Ok(())
    } else {
        debug!("verify: challenge seed mismatch");
        Err(ChipmunkError::VerificationFailed)
    }
}

// ***************************************
//             SERIALIZATION
// ***************************************

impl PublicKey {
    /// h as 24-bit canonical coefficients, then the raw rho seed.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SIG_PUBLIC_KEY_SIZE);
        out.extend_from_slice(&self.h.to_bytes24());
        out.extend_from_slice(&self.rho);
        out
    }

    pub fn from_bytes(input: &[u8]) -> Result<Self> {
        if input.len() < SIG_PUBLIC_KEY_SIZE {
            return Err(ChipmunkError::BufferTooSmall {
                need: SIG_PUBLIC_KEY_SIZE,
                got: input.len(),
            });
        }
        let h = SigPoly::from_bytes24(&input[..SIG_N * 3])?;
        let mut rho = [0u8; 32];
        rho.copy_from_slice(&input[SIG_N * 3..SIG_N * 3 + 32]);
        Ok(PublicKey { h, rho })
    }
}

impl PrivateKey {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SIG_PRIVATE_KEY_SIZE);
        out.extend_from_slice(&self.s1.to_bytes24());
        out.extend_from_slice(&self.s2.to_bytes24());
        out.extend_from_slice(&self.key_seed);
        out.extend_from_slice(&self.tr);
        out.extend_from_slice(&self.pk.to_bytes());
        out
    }

    pub fn from_bytes(input: &[u8]) -> Result<Self> {
        if input.len() < SIG_PRIVATE_KEY_SIZE {
            return Err(ChipmunkError::BufferTooSmall {
                need: SIG_PRIVATE_KEY_SIZE,
                got: input.len(),
            });
        }
        let s1 = SigPoly::from_bytes24(&input[..SIG_N * 3])?;
        let s2 = SigPoly::from_bytes24(&input[SIG_N * 3..SIG_N * 6])?;

        let mut key_seed = [0u8; 32];
        key_seed.copy_from_slice(&input[SIG_N * 6..SIG_N * 6 + 32]);
        let mut tr = [0u8; 48];
        tr.copy_from_slice(&input[SIG_N * 6 + 32..SIG_N * 6 + 80]);

        let pk = PublicKey::from_bytes(&input[SIG_N * 6 + 80..])?;
        Ok(PrivateKey {
            s1,
            s2,
            key_seed,
            tr,
            pk,
        })
    }
}

impl Signature {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SIG_SIGNATURE_SIZE);
        out.extend_from_slice(&self.c_seed);
        utils::write_i32_coeffs(&mut out, self.z.coeffs());
        out.extend_from_slice(&self.hint);
        out
    }

    pub fn from_bytes(input: &[u8]) -> Result<Self> {
        if input.len() < SIG_SIGNATURE_SIZE {
            return Err(ChipmunkError::BufferTooSmall {
                need: SIG_SIGNATURE_SIZE,
                got: input.len(),
            });
        }
        let mut c_seed = [0u8; 32];
        c_seed.copy_from_slice(&input[..32]);

        let z = SigPoly::from_coeffs(utils::read_i32_coeffs(&input[32..], SIG_N));
        let hint = input[32 + SIG_N * 4..32 + SIG_N * 4 + SIG_N / 8].to_vec();
        Ok(Signature { c_seed, z, hint })
    }
}

// ***************************************
//             SCHEME SEAM
// ***************************************

/// The single-signer scheme behind the common trait, generic in the caller's
/// CSPRNG.
#[derive(Default)]
pub struct ChipmunkScheme<CsPrng: CryptoRng + RngCore> {
    _p: PhantomData<CsPrng>,
}

impl<CsPrng: CryptoRng + RngCore> SignatureSchemeTrait for ChipmunkScheme<CsPrng> {
    type CsPrng = CsPrng;
    type SecretKey = PrivateKey;
    type PublicKey = PublicKey;
    type Signature = Signature;

    fn check_params() -> bool {
        if SIG_N % 8 != 0 {
            error!("The ring dimension must admit the hint bitmap packing!");
            return false;
        }
        if SIG_GAMMA1 >= SIG_Q / 2 {
            error!("The rejection bound must leave room under the modulus!");
            return false;
        }
        // A wrong table root would corrupt every transform.
        SigRing::tables().forward[0] == 1
    }

    fn gen_key_pair(rng: &mut CsPrng) -> Result<KeyPair<PrivateKey, PublicKey>> {
        let mut seed = [0u8; 32];
        rng.try_fill_bytes(&mut seed)
            .map_err(|_| ChipmunkError::RngFailure)?;
        Ok(keygen(&seed))
    }

    fn sign(msg: &[u8], secret_key: &PrivateKey, rng: &mut CsPrng) -> Result<Signature> {
        sign(secret_key, msg, rng)
    }

    fn verify(msg: &[u8], signature: &Signature, pub_key: &PublicKey) -> Result<()> {
        verify(pub_key, msg, signature)
    }
}

#[cfg(test)]
mod tests {
    use std::println as debug;
    // ---
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;
    // ---
    use super::*;

    /// The deterministic key seed 0x01..0x20 used across the scenarios.
    fn scenario_seed() -> Seed {
        let mut seed = [0u8; 32];
        for (i, b) in seed.iter_mut().enumerate() {
            *b = (i + 1) as u8;
        }
        seed
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let msg = b"Chipmunk test message";
        let pair = keygen(&scenario_seed());
        let mut rng = ChaCha20Rng::seed_from_u64(42);

        let signature = sign(&pair.secret, msg, &mut rng).unwrap();
        assert_eq!(signature.to_bytes().len(), SIG_SIGNATURE_SIZE);

        let valid = verify(&pair.public, msg, &signature);
        debug!("verification: {:?}", valid);
        assert!(valid.is_ok(), "The valid signature was rejected!");

        // Same message with one flipped byte must be rejected.
        assert!(
            verify(&pair.public, b"Chipmunk test messagE", &signature).is_err(),
            "A signature over a modified message was accepted!"
        );
    }

    #[test]
    fn test_keygen_is_deterministic_in_seed() {
        let a = keygen(&scenario_seed());
        let b = keygen(&scenario_seed());
        assert_eq!(a.public.to_bytes(), b.public.to_bytes());
        assert_eq!(a.secret.to_bytes(), b.secret.to_bytes());

        let c = keygen(&[0x99; 32]);
        assert_ne!(a.public.to_bytes(), c.public.to_bytes());
        assert_ne!(a.secret.to_bytes(), c.secret.to_bytes());
    }

    #[test]
    fn test_message_tamper_positions_all_reject() {
        let msg = b"Chipmunk test message".to_vec();
        let pair = keygen(&scenario_seed());
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let signature = sign(&pair.secret, &msg, &mut rng).unwrap();

        for pos in [0, msg.len() / 2, msg.len() - 1] {
            let mut tampered = msg.clone();
            tampered[pos] ^= 0x01;
            assert!(
                verify(&pair.public, &tampered, &signature).is_err(),
                "A message tampered at byte {pos} was accepted!"
            );
        }
    }

    #[test]
    fn test_cross_key_verification_rejects() {
        let msg = b"cross key";
        let alice = keygen(&[0xA1; 32]);
        let bob = keygen(&[0xB2; 32]);
        let mut rng = ChaCha20Rng::seed_from_u64(2);

        let signature = sign(&alice.secret, msg, &mut rng).unwrap();
        assert!(verify(&alice.public, msg, &signature).is_ok());
        assert!(
            verify(&bob.public, msg, &signature).is_err(),
            "Alice's signature verified under Bob's key!"
        );
    }

    #[test]
    fn test_bitflipped_signature_rejects() {
        let msg = b"bit flips";
        let pair = keygen(&scenario_seed());
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let signature = sign(&pair.secret, msg, &mut rng).unwrap();
        let bytes = signature.to_bytes();

        // One flip in each region: challenge seed, z, hint bitmap.
        for pos in [0usize, 40, bytes.len() - 1] {
            let mut tampered = bytes.clone();
            tampered[pos] ^= 0x80;
            match Signature::from_bytes(&tampered) {
                Ok(sig) => assert!(
                    verify(&pair.public, msg, &sig).is_err(),
                    "A signature with byte {pos} flipped was accepted!"
                ),
                Err(_) => {}
            }
        }
    }

    #[test]
    fn test_key_and_signature_byte_layouts() {
        let pair = keygen(&scenario_seed());

        let pk_bytes = pair.public.to_bytes();
        assert_eq!(pk_bytes.len(), SIG_PUBLIC_KEY_SIZE);
        let pk_back = PublicKey::from_bytes(&pk_bytes).unwrap();
        assert_eq!(pk_back.to_bytes(), pk_bytes, "pk must round-trip exactly!");

        let sk_bytes = pair.secret.to_bytes();
        assert_eq!(sk_bytes.len(), SIG_PRIVATE_KEY_SIZE);
        let sk_back = PrivateKey::from_bytes(&sk_bytes).unwrap();
        assert_eq!(sk_back.to_bytes(), sk_bytes, "sk must round-trip exactly!");

        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let signature = sign(&pair.secret, b"layout", &mut rng).unwrap();
        let sig_bytes = signature.to_bytes();
        assert_eq!(sig_bytes.len(), SIG_SIGNATURE_SIZE);
        let sig_back = Signature::from_bytes(&sig_bytes).unwrap();
        assert_eq!(sig_back.to_bytes(), sig_bytes);

        // A parsed secret key still signs; a parsed signature still verifies.
        let sig2 = sign(&sk_back, b"layout", &mut rng).unwrap();
        assert!(verify(&pair.public, b"layout", &sig2).is_ok());
        assert!(verify(&pk_back, b"layout", &sig_back).is_ok());
    }

    #[test]
    fn test_scheme_trait_surface() {
        assert!(
            ChipmunkScheme::<ChaCha20Rng>::check_params(),
            "Invalid scheme parameters!"
        );

        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let pair = ChipmunkScheme::<ChaCha20Rng>::gen_key_pair(&mut rng).unwrap();
        let sig = ChipmunkScheme::<ChaCha20Rng>::sign(b"trait", &pair.secret, &mut rng).unwrap();
        assert!(ChipmunkScheme::<ChaCha20Rng>::verify(b"trait", &sig, &pair.public).is_ok());
    }
}
