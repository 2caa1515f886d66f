//!
//! HOTS (homomorphic one-time signatures), the leaf scheme of the
//! multi-signature tree.
//!
//! Domain discipline: public parameters a_i live in NTT form, secret keys are
//! transformed to NTT form at key generation, public keys (v0, v1) and
//! signatures are held in the time domain. Every crossing is explicit.
//!
//! # Remarks
//! A HOTS secret key must sign at most one message. The core does not track
//! usage; enforcing the one-time rule is the caller's responsibility.
//!

use std::fmt::{Display, Formatter};
// ---
use lazy_static::lazy_static;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;
// ---
use crate::common::{ChipmunkError, KeyPair, Result, Seed};
use crate::config::{
    DOMAIN_HOTS_PARAMS, HOTS_ALPHA_H, HOTS_GAMMA, HOTS_N, HOTS_PARAMS_SEED, HOTS_PHI,
    HOTS_PHI_ALPHA_H,
};
use crate::hasher;
use crate::ntt::HotsRing;
use crate::poly::{NttPoly, TimePoly};
use crate::utils;

pub type HotsPoly = TimePoly<HotsRing>;
pub type HotsNttPoly = NttPoly<HotsRing>;
pub type HotsKeypair = KeyPair<HotsSecretKey, HotsPublicKey>;

/// Serialized public key: v0 and v1 as 24-bit canonical coefficients.
pub const HOTS_PUBLIC_KEY_SIZE: usize = 2 * HOTS_N * 3;
/// Serialized secret key: GAMMA pairs (s0_i, s1_i) in NTT form.
pub const HOTS_SECRET_KEY_SIZE: usize = 2 * HOTS_GAMMA * HOTS_N * 3;
/// Serialized signature: GAMMA response polynomials in the time domain.
pub const HOTS_SIGNATURE_SIZE: usize = HOTS_GAMMA * HOTS_N * 3;

/// The process-wide HOTS public parameters: GAMMA polynomials in NTT form,
/// a pure function of the build-time parameter seed.
pub struct HotsParams {
    a: Vec<HotsNttPoly>,
}

lazy_static! {
    static ref GLOBAL_PARAMS: HotsParams = HotsParams::setup();
}

impl HotsParams {
    /// Expands the parameter polynomials from the fixed seed and transforms
    /// them into NTT form. Deterministic; identical across signer and
    /// verifier.
    pub fn setup() -> Self {
        let seed = hasher::domain_hash(DOMAIN_HOTS_PARAMS, &HOTS_PARAMS_SEED, 0);
        let a = (0..HOTS_GAMMA)
            .map(|i| HotsPoly::uniform(&seed, i as u16).ntt())
            .collect();
        debug!("HOTS public parameters expanded ({} polynomials)", HOTS_GAMMA);
        HotsParams { a }
    }

    /// The lazily initialized process-wide snapshot. Safe to share across
    /// threads once initialized.
    pub fn global() -> &'static Self {
        &GLOBAL_PARAMS
    }

    pub fn a(&self) -> &[HotsNttPoly] {
        &self.a
    }
}

/// HOTS public key (v0, v1), both in the time domain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HotsPublicKey {
    pub v0: HotsPoly,
    pub v1: HotsPoly,
}

/// HOTS secret key: GAMMA pairs (s0_i, s1_i), stored in NTT form. Wiped on
/// drop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HotsSecretKey {
    s0: Vec<HotsNttPoly>,
    s1: Vec<HotsNttPoly>,
}

impl Zeroize for HotsSecretKey {
    fn zeroize(&mut self) {
        for p in self.s0.iter_mut().chain(self.s1.iter_mut()) {
            p.zeroize();
        }
    }
}

impl Drop for HotsSecretKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// HOTS signature: GAMMA response polynomials in the time domain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HotsSignature {
    pub sigma: Vec<HotsPoly>,
}

impl Display for HotsPublicKey {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}",
            utils::shorten(&utils::to_hex(&self.to_bytes()), 16)
        )
    }
}

/// Hashes a message onto the sparse ternary challenge polynomial H(m) with
/// exactly ALPHA_H nonzero ±1 coefficients.
pub fn hash_message(message: &[u8]) -> HotsPoly {
    let seed = hasher::sha3_256(message);
    HotsPoly::rand_ternary(&seed, HOTS_ALPHA_H)
}

/// Generates a HOTS key pair from (master seed, counter).
///
/// The derived seed is SHA3-256(master_seed || counter_le32); the secrets are
/// bounded-uniform with bounds PHI and PHI * ALPHA_H, then kept in NTT form.
/// The public key v0 = sum a_i * s0_i, v1 = sum a_i * s1_i accumulates in the
/// time domain.
pub fn keygen(master_seed: &Seed, counter: u32, params: &HotsParams) -> HotsKeypair {
    let derived =
        zeroize::Zeroizing::new(hasher::sha3_256_parts(&[master_seed, &counter.to_le_bytes()]));

    let mut s0 = Vec::with_capacity(HOTS_GAMMA);
    let mut s1 = Vec::with_capacity(HOTS_GAMMA);
    for i in 0..HOTS_GAMMA {
        s0.push(HotsPoly::bounded(&derived, counter.wrapping_add(i as u32), HOTS_PHI).ntt());
        s1.push(
            HotsPoly::bounded(
                &derived,
                counter.wrapping_add((HOTS_GAMMA + i) as u32),
                HOTS_PHI_ALPHA_H,
            )
            .ntt(),
        );
    }

    let mut v0 = HotsPoly::zero();
    let mut v1 = HotsPoly::zero();
    for i in 0..HOTS_GAMMA {
        v0 = v0.add(&params.a[i].mul_plain(&s0[i]).inv_ntt());
        v1 = v1.add(&params.a[i].mul_plain(&s1[i]).inv_ntt());
    }

    debug!("HOTS keygen done (counter {})", counter);
    KeyPair::new(HotsSecretKey { s0, s1 }, HotsPublicKey { v0, v1 })
}

/// Signs a message: sigma_i = s0_i * H(m) + s1_i, computed in NTT form and
/// stored in the time domain.
pub fn sign(sk: &HotsSecretKey, message: &[u8]) -> HotsSignature {
    let hm = hash_message(message).ntt();

    let sigma = (0..HOTS_GAMMA)
        .map(|i| sk.s0[i].mul_plain(&hm).add(&sk.s1[i]).inv_ntt())
        .collect();
    HotsSignature { sigma }
}

/// Verifies sum a_i * sigma_i == H(m) * v0 + v1 in the NTT domain.
pub fn verify(
    pk: &HotsPublicKey,
    message: &[u8],
    signature: &HotsSignature,
    params: &HotsParams,
) -> Result<()> {
    if signature.sigma.len() != HOTS_GAMMA {
        return Err(ChipmunkError::InvalidArgument(
            "signature must carry GAMMA polynomials",
        ));
    }

    let hm = hash_message(message).ntt();
    let v0 = pk.v0.ntt();
    let v1 = pk.v1.ntt();

    let mut left = HotsNttPoly::zero();
    for i in 0..HOTS_GAMMA {
        left = left.add(&params.a[i].mul_plain(&signature.sigma[i].ntt()));
    }
    let right = hm.mul_plain(&v0).add(&v1);

    if left.eq_mod(&right) {
        Ok(())
    } else {
        debug!("HOTS verification equation mismatch");
        Err(ChipmunkError::VerificationFailed)
    }
}

impl HotsPublicKey {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HOTS_PUBLIC_KEY_SIZE);
        out.extend_from_slice(&self.v0.to_bytes24());
        out.extend_from_slice(&self.v1.to_bytes24());
        out
    }

    pub fn from_bytes(input: &[u8]) -> Result<Self> {
        if input.len() < HOTS_PUBLIC_KEY_SIZE {
            return Err(ChipmunkError::BufferTooSmall {
                need: HOTS_PUBLIC_KEY_SIZE,
                got: input.len(),
            });
        }
        Ok(HotsPublicKey {
            v0: HotsPoly::from_bytes24(&input[..HOTS_N * 3])?,
            v1: HotsPoly::from_bytes24(&input[HOTS_N * 3..])?,
        })
    }
}

impl HotsSecretKey {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HOTS_SECRET_KEY_SIZE);
        for p in self.s0.iter().chain(self.s1.iter()) {
            // NTT-form coefficients are canonical residues already.
            utils::write_u24_coeffs(&mut out, p.coeffs());
        }
        out
    }

    pub fn from_bytes(input: &[u8]) -> Result<Self> {
        if input.len() < HOTS_SECRET_KEY_SIZE {
            return Err(ChipmunkError::BufferTooSmall {
                need: HOTS_SECRET_KEY_SIZE,
                got: input.len(),
            });
        }
        let mut polys = Vec::with_capacity(2 * HOTS_GAMMA);
        for i in 0..2 * HOTS_GAMMA {
            let coeffs = utils::read_u24_coeffs(&input[i * HOTS_N * 3..], HOTS_N);
            polys.push(coeffs);
        }
        let s1 = polys.split_off(HOTS_GAMMA);
        // The stored form IS the NTT form; reinterpret without transforming.
        Ok(HotsSecretKey {
            s0: polys.into_iter().map(HotsNttPoly::from_coeffs).collect(),
            s1: s1.into_iter().map(HotsNttPoly::from_coeffs).collect(),
        })
    }
}

impl HotsSignature {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HOTS_SIGNATURE_SIZE);
        for p in &self.sigma {
            out.extend_from_slice(&p.to_bytes24());
        }
        out
    }

    pub fn from_bytes(input: &[u8]) -> Result<Self> {
        if input.len() < HOTS_SIGNATURE_SIZE {
            return Err(ChipmunkError::BufferTooSmall {
                need: HOTS_SIGNATURE_SIZE,
                got: input.len(),
            });
        }
        let sigma = (0..HOTS_GAMMA)
            .map(|i| HotsPoly::from_bytes24(&input[i * HOTS_N * 3..]))
            .collect::<Result<Vec<_>>>()?;
        Ok(HotsSignature { sigma })
    }
}

#[cfg(test)]
mod tests {
    use std::println as debug;
    // ---
    use super::*;

    const MASTER_SEED: Seed = [0xAA; 32];

    #[test]
    fn test_hots_sign_verify() {
        let msg = b"hots msg";
        let params = HotsParams::global();

        let pair = keygen(&MASTER_SEED, 0, params);
        let signature = sign(&pair.secret, msg);

        let valid = verify(&pair.public, msg, &signature, params);
        debug!("verification result: {:?}", valid);
        assert!(valid.is_ok(), "The valid signature was rejected!");
    }

    #[test]
    fn test_hots_keygen_is_deterministic() {
        let params = HotsParams::global();
        let a = keygen(&MASTER_SEED, 0, params);
        let b = keygen(&MASTER_SEED, 0, params);
        assert_eq!(a.public, b.public, "keygen must be deterministic!");
        assert_eq!(a.secret, b.secret);

        let c = keygen(&MASTER_SEED, 1, params);
        assert_ne!(a.public, c.public, "a new counter must give a new key!");
    }

    #[test]
    fn test_hots_rejects_tampered_coefficient() {
        let msg = b"hots msg";
        let params = HotsParams::global();
        let pair = keygen(&MASTER_SEED, 0, params);
        let mut signature = sign(&pair.secret, msg);

        signature.sigma[0].coeffs_mut()[0] += 1;
        assert!(
            verify(&pair.public, msg, &signature, params).is_err(),
            "The tampered signature was accepted!"
        );
    }

    #[test]
    fn test_hots_rejects_wrong_message() {
        let params = HotsParams::global();
        let pair = keygen(&MASTER_SEED, 0, params);
        let signature = sign(&pair.secret, b"hots msg");
        assert!(
            verify(&pair.public, b"hots msG", &signature, params).is_err(),
            "A signature over a different message was accepted!"
        );
    }

    #[test]
    fn test_hots_key_and_signature_roundtrip() {
        let params = HotsParams::global();
        let pair = keygen(&MASTER_SEED, 7, params);
        let signature = sign(&pair.secret, b"roundtrip");

        let pk_bytes = pair.public.to_bytes();
        assert_eq!(pk_bytes.len(), HOTS_PUBLIC_KEY_SIZE);
        let pk_back = HotsPublicKey::from_bytes(&pk_bytes).unwrap();
        assert_eq!(pk_back.to_bytes(), pk_bytes, "pk must round-trip!");

        let sk_bytes = pair.secret.to_bytes();
        assert_eq!(sk_bytes.len(), HOTS_SECRET_KEY_SIZE);
        let sk_back = HotsSecretKey::from_bytes(&sk_bytes).unwrap();
        assert_eq!(sk_back.to_bytes(), sk_bytes, "sk must round-trip!");

        let sig_bytes = signature.to_bytes();
        assert_eq!(sig_bytes.len(), HOTS_SIGNATURE_SIZE);
        let sig_back = HotsSignature::from_bytes(&sig_bytes).unwrap();
        assert_eq!(sig_back.to_bytes(), sig_bytes, "signature must round-trip!");

        // A deserialized secret key still signs correctly.
        let sig2 = sign(&sk_back, b"roundtrip");
        assert!(verify(&pair.public, b"roundtrip", &sig2, params).is_ok());
    }
}
