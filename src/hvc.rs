//!
//! The HVC hash: the two-to-one compression the Merkle tree is built from,
//! and the projection of HOTS public keys onto tree leaves.
//!
//! Construction: each input polynomial is normalized to [0, q) and
//! bit-decomposed into WIDTH binary polynomials; the digest is the
//! matrix-vector product of those decompositions with a public random matrix
//! of 2 * WIDTH ring elements, computed in the HVC NTT domain.
//!

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
// ---
use crate::config::{DOMAIN_HVC_LEAF, DOMAIN_HVC_MATRIX, HVC_MATRIX_SEED, HVC_N, HVC_Q, HVC_WIDTH};
use crate::hasher;
use crate::hots::HotsPublicKey;
use crate::ntt::HvcRing;
use crate::poly::{NttPoly, TimePoly};

pub type HvcPoly = TimePoly<HvcRing>;
pub type HvcNttPoly = NttPoly<HvcRing>;

/// Serialized HVC polynomial: 24-bit canonical coefficients.
pub const HVC_POLY_SIZE: usize = HVC_N * 3;

/// The tree-level compression function. Holds the public matrix in NTT form;
/// construction is deterministic in the fixed matrix seed, so every signer
/// and verifier agrees on it.
#[derive(Clone)]
pub struct HvcHasher {
    matrix: Vec<HvcNttPoly>,
}

impl Default for HvcHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl HvcHasher {
    pub fn new() -> Self {
        let seed = hasher::domain_hash(DOMAIN_HVC_MATRIX, &HVC_MATRIX_SEED, 0);
        let matrix = (0..2 * HVC_WIDTH)
            .map(|j| HvcPoly::uniform(&seed, j as u16).ntt())
            .collect();
        debug!("HVC hasher matrix expanded ({} polynomials)", 2 * HVC_WIDTH);
        HvcHasher { matrix }
    }

    /// Compresses (left, right) into one HVC polynomial, normalized to
    /// [0, q).
    pub fn hash_pair(&self, left: &HvcPoly, right: &HvcPoly) -> HvcPoly {
        let mut acc = HvcNttPoly::zero();
        for (j, bits) in decompose(left).into_iter().enumerate() {
            acc = acc.add(&self.matrix[j].mul_pointwise(&bits));
        }
        for (j, bits) in decompose(right).into_iter().enumerate() {
            acc = acc.add(&self.matrix[HVC_WIDTH + j].mul_pointwise(&bits));
        }
        acc.inv_ntt().canonical()
    }
}

/// Bit-decomposes a canonical-form polynomial into WIDTH binary polynomials
/// in NTT form, so that sum 2^j * bits_j reconstructs the input.
fn decompose(p: &HvcPoly) -> Vec<HvcNttPoly> {
    let canonical = p.canonical();
    (0..HVC_WIDTH)
        .map(|j| {
            let bits = canonical.coeffs().iter().map(|&c| (c >> j) & 1).collect();
            HvcPoly::from_coeffs(bits).ntt()
        })
        .collect()
}

/// Projects a HOTS public key onto its HVC tree leaf: a domain-separated XOF
/// over the key bytes, sampled into the HVC ring and kept canonical.
pub fn project_public_key(pk: &HotsPublicKey) -> HvcPoly {
    let mut buf = vec![0u8; HVC_N * 3];
    hasher::domain_xof(DOMAIN_HVC_LEAF, &pk.to_bytes(), 0, &mut buf);

    let coeffs = buf
        .chunks_exact(3)
        .map(|b| {
            let t = (b[0] as u32) | ((b[1] as u32) << 8) | ((b[2] as u32) << 16);
            ((t & 0x7f_ffff) % HVC_Q as u32) as i32
        })
        .collect();
    HvcPoly::from_coeffs(coeffs)
}

/// A leaf slot with no signer behind it.
pub fn empty_leaf() -> HvcPoly {
    HvcPoly::zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hots::{self, HotsParams};
    use crate::reduce::lift;

    #[test]
    fn test_decomposition_reconstructs_input() {
        let seed = [0x42; 32];
        let p = HvcPoly::uniform(&seed, 0).canonical();

        let bits = decompose(&p);
        let mut acc = vec![0i64; HVC_N];
        for (j, b) in bits.iter().enumerate() {
            let time = b.inv_ntt();
            for (i, &c) in time.coeffs().iter().enumerate() {
                acc[i] += (lift(c, HVC_Q) as i64) << j;
            }
        }
        for (i, &c) in p.coeffs().iter().enumerate() {
            assert_eq!(
                lift((acc[i] % HVC_Q as i64) as i32, HVC_Q),
                c,
                "bit decomposition must reconstruct the input!"
            );
        }
    }

    #[test]
    fn test_hash_pair_is_deterministic_and_binding() {
        let hasher = HvcHasher::new();
        let a = HvcPoly::uniform(&[1u8; 32], 0).canonical();
        let b = HvcPoly::uniform(&[2u8; 32], 0).canonical();

        let h1 = hasher.hash_pair(&a, &b);
        let h2 = hasher.hash_pair(&a, &b);
        assert_eq!(h1, h2, "HVC hash must be deterministic!");

        let swapped = hasher.hash_pair(&b, &a);
        assert_ne!(h1, swapped, "HVC hash must distinguish child order!");

        assert!(
            h1.coeffs().iter().all(|&c| (0..HVC_Q).contains(&c)),
            "digest coefficients must stay canonical"
        );
    }

    #[test]
    fn test_projection_distinguishes_keys() {
        let params = HotsParams::global();
        let k1 = hots::keygen(&[0x11; 32], 0, params);
        let k2 = hots::keygen(&[0x22; 32], 0, params);

        let p1 = project_public_key(&k1.public);
        let p2 = project_public_key(&k2.public);
        assert_eq!(p1, project_public_key(&k1.public));
        assert_ne!(p1, p2, "distinct keys must project to distinct leaves!");
    }
}
