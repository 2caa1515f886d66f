//!
//! The multi-signature protocol: deterministic randomizers over the signer
//! set, homomorphic aggregation of HOTS signatures, tree-rooted verification
//! and batch verification.
//!
//! The verifier computes the full aggregated HOTS predicate
//! `sum_i a_i * sigma_bar_i == sum_j r_j * (H(m) * v0_j + v1_j)` in the NTT
//! ring; membership of every signer below the recorded tree root is checked
//! through the authentication paths.
//!

use bitreader::BitReader;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
// ---
use crate::common::{ChipmunkError, Result};
use crate::config::{DOMAIN_RANDOMIZER, HOTS_GAMMA, HOTS_N};
use crate::hasher;
use crate::hots::{self, HotsNttPoly, HotsParams, HotsPoly, HotsPublicKey, HotsSecretKey,
    HotsSignature};
use crate::hvc::{self, HvcHasher, HvcPoly};
use crate::merkle_tree::{MerkleTree, Path};
use crate::reduce::reduce64;

/// One signer's contribution before aggregation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndividualSignature {
    pub hots_signature: HotsSignature,
    pub hots_pk: HotsPublicKey,
    pub path: Path,
    pub leaf_index: u32,
}

/// The aggregated multi-signature. The aggregate stays GAMMA polynomials no
/// matter how many signers contributed; the per-signer arrays all share
/// `signer_count` entries and are freed together with the structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiSignature {
    pub aggregate: Vec<HotsPoly>,
    pub tree_root: HvcPoly,
    pub pk_projections: Vec<HvcPoly>,
    pub paths: Vec<Path>,
    pub leaf_indices: Vec<u32>,
    pub message_hash: [u8; 32],
}

/// One entry of a batch-verification call.
pub struct BatchEntry<'a> {
    pub signature: &'a MultiSignature,
    pub message: &'a [u8],
    pub public_keys: &'a [HotsPublicKey],
}

impl MultiSignature {
    pub fn signer_count(&self) -> usize {
        self.pk_projections.len()
    }

    /// Serializes through bincode; the per-signer arrays are length-prefixed
    /// and the whole structure round-trips losslessly.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|_| ChipmunkError::InternalInvariantViolation("multi-signature encoding"))
    }

    pub fn from_bytes(input: &[u8]) -> Result<Self> {
        bincode::deserialize(input)
            .map_err(|_| ChipmunkError::InvalidArgument("malformed multi-signature encoding"))
    }
}

// ***************************************
//             RANDOMIZERS
// ***************************************

/// Derives the per-signer ternary randomizers from the ordered leaf
/// projections: a domain-separated XOF over their concatenation, consumed two
/// bits at a time (00 -> 0, 01 -> +1, 10 -> -1, 11 -> 0).
pub fn derive_randomizers(projections: &[HvcPoly]) -> Vec<HotsPoly> {
    let mut payload = Vec::with_capacity(projections.len() * HOTS_N * 3);
    for p in projections {
        payload.extend_from_slice(&p.to_bytes24());
    }

    let mut randomizers = Vec::with_capacity(projections.len());
    for i in 0..projections.len() {
        let mut stream = vec![0u8; HOTS_N / 4];
        hasher::domain_xof(DOMAIN_RANDOMIZER, &payload, i as u32, &mut stream);

        let mut reader = BitReader::new(&stream);
        let coeffs = (0..HOTS_N)
            .map(|_| match reader.read_u8(2).expect("stream length is N/4 bytes") {
                0b01 => 1,
                0b10 => -1,
                _ => 0,
            })
            .collect();
        randomizers.push(HotsPoly::from_coeffs(coeffs));
    }
    randomizers
}

/// Randomizes one HOTS signature: every component is multiplied by the
/// ternary polynomial in the ring, via shift-adds only.
pub fn randomize(signature: &HotsSignature, randomizer: &HotsPoly) -> Vec<HotsPoly> {
    signature
        .sigma
        .iter()
        .map(|s| s.mul_ternary(randomizer))
        .collect()
}

/// Aggregates randomized signatures: a coefficient-wise modular sum with
/// centered reduction, GAMMA polynomials regardless of the signer count.
pub fn aggregate_signatures(
    signatures: &[&HotsSignature],
    randomizers: &[HotsPoly],
) -> Result<Vec<HotsPoly>> {
    if signatures.len() != randomizers.len() || signatures.is_empty() {
        return Err(ChipmunkError::InvalidArgument(
            "signature and randomizer counts must match and be nonzero",
        ));
    }

    let mut acc = vec![HotsPoly::zero(); HOTS_GAMMA];
    for (sig, r) in signatures.iter().zip(randomizers) {
        for (a, s) in acc.iter_mut().zip(randomize(sig, r)) {
            *a = a.add(&s);
        }
    }
    Ok(acc)
}

// ***************************************
//             PROTOCOL
// ***************************************

/// Produces one signer's contribution: a HOTS signature over the message plus
/// the membership proof of the signer's leaf.
pub fn create_individual(
    message: &[u8],
    hots_sk: &HotsSecretKey,
    hots_pk: &HotsPublicKey,
    tree: &MerkleTree,
    leaf_index: u32,
) -> Result<IndividualSignature> {
    let path = tree.gen_proof(leaf_index as usize)?;
    Ok(IndividualSignature {
        hots_signature: hots::sign(hots_sk, message),
        hots_pk: hots_pk.clone(),
        path,
        leaf_index,
    })
}

/// Aggregates the individual signatures over a common tree into one
/// multi-signature.
pub fn aggregate(
    individuals: &[IndividualSignature],
    message: &[u8],
    tree: &MerkleTree,
) -> Result<MultiSignature> {
    if individuals.is_empty() {
        return Err(ChipmunkError::InvalidArgument("empty signer set"));
    }
    for ind in individuals {
        if ind.leaf_index as usize >= tree.leaf_count() || ind.path.index != ind.leaf_index as usize
        {
            return Err(ChipmunkError::InvalidArgument(
                "leaf index outside the signer tree",
            ));
        }
    }

    let projections: Vec<HvcPoly> = individuals
        .iter()
        .map(|ind| hvc::project_public_key(&ind.hots_pk))
        .collect();
    let randomizers = derive_randomizers(&projections);

    let signatures: Vec<&HotsSignature> =
        individuals.iter().map(|ind| &ind.hots_signature).collect();
    let aggregate = aggregate_signatures(&signatures, &randomizers)?;

    info!("aggregated {} signer(s)", individuals.len());
    Ok(MultiSignature {
        aggregate,
        tree_root: tree.root().clone(),
        pk_projections: projections,
        paths: individuals.iter().map(|ind| ind.path.clone()).collect(),
        leaf_indices: individuals.iter().map(|ind| ind.leaf_index).collect(),
        message_hash: hasher::sha3_256(message),
    })
}

/// The aggregated HOTS test equation, both sides in the NTT ring. Returns
/// (lhs, rhs).
fn aggregated_equation(
    signature: &MultiSignature,
    message: &[u8],
    public_keys: &[HotsPublicKey],
    params: &HotsParams,
) -> (HotsNttPoly, HotsNttPoly) {
    let hm = hots::hash_message(message).ntt();
    let randomizers = derive_randomizers(&signature.pk_projections);

    let mut lhs = HotsNttPoly::zero();
    for (a_i, sigma_i) in params.a().iter().zip(&signature.aggregate) {
        lhs = lhs.add(&a_i.mul_plain(&sigma_i.ntt()));
    }

    let mut rhs = HotsNttPoly::zero();
    for (pk, r) in public_keys.iter().zip(&randomizers) {
        let keyed = hm.mul_plain(&pk.v0.ntt()).add(&pk.v1.ntt());
        rhs = rhs.add(&keyed.mul_plain(&r.ntt()));
    }
    (lhs, rhs)
}

/// Checks the structural parts of a multi-signature: message hash, projection
/// consistency and every signer's membership path.
fn check_structure(
    signature: &MultiSignature,
    message: &[u8],
    public_keys: &[HotsPublicKey],
    hasher: &HvcHasher,
) -> Result<()> {
    let k = signature.signer_count();
    if k == 0
        || public_keys.len() != k
        || signature.paths.len() != k
        || signature.leaf_indices.len() != k
        || signature.aggregate.len() != HOTS_GAMMA
    {
        return Err(ChipmunkError::InvalidArgument(
            "multi-signature arrays disagree on the signer count",
        ));
    }

    if hasher::sha3_256(message) != signature.message_hash {
        debug!("multi-sig: message hash mismatch");
        return Err(ChipmunkError::VerificationFailed);
    }

    for i in 0..k {
        let projection = hvc::project_public_key(&public_keys[i]);
        if !projection.eq_mod(&signature.pk_projections[i]) {
            debug!("multi-sig: signer {i} projection mismatch");
            return Err(ChipmunkError::VerificationFailed);
        }
        if signature.paths[i].index != signature.leaf_indices[i] as usize
            || !signature.paths[i].verify(&projection, &signature.tree_root, hasher)
        {
            debug!("multi-sig: signer {i} membership path rejected");
            return Err(ChipmunkError::VerificationFailed);
        }
    }
    Ok(())
}

/// Verifies a multi-signature against the signers' public keys.
pub fn verify(
    signature: &MultiSignature,
    message: &[u8],
    public_keys: &[HotsPublicKey],
    params: &HotsParams,
    hasher: &HvcHasher,
) -> Result<()> {
    check_structure(signature, message, public_keys, hasher)?;

    let (lhs, rhs) = aggregated_equation(signature, message, public_keys, params);
    if lhs.eq_mod(&rhs) {
        Ok(())
    } else {
        debug!("multi-sig: aggregated equation mismatch");
        Err(ChipmunkError::VerificationFailed)
    }
}

/// Batch verification: the structural checks run per signature, the test
/// equations are folded into one comparison under fresh random scalar
/// weights.
pub fn batch_verify(
    entries: &[BatchEntry],
    params: &HotsParams,
    hasher: &HvcHasher,
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<()> {
    if entries.is_empty() {
        return Err(ChipmunkError::InvalidArgument("empty batch"));
    }

    let q = crate::config::HOTS_Q;
    let mut acc = vec![0i64; HOTS_N];
    for entry in entries {
        check_structure(entry.signature, entry.message, entry.public_keys, hasher)?;

        let (lhs, rhs) = aggregated_equation(entry.signature, entry.message, entry.public_keys, params);
        let diff = lhs.sub(&rhs);

        let alpha = (rng.next_u32() % (q as u32 - 1)) as i64 + 1;
        for (a, &d) in acc.iter_mut().zip(diff.coeffs()) {
            *a = (*a + reduce64(d as i64 * alpha, q) as i64) % q as i64;
        }
    }

    if acc.iter().all(|&a| a % q as i64 == 0) {
        Ok(())
    } else {
        debug!("batch verification: folded equation mismatch");
        Err(ChipmunkError::VerificationFailed)
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
    use crate::common::KeyPair;

    struct SignerSet {
        pairs: Vec<KeyPair<HotsSecretKey, HotsPublicKey>>,
        tree: MerkleTree,
        hasher: HvcHasher,
    }

    fn build_signer_set(master_seeds: &[[u8; 32]]) -> SignerSet {
        let params = HotsParams::global();
        let hasher = HvcHasher::new();

        let pairs: Vec<_> = master_seeds
            .iter()
            .map(|seed| hots::keygen(seed, 0, params))
            .collect();

        let leaf_count = std::cmp::max(16, master_seeds.len().next_power_of_two());
        let mut leaves: Vec<HvcPoly> = pairs
            .iter()
            .map(|p| hvc::project_public_key(&p.public))
            .collect();
        leaves.resize(leaf_count, hvc::empty_leaf());

        let tree = MerkleTree::from_leaves(leaves, &hasher).unwrap();
        SignerSet {
            pairs,
            tree,
            hasher,
        }
    }

    fn sign_and_aggregate(set: &SignerSet, message: &[u8]) -> MultiSignature {
        let individuals: Vec<_> = set
            .pairs
            .iter()
            .enumerate()
            .map(|(i, pair)| {
                create_individual(message, &pair.secret, &pair.public, &set.tree, i as u32)
                    .unwrap()
            })
            .collect();
        aggregate(&individuals, message, &set.tree).unwrap()
    }

    fn public_keys(set: &SignerSet) -> Vec<HotsPublicKey> {
        set.pairs.iter().map(|p| p.public.clone()).collect()
    }

    #[test]
    fn test_three_signer_aggregate_verifies() {
        let set = build_signer_set(&[[0x11; 32], [0x22; 32], [0x33; 32]]);
        let message = b"Multi-party contract agreement";
        let ms = sign_and_aggregate(&set, message);
        assert_eq!(set.tree.height(), 5);

        let params = HotsParams::global();
        let valid = verify(&ms, message, &public_keys(&set), params, &set.hasher);
        debug!("multi-sig verification: {:?}", valid);
        assert!(valid.is_ok(), "The valid multi-signature was rejected!");

        assert!(
            verify(
                &ms,
                b"Multi-party contract agreemenT",
                &public_keys(&set),
                params,
                &set.hasher,
            )
            .is_err(),
            "A multi-signature over a modified message was accepted!"
        );
    }

    #[test]
    fn test_tampered_path_rejects() {
        let set = build_signer_set(&[[0x11; 32], [0x22; 32], [0x33; 32]]);
        let message = b"Multi-party contract agreement";
        let ms = sign_and_aggregate(&set, message);
        let params = HotsParams::global();

        // Flip one byte inside each signer's serialized path in turn. The
        // offset skips the length prefixes and lands in coefficient data.
        for signer in 0..ms.signer_count() {
            let whole = ms.to_bytes().unwrap();
            let path_bytes = bincode::serialize(&ms.paths[signer]).unwrap();
            let at = find_subslice(&whole, &path_bytes).unwrap() + 32;
            let mut bytes = whole.clone();
            bytes[at] ^= 0x01;

            match MultiSignature::from_bytes(&bytes) {
                Ok(tampered) => assert!(
                    verify(&tampered, message, &public_keys(&set), params, &set.hasher).is_err(),
                    "A multi-signature with signer {signer}'s path tampered was accepted!"
                ),
                Err(_) => {}
            }
        }
    }

    fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    #[test]
    fn test_tampered_aggregate_rejects() {
        let set = build_signer_set(&[[0x44; 32], [0x55; 32], [0x66; 32]]);
        let message = b"tamper the aggregate";
        let mut ms = sign_and_aggregate(&set, message);
        let params = HotsParams::global();

        ms.aggregate[1].coeffs_mut()[100] += 1;
        assert!(
            verify(&ms, message, &public_keys(&set), params, &set.hasher).is_err(),
            "A multi-signature with a tampered aggregate was accepted!"
        );
    }

    #[test]
    fn test_randomizers_are_deterministic() {
        let set = build_signer_set(&[[0x11; 32], [0x22; 32], [0x33; 32]]);
        let message = b"determinism";

        let a = sign_and_aggregate(&set, message);
        let b = sign_and_aggregate(&set, message);
        assert_eq!(
            a.to_bytes().unwrap(),
            b.to_bytes().unwrap(),
            "the same ordered signer set must aggregate bit-identically!"
        );

        let r1 = derive_randomizers(&a.pk_projections);
        let r2 = derive_randomizers(&b.pk_projections);
        assert_eq!(r1, r2);
        assert!(r1
            .iter()
            .all(|r| r.coeffs().iter().all(|&c| (-1..=1).contains(&c))));
    }

    #[test]
    fn test_mid_sized_signer_sets_verify() {
        let params = HotsParams::global();
        for k in [5u8, 10] {
            let seeds: Vec<[u8; 32]> = (0..k).map(|i| [i.wrapping_add(0x70); 32]).collect();
            let set = build_signer_set(&seeds);
            let message = b"mid-sized cohort";
            let ms = sign_and_aggregate(&set, message);
            assert!(
                verify(&ms, message, &public_keys(&set), params, &set.hasher).is_ok(),
                "A valid {k}-signer multi-signature was rejected!"
            );
        }
    }

    #[test]
    fn test_fifty_signers_scale() {
        let seeds: Vec<[u8; 32]> = (0..50u8).map(|i| [i.wrapping_add(1); 32]).collect();
        let set = build_signer_set(&seeds);
        let message = b"large cohort";
        let ms = sign_and_aggregate(&set, message);
        let params = HotsParams::global();

        assert!(verify(&ms, message, &public_keys(&set), params, &set.hasher).is_ok());

        // The aggregate itself stays GAMMA polynomials, independent of k.
        assert_eq!(ms.aggregate.len(), HOTS_GAMMA);
        let small = sign_and_aggregate(
            &build_signer_set(&[[0xE1; 32], [0xE2; 32], [0xE3; 32]]),
            message,
        );
        assert_eq!(
            bincode::serialize(&ms.aggregate).unwrap().len(),
            bincode::serialize(&small.aggregate).unwrap().len(),
            "the aggregated HOTS size must not grow with the signer count!"
        );

        // Per-signer path data is present and individually valid.
        assert_eq!(ms.paths.len(), 50);
        for (i, path) in ms.paths.iter().enumerate() {
            assert!(path.verify(&ms.pk_projections[i], &ms.tree_root, &set.hasher));
        }
    }

    #[test]
    fn test_batch_verify_accepts_and_catches_swaps() {
        let params = HotsParams::global();
        let hasher = HvcHasher::new();

        let mut sets = vec![];
        let mut messages = vec![];
        for t in 0..10u8 {
            sets.push(build_signer_set(&[
                [t.wrapping_mul(3).wrapping_add(1); 32],
                [t.wrapping_mul(3).wrapping_add(2); 32],
            ]));
            messages.push(format!("batch message {t}").into_bytes());
        }
        let signatures: Vec<MultiSignature> = sets
            .iter()
            .zip(&messages)
            .map(|(set, msg)| sign_and_aggregate(set, msg))
            .collect();
        let keys: Vec<Vec<HotsPublicKey>> = sets.iter().map(public_keys).collect();

        let entries: Vec<BatchEntry> = (0..10)
            .map(|i| BatchEntry {
                signature: &signatures[i],
                message: &messages[i],
                public_keys: &keys[i],
            })
            .collect();

        let mut rng = ChaCha20Rng::seed_from_u64(7);
        assert!(
            batch_verify(&entries, params, &hasher, &mut rng).is_ok(),
            "A batch of valid multi-signatures was rejected!"
        );

        // Swap in a different signer set's signature over the same message.
        let foreign_set = build_signer_set(&[[0xC1; 32], [0xC2; 32]]);
        let foreign = sign_and_aggregate(&foreign_set, &messages[4]);
        let mut swapped_entries: Vec<BatchEntry> = (0..10)
            .map(|i| BatchEntry {
                signature: &signatures[i],
                message: &messages[i],
                public_keys: &keys[i],
            })
            .collect();
        swapped_entries[4] = BatchEntry {
            signature: &foreign,
            message: &messages[4],
            public_keys: &keys[4],
        };
        assert!(
            batch_verify(&swapped_entries, params, &hasher, &mut rng).is_err(),
            "A batch with a swapped signature was accepted!"
        );
    }
}
