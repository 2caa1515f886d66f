//!
//! The Merkle tree over HVC polynomials that roots a signer set: leaves are
//! HVC projections of HOTS public keys, inner nodes are HVC-hash compressions
//! of their children.
//!
//! Storage is one level-order array: root at index 0, layer l starting at
//! 2^l - 1. All buffers belong to the tree and are freed with it.
//!

use std::fmt::{Display, Formatter};
// ---
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};
// ---
use crate::common::{ChipmunkError, Result};
use crate::config::{TREE_HEIGHT_MAX, TREE_HEIGHT_MIN};
use crate::hvc::{HvcHasher, HvcPoly};
use crate::utils;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerkleTree {
    data: Vec<HvcPoly>,
    leaf_count: usize,
    height: u32,
}

/// Authentication path: the (left, right) child pairs on the way from a leaf
/// to the root, bottom-up, plus the leaf index they prove.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    nodes: Vec<(HvcPoly, HvcPoly)>,
    pub index: usize,
}

impl MerkleTree {
    /// Builds the tree bottom-up over the given leaves. The leaf count must
    /// be a power of two matching a height in [5, 16].
    pub fn from_leaves(leaves: Vec<HvcPoly>, hasher: &HvcHasher) -> Result<Self> {
        let t = leaves.len();
        if t == 0 || t & (t - 1) != 0 {
            return Err(ChipmunkError::InvalidArgument(
                "leaf count must be a power of two",
            ));
        }
        let height = t.trailing_zeros() + 1;
        if !(TREE_HEIGHT_MIN..=TREE_HEIGHT_MAX).contains(&height) {
            return Err(ChipmunkError::InvalidArgument(
                "tree height out of the supported range",
            ));
        }

        let size = 2 * t - 1;
        let mut data = vec![HvcPoly::zero(); size];

        let base = t - 1;
        for (i, leaf) in leaves.into_iter().enumerate() {
            data[base + i] = leaf.canonical();
        }

        for l in (0..height - 1).rev() {
            let num_idxs = 1usize << l;
            let base_prev = (1usize << (l + 1)) - 1;
            let base = (1usize << l) - 1;
            for i in 0..num_idxs {
                data[base + i] =
                    hasher.hash_pair(&data[base_prev + 2 * i], &data[base_prev + 2 * i + 1]);
            }
        }

        debug!("built Merkle tree: height {}, {} leaves", height, t);
        Ok(MerkleTree {
            data,
            leaf_count: t,
            height,
        })
    }

    pub fn get(&self, layer: u32, idx: usize) -> &HvcPoly {
        &self.data[(1usize << layer) - 1 + idx]
    }

    pub fn root(&self) -> &HvcPoly {
        self.get(0, 0)
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Produces the authentication path for `leaf_idx`: one (left, right)
    /// child pair per level between the leaf and the root.
    pub fn gen_proof(&self, leaf_idx: usize) -> Result<Path> {
        if leaf_idx >= self.leaf_count {
            return Err(ChipmunkError::InvalidArgument("leaf index out of range"));
        }

        let mut nodes = Vec::with_capacity((self.height - 1) as usize);
        let mut i = leaf_idx;
        for layer in (1..self.height).rev() {
            let left = i & !1;
            nodes.push((self.get(layer, left).clone(), self.get(layer, left + 1).clone()));
            i >>= 1;
        }
        Ok(Path {
            nodes,
            index: leaf_idx,
        })
    }
}

impl Path {
    /// Number of tree levels this path spans (height - 1 pairs).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Recomputes the root from the path pairs, bit by bit of the leaf index,
    /// and compares with `expected_root`. Also checks that `leaf` sits on the
    /// correct side of the bottom pair.
    pub fn verify(&self, leaf: &HvcPoly, expected_root: &HvcPoly, hasher: &HvcHasher) -> bool {
        if self.nodes.is_empty() {
            return false;
        }

        let mut idx = self.index;
        let bottom = &self.nodes[0];
        let own = if idx & 1 == 0 { &bottom.0 } else { &bottom.1 };
        if !own.eq_mod(leaf) {
            debug!("path leaf does not match the claimed projection");
            return false;
        }

        let mut current = hasher.hash_pair(&bottom.0, &bottom.1);
        idx >>= 1;

        for pair in &self.nodes[1..] {
            let side = if idx & 1 == 0 { &pair.0 } else { &pair.1 };
            if !side.eq_mod(&current) {
                debug!("path level does not chain to its parent");
                return false;
            }
            current = hasher.hash_pair(&pair.0, &pair.1);
            idx >>= 1;
        }

        current.eq_mod(expected_root)
    }
}

impl Display for MerkleTree {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        writeln!(
            f,
            r#"
--- MerkleTree ---
t:      {}
height: {}
size:   {}
"#,
            self.leaf_count,
            self.height,
            self.data.len()
        )?;

        for l in 0..self.height {
            let num_idxs = 1usize << l;
            for i in 0..num_idxs {
                let bytes = self.get(l, i).to_bytes24();
                write!(f, "{}..\t", utils::to_hex(&bytes[..2]))?;
            }
            writeln!(f)?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use std::println as debug;
    // ---
    use super::*;

    fn test_leaves(count: usize) -> Vec<HvcPoly> {
        (0..count)
            .map(|i| {
                let mut seed = [0u8; 32];
                seed[0] = i as u8;
                seed[1] = (i >> 8) as u8;
                HvcPoly::uniform(&seed, 0).canonical()
            })
            .collect()
    }

    #[test]
    fn test_tree_rejects_bad_leaf_counts() {
        let hasher = HvcHasher::new();
        assert!(MerkleTree::from_leaves(test_leaves(12), &hasher).is_err());
        assert!(MerkleTree::from_leaves(test_leaves(8), &hasher).is_err());
        assert!(MerkleTree::from_leaves(vec![], &hasher).is_err());
        assert!(MerkleTree::from_leaves(test_leaves(16), &hasher).is_ok());
    }

    #[test]
    fn test_every_leaf_proves_membership() {
        let hasher = HvcHasher::new();
        let leaves = test_leaves(16);
        let tree = MerkleTree::from_leaves(leaves.clone(), &hasher).unwrap();
        debug!("{}", tree);

        for (i, leaf) in leaves.iter().enumerate() {
            let path = tree.gen_proof(i).unwrap();
            assert_eq!(path.len(), (tree.height() - 1) as usize);
            assert!(
                path.verify(leaf, tree.root(), &hasher),
                "The valid path for leaf {i} was rejected!"
            );
        }
    }

    #[test]
    fn test_path_rejects_wrong_root_and_leaf() {
        let hasher = HvcHasher::new();
        let leaves = test_leaves(16);
        let tree = MerkleTree::from_leaves(leaves.clone(), &hasher).unwrap();

        let path = tree.gen_proof(3).unwrap();
        assert!(!path.verify(&leaves[4], tree.root(), &hasher));
        assert!(!path.verify(&leaves[3], &leaves[0], &hasher));
    }

    #[test]
    fn test_path_rejects_any_tampered_node() {
        let hasher = HvcHasher::new();
        let leaves = test_leaves(16);
        let tree = MerkleTree::from_leaves(leaves.clone(), &hasher).unwrap();

        for level in 0..(tree.height() - 1) as usize {
            for side in 0..2 {
                let mut path = tree.gen_proof(5).unwrap();
                let node = if side == 0 {
                    &mut path.nodes[level].0
                } else {
                    &mut path.nodes[level].1
                };
                node.coeffs_mut()[7] += 1;
                assert!(
                    !path.verify(&leaves[5], tree.root(), &hasher),
                    "A path tampered at level {level} side {side} was accepted!"
                );
            }
        }
    }

    #[test]
    fn test_larger_tree_heights() {
        let hasher = HvcHasher::new();
        let leaves = test_leaves(64);
        let tree = MerkleTree::from_leaves(leaves.clone(), &hasher).unwrap();
        assert_eq!(tree.height(), 7);
        assert_eq!(tree.leaf_count(), 64);

        let path = tree.gen_proof(63).unwrap();
        assert!(path.verify(&leaves[63], tree.root(), &hasher));
    }
}
