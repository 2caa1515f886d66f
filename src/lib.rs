//!
//! Chipmunk is a lattice-based signature scheme over the Module-LWE problem,
//! together with its homomorphic one-time signature (HOTS) and the synchronized
//! multi-signature built on top of it.
//!
//! The crate is a layered stack; each layer depends only on the layers below:
//!
//! ```text
//! multisig       aggregation, tree-rooted verification, batch verify
//! hots + tree    one-time sign/verify, HVC hash, membership paths
//! signature      single-signer keygen/sign/verify with hints
//! poly           ring arithmetic, sampling, norm checks
//! ntt            forward/inverse transforms, pointwise multiplication
//! hasher         SHA3-256, SHAKE expansion, domain separation
//! reduce         Barrett/Montgomery reduction, centered representation
//! ```
//!
//! All operations are synchronous and CPU-bound; the only process-wide state
//! is the lazily built NTT tables and the HOTS public parameters, both pure
//! functions of build-time constants.
//!
pub mod common;
pub mod config;
pub mod hasher;
pub mod hots;
pub mod hvc;
pub mod merkle_tree;
pub mod multisig;
pub mod ntt;
pub mod poly;
pub mod reduce;
pub mod signature;
pub mod traits;
pub mod utils;
// ---
pub use common::{ChipmunkError, KeyPair, Result, Seed};
pub use hots::{HotsKeypair, HotsParams, HotsPublicKey, HotsSecretKey, HotsSignature};
pub use hvc::HvcHasher;
pub use merkle_tree::{MerkleTree, Path};
pub use multisig::{BatchEntry, IndividualSignature, MultiSignature};
pub use signature::{ChipmunkScheme, PrivateKey, PublicKey, Signature};
pub use traits::SignatureSchemeTrait;
