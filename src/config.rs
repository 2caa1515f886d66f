//!
//! Static parameters of the scheme: the three polynomial rings, the signature
//! bounds, and the domain-separation registry.
//!
//! Two parameter regimes coexist and must never be mixed inside one operation:
//! the lattice-signature ring (N = 256) and the HOTS ring (N = 512). The tree
//! layer runs in its own smaller HVC ring. Each subsystem is pinned to exactly
//! one ring by the type parameters in [`crate::poly`].
//!

// ***************************************
//             SIGNATURE RING
// ***************************************

/// Ring dimension of the single-signer lattice signature.
pub const SIG_N: usize = 256;
/// Modulus of the single-signer ring.
pub const SIG_Q: i32 = 8_380_417;
/// Primitive 2N-th root of unity mod [`SIG_Q`].
pub const SIG_OMEGA: i32 = 1753;
/// N^-1 mod q, applied by the inverse transform.
pub const SIG_N_INV: i32 = 8_347_681;

/// Weight (nonzero ±1 count) of the single-signer challenge polynomial.
pub const SIG_TAU: usize = 39;
/// Rejection bound for the response polynomial z.
pub const SIG_GAMMA1: i32 = 1 << 17;
/// Coefficient bound of the secret polynomials s1 and s2.
pub const SIG_ETA: i32 = 2;
/// Dropped-bits parameter of the high/low decomposition.
pub const SIG_D: u32 = 13;
/// Maximum number of set hint bits an honest signature may carry.
pub const SIG_HINT_WEIGHT: usize = 64;

/// Serialized public key: N 24-bit coefficients plus the 32-byte rho seed.
pub const SIG_PUBLIC_KEY_SIZE: usize = SIG_N * 3 + 32;
/// Serialized private key: s1, s2, key seed, 48-byte commitment, embedded pk.
pub const SIG_PRIVATE_KEY_SIZE: usize = SIG_N * 6 + 32 + 48 + SIG_PUBLIC_KEY_SIZE;
/// Serialized signature: challenge seed, z as signed 32-bit, hint bitmap.
pub const SIG_SIGNATURE_SIZE: usize = 32 + SIG_N * 4 + SIG_N / 8;

// ***************************************
//             HOTS RING
// ***************************************

/// Ring dimension of the HOTS scheme.
pub const HOTS_N: usize = 512;
/// Modulus of the HOTS ring.
pub const HOTS_Q: i32 = 3_168_257;
/// Primitive 2N-th root of unity mod [`HOTS_Q`].
pub const HOTS_OMEGA: i32 = 22_312;
/// N^-1 mod q for the HOTS ring.
pub const HOTS_N_INV: i32 = 3_162_069;

/// Number of polynomial pairs per HOTS key.
pub const HOTS_GAMMA: usize = 4;
/// Coefficient bound of the primary secrets s0_i.
pub const HOTS_PHI: i32 = 12;
/// Weight of the message-derived ternary challenge H(m).
pub const HOTS_ALPHA_H: usize = 37;
/// Coefficient bound of the secondary secrets s1_i.
pub const HOTS_PHI_ALPHA_H: i32 = HOTS_PHI * HOTS_ALPHA_H as i32;

// ***************************************
//             HVC RING
// ***************************************

/// Ring dimension of the HVC tree hash (shares N with the HOTS ring).
pub const HVC_N: usize = 512;
/// Modulus of the HVC ring.
pub const HVC_Q: i32 = 202_753;
/// Primitive 2N-th root of unity mod [`HVC_Q`].
pub const HVC_OMEGA: i32 = 63_850;
/// N^-1 mod q for the HVC ring.
pub const HVC_N_INV: i32 = 202_357;

/// Bit width of the HVC input decomposition (ceil(log2 q)).
pub const HVC_WIDTH: usize = 18;

// ***************************************
//             TREE
// ***************************************

/// Smallest supported tree height (16 leaves).
pub const TREE_HEIGHT_MIN: u32 = 5;
/// Largest supported tree height (32,768 leaves).
pub const TREE_HEIGHT_MAX: u32 = 16;

// ***************************************
//        DOMAIN-SEPARATION REGISTRY
// ***************************************
// Every domain-separated hash in the crate draws its prefix from here. The
// strings are length-prefixed by the hasher, so no two entries can alias.

/// Derives the single-signer secret seed from the caller's key seed.
pub const DOMAIN_SIG_KEY: &str = "chipmunk-single-signer-key";
/// Derives the single-signer matrix seed rho from the caller's key seed.
pub const DOMAIN_SIG_MATRIX: &str = "chipmunk-single-signer-matrix";
/// Seeds the global HOTS public parameters a_1..a_GAMMA.
pub const DOMAIN_HOTS_PARAMS: &str = "chipmunk-hots-params";
/// Seeds the HVC hasher's public matrix.
pub const DOMAIN_HVC_MATRIX: &str = "chipmunk-hvc-matrix";
/// Projects a HOTS public key onto an HVC tree leaf.
pub const DOMAIN_HVC_LEAF: &str = "chipmunk-hvc-leaf";
/// Expands the per-signer aggregation randomizers.
pub const DOMAIN_RANDOMIZER: &str = "chipmunk-multi-signer-randomizer";

/// Fixed 32-byte seed the HOTS public parameters are expanded from. Identical
/// for every signer and verifier of a deployment.
pub const HOTS_PARAMS_SEED: [u8; 32] = [
    0x43, 0x68, 0x69, 0x70, 0x6d, 0x75, 0x6e, 0x6b, // "Chipmunk"
    0x2d, 0x48, 0x4f, 0x54, 0x53, 0x2d, 0x70, 0x61, // "-HOTS-pa"
    0x72, 0x61, 0x6d, 0x73, 0x2d, 0x76, 0x31, 0x00, // "rams-v1"
    0x12, 0x34, 0x56, 0x78, 0x12, 0x34, 0x56, 0x78,
];

/// Fixed 32-byte seed of the HVC hasher matrix.
pub const HVC_MATRIX_SEED: [u8; 32] = [
    0x43, 0x68, 0x69, 0x70, 0x6d, 0x75, 0x6e, 0x6b, // "Chipmunk"
    0x2d, 0x48, 0x56, 0x43, 0x2d, 0x6d, 0x61, 0x74, // "-HVC-mat"
    0x72, 0x69, 0x78, 0x2d, 0x76, 0x31, 0x00, 0x00, // "rix-v1"
    0x9e, 0x37, 0x79, 0xb9, 0x7f, 0x4a, 0x7c, 0x15,
];
