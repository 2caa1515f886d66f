//!
//! The hash and XOF adapter every layer above draws from: SHA3-256 for fixed
//! 32-byte digests, standardized SHAKE-128 for seed expansion, and a
//! domain-separated variant for the multi-signer protocol.
//!
//! Domain strings come from the registry in [`crate::config`] and are
//! length-prefixed before the payload, so distinct domains can never collide
//! on identical payloads.
//!

use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::{Digest, Sha3_256, Shake128};

/// Fixed-length 32-byte hash.
pub fn sha3_256(input: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha3_256::digest(input));
    out
}

/// SHA3-256 over the concatenation of several segments, without an
/// intermediate buffer.
pub fn sha3_256_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    for p in parts {
        Digest::update(&mut hasher, p);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Extendable output over the input; `out` sizes up to a few kilobytes are the
/// expected use.
pub fn shake128_xof(input: &[u8], out: &mut [u8]) {
    let mut hasher = Shake128::default();
    hasher.update(input);
    hasher.finalize_xof().read(out);
}

/// SHAKE-128 over several segments.
pub fn shake128_xof_parts(parts: &[&[u8]], out: &mut [u8]) {
    let mut hasher = Shake128::default();
    for p in parts {
        hasher.update(p);
    }
    hasher.finalize_xof().read(out);
}

/// Domain-separated 32-byte hash: the domain string is length-prefixed, then
/// the payload and the little-endian iteration counter follow.
pub fn domain_hash(domain: &str, payload: &[u8], iteration: u32) -> [u8; 32] {
    sha3_256_parts(&[
        &[domain.len() as u8],
        domain.as_bytes(),
        payload,
        &iteration.to_le_bytes(),
    ])
}

/// Domain-separated extendable output, same framing as [`domain_hash`].
pub fn domain_xof(domain: &str, payload: &[u8], iteration: u32, out: &mut [u8]) {
    shake128_xof_parts(
        &[
            &[domain.len() as u8],
            domain.as_bytes(),
            payload,
            &iteration.to_le_bytes(),
        ],
        out,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;

    #[test]
    fn test_sha3_256_known_answer() {
        // SHA3-256 of the empty string.
        assert_eq!(
            crate::utils::to_hex(&sha3_256(b"")),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
    }

    #[test]
    fn test_parts_match_concatenation() {
        let whole = sha3_256(b"chipmunk test");
        let parts = sha3_256_parts(&[b"chipmunk", b" ", b"test"]);
        assert_eq!(whole, parts);
    }

    #[test]
    fn test_xof_is_deterministic_and_prefix_stable() {
        let mut a = [0u8; 64];
        let mut b = [0u8; 128];
        shake128_xof(b"seed", &mut a);
        shake128_xof(b"seed", &mut b);
        assert_eq!(&a[..], &b[..64], "XOF outputs must be prefix-stable!");
    }

    #[test]
    fn test_domains_do_not_alias() {
        let payload = b"identical payload";
        let a = domain_hash(config::DOMAIN_SIG_KEY, payload, 0);
        let b = domain_hash(config::DOMAIN_SIG_MATRIX, payload, 0);
        let c = domain_hash(config::DOMAIN_SIG_KEY, payload, 1);
        assert_ne!(a, b, "distinct domains must give independent outputs!");
        assert_ne!(a, c, "distinct iterations must give independent outputs!");
    }
}
