//!
//! The number-theoretic transform engine. One generic forward/inverse pair
//! serves all three rings; each ring carries its own twiddle tables, generated
//! once at first use from the ring's primitive 2N-th root of unity.
//!
//! Table convention: `forward[k] = omega^brv(k)` and
//! `inverse[k] = (omega^-1)^brv(k)` with `brv` the log2(N)-bit reversal,
//! entries stored as canonical residues. The forward transform is the
//! decimation-in-time Cooley-Tukey iteration, the inverse the
//! decimation-in-frequency Gentleman-Sande mirror followed by the N^-1 scale.
//!

use std::fmt::Debug;
// ---
use lazy_static::lazy_static;
// ---
use crate::config;
use crate::reduce::{barrett_reduce, mod_inv, mod_pow, mont_qinv, reduce64};

/// Everything the transforms need to know about one ring.
///
/// Implementations are zero-sized markers; the per-ring twiddle tables hang
/// off [`Ring::tables`] as process-wide immutable snapshots.
pub trait Ring: Clone + Debug + PartialEq + 'static {
    /// Ring dimension; a power of two.
    const N: usize;
    /// log2(N), the bit width of the table index reversal.
    const LOG_N: u32;
    /// The prime modulus.
    const Q: i32;
    /// A primitive 2N-th root of unity mod Q.
    const OMEGA: i32;
    /// N^-1 mod Q, applied at the end of the inverse transform.
    const N_INV: i32;
    /// Montgomery R = 2^MONT_BITS; must exceed Q.
    const MONT_BITS: u32;
    /// Barrett constant floor(2^26 / Q) for butterfly sums.
    const BARRETT_V: i32;

    fn tables() -> &'static NttTables;
}

/// Precomputed per-ring constants: twiddle factors plus the Montgomery
/// constants for the pointwise path.
pub struct NttTables {
    pub forward: Vec<i32>,
    pub inverse: Vec<i32>,
    /// -Q^-1 mod R.
    pub mont_qinv: u32,
    /// R^2 mod Q, folded in so pointwise products come out exact.
    pub mont_r2: i32,
}

fn bit_reverse(mut x: usize, bits: u32) -> usize {
    let mut r = 0;
    for _ in 0..bits {
        r = (r << 1) | (x & 1);
        x >>= 1;
    }
    r
}

fn build_tables<R: Ring>() -> NttTables {
    let q = R::Q as i64;
    let omega = R::OMEGA as i64;

    // A wrong root would silently corrupt every transform; fail loudly here.
    debug_assert_eq!(
        mod_pow(omega, R::N as u64, q),
        q - 1,
        "ring root is not a primitive 2N-th root of unity"
    );
    debug_assert_eq!(
        reduce64(R::N_INV as i64 * R::N as i64, R::Q),
        1,
        "N_INV does not invert N"
    );

    let omega_inv = mod_inv(omega, q);
    let mut forward = Vec::with_capacity(R::N);
    let mut inverse = Vec::with_capacity(R::N);
    for k in 0..R::N {
        let e = bit_reverse(k, R::LOG_N) as u64;
        forward.push(mod_pow(omega, e, q) as i32);
        inverse.push(mod_pow(omega_inv, e, q) as i32);
    }

    NttTables {
        forward,
        inverse,
        mont_qinv: mont_qinv(R::Q, R::MONT_BITS),
        mont_r2: mod_pow(2, 2 * R::MONT_BITS as u64, q) as i32,
    }
}

// ***************************************
//             RING MARKERS
// ***************************************

/// The single-signer lattice ring, N = 256.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SigRing;

/// The HOTS ring, N = 512.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HotsRing;

/// The HVC tree-hash ring, N = 512.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HvcRing;

lazy_static! {
    static ref SIG_TABLES: NttTables = build_tables::<SigRing>();
    static ref HOTS_TABLES: NttTables = build_tables::<HotsRing>();
    static ref HVC_TABLES: NttTables = build_tables::<HvcRing>();
}

impl Ring for SigRing {
    const N: usize = config::SIG_N;
    const LOG_N: u32 = 8;
    const Q: i32 = config::SIG_Q;
    const OMEGA: i32 = config::SIG_OMEGA;
    const N_INV: i32 = config::SIG_N_INV;
    // Q exceeds 2^22, so this ring needs the wider Montgomery radix.
    const MONT_BITS: u32 = 23;
    const BARRETT_V: i32 = (1 << 26) / config::SIG_Q;

    fn tables() -> &'static NttTables {
        &SIG_TABLES
    }
}

impl Ring for HotsRing {
    const N: usize = config::HOTS_N;
    const LOG_N: u32 = 9;
    const Q: i32 = config::HOTS_Q;
    const OMEGA: i32 = config::HOTS_OMEGA;
    const N_INV: i32 = config::HOTS_N_INV;
    const MONT_BITS: u32 = 22;
    const BARRETT_V: i32 = (1 << 26) / config::HOTS_Q;

    fn tables() -> &'static NttTables {
        &HOTS_TABLES
    }
}

impl Ring for HvcRing {
    const N: usize = config::HVC_N;
    const LOG_N: u32 = 9;
    const Q: i32 = config::HVC_Q;
    const OMEGA: i32 = config::HVC_OMEGA;
    const N_INV: i32 = config::HVC_N_INV;
    const MONT_BITS: u32 = 22;
    const BARRETT_V: i32 = (1 << 26) / config::HVC_Q;

    fn tables() -> &'static NttTables {
        &HVC_TABLES
    }
}

// ***************************************
//             TRANSFORMS
// ***************************************

/// In-place forward transform. Input coefficients may be any representatives;
/// output is canonical in [0, Q).
pub fn forward<R: Ring>(a: &mut [i32]) {
    debug_assert_eq!(a.len(), R::N);
    let q = R::Q;
    let bv = R::BARRETT_V;
    let tbl = &R::tables().forward;

    for x in a.iter_mut() {
        *x = crate::reduce::lift(*x, q);
    }

    let mut t = R::N;
    let mut m = 1;
    while m < R::N {
        let ht = t >> 1;
        let mut j1 = 0;
        for i in 0..m {
            let s = tbl[m + i];
            for j in j1..j1 + ht {
                let u = a[j];
                let v = reduce64(a[j + ht] as i64 * s as i64, q);
                a[j] = barrett_reduce(u + v, q, bv);
                a[j + ht] = barrett_reduce(u + q - v, q, bv);
            }
            j1 += t;
        }
        t = ht;
        m <<= 1;
    }
}

/// In-place inverse transform, ending with the N^-1 scale. Output is
/// canonical in [0, Q); the polynomial layer recenters.
pub fn inverse<R: Ring>(a: &mut [i32]) {
    debug_assert_eq!(a.len(), R::N);
    let q = R::Q;
    let bv = R::BARRETT_V;
    let tbl = &R::tables().inverse;

    for x in a.iter_mut() {
        *x = crate::reduce::lift(*x, q);
    }

    let mut t = 1;
    let mut m = R::N;
    while m > 1 {
        let hm = m >> 1;
        let dt = t << 1;
        let mut j1 = 0;
        for i in 0..hm {
            let j2 = j1 + t;
            let s = tbl[hm + i];
            for j in j1..j2 {
                let u = a[j];
                let v = a[j + t];
                a[j] = barrett_reduce(u + v, q, bv);
                a[j + t] = reduce64((u + q - v) as i64 * s as i64, q);
            }
            j1 += dt;
        }
        t = dt;
        m = hm;
    }

    for x in a.iter_mut() {
        *x = reduce64(*x as i64 * R::N_INV as i64, q);
    }
}

/// Pointwise product through the Montgomery multiplier. The R^2 factor is
/// folded in, so the result is the exact product a*b mod Q per coefficient.
pub fn pointwise_montgomery<R: Ring>(c: &mut [i32], a: &[i32], b: &[i32]) {
    debug_assert!(a.len() == R::N && b.len() == R::N && c.len() == R::N);
    let t = R::tables();
    for i in 0..R::N {
        let m = crate::reduce::mont_mul(a[i], b[i], R::Q, t.mont_qinv, R::MONT_BITS);
        c[i] = crate::reduce::mont_mul(m, t.mont_r2, R::Q, t.mont_qinv, R::MONT_BITS);
    }
}
