//!
//! Modular reduction primitives shared by every ring: Barrett reduction for
//! butterfly sums, 64-bit widening reduction for products, the centered
//! representation, and Montgomery multiplication for the pointwise path.
//!

/// Barrett reduction with the single precomputed constant v = floor(2^26 / q).
///
/// Exact for inputs in (-q, 2q), which covers the butterfly sums `u + v` and
/// `u + q - v` over canonical operands. Larger inputs must go through
/// [`reduce64`] instead.
#[inline(always)]
pub fn barrett_reduce(a: i32, q: i32, v: i32) -> i32 {
    let t = ((a as i64 * v as i64) >> 26) as i32;
    let mut r = a - t * q;
    if r >= q {
        r -= q;
    }
    if r < 0 {
        r += q;
    }
    r
}

/// Reduces a 64-bit product to the canonical residue in [0, q). All 32x32
/// products are widened to 64 bits before they reach this point.
#[inline(always)]
pub fn reduce64(a: i64, q: i32) -> i32 {
    let mut r = (a % q as i64) as i32;
    if r < 0 {
        r += q;
    }
    r
}

/// Maps a canonical residue in [0, q) onto the centered range (-q/2, q/2].
#[inline(always)]
pub fn center(a: i32, q: i32) -> i32 {
    if a > q / 2 {
        a - q
    } else {
        a
    }
}

/// Lifts an arbitrary representative to the canonical residue in [0, q).
#[inline(always)]
pub fn lift(a: i32, q: i32) -> i32 {
    let r = a % q;
    if r < 0 {
        r + q
    } else {
        r
    }
}

/// Montgomery multiplication: returns a * b * R^-1 mod q in [0, q).
///
/// `mont_bits` fixes R = 2^mont_bits, which must exceed q; `qinv` is
/// -q^-1 mod R. Inputs are canonical residues.
#[inline(always)]
pub fn mont_mul(a: i32, b: i32, q: i32, qinv: u32, mont_bits: u32) -> i32 {
    let mask: u64 = (1u64 << mont_bits) - 1;
    let t = a as i64 * b as i64;
    let u = ((t as u64 & mask).wrapping_mul(qinv as u64)) & mask;
    let t = t + (u as i64) * q as i64;
    let mut r = (t >> mont_bits) as i32;
    if r >= q {
        r -= q;
    }
    if r < 0 {
        r += q;
    }
    r
}

/// Computes -q^-1 mod 2^mont_bits by Newton iteration. q must be odd.
pub fn mont_qinv(q: i32, mont_bits: u32) -> u32 {
    let mask: u64 = (1u64 << mont_bits) - 1;
    let q = q as u64;
    // Five iterations double the valid bits from 3 past 32.
    let mut x: u64 = q;
    for _ in 0..5 {
        x = x.wrapping_mul(2u64.wrapping_sub(q.wrapping_mul(x))) & mask;
    }
    debug_assert_eq!(q.wrapping_mul(x) & mask, 1);
    (((1u64 << mont_bits) - x) & mask) as u32
}

/// Modular exponentiation, used when the twiddle tables are generated.
pub fn mod_pow(base: i64, mut exp: u64, modulus: i64) -> i64 {
    let mut result: i64 = 1;
    let mut base = base.rem_euclid(modulus);
    while exp > 0 {
        if exp & 1 == 1 {
            result = result * base % modulus;
        }
        base = base * base % modulus;
        exp >>= 1;
    }
    result
}

/// Modular inverse via Fermat (the ring moduli are prime).
pub fn mod_inv(a: i64, modulus: i64) -> i64 {
    mod_pow(a, (modulus - 2) as u64, modulus)
}
