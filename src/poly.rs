//!
//! Domain-tagged polynomials over the scheme rings.
//!
//! A polynomial is either in the time domain ([`TimePoly`]) or in the NTT
//! domain ([`NttPoly`]); the two are distinct types over the same backing
//! storage, so accidentally mixing domains in one operation is a compile
//! error. Every crossing is an explicit [`TimePoly::ntt`] or
//! [`NttPoly::inv_ntt`].
//!
//! Pointwise multiplication exists in two fixed flavors: the Montgomery path
//! used by the transform layer, and the ordinary widening modular product used
//! at the HOTS call sites. A call site picks one and never mixes them.
//!

use std::marker::PhantomData;
// ---
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;
// ---
use crate::common::{ChipmunkError, Result, Seed};
use crate::hasher;
use crate::ntt::{self, Ring};
use crate::reduce::{center, lift, reduce64};
use crate::utils;

/// A polynomial of `R::N` coefficients in the time domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePoly<R: Ring> {
    coeffs: Vec<i32>,
    _ring: PhantomData<R>,
}

/// A polynomial of `R::N` coefficients in the NTT domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NttPoly<R: Ring> {
    coeffs: Vec<i32>,
    _ring: PhantomData<R>,
}

impl<R: Ring> Zeroize for TimePoly<R> {
    fn zeroize(&mut self) {
        self.coeffs.zeroize();
    }
}

impl<R: Ring> Zeroize for NttPoly<R> {
    fn zeroize(&mut self) {
        self.coeffs.zeroize();
    }
}

impl<R: Ring> TimePoly<R> {
    pub fn zero() -> Self {
        TimePoly {
            coeffs: vec![0; R::N],
            _ring: PhantomData,
        }
    }

    pub fn from_coeffs(coeffs: Vec<i32>) -> Self {
        assert_eq!(coeffs.len(), R::N, "coefficient count must match the ring");
        TimePoly {
            coeffs,
            _ring: PhantomData,
        }
    }

    pub fn coeffs(&self) -> &[i32] {
        &self.coeffs
    }

    pub fn coeffs_mut(&mut self) -> &mut [i32] {
        &mut self.coeffs
    }

    /// Pointwise modular addition with centered normalization.
    pub fn add(&self, other: &Self) -> Self {
        let q = R::Q;
        let coeffs = self
            .coeffs
            .iter()
            .zip(&other.coeffs)
            .map(|(&a, &b)| center(reduce64(a as i64 + b as i64, q), q))
            .collect();
        TimePoly {
            coeffs,
            _ring: PhantomData,
        }
    }

    /// Pointwise modular subtraction with centered normalization.
    pub fn sub(&self, other: &Self) -> Self {
        let q = R::Q;
        let coeffs = self
            .coeffs
            .iter()
            .zip(&other.coeffs)
            .map(|(&a, &b)| center(reduce64(a as i64 - b as i64, q), q))
            .collect();
        TimePoly {
            coeffs,
            _ring: PhantomData,
        }
    }

    /// Explicit crossing into the NTT domain.
    pub fn ntt(&self) -> NttPoly<R> {
        let mut coeffs = self.coeffs.clone();
        ntt::forward::<R>(&mut coeffs);
        NttPoly {
            coeffs,
            _ring: PhantomData,
        }
    }

    /// Multiplication by a ternary polynomial, as negacyclic shift-adds. Each
    /// elementary step maps a coefficient through (-c, 0, c); no integer
    /// multiplication takes place.
    pub fn mul_ternary(&self, r: &TimePoly<R>) -> Self {
        let n = R::N;
        let q = R::Q;
        let mut acc = vec![0i64; n];
        for (k, &rk) in r.coeffs.iter().enumerate() {
            if rk == 0 {
                continue;
            }
            debug_assert!(rk == 1 || rk == -1, "randomizer coefficients are ternary");
            for j in 0..n {
                let v = if rk == 1 {
                    self.coeffs[j] as i64
                } else {
                    -(self.coeffs[j] as i64)
                };
                let idx = j + k;
                if idx >= n {
                    acc[idx - n] -= v;
                } else {
                    acc[idx] += v;
                }
            }
        }
        let coeffs = acc
            .into_iter()
            .map(|x| center(reduce64(x, q), q))
            .collect();
        TimePoly {
            coeffs,
            _ring: PhantomData,
        }
    }

    /// Uniform coefficients from a 32-byte seed and a 16-bit nonce: SHAKE-128
    /// expands 3N bytes, each 3-byte little-endian group is masked to 23 bits
    /// and reduced mod q.
    pub fn uniform(seed: &Seed, nonce: u16) -> Self {
        let mut buf = vec![0u8; R::N * 3];
        hasher::shake128_xof_parts(&[seed, &nonce.to_le_bytes()], &mut buf);

        let coeffs = buf
            .chunks_exact(3)
            .map(|b| {
                let t = (b[0] as u32) | ((b[1] as u32) << 8) | ((b[2] as u32) << 16);
                center(((t & 0x7f_ffff) % R::Q as u32) as i32, R::Q)
            })
            .collect();
        TimePoly {
            coeffs,
            _ring: PhantomData,
        }
    }

    /// Uniform coefficients in [-bound, bound] from a 36-byte seed (32-byte
    /// seed plus 32-bit nonce), via a ChaCha20 stream.
    pub fn bounded(seed: &Seed, nonce: u32, bound: i32) -> Self {
        debug_assert!(bound > 0);
        let prg_seed = hasher::sha3_256_parts(&[seed, &nonce.to_le_bytes()]);
        let mut rng = ChaCha20Rng::from_seed(prg_seed);

        let range = 2 * bound as u32 + 1;
        let coeffs = (0..R::N)
            .map(|_| (rng.next_u32() % range) as i32 - bound)
            .collect();
        TimePoly {
            coeffs,
            _ring: PhantomData,
        }
    }

    /// Sparse ternary polynomial with exactly `weight` nonzero ±1
    /// coefficients, deterministic in the seed. Positions come from the
    /// ChaCha20 stream, skipping occupied ones; the sign rides in bit 9 of the
    /// same draw.
    pub fn rand_ternary(seed: &Seed, weight: usize) -> Self {
        debug_assert!(weight <= R::N);
        let mut rng = ChaCha20Rng::from_seed(*seed);
        let mut coeffs = vec![0i32; R::N];

        let mut set = 0;
        while set < weight {
            let v = rng.next_u32();
            let idx = (v as usize) % R::N;
            if coeffs[idx] == 0 {
                coeffs[idx] = if (v >> 9) & 1 == 1 { 1 } else { -1 };
                set += 1;
            }
        }
        TimePoly {
            coeffs,
            _ring: PhantomData,
        }
    }

    /// Sparse challenge with exactly `weight` nonzero ±1 coefficients, from a
    /// SHAKE-128 expansion of the challenge seed: two bytes of position masked
    /// to N-1, one byte of sign, duplicates skipped.
    pub fn challenge(seed: &Seed, weight: usize) -> Result<Self> {
        debug_assert!(weight <= R::N);
        let mut expanded = vec![0u8; R::N * 8];
        hasher::shake128_xof(seed, &mut expanded);

        let mut coeffs = vec![0i32; R::N];
        let mut filled = 0;
        let mut pos = 0;
        while filled < weight {
            if pos + 3 > expanded.len() {
                // With an 8N-byte expansion this would take an astronomically
                // unlikely run of collisions.
                return Err(ChipmunkError::InternalInvariantViolation(
                    "challenge expansion exhausted",
                ));
            }
            let idx = (((expanded[pos] as usize) << 8) | expanded[pos + 1] as usize) & (R::N - 1);
            let sign = if expanded[pos + 2] & 1 == 1 { -1 } else { 1 };
            pos += 3;

            if coeffs[idx] == 0 {
                coeffs[idx] = sign;
                filled += 1;
            }
        }
        Ok(TimePoly {
            coeffs,
            _ring: PhantomData,
        })
    }

    /// Returns the same ring element with every coefficient lifted to the
    /// canonical range [0, q). The HVC layer keeps its polynomials canonical.
    pub fn canonical(&self) -> Self {
        TimePoly {
            coeffs: self.coeffs.iter().map(|&c| lift(c, R::Q)).collect(),
            _ring: PhantomData,
        }
    }

    /// Checks that every centered coefficient magnitude is at most `bound`.
    /// Returns true when the polynomial is within the bound.
    pub fn chknorm(&self, bound: i32) -> bool {
        self.coeffs.iter().all(|&c| {
            let t = center(lift(c, R::Q), R::Q);
            t.abs() <= bound
        })
    }

    /// Largest centered coefficient magnitude.
    pub fn infinity_norm(&self) -> i32 {
        self.coeffs
            .iter()
            .map(|&c| center(lift(c, R::Q), R::Q).abs())
            .max()
            .unwrap_or(0)
    }

    /// Number of nonzero coefficients.
    pub fn weight(&self) -> usize {
        self.coeffs.iter().filter(|&&c| lift(c, R::Q) != 0).count()
    }

    /// Equality as ring elements, comparing canonical residues.
    pub fn eq_mod(&self, other: &Self) -> bool {
        self.coeffs
            .iter()
            .zip(&other.coeffs)
            .all(|(&a, &b)| lift(a, R::Q) == lift(b, R::Q))
    }

    /// Canonical 24-bit little-endian coefficient encoding, 3N bytes.
    pub fn to_bytes24(&self) -> Vec<u8> {
        let lifted: Vec<i32> = self.coeffs.iter().map(|&c| lift(c, R::Q)).collect();
        let mut out = Vec::with_capacity(R::N * 3);
        utils::write_u24_coeffs(&mut out, &lifted);
        out
    }

    /// Parses the [`Self::to_bytes24`] encoding. Coefficients are reduced into
    /// the canonical range.
    pub fn from_bytes24(input: &[u8]) -> Result<Self> {
        if input.len() < R::N * 3 {
            return Err(ChipmunkError::BufferTooSmall {
                need: R::N * 3,
                got: input.len(),
            });
        }
        let coeffs = utils::read_u24_coeffs(input, R::N)
            .into_iter()
            .map(|c| lift(c, R::Q))
            .collect();
        Ok(TimePoly {
            coeffs,
            _ring: PhantomData,
        })
    }
}

impl<R: Ring> NttPoly<R> {
    pub fn zero() -> Self {
        NttPoly {
            coeffs: vec![0; R::N],
            _ring: PhantomData,
        }
    }

    /// Reinterprets raw coefficients that are already in NTT form; used by the
    /// key codecs, which store NTT-form secrets verbatim.
    pub fn from_coeffs(coeffs: Vec<i32>) -> Self {
        assert_eq!(coeffs.len(), R::N, "coefficient count must match the ring");
        NttPoly {
            coeffs,
            _ring: PhantomData,
        }
    }

    pub fn coeffs(&self) -> &[i32] {
        &self.coeffs
    }

    /// Explicit crossing back into the time domain, with the final centered
    /// normalization.
    pub fn inv_ntt(&self) -> TimePoly<R> {
        let mut coeffs = self.coeffs.clone();
        ntt::inverse::<R>(&mut coeffs);
        for c in coeffs.iter_mut() {
            *c = center(*c, R::Q);
        }
        TimePoly {
            coeffs,
            _ring: PhantomData,
        }
    }

    /// Pointwise product through the Montgomery multiplier (transform-layer
    /// call sites).
    pub fn mul_pointwise(&self, other: &Self) -> Self {
        let mut coeffs = vec![0i32; R::N];
        ntt::pointwise_montgomery::<R>(&mut coeffs, &self.coeffs, &other.coeffs);
        NttPoly {
            coeffs,
            _ring: PhantomData,
        }
    }

    /// Pointwise product by ordinary widening modular multiplication
    /// (HOTS-layer call sites).
    pub fn mul_plain(&self, other: &Self) -> Self {
        let q = R::Q;
        let coeffs = self
            .coeffs
            .iter()
            .zip(&other.coeffs)
            .map(|(&a, &b)| reduce64(a as i64 * b as i64, q))
            .collect();
        NttPoly {
            coeffs,
            _ring: PhantomData,
        }
    }

    /// Pointwise modular addition with centered normalization.
    pub fn add(&self, other: &Self) -> Self {
        let q = R::Q;
        let coeffs = self
            .coeffs
            .iter()
            .zip(&other.coeffs)
            .map(|(&a, &b)| center(reduce64(a as i64 + b as i64, q), q))
            .collect();
        NttPoly {
            coeffs,
            _ring: PhantomData,
        }
    }

    /// Pointwise modular subtraction with centered normalization.
    pub fn sub(&self, other: &Self) -> Self {
        let q = R::Q;
        let coeffs = self
            .coeffs
            .iter()
            .zip(&other.coeffs)
            .map(|(&a, &b)| center(reduce64(a as i64 - b as i64, q), q))
            .collect();
        NttPoly {
            coeffs,
            _ring: PhantomData,
        }
    }

    /// Equality as ring elements, comparing canonical residues.
    pub fn eq_mod(&self, other: &Self) -> bool {
        self.coeffs
            .iter()
            .zip(&other.coeffs)
            .all(|(&a, &b)| lift(a, R::Q) == lift(b, R::Q))
    }
}
