//! Numbers the engine computes with.
//!
//! Purpose
//! - `Number` is the narrow arithmetic contract every weight type satisfies:
//!   ring operations by value, an exact-or-failing sign, an exact projective
//!   hash key, and a float shadow used only for estimates and reporting.
//! - `NumberCapability` supplies the one operation the engine cannot do on its
//!   own: a Perron–Frobenius eigenvector of an integer matrix with entries in
//!   some exact real-algebraic number type.
//!
//! Implementations
//! - `i64` and `BigInt`: exact integers (curves, iteration vectors).
//! - `FieldElement` (see `field`): elements of `Z[x]/(p)` evaluated at a
//!   simple real root of `p`, produced by `AlgebraicCapability`.

mod field;

use std::cmp::Ordering;
use std::fmt::Debug;
use std::ops::{Add, Mul, Sub};

use num_bigint::{BigInt, Sign};
use num_traits::{ToPrimitive, Zero};

use crate::error::{FlipperError, Result};
use crate::matrix::IntMatrix;

pub use field::{AlgebraicCapability, FieldElement, NumberField};

/// Ordered ring element with exact (or explicitly failing) sign.
pub trait Number:
    Clone + Debug + Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self>
{
    /// Zero of the same ring (field elements carry their field).
    fn zero_like(&self) -> Self;
    /// `Computation` error if the product leaves the type's range.
    fn mul_integer(&self, k: i128) -> Result<Self>;
    /// Sign relative to zero; `Approximation` error if undecidable.
    fn sign(&self) -> Result<Ordering>;
    fn to_f64(&self) -> f64;

    /// `⌊resolution · self / total⌋` for a positive `total`, decided by exact
    /// comparisons. Depends only on the two values, never on their
    /// representation, so equal projective weights get equal keys.
    fn projective_key(&self, total: &Self, resolution: i64) -> Result<i64> {
        if total.sign()? != Ordering::Greater {
            return Err(FlipperError::assumption("projective key needs a positive total"));
        }
        let scaled = self.mul_integer(i128::from(resolution))?;
        // `k·total ≤ scaled`
        let fits = |k: i128| -> Result<bool> {
            Ok(compare(&total.mul_integer(k)?, &scaled)? != Ordering::Greater)
        };
        // Gallop away from the float estimate, then bisect.
        let guess = (self.to_f64() / total.to_f64() * resolution as f64).floor();
        let guess = if guess.is_nan() { 0 } else { guess.clamp(-1e30, 1e30) as i128 };
        let (mut lo, mut hi);
        let mut step = 1i128;
        if fits(guess)? {
            lo = guess;
            loop {
                hi = lo + step;
                if !fits(hi)? {
                    break;
                }
                lo = hi;
                step *= 2;
            }
        } else {
            hi = guess;
            loop {
                lo = hi - step;
                if fits(lo)? {
                    break;
                }
                hi = lo;
                step *= 2;
            }
        }
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if fits(mid)? {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        i64::try_from(lo).map_err(|_| FlipperError::computation("projective key out of range"))
    }
}

/// Exact Perron–Frobenius routine over some algebraic number type.
pub trait NumberCapability {
    type Number: Number;

    /// Eigenvector (entry sum positive) and eigenvalue of the simple dominant
    /// real eigenvalue of `action`. `Assumption` error if there is none.
    fn perron_frobenius(&self, action: &IntMatrix) -> Result<(Vec<Self::Number>, Self::Number)>;
}

/// `a` vs `b`.
pub fn compare<N: Number>(a: &N, b: &N) -> Result<Ordering> {
    (a.clone() - b.clone()).sign()
}

pub fn max_of<N: Number>(a: N, b: N) -> Result<N> {
    Ok(if compare(&a, &b)? == Ordering::Less { b } else { a })
}

pub fn is_zero<N: Number>(a: &N) -> Result<bool> {
    Ok(a.sign()? == Ordering::Equal)
}

pub fn sum<N: Number>(values: &[N]) -> Option<N> {
    let mut it = values.iter().cloned();
    let first = it.next()?;
    Some(it.fold(first, |acc, x| acc + x))
}

impl Number for i64 {
    #[inline]
    fn zero_like(&self) -> Self {
        0
    }
    #[inline]
    fn mul_integer(&self, k: i128) -> Result<Self> {
        (*self as i128)
            .checked_mul(k)
            .and_then(|r| i64::try_from(r).ok())
            .ok_or_else(|| FlipperError::computation("integer weight overflows i64"))
    }
    #[inline]
    fn sign(&self) -> Result<Ordering> {
        Ok(self.cmp(&0))
    }
    #[inline]
    fn to_f64(&self) -> f64 {
        *self as f64
    }
}

impl Number for BigInt {
    fn zero_like(&self) -> Self {
        BigInt::zero()
    }
    fn mul_integer(&self, k: i128) -> Result<Self> {
        Ok(self * BigInt::from(k))
    }
    fn sign(&self) -> Result<Ordering> {
        Ok(match BigInt::sign(self) {
            Sign::Minus => Ordering::Less,
            Sign::NoSign => Ordering::Equal,
            Sign::Plus => Ordering::Greater,
        })
    }
    fn to_f64(&self) -> f64 {
        ToPrimitive::to_f64(self).unwrap_or(match BigInt::sign(self) {
            Sign::Minus => f64::NEG_INFINITY,
            _ => f64::INFINITY,
        })
    }
}

#[cfg(test)]
mod tests;
