//! Reference algebraic backend: `Z[x]/(p)` at a simple real root of `p`.
//!
//! - `p` is the characteristic polynomial of an integer matrix (monic, integer
//!   coefficients), so products reduce without division and every element has
//!   integer coefficients in the power basis `1, λ, …, λ^{d-1}`.
//! - The root `λ` is located on the `f64` spectrum and refined by exact dyadic
//!   bisection to `ROOT_BITS` bits. Signs are decided by interval evaluation at
//!   increasing precision. An interval still straddling zero at `ROOT_BITS`
//!   is settled exactly: the value is zero iff `λ` is a root of
//!   `gcd(c, p)`; otherwise the root is refined further until the sign shows.
//! - The spectrum comes from a bounded Schur iteration; a matrix it cannot
//!   handle is retried on its transpose and on the companion matrix of `p`.
//! - `p` need not be irreducible: representations are not canonical, but the
//!   value at `λ` (and hence every sign) is.

use std::cmp::Ordering;
use std::ops::{Add, Mul, Sub};
use std::sync::Arc;

use nalgebra::linalg::Schur;
use nalgebra::{Complex, DMatrix};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};

use super::{Number, NumberCapability};
use crate::error::{FlipperError, Result};
use crate::matrix::IntMatrix;

const ROOT_BITS: u64 = 512;
const PRECISION_LADDER: [u64; 4] = [64, 128, 256, ROOT_BITS];
/// Refinement past `ROOT_BITS` stops here with an `Approximation` error.
const MAX_BITS: u64 = 1 << 14;
const SCHUR_MAX_ITERATIONS: usize = 10_000;

/// A monic integer polynomial together with an isolated simple real root.
#[derive(Debug)]
pub struct NumberField {
    /// Low degree first; `poly[degree] == 1`.
    poly: Vec<BigInt>,
    /// The root lies in `[root_lo, root_lo + 1] / 2^ROOT_BITS`.
    root_lo: BigInt,
    root_exact: bool,
}

impl NumberField {
    /// Isolate the root of `poly` inside `[estimate - radius, estimate + radius]`.
    ///
    /// Pre: `poly` monic; the window contains exactly one root, which is simple
    /// and positive.
    pub fn new(poly: Vec<BigInt>, estimate: f64, radius: f64) -> Result<Arc<Self>> {
        debug_assert!(poly.last().map_or(false, |c| c.is_one()), "poly must be monic");
        let left = estimate - radius;
        if !(left > 0.0) || !radius.is_finite() {
            return Err(FlipperError::assumption(
                "root window must lie in the positive reals",
            ));
        }
        let scale = 2f64.powi(ROOT_BITS as i32);
        let mut lo = BigInt::from_f64((left * scale).floor())
            .ok_or_else(|| FlipperError::computation("root estimate out of range"))?;
        let mut hi = BigInt::from_f64((estimate + radius) * scale)
            .ok_or_else(|| FlipperError::computation("root estimate out of range"))?
            + 1;
        let s_lo = sign_of(&eval_dyadic(&poly, &lo, ROOT_BITS));
        let s_hi = sign_of(&eval_dyadic(&poly, &hi, ROOT_BITS));
        if s_lo == Ordering::Equal {
            return Ok(Arc::new(Self { poly, root_lo: lo, root_exact: true }));
        }
        if s_hi == Ordering::Equal {
            return Ok(Arc::new(Self { poly, root_lo: hi, root_exact: true }));
        }
        if s_lo == s_hi {
            return Err(FlipperError::computation(
                "characteristic polynomial has no sign change around the eigenvalue",
            ));
        }
        let one = BigInt::one();
        while &hi - &lo > one {
            let mid: BigInt = (&lo + &hi) >> 1usize;
            let s = sign_of(&eval_dyadic(&poly, &mid, ROOT_BITS));
            if s == Ordering::Equal {
                return Ok(Arc::new(Self { poly, root_lo: mid, root_exact: true }));
            }
            if s == s_lo {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Ok(Arc::new(Self { poly, root_lo: lo, root_exact: false }))
    }

    #[inline]
    pub fn degree(&self) -> usize {
        self.poly.len() - 1
    }

    pub fn polynomial(&self) -> &[BigInt] {
        &self.poly
    }

    /// Approximate root.
    pub fn root_f64(&self) -> f64 {
        dyadic_to_f64(&self.root_lo, ROOT_BITS)
    }

    /// The root `λ` itself.
    pub fn generator(self: &Arc<Self>) -> FieldElement {
        self.element(vec![BigInt::zero(), BigInt::one()])
    }

    pub fn integer(self: &Arc<Self>, n: i128) -> FieldElement {
        self.element(vec![BigInt::from(n)])
    }

    /// Element with the given power-basis coefficients (any length, reduced mod `p`).
    pub fn element(self: &Arc<Self>, coeffs: Vec<BigInt>) -> FieldElement {
        FieldElement {
            coeffs: self.reduce(coeffs),
            field: Arc::clone(self),
        }
    }

    fn reduce(&self, mut coeffs: Vec<BigInt>) -> Vec<BigInt> {
        let d = self.degree();
        while coeffs.len() > d {
            let top = coeffs.pop().unwrap_or_default();
            if top.is_zero() {
                continue;
            }
            let shift = coeffs.len() - d;
            for i in 0..d {
                coeffs[shift + i] -= &top * &self.poly[i];
            }
        }
        coeffs.resize(d, BigInt::zero());
        coeffs
    }

    /// Numerators `[l, h]` of an enclosure of the root at scale `2^bits`,
    /// for `bits <= ROOT_BITS`.
    fn enclosure(&self, bits: u64) -> (BigInt, BigInt) {
        let shift = (ROOT_BITS - bits) as usize;
        let lo: BigInt = &self.root_lo >> shift;
        if self.root_exact && shift == 0 {
            return (lo.clone(), lo);
        }
        let hi = &lo + 1;
        (lo, hi)
    }

    /// Bisect an enclosure at scale `2^from` down to one at scale `2^to`.
    fn refine(&self, (lo, hi): (BigInt, BigInt), from: u64, to: u64) -> (BigInt, BigInt) {
        let shift = (to - from) as usize;
        if hi == lo {
            let exact = lo << shift;
            return (exact.clone(), exact);
        }
        let mut lo = lo << shift;
        let mut hi = hi << shift;
        let s_lo = sign_of(&eval_dyadic(&self.poly, &lo, to));
        let one = BigInt::one();
        while &hi - &lo > one {
            let mid: BigInt = (&lo + &hi) >> 1usize;
            let s = sign_of(&eval_dyadic(&self.poly, &mid, to));
            if s == Ordering::Equal {
                return (mid.clone(), mid);
            }
            if s == s_lo {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        (lo, hi)
    }

    /// Whether the isolated root is a root of `g`, a divisor of `p`.
    ///
    /// The isolating interval holds no other root of `p`, and its ends are not
    /// roots, so `g` vanishes at `λ` iff it changes sign across the interval.
    fn is_root_of(&self, g: &[BigInt]) -> bool {
        if self.root_exact {
            return eval_dyadic(g, &self.root_lo, ROOT_BITS).is_zero();
        }
        let hi = &self.root_lo + 1;
        let s_lo = sign_of(&eval_dyadic(g, &self.root_lo, ROOT_BITS));
        let s_hi = sign_of(&eval_dyadic(g, &hi, ROOT_BITS));
        s_lo != s_hi
    }
}

/// `Σ p_i N^i 2^{k(d-i)}`: the value of `p` at `N / 2^k`, scaled by `2^{kd}`.
fn eval_dyadic(poly: &[BigInt], n: &BigInt, bits: u64) -> BigInt {
    let d = poly.len() - 1;
    let mut acc = poly[d].clone();
    for i in (0..d).rev() {
        acc = acc * n + (&poly[i] << ((bits as usize) * (d - i)));
    }
    acc
}

fn sign_of(x: &BigInt) -> Ordering {
    if x.is_positive() {
        Ordering::Greater
    } else if x.is_negative() {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

/// `num / 2^exp` as a float, without overflowing on large numerators.
fn dyadic_to_f64(num: &BigInt, exp: u64) -> f64 {
    let bits = num.bits();
    let (mantissa, shift) = if bits > 64 {
        let s = bits - 64;
        let top: BigInt = num.abs() >> (s as usize);
        (ToPrimitive::to_f64(&top).unwrap_or(0.0), s as i64)
    } else {
        (ToPrimitive::to_f64(&num.abs()).unwrap_or(0.0), 0)
    };
    let e = shift - exp as i64;
    let magnitude = mantissa * 2f64.powi(e.clamp(-2000, 2000) as i32);
    if num.is_negative() {
        -magnitude
    } else {
        magnitude
    }
}

/// Element of `Z[x]/(p)`, read as a real number by evaluating at the root.
#[derive(Clone, Debug)]
pub struct FieldElement {
    field: Arc<NumberField>,
    coeffs: Vec<BigInt>,
}

impl FieldElement {
    pub fn field(&self) -> &Arc<NumberField> {
        &self.field
    }

    pub fn coefficients(&self) -> &[BigInt] {
        &self.coeffs
    }

    /// Numerators of an enclosure of the value at scale `2^{bits·(d-1)}`,
    /// given an enclosure `(l, h)` of the root at scale `2^bits`.
    fn interval(&self, (l, h): &(BigInt, BigInt), bits: u64) -> (BigInt, BigInt) {
        let d = self.coeffs.len();
        let top = d.saturating_sub(1);
        let mut lo = BigInt::zero();
        let mut hi = BigInt::zero();
        let mut l_pow = BigInt::one();
        let mut h_pow = BigInt::one();
        for (i, c) in self.coeffs.iter().enumerate() {
            let scale = (bits as usize) * (top - i);
            if c.is_positive() {
                lo += (c * &l_pow) << scale;
                hi += (c * &h_pow) << scale;
            } else if c.is_negative() {
                lo += (c * &h_pow) << scale;
                hi += (c * &l_pow) << scale;
            }
            l_pow *= l;
            h_pow *= h;
        }
        (lo, hi)
    }

    fn decided(&self, enclosure: &(BigInt, BigInt), bits: u64) -> Option<Ordering> {
        let (lo, hi) = self.interval(enclosure, bits);
        if lo.is_positive() {
            Some(Ordering::Greater)
        } else if hi.is_negative() {
            Some(Ordering::Less)
        } else {
            None
        }
    }

    fn same_field(&self, other: &Self) {
        debug_assert!(
            Arc::ptr_eq(&self.field, &other.field),
            "field elements from different fields"
        );
    }
}

impl Add for FieldElement {
    type Output = FieldElement;
    fn add(mut self, rhs: FieldElement) -> Self::Output {
        self.same_field(&rhs);
        for (a, b) in self.coeffs.iter_mut().zip(rhs.coeffs) {
            *a += b;
        }
        self
    }
}

impl Sub for FieldElement {
    type Output = FieldElement;
    fn sub(mut self, rhs: FieldElement) -> Self::Output {
        self.same_field(&rhs);
        for (a, b) in self.coeffs.iter_mut().zip(rhs.coeffs) {
            *a -= b;
        }
        self
    }
}

impl Mul for FieldElement {
    type Output = FieldElement;
    fn mul(self, rhs: FieldElement) -> Self::Output {
        self.same_field(&rhs);
        let d = self.coeffs.len();
        let mut prod = vec![BigInt::zero(); (2 * d).saturating_sub(1).max(1)];
        for (i, a) in self.coeffs.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in rhs.coeffs.iter().enumerate() {
                prod[i + j] += a * b;
            }
        }
        let coeffs = self.field.reduce(prod);
        FieldElement {
            field: self.field,
            coeffs,
        }
    }
}

impl Number for FieldElement {
    fn zero_like(&self) -> Self {
        FieldElement {
            field: Arc::clone(&self.field),
            coeffs: vec![BigInt::zero(); self.coeffs.len()],
        }
    }

    fn mul_integer(&self, k: i128) -> Result<Self> {
        let k = BigInt::from(k);
        Ok(FieldElement {
            field: Arc::clone(&self.field),
            coeffs: self.coeffs.iter().map(|c| c * &k).collect(),
        })
    }

    fn sign(&self) -> Result<Ordering> {
        if self.coeffs.iter().all(|c| c.is_zero()) {
            return Ok(Ordering::Equal);
        }
        for bits in PRECISION_LADDER {
            if let Some(s) = self.decided(&self.field.enclosure(bits), bits) {
                return Ok(s);
            }
        }
        let common = poly_gcd(&self.coeffs, &self.field.poly);
        if common.len() > 1 && self.field.is_root_of(&common) {
            return Ok(Ordering::Equal);
        }
        // Nonzero, so enough precision decides it.
        let mut bits = ROOT_BITS;
        let mut enclosure = self.field.enclosure(bits);
        while bits < MAX_BITS {
            enclosure = self.field.refine(enclosure, bits, 2 * bits);
            bits *= 2;
            if let Some(s) = self.decided(&enclosure, bits) {
                tracing::trace!(bits, "sign needed refinement past the root precision");
                return Ok(s);
            }
        }
        Err(FlipperError::approximation(format!(
            "sign of a nonzero element not resolved at {MAX_BITS} bits"
        )))
    }

    fn to_f64(&self) -> f64 {
        let widest = self.coeffs.iter().map(|c| c.bits()).max().unwrap_or(0);
        let bits = (widest + 80).clamp(128, ROOT_BITS);
        let (lo, hi) = self.interval(&self.field.enclosure(bits), bits);
        let top = self.coeffs.len().saturating_sub(1) as u64;
        dyadic_to_f64(&(lo + hi), bits * top + 1)
    }
}

/// Perron–Frobenius eigenvectors with entries in `Z[λ]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlgebraicCapability;

impl NumberCapability for AlgebraicCapability {
    type Number = FieldElement;

    fn perron_frobenius(&self, action: &IntMatrix) -> Result<(Vec<FieldElement>, FieldElement)> {
        let n = action.nrows();
        if n == 0 || action.ncols() != n {
            return Err(FlipperError::assumption("Perron–Frobenius needs a square matrix"));
        }
        let (poly, adjugate) = faddeev_leverrier(action);
        let (estimate, radius) = dominant_eigenvalue(&spectrum(action, &poly)?)?;
        let field = NumberField::new(poly, estimate, radius)?;

        // Columns of adj(λI − A) = Σ_k M_k λ^{n−k} are λ-eigenvectors.
        let column = |j: usize| -> Vec<FieldElement> {
            (0..n)
                .map(|i| {
                    let mut coeffs = vec![BigInt::zero(); n];
                    for (k, m) in adjugate.iter().enumerate() {
                        coeffs[n - 1 - k] = m[i][j].clone();
                    }
                    field.element(coeffs)
                })
                .collect()
        };
        let mut best: Option<(f64, Vec<FieldElement>)> = None;
        for j in 0..n {
            let col = column(j);
            let size: f64 = col.iter().map(|x| x.to_f64().abs()).sum();
            if best.as_ref().map_or(true, |(s, _)| size > *s) {
                best = Some((size, col));
            }
        }
        let mut vector = match best {
            Some((_, col)) => col,
            None => return Err(FlipperError::assumption("empty matrix")),
        };
        let mut nonzero = false;
        for x in &vector {
            if x.sign()? != Ordering::Equal {
                nonzero = true;
                break;
            }
        }
        if !nonzero {
            return Err(FlipperError::assumption(
                "dominant eigenvalue is not simple (vanishing adjugate)",
            ));
        }
        let total = vector
            .iter()
            .cloned()
            .fold(field.integer(0), |acc, x| acc + x);
        if total.sign()? == Ordering::Less {
            vector = vector.iter().map(|x| x.mul_integer(-1)).collect::<Result<_>>()?;
        }
        tracing::trace!(degree = field.degree(), root = field.root_f64(), "perron_frobenius");
        Ok((vector, field.generator()))
    }
}

/// Float eigenvalues of `action`, whose characteristic polynomial is `poly`.
///
/// Tries the matrix, its transpose and the companion matrix of `poly` in turn;
/// all share one spectrum but not the same Schur iteration.
fn spectrum(action: &IntMatrix, poly: &[BigInt]) -> Result<Vec<Complex<f64>>> {
    let n = action.nrows();
    let m: DMatrix<f64> = action.map(|x| x as f64);
    let companion = DMatrix::from_fn(n, n, |i, j| {
        if j + 1 == n {
            -ToPrimitive::to_f64(&poly[i]).unwrap_or(f64::NAN)
        } else if i == j + 1 {
            1.0
        } else {
            0.0
        }
    });
    let candidates = [m.transpose(), companion];
    for (attempt, candidate) in std::iter::once(m).chain(candidates).enumerate() {
        if let Some(schur) = Schur::try_new(candidate, f64::EPSILON, SCHUR_MAX_ITERATIONS) {
            return Ok(schur.complex_eigenvalues().iter().copied().collect());
        }
        tracing::trace!(attempt, size = n, "Schur iteration did not converge");
    }
    Err(FlipperError::computation("eigenvalue iteration did not converge"))
}

/// Dominant eigenvalue (and a root-isolation radius) from the float spectrum.
fn dominant_eigenvalue(eig: &[Complex<f64>]) -> Result<(f64, f64)> {
    let n = eig.len();
    let mut idx = 0;
    for i in 1..n {
        if eig[i].norm() > eig[idx].norm() {
            idx = i;
        }
    }
    let lambda = eig[idx];
    let norm = lambda.norm();
    let tol = 1e-9 * norm.max(1.0);
    if !norm.is_finite() || lambda.im.abs() > tol || lambda.re <= 0.0 {
        return Err(FlipperError::assumption(
            "dominant eigenvalue is not a positive real",
        ));
    }
    let mut gap = f64::INFINITY;
    for i in (0..n).filter(|&i| i != idx) {
        if eig[i].norm() > norm - tol {
            return Err(FlipperError::assumption("dominant eigenvalue is not strictly dominant"));
        }
        gap = gap.min((eig[i] - lambda).norm());
    }
    let radius = (gap / 4.0).min(lambda.re / 2.0).min(0.5);
    Ok((lambda.re, radius))
}

/// Drop leading zero coefficients; the zero polynomial becomes empty.
fn trimmed(mut p: Vec<BigRational>) -> Vec<BigRational> {
    while p.last().is_some_and(|c| c.is_zero()) {
        p.pop();
    }
    p
}

/// Remainder of `a` by a nonzero `b`.
fn poly_rem(mut a: Vec<BigRational>, b: &[BigRational]) -> Vec<BigRational> {
    let db = b.len() - 1;
    while a.len() > db {
        let da = a.len() - 1;
        let q = &a[da] / &b[db];
        for (i, c) in b.iter().enumerate() {
            a[da - db + i] -= &q * c;
        }
        a = trimmed(a);
    }
    a
}

/// `gcd(a, b)` over `Q` with denominators cleared, low degree first.
fn poly_gcd(a: &[BigInt], b: &[BigInt]) -> Vec<BigInt> {
    let rational = |p: &[BigInt]| -> Vec<BigRational> {
        trimmed(p.iter().cloned().map(BigRational::from_integer).collect())
    };
    let (mut a, mut b) = (rational(a), rational(b));
    while !b.is_empty() {
        let r = poly_rem(a, &b);
        a = b;
        b = r;
    }
    let scale = BigRational::from_integer(a.iter().fold(BigInt::one(), |acc, c| acc * c.denom()));
    a.iter().map(|c| (c * &scale).to_integer()).collect()
}

/// Characteristic polynomial (low degree first) and the adjugate coefficient
/// matrices `M_1 … M_n` with `adj(xI − A) = Σ_k M_k x^{n−k}`.
fn faddeev_leverrier(action: &IntMatrix) -> (Vec<BigInt>, Vec<Vec<Vec<BigInt>>>) {
    let n = action.nrows();
    let a: Vec<Vec<BigInt>> = (0..n)
        .map(|i| (0..n).map(|j| BigInt::from(action[(i, j)])).collect())
        .collect();
    let matmul = |x: &Vec<Vec<BigInt>>, y: &Vec<Vec<BigInt>>| -> Vec<Vec<BigInt>> {
        (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| {
                        let mut acc = BigInt::zero();
                        for k in 0..n {
                            if !x[i][k].is_zero() && !y[k][j].is_zero() {
                                acc += &x[i][k] * &y[k][j];
                            }
                        }
                        acc
                    })
                    .collect()
            })
            .collect()
    };
    let mut c = vec![BigInt::one()];
    let mut ms: Vec<Vec<Vec<BigInt>>> = Vec::with_capacity(n);
    let mut am = vec![vec![BigInt::zero(); n]; n];
    for k in 1..=n {
        let mut m = am.clone();
        for (i, row) in m.iter_mut().enumerate() {
            row[i] += &c[k - 1];
        }
        am = matmul(&a, &m);
        let trace: BigInt = (0..n).map(|i| am[i][i].clone()).sum();
        c.push(-trace / BigInt::from(k));
        ms.push(m);
    }
    // p(x) = Σ c_k x^{n−k}; store low degree first.
    let poly = c.into_iter().rev().collect();
    (poly, ms)
}
