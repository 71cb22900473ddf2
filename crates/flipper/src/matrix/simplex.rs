//! Exact phase-1 simplex for large reduced systems.
//!
//! Finds `y ≠ 0` with `S·y ≥ 0` (`S` has full column rank, so the cone is
//! pointed and `Σ (S·y)_i = 1` normalises any nonzero solution). Variables are
//! split `y = u − v`; slacks `t = S·y`; one artificial per row. Bland's rule
//! guarantees termination; arithmetic is `BigRational`, so the verdict is exact.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::error::{FlipperError, Result};

use super::primitive;

pub(super) fn find_ray(rows: &[Vec<i128>], w: usize) -> Result<Option<Vec<i128>>> {
    let m = rows.len();
    // Columns: u (w) | v (w) | t (m) | artificial (m + 1) | rhs.
    let (u0, v0, t0, a0) = (0, w, 2 * w, 2 * w + m);
    let width = a0 + m + 1;
    let rhs = width;
    let big = |x: i128| BigRational::from_integer(BigInt::from(x));

    let mut tab = vec![vec![BigRational::zero(); width + 1]; m + 1];
    for (i, r) in rows.iter().enumerate() {
        for k in 0..w {
            tab[i][u0 + k] = big(r[k]);
            tab[i][v0 + k] = big(-r[k]);
        }
        tab[i][t0 + i] = big(-1);
        tab[i][a0 + i] = BigRational::one();
    }
    for i in 0..m {
        tab[m][t0 + i] = BigRational::one();
    }
    tab[m][a0 + m] = BigRational::one();
    tab[m][rhs] = BigRational::one();
    let mut basis: Vec<usize> = (0..=m).map(|i| a0 + i).collect();

    // Reduced costs of "minimise Σ artificials"; cost[rhs] = −objective.
    let mut cost = vec![BigRational::zero(); width + 1];
    for row in &tab {
        for j in (0..a0).chain(std::iter::once(rhs)) {
            cost[j] -= &row[j];
        }
    }

    while let Some(enter) = (0..width).find(|&j| cost[j].is_negative()) {
        let mut leave: Option<(usize, BigRational)> = None;
        for i in 0..=m {
            if !tab[i][enter].is_positive() {
                continue;
            }
            let ratio = &tab[i][rhs] / &tab[i][enter];
            let better = match &leave {
                None => true,
                Some((l, best)) => ratio < *best || (ratio == *best && basis[i] < basis[*l]),
            };
            if better {
                leave = Some((i, ratio));
            }
        }
        // Phase 1 is bounded below by zero.
        let Some((p, _)) = leave else {
            return Err(FlipperError::computation("phase-1 simplex unbounded"));
        };
        pivot(&mut tab, &mut cost, p, enter);
        basis[p] = enter;
    }

    if !cost[rhs].is_zero() {
        return Ok(None);
    }
    let mut y = vec![BigRational::zero(); w];
    for (i, &b) in basis.iter().enumerate() {
        if b < v0 {
            y[b - u0] += &tab[i][rhs];
        } else if b < t0 {
            y[b - v0] -= &tab[i][rhs];
        }
    }
    integral(&y).map(Some)
}

fn pivot(tab: &mut [Vec<BigRational>], cost: &mut [BigRational], p: usize, q: usize) {
    let piv = tab[p][q].clone();
    for x in tab[p].iter_mut() {
        *x /= &piv;
    }
    let prow = tab[p].clone();
    for (i, row) in tab.iter_mut().enumerate() {
        if i == p || row[q].is_zero() {
            continue;
        }
        let f = row[q].clone();
        for (x, px) in row.iter_mut().zip(&prow) {
            *x -= &f * px;
        }
    }
    if !cost[q].is_zero() {
        let f = cost[q].clone();
        for (x, px) in cost.iter_mut().zip(&prow) {
            *x -= &f * px;
        }
    }
}

/// Clear denominators and reduce to a primitive `i128` vector.
fn integral(y: &[BigRational]) -> Result<Vec<i128>> {
    let lcm = y.iter().fold(BigInt::one(), |acc, q| {
        let d = q.denom();
        let g = big_gcd(&acc, d);
        acc / g * d
    });
    let mut ints: Vec<BigInt> = y.iter().map(|q| q.numer() * (&lcm / q.denom())).collect();
    let g = ints.iter().fold(BigInt::zero(), |g, x| big_gcd(&g, x));
    if !g.is_zero() && !g.is_one() {
        ints.iter_mut().for_each(|x| *x = &*x / &g);
    }
    let out: Option<Vec<i128>> = ints.iter().map(ToPrimitive::to_i128).collect();
    out.map(|v| primitive(&v))
        .ok_or_else(|| FlipperError::computation("polytope certificate exceeds i128"))
}

fn big_gcd(a: &BigInt, b: &BigInt) -> BigInt {
    let (mut a, mut b) = (a.abs(), b.abs());
    while !b.is_zero() {
        let r = &a % &b;
        a = b;
        b = r;
    }
    a
}
