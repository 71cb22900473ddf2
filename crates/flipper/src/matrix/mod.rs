//! Exact integer matrices.
//!
//! Purpose
//! - Actions and conditions of piecewise-linear maps are integer matrices
//!   (`DMatrix<i128>`); everything here is exact, nothing rounds.
//! - `nontrivial_polytope` decides whether `{x : Mx ≥ 0, x ≥ 0} ≠ {0}` and
//!   returns an integral certificate.
//!
//! Conventions
//! - A condition matrix with zero rows means "always satisfied".
//! - Vectors are applied on the right (`M·v`).

mod polytope;
mod simplex;

use std::cmp::Ordering;

use nalgebra::DMatrix;

use crate::error::Result;
use crate::number::Number;

pub use polytope::nontrivial_polytope;

pub type IntMatrix = DMatrix<i128>;

#[inline]
pub fn identity(n: usize) -> IntMatrix {
    IntMatrix::identity(n, n)
}

/// Matrix with no rows (the "always" condition).
#[inline]
pub fn empty(cols: usize) -> IntMatrix {
    IntMatrix::zeros(0, cols)
}

/// Vertical join of matrices with equal column counts.
pub fn stack(parts: &[&IntMatrix]) -> IntMatrix {
    let cols = parts.first().map_or(0, |m| m.ncols());
    debug_assert!(parts.iter().all(|m| m.ncols() == cols), "column mismatch");
    let rows: usize = parts.iter().map(|m| m.nrows()).sum();
    let mut out = IntMatrix::zeros(rows, cols);
    let mut r = 0;
    for m in parts {
        for i in 0..m.nrows() {
            for j in 0..cols {
                out[(r, j)] = m[(i, j)];
            }
            r += 1;
        }
    }
    out
}

/// Permutation matrix `P` with `(P v)[perm[i]] = v[i]`.
pub fn permutation(perm: &[usize]) -> IntMatrix {
    let n = perm.len();
    let mut p = IntMatrix::zeros(n, n);
    for (i, &j) in perm.iter().enumerate() {
        p[(j, i)] = 1;
    }
    p
}

/// `M·v` over any number type.
pub fn apply<N: Number>(m: &IntMatrix, v: &[N]) -> Result<Vec<N>> {
    debug_assert_eq!(m.ncols(), v.len());
    let zero = v[0].zero_like();
    (0..m.nrows())
        .map(|i| {
            let mut acc = zero.clone();
            for (j, x) in v.iter().enumerate() {
                let c = m[(i, j)];
                if c == 1 {
                    acc = acc + x.clone();
                } else if c == -1 {
                    acc = acc - x.clone();
                } else if c != 0 {
                    acc = acc + x.mul_integer(c)?;
                }
            }
            Ok(acc)
        })
        .collect()
}

/// `condition·v ≥ 0` row-wise.
pub fn satisfies<N: Number>(condition: &IntMatrix, v: &[N]) -> Result<bool> {
    for x in apply(condition, v)? {
        if x.sign()? == Ordering::Less {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Bareiss fraction-free elimination; exact for any integer matrix.
pub fn determinant(m: &IntMatrix) -> i128 {
    let n = m.nrows();
    assert_eq!(n, m.ncols(), "determinant of a non-square matrix");
    let mut a: Vec<Vec<i128>> = (0..n).map(|i| (0..n).map(|j| m[(i, j)]).collect()).collect();
    determinant_rows(&mut a)
}

pub(crate) fn determinant_rows(a: &mut [Vec<i128>]) -> i128 {
    let n = a.len();
    if n == 0 {
        return 1;
    }
    let mut sign = 1;
    let mut prev = 1;
    for k in 0..n - 1 {
        if a[k][k] == 0 {
            match (k + 1..n).find(|&i| a[i][k] != 0) {
                Some(i) => {
                    a.swap(i, k);
                    sign = -sign;
                }
                None => return 0,
            }
        }
        for i in k + 1..n {
            for j in k + 1..n {
                a[i][j] = (a[i][j] * a[k][k] - a[i][k] * a[k][j]) / prev;
            }
        }
        prev = a[k][k];
    }
    sign * a[n - 1][n - 1]
}

pub fn gcd(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Divide by the gcd of the entries (no-op on the zero vector).
pub fn primitive(v: &[i128]) -> Vec<i128> {
    let g = v.iter().fold(0, |g, &x| gcd(g, x));
    if g <= 1 {
        v.to_vec()
    } else {
        v.iter().map(|x| x / g).collect()
    }
}
