//! Nontriviality of `{x : Mx ≥ 0, x ≥ 0}`.
//!
//! Why
//! - Reducibility asks, for every leaf of its search tree, whether a cone cut
//!   out by a few dozen integer inequalities contains a nonzero point. The answer
//!   must be exact and come with an integral witness.
//!
//! How
//! - The rows `x ≥ 0` are added to `M`, so the system matrix always has full
//!   column rank and the cone is pointed. A pointed cone is nontrivial iff it
//!   has an extreme ray, and every extreme ray is the kernel of `w − 1`
//!   independent rows of the (reduced) system.
//! - Equalities (row pairs `r`, `−r`) are eliminated first by an integral
//!   substitution `y = E z`; this keeps `w` small and the enumeration cheap.
//! - Small systems enumerate row subsets and read the kernel ray off signed
//!   cofactors. Large ones go to the exact simplex in `simplex.rs`.

use crate::cfg::PolytopeCfg;
use crate::error::Result;

use super::{determinant_rows, primitive, simplex, IntMatrix};

/// Some nonzero integral `x` with `m·x ≥ 0` and `x ≥ 0`, or `None` if only
/// `x = 0` qualifies.
pub fn nontrivial_polytope(m: &IntMatrix, cfg: PolytopeCfg) -> Result<Option<Vec<i128>>> {
    let n = m.ncols();
    if n == 0 {
        return Ok(None);
    }
    let mut rows: Vec<Vec<i128>> = (0..m.nrows())
        .map(|i| (0..n).map(|j| m[(i, j)]).collect())
        .collect();
    for i in 0..n {
        let mut unit = vec![0; n];
        unit[i] = 1;
        rows.push(unit);
    }
    // Row i of `basis` expresses x_i in the current variables y.
    let mut basis: Vec<Vec<i128>> = (0..n)
        .map(|i| (0..n).map(|j| i128::from(i == j)).collect())
        .collect();
    let mut w = n;
    normalise(&mut rows);

    while let Some((r, j)) = find_equality(&rows) {
        rows = rows.iter().map(|s| substitute(s, &r, j)).collect();
        basis = basis.iter().map(|b| substitute(b, &r, j)).collect();
        w -= 1;
        normalise(&mut rows);
        if w == 0 {
            return Ok(None);
        }
    }

    let y = if w == 1 {
        [1i128, -1]
            .into_iter()
            .map(|s| vec![s])
            .find(|y| satisfied(&rows, y))
    } else if subsets(rows.len(), w - 1) <= cfg.enumeration_limit {
        enumerate_rays(&rows, w)
    } else {
        simplex::find_ray(&rows, w)?
    };

    Ok(y.map(|y| {
        let x: Vec<i128> = basis
            .iter()
            .map(|b| b.iter().zip(&y).map(|(p, q)| p * q).sum())
            .collect();
        primitive(&x)
    }))
}

/// Divide each row by its content, drop zero rows and duplicates.
fn normalise(rows: &mut Vec<Vec<i128>>) {
    for r in rows.iter_mut() {
        *r = primitive(r);
    }
    rows.retain(|r| r.iter().any(|&x| x != 0));
    rows.sort();
    rows.dedup();
}

/// A row `r` whose negation is also present, with a pivot column `j` such
/// that `r[j] > 0`.
fn find_equality(rows: &[Vec<i128>]) -> Option<(Vec<i128>, usize)> {
    for r in rows {
        let neg: Vec<i128> = r.iter().map(|x| -x).collect();
        if rows.binary_search(&neg).is_ok() {
            let j = r.iter().position(|&x| x != 0)?;
            let r = if r[j] > 0 { r.clone() } else { neg };
            return Some((r, j));
        }
    }
    None
}

/// Row `s` under `y_k = r_j z_k (k ≠ j)`, `y_j = −Σ_{k≠j} r_k z_k`.
fn substitute(s: &[i128], r: &[i128], j: usize) -> Vec<i128> {
    (0..s.len())
        .filter(|&k| k != j)
        .map(|k| s[k] * r[j] - s[j] * r[k])
        .collect()
}

fn satisfied(rows: &[Vec<i128>], y: &[i128]) -> bool {
    rows.iter()
        .all(|r| r.iter().zip(y).map(|(a, b)| a * b).sum::<i128>() >= 0)
}

/// `C(m, k)`, saturating.
fn subsets(m: usize, k: usize) -> u64 {
    if k > m {
        return 0;
    }
    let k = k.min(m - k) as u64;
    let m = m as u64;
    let mut c: u64 = 1;
    for i in 0..k {
        c = match c.checked_mul(m - i) {
            Some(v) => v / (i + 1),
            None => return u64::MAX,
        };
    }
    c
}

fn enumerate_rays(rows: &[Vec<i128>], w: usize) -> Option<Vec<i128>> {
    let k = w - 1;
    let mut pick: Vec<usize> = (0..k).collect();
    loop {
        let ray = cofactor_ray(rows, &pick, w);
        if ray.iter().any(|&x| x != 0) {
            let ray = primitive(&ray);
            if satisfied(rows, &ray) {
                return Some(ray);
            }
            let neg: Vec<i128> = ray.iter().map(|x| -x).collect();
            if satisfied(rows, &neg) {
                return Some(neg);
            }
        }
        // Next k-subset in lexicographic order.
        let mut i = k;
        loop {
            if i == 0 {
                return None;
            }
            i -= 1;
            if pick[i] < rows.len() - k + i {
                break;
            }
        }
        pick[i] += 1;
        for l in i + 1..k {
            pick[l] = pick[l - 1] + 1;
        }
    }
}

/// Kernel vector of the chosen `w − 1` rows: `ray_c = (−1)^c det(rows without column c)`.
fn cofactor_ray(rows: &[Vec<i128>], pick: &[usize], w: usize) -> Vec<i128> {
    let mut ray = Vec::with_capacity(w);
    for c in 0..w {
        let mut minor: Vec<Vec<i128>> = pick
            .iter()
            .map(|&i| {
                rows[i]
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != c)
                    .map(|(_, &x)| x)
                    .collect()
            })
            .collect();
        let d = determinant_rows(&mut minor);
        ray.push(if c % 2 == 0 { d } else { -d });
    }
    ray
}
