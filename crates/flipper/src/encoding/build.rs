//! Encodings of the two elementary moves: flips and isometries.

use std::sync::Arc;

use crate::error::{FlipperError, Result};
use crate::matrix::{self, IntMatrix};
use crate::triangulation::{Edge, Isometry, Triangulation};

use super::{Encoding, PartialFunction, Stage};

/// The two cells of the tropical flip rule on `t`.
///
/// With the square `(a, b, c, d)` about `e`, the first cell is
/// `w[a] + w[c] ≥ w[b] + w[d]` (new `w[e] = w[a] + w[c] − w[e]`), the second
/// its complement. Both actions are unimodular and differ from the identity
/// only in row `e`.
fn flip_cells(t: &Triangulation, e: Edge) -> Vec<PartialFunction> {
    let z = t.zeta();
    let [a, b, c, d] = t.square_about_edge(e);
    [(a, c, b, d), (b, d, a, c)]
        .into_iter()
        .map(|(p, q, r, s)| {
            let mut action = matrix::identity(z);
            action[(e, e)] = -1;
            action[(e, p)] += 1;
            action[(e, q)] += 1;
            let mut condition = IntMatrix::zeros(1, z);
            condition[(0, p)] += 1;
            condition[(0, q)] += 1;
            condition[(0, r)] -= 1;
            condition[(0, s)] -= 1;
            PartialFunction::new(action, condition)
        })
        .collect()
}

/// Flip of `e` as a one-stage encoding `t → t.flip_edge(e)`.
///
/// Panics if `e` is not flippable.
pub fn encode_flip(t: &Arc<Triangulation>, e: Edge) -> Encoding {
    let target = Arc::new(t.flip_edge(e));
    Encoding::from_stage(Stage {
        forward: flip_cells(t, e),
        backward: flip_cells(&target, e),
        source: t.clone(),
        target,
    })
}

/// Flips of `edges` in order; `Assumption` error at the first edge that is
/// not flippable in the current triangulation.
pub fn encode_flips(t: &Arc<Triangulation>, edges: &[Edge]) -> Result<Encoding> {
    let mut out = Encoding::identity(t.clone());
    for &e in edges {
        let current = out.target().clone();
        if e >= current.zeta() || !current.is_flippable(e) {
            return Err(FlipperError::assumption(format!("edge {e} is not flippable")));
        }
        out = &encode_flip(&current, e) * &out;
    }
    Ok(out)
}

/// Relabelling by an isometry: a single unconditional cell each way.
pub fn encode_isometry(iso: &Isometry) -> Encoding {
    let p = matrix::permutation(iso.edge_map());
    let back = p.transpose();
    Encoding::from_stage(Stage {
        source: iso.source().clone(),
        target: iso.target().clone(),
        forward: vec![PartialFunction::linear(p)],
        backward: vec![PartialFunction::linear(back)],
    })
}
