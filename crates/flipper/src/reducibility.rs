//! Branch-and-bound search for invariant multicurves.
//!
//! Purpose
//! - Decide whether a mapping class fixes some multicurve. An invariant
//!   multicurve is a nonzero integral fixed point `A·x = x` of one linear cell
//!   of the encoding that also lies in the face cone and in some marking cone.
//!
//! How
//! - The search tree has one level per stage; a node at depth `k` is a choice
//!   of cell for stages `0..k`, folded into a single `PartialFunction`.
//! - Internal nodes are pruned when `face ⊓ condition` is trivial. Leaves test
//!   `face ⊓ marking ⊓ (A − I) ⊓ (I − A) ⊓ condition` for every marking.
//! - The traversal is an explicit stack of frames (cursor + folded cell), so it
//!   can report progress and stop at any node.
//!
//! Progress
//! - A node at depth `k` covers `1 / ∏_{i<k} size_i` of the leaves; the search
//!   reports the covered fraction after every expansion and every leaf.

use std::sync::Arc;

use crate::cfg::PolytopeCfg;
use crate::encoding::{Encoding, PartialFunction};
use crate::error::{FlipperError, Result};
use crate::lamination::Lamination;
use crate::matrix::{self, nontrivial_polytope, IntMatrix};
use crate::progress::{checkpoint, Progress};
use crate::triangulation::Triangulation;

/// Outcome of an exhaustive search.
#[derive(Clone, Debug)]
pub enum Reducibility {
    /// An invariant multicurve, verified by re-application.
    Reducible(Lamination<i64>),
    /// No invariant multicurve exists.
    Irreducible,
}

impl Reducibility {
    pub fn is_reducible(&self) -> bool {
        matches!(self, Reducibility::Reducible(_))
    }
}

struct Frame {
    /// Next cell of this depth's stage to try.
    cursor: usize,
    /// Composite of the cells chosen for the stages above.
    folded: PartialFunction,
}

struct Search<'a> {
    f: &'a Encoding,
    t: Arc<Triangulation>,
    cfg: PolytopeCfg,
    /// `weight[k]`: share of the leaves below one node at depth `k`.
    weight: Vec<f64>,
    covered: f64,
    leaves: usize,
}

impl<'a> Search<'a> {
    fn new(f: &'a Encoding, cfg: PolytopeCfg) -> Self {
        let mut weight = Vec::with_capacity(f.len() + 1);
        let mut w = 1.0;
        weight.push(w);
        for i in 0..f.len() {
            w /= f.cells(i).len() as f64;
            weight.push(w);
        }
        Self {
            f,
            t: f.source().clone(),
            cfg,
            weight,
            covered: 0.0,
            leaves: 0,
        }
    }

    fn feasible(&self, folded: &PartialFunction) -> Result<bool> {
        let m = matrix::stack(&[self.t.face_matrix(), &folded.condition]);
        Ok(nontrivial_polytope(&m, self.cfg)?.is_some())
    }

    fn run(&mut self, progress: &mut dyn Progress) -> Result<Reducibility> {
        let n = self.f.len();
        let root = PartialFunction::linear(matrix::identity(self.t.zeta()));
        let mut stack = vec![Frame {
            cursor: 0,
            folded: root,
        }];
        while let Some(depth) = stack.len().checked_sub(1) {
            let top = &mut stack[depth];
            if depth == n {
                self.leaves += 1;
                if let Some(found) = self.leaf(&top.folded)? {
                    return Ok(Reducibility::Reducible(found));
                }
                self.covered += self.weight[depth];
                stack.pop();
                checkpoint(progress, self.covered)?;
                continue;
            }
            let cells = self.f.cells(depth);
            if top.cursor == cells.len() {
                stack.pop();
                continue;
            }
            let child = cells[top.cursor].after(&top.folded);
            top.cursor += 1;
            if self.feasible(&child)? {
                stack.push(Frame {
                    cursor: 0,
                    folded: child,
                });
            } else {
                self.covered += self.weight[depth + 1];
            }
            checkpoint(progress, self.covered)?;
        }
        tracing::debug!(leaves = self.leaves, stages = n, "no invariant multicurve");
        Ok(Reducibility::Irreducible)
    }

    /// A verified invariant multicurve in this cell, if any.
    fn leaf(&self, cell: &PartialFunction) -> Result<Option<Lamination<i64>>> {
        let id = matrix::identity(self.t.zeta());
        let fixed: IntMatrix = &cell.action - &id;
        let fixed_neg: IntMatrix = &id - &cell.action;
        for marking in self.t.marking_matrices() {
            let m = matrix::stack(&[
                self.t.face_matrix(),
                marking,
                &fixed,
                &fixed_neg,
                &cell.condition,
            ]);
            let Some(x) = nontrivial_polytope(&m, self.cfg)? else {
                continue;
            };
            // Doubling makes every triangle sum even.
            let weights = x
                .iter()
                .map(|&v| i64::try_from(2 * v))
                .collect::<std::result::Result<Vec<i64>, _>>()
                .map_err(|_| FlipperError::computation("certificate overflows i64"))?;
            let curve = Lamination::new(self.t.clone(), weights);
            if curve.is_multicurve() && self.f.apply(curve.weights())? == curve.weights() {
                tracing::debug!(weights = ?curve.weights(), leaves = self.leaves, "invariant multicurve");
                return Ok(Some(curve));
            }
            tracing::warn!(weights = ?curve.weights(), "polytope witness failed verification");
        }
        Ok(None)
    }
}

impl Encoding {
    /// Exhaustive search for an invariant multicurve.
    ///
    /// Never guesses: the answer is either a verified certificate or a proof
    /// by exhaustion. `Aborted` if `progress` asks to stop.
    pub fn reducibility(&self, cfg: PolytopeCfg, progress: &mut dyn Progress) -> Result<Reducibility> {
        if !self.is_mapping_class() {
            return Err(FlipperError::assumption("not a mapping class"));
        }
        Search::new(self, cfg).run(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{FnProgress, NoProgress};

    fn torus() -> Arc<Triangulation> {
        Arc::new(Triangulation::new(vec![[0, 2, 1], [0, 2, 1]]))
    }

    fn twist(t: &Arc<Triangulation>, w: &[i64], k: i64) -> Encoding {
        Lamination::new(t.clone(), w.to_vec()).encode_twist(k).unwrap()
    }

    #[test]
    fn twist_fixes_its_curve() {
        let t = torus();
        let a = twist(&t, &[1, 1, 0], 1);
        let found = a.reducibility(PolytopeCfg::default(), &mut NoProgress).unwrap();
        let Reducibility::Reducible(curve) = found else {
            panic!("twist must be reducible");
        };
        assert_eq!(curve.weights(), &[2, 2, 0][..]);
        assert_eq!(a.apply(curve.weights()).unwrap(), curve.weights());
        assert!(curve.is_multicurve());
    }

    #[test]
    fn cat_map_is_irreducible_and_reports_progress() {
        let t = torus();
        let f = &twist(&t, &[1, 1, 0], 1) * &twist(&t, &[0, 1, 1], -1);
        let mut seen: Vec<f64> = Vec::new();
        let mut progress = FnProgress {
            report: |x: f64| seen.push(x),
            abort: || false,
        };
        let found = f.reducibility(PolytopeCfg::default(), &mut progress).unwrap();
        assert!(!found.is_reducible());
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!((seen.last().copied().unwrap_or(0.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn simplex_path_agrees() {
        let t = torus();
        let f = &twist(&t, &[1, 1, 0], 1) * &twist(&t, &[0, 1, 1], -1);
        let cfg = PolytopeCfg { enumeration_limit: 0 };
        assert!(!f.reducibility(cfg, &mut NoProgress).unwrap().is_reducible());
        let a = twist(&t, &[0, 1, 1], 2);
        assert!(a.reducibility(cfg, &mut NoProgress).unwrap().is_reducible());
    }

    #[test]
    fn search_can_be_aborted() {
        let t = torus();
        let f = &twist(&t, &[1, 1, 0], 1) * &twist(&t, &[0, 1, 1], -1);
        let mut progress = FnProgress {
            report: |_: f64| {},
            abort: || true,
        };
        assert_eq!(
            f.reducibility(PolytopeCfg::default(), &mut progress).unwrap_err(),
            FlipperError::Aborted
        );
    }

    #[test]
    fn disjoint_twists_on_s_1_2() {
        let t = Arc::new(Triangulation::new(vec![[0, 2, 1], [0, 4, 3], [2, 5, 4], [1, 3, 5]]));
        let a = twist(&t, &[1, 1, 0, 1, 0, 0], 1);
        let c = twist(&t, &[1, 1, 0, 0, 1, 1], -1);
        let Reducibility::Reducible(curve) = (&a * &c)
            .reducibility(PolytopeCfg::default(), &mut NoProgress)
            .unwrap()
        else {
            panic!("product of disjoint twists must be reducible");
        };
        assert_eq!((&a * &c).apply(curve.weights()).unwrap(), curve.weights());
    }
}
