//! Laminations whose punctures remember whether they are real.
//!
//! Puncturing adds artificial vertices inside trigons; later collapses may
//! merge an artificial vertex into a real one but never two real ones. Only
//! tag-preserving isometries count when matching states.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::{FlipperError, Result};
use crate::lamination::Lamination;
use crate::number::{compare, is_zero, sum, Number};
use crate::triangulation::{Corner, Edge, Isometry, Triangle, Triangulation};

/// Isometry-invariant hash key of a projective lamination.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(super) struct Key {
    edges: usize,
    real: usize,
    ratios: Vec<i64>,
}

#[derive(Clone, Debug)]
pub(super) struct Tagged<N> {
    pub(super) lamination: Lamination<N>,
    /// Per vertex of the current triangulation.
    pub(super) real: Vec<bool>,
}

impl<N: Number> Lamination<N> {
    /// Add a vertex inside every triangle the lamination meets in a trigon
    /// (all three dual weights positive), with three spokes to its corners.
    ///
    /// Old weights are doubled; the spoke to a corner carries that corner's
    /// dual weight `b + c − a`. Returns the new lamination and, per vertex,
    /// whether it was there before. Nothing changes if there is no trigon.
    pub fn puncture_trigons(&self) -> Result<(Lamination<N>, Vec<bool>)> {
        let t = self.triangulation();
        let z = t.zeta();
        let mut trigons = Vec::new();
        for i in 0..t.num_triangles() {
            let mut all = true;
            for s in 0..3 {
                if t.corner_dual(Corner::new(i, s), self.weights()).sign()? != Ordering::Greater {
                    all = false;
                    break;
                }
            }
            if all {
                trigons.push(i);
            }
        }
        if trigons.is_empty() {
            return Ok((self.clone(), vec![true; t.num_vertices()]));
        }

        let mut weights: Vec<N> = self.weights().iter().map(|w| w.clone() + w.clone()).collect();
        let mut raw: Vec<Triangle> = Vec::with_capacity(t.num_triangles() + 2 * trigons.len());
        let mut next = 0;
        for (i, &tri) in t.triangles().iter().enumerate() {
            if trigons.get(next) != Some(&i) {
                raw.push(tri);
                continue;
            }
            let spoke = [z + 3 * next, z + 3 * next + 1, z + 3 * next + 2];
            for s in 0..3 {
                weights.push(t.corner_dual(Corner::new(i, s), self.weights()));
                raw.push([tri[s], spoke[(s + 2) % 3], spoke[(s + 1) % 3]]);
            }
            next += 1;
        }
        let punctured = Arc::new(Triangulation::new(raw));
        // A new vertex sees nothing but spokes.
        let real = punctured
            .vertex_classes()
            .iter()
            .map(|class| class.iter().any(|&c| punctured.edge_at(c.leaving()) < z))
            .collect();
        tracing::debug!(trigons = trigons.len(), "punctured trigons");
        Ok((Lamination::new(punctured, weights), real))
    }

    /// Fold away an edge of weight zero by shrinking it to a point.
    ///
    /// Returns the folded lamination and where each old vertex went.
    /// `Assumption` error if the weight is not zero or the edge cannot be
    /// contracted (the lamination is not filling).
    pub fn collapse_trivial_weight(&self, e: Edge) -> Result<(Lamination<N>, Vec<usize>)> {
        if !is_zero(self.weight(e))? {
            return Err(FlipperError::assumption("edge weight is not zero"));
        }
        let t = self.triangulation();
        let (folded, labels, vertex_map) = t
            .contract_edge_tracked(e)
            .ok_or_else(|| FlipperError::assumption("lamination is not filling"))?;
        let mut weights: Vec<Option<N>> = vec![None; folded.zeta()];
        for (f, label) in labels.iter().enumerate() {
            if let Some(l) = *label {
                weights[l].get_or_insert_with(|| self.weight(f).clone());
            }
        }
        let weights = weights
            .into_iter()
            .collect::<Option<Vec<N>>>()
            .ok_or_else(|| FlipperError::computation("folded edge lost its weight"))?;
        Ok((Lamination::new(Arc::new(folded), weights), vertex_map))
    }
}

impl<N: Number> Tagged<N> {
    /// Checks every weight is nonzero, then punctures trigons.
    pub(super) fn start(l: &Lamination<N>) -> Result<Self> {
        for w in l.weights() {
            if is_zero(w)? {
                return Err(FlipperError::assumption(
                    "lamination has a zero weight and is not filling",
                ));
            }
        }
        let (lamination, real) = l.puncture_trigons()?;
        Ok(Self { lamination, real })
    }

    /// Heaviest flippable edge, smallest label on ties.
    pub(super) fn heaviest_flippable(&self) -> Result<Edge> {
        let t = self.lamination.triangulation();
        let mut best: Option<Edge> = None;
        for e in (0..t.zeta()).filter(|&e| t.is_flippable(e)) {
            let heavier = match best {
                None => true,
                Some(b) => {
                    compare(self.lamination.weight(e), self.lamination.weight(b))?
                        == Ordering::Greater
                }
            };
            if heavier {
                best = Some(e);
            }
        }
        best.ok_or_else(|| FlipperError::assumption("no flippable edge"))
    }

    pub(super) fn flip(&self, e: Edge) -> Result<Self> {
        let t = self.lamination.triangulation();
        let weights = t.flip_effect(e, self.lamination.weights())?;
        let (flipped, vertex_map) = t.flip_edge_tracked(e);
        let mut real = vec![false; self.real.len()];
        for (v, &r) in self.real.iter().enumerate() {
            real[vertex_map[v]] = r;
        }
        Ok(Self {
            lamination: Lamination::new(Arc::new(flipped), weights),
            real,
        })
    }

    pub(super) fn collapse(&self, e: Edge) -> Result<Self> {
        let [u, v] = self.lamination.triangulation().edge_ends(e);
        if u != v && self.real[u] && self.real[v] {
            return Err(FlipperError::assumption(
                "collapse would merge two punctures; lamination is not filling",
            ));
        }
        let (lamination, vertex_map) = self.lamination.collapse_trivial_weight(e)?;
        let mut real = vec![false; lamination.triangulation().num_vertices()];
        for (old, &r) in self.real.iter().enumerate() {
            real[vertex_map[old]] |= r;
        }
        Ok(Self { lamination, real })
    }

    pub(super) fn key(&self, resolution: i64) -> Result<Key> {
        let weights = self.lamination.weights();
        let total = self.lamination.total();
        let mut ratios = weights
            .iter()
            .map(|w| w.projective_key(&total, resolution))
            .collect::<Result<Vec<i64>>>()?;
        ratios.sort_unstable();
        Ok(Key {
            edges: weights.len(),
            real: self.real.iter().filter(|&&r| r).count(),
            ratios,
        })
    }

    /// Tag-preserving isometries `self → old` carrying the weights to a
    /// multiple of `old`'s.
    pub(super) fn matches(&self, old: &Self) -> Result<Vec<Isometry>> {
        let here = self.lamination.triangulation();
        let there = old.lamination.triangulation();
        let same_tag = |a: Corner, b: Corner| self.real[here.vertex_of(a)] == old.real[there.vertex_of(b)];
        let mut out = Vec::new();
        for iso in here.find_isometries_filtered(there, same_tag) {
            let mapped = iso.apply(self.lamination.weights());
            if projectively_equal(&mapped, old.lamination.weights())? {
                out.push(iso);
            }
        }
        Ok(out)
    }
}

/// `a = μ·b` for some positive `μ`, decided exactly.
pub(super) fn projectively_equal<N: Number>(a: &[N], b: &[N]) -> Result<bool> {
    let (Some(sa), Some(sb)) = (sum(a), sum(b)) else {
        return Ok(a.is_empty() && b.is_empty());
    };
    for (x, y) in a.iter().zip(b) {
        if compare(&(x.clone() * sb.clone()), &(y.clone() * sa.clone()))? != Ordering::Equal {
            return Ok(false);
        }
    }
    Ok(true)
}
