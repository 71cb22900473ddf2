//! Isometries between triangulations and the breadth-first matcher.
//!
//! An isometry sends every triangle to a triangle with a cyclic rotation
//! (side `i` ↦ side `(i + r) % 3`); the edge map is derived from it.
//! The matcher fixes the image of triangle 0 (every target triangle, every
//! rotation) and propagates across glued sides with a worklist. The `seen`
//! table is indexed by triangle id.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{FlipperError, Result};

use super::{Corner, Edge, Slot, Triangulation};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Isometry {
    source: Arc<Triangulation>,
    target: Arc<Triangulation>,
    /// Source triangle ↦ (target triangle, rotation).
    triangle_map: Vec<(usize, usize)>,
    edge_map: Vec<Edge>,
}

/// Record `value` at `slot`, or check that it is already there.
fn safe_assign<T: Copy + PartialEq>(slot: &mut Option<T>, value: T) -> bool {
    match slot {
        Some(old) => *old == value,
        None => {
            *slot = Some(value);
            true
        }
    }
}

impl Isometry {
    /// Derive the edge map of `triangle_map`; `Assumption` error unless it is
    /// a consistent bijection on triangles and on edges.
    pub fn new(
        source: Arc<Triangulation>,
        target: Arc<Triangulation>,
        triangle_map: Vec<(usize, usize)>,
    ) -> Result<Self> {
        let n = source.num_triangles();
        if target.num_triangles() != n || triangle_map.len() != n {
            return Err(FlipperError::assumption("triangle counts differ"));
        }
        let mut hit = vec![false; n];
        let mut edge_map: Vec<Option<Edge>> = vec![None; source.zeta()];
        for (t, &(u, r)) in triangle_map.iter().enumerate() {
            if u >= n || r >= 3 || std::mem::replace(&mut hit[u], true) {
                return Err(FlipperError::assumption("triangle map is not a bijection"));
            }
            for i in 0..3 {
                let image = target.triangles()[u][(i + r) % 3];
                if !safe_assign(&mut edge_map[source.triangles()[t][i]], image) {
                    return Err(FlipperError::assumption("edge map is not well defined"));
                }
            }
        }
        let edge_map: Vec<Edge> = edge_map.into_iter().flatten().collect();
        let mut image_hit = vec![false; target.zeta()];
        for &e in &edge_map {
            if std::mem::replace(&mut image_hit[e], true) {
                return Err(FlipperError::assumption("edge map is not injective"));
            }
        }
        Ok(Self {
            source,
            target,
            triangle_map,
            edge_map,
        })
    }

    /// The identity of `t`.
    pub fn identity(t: Arc<Triangulation>) -> Self {
        Self {
            triangle_map: (0..t.num_triangles()).map(|i| (i, 0)).collect(),
            edge_map: (0..t.zeta()).collect(),
            source: t.clone(),
            target: t,
        }
    }

    #[inline]
    pub fn source(&self) -> &Arc<Triangulation> {
        &self.source
    }
    #[inline]
    pub fn target(&self) -> &Arc<Triangulation> {
        &self.target
    }
    #[inline]
    pub fn edge_map(&self) -> &[Edge] {
        &self.edge_map
    }
    #[inline]
    pub fn triangle_map(&self) -> &[(usize, usize)] {
        &self.triangle_map
    }

    pub fn map_corner(&self, c: Corner) -> Corner {
        let (u, r) = self.triangle_map[c.triangle];
        Corner::new(u, (c.side + r) % 3)
    }

    /// Push weights forward: `out[edge_map[i]] = w[i]`.
    pub fn apply<N: Clone>(&self, w: &[N]) -> Vec<N> {
        let mut out = w.to_vec();
        for (i, x) in w.iter().enumerate() {
            out[self.edge_map[i]] = x.clone();
        }
        out
    }

    pub fn inverse(&self) -> Self {
        let mut triangle_map = vec![(0, 0); self.triangle_map.len()];
        for (t, &(u, r)) in self.triangle_map.iter().enumerate() {
            triangle_map[u] = (t, (3 - r) % 3);
        }
        let mut edge_map = vec![0; self.edge_map.len()];
        for (e, &f) in self.edge_map.iter().enumerate() {
            edge_map[f] = e;
        }
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
            triangle_map,
            edge_map,
        }
    }

    /// `self ∘ first`: apply `first`, then `self`.
    pub fn after(&self, first: &Isometry) -> Result<Self> {
        if first.target != self.source {
            return Err(FlipperError::assumption("isometries do not compose"));
        }
        let triangle_map = first
            .triangle_map
            .iter()
            .map(|&(u, r)| {
                let (v, s) = self.triangle_map[u];
                (v, (r + s) % 3)
            })
            .collect();
        Ok(Self {
            source: first.source.clone(),
            target: self.target.clone(),
            triangle_map,
            edge_map: first.edge_map.iter().map(|&e| self.edge_map[e]).collect(),
        })
    }
}

impl Triangulation {
    /// All isometries `self → other`.
    pub fn find_isometries(self: &Arc<Self>, other: &Arc<Self>) -> Vec<Isometry> {
        self.find_isometries_filtered(other, |_, _| true)
    }

    /// Isometries whose every corner pairing passes `keep(source, target)`.
    pub fn find_isometries_filtered<F>(self: &Arc<Self>, other: &Arc<Self>, keep: F) -> Vec<Isometry>
    where
        F: Fn(Corner, Corner) -> bool,
    {
        let n = self.num_triangles();
        if n != other.num_triangles() || self.zeta() != other.zeta() {
            return Vec::new();
        }
        let mut out = Vec::new();
        for start in 0..n {
            for rotation in 0..3 {
                let Some(map) = self.propagate(other, (start, rotation), &keep) else {
                    continue;
                };
                if let Ok(iso) = Isometry::new(self.clone(), other.clone(), map) {
                    out.push(iso);
                }
            }
        }
        tracing::trace!(count = out.len(), triangles = n, "isometries found");
        out
    }

    /// Worklist extension of `0 ↦ start` to a full triangle map, if consistent.
    fn propagate<F>(&self, other: &Self, start: (usize, usize), keep: &F) -> Option<Vec<(usize, usize)>>
    where
        F: Fn(Corner, Corner) -> bool,
    {
        let n = self.num_triangles();
        let mut image: Vec<Option<(usize, usize)>> = vec![None; n];
        let mut edge_image: Vec<Option<Edge>> = vec![None; self.zeta()];
        image[0] = Some(start);
        let mut queue = VecDeque::from([0usize]);
        while let Some(t) = queue.pop_front() {
            let (u, r) = image[t]?;
            for i in 0..3 {
                let j = (i + r) % 3;
                if !keep(Corner::new(t, i), Corner::new(u, j)) {
                    return None;
                }
                let here = Slot::new(t, i);
                let there = Slot::new(u, j);
                if !safe_assign(&mut edge_image[self.edge_at(here)], other.edge_at(there)) {
                    return None;
                }
                let next = self.opposite_slot(here);
                let next_image = other.opposite_slot(there);
                let rot = (next_image.side + 3 - next.side) % 3;
                let fresh = image[next.triangle].is_none();
                if !safe_assign(&mut image[next.triangle], (next_image.triangle, rot)) {
                    return None;
                }
                if fresh {
                    queue.push_back(next.triangle);
                }
            }
        }
        image.into_iter().collect()
    }
}
