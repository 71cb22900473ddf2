//! Ideal triangulations of punctured surfaces.
//!
//! Purpose
//! - Immutable combinatorial surface: a list of triangles over shared edge
//!   labels, each label glued in exactly two slots.
//! - Edge flips (pure, old → new), corner classes (the punctures), isometry
//!   search, and the integer matrices the reducibility search consumes.
//!
//! Why this design
//! - Triangles are stored in a canonical order (each rotated to its
//!   lexicographically least form, the list sorted), so structural equality is
//!   plain `==` and flipping an edge twice gives back an equal value.
//! - Derived data is computed at most once per value (`OnceLock`); values are
//!   shared through `Arc`, so every flip target keeps its own memo.
//!
//! Layout
//! - `types`: `Edge`, `Triangle`, `Slot`, `Corner`.
//! - `isometry`: `Isometry` and the breadth-first matcher.
//! - `matrices`: face and marking matrices, key curves, multicurve test.

mod isometry;
mod matrices;
mod types;

use std::cmp::Ordering;
use std::sync::OnceLock;

use crate::error::Result;
use crate::matrix::IntMatrix;
use crate::number::{max_of, Number};
use crate::util::UnionFind;

pub use isometry::Isometry;
pub use types::{Corner, Edge, Slot, Triangle};

#[derive(Clone, Debug)]
pub struct Triangulation {
    triangles: Vec<Triangle>,
    slots: Vec<[Slot; 2]>,
    vertices: OnceLock<Vertices>,
    face: OnceLock<IntMatrix>,
    markings: OnceLock<Vec<IntMatrix>>,
    key_curves: OnceLock<Vec<Vec<i64>>>,
}

/// Corner classes in walk order, and the class of every corner.
#[derive(Clone, Debug)]
struct Vertices {
    classes: Vec<Vec<Corner>>,
    of: Vec<[usize; 3]>,
}

impl PartialEq for Triangulation {
    fn eq(&self, other: &Self) -> bool {
        self.triangles == other.triangles
    }
}

impl Eq for Triangulation {}

impl std::hash::Hash for Triangulation {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.triangles.hash(state)
    }
}

/// Least rotation of `t`, with `r` such that `rotated[k] = t[(k + r) % 3]`.
fn least_rotation(t: Triangle) -> (Triangle, usize) {
    (0..3)
        .map(|r| ([t[r], t[(r + 1) % 3], t[(r + 2) % 3]], r))
        .min()
        .unwrap_or((t, 0))
}

impl Triangulation {
    /// Panics unless every label `0..ζ` occurs exactly twice.
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self::build(triangles).0
    }

    /// Canonical triangulation plus, for every input triangle, its new index
    /// and rotation `r` (input side `s` becomes side `(s + 3 − r) % 3`).
    fn build(raw: Vec<Triangle>) -> (Self, Vec<(usize, usize)>) {
        assert!(!raw.is_empty(), "triangulation needs at least one triangle");
        assert!(raw.len() % 2 == 0, "odd number of triangles");
        let zeta = 3 * raw.len() / 2;
        let mut count = vec![0usize; zeta];
        for &e in raw.iter().flatten() {
            assert!(e < zeta, "edge label {e} out of range 0..{zeta}");
            count[e] += 1;
        }
        assert!(
            count.iter().all(|&c| c == 2),
            "every edge label must occur exactly twice"
        );

        let mut order: Vec<(Triangle, usize, usize)> = raw
            .iter()
            .enumerate()
            .map(|(i, &t)| {
                let (c, r) = least_rotation(t);
                (c, i, r)
            })
            .collect();
        order.sort();
        let mut provenance = vec![(0, 0); raw.len()];
        for (n, &(_, i, r)) in order.iter().enumerate() {
            provenance[i] = (n, r);
        }
        let triangles: Vec<Triangle> = order.into_iter().map(|(t, _, _)| t).collect();

        let mut found: Vec<Vec<Slot>> = vec![Vec::with_capacity(2); zeta];
        for (t, tri) in triangles.iter().enumerate() {
            for (s, &e) in tri.iter().enumerate() {
                found[e].push(Slot::new(t, s));
            }
        }
        let slots = found.into_iter().map(|v| [v[0], v[1]]).collect();

        let out = Self {
            triangles,
            slots,
            vertices: OnceLock::new(),
            face: OnceLock::new(),
            markings: OnceLock::new(),
            key_curves: OnceLock::new(),
        };
        (out, provenance)
    }

    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }
    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }
    /// Number of edges ζ.
    #[inline]
    pub fn zeta(&self) -> usize {
        self.slots.len()
    }
    pub fn euler_characteristic(&self) -> i64 {
        self.num_triangles() as i64 - self.zeta() as i64
    }
    /// Upper bound on the order of a periodic mapping class.
    pub fn max_order(&self) -> usize {
        (6 - self.euler_characteristic()) as usize
    }

    #[inline]
    pub fn edge_at(&self, slot: Slot) -> Edge {
        self.triangles[slot.triangle][slot.side]
    }
    #[inline]
    pub fn edge_slots(&self, e: Edge) -> [Slot; 2] {
        self.slots[e]
    }
    /// The slot glued to `slot`.
    pub fn opposite_slot(&self, slot: Slot) -> Slot {
        let [p, q] = self.slots[self.edge_at(slot)];
        if p == slot {
            q
        } else {
            p
        }
    }

    /// Flippable iff the two sides of `e` lie in distinct triangles.
    pub fn is_flippable(&self, e: Edge) -> bool {
        let [p, q] = self.slots[e];
        p.triangle != q.triangle
    }

    /// `(a, b, c, d)` with the triangles about `e` read as `[e, a, b]` and `[e, c, d]`.
    pub fn square_about_edge(&self, e: Edge) -> [Edge; 4] {
        let [p, q] = self.slots[e];
        let tp = self.triangles[p.triangle];
        let tq = self.triangles[q.triangle];
        [
            tp[(p.side + 1) % 3],
            tp[(p.side + 2) % 3],
            tq[(q.side + 1) % 3],
            tq[(q.side + 2) % 3],
        ]
    }

    /// New triangulation with `e` replaced by the other diagonal of its square.
    pub fn flip_edge(&self, e: Edge) -> Self {
        self.flip_edge_tracked(e).0
    }

    /// As `flip_edge`, also returning where each old vertex went.
    ///
    /// Flips never create or destroy punctures; only their indices move.
    pub fn flip_edge_tracked(&self, e: Edge) -> (Self, Vec<usize>) {
        assert!(self.is_flippable(e), "edge {e} is not flippable");
        let [p, q] = self.slots[e];
        let [a, b, c, d] = self.square_about_edge(e);

        let mut raw: Vec<Triangle> = Vec::with_capacity(self.num_triangles());
        let mut kept = Vec::with_capacity(self.num_triangles());
        for (t, &tri) in self.triangles.iter().enumerate() {
            if t != p.triangle && t != q.triangle {
                kept.push(t);
                raw.push(tri);
            }
        }
        let x = raw.len();
        raw.push([e, d, a]);
        raw.push([e, b, c]);
        let (out, prov) = Self::build(raw);

        // Old corner → some new corner at the same vertex.
        let moved = |raw_index: usize, side: usize| {
            let (n, r) = prov[raw_index];
            Corner::new(n, (side + 3 - r) % 3)
        };
        let mut old_to_new: Vec<[Corner; 3]> = vec![[Corner::new(0, 0); 3]; self.num_triangles()];
        for (i, &t) in kept.iter().enumerate() {
            old_to_new[t] = [moved(i, 0), moved(i, 1), moved(i, 2)];
        }
        // With P0,P1,P2 the corners of [e, a, b] and Q0 the corner of
        // [e, c, d] opposite e: [e, d, a] has corners (P2, P0, Q0) and
        // [e, b, c] has corners (P1, Q0, P0); Q1 = P2 and Q2 = P1.
        let (xp0, xp2, xq0) = (moved(x, 1), moved(x, 0), moved(x, 2));
        let yp1 = moved(x + 1, 0);
        let rotated = |s: Slot, k: usize| (s.side + k) % 3;
        old_to_new[p.triangle][rotated(p, 0)] = xp0;
        old_to_new[p.triangle][rotated(p, 1)] = yp1;
        old_to_new[p.triangle][rotated(p, 2)] = xp2;
        old_to_new[q.triangle][rotated(q, 0)] = xq0;
        old_to_new[q.triangle][rotated(q, 1)] = xp2;
        old_to_new[q.triangle][rotated(q, 2)] = yp1;

        let vertex_map = self
            .vertex_classes()
            .iter()
            .map(|class| {
                let c = class[0];
                out.vertex_of(old_to_new[c.triangle][c.side])
            })
            .collect();
        (out, vertex_map)
    }

    /// Shrink `e` to a point: its two triangles collapse onto edges and its
    /// ends merge into one vertex.
    ///
    /// Returns the new triangulation, the new label of every old edge (`None`
    /// for `e`), and where each old vertex went. `None` if `e` is a loop or a
    /// self-folded edge, or if too little of the surface would remain.
    pub fn contract_edge_tracked(&self, e: Edge) -> Option<(Self, Vec<Option<Edge>>, Vec<usize>)> {
        let [p, q] = self.slots[e];
        let [u, v] = self.edge_ends(e);
        if p.triangle == q.triangle || u == v || self.num_triangles() <= 2 {
            return None;
        }
        let [a, b, c, d] = self.square_about_edge(e);
        let mut uf = UnionFind::new(self.zeta());
        uf.union(a, b);
        uf.union(c, d);
        let mut label: Vec<Option<Edge>> = vec![None; self.zeta()];
        let mut root_label: Vec<Option<Edge>> = vec![None; self.zeta()];
        let mut next = 0;
        for f in (0..self.zeta()).filter(|&f| f != e) {
            let r = uf.find(f);
            let l = *root_label[r].get_or_insert_with(|| {
                next += 1;
                next - 1
            });
            label[f] = Some(l);
        }

        let mut raw: Vec<Triangle> = Vec::with_capacity(self.num_triangles() - 2);
        let mut kept = Vec::with_capacity(self.num_triangles() - 2);
        for (t, tri) in self.triangles.iter().enumerate() {
            if t == p.triangle || t == q.triangle {
                continue;
            }
            let mut out = [0; 3];
            for (k, &f) in tri.iter().enumerate() {
                out[k] = label[f]?;
            }
            kept.push(t);
            raw.push(out);
        }
        let mut count = vec![0usize; next];
        for &f in raw.iter().flatten() {
            count[f] += 1;
        }
        if 3 * raw.len() != 2 * next || count.iter().any(|&k| k != 2) {
            return None;
        }
        let (out, prov) = Self::build(raw);

        let mut surviving: Vec<Option<usize>> = vec![None; self.num_vertices()];
        for (i, &t) in kept.iter().enumerate() {
            let (n, r) = prov[i];
            for s in 0..3 {
                let old = self.vertex_of(Corner::new(t, s));
                surviving[old].get_or_insert(out.vertex_of(Corner::new(n, (s + 3 - r) % 3)));
            }
        }
        // Only the ends of `e` can lose all their corners; they share an image.
        let merged = surviving[u].or(surviving[v])?;
        surviving[u] = Some(merged);
        surviving[v] = Some(merged);
        let vertex_map = surviving.into_iter().collect::<Option<Vec<usize>>>()?;
        Some((out, label, vertex_map))
    }

    /// Tropical flip rule `new[e] = max(w[a] + w[c], w[b] + w[d]) − w[e]`.
    pub fn flip_effect<N: Number>(&self, e: Edge, w: &[N]) -> Result<Vec<N>> {
        let [a, b, c, d] = self.square_about_edge(e);
        let m = max_of(w[a].clone() + w[c].clone(), w[b].clone() + w[d].clone())?;
        let mut out = w.to_vec();
        out[e] = m - w[e].clone();
        Ok(out)
    }

    /// Corner after `c` anticlockwise around its vertex.
    pub fn next_corner(&self, c: Corner) -> Corner {
        let s = self.opposite_slot(c.leaving());
        Corner::new(s.triangle, (s.side + 2) % 3)
    }

    fn vertices(&self) -> &Vertices {
        self.vertices.get_or_init(|| {
            let mut of = vec![[usize::MAX; 3]; self.num_triangles()];
            let mut classes = Vec::new();
            for t in 0..self.num_triangles() {
                for s in 0..3 {
                    if of[t][s] != usize::MAX {
                        continue;
                    }
                    let v = classes.len();
                    let mut class = Vec::new();
                    let mut c = Corner::new(t, s);
                    while of[c.triangle][c.side] == usize::MAX {
                        of[c.triangle][c.side] = v;
                        class.push(c);
                        c = self.next_corner(c);
                    }
                    classes.push(class);
                }
            }
            Vertices { classes, of }
        })
    }

    /// Corner classes, each listed in the order of a walk around its vertex.
    pub fn vertex_classes(&self) -> &[Vec<Corner>] {
        &self.vertices().classes
    }
    #[inline]
    pub fn vertex_of(&self, c: Corner) -> usize {
        self.vertices().of[c.triangle][c.side]
    }
    pub fn num_vertices(&self) -> usize {
        self.vertices().classes.len()
    }
    /// Vertices at the two ends of `e` (start and end of its first slot).
    pub fn edge_ends(&self, e: Edge) -> [usize; 2] {
        let s = self.slots[e][0];
        [
            self.vertex_of(Corner::new(s.triangle, (s.side + 1) % 3)),
            self.vertex_of(Corner::new(s.triangle, (s.side + 2) % 3)),
        ]
    }

    /// Twice the dual weight at `c`: `w[b] + w[c] − w[a]` with `a` opposite.
    pub fn corner_dual<N: Number>(&self, c: Corner, w: &[N]) -> N {
        let t = self.triangles[c.triangle];
        w[t[(c.side + 1) % 3]].clone() + w[t[(c.side + 2) % 3]].clone() - w[t[c.side]].clone()
    }

    /// Triangle inequalities for `w` (every corner dual weight `≥ 0`).
    pub fn satisfies_triangle_inequalities<N: Number>(&self, w: &[N]) -> Result<bool> {
        for t in 0..self.num_triangles() {
            for s in 0..3 {
                if self.corner_dual(Corner::new(t, s), w).sign()? == Ordering::Less {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests;
