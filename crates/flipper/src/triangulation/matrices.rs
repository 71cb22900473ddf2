//! Integer data derived from a triangulation: the face cone, vertex markings,
//! and the key curves used to test mapping classes for equality.
//!
//! - Face matrix: one row per corner, `w[b] + w[c] − w[a] ≥ 0`.
//! - Marking matrices: one per choice of a corner at every vertex; the row for
//!   that corner reads `−(w[b] + w[c] − w[a]) ≥ 0`, so together with the face
//!   cone it forces the chosen corner to carry no dual weight. A multicurve has
//!   no peripheral component exactly when some marking holds.
//! - Key curves: boundaries of regular neighbourhoods of edges. They fill the
//!   surface, so a mapping class fixing all of them acts trivially on curves.

use crate::matrix::IntMatrix;

use super::{Corner, Edge, Triangulation};

impl Triangulation {
    fn corner_row(&self, c: Corner, sign: i128) -> Vec<i128> {
        let t = self.triangles()[c.triangle];
        let mut row = vec![0i128; self.zeta()];
        row[t[(c.side + 1) % 3]] += sign;
        row[t[(c.side + 2) % 3]] += sign;
        row[t[c.side]] -= sign;
        row
    }

    pub fn face_matrix(&self) -> &IntMatrix {
        self.face.get_or_init(|| {
            let rows: Vec<i128> = (0..self.num_triangles())
                .flat_map(|t| (0..3).map(move |s| Corner::new(t, s)))
                .flat_map(|c| self.corner_row(c, 1))
                .collect();
            IntMatrix::from_row_slice(3 * self.num_triangles(), self.zeta(), &rows)
        })
    }

    pub fn marking_matrices(&self) -> &[IntMatrix] {
        self.markings.get_or_init(|| {
            let classes = self.vertex_classes();
            let mut out = Vec::new();
            let mut pick = vec![0usize; classes.len()];
            loop {
                let rows: Vec<i128> = classes
                    .iter()
                    .zip(&pick)
                    .flat_map(|(class, &k)| self.corner_row(class[k], -1))
                    .collect();
                out.push(IntMatrix::from_row_slice(classes.len(), self.zeta(), &rows));
                // Odometer over the corner choices.
                let mut v = 0;
                loop {
                    if v == classes.len() {
                        return out;
                    }
                    pick[v] += 1;
                    if pick[v] < classes[v].len() {
                        break;
                    }
                    pick[v] = 0;
                    v += 1;
                }
            }
        })
    }

    /// Integral weights of a multicurve with no peripheral component: nonzero,
    /// nonnegative, triangle inequalities with even triangle sums, and every
    /// vertex has a corner of zero dual weight.
    pub fn is_multicurve_weights(&self, w: &[i64]) -> bool {
        if w.iter().any(|&x| x < 0) || w.iter().all(|&x| x == 0) {
            return false;
        }
        let faces_ok = self.triangles().iter().all(|t| {
            let s: i64 = t.iter().map(|&e| w[e]).sum();
            s % 2 == 0 && t.iter().all(|&e| s - 2 * w[e] >= 0)
        });
        faces_ok
            && self
                .vertex_classes()
                .iter()
                .all(|class| class.iter().any(|&c| self.corner_dual(c, w) == 0))
    }

    /// Edge ends crossed by a walk around each vertex, in walk order.
    fn crossings(&self, v: usize) -> Vec<Edge> {
        self.vertex_classes()[v]
            .iter()
            .map(|c| self.edge_at(c.leaving()))
            .collect()
    }

    /// Boundary weights of a regular neighbourhood of `e`: one curve, or two
    /// when `e` is a loop. Not filtered for essentiality.
    pub fn regular_neighbourhood(&self, e: Edge) -> Vec<Vec<i64>> {
        let [u, v] = self.edge_ends(e);
        if u != v {
            let mut w = vec![0i64; self.zeta()];
            for f in self.crossings(u).into_iter().chain(self.crossings(v)) {
                w[f] += 1;
            }
            w[e] = 0;
            return vec![w];
        }
        let around = self.crossings(u);
        let at: Vec<usize> = (0..around.len()).filter(|&i| around[i] == e).collect();
        let (p, q) = (at[0], at[1]);
        let mut inside = vec![0i64; self.zeta()];
        let mut outside = vec![0i64; self.zeta()];
        for (i, &f) in around.iter().enumerate() {
            if i == p || i == q {
                continue;
            }
            if p < i && i < q {
                inside[f] += 1;
            } else {
                outside[f] += 1;
            }
        }
        vec![inside, outside]
    }

    /// Distinct essential neighbourhood curves of all edges.
    pub fn key_curves(&self) -> &[Vec<i64>] {
        self.key_curves.get_or_init(|| {
            let mut out: Vec<Vec<i64>> = Vec::new();
            for e in 0..self.zeta() {
                for w in self.regular_neighbourhood(e) {
                    if !out.contains(&w) && self.is_multicurve_weights(&w) {
                        out.push(w);
                    }
                }
            }
            out
        })
    }
}
