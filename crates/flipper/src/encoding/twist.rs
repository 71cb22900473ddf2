//! Dehn twists and half twists about curves.
//!
//! How
//! - A curve is first conjugated to a short form: greedily flip the edge whose
//!   flip lowers the total weight most, until the curve meets exactly two edges
//!   `e1, e2` once each. In that form the two triangles about the curve read
//!   `[e1, e2, ·]`, and one twist is "flip `e1`, then swap the labels of `e1`
//!   and `e2`".
//! - A half twist exists when the short curve cuts off a twice-punctured disc.
//!   It is found by search: short flip sequences near the curve followed by an
//!   isometry back, keeping the candidate that fixes the curve and every key
//!   curve missing it, and squares to the twist on every key curve.

use std::sync::Arc;

use crate::error::{FlipperError, Result};
use crate::lamination::Lamination;
use crate::triangulation::{Corner, Edge, Triangulation};
use crate::util::UnionFind;

use super::build::{encode_flip, encode_isometry};
use super::Encoding;

/// Longest flip sequence tried by the half twist search.
const HALFTWIST_MAX_FLIPS: usize = 3;

impl Lamination<i64> {
    /// Encoding `conj` and the short curve `conj(self)` of total weight 2.
    ///
    /// `Assumption` error if `self` is not a multicurve, or the greedy descent
    /// is forced upwards or stalls on two consecutive level flips (the
    /// signature of several components).
    pub fn conjugate_short(&self) -> Result<(Encoding, Lamination<i64>)> {
        if !self.is_multicurve() {
            return Err(FlipperError::assumption("not a multicurve"));
        }
        let mut conj = Encoding::identity(self.triangulation().clone());
        let mut current = self.clone();
        let mut stalled = 0;
        while current.total() > 2 {
            let t = current.triangulation().clone();
            let mut best: Option<(i64, Edge)> = None;
            for e in (0..t.zeta()).filter(|&e| t.is_flippable(e) && *current.weight(e) > 0) {
                let d = current.weight_difference_flip_edge(e)?;
                if best.map_or(true, |(bd, _)| d < bd) {
                    best = Some((d, e));
                }
            }
            let Some((d, e)) = best else {
                return Err(FlipperError::assumption("no edge can shorten the curve"));
            };
            if d > 0 {
                return Err(FlipperError::assumption("curve cannot be shortened further"));
            }
            stalled = if d == 0 { stalled + 1 } else { 0 };
            if stalled >= 2 {
                return Err(FlipperError::assumption("not a single curve"));
            }
            conj = &encode_flip(&t, e) * &conj;
            current = current.flip(e)?;
        }
        if short_edges(&current).is_none() {
            return Err(FlipperError::assumption("short form is not a single curve"));
        }
        tracing::trace!(flips = conj.len(), "curve conjugated to short form");
        Ok((conj, current))
    }

    /// A single curve whose Dehn twist can be encoded.
    pub fn is_good_curve(&self) -> bool {
        self.conjugate_short().is_ok()
    }

    /// A good curve cutting off a disc with exactly two punctures.
    pub fn is_pants_boundary(&self) -> bool {
        match self.conjugate_short() {
            Ok((_, short)) => bounds_pants(&short),
            Err(_) => false,
        }
    }

    /// `k`-th power of the (left) Dehn twist about this curve.
    pub fn encode_twist(&self, k: i64) -> Result<Encoding> {
        let (conj, short) = self.conjugate_short()?;
        let step = twist_step(&short, k >= 0)?;
        let twist = step.pow(k.abs())?;
        Ok(&(&conj.inverse() * &twist) * &conj)
    }

    /// `k`-th power of the half twist swapping the two punctures this curve
    /// encloses. `Assumption` error unless `is_pants_boundary`.
    pub fn encode_halftwist(&self, k: i64) -> Result<Encoding> {
        let (conj, short) = self.conjugate_short()?;
        if !bounds_pants(&short) {
            return Err(FlipperError::assumption("curve does not bound a pair of pants"));
        }
        let half = halftwist_step(&short)?;
        let half = if k < 0 { half.inverse() } else { half };
        let power = half.pow(k.abs())?;
        Ok(&(&conj.inverse() * &power) * &conj)
    }
}

/// The two edges of weight one of a short curve, in label order.
fn short_edges(short: &Lamination<i64>) -> Option<(Edge, Edge)> {
    let ones: Vec<Edge> = (0..short.weights().len())
        .filter(|&e| *short.weight(e) == 1)
        .collect();
    let others_zero = short.weights().iter().all(|&w| w == 0 || w == 1);
    match ones[..] {
        [e1, e2] if others_zero => Some((e1, e2)),
        _ => None,
    }
}

/// One positive (or negative) twist of a short curve, as a mapping class of
/// its triangulation.
fn twist_step(short: &Lamination<i64>, positive: bool) -> Result<Encoding> {
    let t = short.triangulation();
    let (mut e1, mut e2) =
        short_edges(short).ok_or_else(|| FlipperError::assumption("curve is not short"))?;
    let framed = t
        .triangles()
        .iter()
        .find(|tri| tri.contains(&e1) && tri.contains(&e2))
        .ok_or_else(|| FlipperError::assumption("short curve edges share no triangle"))?;
    let i = framed.iter().position(|&x| x == e1).unwrap_or(0);
    if framed[(i + 1) % 3] != e2 {
        std::mem::swap(&mut e1, &mut e2);
    }
    if !positive {
        std::mem::swap(&mut e1, &mut e2);
    }
    let flip = encode_flip(t, e1);
    let mut swap: Vec<Edge> = (0..t.zeta()).collect();
    swap.swap(e1, e2);
    let back = flip
        .target()
        .find_isometries(t)
        .into_iter()
        .find(|iso| iso.edge_map() == swap.as_slice())
        .ok_or_else(|| FlipperError::computation("twist does not close up"))?;
    Ok(&encode_isometry(&back) * &flip)
}

/// Search for the half twist of a short pants boundary.
fn halftwist_step(short: &Lamination<i64>) -> Result<Encoding> {
    let t = short.triangulation();
    let (e1, e2) = short_edges(short).ok_or_else(|| FlipperError::assumption("curve is not short"))?;
    let mut candidates: Vec<Edge> = t
        .triangles()
        .iter()
        .filter(|tri| tri.contains(&e1))
        .flatten()
        .copied()
        .collect();
    candidates.sort_unstable();
    candidates.dedup();
    let twist = twist_step(short, true)?;
    // Curves missing both short edges stay clear of the disc.
    let outside: Vec<Vec<i64>> = t
        .key_curves()
        .iter()
        .filter(|c| c[e1] == 0 && c[e2] == 0)
        .cloned()
        .collect();

    for len in 1..=HALFTWIST_MAX_FLIPS {
        let mut pick = vec![0usize; len];
        loop {
            let seq: Vec<Edge> = pick.iter().map(|&i| candidates[i]).collect();
            if let Some(found) = try_halftwist(t, short, &seq, &twist, &outside)? {
                tracing::debug!(?seq, "half twist found");
                return Ok(found);
            }
            // Odometer over sequences of candidate edges.
            let mut k = 0;
            while k < len {
                pick[k] += 1;
                if pick[k] < candidates.len() {
                    break;
                }
                pick[k] = 0;
                k += 1;
            }
            if k == len {
                break;
            }
        }
    }
    Err(FlipperError::computation("no half twist found near the curve"))
}

fn try_halftwist(
    t: &Arc<Triangulation>,
    short: &Lamination<i64>,
    seq: &[Edge],
    twist: &Encoding,
    outside: &[Vec<i64>],
) -> Result<Option<Encoding>> {
    let mut flips = Encoding::identity(t.clone());
    for &e in seq {
        let current = flips.target().clone();
        if !current.is_flippable(e) {
            return Ok(None);
        }
        flips = &encode_flip(&current, e) * &flips;
    }
    for iso in flips.target().find_isometries(t) {
        let h = &encode_isometry(&iso) * &flips;
        if h.apply(short.weights())? != short.weights() {
            continue;
        }
        // A half twist composed with a symmetry of the complement squares to
        // the same twist; only the one supported on the disc fixes these.
        let mut fixes_outside = true;
        for c in outside {
            if h.apply(c)? != *c {
                fixes_outside = false;
                break;
            }
        }
        if !fixes_outside {
            continue;
        }
        if (&h * &h).eq_on_key_curves(twist)? {
            return Ok(Some(h));
        }
    }
    Ok(None)
}

/// Whether the short curve separates off a twice-punctured disc.
///
/// Removing the two edges the curve crosses leaves the rest of the
/// triangulation; if the curve separates, that rest falls into two pieces.
/// A piece with `V` punctures, `k` edges and `f` triangles has Euler
/// characteristic `V − k + f`; the pants side has `V = 2` and is a disc.
fn bounds_pants(short: &Lamination<i64>) -> bool {
    let t = short.triangulation();
    let Some((e1, e2)) = short_edges(short) else {
        return false;
    };
    let inner = |e: Edge| e != e1 && e != e2;
    let mut uf = UnionFind::new(t.num_vertices());
    for e in (0..t.zeta()).filter(|&e| inner(e)) {
        let [u, v] = t.edge_ends(e);
        uf.union(u, v);
    }
    let (label, count) = uf.labels();
    if count != 2 {
        return false;
    }
    let mut vertices = [0i64; 2];
    let mut edges = [0i64; 2];
    let mut faces = [0i64; 2];
    for &l in &label {
        vertices[l] += 1;
    }
    for e in (0..t.zeta()).filter(|&e| inner(e)) {
        edges[label[t.edge_ends(e)[0]]] += 1;
    }
    for (i, tri) in t.triangles().iter().enumerate() {
        if tri.iter().all(|&e| inner(e)) {
            faces[label[t.vertex_of(Corner::new(i, 0))]] += 1;
        }
    }
    (0..2).any(|s| vertices[s] == 2 && vertices[s] - edges[s] + faces[s] == 1)
}
