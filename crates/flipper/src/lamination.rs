//! Measured laminations in edge-weight coordinates.
//!
//! A `Lamination<N>` is a triangulation plus one weight per edge: the
//! geometric intersection numbers of a multicurve (integers) or of a measured
//! lamination (algebraic numbers) with the edges. Flips transport weights by
//! the tropical rule in `Triangulation::flip_effect`.
//!
//! Curve-specific operations (shortening, twists, half twists) live in
//! `encoding::twist`, next to the encodings they build.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::Result;
use crate::number::{compare, Number};
use crate::triangulation::{Edge, Triangulation};

#[derive(Clone, Debug)]
pub struct Lamination<N> {
    triangulation: Arc<Triangulation>,
    weights: Vec<N>,
}

impl<N: Number> Lamination<N> {
    pub fn new(triangulation: Arc<Triangulation>, weights: Vec<N>) -> Self {
        assert_eq!(
            weights.len(),
            triangulation.zeta(),
            "one weight per edge required"
        );
        Self {
            triangulation,
            weights,
        }
    }

    #[inline]
    pub fn triangulation(&self) -> &Arc<Triangulation> {
        &self.triangulation
    }
    #[inline]
    pub fn weights(&self) -> &[N] {
        &self.weights
    }
    #[inline]
    pub fn weight(&self, e: Edge) -> &N {
        &self.weights[e]
    }
    pub fn into_weights(self) -> Vec<N> {
        self.weights
    }

    /// Sum of all weights.
    pub fn total(&self) -> N {
        let zero = self.weights[0].zero_like();
        self.weights.iter().cloned().fold(zero, |acc, x| acc + x)
    }

    /// Change of `w[e]` if `e` were flipped.
    pub fn weight_difference_flip_edge(&self, e: Edge) -> Result<N> {
        let flipped = self.triangulation.flip_effect(e, &self.weights)?;
        Ok(flipped[e].clone() - self.weights[e].clone())
    }

    /// Transport across the flip of `e`.
    pub fn flip(&self, e: Edge) -> Result<Self> {
        let weights = self.triangulation.flip_effect(e, &self.weights)?;
        Ok(Self {
            triangulation: Arc::new(self.triangulation.flip_edge(e)),
            weights,
        })
    }

    /// Same triangulation and exactly equal weights.
    pub fn same_as(&self, other: &Self) -> Result<bool> {
        if self.triangulation != other.triangulation {
            return Ok(false);
        }
        for (a, b) in self.weights.iter().zip(&other.weights) {
            if compare(a, b)? != Ordering::Equal {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Lamination<i64> {
    /// Integral multicurve without peripheral components.
    pub fn is_multicurve(&self) -> bool {
        self.triangulation.is_multicurve_weights(&self.weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn torus() -> Arc<Triangulation> {
        Arc::new(Triangulation::new(vec![[0, 2, 1], [0, 2, 1]]))
    }

    #[test]
    fn flip_transports_weights() {
        let l = Lamination::new(torus(), vec![1i64, 1, 2]);
        assert_eq!(l.weight_difference_flip_edge(0).unwrap(), 2);
        assert_eq!(l.weight_difference_flip_edge(2).unwrap(), -2);
        let f = l.flip(2).unwrap();
        assert_eq!(f.weights(), &[1, 1, 0][..]);
        assert!(f.is_multicurve());
        let back = f.flip(2).unwrap();
        assert!(back.same_as(&l).unwrap());
    }

    #[test]
    fn total_weight() {
        let l = Lamination::new(torus(), vec![2i64, 1, 2]);
        assert_eq!(l.total(), 5);
    }

    #[test]
    fn multicurves() {
        assert!(Lamination::new(torus(), vec![1i64, 1, 0]).is_multicurve());
        assert!(Lamination::new(torus(), vec![1i64, 1, 2]).is_multicurve());
        assert!(!Lamination::new(torus(), vec![1i64, 1, 1]).is_multicurve());
    }
}
