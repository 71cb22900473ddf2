//! Piecewise-linear encodings of maps between triangulations.
//!
//! Purpose
//! - An `Encoding` is a sequence of stages; each stage is a finite set of
//!   `PartialFunction`s (integer action, integer condition) whose cones cover
//!   the nonnegative weight space. Applying an encoding picks, at every stage,
//!   the first cell whose condition holds and applies its action.
//! - Every stage also carries its inverse cells, so `inverse()` never inverts
//!   a matrix.
//!
//! Conventions
//! - Stages are stored in application order: `stages[0]` acts first.
//! - `f * g` means "apply `g`, then `f`"; requires `g.target == f.source`.
//! - Stages with a single unconditional cell in both directions (isometries)
//!   are folded into their neighbour, so sequences grow only with flips.
//!
//! Layout
//! - `build`: encodings of flips and isometries.
//! - `twist`: curve shortening, Dehn twists and half twists.

mod build;
mod twist;

use std::ops::Mul;
use std::sync::Arc;

use num_bigint::BigInt;

use crate::error::{FlipperError, Result};
use crate::lamination::Lamination;
use crate::matrix::{self, IntMatrix};
use crate::number::Number;
use crate::triangulation::Triangulation;

pub use build::{encode_flip, encode_flips, encode_isometry};

/// `v ↦ action·v` on the cone `condition·v ≥ 0`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialFunction {
    pub action: IntMatrix,
    pub condition: IntMatrix,
}

impl PartialFunction {
    pub fn new(action: IntMatrix, condition: IntMatrix) -> Self {
        debug_assert_eq!(action.ncols(), condition.ncols());
        Self { action, condition }
    }

    /// Defined everywhere.
    pub fn linear(action: IntMatrix) -> Self {
        let cols = action.ncols();
        Self::new(action, matrix::empty(cols))
    }

    #[inline]
    pub fn is_unconditional(&self) -> bool {
        self.condition.nrows() == 0
    }

    pub fn applies_to<N: Number>(&self, v: &[N]) -> Result<bool> {
        matrix::satisfies(&self.condition, v)
    }

    /// `self` after `first`: action `A·B`, condition `[C_first; C·B]`.
    pub fn after(&self, first: &PartialFunction) -> PartialFunction {
        let pulled = &self.condition * &first.action;
        PartialFunction::new(
            &self.action * &first.action,
            matrix::stack(&[&first.condition, &pulled]),
        )
    }
}

#[derive(Clone, Debug)]
struct Stage {
    source: Arc<Triangulation>,
    target: Arc<Triangulation>,
    forward: Vec<PartialFunction>,
    backward: Vec<PartialFunction>,
}

impl Stage {
    fn is_linear(&self) -> bool {
        self.forward.len() == 1
            && self.backward.len() == 1
            && self.forward[0].is_unconditional()
            && self.backward[0].is_unconditional()
    }

    fn inverse(&self) -> Stage {
        Stage {
            source: self.target.clone(),
            target: self.source.clone(),
            forward: self.backward.clone(),
            backward: self.forward.clone(),
        }
    }

    fn choose<N: Number>(&self, v: &[N]) -> Result<&PartialFunction> {
        for pf in &self.forward {
            if pf.applies_to(v)? {
                return Ok(pf);
            }
        }
        Err(FlipperError::assumption("vector lies in no cell of the stage"))
    }
}

/// Append `next` to `stages`, folding linear stages into their neighbour.
fn push_stage(stages: &mut Vec<Stage>, next: Stage) {
    let Some(last) = stages.last_mut() else {
        stages.push(next);
        return;
    };
    if next.is_linear() {
        let m = &next.forward[0].action;
        let m_inv = &next.backward[0].action;
        for pf in &mut last.forward {
            pf.action = m * &pf.action;
        }
        for pf in &mut last.backward {
            pf.action = &pf.action * m_inv;
            pf.condition = &pf.condition * m_inv;
        }
        last.target = next.target;
    } else if last.is_linear() {
        let m = last.forward[0].action.clone();
        let m_inv = last.backward[0].action.clone();
        let source = last.source.clone();
        let mut merged = next;
        for pf in &mut merged.forward {
            pf.action = &pf.action * &m;
            pf.condition = &pf.condition * &m;
        }
        for pf in &mut merged.backward {
            pf.action = &m_inv * &pf.action;
        }
        merged.source = source;
        *last = merged;
    } else {
        stages.push(next);
    }
}

/// A map between triangulations, as a composition of piecewise-linear stages.
#[derive(Clone, Debug)]
pub struct Encoding {
    source: Arc<Triangulation>,
    target: Arc<Triangulation>,
    stages: Vec<Stage>,
}

impl Encoding {
    pub fn identity(t: Arc<Triangulation>) -> Self {
        Self {
            source: t.clone(),
            target: t,
            stages: Vec::new(),
        }
    }

    fn from_stage(stage: Stage) -> Self {
        Self {
            source: stage.source.clone(),
            target: stage.target.clone(),
            stages: vec![stage],
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
    /// Number of stages after folding.
    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
    /// Forward cells of stage `i` (application order).
    pub fn cells(&self, i: usize) -> &[PartialFunction] {
        &self.stages[i].forward
    }

    pub fn is_mapping_class(&self) -> bool {
        self.source == self.target
    }

    pub fn inverse(&self) -> Self {
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
            stages: self.stages.iter().rev().map(Stage::inverse).collect(),
        }
    }

    /// `self` followed by `then`.
    fn compose(&self, then: &Encoding) -> Encoding {
        assert!(
            self.target == then.source,
            "encodings do not compose: target and source triangulations differ"
        );
        let mut stages = self.stages.clone();
        for s in &then.stages {
            push_stage(&mut stages, s.clone());
        }
        Encoding {
            source: self.source.clone(),
            target: then.target.clone(),
            stages,
        }
    }

    /// `k`-fold composite; negative powers go through `inverse`.
    pub fn pow(&self, k: i64) -> Result<Self> {
        if !self.is_mapping_class() {
            return Err(FlipperError::assumption("only mapping classes have powers"));
        }
        let base = if k < 0 { self.inverse() } else { self.clone() };
        let mut out = Encoding::identity(self.source.clone());
        for _ in 0..k.unsigned_abs() {
            out = out.compose(&base);
        }
        Ok(out)
    }

    /// Image of a weight vector on `source`.
    pub fn apply<N: Number>(&self, v: &[N]) -> Result<Vec<N>> {
        let mut v = v.to_vec();
        for stage in &self.stages {
            let pf = stage.choose(&v)?;
            v = matrix::apply(&pf.action, &v)?;
        }
        Ok(v)
    }

    pub fn apply_lamination<N: Number>(&self, l: &Lamination<N>) -> Result<Lamination<N>> {
        if **l.triangulation() != *self.source {
            return Err(FlipperError::assumption(
                "lamination does not live on the source triangulation",
            ));
        }
        Ok(Lamination::new(self.target.clone(), self.apply(l.weights())?))
    }

    /// The single linear cell this encoding uses at `v`: the composite action
    /// and every stage condition pulled back to `source` coordinates.
    pub fn applied_function<N: Number>(&self, v: &[N]) -> Result<PartialFunction> {
        let mut out = PartialFunction::linear(matrix::identity(self.source.zeta()));
        let mut v = v.to_vec();
        for stage in &self.stages {
            let pf = stage.choose(&v)?;
            v = matrix::apply(&pf.action, &v)?;
            out = pf.after(&out);
        }
        Ok(out)
    }

    fn key_curves_big(&self) -> Vec<Vec<BigInt>> {
        self.source
            .key_curves()
            .iter()
            .map(|w| w.iter().map(|&x| BigInt::from(x)).collect())
            .collect()
    }

    /// Agrees with `other` on every key curve of the source.
    pub fn eq_on_key_curves(&self, other: &Encoding) -> Result<bool> {
        if self.source != other.source || self.target != other.target {
            return Ok(false);
        }
        for curve in self.key_curves_big() {
            if self.apply(&curve)? != other.apply(&curve)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Mapping class fixing every key curve.
    pub fn is_identity(&self) -> Result<bool> {
        if !self.is_mapping_class() {
            return Ok(false);
        }
        for curve in self.key_curves_big() {
            if self.apply(&curve)? != curve {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Order of the action on curves, or 0 if it exceeds `max_order`.
    pub fn order(&self) -> Result<usize> {
        if !self.is_mapping_class() {
            return Err(FlipperError::assumption("order of a non mapping class"));
        }
        let curves = self.key_curves_big();
        let mut images = curves.clone();
        for k in 1..=self.source.max_order() {
            images = images
                .iter()
                .map(|c| self.apply(c))
                .collect::<Result<Vec<_>>>()?;
            if images == curves {
                return Ok(k);
            }
        }
        Ok(0)
    }

    pub fn is_periodic(&self) -> Result<bool> {
        Ok(self.order()? > 0)
    }
}

impl Mul<&Encoding> for &Encoding {
    type Output = Encoding;
    /// Apply the right operand first.
    fn mul(self, rhs: &Encoding) -> Encoding {
        rhs.compose(self)
    }
}

impl Mul for Encoding {
    type Output = Encoding;
    fn mul(self, rhs: Encoding) -> Encoding {
        rhs.compose(&self)
    }
}
