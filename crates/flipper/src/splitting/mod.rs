//! Splitting sequences of filling laminations.
//!
//! Purpose
//! - Repeatedly flip the heaviest edge of a filling lamination until the
//!   projective lamination returns, up to a tag-preserving isometry, to a state
//!   seen before. The steps after that state form the periodic part; the
//!   shrink factor over one period is the dilatation.
//!
//! How
//! - Trigons are punctured first (`Lamination::puncture_trigons`), so every
//!   later flip sees a triangulation the lamination fills without trigons.
//! - A flip that produces weight zero is followed by a collapse of that edge.
//! - States are hashed by an isometry-invariant key (sorted projective weights
//!   floored exactly to a fixed resolution, edge count, real vertex count);
//!   only states sharing a key are compared exactly.
//!
//! Layout
//! - `tagged`: laminations with real/artificial vertex tags, puncturing,
//!   collapsing, keys and matching.

mod tagged;

use std::collections::HashMap;

use crate::cfg::SplittingCfg;
use crate::error::{FlipperError, Result};
use crate::lamination::Lamination;
use crate::number::Number;
use crate::progress::{checkpoint, Progress};
use crate::triangulation::{Edge, Isometry};

use tagged::Tagged;

/// One move of a splitting sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Flip(Edge),
    /// Shrink an edge of weight zero to a point.
    Collapse(Edge),
}

#[derive(Clone, Debug)]
pub struct SplittingSequence<N> {
    /// The input after puncturing trigons.
    pub initial: Lamination<N>,
    pub preperiodic: Vec<Step>,
    pub periodic: Vec<Step>,
    /// One coordinate of `lamination` and the same coordinate after the
    /// period, carried back by `isometries[0]`. Their ratio is the dilatation.
    pub scale: (N, N),
    /// The state the periodic part starts (and ends) at.
    pub lamination: Lamination<N>,
    /// Isometries from the end of the period back onto `lamination`.
    pub isometries: Vec<Isometry>,
}

impl<N: Number> SplittingSequence<N> {
    /// `scale.0 / scale.1` as a float.
    pub fn dilatation(&self) -> f64 {
        self.scale.0.to_f64() / self.scale.1.to_f64()
    }
}

/// Apply `steps` to `start`.
pub fn replay<N: Number>(start: &Lamination<N>, steps: &[Step]) -> Result<Lamination<N>> {
    let mut current = start.clone();
    for step in steps {
        current = match *step {
            Step::Flip(e) => {
                if !current.triangulation().is_flippable(e) {
                    return Err(FlipperError::assumption(format!("edge {e} is not flippable")));
                }
                current.flip(e)?
            }
            Step::Collapse(e) => current.collapse_trivial_weight(e)?.0,
        };
    }
    Ok(current)
}

impl<N: Number> Lamination<N> {
    /// Splitting sequence of a filling lamination.
    ///
    /// `Assumption` error if the lamination is found not to be filling,
    /// `Computation` error after `cfg.max_flips` flips without a repeat.
    pub fn splitting_sequence(
        &self,
        cfg: SplittingCfg,
        progress: &mut dyn Progress,
    ) -> Result<SplittingSequence<N>> {
        let mut current = Tagged::start(self)?;
        let initial = current.lamination.clone();
        let mut steps: Vec<Step> = Vec::new();
        // (number of steps taken, state after them)
        let mut history: Vec<(usize, Tagged<N>)> = vec![(0, current.clone())];
        let mut seen: HashMap<_, Vec<usize>> = HashMap::new();
        seen.insert(current.key(cfg.key_resolution)?, vec![0]);

        for flips in 0..cfg.max_flips {
            checkpoint(progress, flips as f64 / cfg.max_flips as f64)?;
            let e = current.heaviest_flippable()?;
            current = current.flip(e)?;
            steps.push(Step::Flip(e));
            if crate::number::is_zero(current.lamination.weight(e))? {
                current = current.collapse(e)?;
                steps.push(Step::Collapse(e));
                tracing::trace!(edge = e, "collapsed trivial weight");
            }

            let key = current.key(cfg.key_resolution)?;
            for &index in seen.get(&key).map(Vec::as_slice).unwrap_or(&[]) {
                let (mark, old) = &history[index];
                let isometries = current.matches(old)?;
                let Some(iso) = isometries.first() else {
                    continue;
                };
                let scale = matched_coordinate(
                    old.lamination.weights(),
                    &iso.apply(current.lamination.weights()),
                )?;
                let sequence = SplittingSequence {
                    initial,
                    preperiodic: steps[..*mark].to_vec(),
                    periodic: steps[*mark..].to_vec(),
                    scale,
                    lamination: old.lamination.clone(),
                    isometries,
                };
                tracing::debug!(
                    preperiodic = mark,
                    periodic = sequence.periodic.len(),
                    dilatation = sequence.dilatation(),
                    "splitting sequence closed up"
                );
                return Ok(sequence);
            }
            seen.entry(key).or_default().push(history.len());
            history.push((steps.len(), current.clone()));
        }
        Err(FlipperError::computation(format!(
            "no periodic splitting within {} flips",
            cfg.max_flips
        )))
    }
}

/// First nonzero coordinate of `before` with its counterpart in `after`.
fn matched_coordinate<N: Number>(before: &[N], after: &[N]) -> Result<(N, N)> {
    for (b, a) in before.iter().zip(after) {
        if !crate::number::is_zero(b)? {
            return Ok((b.clone(), a.clone()));
        }
    }
    Err(FlipperError::assumption("lamination has no nonzero weight"))
}

#[cfg(test)]
mod tests;
