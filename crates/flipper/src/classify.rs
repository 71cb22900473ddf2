//! Nielsen–Thurston classification of a mapping class.
//!
//! How
//! - Periodic: some power up to `max_order` fixes every key curve.
//! - Pseudo-Anosov: an exactly invariant lamination with `λ > 1` whose
//!   splitting sequence closes up is filling, which certifies the type.
//! - Reducible: when that certificate is not found, the polytope search looks
//!   for an invariant multicurve. It is exhaustive, so it runs last.
//!
//! The two long searches share one progress bar: splitting fills the first
//! half, reducibility the second.

use crate::cfg::ClassifyCfg;
use crate::encoding::Encoding;
use crate::error::{FlipperError, Result};
use crate::lamination::Lamination;
use crate::number::{AlgebraicCapability, FieldElement, Number};
use crate::progress::{Progress, SubRange};
use crate::reducibility::Reducibility;
use crate::splitting::SplittingSequence;

#[derive(Clone, Debug)]
pub enum NielsenThurston {
    Periodic {
        order: usize,
    },
    /// With an invariant multicurve.
    Reducible(Lamination<i64>),
    PseudoAnosov {
        dilatation: FieldElement,
        splitting: Box<SplittingSequence<FieldElement>>,
    },
}

impl NielsenThurston {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Periodic { .. } => "periodic",
            Self::Reducible(_) => "reducible",
            Self::PseudoAnosov { .. } => "pseudo-anosov",
        }
    }

    /// Dilatation as a float; `1` unless pseudo-Anosov.
    pub fn dilatation(&self) -> f64 {
        match self {
            Self::PseudoAnosov { dilatation, .. } => dilatation.to_f64(),
            _ => 1.0,
        }
    }
}

impl Encoding {
    /// Decide the Nielsen–Thurston type.
    ///
    /// Errors are those of the underlying searches; a `Computation` error
    /// means a budget in `cfg` ran out and says nothing about the type.
    /// `Computation` and `Assumption` failures of the pseudo-Anosov path only
    /// send the search on to reducibility.
    pub fn nielsen_thurston_type(
        &self,
        cfg: ClassifyCfg,
        progress: &mut dyn Progress,
    ) -> Result<NielsenThurston> {
        if !self.is_mapping_class() {
            return Err(FlipperError::assumption("not a mapping class"));
        }
        let order = self.order()?;
        if order > 0 {
            tracing::debug!(order, "periodic");
            return Ok(NielsenThurston::Periodic { order });
        }
        let certificate = self.pseudo_anosov(cfg, &mut SubRange::new(progress, 0.0, 0.5));
        match certificate {
            Ok((dilatation, splitting)) => {
                progress.report(1.0);
                return Ok(NielsenThurston::PseudoAnosov {
                    dilatation,
                    splitting: Box::new(splitting),
                });
            }
            Err(FlipperError::Computation(reason) | FlipperError::Assumption(reason)) => {
                tracing::debug!(%reason, "no pseudo-Anosov certificate; searching for reducing curves");
            }
            Err(e) => return Err(e),
        }
        match self.reducibility(cfg.polytope, &mut SubRange::new(progress, 0.5, 1.0))? {
            Reducibility::Reducible(curves) => {
                tracing::debug!(weights = ?curves.weights(), "reducible");
                Ok(NielsenThurston::Reducible(curves))
            }
            Reducibility::Irreducible => Err(FlipperError::computation(
                "irreducible, but no invariant lamination was certified within the budget",
            )),
        }
    }

    /// Invariant lamination and its closed-up splitting sequence.
    fn pseudo_anosov(
        &self,
        cfg: ClassifyCfg,
        progress: &mut dyn Progress,
    ) -> Result<(FieldElement, SplittingSequence<FieldElement>)> {
        let found = self.invariant_lamination(&AlgebraicCapability, cfg.invariant)?;
        let splitting = found.lamination.splitting_sequence(cfg.splitting, progress)?;
        tracing::debug!(
            dilatation = found.dilatation.to_f64(),
            period = splitting.periodic.len(),
            "pseudo-Anosov"
        );
        Ok((found.dilatation, splitting))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{FnProgress, NoProgress};
    use crate::surfaces::{s_1_1, s_1_2};

    fn classify(word: &str) -> NielsenThurston {
        let f = s_1_1().unwrap().mapping_class(word).unwrap();
        f.nielsen_thurston_type(ClassifyCfg::default(), &mut NoProgress).unwrap()
    }

    #[test]
    fn the_three_types_on_the_torus() {
        assert!(matches!(classify("ab"), NielsenThurston::Periodic { order: 3 }));
        match classify("a") {
            NielsenThurston::Reducible(curves) => assert!(curves.is_multicurve()),
            other => panic!("expected reducible, got {}", other.name()),
        }
        let pa = classify("aB");
        assert_eq!(pa.name(), "pseudo-anosov");
        assert!((pa.dilatation() - (3.0 + 5f64.sqrt()) / 2.0).abs() < 1e-9);
        if let NielsenThurston::PseudoAnosov { splitting, .. } = pa {
            assert_eq!(splitting.periodic.len(), 2);
        }
    }

    #[test]
    fn disjoint_twists_are_reducible() {
        let f = s_1_2().unwrap().mapping_class("aC").unwrap();
        let t = f.nielsen_thurston_type(ClassifyCfg::default(), &mut NoProgress).unwrap();
        assert_eq!(t.name(), "reducible");
        assert_eq!(t.dilatation(), 1.0);
    }

    #[test]
    fn pseudo_anosov_words_on_s_1_2() {
        let surface = s_1_2().unwrap();
        for (word, lambda) in [("abCb", (3.0 + 5f64.sqrt()) / 2.0), ("cbAAb", 2.0 + 3f64.sqrt())] {
            let f = surface.mapping_class(word).unwrap();
            let t = f.nielsen_thurston_type(ClassifyCfg::default(), &mut NoProgress).unwrap();
            assert_eq!(t.name(), "pseudo-anosov", "{word}");
            assert!((t.dilatation() - lambda).abs() < 1e-9, "{word}: {}", t.dilatation());
        }
    }

    #[test]
    fn reducibility_is_not_searched_for_pseudo_anosovs() {
        let f = s_1_2().unwrap().mapping_class("cbAAb").unwrap();
        let mut seen: Vec<f64> = Vec::new();
        let mut progress = FnProgress {
            report: |x: f64| seen.push(x),
            abort: || false,
        };
        f.nielsen_thurston_type(ClassifyCfg::default(), &mut progress).unwrap();
        // Splitting reports into the first half; the jump to 1 is the finish.
        let before_finish = &seen[..seen.len() - 1];
        assert!(before_finish.iter().all(|&x| x <= 0.5));
        assert_eq!(seen.last().copied(), Some(1.0));
    }

    #[test]
    fn progress_stays_monotone_across_searches() {
        let f = s_1_1().unwrap().mapping_class("aB").unwrap();
        let mut seen: Vec<f64> = Vec::new();
        let mut progress = FnProgress {
            report: |x: f64| seen.push(x),
            abort: || false,
        };
        f.nielsen_thurston_type(ClassifyCfg::default(), &mut progress).unwrap();
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!(seen.iter().all(|&x| (0.0..=1.0).contains(&x)));
    }
}
