//! Invariant laminations of pseudo-Anosov mapping classes.
//!
//! How
//! - Iterate the key curves under the mapping class with exact `BigInt`
//!   weights. Once an iterate is projectively close to its predecessor, the
//!   orbit has settled into one linear cell of the encoding; the Perron–Frobenius
//!   eigenvector of that cell's action is the candidate lamination.
//! - A candidate is accepted only if it lies in its cell, is fixed exactly
//!   (`f(v) = λ·v`), and `λ > 1`. Otherwise the convergence was spurious and the
//!   iteration continues.
//!
//! Failure modes
//! - `Assumption`: not a mapping class, or periodic.
//! - `Computation`: no accepted candidate within `max_iterations`. For a
//!   reducible class this is the expected outcome; it is evidence, not proof.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::cfg::InvariantCfg;
use crate::encoding::Encoding;
use crate::error::{FlipperError, Result};
use crate::lamination::Lamination;
use crate::matrix;
use crate::number::{compare, sum, Number, NumberCapability};

/// Dilatation and projective class of the stable lamination.
#[derive(Clone, Debug)]
pub struct InvariantLamination<N> {
    pub dilatation: N,
    pub lamination: Lamination<N>,
}

/// `|a_i·ΣB − b_i·ΣA|·R < ΣA·ΣB` for every coordinate.
fn projectively_close(a: &[BigInt], b: &[BigInt], closeness: i64) -> bool {
    let sa: BigInt = a.iter().sum();
    let sb: BigInt = b.iter().sum();
    if sa.is_zero() || sb.is_zero() {
        return false;
    }
    let bound = &sa * &sb;
    let r = BigInt::from(closeness);
    a.iter()
        .zip(b)
        .all(|(p, q)| (p * &sb - q * &sa).abs() * &r < bound)
}

impl Encoding {
    /// Stable lamination and dilatation of a pseudo-Anosov mapping class.
    pub fn invariant_lamination<C: NumberCapability>(
        &self,
        capability: &C,
        cfg: InvariantCfg,
    ) -> Result<InvariantLamination<C::Number>> {
        if !self.is_mapping_class() {
            return Err(FlipperError::assumption("not a mapping class"));
        }
        if self.is_periodic()? {
            return Err(FlipperError::assumption("mapping class is periodic"));
        }
        let mut curves: Vec<Vec<BigInt>> = self
            .source()
            .key_curves()
            .iter()
            .map(|w| w.iter().map(|&x| BigInt::from(x)).collect())
            .collect();

        for i in 0..cfg.max_iterations {
            let next: Vec<Vec<BigInt>> = curves
                .iter()
                .map(|c| self.apply(c))
                .collect::<Result<_>>()?;
            if i >= cfg.min_iterations {
                for (old, new) in curves.iter().zip(&next) {
                    if !projectively_close(old, new, cfg.closeness) {
                        continue;
                    }
                    if let Some(found) = self.try_candidate(capability, new)? {
                        tracing::debug!(
                            iterations = i + 1,
                            dilatation = found.dilatation.to_f64(),
                            "invariant lamination found"
                        );
                        return Ok(found);
                    }
                    tracing::trace!(iteration = i, "spurious convergence");
                }
            }
            curves = next;
        }
        Err(FlipperError::computation(format!(
            "no invariant lamination after {} iterations",
            cfg.max_iterations
        )))
    }

    /// Eigenvector of the cell `v` lies in, if it is a genuine invariant
    /// lamination.
    fn try_candidate<C: NumberCapability>(
        &self,
        capability: &C,
        v: &[BigInt],
    ) -> Result<Option<InvariantLamination<C::Number>>> {
        let cell = self.applied_function(v)?;
        let (vector, dilatation) = match capability.perron_frobenius(&cell.action) {
            Ok(found) => found,
            Err(FlipperError::Aborted) => return Err(FlipperError::Aborted),
            Err(reason) => {
                tracing::trace!(%reason, "cell has no usable Perron–Frobenius eigenvector");
                return Ok(None);
            }
        };
        for x in &vector {
            if x.sign()? == Ordering::Less {
                return Ok(None);
            }
        }
        if !matrix::satisfies(&cell.condition, &vector)?
            || !self.source().satisfies_triangle_inequalities(&vector)?
        {
            return Ok(None);
        }
        let image = self.apply(&vector)?;
        for (x, y) in image.iter().zip(&vector) {
            if compare(x, &(dilatation.clone() * y.clone()))? != Ordering::Equal {
                return Ok(None);
            }
        }
        // λ > 1 iff the total weight grows.
        let (Some(before), Some(after)) = (sum(&vector), sum(&image)) else {
            return Ok(None);
        };
        if compare(&after, &before)? != Ordering::Greater {
            return Ok(None);
        }
        Ok(Some(InvariantLamination {
            dilatation,
            lamination: Lamination::new(self.source().clone(), vector),
        }))
    }
}
