use super::tagged::projectively_equal;
use super::*;
use crate::cfg::InvariantCfg;
use crate::error::FlipperError;
use crate::matrix::IntMatrix;
use crate::number::{compare, AlgebraicCapability, FieldElement, NumberCapability};
use crate::progress::NoProgress;
use crate::surfaces::s_1_2;
use crate::triangulation::Triangulation;
use std::cmp::Ordering;
use std::sync::Arc;

fn torus() -> Arc<Triangulation> {
    Arc::new(Triangulation::new(vec![[0, 2, 1], [0, 2, 1]]))
}

/// `(φ + 1, 1, φ)` with `φ` the golden ratio: the stable lamination of the
/// cat map on the punctured torus.
fn golden_lamination() -> Lamination<FieldElement> {
    let fib = IntMatrix::from_row_slice(2, 2, &[1, 1, 1, 0]);
    let (_, phi) = AlgebraicCapability.perron_frobenius(&fib).unwrap();
    let one = phi.field().integer(1);
    Lamination::new(torus(), vec![phi.clone() + one.clone(), one, phi])
}

#[test]
fn cat_map_splits_with_period_two() {
    let l = golden_lamination();
    let s = l.splitting_sequence(SplittingCfg::default(), &mut NoProgress).unwrap();
    assert!(s.preperiodic.is_empty());
    assert_eq!(s.periodic, vec![Step::Flip(0), Step::Flip(2)]);
    assert!((s.dilatation() - (3.0 + 5f64.sqrt()) / 2.0).abs() < 1e-9);
    assert!(!s.isometries.is_empty());
    // Replaying the period returns to the same projective lamination.
    let end = replay(&s.lamination, &s.periodic).unwrap();
    for iso in &s.isometries {
        let mapped = iso.apply(end.weights());
        assert!(projectively_equal(&mapped, s.lamination.weights()).unwrap());
    }
}

#[test]
fn invariant_lamination_feeds_the_splitting() {
    let t = torus();
    let a = Lamination::new(t.clone(), vec![1i64, 1, 0]).encode_twist(1).unwrap();
    let b_inv = Lamination::new(t, vec![0i64, 1, 1]).encode_twist(-1).unwrap();
    let found = (&a * &b_inv)
        .invariant_lamination(&AlgebraicCapability, InvariantCfg::default())
        .unwrap();
    let s = found
        .lamination
        .splitting_sequence(SplittingCfg::default(), &mut NoProgress)
        .unwrap();
    assert_eq!(s.periodic.len(), 2);
    // One period shrinks by exactly the dilatation.
    let (before, after) = s.scale.clone();
    assert_eq!(compare(&(found.dilatation * after), &before).unwrap(), Ordering::Equal);
}

#[test]
fn twice_punctured_torus_splitting_is_periodic() {
    let f = s_1_2().unwrap().mapping_class("abCb").unwrap();
    let found = f
        .invariant_lamination(&AlgebraicCapability, InvariantCfg::default())
        .unwrap();
    let s = found
        .lamination
        .splitting_sequence(SplittingCfg::default(), &mut NoProgress)
        .unwrap();
    assert_eq!((s.preperiodic.len(), s.periodic.len()), (7, 6));
    assert!((s.dilatation() - (3.0 + 5f64.sqrt()) / 2.0).abs() < 1e-9);
    // The prefix leads to the periodic state, and the period returns to it.
    let start = replay(&s.initial, &s.preperiodic).unwrap();
    assert!(start.same_as(&s.lamination).unwrap());
    let end = replay(&s.lamination, &s.periodic).unwrap();
    assert!(!s.isometries.is_empty());
    for iso in &s.isometries {
        let mapped = iso.apply(end.weights());
        assert!(projectively_equal(&mapped, s.lamination.weights()).unwrap());
    }
}

#[test]
fn zero_weights_and_curves_are_not_filling() {
    let l = Lamination::new(torus(), vec![1i64, 1, 0]);
    let err = l.splitting_sequence(SplittingCfg::default(), &mut NoProgress);
    assert!(matches!(err, Err(FlipperError::Assumption(_))));
    // Flipping the heavy edge of a curve reaches weight zero on a loop.
    let curve = Lamination::new(torus(), vec![1i64, 1, 2]);
    let err = curve.splitting_sequence(SplittingCfg::default(), &mut NoProgress);
    assert!(matches!(err, Err(FlipperError::Assumption(_))));
}

#[test]
fn puncturing_trigons() {
    let l = Lamination::new(torus(), vec![2i64, 2, 2]);
    let (p, real) = l.puncture_trigons().unwrap();
    let t = p.triangulation();
    assert_eq!((t.num_triangles(), t.zeta(), t.num_vertices()), (6, 9, 3));
    assert_eq!(real.iter().filter(|&&r| r).count(), 1);
    assert_eq!(&p.weights()[..3], &[4, 4, 4]);
    assert!(p.weights()[3..].iter().all(|&w| w == 2));
    assert!(t.satisfies_triangle_inequalities(p.weights()).unwrap());
    // No trigon, no change.
    let (same, real) = Lamination::new(torus(), vec![1i64, 1, 2]).puncture_trigons().unwrap();
    assert_eq!(same.weights(), &[1, 1, 2][..]);
    assert_eq!(real, vec![true]);
}

#[test]
fn collapsing_a_trivial_edge() {
    let square = Arc::new(Triangulation::new(vec![[0, 1, 2], [0, 2, 3], [4, 5, 1], [4, 3, 5]]));
    let l = Lamination::new(square, vec![0i64, 3, 3, 3, 5, 4]);
    let (folded, vertex_map) = l.collapse_trivial_weight(0).unwrap();
    assert_eq!(folded.triangulation().zeta(), 3);
    assert_eq!(vertex_map.len(), 4);
    let mut weights = folded.weights().to_vec();
    weights.sort();
    assert_eq!(weights, vec![3, 4, 5]);
    assert!(matches!(
        l.collapse_trivial_weight(1),
        Err(FlipperError::Assumption(_))
    ));
}

#[test]
fn splitting_can_be_aborted() {
    let mut progress = crate::progress::FnProgress {
        report: |_: f64| {},
        abort: || true,
    };
    let err = golden_lamination().splitting_sequence(SplittingCfg::default(), &mut progress);
    assert_eq!(err.unwrap_err(), FlipperError::Aborted);
}
