use super::*;
use crate::error::FlipperError;
use nalgebra::DMatrix;

fn mat(rows: usize, cols: usize, data: &[i128]) -> IntMatrix {
    DMatrix::from_row_slice(rows, cols, data)
}

#[test]
fn integer_signs_and_helpers() {
    assert_eq!(Number::sign(&-3i64).unwrap(), Ordering::Less);
    assert_eq!(max_of(4i64, 7i64).unwrap(), 7);
    assert!(is_zero(&(5i64 - 5)).unwrap());
    let big = BigInt::from(10).pow(40);
    assert_eq!(Number::sign(&(big.clone() - big.clone())).unwrap(), Ordering::Equal);
    assert_eq!(compare(&big, &BigInt::from(1)).unwrap(), Ordering::Greater);
    assert_eq!(sum(&[1i64, 2, 3]), Some(6));
}

#[test]
fn golden_ratio_eigenvector() {
    let a = mat(2, 2, &[1, 1, 1, 0]);
    let (v, lambda) = AlgebraicCapability.perron_frobenius(&a).unwrap();
    assert!((lambda.to_f64() - 1.618_033_988_749_895).abs() < 1e-12);
    // λ² = λ + 1 exactly.
    let rel = lambda.clone() * lambda.clone() - lambda.clone();
    let one = lambda.field().integer(1);
    assert_eq!((rel - one).sign().unwrap(), Ordering::Equal);
    // A v = λ v.
    let av0 = v[0].clone() + v[1].clone();
    let av1 = v[0].clone();
    assert_eq!((av0 - lambda.clone() * v[0].clone()).sign().unwrap(), Ordering::Equal);
    assert_eq!((av1 - lambda * v[1].clone()).sign().unwrap(), Ordering::Equal);
    assert_eq!(v[0].sign().unwrap(), Ordering::Greater);
    assert_eq!(v[1].sign().unwrap(), Ordering::Greater);
}

#[test]
fn field_element_ordering_is_exact_for_small_gaps() {
    let a = mat(2, 2, &[2, 1, 1, 1]);
    let (_, lambda) = AlgebraicCapability.perron_frobenius(&a).unwrap();
    let f = lambda.field().clone();
    // λ = (3 + √5)/2 ≈ 2.618; compare against 2618/1000 from both sides.
    let x = lambda.mul_integer(1000).unwrap();
    assert_eq!(compare(&x, &f.integer(2618)).unwrap(), Ordering::Greater);
    assert_eq!(compare(&x, &f.integer(2619)).unwrap(), Ordering::Less);
    assert_eq!(x.projective_key(&f.integer(1000), 1_000_000).unwrap(), 2_618_033);
}

#[test]
fn projective_keys_are_exact_at_boundaries() {
    // 1/4 of the total sits exactly on a key boundary.
    assert_eq!(1i64.projective_key(&4, 100).unwrap(), 25);
    assert_eq!(3i64.projective_key(&12, 100).unwrap(), 25);
    let a = mat(2, 2, &[1, 1, 1, 0]);
    let (_, phi) = AlgebraicCapability.perron_frobenius(&a).unwrap();
    let f = phi.field().clone();
    // φ / (φ + φ²) = 1 / φ², and (φ - 1)² is the same number written differently.
    let total = phi.clone() + phi.clone() * phi.clone();
    let other = phi.clone() - f.integer(1);
    let key = phi.projective_key(&total, 1_000_000).unwrap();
    let same = (other.clone() * other).projective_key(&f.integer(1), 1_000_000).unwrap();
    assert_eq!(key, same);
    assert_eq!(key, 381_966);
    assert!(phi.projective_key(&f.integer(0), 10).is_err());
}

#[test]
fn tiny_values_keep_their_sign() {
    let a = mat(2, 2, &[1, 1, 1, 0]);
    let (_, phi) = AlgebraicCapability.perron_frobenius(&a).unwrap();
    let f = phi.field().clone();
    // (φ − 1)^371 ≈ 1.7e-78 with 258-bit coefficients.
    let small = phi.clone() - f.integer(1);
    let mut x = f.integer(1);
    for _ in 0..371 {
        x = x * small.clone();
    }
    assert_eq!(x.sign().unwrap(), Ordering::Greater);
    assert_eq!(x.mul_integer(-1).unwrap().sign().unwrap(), Ordering::Less);
}

#[test]
fn zero_is_decided_exactly_in_a_reducible_field() {
    // Characteristic polynomial (x² − 3x + 1)(x − 1); λ = (3 + √5)/2.
    let a = mat(3, 3, &[2, 1, 0, 1, 1, 0, 0, 0, 1]);
    let (v, lambda) = AlgebraicCapability.perron_frobenius(&a).unwrap();
    let f = lambda.field().clone();
    assert_eq!(f.degree(), 3);
    let vanishing = f.element(vec![1.into(), (-3).into(), 1.into()]);
    assert!(is_zero(&vanishing).unwrap());
    let product = vanishing.clone() * (lambda.clone() + f.integer(5));
    assert!(is_zero(&product).unwrap());
    assert_eq!((lambda.clone() - f.integer(1)).sign().unwrap(), Ordering::Greater);
    assert_eq!(v[2].sign().unwrap(), Ordering::Equal);
    assert_eq!(v[0].sign().unwrap(), Ordering::Greater);
}

#[test]
fn unit_circle_spectra_return() {
    // Cyclic permutations: every eigenvalue has modulus one.
    for n in 3..=10 {
        let p = crate::matrix::permutation(&(1..=n).map(|i| i % n).collect::<Vec<_>>());
        assert!(matches!(
            AlgebraicCapability.perron_frobenius(&p),
            Err(FlipperError::Assumption(_) | FlipperError::Computation(_))
        ));
    }
}

#[test]
fn integer_scaling_reports_overflow() {
    assert_eq!(7i64.mul_integer(-3).unwrap(), -21);
    assert!(matches!(
        i64::MAX.mul_integer(2),
        Err(FlipperError::Computation(_))
    ));
    assert!(BigInt::from(i64::MAX).mul_integer(2).unwrap() > BigInt::from(i64::MAX));
}

#[test]
fn non_dominant_spectrum_is_rejected() {
    let swap = mat(2, 2, &[0, 1, 1, 0]);
    assert!(matches!(
        AlgebraicCapability.perron_frobenius(&swap),
        Err(FlipperError::Assumption(_))
    ));
    let rotation = mat(2, 2, &[0, -1, 1, 0]);
    assert!(matches!(
        AlgebraicCapability.perron_frobenius(&rotation),
        Err(FlipperError::Assumption(_))
    ));
}

#[test]
fn diagonal_matrix_eigenvector() {
    let a = mat(2, 2, &[3, 0, 0, 1]);
    let (v, lambda) = AlgebraicCapability.perron_frobenius(&a).unwrap();
    assert!((lambda.to_f64() - 3.0).abs() < 1e-12);
    assert_eq!(v[1].sign().unwrap(), Ordering::Equal);
    assert_eq!(v[0].sign().unwrap(), Ordering::Greater);
}
