//! Total value conservation.
//!
//! The defining property of the rule: division remainders stay at the
//! toppling cell, so the multiplicity-weighted sum over the wedge never
//! drifts, whatever the numeric kind or the sign of the source.

use aether::{Aether2D, Aether3D};
use num_bigint::BigInt;
use num_rational::BigRational;

#[test]
fn bigint_2d_beyond_i64() {
    let initial = BigInt::from(i64::MAX) * BigInt::from(4);
    let mut ca = Aether2D::new(initial.clone()).unwrap();
    for _ in 0..25 {
        assert!(ca.step());
        assert_eq!(ca.total_value(), initial);
    }
}

#[test]
fn bigint_3d_beyond_i64() {
    let initial = BigInt::from(i64::MIN) * BigInt::from(3);
    let mut ca = Aether3D::new(initial.clone()).unwrap();
    for _ in 0..20 {
        assert!(ca.step());
        assert_eq!(ca.total_value(), initial);
    }
}

#[test]
fn bigint_below_i64_minimum_is_accepted() {
    // The i64 kind must reject this value; the unbounded kind evolves
    // it without complaint.
    let initial = BigInt::from(aether::MIN_INITIAL_VALUE_2D) * BigInt::from(2);
    let mut ca = Aether2D::new(initial.clone()).unwrap();
    for _ in 0..10 {
        ca.step();
    }
    assert_eq!(ca.total_value(), initial);
}

#[test]
fn rational_2d_unit_source() {
    let one = BigRational::from_integer(BigInt::from(1));
    let mut ca = Aether2D::new(one.clone()).unwrap();
    for _ in 0..20 {
        assert!(ca.step());
        assert_eq!(ca.total_value(), one);
    }
}

#[test]
fn rational_3d_negative_unit_source() {
    let minus_one = BigRational::from_integer(BigInt::from(-1));
    let mut ca = Aether3D::new(minus_one.clone()).unwrap();
    for _ in 0..12 {
        assert!(ca.step());
        assert_eq!(ca.total_value(), minus_one);
    }
}

#[test]
fn zero_source_is_inert() {
    let mut flat = Aether2D::new(0i64).unwrap();
    assert!(!flat.step());
    assert_eq!(flat.changed(), Some(false));
    assert_eq!(flat.value_at(5, 0), 0);
    assert_eq!(flat.total_value(), 0);

    let mut flat3 = Aether3D::new(0i64).unwrap();
    assert!(!flat3.step());
    assert_eq!(flat3.total_value(), 0);
}

#[test]
fn i64_settles_and_stays_settled() {
    let mut ca = Aether2D::new(20_000i64).unwrap();
    let mut steps = 0u32;
    while ca.step() {
        steps += 1;
        assert!(steps < 100_000, "did not settle");
    }
    assert_eq!(ca.total_value(), 20_000);
    // Once nothing topples the configuration is final.
    assert!(!ca.step());
    assert_eq!(ca.changed(), Some(false));
}
