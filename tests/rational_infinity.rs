//! The rational "infinity" regime.
//!
//! With exact division there are no remainders and no thresholds: a
//! unit source never stops spreading, and activity strictly alternates
//! between the two checkerboard colors of the grid. At step `s` the
//! cells that topple are exactly the active cells whose coordinate-sum
//! parity matches the turn.

use aether::{Aether2D, AetherSimple2D};
use num_bigint::BigInt;
use num_rational::BigRational;

fn rational(n: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(n))
}

#[test]
fn positive_unit_source_topples_forever() {
    let mut ca = Aether2D::new(rational(1)).unwrap();
    for _ in 0..30 {
        assert!(ca.step());
    }
    assert_eq!(ca.total_value(), rational(1));
}

fn assert_alternation(initial: i64, first_turn_parity: i64, steps: u64) {
    let mut ca = AetherSimple2D::new(rational(initial));
    for step in 1..=steps {
        assert!(ca.step());
        // Which checkerboard color is allowed to topple this step.
        let expected_parity = (first_turn_parity + i64::try_from(step).unwrap() + 1) % 2;
        let radius = i64::try_from(step).unwrap() + 2;
        let mut toppled_count = 0u32;
        for x in -radius..=radius {
            for y in -radius..=radius {
                if ca.toppled_at(x, y) {
                    toppled_count += 1;
                    assert_eq!(
                        (x + y).rem_euclid(2),
                        expected_parity,
                        "step {step}, cell ({x}, {y})"
                    );
                }
            }
        }
        assert!(toppled_count > 0, "step {step} toppled nothing");
    }
}

#[test]
fn positive_source_alternation() {
    // The origin (even parity) topples on the first step.
    assert_alternation(1, 0, 16);
}

#[test]
fn negative_source_alternation() {
    // A deficit cannot topple; its four neighbors (odd parity) do.
    assert_alternation(-1, 1, 16);
}

#[test]
fn wedge_matches_reference_for_rationals() {
    let mut wedge = Aether2D::new(rational(1)).unwrap();
    let mut reference = AetherSimple2D::new(rational(1));
    for step in 1..=12 {
        wedge.step();
        reference.step();
        for x in -10i64..=10 {
            for y in -10i64..=10 {
                assert_eq!(
                    wedge.value_at(x, y),
                    reference.value_at(x, y),
                    "step {step}, cell ({x}, {y})"
                );
            }
        }
    }
}
