//! Property-based tests over random initial conditions:
//! - total value conservation in both dimensions
//! - folded wedge agrees with the full-grid reference
//! - random configurations conserve their seeded total
//! - the populated region grows by at most one slice per step

use aether::{Aether2D, Aether3D, AetherRandomConfiguration2D, AetherSimple2D};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn conservation_2d(initial in -100_000i64..=100_000) {
        let mut ca = Aether2D::new(initial).unwrap();
        for _ in 0..8 {
            ca.step();
        }
        prop_assert_eq!(ca.total_value(), initial);
    }

    #[test]
    fn conservation_3d(initial in -500_000i64..=500_000) {
        let mut ca = Aether3D::new(initial).unwrap();
        for _ in 0..6 {
            ca.step();
        }
        prop_assert_eq!(ca.total_value(), initial);
    }

    #[test]
    fn wedge_matches_reference(initial in -20_000i64..=20_000) {
        let mut wedge = Aether2D::new(initial).unwrap();
        let mut reference = AetherSimple2D::new(initial);
        for _ in 0..6 {
            wedge.step();
            reference.step();
        }
        for x in -8i64..=8 {
            for y in -8i64..=8 {
                prop_assert_eq!(
                    wedge.value_at(x, y),
                    reference.value_at(x, y),
                    "cell ({}, {})",
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn random_configuration_conserves(
        side in 1usize..=6,
        seed in any::<u64>(),
        lo in -500i64..=500,
        hi in -500i64..=500,
    ) {
        let (min, max) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let mut ca = AetherRandomConfiguration2D::new(side, min, max, seed).unwrap();
        let total = ca.total_value();
        for _ in 0..6 {
            ca.step();
        }
        prop_assert_eq!(ca.total_value(), total);
    }

    #[test]
    fn populated_region_grows_slowly(initial in 0i64..=5_000_000) {
        let mut ca = Aether2D::new(initial).unwrap();
        let mut previous = ca.current_max_x();
        for _ in 0..10 {
            ca.step();
            prop_assert!(ca.current_max_x() >= previous);
            prop_assert!(ca.current_max_x() <= previous + 1);
            previous = ca.current_max_x();
        }
    }
}
