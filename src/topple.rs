//! The toppling rule.
//!
//! A resident value redistributes toward strictly lesser neighbors,
//! processed in descending value order. `symmetry_count` is how many
//! logical neighbors a stored neighbor stands for (its orbit share of
//! the von Neumann neighborhood); `share_multiplier` is how many shares
//! land on the stored cell itself. The division remainder is folded back
//! into the resident, so no amount is ever lost.

use crate::cell::CellValue;

/// Which slice of the three-slice write window a deposit lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SliceSel {
    Smaller,
    Current,
    Greater,
}

/// A relevant (strictly lesser) neighbor of the position being toppled.
#[derive(Debug, Clone)]
pub(crate) struct Neighbor<T, C> {
    pub value: T,
    pub target: C,
    pub share_multiplier: u32,
    pub symmetry_count: u32,
}

impl<T, C> Neighbor<T, C> {
    pub(crate) fn new(value: T, target: C, share_multiplier: u32, symmetry_count: u32) -> Self {
        Neighbor {
            value,
            target,
            share_multiplier,
            symmetry_count,
        }
    }
}

/// Topple one position over its relevant neighbors.
///
/// `value` is the resident amount, `neighbors` the strictly lesser
/// neighbors (any order; sorted in place). Shares are emitted through
/// `deposit`; the returned value is what the resident keeps, which the
/// caller must still deposit at the position itself. The flag reports
/// whether any share was actually passed.
///
/// One division round runs per distinct neighbor value: the excess over
/// that value is split `excess / share_count` ways, every neighbor at or
/// below it receives `share * share_multiplier`, and the resident keeps
/// `value - excess + remainder + share`. Between rounds the share count
/// drops by the settled neighbor's symmetry count; neighbors tied with
/// an earlier value skip their own round but still shrink the count.
pub(crate) fn topple<T: CellValue, C: Copy>(
    value: &T,
    neighbors: &mut [Neighbor<T, C>],
    mut deposit: impl FnMut(C, T),
) -> (T, bool) {
    let mut value = value.clone();
    if neighbors.is_empty() {
        return (value, false);
    }
    neighbors.sort_by(|a, b| b.value.cmp(&a.value));
    let mut share_count: u32 = neighbors.iter().map(|n| n.symmetry_count).sum::<u32>() + 1;
    let mut toppled = false;
    for i in 0..neighbors.len() {
        let is_new_round = i == 0 || neighbors[i].value != neighbors[i - 1].value;
        if is_new_round {
            let to_share = value.sub(&neighbors[i].value);
            let (share, remainder) = to_share.div_rem_shares(share_count);
            if !share.is_zero() {
                toppled = true;
                value = value.sub(&to_share).add(&remainder).add(&share);
                for neighbor in &neighbors[i..] {
                    deposit(neighbor.target, share.mul_small(neighbor.share_multiplier));
                }
            }
        }
        share_count -= neighbors[i].symmetry_count;
    }
    (value, toppled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use num_rational::BigRational;

    fn run(value: i64, neighbors: &[(i64, u32, u32)]) -> (i64, bool, Vec<i64>) {
        let mut descriptors: Vec<Neighbor<i64, usize>> = neighbors
            .iter()
            .enumerate()
            .map(|(i, &(v, mult, sym))| Neighbor::new(v, i, mult, sym))
            .collect();
        let mut received = vec![0i64; neighbors.len()];
        let (resident, toppled) = topple(&value, &mut descriptors, |i, amount| {
            received[i] += amount;
        });
        (resident, toppled, received)
    }

    #[test]
    fn no_neighbors_carries_value() {
        let (resident, toppled, _) = run(42, &[]);
        assert_eq!(resident, 42);
        assert!(!toppled);
    }

    #[test]
    fn origin_division_keeps_remainder() {
        // The single-source origin: six logical neighbors folded into one
        // stored cell.
        let (resident, toppled, received) = run(1_000_000, &[(0, 1, 6)]);
        assert!(toppled);
        assert_eq!(resident, 142_858);
        assert_eq!(received[0], 142_857);
        assert_eq!(resident + 6 * received[0], 1_000_000);
    }

    #[test]
    fn equal_neighbors_settle_in_one_round() {
        let (resident, toppled, received) = run(9, &[(0, 1, 1), (0, 1, 1)]);
        assert!(toppled);
        assert_eq!(resident, 3);
        assert_eq!(received, vec![3, 3]);
    }

    #[test]
    fn higher_neighbor_settles_first_and_drops_out() {
        // Descending rounds: the excess over 8 is too small to split three
        // ways, so only the lesser neighbor receives anything and the
        // share count shrinks in between.
        let (resident, toppled, received) = run(10, &[(4, 1, 1), (8, 1, 1)]);
        assert!(toppled);
        assert_eq!(resident, 7);
        assert_eq!(received, vec![3, 0]);
    }

    #[test]
    fn too_small_excess_does_not_topple() {
        let (resident, toppled, received) = run(3, &[(2, 1, 1), (2, 1, 1)]);
        assert!(!toppled);
        assert_eq!(resident, 3);
        assert_eq!(received, vec![0, 0]);
    }

    #[test]
    fn multiplier_scales_deposits_only() {
        // A stored cell standing on a symmetry axis receives two shares.
        let (resident, _, received) = run(70, &[(0, 2, 2), (0, 1, 4)]);
        // share_count = 7, share = 10; resident keeps 70 - 70 + 0 + 10.
        assert_eq!(resident, 10);
        assert_eq!(received, vec![20, 10]);
        assert_eq!(resident + 2 * 10 + 4 * 10, 70);
    }

    #[test]
    fn negative_values_redistribute_upward() {
        // A deficit flows the same way: -7 over a zero neighborhood.
        let (resident, toppled, received) = run(0, &[(-7, 1, 1)]);
        assert!(toppled);
        // to_share = 7, share_count = 2, share = 3, remainder = 1.
        assert_eq!(resident, 0 - 7 + 1 + 3);
        assert_eq!(received, vec![3]);
    }

    #[test]
    fn rational_division_is_exact() {
        let one = BigRational::from_integer(BigInt::from(1));
        let mut descriptors = vec![Neighbor::new(
            BigRational::from_integer(BigInt::from(0)),
            0usize,
            1,
            4,
        )];
        let mut received = BigRational::from_integer(BigInt::from(0));
        let (resident, toppled) = topple(&one, &mut descriptors, |_, amount| {
            received += amount;
        });
        assert!(toppled);
        let fifth = BigRational::new(BigInt::from(1), BigInt::from(5));
        assert_eq!(resident, fifth);
        assert_eq!(received, fifth);
    }
}
