//! Exact cell arithmetic.
//!
//! The toppling rule only needs a handful of operations: comparison,
//! addition and subtraction, multiplication by a tiny constant, and a
//! division that keeps its remainder. [`CellValue`] captures exactly that
//! surface so the engine runs unchanged over machine integers, arbitrary
//! precision integers, and exact rationals.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Largest single-source magnitude (negated) a 2D `i64` automaton can
/// evolve without overflow.
pub const MIN_INITIAL_VALUE_2D: i64 = -6148914691236517205;

/// Largest single-source magnitude (negated) a 3D `i64` automaton can
/// evolve without overflow.
pub const MIN_INITIAL_VALUE_3D: i64 = -3689348814741910323;

/// Tag identifying the numeric kind a grid stores. Persisted in
/// snapshots so state cannot be reloaded under a different kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumericKind {
    Int64,
    BigInt,
    Rational,
}

/// Cell value arithmetic used by the toppling engine.
///
/// Division dividends are always non-negative at call sites (only the
/// strict excess over a lesser neighbor is ever divided), so truncating
/// and floor division coincide for the integer kinds.
pub trait CellValue: Clone + Ord + std::fmt::Debug + Serialize + DeserializeOwned {
    /// Kind tag for persistence.
    const KIND: NumericKind;

    fn zero() -> Self;

    fn is_zero(&self) -> bool;

    fn from_i64(v: i64) -> Self;

    fn add(&self, other: &Self) -> Self;

    fn sub(&self, other: &Self) -> Self;

    /// Multiplication by a small constant: a share multiplier or an
    /// orbit multiplicity.
    fn mul_small(&self, k: u32) -> Self;

    /// Division by a share count with exact remainder:
    /// `q * divisor + r == self`. Rational values divide exactly and
    /// return a zero remainder.
    fn div_rem_shares(&self, divisor: u32) -> (Self, Self);

    /// Minimum single-source value this kind can evolve in the given
    /// dimension without overflow, or `None` when unbounded.
    fn min_initial_value(dimension: u8) -> Option<Self>;
}

impl CellValue for i64 {
    const KIND: NumericKind = NumericKind::Int64;

    fn zero() -> Self {
        0
    }

    fn is_zero(&self) -> bool {
        *self == 0
    }

    fn from_i64(v: i64) -> Self {
        v
    }

    fn add(&self, other: &Self) -> Self {
        self + other
    }

    fn sub(&self, other: &Self) -> Self {
        self - other
    }

    fn mul_small(&self, k: u32) -> Self {
        self * i64::from(k)
    }

    fn div_rem_shares(&self, divisor: u32) -> (Self, Self) {
        let d = i64::from(divisor);
        (self / d, self % d)
    }

    fn min_initial_value(dimension: u8) -> Option<Self> {
        match dimension {
            2 => Some(MIN_INITIAL_VALUE_2D),
            3 => Some(MIN_INITIAL_VALUE_3D),
            _ => None,
        }
    }
}

impl CellValue for BigInt {
    const KIND: NumericKind = NumericKind::BigInt;

    fn zero() -> Self {
        Zero::zero()
    }

    fn is_zero(&self) -> bool {
        Zero::is_zero(self)
    }

    fn from_i64(v: i64) -> Self {
        BigInt::from(v)
    }

    fn add(&self, other: &Self) -> Self {
        self + other
    }

    fn sub(&self, other: &Self) -> Self {
        self - other
    }

    fn mul_small(&self, k: u32) -> Self {
        self * BigInt::from(k)
    }

    fn div_rem_shares(&self, divisor: u32) -> (Self, Self) {
        let d = BigInt::from(divisor);
        (self / &d, self % &d)
    }

    fn min_initial_value(_dimension: u8) -> Option<Self> {
        None
    }
}

impl CellValue for BigRational {
    const KIND: NumericKind = NumericKind::Rational;

    fn zero() -> Self {
        Zero::zero()
    }

    fn is_zero(&self) -> bool {
        Zero::is_zero(self)
    }

    fn from_i64(v: i64) -> Self {
        BigRational::from_integer(BigInt::from(v))
    }

    fn add(&self, other: &Self) -> Self {
        self + other
    }

    fn sub(&self, other: &Self) -> Self {
        self - other
    }

    fn mul_small(&self, k: u32) -> Self {
        self * BigRational::from_integer(BigInt::from(k))
    }

    fn div_rem_shares(&self, divisor: u32) -> (Self, Self) {
        let q = self / BigRational::from_integer(BigInt::from(divisor));
        (q, Zero::zero())
    }

    fn min_initial_value(_dimension: u8) -> Option<Self> {
        None
    }
}

/// Maximum value difference between neighbors over the whole evolution
/// of a single-source configuration.
///
/// For non-negative sources the difference never exceeds the source
/// itself. Negative sources overshoot: the origin can climb past zero
/// while its neighbors still hold shares of the original deficit.
pub fn max_neighboring_values_difference(dimension: u8, source_value: &BigInt) -> BigInt {
    assert!(dimension > 0, "dimension must be greater than zero");
    if source_value.is_negative() {
        if dimension > 1 {
            let double_dim_plus_one = BigInt::from(2 * u32::from(dimension) + 1);
            (source_value + (-source_value / BigInt::from(2)) * double_dim_plus_one).abs()
        } else {
            -source_value
        }
    } else {
        source_value.clone()
    }
}

/// Minimum (most negative) single-source value whose evolution keeps
/// every neighbor difference within `max_allowed_value`.
///
/// This is how the bounded-kind minima ([`MIN_INITIAL_VALUE_2D`],
/// [`MIN_INITIAL_VALUE_3D`]) are derived, with `i64::MAX` as the bound.
pub fn min_allowed_single_source_value(dimension: u8, max_allowed_value: &BigInt) -> BigInt {
    assert!(
        !max_allowed_value.is_negative(),
        "max allowed value cannot be negative"
    );
    assert!(dimension > 0, "dimension must be greater than zero");
    if Zero::is_zero(max_allowed_value) {
        return Zero::zero();
    }
    if dimension == 1 {
        return -max_allowed_value;
    }
    let double_dim_minus_one = BigInt::from(2 * u32::from(dimension) - 1);
    if *max_allowed_value < double_dim_minus_one {
        return BigInt::from(-1);
    }
    let candidate = (BigInt::from(2) * max_allowed_value) / -&double_dim_minus_one;
    // The division can be off by one toward zero.
    let lower = &candidate - 1u32;
    if max_neighboring_values_difference(dimension, &lower) > *max_allowed_value {
        candidate
    } else {
        lower
    }
}
