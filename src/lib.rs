//! Aether: an abelian sandpile-like cellular automaton with exact
//! arithmetic.
//!
//! At every step each cell redistributes its value toward strictly
//! lesser von Neumann neighbors, higher neighbors settling first, with
//! division remainders kept at the cell so the total is conserved
//! exactly. Single-source configurations inherit the full symmetry of
//! the grid, so [`Aether2D`] and [`Aether3D`] store only the wedge
//! `x >= y >= (z >=) 0` and sweep it one x-slice at a time; each stored
//! cell carries the share accounting for its whole orbit.
//!
//! Three numeric kinds plug into the same engine through [`CellValue`]:
//! `i64` (fastest, initial value bounded below), [`num_bigint::BigInt`]
//! (unbounded), and [`num_rational::BigRational`] (exact division, no
//! remainders; with a source of `+-1` this yields the "infinity"
//! variant where every active cell topples every step).
//!
//! ```
//! use aether::Aether3D;
//!
//! let mut ca = Aether3D::new(10_000i64)?;
//! while ca.step() {}
//! assert_eq!(ca.total_value(), 10_000);
//! # Ok::<(), aether::AetherError>(())
//! ```
//!
//! [`AetherSimple2D`] and [`AetherSimple3D`] are unfolded full-grid
//! implementations used as oracles, and [`AetherRandomConfiguration2D`]
//! evolves a random square seed.

pub mod cell;
pub mod error;
pub mod grid;
pub mod simple;
pub mod snapshot;
mod topple;

mod aether2d;
mod aether3d;

pub use crate::aether2d::Aether2D;
pub use crate::aether3d::Aether3D;
pub use crate::cell::{
    max_neighboring_values_difference, min_allowed_single_source_value, CellValue, NumericKind,
    MIN_INITIAL_VALUE_2D, MIN_INITIAL_VALUE_3D,
};
pub use crate::error::AetherError;
pub use crate::simple::{AetherRandomConfiguration2D, AetherSimple2D, AetherSimple3D};
