//! Crate error type.

use thiserror::Error;

use crate::cell::NumericKind;

/// Errors surfaced by automaton construction and state persistence.
#[derive(Debug, Error)]
pub enum AetherError {
    /// The single-source initial value is below the minimum the bounded
    /// numeric kind can evolve without overflow.
    #[error("initial value {got} is below the minimum {min} allowed for this numeric kind")]
    InitialValueTooSmall { min: String, got: String },

    /// The requested random value range could overflow during evolution.
    #[error("random configuration range [{min}, {max}] can overflow during evolution")]
    RangeTooWide { min: i64, max: i64 },

    /// The random range is empty.
    #[error("random configuration range [{min}, {max}] is empty")]
    EmptyRange { min: i64, max: i64 },

    /// The random configuration square has no cells.
    #[error("initial side must be at least one")]
    ZeroInitialSide,

    /// A snapshot file was produced by a different model.
    #[error("snapshot belongs to model {got:?}, expected {expected:?}")]
    SnapshotModelMismatch { expected: String, got: String },

    /// A snapshot file has the wrong grid dimension.
    #[error("snapshot is {got}-dimensional, expected {expected}")]
    SnapshotDimensionMismatch { expected: u8, got: u8 },

    /// A snapshot file stores a different numeric kind.
    #[error("snapshot stores {got:?} values, expected {expected:?}")]
    SnapshotKindMismatch { expected: NumericKind, got: NumericKind },

    /// A snapshot's grid payload disagrees with its recorded extent.
    #[error("snapshot grid does not match its recorded extent (max_x {max_x})")]
    SnapshotGridCorrupt { max_x: usize },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}
