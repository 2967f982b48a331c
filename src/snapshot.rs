//! JSON state persistence.
//!
//! A snapshot carries a small header alongside the grid so that a file
//! cannot be restored as a different model, dimension, or numeric kind.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::cell::NumericKind;
use crate::error::AetherError;

pub(crate) const MODEL_NAME: &str = "aether";

/// Serialized automaton state.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot<T, G> {
    pub model: String,
    pub dimension: u8,
    pub kind: NumericKind,
    pub initial_value: T,
    pub step: u64,
    pub max_x: usize,
    pub grid: G,
}

impl<T, G> Snapshot<T, G>
where
    T: Serialize + DeserializeOwned,
    G: Serialize + DeserializeOwned,
{
    pub(crate) fn write(&self, path: &Path) -> Result<(), AetherError> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    pub(crate) fn read(path: &Path) -> Result<Self, AetherError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub(crate) fn validate(&self, dimension: u8, kind: NumericKind) -> Result<(), AetherError> {
        if self.model != MODEL_NAME {
            return Err(AetherError::SnapshotModelMismatch {
                expected: MODEL_NAME.to_string(),
                got: self.model.clone(),
            });
        }
        if self.dimension != dimension {
            return Err(AetherError::SnapshotDimensionMismatch {
                expected: dimension,
                got: self.dimension,
            });
        }
        if self.kind != kind {
            return Err(AetherError::SnapshotKindMismatch {
                expected: kind,
                got: self.kind,
            });
        }
        Ok(())
    }
}
