//! Fundamental-domain grid storage.
//!
//! The Aether rule is invariant under coordinate permutation and sign
//! flip, so only the wedge `x >= y >= 0` (2D) or `x >= y >= z >= 0` (3D)
//! is stored. Slices are jagged: slice `x` holds `x + 1` values in 2D
//! and a flattened triangle of `(x + 1)(x + 2) / 2` values in 3D.
//! Reads at arbitrary coordinates canonicalize first; reads beyond the
//! allocated slices are zero.

use serde::{Deserialize, Serialize};

use crate::cell::CellValue;

/// Orbit size of a canonical 2D point under permutation and sign flip.
pub fn multiplicity_2d(x: usize, y: usize) -> u32 {
    debug_assert!(x >= y);
    let perms = if x == y { 1 } else { 2 };
    let nonzero = (x != 0) as u32 + (y != 0) as u32;
    perms << nonzero
}

/// Orbit size of a canonical 3D point under permutation and sign flip.
pub fn multiplicity_3d(x: usize, y: usize, z: usize) -> u32 {
    debug_assert!(x >= y && y >= z);
    let perms = if x == y && y == z {
        1
    } else if x == y || y == z {
        3
    } else {
        6
    };
    let nonzero = (x != 0) as u32 + (y != 0) as u32 + (z != 0) as u32;
    perms << nonzero
}

/// Map an arbitrary 2D coordinate to its canonical representative.
pub fn canonical_2d(x: i64, y: i64) -> (usize, usize) {
    let mut c = [x.unsigned_abs() as usize, y.unsigned_abs() as usize];
    if c[0] < c[1] {
        c.swap(0, 1);
    }
    (c[0], c[1])
}

/// Map an arbitrary 3D coordinate to its canonical representative.
pub fn canonical_3d(x: i64, y: i64, z: i64) -> (usize, usize, usize) {
    let mut c = [
        x.unsigned_abs() as usize,
        y.unsigned_abs() as usize,
        z.unsigned_abs() as usize,
    ];
    c.sort_unstable();
    (c[2], c[1], c[0])
}

/// One X-slice of the 2D wedge: values for `y = 0..=x`.
pub type Slice2<T> = Vec<T>;

pub(crate) fn new_slice_2<T: CellValue>(x: usize) -> Slice2<T> {
    vec![T::zero(); x + 1]
}

/// One X-slice of the 3D wedge, flattened row by row: `(y, z)` lives at
/// `y * (y + 1) / 2 + z`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice3<T> {
    cells: Vec<T>,
}

impl<T: CellValue> Slice3<T> {
    pub(crate) fn new(x: usize) -> Self {
        Slice3 {
            cells: vec![T::zero(); (x + 1) * (x + 2) / 2],
        }
    }

    #[inline]
    fn index(y: usize, z: usize) -> usize {
        debug_assert!(z <= y);
        y * (y + 1) / 2 + z
    }

    #[inline]
    pub(crate) fn get(&self, y: usize, z: usize) -> &T {
        &self.cells[Self::index(y, z)]
    }

    #[inline]
    pub(crate) fn add(&mut self, y: usize, z: usize, delta: T) {
        let i = Self::index(y, z);
        self.cells[i] = self.cells[i].add(&delta);
    }

    pub(crate) fn set(&mut self, y: usize, z: usize, value: T) {
        self.cells[Self::index(y, z)] = value;
    }
}

/// The stored 2D wedge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid2<T> {
    pub(crate) slices: Vec<Slice2<T>>,
}

impl<T: CellValue> Grid2<T> {
    /// A wedge of `slice_count` zeroed slices with `value` at the origin.
    pub(crate) fn single_source(value: T, slice_count: usize) -> Self {
        assert!(slice_count > 0, "grid needs at least one slice");
        let mut slices: Vec<Slice2<T>> = (0..slice_count).map(new_slice_2).collect();
        slices[0][0] = value;
        Grid2 { slices }
    }

    /// Value at an arbitrary logical coordinate.
    pub fn value_at(&self, x: i64, y: i64) -> T {
        let (cx, cy) = canonical_2d(x, y);
        self.value_at_canonical(cx, cy)
    }

    /// Value at a canonical coordinate (`x >= y >= 0`); zero beyond the
    /// allocated slices.
    pub fn value_at_canonical(&self, x: usize, y: usize) -> T {
        debug_assert!(x >= y);
        match self.slices.get(x) {
            Some(slice) => slice[y].clone(),
            None => T::zero(),
        }
    }

    /// Multiplicity-weighted sum over the wedge: the total over the
    /// whole logical grid.
    pub fn total_value(&self) -> T {
        let mut total = T::zero();
        for (x, slice) in self.slices.iter().enumerate() {
            for (y, value) in slice.iter().enumerate() {
                total = total.add(&value.mul_small(multiplicity_2d(x, y)));
            }
        }
        total
    }

    /// Whether the slice count and per-slice lengths agree with the
    /// recorded maximum populated x.
    pub(crate) fn matches_extent(&self, max_x: usize) -> bool {
        let len = self.slices.len();
        (len == max_x + 2 || len == max_x + 3)
            && self.slices.iter().enumerate().all(|(x, s)| s.len() == x + 1)
    }
}

/// The stored 3D wedge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid3<T> {
    pub(crate) slices: Vec<Slice3<T>>,
}

impl<T: CellValue> Grid3<T> {
    pub(crate) fn single_source(value: T, slice_count: usize) -> Self {
        assert!(slice_count > 0, "grid needs at least one slice");
        let mut slices: Vec<Slice3<T>> = (0..slice_count).map(Slice3::new).collect();
        slices[0].set(0, 0, value);
        Grid3 { slices }
    }

    pub fn value_at(&self, x: i64, y: i64, z: i64) -> T {
        let (cx, cy, cz) = canonical_3d(x, y, z);
        self.value_at_canonical(cx, cy, cz)
    }

    pub fn value_at_canonical(&self, x: usize, y: usize, z: usize) -> T {
        debug_assert!(x >= y && y >= z);
        match self.slices.get(x) {
            Some(slice) => slice.get(y, z).clone(),
            None => T::zero(),
        }
    }

    pub fn total_value(&self) -> T {
        let mut total = T::zero();
        for (x, slice) in self.slices.iter().enumerate() {
            for y in 0..=x {
                for z in 0..=y {
                    total = total.add(&slice.get(y, z).mul_small(multiplicity_3d(x, y, z)));
                }
            }
        }
        total
    }

    /// Whether the slice count and per-slice triangle sizes agree with
    /// the recorded maximum populated x.
    pub(crate) fn matches_extent(&self, max_x: usize) -> bool {
        let len = self.slices.len();
        (len == max_x + 2 || len == max_x + 3)
            && self
                .slices
                .iter()
                .enumerate()
                .all(|(x, s)| s.cells.len() == (x + 1) * (x + 2) / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalization_folds_orbit() {
        assert_eq!(canonical_2d(-3, 2), (3, 2));
        assert_eq!(canonical_2d(2, -3), (3, 2));
        assert_eq!(canonical_3d(0, -2, 1), (2, 1, 0));
        assert_eq!(canonical_3d(-1, -1, -1), (1, 1, 1));
    }

    #[test]
    fn multiplicities_count_orbit_cells() {
        assert_eq!(multiplicity_2d(0, 0), 1);
        assert_eq!(multiplicity_2d(1, 0), 4);
        assert_eq!(multiplicity_2d(1, 1), 4);
        assert_eq!(multiplicity_2d(2, 1), 8);

        assert_eq!(multiplicity_3d(0, 0, 0), 1);
        assert_eq!(multiplicity_3d(1, 0, 0), 6);
        assert_eq!(multiplicity_3d(1, 1, 0), 12);
        assert_eq!(multiplicity_3d(1, 1, 1), 8);
        assert_eq!(multiplicity_3d(2, 1, 0), 24);
        assert_eq!(multiplicity_3d(2, 1, 1), 24);
        assert_eq!(multiplicity_3d(2, 2, 1), 24);
    }

    #[test]
    fn orbit_reads_agree() {
        let mut grid = Grid3::single_source(0i64, 4);
        grid.slices[2].set(1, 0, 99);
        for &(x, y, z) in &[(2, 1, 0), (-2, 0, 1), (0, -1, 2), (1, -2, 0)] {
            assert_eq!(grid.value_at(x, y, z), 99, "image ({x},{y},{z})");
        }
        assert_eq!(grid.value_at(2, 1, 1), 0);
        // Beyond the allocated slices everything is zero.
        assert_eq!(grid.value_at(100, 3, 2), 0);
    }

    #[test]
    fn total_weights_by_multiplicity() {
        let mut grid = Grid2::single_source(10i64, 3);
        grid.slices[1][0] = 2;
        grid.slices[1][1] = 3;
        // 10 + 4*2 + 4*3
        assert_eq!(grid.total_value(), 30);
    }

    #[test]
    fn slice3_layout_is_triangular() {
        let slice = Slice3::<i64>::new(4);
        assert_eq!(slice.cells.len(), 15);
        assert_eq!(Slice3::<i64>::index(0, 0), 0);
        assert_eq!(Slice3::<i64>::index(1, 0), 1);
        assert_eq!(Slice3::<i64>::index(1, 1), 2);
        assert_eq!(Slice3::<i64>::index(4, 4), 14);
    }
}
