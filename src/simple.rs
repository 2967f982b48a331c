//! Plain full-grid implementations.
//!
//! These store every cell of a square (or cubic) region with no
//! symmetry folding and re-derive the toppling from first principles:
//! collect the strictly lesser von Neumann neighbors of each cell and
//! hand them to the shared engine one by one. They are drastically
//! slower and hungrier than the wedge automata, which is the point:
//! being near-impossible to get wrong, they serve as oracles for the
//! folded implementations, and they accept arbitrary initial
//! configurations the wedge cannot represent.
//!
//! The array keeps a margin of at least two zero rings around any
//! nonzero cell; whenever activity reaches the margin the array is
//! re-allocated two rings wider before the next step.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cell::CellValue;
use crate::error::AetherError;
use crate::topple::{topple, Neighbor};

const MARGIN: usize = 2;

fn push_lesser<T: CellValue, C: Copy>(
    ns: &mut Vec<Neighbor<T, C>>,
    value: &T,
    neighbor: &T,
    target: C,
) {
    if neighbor < value {
        ns.push(Neighbor::new(neighbor.clone(), target, 1, 1));
    }
}

/// Full-grid 2D reference automaton.
#[derive(Debug, Clone)]
pub struct AetherSimple2D<T: CellValue> {
    cells: Vec<Vec<T>>,
    origin: usize,
    step: u64,
    toppled: Vec<Vec<bool>>,
}

impl<T: CellValue> AetherSimple2D<T> {
    /// Single source at the origin. No lower bound is enforced here;
    /// callers wanting overflow safety should use the wedge automaton.
    pub fn new(initial_value: T) -> Self {
        let side = 2 * MARGIN + 1;
        let mut cells = vec![vec![T::zero(); side]; side];
        cells[MARGIN][MARGIN] = initial_value;
        AetherSimple2D {
            cells,
            origin: MARGIN,
            step: 0,
            toppled: vec![vec![false; side]; side],
        }
    }

    pub(crate) fn from_cells(cells: Vec<Vec<T>>, origin: usize) -> Self {
        let side = cells.len();
        AetherSimple2D {
            cells,
            origin,
            step: 0,
            toppled: vec![vec![false; side]; side],
        }
    }

    fn boundary_active(&self) -> bool {
        let side = self.cells.len();
        self.cells.iter().enumerate().any(|(i, row)| {
            row.iter().enumerate().any(|(j, v)| {
                let ring = i.min(j).min(side - 1 - i).min(side - 1 - j);
                ring < MARGIN && !v.is_zero()
            })
        })
    }

    fn grow(&mut self) {
        let grown = self.cells.len() + 2 * MARGIN;
        let mut cells = vec![vec![T::zero(); grown]; grown];
        for (i, row) in self.cells.drain(..).enumerate() {
            for (j, value) in row.into_iter().enumerate() {
                cells[i + MARGIN][j + MARGIN] = value;
            }
        }
        self.cells = cells;
        self.origin += MARGIN;
        log::debug!("2D reference grid grew to side {grown}");
    }

    /// Advance one step. Returns whether any cell toppled.
    pub fn step(&mut self) -> bool {
        if self.boundary_active() {
            self.grow();
        }
        let side = self.cells.len();
        let mut new_cells = vec![vec![T::zero(); side]; side];
        let mut toppled = vec![vec![false; side]; side];
        let mut ns: Vec<Neighbor<T, (usize, usize)>> = Vec::with_capacity(4);
        let mut changed = false;
        for i in 0..side {
            for j in 0..side {
                let value = self.cells[i][j].clone();
                ns.clear();
                if i + 1 < side {
                    push_lesser(&mut ns, &value, &self.cells[i + 1][j], (i + 1, j));
                }
                if i > 0 {
                    push_lesser(&mut ns, &value, &self.cells[i - 1][j], (i - 1, j));
                }
                if j + 1 < side {
                    push_lesser(&mut ns, &value, &self.cells[i][j + 1], (i, j + 1));
                }
                if j > 0 {
                    push_lesser(&mut ns, &value, &self.cells[i][j - 1], (i, j - 1));
                }
                let (resident, cell_toppled) = topple(&value, &mut ns, |(ti, tj), amount| {
                    let cell = &mut new_cells[ti][tj];
                    *cell = cell.add(&amount);
                });
                let cell = &mut new_cells[i][j];
                *cell = cell.add(&resident);
                toppled[i][j] = cell_toppled;
                changed |= cell_toppled;
            }
        }
        self.cells = new_cells;
        self.toppled = toppled;
        self.step += 1;
        changed
    }

    pub fn value_at(&self, x: i64, y: i64) -> T {
        match self.index(x, y) {
            Some((i, j)) => self.cells[i][j].clone(),
            None => T::zero(),
        }
    }

    /// Whether the cell toppled during the last step.
    pub fn toppled_at(&self, x: i64, y: i64) -> bool {
        match self.index(x, y) {
            Some((i, j)) => self.toppled[i][j],
            None => false,
        }
    }

    fn index(&self, x: i64, y: i64) -> Option<(usize, usize)> {
        let side = self.cells.len() as i64;
        let i = self.origin as i64 + x;
        let j = self.origin as i64 + y;
        if (0..side).contains(&i) && (0..side).contains(&j) {
            Some((i as usize, j as usize))
        } else {
            None
        }
    }

    pub fn total_value(&self) -> T {
        let mut total = T::zero();
        for row in &self.cells {
            for value in row {
                total = total.add(value);
            }
        }
        total
    }

    pub fn current_step(&self) -> u64 {
        self.step
    }
}

/// Full-grid 3D reference automaton.
#[derive(Debug, Clone)]
pub struct AetherSimple3D<T: CellValue> {
    cells: Vec<Vec<Vec<T>>>,
    origin: usize,
    step: u64,
}

impl<T: CellValue> AetherSimple3D<T> {
    pub fn new(initial_value: T) -> Self {
        let side = 2 * MARGIN + 1;
        let mut cells = vec![vec![vec![T::zero(); side]; side]; side];
        cells[MARGIN][MARGIN][MARGIN] = initial_value;
        AetherSimple3D {
            cells,
            origin: MARGIN,
            step: 0,
        }
    }

    fn boundary_active(&self) -> bool {
        let side = self.cells.len();
        self.cells.iter().enumerate().any(|(i, plane)| {
            plane.iter().enumerate().any(|(j, row)| {
                row.iter().enumerate().any(|(k, v)| {
                    let ring = i
                        .min(j)
                        .min(k)
                        .min(side - 1 - i)
                        .min(side - 1 - j)
                        .min(side - 1 - k);
                    ring < MARGIN && !v.is_zero()
                })
            })
        })
    }

    fn grow(&mut self) {
        let grown = self.cells.len() + 2 * MARGIN;
        let mut cells = vec![vec![vec![T::zero(); grown]; grown]; grown];
        for (i, plane) in self.cells.drain(..).enumerate() {
            for (j, row) in plane.into_iter().enumerate() {
                for (k, value) in row.into_iter().enumerate() {
                    cells[i + MARGIN][j + MARGIN][k + MARGIN] = value;
                }
            }
        }
        self.cells = cells;
        self.origin += MARGIN;
        log::debug!("3D reference grid grew to side {grown}");
    }

    pub fn step(&mut self) -> bool {
        if self.boundary_active() {
            self.grow();
        }
        let side = self.cells.len();
        let mut new_cells = vec![vec![vec![T::zero(); side]; side]; side];
        let mut ns: Vec<Neighbor<T, (usize, usize, usize)>> = Vec::with_capacity(6);
        let mut changed = false;
        for i in 0..side {
            for j in 0..side {
                for k in 0..side {
                    let value = self.cells[i][j][k].clone();
                    ns.clear();
                    if i + 1 < side {
                        push_lesser(&mut ns, &value, &self.cells[i + 1][j][k], (i + 1, j, k));
                    }
                    if i > 0 {
                        push_lesser(&mut ns, &value, &self.cells[i - 1][j][k], (i - 1, j, k));
                    }
                    if j + 1 < side {
                        push_lesser(&mut ns, &value, &self.cells[i][j + 1][k], (i, j + 1, k));
                    }
                    if j > 0 {
                        push_lesser(&mut ns, &value, &self.cells[i][j - 1][k], (i, j - 1, k));
                    }
                    if k + 1 < side {
                        push_lesser(&mut ns, &value, &self.cells[i][j][k + 1], (i, j, k + 1));
                    }
                    if k > 0 {
                        push_lesser(&mut ns, &value, &self.cells[i][j][k - 1], (i, j, k - 1));
                    }
                    let (resident, cell_toppled) =
                        topple(&value, &mut ns, |(ti, tj, tk), amount| {
                            let cell = &mut new_cells[ti][tj][tk];
                            *cell = cell.add(&amount);
                        });
                    let cell = &mut new_cells[i][j][k];
                    *cell = cell.add(&resident);
                    changed |= cell_toppled;
                }
            }
        }
        self.cells = new_cells;
        self.step += 1;
        changed
    }

    pub fn value_at(&self, x: i64, y: i64, z: i64) -> T {
        let side = self.cells.len() as i64;
        let i = self.origin as i64 + x;
        let j = self.origin as i64 + y;
        let k = self.origin as i64 + z;
        if (0..side).contains(&i) && (0..side).contains(&j) && (0..side).contains(&k) {
            self.cells[i as usize][j as usize][k as usize].clone()
        } else {
            T::zero()
        }
    }

    pub fn total_value(&self) -> T {
        let mut total = T::zero();
        for plane in &self.cells {
            for row in plane {
                for value in row {
                    total = total.add(value);
                }
            }
        }
        total
    }

    pub fn current_step(&self) -> u64 {
        self.step
    }
}

/// 2D automaton seeded with a square of uniformly random values.
///
/// Full-grid storage: a random configuration has no symmetry to fold.
/// The range is validated up front so the evolution cannot overflow:
/// clamped to include zero, the largest value any cell can ever reach
/// is `actual_min + ((actual_max - actual_min) / 2) * 5`.
#[derive(Debug, Clone)]
pub struct AetherRandomConfiguration2D {
    automaton: AetherSimple2D<i64>,
    initial_side: usize,
    min_value: i64,
    max_value: i64,
    seed: u64,
}

impl AetherRandomConfiguration2D {
    pub fn new(
        initial_side: usize,
        min_value: i64,
        max_value: i64,
        seed: u64,
    ) -> Result<Self, AetherError> {
        if min_value > max_value {
            return Err(AetherError::EmptyRange {
                min: min_value,
                max: max_value,
            });
        }
        if initial_side == 0 {
            return Err(AetherError::ZeroInitialSide);
        }
        let actual_min = i128::from(min_value.min(0));
        let actual_max = i128::from(max_value.max(0));
        let resulting_max = actual_min + ((actual_max - actual_min) / 2) * 5;
        if resulting_max > i128::from(i64::MAX) {
            return Err(AetherError::RangeTooWide {
                min: min_value,
                max: max_value,
            });
        }
        let side = initial_side + 2 * MARGIN;
        let mut cells = vec![vec![0i64; side]; side];
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for row in cells.iter_mut().skip(MARGIN).take(initial_side) {
            for cell in row.iter_mut().skip(MARGIN).take(initial_side) {
                *cell = rng.gen_range(min_value..=max_value);
            }
        }
        let origin = (side - 1) / 2;
        Ok(AetherRandomConfiguration2D {
            automaton: AetherSimple2D::from_cells(cells, origin),
            initial_side,
            min_value,
            max_value,
            seed,
        })
    }

    pub fn step(&mut self) -> bool {
        self.automaton.step()
    }

    pub fn value_at(&self, x: i64, y: i64) -> i64 {
        self.automaton.value_at(x, y)
    }

    pub fn total_value(&self) -> i64 {
        self.automaton.total_value()
    }

    pub fn current_step(&self) -> u64 {
        self.automaton.current_step()
    }

    pub fn initial_side(&self) -> usize {
        self.initial_side
    }

    pub fn value_range(&self) -> (i64, i64) {
        (self.min_value, self.max_value)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_source_first_step() {
        let mut ca = AetherSimple2D::new(100i64);
        assert!(ca.step());
        assert_eq!(ca.value_at(0, 0), 20);
        for &(x, y) in &[(1, 0), (-1, 0), (0, 1), (0, -1)] {
            assert_eq!(ca.value_at(x, y), 20);
        }
        assert!(ca.toppled_at(0, 0));
        assert!(!ca.toppled_at(1, 0));
    }

    #[test]
    fn grid_grows_and_conserves() {
        let mut ca = AetherSimple2D::new(1i64 << 30);
        for _ in 0..25 {
            ca.step();
            assert_eq!(ca.total_value(), 1i64 << 30);
        }
    }

    #[test]
    fn three_d_first_step() {
        let mut ca = AetherSimple3D::new(1_000_000i64);
        assert!(ca.step());
        assert_eq!(ca.value_at(0, 0, 0), 142_858);
        assert_eq!(ca.value_at(0, 0, -1), 142_857);
        assert_eq!(ca.total_value(), 1_000_000);
    }

    #[test]
    fn random_configuration_is_deterministic() {
        let mut a = AetherRandomConfiguration2D::new(6, -100, 100, 42).unwrap();
        let mut b = AetherRandomConfiguration2D::new(6, -100, 100, 42).unwrap();
        for _ in 0..10 {
            a.step();
            b.step();
        }
        for x in -8..=8 {
            for y in -8..=8 {
                assert_eq!(a.value_at(x, y), b.value_at(x, y));
            }
        }
    }

    #[test]
    fn random_configuration_conserves_total() {
        let mut ca = AetherRandomConfiguration2D::new(5, -1000, 1000, 7).unwrap();
        let total = ca.total_value();
        for _ in 0..15 {
            ca.step();
            assert_eq!(ca.total_value(), total);
        }
    }

    #[test]
    fn random_configuration_rejects_bad_ranges() {
        assert!(matches!(
            AetherRandomConfiguration2D::new(5, 10, -10, 0),
            Err(AetherError::EmptyRange { .. })
        ));
        assert!(matches!(
            AetherRandomConfiguration2D::new(5, i64::MIN, i64::MAX, 0),
            Err(AetherError::RangeTooWide { .. })
        ));
        assert!(matches!(
            AetherRandomConfiguration2D::new(0, -1, 1, 0),
            Err(AetherError::ZeroInitialSide)
        ));
    }
}
