//! The 2D single-source automaton.
//!
//! Only the wedge `x >= y >= 0` is stored. Each step sweeps the slices
//! in ascending x with a three-slice window over both generations: the
//! old grid is consumed slice by slice while the new one is built, so
//! peak memory stays at a few slices above one grid. Positions are
//! dispatched by shape (on the x axis, on the `y = x` diagonal, against
//! neither or both) because the shape fixes which stored neighbors
//! exist and how many logical cells each one stands for.

use std::mem;
use std::path::Path;
use std::vec::IntoIter;

use crate::cell::CellValue;
use crate::error::AetherError;
use crate::grid::{new_slice_2, Grid2, Slice2};
use crate::snapshot::{Snapshot, MODEL_NAME};
use crate::topple::{topple, Neighbor, SliceSel};

const INITIAL_SLICES: usize = 6;
const INITIAL_MAX_X: usize = 3;

type Target = (SliceSel, usize);
type Neighbors<T> = Vec<Neighbor<T, Target>>;

fn push_lesser<T: CellValue>(
    ns: &mut Neighbors<T>,
    value: &T,
    neighbor: &T,
    target: Target,
    share_multiplier: u32,
    symmetry_count: u32,
) {
    if neighbor < value {
        ns.push(Neighbor::new(
            neighbor.clone(),
            target,
            share_multiplier,
            symmetry_count,
        ));
    }
}

fn next_slice<T: CellValue>(old: &mut IntoIter<Slice2<T>>, x: usize) -> Slice2<T> {
    old.next().unwrap_or_else(|| new_slice_2(x))
}

/// The sliding window of the sweep: three consecutive old slices being
/// read and the three new slices still receiving deposits.
struct Sweep<T: CellValue> {
    smaller: Slice2<T>,
    current: Slice2<T>,
    greater: Slice2<T>,
    new_smaller: Slice2<T>,
    new_current: Slice2<T>,
    new_greater: Slice2<T>,
}

impl<T: CellValue> Sweep<T> {
    /// Move the window up one slice. The slice leaving the old window
    /// is dropped; the finished new slice is retired in ascending
    /// order.
    fn advance(
        &mut self,
        old: &mut IntoIter<Slice2<T>>,
        retired: &mut Vec<Slice2<T>>,
        next_x: usize,
    ) {
        self.smaller = mem::replace(
            &mut self.current,
            mem::replace(&mut self.greater, next_slice(old, next_x)),
        );
        retired.push(mem::replace(
            &mut self.new_smaller,
            mem::replace(
                &mut self.new_current,
                mem::replace(&mut self.new_greater, new_slice_2(next_x)),
            ),
        ));
    }

    fn resolve(&mut self, value: &T, y: usize, ns: &mut Neighbors<T>) -> bool {
        let (resident, toppled) = topple(value, ns, |(sel, ty), amount| {
            let slice = match sel {
                SliceSel::Smaller => &mut self.new_smaller,
                SliceSel::Current => &mut self.new_current,
                SliceSel::Greater => &mut self.new_greater,
            };
            slice[ty] = slice[ty].add(&amount);
        });
        self.new_current[y] = self.new_current[y].add(&resident);
        toppled
    }

    /// Position `(x, 0)`: the two cells at `y = 1` and `y = -1` fold
    /// onto the stored `(x, 1)`.
    fn axis(&mut self, sx_mult: u32, gy_mult: u32, ns: &mut Neighbors<T>) -> bool {
        let value = self.current[0].clone();
        ns.clear();
        push_lesser(ns, &value, &self.greater[0], (SliceSel::Greater, 0), 1, 1);
        push_lesser(ns, &value, &self.smaller[0], (SliceSel::Smaller, 0), sx_mult, 1);
        push_lesser(ns, &value, &self.current[1], (SliceSel::Current, 1), gy_mult, 2);
        self.resolve(&value, 0, ns)
    }

    /// Position `(x, y)` with `0 < y < x`: all four stored neighbors
    /// are distinct.
    fn inner(
        &mut self,
        y: usize,
        sx_mult: u32,
        gy_mult: u32,
        sy_mult: u32,
        ns: &mut Neighbors<T>,
    ) -> bool {
        let value = self.current[y].clone();
        ns.clear();
        push_lesser(ns, &value, &self.greater[y], (SliceSel::Greater, y), 1, 1);
        push_lesser(ns, &value, &self.smaller[y], (SliceSel::Smaller, y), sx_mult, 1);
        push_lesser(
            ns,
            &value,
            &self.current[y + 1],
            (SliceSel::Current, y + 1),
            gy_mult,
            1,
        );
        push_lesser(
            ns,
            &value,
            &self.current[y - 1],
            (SliceSel::Current, y - 1),
            sy_mult,
            1,
        );
        self.resolve(&value, y, ns)
    }

    /// Position `(x, x)` on the diagonal: the greater-x and greater-y
    /// cells fold together, as do the two lesser ones.
    fn corner(&mut self, y: usize, sy_mult: u32, ns: &mut Neighbors<T>) -> bool {
        let value = self.current[y].clone();
        ns.clear();
        push_lesser(ns, &value, &self.greater[y], (SliceSel::Greater, y), 1, 2);
        push_lesser(
            ns,
            &value,
            &self.current[y - 1],
            (SliceSel::Current, y - 1),
            sy_mult,
            2,
        );
        self.resolve(&value, y, ns)
    }

    /// Topple every position of slices `min_x..max_x`. All shapes here
    /// are far enough from the origin that the multipliers settle into
    /// their asymptotic values.
    fn range(
        &mut self,
        old: &mut IntoIter<Slice2<T>>,
        retired: &mut Vec<Slice2<T>>,
        min_x: usize,
        max_x: usize,
        ns: &mut Neighbors<T>,
    ) -> bool {
        let mut changed = false;
        for x in min_x..max_x {
            self.advance(old, retired, x + 1);
            changed |= self.axis(1, 1, ns);
            changed |= self.inner(1, 1, 1, 2, ns);
            for y in 2..x - 1 {
                changed |= self.inner(y, 1, 1, 1, ns);
            }
            changed |= self.inner(x - 1, 2, 2, 1, ns);
            changed |= self.corner(x, 1, ns);
        }
        changed
    }
}

/// Single-source Aether automaton on the infinite 2D grid.
#[derive(Debug, Clone)]
pub struct Aether2D<T: CellValue = i64> {
    grid: Grid2<T>,
    initial_value: T,
    step: u64,
    max_x: usize,
    changed: Option<bool>,
}

impl<T: CellValue> Aether2D<T> {
    /// Create the automaton with `initial_value` at the origin and
    /// every other cell at zero.
    pub fn new(initial_value: T) -> Result<Self, AetherError> {
        if let Some(min) = T::min_initial_value(2) {
            if initial_value < min {
                return Err(AetherError::InitialValueTooSmall {
                    min: format!("{min:?}"),
                    got: format!("{initial_value:?}"),
                });
            }
        }
        Ok(Aether2D {
            grid: Grid2::single_source(initial_value.clone(), INITIAL_SLICES),
            initial_value,
            step: 0,
            max_x: INITIAL_MAX_X,
            changed: None,
        })
    }

    /// Advance one step. Returns whether any position toppled.
    pub fn step(&mut self) -> bool {
        let old_len = self.grid.slices.len();
        let new_len = self.max_x + 3;
        let edge = old_len - 1;
        let edge_minus_two = edge - 2;
        let mut retired: Vec<Slice2<T>> = Vec::with_capacity(new_len.max(old_len));
        let mut old = mem::take(&mut self.grid.slices).into_iter();
        let mut ns: Neighbors<T> = Vec::with_capacity(4);
        let mut changed = false;

        let current = next_slice(&mut old, 0);
        let greater = next_slice(&mut old, 1);
        let mut new_current: Slice2<T> = new_slice_2(0);
        let mut new_greater: Slice2<T> = new_slice_2(1);

        // x = 0: the four logical neighbors of the origin fold onto the
        // stored (1, 0).
        let origin = current[0].clone();
        ns.clear();
        push_lesser(&mut ns, &origin, &greater[0], (SliceSel::Greater, 0), 1, 4);
        let (resident, toppled) = topple(&origin, &mut ns, |(_, ty), amount| {
            new_greater[ty] = new_greater[ty].add(&amount);
        });
        new_current[0] = new_current[0].add(&resident);
        changed |= toppled;

        // x = 1: from here on a full three-slice window exists.
        let mut sweep = Sweep {
            smaller: current,
            current: greater,
            greater: next_slice(&mut old, 2),
            new_smaller: new_current,
            new_current: new_greater,
            new_greater: new_slice_2(2),
        };
        changed |= sweep.axis(4, 2, &mut ns);
        changed |= sweep.corner(1, 2, &mut ns);

        // x = 2
        sweep.advance(&mut old, &mut retired, 3);
        changed |= sweep.axis(1, 1, &mut ns);
        changed |= sweep.inner(1, 2, 2, 2, &mut ns);
        changed |= sweep.corner(2, 1, &mut ns);

        changed |= sweep.range(&mut old, &mut retired, 3, edge_minus_two, &mut ns);
        // Toppling in the outermost two slices means activity reached
        // the edge of the populated region.
        let boundary_toppled = sweep.range(&mut old, &mut retired, edge_minus_two, edge, &mut ns);
        changed |= boundary_toppled;

        let Sweep {
            new_smaller,
            new_current,
            new_greater,
            ..
        } = sweep;
        retired.push(new_smaller);
        retired.push(new_current);
        retired.push(new_greater);
        if new_len > old_len {
            retired.push(new_slice_2(old_len));
        }
        self.grid.slices = retired;

        if boundary_toppled {
            self.max_x += 1;
            log::debug!("2D wedge grew, max_x = {}", self.max_x);
        }
        self.step += 1;
        self.changed = Some(changed);
        log::trace!("2D step {} done, changed = {changed}", self.step);
        changed
    }

    pub fn value_at(&self, x: i64, y: i64) -> T {
        self.grid.value_at(x, y)
    }

    pub fn value_at_canonical(&self, x: usize, y: usize) -> T {
        self.grid.value_at_canonical(x, y)
    }

    pub fn total_value(&self) -> T {
        self.grid.total_value()
    }

    pub fn grid(&self) -> &Grid2<T> {
        &self.grid
    }

    pub fn initial_value(&self) -> &T {
        &self.initial_value
    }

    pub fn current_step(&self) -> u64 {
        self.step
    }

    /// Largest x whose slice can hold a nonzero value.
    pub fn current_max_x(&self) -> usize {
        self.max_x
    }

    /// Whether the last step toppled anything; `None` before the first
    /// step.
    pub fn changed(&self) -> Option<bool> {
        self.changed
    }

    /// Serialize the full state to a JSON file.
    pub fn backup(&self, path: impl AsRef<Path>) -> Result<(), AetherError> {
        let snapshot = Snapshot {
            model: MODEL_NAME.to_string(),
            dimension: 2,
            kind: T::KIND,
            initial_value: self.initial_value.clone(),
            step: self.step,
            max_x: self.max_x,
            grid: self.grid.clone(),
        };
        snapshot.write(path.as_ref())
    }

    /// Restore from a file written by [`Aether2D::backup`].
    ///
    /// The header is validated before the grid payload is decoded, so a
    /// wrong model, dimension, or numeric kind is reported as such. A
    /// grid whose shape disagrees with the recorded extent is rejected
    /// rather than stepped.
    pub fn restore(path: impl AsRef<Path>) -> Result<Self, AetherError> {
        let raw: Snapshot<serde_json::Value, serde_json::Value> =
            Snapshot::read(path.as_ref())?;
        raw.validate(2, T::KIND)?;
        let grid: Grid2<T> = serde_json::from_value(raw.grid)?;
        if raw.max_x < INITIAL_MAX_X
            || grid.slices.len() < INITIAL_SLICES
            || !grid.matches_extent(raw.max_x)
        {
            return Err(AetherError::SnapshotGridCorrupt { max_x: raw.max_x });
        }
        Ok(Aether2D {
            grid,
            initial_value: serde_json::from_value(raw.initial_value)?,
            step: raw.step,
            max_x: raw.max_x,
            changed: None,
        })
    }
}
