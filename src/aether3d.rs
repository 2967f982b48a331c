//! The 3D single-source automaton.
//!
//! Only the wedge `x >= y >= z >= 0` is stored, swept in ascending x
//! with the same three-slice window discipline as the 2D automaton.
//! The shape taxonomy is richer here: a position can sit on the x axis,
//! on the `z = 0` plane, on the `y = z` plane, on the `y = x` plane, on
//! intersections of those, or at the `x = y = z` corner, and each shape
//! fixes which stored neighbors exist, how many logical cells each
//! stands for, and how many shares the stored cell collects for its
//! orbit.

use std::mem;
use std::path::Path;
use std::vec::IntoIter;

use crate::cell::CellValue;
use crate::error::AetherError;
use crate::grid::{Grid3, Slice3};
use crate::snapshot::{Snapshot, MODEL_NAME};
use crate::topple::{topple, Neighbor, SliceSel};

const INITIAL_SLICES: usize = 7;
const INITIAL_MAX_X: usize = 4;

type Target = (SliceSel, usize, usize);
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

fn next_slice<T: CellValue>(old: &mut IntoIter<Slice3<T>>, x: usize) -> Slice3<T> {
    old.next().unwrap_or_else(|| Slice3::new(x))
}

struct Sweep<T: CellValue> {
    smaller: Slice3<T>,
    current: Slice3<T>,
    greater: Slice3<T>,
    new_smaller: Slice3<T>,
    new_current: Slice3<T>,
    new_greater: Slice3<T>,
}

impl<T: CellValue> Sweep<T> {
    fn advance(
        &mut self,
        old: &mut IntoIter<Slice3<T>>,
        retired: &mut Vec<Slice3<T>>,
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
                mem::replace(&mut self.new_greater, Slice3::new(next_x)),
            ),
        ));
    }

    fn resolve(&mut self, value: &T, y: usize, z: usize, ns: &mut Neighbors<T>) -> bool {
        let (resident, toppled) = topple(value, ns, |(sel, ty, tz), amount| {
            let slice = match sel {
                SliceSel::Smaller => &mut self.new_smaller,
                SliceSel::Current => &mut self.new_current,
                SliceSel::Greater => &mut self.new_greater,
            };
            slice.add(ty, tz, amount);
        });
        self.new_current.add(y, z, resident);
        toppled
    }

    /// Position `(x, 0, 0)`: the four logical cells at `|y| = 1` or
    /// `|z| = 1` fold onto the stored `(x, 1, 0)`.
    fn on_axis(&mut self, sx_mult: u32, gy_mult: u32, ns: &mut Neighbors<T>) -> bool {
        let value = self.current.get(0, 0).clone();
        ns.clear();
        push_lesser(
            ns,
            &value,
            self.greater.get(0, 0),
            (SliceSel::Greater, 0, 0),
            1,
            1,
        );
        push_lesser(
            ns,
            &value,
            self.smaller.get(0, 0),
            (SliceSel::Smaller, 0, 0),
            sx_mult,
            1,
        );
        push_lesser(
            ns,
            &value,
            self.current.get(1, 0),
            (SliceSel::Current, 1, 0),
            gy_mult,
            4,
        );
        self.resolve(&value, 0, 0, ns)
    }

    /// Position `(x, y, 0)` with `0 < y < x`: five stored neighbors,
    /// the two `z = +-1` cells folded together.
    fn z0(
        &mut self,
        y: usize,
        sx_mult: u32,
        gy_mult: u32,
        sy_mult: u32,
        gz_mult: u32,
        ns: &mut Neighbors<T>,
    ) -> bool {
        let value = self.current.get(y, 0).clone();
        ns.clear();
        push_lesser(
            ns,
            &value,
            self.greater.get(y, 0),
            (SliceSel::Greater, y, 0),
            1,
            1,
        );
        push_lesser(
            ns,
            &value,
            self.smaller.get(y, 0),
            (SliceSel::Smaller, y, 0),
            sx_mult,
            1,
        );
        push_lesser(
            ns,
            &value,
            self.current.get(y + 1, 0),
            (SliceSel::Current, y + 1, 0),
            gy_mult,
            1,
        );
        push_lesser(
            ns,
            &value,
            self.current.get(y - 1, 0),
            (SliceSel::Current, y - 1, 0),
            sy_mult,
            1,
        );
        push_lesser(
            ns,
            &value,
            self.current.get(y, 1),
            (SliceSel::Current, y, 1),
            gz_mult,
            2,
        );
        self.resolve(&value, y, 0, ns)
    }

    /// Position `(x, c, c)` with `0 < c < x` on the `y = z` plane:
    /// the greater-y and greater-z cells fold together, as do the
    /// lesser-z and lesser-y ones.
    fn yz_diagonal(
        &mut self,
        c: usize,
        sx_mult: u32,
        gy_mult: u32,
        sz_mult: u32,
        ns: &mut Neighbors<T>,
    ) -> bool {
        let value = self.current.get(c, c).clone();
        ns.clear();
        push_lesser(
            ns,
            &value,
            self.greater.get(c, c),
            (SliceSel::Greater, c, c),
            1,
            1,
        );
        push_lesser(
            ns,
            &value,
            self.smaller.get(c, c),
            (SliceSel::Smaller, c, c),
            sx_mult,
            1,
        );
        push_lesser(
            ns,
            &value,
            self.current.get(c + 1, c),
            (SliceSel::Current, c + 1, c),
            gy_mult,
            2,
        );
        push_lesser(
            ns,
            &value,
            self.current.get(c, c - 1),
            (SliceSel::Current, c, c - 1),
            sz_mult,
            2,
        );
        self.resolve(&value, c, c, ns)
    }

    /// Position `(x, x, 0)` where the `y = x` plane meets `z = 0`: the
    /// greater-x and greater-y cells fold together, and so do the two
    /// lesser ones and the two `z = +-1` cells.
    fn xy_z0(&mut self, y: usize, sy_mult: u32, gz_mult: u32, ns: &mut Neighbors<T>) -> bool {
        let value = self.current.get(y, 0).clone();
        ns.clear();
        push_lesser(
            ns,
            &value,
            self.greater.get(y, 0),
            (SliceSel::Greater, y, 0),
            1,
            2,
        );
        push_lesser(
            ns,
            &value,
            self.current.get(y - 1, 0),
            (SliceSel::Current, y - 1, 0),
            sy_mult,
            2,
        );
        push_lesser(
            ns,
            &value,
            self.current.get(y, 1),
            (SliceSel::Current, y, 1),
            gz_mult,
            2,
        );
        self.resolve(&value, y, 0, ns)
    }

    /// Position `(x, x, z)` with `0 < z < x` on the `y = x` plane.
    fn xy(
        &mut self,
        y: usize,
        z: usize,
        sy_mult: u32,
        gz_mult: u32,
        sz_mult: u32,
        ns: &mut Neighbors<T>,
    ) -> bool {
        let value = self.current.get(y, z).clone();
        ns.clear();
        push_lesser(
            ns,
            &value,
            self.greater.get(y, z),
            (SliceSel::Greater, y, z),
            1,
            2,
        );
        push_lesser(
            ns,
            &value,
            self.current.get(y - 1, z),
            (SliceSel::Current, y - 1, z),
            sy_mult,
            2,
        );
        push_lesser(
            ns,
            &value,
            self.current.get(y, z + 1),
            (SliceSel::Current, y, z + 1),
            gz_mult,
            1,
        );
        push_lesser(
            ns,
            &value,
            self.current.get(y, z - 1),
            (SliceSel::Current, y, z - 1),
            sz_mult,
            1,
        );
        self.resolve(&value, y, z, ns)
    }

    /// Position `(x, x, x)` at the wedge corner: three greater cells
    /// fold onto one stored target and three lesser ones onto another.
    fn xyz_corner(&mut self, c: usize, sz_mult: u32, ns: &mut Neighbors<T>) -> bool {
        let value = self.current.get(c, c).clone();
        ns.clear();
        push_lesser(
            ns,
            &value,
            self.greater.get(c, c),
            (SliceSel::Greater, c, c),
            1,
            3,
        );
        push_lesser(
            ns,
            &value,
            self.current.get(c, c - 1),
            (SliceSel::Current, c, c - 1),
            sz_mult,
            3,
        );
        self.resolve(&value, c, c, ns)
    }

    /// Position `(x, y, z)` with `0 < z < y < x`: all six stored
    /// neighbors are distinct.
    #[allow(clippy::too_many_arguments)]
    fn interior(
        &mut self,
        y: usize,
        z: usize,
        sx_mult: u32,
        gy_mult: u32,
        sy_mult: u32,
        gz_mult: u32,
        sz_mult: u32,
        ns: &mut Neighbors<T>,
    ) -> bool {
        let value = self.current.get(y, z).clone();
        ns.clear();
        push_lesser(
            ns,
            &value,
            self.greater.get(y, z),
            (SliceSel::Greater, y, z),
            1,
            1,
        );
        push_lesser(
            ns,
            &value,
            self.smaller.get(y, z),
            (SliceSel::Smaller, y, z),
            sx_mult,
            1,
        );
        push_lesser(
            ns,
            &value,
            self.current.get(y + 1, z),
            (SliceSel::Current, y + 1, z),
            gy_mult,
            1,
        );
        push_lesser(
            ns,
            &value,
            self.current.get(y - 1, z),
            (SliceSel::Current, y - 1, z),
            sy_mult,
            1,
        );
        push_lesser(
            ns,
            &value,
            self.current.get(y, z + 1),
            (SliceSel::Current, y, z + 1),
            gz_mult,
            1,
        );
        push_lesser(
            ns,
            &value,
            self.current.get(y, z - 1),
            (SliceSel::Current, y, z - 1),
            sz_mult,
            1,
        );
        self.resolve(&value, y, z, ns)
    }

    /// Topple every position of slices `min_x..max_x`. Slices this far
    /// out never touch the origin-adjacent special cases, but rows next
    /// to the wedge boundary still carry compensating multipliers.
    fn range(
        &mut self,
        old: &mut IntoIter<Slice3<T>>,
        retired: &mut Vec<Slice3<T>>,
        min_x: usize,
        max_x: usize,
        ns: &mut Neighbors<T>,
    ) -> bool {
        let mut changed = false;
        for x in min_x..max_x {
            self.advance(old, retired, x + 1);
            changed |= self.on_axis(1, 1, ns);
            changed |= self.z0(1, 1, 1, 4, 2, ns);
            changed |= self.yz_diagonal(1, 1, 1, 2, ns);
            changed |= self.z0(2, 1, 1, 1, 1, ns);
            changed |= self.interior(2, 1, 1, 1, 2, 2, 2, ns);
            changed |= self.yz_diagonal(2, 1, 1, 1, ns);
            for y in 3..=x - 2 {
                changed |= self.z0(y, 1, 1, 1, 1, ns);
                changed |= self.interior(y, 1, 1, 1, 1, 1, 2, ns);
                for z in 2..=y - 2 {
                    changed |= self.interior(y, z, 1, 1, 1, 1, 1, ns);
                }
                changed |= self.interior(y, y - 1, 1, 1, 2, 2, 1, ns);
                changed |= self.yz_diagonal(y, 1, 1, 1, ns);
            }
            let y = x - 1;
            changed |= self.z0(y, 2, 2, 1, 1, ns);
            changed |= self.interior(y, 1, 2, 2, 1, 1, 2, ns);
            for z in 2..=y - 2 {
                changed |= self.interior(y, z, 2, 2, 1, 1, 1, ns);
            }
            changed |= self.interior(y, y - 1, 2, 2, 2, 2, 1, ns);
            changed |= self.yz_diagonal(y, 3, 2, 1, ns);
            changed |= self.xy_z0(x, 1, 1, ns);
            changed |= self.xy(x, 1, 1, 1, 2, ns);
            for z in 2..=x - 2 {
                changed |= self.xy(x, z, 1, 1, 1, ns);
            }
            changed |= self.xy(x, x - 1, 2, 3, 1, ns);
            changed |= self.xyz_corner(x, 1, ns);
        }
        changed
    }
}

/// Single-source Aether automaton on the infinite 3D grid.
#[derive(Debug, Clone)]
pub struct Aether3D<T: CellValue = i64> {
    grid: Grid3<T>,
    initial_value: T,
    step: u64,
    max_x: usize,
    changed: Option<bool>,
}

impl<T: CellValue> Aether3D<T> {
    /// Create the automaton with `initial_value` at the origin and
    /// every other cell at zero.
    pub fn new(initial_value: T) -> Result<Self, AetherError> {
        if let Some(min) = T::min_initial_value(3) {
            if initial_value < min {
                return Err(AetherError::InitialValueTooSmall {
                    min: format!("{min:?}"),
                    got: format!("{initial_value:?}"),
                });
            }
        }
        Ok(Aether3D {
            grid: Grid3::single_source(initial_value.clone(), INITIAL_SLICES),
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
        let mut retired: Vec<Slice3<T>> = Vec::with_capacity(new_len.max(old_len));
        let mut old = mem::take(&mut self.grid.slices).into_iter();
        let mut ns: Neighbors<T> = Vec::with_capacity(6);
        let mut changed = false;

        let current = next_slice(&mut old, 0);
        let greater = next_slice(&mut old, 1);
        let mut new_current = Slice3::new(0);
        let mut new_greater = Slice3::new(1);

        // x = 0: all six logical neighbors of the origin fold onto the
        // stored (1, 0, 0).
        let origin = current.get(0, 0).clone();
        ns.clear();
        push_lesser(
            &mut ns,
            &origin,
            greater.get(0, 0),
            (SliceSel::Greater, 0, 0),
            1,
            6,
        );
        let (resident, toppled) = topple(&origin, &mut ns, |(_, ty, tz), amount| {
            new_greater.add(ty, tz, amount);
        });
        new_current.add(0, 0, resident);
        changed |= toppled;

        // x = 1
        let mut sweep = Sweep {
            smaller: current,
            current: greater,
            greater: next_slice(&mut old, 2),
            new_smaller: new_current,
            new_current: new_greater,
            new_greater: Slice3::new(2),
        };
        changed |= sweep.on_axis(6, 2, &mut ns);
        changed |= sweep.xy_z0(1, 4, 3, &mut ns);
        changed |= sweep.xyz_corner(1, 2, &mut ns);

        // x = 2
        sweep.advance(&mut old, &mut retired, 3);
        changed |= sweep.on_axis(1, 1, &mut ns);
        changed |= sweep.z0(1, 2, 2, 4, 2, &mut ns);
        changed |= sweep.yz_diagonal(1, 3, 2, 2, &mut ns);
        changed |= sweep.xy_z0(2, 1, 1, &mut ns);
        changed |= sweep.xy(2, 1, 2, 3, 2, &mut ns);
        changed |= sweep.xyz_corner(2, 1, &mut ns);

        // x = 3
        sweep.advance(&mut old, &mut retired, 4);
        changed |= sweep.on_axis(1, 1, &mut ns);
        changed |= sweep.z0(1, 1, 1, 4, 2, &mut ns);
        changed |= sweep.yz_diagonal(1, 1, 1, 2, &mut ns);
        changed |= sweep.z0(2, 2, 2, 1, 1, &mut ns);
        changed |= sweep.interior(2, 1, 2, 2, 2, 2, 2, &mut ns);
        changed |= sweep.yz_diagonal(2, 3, 2, 1, &mut ns);
        changed |= sweep.xy_z0(3, 1, 1, &mut ns);
        changed |= sweep.xy(3, 1, 1, 1, 2, &mut ns);
        changed |= sweep.xy(3, 2, 2, 3, 1, &mut ns);
        changed |= sweep.xyz_corner(3, 1, &mut ns);

        changed |= sweep.range(&mut old, &mut retired, 4, edge_minus_two, &mut ns);
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
            retired.push(Slice3::new(old_len));
        }
        self.grid.slices = retired;

        if boundary_toppled {
            self.max_x += 1;
            log::debug!("3D wedge grew, max_x = {}", self.max_x);
        }
        self.step += 1;
        self.changed = Some(changed);
        log::trace!("3D step {} done, changed = {changed}", self.step);
        changed
    }

    pub fn value_at(&self, x: i64, y: i64, z: i64) -> T {
        self.grid.value_at(x, y, z)
    }

    pub fn value_at_canonical(&self, x: usize, y: usize, z: usize) -> T {
        self.grid.value_at_canonical(x, y, z)
    }

    pub fn total_value(&self) -> T {
        self.grid.total_value()
    }

    pub fn grid(&self) -> &Grid3<T> {
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
            dimension: 3,
            kind: T::KIND,
            initial_value: self.initial_value.clone(),
            step: self.step,
            max_x: self.max_x,
            grid: self.grid.clone(),
        };
        snapshot.write(path.as_ref())
    }

    /// Restore from a file written by [`Aether3D::backup`].
    ///
    /// The header is validated before the grid payload is decoded, so a
    /// wrong model, dimension, or numeric kind is reported as such. A
    /// grid whose shape disagrees with the recorded extent is rejected
    /// rather than stepped.
    pub fn restore(path: impl AsRef<Path>) -> Result<Self, AetherError> {
        let raw: Snapshot<serde_json::Value, serde_json::Value> =
            Snapshot::read(path.as_ref())?;
        raw.validate(3, T::KIND)?;
        let grid: Grid3<T> = serde_json::from_value(raw.grid)?;
        if raw.max_x < INITIAL_MAX_X
            || grid.slices.len() < INITIAL_SLICES
            || !grid.matches_extent(raw.max_x)
        {
            return Err(AetherError::SnapshotGridCorrupt { max_x: raw.max_x });
        }
        Ok(Aether3D {
            grid,
            initial_value: serde_json::from_value(raw.initial_value)?,
            step: raw.step,
            max_x: raw.max_x,
            changed: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_value_never_topples() {
        let mut ca = Aether3D::new(6i64).unwrap();
        assert!(!ca.step());
        assert_eq!(ca.value_at(0, 0, 0), 6);
    }

    #[test]
    fn first_step_from_one_million() {
        let mut ca = Aether3D::new(1_000_000i64).unwrap();
        assert!(ca.step());
        // 1_000_000 = 7 * 142_857 + 1: the origin keeps its share plus
        // the remainder, each of the six logical neighbors gets one
        // share.
        assert_eq!(ca.value_at(0, 0, 0), 142_858);
        assert_eq!(ca.value_at(1, 0, 0), 142_857);
        assert_eq!(ca.value_at(0, -1, 0), 142_857);
        assert_eq!(ca.value_at(0, 0, 1), 142_857);
        assert_eq!(ca.value_at(1, 1, 0), 0);
        assert_eq!(ca.total_value(), 1_000_000);
    }

    #[test]
    fn value_is_conserved() {
        for initial in [-200_000i64, -3, 0, 11, 2_000_000] {
            let mut ca = Aether3D::new(initial).unwrap();
            for _ in 0..30 {
                ca.step();
                assert_eq!(ca.total_value(), initial, "initial {initial}");
            }
        }
    }

    #[test]
    fn max_x_grows_monotonically() {
        let mut ca = Aether3D::new(1i64 << 44).unwrap();
        let mut previous = ca.current_max_x();
        for _ in 0..40 {
            ca.step();
            let max_x = ca.current_max_x();
            assert!(max_x == previous || max_x == previous + 1);
            previous = max_x;
        }
        assert!(previous > INITIAL_MAX_X);
    }

    #[test]
    fn grid_length_tracks_max_x() {
        let mut ca = Aether3D::new(5_000_000i64).unwrap();
        for _ in 0..30 {
            ca.step();
            let len = ca.grid().slices.len();
            assert!(len == ca.current_max_x() + 2 || len == ca.current_max_x() + 3);
        }
    }

    #[test]
    fn too_small_initial_value_is_rejected() {
        let below = crate::cell::MIN_INITIAL_VALUE_3D - 1;
        assert!(matches!(
            Aether3D::new(below),
            Err(AetherError::InitialValueTooSmall { .. })
        ));
        assert!(Aether3D::new(crate::cell::MIN_INITIAL_VALUE_3D).is_ok());
    }
}
