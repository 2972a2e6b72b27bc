//! Per-attempt shuffle state
//!
//! An [`Attempt`] owns everything one randomized trial mutates: the grid,
//! the fixed set, running counters and its own random generator. Nothing
//! is shared between attempts; a failed attempt is simply dropped.
//!
//! Speculative changes go through excursions: a snapshot of the flat grid
//! buffer and counters that is restored if the speculative step fails.

use core::fmt;

use hashbrown::HashMap;

#[cfg(not(feature = "std"))]
use crate::compat::*;
#[cfg(not(feature = "std"))]
use alloc::collections::BTreeSet;
#[cfg(feature = "std")]
use std::collections::BTreeSet;

use crate::catalog::Tileset;
use crate::config::{ShuffleConfig, Tuning};
use crate::error::{Failure, FailureKind, Step};
use crate::maze::{Grid, GridCoord, Overrides, Pos, Tag, Tile};
use crate::rng::ShuffleRng;
use crate::survey::{FeatureCounts, Survey};

/// Space to leave around an inserted pattern, in screens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Margins {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

/// Saved attempt state for rollback.
#[derive(Debug, Clone)]
pub struct Excursion {
    data: Vec<Tag>,
    count: usize,
    counters: [usize; 4],
    anchored: Vec<Pos>,
    fixed: Option<BTreeSet<GridCoord>>,
}

pub struct Attempt<'a> {
    pub survey: &'a Survey,
    pub tileset: &'a Tileset<'a>,
    pub config: &'a ShuffleConfig,
    pub tuning: Tuning,
    pub rng: ShuffleRng,
    /// 1-based attempt number, for logs.
    pub number: usize,
    pub h: usize,
    pub w: usize,
    /// Target number of occupied screens.
    pub size: usize,
    /// Feature targets still to be met; starts as the survey's.
    pub targets: FeatureCounts,
    /// Up and down stairs still to be placed.
    pub stairs: [usize; 2],
    pub grid: Grid,
    pub fixed: BTreeSet<GridCoord>,
    /// Occupied screen centers.
    pub count: usize,
    pub walls: usize,
    pub bridges: usize,
    pub rivers: usize,
    pub wides: usize,
    /// Stairs placed to line up with another level.
    pub anchored_stairs: Vec<Pos>,
}

/// One of the survey's dimensions, nudged by at most one.
fn pick_dimension(rng: &mut ShuffleRng, orig: usize, max: usize) -> usize {
    let delta: i64 = match rng.next_int(6) {
        0 => -1,
        4 | 5 => 1,
        _ => 0,
    };
    (orig as i64 + delta).clamp(1, max.max(1) as i64) as usize
}

impl<'a> Attempt<'a> {
    /// Start an attempt with randomly perturbed dimensions and size.
    pub fn new(
        survey: &'a Survey,
        tileset: &'a Tileset<'a>,
        config: &'a ShuffleConfig,
        tuning: Tuning,
        mut rng: ShuffleRng,
        number: usize,
    ) -> Self {
        let h = pick_dimension(&mut rng, survey.height, config.max_height);
        let w = pick_dimension(&mut rng, survey.width, config.max_width);
        let size = survey.size + usize::from(rng.next_int(5) < 2);
        let mut a = Self::with_shape(survey, tileset, config, tuning, rng, h, w, size);
        a.number = number;
        a
    }

    /// Start an attempt with exact dimensions.
    #[allow(clippy::too_many_arguments)]
    pub fn with_shape(
        survey: &'a Survey,
        tileset: &'a Tileset<'a>,
        config: &'a ShuffleConfig,
        tuning: Tuning,
        rng: ShuffleRng,
        h: usize,
        w: usize,
        size: usize,
    ) -> Self {
        Self {
            survey,
            tileset,
            config,
            tuning,
            rng,
            number: 1,
            h,
            w,
            size,
            targets: survey.features,
            stairs: survey.stairs,
            grid: Grid::new(h, w),
            fixed: BTreeSet::new(),
            count: 0,
            walls: 0,
            bridges: 0,
            rivers: 0,
            wides: 0,
            anchored_stairs: Vec::new(),
        }
    }

    pub fn get(&self, c: GridCoord) -> Tag {
        self.grid.get(c)
    }

    /// Write `v` at `c`.
    ///
    /// Panics if `c` is fixed and `v` differs from its current value.
    pub fn set(&mut self, c: GridCoord, v: Tag) {
        if self.fixed.contains(&c) && self.grid.get(c) != v {
            panic!("write of {v} at fixed {c} (was {})", self.grid.get(c));
        }
        self.grid.set(c, v);
    }

    pub fn clear(&mut self, c: GridCoord) {
        self.set(c, Tag::Empty);
    }

    /// True if `c` may be cleared: not fixed, or already empty.
    pub fn is_clearable(&self, c: GridCoord) -> bool {
        !self.fixed.contains(&c) || self.grid.get(c).is_empty()
    }

    pub fn fix(&mut self, c: GridCoord) {
        self.fixed.insert(c);
    }

    pub fn is_fixed(&self, c: GridCoord) -> bool {
        self.fixed.contains(&c)
    }

    /// Fix every occupied point.
    pub fn add_all_fixed(&mut self) {
        for c in self.grid.filled() {
            self.fixed.insert(c);
        }
    }

    /// Recompute `count` from the grid.
    pub fn recount(&mut self) {
        self.count = self.grid.center_count();
    }

    pub fn extract(&self, screen: GridCoord) -> Tile {
        self.grid.extract(screen)
    }

    pub fn extract_with(&self, screen: GridCoord, overrides: &Overrides) -> Tile {
        self.grid.extract_with(screen, overrides)
    }

    /// True if any catalog screen matches `tile`.
    pub fn has_screens(&self, tile: &Tile) -> bool {
        self.tileset.has_tile(tile)
    }

    pub fn can_set(&self, c: GridCoord, v: Tag) -> bool {
        let mut o = Overrides::new();
        o.insert(c, v);
        self.can_set_all(&o)
    }

    /// True if none of the points is fixed and every screen they touch
    /// still matches some catalog screen afterwards.
    pub fn can_set_all(&self, replace: &Overrides) -> bool {
        let mut screens = BTreeSet::new();
        for &c in replace.keys() {
            if self.fixed.contains(&c) {
                return false;
            }
            let s = c.corner();
            let (y, x) = (s.y(), s.x());
            if x < self.w && y < self.h {
                screens.insert(s);
            }
            if c.raw() & 8 == 0 && y < self.h && x > 0 {
                screens.insert(s.offset(-0x10));
            }
            if c.raw() & 0x800 == 0 && x < self.w && y > 0 {
                screens.insert(s.offset(-0x1000));
            }
            if c.is_corner() && x > 0 && y > 0 {
                screens.insert(s.offset(-0x1010));
            }
        }
        screens
            .into_iter()
            .all(|s| self.has_screens(&self.extract_with(s, replace)))
    }

    /// Points that clearing `coords` would leave stranded, plus `coords`.
    ///
    /// Returns an empty vec if a coordinate is an occupied fixed point, or
    /// if the fixed points would end up in more than `max_partitions`
    /// components.
    pub fn try_clear(&self, coords: &[GridCoord]) -> Vec<GridCoord> {
        let mut replace = Overrides::new();
        for &c in coords {
            if self.fixed.contains(&c) && !self.grid.get(c).is_empty() {
                return Vec::new();
            }
            replace.insert(c, Tag::Empty);
        }
        let parts = self.grid.partition(Some(&replace));
        if parts.component_count() <= 1 {
            return coords.to_vec();
        }
        let connected: BTreeSet<usize> = self
            .fixed
            .iter()
            .filter_map(|c| parts.component_of(c))
            .collect();
        if connected.len() > self.tuning.max_partitions {
            return Vec::new();
        }
        let mut orphaned = coords.to_vec();
        for (i, part) in parts.components().iter().enumerate() {
            if !connected.contains(&i) {
                orphaned.extend_from_slice(part);
            }
        }
        orphaned
    }

    /// Write a full 3x3 tile at `pos`, provided it agrees with everything
    /// already present and touches no fixed point.
    pub fn insert_tile(&mut self, pos: Pos, tile: &Tile) -> bool {
        let s = pos.to_grid();
        let cells: Vec<(GridCoord, Tag)> = (0..9)
            .map(|i| {
                let c = s.offset((i / 3) as i32 * 0x800 + (i % 3) as i32 * 8);
                (c, tile.0[i])
            })
            .collect();
        for &(c, v) in &cells {
            if self.fixed.contains(&c) {
                return false;
            }
            let cur = self.grid.get(c);
            if !cur.is_empty() && cur != v {
                return false;
            }
        }
        for (c, v) in cells {
            self.grid.set(c, v);
        }
        true
    }

    /// Blit a textual pattern at a random spot inside the margins and fix
    /// every occupied point it writes.
    pub fn insert_pattern(&mut self, rows: &[&str], margins: Margins) -> Step {
        let Some(first) = rows.first() else {
            return Ok(());
        };
        let ph = (rows.len() - 1) >> 1;
        let pw = (first.chars().count().max(1) - 1) >> 1;
        let dh = margins.top + margins.bottom;
        let dw = margins.left + margins.right;
        if self.h < ph + dh {
            return Err(Failure::new(FailureKind::EarlyFill, "too short"));
        }
        if self.w < pw + dw {
            return Err(Failure::new(FailureKind::EarlyFill, "too narrow"));
        }
        let y0 = self.rng.next_int((self.h - ph - dh).saturating_sub(1)) + margins.top;
        let x0 = self.rng.next_int((self.w - pw - dw).saturating_sub(1)) + margins.left;
        let c0 = GridCoord::screen(y0, x0);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let c = c0.offset(y as i32 * 0x800 + x as i32 * 8);
                let v = Tag::from_char(ch).unwrap_or(Tag::Empty);
                self.set(c, v);
                if !v.is_empty() {
                    self.fix(c);
                }
            }
        }
        self.recount();
        Ok(())
    }

    /// Occupied exits: stair centers and border edges, in scan order.
    pub fn exits(&self) -> Vec<GridCoord> {
        self.grid
            .filled()
            .into_iter()
            .filter(|&c| self.grid.get(c).is_stair() || self.grid.is_border(c))
            .collect()
    }

    pub fn save_excursion(&self, include_fixed: bool) -> Excursion {
        Excursion {
            data: self.grid.data().to_vec(),
            count: self.count,
            counters: [self.walls, self.bridges, self.rivers, self.wides],
            anchored: self.anchored_stairs.clone(),
            fixed: include_fixed.then(|| self.fixed.clone()),
        }
    }

    pub fn restore_excursion(&mut self, ex: Excursion) {
        self.grid.restore_data(ex.data);
        self.count = ex.count;
        [self.walls, self.bridges, self.rivers, self.wides] = ex.counters;
        self.anchored_stairs = ex.anchored;
        if let Some(fixed) = ex.fixed {
            self.fixed = fixed;
        }
    }

    /// Run `f`, rolling back every change it made if it fails.
    pub fn excursion<T>(
        &mut self,
        include_fixed: bool,
        f: impl FnOnce(&mut Self) -> Step<T>,
    ) -> Step<T> {
        let saved = self.save_excursion(include_fixed);
        let result = f(self);
        if result.is_err() {
            self.restore_excursion(saved);
        }
        result
    }

    pub fn show(&self) -> String {
        self.grid.show()
    }
}

impl fmt::Debug for Attempt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attempt")
            .field("level", &self.survey.level)
            .field("number", &self.number)
            .field("h", &self.h)
            .field("w", &self.w)
            .field("size", &self.size)
            .field("count", &self.count)
            .field("fixed", &self.fixed.len())
            .finish()
    }
}

/// Override map with a single entry.
pub fn single(c: GridCoord, v: Tag) -> Overrides {
    let mut o = HashMap::new();
    o.insert(c, v);
    o
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::synthetic::cave_catalog;
    use proptest::prelude::*;

    fn survey(h: usize, w: usize, size: usize) -> Survey {
        Survey {
            level: "test".into(),
            height: h,
            width: w,
            size,
            ..Survey::default()
        }
    }

    #[test]
    fn test_dimensions_stay_in_bounds() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let s = survey(16, 8, 10);
        for seed in 0..50 {
            let a = Attempt::new(&s, &ts, &config, Tuning::default(), ShuffleRng::new(seed), 1);
            assert!((15..=16).contains(&a.h));
            assert!((7..=8).contains(&a.w));
            assert!((10..=11).contains(&a.size));
        }
    }

    #[test]
    #[should_panic(expected = "fixed")]
    fn test_set_fixed_panics() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let s = survey(2, 2, 2);
        let mut a = Attempt::with_shape(&s, &ts, &config, Tuning::default(), ShuffleRng::new(1), 2, 2, 2);
        let c = GridCoord::center_of(0, 0);
        a.set(c, Tag::Cave);
        a.fix(c);
        // same value is fine
        a.set(c, Tag::Cave);
        a.set(c, Tag::Empty);
    }

    #[test]
    fn test_try_clear_reports_orphans() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let s = survey(1, 3, 3);
        let mut a = Attempt::with_shape(&s, &ts, &config, Tuning::default(), ShuffleRng::new(1), 1, 3, 3);
        a.grid.write_grid_2d(GridCoord(0), &["       ", " ccccc ", "       "]);
        a.fix(GridCoord::center_of(0, 0));
        let cut = GridCoord::center_of(0, 1).offset(8);
        let orphaned = a.try_clear(&[cut]);
        assert_eq!(orphaned[0], cut);
        assert!(orphaned.contains(&GridCoord::center_of(0, 2)));
        assert!(!orphaned.contains(&GridCoord::center_of(0, 1)));
        // clearing the fixed point itself is refused
        assert!(a.try_clear(&[GridCoord::center_of(0, 0)]).is_empty());
    }

    #[test]
    fn test_can_set_all_checks_neighbors() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let s = survey(1, 2, 2);
        let mut a = Attempt::with_shape(&s, &ts, &config, Tuning::default(), ShuffleRng::new(1), 1, 2, 2);
        a.grid.write_grid_2d(GridCoord(0), &["     ", " c c ", "     "]);
        let between = GridCoord::center_of(0, 0).offset(8);
        assert!(a.can_set(between, Tag::Cave));
        assert!(!a.can_set(between, Tag::River));
        a.fix(between);
        assert!(!a.can_set(between, Tag::Cave));
    }

    #[test]
    fn test_insert_tile() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let s = survey(2, 2, 2);
        let mut a = Attempt::with_shape(&s, &ts, &config, Tuning::default(), ShuffleRng::new(1), 2, 2, 2);
        let bend: Tile = "    cc c ".parse().unwrap();
        assert!(a.insert_tile(Pos::new(0, 0), &bend));
        assert_eq!(a.get(GridCoord::center_of(0, 0)), Tag::Cave);
        let conflict: Tile = "    r    ".parse().unwrap();
        assert!(!a.insert_tile(Pos::new(0, 0), &conflict));
    }

    #[test]
    fn test_insert_pattern_fixes_cells() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let s = survey(4, 4, 4);
        let mut a = Attempt::with_shape(&s, &ts, &config, Tuning::default(), ShuffleRng::new(3), 4, 4, 4);
        a.insert_pattern(&["     ", " ccc ", "     "], Margins::default()).unwrap();
        assert_eq!(a.count, 2);
        assert_eq!(a.fixed.len(), 3);
        let err = a.insert_pattern(&["   "; 11], Margins::default()).unwrap_err();
        assert_eq!(err.kind, FailureKind::EarlyFill);
    }

    #[test]
    fn test_excursion_restores_on_failure() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let s = survey(2, 2, 2);
        let mut a = Attempt::with_shape(&s, &ts, &config, Tuning::default(), ShuffleRng::new(1), 2, 2, 2);
        let c = GridCoord::center_of(1, 1);
        let r: Step = a.excursion(true, |a| {
            a.set(c, Tag::Cave);
            a.fix(c);
            a.count = 9;
            Err(Failure::new(FailureKind::Refine, "nope"))
        });
        assert!(r.is_err());
        assert_eq!(a.get(c), Tag::Empty);
        assert!(!a.is_fixed(c));
        assert_eq!(a.count, 0);

        let ok: Step<u8> = a.excursion(false, |a| {
            a.set(c, Tag::Cave);
            Ok(7)
        });
        assert_eq!(ok, Ok(7));
        assert_eq!(a.get(c), Tag::Cave);
    }

    proptest! {
        #[test]
        fn test_discarded_excursion_round_trips(
            writes in prop::collection::vec((0usize..25, 0usize..4), 0..40)
        ) {
            let cat = cave_catalog();
            let ts = Tileset::new(&cat);
            let config = ShuffleConfig::default();
            let s = survey(2, 2, 2);
            let mut a = Attempt::with_shape(&s, &ts, &config, Tuning::default(), ShuffleRng::new(9), 2, 2, 2);
            a.grid.write_grid_2d(GridCoord(0), &["     ", " ccc ", " c   ", " c   ", "     "]);
            a.recount();
            let before = a.grid.clone();
            let tags = [Tag::Empty, Tag::Cave, Tag::Wide, Tag::River];
            let _: Step = a.excursion(false, |a| {
                for &(i, t) in &writes {
                    let c = a.grid.coord(i);
                    a.set(c, tags[t]);
                }
                a.recount();
                Err(Failure::new(FailureKind::Refine, "discard"))
            });
            prop_assert_eq!(&a.grid, &before);
            prop_assert_eq!(a.count, 3);
        }
    }
}
