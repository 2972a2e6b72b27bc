//! Levels shuffled in pairs
//!
//! Some levels sit directly above another: an underpass on the lower level
//! runs beneath an overpass on the upper one, and stairs join the two. The
//! lower level is shuffled first. Its bridges and stairs are recorded, and
//! the upper level then places matching overpasses and stairs, all shifted
//! by one shared offset, before the rest of its pipeline runs.

use log::debug;

#[cfg(not(feature = "std"))]
use crate::compat::*;

use super::attempt::Attempt;
use super::orchestrator::{MazeShuffle, ShuffleOutcome};
use super::pipeline;
use super::strategy::CaveStrategy;
use crate::catalog::{ScreenId, Tileset};
use crate::config::{ShuffleConfig, Tuning};
use crate::error::{Failure, FailureKind, ShuffleError, Step};
use crate::layout::Layout;
use crate::maze::{Grid, GridCoord, Overrides, Pos, Tag};
use crate::rng::ShuffleRng;
use crate::survey::Survey;

/// Underpasses and linking stairs found on a shuffled lower level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnderpassRecord {
    pub bridges: Vec<Pos>,
    pub stairs: Vec<Pos>,
}

impl UnderpassRecord {
    /// Collect horizontal bridges and the stairs leading to the other
    /// level: up stairs, or down stairs when `reverse` is set.
    pub fn from_grid(grid: &Grid, reverse: bool) -> Self {
        let stair = if reverse { Tag::StairDown } else { Tag::StairUp };
        let mut record = Self::default();
        for s in grid.screens() {
            let c = s.center();
            let t = grid.get(c);
            if t == Tag::Bridge && grid.get(c.n()).is_empty() && grid.get(c.s()).is_empty() {
                record.bridges.push(s.pos());
            } else if t == stair {
                record.stairs.push(s.pos());
            }
        }
        record
    }

    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty() && self.stairs.is_empty()
    }

    /// Every `(dy, dx)` that keeps the whole record inside an `h` by `w`
    /// map, in scan order.
    pub fn offsets(&self, h: usize, w: usize) -> Vec<(i32, i32)> {
        let all: Vec<Pos> = self.bridges.iter().chain(&self.stairs).copied().collect();
        let ys: Vec<i32> = all.iter().map(|p| p.y() as i32).collect();
        let xs: Vec<i32> = all.iter().map(|p| p.x() as i32).collect();
        let (Some(&y0), Some(&y1), Some(&x0), Some(&x1)) =
            (ys.iter().min(), ys.iter().max(), xs.iter().min(), xs.iter().max())
        else {
            return vec![(0, 0)];
        };
        let (h, w) = (h as i32, w as i32);
        let mut out = Vec::new();
        for dy in -y0..h - y1 {
            for dx in -x0..w - x1 {
                out.push((dy, dx));
            }
        }
        out
    }
}

/// Wraps the upper level's strategy, placing the linked features before
/// its own early features.
pub struct OverpassShuffle {
    inner: Box<dyn CaveStrategy>,
    record: UnderpassRecord,
    reverse: bool,
}

impl OverpassShuffle {
    pub fn new(inner: Box<dyn CaveStrategy>, record: UnderpassRecord, reverse: bool) -> Self {
        Self { inner, record, reverse }
    }

    /// Stair the upper level needs opposite each recorded one.
    fn stair_tag(&self) -> Tag {
        if self.reverse { Tag::StairUp } else { Tag::StairDown }
    }

    fn place_at(&self, a: &mut Attempt, dy: i32, dx: i32) -> Step {
        let shift = |p: &Pos| p.offset(dy, dx).map(|p| p.to_grid().center());
        for p in &self.record.bridges {
            let Some(c) = shift(p) else {
                return Err(Failure::new(FailureKind::Dependent, "bridge shifted off the map"));
            };
            if a.get(c) != Tag::Cave || a.is_fixed(c) || !a.is_clearable(c.w()) || !a.is_clearable(c.e()) {
                return Err(Failure::new(FailureKind::Dependent, format!("no overpass at {c}")));
            }
            a.set(c, Tag::Bridge);
            a.fix(c);
            a.clear(c.w());
            a.clear(c.e());
        }
        let stair = self.stair_tag();
        for p in &self.record.stairs {
            let Some(c) = shift(p) else {
                return Err(Failure::new(FailureKind::Dependent, "stair shifted off the map"));
            };
            if a.get(c) != Tag::Cave {
                return Err(Failure::new(FailureKind::Dependent, format!("no stair at {c}")));
            }
            let mods = pipeline::add_early_stair(a, c, stair);
            let replace: Overrides = mods.iter().copied().collect();
            if mods.is_empty() || !a.can_set_all(&replace) {
                return Err(Failure::new(FailureKind::Dependent, format!("stair at {c} does not fit")));
            }
            for (m, v) in mods {
                a.set(m, v);
            }
            a.fix(c);
            a.anchored_stairs.push(c.pos());
        }
        Ok(())
    }

    /// Find one offset at which every recorded feature fits.
    fn place_links(&self, a: &mut Attempt) -> Step {
        if self.record.is_empty() {
            return Ok(());
        }
        for (dy, dx) in a.rng.ishuffle(&self.record.offsets(a.h, a.w)) {
            if a.excursion(true, |a| self.place_at(a, dy, dx)).is_ok() {
                a.targets.over = a.targets.over.saturating_sub(self.record.bridges.len());
                let budget = &mut a.stairs[usize::from(!self.reverse)];
                *budget = budget.saturating_sub(self.record.stairs.len());
                return Ok(());
            }
        }
        Err(Failure::new(
            FailureKind::Dependent,
            format!(
                "{} bridges and {} stairs fit nowhere",
                self.record.bridges.len(),
                self.record.stairs.len()
            ),
        ))
    }
}

impl CaveStrategy for OverpassShuffle {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn tuning(&self) -> Tuning {
        self.inner.tuning()
    }

    fn max_attempts(&self) -> usize {
        self.inner.max_attempts()
    }

    fn init(&self, a: &mut Attempt) {
        self.inner.init(a)
    }

    fn initial_fill(&self, a: &mut Attempt) -> Step {
        self.inner.initial_fill(a)
    }

    fn add_edges(&self, a: &mut Attempt) -> Step {
        self.inner.add_edges(a)
    }

    fn add_up_edge(&self, a: &mut Attempt, edge: GridCoord) -> bool {
        self.inner.add_up_edge(a, edge)
    }

    fn add_down_edge(&self, a: &mut Attempt, edge: GridCoord) -> bool {
        self.inner.add_down_edge(a, edge)
    }

    fn add_left_edge(&self, a: &mut Attempt, edge: GridCoord) -> bool {
        self.inner.add_left_edge(a, edge)
    }

    fn add_right_edge(&self, a: &mut Attempt, edge: GridCoord) -> bool {
        self.inner.add_right_edge(a, edge)
    }

    fn add_early_features(&self, a: &mut Attempt) -> Step {
        self.place_links(a)?;
        self.inner.add_early_features(a)
    }

    fn add_spikes(&self, a: &mut Attempt, spikes: usize) -> bool {
        self.inner.add_spikes(a, spikes)
    }

    fn add_overpasses(&self, a: &mut Attempt, over: usize) -> Step {
        self.inner.add_overpasses(a, over)
    }

    fn refine(&self, a: &mut Attempt) -> Step {
        self.inner.refine(a)
    }

    fn can_remove(&self, a: &Attempt, tag: Tag) -> bool {
        self.inner.can_remove(a, tag)
    }

    fn removal_map(&self, a: &Attempt, c: GridCoord) -> Overrides {
        self.inner.removal_map(a, c)
    }

    fn refine_edges(&self, a: &mut Attempt) -> Step {
        self.inner.refine_edges(a)
    }

    fn remove_spurs(&self, a: &mut Attempt) {
        self.inner.remove_spurs(a)
    }

    fn remove_tight_loops(&self, a: &mut Attempt) {
        self.inner.remove_tight_loops(a)
    }

    fn add_late_features(&self, a: &mut Attempt) -> Step {
        self.inner.add_late_features(a)
    }

    fn add_arenas(&self, a: &mut Attempt, arenas: usize) -> bool {
        self.inner.add_arenas(a, arenas)
    }

    fn is_eligible_arena(&self, a: &Attempt, middle: GridCoord) -> bool {
        self.inner.is_eligible_arena(a, middle)
    }

    fn add_underpasses(&self, a: &mut Attempt, under: usize) -> bool {
        self.inner.add_underpasses(a, under)
    }

    fn add_pits(&self, a: &mut Attempt, pits: usize) -> bool {
        self.inner.add_pits(a, pits)
    }

    fn add_ramps(&self, a: &mut Attempt, ramps: usize) -> bool {
        self.inner.add_ramps(a, ramps)
    }

    fn add_stairs(&self, a: &mut Attempt, up: usize, down: usize) -> Step {
        self.inner.add_stairs(a, up, down)
    }

    fn preinfer(&self, a: &mut Attempt) -> Step {
        self.inner.preinfer(a)
    }

    fn infer_screens(&self, a: &mut Attempt) -> Step<Layout> {
        self.inner.infer_screens(a)
    }

    fn refine_layout(&self, a: &mut Attempt, layout: &mut Layout) -> Step {
        self.inner.refine_layout(a, layout)
    }

    fn check_layout(&self, a: &Attempt, layout: &Layout, replace: Option<(Pos, ScreenId)>) -> bool {
        self.inner.check_layout(a, layout, replace)
    }

    fn check_screens(&self, a: &Attempt, layout: &Layout) -> Step {
        self.inner.check_screens(a, layout)
    }

    fn stair_links(&self, a: &Attempt) -> Vec<(Pos, Pos)> {
        a.anchored_stairs
            .iter()
            .copied()
            .zip(self.record.stairs.iter().copied())
            .collect()
    }
}

/// Both halves of a paired shuffle.
#[derive(Debug, Clone)]
pub struct PairedOutcome {
    pub under: ShuffleOutcome,
    /// Carries the stair links as `(over, under)` pairs.
    pub over: ShuffleOutcome,
}

/// A lower level and the level stacked on it.
pub struct PairedShuffle {
    under: MazeShuffle,
    over: Box<dyn CaveStrategy>,
    over_survey: Survey,
    reverse: bool,
    config: ShuffleConfig,
}

impl PairedShuffle {
    pub fn new(under: MazeShuffle, over: Box<dyn CaveStrategy>, over_survey: Survey) -> Self {
        Self {
            under,
            over,
            over_survey,
            reverse: false,
            config: ShuffleConfig::default(),
        }
    }

    /// Link the lower level's down stairs instead of its up stairs.
    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Config for the upper level's shuffle.
    pub fn with_config(mut self, config: ShuffleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn shuffle(self, tileset: &Tileset<'_>, rng: &mut ShuffleRng) -> Result<PairedOutcome, ShuffleError> {
        let mut under = self.under;
        let under = under.shuffle(tileset, rng)?.clone();
        let record = UnderpassRecord::from_grid(&under.grid, self.reverse);
        debug!(
            "{}: linking {} bridges and {} stairs",
            self.over_survey.level,
            record.bridges.len(),
            record.stairs.len()
        );
        let strategy = OverpassShuffle::new(self.over, record, self.reverse);
        let mut over = MazeShuffle::with_config(Box::new(strategy), self.over_survey, self.config);
        let over = over.shuffle(tileset, rng)?.clone();
        Ok(PairedOutcome { under, over })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::synthetic::cave_catalog;
    use crate::shuffle::strategy::CaveShuffle;

    #[test]
    fn test_record_picks_underpasses_and_stairs() {
        let mut grid = Grid::new(2, 3);
        grid.write_grid_2d(GridCoord(0), &["       ", " ccbc< ", " c   c ", " b c c ", "       "]);
        let record = UnderpassRecord::from_grid(&grid, false);
        assert_eq!(record.bridges, vec![Pos::new(0, 1)]);
        assert_eq!(record.stairs, vec![Pos::new(0, 2)]);
        // the second bridge has a cave edge above it
        let reversed = UnderpassRecord::from_grid(&grid, true);
        assert!(reversed.stairs.is_empty());
    }

    #[test]
    fn test_offsets_keep_record_inside() {
        let record = UnderpassRecord {
            bridges: vec![Pos::new(1, 1)],
            stairs: vec![Pos::new(2, 3)],
        };
        let offsets = record.offsets(3, 4);
        assert_eq!(offsets, vec![(-1, -1), (-1, 0), (0, -1), (0, 0)]);
        assert!(record.offsets(1, 4).is_empty());
        assert_eq!(UnderpassRecord::default().offsets(3, 3), vec![(0, 0)]);
    }

    #[test]
    fn test_links_are_placed_and_fixed() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let mut sv = Survey {
            level: "over".into(),
            height: 3,
            width: 4,
            size: 12,
            stairs: [0, 2],
            ..Survey::default()
        };
        sv.features.over = 1;
        let record = UnderpassRecord {
            bridges: vec![Pos::new(1, 1)],
            stairs: vec![Pos::new(1, 3)],
        };
        let s = OverpassShuffle::new(Box::new(CaveShuffle::new()), record, false);
        let mut a = Attempt::with_shape(&sv, &ts, &config, s.tuning(), ShuffleRng::new(4), 3, 4, 12);
        s.initial_fill(&mut a).unwrap();
        s.place_links(&mut a).unwrap();
        let bridge = (0..3)
            .flat_map(|y| (0..4).map(move |x| GridCoord::center_of(y, x)))
            .find(|&c| a.get(c) == Tag::Bridge)
            .unwrap();
        assert!(a.is_fixed(bridge));
        assert!(a.get(bridge.w()).is_empty() && a.get(bridge.e()).is_empty());
        assert_eq!(a.anchored_stairs.len(), 1);
        let stair = a.anchored_stairs[0].to_grid().center();
        assert_eq!(a.get(stair), Tag::StairDown);
        assert!(a.is_fixed(stair));
        // both linked screens moved by the same offset
        assert_eq!(stair.pos().x() - bridge.pos().x(), 2);
        assert_eq!(stair.pos().y(), bridge.pos().y());
        assert_eq!(a.targets.over, 0);
        assert_eq!(a.stairs, [0, 1]);
        assert_eq!(s.stair_links(&a), vec![(stair.pos(), Pos::new(1, 3))]);
    }

    #[test]
    fn test_unplaceable_links_roll_back() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let sv = Survey::default();
        let record = UnderpassRecord {
            bridges: vec![Pos::new(0, 0)],
            stairs: vec![],
        };
        let s = OverpassShuffle::new(Box::new(CaveShuffle::new()), record, false);
        let mut a = Attempt::with_shape(&sv, &ts, &config, s.tuning(), ShuffleRng::new(4), 2, 2, 4);
        // nothing but empty screens to bridge over
        let err = s.place_links(&mut a).unwrap_err();
        assert_eq!(err.kind, FailureKind::Dependent);
        assert!(a.fixed.is_empty());
        assert_eq!(a.grid.center_count(), 0);
    }
}
