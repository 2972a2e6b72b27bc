//! River caves, waterfalls and palace halls
//!
//! All three are two-stage shuffles: the river or hall is laid down and
//! fixed first, then land fills in around it.

#[cfg(not(feature = "std"))]
use crate::compat::*;
#[cfg(not(feature = "std"))]
use alloc::collections::BTreeSet;
#[cfg(feature = "std")]
use std::collections::BTreeSet;

use super::attempt::Attempt;
use super::pipeline;
use super::strategy::CaveStrategy;
use super::twostage::{self, EarlyStage};
use super::wide::place_named_arenas;
use crate::catalog::synthetic::FORTRESS_ARENA;
use crate::catalog::ScreenId;
use crate::config::Tuning;
use crate::error::{Failure, FailureKind, Step};
use crate::layout::{Layout, Traverse};
use crate::maze::{Cursor, Dir, GridCoord, Monogrid, Overrides, Pos, Tag};

fn fail<T>(kind: FailureKind, detail: impl Into<String>) -> Step<T> {
    Err(Failure::new(kind, detail))
}

/// Check that clearing every `hidden` point puts each exit in a
/// partition of its own.
fn exits_separated(a: &Attempt, hidden: &[Tag]) -> bool {
    let mut overrides = Overrides::new();
    for c in a.grid.filled() {
        if hidden.contains(&a.get(c)) {
            overrides.insert(c, Tag::Empty);
        }
    }
    let parts = a.grid.partition(Some(&overrides));
    let exits = a.exits();
    let distinct: BTreeSet<Option<usize>> = exits.iter().map(|c| parts.component_of(c)).collect();
    distinct.len() == exits.len()
}

fn flight_connected(a: &Attempt, layout: &Layout, replace: Option<(Pos, ScreenId)>) -> bool {
    let parts = layout.traverse(a.tileset, Traverse::flight(), replace);
    parts.component_count() == a.tuning.max_partitions
}

/// A cave split by a river that only flight can cross.
#[derive(Debug, Clone, Default)]
pub struct RiverCaveShuffle {
    tuning: Tuning,
}

impl RiverCaveShuffle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tuning(tuning: Tuning) -> Self {
        Self { tuning }
    }
}

/// Carve arenas out of vertical land runs, clearing both side screens.
pub fn add_river_arenas(a: &mut Attempt, arenas: usize) -> bool {
    let mut arenas = arenas;
    if arenas == 0 {
        return true;
    }
    for s in a.rng.ishuffle(&a.grid.screens()) {
        let middle = s.center();
        let (up, down) = (middle.n(), middle.s());
        if [middle, up, down].iter().any(|&c| a.get(c) != Tag::Cave) || a.is_fixed(middle) {
            continue;
        }
        let mut doomed = Vec::new();
        let mut ok = true;
        for side in [-8, 8] {
            let near = middle.offset(side);
            if a.grid.is_border(near) {
                continue;
            }
            let beside = near.offset(side);
            let tile = a.extract(beside.corner());
            if tile.0.iter().any(|t| !matches!(t, Tag::Empty | Tag::Cave)) {
                ok = false;
                break;
            }
            doomed.extend([near, beside, beside.offset(side), beside.offset(-0x800), beside.offset(0x800)]);
        }
        if !ok || doomed.iter().any(|&c| !a.is_clearable(c)) {
            continue;
        }
        for c in doomed {
            a.clear(c);
        }
        a.set(middle, Tag::Arena);
        for c in [middle, up, down] {
            a.fix(c);
        }
        arenas -= 1;
        if arenas == 0 {
            return true;
        }
    }
    false
}

/// The river must stand between every pair of exits.
pub fn require_river_between_exits(a: &Attempt) -> Step {
    if a.survey.exit_count() < 2 {
        return Ok(());
    }
    if !exits_separated(a, &[Tag::River]) {
        return fail(FailureKind::Preinfer, "river does not separate the exits");
    }
    Ok(())
}

impl EarlyStage for RiverCaveShuffle {
    fn early_tag(&self) -> Tag {
        Tag::River
    }

    fn target_early(&self, a: &Attempt) -> usize {
        a.targets.river
    }
}

impl CaveStrategy for RiverCaveShuffle {
    fn name(&self) -> &'static str {
        "RiverCaveShuffle"
    }

    fn tuning(&self) -> Tuning {
        self.tuning.clone()
    }

    fn initial_fill(&self, a: &mut Attempt) -> Step {
        twostage::initial_fill(self, a)
    }

    fn add_early_features(&self, a: &mut Attempt) -> Step {
        twostage::add_early_features(self, a)
    }

    fn add_late_features(&self, _a: &mut Attempt) -> Step {
        Ok(())
    }

    fn add_arenas(&self, a: &mut Attempt, arenas: usize) -> bool {
        add_river_arenas(a, arenas)
    }

    fn preinfer(&self, a: &mut Attempt) -> Step {
        require_river_between_exits(a)
    }

    fn check_layout(&self, a: &Attempt, layout: &Layout, replace: Option<(Pos, ScreenId)>) -> bool {
        flight_connected(a, layout, replace)
    }
}

/// A river falling from the top edge to the bottom row, with a down
/// stair on each bank at the bottom.
#[derive(Debug, Clone)]
pub struct WaterfallRiverCaveShuffle {
    tuning: Tuning,
}

impl Default for WaterfallRiverCaveShuffle {
    fn default() -> Self {
        Self {
            tuning: Tuning {
                add_blocks: false,
                ..Tuning::default()
            },
        }
    }
}

impl WaterfallRiverCaveShuffle {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EarlyStage for WaterfallRiverCaveShuffle {
    fn early_tag(&self) -> Tag {
        Tag::River
    }

    fn target_early(&self, a: &Attempt) -> usize {
        a.targets.river
    }

    fn initial_fill_early(&self, a: &mut Attempt) -> Step {
        if a.w < 5 || a.h < 2 {
            return fail(FailureKind::EarlyFill, format!("{}x{} too small for a waterfall", a.h, a.w));
        }
        let mut mono = Monogrid::new(a.h, a.w, Some(a.tileset.edge_masks(Tag::River)));
        let x0 = 2 + a.rng.next_int(a.w - 4);
        let x1 = 2 + a.rng.next_int(a.w - 4);
        let mut cursor = Cursor::new(&mut mono, a.h - 1, x1);
        cursor.go(Dir::Up);
        cursor.directed_path(&mut a.rng, 1, x0);
        cursor.go(Dir::Up);
        twostage::place_early(a, &mono, Tag::River);
        Ok(())
    }
}

impl CaveStrategy for WaterfallRiverCaveShuffle {
    fn name(&self) -> &'static str {
        "WaterfallRiverCaveShuffle"
    }

    fn tuning(&self) -> Tuning {
        self.tuning.clone()
    }

    fn initial_fill(&self, a: &mut Attempt) -> Step {
        twostage::initial_fill(self, a)
    }

    /// The only exits are two down stairs flanking the foot of the falls.
    fn add_edges(&self, a: &mut Attempt) -> Step {
        let bottom = a.h - 1;
        let Some(r) = (0..a.w).find(|&x| a.get(GridCoord::center_of(bottom, x)) == Tag::River) else {
            return fail(FailureKind::Edges, "waterfall never reaches the bottom row");
        };
        if r == 0 || r + 1 >= a.w {
            return fail(FailureKind::Edges, "waterfall lands against the side");
        }
        let c0 = GridCoord::center_of(bottom, a.rng.next_int(r));
        let c1 = GridCoord::center_of(bottom, r + 1 + a.rng.next_int(a.w - 1 - r));
        for c in [c0, c1] {
            if !a.is_clearable(c.w()) || !a.is_clearable(c.e()) {
                return fail(FailureKind::Edges, format!("stair at {c} is boxed in"));
            }
            a.set(c, Tag::StairDown);
            a.fix(c);
            a.clear(c.w());
            a.clear(c.e());
        }
        Ok(())
    }

    fn add_early_features(&self, a: &mut Attempt) -> Step {
        twostage::add_early_features(self, a)
    }

    fn add_late_features(&self, _a: &mut Attempt) -> Step {
        Ok(())
    }

    fn add_arenas(&self, a: &mut Attempt, arenas: usize) -> bool {
        add_river_arenas(a, arenas)
    }

    fn add_stairs(&self, _a: &mut Attempt, _up: usize, _down: usize) -> Step {
        Ok(())
    }

    fn check_layout(&self, a: &Attempt, layout: &Layout, replace: Option<(Pos, ScreenId)>) -> bool {
        flight_connected(a, layout, replace)
    }
}

/// A palace of wide halls, entered from the bottom by a carved stair and
/// holding a fortress arena near the top.
#[derive(Debug, Clone, Default)]
pub struct SaberaPalaceShuffle {
    tuning: Tuning,
}

impl SaberaPalaceShuffle {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EarlyStage for SaberaPalaceShuffle {
    fn early_tag(&self) -> Tag {
        Tag::Wide
    }

    fn target_early(&self, a: &Attempt) -> usize {
        match a.targets.wide {
            0 => (a.h * a.w) / 2,
            n => n,
        }
    }

    fn initial_fill_early(&self, a: &mut Attempt) -> Step {
        let (h, w) = (a.h, a.w);
        if h < 3 || w < 3 {
            return fail(FailureKind::EarlyFill, format!("{h}x{w} too small for a palace"));
        }
        let mut mono = Monogrid::new(h, w, Some(a.tileset.edge_masks(Tag::Wide)));
        mono.fill();

        // The arena hangs below a single land screen, open only downward.
        let arena = if a.targets.arena > 0 {
            let x = 1 + a.rng.next_int(w - 2);
            let i = w + x;
            let carved = mono.delete2(0, x)
                && mono.delete_edge(i, Dir::Left)
                && mono.delete_edge(i, Dir::Right);
            if !carved {
                return fail(FailureKind::EarlyFill, "could not carve the arena wings");
            }
            mono.fixed.insert(i);
            mono.fixed.insert(i + w);
            Some(GridCoord::center_of(1, x))
        } else {
            None
        };

        // The stair is a dead end on the bottom row.
        let stair = if a.stairs[1] > 0 {
            let x = a.rng.next_int(w);
            let i = (h - 1) * w + x;
            for dir in [Dir::Left, Dir::Right] {
                if !mono.is_border(i, dir) && !mono.delete_edge(i, dir) {
                    return fail(FailureKind::EarlyFill, "could not carve the stair");
                }
            }
            mono.fixed.insert(i);
            Some(GridCoord::center_of(h - 1, x))
        } else {
            None
        };

        let target = self.target_early(a);
        if !mono.refine(&mut a.rng, target) {
            return fail(FailureKind::EarlyFill, format!("could not refine halls to {target}"));
        }
        if mono.consolidate(&mut a.rng, 8).is_empty() {
            return fail(FailureKind::EarlyFill, "could not consolidate halls");
        }

        a.grid.restore_data(mono.to_grid(Tag::Wide).data().to_vec());
        if let Some(c) = arena {
            a.set(c, Tag::Arena);
        }
        if let Some(c) = stair {
            a.set(c, Tag::StairDown);
            a.stairs[1] -= 1;
        }
        a.add_all_fixed();
        a.wides = mono.filled();
        Ok(())
    }
}

impl CaveStrategy for SaberaPalaceShuffle {
    fn name(&self) -> &'static str {
        "SaberaPalaceShuffle"
    }

    fn tuning(&self) -> Tuning {
        self.tuning.clone()
    }

    fn initial_fill(&self, a: &mut Attempt) -> Step {
        twostage::initial_fill(self, a)?;
        let arenas: Vec<GridCoord> = a
            .grid
            .screens()
            .into_iter()
            .map(|s| s.center())
            .filter(|&c| a.get(c) == Tag::Arena)
            .collect();
        for c in arenas {
            if a.get(c.offset(-0x1000)) != Tag::Cave {
                return fail(FailureKind::EarlyFill, format!("no land above arena at {c}"));
            }
            a.set(c.n(), Tag::Cave);
            a.fix(c.n());
            a.fix(c.offset(-0x1000));
        }
        Ok(())
    }

    fn add_early_features(&self, a: &mut Attempt) -> Step {
        twostage::add_early_features(self, a)
    }

    fn add_arenas(&self, _a: &mut Attempt, _arenas: usize) -> bool {
        true
    }

    /// Up stairs must come out in separate parts of the land.
    fn preinfer(&self, a: &mut Attempt) -> Step {
        let ups: Vec<GridCoord> = a
            .grid
            .filled()
            .into_iter()
            .filter(|&c| a.get(c) == Tag::StairUp)
            .collect();
        if ups.len() < 2 {
            return Ok(());
        }
        let mut hidden = Overrides::new();
        for c in a.grid.filled() {
            if matches!(a.get(c), Tag::Wide | Tag::Arena) {
                hidden.insert(c, Tag::Empty);
            }
        }
        let parts = a.grid.partition(Some(&hidden));
        let distinct: BTreeSet<Option<usize>> = ups.iter().map(|c| parts.component_of(c)).collect();
        if distinct.len() < 2 {
            return fail(FailureKind::Preinfer, "up stairs share one stretch of land");
        }
        Ok(())
    }

    fn refine_layout(&self, a: &mut Attempt, layout: &mut Layout) -> Step {
        place_named_arenas(a, layout, FORTRESS_ARENA);
        pipeline::refine_layout(self, a, layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::synthetic::cave_catalog;
    use crate::catalog::Tileset;
    use crate::config::ShuffleConfig;
    use crate::rng::ShuffleRng;
    use crate::survey::Survey;

    #[test]
    fn test_waterfall_reaches_both_ends() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let sv = Survey {
            level: "falls".into(),
            height: 4,
            width: 6,
            size: 12,
            stairs: [0, 2],
            ..Survey::default()
        };
        let s = WaterfallRiverCaveShuffle::new();
        assert!(!s.tuning().add_blocks);
        for seed in 0..10 {
            let mut a = Attempt::with_shape(&sv, &ts, &config, s.tuning(), ShuffleRng::new(seed), 4, 6, 12);
            s.initial_fill_early(&mut a).unwrap();
            let top = (0..6).filter(|&x| a.get(GridCoord::center_of(0, x)) == Tag::River).count();
            let bottom = (0..6).filter(|&x| a.get(GridCoord::center_of(3, x)) == Tag::River).count();
            assert_eq!(top, 1);
            assert_eq!(bottom, 1);
            assert_eq!(a.grid.partition(None).component_count(), 1);
        }
    }

    #[test]
    fn test_waterfall_stairs_flank_the_river() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let sv = Survey {
            level: "falls".into(),
            height: 4,
            width: 6,
            size: 12,
            ..Survey::default()
        };
        let s = WaterfallRiverCaveShuffle::new();
        let mut a = Attempt::with_shape(&sv, &ts, &config, s.tuning(), ShuffleRng::new(3), 4, 6, 12);
        s.initial_fill(&mut a).unwrap();
        s.add_edges(&mut a).unwrap();
        let row: Vec<Tag> = (0..6).map(|x| a.get(GridCoord::center_of(3, x))).collect();
        let r = row.iter().position(|&t| t == Tag::River).unwrap();
        assert!(row[..r].contains(&Tag::StairDown));
        assert!(row[r + 1..].contains(&Tag::StairDown));
    }

    #[test]
    fn test_waterfall_needs_width() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let sv = Survey::default();
        let s = WaterfallRiverCaveShuffle::new();
        let mut a = Attempt::with_shape(&sv, &ts, &config, s.tuning(), ShuffleRng::new(3), 4, 4, 8);
        assert_eq!(s.initial_fill_early(&mut a).unwrap_err().kind, FailureKind::EarlyFill);
    }

    #[test]
    fn test_river_must_split_exits() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let sv = Survey {
            level: "river".into(),
            height: 1,
            width: 3,
            size: 3,
            edges: [0, 1, 0, 1],
            ..Survey::default()
        };
        let mut a = Attempt::with_shape(&sv, &ts, &config, Tuning::default(), ShuffleRng::new(1), 1, 3, 3);
        a.grid.write_grid_2d(GridCoord(0), &["       ", "cc r cc", "       "]);
        assert_eq!(require_river_between_exits(&a), Ok(()));
        a.set(GridCoord::center_of(0, 1), Tag::Cave);
        a.set(GridCoord::center_of(0, 1).w(), Tag::Cave);
        a.set(GridCoord::center_of(0, 1).e(), Tag::Cave);
        assert_eq!(require_river_between_exits(&a).unwrap_err().kind, FailureKind::Preinfer);
    }

    #[test]
    fn test_river_arena_clears_its_sides() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let sv = Survey::default();
        let mut a = Attempt::with_shape(&sv, &ts, &config, Tuning::default(), ShuffleRng::new(1), 3, 3, 5);
        a.grid.write_grid_2d(
            GridCoord(0),
            &["       ", "   c   ", "   c   ", " ccccc ", "   c   ", "   c   ", "       "],
        );
        a.fix(GridCoord::center_of(0, 1));
        assert!(add_river_arenas(&mut a, 1));
        let middle = GridCoord::center_of(1, 1);
        assert_eq!(a.get(middle), Tag::Arena);
        assert!(a.get(middle.w()).is_empty() && a.get(middle.e()).is_empty());
        assert!(a.get(GridCoord::center_of(1, 0)).is_empty());
        assert!(a.is_fixed(middle.n()) && a.is_fixed(middle.s()));
    }

    #[test]
    fn test_palace_carves_arena_and_stair() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let mut sv = Survey {
            level: "palace".into(),
            height: 4,
            width: 4,
            size: 12,
            stairs: [0, 1],
            ..Survey::default()
        };
        sv.features.arena = 1;
        let s = SaberaPalaceShuffle::new();
        let mut placed = 0;
        for seed in 0..10 {
            let mut a = Attempt::with_shape(&sv, &ts, &config, s.tuning(), ShuffleRng::new(seed), 4, 4, 12);
            if s.initial_fill(&mut a).is_err() {
                continue;
            }
            placed += 1;
            let arena = (0..4).map(|x| GridCoord::center_of(1, x)).find(|&c| a.get(c) == Tag::Arena).unwrap();
            assert_eq!(a.get(arena.n()), Tag::Cave);
            assert_eq!(a.get(arena.s()), Tag::Wide);
            assert!(a.get(arena.w()).is_empty() && a.get(arena.e()).is_empty());
            let stair = (0..4).map(|x| GridCoord::center_of(3, x)).find(|&c| a.get(c) == Tag::StairDown);
            assert!(stair.is_some_and(|c| a.is_fixed(c)));
            assert_eq!(a.stairs, [0, 0]);
        }
        assert!(placed > 0);
    }
}
