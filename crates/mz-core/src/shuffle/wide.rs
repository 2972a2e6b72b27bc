//! Wide halls and crypt entrances

#[cfg(not(feature = "std"))]
use crate::compat::*;

use super::attempt::Attempt;
use super::pipeline;
use super::strategy::CaveStrategy;
use crate::catalog::synthetic::CRYPT_ARENA;
use crate::config::Tuning;
use crate::error::{Failure, FailureKind, Step};
use crate::layout::Layout;
use crate::maze::{GridCoord, Tag};

/// Wide rooms joined by narrow up exits, with arenas pressed against the
/// top border.
#[derive(Debug, Clone)]
pub struct WideCaveShuffle {
    tuning: Tuning,
}

impl Default for WideCaveShuffle {
    fn default() -> Self {
        Self {
            tuning: Tuning {
                initial_fill: Tag::Wide,
                up_edge: Tag::Narrow,
                ..Tuning::default()
            },
        }
    }
}

impl WideCaveShuffle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_up_edge(mut self, tag: Tag) -> Self {
        self.tuning.up_edge = tag;
        self
    }
}

/// Place `arenas` arenas under top-row up exits, clearing both side
/// neighbors.
fn add_top_arenas(a: &mut Attempt, arenas: usize) -> Step {
    let mut arenas = arenas;
    if arenas == 0 {
        return Ok(());
    }
    let candidates: Vec<GridCoord> = (0..a.w)
        .map(|x| GridCoord::center_of(0, x))
        .filter(|c| !a.get(c.n()).is_empty())
        .collect();
    if candidates.len() < arenas {
        return Err(Failure::new(
            FailureKind::Arenas,
            format!("{} up exits for {arenas} arenas", candidates.len()),
        ));
    }
    for middle in a.rng.ishuffle(&candidates) {
        if arenas == 0 {
            break;
        }
        if !side_is_free(a, middle, -8) || !side_is_free(a, middle, 8) || a.is_fixed(middle) {
            continue;
        }
        a.set(middle, Tag::Arena);
        a.fix(middle);
        for side in [-8, 8] {
            a.clear(middle.offset(side));
            a.clear(middle.offset(side * 2));
        }
        arenas -= 1;
    }
    a.recount();
    if arenas > 0 {
        return Err(Failure::new(FailureKind::Arenas, format!("{arenas} arenas left over")));
    }
    Ok(())
}

/// The neighbor on `side` has no exit of its own that clearing it would
/// strand.
fn side_is_free(a: &Attempt, middle: GridCoord, side: i32) -> bool {
    let near = middle.offset(side);
    if a.grid.is_border(near) {
        return true;
    }
    let beside = near.offset(side);
    let exits = [beside.offset(side), beside.offset(-0x800), beside.offset(0x800)];
    if exits.iter().any(|&c| a.grid.is_border(c) && !a.get(c).is_empty()) {
        return false;
    }
    a.is_clearable(near) && a.is_clearable(beside)
}

impl CaveStrategy for WideCaveShuffle {
    fn name(&self) -> &'static str {
        "WideCaveShuffle"
    }

    fn tuning(&self) -> Tuning {
        self.tuning.clone()
    }

    fn add_edges(&self, a: &mut Attempt) -> Step {
        pipeline::add_edges(self, a)?;
        let arenas = a.targets.arena;
        add_top_arenas(a, arenas)
    }

    fn add_arenas(&self, _a: &mut Attempt, _arenas: usize) -> bool {
        true
    }

    fn is_eligible_arena(&self, a: &Attempt, middle: GridCoord) -> bool {
        middle.y() == 0 && pipeline::is_eligible_arena(a, middle)
    }
}

/// A cave whose arenas become statue-lined crypt entrances.
#[derive(Debug, Clone, Default)]
pub struct CryptEntranceShuffle {
    tuning: Tuning,
}

impl CryptEntranceShuffle {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Put the named screen on every arena of the grid.
pub fn place_named_arenas(a: &Attempt, layout: &mut Layout, name: &str) {
    let Some(id) = a.tileset.find(name) else {
        return;
    };
    for s in a.grid.screens() {
        if a.get(s.center()) == Tag::Arena {
            layout.set(s.pos(), id);
        }
    }
}

impl CaveStrategy for CryptEntranceShuffle {
    fn name(&self) -> &'static str {
        "CryptEntranceShuffle"
    }

    fn tuning(&self) -> Tuning {
        self.tuning.clone()
    }

    fn is_eligible_arena(&self, a: &Attempt, middle: GridCoord) -> bool {
        a.get(middle.n()).is_empty() && pipeline::is_eligible_arena(a, middle)
    }

    fn refine_layout(&self, a: &mut Attempt, layout: &mut Layout) -> Step {
        place_named_arenas(a, layout, CRYPT_ARENA);
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
    fn test_wide_arenas_sit_under_up_exits() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let mut sv = Survey {
            level: "wide".into(),
            height: 3,
            width: 4,
            size: 6,
            edges: [1, 0, 1, 0],
            ..Survey::default()
        };
        sv.features.arena = 1;
        let s = WideCaveShuffle::new();
        for seed in 0..10 {
            let mut a = Attempt::with_shape(&sv, &ts, &config, s.tuning(), ShuffleRng::new(seed), 3, 4, 6);
            s.initial_fill(&mut a).unwrap();
            assert_eq!(a.get(GridCoord::center_of(1, 1)), Tag::Wide);
            if s.add_edges(&mut a).is_err() {
                continue;
            }
            let arena = (0..4).map(|x| GridCoord::center_of(0, x)).find(|&c| a.get(c) == Tag::Arena).unwrap();
            assert_eq!(a.get(arena.n()), Tag::Narrow);
            assert!(a.get(arena.w()).is_empty() && a.get(arena.e()).is_empty());
            assert!(a.is_fixed(arena));
        }
    }

    #[test]
    fn test_crypt_arena_needs_empty_above() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let sv = Survey {
            level: "crypt".into(),
            height: 2,
            width: 1,
            size: 2,
            ..Survey::default()
        };
        let s = CryptEntranceShuffle::new();
        let mut a = Attempt::with_shape(&sv, &ts, &config, s.tuning(), ShuffleRng::new(1), 2, 1, 2);
        a.grid.write_grid_2d(GridCoord(0), &["   ", " c ", " c ", " c ", "   "]);
        assert!(s.is_eligible_arena(&a, GridCoord::center_of(0, 0)));
        assert!(!s.is_eligible_arena(&a, GridCoord::center_of(1, 0)));
    }

    #[test]
    fn test_crypt_screens_replace_arenas() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let sv = Survey {
            level: "crypt".into(),
            height: 2,
            width: 1,
            size: 2,
            ..Survey::default()
        };
        let mut a = Attempt::with_shape(&sv, &ts, &config, Tuning::default(), ShuffleRng::new(1), 2, 1, 2);
        a.grid.write_grid_2d(GridCoord(0), &["   ", " a ", " c ", " c ", "   "]);
        let mut layout = Layout::new(2, 1, ts.empty());
        place_named_arenas(&a, &mut layout, CRYPT_ARENA);
        assert_eq!(ts.screen(layout.get(crate::maze::Pos::new(0, 0))).name, CRYPT_ARENA);
        assert_eq!(layout.get(crate::maze::Pos::new(1, 0)), ts.empty());
    }
}
