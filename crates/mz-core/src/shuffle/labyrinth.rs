//! Wide-hall labyrinths
//!
//! No refinement here: the labyrinth starts empty, pins a stair to the
//! bottom row and an arena to the top, joins them with one wide path and
//! then closes loops off that path until the level is big enough.

#[cfg(not(feature = "std"))]
use crate::compat::*;

use super::attempt::Attempt;
use super::grow;
use super::pipeline;
use super::strategy::CaveStrategy;
use crate::catalog::ScreenId;
use crate::config::Tuning;
use crate::error::{Failure, FailureKind, Step};
use crate::layout::{Layout, Traverse};
use crate::maze::{Dir, GridCoord, Pos, Tag};

/// Tries given to each path or loop growth.
const GROW_ATTEMPTS: usize = 10;

#[derive(Debug, Clone)]
pub struct LabyrinthShuffle {
    tuning: Tuning,
}

impl Default for LabyrinthShuffle {
    fn default() -> Self {
        Self {
            tuning: Tuning {
                initial_fill: Tag::Wide,
                up_edge: Tag::Wide,
                ..Tuning::default()
            },
        }
    }
}

impl LabyrinthShuffle {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Set and fix `c`.
fn pin(a: &mut Attempt, c: GridCoord, tag: Tag) {
    a.set(c, tag);
    a.fix(c);
}

/// Keep the sides of `c` empty. With `far`, the neighboring screens are
/// kept empty as well.
fn wall_off(a: &mut Attempt, c: GridCoord, far: bool) {
    for dir in [Dir::Left, Dir::Right] {
        let edge = c.step(dir);
        a.fix(edge);
        if far && !a.grid.is_border(edge) {
            a.fix(c.step_by(dir, 2));
        }
    }
}

/// The first center carrying `tag`.
fn find_center(a: &Attempt, tag: Tag) -> Option<GridCoord> {
    a.grid
        .screens()
        .into_iter()
        .map(|s| s.center())
        .find(|&c| a.get(c) == tag)
}

impl CaveStrategy for LabyrinthShuffle {
    fn name(&self) -> &'static str {
        "LabyrinthShuffle"
    }

    fn tuning(&self) -> Tuning {
        self.tuning.clone()
    }

    fn initial_fill(&self, a: &mut Attempt) -> Step {
        let (h, w) = (a.h, a.w);
        if h < 4 {
            return Err(Failure::new(
                FailureKind::EarlyFill,
                format!("{h} rows cannot fit stair, arena and a hall between"),
            ));
        }

        // A dead-end stair on the bottom row, its neighbors kept empty.
        let stair = GridCoord::center_of(h - 1, a.rng.next_int(w));
        pin(a, stair, Tag::StairDown);
        pin(a, stair.n(), Tag::Wide);
        wall_off(a, stair, true);

        // The arena opens into a straight hall one screen long.
        let arena = GridCoord::center_of(0, a.rng.next_int(w));
        let down = arena.step_by(Dir::Down, 2);
        pin(a, arena, Tag::Arena);
        pin(a, arena.s(), Tag::Wide);
        pin(a, down, Tag::Wide);
        pin(a, down.s(), Tag::Wide);
        wall_off(a, down, false);
        a.count = 3;

        let start = stair.step_by(Dir::Up, 2);
        let end = down.step_by(Dir::Down, 2);
        if !grow::try_connect(a, start, end, Tag::Wide, GROW_ATTEMPTS) {
            return Err(Failure::new(FailureKind::EarlyFill, "could not join stair to arena"));
        }
        while a.count < a.size {
            if !grow::try_add_loop(a, Tag::Wide, GROW_ATTEMPTS) {
                return Err(Failure::new(
                    FailureKind::EarlyFill,
                    format!("stuck at {} of {} screens", a.count, a.size),
                ));
            }
        }
        a.wides = a.count;
        Ok(())
    }

    fn refine(&self, _a: &mut Attempt) -> Step {
        Ok(())
    }

    fn refine_edges(&self, _a: &mut Attempt) -> Step {
        Ok(())
    }

    fn add_arenas(&self, _a: &mut Attempt, _arenas: usize) -> bool {
        true
    }

    fn add_stairs(&self, _a: &mut Attempt, _up: usize, _down: usize) -> Step {
        Ok(())
    }

    /// The stair must still reach the arena.
    fn check_layout(&self, a: &Attempt, layout: &Layout, replace: Option<(Pos, ScreenId)>) -> bool {
        if !pipeline::check_layout(a, layout, replace) {
            return false;
        }
        let (Some(stair), Some(arena)) = (find_center(a, Tag::StairDown), find_center(a, Tag::Arena)) else {
            return false;
        };
        let parts = layout.traverse(a.tileset, Traverse::default(), replace);
        match (parts.component_of(&stair.n()), parts.component_of(&arena.s())) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
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

    fn survey(h: usize, w: usize, size: usize) -> Survey {
        let mut sv = Survey {
            level: "labyrinth".into(),
            height: h,
            width: w,
            size,
            stairs: [0, 1],
            ..Survey::default()
        };
        sv.features.arena = 1;
        sv
    }

    #[test]
    fn test_fill_joins_stair_to_arena() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let sv = survey(4, 4, 8);
        let s = LabyrinthShuffle::new();
        let mut filled = 0;
        for seed in 0..20 {
            let mut a = Attempt::with_shape(&sv, &ts, &config, s.tuning(), ShuffleRng::new(seed), 4, 4, 8);
            if s.initial_fill(&mut a).is_err() {
                continue;
            }
            filled += 1;
            let stair = find_center(&a, Tag::StairDown).unwrap();
            let arena = find_center(&a, Tag::Arena).unwrap();
            assert_eq!(stair.y(), 3);
            assert_eq!(arena.y(), 0);
            assert!(a.is_fixed(stair) && a.is_fixed(arena));
            assert!(a.get(stair.w()).is_empty() && a.get(stair.e()).is_empty());
            assert!(a.count >= 8);
            assert_eq!(a.count, a.grid.center_count());
            assert_eq!(a.grid.partition(None).component_count(), 1);
        }
        assert!(filled > 0);
    }

    #[test]
    fn test_short_map_is_rejected() {
        let cat = cave_catalog();
        let ts = Tileset::new(&cat);
        let config = ShuffleConfig::default();
        let sv = survey(3, 3, 5);
        let s = LabyrinthShuffle::new();
        let mut a = Attempt::with_shape(&sv, &ts, &config, s.tuning(), ShuffleRng::new(1), 3, 3, 5);
        let err = s.initial_fill(&mut a).unwrap_err();
        assert_eq!(err.kind, FailureKind::EarlyFill);
        assert_eq!(a.count, 0);
    }
}
