//! Shuffle strategies
//!
//! A [`CaveStrategy`] is the set of overridable steps a shuffle is built
//! from. Every hook defaults to the plain cave behavior in
//! [`pipeline`](super::pipeline); variants override only what differs and
//! call back into the defaults for the rest.

#[cfg(not(feature = "std"))]
use crate::compat::*;

use super::attempt::Attempt;
use super::pipeline;
use crate::catalog::ScreenId;
use crate::config::Tuning;
use crate::error::Step;
use crate::layout::Layout;
use crate::maze::{GridCoord, Overrides, Pos, Tag};

/// Default attempt budget for a level.
pub const MAX_ATTEMPTS: usize = 250;

pub trait CaveStrategy {
    fn name(&self) -> &'static str;

    fn tuning(&self) -> Tuning;

    fn max_attempts(&self) -> usize {
        MAX_ATTEMPTS
    }

    /// Set up per-attempt state before building.
    fn init(&self, _a: &mut Attempt) {}

    fn build(&self, a: &mut Attempt) -> Step<Layout> {
        pipeline::build(self, a)
    }

    fn fill_grid(&self, a: &mut Attempt) -> Step {
        pipeline::fill_grid(self, a)
    }

    fn initial_fill(&self, a: &mut Attempt) -> Step {
        pipeline::initial_fill(a)
    }

    fn add_edges(&self, a: &mut Attempt) -> Step {
        pipeline::add_edges(self, a)
    }

    fn add_up_edge(&self, a: &mut Attempt, edge: GridCoord) -> bool {
        pipeline::add_up_edge(a, edge)
    }

    fn add_down_edge(&self, a: &mut Attempt, edge: GridCoord) -> bool {
        pipeline::add_down_edge(a, edge)
    }

    fn add_left_edge(&self, a: &mut Attempt, edge: GridCoord) -> bool {
        pipeline::add_left_edge(a, edge)
    }

    fn add_right_edge(&self, a: &mut Attempt, edge: GridCoord) -> bool {
        pipeline::add_right_edge(a, edge)
    }

    fn add_early_features(&self, a: &mut Attempt) -> Step {
        pipeline::add_early_features(self, a)
    }

    fn add_spikes(&self, a: &mut Attempt, spikes: usize) -> bool {
        pipeline::add_spikes(a, spikes)
    }

    fn add_overpasses(&self, a: &mut Attempt, over: usize) -> Step {
        pipeline::add_overpasses(a, over)
    }

    fn refine(&self, a: &mut Attempt) -> Step {
        pipeline::refine(self, a)
    }

    /// Whether refinement may delete a point carrying `tag`.
    fn can_remove(&self, a: &Attempt, tag: Tag) -> bool {
        tag == a.tuning.initial_fill
    }

    /// Points cleared when refinement removes `c`.
    fn removal_map(&self, _a: &Attempt, c: GridCoord) -> Overrides {
        pipeline::removal_map(c)
    }

    fn refine_edges(&self, a: &mut Attempt) -> Step {
        pipeline::refine_edges(a)
    }

    fn remove_spurs(&self, a: &mut Attempt) {
        pipeline::remove_spurs(a)
    }

    fn remove_tight_loops(&self, a: &mut Attempt) {
        pipeline::remove_tight_loops(a)
    }

    fn add_late_features(&self, a: &mut Attempt) -> Step {
        pipeline::add_late_features(self, a)
    }

    fn add_arenas(&self, a: &mut Attempt, arenas: usize) -> bool {
        pipeline::add_arenas(self, a, arenas)
    }

    fn is_eligible_arena(&self, a: &Attempt, middle: GridCoord) -> bool {
        pipeline::is_eligible_arena(a, middle)
    }

    fn add_underpasses(&self, a: &mut Attempt, under: usize) -> bool {
        pipeline::add_underpasses(a, under)
    }

    fn add_pits(&self, a: &mut Attempt, pits: usize) -> bool {
        pipeline::add_pits(a, pits)
    }

    fn add_ramps(&self, a: &mut Attempt, ramps: usize) -> bool {
        pipeline::add_ramps(a, ramps)
    }

    fn add_stairs(&self, a: &mut Attempt, up: usize, down: usize) -> Step {
        pipeline::add_stairs(a, up, down)
    }

    /// Last look at the grid before screens are chosen.
    fn preinfer(&self, _a: &mut Attempt) -> Step {
        Ok(())
    }

    fn infer_screens(&self, a: &mut Attempt) -> Step<Layout> {
        pipeline::infer_screens(a)
    }

    fn refine_layout(&self, a: &mut Attempt, layout: &mut Layout) -> Step {
        pipeline::refine_layout(self, a, layout)
    }

    /// Whether the layout, with `replace` substituted, is still acceptable.
    fn check_layout(&self, a: &Attempt, layout: &Layout, replace: Option<(Pos, ScreenId)>) -> bool {
        pipeline::check_layout(a, layout, replace)
    }

    fn check_screens(&self, a: &Attempt, layout: &Layout) -> Step {
        pipeline::check_screens(a, layout)
    }

    /// Stairs of this level paired with stairs of another, as
    /// `(here, there)`.
    fn stair_links(&self, _a: &Attempt) -> Vec<(Pos, Pos)> {
        Vec::new()
    }
}

/// The plain cave shuffle.
#[derive(Debug, Clone, Default)]
pub struct CaveShuffle {
    tuning: Tuning,
}

impl CaveShuffle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tuning(tuning: Tuning) -> Self {
        Self { tuning }
    }

    /// Also require a screen that a pit could drop the player into.
    pub fn require_pit_destination(mut self) -> Self {
        self.tuning.require_pit_destination = true;
        self
    }

    pub fn loose_refine(mut self) -> Self {
        self.tuning.loose_refine = true;
        self
    }
}

impl CaveStrategy for CaveShuffle {
    fn name(&self) -> &'static str {
        "CaveShuffle"
    }

    fn tuning(&self) -> Tuning {
        self.tuning.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_set_tuning() {
        let t = CaveShuffle::new().require_pit_destination().loose_refine().tuning();
        assert!(t.require_pit_destination);
        assert!(t.loose_refine);
        assert_eq!(t.initial_fill, Tag::Cave);
        assert_eq!(CaveShuffle::new().max_attempts(), MAX_ATTEMPTS);
    }

    #[test]
    fn test_strategies_are_object_safe() {
        let boxed: Vec<Box<dyn CaveStrategy>> = vec![
            Box::new(CaveShuffle::new()),
            Box::new(CaveShuffle::with_tuning(Tuning {
                max_partitions: 2,
                ..Tuning::default()
            })),
        ];
        assert_eq!(boxed[1].tuning().max_partitions, 2);
        assert!(boxed.iter().all(|s| s.name() == "CaveShuffle"));
    }
}
