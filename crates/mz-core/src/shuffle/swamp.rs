//! Swamps
//!
//! A swamp covers the whole map. Instead of refining a flood down to size
//! it opens every edge, knocks out a random share of them and then folds
//! the survivors onto a small set of screen shapes.

#[cfg(not(feature = "std"))]
use crate::compat::*;

use log::{debug, trace};

use super::attempt::Attempt;
use super::strategy::CaveStrategy;
use crate::config::Tuning;
use crate::error::{Failure, FailureKind, Step};
use crate::maze::{Dir, GridCoord, Monogrid, Tag};

fn fail<T>(kind: FailureKind, detail: impl Into<String>) -> Step<T> {
    Err(Failure::new(kind, detail))
}

#[derive(Debug, Clone)]
pub struct SwampShuffle {
    tuning: Tuning,
    /// Distinct screen shapes the swamp may use outside its fixed cells.
    screen_budget: usize,
}

impl Default for SwampShuffle {
    fn default() -> Self {
        Self {
            tuning: Tuning::default(),
            screen_budget: 10,
        }
    }
}

impl SwampShuffle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_screen_budget(mut self, budget: usize) -> Self {
        self.screen_budget = budget;
        self
    }
}

/// Empty the screens beside and above a randomly placed arena so that it
/// only opens downward. Returns the arena's cell.
fn carve_arena(a: &mut Attempt, g: &mut Monogrid) -> Step<usize> {
    let (h, w) = (g.h, g.w);
    if h < 2 {
        return fail(FailureKind::EarlyFill, "no room below the arena");
    }
    let y = if h * w < 28 { 0 } else { a.rng.next_int(h - 1) };
    let x = a.rng.next_int(w);
    let mut doomed = Vec::new();
    if y > 0 {
        // corners first, so the cells between never lose their last edge
        if x > 0 {
            doomed.push((y - 1, x - 1));
        }
        if x + 1 < w {
            doomed.push((y - 1, x + 1));
        }
        doomed.push((y - 1, x));
    }
    if x > 0 {
        doomed.push((y, x - 1));
    }
    if x + 1 < w {
        doomed.push((y, x + 1));
    }
    for (dy, dx) in doomed {
        if !g.delete2(dy, dx) {
            return fail(FailureKind::EarlyFill, format!("could not clear ({dy}, {dx}) beside the arena"));
        }
        g.fixed.insert(dy * w + dx);
    }
    let i = y * w + x;
    g.fixed.insert(i);
    Ok(i)
}

/// Open the surveyed exits on random border cells. Returns each exit as
/// its cell and direction.
fn open_exits(a: &mut Attempt, g: &mut Monogrid) -> Step<Vec<(usize, Dir)>> {
    let (h, w) = (g.h, g.w);
    let mut exits = Vec::new();
    for dir in Dir::ALL {
        let mut count = a.survey.edges[dir.index()];
        let side = if dir.is_horizontal() { h } else { w };
        let slots: Vec<usize> = (0..side).collect();
        for n in a.rng.ishuffle(&slots) {
            if count == 0 {
                break;
            }
            let (y, x) = match dir {
                Dir::Up => (0, n),
                Dir::Down => (h - 1, n),
                Dir::Left => (n, 0),
                Dir::Right => (n, w - 1),
            };
            let i = y * w + x;
            if g.data[i] == 0 || g.fixed.contains(&i) {
                continue;
            }
            g.add_edge(y, x, dir);
            exits.push((i, dir));
            count -= 1;
        }
        if count > 0 {
            trace!("swamp short of exits:\n{}", g.show());
            return fail(FailureKind::Edges, format!("{count} {dir} exits left over"));
        }
    }
    Ok(exits)
}

/// Delete between 40% and 55% as many interior edges as there are cells.
fn thin_out(a: &mut Attempt, g: &mut Monogrid) -> usize {
    let target = (g.h * g.w) as f64 * (0.4 + 0.15 * a.rng.next_f64());
    let slots: Vec<usize> = (0..g.data.len() * 4).collect();
    let mut deleted = 0;
    for slot in a.rng.ishuffle(&slots) {
        let (i, dir) = (slot / 4, Dir::ALL[slot % 4]);
        if g.is_border(i, dir) || g.data[i] & dir.bit() == 0 {
            continue;
        }
        if g.delete_edge(i, dir) {
            deleted += 1;
            if deleted as f64 >= target {
                break;
            }
        }
    }
    deleted
}

fn cell_center(g: &Monogrid, i: usize) -> GridCoord {
    GridCoord::center_of(i / g.w, i % g.w)
}

impl CaveStrategy for SwampShuffle {
    fn name(&self) -> &'static str {
        "SwampShuffle"
    }

    fn tuning(&self) -> Tuning {
        self.tuning.clone()
    }

    fn fill_grid(&self, a: &mut Attempt) -> Step {
        let mut g = Monogrid::new(a.h, a.w, None);
        g.fill();
        let arena = if a.targets.arena > 0 { Some(carve_arena(a, &mut g)?) } else { None };
        let exits = open_exits(a, &mut g)?;
        let deleted = thin_out(a, &mut g);
        debug!("swamp {}x{}: deleted {deleted} edges", a.h, a.w);

        for &(i, _) in &exits {
            g.fixed.insert(i);
        }
        if g.consolidate(&mut a.rng, self.screen_budget).is_empty() {
            return fail(FailureKind::EarlyFill, format!("could not fold onto {} screens", self.screen_budget));
        }

        a.grid.restore_data(g.to_grid(Tag::Cave).data().to_vec());
        if let Some(i) = arena {
            let c = cell_center(&g, i);
            a.set(c, Tag::Arena);
            a.fix(c);
            a.targets.arena -= 1;
        }
        for (i, dir) in exits {
            let c = cell_center(&g, i);
            a.fix(c);
            a.fix(c.step(dir));
        }
        a.recount();
        let [up, down] = a.stairs;
        self.add_stairs(a, up, down)
    }
}
