//! The cave shuffle pipeline
//!
//! Default implementations behind every [`CaveStrategy`] hook. Each takes
//! the strategy so that steps can dispatch back into overridden hooks, the
//! same way the trait's default methods do.
//!
//! Filling runs: initial fill, border exits, early features, refinement,
//! edge refinement, spur and tight-loop removal, late features, stairs.
//! Building then runs: preinfer, screen inference, layout refinement and
//! the final screen checks.

use log::{trace, warn};

#[cfg(not(feature = "std"))]
use crate::compat::*;
#[cfg(not(feature = "std"))]
use alloc::collections::BTreeSet;
#[cfg(feature = "std")]
use std::collections::BTreeSet;

use super::attempt::{single, Attempt};
use super::strategy::CaveStrategy;
use crate::catalog::{Features, ScreenId, ScreenMod};
use crate::error::{Failure, FailureKind, Step};
use crate::layout::{Layout, Traverse};
use crate::maze::{Dir, GridCoord, Overrides, Pos, Tag};

fn fail<T>(kind: FailureKind, detail: impl Into<String>) -> Step<T> {
    Err(Failure::new(kind, detail))
}

pub fn build<S: CaveStrategy + ?Sized>(s: &S, a: &mut Attempt) -> Step<Layout> {
    s.fill_grid(a)?;
    check_connected(a)?;
    s.preinfer(a)?;
    let mut layout = s.infer_screens(a)?;
    if !s.check_layout(a, &layout, None) {
        return fail(FailureKind::Disconnected, "inferred layout is split");
    }
    s.refine_layout(a, &mut layout)?;
    s.check_screens(a, &layout)?;
    Ok(layout)
}

pub fn fill_grid<S: CaveStrategy + ?Sized>(s: &S, a: &mut Attempt) -> Step {
    s.initial_fill(a)?;
    s.add_edges(a)?;
    s.add_early_features(a)?;
    s.refine(a)?;
    s.refine_edges(a)?;
    s.remove_spurs(a);
    s.remove_tight_loops(a);
    s.add_late_features(a)?;
    let [up, down] = a.stairs;
    s.add_stairs(a, up, down)
}

/// The filled grid may not fall apart into more pieces than the strategy
/// allows.
pub fn check_connected(a: &Attempt) -> Step {
    let parts = a.grid.partition(None).component_count();
    if parts > a.tuning.max_partitions {
        trace!("split grid:\n{}", a.show());
        return fail(FailureKind::Disconnected, format!("grid has {parts} components"));
    }
    Ok(())
}

/// Fill every screen with `tag`, joined to its up and left neighbors.
pub fn fill_cave(a: &mut Attempt, tag: Tag) {
    for y in 0..a.h {
        for x in 0..a.w {
            let c = GridCoord::center_of(y, x);
            if y > 0 {
                a.set(c.n(), tag);
            }
            if x > 0 {
                a.set(c.w(), tag);
            }
            a.set(c, tag);
        }
    }
    a.count = a.h * a.w;
}

pub fn initial_fill(a: &mut Attempt) -> Step {
    let tag = a.tuning.initial_fill;
    fill_cave(a, tag);
    Ok(())
}

// ---------------------------------------------------------------------------
// Border exits
// ---------------------------------------------------------------------------

pub fn add_edges<S: CaveStrategy + ?Sized>(s: &S, a: &mut Attempt) -> Step {
    for dir in Dir::ALL {
        let mut count = a.survey.edges[dir.index()];
        if count == 0 {
            continue;
        }
        let slots = if dir.is_horizontal() { a.h } else { a.w };
        let edges: Vec<GridCoord> = (0..slots).map(|i| a.grid.border(dir, i)).collect();
        for edge in a.rng.ishuffle(&edges) {
            if !a.get(edge).is_empty() {
                continue;
            }
            let added = match dir {
                Dir::Up => s.add_up_edge(a, edge),
                Dir::Down => s.add_down_edge(a, edge),
                Dir::Left => s.add_left_edge(a, edge),
                Dir::Right => s.add_right_edge(a, edge),
            };
            if added {
                count -= 1;
                if count == 0 {
                    break;
                }
            }
        }
        if count > 0 {
            return fail(FailureKind::Edges, format!("{count} {dir} exits left over"));
        }
    }
    Ok(())
}

/// A set exit on the border at `c`.
fn set_border(a: &Attempt, c: GridCoord) -> bool {
    a.grid.is_border(c) && !a.get(c).is_empty()
}

/// Check the side of an up exit: the edge beside the screen below, and
/// beyond it either the neighboring top exit or the next border slot.
fn up_edge_side_clear(a: &Attempt, edge: GridCoord, side: i32) -> bool {
    let below = edge.offset(0x800);
    let near = below.offset(side * 8);
    if a.grid.is_border(near) {
        return a.get(near).is_empty() && a.is_clearable(near);
    }
    if !a.get(edge.offset(side * 16)).is_empty() {
        return false;
    }
    !set_border(a, below.offset(side * 24)) && a.is_clearable(near)
}

pub fn add_up_edge(a: &mut Attempt, edge: GridCoord) -> bool {
    if !up_edge_side_clear(a, edge, -1) || !up_edge_side_clear(a, edge, 1) {
        return false;
    }
    let below = edge.offset(0x800);
    let tag = a.tuning.up_edge;
    a.set(edge, tag);
    a.fix(edge);
    a.clear(below.offset(-8));
    a.clear(below.offset(8));
    true
}

pub fn add_down_edge(a: &mut Attempt, edge: GridCoord) -> bool {
    let above = edge.offset(-0x800);
    if a.get(above).is_empty() {
        return false;
    }
    let (left, right) = (above.offset(-8), above.offset(8));
    if set_border(a, left) || set_border(a, right) {
        return false;
    }
    if !a.is_clearable(left) || !a.is_clearable(right) {
        return false;
    }
    a.set(edge, Tag::Narrow);
    a.fix(edge);
    a.clear(left);
    a.clear(right);
    true
}

fn add_side_edge(a: &mut Attempt, edge: GridCoord, inward: i32) -> bool {
    let inner = edge.offset(inward);
    if a.get(inner).is_empty() {
        return false;
    }
    if set_border(a, inner.offset(-0x800)) || set_border(a, inner.offset(0x800)) {
        return false;
    }
    a.set(edge, Tag::Cave);
    a.fix(edge);
    true
}

pub fn add_left_edge(a: &mut Attempt, edge: GridCoord) -> bool {
    add_side_edge(a, edge, 8)
}

pub fn add_right_edge(a: &mut Attempt, edge: GridCoord) -> bool {
    add_side_edge(a, edge, -8)
}

// ---------------------------------------------------------------------------
// Early features
// ---------------------------------------------------------------------------

pub fn add_early_features<S: CaveStrategy + ?Sized>(s: &S, a: &mut Attempt) -> Step {
    let spikes = a.targets.spike;
    if !s.add_spikes(a, spikes) {
        return fail(FailureKind::Spikes, format!("could not place {spikes} spikes"));
    }
    let over = a.targets.over;
    s.add_overpasses(a, over)
}

/// Place vertical runs of spikes totalling `spikes` screens, each with a
/// plain cave screen fixed above and below it.
pub fn add_spikes(a: &mut Attempt, spikes: usize) -> bool {
    let mut spikes = spikes as i64;
    let h = a.h as i64;
    let w = a.w;
    let min_spikes = a.tuning.min_spikes as i64;
    let max_spikes = a.tuning.max_spikes as i64;
    let mut attempts = 0;
    while spikes > 0 {
        attempts += 1;
        if attempts > a.config.spike_attempts {
            return false;
        }
        let mut len = spikes.min(a.h as i64 * 3 / 5).min(max_spikes);
        while len < spikes - 1 && len > min_spikes {
            if a.rng.next_f64() < 0.2 {
                len -= 1;
            }
        }
        let x = if len > 2 && w > 3 {
            a.rng.next_int(w - 2) + 1
        } else {
            a.rng.next_int(w)
        };
        if len > spikes - min_spikes {
            len = if len >= h - 2 { h - 2 } else { spikes };
        }
        if len <= 0 {
            continue;
        }
        let y0 = a.rng.next_int((h - len - 2).max(0) as usize) + 1;
        let t0 = GridCoord::center_of(y0, x);
        let t1 = t0.offset(((len - 1) as i32) << 12);

        let run_is_cave = (0..=((len + 1) * 2) as i32)
            .map(|k| t0.offset(-0x1000 + k * 0x800))
            .all(|t| a.get(t) == Tag::Cave);
        if !run_is_cave {
            continue;
        }
        let flanks = [t0.offset(-8), t0.offset(8), t1.offset(-8), t1.offset(8)];
        let cleared = a.try_clear(&flanks);
        if cleared.is_empty() {
            continue;
        }
        for c in cleared {
            a.clear(c);
        }
        for k in 0..=((len - 1) * 2) as i32 {
            let t = t0.offset(k * 0x800);
            a.set(t, Tag::Spikes);
            a.fix(t);
        }
        for c in [t0.offset(-0x800), t0.offset(-0x1000), t1.offset(0x800), t1.offset(0x1000)] {
            a.fix(c);
        }
        spikes -= len;
        attempts = 0;
    }
    a.recount();
    true
}

/// Turn `over` interior cave screens into vertical bridges.
pub fn add_overpasses(a: &mut Attempt, over: usize) -> Step {
    let mut over = over;
    let mut misses = 0;
    while over > 0 {
        let y = a.rng.next_int(a.h.saturating_sub(2)) + 1;
        let x = a.rng.next_int(a.w.saturating_sub(2)) + 1;
        let c = GridCoord::center_of(y, x);
        let ok = a.get(c) == Tag::Cave
            && !a.is_fixed(c)
            && a.is_clearable(c.w())
            && a.is_clearable(c.e());
        if !ok {
            misses += 1;
            if misses > 10 {
                return fail(FailureKind::Overpasses, format!("{over} overpasses left over"));
            }
            continue;
        }
        a.set(c, Tag::Bridge);
        a.fix(c);
        a.clear(c.w());
        a.clear(c.e());
        over -= 1;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Refinement
// ---------------------------------------------------------------------------

/// Remove filler until `count` reaches `size`, never stranding a fixed
/// point. Rolls back entirely if it cannot get there.
pub fn refine<S: CaveStrategy + ?Sized>(s: &S, a: &mut Attempt) -> Step {
    a.excursion(false, |a| refine_inner(s, a))
}

fn refine_inner<S: CaveStrategy + ?Sized>(s: &S, a: &mut Attempt) -> Step {
    let mut filled = a.grid.filled();
    let mut passes = 0;
    while a.count > a.size {
        passes += 1;
        if passes > a.config.refine_passes {
            return fail(FailureKind::Refine, format!("gave up at {} > {}", a.count, a.size));
        }
        let mut removed = 0;
        for coord in a.rng.ishuffle(&filled) {
            if a.count <= a.size || removed >= a.config.removals_per_pass {
                break;
            }
            if a.grid.is_border(coord) || a.is_fixed(coord) || !s.can_remove(a, a.get(coord)) {
                continue;
            }
            let removal = s.removal_map(a, coord);
            let parts = a.grid.partition(Some(&removal));
            if parts.component_count() == 1 && parts.point_count() > 1 {
                removed += 1;
                apply(a, &removal);
                filled.retain(|&c| c != coord);
                if coord.is_center() {
                    a.count -= 1;
                }
                continue;
            }
            let Some(keep) = parts.largest() else {
                continue;
            };
            let strands_fixed = a
                .fixed
                .iter()
                .any(|c| !a.get(*c).is_empty() && !removal.contains_key(c) && parts.component_of(c) != Some(keep));
            if strands_fixed {
                continue;
            }
            let centers = parts.component(keep).iter().filter(|c| c.is_center()).count();
            if centers < a.size {
                continue;
            }
            removed += 1;
            filled = parts.component(keep).to_vec();
            a.count = centers;
            apply(a, &removal);
            for (i, part) in parts.components().iter().enumerate() {
                if i != keep {
                    for &c in part {
                        a.clear(c);
                    }
                }
            }
        }
        if removed == 0 {
            if a.tuning.loose_refine {
                return Ok(());
            }
            return fail(FailureKind::Refine, format!("stuck at {} > {}", a.count, a.size));
        }
    }
    Ok(())
}

fn apply(a: &mut Attempt, replace: &Overrides) {
    let mut entries: Vec<(GridCoord, Tag)> = replace.iter().map(|(&c, &v)| (c, v)).collect();
    entries.sort();
    for (c, v) in entries {
        a.set(c, v);
    }
}

pub fn removal_map(c: GridCoord) -> Overrides {
    single(c, Tag::Empty)
}

/// Drop interior edges whose removal neither disconnects the grid nor
/// changes its number of components.
pub fn refine_edges(a: &mut Attempt) -> Step {
    let mut edges: Vec<GridCoord> = a
        .grid
        .filled()
        .into_iter()
        .filter(|&c| c.is_edge() && !a.grid.is_border(c) && !a.is_fixed(c))
        .collect();
    a.rng.shuffle(&mut edges);
    let orig = a.grid.partition(None);
    let mut size = orig.point_count();
    let part_count = orig.component_count();
    for edge in edges {
        let parts = a.grid.partition(Some(&single(edge, Tag::Empty)));
        let ok = parts.point_count() + 1 == size
            && (parts.component_count() == 1 || parts.component_count() == part_count);
        if ok {
            size -= 1;
            a.clear(edge);
        }
    }
    Ok(())
}

/// Empty screens with both a vertical and a horizontal edge lose one pair.
pub fn remove_spurs(a: &mut Attempt) {
    for y in 0..a.h {
        for x in 0..a.w {
            let c = GridCoord::center_of(y, x);
            if !a.get(c).is_empty() {
                continue;
            }
            let vertical = !a.get(c.n()).is_empty() || !a.get(c.s()).is_empty();
            let horizontal = !a.get(c.w()).is_empty() || !a.get(c.e()).is_empty();
            if !(vertical && horizontal) {
                continue;
            }
            let pair = if a.rng.next_int(2) == 1 { [c.n(), c.s()] } else { [c.w(), c.e()] };
            for e in pair {
                if !a.is_fixed(e) {
                    a.clear(e);
                }
            }
        }
    }
}

/// Break every fully open 2x2 block of screens by removing one of its
/// inner edges.
pub fn remove_tight_loops(a: &mut Attempt) {
    for y in 0..a.h.saturating_sub(1) {
        for x in 0..a.w.saturating_sub(1) {
            let c = GridCoord::center_of(y, x);
            if !is_tight_loop(a, c) {
                continue;
            }
            let r = a.rng.next_int(0x10000) as i32;
            let delta = if r & 1 != 0 { (r & 0x1000) | 8 } else { (r & 0x10) | 0x800 };
            let e = c.offset(delta);
            if !a.is_fixed(e) {
                a.clear(e);
            }
        }
    }
}

fn is_tight_loop(a: &Attempt, c: GridCoord) -> bool {
    for dy in [0, 0x800, 0x1000] {
        for dx in [0, 8, 0x10] {
            if dy | dx == 0x808 {
                continue;
            }
            if a.get(c.offset(dy | dx)) != Tag::Cave {
                return false;
            }
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Late features
// ---------------------------------------------------------------------------

pub fn add_late_features<S: CaveStrategy + ?Sized>(s: &S, a: &mut Attempt) -> Step {
    let t = a.targets;
    if !s.add_arenas(a, t.arena) {
        return fail(FailureKind::Arenas, format!("could not place {} arenas", t.arena));
    }
    if !s.add_underpasses(a, t.under) {
        return fail(FailureKind::Underpasses, format!("could not place {} underpasses", t.under));
    }
    if !s.add_pits(a, t.pit) {
        return fail(FailureKind::Pits, format!("could not place {} pits", t.pit));
    }
    if !s.add_ramps(a, t.ramp) {
        return fail(FailureKind::Ramps, format!("could not place {} ramps", t.ramp));
    }
    Ok(())
}

pub fn add_arenas<S: CaveStrategy + ?Sized>(s: &S, a: &mut Attempt, arenas: usize) -> bool {
    let mut arenas = arenas;
    if arenas == 0 {
        return true;
    }
    for screen in a.rng.ishuffle(&a.grid.screens()) {
        let middle = screen.center();
        if a.is_fixed(middle) || !s.is_eligible_arena(a, middle) {
            continue;
        }
        let tile = a.extract(screen).with_center(Tag::Arena);
        if !a.has_screens(&tile) {
            warn!("no arena screen for [{tile}]");
            continue;
        }
        a.set(middle, Tag::Arena);
        a.fix(middle);
        arenas -= 1;
        if arenas == 0 {
            return true;
        }
    }
    false
}

/// A cave or wide screen with nothing attached on either side.
pub fn is_eligible_arena(a: &Attempt, middle: GridCoord) -> bool {
    if !matches!(a.get(middle), Tag::Cave | Tag::Wide) {
        return false;
    }
    for side in [-8, 8] {
        let edge = middle.offset(side);
        if !a.get(edge).is_empty() {
            return false;
        }
        if !a.grid.is_border(edge) && !a.get(middle.offset(side * 2)).is_empty() {
            return false;
        }
    }
    true
}

/// Retag `count` cave screens as `tag`. With a `delta`, both neighbors in
/// that direction must be unattached.
pub fn add_straight_screens(a: &mut Attempt, count: usize, tag: Tag, delta: Option<i32>) -> bool {
    let mut count = count;
    if count == 0 {
        return true;
    }
    for screen in a.rng.ishuffle(&a.grid.screens()) {
        let middle = screen.center();
        if a.get(middle) != Tag::Cave || a.is_fixed(middle) {
            continue;
        }
        if let Some(d) = delta {
            if !a.get(middle.offset(d)).is_empty() || !a.get(middle.offset(-d)).is_empty() {
                continue;
            }
        }
        if !a.has_screens(&a.extract(screen).with_center(tag)) {
            continue;
        }
        a.set(middle, tag);
        a.fix(middle);
        count -= 1;
        if count == 0 {
            return true;
        }
    }
    false
}

pub fn add_underpasses(a: &mut Attempt, under: usize) -> bool {
    add_straight_screens(a, under, Tag::Bridge, Some(0x800))
}

pub fn add_pits(a: &mut Attempt, pits: usize) -> bool {
    add_straight_screens(a, pits, Tag::Pit, None)
}

pub fn add_ramps(a: &mut Attempt, ramps: usize) -> bool {
    add_straight_screens(a, ramps, Tag::Ramp, Some(8))
}

// ---------------------------------------------------------------------------
// Stairs
// ---------------------------------------------------------------------------

pub fn add_stairs(a: &mut Attempt, up: usize, down: usize) -> Step {
    let mut stairs = [up, down];
    if stairs == [0, 0] {
        return Ok(());
    }
    for screen in a.rng.ishuffle(&a.grid.screens()) {
        if !try_add_stair(a, screen, &mut stairs) {
            continue;
        }
        if stairs == [0, 0] {
            return Ok(());
        }
    }
    fail(
        FailureKind::Stairs,
        format!("{} up and {} down stairs left over", stairs[0], stairs[1]),
    )
}

const STAIR_TAGS: [Tag; 2] = [Tag::StairUp, Tag::StairDown];

fn try_add_stair(a: &mut Attempt, screen: GridCoord, stairs: &mut [usize; 2]) -> bool {
    let c = screen.center();
    if a.is_fixed(c) {
        return false;
    }
    let tile = a.extract(screen);
    let total = stairs[0] + stairs[1];
    let first = usize::from(a.rng.next_int(total) >= stairs[0]);
    let mut kinds = vec![first];
    if stairs[1 - first] > 0 {
        kinds.push(1 - first);
    }
    for kind in kinds {
        let tag = STAIR_TAGS[kind];
        if !a.has_screens(&tile.with_center(tag)) {
            continue;
        }
        if a.get(c).is_empty() {
            a.count += 1;
        }
        a.set(c, tag);
        a.fix(c);
        stairs[kind] -= 1;
        return true;
    }
    false
}

/// Changes that turn the cave screen at center `c` into a stair with a
/// single cave exit. Empty if there is no cave neighbor to keep.
pub fn add_early_stair(a: &mut Attempt, c: GridCoord, stair: Tag) -> Vec<(GridCoord, Tag)> {
    let (left, right, up, down) = (c.w(), c.e(), c.n(), c.s());
    let mut mods = Vec::new();
    let neighbors = if stair == Tag::StairUp {
        mods.push((up, Tag::Empty));
        if a.get(left) == Tag::Cave && a.get(right) == Tag::Cave && a.rng.next_int(3) != 0 {
            mods.push((down, Tag::Empty));
            mods.push((c, stair));
            return mods;
        }
        [left, right, down]
    } else {
        mods.push((down, Tag::Empty));
        [left, right, up]
    };
    let open: Vec<GridCoord> = neighbors.into_iter().filter(|&n| a.get(n) == Tag::Cave).collect();
    if open.is_empty() {
        return Vec::new();
    }
    let keep = a.rng.next_int(open.len());
    for (i, &n) in open.iter().enumerate() {
        if i != keep {
            mods.push((n, Tag::Empty));
        }
    }
    mods.push((c, stair));
    mods
}

// ---------------------------------------------------------------------------
// Screen inference
// ---------------------------------------------------------------------------

pub fn infer_screens(a: &mut Attempt) -> Step<Layout> {
    let mut layout = Layout::new(a.h, a.w, a.tileset.empty());
    let mut all_empty = true;
    for screen in a.grid.screens() {
        let tile = a.extract(screen);
        let candidates = a.tileset.plain_for_tile(&tile);
        let Some(&id) = a.rng.pick(&candidates) else {
            trace!("no screen for [{tile}] in\n{}", a.show());
            return fail(FailureKind::InferScreen, format!("no screen for [{tile}] at {screen}"));
        };
        let scr = a.tileset.screen(id);
        if scr.has_feature(Features::WALL) {
            a.walls += 1;
        }
        if scr.has_feature(Features::BRIDGE) {
            a.bridges += 1;
        }
        if !scr.is_empty() {
            all_empty = false;
        }
        layout.set(screen.pos(), id);
    }
    check_neighbors(a, &layout)?;
    if all_empty {
        return fail(FailureKind::AllEmpty, "every screen is empty");
    }
    Ok(layout)
}

fn check_neighbors(a: &Attempt, layout: &Layout) -> Step {
    for pos in layout.all_pos() {
        let id = layout.get(pos);
        if let Some(below) = pos.offset(1, 0).filter(|p| p.y() < a.h) {
            if a.tileset.is_banned_vertical(id, layout.get(below)) {
                return fail(FailureKind::BannedNeighbor, format!("{pos} above {below}"));
            }
        }
        if let Some(right) = pos.offset(0, 1).filter(|p| p.x() < a.w) {
            if a.tileset.is_banned_horizontal(id, layout.get(right)) {
                return fail(FailureKind::BannedNeighbor, format!("{pos} left of {right}"));
            }
        }
    }
    Ok(())
}

/// Swap screens for their block, bridge or wall variants until the
/// bridge and wall counts match the targets.
pub fn refine_layout<S: CaveStrategy + ?Sized>(s: &S, a: &mut Attempt, layout: &mut Layout) -> Step {
    let bridges = a.targets.bridge;
    let walls = a.targets.wall;
    for pos in a.rng.ishuffle(&layout.all_pos()) {
        let tile = a.extract(pos.to_grid());
        let is_bridge = a.tileset.screen(layout.get(pos)).has_feature(Features::BRIDGE);
        let is_wall = a.tileset.screen(layout.get(pos)).has_feature(Features::WALL);
        // blocking a bridge screen would drop a bridge the target still needs
        let may_block = !is_bridge || a.bridges > bridges;
        if a.tuning.add_blocks
            && may_block
            && try_variant(s, a, layout, pos, &a.tileset.with_mod(&tile, ScreenMod::Block))
        {
            if is_bridge {
                a.bridges -= 1;
            }
            continue;
        }
        if is_bridge
            && a.bridges > bridges
            && try_variant(s, a, layout, pos, &a.tileset.with_mod(&tile, ScreenMod::Bridge))
        {
            a.bridges -= 1;
            continue;
        }
        if a.walls < walls
            && !is_wall
            && try_variant(s, a, layout, pos, &a.tileset.with_mod(&tile, ScreenMod::Wall))
        {
            a.walls += 1;
        }
    }
    if a.bridges != bridges {
        return fail(FailureKind::RefineLayout, format!("bridges {} != {bridges}", a.bridges));
    }
    if a.walls != walls {
        return fail(FailureKind::RefineLayout, format!("walls {} != {walls}", a.walls));
    }
    Ok(())
}

fn try_variant<S: CaveStrategy + ?Sized>(
    s: &S,
    a: &Attempt,
    layout: &mut Layout,
    pos: Pos,
    candidates: &[ScreenId],
) -> bool {
    for &id in candidates {
        if s.check_layout(a, layout, Some((pos, id))) {
            layout.set(pos, id);
            return true;
        }
    }
    false
}

pub fn check_layout(a: &Attempt, layout: &Layout, replace: Option<(Pos, ScreenId)>) -> bool {
    let parts = layout.traverse(a.tileset, Traverse::default(), replace);
    parts.component_count() == a.tuning.max_partitions
}

pub fn check_screens(a: &Attempt, layout: &Layout) -> Step {
    let want = a.targets.statue;
    if want > 0 {
        let have: usize = layout
            .screens()
            .iter()
            .map(|&id| a.tileset.screen(id).statues as usize)
            .sum();
        if have < want {
            return fail(FailureKind::Statues, format!("{have} statues < {want}"));
        }
    }
    if a.tuning.require_pit_destination && !has_pit_destination(a, layout) {
        return fail(FailureKind::PitDestination, "no screen to fall into");
    }
    Ok(())
}

/// A fall from a pit needs somewhere to land in either orientation: a
/// screen passing straight up and down, and one passing straight across
/// (spikes count as across).
fn has_pit_destination(a: &Attempt, layout: &Layout) -> bool {
    let mut vertical = false;
    let mut horizontal = false;
    for &id in layout.screens() {
        let scr = a.tileset.screen(id);
        if scr.is_empty() || scr.has_feature(Features::RIVER) {
            continue;
        }
        vertical |= scr.has_edge(Dir::Up) && scr.has_edge(Dir::Down);
        horizontal |= (scr.has_edge(Dir::Left) && scr.has_edge(Dir::Right))
            || scr.has_feature(Features::SPIKES);
        if vertical && horizontal {
            return true;
        }
    }
    false
}

/// Drop every component that never touches `early` terrain.
///
/// Fails if a fixed point would go with it, or if what is left is smaller
/// than the target size.
pub fn prune_disconnected(a: &mut Attempt, early: Tag) -> Step {
    let parts = a.grid.partition(None);
    let mut size = 0;
    let mut doomed = Vec::new();
    for part in parts.components() {
        if part.iter().any(|&c| a.get(c) == early) {
            size += part.iter().filter(|c| c.is_center()).count();
            continue;
        }
        if let Some(c) = part.iter().find(|&&c| a.is_fixed(c)) {
            return fail(FailureKind::Disconnected, format!("fixed {c} cut off from {early}"));
        }
        doomed.extend_from_slice(part);
    }
    for c in doomed {
        a.clear(c);
    }
    a.recount();
    if size < a.size {
        trace!("pruned too much:\n{}", a.show());
        return fail(FailureKind::Disconnected, format!("{size} screens left of {}", a.size));
    }
    Ok(())
}
