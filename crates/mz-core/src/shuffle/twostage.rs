//! Two-stage shuffles
//!
//! Some levels are laid out around a fixed terrain, a river or a wide
//! hall, before the ordinary cave fills in around it. The early stage
//! grows that terrain on a [`Monogrid`], which only ever produces edge
//! masks the catalog has screens for, and fixes all of it. The late stage
//! floods every remaining screen with land, ties each land region to the
//! early terrain through one edge, and hands the result to the usual
//! pipeline.

use log::trace;

#[cfg(not(feature = "std"))]
use crate::compat::*;
#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::BTreeMap;

use super::attempt::Attempt;
use super::pipeline;
use super::strategy::CaveStrategy;
use crate::error::{Failure, FailureKind, Step};
use crate::maze::{Dir, GridCoord, Monogrid, Overrides, Tag};

pub trait EarlyStage: CaveStrategy {
    /// Tag the early terrain is drawn with.
    fn early_tag(&self) -> Tag;

    /// Number of screens of early terrain to grow.
    fn target_early(&self, a: &Attempt) -> usize;

    /// Lay down and fix the early terrain.
    fn initial_fill_early(&self, a: &mut Attempt) -> Step {
        grow_early(self, a)
    }
}

/// Grow random paths of early terrain until the target is reached.
pub fn grow_early<S: EarlyStage + ?Sized>(s: &S, a: &mut Attempt) -> Step {
    let tag = s.early_tag();
    let target = s.target_early(a);
    let mut mono = Monogrid::new(a.h, a.w, Some(a.tileset.edge_masks(tag)));
    let mut misses = 0;
    while mono.filled() < target {
        if mono.add_path(&mut a.rng, Some(target)) {
            misses = 0;
            continue;
        }
        misses += 1;
        if misses > a.config.early_path_attempts {
            trace!("early terrain stalled:\n{}", mono.show());
            return Err(Failure::new(
                FailureKind::EarlyFill,
                format!("grew {} of {target} {tag} screens", mono.filled()),
            ));
        }
    }
    place_early(a, &mono, tag);
    Ok(())
}

/// Copy a monogrid into the attempt as fixed terrain.
pub fn place_early(a: &mut Attempt, mono: &Monogrid, tag: Tag) {
    a.grid.restore_data(mono.to_grid(tag).data().to_vec());
    a.add_all_fixed();
    match tag {
        Tag::River => a.rivers = mono.filled(),
        Tag::Wide => a.wides = mono.filled(),
        _ => {}
    }
}

pub fn initial_fill<S: EarlyStage + ?Sized>(s: &S, a: &mut Attempt) -> Step {
    s.initial_fill_early(a)?;
    fill_land(a);
    connect_land(a, s.early_tag());
    a.recount();
    Ok(())
}

/// Put land on every empty screen and join neighboring land screens.
pub fn fill_land(a: &mut Attempt) {
    for s in a.grid.screens() {
        let c = s.center();
        if a.get(c).is_empty() {
            a.set(c, Tag::Cave);
        }
    }
    for y in 0..a.h {
        for x in 0..a.w {
            let c = GridCoord::center_of(y, x);
            if a.get(c) != Tag::Cave || a.is_fixed(c) {
                continue;
            }
            for dir in [Dir::Right, Dir::Down] {
                let n = c.step_by(dir, 2);
                let inside = if dir == Dir::Right { x + 1 < a.w } else { y + 1 < a.h };
                if inside && a.get(n) == Tag::Cave && !a.is_fixed(n) && a.get(c.step(dir)).is_empty() {
                    a.set(c.step(dir), Tag::Cave);
                }
            }
        }
    }
}

/// Open one random legal edge between each land region and the early
/// terrain around it. Regions with no legal edge stay cut off.
pub fn connect_land(a: &mut Attempt, early: Tag) {
    let mut hidden = Overrides::new();
    for c in a.grid.filled() {
        if a.get(c) == early {
            hidden.insert(c, Tag::Empty);
        }
    }
    let land = a.grid.partition(Some(&hidden));
    let mut openings: BTreeMap<usize, Vec<GridCoord>> = BTreeMap::new();
    for s in a.grid.screens() {
        let c = s.center();
        if a.get(c) != early {
            continue;
        }
        for dir in Dir::ALL {
            let (e, n) = (c.step(dir), c.step_by(dir, 2));
            if a.grid.is_border(e) || !a.get(e).is_empty() || a.get(n) != Tag::Cave {
                continue;
            }
            if let Some(region) = land.component_of(&n) {
                openings.entry(region).or_default().push(e);
            }
        }
    }
    for edges in openings.values() {
        for e in a.rng.ishuffle(edges) {
            if a.can_set(e, Tag::Cave) {
                a.set(e, Tag::Cave);
                break;
            }
        }
    }
}

/// Arenas first, since they carve land; then drop land that lost touch
/// with the early terrain and place the usual spikes and overpasses.
pub fn add_early_features<S: EarlyStage + ?Sized>(s: &S, a: &mut Attempt) -> Step {
    let arenas = a.targets.arena;
    if !s.add_arenas(a, arenas) {
        return Err(Failure::new(FailureKind::Arenas, format!("could not place {arenas} arenas")));
    }
    pipeline::prune_disconnected(a, s.early_tag())?;
    pipeline::add_early_features(s, a)
}
