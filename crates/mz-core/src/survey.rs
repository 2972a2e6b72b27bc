//! Shuffle targets measured from an existing level
//!
//! A [`Survey`] records what a shuffled level must preserve: its size,
//! where its exits are, how many stairs it has and how many of each
//! special feature. It is usually measured with [`Survey::from_layout`],
//! but can be written by hand or loaded with serde.

use serde::{Deserialize, Serialize};

#[cfg(not(feature = "std"))]
use crate::compat::*;

use crate::catalog::{Features, Tileset};
use crate::layout::Layout;
use crate::maze::Dir;

/// Per-feature screen counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureCounts {
    pub arena: usize,
    pub bridge: usize,
    pub over: usize,
    pub pit: usize,
    pub ramp: usize,
    pub river: usize,
    pub spike: usize,
    pub statue: usize,
    pub under: usize,
    pub wall: usize,
    pub wide: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Survey {
    /// Name used in logs and errors.
    pub level: String,
    pub height: usize,
    pub width: usize,
    /// Number of non-empty screens.
    pub size: usize,
    /// Border exits per side, in direction order.
    pub edges: [usize; 4],
    /// Up and down stairs.
    pub stairs: [usize; 2],
    pub features: FeatureCounts,
}

impl Survey {
    /// Measure a layout. `statues` is supplied by the caller since statues
    /// are spawns rather than part of the screens themselves.
    pub fn from_layout(
        level: impl Into<String>,
        layout: &Layout,
        tileset: &Tileset<'_>,
        statues: usize,
    ) -> Self {
        let mut survey = Survey {
            level: level.into(),
            height: layout.height,
            width: layout.width,
            ..Survey::default()
        };
        survey.features.statue = statues;
        for pos in layout.all_pos() {
            let scr = tileset.screen(layout.get(pos));
            if !scr.is_empty() {
                survey.size += 1;
            }
            let on_side = [
                pos.y() == 0,
                pos.x() == 0,
                pos.y() + 1 == layout.height,
                pos.x() + 1 == layout.width,
            ];
            for dir in Dir::ALL {
                if on_side[dir.index()] && scr.has_edge(dir) {
                    survey.edges[dir.index()] += 1;
                }
            }
            if scr.has_feature(Features::STAIR_UP) {
                survey.stairs[0] += 1;
            }
            if scr.has_feature(Features::STAIR_DOWN) {
                survey.stairs[1] += 1;
            }
            let f = &mut survey.features;
            let counters = [
                (Features::ARENA, &mut f.arena),
                (Features::BRIDGE, &mut f.bridge),
                (Features::OVERPASS, &mut f.over),
                (Features::PIT, &mut f.pit),
                (Features::RAMP, &mut f.ramp),
                (Features::SPIKES, &mut f.spike),
                (Features::UNDERPASS, &mut f.under),
                (Features::WALL, &mut f.wall),
                (Features::RIVER, &mut f.river),
                (Features::WIDE, &mut f.wide),
            ];
            for (feature, n) in counters {
                if scr.has_feature(feature) {
                    *n += 1;
                }
            }
        }
        if survey.size < 2 && (layout.width > 1 || layout.height > 1) {
            survey.size = 2;
        }
        survey
    }

    /// Total border exits and stairs.
    pub fn exit_count(&self) -> usize {
        self.edges.iter().sum::<usize>() + self.stairs.iter().sum::<usize>()
    }
}
