//! Screen catalog interface
//!
//! The engine never knows about concrete level art. It asks a
//! [`ScreenCatalog`] for the list of available screens, each described by
//! the 3x3 tiles it can stand in for, its edge tags, its features and the
//! way its edges connect. [`Tileset`] wraps a catalog with the lookup tables
//! the shuffle needs; the tables live exactly as long as the borrowed
//! catalog.

pub mod memory;
pub mod synthetic;

use core::fmt;

use bitflags::bitflags;
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

#[cfg(not(feature = "std"))]
use crate::compat::*;
#[cfg(not(feature = "std"))]
use alloc::collections::BTreeSet;
#[cfg(feature = "std")]
use std::collections::BTreeSet;

use crate::maze::{Dir, Tag, Tile};

pub use memory::MemoryCatalog;

bitflags! {
    /// Gameplay features a screen provides.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Features: u16 {
        const EMPTY = 0x0001;
        const DEADEND = 0x0002;
        const ARENA = 0x0004;
        const BRIDGE = 0x0008;
        const OVERPASS = 0x0010;
        const UNDERPASS = 0x0020;
        const PIT = 0x0040;
        const RAMP = 0x0080;
        const RIVER = 0x0100;
        const SPIKES = 0x0200;
        const WALL = 0x0400;
        const WIDE = 0x0800;
        const STAIR_UP = 0x1000;
        const STAIR_DOWN = 0x2000;
    }
}

// Manual serde impl for Features
impl Serialize for Features {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Features {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u16::deserialize(deserializer)?;
        Ok(Features::from_bits_truncate(bits))
    }
}

/// Variant marker for screens that are only ever swapped in while refining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ScreenMod {
    /// Partly blocked variant of an open screen.
    Block,
    /// River screen with its bridge removed.
    Bridge,
    /// Corridor with a breakable wall.
    Wall,
}

/// How a connection may be crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
pub enum Passage {
    #[default]
    Open,
    /// Needs a flag (wall broken, bridge built).
    Flagged,
    /// Only reachable by flying.
    Flight,
}

/// A set of edges mutually reachable within one screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub edges: Vec<Dir>,
    pub passage: Passage,
}

impl Connection {
    pub fn open(edges: &[Dir]) -> Self {
        Self {
            edges: edges.to_vec(),
            passage: Passage::Open,
        }
    }

    pub fn with_passage(mut self, passage: Passage) -> Self {
        self.passage = passage;
        self
    }
}

/// Index of a screen within its catalog.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ScreenId(pub u16);

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A concrete screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    pub name: String,
    /// Grid neighborhoods this screen can be inferred from.
    pub tiles: Vec<Tile>,
    /// Edge tags in direction order.
    pub edges: [Tag; 4],
    pub features: Features,
    pub modifier: Option<ScreenMod>,
    pub connections: Vec<Connection>,
    pub statues: u8,
}

impl Screen {
    /// A screen matching `tile`, with every non-empty edge in one open
    /// connection.
    pub fn new(name: impl Into<String>, tile: Tile) -> Self {
        let edges = tile.edges();
        let open: Vec<Dir> = Dir::ALL
            .into_iter()
            .filter(|d| !edges[d.index()].is_empty())
            .collect();
        let connections = if open.is_empty() {
            Vec::new()
        } else {
            vec![Connection::open(&open)]
        };
        let features = if tile.is_blank() {
            Features::EMPTY
        } else {
            Features::empty()
        };
        Self {
            name: name.into(),
            tiles: vec![tile],
            edges,
            features,
            modifier: None,
            connections,
            statues: 0,
        }
    }

    /// A screen that is never inferred from a tile, only placed by name.
    pub fn named(name: impl Into<String>, edges: [Tag; 4]) -> Self {
        let open: Vec<Dir> = Dir::ALL
            .into_iter()
            .filter(|d| !edges[d.index()].is_empty())
            .collect();
        Self {
            name: name.into(),
            tiles: Vec::new(),
            edges,
            features: Features::empty(),
            modifier: None,
            connections: if open.is_empty() {
                Vec::new()
            } else {
                vec![Connection::open(&open)]
            },
            statues: 0,
        }
    }

    pub fn with_features(mut self, features: Features) -> Self {
        self.features |= features;
        self
    }

    pub fn with_mod(mut self, modifier: ScreenMod) -> Self {
        self.modifier = Some(modifier);
        self
    }

    pub fn with_connections(mut self, connections: Vec<Connection>) -> Self {
        self.connections = connections;
        self
    }

    pub fn with_statues(mut self, statues: u8) -> Self {
        self.statues = statues;
        self
    }

    pub fn with_extra_tile(mut self, tile: Tile) -> Self {
        self.tiles.push(tile);
        self
    }

    pub fn has_feature(&self, f: Features) -> bool {
        self.features.contains(f)
    }

    pub fn is_empty(&self) -> bool {
        self.has_feature(Features::EMPTY)
    }

    pub fn has_edge(&self, dir: Dir) -> bool {
        !self.edges[dir.index()].is_empty()
    }

    /// Mask of edges if every non-empty edge is `tag`, else `None`.
    pub fn edge_mask(&self, tag: Tag) -> Option<u8> {
        let mut mask = 0;
        for dir in Dir::ALL {
            let e = self.edges[dir.index()];
            if e.is_empty() {
                continue;
            }
            if e != tag {
                return None;
            }
            mask |= dir.bit();
        }
        Some(mask)
    }
}

/// Source of screens for a tileset.
pub trait ScreenCatalog {
    fn screens(&self) -> &[Screen];

    /// Extra `(screen, neighbor, dir)` triples that may not sit side by
    /// side, `neighbor` being in direction `dir` from `screen`.
    fn banned_neighbors(&self) -> Vec<(ScreenId, ScreenId, Dir)> {
        Vec::new()
    }
}

/// Lookup tables over one catalog.
pub struct Tileset<'c> {
    screens: &'c [Screen],
    by_tile: HashMap<Tile, Vec<ScreenId>>,
    by_name: HashMap<&'c str, ScreenId>,
    // [vertical (above, below), horizontal (left, right)]
    banned: [HashSet<(ScreenId, ScreenId)>; 2],
    empty: ScreenId,
}

impl<'c> Tileset<'c> {
    /// Build the tables.
    ///
    /// Panics if the catalog has no empty screen (blank edges, `EMPTY`
    /// feature, no stairs).
    pub fn new(catalog: &'c dyn ScreenCatalog) -> Self {
        let screens = catalog.screens();
        let mut by_tile: HashMap<Tile, Vec<ScreenId>> = HashMap::new();
        let mut by_name = HashMap::new();
        let mut empty = None;
        for (i, s) in screens.iter().enumerate() {
            let id = ScreenId(i as u16);
            for tile in &s.tiles {
                by_tile.entry(*tile).or_default().push(id);
            }
            by_name.entry(s.name.as_str()).or_insert(id);
            if empty.is_none()
                && s.is_empty()
                && s.edges.iter().all(|e| e.is_empty())
                && !s.has_feature(Features::STAIR_UP | Features::STAIR_DOWN)
            {
                empty = Some(id);
            }
        }
        let Some(empty) = empty else {
            panic!("screen catalog has no empty screen");
        };
        let mut tileset = Self {
            screens,
            by_tile,
            by_name,
            banned: [HashSet::new(), HashSet::new()],
            empty,
        };
        for (i, s) in screens.iter().enumerate() {
            if s.has_feature(Features::RAMP)
                || s.has_feature(Features::OVERPASS)
                || s.has_feature(Features::PIT)
                || s.is_empty()
            {
                tileset.ban_dead_end_neighbor(ScreenId(i as u16));
            }
        }
        for (s, t, dir) in catalog.banned_neighbors() {
            tileset.ban_neighbor(s, t, dir);
        }
        tileset
    }

    fn ban_dead_end_neighbor(&mut self, s: ScreenId) {
        let screens = self.screens;
        for (j, t) in screens.iter().enumerate() {
            if !t.has_feature(Features::DEADEND) {
                continue;
            }
            for dir in Dir::ALL {
                if screens[s.0 as usize].has_edge(dir) && t.has_edge(dir.opposite()) {
                    self.ban_neighbor(s, ScreenId(j as u16), dir);
                }
            }
        }
    }

    fn ban_neighbor(&mut self, s: ScreenId, t: ScreenId, dir: Dir) {
        let pair = match dir {
            Dir::Down | Dir::Right => (s, t),
            Dir::Up | Dir::Left => (t, s),
        };
        self.banned[dir.index() & 1].insert(pair);
    }

    pub fn screens(&self) -> &'c [Screen] {
        self.screens
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    /// The screen for `id`. Panics on an id outside the catalog.
    pub fn screen(&self, id: ScreenId) -> &'c Screen {
        match self.screens.get(id.0 as usize) {
            Some(s) => s,
            None => panic!("unknown screen {id} (catalog has {})", self.screens.len()),
        }
    }

    pub fn empty(&self) -> ScreenId {
        self.empty
    }

    pub fn find(&self, name: &str) -> Option<ScreenId> {
        self.by_name.get(name).copied()
    }

    /// Every screen (including modified variants) matching `tile` exactly.
    pub fn screens_for_tile(&self, tile: &Tile) -> &[ScreenId] {
        self.by_tile.get(tile).map_or(&[], |v| v.as_slice())
    }

    pub fn has_tile(&self, tile: &Tile) -> bool {
        !self.screens_for_tile(tile).is_empty()
    }

    /// Unmodified screens matching `tile`, in catalog order.
    pub fn plain_for_tile(&self, tile: &Tile) -> Vec<ScreenId> {
        self.screens_for_tile(tile)
            .iter()
            .copied()
            .filter(|&id| self.screen(id).modifier.is_none())
            .collect()
    }

    /// Screens matching `tile` that carry the given modifier.
    pub fn with_mod(&self, tile: &Tile, modifier: ScreenMod) -> Vec<ScreenId> {
        self.screens_for_tile(tile)
            .iter()
            .copied()
            .filter(|&id| self.screen(id).modifier == Some(modifier))
            .collect()
    }

    pub fn is_banned_vertical(&self, above: ScreenId, below: ScreenId) -> bool {
        self.banned[0].contains(&(above, below))
    }

    pub fn is_banned_horizontal(&self, left: ScreenId, right: ScreenId) -> bool {
        self.banned[1].contains(&(left, right))
    }

    /// Edge masks of every screen whose non-empty edges are all `tag`.
    pub fn edge_masks(&self, tag: Tag) -> BTreeSet<u8> {
        self.screens.iter().filter_map(|s| s.edge_mask(tag)).collect()
    }
}
