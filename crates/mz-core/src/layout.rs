//! Output level description
//!
//! A [`Layout`] is the shuffle's product: the level's dimensions and the
//! concrete screen at every position. It is also what connectivity is
//! judged on once screens have been chosen, through [`Layout::traverse`].

use core::fmt::Write as _;

use serde::{Deserialize, Serialize};

#[cfg(not(feature = "std"))]
use crate::compat::*;

use crate::catalog::{Passage, ScreenId, Tileset};
use crate::maze::{GridCoord, Partition, Pos, UnionFind};

/// Which connections a traversal may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Traverse {
    /// Also cross flight-only connections.
    pub flight: bool,
    /// Refuse connections that need a flag.
    pub no_flagged: bool,
}

impl Traverse {
    pub fn flight() -> Self {
        Self {
            flight: true,
            no_flagged: false,
        }
    }

    pub fn no_flagged() -> Self {
        Self {
            flight: false,
            no_flagged: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub height: usize,
    pub width: usize,
    screens: Vec<ScreenId>,
}

impl Layout {
    pub fn new(height: usize, width: usize, fill: ScreenId) -> Self {
        Self {
            height,
            width,
            screens: vec![fill; height * width],
        }
    }

    fn slot(&self, pos: Pos) -> usize {
        assert!(
            pos.y() < self.height && pos.x() < self.width,
            "position {pos} outside {}x{} layout",
            self.height,
            self.width
        );
        pos.y() * self.width + pos.x()
    }

    pub fn get(&self, pos: Pos) -> ScreenId {
        self.screens[self.slot(pos)]
    }

    pub fn set(&mut self, pos: Pos, id: ScreenId) {
        let i = self.slot(pos);
        self.screens[i] = id;
    }

    /// Every position, row by row.
    pub fn all_pos(&self) -> Vec<Pos> {
        let mut out = Vec::with_capacity(self.screens.len());
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(Pos::new(y, x));
            }
        }
        out
    }

    pub fn screens(&self) -> &[ScreenId] {
        &self.screens
    }

    /// Components of the edge points reachable through each screen's
    /// connections. `replace` substitutes one screen without touching the
    /// layout.
    pub fn traverse(
        &self,
        tileset: &Tileset<'_>,
        opts: Traverse,
        replace: Option<(Pos, ScreenId)>,
    ) -> Partition<GridCoord> {
        let mut uf = UnionFind::new();
        for pos in self.all_pos() {
            let id = match replace {
                Some((p, id)) if p == pos => id,
                _ => self.get(pos),
            };
            let center = pos.to_grid().center();
            for conn in &tileset.screen(id).connections {
                match conn.passage {
                    Passage::Flight if !opts.flight => continue,
                    Passage::Flagged if opts.no_flagged => continue,
                    _ => {}
                }
                let mut points = conn.edges.iter().map(|&d| center.step(d));
                let Some(first) = points.next() else {
                    continue;
                };
                uf.find(first);
                for p in points {
                    uf.union(first, p);
                }
            }
        }
        uf.into_partition()
    }

    /// Screen names, one row per line.
    pub fn show(&self, tileset: &Tileset<'_>) -> String {
        let mut out = String::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if x > 0 {
                    out.push(' ');
                }
                let _ = write!(out, "{}", tileset.screen(self.get(Pos::new(y, x))).name);
            }
            out.push('\n');
        }
        out
    }
}
