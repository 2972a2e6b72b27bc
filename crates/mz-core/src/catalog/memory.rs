//! A catalog held entirely in memory.

#[cfg(not(feature = "std"))]
use crate::compat::*;

use serde::{Deserialize, Serialize};

use super::{Screen, ScreenCatalog, ScreenId};
use crate::maze::Dir;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCatalog {
    screens: Vec<Screen>,
    bans: Vec<(ScreenId, ScreenId, Dir)>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a screen and return its id.
    pub fn push(&mut self, screen: Screen) -> ScreenId {
        let id = ScreenId(self.screens.len() as u16);
        self.screens.push(screen);
        id
    }

    /// Forbid `neighbor` from sitting in direction `dir` from `screen`.
    pub fn ban(&mut self, screen: ScreenId, neighbor: ScreenId, dir: Dir) {
        self.bans.push((screen, neighbor, dir));
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }
}

impl ScreenCatalog for MemoryCatalog {
    fn screens(&self) -> &[Screen] {
        &self.screens
    }

    fn banned_neighbors(&self) -> Vec<(ScreenId, ScreenId, Dir)> {
        self.bans.clone()
    }
}

impl FromIterator<Screen> for MemoryCatalog {
    fn from_iter<I: IntoIterator<Item = Screen>>(iter: I) -> Self {
        Self {
            screens: iter.into_iter().collect(),
            bans: Vec::new(),
        }
    }
}
