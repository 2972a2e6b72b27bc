//! The doubled-resolution level grid
//!
//! A grid of `height x width` screens is stored as a dense
//! `(2h + 1) x (2w + 1)` array of [`Tag`]s covering centers, edges and
//! corners. The outermost ring of the array lies just outside the map:
//! exits are written there, so edge-exit logic can use the same `get` and
//! `set` as everything else.

use core::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

#[cfg(not(feature = "std"))]
use crate::compat::*;

use super::coord::{Dir, GridCoord, HALF_X, HALF_Y};
use super::tag::{Tag, Tile};
use super::unionfind::{Partition, UnionFind};
use crate::rng::ShuffleRng;

/// Tentative values substituted during a partition or extraction.
pub type Overrides = HashMap<GridCoord, Tag>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    height: usize,
    width: usize,
    row: usize,
    data: Vec<Tag>,
}

impl Grid {
    pub fn new(height: usize, width: usize) -> Self {
        let row = (width << 1) | 1;
        Self {
            height,
            width,
            row,
            data: vec![Tag::Empty; ((height << 1) | 1) * row],
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Length of one row of the backing array (`2 * width + 1`).
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn data(&self) -> &[Tag] {
        &self.data
    }

    /// Replace the backing array wholesale (excursion restore).
    ///
    /// Panics if the length does not match this grid's shape.
    pub fn restore_data(&mut self, data: Vec<Tag>) {
        assert_eq!(data.len(), self.data.len(), "grid snapshot shape mismatch");
        self.data = data;
    }

    /// Top-left coordinate of every screen, row by row.
    pub fn screens(&self) -> Vec<GridCoord> {
        let mut out = Vec::with_capacity(self.height * self.width);
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(GridCoord::screen(y, x));
            }
        }
        out
    }

    pub fn index(&self, c: GridCoord) -> Option<usize> {
        if !c.is_canonical() {
            return None;
        }
        let y2 = c.y2() as usize;
        let x2 = c.x2() as usize;
        if y2 > self.height << 1 || x2 > self.width << 1 {
            return None;
        }
        Some(x2 + self.row * y2)
    }

    pub fn coord(&self, index: usize) -> GridCoord {
        let x = index % self.row;
        let y = index / self.row;
        GridCoord(((y << 11) | (x << 3)) as i32)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at `c`; anything outside the backing array reads as empty.
    pub fn get(&self, c: GridCoord) -> Tag {
        self.index(c).map_or(Tag::Empty, |i| self.data[i])
    }

    /// Write `v` at `c`.
    ///
    /// Clearing a point outside the array is a no-op; writing anything
    /// else there is a bug in the caller and panics.
    pub fn set(&mut self, c: GridCoord, v: Tag) {
        match self.index(c) {
            Some(i) => self.data[i] = v,
            None if v.is_empty() => {}
            None => panic!(
                "write of {v} at {c} outside {}x{} grid",
                self.height, self.width
            ),
        }
    }

    fn value(&self, c: GridCoord, i: usize, overrides: Option<&Overrides>) -> Tag {
        overrides
            .and_then(|o| o.get(&c).copied())
            .unwrap_or(self.data[i])
    }

    /// Coordinate of the `position`th exit slot along side `dir`.
    pub fn border(&self, dir: Dir, position: usize) -> GridCoord {
        let p = position as i32;
        let (y, x) = if dir.is_horizontal() {
            let x = if dir == Dir::Right { (self.width as i32) << 4 } else { 0 };
            ((p << 12) | HALF_Y, x)
        } else {
            let y = if dir == Dir::Down { (self.height as i32) << 12 } else { 0 };
            (y, (p << 4) | HALF_X)
        };
        GridCoord(y | x)
    }

    /// Random exit slot, either on side `dir` or uniformly around the map.
    pub fn random_border(&self, rng: &mut ShuffleRng, dir: Option<Dir>) -> GridCoord {
        if let Some(dir) = dir {
            let len = if dir.is_horizontal() { self.height } else { self.width };
            return self.border(dir, rng.next_int(len));
        }
        let semi = self.width + self.height;
        let s = rng.next_int(semi << 1);
        let (s, far) = if s < semi { (s, false) } else { (s - semi, true) };
        if s < self.width {
            self.border(if far { Dir::Down } else { Dir::Up }, s)
        } else {
            self.border(if far { Dir::Right } else { Dir::Left }, s - self.width)
        }
    }

    /// The exit slot directly across the map.
    pub fn opposite_border(&self, edge: GridCoord) -> GridCoord {
        if edge.raw() & HALF_X != 0 {
            GridCoord(edge.raw() ^ ((self.height as i32) << 12))
        } else {
            GridCoord(edge.raw() ^ ((self.width as i32) << 4))
        }
    }

    /// The exit slot point-reflected through the map's middle.
    pub fn furthest_border(&self, edge: GridCoord) -> GridCoord {
        GridCoord((((self.height as i32) << 12) | ((self.width as i32) << 4)) - edge.raw())
    }

    /// Number of non-empty edges around `center` (or edges equal to `want`).
    pub fn edge_coordination(&self, center: GridCoord, want: Option<Tag>) -> usize {
        assert!(center.is_center(), "not a screen center: {center}");
        Dir::ALL
            .iter()
            .map(|&d| self.get(center.step(d)))
            .filter(|&t| match want {
                Some(w) => t == w,
                None => !t.is_empty(),
            })
            .count()
    }

    /// True iff `c` is an edge lying on the rectangle's outer boundary.
    pub fn is_border(&self, c: GridCoord) -> bool {
        let raw = c.raw();
        if raw & HALF_X != 0 {
            if raw & HALF_Y != 0 {
                return false;
            }
            let y = (raw >> 12) as usize;
            y == 0 || y == self.height
        } else if raw & HALF_Y != 0 {
            let x = ((raw >> 4) & 0xf) as usize;
            x == 0 || x == self.width
        } else {
            false
        }
    }

    /// The 3x3 neighborhood whose top-left corner is `screen`.
    pub fn extract(&self, screen: GridCoord) -> Tile {
        self.extract_inner(screen, None)
    }

    pub fn extract_with(&self, screen: GridCoord, overrides: &Overrides) -> Tile {
        self.extract_inner(screen, Some(overrides))
    }

    fn extract_inner(&self, screen: GridCoord, overrides: Option<&Overrides>) -> Tile {
        let mut tile = Tile::default();
        for r in 0..3 {
            for col in 0..3 {
                let c = screen.offset(r * HALF_Y + col * HALF_X);
                let v = overrides
                    .and_then(|o| o.get(&c).copied())
                    .unwrap_or_else(|| self.get(c));
                tile.0[(r * 3 + col) as usize] = v;
            }
        }
        tile
    }

    /// Connected components of the non-empty points, with optional
    /// substitutions. The grid itself is never modified.
    pub fn partition(&self, overrides: Option<&Overrides>) -> Partition<GridCoord> {
        let mut uf = UnionFind::new();
        for y in 0..=(self.height << 1) {
            for x in 0..self.row {
                let i = y * self.row + x;
                let coord = self.coord(i);
                if self.value(coord, i, overrides).is_empty() {
                    continue;
                }
                uf.find(coord);
                if y > 0 {
                    let above = coord.offset(-HALF_Y);
                    if !self.value(above, i - self.row, overrides).is_empty() {
                        uf.union(coord, above);
                    }
                }
                if x > 0 {
                    let left = coord.offset(-HALF_X);
                    if !self.value(left, i - 1, overrides).is_empty() {
                        uf.union(coord, left);
                    }
                }
            }
        }
        uf.into_partition()
    }

    /// Non-empty points in scan order.
    pub fn filled(&self) -> Vec<GridCoord> {
        (0..self.data.len())
            .filter(|&i| !self.data[i].is_empty())
            .map(|i| self.coord(i))
            .collect()
    }

    /// Number of occupied screen centers.
    pub fn center_count(&self) -> usize {
        self.screens()
            .into_iter()
            .filter(|s| !self.get(s.center()).is_empty())
            .count()
    }

    /// Blit a textual pattern with its top-left at `c`.
    ///
    /// Characters that are not tags are written as empty.
    pub fn write_grid_2d(&mut self, c: GridCoord, rows: &[&str]) {
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let at = c.offset(y as i32 * HALF_Y + x as i32 * HALF_X);
                self.set(at, Tag::from_char(ch).unwrap_or(Tag::Empty));
            }
        }
    }

    pub fn show(&self) -> String {
        let mut out = String::with_capacity(self.data.len() + self.height * 2 + 2);
        for (i, t) in self.data.iter().enumerate() {
            if i > 0 && i % self.row == 0 {
                out.push('\n');
            }
            out.push(t.as_char());
        }
        out
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.show())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Grid {
        // two screens joined horizontally
        let mut g = Grid::new(1, 2);
        g.write_grid_2d(GridCoord(0), &["     ", " ccc ", "     "]);
        g
    }

    #[test]
    fn test_index_and_coord() {
        let g = Grid::new(3, 2);
        assert_eq!(g.len(), 7 * 5);
        for i in 0..g.len() {
            assert_eq!(g.index(g.coord(i)), Some(i));
        }
        assert_eq!(g.index(GridCoord(-8)), None);
        assert_eq!(g.index(GridCoord(0x0800 - 8)), None);
        assert_eq!(g.index(GridCoord::center_of(3, 0)), None);
    }

    #[test]
    fn test_get_outside_is_empty() {
        let mut g = Grid::new(2, 2);
        assert_eq!(g.get(GridCoord(0x7000)), Tag::Empty);
        g.set(GridCoord(0x7000), Tag::Empty);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_set_outside_panics() {
        let mut g = Grid::new(2, 2);
        g.set(GridCoord(0x7008), Tag::Cave);
    }

    #[test]
    fn test_border() {
        let g = Grid::new(3, 2);
        assert_eq!(g.border(Dir::Up, 1).raw(), 0x0018);
        assert_eq!(g.border(Dir::Down, 0).raw(), 0x3008);
        assert_eq!(g.border(Dir::Left, 2).raw(), 0x2800);
        assert_eq!(g.border(Dir::Right, 0).raw(), 0x0820);
        for d in Dir::ALL {
            assert!(g.is_border(g.border(d, 0)));
        }
        assert!(!g.is_border(GridCoord::center_of(0, 0)));
        assert!(!g.is_border(GridCoord(0x1008)));
        assert_eq!(g.opposite_border(GridCoord(0x0018)).raw(), 0x3018);
        assert_eq!(g.opposite_border(GridCoord(0x0800)).raw(), 0x0820);
        assert_eq!(g.furthest_border(GridCoord(0x0008)).raw(), 0x3018);
    }

    #[test]
    fn test_random_border_is_border() {
        let g = Grid::new(4, 3);
        let mut rng = ShuffleRng::new(5);
        for _ in 0..200 {
            assert!(g.is_border(g.random_border(&mut rng, None)));
            assert!(g.is_border(g.random_border(&mut rng, Some(Dir::Left))));
        }
    }

    #[test]
    fn test_extract() {
        let g = corridor();
        assert_eq!(g.extract(GridCoord::screen(0, 0)).to_string(), "    cc   ");
        assert_eq!(g.extract(GridCoord::screen(0, 1)).to_string(), "   cc    ");
        let mut o = Overrides::new();
        o.insert(GridCoord(0x0808), Tag::Arena);
        assert_eq!(g.extract_with(GridCoord(0), &o).to_string(), "    ac   ");
        assert_eq!(g.edge_coordination(GridCoord(0x0808), None), 1);
        assert_eq!(g.edge_coordination(GridCoord(0x0808), Some(Tag::River)), 0);
    }

    #[test]
    fn test_partition_with_override() {
        let g = corridor();
        let p = g.partition(None);
        assert_eq!(p.component_count(), 1);
        assert_eq!(p.point_count(), 3);
        let mut o = Overrides::new();
        o.insert(GridCoord(0x0810), Tag::Empty);
        let p = g.partition(Some(&o));
        assert_eq!(p.component_count(), 2);
        // the grid is untouched
        assert_eq!(g.get(GridCoord(0x0810)), Tag::Cave);
    }

    #[test]
    fn test_show() {
        let g = corridor();
        assert_eq!(g.show(), "     \n ccc \n     ");
        assert_eq!(g.center_count(), 2);
        assert_eq!(g.filled().len(), 3);
    }
}
