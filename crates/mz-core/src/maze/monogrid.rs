//! Single-edge-type grid for early path growth
//!
//! Each cell holds a 4-bit mask of open edges (bit `1 << dir`). Opening an
//! edge on one cell always opens the mirrored bit on its neighbor, so the
//! structure stays symmetric. Paths and loops are grown here cheaply and
//! then translated into a full [`Grid`] with [`Monogrid::to_grid`].

#[cfg(not(feature = "std"))]
use crate::compat::*;
#[cfg(not(feature = "std"))]
use alloc::collections::{BTreeMap, BTreeSet};
#[cfg(feature = "std")]
use std::collections::{BTreeMap, BTreeSet};

use super::coord::{Dir, GridCoord};
use super::grid::Grid;
use super::tag::Tag;
use super::unionfind::UnionFind;
use crate::rng::ShuffleRng;

const GLYPHS: [char; 16] = [
    ' ', '╵', '╴', '┘', '╷', '│', '┐', '┤', '╶', '└', '─', '┴', '┌', '├', '┬', '┼',
];

/// Tentative cell values, checked before they are committed.
pub type Replacement = Vec<(usize, u8)>;

fn lookup(map: &[(usize, u8)], i: usize) -> Option<u8> {
    map.iter().rev().find(|(j, _)| *j == i).map(|&(_, v)| v)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monogrid {
    pub h: usize,
    pub w: usize,
    pub data: Vec<u8>,
    /// Cells that refinement and consolidation must leave alone.
    pub fixed: BTreeSet<usize>,
    /// Cells added by path growth (the first path counts two).
    pub size: usize,
    valid: Option<BTreeSet<u8>>,
}

impl Monogrid {
    pub fn new(h: usize, w: usize, valid: Option<BTreeSet<u8>>) -> Self {
        Self {
            h,
            w,
            data: vec![0; h * w],
            fixed: BTreeSet::new(),
            size: 0,
            valid,
        }
    }

    fn is_valid(&self, mask: u8) -> bool {
        self.valid.as_ref().is_none_or(|v| v.contains(&mask))
    }

    /// Open every interior edge.
    pub fn fill(&mut self) {
        for y in 0..self.h {
            for x in 0..self.w {
                let i = y * self.w + x;
                for dir in Dir::ALL {
                    if !self.is_border2(y, x, dir) {
                        self.data[i] |= dir.bit();
                    }
                }
            }
        }
    }

    pub fn is_border(&self, i: usize, dir: Dir) -> bool {
        self.is_border2(i / self.w, i % self.w, dir)
    }

    pub fn is_border2(&self, y: usize, x: usize, dir: Dir) -> bool {
        match dir {
            Dir::Up => y == 0,
            Dir::Left => x == 0,
            Dir::Down => y + 1 >= self.h,
            Dir::Right => x + 1 >= self.w,
        }
    }

    /// Signed index offset toward `dir`.
    pub fn delta(&self, dir: Dir) -> isize {
        match dir {
            Dir::Up => -(self.w as isize),
            Dir::Left => -1,
            Dir::Down => self.w as isize,
            Dir::Right => 1,
        }
    }

    fn neighbor(&self, i: usize, dir: Dir) -> usize {
        (i as isize + self.delta(dir)) as usize
    }

    /// Delete a cell along with the mirrored edges of its neighbors.
    ///
    /// Rejected without mutation if the cell or any touched neighbor is
    /// fixed, if a neighbor would be left with no edges at all, or if the
    /// remaining cells would split.
    pub fn delete(&mut self, i: usize) -> bool {
        self.delete2(i / self.w, i % self.w)
    }

    pub fn delete2(&mut self, y: usize, x: usize) -> bool {
        let i = y * self.w + x;
        if self.fixed.contains(&i) {
            return false;
        }
        let mut repl = vec![(i, 0)];
        for dir in Dir::ALL {
            if self.is_border2(y, x, dir) {
                continue;
            }
            let n = self.neighbor(i, dir);
            let prev = self.data[n];
            let next = prev & !dir.opposite().bit();
            if prev != next {
                if self.fixed.contains(&n) || next == 0 {
                    return false;
                }
                repl.push((n, next));
            }
        }
        self.try_replace(&repl)
    }

    /// Delete one edge (both halves).
    pub fn delete_edge(&mut self, i: usize, dir: Dir) -> bool {
        if self.fixed.contains(&i) {
            return false;
        }
        if self.is_border(i, dir) {
            self.data[i] &= !dir.bit();
            return true;
        }
        let j = self.neighbor(i, dir);
        if self.fixed.contains(&j) {
            return false;
        }
        let a = self.data[i] & !dir.bit();
        let b = self.data[j] & !dir.opposite().bit();
        if (a == 0 && self.data[i] != 0) || (b == 0 && self.data[j] != 0) {
            return false;
        }
        self.try_replace(&[(i, a), (j, b)])
    }

    /// Delete random non-fixed cells until at most `target` remain.
    pub fn refine(&mut self, rng: &mut ShuffleRng, target: usize) -> bool {
        let mut count = self.data.iter().filter(|&&v| v != 0).count();
        let all: Vec<usize> = (0..self.data.len())
            .filter(|i| !self.fixed.contains(i))
            .collect();
        while count > target {
            let mut found = false;
            for pos in rng.ishuffle(&all) {
                if count <= target {
                    break;
                }
                if self.data[pos] == 0 {
                    continue;
                }
                if self.delete(pos) {
                    found = true;
                    count -= 1;
                }
            }
            if !found {
                return false;
            }
        }
        true
    }

    /// True when every edge is mirrored by its neighbor.
    pub fn validate(&self) -> bool {
        for y in 0..self.h {
            for x in 0..self.w {
                let i = y * self.w + x;
                let v = self.data[i];
                if y > 0 && ((self.data[i - self.w] & 4) != 0) != ((v & 1) != 0) {
                    return false;
                }
                if x > 0 && ((self.data[i - 1] & 8) != 0) != ((v & 2) != 0) {
                    return false;
                }
            }
        }
        true
    }

    /// Open an edge and its mirror.
    pub fn add_edge(&mut self, y: usize, x: usize, dir: Dir) {
        let i = y * self.w + x;
        self.data[i] |= dir.bit();
        if !self.is_border2(y, x, dir) {
            let n = self.neighbor(i, dir);
            self.data[n] |= dir.opposite().bit();
        }
    }

    /// Rearrange non-fixed cells until at most `target` distinct masks are
    /// in use. Returns the surviving masks, or an empty vec on failure.
    pub fn consolidate(&mut self, rng: &mut ShuffleRng, target: usize) -> Vec<u8> {
        let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
        for i in 0..self.data.len() {
            if !self.fixed.contains(&i) && self.data[i] != 0 {
                *counts.entry(self.data[i]).or_default() += 1;
            }
        }
        let mut attempts = 1000;
        while counts.len() > target {
            attempts -= 1;
            if attempts == 0 {
                return Vec::new();
            }
            let mut sorted: Vec<(u8, usize)> = counts.iter().map(|(&k, &v)| (k, v)).collect();
            sorted.sort_by(|a, b| b.1.cmp(&a.1));
            let threshold = sorted[target].1;
            let bad: BTreeSet<u8> = sorted
                .iter()
                .filter(|a| a.1 <= threshold)
                .map(|a| a.0)
                .collect();
            let eligible = self.find_eligible_consolidates(&bad);
            let Some(pick) = rng.pick(&eligible).cloned() else {
                return Vec::new();
            };
            for (i, s) in pick {
                if self.data[i] != 0 {
                    multiset_remove(&mut counts, self.data[i]);
                }
                if s != 0 {
                    *counts.entry(s).or_default() += 1;
                }
                self.data[i] = s;
            }
        }
        counts.keys().copied().collect()
    }

    /// Remove every non-fixed occurrence of the masks in `bad`.
    pub fn consolidate_fixed(&mut self, rng: &mut ShuffleRng, bad: &BTreeSet<u8>) -> bool {
        let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
        for i in 0..self.data.len() {
            let scr = self.data[i];
            if !self.fixed.contains(&i) && bad.contains(&scr) {
                *counts.entry(scr).or_default() += 1;
            }
        }
        let mut attempts = 1000;
        while !counts.is_empty() {
            attempts -= 1;
            if attempts == 0 {
                return false;
            }
            let eligible = self.find_eligible_consolidates(bad);
            let Some(pick) = rng.pick(&eligible).cloned() else {
                return false;
            };
            for (i, s) in pick {
                let scr = self.data[i];
                if bad.contains(&scr) {
                    multiset_remove(&mut counts, scr);
                }
                if bad.contains(&s) {
                    *counts.entry(s).or_default() += 1;
                }
                self.data[i] = s;
            }
        }
        true
    }

    /// Single-edge toggles that move a bad cell to a good mask while
    /// keeping the grid connected. Toggles that also fix a bad neighbor
    /// are returned alone when any exist.
    pub fn find_eligible_consolidates(&self, bad: &BTreeSet<u8>) -> Vec<Replacement> {
        let mut eligible = Vec::new();
        let mut best = Vec::new();
        for i in 0..self.data.len() {
            if self.fixed.contains(&i) {
                continue;
            }
            let scr0 = self.data[i];
            if !bad.contains(&scr0) {
                continue;
            }
            for dir in Dir::ALL {
                if self.is_border(i, dir) {
                    continue;
                }
                let j = self.neighbor(i, dir);
                if self.fixed.contains(&j) {
                    continue;
                }
                let next0 = scr0 ^ dir.bit();
                if bad.contains(&next0) || next0 == 0 {
                    continue;
                }
                let scr1 = self.data[j];
                let next1 = scr1 ^ dir.opposite().bit();
                if next1 == 0 && scr1 != 0 {
                    continue;
                }
                let repl = vec![(i, next0), (j, next1)];
                if !self.check(Some(&repl)) {
                    continue;
                }
                let improves = !bad.contains(&next1) && bad.contains(&scr1);
                eligible.push(repl.clone());
                if improves {
                    best.push(repl);
                    break;
                }
            }
        }
        if best.is_empty() { eligible } else { best }
    }

    /// Commit `repl` if the result stays connected.
    pub fn try_replace(&mut self, repl: &[(usize, u8)]) -> bool {
        if !self.check(Some(repl)) {
            return false;
        }
        for &(i, v) in repl {
            self.data[i] = v;
        }
        true
    }

    /// True when the (optionally substituted) cells form exactly one component.
    pub fn check(&self, repl: Option<&[(usize, u8)]>) -> bool {
        let mut uf = UnionFind::new();
        for y in 0..self.h {
            for x in 0..self.w {
                let i = y * self.w + x;
                let s = repl.and_then(|r| lookup(r, i)).unwrap_or(self.data[i]);
                if s != 0 {
                    uf.find(i);
                }
                for dir in Dir::ALL {
                    if s & dir.bit() != 0 && !self.is_border2(y, x, dir) {
                        uf.union(i, self.neighbor(i, dir));
                    }
                }
            }
        }
        uf.roots().len() == 1
    }

    /// Grow a random self-avoiding path, starting fresh on an empty grid or
    /// from an existing cell with a free edge.
    pub fn add_path(&mut self, rng: &mut ShuffleRng, max_size: Option<usize>) -> bool {
        let (mut y, mut x);
        if self.size == 0 {
            y = rng.next_int(self.h);
            x = rng.next_int(self.w);
        } else {
            let eligible: Vec<usize> = (0..self.data.len())
                .filter(|&i| self.data[i] != 0 && self.data[i] != 0xf)
                .collect();
            let Some(&p) = rng.pick(&eligible) else {
                return false;
            };
            y = p / self.w;
            x = p % self.w;
        }
        let mut path: BTreeMap<usize, u8> = BTreeMap::new();
        let mut i = y * self.w + x;
        let mut len = 0;
        let mut ok = true;
        loop {
            let mut closed = false;
            let prev = path.get(&i).copied().unwrap_or(self.data[i]);
            let mut found = false;
            for dir in rng.ishuffle(&Dir::ALL) {
                if prev & dir.bit() != 0 {
                    continue;
                }
                let next = prev | dir.bit();
                if !self.is_valid(next) {
                    continue;
                }
                let y1 = y as isize + dir.dy() as isize;
                let x1 = x as isize + dir.dx() as isize;
                if y1 < 0 || x1 < 0 || y1 >= self.h as isize || x1 >= self.w as isize {
                    continue;
                }
                let i1 = y1 as usize * self.w + x1 as usize;
                let prev1 = path.get(&i1).copied().unwrap_or(self.data[i1]);
                let next1 = prev1 | dir.opposite().bit();
                if prev1 != 0 {
                    if prev1 == next1 || !self.is_valid(next1) {
                        // a retrace, or a mask no screen has
                        continue;
                    }
                    closed = true;
                }
                ok = self.is_valid(next1);
                path.insert(i, next);
                path.insert(i1, next1);
                y = y1 as usize;
                x = x1 as usize;
                i = i1;
                found = true;
                break;
            }
            if !found || closed || self.data[i] != 0 {
                break;
            }
            self.size = if self.size == 0 { 2 } else { self.size + 1 };
            if ok && max_size.is_some_and(|m| m > 0 && self.size >= m) {
                break;
            }
            if ok {
                let stop = rng.next_int(15) < len;
                len += 1;
                if stop {
                    break;
                }
            }
        }
        if path.is_empty() || !ok {
            return false;
        }
        for (i, v) in path {
            self.data[i] = v;
        }
        true
    }

    /// Translate into a full grid using a single tag.
    pub fn to_grid(&self, tag: Tag) -> Grid {
        let mut g = Grid::new(self.h, self.w);
        for y in 0..self.h {
            for x in 0..self.w {
                let s = self.data[y * self.w + x];
                if s == 0 {
                    continue;
                }
                let c = GridCoord::center_of(y, x);
                g.set(c, tag);
                for dir in Dir::ALL {
                    if s & dir.bit() != 0 {
                        g.set(c.step(dir), tag);
                    }
                }
            }
        }
        g
    }

    /// Number of non-empty cells.
    pub fn filled(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    pub fn show(&self) -> String {
        let mut out = String::new();
        for y in 0..self.h {
            if y > 0 {
                out.push('\n');
            }
            for x in 0..self.w {
                out.push(GLYPHS[(self.data[y * self.w + x] & 0xf) as usize]);
            }
        }
        out
    }
}

fn multiset_remove(counts: &mut BTreeMap<u8, usize>, key: u8) {
    if let Some(n) = counts.get_mut(&key) {
        *n -= 1;
        if *n == 0 {
            counts.remove(&key);
        }
    }
}

/// Carves directed paths through a [`Monogrid`].
pub struct Cursor<'g> {
    grid: &'g mut Monogrid,
    i: usize,
}

impl<'g> Cursor<'g> {
    pub fn new(grid: &'g mut Monogrid, y: usize, x: usize) -> Self {
        let i = y * grid.w + x;
        Self { grid, i }
    }

    pub fn y(&self) -> usize {
        self.i / self.grid.w
    }

    pub fn x(&self) -> usize {
        self.i % self.grid.w
    }

    /// Open the edge toward `dir` and step across it.
    ///
    /// Returns false, leaving the grid untouched, if that would leave the grid.
    pub fn go(&mut self, dir: Dir) -> bool {
        if self.grid.is_border(self.i, dir) {
            return false;
        }
        let next = self.grid.neighbor(self.i, dir);
        self.grid.data[self.i] |= dir.bit();
        self.grid.data[next] |= dir.opposite().bit();
        self.i = next;
        true
    }

    /// Walk toward `(y, x)`, picking uniformly among the helpful directions.
    pub fn directed_path(&mut self, rng: &mut ShuffleRng, y: usize, x: usize) {
        loop {
            let (y0, x0) = (self.y(), self.x());
            let mut dirs = Vec::with_capacity(2);
            if y < y0 {
                dirs.push(Dir::Up);
            }
            if x < x0 {
                dirs.push(Dir::Left);
            }
            if y > y0 {
                dirs.push(Dir::Down);
            }
            if x > x0 {
                dirs.push(Dir::Right);
            }
            let Some(&dir) = rng.pick(&dirs) else {
                return;
            };
            if !self.go(dir) {
                return;
            }
        }
    }
}
