//! Growing passages through empty screens
//!
//! Refinement only ever removes. These helpers add: a random path joining
//! two centers, or a second path between two dead ends that closes a loop.

#[cfg(not(feature = "std"))]
use crate::compat::*;

use super::attempt::{single, Attempt};
use crate::maze::{Dir, GridCoord, Tag, UnionFind};

/// Directions in the order connections are tried.
const CONNECT_DIRS: [Dir; 4] = [Dir::Right, Dir::Left, Dir::Down, Dir::Up];

/// Walk a random, end-biased path of `tag` from center `start` to center
/// `end` through empty screens. Nothing is written unless the walk arrives.
pub fn try_connect(a: &mut Attempt, start: GridCoord, end: GridCoord, tag: Tag, attempts: usize) -> bool {
    assert!(
        start.is_center() && end.is_center(),
        "connect needs two centers, got {start} and {end}"
    );
    for _ in 0..attempts {
        let mut path = vec![start];
        let mut pos = start;
        while pos != end {
            let mut dirs: Vec<Dir> = CONNECT_DIRS
                .into_iter()
                .filter(|&d| {
                    let (p1, p2) = (pos.step(d), pos.step_by(d, 2));
                    !a.is_fixed(p2)
                        && !path.contains(&p2)
                        && a.get(p2).is_empty()
                        && !a.grid.is_border(p1)
                })
                .collect();
            if dirs.is_empty() {
                break;
            }
            let dy = end.y() as i32 - pos.y() as i32;
            let dx = end.x() as i32 - pos.x() as i32;
            let preferred: Vec<Dir> = dirs
                .iter()
                .copied()
                .filter(|d| !(dy < 0 && *d == Dir::Down))
                .filter(|d| !(dy > 0 && *d == Dir::Up))
                .filter(|d| !(dx < 0 && *d == Dir::Right))
                .filter(|d| !(dx > 0 && *d == Dir::Left))
                .collect();
            dirs.extend_from_slice(&preferred);
            dirs.extend_from_slice(&preferred);
            let Some(&dir) = a.rng.pick(&dirs) else {
                break;
            };
            path.push(pos.step(dir));
            pos = pos.step_by(dir, 2);
            path.push(pos);
        }
        if pos != end {
            continue;
        }
        for c in path {
            a.set(c, tag);
            if c.is_center() {
                a.count += 1;
            }
        }
        return true;
    }
    false
}

/// Open two dead ends into the same empty region and join them with a
/// new path, closing a loop.
pub fn try_add_loop(a: &mut Attempt, tag: Tag, attempts: usize) -> bool {
    let mut uf = UnionFind::new();
    for i in 0..a.grid.len() {
        let c = a.grid.coord(i);
        if !a.get(c).is_empty() || a.grid.is_border(c) {
            continue;
        }
        uf.find(c);
        if a.get(c.step(Dir::Right)).is_empty() {
            uf.union(c, c.step(Dir::Right));
        }
        if a.get(c.step(Dir::Down)).is_empty() {
            uf.union(c, c.step(Dir::Down));
        }
    }

    // region root -> (edge to open, empty center beyond it)
    let mut regions: Vec<(GridCoord, Vec<(GridCoord, GridCoord)>)> = Vec::new();
    for s in a.grid.screens() {
        let c = s.center();
        if a.get(c).is_empty() {
            continue;
        }
        for d in CONNECT_DIRS {
            let e1 = c.step(d);
            if a.grid.is_border(e1) || !a.get(e1).is_empty() || a.is_fixed(e1) {
                continue;
            }
            let e2 = c.step_by(d, 2);
            if !a.get(e2).is_empty() || a.is_fixed(e2) {
                continue;
            }
            if !a.has_screens(&a.extract_with(s, &single(e1, tag))) {
                continue;
            }
            let root = uf.find(e2);
            match regions.iter_mut().find(|(r, _)| *r == root) {
                Some((_, v)) => v.push((e1, e2)),
                None => regions.push((root, vec![(e1, e2)])),
            }
        }
    }
    // regions weighted by how many openings they offer
    let weighted: Vec<usize> = regions
        .iter()
        .enumerate()
        .filter(|(_, (_, v))| v.len() >= 2)
        .flat_map(|(i, (_, v))| core::iter::repeat(i).take(v.len()))
        .collect();
    if weighted.is_empty() {
        return false;
    }
    for _ in 0..attempts {
        let Some(&i) = a.rng.pick(&weighted) else {
            return false;
        };
        let picked = a.rng.ishuffle(&regions[i].1);
        let ((e0, c0), (e1, c1)) = (picked[0], picked[1]);
        a.set(e0, tag);
        a.set(e1, tag);
        if try_connect(a, c0, c1, tag, 5) {
            return true;
        }
        a.clear(e0);
        a.clear(e1);
    }
    false
}
