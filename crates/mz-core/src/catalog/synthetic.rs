//! A synthetic cave catalog
//!
//! Enough screens to drive every shuffle strategy without real game data:
//! caves, wide halls, stairs, arenas, spikes, ramps, pits, bridges and
//! rivers, plus the block, bridge and wall variants the layout refinement
//! swaps in. Screens are generated from edge-tag combinations, so the
//! catalog is exhaustive for the tags it covers.

#[cfg(not(feature = "std"))]
use crate::compat::*;

use super::{Connection, Features, MemoryCatalog, Passage, Screen, ScreenMod};
use crate::maze::{Dir, Tag, Tile};

const E: Tag = Tag::Empty;
const C: Tag = Tag::Cave;
const W: Tag = Tag::Wide;
const N: Tag = Tag::Narrow;
const R: Tag = Tag::River;

/// Screen placed on every arena of a crypt entrance.
pub const CRYPT_ARENA: &str = "crypt_arena_statues";
/// Screen placed on the arena of a palace shuffle.
pub const FORTRESS_ARENA: &str = "fortress_arena_through";

fn tile(center: Tag, edges: [Tag; 4]) -> Tile {
    let mut t = Tile::default().with_center(center);
    for dir in Dir::ALL {
        t = t.with(dir.tile_index(), edges[dir.index()]);
    }
    t
}

/// Every edge assignment drawing side `d` from `options[d]`.
fn combos(options: [&[Tag]; 4]) -> Vec<[Tag; 4]> {
    let mut out = vec![[E; 4]];
    for dir in Dir::ALL {
        let mut next = Vec::with_capacity(out.len() * options[dir.index()].len());
        for edges in &out {
            for &t in options[dir.index()] {
                let mut e = *edges;
                e[dir.index()] = t;
                next.push(e);
            }
        }
        out = next;
    }
    out
}

fn degree(edges: &[Tag; 4]) -> usize {
    edges.iter().filter(|t| !t.is_empty()).count()
}

fn name(prefix: &str, edges: &[Tag; 4]) -> String {
    let mut s = String::from(prefix);
    s.push('_');
    for e in edges {
        s.push(if e.is_empty() { '_' } else { e.as_char() });
    }
    s
}

fn open_dirs(edges: &[Tag; 4], keep: impl Fn(Tag) -> bool) -> Vec<Dir> {
    Dir::ALL
        .into_iter()
        .filter(|d| keep(edges[d.index()]))
        .collect()
}

/// Build the catalog.
pub fn cave_catalog() -> MemoryCatalog {
    let mut cat = MemoryCatalog::new();
    cat.push(Screen::new("empty", Tile::default()));

    // Dangling edges left behind by refinement, each its own dead end.
    for edges in [[C, E, E, E], [E, E, C, E], [E, C, E, E], [E, E, E, C], [C, E, C, E], [E, C, E, C]] {
        let conns = open_dirs(&edges, |t| !t.is_empty())
            .into_iter()
            .map(|d| Connection::open(&[d]))
            .collect();
        cat.push(Screen::new(name("stub", &edges), tile(E, edges)).with_connections(conns));
    }

    for edges in combos([&[E, C], &[E, C], &[E, C, N], &[E, C]]) {
        let mut s = Screen::new(name("cave", &edges), tile(C, edges));
        if degree(&edges) == 1 {
            s = s.with_features(Features::DEADEND);
        }
        cat.push(s);
    }
    for edges in [[C, E, C, E], [E, C, E, C]] {
        let conns = vec![Connection::open(&open_dirs(&edges, |t| !t.is_empty()))
            .with_passage(Passage::Flagged)];
        cat.push(
            Screen::new(name("cave_wall", &edges), tile(C, edges))
                .with_features(Features::WALL)
                .with_mod(ScreenMod::Wall)
                .with_connections(conns),
        );
    }
    cat.push(
        Screen::new("cave_block_cccc", tile(C, [C; 4]))
            .with_mod(ScreenMod::Block)
            .with_connections(vec![
                Connection::open(&[Dir::Up, Dir::Left]),
                Connection::open(&[Dir::Down, Dir::Right]),
            ]),
    );

    for edges in combos([&[E, W, N], &[E, W, C], &[E, W, N], &[E, W, C]]) {
        cat.push(Screen::new(name("wide", &edges), tile(W, edges)).with_features(Features::WIDE));
    }

    for (stair, feature, prefix) in [
        (Tag::StairUp, Features::STAIR_UP, "stair_up"),
        (Tag::StairDown, Features::STAIR_DOWN, "stair_down"),
    ] {
        for kind in [C, W] {
            for edges in combos([&[E, kind], &[E, kind], &[E, kind], &[E, kind]]) {
                if !(1..=2).contains(&degree(&edges)) {
                    continue;
                }
                cat.push(Screen::new(name(prefix, &edges), tile(stair, edges)).with_features(feature));
            }
        }
    }

    for edges in combos([&[E, C, N, W], &[E], &[E, C, W, N], &[E]]) {
        if degree(&edges) == 0 {
            continue;
        }
        cat.push(Screen::new(name("arena", &edges), tile(Tag::Arena, edges)).with_features(Features::ARENA));
    }

    for edges in combos([&[C, Tag::Spikes], &[E, C], &[C, Tag::Spikes], &[E, C]]) {
        cat.push(Screen::new(name("spikes", &edges), tile(Tag::Spikes, edges)).with_features(Features::SPIKES));
    }

    for edges in combos([&[E, C], &[E], &[E, C], &[E]]) {
        if degree(&edges) == 0 {
            continue;
        }
        cat.push(Screen::new(name("ramp", &edges), tile(Tag::Ramp, edges)).with_features(Features::RAMP));
    }

    for edges in combos([&[E, C], &[E, C], &[E, C], &[E, C]]) {
        if degree(&edges) == 0 {
            continue;
        }
        cat.push(Screen::new(name("pit", &edges), tile(Tag::Pit, edges)).with_features(Features::PIT));
    }

    for edges in combos([&[E, C], &[E], &[E, C], &[E]]) {
        if degree(&edges) == 0 {
            continue;
        }
        cat.push(Screen::new(name("overpass", &edges), tile(Tag::Bridge, edges)).with_features(Features::OVERPASS));
    }
    for edges in combos([&[E], &[E, C], &[E], &[E, C]]) {
        if degree(&edges) == 0 {
            continue;
        }
        cat.push(Screen::new(name("underpass", &edges), tile(Tag::Bridge, edges)).with_features(Features::UNDERPASS));
    }

    add_rivers(&mut cat);

    cat.push(
        Screen::named(CRYPT_ARENA, [E, E, C, E])
            .with_features(Features::ARENA)
            .with_mod(ScreenMod::Block)
            .with_statues(2),
    );
    cat.push(Screen::named(FORTRESS_ARENA, [C, E, W, E]).with_features(Features::ARENA));
    cat
}

/// River screens: the river runs along the masked edges, land edges sit on
/// the remaining sides and are grouped by the bank they lie on.
fn add_rivers(cat: &mut MemoryCatalog) {
    const MASKS: [u8; 11] = [1, 2, 4, 8, 5, 10, 3, 6, 9, 12, 15];
    for mask in MASKS {
        let land: Vec<Dir> = Dir::ALL.into_iter().filter(|d| mask & d.bit() == 0).collect();
        const RIVER: &[Tag] = &[R];
        const LAND: &[Tag] = &[E, C];
        let mut land_options: [&[Tag]; 4] = [RIVER; 4];
        for d in &land {
            land_options[d.index()] = LAND;
        }
        for edges in combos(land_options) {
            let banks = banks(mask, &edges);
            let mut conns = vec![Connection::open(&open_dirs(&edges, |t| !t.is_empty()))
                .with_passage(Passage::Flight)];
            let straight = mask == 5 || mask == 10;
            let both_banks = straight && banks.len() == 2;
            if both_banks {
                let all_land = open_dirs(&edges, |t| t == C);
                let mut bridged = conns.clone();
                bridged.push(Connection::open(&all_land));
                cat.push(
                    Screen::new(name("river_bridge", &edges), tile(R, edges))
                        .with_features(Features::RIVER | Features::BRIDGE)
                        .with_connections(bridged),
                );
            }
            conns.extend(banks.iter().map(|b| Connection::open(b)));
            let mut s = Screen::new(name("river", &edges), tile(R, edges))
                .with_features(Features::RIVER)
                .with_connections(conns);
            if both_banks {
                s = s.with_mod(ScreenMod::Bridge);
            }
            cat.push(s);
        }
    }
}

/// Land edges split into banks by the river through the center.
fn banks(mask: u8, edges: &[Tag; 4]) -> Vec<Vec<Dir>> {
    let land = |d: Dir| edges[d.index()] == C;
    let mut out: Vec<Vec<Dir>> = Vec::new();
    match mask {
        // a straight river separates the two sides
        5 | 10 => {
            for d in Dir::ALL {
                if land(d) {
                    out.push(vec![d]);
                }
            }
        }
        // bends and river ends leave a single bank
        _ => {
            let bank: Vec<Dir> = Dir::ALL.into_iter().filter(|&d| land(d)).collect();
            if !bank.is_empty() {
                out.push(bank);
            }
        }
    }
    out
}
