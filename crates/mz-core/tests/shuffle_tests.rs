use mz_core::catalog::synthetic::cave_catalog;
use mz_core::layout::Traverse;
use mz_core::shuffle::{
    Attempt, CaveShuffle, CaveStrategy, CryptEntranceShuffle, CycleCaveShuffle, LabyrinthShuffle, PairedShuffle,
    RiverCaveShuffle, SaberaPalaceShuffle, SwampShuffle, TightCycleCaveShuffle, WaterfallRiverCaveShuffle,
    WideCaveShuffle,
};
use mz_core::{
    FailureKind, GridCoord, Layout, MazeShuffle, MazeShuffles, ShuffleConfig, ShuffleRng, Survey, Tag, Tileset,
    Tuning,
};

fn survey(level: &str, height: usize, width: usize, size: usize) -> Survey {
    Survey {
        level: level.into(),
        height,
        width,
        size,
        ..Survey::default()
    }
}

#[test]
fn test_fill_and_refine_to_target() {
    let cat = cave_catalog();
    let ts = Tileset::new(&cat);
    let config = ShuffleConfig::default();
    let sv = survey("refine", 4, 4, 8);
    let s = CaveShuffle::new();
    let mut a = Attempt::with_shape(&sv, &ts, &config, s.tuning(), ShuffleRng::new(11), 4, 4, 8);
    s.initial_fill(&mut a).unwrap();
    assert_eq!(a.count, 16);
    s.refine(&mut a).unwrap();
    assert_eq!(a.count, 8);
    assert_eq!(a.grid.center_count(), 8);
    assert_eq!(a.grid.partition(None).component_count(), 1);
}

#[test]
fn test_exits_then_fixed_stair() {
    let cat = cave_catalog();
    let ts = Tileset::new(&cat);
    let config = ShuffleConfig::default();
    let mut sv = survey("exits", 3, 3, 9);
    sv.edges = [0, 1, 0, 1];
    sv.stairs = [1, 0];
    let s = CaveShuffle::new();
    let mut a = Attempt::with_shape(&sv, &ts, &config, s.tuning(), ShuffleRng::new(2), 3, 3, 9);
    s.initial_fill(&mut a).unwrap();
    s.add_edges(&mut a).unwrap();
    let exits: Vec<GridCoord> = a.grid.filled().into_iter().filter(|&c| a.grid.is_border(c)).collect();
    assert_eq!(exits.len(), 2);
    assert!(exits.iter().all(|&c| a.is_fixed(c)));

    s.add_stairs(&mut a, 1, 0).unwrap();
    let stairs: Vec<GridCoord> = a.grid.filled().into_iter().filter(|&c| a.get(c) == Tag::StairUp).collect();
    assert_eq!(stairs.len(), 1);
    assert!(a.is_fixed(stairs[0]));
    assert_eq!(a.count, 9);
}

#[test]
fn test_stuck_refine_leaves_grid_alone() {
    let cat = cave_catalog();
    let ts = Tileset::new(&cat);
    let config = ShuffleConfig::default();
    let sv = survey("stuck", 1, 3, 1);
    let s = CaveShuffle::new();
    let mut a = Attempt::with_shape(&sv, &ts, &config, s.tuning(), ShuffleRng::new(5), 1, 3, 1);
    a.grid.write_grid_2d(GridCoord(0), &["       ", " ccccc ", "       "]);
    a.recount();
    a.fix(GridCoord::center_of(0, 0));
    a.fix(GridCoord::center_of(0, 2));
    let before = a.grid.clone();

    let err = s.refine(&mut a).unwrap_err();
    assert_eq!(err.kind, FailureKind::Refine);
    assert_eq!(a.grid, before);
    assert_eq!(a.count, 3);
}

#[test]
fn test_same_seed_same_layout() {
    let cat = cave_catalog();
    let ts = Tileset::new(&cat);
    let mut sv = survey("seeded", 4, 4, 10);
    sv.edges = [1, 0, 1, 0];
    sv.stairs = [1, 1];
    let run = |seed| {
        let mut shuffle = MazeShuffle::new(Box::new(CaveShuffle::new()), sv.clone());
        let outcome = shuffle.shuffle(&ts, &mut ShuffleRng::new(seed)).unwrap();
        (outcome.layout.clone(), outcome.attempts)
    };
    assert_eq!(run(42), run(42));
    assert_eq!(run(7), run(7));
}

#[test]
fn test_outputs_match_survey() {
    let cat = cave_catalog();
    let ts = Tileset::new(&cat);
    let mut sv = survey("counts", 4, 5, 12);
    sv.edges = [0, 1, 0, 1];
    sv.stairs = [1, 1];
    sv.features.pit = 1;
    for seed in 0..5 {
        let mut shuffle = MazeShuffle::new(Box::new(CaveShuffle::new()), sv.clone());
        let outcome = shuffle.shuffle(&ts, &mut ShuffleRng::new(seed)).unwrap();
        let out = Survey::from_layout("counts", &outcome.layout, &ts, 0);
        assert_eq!(out.edges, sv.edges, "seed {seed}");
        assert_eq!(out.stairs, sv.stairs, "seed {seed}");
        assert_eq!(out.features.pit, 1, "seed {seed}");
        assert!(out.size >= sv.size, "seed {seed}: {} screens", out.size);
        assert!(out.height.abs_diff(sv.height) <= 1 && out.width.abs_diff(sv.width) <= 1);
    }
}

#[test]
fn test_outputs_are_connected() {
    let cat = cave_catalog();
    let ts = Tileset::new(&cat);
    let mut sv = survey("connected", 5, 4, 12);
    sv.edges = [1, 1, 1, 0];
    sv.stairs = [0, 1];
    for seed in 0..5 {
        let mut shuffle = MazeShuffle::new(Box::new(CaveShuffle::new()), sv.clone());
        let outcome = shuffle.shuffle(&ts, &mut ShuffleRng::new(seed)).unwrap();
        let parts = outcome.layout.traverse(&ts, Traverse::default(), None);
        assert_eq!(parts.component_count(), 1, "seed {seed}:\n{}", outcome.grid.show());
    }
}

/// Shuffle `sv` under every seed in `0..seeds`. Each result must be a
/// single piece even when flight is allowed.
fn shuffle_seeds(make: impl Fn() -> Box<dyn CaveStrategy>, sv: &Survey, seeds: u64) -> Vec<Layout> {
    let cat = cave_catalog();
    let ts = Tileset::new(&cat);
    let mut layouts = Vec::new();
    for seed in 0..seeds {
        let strategy = make();
        let name = strategy.name();
        let mut shuffle = MazeShuffle::new(strategy, sv.clone());
        let outcome = match shuffle.shuffle(&ts, &mut ShuffleRng::new(seed)) {
            Ok(outcome) => outcome,
            Err(err) => panic!("{name} seed {seed}: {err}"),
        };
        let parts = outcome.layout.traverse(&ts, Traverse::flight(), None);
        assert_eq!(
            parts.component_count(),
            1,
            "{name} seed {seed} split:\n{}",
            outcome.grid.show()
        );
        assert_eq!(outcome.grid.partition(None).component_count(), 1, "{name} seed {seed}");
        layouts.push(outcome.layout.clone());
    }
    layouts
}

/// Survey counts of a shuffled layout.
fn counts(layout: &Layout) -> Survey {
    let cat = cave_catalog();
    let ts = Tileset::new(&cat);
    Survey::from_layout("out", layout, &ts, 0)
}

#[test]
fn test_opposite_exits_never_split() {
    // two rows once the height shrinks, with the exits stacked above each other
    let mut sv = survey("stacked", 3, 4, 9);
    sv.edges = [1, 0, 1, 0];
    sv.stairs = [0, 1];
    shuffle_seeds(|| Box::new(CaveShuffle::new()), &sv, 40);
    shuffle_seeds(|| Box::new(WideCaveShuffle::new()), &sv, 40);

    let mut narrow = survey("narrow", 2, 1, 2);
    narrow.edges = [1, 0, 1, 0];
    shuffle_seeds(|| Box::new(CaveShuffle::new()), &narrow, 25);
}

#[test]
fn test_cycle_strategies_stay_connected() {
    let mut sv = survey("cycle", 4, 4, 12);
    sv.edges = [0, 1, 0, 1];
    shuffle_seeds(|| Box::new(CycleCaveShuffle::new()), &sv, 25);
    shuffle_seeds(|| Box::new(TightCycleCaveShuffle::new()), &sv, 25);
}

#[test]
fn test_wide_strategy_stays_connected() {
    let mut sv = survey("wide", 3, 4, 9);
    sv.edges = [1, 0, 1, 0];
    sv.stairs = [0, 1];
    shuffle_seeds(|| Box::new(WideCaveShuffle::new()), &sv, 25);
}

#[test]
fn test_crypt_strategy_stays_connected() {
    let mut sv = survey("crypt", 4, 4, 10);
    sv.edges = [0, 0, 1, 0];
    sv.features.arena = 1;
    shuffle_seeds(|| Box::new(CryptEntranceShuffle::new()), &sv, 25);
}

#[test]
fn test_river_strategies_stay_connected() {
    let mut sv = survey("river", 4, 4, 12);
    sv.edges = [0, 1, 0, 1];
    sv.features.river = 4;
    shuffle_seeds(|| Box::new(RiverCaveShuffle::new()), &sv, 25);

    let mut falls = survey("falls", 4, 6, 16);
    falls.stairs = [0, 2];
    falls.features.river = 5;
    shuffle_seeds(|| Box::new(WaterfallRiverCaveShuffle::new()), &falls, 25);
}

#[test]
fn test_palace_stays_connected() {
    let mut sv = survey("palace", 4, 4, 12);
    sv.stairs = [0, 1];
    sv.features.arena = 1;
    for layout in shuffle_seeds(|| Box::new(SaberaPalaceShuffle::new()), &sv, 25) {
        let out = counts(&layout);
        assert_eq!(out.features.arena, 1);
        assert_eq!(out.stairs, [0, 1]);
    }
}

#[test]
fn test_labyrinth_stays_connected() {
    let mut sv = survey("labyrinth", 5, 4, 8);
    sv.stairs = [0, 1];
    sv.features.arena = 1;
    for layout in shuffle_seeds(|| Box::new(LabyrinthShuffle::new()), &sv, 25) {
        let out = counts(&layout);
        assert_eq!(out.features.arena, 1);
        assert_eq!(out.stairs, [0, 1]);
        assert!(out.size >= 8);
    }
}

#[test]
fn test_swamp_stays_connected() {
    let mut sv = survey("swamp", 4, 5, 20);
    sv.edges = [0, 1, 0, 1];
    sv.stairs = [1, 0];
    sv.features.arena = 1;
    for layout in shuffle_seeds(|| Box::new(SwampShuffle::new()), &sv, 25) {
        let out = counts(&layout);
        assert_eq!(out.features.arena, 1);
        assert_eq!(out.edges, [0, 1, 0, 1]);
        assert_eq!(out.stairs, [1, 0]);
    }
}

#[test]
fn test_walls_match_survey() {
    let mut sv = survey("walls", 4, 4, 10);
    sv.edges = [1, 0, 1, 0];
    sv.features.wall = 1;
    for layout in shuffle_seeds(|| Box::new(CaveShuffle::new()), &sv, 15) {
        assert_eq!(counts(&layout).features.wall, 1);
    }
}

#[test]
fn test_arenas_match_survey() {
    let mut sv = survey("arenas", 4, 4, 10);
    sv.edges = [0, 0, 1, 0];
    sv.features.arena = 1;
    for layout in shuffle_seeds(|| Box::new(CaveShuffle::new()), &sv, 15) {
        assert_eq!(counts(&layout).features.arena, 1);
    }
}

#[test]
fn test_bridges_match_survey() {
    let mut sv = survey("bridges", 4, 4, 12);
    sv.edges = [0, 1, 0, 1];
    sv.features.river = 4;
    sv.features.bridge = 1;
    for layout in shuffle_seeds(|| Box::new(RiverCaveShuffle::new()), &sv, 15) {
        let out = counts(&layout);
        assert_eq!(out.features.bridge, 1);
        assert!(out.features.river >= 1);
    }

    // both refinements on one river level
    sv.features.wall = 1;
    for layout in shuffle_seeds(|| Box::new(RiverCaveShuffle::new()), &sv, 10) {
        let out = counts(&layout);
        assert_eq!((out.features.bridge, out.features.wall), (1, 1));
    }
}

#[test]
fn test_paired_levels_link_stairs() {
    let cat = cave_catalog();
    let ts = Tileset::new(&cat);
    let mut under = survey("under", 4, 4, 11);
    under.edges = [0, 1, 0, 0];
    under.stairs = [1, 0];
    under.features.under = 1;
    let mut over = survey("over", 4, 4, 11);
    over.edges = [0, 0, 0, 1];
    over.stairs = [0, 1];
    over.features.over = 1;

    let paired = PairedShuffle::new(
        MazeShuffle::new(Box::new(CaveShuffle::new()), under),
        Box::new(CaveShuffle::new()),
        over,
    );
    let outcome = paired.shuffle(&ts, &mut ShuffleRng::new(9)).unwrap();
    assert_eq!(outcome.over.stair_links.len(), 1);
    let (over_pos, under_pos) = outcome.over.stair_links[0];
    assert_eq!(outcome.under.grid.get(under_pos.to_grid().center()), Tag::StairUp);
    assert_eq!(outcome.over.grid.get(over_pos.to_grid().center()), Tag::StairDown);
}

#[test]
fn test_batch_reports_every_level() {
    let cat = cave_catalog();
    let ts = Tileset::new(&cat);
    let mut a = survey("first", 3, 3, 6);
    a.edges = [1, 0, 1, 0];
    let mut b = survey("second", 3, 4, 8);
    b.stairs = [1, 1];
    let mut batch = MazeShuffles::new();
    batch.add(MazeShuffle::new(Box::new(CaveShuffle::new()), a));
    batch.add(MazeShuffle::new(Box::new(CaveShuffle::with_tuning(Tuning::default())), b));
    let errors = batch.shuffle_all(&ts, &mut ShuffleRng::new(4));
    assert!(errors.is_empty(), "{errors:?}");
    assert!(batch.iter().all(|s| s.outcome().is_some()));
    let report = batch.to_string();
    assert_eq!(report.lines().count(), 2);
    assert!(report.contains("CaveShuffle(first)"));
}
