//! Integration tests for full cave generation through the public API.

use delve::{
    dispatch, generate_cave, plan_placements, CaveConfig, CaveGenerator, CaveManager, CavePhase,
    DelveResult, EntityFactory, EntityKind, FeatureKind, Generator, ParameterPools, Path,
    PathParameters, PlacementRules, PoolLevel, Position, RandomKnob,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeSet, HashMap};

#[test]
fn test_same_seed_same_cave() -> DelveResult<()> {
    let pools = ParameterPools::default();
    for seed in [0, 17, 9001] {
        let first = generate_cave(Position::new(10, 10), &pools, seed)?;
        let second = generate_cave(Position::new(10, 10), &pools, seed)?;
        assert_eq!(first, second);
        assert_eq!(first.to_json()?, second.to_json()?);
    }
    Ok(())
}

#[test]
fn test_different_seeds_differ() -> DelveResult<()> {
    let pools = ParameterPools::default();
    let first = generate_cave(Position::origin(), &pools, 1)?;
    let second = generate_cave(Position::origin(), &pools, 2)?;
    assert_ne!(first.floor_tiles, second.floor_tiles);
    Ok(())
}

#[test]
fn test_straight_corridor_scenario() -> DelveResult<()> {
    let pools = ParameterPools::single_level(PathParameters::straight(10.0));
    let cave = generate_cave(Position::origin(), &pools, 123)?;

    let expected: BTreeSet<Position> = (0..10).map(|x| Position::new(x, 0)).collect();
    assert_eq!(cave.floor_tiles, expected);
    assert!(cave.features.is_empty());
    assert!(cave.inflection_tiles.is_empty());
    assert!(cave.bottleneck_regions.is_empty());
    assert_eq!(cave.pool_levels, vec![PoolLevel::Essential]);
    Ok(())
}

#[test]
fn test_root_tile_is_floor() -> DelveResult<()> {
    let pools = ParameterPools::default();
    for seed in 0..10 {
        let root = Position::new(seed as i32 * 3 - 12, 7);
        let cave = generate_cave(root, &pools, seed)?;
        assert!(cave.is_floor(root));
        assert_eq!(cave.root_position, root);
    }
    Ok(())
}

#[test]
fn test_default_caves_are_connected() -> DelveResult<()> {
    let pools = ParameterPools::default();
    for seed in 0..10 {
        let cave = generate_cave(Position::origin(), &pools, seed)?;
        assert!(cave.is_connected(), "seed {} produced a disconnected cave", seed);
    }
    Ok(())
}

/// Shallowest level of any fork point in the tree, keyed by tile.
fn shallowest_fork_levels(path: &Path, levels: &mut HashMap<Position, usize>) {
    for fork in path.fork_points() {
        let level = levels.entry(fork.point.to_grid()).or_insert(path.level());
        *level = (*level).min(path.level());
    }
    for child in path.forks() {
        shallowest_fork_levels(child, levels);
    }
}

#[test]
fn test_forks_never_inside_shallower_bottlenecks() -> DelveResult<()> {
    let trunk = PathParameters {
        inflection_rate: 0.3,
        bottleneck_rate: 0.1,
        fork_number: 4.0,
        bottleneck: RandomKnob::fixed(3),
        ..PathParameters::essential()
    };
    let branch = PathParameters {
        inflection_rate: 0.3,
        bottleneck_rate: 0.1,
        fork_number: 3.0,
        bottleneck: RandomKnob::fixed(2),
        ..PathParameters::major()
    };
    let pools = ParameterPools {
        essential: vec![trunk],
        major: vec![branch],
        major_level_chance: 1.0,
        minor_level_chance: 1.0,
        ..ParameterPools::default()
    };

    let mut deeper_regions = 0;
    let mut forks_checked = 0;
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut manager = CaveManager::new(Position::origin(), pools.clone());
        manager.run(&mut rng)?;
        let mut fork_levels = HashMap::new();
        if let Some(tree) = manager.path_tree() {
            shallowest_fork_levels(tree, &mut fork_levels);
        }
        let cave = manager.into_result()?;
        deeper_regions += cave
            .bottleneck_regions
            .iter()
            .filter(|region| region.level > 0)
            .count();

        // A fork recorded at level k was checked against every region of
        // level k or shallower
        for fork in cave.features_of(FeatureKind::Fork) {
            forks_checked += 1;
            let level = fork_levels[&fork];
            for region in cave.bottleneck_regions.iter().filter(|r| r.level <= level) {
                assert!(
                    !region.bounds.contains(fork),
                    "seed {}: level {} fork at {:?} inside a level {} bottleneck region",
                    seed,
                    level,
                    fork,
                    region.level
                );
            }
        }
    }
    assert!(forks_checked > 0);
    assert!(deeper_regions > 0);
    Ok(())
}

#[test]
fn test_features_lie_on_floor() -> DelveResult<()> {
    let pools = ParameterPools::default();
    for seed in 0..10 {
        let cave = generate_cave(Position::origin(), &pools, seed)?;
        for pos in cave.features.keys() {
            assert!(cave.is_floor(*pos));
        }
        for pos in cave.inflection_tiles.iter().chain(&cave.zero_choke_tiles) {
            assert!(cave.is_floor(*pos));
        }
    }
    Ok(())
}

#[test]
fn test_path_tree_depth_follows_levels() -> DelveResult<()> {
    let pools = ParameterPools {
        major_level_chance: 1.0,
        minor_level_chance: 1.0,
        ..ParameterPools::default()
    };
    let mut rng = StdRng::seed_from_u64(31);
    let mut manager = CaveManager::new(Position::origin(), pools);
    manager.choose_parameters(&mut rng)?;
    assert_eq!(manager.level_parameters().len(), 3);
    manager.build_path_tree(&mut rng)?;

    let tree: &Path = manager.path_tree().expect("tree is built");
    assert!(tree.depth() <= delve::config::MAX_CAVE_DEPTH);
    for (_, child) in tree.branches() {
        assert_eq!(child.level(), 1);
        for grandchild in child.forks() {
            assert_eq!(grandchild.level(), 2);
            assert!(grandchild.forks().is_empty());
        }
    }
    Ok(())
}

#[test]
fn test_manager_and_generator_agree() -> DelveResult<()> {
    let config = CaveConfig::new(55);
    let mut rng = StdRng::seed_from_u64(55);
    let from_generator = CaveGenerator::new().generate(&config, &mut rng)?;
    let from_function = generate_cave(config.root_position, &config.pools, 55)?;
    assert_eq!(from_generator, from_function);

    let mut manager = CaveManager::new(config.root_position, config.pools.clone());
    assert_eq!(manager.phase(), CavePhase::Unconfigured);
    manager.run(&mut StdRng::seed_from_u64(55))?;
    assert_eq!(manager.into_result()?.floor_tiles, from_function.floor_tiles);
    Ok(())
}

#[derive(Default)]
struct TileCounter {
    floors: usize,
    others: usize,
}

impl EntityFactory for TileCounter {
    fn place_entity(&mut self, kind: EntityKind, _position: Position) -> DelveResult<()> {
        if kind == EntityKind::Floor {
            self.floors += 1;
        } else {
            self.others += 1;
        }
        Ok(())
    }
}

#[test]
fn test_placement_dispatch_end_to_end() -> DelveResult<()> {
    let cave = generate_cave(Position::origin(), &ParameterPools::default(), 77)?;
    let mut rng = StdRng::seed_from_u64(77);
    let commands = plan_placements(&cave, &PlacementRules::default(), &mut rng)?;

    let mut counter = TileCounter::default();
    dispatch(&commands, &mut counter)?;
    assert_eq!(counter.floors, cave.floor_tiles.len());
    assert_eq!(counter.floors + counter.others, commands.len());
    Ok(())
}
