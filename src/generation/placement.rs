//! # Entity Placement
//!
//! Turns a finished [`CaveResult`] into placement commands for whatever
//! creates entities downstream. Planning is pure; only [`dispatch`] touches the
//! outside world.

use crate::generation::{CaveResult, FeatureKind};
use crate::utils::Position;
use crate::{DelveError, DelveResult};
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Kinds of entity a placement command can spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Floor,
    Obstacle,
    Enemy,
    Chest,
}

impl EntityKind {
    /// Whether the entity stops movement through its tile.
    ///
    /// Blocking entities are kept off single-file corridors and bottleneck
    /// regions so the cave stays traversable.
    pub fn is_blocking(&self) -> bool {
        matches!(self, EntityKind::Obstacle | EntityKind::Enemy)
    }
}

/// Spawn chances for the decoration pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRules {
    /// Chance of a chest on each chamber tile
    #[serde(default)]
    pub chest_chance: f64,
    /// Chance of an enemy guarding each fork tile
    #[serde(default)]
    pub fork_enemy_chance: f64,
    /// Chance of an obstacle on any other open floor tile
    #[serde(default)]
    pub obstacle_density: f64,
    /// Chance of an enemy on any other open floor tile
    #[serde(default)]
    pub enemy_density: f64,
}

impl PlacementRules {
    /// Rules that only lay down floor.
    pub fn floor_only() -> Self {
        Self {
            chest_chance: 0.0,
            fork_enemy_chance: 0.0,
            obstacle_density: 0.0,
            enemy_density: 0.0,
        }
    }

    /// Checks that every chance is a probability.
    pub fn validate(&self) -> DelveResult<()> {
        for (name, chance) in [
            ("chest_chance", self.chest_chance),
            ("fork_enemy_chance", self.fork_enemy_chance),
            ("obstacle_density", self.obstacle_density),
            ("enemy_density", self.enemy_density),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(DelveError::InvalidParameters(format!(
                    "{name} must be in [0, 1], got {chance}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for PlacementRules {
    fn default() -> Self {
        Self {
            chest_chance: 0.75,
            fork_enemy_chance: 0.5,
            obstacle_density: 0.03,
            enemy_density: 0.02,
        }
    }
}

/// Request to spawn one entity on one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacementCommand {
    pub kind: EntityKind,
    pub position: Position,
}

/// Creates entities from placement commands.
pub trait EntityFactory {
    /// Spawns an entity of `kind` at `position`.
    fn place_entity(&mut self, kind: EntityKind, position: Position) -> DelveResult<()>;
}

/// Plans every entity for a finished cave.
///
/// Each floor tile gets a [`EntityKind::Floor`] command, in tile order. Chamber
/// centers may get a chest, fork tiles an enemy, and the remaining open tiles an
/// obstacle or an enemy. Blocking kinds never land on a zero-choke tile or
/// inside a bottleneck region.
pub fn plan_placements<R: Rng + ?Sized>(
    cave: &CaveResult,
    rules: &PlacementRules,
    rng: &mut R,
) -> DelveResult<Vec<PlacementCommand>> {
    rules.validate()?;

    let mut commands: Vec<PlacementCommand> = cave
        .floor_tiles
        .iter()
        .map(|&position| PlacementCommand {
            kind: EntityKind::Floor,
            position,
        })
        .collect();

    for &position in &cave.floor_tiles {
        if position == cave.root_position {
            continue;
        }
        let open = !cave.zero_choke_tiles.contains(&position)
            && !cave.in_bottleneck_region(position);
        let kind = match cave.feature_at(position) {
            Some(FeatureKind::Chamber) => {
                rng.gen_bool(rules.chest_chance).then_some(EntityKind::Chest)
            }
            Some(FeatureKind::Fork) => {
                rng.gen_bool(rules.fork_enemy_chance).then_some(EntityKind::Enemy)
            }
            Some(FeatureKind::Bottleneck) => None,
            None => {
                let roll: f64 = rng.gen();
                if roll < rules.obstacle_density {
                    Some(EntityKind::Obstacle)
                } else if roll < rules.obstacle_density + rules.enemy_density {
                    Some(EntityKind::Enemy)
                } else {
                    None
                }
            }
        };

        match kind {
            Some(kind) if kind.is_blocking() && !open => {}
            Some(kind) => commands.push(PlacementCommand { kind, position }),
            None => {}
        }
    }

    debug!(
        "planned {} placements over {} floor tiles",
        commands.len(),
        cave.floor_tiles.len()
    );
    Ok(commands)
}

/// Hands every command to the factory in order, stopping at the first failure.
pub fn dispatch<F: EntityFactory + ?Sized>(
    commands: &[PlacementCommand],
    factory: &mut F,
) -> DelveResult<()> {
    for command in commands {
        factory.place_entity(command.kind, command.position)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{generate_cave, ParameterPools, PathParameters};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[derive(Default)]
    struct RecordingFactory {
        placed: Vec<(EntityKind, Position)>,
    }

    impl EntityFactory for RecordingFactory {
        fn place_entity(&mut self, kind: EntityKind, position: Position) -> DelveResult<()> {
            self.placed.push((kind, position));
            Ok(())
        }
    }

    struct FailingFactory;

    impl EntityFactory for FailingFactory {
        fn place_entity(&mut self, _kind: EntityKind, _position: Position) -> DelveResult<()> {
            Err(DelveError::GenerationFailed("factory offline".to_string()))
        }
    }

    #[test]
    fn test_blocking_kinds() {
        assert!(EntityKind::Obstacle.is_blocking());
        assert!(EntityKind::Enemy.is_blocking());
        assert!(!EntityKind::Floor.is_blocking());
        assert!(!EntityKind::Chest.is_blocking());
    }

    #[test]
    fn test_floor_only_rules() {
        let cave = generate_cave(Position::origin(), &ParameterPools::default(), 5).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let commands = plan_placements(&cave, &PlacementRules::floor_only(), &mut rng).unwrap();
        assert_eq!(commands.len(), cave.floor_tiles.len());
        assert!(commands.iter().all(|c| c.kind == EntityKind::Floor));
    }

    #[test]
    fn test_blocking_entities_avoid_protected_tiles() {
        let rules = PlacementRules {
            chest_chance: 1.0,
            fork_enemy_chance: 1.0,
            obstacle_density: 0.5,
            enemy_density: 0.5,
        };
        for seed in 0..5 {
            let cave = generate_cave(Position::origin(), &ParameterPools::default(), seed).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let commands = plan_placements(&cave, &rules, &mut rng).unwrap();
            for command in commands.iter().filter(|c| c.kind.is_blocking()) {
                assert!(!cave.zero_choke_tiles.contains(&command.position));
                assert!(!cave.in_bottleneck_region(command.position));
                assert_ne!(command.position, cave.root_position);
            }
        }
    }

    #[test]
    fn test_chests_in_chambers() {
        let params = PathParameters {
            inflection_rate: 1.0,
            chamber_number: 4.0,
            chamber: crate::generation::RandomKnob::fixed(2),
            ..PathParameters::straight(20.0)
        };
        let cave =
            generate_cave(Position::origin(), &ParameterPools::single_level(params), 9).unwrap();
        let rules = PlacementRules {
            chest_chance: 1.0,
            ..PlacementRules::floor_only()
        };
        let mut rng = StdRng::seed_from_u64(9);
        let commands = plan_placements(&cave, &rules, &mut rng).unwrap();

        let chests: HashSet<Position> = commands
            .iter()
            .filter(|c| c.kind == EntityKind::Chest)
            .map(|c| c.position)
            .collect();
        let chambers: HashSet<Position> = cave
            .features_of(FeatureKind::Chamber)
            .filter(|&pos| pos != cave.root_position)
            .collect();
        assert!(!chambers.is_empty());
        assert_eq!(chests, chambers);
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let cave = generate_cave(Position::origin(), &ParameterPools::default(), 1).unwrap();
        let rules = PlacementRules {
            enemy_density: 1.5,
            ..PlacementRules::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(plan_placements(&cave, &rules, &mut rng).is_err());
    }

    #[test]
    fn test_dispatch() {
        let commands = vec![
            PlacementCommand {
                kind: EntityKind::Floor,
                position: Position::new(0, 0),
            },
            PlacementCommand {
                kind: EntityKind::Chest,
                position: Position::new(0, 0),
            },
        ];
        let mut factory = RecordingFactory::default();
        dispatch(&commands, &mut factory).unwrap();
        assert_eq!(
            factory.placed,
            vec![
                (EntityKind::Floor, Position::new(0, 0)),
                (EntityKind::Chest, Position::new(0, 0))
            ]
        );

        assert!(dispatch(&commands, &mut FailingFactory).is_err());
    }
}
