//! # Generation Module
//!
//! Procedural cave generation: parameter knobs, recursive path growth,
//! rasterization into tiles and entity placement planning.
//!
//! Every generator draws from a single seeded [`StdRng`] so a cave can be replayed
//! from its seed.

pub mod cave;
pub mod knob;
pub mod parameters;
pub mod path;
pub mod placement;

pub use cave::*;
pub use knob::*;
pub use parameters::*;
pub use path::*;
pub use placement::*;

use crate::utils::Position;
use crate::{DelveError, DelveResult};
use log::info;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::Path as FilePath;

/// Configuration for procedural generation.
///
/// Loaded once before generation, typically from a JSON file. A missing seed
/// is drawn at generation time and logged so the run can be replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaveConfig {
    /// Random seed for reproducible generation
    #[serde(default)]
    pub seed: Option<u64>,
    /// Tile the essential path starts on
    #[serde(default)]
    pub root_position: Position,
    /// Parameter candidates per level
    #[serde(default)]
    pub pools: ParameterPools,
    /// Decoration rules for the placement pass
    #[serde(default)]
    pub placement: PlacementRules,
}

impl CaveConfig {
    /// Creates a default generation configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::CaveConfig;
    ///
    /// let config = CaveConfig::new(12345);
    /// assert_eq!(config.seed, Some(12345));
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            root_position: Position::origin(),
            pools: ParameterPools::default(),
            placement: PlacementRules::default(),
        }
    }

    /// Creates a configuration for testing with small, single-level caves.
    pub fn for_testing(seed: u64) -> Self {
        let trunk = PathParameters {
            length: 20.0,
            chamber_number: 1.0,
            fork_number: 0.0,
            ..PathParameters::essential()
        };
        Self {
            seed: Some(seed),
            root_position: Position::origin(),
            pools: ParameterPools::single_level(trunk),
            placement: PlacementRules::default(),
        }
    }

    /// Parses a configuration from JSON.
    pub fn from_json_str(json: &str) -> DelveResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file.
    pub fn load<P: AsRef<FilePath>>(path: P) -> DelveResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serializes the configuration to pretty JSON.
    pub fn to_json(&self) -> DelveResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks the pools and placement rules.
    pub fn validate(&self) -> DelveResult<()> {
        self.pools.validate()?;
        self.placement.validate()
    }

    /// The configured seed, or a fresh one drawn from entropy.
    pub fn resolve_seed(&self) -> u64 {
        match self.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random();
                info!("no seed configured, using {}", seed);
                seed
            }
        }
    }
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_SEED)
    }
}

/// Trait for procedural generators.
///
/// Generators take their configuration and the cave's single random number
/// generator, so output depends only on the seed and the configuration.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &CaveConfig, rng: &mut StdRng) -> DelveResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &CaveConfig) -> DelveResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Generates caves through a [`CaveManager`].
#[derive(Debug, Clone, Default)]
pub struct CaveGenerator {
    /// Reject caves whose floor is not a single connected region
    pub require_connectivity: bool,
}

impl CaveGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator that also rejects disconnected caves.
    pub fn strict() -> Self {
        Self {
            require_connectivity: true,
        }
    }
}

impl Generator<CaveResult> for CaveGenerator {
    fn generate(&self, config: &CaveConfig, rng: &mut StdRng) -> DelveResult<CaveResult> {
        config.validate()?;
        let mut manager = CaveManager::new(config.root_position, config.pools.clone());
        if let Some(seed) = config.seed {
            manager = manager.with_seed(seed);
        }
        manager.run(rng)?;
        let cave = manager.into_result()?;
        self.validate(&cave, config)?;
        Ok(cave)
    }

    fn validate(&self, cave: &CaveResult, config: &CaveConfig) -> DelveResult<()> {
        if cave.floor_tiles.is_empty() {
            return Err(DelveError::GenerationFailed(
                "Cave has no floor tiles".to_string(),
            ));
        }
        if !cave.is_floor(config.root_position) {
            return Err(DelveError::GenerationFailed(format!(
                "Root position {:?} is not on the floor",
                config.root_position
            )));
        }
        if self.require_connectivity && !cave.is_connected() {
            return Err(DelveError::GenerationFailed(
                "Cave floor is not connected".to_string(),
            ));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "CaveGenerator"
    }
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;
    use rand::SeedableRng;

    /// Creates a seeded random number generator from the config, drawing and
    /// logging a seed when none is configured.
    pub fn create_rng(config: &CaveConfig) -> StdRng {
        seeded_rng(config.resolve_seed())
    }

    /// Creates a random number generator from an explicit seed.
    pub fn seeded_rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }
}
