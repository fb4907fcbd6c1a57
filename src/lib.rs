//! # Delve
//!
//! Procedural cave generation for a 2D action roguelike.
//!
//! ## Architecture Overview
//!
//! A cave is grown from a stack of per-level [`PathParameters`]. The root level walks
//! a curving polyline and annotates it with feature points; fork points spawn child
//! paths using the parameters of the next level. The resulting tree is then
//! rasterized by the [`CaveManager`] into a set of floor tiles:
//!
//! - **Path generation**: recursive, seeded random walks ([`Path`])
//! - **Rasterization**: floor tiles, bottleneck exclusion zones, chambers and
//!   corridor widening ([`CaveManager`])
//! - **Grid geometry**: neighbor tables and the alternating-diagonal [`circle_fill`]
//! - **Placement**: a pure planning pass that turns a [`CaveResult`] into entity
//!   placement commands for an external [`EntityFactory`]
//!
//! Every random draw comes from a single seeded generator, so the same seed and
//! parameters always produce the same cave.
//!
//! ```
//! use delve::{generate_cave, ParameterPools, Position};
//!
//! let pools = ParameterPools::default();
//! let cave = generate_cave(Position::origin(), &pools, 7).unwrap();
//! assert!(cave.is_floor(Position::origin()));
//! ```

pub mod game;
pub mod generation;
pub mod rendering;
pub mod utils;

pub use game::*;
pub use generation::*;
pub use rendering::*;
pub use utils::*;

pub use generation::{
    generate_cave, CaveConfig, CaveGenerator, CaveManager, CavePhase, CaveResult,
    EntityFactory, EntityKind, FeatureKind, FeaturePoint, Generator, ParameterPools, Path,
    PathParameters, PlacementCommand, PlacementRules, PoolLevel, RandomKnob,
};
pub use utils::{circle_fill, Bounds, Position, Vector2};

/// Core error type for cave generation.
#[derive(thiserror::Error, Debug)]
pub enum DelveError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A parameter value is outside its valid range
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// A path was requested without any level parameters
    #[error("Path requires at least one level of parameters")]
    EmptyParameterList,

    /// A parameter pool needed for generation has no candidates
    #[error("No {0} parameter candidates configured")]
    EmptyPool(PoolLevel),

    /// Circle fills are only defined for non-negative radii
    #[error("Negative circle fill radius: {0}")]
    NegativeRadius(i32),

    /// A cave generation phase was run out of order
    #[error("Cave phase out of order: expected {expected:?}, found {found:?}")]
    PhaseOrder {
        /// Phase the operation requires
        expected: CavePhase,
        /// Phase the manager is actually in
        found: CavePhase,
    },

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the Delve codebase.
pub type DelveResult<T> = Result<T, DelveError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Generation constants.
pub mod config {
    /// Smallest branch angle, in degrees, between a fork and its child path
    pub const MIN_FORK_ANGLE_DEGREES: f64 = 15.0;

    /// Largest branch angle, in degrees, between a fork and its child path
    pub const MAX_FORK_ANGLE_DEGREES: f64 = 60.0;

    /// Maximum number of parameter levels a cave can use (essential, major, minor)
    pub const MAX_CAVE_DEPTH: usize = 3;

    /// Largest magnitude a knob setting or jitter may have
    pub const MAX_KNOB_VALUE: i32 = 256;

    /// Seed used by the default configuration
    pub const DEFAULT_SEED: u64 = 42;
}
