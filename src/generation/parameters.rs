//! # Path Parameters
//!
//! Per-level configuration for path growth and the pools the cave draws
//! level parameters from.

use crate::generation::RandomKnob;
use crate::utils::Vector2;
use crate::{DelveError, DelveResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for one recursion level of a [`Path`](crate::Path).
///
/// Parameters are plain values: every use clones them first, so a template is
/// never changed by knob settings, curvature flips or origin overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathParameters {
    /// Starting point of the walk
    #[serde(default)]
    pub origin: Vector2,
    /// Initial heading in radians
    #[serde(default)]
    pub initial_facing: f64,
    /// Heading change in radians per unit of length
    #[serde(default)]
    pub curvature: f64,
    /// Total length of the walk
    pub length: f64,
    /// Distance covered by each step, in (0, 1]
    pub step_size: f64,
    /// Expected inflections (curvature sign flips) per unit of length
    #[serde(default)]
    pub inflection_rate: f64,
    /// Expected bottlenecks per unit of length
    #[serde(default)]
    pub bottleneck_rate: f64,
    /// Expected number of chambers; the fractional part is the chance of one more
    #[serde(default)]
    pub chamber_number: f64,
    /// Expected number of forks; the fractional part is the chance of one more
    #[serde(default)]
    pub fork_number: f64,
    /// Corridor half-width
    #[serde(default)]
    pub choke: RandomKnob,
    /// Half-extent of bottleneck exclusion regions
    #[serde(default)]
    pub bottleneck: RandomKnob,
    /// Radius of chambers
    #[serde(default)]
    pub chamber: RandomKnob,
}

impl PathParameters {
    /// A straight, featureless path of the given length with unit steps.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::PathParameters;
    ///
    /// let params = PathParameters::straight(10.0);
    /// assert_eq!(params.step_count(), 10);
    /// assert!(params.validate().is_ok());
    /// ```
    pub fn straight(length: f64) -> Self {
        Self {
            origin: Vector2::zero(),
            initial_facing: 0.0,
            curvature: 0.0,
            length,
            step_size: 1.0,
            inflection_rate: 0.0,
            bottleneck_rate: 0.0,
            chamber_number: 0.0,
            fork_number: 0.0,
            choke: RandomKnob::fixed(0),
            bottleneck: RandomKnob::fixed(0),
            chamber: RandomKnob::fixed(0),
        }
    }

    /// Long winding trunk used for the essential level.
    pub fn essential() -> Self {
        Self {
            origin: Vector2::zero(),
            initial_facing: 0.0,
            curvature: 0.12,
            length: 60.0,
            step_size: 0.5,
            inflection_rate: 0.08,
            bottleneck_rate: 0.03,
            chamber_number: 1.5,
            fork_number: 2.5,
            choke: RandomKnob::ranged(1, 2).with_jitter(1, 0.2),
            bottleneck: RandomKnob::fixed(2),
            chamber: RandomKnob::ranged(3, 5),
        }
    }

    /// Medium branches spawned from the essential trunk.
    pub fn major() -> Self {
        Self {
            curvature: 0.18,
            length: 30.0,
            step_size: 0.5,
            inflection_rate: 0.1,
            bottleneck_rate: 0.02,
            chamber_number: 0.6,
            fork_number: 1.2,
            choke: RandomKnob::ranged(0, 1).with_jitter(1, 0.3),
            chamber: RandomKnob::ranged(2, 4),
            ..Self::essential()
        }
    }

    /// Short dead-end tunnels at the deepest level.
    pub fn minor() -> Self {
        Self {
            curvature: 0.25,
            length: 12.0,
            step_size: 0.5,
            inflection_rate: 0.15,
            bottleneck_rate: 0.0,
            chamber_number: 0.3,
            fork_number: 0.0,
            choke: RandomKnob::fixed(0),
            chamber: RandomKnob::fixed(2),
            ..Self::essential()
        }
    }

    /// Number of waypoints a walk with these parameters produces.
    ///
    /// Degenerate step sizes are clamped so a path always has its origin.
    pub fn step_count(&self) -> usize {
        let steps = (self.length / self.step_size).round();
        if steps.is_finite() && steps >= 1.0 {
            steps as usize
        } else {
            1
        }
    }

    /// Checks every numeric field and knob.
    pub fn validate(&self) -> DelveResult<()> {
        let finite = [
            ("origin.x", self.origin.x),
            ("origin.y", self.origin.y),
            ("initial_facing", self.initial_facing),
            ("curvature", self.curvature),
            ("length", self.length),
            ("step_size", self.step_size),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(invalid(format!("{name} must be finite, got {value}")));
            }
        }
        if self.length <= 0.0 {
            return Err(invalid(format!("length must be positive, got {}", self.length)));
        }
        if self.step_size <= 0.0 || self.step_size > 1.0 {
            return Err(invalid(format!(
                "step_size must be in (0, 1], got {}",
                self.step_size
            )));
        }
        for (name, rate) in [
            ("inflection_rate", self.inflection_rate),
            ("bottleneck_rate", self.bottleneck_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(invalid(format!("{name} must be in [0, 1], got {rate}")));
            }
        }
        for (name, count) in [
            ("chamber_number", self.chamber_number),
            ("fork_number", self.fork_number),
        ] {
            if !count.is_finite() || count < 0.0 {
                return Err(invalid(format!("{name} must be non-negative, got {count}")));
            }
        }
        self.choke.validate()?;
        self.bottleneck.validate()?;
        self.chamber.validate()
    }
}

fn invalid(message: String) -> DelveError {
    DelveError::InvalidParameters(message)
}

/// Which pool a level's parameters come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolLevel {
    /// The trunk; always present
    Essential,
    /// Branches off the trunk
    Major,
    /// Branches off major branches
    Minor,
}

impl fmt::Display for PoolLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PoolLevel::Essential => "essential",
            PoolLevel::Major => "major",
            PoolLevel::Minor => "minor",
        };
        f.write_str(name)
    }
}

/// Candidate parameters for each cave level.
///
/// The essential level is always generated. The major and minor levels are each
/// included behind an independent probability gate, so a cave has one to three
/// levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterPools {
    /// Candidates for the trunk level
    pub essential: Vec<PathParameters>,
    /// Candidates for the second level
    #[serde(default)]
    pub major: Vec<PathParameters>,
    /// Candidates for the deepest level
    #[serde(default)]
    pub minor: Vec<PathParameters>,
    /// Probability the major level is included (0.0 to 1.0)
    #[serde(default)]
    pub major_level_chance: f64,
    /// Probability the minor level is included (0.0 to 1.0)
    #[serde(default)]
    pub minor_level_chance: f64,
}

impl ParameterPools {
    /// Pools with a single essential candidate and no deeper levels.
    pub fn single_level(parameters: PathParameters) -> Self {
        Self {
            essential: vec![parameters],
            major: Vec::new(),
            minor: Vec::new(),
            major_level_chance: 0.0,
            minor_level_chance: 0.0,
        }
    }

    /// Candidates for a pool level.
    pub fn candidates(&self, level: PoolLevel) -> &[PathParameters] {
        match level {
            PoolLevel::Essential => &self.essential,
            PoolLevel::Major => &self.major,
            PoolLevel::Minor => &self.minor,
        }
    }

    /// Checks the level chances and every candidate.
    ///
    /// Empty pools are not an error here; they only fail generation when the
    /// level is actually selected.
    pub fn validate(&self) -> DelveResult<()> {
        for (name, chance) in [
            ("major_level_chance", self.major_level_chance),
            ("minor_level_chance", self.minor_level_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(invalid(format!("{name} must be in [0, 1], got {chance}")));
            }
        }
        self.essential
            .iter()
            .chain(self.major.iter())
            .chain(self.minor.iter())
            .try_for_each(PathParameters::validate)
    }
}

impl Default for ParameterPools {
    fn default() -> Self {
        Self {
            essential: vec![PathParameters::essential()],
            major: vec![PathParameters::major()],
            minor: vec![PathParameters::minor()],
            major_level_chance: 0.9,
            minor_level_chance: 0.6,
        }
    }
}
