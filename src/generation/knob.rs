//! # Random Knobs
//!
//! Bounded integer settings with optional per-read jitter.

use crate::config::MAX_KNOB_VALUE;
use crate::{DelveError, DelveResult};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A bounded integer setting.
///
/// [`RandomKnob::set_value`] picks a base setting uniformly from `[min, max]`.
/// Every read through [`RandomKnob::value`] may independently perturb that base
/// by up to `jitter_size` in either direction (with probability `jitter_rate`).
/// Reads never go below zero and never change the stored base.
///
/// # Examples
///
/// ```
/// use delve::RandomKnob;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(3);
/// let mut knob = RandomKnob::new(2, 4, 1, 0.5).unwrap();
/// let base = knob.set_value(&mut rng);
/// assert!((2..=4).contains(&base));
///
/// let read = knob.value(&mut rng);
/// assert!(read + 1 >= base as u32 && read <= base as u32 + 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomKnob {
    /// Smallest base setting
    pub min: i32,
    /// Largest base setting
    pub max: i32,
    /// Largest jitter offset applied to a read
    #[serde(default)]
    pub jitter_size: i32,
    /// Probability that a read is jittered (0.0 to 1.0)
    #[serde(default)]
    pub jitter_rate: f64,
    /// Base setting from the last `set_value`
    #[serde(skip)]
    setting: Option<i32>,
}

impl RandomKnob {
    /// Creates a validated knob.
    pub fn new(min: i32, max: i32, jitter_size: i32, jitter_rate: f64) -> DelveResult<Self> {
        let knob = Self {
            min,
            max,
            jitter_size,
            jitter_rate,
            setting: None,
        };
        knob.validate()?;
        Ok(knob)
    }

    /// A knob drawing uniformly from `[min, max]` without jitter.
    pub fn ranged(min: i32, max: i32) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
            jitter_size: 0,
            jitter_rate: 0.0,
            setting: None,
        }
    }

    /// Adds jitter, clamping the size to be non-negative and the rate to [0, 1].
    pub fn with_jitter(mut self, jitter_size: i32, jitter_rate: f64) -> Self {
        self.jitter_size = jitter_size.max(0);
        self.jitter_rate = jitter_rate.clamp(0.0, 1.0);
        self
    }

    /// A knob that always reads `value`.
    pub fn fixed(value: i32) -> Self {
        Self {
            min: value,
            max: value,
            jitter_size: 0,
            jitter_rate: 0.0,
            setting: None,
        }
    }

    /// Checks the range and jitter configuration.
    pub fn validate(&self) -> DelveResult<()> {
        if self.min > self.max {
            return Err(DelveError::InvalidParameters(format!(
                "knob minimum {} exceeds maximum {}",
                self.min, self.max
            )));
        }
        if self.min < -MAX_KNOB_VALUE || self.max > MAX_KNOB_VALUE {
            return Err(DelveError::InvalidParameters(format!(
                "knob range [{}, {}] exceeds the limit of {}",
                self.min, self.max, MAX_KNOB_VALUE
            )));
        }
        if self.jitter_size > MAX_KNOB_VALUE {
            return Err(DelveError::InvalidParameters(format!(
                "knob jitter size {} exceeds the limit of {}",
                self.jitter_size, MAX_KNOB_VALUE
            )));
        }
        if self.jitter_size < 0 {
            return Err(DelveError::InvalidParameters(format!(
                "knob jitter size {} is negative",
                self.jitter_size
            )));
        }
        if !(0.0..=1.0).contains(&self.jitter_rate) {
            return Err(DelveError::InvalidParameters(format!(
                "knob jitter rate {} is outside [0, 1]",
                self.jitter_rate
            )));
        }
        Ok(())
    }

    /// Draws a new base setting uniformly from `[min, max]` and stores it.
    pub fn set_value<R: Rng + ?Sized>(&mut self, rng: &mut R) -> i32 {
        let setting = rng.gen_range(self.min..=self.max);
        self.setting = Some(setting);
        setting
    }

    /// The stored base setting, or `max(min, 0)` before the first `set_value`.
    pub fn setting(&self) -> i32 {
        self.setting.unwrap_or_else(|| self.min.max(0))
    }

    /// Reads the knob, possibly jittered, floored at zero.
    pub fn value<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let mut value = self.setting();
        if self.jitter_size > 0 && self.jitter_rate > 0.0 && rng.gen_bool(self.jitter_rate) {
            value = value.saturating_add(rng.gen_range(-self.jitter_size..=self.jitter_size));
        }
        value.max(0) as u32
    }

    /// Inclusive range every read falls into.
    pub fn value_range(&self) -> (u32, u32) {
        let low = self.min.saturating_sub(self.jitter_size).max(0) as u32;
        let high = self.max.saturating_add(self.jitter_size).max(0) as u32;
        (low, high)
    }
}

impl Default for RandomKnob {
    fn default() -> Self {
        Self::fixed(0)
    }
}
