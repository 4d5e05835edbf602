use std::ops::RangeInclusive;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Session length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Quick,
    Deep,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quick" => Ok(Mode::Quick),
            "deep" => Ok(Mode::Deep),
            other => Err(format!("unknown mode '{}', expected quick or deep", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: usize,
    pub max: usize,
}

impl CountRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Bounds in ascending order, whatever order they were configured in.
    pub fn bounds(&self) -> RangeInclusive<usize> {
        self.min.min(self.max)..=self.min.max(self.max)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(self.bounds())
    }
}

/// Knobs for batch generation and review. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub quick: CountRange,
    pub deep: CountRange,
    /// Chance of the possession frame when other genitive frames are also eligible.
    pub possession_chance: f64,
    pub adjective_chance: f64,
    /// Chance of "the" instead of "a" in a sentence hint.
    pub alternate_phrasing_chance: f64,
    pub matching_size: usize,
    /// Added to a missed exercise's id to form its review id.
    pub review_id_offset: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            quick: CountRange::new(5, 7),
            deep: CountRange::new(10, 12),
            possession_chance: 0.3,
            adjective_chance: 0.5,
            alternate_phrasing_chance: 0.3,
            matching_size: 5,
            review_id_offset: 1_000_000,
        }
    }
}

impl GeneratorConfig {
    pub fn count_range(&self, mode: Mode) -> CountRange {
        match mode {
            Mode::Quick => self.quick,
            Mode::Deep => self.deep,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Probability clamped into `[0, 1]` so `gen_bool` never panics on a bad config.
pub(crate) fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
    rng.gen_bool(p)
}
