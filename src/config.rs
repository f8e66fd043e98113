//! Validation thresholds and scoring weights.
//!
//! Every heuristic the checks apply is a named constant here. The defaults can
//! be overridden from a TOML file, e.g.
//!
//! ```toml
//! [pairing]
//! max_distance_m = 150.0
//!
//! [parallel.weights]
//! divider = 3.0
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Meters per degree used for all degree/meter conversions.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

pub const SIDE_DISPLACEMENT_M: f64 = 5.0;

pub const PAIRING_MIN_DISTANCE_M: f64 = 0.1;
pub const PAIRING_MAX_DISTANCE_M: f64 = 200.0;
pub const PAIRING_MAX_ANGLE_DEG: f64 = 60.0;

pub const PARALLEL_MAX_DISTANCE_M: f64 = 200.0;
pub const PARALLEL_MAX_ANGLE_DEG: f64 = 45.0;
pub const PARALLEL_MIN_LENGTH_M: f64 = 20.0;
pub const PARALLEL_SCORE_THRESHOLD: f64 = 4.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ValidationConfig {
    pub side: SideConfig,
    pub pairing: PairingConfig,
    pub parallel: ParallelConfig,
}

/// Side-of-street check
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SideConfig {
    /// How far the probe point is pushed towards the declared side
    pub displacement_m: f64,
}

impl Default for SideConfig {
    fn default() -> Self {
        Self {
            displacement_m: SIDE_DISPLACEMENT_M,
        }
    }
}

/// Partner search for links flagged as multiply digitized
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PairingConfig {
    pub min_distance_m: f64,
    pub max_distance_m: f64,
    pub max_angle_deg: f64,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            min_distance_m: PAIRING_MIN_DISTANCE_M,
            max_distance_m: PAIRING_MAX_DISTANCE_M,
            max_angle_deg: PAIRING_MAX_ANGLE_DEG,
        }
    }
}

/// Search for unflagged links that look like one half of a divided road
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ParallelConfig {
    pub max_distance_m: f64,
    pub max_angle_deg: f64,
    /// Segments shorter than this are skipped unless a divider is present
    pub min_length_m: f64,
    pub score_threshold: f64,
    pub weights: ScoreWeights,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            max_distance_m: PARALLEL_MAX_DISTANCE_M,
            max_angle_deg: PARALLEL_MAX_ANGLE_DEG,
            min_length_m: PARALLEL_MIN_LENGTH_M,
            score_threshold: PARALLEL_SCORE_THRESHOLD,
            weights: ScoreWeights::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScoreWeights {
    pub divider: f64,
    pub non_local_func_class: f64,
    pub multi_lane: f64,
    pub long_segment: f64,
    pub high_speed_cat: f64,
    pub tollway: f64,
    pub non_urban: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            divider: 2.0,
            non_local_func_class: 1.0,
            multi_lane: 1.0,
            long_segment: 1.0,
            high_speed_cat: 1.0,
            tollway: 1.0,
            non_urban: 0.5,
        }
    }
}

impl ValidationConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ValidationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject thresholds the checks cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // A zero offset leaves the point on the link, where every side reads Right
        positive("side.displacement_m", self.side.displacement_m)?;
        non_negative("pairing.min_distance_m", self.pairing.min_distance_m)?;
        non_negative("pairing.max_distance_m", self.pairing.max_distance_m)?;
        if self.pairing.min_distance_m > self.pairing.max_distance_m {
            return Err(ConfigError::Invalid {
                field: "pairing.min_distance_m",
                reason: format!(
                    "{} is larger than pairing.max_distance_m ({})",
                    self.pairing.min_distance_m, self.pairing.max_distance_m
                ),
            });
        }
        angle("pairing.max_angle_deg", self.pairing.max_angle_deg)?;
        non_negative("parallel.max_distance_m", self.parallel.max_distance_m)?;
        non_negative("parallel.min_length_m", self.parallel.min_length_m)?;
        angle("parallel.max_angle_deg", self.parallel.max_angle_deg)?;
        if !self.parallel.score_threshold.is_finite() {
            return Err(ConfigError::Invalid {
                field: "parallel.score_threshold",
                reason: format!("expected a finite number, got {}", self.parallel.score_threshold),
            });
        }
        self.parallel.weights.validate()
    }
}

impl ScoreWeights {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("parallel.weights.divider", self.divider)?;
        non_negative("parallel.weights.non_local_func_class", self.non_local_func_class)?;
        non_negative("parallel.weights.multi_lane", self.multi_lane)?;
        non_negative("parallel.weights.long_segment", self.long_segment)?;
        non_negative("parallel.weights.high_speed_cat", self.high_speed_cat)?;
        non_negative("parallel.weights.tollway", self.tollway)?;
        non_negative("parallel.weights.non_urban", self.non_urban)
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a positive number, got {}", value),
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a non-negative number, got {}", value),
        })
    }
}

fn angle(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=90.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected an angle in [0, 90] degrees, got {}", value),
        })
    }
}
