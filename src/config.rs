//! Tunables for the strategies that take any.
//!
//! Load them from TOML to adjust search limits and the annealing schedule without code changes:
//!
//! ```
//! use flowsearch::SolverConfig;
//!
//! let config = SolverConfig::from_toml_str(r#"
//!     [bfs]
//!     max_nodes = 5000
//!
//!     [annealing]
//!     cooling_rate = 0.9
//!     random_seed = 42
//! "#).unwrap();
//!
//! assert_eq!(config.bfs.max_nodes, 5000);
//! assert_eq!(config.annealing.random_seed, Some(42));
//! assert_eq!(config.annealing.trials_per_temperature, 1500);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not TOML of the expected shape.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for every strategy; each strategy reads only its own section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SolverConfig {
    /// `[bfs]`
    pub bfs: BfsConfig,
    /// `[csp]`
    pub csp: CspConfig,
    /// `[annealing]`
    pub annealing: AnnealingConfig,
}

/// Breadth-first search limits.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct BfsConfig {
    /// Expansions allowed before the search gives up with [`Termination::NodeLimit`](crate::Termination::NodeLimit).
    pub max_nodes: u64,
}

impl Default for BfsConfig {
    fn default() -> Self {
        Self { max_nodes: 1_000_000 }
    }
}

/// Constraint solver limits.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CspConfig {
    /// Longest path, in cells, enumerated into a colour's domain. Defaults to the board's cell count.
    pub max_path_len: Option<usize>,
}

/// Simulated annealing schedule.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AnnealingConfig {
    /// Temperature of the first round of trials.
    pub starting_temperature: f64,
    /// The schedule ends once the temperature drops to this value.
    pub minimum_temperature: f64,
    /// Multiplicative decay applied after each round of trials.
    pub cooling_rate: f64,
    /// Neighbours tried before each cooling step.
    pub trials_per_temperature: u32,
    /// Seed for reproducible runs; drawn at random (and logged) when absent.
    pub random_seed: Option<u64>,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            starting_temperature: 700.0,
            minimum_temperature: 0.005,
            cooling_rate: 0.95,
            trials_per_temperature: 1500,
            random_seed: None,
        }
    }
}

impl AnnealingConfig {
    /// Rejects schedules that would never cool down to their minimum temperature.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.minimum_temperature > 0.0) {
            return Err(ConfigError::Invalid("annealing.minimum_temperature must be positive".into()));
        }
        if !(self.starting_temperature > self.minimum_temperature) || !self.starting_temperature.is_finite() {
            return Err(ConfigError::Invalid(
                "annealing.starting_temperature must be finite and exceed annealing.minimum_temperature".into(),
            ));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(ConfigError::Invalid("annealing.cooling_rate must lie strictly between 0 and 1".into()));
        }
        if self.trials_per_temperature == 0 {
            return Err(ConfigError::Invalid("annealing.trials_per_temperature must be positive".into()));
        }

        Ok(())
    }
}

impl SolverConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, contains invalid TOML or fails [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings no strategy can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bfs.max_nodes == 0 {
            return Err(ConfigError::Invalid("bfs.max_nodes must be positive".into()));
        }
        if self.csp.max_path_len.is_some_and(|len| len < 2) {
            return Err(ConfigError::Invalid("csp.max_path_len must be at least 2".into()));
        }

        self.annealing.validate()
    }

    /// Sets the breadth-first expansion cap.
    pub fn with_max_nodes(mut self, max_nodes: u64) -> Self {
        self.bfs.max_nodes = max_nodes;
        self
    }

    /// Sets the constraint solver's path length bound.
    pub fn with_max_path_len(mut self, max_path_len: usize) -> Self {
        self.csp.max_path_len = Some(max_path_len);
        self
    }

    /// Sets the annealing seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.annealing.random_seed = Some(seed);
        self
    }

    /// Replaces the annealing schedule, keeping the configured seed.
    pub fn with_schedule(mut self, starting_temperature: f64, minimum_temperature: f64, cooling_rate: f64, trials_per_temperature: u32) -> Self {
        self.annealing = AnnealingConfig {
            starting_temperature,
            minimum_temperature,
            cooling_rate,
            trials_per_temperature,
            ..self.annealing
        };
        self
    }
}
