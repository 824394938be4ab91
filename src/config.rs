//! Configuration management for simmem-bank.
//!
//! Two layers of configuration exist. [`BankConfig`] is the hardware-shaped
//! part: capacity, identifier width, payload width, all fixed at bank
//! construction and never mutable afterwards. [`SimConfig`] parameterizes
//! the randomized soak runner and is loaded from multiple sources in
//! priority order:
//! 1. Environment variables (SIMMEM_SEED, SIMMEM_ROUNDS, SIMMEM_STEPS)
//! 2. Project-local config file (`./simmem-bank.toml`)
//! 3. Built-in defaults
//!
//! # Config File Format
//!
//! ```toml
//! # simmem-bank.toml
//! rounds = 20
//! steps_per_round = 1000
//! num_ids = 4
//! seed = 1
//!
//! [bank]
//! capacity = 16
//! id_width = 4
//! payload_width = 36
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::axi;

/// Widest identifier space supported: release-enable masks are 64-bit.
pub const MAX_ID_WIDTH: u32 = 6;

/// Configuration problems surfaced at construction or load time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("capacity must be at least 1")]
    Capacity,
    #[error("identifier width {0} out of range (1..={MAX_ID_WIDTH})")]
    IdWidth(u32),
    #[error("payload width {payload_width} with identifier width {id_width} exceeds the {packed} bit packed message word")]
    PayloadWidth {
        payload_width: u32,
        id_width: u32,
        packed: u32,
    },
    #[error("soak uses {num_ids} identifiers but the bank only has {available}")]
    NumIds { num_ids: usize, available: usize },
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Construction-time parameters of one response bank.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BankConfig {
    /// Total slot capacity `C`.
    pub capacity: usize,
    /// Identifier width in bits; the identifier space is `1 << id_width`.
    pub id_width: u32,
    /// Payload width in bits.
    pub payload_width: u32,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            capacity: 16,
            id_width: axi::ID_WIDTH,
            payload_width: axi::X_DATA_WIDTH,
        }
    }
}

impl BankConfig {
    /// A bank dimensioned for full read-data messages (data word, response
    /// code and last-beat flag above the identifier).
    pub fn for_read_data(capacity: usize) -> Self {
        Self {
            capacity,
            id_width: axi::ID_WIDTH,
            payload_width: axi::READ_DATA_CONTENT_WIDTH,
        }
    }

    /// Number of distinct identifiers.
    pub fn num_ids(&self) -> usize {
        1 << self.id_width
    }

    /// Mask with the low `payload_width` bits set.
    pub fn payload_mask(&self) -> u64 {
        if self.payload_width >= 64 {
            u64::MAX
        } else {
            (1u64 << self.payload_width) - 1
        }
    }

    /// Check the parameters against the supported ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Capacity);
        }
        if self.id_width == 0 || self.id_width > MAX_ID_WIDTH {
            return Err(ConfigError::IdWidth(self.id_width));
        }
        if self.payload_width == 0 || self.payload_width + self.id_width > axi::PACKED_WIDTH {
            return Err(ConfigError::PayloadWidth {
                payload_width: self.payload_width,
                id_width: self.id_width,
                packed: axi::PACKED_WIDTH,
            });
        }
        Ok(())
    }
}

/// Parameters of the randomized soak runner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SimConfig {
    /// Bank under test.
    pub bank: BankConfig,
    /// Independent randomized rounds to run.
    pub rounds: u64,
    /// Stimulus steps per round, before the drain phase.
    pub steps_per_round: u64,
    /// Identifiers the stimulus draws from (must fit the bank's space).
    pub num_ids: usize,
    /// Base seed; round `i` runs with `seed + i`.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            bank: BankConfig::for_read_data(16),
            rounds: 10,
            steps_per_round: 1000,
            num_ids: 4,
            seed: 0,
        }
    }
}

impl SimConfig {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest): environment variables, project-local
    /// `simmem-bank.toml`, defaults. A malformed local file is logged and
    /// skipped; use [`SimConfig::load_from_file`] for hard errors.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(local) = Self::load_local_config() {
            config = local;
        }
        config.apply_env_overrides();
        config
    }

    /// Load configuration from a specific file, failing loudly.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check the soak parameters and the embedded bank parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bank.validate()?;
        if self.num_ids == 0 || self.num_ids > self.bank.num_ids() {
            return Err(ConfigError::NumIds {
                num_ids: self.num_ids,
                available: self.bank.num_ids(),
            });
        }
        Ok(())
    }

    /// Load project-local configuration from ./simmem-bank.toml
    fn load_local_config() -> Option<Self> {
        let local_path = Path::new("simmem-bank.toml");
        if !local_path.exists() {
            return None;
        }
        match Self::load_from_file(local_path) {
            Ok(config) => {
                log::info!("Loaded config from {}", local_path.display());
                Some(config)
            }
            Err(e) => {
                log::warn!("Ignoring {}: {e}", local_path.display());
                None
            }
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        for (var, field) in [
            ("SIMMEM_SEED", &mut self.seed as &mut u64),
            ("SIMMEM_ROUNDS", &mut self.rounds),
            ("SIMMEM_STEPS", &mut self.steps_per_round),
        ] {
            if let Ok(raw) = std::env::var(var) {
                match raw.parse() {
                    Ok(value) => {
                        log::info!("Using {var}={value} from environment");
                        *field = value;
                    }
                    Err(_) => log::warn!("Ignoring unparseable {var}={raw}"),
                }
            }
        }
    }
}
