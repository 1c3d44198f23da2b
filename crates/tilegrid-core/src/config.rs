//! Sample configuration records.
//!
//! A single-sample input is a TOML file with one `[mapping]` table. A dual
//! input holds two records under `[[configs]]`, registered back-to-back.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::types::SampleId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleConfig {
    pub mapping: MappingConfig,
}

/// Tiling parameters for one sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Tile-grid extents (Tx, Ty, Tz).
    pub tiles: [u32; 3],
    /// Super-tile extents (Sx, Sy, Sz); each super-tile lives on one rank.
    pub tiles_per_rank: [u32; 3],
    /// Id the driver task reads back to find its sample.
    #[serde(default)]
    pub sample_id: SampleId,
}

impl MappingConfig {
    /// Check extents are positive and divisible by the super-tile extents,
    /// and that the whole tile grid can be counted in a `u32`.
    ///
    /// `position` is the 1-based registration position used in diagnostics.
    pub fn validate(&self, position: usize) -> ConfigResult<()> {
        let divisible = self
            .tiles
            .iter()
            .zip(&self.tiles_per_rank)
            .all(|(&t, &s)| t > 0 && s > 0 && t % s == 0);
        let countable = self.tiles.iter().try_fold(1u32, |acc, &t| acc.checked_mul(t)).is_some();
        if !divisible || !countable {
            return Err(self.invalid(position));
        }
        Ok(())
    }

    /// Ranks this sample needs: one per super-tile.
    pub fn num_ranks(&self, position: usize) -> ConfigResult<u32> {
        self.validate(position)?;
        let [tx, ty, tz] = self.tiles;
        let [sx, sy, sz] = self.tiles_per_rank;
        Ok((tx / sx) * (ty / sy) * (tz / sz))
    }

    pub(crate) fn invalid(&self, position: usize) -> ConfigError {
        ConfigError::InvalidTiling {
            sample: position,
            tiles: self.tiles,
            tiles_per_rank: self.tiles_per_rank,
        }
    }
}

impl SampleConfig {
    pub fn new(tiles: [u32; 3], tiles_per_rank: [u32; 3]) -> Self {
        Self {
            mapping: MappingConfig {
                tiles,
                tiles_per_rank,
                sample_id: 0,
            },
        }
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), tiles = ?config.mapping.tiles, "loaded sample config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// A paired configuration: two coupled samples driven by one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiConfig {
    pub configs: Vec<SampleConfig>,
}

impl MultiConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mc = Self::from_toml(&content)?;
        debug!(path = %path.display(), "loaded dual sample config");
        Ok(mc)
    }

    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let mc: MultiConfig = toml::from_str(content)?;
        if mc.configs.len() != 2 {
            return Err(ConfigError::DualArity(mc.configs.len()));
        }
        Ok(mc)
    }
}

/// One configuration input handed to the sample registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationInput {
    Single(SampleConfig),
    Dual(MultiConfig),
}

impl RegistrationInput {
    /// Sample records contributed by this input, in registration order.
    pub fn samples(&self) -> &[SampleConfig] {
        match self {
            RegistrationInput::Single(config) => std::slice::from_ref(config),
            RegistrationInput::Dual(mc) => &mc.configs,
        }
    }
}

/// Argument payload of a whole-sample driver task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverPayload {
    Single(SampleConfig),
    Dual(MultiConfig),
}

impl DriverPayload {
    /// Sample the driver runs on. A coupled pair is driven from its first sample.
    pub fn sample_id(&self) -> Option<SampleId> {
        match self {
            DriverPayload::Single(config) => Some(config.mapping.sample_id),
            DriverPayload::Dual(mc) => mc.configs.first().map(|c| c.mapping.sample_id),
        }
    }
}
