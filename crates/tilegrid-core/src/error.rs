//! Configuration error types.

use thiserror::Error;

/// Errors raised while loading sample configurations or building mappings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid tiling for sample {sample}: tiles {tiles:?}, tiles per rank {tiles_per_rank:?}")]
    InvalidTiling {
        /// 1-based registration position of the offending sample.
        sample: usize,
        tiles: [u32; 3],
        tiles_per_rank: [u32; 3],
    },

    #[error("{required} rank(s) required, but {supplied} rank(s) supplied")]
    InsufficientRanks { required: u64, supplied: u32 },

    #[error("dual config must hold exactly 2 samples, found {0}")]
    DualArity(usize),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
