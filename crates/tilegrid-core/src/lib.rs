pub mod config;
pub mod error;
pub mod mapping;
pub mod types;

pub use config::{DriverPayload, MappingConfig, MultiConfig, RegistrationInput, SampleConfig};
pub use error::{ConfigError, ConfigResult};
pub use mapping::TileMapping;
pub use types::*;
