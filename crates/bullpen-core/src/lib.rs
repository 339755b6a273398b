// Shared infrastructure for the bullpen workspace: configuration loading and
// validation.

pub mod config;

pub use config::{load_config, Config, ConfigError};
