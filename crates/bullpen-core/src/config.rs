// Configuration loading and parsing (config/analysis.toml).

use bullpen_stats::TTestVariant;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Name of the analysis config file inside `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "analysis.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// analysis.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the cached season tables live and which seasons to load.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub dir: String,
    pub seasons: Vec<u16>,
}

/// Relief-pitcher exclusion thresholds. A row is kept only when both
/// `GR > min_games_relieved` and `GR / G > min_relief_fraction`.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    pub min_games_relieved: u32,
    pub min_relief_fraction: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_games_relieved: 5,
            min_relief_fraction: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Salary percentile separating the higher paid cohort from the lower paid one.
    pub percentile: f64,
    /// Metric column labels, in report order (e.g. "RA9", "WAR", "SV%").
    pub metrics: Vec<String>,
    #[serde(default)]
    pub t_test: TTestVariant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    pub resamples: usize,
    pub confidence_level: f64,
    /// Fixed seed for reproducible runs; drawn from entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            resamples: bullpen_stats::DEFAULT_RESAMPLES,
            confidence_level: bullpen_stats::DEFAULT_CONFIDENCE_LEVEL,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/analysis.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path)
        .map_err(|_| ConfigError::FileNotFound { path: path.clone() })?;
    let config: Config =
        toml::from_str(&text).map_err(|e| ConfigError::ParseError { path, source: e })?;

    validate(&config)?;

    Ok(config)
}

/// Copy `defaults/analysis.toml` to `config/analysis.toml` unless the
/// config already exists. Returns the written path, if any.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }
    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no config/{CONFIG_FILE} or defaults/{CONFIG_FILE} in {}",
                base_dir.display()
            ),
        });
    }

    let copy_error = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    };
    std::fs::create_dir_all(base_dir.join("config")).map_err(copy_error)?;
    std::fs::copy(&source, &target).map_err(copy_error)?;
    info!("copied default config to {}", target.display());
    Ok(Some(target))
}

/// Loads config relative to the current working directory, copying default
/// config first when it is missing.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_file(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.data.seasons.is_empty() {
        return Err(invalid("data.seasons", "must list at least one season"));
    }
    let mut seen = std::collections::HashSet::new();
    for year in &config.data.seasons {
        if !seen.insert(year) {
            return Err(invalid("data.seasons", format!("season {year} listed twice")));
        }
    }

    let frac = config.filter.min_relief_fraction;
    if !(0.0..=1.0).contains(&frac) {
        return Err(invalid(
            "filter.min_relief_fraction",
            format!("must be between 0.0 and 1.0 inclusive, got {frac}"),
        ));
    }

    let pct = config.analysis.percentile;
    if !(0.0..=100.0).contains(&pct) {
        return Err(invalid(
            "analysis.percentile",
            format!("must be between 0 and 100 inclusive, got {pct}"),
        ));
    }
    if config.analysis.metrics.is_empty() {
        return Err(invalid("analysis.metrics", "must list at least one metric"));
    }
    if config.analysis.metrics.iter().any(|m| m.trim().is_empty()) {
        return Err(invalid("analysis.metrics", "metric names must not be blank"));
    }

    if config.bootstrap.resamples == 0 {
        return Err(invalid("bootstrap.resamples", "must be > 0"));
    }
    let level = config.bootstrap.confidence_level;
    if !(level > 0.0 && level < 1.0) {
        return Err(invalid(
            "bootstrap.confidence_level",
            format!("must be between 0 and 1 exclusive, got {level}"),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
