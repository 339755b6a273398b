use bullpen_stats::StatsError;
use thiserror::Error;

/// Errors from partitioning and comparing cohorts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("no season {year} in the loaded data")]
    NotFound { year: u16 },
}

impl From<StatsError> for AnalysisError {
    fn from(e: StatsError) -> Self {
        match e {
            StatsError::InvalidInput(msg) => AnalysisError::InvalidInput(msg),
            StatsError::InsufficientData(msg) => AnalysisError::InsufficientData(msg),
        }
    }
}
