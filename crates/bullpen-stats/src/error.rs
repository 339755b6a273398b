use thiserror::Error;

/// Errors raised by the numeric primitives.
///
/// Both kinds are deterministic consequences of the input; retrying with the
/// same data cannot succeed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),
}
