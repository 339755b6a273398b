// Numeric primitives for cohort comparisons: bootstrap resampling,
// interpolated percentiles, two-sample t-tests and Pearson correlation.
//
// Nothing in this crate knows about baseball; callers hand in plain `f64`
// slices that have already been validated and cleaned.

mod correlation;
mod descriptive;
mod error;
mod percentile;
mod resample;
mod ttest;

pub use correlation::{pearson, Correlation};
pub use descriptive::{mean, sample_variance};
pub use error::StatsError;
pub use percentile::{percentile, validate_percentile};
pub use resample::{
    bootstrap, bootstrap_mean_interval, bootstrap_means, percentile_interval, resamples,
    BootstrapEstimate, ConfidenceInterval,
};
pub use ttest::{two_sample_t_test, TTestResult, TTestVariant};

/// Default number of bootstrap resamples.
pub const DEFAULT_RESAMPLES: usize = 10_000;

/// Default confidence level for bootstrap intervals (2.5th to 97.5th percentile).
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Minimum number of observations per group for a t-test or correlation.
pub const MIN_OBSERVATIONS: usize = 2;
