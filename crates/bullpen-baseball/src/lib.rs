// Relief pitcher salary vs. performance analysis: season datasets, CSV
// ingestion, and higher-paid vs. lower-paid cohort comparisons.

pub mod analyzer;
pub mod cohort;
pub mod error;
pub mod load;
pub mod schema;

pub use analyzer::{AggregateAnalyzer, ComparisonTable, ScopeSelection, SkippedMetric};
pub use cohort::{
    partition, BootstrapComparison, CohortComparator, Cohorts, CorrelationComparison,
    MetricComparison, SeasonCutoff,
};
pub use error::AnalysisError;
pub use load::{load_season, load_seasons, LoadError};
pub use schema::{Column, ReliefPitcher, Season};
