// Analysis run: turns a loaded season collection and the analysis config
// into one report holding every table, interval and correlation.

use bullpen_baseball::{
    AggregateAnalyzer, AnalysisError, BootstrapComparison, Column, ComparisonTable,
    CorrelationComparison, ScopeSelection,
};
use bullpen_core::config::Config;
use bullpen_stats::TTestVariant;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Which pooled analysis a skip came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Bootstrap,
    Correlation,
}

/// A pooled bootstrap or correlation that had too little data to run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedAnalysis {
    pub kind: AnalysisKind,
    pub metric: Column,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub description: String,
    pub percentile: f64,
    pub variant: TTestVariant,
    pub resamples: usize,
    pub confidence_level: f64,
    /// One table per season, most recent first.
    pub seasons: Vec<ComparisonTable>,
    pub pooled: ComparisonTable,
    pub bootstrap: Vec<BootstrapComparison>,
    pub correlations: Vec<CorrelationComparison>,
    pub skipped: Vec<SkippedAnalysis>,
}

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

/// Resolve configured metric labels to columns, keeping their order.
pub fn parse_metrics(labels: &[String]) -> Result<Vec<Column>, AnalysisError> {
    labels.iter().map(|label| label.parse()).collect()
}

/// Seeded generator when a seed is configured, otherwise one seeded from
/// the OS.
pub fn build_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

fn skip_insufficient<T>(
    result: Result<T, AnalysisError>,
    kind: AnalysisKind,
    metric: Column,
    skipped: &mut Vec<SkippedAnalysis>,
) -> Result<Option<T>, AnalysisError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AnalysisError::InsufficientData(reason)) => {
            warn!(?kind, %metric, "skipping pooled analysis: {reason}");
            skipped.push(SkippedAnalysis {
                kind,
                metric,
                reason,
            });
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Run every configured analysis over `analyzer`.
///
/// Per-season and pooled tables come first; bootstrap intervals and
/// correlations are computed on the pooled cohorts only.
pub fn run<R>(
    analyzer: &AggregateAnalyzer,
    config: &Config,
    metrics: &[Column],
    rng: &mut R,
) -> Result<Report, AnalysisError>
where
    R: Rng + ?Sized,
{
    let percentile = config.analysis.percentile;
    let resamples = config.bootstrap.resamples;
    let level = config.bootstrap.confidence_level;

    let seasons = analyzer
        .years()
        .iter()
        .map(|&year| analyzer.tabulate_for_period(year, percentile, metrics))
        .collect::<Result<Vec<_>, _>>()?;
    let pooled = analyzer.tabulate(ScopeSelection::Pooled, percentile, metrics)?;
    info!(seasons = seasons.len(), metrics = metrics.len(), "built comparison tables");

    let mut bootstrap = Vec::new();
    let mut correlations = Vec::new();
    let mut skipped = Vec::new();
    for &metric in metrics {
        let interval = analyzer.bootstrap_aggregate(percentile, metric, resamples, level, rng);
        if let Some(b) = skip_insufficient(interval, AnalysisKind::Bootstrap, metric, &mut skipped)? {
            bootstrap.push(b);
        }

        let correlation = analyzer.correlate_aggregate(percentile, metric);
        if let Some(c) =
            skip_insufficient(correlation, AnalysisKind::Correlation, metric, &mut skipped)?
        {
            correlations.push(c);
        }
    }
    info!(
        resamples,
        intervals = bootstrap.len(),
        correlations = correlations.len(),
        "finished pooled analyses"
    );

    Ok(Report {
        description: analyzer.describe(),
        percentile,
        variant: analyzer.comparator().variant(),
        resamples,
        confidence_level: level,
        seasons,
        pooled,
        bootstrap,
        correlations,
        skipped,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
