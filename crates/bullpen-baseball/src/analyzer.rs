// Cohort analysis across a collection of seasons, either one season at a
// time or pooled after each season has been partitioned on its own.

use rand::Rng;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use bullpen_stats::TTestVariant;

use crate::cohort::{
    BootstrapComparison, CohortComparator, Cohorts, CorrelationComparison, MetricComparison,
};
use crate::schema::{Column, Season};
use crate::AnalysisError;

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Which seasons an analysis runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeSelection {
    /// A single season, by year.
    Season(u16),
    /// Every held season, partitioned separately and then combined.
    Pooled,
}

impl fmt::Display for ScopeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeSelection::Season(year) => write!(f, "{year}"),
            ScopeSelection::Pooled => f.write_str("pooled"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// A metric left out of a table, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedMetric {
    pub metric: Column,
    pub reason: String,
}

/// Mean comparisons for several metrics over one scope. Rows keep the order
/// the metrics were requested in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonTable {
    pub scope: ScopeSelection,
    pub percentile: f64,
    pub variant: TTestVariant,
    pub rows: Vec<MetricComparison>,
    pub skipped: Vec<SkippedMetric>,
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Holds the loaded seasons and runs cohort comparisons over them.
#[derive(Debug, Clone)]
pub struct AggregateAnalyzer {
    seasons: Vec<Season>,
    /// Distinct years, most recent first.
    years: Vec<u16>,
    comparator: CohortComparator,
}

impl AggregateAnalyzer {
    /// Wrap `seasons`. Rejects an empty collection and repeated years.
    pub fn new(seasons: Vec<Season>, comparator: CohortComparator) -> Result<Self, AnalysisError> {
        if seasons.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "at least one season is required".into(),
            ));
        }

        let mut years: Vec<u16> = seasons.iter().map(Season::year).collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        if let Some(pair) = years.windows(2).find(|w| w[0] == w[1]) {
            return Err(AnalysisError::InvalidInput(format!(
                "season {} appears more than once",
                pair[0]
            )));
        }

        Ok(Self {
            seasons,
            years,
            comparator,
        })
    }

    pub fn comparator(&self) -> &CohortComparator {
        &self.comparator
    }

    pub fn seasons(&self) -> &[Season] {
        &self.seasons
    }

    /// Held years, most recent first.
    pub fn years(&self) -> &[u16] {
        &self.years
    }

    pub fn describe(&self) -> String {
        let newest = self.years[0];
        let oldest = self.years[self.years.len() - 1];
        if newest == oldest {
            format!("season {newest}")
        } else {
            format!("seasons range from {oldest} to {newest}")
        }
    }

    /// Position of `year` in the held collection.
    pub fn lookup_by_period(&self, year: u16) -> Result<usize, AnalysisError> {
        self.seasons
            .iter()
            .position(|s| s.year() == year)
            .ok_or(AnalysisError::NotFound { year })
    }

    pub fn season(&self, year: u16) -> Result<&Season, AnalysisError> {
        let idx = self.lookup_by_period(year)?;
        Ok(&self.seasons[idx])
    }

    /// Partition every season in `scope` at `percentile`, each against its
    /// own cutoff, and combine the results.
    pub fn cohorts(&self, scope: ScopeSelection, percentile: f64) -> Result<Cohorts<'_>, AnalysisError> {
        let selected: Vec<&Season> = match scope {
            ScopeSelection::Season(year) => vec![self.season(year)?],
            ScopeSelection::Pooled => self.seasons.iter().collect(),
        };

        let mut combined = Cohorts::default();
        for season in selected {
            combined.append(self.comparator.partition(season, percentile)?);
        }
        debug!(
            %scope,
            percentile,
            higher = combined.higher.len(),
            lower = combined.lower.len(),
            "built cohorts"
        );
        Ok(combined)
    }

    // -- Mean comparison --

    pub fn compare(
        &self,
        scope: ScopeSelection,
        percentile: f64,
        metric: Column,
    ) -> Result<MetricComparison, AnalysisError> {
        let cohorts = self.cohorts(scope, percentile)?;
        self.comparator.compare_means(&cohorts, metric)
    }

    pub fn compare_for_period(
        &self,
        year: u16,
        percentile: f64,
        metric: Column,
    ) -> Result<MetricComparison, AnalysisError> {
        self.compare(ScopeSelection::Season(year), percentile, metric)
    }

    pub fn compare_aggregate(
        &self,
        percentile: f64,
        metric: Column,
    ) -> Result<MetricComparison, AnalysisError> {
        self.compare(ScopeSelection::Pooled, percentile, metric)
    }

    // -- Bootstrap --

    pub fn bootstrap<R>(
        &self,
        scope: ScopeSelection,
        percentile: f64,
        metric: Column,
        resamples: usize,
        level: f64,
        rng: &mut R,
    ) -> Result<BootstrapComparison, AnalysisError>
    where
        R: Rng + ?Sized,
    {
        let cohorts = self.cohorts(scope, percentile)?;
        self.comparator
            .bootstrap_interval(&cohorts, metric, resamples, level, rng)
    }

    pub fn bootstrap_for_period<R>(
        &self,
        year: u16,
        percentile: f64,
        metric: Column,
        resamples: usize,
        level: f64,
        rng: &mut R,
    ) -> Result<BootstrapComparison, AnalysisError>
    where
        R: Rng + ?Sized,
    {
        self.bootstrap(ScopeSelection::Season(year), percentile, metric, resamples, level, rng)
    }

    pub fn bootstrap_aggregate<R>(
        &self,
        percentile: f64,
        metric: Column,
        resamples: usize,
        level: f64,
        rng: &mut R,
    ) -> Result<BootstrapComparison, AnalysisError>
    where
        R: Rng + ?Sized,
    {
        self.bootstrap(ScopeSelection::Pooled, percentile, metric, resamples, level, rng)
    }

    // -- Correlation --

    pub fn correlate(
        &self,
        scope: ScopeSelection,
        percentile: f64,
        metric: Column,
    ) -> Result<CorrelationComparison, AnalysisError> {
        let cohorts = self.cohorts(scope, percentile)?;
        self.comparator.correlate(&cohorts, metric)
    }

    pub fn correlate_for_period(
        &self,
        year: u16,
        percentile: f64,
        metric: Column,
    ) -> Result<CorrelationComparison, AnalysisError> {
        self.correlate(ScopeSelection::Season(year), percentile, metric)
    }

    pub fn correlate_aggregate(
        &self,
        percentile: f64,
        metric: Column,
    ) -> Result<CorrelationComparison, AnalysisError> {
        self.correlate(ScopeSelection::Pooled, percentile, metric)
    }

    // -- Tables --

    /// Compare means for each of `metrics` over `scope`.
    ///
    /// A metric without enough data lands in `skipped`; any other error
    /// aborts the table.
    pub fn tabulate(
        &self,
        scope: ScopeSelection,
        percentile: f64,
        metrics: &[Column],
    ) -> Result<ComparisonTable, AnalysisError> {
        let cohorts = self.cohorts(scope, percentile)?;

        let mut rows = Vec::with_capacity(metrics.len());
        let mut skipped = Vec::new();
        for &metric in metrics {
            match self.comparator.compare_means(&cohorts, metric) {
                Ok(row) => rows.push(row),
                Err(AnalysisError::InsufficientData(reason)) => {
                    warn!(%scope, %metric, "skipping metric: {reason}");
                    skipped.push(SkippedMetric { metric, reason });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(ComparisonTable {
            scope,
            percentile,
            variant: self.comparator.variant(),
            rows,
            skipped,
        })
    }

    pub fn tabulate_for_period(
        &self,
        year: u16,
        percentile: f64,
        metrics: &[Column],
    ) -> Result<ComparisonTable, AnalysisError> {
        self.tabulate(ScopeSelection::Season(year), percentile, metrics)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::pitcher;
    use crate::schema::ReliefPitcher;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn season(year: u16, rows: &[(f64, f64)]) -> Season {
        let pitchers = rows
            .iter()
            .enumerate()
            .map(|(i, &(salary, war))| pitcher(&format!("P{year}-{i}"), salary, war))
            .collect();
        Season::new(year, pitchers).unwrap()
    }

    fn span(first: u16, last: u16) -> AggregateAnalyzer {
        let seasons = (first..=last)
            .map(|y| {
                let rows: Vec<(f64, f64)> = (1..=10u32)
                    .map(|i| (f64::from(i) * f64::from(y - 2000), f64::from(i % 4)))
                    .collect();
                season(y, &rows)
            })
            .collect();
        AggregateAnalyzer::new(seasons, CohortComparator::default()).unwrap()
    }

    /// Period A salaries 1..5, period B salaries 10..50.
    fn two_scales() -> AggregateAnalyzer {
        let a = season(2018, &[(1.0, 0.1), (2.0, 0.7), (3.0, 0.3), (4.0, 0.9), (5.0, 1.5)]);
        let b = season(2019, &[(10.0, 0.2), (20.0, 1.1), (30.0, 0.4), (40.0, 0.8), (50.0, 2.5)]);
        AggregateAnalyzer::new(vec![a, b], CohortComparator::default()).unwrap()
    }

    fn salaries(rows: &[&ReliefPitcher]) -> Vec<f64> {
        let mut v: Vec<f64> = rows.iter().map(|p| p.salary).collect();
        v.sort_by(f64::total_cmp);
        v
    }

    // -- Construction --

    #[test]
    fn years_sorted_descending() {
        let analyzer = span(2015, 2019);
        assert_eq!(analyzer.years(), &[2019, 2018, 2017, 2016, 2015]);
        assert_eq!(analyzer.describe(), "seasons range from 2015 to 2019");
    }

    #[test]
    fn describe_single_season() {
        let analyzer = span(2019, 2019);
        assert_eq!(analyzer.describe(), "season 2019");
    }

    #[test]
    fn rejects_empty_collection() {
        assert!(matches!(
            AggregateAnalyzer::new(vec![], CohortComparator::default()),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_duplicate_years() {
        let a = season(2019, &[(1.0, 1.0)]);
        let b = season(2019, &[(2.0, 1.0)]);
        let err = AggregateAnalyzer::new(vec![a, b], CohortComparator::default()).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InvalidInput("season 2019 appears more than once".into())
        );
    }

    // -- Lookup --

    #[test]
    fn lookup_by_period_resolves_index() {
        let analyzer = span(2015, 2019);
        assert_eq!(analyzer.lookup_by_period(2015).unwrap(), 0);
        assert_eq!(analyzer.lookup_by_period(2019).unwrap(), 4);
        assert_eq!(analyzer.season(2017).unwrap().year(), 2017);
    }

    #[test]
    fn lookup_unknown_year_is_not_found() {
        let analyzer = span(2015, 2019);
        assert_eq!(
            analyzer.lookup_by_period(1899),
            Err(AnalysisError::NotFound { year: 1899 })
        );
        assert!(matches!(
            analyzer.compare_for_period(1899, 80.0, Column::War),
            Err(AnalysisError::NotFound { year: 1899 })
        ));
    }

    // -- Pooling --

    #[test]
    fn pooled_partitions_each_season_first() {
        let analyzer = two_scales();
        let pooled = analyzer.cohorts(ScopeSelection::Pooled, 80.0).unwrap();
        assert_eq!(salaries(&pooled.higher), vec![5.0, 50.0]);
        assert_eq!(salaries(&pooled.lower), vec![1.0, 2.0, 3.0, 4.0, 10.0, 20.0, 30.0, 40.0]);
        assert_eq!(pooled.cutoffs.len(), 2);

        // Splitting the combined table instead would only pick from 2019.
        let mixed = season(
            2000,
            &[(1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (4.0, 0.0), (5.0, 0.0),
              (10.0, 0.0), (20.0, 0.0), (30.0, 0.0), (40.0, 0.0), (50.0, 0.0)],
        );
        let naive = analyzer.comparator().partition(&mixed, 80.0).unwrap();
        assert_eq!(salaries(&naive.higher), vec![40.0, 50.0]);
        assert_ne!(salaries(&pooled.higher), salaries(&naive.higher));
    }

    #[test]
    fn compare_aggregate_uses_pooled_cohorts() {
        let analyzer = two_scales();
        let r = analyzer.compare_aggregate(80.0, Column::War).unwrap();
        assert_eq!((r.n_higher, r.n_lower), (2, 8));
        assert_relative_eq!(r.mean_higher, 2.0, epsilon = 1e-12);
        assert_relative_eq!(r.mean_lower, 0.5625, epsilon = 1e-12);
    }

    #[test]
    fn compare_for_period_single_row_cohort_is_insufficient() {
        let analyzer = two_scales();
        assert!(matches!(
            analyzer.compare_for_period(2019, 80.0, Column::War),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn season_scope_matches_direct_partition() {
        let analyzer = span(2015, 2017);
        let via_scope = analyzer.compare_for_period(2016, 50.0, Column::War).unwrap();
        let season = analyzer.season(2016).unwrap();
        let cohorts = analyzer.comparator().partition(season, 50.0).unwrap();
        let direct = analyzer.comparator().compare_means(&cohorts, Column::War).unwrap();
        assert_eq!(via_scope, direct);
    }

    #[test]
    fn invalid_percentile_propagates() {
        let analyzer = span(2015, 2016);
        assert!(matches!(
            analyzer.cohorts(ScopeSelection::Pooled, 150.0),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    // -- Bootstrap and correlation --

    #[test]
    fn bootstrap_aggregate_is_seeded() {
        let analyzer = span(2015, 2019);
        let a = analyzer
            .bootstrap_aggregate(70.0, Column::War, 1_000, 0.95, &mut ChaCha8Rng::seed_from_u64(3))
            .unwrap();
        let b = analyzer
            .bootstrap_aggregate(70.0, Column::War, 1_000, 0.95, &mut ChaCha8Rng::seed_from_u64(3))
            .unwrap();
        assert_eq!(a, b);
        assert!(a.higher.interval.lower <= a.higher.interval.upper);
    }

    #[test]
    fn bootstrap_for_period_rejects_zero_resamples() {
        let analyzer = span(2015, 2016);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(matches!(
            analyzer.bootstrap_for_period(2015, 50.0, Column::War, 0, 0.95, &mut rng),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn correlate_aggregate_counts_pooled_rows() {
        let analyzer = span(2015, 2019);
        let r = analyzer.correlate_aggregate(50.0, Column::War).unwrap();
        assert_eq!(r.higher.observations, 25);
        assert_eq!(r.lower.observations, 25);
        let one = analyzer.correlate_for_period(2017, 50.0, Column::War).unwrap();
        assert_eq!(one.higher.observations, 5);
    }

    // -- Tables --

    #[test]
    fn tabulate_preserves_metric_order_and_skips_thin_metrics() {
        let pitchers: Vec<ReliefPitcher> = (1..=8u32)
            .map(|i| {
                let mut p = pitcher(&format!("P{i}"), f64::from(i), f64::from(i % 3));
                p.ra9 = 2.0 + f64::from(i * 7 % 5);
                p.rar = f64::from(i * i % 6);
                p
            })
            .collect();
        let s = Season::new(2019, pitchers).unwrap();
        let analyzer = AggregateAnalyzer::new(vec![s], CohortComparator::default()).unwrap();

        let metrics = [Column::Rar, Column::SavePct, Column::War, Column::Ra9];
        let table = analyzer.tabulate_for_period(2019, 50.0, &metrics).unwrap();

        let order: Vec<Column> = table.rows.iter().map(|r| r.metric).collect();
        assert_eq!(order, vec![Column::Rar, Column::War, Column::Ra9]);
        assert_eq!(table.skipped.len(), 1);
        assert_eq!(table.skipped[0].metric, Column::SavePct);
        assert_eq!(table.scope, ScopeSelection::Season(2019));
        assert_eq!(table.variant, TTestVariant::Welch);
    }

    #[test]
    fn tabulate_unknown_season_fails() {
        let analyzer = span(2015, 2016);
        assert!(matches!(
            analyzer.tabulate(ScopeSelection::Season(2020), 80.0, &[Column::War]),
            Err(AnalysisError::NotFound { year: 2020 })
        ));
    }

    #[test]
    fn scope_display() {
        assert_eq!(ScopeSelection::Season(2017).to_string(), "2017");
        assert_eq!(ScopeSelection::Pooled.to_string(), "pooled");
    }
}
