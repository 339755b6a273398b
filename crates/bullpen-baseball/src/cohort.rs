// Higher-paid vs. lower-paid cohorts: percentile partitioning and the
// statistics that compare the two groups on a metric column.

use bullpen_stats::{self as stats, BootstrapEstimate, Correlation, TTestVariant};
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::schema::{Column, ReliefPitcher, Season};
use crate::AnalysisError;

// ---------------------------------------------------------------------------
// Cohorts
// ---------------------------------------------------------------------------

/// The cutoff value one season was split at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeasonCutoff {
    pub year: u16,
    pub cutoff: f64,
}

/// Disjoint higher/lower subsets of one or more seasons.
///
/// Rows at or above a season's cutoff are in `higher`; rows below it are in
/// `lower`. Rows missing the threshold value are in neither.
#[derive(Debug, Clone, Default)]
pub struct Cohorts<'a> {
    pub higher: Vec<&'a ReliefPitcher>,
    pub lower: Vec<&'a ReliefPitcher>,
    pub cutoffs: Vec<SeasonCutoff>,
}

impl<'a> Cohorts<'a> {
    /// Pool another season's already-partitioned cohorts into this one.
    pub fn append(&mut self, other: Cohorts<'a>) {
        self.higher.extend(other.higher);
        self.lower.extend(other.lower);
        self.cutoffs.extend(other.cutoffs);
    }

    pub fn higher_values(&self, column: Column) -> Vec<f64> {
        values(&self.higher, column)
    }

    pub fn lower_values(&self, column: Column) -> Vec<f64> {
        values(&self.lower, column)
    }
}

/// Non-missing values of `column`, in row order.
fn values(rows: &[&ReliefPitcher], column: Column) -> Vec<f64> {
    rows.iter().filter_map(|p| p.value(column)).collect()
}

/// Paired `(x, y)` values for rows that have both columns.
fn paired(rows: &[&ReliefPitcher], x: Column, y: Column) -> (Vec<f64>, Vec<f64>) {
    rows.iter()
        .filter_map(|p| Some((p.value(x)?, p.value(y)?)))
        .unzip()
}

/// Split `season` at the `percentile`-th percentile of `threshold`.
///
/// Ties with the cutoff go to the higher cohort.
pub fn partition(
    season: &Season,
    threshold: Column,
    percentile: f64,
) -> Result<Cohorts<'_>, AnalysisError> {
    stats::validate_percentile(percentile)?;

    let rows: Vec<&ReliefPitcher> = season.pitchers().iter().collect();
    let observed = values(&rows, threshold);
    if observed.is_empty() {
        return Err(AnalysisError::InsufficientData(format!(
            "season {} has no {threshold} values to split on",
            season.year()
        )));
    }
    let cutoff = stats::percentile(&observed, percentile)?;

    let mut cohorts = Cohorts {
        cutoffs: vec![SeasonCutoff {
            year: season.year(),
            cutoff,
        }],
        ..Cohorts::default()
    };
    for p in rows {
        match p.value(threshold) {
            Some(v) if v >= cutoff => cohorts.higher.push(p),
            Some(_) => cohorts.lower.push(p),
            None => {}
        }
    }

    debug!(
        year = season.year(),
        %threshold,
        percentile,
        cutoff,
        higher = cohorts.higher.len(),
        lower = cohorts.lower.len(),
        "partitioned season"
    );
    Ok(cohorts)
}

fn require(
    cohort: &str,
    metric: Column,
    got: usize,
    min: usize,
) -> Result<(), AnalysisError> {
    if got < min {
        return Err(AnalysisError::InsufficientData(format!(
            "{cohort} paid cohort has {got} {metric} observations, need at least {min}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// t-test and group means for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricComparison {
    pub metric: Column,
    pub p_value: f64,
    pub mean_higher: f64,
    pub mean_lower: f64,
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub n_higher: usize,
    pub n_lower: usize,
    pub variant: TTestVariant,
}

/// Bootstrap confidence interval of the mean for each cohort.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BootstrapComparison {
    pub metric: Column,
    pub higher: BootstrapEstimate,
    pub lower: BootstrapEstimate,
}

/// Correlation of the threshold column with a metric, within each cohort.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrelationComparison {
    pub metric: Column,
    pub against: Column,
    pub higher: Correlation,
    pub lower: Correlation,
}

// ---------------------------------------------------------------------------
// Comparator
// ---------------------------------------------------------------------------

/// Partitions seasons on a threshold column and compares the resulting
/// cohorts. Defaults to splitting on salary with Welch's t-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CohortComparator {
    threshold: Column,
    variant: TTestVariant,
}

impl Default for CohortComparator {
    fn default() -> Self {
        Self::new(Column::Salary, TTestVariant::Welch)
    }
}

impl CohortComparator {
    pub fn new(threshold: Column, variant: TTestVariant) -> Self {
        Self { threshold, variant }
    }

    pub fn threshold(&self) -> Column {
        self.threshold
    }

    pub fn variant(&self) -> TTestVariant {
        self.variant
    }

    pub fn partition<'a>(
        &self,
        season: &'a Season,
        percentile: f64,
    ) -> Result<Cohorts<'a>, AnalysisError> {
        partition(season, self.threshold, percentile)
    }

    /// Two-sample t-test of `metric` between the cohorts, plus both means.
    pub fn compare_means(
        &self,
        cohorts: &Cohorts<'_>,
        metric: Column,
    ) -> Result<MetricComparison, AnalysisError> {
        let higher = cohorts.higher_values(metric);
        let lower = cohorts.lower_values(metric);
        require("higher", metric, higher.len(), stats::MIN_OBSERVATIONS)?;
        require("lower", metric, lower.len(), stats::MIN_OBSERVATIONS)?;

        let test = stats::two_sample_t_test(&higher, &lower, self.variant).map_err(|e| match e {
            stats::StatsError::InsufficientData(msg) => {
                AnalysisError::InsufficientData(format!("{metric}: {msg}"))
            }
            other => other.into(),
        })?;

        Ok(MetricComparison {
            metric,
            p_value: test.p_value,
            mean_higher: stats::mean(&higher),
            mean_lower: stats::mean(&lower),
            t_statistic: test.t_statistic,
            degrees_of_freedom: test.degrees_of_freedom,
            n_higher: higher.len(),
            n_lower: lower.len(),
            variant: self.variant,
        })
    }

    /// Bootstrap each cohort's `metric` independently and report the
    /// percentile interval of the resample means.
    pub fn bootstrap_interval<R>(
        &self,
        cohorts: &Cohorts<'_>,
        metric: Column,
        resamples: usize,
        level: f64,
        rng: &mut R,
    ) -> Result<BootstrapComparison, AnalysisError>
    where
        R: Rng + ?Sized,
    {
        let higher = cohorts.higher_values(metric);
        let lower = cohorts.lower_values(metric);
        require("higher", metric, higher.len(), stats::MIN_OBSERVATIONS)?;
        require("lower", metric, lower.len(), stats::MIN_OBSERVATIONS)?;

        Ok(BootstrapComparison {
            metric,
            higher: stats::bootstrap_mean_interval(&higher, resamples, level, rng)?,
            lower: stats::bootstrap_mean_interval(&lower, resamples, level, rng)?,
        })
    }

    /// Pearson correlation of the threshold column with `metric`, computed
    /// separately inside each cohort.
    pub fn correlate(
        &self,
        cohorts: &Cohorts<'_>,
        metric: Column,
    ) -> Result<CorrelationComparison, AnalysisError> {
        Ok(CorrelationComparison {
            metric,
            against: self.threshold,
            higher: self.correlate_cohort("higher", &cohorts.higher, metric)?,
            lower: self.correlate_cohort("lower", &cohorts.lower, metric)?,
        })
    }

    fn correlate_cohort(
        &self,
        cohort: &str,
        rows: &[&ReliefPitcher],
        metric: Column,
    ) -> Result<Correlation, AnalysisError> {
        let (x, y) = paired(rows, self.threshold, metric);
        require(cohort, metric, x.len(), stats::MIN_OBSERVATIONS)?;
        stats::pearson(&x, &y).map_err(|e| match e {
            stats::StatsError::InsufficientData(msg) => AnalysisError::InsufficientData(format!(
                "{cohort} paid cohort, {} vs {metric}: {msg}",
                self.threshold
            )),
            other => other.into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
