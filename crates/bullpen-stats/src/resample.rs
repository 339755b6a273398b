// Nonparametric bootstrap: resampling with replacement and percentile
// confidence intervals over the distribution of resample means.

use rand::Rng;
use serde::Serialize;

use crate::descriptive::mean;
use crate::percentile::percentile;
use crate::StatsError;

/// Confidence interval bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub level: f64,
}

/// Empirical confidence interval for the mean plus the mean of the bootstrap
/// distribution itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BootstrapEstimate {
    pub interval: ConfidenceInterval,
    pub bootstrap_mean: f64,
    pub resamples: usize,
}

fn check_sample(sample: &[f64]) -> Result<(), StatsError> {
    if sample.is_empty() {
        return Err(StatsError::InvalidInput(
            "cannot resample from an empty sample".into(),
        ));
    }
    Ok(())
}

fn check_resamples(resamples: usize) -> Result<(), StatsError> {
    if resamples < 1 {
        return Err(StatsError::InvalidInput(
            "number of resamples must be at least 1".into(),
        ));
    }
    Ok(())
}

/// Endless stream of bootstrap resamples drawn from `sample`.
///
/// Each resample has `sample.len()` elements picked by drawing indices
/// uniformly from `[0, n)` with replacement, so duplicates are expected.
pub fn resamples<'a, R>(
    sample: &'a [f64],
    rng: &'a mut R,
) -> Result<impl Iterator<Item = Vec<f64>> + 'a, StatsError>
where
    R: Rng + ?Sized,
{
    check_sample(sample)?;
    let n = sample.len();
    Ok(std::iter::repeat_with(move || {
        (0..n).map(|_| sample[rng.gen_range(0..n)]).collect()
    }))
}

/// Draw `count` bootstrap resamples from `sample`.
pub fn bootstrap<R>(sample: &[f64], count: usize, rng: &mut R) -> Result<Vec<Vec<f64>>, StatsError>
where
    R: Rng + ?Sized,
{
    check_resamples(count)?;
    Ok(resamples(sample, rng)?.take(count).collect())
}

/// Draw `count` bootstrap resamples and reduce each to its mean.
///
/// Same draws as [`bootstrap`] without holding every resample in memory.
pub fn bootstrap_means<R>(sample: &[f64], count: usize, rng: &mut R) -> Result<Vec<f64>, StatsError>
where
    R: Rng + ?Sized,
{
    check_resamples(count)?;
    Ok(resamples(sample, rng)?
        .take(count)
        .map(|resample| mean(&resample))
        .collect())
}

fn check_level(level: f64) -> Result<(), StatsError> {
    if !(level > 0.0 && level < 1.0) {
        return Err(StatsError::InvalidInput(format!(
            "confidence level must be between 0 and 1 exclusive, got {level}"
        )));
    }
    Ok(())
}

/// Percentile interval over a distribution of resample means.
///
/// A `level` of 0.95 takes the 2.5th and 97.5th percentiles.
pub fn percentile_interval(means: &[f64], level: f64) -> Result<ConfidenceInterval, StatsError> {
    check_level(level)?;
    let tail = (1.0 - level) / 2.0 * 100.0;
    Ok(ConfidenceInterval {
        lower: percentile(means, tail)?,
        upper: percentile(means, 100.0 - tail)?,
        level,
    })
}

/// Bootstrap the mean of `sample` and summarize the resulting distribution.
pub fn bootstrap_mean_interval<R>(
    sample: &[f64],
    count: usize,
    level: f64,
    rng: &mut R,
) -> Result<BootstrapEstimate, StatsError>
where
    R: Rng + ?Sized,
{
    check_level(level)?;

    let means = bootstrap_means(sample, count, rng)?;
    Ok(BootstrapEstimate {
        interval: percentile_interval(&means, level)?,
        bootstrap_mean: mean(&means),
        resamples: count,
    })
}
