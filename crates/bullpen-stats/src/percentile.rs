// Percentile computation with linear interpolation between closest ranks.

use crate::StatsError;

/// Reject percentiles outside `[0, 100]` (and NaN).
pub fn validate_percentile(pct: f64) -> Result<(), StatsError> {
    if !(0.0..=100.0).contains(&pct) {
        return Err(StatsError::InvalidInput(format!(
            "percentile must be between 0 and 100 inclusive, got {pct}"
        )));
    }
    Ok(())
}

/// Compute the `pct`-th percentile of `values`.
///
/// Ranks run from `0` to `n - 1`; a fractional rank interpolates linearly
/// between its two neighbours, so the 0th percentile is the minimum and the
/// 100th is the maximum.
pub fn percentile(values: &[f64], pct: f64) -> Result<f64, StatsError> {
    validate_percentile(pct)?;
    if values.is_empty() {
        return Err(StatsError::InvalidInput(
            "cannot take a percentile of an empty sample".into(),
        ));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let rank = pct / 100.0 * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = (lower_idx + 1).min(n - 1);
    let fraction = rank - lower_idx as f64;

    Ok(sorted[lower_idx] + fraction * (sorted[upper_idx] - sorted[lower_idx]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_odd_sample() {
        let p = percentile(&[5.0, 1.0, 3.0, 2.0, 4.0], 50.0).unwrap();
        assert!((p - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn interpolates_between_ranks() {
        // rank = 0.8 * 4 = 3.2 -> 4 + 0.2 * (5 - 4)
        let p = percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], 80.0).unwrap();
        assert!((p - 4.2).abs() < 1e-12);
    }

    #[test]
    fn extremes_are_min_and_max() {
        let values = [7.0, -2.0, 11.0, 3.5];
        assert_eq!(percentile(&values, 0.0).unwrap(), -2.0);
        assert_eq!(percentile(&values, 100.0).unwrap(), 11.0);
    }

    #[test]
    fn single_value() {
        assert_eq!(percentile(&[42.0], 37.5).unwrap(), 42.0);
    }

    #[test]
    fn out_of_range_percentile_rejected() {
        assert!(matches!(
            percentile(&[1.0, 2.0], 150.0),
            Err(StatsError::InvalidInput(_))
        ));
        assert!(matches!(
            percentile(&[1.0, 2.0], -0.5),
            Err(StatsError::InvalidInput(_))
        ));
        assert!(matches!(
            percentile(&[1.0, 2.0], f64::NAN),
            Err(StatsError::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_sample_rejected() {
        assert!(matches!(
            percentile(&[], 50.0),
            Err(StatsError::InvalidInput(_))
        ));
    }
}
