// Pearson product-moment correlation with a two-sided p-value.

use serde::Serialize;

use crate::descriptive::mean;
use crate::ttest::two_sided_p;
use crate::{StatsError, MIN_OBSERVATIONS};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Correlation {
    pub coefficient: f64,
    pub p_value: f64,
    pub observations: usize,
}

/// Pearson correlation between paired samples `x` and `y`.
///
/// The p-value tests the null of zero correlation with a t statistic on
/// `n - 2` degrees of freedom. With exactly two pairs the coefficient is
/// always +/-1 and the p-value is 1.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<Correlation, StatsError> {
    if x.len() != y.len() {
        return Err(StatsError::InvalidInput(format!(
            "paired samples differ in length: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < MIN_OBSERVATIONS {
        return Err(StatsError::InsufficientData(format!(
            "{n} paired observations, need at least {MIN_OBSERVATIONS}"
        )));
    }

    let (mx, my) = (mean(x), mean(y));
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&a, &b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return Err(StatsError::InsufficientData(
            "zero variance in a correlated variable; coefficient is undefined".into(),
        ));
    }

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let p_value = if n == 2 {
        1.0
    } else if r.abs() == 1.0 {
        0.0
    } else {
        let dof = (n - 2) as f64;
        two_sided_p(r * (dof / (1.0 - r * r)).sqrt(), dof)?
    };

    Ok(Correlation {
        coefficient: r,
        p_value,
        observations: n,
    })
}
