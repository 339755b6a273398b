// Independent two-sample t-tests.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::descriptive::{mean, sample_variance};
use crate::{StatsError, MIN_OBSERVATIONS};

/// Which variance assumption the t-test makes.
///
/// `Welch` does not assume equal variances and is the default. `Student`
/// pools the two variances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TTestVariant {
    #[default]
    Welch,
    Student,
}

impl std::fmt::Display for TTestVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TTestVariant::Welch => write!(f, "welch"),
            TTestVariant::Student => write!(f, "student"),
        }
    }
}

/// Outcome of a two-sided two-sample t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TTestResult {
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
}

/// Two-sided test of equal means between `a` and `b`.
///
/// Both groups need at least two observations. A zero standard error (both
/// groups constant) is reported as insufficient data rather than NaN.
pub fn two_sample_t_test(
    a: &[f64],
    b: &[f64],
    variant: TTestVariant,
) -> Result<TTestResult, StatsError> {
    for (label, group) in [("first", a), ("second", b)] {
        if group.len() < MIN_OBSERVATIONS {
            return Err(StatsError::InsufficientData(format!(
                "{label} group has {} observations, need at least {MIN_OBSERVATIONS}",
                group.len()
            )));
        }
    }

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (var_a, var_b) = (sample_variance(a), sample_variance(b));

    let (std_err_sq, dof) = match variant {
        TTestVariant::Welch => {
            let (qa, qb) = (var_a / na, var_b / nb);
            let se_sq = qa + qb;
            let dof = se_sq.powi(2) / (qa.powi(2) / (na - 1.0) + qb.powi(2) / (nb - 1.0));
            (se_sq, dof)
        }
        TTestVariant::Student => {
            let dof = na + nb - 2.0;
            let pooled = ((na - 1.0) * var_a + (nb - 1.0) * var_b) / dof;
            (pooled * (1.0 / na + 1.0 / nb), dof)
        }
    };

    if std_err_sq <= 0.0 || !std_err_sq.is_finite() {
        return Err(StatsError::InsufficientData(
            "both groups have zero variance; t statistic is undefined".into(),
        ));
    }

    let t = (mean(a) - mean(b)) / std_err_sq.sqrt();
    Ok(TTestResult {
        t_statistic: t,
        degrees_of_freedom: dof,
        p_value: two_sided_p(t, dof)?,
    })
}

/// Two-sided tail probability of a Student's t statistic.
pub(crate) fn two_sided_p(t: f64, dof: f64) -> Result<f64, StatsError> {
    if t.is_infinite() {
        return Ok(0.0);
    }
    let dist = StudentsT::new(0.0, 1.0, dof).map_err(|e| {
        StatsError::InvalidInput(format!("t distribution with {dof} degrees of freedom: {e}"))
    })?;
    Ok((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}
