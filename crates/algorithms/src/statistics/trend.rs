//! Monotonic trend tests for rainfall series
//!
//! - Mann-Kendall: non-parametric test on the sign of all pairwise
//!   differences, with tie-corrected variance and continuity correction
//! - Sen's slope: median of pairwise slopes
//! - Ordinary least squares with a two-sided t-test on the slope
//!
//! Reference:
//! Mann, H. B. (1945). Nonparametric tests against trend. Econometrica.
//! Kendall, M. G. (1975). Rank Correlation Methods. Griffin.
//! Sen, P. K. (1968). Estimates of the regression coefficient based on
//! Kendall's tau. JASA 63(324).

use raintrend_core::records::AnnualTotal;
use raintrend_core::{Error, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};
use std::collections::BTreeMap;
use tracing::warn;

use super::{Season, SeasonalTotal};

/// Minimum number of values for any of the trend tests
pub const MIN_SERIES_LENGTH: usize = 3;

/// Direction of a monotonic trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    #[serde(rename = "increasing")]
    Increasing,
    #[serde(rename = "decreasing")]
    Decreasing,
    #[serde(rename = "no trend")]
    NoTrend,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::NoTrend => "no trend",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the Mann-Kendall test
#[derive(Debug, Clone, PartialEq)]
pub struct MannKendall {
    pub trend: Trend,
    /// Whether the null hypothesis of no trend is rejected
    pub h: bool,
    /// Two-sided p-value
    pub p: f64,
    /// Normalized test statistic
    pub z: f64,
    /// Kendall's tau
    pub tau: f64,
    /// S statistic
    pub s: f64,
    /// Tie-corrected variance of S
    pub var_s: f64,
    /// Sen's slope per time step
    pub slope: f64,
    pub intercept: f64,
    /// Number of non-missing values
    pub n: usize,
}

/// Parameters for the per-station trend tables
#[derive(Debug, Clone, PartialEq)]
pub struct TrendParams {
    /// Significance level (default: 0.05)
    pub alpha: f64,
    /// Series shorter than this are skipped (default: 10)
    pub min_years: usize,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            min_years: 10,
        }
    }
}

impl TrendParams {
    fn validate(&self) -> Result<()> {
        check_alpha(self.alpha)?;
        if self.min_years < MIN_SERIES_LENGTH {
            return Err(Error::invalid(
                "min_years",
                self.min_years,
                format!("must be at least {MIN_SERIES_LENGTH}"),
            ));
        }
        Ok(())
    }
}

fn check_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(Error::invalid("alpha", alpha, "must lie strictly between 0 and 1"))
    }
}

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| Error::Other(e.to_string()))
}

/// Median of the non-NaN values; NaN when there are none
fn nan_median(values: &[f64]) -> f64 {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| !x.is_nan()).collect();
    if v.is_empty() {
        return f64::NAN;
    }
    v.sort_by(|a, b| a.total_cmp(b));
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2.0
    } else {
        v[mid]
    }
}

/// Mann-Kendall trend test on an evenly spaced series.
///
/// NaN values are treated as missing and skipped. The series needs at
/// least [`MIN_SERIES_LENGTH`] non-missing values; infinite values are
/// rejected.
pub fn mann_kendall(values: &[f64], alpha: f64) -> Result<MannKendall> {
    check_alpha(alpha)?;
    if let Some(v) = values.iter().find(|v| v.is_infinite()) {
        return Err(Error::invalid("values", v, "series contains an infinite value"));
    }

    let x: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let n = x.len();
    if n < MIN_SERIES_LENGTH {
        return Err(Error::InsufficientData {
            needed: MIN_SERIES_LENGTH,
            found: n,
        });
    }

    let mut s = 0.0;
    for i in 0..n - 1 {
        for j in i + 1..n {
            s += sign(x[j] - x[i]);
        }
    }

    // Tie correction
    let mut sorted = x.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && sorted[end] == sorted[start] {
            end += 1;
        }
        let t = (end - start) as f64;
        tie_term += t * (t - 1.0) * (2.0 * t + 5.0);
        start = end;
    }
    let nf = n as f64;
    let var_s = (nf * (nf - 1.0) * (2.0 * nf + 5.0) - tie_term) / 18.0;

    let z = if s > 0.0 {
        (s - 1.0) / var_s.sqrt()
    } else if s < 0.0 {
        (s + 1.0) / var_s.sqrt()
    } else {
        0.0
    };

    let normal = standard_normal()?;
    let p = 2.0 * normal.sf(z.abs());
    let h = z.abs() > normal.inverse_cdf(1.0 - alpha / 2.0);
    let trend = match (h, z) {
        (true, z) if z > 0.0 => Trend::Increasing,
        (true, z) if z < 0.0 => Trend::Decreasing,
        _ => Trend::NoTrend,
    };

    let tau = s / (0.5 * nf * (nf - 1.0));

    // Sen's slope on the series positions, so missing years keep their gap
    let index: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
    let slope = sens_slope(&index, values);
    let present: Vec<f64> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .map(|(i, _)| i as f64)
        .collect();
    let intercept = nan_median(values) - nan_median(&present) * slope;

    Ok(MannKendall {
        trend,
        h,
        p,
        z,
        tau,
        s,
        var_s,
        slope,
        intercept,
        n,
    })
}

fn sign(d: f64) -> f64 {
    if d > 0.0 {
        1.0
    } else if d < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Sen's slope: median of `(y[j] - y[i]) / (x[j] - x[i])` over all pairs
/// with distinct x. Pairs with a NaN are skipped; NaN when no pair is left.
pub fn sens_slope(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    let mut slopes = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in i + 1..n {
            let dx = x[j] - x[i];
            let dy = y[j] - y[i];
            if dx != 0.0 && !dx.is_nan() && !dy.is_nan() {
                slopes.push(dy / dx);
            }
        }
    }
    nan_median(&slopes)
}

/// Ordinary least squares fit of y on x
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegression {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient
    pub r: f64,
    /// Two-sided p-value for a zero slope (Student t, n - 2 dof)
    pub p_value: f64,
    /// Standard error of the slope
    pub stderr: f64,
    pub intercept_stderr: f64,
}

/// Ordinary least squares regression with a t-test on the slope.
///
/// Requires at least [`MIN_SERIES_LENGTH`] finite pairs and at least two
/// distinct x values.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Result<LinearRegression> {
    if x.len() != y.len() {
        return Err(Error::LengthMismatch {
            points: x.len(),
            values: y.len(),
        });
    }
    if let Some(v) = x.iter().chain(y).find(|v| !v.is_finite()) {
        return Err(Error::invalid("values", v, "regression input must be finite"));
    }
    let n = x.len();
    if n < MIN_SERIES_LENGTH {
        return Err(Error::InsufficientData {
            needed: MIN_SERIES_LENGTH,
            found: n,
        });
    }

    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;

    let (mut ssxm, mut ssym, mut ssxym) = (0.0, 0.0, 0.0);
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        ssxm += dx * dx;
        ssym += dy * dy;
        ssxym += dx * dy;
    }
    ssxm /= nf;
    ssym /= nf;
    ssxym /= nf;

    if ssxm == 0.0 {
        return Err(Error::invalid("x", x_mean, "all x values are identical"));
    }

    let r = if ssym == 0.0 {
        0.0
    } else {
        (ssxym / (ssxm * ssym).sqrt()).clamp(-1.0, 1.0)
    };

    let slope = ssxym / ssxm;
    let intercept = y_mean - slope * x_mean;

    const TINY: f64 = 1.0e-20;
    let df = nf - 2.0;
    let t = r * (df / ((1.0 - r + TINY) * (1.0 + r + TINY))).sqrt();
    let student = StudentsT::new(0.0, 1.0, df).map_err(|e| Error::Other(e.to_string()))?;
    let p_value = 2.0 * student.sf(t.abs());

    let stderr = ((1.0 - r * r) * ssym / ssxm / df).sqrt();
    let intercept_stderr = stderr * (ssxm + x_mean * x_mean).sqrt();

    Ok(LinearRegression {
        slope,
        intercept,
        r,
        p_value,
        stderr,
        intercept_stderr,
    })
}

/// Annual trend summary for one station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationTrend {
    #[serde(rename = "Station")]
    pub station: String,
    #[serde(rename(serialize = "n_years", deserialize = "N_years"))]
    pub n_years: usize,
    #[serde(rename(serialize = "MK_tau", deserialize = "Mk_tau"))]
    pub mk_tau: f64,
    #[serde(rename(serialize = "MK_p_value", deserialize = "Mk_p_value"))]
    pub mk_p_value: f64,
    #[serde(rename = "Trend")]
    pub trend: Trend,
    #[serde(rename = "Sen_slope_mm_per_year")]
    pub sen_slope: f64,
    #[serde(rename = "Linear_slope_mm_per_year")]
    pub linear_slope: f64,
    #[serde(rename = "Linear_p_value")]
    pub linear_p_value: f64,
    #[serde(rename = "Mean_rainfall_mm")]
    pub mean_rainfall: f64,
}

/// Seasonal trend summary for one station and season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalTrend {
    #[serde(rename = "Station")]
    pub station: String,
    #[serde(rename = "Season")]
    pub season: Season,
    #[serde(rename(serialize = "n_years", deserialize = "N_years"))]
    pub n_years: usize,
    #[serde(rename(serialize = "MK_tau", deserialize = "Mk_tau"))]
    pub mk_tau: f64,
    #[serde(rename(serialize = "MK_p_value", deserialize = "Mk_p_value"))]
    pub mk_p_value: f64,
    #[serde(rename = "Trend")]
    pub trend: Trend,
    #[serde(rename = "Sen_slope_mm_per_year")]
    pub sen_slope: f64,
    #[serde(rename = "Mean_rainfall_mm")]
    pub mean_rainfall: f64,
}

/// Mann-Kendall, Sen's slope and OLS per station over annual totals.
///
/// Missing totals are dropped, each station's series is ordered by year,
/// and stations with fewer than `min_years` values are skipped. Output is
/// sorted by station name.
pub fn station_trends(annual: &[AnnualTotal], params: &TrendParams) -> Result<Vec<StationTrend>> {
    params.validate()?;

    let mut series: BTreeMap<&str, Vec<(i32, f64)>> = BTreeMap::new();
    for row in annual {
        if let Some(rain) = row.rainfall.filter(|v| !v.is_nan()) {
            series
                .entry(row.station.as_str())
                .or_default()
                .push((row.year, rain));
        }
    }

    let mut results = Vec::new();
    for (station, mut rows) in series {
        if rows.len() < params.min_years {
            continue;
        }
        rows.sort_by_key(|&(year, _)| year);
        let years: Vec<f64> = rows.iter().map(|&(y, _)| y as f64).collect();
        let rain: Vec<f64> = rows.iter().map(|&(_, r)| r).collect();

        let mk = mann_kendall(&rain, params.alpha)?;
        let (linear_slope, linear_p_value) = match linear_regression(&years, &rain) {
            Ok(lr) => (lr.slope, lr.p_value),
            Err(e) => {
                warn!(station, error = %e, "linear regression failed");
                (f64::NAN, f64::NAN)
            }
        };

        results.push(StationTrend {
            station: station.to_string(),
            n_years: rain.len(),
            mk_tau: mk.tau,
            mk_p_value: mk.p,
            trend: mk.trend,
            sen_slope: mk.slope,
            linear_slope,
            linear_p_value,
            mean_rainfall: rain.iter().sum::<f64>() / rain.len() as f64,
        });
    }
    Ok(results)
}

/// Mann-Kendall and Sen's slope per station and season.
///
/// Output is sorted by station, then season order.
pub fn seasonal_trends(
    seasonal: &[SeasonalTotal],
    params: &TrendParams,
) -> Result<Vec<SeasonalTrend>> {
    params.validate()?;

    let mut series: BTreeMap<(&str, Season), Vec<(i32, f64)>> = BTreeMap::new();
    for row in seasonal {
        series
            .entry((row.station.as_str(), row.season))
            .or_default()
            .push((row.year, row.rainfall));
    }

    let mut results = Vec::new();
    for ((station, season), mut rows) in series {
        if rows.len() < params.min_years {
            continue;
        }
        rows.sort_by_key(|&(year, _)| year);
        let rain: Vec<f64> = rows.iter().map(|&(_, r)| r).collect();
        let present: Vec<f64> = rain.iter().copied().filter(|v| !v.is_nan()).collect();
        if present.len() < MIN_SERIES_LENGTH {
            continue;
        }

        let mk = mann_kendall(&rain, params.alpha)?;
        results.push(SeasonalTrend {
            station: station.to_string(),
            season,
            n_years: rain.len(),
            mk_tau: mk.tau,
            mk_p_value: mk.p,
            trend: mk.trend,
            sen_slope: mk.slope,
            mean_rainfall: present.iter().sum::<f64>() / present.len() as f64,
        });
    }
    Ok(results)
}
