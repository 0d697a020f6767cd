//! Daily -> monthly / annual / seasonal rainfall totals

use chrono::{Datelike, NaiveDate};
use raintrend_core::records::{
    parse_date, AnnualTotal, DailyObservation, DailyRecord, MonthlyTotal,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Season;

/// Markers read as a missing rainfall value
const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>",
    "#N/A", "#NA",
];

/// Seasonal rainfall total for one station and year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalTotal {
    #[serde(rename = "Station")]
    pub station: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Season")]
    pub season: Season,
    #[serde(rename = "Rainfall")]
    pub rainfall: f64,
}

fn is_missing(value: &str) -> bool {
    MISSING_MARKERS.contains(&value.trim())
}

/// Turn raw daily rows into observations.
///
/// Rows with an unparseable date or a missing rainfall value are dropped.
/// Rainfall that is present but not a number counts as 0 mm.
pub fn clean_daily(records: &[DailyRecord]) -> Vec<DailyObservation> {
    records
        .iter()
        .filter_map(|r| {
            let date = parse_date(&r.date)?;
            let raw = r.rainfall.as_deref().filter(|s| !is_missing(s))?;
            let rainfall = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| !v.is_nan())
                .unwrap_or(0.0);
            Some(DailyObservation {
                station: r.station.clone(),
                date,
                rainfall,
            })
        })
        .collect()
}

/// Monthly totals, sorted by station, year, month
pub fn monthly_totals(observations: &[DailyObservation]) -> Vec<MonthlyTotal> {
    let mut totals: BTreeMap<(&str, i32, u32), f64> = BTreeMap::new();
    for obs in observations {
        *totals
            .entry((obs.station.as_str(), obs.date.year(), obs.date.month()))
            .or_insert(0.0) += obs.rainfall;
    }
    totals
        .into_iter()
        .map(|((station, year, month), sum)| MonthlyTotal {
            station: station.to_string(),
            year,
            month,
            rainfall: Some(sum),
        })
        .collect()
}

/// Annual totals, sorted by station, year
pub fn annual_totals(observations: &[DailyObservation]) -> Vec<AnnualTotal> {
    let mut totals: BTreeMap<(&str, i32), f64> = BTreeMap::new();
    for obs in observations {
        *totals
            .entry((obs.station.as_str(), obs.date.year()))
            .or_insert(0.0) += obs.rainfall;
    }
    totals
        .into_iter()
        .map(|((station, year), sum)| AnnualTotal {
            station: station.to_string(),
            year,
            rainfall: Some(sum),
        })
        .collect()
}

/// Seasonal totals from monthly totals, sorted by station, year, season.
///
/// Months outside 1..=12 are ignored. Missing monthly values add nothing,
/// so a season whose months are all missing totals 0.
pub fn seasonal_totals(monthly: &[MonthlyTotal]) -> Vec<SeasonalTotal> {
    let mut totals: BTreeMap<(&str, i32, Season), f64> = BTreeMap::new();
    for m in monthly {
        let Some(season) = Season::from_month(m.month) else {
            continue;
        };
        let sum = totals.entry((m.station.as_str(), m.year, season)).or_insert(0.0);
        if let Some(rain) = m.rainfall.filter(|v| !v.is_nan()) {
            *sum += rain;
        }
    }
    totals
        .into_iter()
        .map(|((station, year, season), rainfall)| SeasonalTotal {
            station: station.to_string(),
            year,
            season,
            rainfall,
        })
        .collect()
}

/// Continuous month-by-month series for one station, starting at its first
/// month and ending at its last. Months without a total are NaN.
pub fn monthly_series(monthly: &[MonthlyTotal], station: &str) -> Vec<(NaiveDate, f64)> {
    let totals: BTreeMap<(i32, u32), f64> = monthly
        .iter()
        .filter(|m| m.station == station && (1..=12).contains(&m.month))
        .map(|m| ((m.year, m.month), m.rainfall.unwrap_or(f64::NAN)))
        .collect();

    let (Some(&first), Some(&last)) = (totals.keys().next(), totals.keys().next_back()) else {
        return Vec::new();
    };

    let mut series = Vec::new();
    let (mut year, mut month) = first;
    while (year, month) <= last {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, 1) {
            let value = totals.get(&(year, month)).copied().unwrap_or(f64::NAN);
            series.push((date, value));
        }
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    series
}

/// Trailing rolling mean over `window` values.
///
/// NaN values are skipped; a position with fewer than `min_periods`
/// non-NaN values in its window is NaN.
pub fn rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let (sum, count) = values[start..=i]
                .iter()
                .filter(|v| !v.is_nan())
                .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
            if count >= min_periods.max(1) {
                sum / count as f64
            } else {
                f64::NAN
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(station: &str, date: &str, rainfall: Option<&str>) -> DailyRecord {
        DailyRecord {
            station: station.to_string(),
            date: date.to_string(),
            rainfall: rainfall.map(str::to_string),
        }
    }

    fn sample() -> Vec<DailyRecord> {
        vec![
            record("Dhaka", "2000-01-01", Some("10")),
            record("Dhaka", "2000-01-15", Some("5.5")),
            record("Dhaka", "2000-02-03", Some("trace")),
            record("Dhaka", "2000-12-31", Some("2")),
            record("Dhaka", "2001-07-01", Some("100")),
            record("Dhaka", "bad date", Some("50")),
            record("Dhaka", "2001-07-02", Some("NA")),
            record("Dhaka", "2001-07-03", None),
            record("Bogra", "2000-06-10", Some("30")),
        ]
    }

    #[test]
    fn test_clean_daily_drops_and_zeroes() {
        let obs = clean_daily(&sample());
        assert_eq!(obs.len(), 6);
        let trace = obs.iter().find(|o| o.date.month() == 2).unwrap();
        assert_eq!(trace.rainfall, 0.0);
    }

    #[test]
    fn test_monthly_totals_sorted() {
        let monthly = monthly_totals(&clean_daily(&sample()));
        let keys: Vec<(String, i32, u32)> =
            monthly.iter().map(|m| (m.station.clone(), m.year, m.month)).collect();
        assert_eq!(
            keys,
            vec![
                ("Bogra".to_string(), 2000, 6),
                ("Dhaka".to_string(), 2000, 1),
                ("Dhaka".to_string(), 2000, 2),
                ("Dhaka".to_string(), 2000, 12),
                ("Dhaka".to_string(), 2001, 7),
            ]
        );
        assert_relative_eq!(monthly[1].rainfall.unwrap(), 15.5);
    }

    #[test]
    fn test_annual_totals_match_monthly() {
        let obs = clean_daily(&sample());
        let annual = annual_totals(&obs);
        let monthly = monthly_totals(&obs);
        for a in &annual {
            let sum: f64 = monthly
                .iter()
                .filter(|m| m.station == a.station && m.year == a.year)
                .filter_map(|m| m.rainfall)
                .sum();
            assert_relative_eq!(a.rainfall.unwrap(), sum);
        }
        assert_eq!(annual.len(), 3);
    }

    #[test]
    fn test_seasonal_totals() {
        let monthly = vec![
            MonthlyTotal { station: "A".into(), year: 2000, month: 1, rainfall: Some(5.0) },
            MonthlyTotal { station: "A".into(), year: 2000, month: 12, rainfall: Some(7.0) },
            MonthlyTotal { station: "A".into(), year: 2000, month: 6, rainfall: Some(300.0) },
            MonthlyTotal { station: "A".into(), year: 2000, month: 7, rainfall: None },
            MonthlyTotal { station: "A".into(), year: 2000, month: 10, rainfall: None },
            MonthlyTotal { station: "A".into(), year: 2000, month: 13, rainfall: Some(1.0) },
        ];
        let seasonal = seasonal_totals(&monthly);
        assert_eq!(seasonal.len(), 3);
        assert_eq!(seasonal[0].season, Season::Winter);
        assert_relative_eq!(seasonal[0].rainfall, 12.0);
        assert_eq!(seasonal[1].season, Season::Monsoon);
        assert_relative_eq!(seasonal[1].rainfall, 300.0);
        assert_eq!(seasonal[2].season, Season::PostMonsoon);
        assert_eq!(seasonal[2].rainfall, 0.0);
    }

    #[test]
    fn test_monthly_series_fills_gaps() {
        let monthly = vec![
            MonthlyTotal { station: "A".into(), year: 2000, month: 11, rainfall: Some(5.0) },
            MonthlyTotal { station: "A".into(), year: 2001, month: 2, rainfall: Some(7.0) },
            MonthlyTotal { station: "B".into(), year: 2000, month: 1, rainfall: Some(1.0) },
        ];
        let series = monthly_series(&monthly, "A");
        assert_eq!(series.len(), 4);
        assert_eq!(series[0].0, NaiveDate::from_ymd_opt(2000, 11, 1).unwrap());
        assert!(series[1].1.is_nan() && series[2].1.is_nan());
        assert_eq!(series[3], (NaiveDate::from_ymd_opt(2001, 2, 1).unwrap(), 7.0));
        assert!(monthly_series(&monthly, "C").is_empty());
    }

    #[test]
    fn test_rolling_mean() {
        let values = [1.0, 2.0, f64::NAN, 4.0, 5.0];
        let rolled = rolling_mean(&values, 3, 2);
        assert!(rolled[0].is_nan());
        assert_relative_eq!(rolled[1], 1.5);
        assert_relative_eq!(rolled[2], 1.5);
        assert_relative_eq!(rolled[3], 3.0);
        assert_relative_eq!(rolled[4], 4.5);
    }
}
