//! Row types of the station CSV tables.
//!
//! Field names follow the normalized CSV headers (see
//! [`crate::io::normalize_header`]): `Station`, `Date`, `Rainfall`, ...

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Accepted date layouts for daily observations, tried in order.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];

/// Parse a daily observation date, trying every entry of [`DATE_FORMATS`].
///
/// A trailing time component ("2001-03-04 00:00:00") is ignored.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s.split_whitespace().next().unwrap_or(s);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// One row of the daily rainfall table, as read.
///
/// Date and rainfall stay textual: unparseable dates and blank rainfall
/// drop the row, while non-numeric rainfall counts as zero.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyRecord {
    #[serde(rename = "Station")]
    pub station: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Rainfall", default)]
    pub rainfall: Option<String>,
}

/// A cleaned daily observation
#[derive(Debug, Clone, PartialEq)]
pub struct DailyObservation {
    pub station: String,
    pub date: NaiveDate,
    /// Rainfall depth in mm
    pub rainfall: f64,
}

/// Monthly rainfall total for one station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    #[serde(rename = "Station")]
    pub station: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Rainfall")]
    pub rainfall: Option<f64>,
}

/// Annual rainfall total for one station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualTotal {
    #[serde(rename = "Station")]
    pub station: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Rainfall")]
    pub rainfall: Option<f64>,
}

/// Geographic location of a station (WGS84 degrees)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationCoordinate {
    #[serde(rename = "Station")]
    pub station: String,
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
}

/// The slice of a trend result table needed for mapping: one value column
/// plus the optional season and significance columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendValue {
    pub station: String,
    pub season: Option<String>,
    pub value: Option<f64>,
    pub p_value: Option<f64>,
}

/// A station with coordinates and a finite trend value, ready for mapping
#[derive(Debug, Clone, PartialEq)]
pub struct StationPoint {
    pub station: String,
    pub longitude: f64,
    pub latitude: f64,
    pub value: f64,
    pub p_value: Option<f64>,
}
