//! CSV station tables

use crate::error::{Error, Result};
use crate::records::{
    AnnualTotal, DailyRecord, MonthlyTotal, StationCoordinate, StationPoint, TrendValue,
};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;

/// Normalize a CSV header: trim, upper-case the first letter and lower-case
/// the rest ("MK_p_value" -> "Mk_p_value", " station" -> "Station").
pub fn normalize_header(header: &str) -> String {
    let mut chars = header.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Read a file as text, falling back to Latin-1 when it is not valid UTF-8.
/// Station coordinate sheets exported from spreadsheets are often Latin-1.
fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    })
}

fn normalized_headers<R: Read>(rdr: &mut csv::Reader<R>) -> Result<StringRecord> {
    let headers = rdr.headers()?;
    Ok(headers.iter().map(normalize_header).collect())
}

fn check_columns(headers: &StringRecord, required: &[&str]) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingColumns {
            missing,
            found: headers.iter().map(str::to_string).collect(),
        })
    }
}

/// Deserialize every row of a CSV stream after normalizing its headers.
///
/// `required` lists normalized column names that must be present.
pub fn read_table_from_reader<T, R>(reader: R, required: &[&str]) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = normalized_headers(&mut rdr)?;
    check_columns(&headers, required)?;

    rdr.records()
        .map(|record| Ok(record?.deserialize(Some(&headers))?))
        .collect()
}

/// Read a CSV file into typed rows; see [`read_table_from_reader`].
pub fn read_table<T, P>(path: P, required: &[&str]) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let text = read_text(path.as_ref())?;
    read_table_from_reader(text.as_bytes(), required)
}

pub fn read_daily<P: AsRef<Path>>(path: P) -> Result<Vec<DailyRecord>> {
    read_table(path, &["Station", "Date", "Rainfall"])
}

pub fn read_monthly<P: AsRef<Path>>(path: P) -> Result<Vec<MonthlyTotal>> {
    read_table(path, &["Station", "Year", "Month", "Rainfall"])
}

pub fn read_annual<P: AsRef<Path>>(path: P) -> Result<Vec<AnnualTotal>> {
    read_table(path, &["Station", "Year", "Rainfall"])
}

pub fn read_coordinates<P: AsRef<Path>>(path: P) -> Result<Vec<StationCoordinate>> {
    read_table(path, &["Station", "Latitude", "Longitude"])
}

fn parse_optional_f64(field: Option<&str>) -> Option<f64> {
    field.and_then(|s| s.trim().parse::<f64>().ok())
}

/// Read the station, `value_column`, and (when present) `Season` and
/// `Mk_p_value` columns of a trend result table.
pub fn read_trend_values_from_reader<R: Read>(
    reader: R,
    value_column: &str,
) -> Result<Vec<TrendValue>> {
    let value_column = normalize_header(value_column);
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = normalized_headers(&mut rdr)?;
    check_columns(&headers, &["Station", value_column.as_str()])?;

    let index = |name: &str| headers.iter().position(|h| h == name);
    let station_idx = index("Station").ok_or_else(|| Error::Parse("Station column".into()))?;
    let value_idx =
        index(&value_column).ok_or_else(|| Error::Parse(format!("{value_column} column")))?;
    let season_idx = index("Season");
    let p_idx = index("Mk_p_value");

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(TrendValue {
            station: record.get(station_idx).unwrap_or_default().to_string(),
            season: season_idx
                .and_then(|i| record.get(i))
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            value: parse_optional_f64(record.get(value_idx)),
            p_value: p_idx.and_then(|i| parse_optional_f64(record.get(i))),
        });
    }
    Ok(rows)
}

pub fn read_trend_values<P: AsRef<Path>>(path: P, value_column: &str) -> Result<Vec<TrendValue>> {
    let text = read_text(path.as_ref())?;
    read_trend_values_from_reader(text.as_bytes(), value_column)
}

/// Left-join trend values with station coordinates on the station name.
///
/// Rows without a coordinate or without a finite trend value are dropped.
/// When a station appears more than once in `coordinates`, the first row
/// wins.
pub fn merge_trend_coordinates(
    trends: &[TrendValue],
    coordinates: &[StationCoordinate],
) -> Vec<StationPoint> {
    let mut lookup: HashMap<&str, (Option<f64>, Option<f64>)> = HashMap::new();
    for c in coordinates {
        lookup
            .entry(c.station.as_str())
            .or_insert((c.longitude, c.latitude));
    }

    trends
        .iter()
        .filter_map(|t| {
            let (lon, lat) = lookup.get(t.station.as_str())?;
            let (longitude, latitude) = ((*lon)?, (*lat)?);
            let value = t.value.filter(|v| v.is_finite())?;
            if !longitude.is_finite() || !latitude.is_finite() {
                return None;
            }
            Some(StationPoint {
                station: t.station.clone(),
                longitude,
                latitude,
                value,
                p_value: t.p_value,
            })
        })
        .collect()
}

/// Serialize rows as CSV with a header line.
pub fn write_table_to_writer<T, W>(writer: W, rows: &[T]) -> Result<()>
where
    T: Serialize,
    W: Write,
{
    let mut wtr = WriterBuilder::new().from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_table<T, P>(path: P, rows: &[T]) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let file = std::fs::File::create(path.as_ref())?;
    write_table_to_writer(file, rows)
}
