//! End-to-end workflow on synthetic station data:
//! daily CSV -> annual totals -> station trends -> merged with coordinates
//! -> masked IDW trend surface -> GeoTIFF / grid CSV.

use approx::assert_relative_eq;
use raintrend_algorithms::interpolation::{trend_surface, CellStatus, IdwParams, SurfaceParams};
use raintrend_algorithms::statistics::{
    annual_totals, clean_daily, monthly_totals, seasonal_totals, seasonal_trends, station_trends,
    Trend, TrendParams,
};
use raintrend_core::io::{
    merge_trend_coordinates, parse_boundary, read_table_from_reader,
    read_trend_values_from_reader, write_geotiff_to_buffer, write_table_to_writer,
};
use raintrend_core::records::{DailyRecord, StationCoordinate};

/// (name, lon, lat, monthly increase in mm per year)
const STATIONS: &[(&str, f64, f64, f64)] = &[
    ("Dhaka", 90.40, 23.70, 2.0),
    ("Mymensingh", 90.40, 24.75, 1.0),
    ("Comilla", 91.18, 23.43, -1.0),
    ("Faridpur", 89.84, 23.60, 0.5),
    ("Barisal", 90.36, 22.70, -2.0),
    ("Madaripur", 90.20, 23.17, 3.0),
];

const BOUNDARY: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {"type": "Feature", "properties": {"name": "North"},
         "geometry": {"type": "Polygon",
                      "coordinates": [[[89.5,23.5],[91.5,23.5],[91.5,25.0],[89.5,25.0],[89.5,23.5]]]}},
        {"type": "Feature", "properties": {"name": "South"},
         "geometry": {"type": "Polygon",
                      "coordinates": [[[89.5,22.5],[91.5,22.5],[91.5,23.5],[89.5,23.5],[89.5,22.5]]]}}
    ]
}"#;

fn daily_csv() -> String {
    let mut csv = String::from("station, DATE ,Rainfall\n");
    for &(name, _, _, k) in STATIONS {
        for year in 1990..2002 {
            for month in 1..=12 {
                let rain = 100.0 + k * (year - 1990) as f64;
                csv.push_str(&format!("{name},{year}-{month:02}-01,{rain}\n"));
            }
        }
        // Junk rows that must not change any total
        csv.push_str(&format!("{name},not a date,500\n"));
        csv.push_str(&format!("{name},1995-06-15,NA\n"));
    }
    csv
}

fn coordinates_csv() -> String {
    let mut csv = String::from("Station,Latitude,Longitude\n");
    for &(name, lon, lat, _) in STATIONS {
        csv.push_str(&format!("{name},{lat},{lon}\n"));
    }
    csv
}

#[test]
fn daily_to_station_trends() {
    let records: Vec<DailyRecord> =
        read_table_from_reader(daily_csv().as_bytes(), &["Station", "Date", "Rainfall"]).unwrap();
    let observations = clean_daily(&records);
    assert_eq!(observations.len(), STATIONS.len() * 12 * 12);

    let annual = annual_totals(&observations);
    assert_eq!(annual.len(), STATIONS.len() * 12);

    let trends = station_trends(&annual, &TrendParams::default()).unwrap();
    assert_eq!(trends.len(), STATIONS.len());
    for t in &trends {
        let &(_, _, _, k) = STATIONS.iter().find(|s| s.0 == t.station).unwrap();
        assert_eq!(t.n_years, 12);
        assert_relative_eq!(t.sen_slope, 12.0 * k, max_relative = 1e-9);
        assert_relative_eq!(t.linear_slope, 12.0 * k, max_relative = 1e-9);
        let expected = if k > 0.0 { Trend::Increasing } else { Trend::Decreasing };
        assert_eq!(t.trend, expected);
    }

    let seasonal = seasonal_totals(&monthly_totals(&observations));
    let seasonal = seasonal_trends(&seasonal, &TrendParams::default()).unwrap();
    assert_eq!(seasonal.len(), STATIONS.len() * 4);
}

#[test]
fn trends_to_masked_surface() {
    let records: Vec<DailyRecord> =
        read_table_from_reader(daily_csv().as_bytes(), &["Station", "Date", "Rainfall"]).unwrap();
    let annual = annual_totals(&clean_daily(&records));
    let trends = station_trends(&annual, &TrendParams::default()).unwrap();

    let mut table = Vec::new();
    write_table_to_writer(&mut table, &trends).unwrap();
    let values = read_trend_values_from_reader(table.as_slice(), "Sen_slope_mm_per_year").unwrap();
    let coords: Vec<StationCoordinate> = read_table_from_reader(
        coordinates_csv().as_bytes(),
        &["Station", "Latitude", "Longitude"],
    )
    .unwrap();
    let stations = merge_trend_coordinates(&values, &coords);
    assert_eq!(stations.len(), STATIONS.len());

    let boundary = parse_boundary(BOUNDARY).unwrap();
    let params = SurfaceParams {
        grid_spacing: 10_000.0,
        ..Default::default()
    };
    let surface = trend_surface(&stations, &boundary, &params).unwrap();

    let lo = stations.iter().map(|s| s.value).fold(f64::INFINITY, f64::min);
    let hi = stations.iter().map(|s| s.value).fold(f64::NEG_INFINITY, f64::max);

    let samples = surface.samples();
    assert!(!samples.is_empty());
    for s in &samples {
        assert!(s.value >= lo - 1e-9 && s.value <= hi + 1e-9);
        assert!(s.lon > 89.5 - 1e-6 && s.lon < 91.5 + 1e-6);
        assert!(s.lat > 22.5 - 1e-6 && s.lat < 25.0 + 1e-6);
    }

    assert_eq!(surface.field.count(CellStatus::Estimate), samples.len());
    let outside = surface.field.count(CellStatus::OutsideRegion);
    assert!(outside > 0, "outer boundary cells are masked");

    // Chunking never changes the field
    let chunked = SurfaceParams {
        idw: IdwParams {
            chunk_size: 7,
            ..params.idw.clone()
        },
        ..params.clone()
    };
    let other = trend_surface(&stations, &boundary, &chunked).unwrap();
    assert_eq!(other.values().len(), surface.values().len());
    for (a, b) in surface.values().iter().zip(other.values()) {
        assert!((a.is_nan() && b.is_nan()) || a == b);
    }

    let raster = surface.to_raster().unwrap();
    let tiff = write_geotiff_to_buffer(&raster).unwrap();
    assert!(tiff.starts_with(b"II") || tiff.starts_with(b"MM"));

    let mut grid_csv = Vec::new();
    write_table_to_writer(&mut grid_csv, &samples).unwrap();
    let text = String::from_utf8(grid_csv).unwrap();
    assert!(text.starts_with("lon,lat,x,y,value\n"));
    assert_eq!(text.lines().count(), samples.len() + 1);
}
