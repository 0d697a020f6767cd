//! raintrend CLI - station rainfall trends and masked IDW trend maps

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use raintrend_algorithms::interpolation::{trend_surface, IdwParams, SurfaceParams};
use raintrend_algorithms::statistics::{
    annual_totals, clean_daily, mann_kendall, monthly_series, monthly_totals, seasonal_totals,
    seasonal_trends, station_trends, Season, TrendParams,
};
use raintrend_colormap::{symmetric_range, ColorScheme, ColormapParams};
use raintrend_core::io::{
    merge_trend_coordinates, read_annual, read_boundary, read_coordinates, read_daily,
    read_monthly, read_trend_values, write_geotiff, write_table,
};
use raintrend_core::records::{StationCoordinate, StationPoint, TrendValue};
use raintrend_core::{BoundaryRegion, CRS};
use raintrend_plot::{
    interpolated_map, monthly_timeseries, station_timeseries, station_trend_map, MapStyle,
    SeriesStyle,
};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "raintrend")]
#[command(author, version, about = "Station rainfall trends and masked IDW trend maps", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate daily station rainfall into monthly, annual and seasonal totals
    Aggregate {
        /// Daily rainfall CSV (Station, Date, Rainfall)
        input: PathBuf,
        /// Directory receiving monthly.csv, annual.csv and seasonal.csv
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Mann-Kendall, Sen's slope and linear trend of annual totals per station
    Trends {
        /// Annual totals CSV (Station, Year, Rainfall)
        input: PathBuf,
        /// Output CSV
        output: PathBuf,
        #[command(flatten)]
        trend: TrendArgs,
    },
    /// Mann-Kendall and Sen's slope per station and season
    SeasonalTrends {
        /// Monthly totals CSV (Station, Year, Month, Rainfall)
        input: PathBuf,
        /// Output CSV
        output: PathBuf,
        #[command(flatten)]
        trend: TrendArgs,
    },
    /// Interpolate station trends onto a grid masked to the boundary
    Interpolate {
        #[command(flatten)]
        inputs: MapInputs,
        /// Boundary GeoJSON
        #[arg(short, long)]
        boundary: PathBuf,
        /// Output GeoTIFF
        output: PathBuf,
        /// Also write the estimated cells as CSV (lon, lat, x, y, value)
        #[arg(long)]
        grid_csv: Option<PathBuf>,
        /// Also render the surface as an SVG map
        #[arg(long)]
        svg: Option<PathBuf>,
        /// IDW distance exponent
        #[arg(short, long, default_value = "2.0")]
        power: f64,
        /// Search radius in planar units (metres)
        #[arg(short, long, default_value = "150000")]
        radius: f64,
        /// Use every station regardless of distance
        #[arg(long)]
        no_radius: bool,
        /// Grid spacing in planar units (metres)
        #[arg(long, default_value = "3000")]
        resolution: f64,
        /// Grid points per distance-matrix chunk
        #[arg(long, default_value = "20000")]
        chunk_size: usize,
        /// Planar CRS used for distances and the output raster
        #[arg(long, default_value = "EPSG:3857")]
        crs: String,
        /// Colour bands in the SVG map (0 for a continuous ramp)
        #[arg(long, default_value = "20")]
        levels: usize,
        /// Colour scheme of the SVG map: RdBu_r, divergent, grayscale, rainfall
        #[arg(long, default_value = "RdBu_r")]
        scheme: String,
        /// Region name used in the map title
        #[arg(long, default_value = "Bangladesh")]
        region: String,
    },
    /// Map station trends coloured on a symmetric scale
    Map {
        #[command(flatten)]
        inputs: MapInputs,
        /// Boundary GeoJSON drawn under the stations
        #[arg(short, long)]
        boundary: Option<PathBuf>,
        /// Output SVG
        output: PathBuf,
        /// Map title
        #[arg(long, default_value = "Annual Rainfall Trend (Sen's slope)")]
        title: String,
        #[command(flatten)]
        style: StyleArgs,
    },
    /// One station trend map per season, all on the same colour scale
    SeasonalMaps {
        #[command(flatten)]
        inputs: MapInputs,
        /// Boundary GeoJSON drawn under the stations
        #[arg(short, long)]
        boundary: Option<PathBuf>,
        /// Directory receiving one SVG per season
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
        /// Region name used in the titles
        #[arg(long, default_value = "Bangladesh")]
        region: String,
        /// Period shown in the titles
        #[arg(long, default_value = "1989–2023")]
        period: String,
        #[command(flatten)]
        style: StyleArgs,
    },
    /// Plot the annual (and optionally monthly) rainfall of one station
    Timeseries {
        /// Annual totals CSV
        input: PathBuf,
        /// Station name
        #[arg(short, long)]
        station: String,
        /// Output SVG
        output: PathBuf,
        /// Monthly totals CSV for the monthly plot
        #[arg(long)]
        monthly: Option<PathBuf>,
        /// Output SVG of the monthly plot
        #[arg(long, requires = "monthly")]
        monthly_output: Option<PathBuf>,
        /// Significance level of the Mann-Kendall test
        #[arg(long, default_value = "0.05")]
        alpha: f64,
    },
}

#[derive(Args)]
struct TrendArgs {
    /// Minimum years of data for a station to be tested
    #[arg(long, default_value = "10")]
    min_years: usize,
    /// Significance level of the Mann-Kendall test
    #[arg(long, default_value = "0.05")]
    alpha: f64,
}

#[derive(Args)]
struct MapInputs {
    /// Trend results CSV
    #[arg(short, long)]
    trends: PathBuf,
    /// Station coordinates CSV (Station, Latitude, Longitude)
    #[arg(short, long)]
    coordinates: PathBuf,
    /// Column holding the mapped value
    #[arg(long, default_value = "Sen_slope_mm_per_year")]
    value_column: String,
}

#[derive(Args)]
struct StyleArgs {
    /// Colour scheme: RdBu_r, divergent, grayscale, rainfall
    #[arg(long, default_value = "RdBu_r")]
    scheme: String,
    /// p-value below which a station is ringed
    #[arg(long, default_value = "0.05")]
    significance: f64,
    /// Hide station names
    #[arg(long)]
    no_labels: bool,
}

impl TrendArgs {
    fn params(&self) -> TrendParams {
        TrendParams {
            alpha: self.alpha,
            min_years: self.min_years,
        }
    }
}

impl StyleArgs {
    fn map_style(&self) -> MapStyle {
        MapStyle {
            significance: self.significance,
            labels: !self.no_labels,
            ..Default::default()
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn parse_scheme(name: &str) -> Result<ColorScheme> {
    ColorScheme::from_name(name).with_context(|| {
        let known: Vec<&str> = ColorScheme::ALL.iter().map(|s| s.name()).collect();
        format!("Unknown colour scheme: {}. Use one of {}.", name, known.join(", "))
    })
}

fn read_boundary_file(path: &Path) -> Result<BoundaryRegion> {
    let boundary = read_boundary(path)
        .with_context(|| format!("Failed to read boundary {}", path.display()))?;
    debug!("Boundary: {} polygon part(s)", boundary.len());
    Ok(boundary)
}

fn read_map_inputs(inputs: &MapInputs) -> Result<(Vec<TrendValue>, Vec<StationCoordinate>)> {
    let trends = read_trend_values(&inputs.trends, &inputs.value_column)
        .with_context(|| format!("Failed to read trends {}", inputs.trends.display()))?;
    let coordinates = read_coordinates(&inputs.coordinates).with_context(|| {
        format!("Failed to read coordinates {}", inputs.coordinates.display())
    })?;
    Ok((trends, coordinates))
}

/// Trend rows joined with coordinates; rows that cannot be placed are dropped
fn place_stations(trends: &[TrendValue], coordinates: &[StationCoordinate]) -> Vec<StationPoint> {
    let points = merge_trend_coordinates(trends, coordinates);
    let dropped = trends.len() - points.len();
    if dropped > 0 {
        warn!("{} trend row(s) without coordinates or a finite value were dropped", dropped);
    }
    points
}

fn write_svg(svg: &str, path: &Path) -> Result<()> {
    std::fs::write(path, svg).with_context(|| format!("Failed to write {}", path.display()))
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Aggregation ──────────────────────────────────────────────
        Commands::Aggregate { input, out_dir } => {
            let pb = spinner("Reading daily rainfall...");
            let daily = read_daily(&input).context("Failed to read daily rainfall")?;
            pb.finish_and_clear();

            let start = Instant::now();
            let observations = clean_daily(&daily);
            info!(
                "Daily rows: {} read, {} usable",
                daily.len(),
                observations.len()
            );
            let monthly = monthly_totals(&observations);
            let annual = annual_totals(&observations);
            let seasonal = seasonal_totals(&monthly);
            let elapsed = start.elapsed();

            create_dir(&out_dir)?;
            let monthly_path = out_dir.join("monthly.csv");
            let annual_path = out_dir.join("annual.csv");
            let seasonal_path = out_dir.join("seasonal.csv");
            write_table(&monthly_path, &monthly).context("Failed to write monthly totals")?;
            write_table(&annual_path, &annual).context("Failed to write annual totals")?;
            write_table(&seasonal_path, &seasonal).context("Failed to write seasonal totals")?;
            done("Monthly totals", &monthly_path, elapsed);
            done("Annual totals", &annual_path, elapsed);
            done("Seasonal totals", &seasonal_path, elapsed);
        }

        // ── Trends ───────────────────────────────────────────────────
        Commands::Trends {
            input,
            output,
            trend,
        } => {
            let annual = read_annual(&input).context("Failed to read annual totals")?;
            let start = Instant::now();
            let results =
                station_trends(&annual, &trend.params()).context("Failed to compute trends")?;
            let elapsed = start.elapsed();
            info!("Stations with a trend: {}", results.len());
            write_table(&output, &results).context("Failed to write trends")?;
            done("Annual trends", &output, elapsed);
        }

        Commands::SeasonalTrends {
            input,
            output,
            trend,
        } => {
            let monthly = read_monthly(&input).context("Failed to read monthly totals")?;
            let start = Instant::now();
            let seasonal = seasonal_totals(&monthly);
            let results = seasonal_trends(&seasonal, &trend.params())
                .context("Failed to compute seasonal trends")?;
            let elapsed = start.elapsed();
            info!("Station-season trends: {}", results.len());
            write_table(&output, &results).context("Failed to write seasonal trends")?;
            done("Seasonal trends", &output, elapsed);
        }

        // ── Interpolation ────────────────────────────────────────────
        Commands::Interpolate {
            inputs,
            boundary,
            output,
            grid_csv,
            svg,
            power,
            radius,
            no_radius,
            resolution,
            chunk_size,
            crs,
            levels,
            scheme,
            region,
        } => {
            let planar_crs = CRS::parse(&crs)
                .with_context(|| format!("Invalid CRS: {}. Use e.g. EPSG:3857.", crs))?;
            let scheme = parse_scheme(&scheme)?;
            let (trends, coordinates) = read_map_inputs(&inputs)?;
            let stations = place_stations(&trends, &coordinates);
            info!("Stations: {} with coordinates", stations.len());
            let boundary = read_boundary_file(&boundary)?;

            let radius = (!no_radius).then_some(radius);
            let params = SurfaceParams {
                planar_crs,
                grid_spacing: resolution,
                idw: IdwParams {
                    power,
                    radius,
                    chunk_size,
                    ..Default::default()
                },
            };

            let pb = spinner("Interpolating...");
            let start = Instant::now();
            let surface = trend_surface(&stations, &boundary, &params)
                .context("Failed to interpolate trend surface")?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();

            let (ny, nx) = surface.grid().shape();
            info!("Grid: {} x {} in {}", nx, ny, planar_crs);
            match surface.field.value_range() {
                Some((lo, hi)) => info!("Interpolated range: {:.3} to {:.3}", lo, hi),
                None => warn!("No grid cell inside the boundary is within reach of a station"),
            }

            let raster = surface.to_raster().context("Failed to build raster")?;
            write_geotiff(&raster, &output).context("Failed to write output")?;
            done("Interpolated trend", &output, elapsed);

            if let Some(path) = grid_csv {
                write_table(&path, &surface.samples()).context("Failed to write grid CSV")?;
                done("Grid values", &path, elapsed);
            }

            if let Some(path) = svg {
                let (lo, hi) = surface
                    .field
                    .value_range()
                    .unwrap_or_else(|| symmetric_range(std::iter::empty()));
                let colors = ColormapParams::with_range(scheme, lo, hi).with_levels(levels);
                let radius_label = radius.map_or("none".to_string(), |r| format!("{} m", r));
                let title = format!(
                    "Interpolated (IDW) Sen's slope masked to {} (power={}, radius={})",
                    region, power, radius_label
                );
                let map = interpolated_map(
                    &surface,
                    &boundary,
                    &stations,
                    &colors,
                    &title,
                    &MapStyle::default(),
                )
                .context("Failed to render map")?;
                write_svg(&map, &path)?;
                done("Interpolated map", &path, elapsed);
            }
        }

        // ── Maps ─────────────────────────────────────────────────────
        Commands::Map {
            inputs,
            boundary,
            output,
            title,
            style,
        } => {
            let scheme = parse_scheme(&style.scheme)?;
            let (trends, coordinates) = read_map_inputs(&inputs)?;
            let stations = place_stations(&trends, &coordinates);
            info!("Stations: {} with coordinates", stations.len());
            let boundary = boundary.as_deref().map(read_boundary_file).transpose()?;

            let start = Instant::now();
            let colors = ColormapParams::symmetric(scheme, stations.iter().map(|s| s.value));
            let map = station_trend_map(
                &stations,
                boundary.as_ref(),
                &colors,
                &title,
                None,
                &style.map_style(),
            )
            .context("Failed to render map")?;
            let elapsed = start.elapsed();
            write_svg(&map, &output)?;
            done("Trend map", &output, elapsed);
        }

        Commands::SeasonalMaps {
            inputs,
            boundary,
            out_dir,
            region,
            period,
            style,
        } => {
            let scheme = parse_scheme(&style.scheme)?;
            let (trends, coordinates) = read_map_inputs(&inputs)?;
            let boundary = boundary.as_deref().map(read_boundary_file).transpose()?;

            let mut rows: BTreeMap<Season, Vec<TrendValue>> = BTreeMap::new();
            for row in trends {
                match row.season.as_deref().map(str::parse::<Season>) {
                    Some(Ok(season)) => rows.entry(season).or_default().push(row),
                    Some(Err(e)) => warn!("Station {}: {}", row.station, e),
                    None => warn!("Station {}: no season", row.station),
                }
            }
            let by_season: BTreeMap<Season, Vec<StationPoint>> = rows
                .iter()
                .map(|(&season, rows)| (season, place_stations(rows, &coordinates)))
                .collect();
            if by_season.is_empty() {
                anyhow::bail!(
                    "No seasonal rows in {}; expected a Season column",
                    inputs.trends.display()
                );
            }

            // One scale for every season so the maps compare
            let (lo, hi) = symmetric_range(by_season.values().flatten().map(|s| s.value));
            let colors = ColormapParams::with_range(scheme, lo, hi);
            let map_style = style.map_style();
            create_dir(&out_dir)?;

            let start = Instant::now();
            for season in Season::ALL {
                let Some(points) = by_season.get(&season) else {
                    warn!("{}: no stations, map skipped", season);
                    continue;
                };
                let title = format!("{} Rainfall Trend in {} ({})", season, region, period);
                let note = format!("Months: {}", season.months_label());
                let map = station_trend_map(
                    points,
                    boundary.as_ref(),
                    &colors,
                    &title,
                    Some(&note),
                    &map_style,
                )
                .with_context(|| format!("Failed to render {} map", season))?;
                let path = out_dir.join(format!(
                    "{}_trend_map.svg",
                    season.name().to_lowercase()
                ));
                write_svg(&map, &path)?;
                done(&format!("{} map", season), &path, start.elapsed());
            }
        }

        // ── Time series ──────────────────────────────────────────────
        Commands::Timeseries {
            input,
            station,
            output,
            monthly,
            monthly_output,
            alpha,
        } => {
            let annual = read_annual(&input).context("Failed to read annual totals")?;
            let mut rows: Vec<(i32, f64)> = annual
                .iter()
                .filter(|a| a.station == station)
                .map(|a| (a.year, a.rainfall.unwrap_or(f64::NAN)))
                .collect();
            if rows.is_empty() {
                anyhow::bail!("Station {} not found in {}", station, input.display());
            }
            rows.sort_by_key(|&(year, _)| year);
            let (years, rain): (Vec<i32>, Vec<f64>) = rows.into_iter().unzip();

            let start = Instant::now();
            let mk = match mann_kendall(&rain, alpha) {
                Ok(mk) => Some(mk),
                Err(e) => {
                    warn!("{}: no Mann-Kendall result ({})", station, e);
                    None
                }
            };
            let series_style = SeriesStyle::default();
            let svg = station_timeseries(&station, &years, &rain, mk.as_ref(), &series_style)
                .context("Failed to render time series")?;
            write_svg(&svg, &output)?;
            done("Annual time series", &output, start.elapsed());

            if let (Some(monthly), Some(path)) = (monthly, monthly_output) {
                let totals = read_monthly(&monthly).context("Failed to read monthly totals")?;
                let series = monthly_series(&totals, &station);
                let svg = monthly_timeseries(&station, &series, &series_style)
                    .context("Failed to render monthly time series")?;
                write_svg(&svg, &path)?;
                done("Monthly time series", &path, start.elapsed());
            }
        }
    }

    Ok(())
}
