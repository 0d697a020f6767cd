//! Reading and writing workflow data
//!
//! - CSV station tables (daily, monthly, annual rainfall, coordinates,
//!   trend results)
//! - GeoJSON boundary polygons
//! - GeoTIFF export of interpolated rasters

mod geojson;
mod geotiff;
mod table;

pub use geojson::{parse_boundary, read_boundary};
pub use geotiff::{write_geotiff, write_geotiff_to_buffer};
pub use table::{
    merge_trend_coordinates, normalize_header, read_annual, read_coordinates, read_daily,
    read_monthly, read_table, read_table_from_reader, read_trend_values,
    read_trend_values_from_reader, write_table, write_table_to_writer,
};
