//! GeoTIFF export of interpolated rasters (tiff crate, no GDAL).
//!
//! Writes single-band 32-bit float images with the ModelPixelScale,
//! ModelTiepoint and GeoKeyDirectory tags plus a GDAL_NODATA tag, so GIS
//! tools pick up georeferencing and treat NaN cells as no-data.

use crate::error::{Error, Result};
use crate::raster::{Raster, RasterElement};
use std::fs::File;
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

/// Write a raster to a GeoTIFF file
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    encode_geotiff(raster, file)
}

/// Write a raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T: RasterElement>(raster: &Raster<T>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf))?;
    Ok(buf)
}

/// GeoKeyDirectory entries: header, model type, raster type, and the CRS key
fn geo_keys<T: RasterElement>(raster: &Raster<T>) -> Vec<u16> {
    // GTModelTypeGeoKey: 1 = projected, 2 = geographic
    let (model, crs_key) = match raster.crs() {
        Some(crs) if crs.is_geographic() => (2, Some((2048, crs.epsg()))),
        Some(crs) => (1, Some((3072, crs.epsg()))),
        None => (1, None),
    };
    let crs_key = crs_key.and_then(|(key, code)| u16::try_from(code).ok().map(|c| (key, c)));

    let n_keys = if crs_key.is_some() { 3 } else { 2 };
    let mut keys = vec![
        1, 1, 0, n_keys, // version 1.1.0
        1024, 0, 1, model, // GTModelTypeGeoKey
        1025, 0, 1, 1, // GTRasterTypeGeoKey = RasterPixelIsArea
    ];
    if let Some((key, code)) = crs_key {
        keys.extend_from_slice(&[key, 0, 1, code]);
    }
    keys
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let tiff_err = |what: &str, e: tiff::TiffError| Error::Other(format!("{what}: {e}"));

    let mut encoder = TiffEncoder::new(writer).map_err(|e| tiff_err("TIFF encoder error", e))?;
    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| v.to_f32().unwrap_or(f32::NAN))
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(|e| tiff_err("Cannot create TIFF image", e))?;

    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])
        .map_err(|e| tiff_err("Cannot write scale tag", e))?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])
        .map_err(|e| tiff_err("Cannot write tiepoint tag", e))?;

    let keys = geo_keys(raster);
    image
        .encoder()
        .write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), &keys[..])
        .map_err(|e| tiff_err("Cannot write geokey tag", e))?;

    image
        .encoder()
        .write_tag(Tag::Unknown(GDAL_NODATA), "nan")
        .map_err(|e| tiff_err("Cannot write nodata tag", e))?;

    image
        .write_data(&data)
        .map_err(|e| tiff_err("Cannot write image data", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::CRS;
    use crate::raster::GeoTransform;
    use tiff::decoder::{Decoder, DecodingResult};

    #[test]
    fn buffer_roundtrip_keeps_values_and_georeferencing() {
        let mut raster =
            Raster::from_vec(vec![1.0, f64::NAN, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        raster.set_transform(GeoTransform::new(1000.0, 5000.0, 250.0, -250.0));
        raster.set_crs(Some(CRS::from_epsg(32646)));

        let bytes = write_geotiff_to_buffer(&raster).unwrap();
        let mut decoder = Decoder::new(Cursor::new(bytes)).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (3, 2));

        let scale = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE)).unwrap();
        assert_eq!(&scale[..2], &[250.0, 250.0]);
        let tiepoint = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT)).unwrap();
        assert_eq!(tiepoint[3], 1000.0);
        assert_eq!(tiepoint[4], 5000.0);

        match decoder.read_image().unwrap() {
            DecodingResult::F32(values) => {
                assert_eq!(values.len(), 6);
                assert_eq!(values[0], 1.0);
                assert!(values[1].is_nan());
                assert_eq!(values[5], 6.0);
            }
            _ => panic!("expected f32 data"),
        }
    }

    #[test]
    fn geo_keys_carry_epsg() {
        let mut raster: Raster<f64> = Raster::new(1, 1);
        assert_eq!(geo_keys(&raster)[3], 2);

        raster.set_crs(Some(CRS::from_epsg(3857)));
        let keys = geo_keys(&raster);
        assert_eq!(keys[3], 3);
        assert_eq!(&keys[12..], &[3072, 0, 1, 3857]);

        raster.set_crs(Some(CRS::wgs84()));
        let keys = geo_keys(&raster);
        assert_eq!(keys[7], 2);
        assert_eq!(&keys[12..], &[2048, 0, 1, 4326]);
    }
}
