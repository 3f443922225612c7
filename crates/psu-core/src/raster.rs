//! GeoTIFF reading and writing for single-band north-up rasters.
//!
//! Georeferencing comes from `ModelPixelScaleTag` (33550) and
//! `ModelTiepointTag` (33922); no-data from GDAL's ASCII tag (42113). Only
//! the first image directory and the first band are read.

use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

use crate::error::{PsuError, Result};
use crate::grid::Grid;

fn raster_err(path: &Path, message: impl Into<String>) -> PsuError {
    PsuError::Raster {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Read a single-band GeoTIFF into a [`Grid`]. Cells equal to the declared
/// no-data value become `NaN`.
pub fn read_geotiff(path: &Path) -> Result<Grid> {
    if !path.exists() {
        return Err(PsuError::MissingDataset(path.to_path_buf()));
    }
    let file = BufReader::new(fs::File::open(path)?);
    let mut decoder = Decoder::new(file)?.with_limits(Limits::unlimited());
    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);
    if width == 0 || height == 0 {
        return Err(raster_err(path, "zero-sized raster"));
    }

    let scale = decoder
        .find_tag(Tag::ModelPixelScaleTag)?
        .ok_or_else(|| raster_err(path, "missing ModelPixelScaleTag"))?
        .into_f64_vec()?;
    let tie = decoder
        .find_tag(Tag::ModelTiepointTag)?
        .ok_or_else(|| raster_err(path, "missing ModelTiepointTag"))?
        .into_f64_vec()?;
    if scale.len() < 2 || tie.len() < 6 {
        return Err(raster_err(path, "malformed georeferencing tags"));
    }
    let nodata = match decoder.find_tag(Tag::GdalNodata)? {
        Some(v) => v.into_string()?.trim_matches(char::from(0)).trim().parse::<f64>().ok(),
        None => None,
    };

    let data = to_f32(decoder.read_image()?).ok_or_else(|| raster_err(path, "unsupported sample type"))?;
    // Multi-band chunky rasters: keep band 1.
    let samples = data.len() / (width * height);
    let data: Vec<f32> = if samples > 1 {
        data.chunks(samples).map(|px| px[0]).collect()
    } else {
        data
    };
    if data.len() != width * height {
        return Err(raster_err(
            path,
            format!("expected {} cells, decoded {}", width * height, data.len()),
        ));
    }

    let data = match nodata {
        Some(nd) => data
            .into_iter()
            .map(|v| if f64::from(v) == nd || (nd.is_nan() && v.is_nan()) { f32::NAN } else { v })
            .collect(),
        None => data,
    };

    let (cell_w, cell_h) = (scale[0], scale[1]);
    let west = tie[3] - tie[0] * cell_w;
    let north = tie[4] + tie[1] * cell_h;
    Ok(Grid {
        data,
        width,
        height,
        west,
        north,
        cell_w,
        cell_h,
    })
}

fn to_f32(img: DecodingResult) -> Option<Vec<f32>> {
    Some(match img {
        DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
        _ => return None,
    })
}

/// Write a [`Grid`] as a Float32 GeoTIFF with NaN declared as no-data.
pub fn write_geotiff(path: &Path, grid: &Grid) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = BufWriter::new(fs::File::create(path)?);
    let mut encoder = TiffEncoder::new(file)?;
    let mut image = encoder.new_image::<colortype::Gray32Float>(grid.width as u32, grid.height as u32)?;
    {
        let dir = image.encoder();
        dir.write_tag(Tag::ModelPixelScaleTag, &[grid.cell_w, grid.cell_h, 0.0][..])?;
        dir.write_tag(
            Tag::ModelTiepointTag,
            &[0.0, 0.0, 0.0, grid.west, grid.north, 0.0][..],
        )?;
        dir.write_tag(Tag::GdalNodata, "nan")?;
    }
    image.write_data(&grid.data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_preserves_georeferencing_and_nodata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("density.tif");
        let mut g = Grid::new(3, 2, 33.5, 4.25, 0.25, 0.125, 1.5);
        g.set(1, 2, f32::NAN);
        g.set(0, 1, -7.0);
        write_geotiff(&path, &g).unwrap();

        let back = read_geotiff(&path).unwrap();
        assert_eq!(back.dims(), (3, 2));
        assert_eq!(back.west, 33.5);
        assert_eq!(back.north, 4.25);
        assert_eq!(back.cell_w, 0.25);
        assert_eq!(back.cell_h, 0.125);
        assert_eq!(back.get(0, 0), 1.5);
        assert_eq!(back.get(0, 1), -7.0);
        assert!(back.get(1, 2).is_nan());
    }

    #[test]
    fn georeferencing_survives_small_rasters() {
        let dir = tempfile::tempdir().unwrap();
        for (w, h) in [(1, 1), (2, 1), (1, 2), (2, 2), (3, 3)] {
            let path = dir.path().join(format!("{w}x{h}.tif"));
            let g = Grid::new(w, h, -17.5, 14.75, 0.5, 0.25, 2.0);
            write_geotiff(&path, &g).unwrap();
            let back = read_geotiff(&path).unwrap();
            assert!(back.same_footprint(&g), "{w}x{h}");
            assert_eq!(back.data, g.data);
        }
    }

    #[test]
    fn missing_file_is_a_missing_dataset() {
        let err = read_geotiff(Path::new("/nonexistent/ACLED/kenya_ACLED.tif")).unwrap_err();
        assert!(matches!(err, PsuError::MissingDataset(_)));
    }
}
