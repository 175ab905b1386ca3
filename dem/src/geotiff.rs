//! Minimal GeoTIFF support: one band, north-up affine georeferencing,
//! and the GDAL nodata tag.

use crate::{DemError, Raster, C};
use geo::geometry::Coord;
use std::io::{Read, Seek, Write};
use tiff::{
    decoder::{Decoder, DecodingResult, Limits},
    encoder::{colortype::Gray32Float, TiffEncoder},
    tags::Tag,
    ColorType,
};

const GT_RASTER_TYPE_GEO_KEY: u32 = 1025;
const RASTER_PIXEL_IS_POINT: u32 = 2;

/// GeoKey directory declaring a projected model with pixel-is-area
/// raster space.
const GEO_KEYS: [u16; 12] = [
    1, 1, 0, 2, // version 1.1.0, 2 keys
    1024, 0, 1, 1, // GTModelTypeGeoKey = ModelTypeProjected
    1025, 0, 1, 1, // GTRasterTypeGeoKey = RasterPixelIsArea
];

/// Decodes a whole single-band GeoTIFF.
///
/// Decoder buffer limits are lifted: a source DEM is held in memory in
/// full and routinely exceeds the default 256 MiB cap.
pub(crate) fn decode<R: Read + Seek>(reader: R) -> Result<Raster, DemError> {
    let mut decoder = Decoder::new(reader)?.with_limits(Limits::unlimited());

    if !matches!(decoder.colortype()?, ColorType::Gray(_)) {
        return Err(DemError::SampleFormat);
    }

    let (width, height) = decoder.dimensions()?;
    let dimensions = (height as usize, width as usize);
    let (origin, step) = georeferencing(&mut decoder)?;

    let nodata = match decoder.find_tag(Tag::GdalNodata)? {
        Some(value) => value.into_string()?.trim().parse::<f32>().ok(),
        None => None,
    };

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let samples: Vec<f32> = match decoder.read_image()? {
        DecodingResult::U8(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::F32(buf) => buf,
        DecodingResult::F64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        #[allow(unreachable_patterns)]
        _ => return Err(DemError::SampleFormat),
    };

    Ok(Raster::new(origin, step, dimensions, samples)?.with_nodata(nodata))
}

/// Returns (origin, step) from either the tiepoint/pixel-scale pair
/// or a model transformation matrix.
///
/// The origin is always the outer corner of the top-left sample, so
/// PixelIsPoint files are shifted by half a step.
fn georeferencing<R: Read + Seek>(
    decoder: &mut Decoder<R>,
) -> Result<(Coord<C>, Coord<C>), DemError> {
    let (mut origin, step) = model_transform(decoder)?;
    if raster_type(decoder)? == Some(RASTER_PIXEL_IS_POINT) {
        origin.x -= step.x / 2.0;
        origin.y -= step.y / 2.0;
    }
    Ok((origin, step))
}

/// Returns the `GTRasterTypeGeoKey` value, if declared.
fn raster_type<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<u32>, DemError> {
    let Some(directory) = decoder.find_tag(Tag::GeoKeyDirectoryTag)? else {
        return Ok(None);
    };
    let keys = directory.into_u32_vec()?;
    // Header is [version, revision, minor, count], then one
    // [key, location, count, value] entry per key. Location 0 means
    // the value is stored inline.
    let entry = keys
        .get(4..)
        .unwrap_or_default()
        .chunks_exact(4)
        .find(|entry| entry[0] == GT_RASTER_TYPE_GEO_KEY && entry[1] == 0);
    Ok(entry.map(|entry| entry[3]))
}

fn model_transform<R: Read + Seek>(
    decoder: &mut Decoder<R>,
) -> Result<(Coord<C>, Coord<C>), DemError> {
    let scale = decoder.find_tag(Tag::ModelPixelScaleTag)?;
    let tiepoint = decoder.find_tag(Tag::ModelTiepointTag)?;

    if let (Some(scale), Some(tiepoint)) = (scale, tiepoint) {
        let scale = scale.into_f64_vec()?;
        let tiepoint = tiepoint.into_f64_vec()?;
        if scale.len() < 2 || tiepoint.len() < 6 {
            return Err(DemError::Georef);
        }
        // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
        let origin = Coord {
            x: tiepoint[3] - tiepoint[0] * scale[0],
            y: tiepoint[4] + tiepoint[1] * scale[1],
        };
        let step = Coord {
            x: scale[0],
            y: -scale[1],
        };
        return Ok((origin, step));
    }

    if let Some(matrix) = decoder.find_tag(Tag::ModelTransformationTag)? {
        let m = matrix.into_f64_vec()?;
        // Row-major 4x4; rotated rasters are not supported.
        if m.len() < 8 || m[1] != 0.0 || m[4] != 0.0 {
            return Err(DemError::Georef);
        }
        let origin = Coord { x: m[3], y: m[7] };
        let step = Coord { x: m[0], y: m[5] };
        return Ok((origin, step));
    }

    Err(DemError::Georef)
}

pub(crate) fn encode<W: Write + Seek>(raster: &Raster, writer: W) -> Result<(), DemError> {
    let (rows, cols) = raster.dimensions();
    let mk_err = || DemError::Dimensions {
        rows,
        cols,
        len: raster.len(),
    };
    let width = u32::try_from(cols).map_err(|_| mk_err())?;
    let height = u32::try_from(rows).map_err(|_| mk_err())?;

    let mut encoder = TiffEncoder::new(writer)?;
    let mut image = encoder.new_image::<Gray32Float>(width, height)?;

    let Coord { x: east, y: north } = raster.origin();
    let step = raster.step();
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &[step.x, -step.y, 0.0][..])?;
    image.encoder().write_tag(
        Tag::ModelTiepointTag,
        &[0.0, 0.0, 0.0, east, north, 0.0][..],
    )?;
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, &GEO_KEYS[..])?;

    let data: Vec<f32> = match raster.nodata() {
        Some(nodata) => {
            image
                .encoder()
                .write_tag(Tag::GdalNodata, nodata.to_string().as_str())?;
            raster
                .samples()
                .iter()
                .map(|&v| if v.is_nan() { nodata } else { v })
                .collect()
        }
        None => raster.samples().to_vec(),
    };

    image.write_data(&data)?;
    Ok(())
}
