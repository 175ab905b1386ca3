//! Single-band digital elevation model (DEM) rasters.
//!
//! A [Raster] is a north-up grid of elevation samples in a projected
//! CRS, georeferenced by the planar coordinate of its first (top-left)
//! sample and a signed per-axis sample spacing. Rasters are read from
//! and written to GeoTIFF.
//!
//! # References
//!
//! 1. [GeoTIFF format specification](https://docs.ogc.org/is/19-008r4/19-008r4.html)
//! 1. [GDAL raster data model](https://gdal.org/user/raster_data_model.html)

mod error;
mod geotiff;

pub use crate::error::DemError;
use geo::geometry::Coord;
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Seek, Write},
    path::Path,
};

/// Base floating point type used for all coordinates.
pub type C = f64;

#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    /// Planar coordinate of the top-left sample.
    origin: Coord<C>,

    /// Signed distance between adjacent samples (east, north).
    ///
    /// North spacing is negative for the usual top-to-bottom row
    /// order.
    step: Coord<C>,

    /// Number of (rows, columns) in this raster.
    dimensions: (usize, usize),

    /// Nodata sentinel declared by the source, if any.
    nodata: Option<f32>,

    /// Row-major elevation samples, nodata stored as NaN.
    samples: Box<[f32]>,
}

impl Raster {
    /// Returns a raster over `samples`, which must hold exactly
    /// `rows * cols` values in row-major order.
    pub fn new(
        origin: Coord<C>,
        step: Coord<C>,
        dimensions @ (rows, cols): (usize, usize),
        samples: Vec<f32>,
    ) -> Result<Self, DemError> {
        if rows == 0 || cols == 0 || samples.len() != rows * cols {
            return Err(DemError::Dimensions {
                rows,
                cols,
                len: samples.len(),
            });
        }
        if !step.x.is_finite() || !step.y.is_finite() || step.x == 0.0 || step.y == 0.0 {
            return Err(DemError::Step(step.x, step.y));
        }
        if !origin.x.is_finite() || !origin.y.is_finite() {
            return Err(DemError::Georef);
        }
        Ok(Self {
            origin,
            step,
            dimensions,
            nodata: None,
            samples: samples.into_boxed_slice(),
        })
    }

    /// Declares `nodata` as this raster's nodata sentinel, replacing
    /// matching samples with NaN.
    #[must_use]
    pub fn with_nodata(mut self, nodata: Option<f32>) -> Self {
        if let Some(sentinel) = nodata.filter(|v| !v.is_nan()) {
            for sample in self.samples.iter_mut() {
                if *sample == sentinel {
                    *sample = f32::NAN;
                }
            }
        }
        self.nodata = nodata;
        self
    }

    /// Returns a raster read from the GeoTIFF at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let file = BufReader::new(File::open(path)?);
        Self::from_reader(file)
    }

    /// Returns a raster decoded from GeoTIFF bytes.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, DemError> {
        geotiff::decode(reader)
    }

    /// Writes this raster to `path` as a float32 GeoTIFF.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DemError> {
        let mut file = BufWriter::new(File::create(path)?);
        self.write_to(&mut file)?;
        file.flush()?;
        Ok(())
    }

    /// Encodes this raster as a float32 GeoTIFF.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<(), DemError> {
        geotiff::encode(self, writer)
    }

    /// Returns the number of samples in this raster.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.dimensions
    }

    pub fn origin(&self) -> Coord<C> {
        self.origin
    }

    pub fn step(&self) -> Coord<C> {
        self.step
    }

    pub fn nodata(&self) -> Option<f32> {
        self.nodata
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Returns an iterator over rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.samples.chunks_exact(self.dimensions.1)
    }

    /// Returns the sample at the given planar coordinate.
    pub fn get(&self, coord: Coord<C>) -> Option<f32> {
        let (row, col) = self.coord_to_rc(coord)?;
        self.get_rc(row, col)
    }

    /// Returns the sample at (`row`, `col`).
    pub fn get_rc(&self, row: usize, col: usize) -> Option<f32> {
        let (rows, cols) = self.dimensions;
        (row < rows && col < cols).then(|| self.samples[row * cols + col])
    }

    /// Returns the lowest non-nodata sample.
    pub fn min_elevation(&self) -> Option<f32> {
        self.samples
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f32::min)
    }

    /// Returns the highest non-nodata sample.
    pub fn max_elevation(&self) -> Option<f32> {
        self.samples
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f32::max)
    }

    /// Returns the pixel-aligned sub-raster covering the box spanned
    /// by `top_left` and `bottom_right`, clipped to this raster's
    /// extent.
    ///
    /// Fails when the box does not intersect this raster at all.
    pub fn crop(&self, top_left: Coord<C>, bottom_right: Coord<C>) -> Result<Self, DemError> {
        let (rows, cols) = self.dimensions;
        let out_of_bounds = || DemError::OutOfBounds {
            left: top_left.x,
            top: top_left.y,
            right: bottom_right.x,
            bottom: bottom_right.y,
        };
        let (col_start, col_end) = span(top_left.x, bottom_right.x, self.origin.x, self.step.x, cols)
            .ok_or_else(out_of_bounds)?;
        let (row_start, row_end) = span(top_left.y, bottom_right.y, self.origin.y, self.step.y, rows)
            .ok_or_else(out_of_bounds)?;

        let mut samples = Vec::with_capacity((row_end - row_start) * (col_end - col_start));
        for row in self.rows().skip(row_start).take(row_end - row_start) {
            samples.extend_from_slice(&row[col_start..col_end]);
        }

        #[allow(clippy::cast_precision_loss)]
        let origin = Coord {
            x: self.origin.x + col_start as C * self.step.x,
            y: self.origin.y + row_start as C * self.step.y,
        };

        Ok(Self {
            origin,
            step: self.step,
            dimensions: (row_end - row_start, col_end - col_start),
            nodata: self.nodata,
            samples: samples.into_boxed_slice(),
        })
    }
}

/// Private API
impl Raster {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn coord_to_rc(&self, coord: Coord<C>) -> Option<(usize, usize)> {
        let (rows, cols) = self.dimensions;
        let col = ((coord.x - self.origin.x) / self.step.x).floor();
        let row = ((coord.y - self.origin.y) / self.step.y).floor();
        if (0.0..cols as C).contains(&col) && (0.0..rows as C).contains(&row) {
            Some((row as usize, col as usize))
        } else {
            None
        }
    }
}

/// Crops the GeoTIFF at `source` to the given box and writes the
/// result to `dest`.
pub fn crop_file<P, Q>(
    source: P,
    dest: Q,
    top_left: Coord<C>,
    bottom_right: Coord<C>,
) -> Result<(), DemError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    Raster::load(source)?.crop(top_left, bottom_right)?.save(dest)
}

/// Returns the half-open index range `[start, end)` of samples along
/// one axis covering the interval between `a` and `b`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn span(a: C, b: C, origin: C, step: C, len: usize) -> Option<(usize, usize)> {
    let a = (a - origin) / step;
    let b = (b - origin) / step;
    if !a.is_finite() || !b.is_finite() {
        return None;
    }
    let len = len as C;
    let start = a.min(b).floor().clamp(0.0, len);
    let end = a.max(b).ceil().clamp(0.0, len);
    (start < end).then(|| (start as usize, end as usize))
}

#[cfg(test)]
mod tests {
    use super::{crop_file, Coord, DemError, Raster};
    use std::io::Cursor;

    /// 4 rows x 5 columns, 10 m spacing, origin at (1000, 2000), sample
    /// value equal to `row * 10 + col`.
    fn ramp() -> Raster {
        let samples = (0..4)
            .flat_map(|row| (0..5).map(move |col| (row * 10 + col) as f32))
            .collect();
        Raster::new(
            Coord {
                x: 1000.0,
                y: 2000.0,
            },
            Coord { x: 10.0, y: -10.0 },
            (4, 5),
            samples,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_shape() {
        let origin = Coord { x: 0.0, y: 0.0 };
        let step = Coord { x: 1.0, y: -1.0 };
        assert!(matches!(
            Raster::new(origin, step, (2, 2), vec![0.0; 3]),
            Err(DemError::Dimensions { len: 3, .. })
        ));
        assert!(matches!(
            Raster::new(origin, Coord { x: 0.0, y: -1.0 }, (2, 2), vec![0.0; 4]),
            Err(DemError::Step(..))
        ));
    }

    #[test]
    fn test_get() {
        let raster = ramp();
        assert_eq!(raster.get(Coord { x: 1000.0, y: 2000.0 }), Some(0.0));
        assert_eq!(raster.get(Coord { x: 1025.0, y: 1985.0 }), Some(12.0));
        assert_eq!(raster.get_rc(3, 4), Some(34.0));
        assert_eq!(raster.get_rc(4, 0), None);
    }

    #[test]
    fn test_out_of_bounds_get_returns_none() {
        let raster = ramp();
        // A smidge north.
        assert_eq!(raster.get(Coord { x: 1010.0, y: 2000.1 }), None);
        // A smidge west.
        assert_eq!(raster.get(Coord { x: 999.9, y: 1990.0 }), None);
        // Past the last column.
        assert_eq!(raster.get(Coord { x: 1050.0, y: 1990.0 }), None);
        // Past the last row.
        assert_eq!(raster.get(Coord { x: 1010.0, y: 1960.0 }), None);
    }

    #[test]
    fn test_crop_alignment() {
        let raster = ramp();
        let cropped = raster
            .crop(Coord { x: 1010.0, y: 1990.0 }, Coord { x: 1040.0, y: 1970.0 })
            .unwrap();
        assert_eq!(cropped.dimensions(), (2, 3));
        assert_eq!(cropped.origin(), Coord { x: 1010.0, y: 1990.0 });
        assert_eq!(cropped.step(), raster.step());
        let rows: Vec<&[f32]> = cropped.rows().collect();
        assert_eq!(rows, vec![&[11.0, 12.0, 13.0][..], &[21.0, 22.0, 23.0][..]]);
        // Same coordinate, same sample.
        let coord = Coord { x: 1025.0, y: 1975.0 };
        assert_eq!(cropped.get(coord), raster.get(coord));
    }

    #[test]
    fn test_crop_clips_to_extent() {
        let raster = ramp();
        let cropped = raster
            .crop(Coord { x: 980.0, y: 2030.0 }, Coord { x: 1015.0, y: 1985.0 })
            .unwrap();
        assert_eq!(cropped.dimensions(), (2, 2));
        assert_eq!(cropped.origin(), raster.origin());
        assert_eq!(cropped.samples(), &[0.0, 1.0, 10.0, 11.0]);
    }

    #[test]
    fn test_crop_outside_is_error() {
        let raster = ramp();
        let res = raster.crop(Coord { x: 5000.0, y: 5000.0 }, Coord { x: 6000.0, y: 4000.0 });
        assert!(matches!(res, Err(DemError::OutOfBounds { .. })));
    }

    #[test]
    fn test_nodata_is_nan() {
        let raster = Raster::new(
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 1.0, y: -1.0 },
            (1, 3),
            vec![5.0, -9999.0, 7.0],
        )
        .unwrap()
        .with_nodata(Some(-9999.0));
        assert!(raster.get_rc(0, 1).unwrap().is_nan());
        assert_eq!(raster.min_elevation(), Some(5.0));
        assert_eq!(raster.max_elevation(), Some(7.0));
    }

    #[test]
    fn test_geotiff_encode_decode() {
        let raster = Raster::new(
            Coord {
                x: 2_600_000.0,
                y: 1_200_000.0,
            },
            Coord { x: 2.0, y: -2.0 },
            (2, 3),
            vec![400.0, 401.5, -9999.0, 402.0, 403.25, 404.0],
        )
        .unwrap()
        .with_nodata(Some(-9999.0));

        let mut buf = Cursor::new(Vec::new());
        raster.write_to(&mut buf).unwrap();
        buf.set_position(0);
        let decoded = Raster::from_reader(buf).unwrap();

        assert_eq!(decoded.dimensions(), (2, 3));
        assert_eq!(decoded.origin(), raster.origin());
        assert_eq!(decoded.step(), raster.step());
        assert_eq!(decoded.nodata(), Some(-9999.0));
        assert_eq!(decoded.get_rc(1, 1), Some(403.25));
        assert!(decoded.get_rc(0, 2).unwrap().is_nan());
    }

    #[test]
    fn test_crop_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.tif");
        let dest = dir.path().join("crop.tif");
        ramp().save(&source).unwrap();
        crop_file(
            &source,
            &dest,
            Coord { x: 1020.0, y: 2000.0 },
            Coord { x: 1050.0, y: 1980.0 },
        )
        .unwrap();
        let cropped = Raster::load(&dest).unwrap();
        assert_eq!(cropped.dimensions(), (2, 3));
        assert_eq!(cropped.samples(), &[2.0, 3.0, 4.0, 12.0, 13.0, 14.0]);
    }

    #[test]
    #[ignore = "writes and reads a ~270 MB GeoTIFF"]
    fn test_load_above_default_decoder_limit() {
        // 8200 x 8200 f32 samples exceed tiff's default 256 MiB buffer.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("large.tif");
        let (rows, cols) = (8200, 8200);
        Raster::new(
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 25.0, y: -25.0 },
            (rows, cols),
            vec![500.0; rows * cols],
        )
        .unwrap()
        .save(&path)
        .unwrap();

        let loaded = Raster::load(&path).unwrap();
        assert_eq!(loaded.dimensions(), (rows, cols));
        assert_eq!(loaded.get_rc(rows - 1, cols - 1), Some(500.0));
    }
}
