//! Source DEM and per-request window extraction.

use crate::{BoundingBox, HorizonError, RasterWindow};
use dem::{DemError, Raster};
use geo::geometry::Coord;
use log::debug;
use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tempfile::NamedTempFile;

#[derive(Clone)]
pub struct DemSource {
    /// The full source raster, loaded once.
    raster: Arc<Raster>,

    /// Where per-request crops are written (system temp dir when
    /// `None`).
    scratch_dir: Option<PathBuf>,
}

impl DemSource {
    /// Loads the GeoTIFF DEM at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, HorizonError> {
        let now = std::time::Instant::now();
        let raster = Raster::load(&path)?;
        debug!(
            "dem; path: {:?}, dimensions: {:?}, origin: {:?}, step: {:?}, load_exec: {:?}",
            path.as_ref(),
            raster.dimensions(),
            raster.origin(),
            raster.step(),
            now.elapsed()
        );
        Ok(Self::from_raster(raster))
    }

    pub fn from_raster(raster: Raster) -> Self {
        Self {
            raster: Arc::new(raster),
            scratch_dir: None,
        }
    }

    /// Write per-request crops into `dir`.
    #[must_use]
    pub fn scratch_dir(mut self, dir: PathBuf) -> Self {
        self.scratch_dir = Some(dir);
        self
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    /// Returns the source elevation at `coord`.
    pub fn sample(&self, coord: Coord<f64>) -> Result<f32, HorizonError> {
        self.raster
            .get(coord)
            .filter(|elev| !elev.is_nan())
            .ok_or(HorizonError::OutOfBounds {
                east: coord.x,
                north: coord.y,
            })
    }

    /// Returns the window covering `bbox`.
    ///
    /// The crop goes through a scratch file which is removed before
    /// this returns, whether or not reading it back succeeded.
    pub fn window(&self, bbox: &BoundingBox) -> Result<RasterWindow, HorizonError> {
        let scratch = self.crop(bbox)?;
        let raster = Raster::load(scratch.path())?;
        debug!(
            "window; dimensions: {:?}, min_elev: {:?}, max_elev: {:?}",
            raster.dimensions(),
            raster.min_elevation(),
            raster.max_elevation()
        );
        Ok(RasterWindow::from(raster))
    }
}

/// Private API.
impl DemSource {
    fn crop(&self, bbox: &BoundingBox) -> Result<NamedTempFile, HorizonError> {
        let cropped = self
            .raster
            .crop(bbox.top_left, bbox.bottom_right)
            .map_err(|e| match e {
                DemError::OutOfBounds { .. } => {
                    let Coord { x: east, y: north } = bbox.center();
                    HorizonError::OutOfBounds { east, north }
                }
                e => HorizonError::RasterUnavailable(e),
            })?;

        let mut scratch = {
            let mut builder = tempfile::Builder::new();
            builder.prefix("crop-").suffix(".tif");
            match &self.scratch_dir {
                Some(dir) => builder.tempfile_in(dir)?,
                None => builder.tempfile()?,
            }
        };

        let mut writer = BufWriter::new(scratch.as_file_mut());
        cropped.write_to(&mut writer)?;
        writer.flush()?;
        drop(writer);

        Ok(scratch)
    }
}

#[cfg(test)]
mod tests {
    use super::{Coord, DemSource, HorizonError, Raster};
    use crate::cutting_area;

    /// 100 x 100 raster with 10 m spacing whose elevation is the
    /// column index.
    fn source_raster() -> Raster {
        let samples = (0..100)
            .flat_map(|_| (0..100).map(|col| col as f32))
            .collect();
        Raster::new(
            Coord { x: 0.0, y: 1000.0 },
            Coord { x: 10.0, y: -10.0 },
            (100, 100),
            samples,
        )
        .unwrap()
    }

    fn scratch_is_empty(dir: &std::path::Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[test]
    fn test_window_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dem.tif");
        source_raster().save(&path).unwrap();
        let scratch = tempfile::tempdir().unwrap();

        let source = DemSource::new(&path)
            .unwrap()
            .scratch_dir(scratch.path().to_owned());
        let bbox = cutting_area(Coord { x: 500.0, y: 500.0 }, 100.0).unwrap();
        let window = source.window(&bbox).unwrap();

        assert_eq!(window.dimensions(), (20, 20));
        assert_eq!(window.origin(), Coord { x: 400.0, y: 600.0 });
        assert_eq!(window.elevation_at(Coord { x: 505.0, y: 495.0 }), Some(50.0));
        assert!(scratch_is_empty(scratch.path()));
    }

    #[test]
    fn test_window_outside_source() {
        let scratch = tempfile::tempdir().unwrap();
        let source = DemSource::from_raster(source_raster()).scratch_dir(scratch.path().to_owned());
        let bbox = cutting_area(Coord { x: 5000.0, y: 5000.0 }, 100.0).unwrap();
        assert!(matches!(
            source.window(&bbox),
            Err(HorizonError::OutOfBounds {
                east,
                north
            }) if east == 5000.0 && north == 5000.0
        ));
        assert!(scratch_is_empty(scratch.path()));
    }

    #[test]
    fn test_sample() {
        let source = DemSource::from_raster(source_raster());
        assert_eq!(source.sample(Coord { x: 125.0, y: 900.0 }).unwrap(), 12.0);
        assert!(matches!(
            source.sample(Coord { x: -1.0, y: 900.0 }),
            Err(HorizonError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            DemSource::new("/nonexistent/dem.tif"),
            Err(HorizonError::RasterUnavailable(_))
        ));
    }
}
