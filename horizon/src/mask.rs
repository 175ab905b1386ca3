use crate::{
    bin, cutting_area, project, project_par, Config, DemSource, HorizonEntry, HorizonError,
    Observer, RasterWindow,
};
use geo::geometry::Coord;
use log::{debug, warn};

/// Horizon obstruction profile for a single observer.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonMask {
    /// The observer, with its ground elevation resolved.
    pub observer: Observer,

    /// One entry per azimuth bucket, ascending by azimuth.
    pub entries: Vec<HorizonEntry>,

    /// Number of window cells that qualified as obstructions.
    pub observation_count: usize,
}

impl HorizonMask {
    pub fn builder() -> HorizonMaskBuilder {
        HorizonMaskBuilder {
            coord: None,
            eye_height_m: 0.0,
            min_elevation_angle_deg: None,
            ground_elev_m: None,
            config: Config::default(),
            parallel: false,
        }
    }

    /// Computes the profile over an already extracted window.
    pub fn from_window(
        window: &RasterWindow,
        observer: Observer,
        bucket_width_deg: f64,
        parallel: bool,
    ) -> Result<Self, HorizonError> {
        let (observations, project_runtime) = {
            let now = std::time::Instant::now();
            let observations = if parallel {
                project_par(window, &observer)?
            } else {
                project(window, &observer)?
            };
            (observations, now.elapsed())
        };

        if observations.is_empty() {
            warn!(
                "no obstructions above {}° around {:?}",
                observer.min_elevation_angle_deg(),
                observer.coord()
            );
        }

        let (entries, bin_runtime) = {
            let now = std::time::Instant::now();
            let entries = bin(
                &observations,
                observer.min_elevation_angle_deg(),
                bucket_width_deg,
            )?;
            (entries, now.elapsed())
        };

        debug!(
            "horizon; cells: {}, observations: {}, buckets: {}, project_exec: {:?}, bin_exec: {:?}",
            window.dimensions().0 * window.dimensions().1,
            observations.len(),
            entries.len(),
            project_runtime,
            bin_runtime
        );

        Ok(Self {
            observer,
            entries,
            observation_count: observations.len(),
        })
    }
}

pub struct HorizonMaskBuilder {
    /// Observer location (required).
    coord: Option<Coord<f64>>,

    /// Eye height above ground (meters, defaults to 0).
    eye_height_m: f64,

    /// Minimum elevation angle (degrees, defaults to the config's).
    min_elevation_angle_deg: Option<f64>,

    /// Ground elevation at the observer (meters, sampled from the DEM
    /// when `None`).
    ground_elev_m: Option<f64>,

    /// Window size and bucket width.
    config: Config,

    /// Scan rows in parallel (defaults to false).
    parallel: bool,
}

impl HorizonMaskBuilder {
    /// Observer location in the DEM's CRS (required).
    #[must_use]
    pub fn observer_at(mut self, coord: Coord<f64>) -> Self {
        self.coord = Some(coord);
        self
    }

    /// Eye height above ground (meters, defaults to 0).
    #[must_use]
    pub fn eye_height(mut self, meters: f64) -> Self {
        self.eye_height_m = meters;
        self
    }

    /// Minimum elevation angle (degrees, defaults to the config's).
    #[must_use]
    pub fn min_elevation_angle(mut self, degrees: f64) -> Self {
        self.min_elevation_angle_deg = Some(degrees);
        self
    }

    /// Ground elevation at the observer (meters, sampled from the DEM
    /// when not set).
    #[must_use]
    pub fn ground_elevation(mut self, meters: Option<f64>) -> Self {
        self.ground_elev_m = meters;
        self
    }

    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Scan rows in parallel (defaults to false).
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn build(&self, source: &DemSource) -> Result<HorizonMask, HorizonError> {
        let coord = self.coord.ok_or(HorizonError::Builder("observer"))?;
        let min_elevation_angle_deg = self
            .min_elevation_angle_deg
            .unwrap_or(self.config.min_elevation_angle_deg);

        let bbox = cutting_area(coord, self.config.half_window_m)?;
        let window = source.window(&bbox)?;

        // The observer must lie on valid data even when its ground
        // elevation is supplied.
        let out_of_bounds = || HorizonError::OutOfBounds {
            east: coord.x,
            north: coord.y,
        };
        let sampled = window.elevation_at(coord).ok_or_else(out_of_bounds)?;
        let ground_elev_m = match self.ground_elev_m {
            Some(meters) => meters,
            None if sampled.is_nan() => return Err(out_of_bounds()),
            None => f64::from(sampled),
        };

        let observer = Observer::new(
            coord,
            ground_elev_m,
            self.eye_height_m,
            min_elevation_angle_deg,
        )?;

        HorizonMask::from_window(
            &window,
            observer,
            self.config.bucket_width_deg,
            self.parallel,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, Coord, DemSource, HorizonError, HorizonMask};
    use approx::assert_relative_eq;
    use dem::Raster;

    /// 201 x 201 flat raster at 400 m, 50 m spacing, origin such that
    /// (0, 0) is the center sample, with a 900 m spike 1000 m due
    /// north of center.
    fn source() -> DemSource {
        let mut samples = vec![400.0_f32; 201 * 201];
        samples[80 * 201 + 100] = 900.0;
        DemSource::from_raster(
            Raster::new(
                Coord {
                    x: -5000.0,
                    y: 5000.0,
                },
                Coord { x: 50.0, y: -50.0 },
                (201, 201),
                samples,
            )
            .unwrap(),
        )
    }

    fn config() -> Config {
        Config {
            half_window_m: 2000.0,
            ..Config::default()
        }
    }

    #[test]
    fn test_mask_with_sampled_ground() {
        let source = source();
        let mask = HorizonMask::builder()
            .observer_at(Coord { x: 0.0, y: 0.0 })
            .eye_height(2.0)
            .min_elevation_angle(0.0)
            .config(config())
            .build(&source)
            .unwrap();

        assert_eq!(mask.observer.ground_elev_m(), 400.0);
        assert_eq!(mask.entries.len(), 360);
        assert_eq!(mask.observation_count, 1);

        // Due north falls in the first bucket only.
        let hits: Vec<_> = mask.entries.iter().filter(|e| e.source.is_some()).collect();
        assert_eq!(hits.len(), 1);
        let spike = hits[0];
        assert_eq!(spike.azimuth_deg, 0.0);
        assert_relative_eq!(
            spike.elevation_angle_deg,
            (498.0_f64 / 1000.0).atan().to_degrees()
        );
        assert_eq!(mask.entries[0], *spike);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let source = source();
        let builder = || {
            HorizonMask::builder()
                .observer_at(Coord { x: 120.0, y: -40.0 })
                .eye_height(1.5)
                .min_elevation_angle(-3.0)
                .config(config())
        };
        assert_eq!(
            builder().build(&source).unwrap(),
            builder().parallel(true).build(&source).unwrap()
        );
    }

    #[test]
    fn test_ground_override() {
        let mask = HorizonMask::builder()
            .observer_at(Coord { x: 0.0, y: 0.0 })
            .ground_elevation(Some(1000.0))
            .config(config())
            .build(&source())
            .unwrap();
        assert_eq!(mask.observer.ground_elev_m(), 1000.0);
        assert_eq!(mask.observation_count, 0);
        assert!(mask
            .entries
            .iter()
            .all(|e| e.source.is_none() && e.elevation_angle_deg == 0.0));
    }

    #[test]
    fn test_missing_observer() {
        assert!(matches!(
            HorizonMask::builder().build(&source()),
            Err(HorizonError::Builder("observer"))
        ));
    }

    #[test]
    fn test_observer_outside_source() {
        // Window intersects the source but the observer does not.
        let res = HorizonMask::builder()
            .observer_at(Coord {
                x: 5500.0,
                y: 0.0,
            })
            .config(config())
            .build(&source());
        assert!(matches!(res, Err(HorizonError::OutOfBounds { .. })));
    }
}
