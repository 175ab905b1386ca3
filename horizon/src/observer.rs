use crate::HorizonError;
use geo::geometry::Coord;

/// The point a horizon is computed for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    /// Planar location, in the raster's projected CRS.
    coord: Coord<f64>,

    /// Terrain altitude at `coord` (meters).
    ground_elev_m: f64,

    /// Eye height above ground (meters).
    eye_height_m: f64,

    /// Angles below this are not obstructions (degrees, may be
    /// negative to scan below the horizon).
    min_elevation_angle_deg: f64,
}

impl Observer {
    pub fn new(
        coord: Coord<f64>,
        ground_elev_m: f64,
        eye_height_m: f64,
        min_elevation_angle_deg: f64,
    ) -> Result<Self, HorizonError> {
        let check = |name: &'static str, value: f64| {
            if value.is_finite() {
                Ok(())
            } else {
                Err(HorizonError::InvalidParameter { name, value })
            }
        };
        check("east", coord.x)?;
        check("north", coord.y)?;
        check("ground elevation", ground_elev_m)?;
        check("eye height", eye_height_m)?;
        if !(-90.0..=90.0).contains(&min_elevation_angle_deg) {
            return Err(HorizonError::InvalidParameter {
                name: "minimum elevation angle",
                value: min_elevation_angle_deg,
            });
        }
        Ok(Self {
            coord,
            ground_elev_m,
            eye_height_m,
            min_elevation_angle_deg,
        })
    }

    pub fn coord(&self) -> Coord<f64> {
        self.coord
    }

    pub fn ground_elev_m(&self) -> f64 {
        self.ground_elev_m
    }

    pub fn eye_height_m(&self) -> f64 {
        self.eye_height_m
    }

    pub fn min_elevation_angle_deg(&self) -> f64 {
        self.min_elevation_angle_deg
    }

    /// Altitude of the eye (meters): ground elevation plus eye height.
    pub fn eye_elev_m(&self) -> f64 {
        self.ground_elev_m + self.eye_height_m
    }
}
