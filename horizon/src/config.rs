/// Per-process defaults handed to every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Half the side of the square window cropped around the
    /// observer (meters).
    pub half_window_m: f64,

    /// Width of each azimuth bucket (degrees).
    pub bucket_width_deg: f64,

    /// Minimum elevation angle used when a request does not supply
    /// one (degrees).
    pub min_elevation_angle_deg: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            half_window_m: 8000.0,
            bucket_width_deg: 1.0,
            min_elevation_angle_deg: 0.0,
        }
    }
}
