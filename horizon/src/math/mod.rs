mod bearing;
mod elevation_angle;

pub(crate) use {bearing::bearing_deg, elevation_angle::elevation_angle_deg};
