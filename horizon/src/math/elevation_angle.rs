use num_traits::Float;

/// Returns the up/down angle (in degrees) toward a target
/// `delta_alt_m` above the eye and `distance_m` away on the plane.
///
/// No earth curvature or refraction is applied.
pub fn elevation_angle_deg<T: Float>(delta_alt_m: T, distance_m: T) -> T {
    (delta_alt_m / distance_m).atan().to_degrees()
}
