use num_traits::Float;

/// Returns the compass bearing (in degrees, `[0, 360)`, clockwise
/// from north) of an offset of `d_east` and `d_north`.
///
/// Note the argument order handed to `atan2`: east first, then
/// north. This is what makes the result a clockwise-from-north
/// bearing rather than a counter-clockwise-from-east angle.
pub fn bearing_deg<T: Float>(d_east: T, d_north: T) -> T {
    let full_turn = T::from(360).unwrap();
    let bearing = d_east.atan2(d_north).to_degrees();
    // Adding zero also turns -0.0 into 0.0.
    let bearing = if bearing < T::zero() {
        bearing + full_turn
    } else {
        bearing + T::zero()
    };
    // Tiny negative angles round up to a full turn.
    if bearing >= full_turn {
        bearing - full_turn
    } else {
        bearing
    }
}
