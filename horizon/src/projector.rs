//! Polar projection of every window cell as seen from the observer.

use crate::{
    math::{bearing_deg, elevation_angle_deg},
    HorizonError, Observer, RasterWindow,
};
use geo::geometry::Coord;
use rayon::prelude::*;

/// Cells this close to the observer (meters, planar) are never
/// obstructions.
pub const MIN_DISTANCE_M: f64 = 10.0;

/// A window cell in polar coordinates relative to the observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Bearing to the target, clockwise from north, in `[0, 360)`.
    pub azimuth_deg: f64,

    /// Angle above the observer's horizontal plane.
    pub elevation_angle_deg: f64,

    /// Planar distance from the observer (meters).
    pub distance_m: f64,

    /// Originating cell row.
    pub row: usize,

    /// Originating cell column.
    pub col: usize,

    /// Planar location of the target cell.
    pub target: Coord<f64>,

    /// Terrain altitude of the target cell (meters).
    pub target_alt_m: f64,
}

/// Returns every cell of `window` that qualifies as an obstruction,
/// in row-major order.
pub fn project(
    window: &RasterWindow,
    observer: &Observer,
) -> Result<Vec<Observation>, HorizonError> {
    let mut observations = Vec::new();
    for (row, samples) in window.rows().enumerate() {
        scan_row(window, observer, row, samples, &mut observations)?;
    }
    Ok(observations)
}

/// Same as [project], with rows scanned in parallel.
///
/// Output order is identical to [project]'s.
pub fn project_par(
    window: &RasterWindow,
    observer: &Observer,
) -> Result<Vec<Observation>, HorizonError> {
    let (rows, _) = window.dimensions();
    let per_row = (0..rows)
        .into_par_iter()
        .map(|row| {
            let mut observations = Vec::new();
            scan_row(window, observer, row, window.row(row), &mut observations)?;
            Ok(observations)
        })
        .collect::<Result<Vec<Vec<Observation>>, HorizonError>>()?;
    Ok(per_row.into_iter().flatten().collect())
}

fn scan_row(
    window: &RasterWindow,
    observer: &Observer,
    row: usize,
    samples: &[f32],
    observations: &mut Vec<Observation>,
) -> Result<(), HorizonError> {
    let Coord { x: east, y: north } = observer.coord();
    let eye_elev_m = observer.eye_elev_m();
    let min_elevation_angle_deg = observer.min_elevation_angle_deg();

    for (col, &alt) in samples.iter().enumerate() {
        let target = window.coord_of(row, col);
        let d_east = target.x - east;
        let d_north = target.y - north;
        let distance_m = (d_east.powi(2) + d_north.powi(2)).sqrt();
        let target_alt_m = f64::from(alt);
        let elevation_angle = elevation_angle_deg(target_alt_m - eye_elev_m, distance_m);

        // NaN (nodata) angles fail this comparison too.
        if elevation_angle >= min_elevation_angle_deg && distance_m > MIN_DISTANCE_M {
            if distance_m == 0.0 {
                return Err(HorizonError::DegenerateGeometry { row, col });
            }
            observations.push(Observation {
                azimuth_deg: bearing_deg(d_east, d_north),
                elevation_angle_deg: elevation_angle,
                distance_m,
                row,
                col,
                target,
                target_alt_m,
            });
        }
    }
    Ok(())
}
