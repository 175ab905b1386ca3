use crate::options::Site;
use horizon::{geo::geometry::Coord, HorizonEntry};
use serde::{Deserialize, Serialize};

/// A single-observer horizon request.
///
/// Field aliases accept the payloads of the earlier web endpoint
/// (`nord`, `i`, `minElevation`). Its `elevation` field is ignored;
/// ground elevation is always sampled unless `groundElevation` is
/// given.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub east: f64,

    #[serde(alias = "nord")]
    pub north: f64,

    #[serde(alias = "i", default)]
    pub eye_height: f64,

    #[serde(alias = "minElevation", default)]
    pub min_elevation_angle: Option<f64>,

    #[serde(default)]
    pub ground_elevation: Option<f64>,
}

impl Request {
    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.east,
            y: self.north,
        }
    }
}

impl From<Site> for Request {
    fn from(
        Site {
            at,
            eye_height,
            min_elevation,
            ground_elevation,
        }: Site,
    ) -> Self {
        Self {
            east: at.0.x,
            north: at.0.y,
            eye_height,
            min_elevation_angle: Some(min_elevation),
            ground_elevation,
        }
    }
}

/// One response entry; obstruction details are omitted for floor
/// entries.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonEntry {
    pub azimuth: f64,
    pub elevation_angle: f64,
    #[serde(flatten)]
    pub obstruction: Option<JsonObstruction>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonObstruction {
    pub distance: f64,
    pub row: usize,
    pub col: usize,
    pub target_east: f64,
    pub target_north: f64,
    pub target_altitude: f64,
}

impl From<&HorizonEntry> for JsonEntry {
    fn from(entry: &HorizonEntry) -> Self {
        Self {
            azimuth: entry.azimuth_deg,
            elevation_angle: entry.elevation_angle_deg,
            obstruction: entry.source.map(|obs| JsonObstruction {
                distance: obs.distance_m,
                row: obs.row,
                col: obs.col,
                target_east: obs.target.x,
                target_north: obs.target.y,
                target_altitude: obs.target_alt_m,
            }),
        }
    }
}
