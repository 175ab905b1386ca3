use anyhow::{anyhow, Error as AnyError};
use clap::{Args, Parser, Subcommand};
use horizon::geo::geometry::Coord;
use std::{path::PathBuf, str::FromStr};

/// Compute horizon obstruction masks (skyline masks) from a DEM.
#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// Source GeoTIFF elevation model, in a projected CRS.
    #[arg(short, long)]
    pub dem: PathBuf,

    /// Half the side of the square window cropped around the
    /// observer, in meters.
    #[arg(long, default_value_t = 8000.0)]
    pub half_window: f64,

    /// Azimuth bucket width, in degrees.
    #[arg(short, long, default_value_t = 1.0)]
    pub bucket_width: f64,

    /// Directory for the per-request scratch crop (system temp dir by
    /// default).
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,

    /// Scan window rows in parallel.
    #[arg(short, long, default_value_t = false)]
    pub parallel: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Args, Debug, Clone)]
pub struct Site {
    /// Observer "east,north" in the DEM's CRS.
    #[arg(long, allow_hyphen_values = true)]
    pub at: EastNorth,

    /// Eye height above ground, in meters.
    #[arg(long, default_value_t = 0.0)]
    pub eye_height: f64,

    /// Elevation angles below this are not obstructions, in degrees.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub min_elevation: f64,

    /// Ground elevation at the observer, in meters (sampled from the
    /// DEM when omitted).
    #[arg(long, allow_negative_numbers = true)]
    pub ground_elevation: Option<f64>,
}

#[derive(Clone, Debug, Copy)]
pub struct EastNorth(pub Coord<f64>);

impl FromStr for EastNorth {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (east_str, north_str) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("not a valid east,north pair"))?;
        let east = f64::from_str(east_str.trim())?;
        let north = f64::from_str(north_str.trim())?;
        Ok(Self(Coord { x: east, y: north }))
    }
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the profile to stdout as JSON.
    Json(Site),

    /// Print the profile to stdout as CSV.
    Csv(Site),

    /// Plot the profile to terminal.
    Plot(Site),

    /// Answer a JSON request, printing the profile as JSON.
    Request {
        /// Request file (stdin when omitted).
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::{Coord, EastNorth};
    use std::str::FromStr;

    #[test]
    fn test_parse_east_north() {
        let EastNorth(coord) = EastNorth::from_str("2600000.5, 1200000").unwrap();
        assert_eq!(
            coord,
            Coord {
                x: 2_600_000.5,
                y: 1_200_000.0
            }
        );
        assert_eq!(
            EastNorth::from_str("-10,20").unwrap().0,
            Coord { x: -10.0, y: 20.0 }
        );
        assert!(EastNorth::from_str("2600000").is_err());
        assert!(EastNorth::from_str("a,b").is_err());
    }
}
