use dem::DemError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HorizonError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("({east}, {north}) lies outside the raster extent")]
    OutOfBounds { east: f64, north: f64 },

    #[error("zero planar distance for accepted cell ({row}, {col})")]
    DegenerateGeometry { row: usize, col: usize },

    #[error("raster unavailable: {0}")]
    RasterUnavailable(#[from] DemError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}
