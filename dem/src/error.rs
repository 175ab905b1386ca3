use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("missing or unsupported georeferencing")]
    Georef,

    #[error("invalid raster dimensions {rows}x{cols} for {len} samples")]
    Dimensions { rows: usize, cols: usize, len: usize },

    #[error("invalid sample spacing ({0}, {1})")]
    Step(f64, f64),

    #[error("box ({left}, {top}) - ({right}, {bottom}) lies outside the raster extent")]
    OutOfBounds {
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
    },

    #[error("unsupported sample format, expected a single band")]
    SampleFormat,
}
