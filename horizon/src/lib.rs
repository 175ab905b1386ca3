//! # Horizon obstruction masks
//!
//! `horizon` computes, for an observation point on a DEM, the highest
//! terrain elevation angle in every azimuth bucket around it: the
//! skyline mask used for sun-path and line-of-sight shading.
//!
//! A request flows through [cutting_area] (the observer-centered
//! window), [DemSource::window] (the cropped grid), [project] (every
//! cell in polar coordinates), and [bin] (one entry per bucket).
//! [HorizonMask::builder] runs the whole chain.

mod binner;
mod config;
mod error;
mod mask;
mod math;
mod observer;
mod projector;
mod source;
mod window;

pub use crate::{
    binner::{bin, bucket_count, HorizonEntry},
    config::Config,
    error::HorizonError,
    mask::{HorizonMask, HorizonMaskBuilder},
    observer::Observer,
    projector::{project, project_par, Observation, MIN_DISTANCE_M},
    source::DemSource,
    window::{cutting_area, BoundingBox, RasterWindow},
};
pub use dem;
pub use geo;
