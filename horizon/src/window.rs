use crate::HorizonError;
use dem::{DemError, Raster};
use geo::geometry::Coord;

/// Observer-centered elevation grid scanned for obstructions.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterWindow {
    raster: Raster,
}

impl RasterWindow {
    /// Returns a window over `rows`, top row first.
    ///
    /// `origin` is the planar coordinate of the first sample of the
    /// first row.
    pub fn from_rows(
        origin: Coord<f64>,
        step: Coord<f64>,
        rows: Vec<Vec<f32>>,
    ) -> Result<Self, HorizonError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != n_cols) {
            return Err(DemError::Dimensions {
                rows: n_rows,
                cols: n_cols,
                len: rows.iter().map(Vec::len).sum(),
            }
            .into());
        }
        let samples = rows.into_iter().flatten().collect();
        Ok(Self {
            raster: Raster::new(origin, step, (n_rows, n_cols), samples)?,
        })
    }

    /// Number of (rows, columns).
    pub fn dimensions(&self) -> (usize, usize) {
        self.raster.dimensions()
    }

    pub fn origin(&self) -> Coord<f64> {
        self.raster.origin()
    }

    pub fn step(&self) -> Coord<f64> {
        self.raster.step()
    }

    /// Planar coordinate of the sample at (`row`, `col`).
    #[allow(clippy::cast_precision_loss)]
    pub fn coord_of(&self, row: usize, col: usize) -> Coord<f64> {
        let origin = self.raster.origin();
        let step = self.raster.step();
        Coord {
            x: origin.x + col as f64 * step.x,
            y: origin.y + row as f64 * step.y,
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        self.raster.get_rc(row, col)
    }

    /// Elevation at a planar coordinate, if inside this window.
    pub fn elevation_at(&self, coord: Coord<f64>) -> Option<f32> {
        self.raster.get(coord)
    }

    /// Samples of one row.
    pub fn row(&self, row: usize) -> &[f32] {
        let cols = self.raster.dimensions().1;
        &self.raster.samples()[row * cols..(row + 1) * cols]
    }

    /// Iterator over rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.raster.rows()
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }
}

impl From<Raster> for RasterWindow {
    fn from(raster: Raster) -> Self {
        Self { raster }
    }
}

/// Axis-aligned box handed to the raster cropper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub top_left: Coord<f64>,
    pub bottom_right: Coord<f64>,
}

impl BoundingBox {
    pub fn center(&self) -> Coord<f64> {
        Coord {
            x: (self.top_left.x + self.bottom_right.x) / 2.0,
            y: (self.top_left.y + self.bottom_right.y) / 2.0,
        }
    }
}

/// Returns the square of half-side `half_size_m` centered on `center`.
pub fn cutting_area(center: Coord<f64>, half_size_m: f64) -> Result<BoundingBox, HorizonError> {
    if !(half_size_m.is_finite() && half_size_m > 0.0) {
        return Err(HorizonError::InvalidParameter {
            name: "half window size",
            value: half_size_m,
        });
    }
    Ok(BoundingBox {
        top_left: Coord {
            x: center.x - half_size_m,
            y: center.y + half_size_m,
        },
        bottom_right: Coord {
            x: center.x + half_size_m,
            y: center.y - half_size_m,
        },
    })
}
