//! Regular longitude/latitude grid geometry.
//!
//! A [`GridGeometry`] describes `n_cols x n_rows` cells of size
//! `cell_x_size x cell_y_size` degrees anchored at a lower-left corner.
//! Rows are stored north to south (row 0 is the top row) and columns west to
//! east. Grids stored in the `[0, 360)` longitude frame are exposed in
//! `[-180, 180]` for bounds and containment.

use crate::error::FieldError;
use serde::{Deserialize, Serialize};

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    /// Coordinate from longitude and latitude in degrees.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Axis-aligned bounds `[xmin, ymin, xmax, ymax]` in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    /// Bounds from their corners; not validated.
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// The whole globe, `[-180, -90, 180, 90]`.
    pub fn world() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    /// Inclusive point test. NaN coordinates are never contained.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.xmin && lon <= self.xmax && lat >= self.ymin && lat <= self.ymax
    }

    /// Bounds as `[xmin, ymin, xmax, ymax]`.
    pub fn as_array(&self) -> [f64; 4] {
        [self.xmin, self.ymin, self.xmax, self.ymax]
    }

    /// Longitude span in degrees.
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Latitude span in degrees.
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

/// Shape and placement of a regular lon/lat grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    n_cols: usize,
    n_rows: usize,
    xll_corner: f64,
    yll_corner: f64,
    cell_x_size: f64,
    cell_y_size: f64,
}

impl GridGeometry {
    /// Validates and builds a grid geometry.
    ///
    /// Fails with `FieldError::InvalidDimensions` for empty or overflowing
    /// grids, `FieldError::InvalidCellSize` for non-positive or non-finite
    /// cell sizes and `FieldError::InvalidCorner` for non-finite corners.
    pub fn new(
        n_cols: usize,
        n_rows: usize,
        xll_corner: f64,
        yll_corner: f64,
        cell_x_size: f64,
        cell_y_size: f64,
    ) -> Result<Self, FieldError> {
        if n_cols == 0 || n_rows == 0 || n_cols.checked_mul(n_rows).is_none() {
            return Err(FieldError::InvalidDimensions { n_cols, n_rows });
        }
        let size_ok = |s: f64| s.is_finite() && s > 0.0;
        if !size_ok(cell_x_size) || !size_ok(cell_y_size) {
            return Err(FieldError::InvalidCellSize {
                x_size: cell_x_size,
                y_size: cell_y_size,
            });
        }
        if !xll_corner.is_finite() || !yll_corner.is_finite() {
            return Err(FieldError::InvalidCorner {
                xll: xll_corner,
                yll: yll_corner,
            });
        }
        Ok(Self {
            n_cols,
            n_rows,
            xll_corner,
            yll_corner,
            cell_x_size,
            cell_y_size,
        })
    }

    /// Grid width in cells.
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Grid height in cells.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Lower-left longitude in the grid's native frame.
    pub fn xll_corner(&self) -> f64 {
        self.xll_corner
    }

    /// Lower-left latitude.
    pub fn yll_corner(&self) -> f64 {
        self.yll_corner
    }

    /// Cell width in degrees of longitude.
    pub fn cell_x_size(&self) -> f64 {
        self.cell_x_size
    }

    /// Cell height in degrees of latitude.
    pub fn cell_y_size(&self) -> f64 {
        self.cell_y_size
    }

    /// Total number of cells (`n_cols * n_rows`).
    pub fn num_cells(&self) -> usize {
        self.n_cols * self.n_rows
    }

    /// Upper-right longitude in the grid's native frame.
    pub fn xur_corner(&self) -> f64 {
        self.xll_corner + self.n_cols as f64 * self.cell_x_size
    }

    /// Upper-right latitude.
    pub fn yur_corner(&self) -> f64 {
        self.yll_corner + self.n_rows as f64 * self.cell_y_size
    }

    /// True when the grid spans a full longitude band, so the first column
    /// is the eastern neighbour of the last one.
    pub fn is_continuous(&self) -> bool {
        self.xur_corner() - self.xll_corner >= 360.0
    }

    /// True when native longitudes run past 180 and must be exposed in
    /// `[-180, 180]`.
    pub fn longitude_needs_wrapping(&self) -> bool {
        self.xur_corner() > 180.0
    }

    /// Longitude bounds `(xmin, xmax)` as seen from the `[-180, 180]` frame.
    ///
    /// A global grid collapses to exactly `(-180, 180)`. A partial grid that
    /// crosses 180 has both corners shifted by -360; that branch only covers
    /// the longitudes written in their shifted form (e.g. `-185` rather than
    /// `175` for a grid spanning `[170, 190]`).
    pub fn wrapped_longitudes(&self) -> (f64, f64) {
        let xmin = self.xll_corner;
        let xmax = self.xur_corner();
        if !self.longitude_needs_wrapping() {
            return (xmin, xmax);
        }
        if self.is_continuous() {
            (-180.0, 180.0)
        } else {
            (xmin - 360.0, xmax - 360.0)
        }
    }

    /// Wrap-corrected bounds of the grid.
    pub fn extent(&self) -> Extent {
        let (xmin, xmax) = self.wrapped_longitudes();
        Extent::new(xmin, self.yll_corner, xmax, self.yur_corner())
    }

    /// Fractional `(column, row)` position of a coordinate, measured from the
    /// north-west grid corner in cell units.
    ///
    /// Longitudes west of the native lower-left corner are moved into the
    /// `[0, 360)` frame first when the grid needs wrapping.
    pub fn decimal_indexes(&self, lon: f64, lat: f64) -> (f64, f64) {
        let lon = if self.longitude_needs_wrapping() && lon < self.xll_corner {
            lon + 360.0
        } else {
            lon
        };
        let i = (lon - self.xll_corner) / self.cell_x_size;
        let j = (self.yur_corner() - lat) / self.cell_y_size;
        (i, j)
    }

    /// Clamps a column index into `[0, n_cols - 1]`.
    pub fn clamp_column(&self, i: isize) -> usize {
        clamp_index(i, self.n_cols)
    }

    /// Clamps a row index into `[0, n_rows - 1]`.
    pub fn clamp_row(&self, j: isize) -> usize {
        clamp_index(j, self.n_rows)
    }

    /// Wraps a column index around the grid; used for continuous grids.
    pub fn wrap_column(&self, i: isize) -> usize {
        i.rem_euclid(self.n_cols as isize) as usize
    }

    /// Longitude of the center of column `i`, in `[-180, 180]` when the grid
    /// needs wrapping.
    pub fn longitude_at(&self, i: usize) -> f64 {
        let lon = self.xll_corner + self.cell_x_size / 2.0 + i as f64 * self.cell_x_size;
        if self.longitude_needs_wrapping() && lon > 180.0 {
            lon - 360.0
        } else {
            lon
        }
    }

    /// Latitude of the center of row `j`.
    pub fn latitude_at(&self, j: usize) -> f64 {
        self.yur_corner() - self.cell_y_size / 2.0 - j as f64 * self.cell_y_size
    }

    /// Center of the cell at column `i`, row `j`.
    pub fn lon_lat_at(&self, i: usize, j: usize) -> LonLat {
        LonLat::new(self.longitude_at(i), self.latitude_at(j))
    }

    /// Row-major offset of an in-range `(i, j)` pair.
    pub(crate) fn offset(&self, i: usize, j: usize) -> usize {
        j * self.n_cols + i
    }
}

fn clamp_index(ii: isize, n: usize) -> usize {
    if ii <= 0 {
        0
    } else {
        (ii as usize).min(n - 1)
    }
}
