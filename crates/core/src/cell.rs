//! Read-only views of single grid cells.

use crate::geometry::{Extent, LonLat};
use crate::vector::Vector;
use serde::{Deserialize, Serialize};

/// The value carried by a cell: a scalar or a vector sample.
///
/// Equality is structural per variant; a scalar never equals a vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Scalar(f64),
    Vector(Vector),
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Scalar(value)
    }
}

impl From<Vector> for CellValue {
    fn from(value: Vector) -> Self {
        CellValue::Vector(value)
    }
}

/// A grid sample: its center, its value (`None` for no-data) and footprint.
///
/// Two cells are equal when centers, values and both sizes match exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cell {
    center: LonLat,
    value: Option<CellValue>,
    x_size: f64,
    y_size: f64,
}

impl Cell {
    /// Cell from its center, value and footprint in degrees.
    pub fn new(center: LonLat, value: Option<CellValue>, x_size: f64, y_size: f64) -> Self {
        Self {
            center,
            value,
            x_size,
            y_size,
        }
    }

    /// A cell whose footprint is `size` degrees on both axes.
    pub fn square(center: LonLat, value: Option<CellValue>, size: f64) -> Self {
        Self::new(center, value, size, size)
    }

    /// Center coordinate.
    pub fn center(&self) -> LonLat {
        self.center
    }

    /// Sampled value; `None` for no-data.
    pub fn value(&self) -> Option<CellValue> {
        self.value
    }

    /// Footprint width in degrees of longitude.
    pub fn x_size(&self) -> f64 {
        self.x_size
    }

    /// Footprint height in degrees of latitude.
    pub fn y_size(&self) -> f64 {
        self.y_size
    }

    /// Footprint of the cell: its center extended by half a cell on each side.
    pub fn bounds(&self) -> Extent {
        let half_x = self.x_size / 2.0;
        let half_y = self.y_size / 2.0;
        Extent::new(
            self.center.lon - half_x,
            self.center.lat - half_y,
            self.center.lon + half_x,
            self.center.lat + half_y,
        )
    }
}
