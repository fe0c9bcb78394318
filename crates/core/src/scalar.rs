//! Scalar fields: `Field<f64>` built from a [`ScalarGrid`].

use crate::cell::CellValue;
use crate::descriptor::{GridHeader, ScalarGrid};
use crate::error::FieldError;
use crate::field::{Field, FieldValue};

/// A field of scalar samples such as elevation or temperature.
pub type ScalarField = Field<f64>;

impl FieldValue for f64 {
    fn bilinear(x: f64, y: f64, g00: f64, g10: f64, g01: f64, g11: f64) -> f64 {
        let rx = 1.0 - x;
        let ry = 1.0 - y;
        g00 * rx * ry + g10 * x * ry + g01 * rx * y + g11 * x * y
    }

    fn range_measure(&self) -> f64 {
        *self
    }

    fn to_cell_value(self) -> CellValue {
        CellValue::Scalar(self)
    }
}

impl Field<f64> {
    /// Builds a scalar field from a descriptor.
    ///
    /// `zs` entries that are NaN or equal to the header's no-data value
    /// become no-data cells.
    pub fn from_grid(grid: &ScalarGrid) -> Result<Self, FieldError> {
        let header = &grid.header;
        let geometry = header.geometry()?;
        header.check_len("zs", grid.zs.len())?;
        let values = grid.zs.iter().map(|&z| header.to_value(z)).collect();
        Field::from_values(geometry, values)
    }

    /// The field as a descriptor, no-data written as NaN.
    pub fn to_grid(&self) -> ScalarGrid {
        let g = self.geometry();
        let header = GridHeader::new(
            g.n_cols(),
            g.n_rows(),
            g.xll_corner(),
            g.yll_corner(),
            g.cell_x_size(),
        )
        .with_cell_y_size(g.cell_y_size());
        let zs = self.values().iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        ScalarGrid::new(header, zs)
    }
}
