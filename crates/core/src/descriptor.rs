//! Structured grid descriptors: the input contract with grid-file parsers.
//!
//! An ASCIIGrid or GeoTIFF reader produces a header plus flat row-major
//! arrays (north to south, west to east). Descriptors deserialize from JSON
//! with either snake_case or the camelCase keys (`nCols`, `xllCorner`,
//! `noDataValue`, ...) common to those parsers; `null` array entries mean
//! no-data.

use crate::error::FieldError;
use crate::geometry::GridGeometry;
use serde::{Deserialize, Deserializer, Serialize};

/// Grid header shared by scalar and vector descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridHeader {
    #[serde(alias = "nCols", alias = "ncols")]
    pub n_cols: usize,
    #[serde(alias = "nRows", alias = "nrows")]
    pub n_rows: usize,
    #[serde(alias = "xllCorner", alias = "xllcorner")]
    pub xll_corner: f64,
    #[serde(alias = "yllCorner", alias = "yllcorner")]
    pub yll_corner: f64,
    #[serde(alias = "cellXSize", alias = "cellsize")]
    pub cell_x_size: f64,
    /// Defaults to `cell_x_size` for square cells.
    #[serde(default, alias = "cellYSize", skip_serializing_if = "Option::is_none")]
    pub cell_y_size: Option<f64>,
    #[serde(default, alias = "noDataValue", alias = "nodata_value", skip_serializing_if = "Option::is_none")]
    pub no_data_value: Option<f64>,
}

impl GridHeader {
    /// A header for square cells without a no-data sentinel.
    pub fn new(n_cols: usize, n_rows: usize, xll_corner: f64, yll_corner: f64, cell_size: f64) -> Self {
        Self {
            n_cols,
            n_rows,
            xll_corner,
            yll_corner,
            cell_x_size: cell_size,
            cell_y_size: None,
            no_data_value: None,
        }
    }

    /// Sets a cell height different from the width.
    pub fn with_cell_y_size(mut self, cell_y_size: f64) -> Self {
        self.cell_y_size = Some(cell_y_size);
        self
    }

    /// Sets the sentinel that marks no-data cells.
    pub fn with_no_data_value(mut self, no_data_value: f64) -> Self {
        self.no_data_value = Some(no_data_value);
        self
    }

    /// Validated geometry described by this header.
    pub fn geometry(&self) -> Result<GridGeometry, FieldError> {
        GridGeometry::new(
            self.n_cols,
            self.n_rows,
            self.xll_corner,
            self.yll_corner,
            self.cell_x_size,
            self.cell_y_size.unwrap_or(self.cell_x_size),
        )
    }

    /// `Some(v)` for a measured value; `None` for NaN or the no-data sentinel.
    pub fn to_value(&self, v: f64) -> Option<f64> {
        if v.is_nan() || self.no_data_value == Some(v) {
            None
        } else {
            Some(v)
        }
    }

    pub(crate) fn check_len(&self, name: &'static str, len: usize) -> Result<(), FieldError> {
        let expected = self.n_cols.saturating_mul(self.n_rows);
        if len == expected {
            Ok(())
        } else {
            Err(FieldError::LengthMismatch {
                name,
                expected,
                got: len,
            })
        }
    }
}

/// Descriptor of a scalar grid: header plus `zs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarGrid {
    #[serde(flatten)]
    pub header: GridHeader,
    #[serde(deserialize_with = "nulls_as_nan")]
    pub zs: Vec<f64>,
}

impl ScalarGrid {
    /// Descriptor from a header and row-major values.
    pub fn new(header: GridHeader, zs: Vec<f64>) -> Self {
        Self { header, zs }
    }
}

/// Descriptor of a vector grid: header plus `us` and `vs` components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorGrid {
    #[serde(flatten)]
    pub header: GridHeader,
    #[serde(deserialize_with = "nulls_as_nan")]
    pub us: Vec<f64>,
    #[serde(deserialize_with = "nulls_as_nan")]
    pub vs: Vec<f64>,
}

impl VectorGrid {
    /// Descriptor from a header and row-major components.
    pub fn new(header: GridHeader, us: Vec<f64>, vs: Vec<f64>) -> Self {
        Self { header, us, vs }
    }
}

// serde_json writes NaN as null, so null reads back as NaN (no-data).
fn nulls_as_nan<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}
