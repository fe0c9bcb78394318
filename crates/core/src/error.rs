//! Error types for the geofield core.
//!
//! Only malformed construction input is an error. Queries outside a field,
//! filtered values and missing interpolation neighbours are reported as
//! `None` by the query methods instead.

use thiserror::Error;

/// Errors produced when building fields, masks or simulation parameters.
#[derive(Debug, Error)]
pub enum FieldError {
    /// `n_cols` or `n_rows` was zero, or their product overflows `usize`.
    #[error("invalid grid dimensions: {n_cols} columns x {n_rows} rows")]
    InvalidDimensions { n_cols: usize, n_rows: usize },

    /// A cell size was zero, negative or not finite.
    #[error("invalid cell size ({x_size}, {y_size}): sizes must be finite and positive")]
    InvalidCellSize { x_size: f64, y_size: f64 },

    /// A lower-left corner coordinate was not finite.
    #[error("invalid lower-left corner ({xll}, {yll}): coordinates must be finite")]
    InvalidCorner { xll: f64, yll: f64 },

    /// A flat value array did not hold exactly `n_cols * n_rows` entries.
    #[error("array '{name}' has {got} values, expected {expected} (n_cols * n_rows)")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        got: usize,
    },

    /// The `us` and `vs` component arrays of a vector grid differ in length.
    #[error("vector components differ in length: us has {us}, vs has {vs}")]
    ComponentMismatch { us: usize, vs: usize },

    /// A spatial mask could not be read from the supplied GeoJSON.
    #[error("invalid spatial mask: {0}")]
    InvalidMask(String),

    /// Simulation parameters were out of range.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}
