#![deny(unsafe_code)]
//! Core types for geofield: scalar and vector fields on regular lon/lat grids.
//!
//! Provides `Vector` and `Cell`, grid geometry with antimeridian wrapping,
//! the generic `Field<T>` (nearest and bilinear lookup, filters, polygon
//! masks), its `ScalarField` and `VectorField` instantiations built from
//! parser descriptors, the `Xorshift64` PRNG and JSON parameter helpers.

pub mod cell;
pub mod descriptor;
pub mod error;
pub mod field;
pub mod geometry;
pub mod mask;
pub mod params;
pub mod prng;
pub mod scalar;
pub mod vector;
pub mod vector_field;

pub use cell::{Cell, CellValue};
pub use descriptor::{GridHeader, ScalarGrid, VectorGrid};
pub use error::FieldError;
pub use field::{Field, FieldValue, Range};
pub use geometry::{Extent, GridGeometry, LonLat};
pub use mask::SpatialMask;
pub use prng::Xorshift64;
pub use scalar::ScalarField;
pub use vector::Vector;
pub use vector_field::{ScalarKind, VectorField};
