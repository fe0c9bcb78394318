//! Reading grid descriptors and masks, writing JSON output.

use crate::error::CliError;
use geofield_core::{ScalarField, ScalarGrid, SpatialMask, VectorField, VectorGrid};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// A field loaded from a descriptor file.
pub enum GridFile {
    Scalar(ScalarField),
    Vector(VectorField),
}

impl GridFile {
    /// `"scalar"` or `"vector"`.
    pub fn kind(&self) -> &'static str {
        match self {
            GridFile::Scalar(_) => "scalar",
            GridFile::Vector(_) => "vector",
        }
    }

    /// Applies a spatial mask to the loaded field.
    pub fn set_spatial_mask(&mut self, mask: SpatialMask) {
        match self {
            GridFile::Scalar(f) => f.set_spatial_mask(mask),
            GridFile::Vector(f) => f.set_spatial_mask(mask),
        }
    }

    /// The vector field, or an input error for a scalar grid.
    pub fn into_vector(self) -> Result<VectorField, CliError> {
        match self {
            GridFile::Vector(f) => Ok(f),
            GridFile::Scalar(_) => Err(CliError::Input(
                "expected a vector grid with 'us' and 'vs' arrays".into(),
            )),
        }
    }
}

/// Reads a JSON file; missing files are I/O errors, bad JSON is an input error.
pub fn read_json(path: &Path) -> Result<Value, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::Input(format!("{} is not valid JSON: {e}", path.display())))
}

/// Loads a descriptor file: a vector grid if it has a `us` array, otherwise
/// a scalar grid.
pub fn load_grid(path: &Path) -> Result<GridFile, CliError> {
    let json = read_json(path)?;
    let bad_descriptor =
        |e: serde_json::Error| CliError::Input(format!("bad grid descriptor {}: {e}", path.display()));
    let grid = if json.get("us").is_some() {
        let descriptor: VectorGrid = serde_json::from_value(json).map_err(bad_descriptor)?;
        GridFile::Vector(VectorField::from_grid(&descriptor)?)
    } else {
        let descriptor: ScalarGrid = serde_json::from_value(json).map_err(bad_descriptor)?;
        GridFile::Scalar(ScalarField::from_grid(&descriptor)?)
    };
    log::info!("loaded {} grid from {}", grid.kind(), path.display());
    Ok(grid)
}

/// Loads a GeoJSON Polygon or MultiPolygon (bare, Feature, or a
/// FeatureCollection holding one feature).
pub fn load_mask(path: &Path) -> Result<SpatialMask, CliError> {
    let json = read_json(path)?;
    Ok(SpatialMask::from_geojson(&json)?)
}

/// Writes `value` as pretty-printed JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).map_err(|e| CliError::Io(format!("cannot write {}: {e}", path.display())))
}
