//! Vector fields: `Field<Vector>` built from a [`VectorGrid`], plus scalar
//! fields derived from it.

use crate::cell::CellValue;
use crate::descriptor::VectorGrid;
use crate::error::FieldError;
use crate::field::{Field, FieldValue};
use crate::scalar::ScalarField;
use crate::vector::Vector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A field of `(u, v)` samples such as wind or ocean currents.
pub type VectorField = Field<Vector>;

impl FieldValue for Vector {
    fn bilinear(x: f64, y: f64, g00: Vector, g10: Vector, g01: Vector, g11: Vector) -> Vector {
        let rx = 1.0 - x;
        let ry = 1.0 - y;
        let (a, b, c, d) = (rx * ry, x * ry, rx * y, x * y);
        Vector::new(
            g00.u() * a + g10.u() * b + g01.u() * c + g11.u() * d,
            g00.v() * a + g10.v() * b + g01.v() * c + g11.v() * d,
        )
    }

    fn range_measure(&self) -> f64 {
        self.magnitude()
    }

    fn to_cell_value(self) -> CellValue {
        CellValue::Vector(self)
    }
}

/// Scalar quantity derived from each vector of a [`VectorField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Magnitude,
    DirectionTo,
    DirectionFrom,
}

impl ScalarKind {
    /// The derived quantity for one vector.
    pub fn apply(self, vector: Vector) -> f64 {
        match self {
            ScalarKind::Magnitude => vector.magnitude(),
            ScalarKind::DirectionTo => vector.direction_to(),
            ScalarKind::DirectionFrom => vector.direction_from(),
        }
    }

    /// snake_case name, as used in JSON.
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Magnitude => "magnitude",
            ScalarKind::DirectionTo => "direction_to",
            ScalarKind::DirectionFrom => "direction_from",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScalarKind {
    type Err = String;

    /// Accepts snake_case, kebab-case and camelCase spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "magnitude" => Ok(ScalarKind::Magnitude),
            "directionto" => Ok(ScalarKind::DirectionTo),
            "directionfrom" => Ok(ScalarKind::DirectionFrom),
            _ => Err(format!(
                "unknown scalar kind '{s}' (expected magnitude, direction_to or direction_from)"
            )),
        }
    }
}

impl Field<Vector> {
    /// Builds a vector field from a descriptor.
    ///
    /// A cell is no-data when either component is NaN or equals the header's
    /// no-data value.
    pub fn from_grid(grid: &VectorGrid) -> Result<Self, FieldError> {
        let header = &grid.header;
        let geometry = header.geometry()?;
        if grid.us.len() != grid.vs.len() {
            return Err(FieldError::ComponentMismatch {
                us: grid.us.len(),
                vs: grid.vs.len(),
            });
        }
        header.check_len("us", grid.us.len())?;
        let values = grid
            .us
            .iter()
            .zip(&grid.vs)
            .map(|(&u, &v)| Some(Vector::new(header.to_value(u)?, header.to_value(v)?)))
            .collect();
        Field::from_values(geometry, values)
    }

    /// Scalar field of the same geometry holding `kind` of every vector.
    /// No-data cells stay no-data; the filter is not carried over.
    pub fn scalar_field(&self, kind: ScalarKind) -> ScalarField {
        log::debug!("deriving {kind} scalar field");
        self.map(|v| kind.apply(v))
    }
}
