//! Two-component `(u, v)` quantity such as wind or current velocity.

use serde::{Deserialize, Serialize};

/// Eastward (`u`) and northward (`v`) components of a vector sample.
///
/// Immutable once built; derived quantities are computed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    u: f64,
    v: f64,
}

impl Vector {
    /// Creates a vector from its eastward and northward components.
    pub fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }

    /// Eastward component.
    pub fn u(&self) -> f64 {
        self.u
    }

    /// Northward component.
    pub fn v(&self) -> f64 {
        self.v
    }

    /// Euclidean length `sqrt(u² + v²)`.
    pub fn magnitude(&self) -> f64 {
        self.u.hypot(self.v)
    }

    /// Compass bearing the vector points towards, in degrees within `[0, 360)`.
    ///
    /// North is 0 and east is 90. A zero vector reports 0.
    pub fn direction_to(&self) -> f64 {
        let degrees = self.u.atan2(self.v).to_degrees().rem_euclid(360.0);
        // rem_euclid can round a tiny negative angle up to exactly 360
        if degrees >= 360.0 {
            0.0
        } else {
            degrees
        }
    }

    /// Compass bearing the vector comes from: `direction_to` rotated by 180.
    pub fn direction_from(&self) -> f64 {
        (self.direction_to() + 180.0) % 360.0
    }
}
