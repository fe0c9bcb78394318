//! Generic field over a regular lon/lat grid.
//!
//! A `Field<T>` owns an immutable row-major grid of optional values (`None`
//! marks no-data) plus two swappable inclusion rules: a value filter and a
//! spatial mask. Queries never fail; coordinates outside the field, filtered
//! values and incomplete interpolation neighbourhoods all yield `None`.
//!
//! The value type supplies the type-specific parts through [`FieldValue`]:
//! how four neighbours blend and which measure the range is taken over.
//! [`ScalarField`](crate::ScalarField) and [`VectorField`](crate::VectorField)
//! are the two instantiations.

use crate::cell::{Cell, CellValue};
use crate::error::FieldError;
use crate::geometry::{Extent, GridGeometry, LonLat};
use crate::mask::SpatialMask;
use crate::prng::Xorshift64;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A value that can be stored in a [`Field`].
pub trait FieldValue: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Bilinear blend of the four neighbours at fractional offsets `x`, `y`
    /// in `[0, 1]`. `g10` is east of `g00`, `g01` is south of it.
    fn bilinear(x: f64, y: f64, g00: Self, g10: Self, g01: Self, g11: Self) -> Self;

    /// The scalar the field range is computed over.
    fn range_measure(&self) -> f64;

    /// The value as carried by a [`Cell`].
    fn to_cell_value(self) -> CellValue;
}

/// Predicate deciding whether a value is included in queries and ranges.
pub type ValueFilter<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Inclusive `[min, max]` of a field's range measure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

/// A grid of optional `T` values with lon/lat addressing.
#[derive(Clone)]
pub struct Field<T: FieldValue> {
    geometry: GridGeometry,
    grid: Vec<Option<T>>,
    filter: Option<ValueFilter<T>>,
    mask: Option<SpatialMask>,
    range: Option<Range>,
}

impl<T: FieldValue> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("geometry", &self.geometry)
            .field("valid_cells", &self.grid.iter().flatten().count())
            .field("filter", &self.filter.is_some())
            .field("mask", &self.mask.is_some())
            .field("range", &self.range)
            .finish()
    }
}

impl<T: FieldValue> Field<T> {
    /// Builds a field from row-major values (north to south, west to east).
    ///
    /// Returns `FieldError::LengthMismatch` unless `values` holds exactly
    /// `geometry.num_cells()` entries.
    pub fn from_values(geometry: GridGeometry, values: Vec<Option<T>>) -> Result<Self, FieldError> {
        if values.len() != geometry.num_cells() {
            return Err(FieldError::LengthMismatch {
                name: "values",
                expected: geometry.num_cells(),
                got: values.len(),
            });
        }
        let mut field = Self {
            geometry,
            grid: values,
            filter: None,
            mask: None,
            range: None,
        };
        field.update_range();
        log::debug!(
            "built {}x{} field, {} of {} cells valid, range {:?}",
            geometry.n_cols(),
            geometry.n_rows(),
            field.grid.iter().flatten().count(),
            field.grid.len(),
            field.range
        );
        Ok(field)
    }

    /// Shape and placement of the grid.
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Total number of cells (`n_cols * n_rows`).
    pub fn num_cells(&self) -> usize {
        self.geometry.num_cells()
    }

    /// Row-major grid values, `None` where there is no data.
    pub fn values(&self) -> &[Option<T>] {
        &self.grid
    }

    /// True when the grid spans a full longitude band.
    pub fn is_continuous(&self) -> bool {
        self.geometry.is_continuous()
    }

    /// True when native longitudes run past 180.
    pub fn longitude_needs_wrapping(&self) -> bool {
        self.geometry.longitude_needs_wrapping()
    }

    /// `[min, max]` of the range measure over valid values that pass the
    /// current filter; `None` when no value qualifies.
    pub fn range(&self) -> Option<Range> {
        self.range
    }

    /// Applies a new filter and recomputes the range.
    pub fn set_filter<F>(&mut self, filter: F)
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self.update_range();
        log::debug!("filter set, range now {:?}", self.range);
    }

    /// Removes the filter and recomputes the range.
    pub fn clear_filter(&mut self) {
        self.filter = None;
        self.update_range();
    }

    /// True while a value filter is set.
    pub fn filter_active(&self) -> bool {
        self.filter.is_some()
    }

    /// Restricts containment to the inside of `mask`.
    pub fn set_spatial_mask(&mut self, mask: SpatialMask) {
        self.mask = Some(mask);
    }

    /// Restores containment to the grid extent.
    pub fn clear_spatial_mask(&mut self) {
        self.mask = None;
    }

    /// The active spatial mask, if any.
    pub fn spatial_mask(&self) -> Option<&SpatialMask> {
        self.mask.as_ref()
    }

    /// Wrap-corrected bounds `[xmin, ymin, xmax, ymax]`.
    pub fn extent(&self) -> Extent {
        self.geometry.extent()
    }

    /// True if the point is inside the mask, or inside the extent when no
    /// mask is set.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        match &self.mask {
            Some(mask) => mask.contains(lon, lat),
            None => self.extent().contains(lon, lat),
        }
    }

    /// Complement of [`contains`](Self::contains).
    pub fn not_contains(&self, lon: f64, lat: f64) -> bool {
        !self.contains(lon, lat)
    }

    /// Value of the cell containing the point, without interpolation.
    ///
    /// `None` outside the field, on no-data cells and for values rejected by
    /// the filter.
    pub fn value_at(&self, lon: f64, lat: f64) -> Option<T> {
        if self.not_contains(lon, lat) {
            return None;
        }
        let (i, j) = self.geometry.decimal_indexes(lon, lat);
        let value = self.value_at_indexes(i.floor() as isize, j.floor() as isize)?;
        self.passes_filter(&value).then_some(value)
    }

    /// True when the point has a valid value that passes the filter.
    pub fn has_value_at(&self, lon: f64, lat: f64) -> bool {
        self.value_at(lon, lat)
            .is_some_and(|value| self.passes_filter(&value))
    }

    /// Bilinearly interpolated value at the point.
    ///
    /// Values sit at cell centers, so the decimal index is shifted by half a
    /// cell into node space first. `None` outside the field or when any of
    /// the four surrounding cells has no data.
    pub fn interpolated_value_at(&self, lon: f64, lat: f64) -> Option<T> {
        if self.not_contains(lon, lat) {
            return None;
        }
        let (i, j) = self.geometry.decimal_indexes(lon, lat);
        self.interpolated_value_at_indexes(i - 0.5, j - 0.5)
    }

    /// Bilinear interpolation at fractional node indexes, where node `(k, l)`
    /// is the center of the cell at column `k`, row `l`.
    ///
    /// Neighbour indexes are clamped to the grid, except that columns wrap on
    /// a continuous grid. All four neighbours must hold data.
    pub fn interpolated_value_at_indexes(&self, i: f64, j: f64) -> Option<T> {
        let [fi, ci, fj, cj] = self.four_surrounding_indexes(i, j);
        let (g00, g10, g01, g11) = self.four_surrounding_values(fi, ci, fj, cj)?;
        let x = i - i.floor();
        let y = j - j.floor();
        Some(T::bilinear(x, y, g00, g10, g01, g11))
    }

    /// Raw grid value at clamped indexes; the filter is not applied.
    pub fn value_at_indexes(&self, i: isize, j: isize) -> Option<T> {
        let ci = self.geometry.clamp_column(i);
        let cj = self.geometry.clamp_row(j);
        self.grid[self.geometry.offset(ci, cj)]
    }

    /// Center coordinate of the cell at clamped indexes.
    pub fn lon_lat_at_indexes(&self, i: isize, j: isize) -> LonLat {
        self.geometry
            .lon_lat_at(self.geometry.clamp_column(i), self.geometry.clamp_row(j))
    }

    /// Cells in row-major order, taking every `stride`-th row and column.
    /// A stride of 0 is treated as 1.
    pub fn cells(&self, stride: usize) -> impl Iterator<Item = Cell> + '_ {
        let stride = stride.max(1);
        let g = self.geometry;
        (0..g.n_rows()).step_by(stride).flat_map(move |j| {
            (0..g.n_cols()).step_by(stride).map(move |i| {
                Cell::new(
                    g.lon_lat_at(i, j),
                    self.grid[g.offset(i, j)].map(FieldValue::to_cell_value),
                    g.cell_x_size(),
                    g.cell_y_size(),
                )
            })
        })
    }

    /// Center of a uniformly chosen cell. The cell may hold no data.
    pub fn random_position(&self, rng: &mut Xorshift64) -> LonLat {
        let i = rng.next_usize(self.geometry.n_cols());
        let j = rng.next_usize(self.geometry.n_rows());
        self.geometry.lon_lat_at(i, j)
    }

    /// Builds a field of the same geometry by mapping every valid value.
    pub fn map<U, F>(&self, f: F) -> Field<U>
    where
        U: FieldValue,
        F: Fn(T) -> U,
    {
        let values = self.grid.iter().map(|v| v.map(&f)).collect();
        let mut field = Field {
            geometry: self.geometry,
            grid: values,
            filter: None,
            mask: None,
            range: None,
        };
        field.update_range();
        field
    }

    fn passes_filter(&self, value: &T) -> bool {
        self.filter.as_ref().map_or(true, |f| f(value))
    }

    fn update_range(&mut self) {
        self.range = self
            .grid
            .iter()
            .flatten()
            .filter(|v| self.passes_filter(v))
            .map(FieldValue::range_measure)
            .fold(None, |acc: Option<Range>, m| {
                Some(match acc {
                    Some(r) => Range {
                        min: r.min.min(m),
                        max: r.max.max(m),
                    },
                    None => Range { min: m, max: m },
                })
            });
    }

    fn four_surrounding_indexes(&self, i: f64, j: f64) -> [usize; 4] {
        let g = &self.geometry;
        let fi = i.floor() as isize;
        let fj = j.floor() as isize;
        let (fi, ci) = if g.is_continuous() {
            (g.wrap_column(fi), g.wrap_column(fi + 1))
        } else {
            (g.clamp_column(fi), g.clamp_column(fi + 1))
        };
        [fi, ci, g.clamp_row(fj), g.clamp_row(fj + 1)]
    }

    fn four_surrounding_values(
        &self,
        fi: usize,
        ci: usize,
        fj: usize,
        cj: usize,
    ) -> Option<(T, T, T, T)> {
        let g = &self.geometry;
        let g00 = self.grid[g.offset(fi, fj)]?;
        let g10 = self.grid[g.offset(ci, fj)]?;
        let g01 = self.grid[g.offset(fi, cj)]?;
        let g11 = self.grid[g.offset(ci, cj)]?;
        Some((g00, g10, g01, g11))
    }
}
