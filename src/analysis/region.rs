/*
Copyright 2021 Jakub Lewandowski

This file is part of Upper Air Patterns (UAP).

Upper Air Patterns (UAP) is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

Upper Air Patterns (UAP) is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with Upper Air Patterns (UAP). If not, see https://www.gnu.org/licenses/.
*/

//! Module responsible for localization, it is restricting
//! the global grids to a geographic sub-region.
//!
//! Axes of reanalysis grids are monotonic (latitudes usually
//! run north-to-south, longitudes west-to-east) so all gridpoints
//! inside a bounding box form a single contiguous block
//! that can be sliced out without copying.

use crate::constants::{US_REGION_POSITIVE, US_REGION_SIGNED};
use crate::errors::RegionError;
use crate::Float;
use log::debug;
use ndarray::{ArrayBase, ArrayView1, Axis, Data, Dimension, Slice, ViewRepr};
use serde::Deserialize;

/// Convention of longitude values used
/// by the data and by the bounding box.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LonConvention {
    /// Longitudes between -180 and 180.
    Signed,

    /// Longitudes between 0 and 360.
    Positive,
}

impl LonConvention {
    /// Default bounding box covering the United States.
    pub fn default_bounds(self) -> BoundingBox {
        let (lat0, lat1, lon0, lon1) = match self {
            LonConvention::Signed => US_REGION_SIGNED,
            LonConvention::Positive => US_REGION_POSITIVE,
        };

        BoundingBox {
            lat0,
            lat1,
            lon0,
            lon1,
        }
    }

    /// Closed range of valid longitudes.
    pub fn lon_range(self) -> (Float, Float) {
        match self {
            LonConvention::Signed => (-180.0, 180.0),
            LonConvention::Positive => (0.0, 360.0),
        }
    }

    /// Converts the longitude to this convention.
    pub fn wrap(self, lon: Float) -> Float {
        match self {
            LonConvention::Signed if lon > 180.0 => lon - 360.0,
            LonConvention::Positive if lon < 0.0 => lon + 360.0,
            _ => lon,
        }
    }
}

impl Default for LonConvention {
    fn default() -> Self {
        LonConvention::Signed
    }
}

/// Geographic bounding box, bounds are inclusive.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
pub struct BoundingBox {
    pub lat0: Float,
    pub lat1: Float,
    pub lon0: Float,
    pub lon1: Float,
}

/// Inclusive range of indices along one axis.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct AxisRange {
    pub start: usize,
    pub end: usize,
}

impl AxisRange {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    fn as_slice(&self) -> Slice {
        Slice::from(self.start..self.end + 1)
    }
}

/// Finds the contiguous range of indices of axis
/// values satisfying `lo <= value <= hi`.
///
/// The inclusion mask is computed for every axis value and
/// the range spans from the first to the last included index.
/// For a monotonic axis (ascending or descending) every index
/// in-between is included too, otherwise an error is returned.
/// Bounds with `lo > hi` select nothing.
pub fn find_axis_range(
    axis: ArrayView1<Float>,
    lo: Float,
    hi: Float,
    axis_name: &'static str,
) -> Result<AxisRange, RegionError> {
    let mask: Vec<bool> = axis.iter().map(|&v| v >= lo && v <= hi).collect();

    let start = mask.iter().position(|&m| m);
    let end = mask.iter().rposition(|&m| m);

    let (start, end) = match (start, end) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(RegionError::EmptyRegion {
                axis: axis_name,
                lo,
                hi,
            })
        }
    };

    if !mask[start..=end].iter().all(|&m| m) {
        return Err(RegionError::NonContiguousRegion(axis_name));
    }

    Ok(AxisRange { start, end })
}

/// Region of the grid, bounding box together
/// with the index ranges it covers.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Region {
    pub bounds: BoundingBox,
    pub lats: AxisRange,
    pub lons: AxisRange,
}

impl Region {
    /// Computes index ranges of the bounding box on given axes.
    pub fn new(
        lats: ArrayView1<Float>,
        lons: ArrayView1<Float>,
        bounds: BoundingBox,
    ) -> Result<Self, RegionError> {
        let (lat_lo, lat_hi) = if bounds.lat0 <= bounds.lat1 {
            (bounds.lat0, bounds.lat1)
        } else {
            (bounds.lat1, bounds.lat0)
        };

        let lat_range = find_axis_range(lats, lat_lo, lat_hi, "latitude")?;

        // boxes crossing the antimeridian are not supported
        let lon_range = find_axis_range(lons, bounds.lon0, bounds.lon1, "longitude")?;

        debug!(
            "Localized region: lat indices {}..={}, lon indices {}..={}",
            lat_range.start, lat_range.end, lon_range.start, lon_range.end
        );

        Ok(Region {
            bounds,
            lats: lat_range,
            lons: lon_range,
        })
    }

    /// Slices both axes to the region.
    pub fn slice_axes<'a>(
        &self,
        lats: ArrayView1<'a, Float>,
        lons: ArrayView1<'a, Float>,
    ) -> (ArrayView1<'a, Float>, ArrayView1<'a, Float>) {
        let mut lats = lats;
        let mut lons = lons;

        lats.slice_axis_inplace(Axis(0), self.lats.as_slice());
        lons.slice_axis_inplace(Axis(0), self.lons.as_slice());

        (lats, lons)
    }

    /// Slices the last two (lat, lon) dimensions of any
    /// grid to the region, leading dimensions are kept whole.
    pub fn localize<'a, D: Dimension>(
        &self,
        grid: ArrayBase<ViewRepr<&'a Float>, D>,
    ) -> ArrayBase<ViewRepr<&'a Float>, D> {
        let mut grid = grid;
        let ndim = grid.ndim();

        grid.slice_axis_inplace(Axis(ndim - 2), self.lats.as_slice());
        grid.slice_axis_inplace(Axis(ndim - 1), self.lons.as_slice());

        grid
    }

    /// Shape of the last two dimensions of localized grid.
    pub fn shape(&self) -> (usize, usize) {
        (self.lats.len(), self.lons.len())
    }
}

/// Checks whether the grid trailing dimensions fit the axes.
pub fn fits_axes<S, D>(grid: &ArrayBase<S, D>, lats: usize, lons: usize) -> bool
where
    S: Data<Elem = Float>,
    D: Dimension,
{
    let shape = grid.shape();
    let ndim = shape.len();

    ndim >= 2 && shape[ndim - 2] == lats && shape[ndim - 1] == lons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RegionError;
    use ndarray::{array, Array, Array1, Array3};

    #[test]
    fn ascending_axis_range() {
        let axis = Array1::linspace(-90.0, 90.0, 73);
        let range = find_axis_range(axis.view(), 20.0, 70.0, "latitude").unwrap();

        assert_eq!(range, AxisRange { start: 44, end: 64 });
        assert!((axis[range.start] - 20.0).abs() < 1e-9);
        assert!((axis[range.end] - 70.0).abs() < 1e-9);
    }

    #[test]
    fn descending_axis_range() {
        let axis = Array1::linspace(90.0, -90.0, 73);
        let range = find_axis_range(axis.view(), 20.0, 70.0, "latitude").unwrap();

        assert_eq!(range, AxisRange { start: 8, end: 28 });

        for (i, &v) in axis.iter().enumerate() {
            let inside = (20.0..=70.0).contains(&v);
            assert_eq!(inside, (range.start..=range.end).contains(&i));
        }
    }

    #[test]
    fn reversed_latitudes_are_swapped() {
        let lats = Array1::linspace(90.0, -90.0, 73);
        let lons = Array1::linspace(-180.0, 177.5, 144);

        let forward = BoundingBox {
            lat0: 20.0,
            lat1: 70.0,
            lon0: -140.0,
            lon1: -20.0,
        };
        let reversed = BoundingBox {
            lat0: 70.0,
            lat1: 20.0,
            ..forward
        };

        let forward = Region::new(lats.view(), lons.view(), forward).unwrap();
        let reversed = Region::new(lats.view(), lons.view(), reversed).unwrap();

        assert_eq!(forward.lats, reversed.lats);
        assert_eq!(forward.lons, reversed.lons);
    }

    #[test]
    fn reversed_longitudes_select_nothing() {
        let lats = Array1::linspace(90.0, -90.0, 73);
        let lons = Array1::linspace(-180.0, 177.5, 144);

        assert!(matches!(
            find_axis_range(lons.view(), 170.0, -170.0, "longitude"),
            Err(RegionError::EmptyRegion {
                axis: "longitude",
                ..
            })
        ));

        let across_dateline = BoundingBox {
            lat0: 20.0,
            lat1: 70.0,
            lon0: 170.0,
            lon1: -170.0,
        };

        assert!(matches!(
            Region::new(lats.view(), lons.view(), across_dateline),
            Err(RegionError::EmptyRegion {
                axis: "longitude",
                ..
            })
        ));
    }

    #[test]
    fn empty_region() {
        let axis = Array1::linspace(90.0, -90.0, 73);
        let result = find_axis_range(axis.view(), 1000.0, 1001.0, "latitude");

        assert!(matches!(
            result,
            Err(RegionError::EmptyRegion {
                axis: "latitude",
                ..
            })
        ));
    }

    #[test]
    fn non_monotonic_axis() {
        let axis = array![0.0, 10.0, 50.0, 20.0];
        let result = find_axis_range(axis.view(), 5.0, 25.0, "longitude");

        assert!(matches!(
            result,
            Err(RegionError::NonContiguousRegion("longitude"))
        ));
    }

    #[test]
    fn full_range_localization_is_identity() {
        let lats = Array1::linspace(90.0, -90.0, 7);
        let lons = Array1::linspace(0.0, 300.0, 6);
        let grid = Array::from_shape_fn((3, 7, 6), |(t, j, i)| (t * 100 + j * 10 + i) as Float);

        let bounds = BoundingBox {
            lat0: -90.0,
            lat1: 90.0,
            lon0: 0.0,
            lon1: 300.0,
        };

        let region = Region::new(lats.view(), lons.view(), bounds).unwrap();
        let localized = region.localize(grid.view());
        let (loc_lats, loc_lons) = region.slice_axes(lats.view(), lons.view());

        assert_eq!(localized, grid.view());
        assert_eq!(loc_lats, lats.view());
        assert_eq!(loc_lons, lons.view());
    }

    #[test]
    fn localize_slices_trailing_dimensions() {
        let lats = array![60.0, 50.0, 40.0, 30.0];
        let lons = array![-130.0, -120.0, -110.0, -100.0, -90.0];
        let grid: Array3<Float> = Array::from_shape_fn((2, 4, 5), |(t, j, i)| (t * 100 + j * 10 + i) as Float);

        let bounds = BoundingBox {
            lat0: 35.0,
            lat1: 55.0,
            lon0: -125.0,
            lon1: -95.0,
        };

        let region = Region::new(lats.view(), lons.view(), bounds).unwrap();
        let localized = region.localize(grid.view());

        assert_eq!(region.shape(), (2, 3));
        assert_eq!(localized.shape(), &[2, 2, 3]);
        assert_eq!(localized[[1, 0, 0]], 111.0);
        assert_eq!(localized[[0, 1, 2]], 23.0);
        assert!(fits_axes(&localized, 2, 3));
    }

    #[test]
    fn convention_wrapping() {
        assert_eq!(LonConvention::Signed.wrap(220.0), -140.0);
        assert_eq!(LonConvention::Signed.wrap(180.0), 180.0);
        assert_eq!(LonConvention::Positive.wrap(-20.0), 340.0);
        assert_eq!(LonConvention::Positive.wrap(20.0), 20.0);
    }
}
