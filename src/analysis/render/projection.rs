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

//! Module with the geographic projection used for map panels.
//!
//! Plate Carrée (equirectangular) projection maps longitude
//! and latitude linearly onto the panel pixels, with north
//! at the top of the panel regardless of the latitude axis order.

use crate::errors::RenderError;
use crate::Float;

/// Plate Carrée projection of a geographic extent
/// onto a panel of given size in pixels.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
pub struct PlateCarree {
    west: Float,
    east: Float,
    south: Float,
    north: Float,
    width: Float,
    height: Float,
}

impl PlateCarree {
    /// Projection covering the extent of the axes.
    /// A single-valued axis gets one degree of extent around the value.
    pub fn new(lats: &[Float], lons: &[Float], width: u32, height: u32) -> Result<Self, RenderError> {
        let (south, north) = extent(lats).ok_or(RenderError::EmptyGrid)?;
        let (west, east) = extent(lons).ok_or(RenderError::EmptyGrid)?;

        Ok(PlateCarree {
            west,
            east,
            south,
            north,
            width: Float::from(width),
            height: Float::from(height),
        })
    }

    /// Ratio of longitude span to latitude span.
    pub fn aspect(lats: &[Float], lons: &[Float]) -> Option<Float> {
        let (south, north) = extent(lats)?;
        let (west, east) = extent(lons)?;

        Some((east - west) / (north - south))
    }

    /// Geographic coordinates to panel pixel coordinates.
    pub fn project(&self, lon: Float, lat: Float) -> (Float, Float) {
        let x = (lon - self.west) / (self.east - self.west) * self.width;
        let y = (self.north - lat) / (self.north - self.south) * self.height;

        (x, y)
    }

    /// Panel pixel coordinates to geographic coordinates.
    pub fn inverse_project(&self, x: Float, y: Float) -> (Float, Float) {
        let lon = self.west + x / self.width * (self.east - self.west);
        let lat = self.north - y / self.height * (self.north - self.south);

        (lon, lat)
    }
}

fn extent(axis: &[Float]) -> Option<(Float, Float)> {
    let min = axis.iter().copied().filter(|v| v.is_finite()).reduce(Float::min)?;
    let max = axis.iter().copied().filter(|v| v.is_finite()).reduce(Float::max)?;

    if max > min {
        Some((min, max))
    } else {
        Some((min - 0.5, max + 0.5))
    }
}
