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

//! Module containing constants used across the program.

use crate::Float;

/// Default region (contiguous United States with surroundings)
/// as `(lat0, lat1, lon0, lon1)` for longitudes between -180 and 180.
pub const US_REGION_SIGNED: (Float, Float, Float, Float) = (20.0, 70.0, -140.0, -20.0);

/// Default region as in [`US_REGION_SIGNED`]
/// for longitudes between 0 and 360.
pub const US_REGION_POSITIVE: (Float, Float, Float, Float) = (20.0, 70.0, 220.0, 340.0);

/// Number of filled bands used for filled contours.
pub const FILL_LEVELS: u16 = 200;

/// Number of labelled line contours drawn over filled contours.
pub const LINE_CONTOURS: u16 = 5;

/// Upper limit of line contours per panel.
pub const MAX_LINE_CONTOURS: u16 = 100;

/// Figure size (in inches) of scalar field plots.
pub const FIGSIZE: (Float, Float) = (15.0, 4.0);

/// Figure size (in inches) of quiver plots.
pub const QUIVER_FIGSIZE: (Float, Float) = (12.0, 5.0);

/// Pixels per inch of rendered figures.
pub const DPI: u16 = 100;

/// Upper limit of arrows drawn along each axis of a quiver plot.
pub const QUIVER_MAX_ARROWS: usize = 40;
