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

//! Sub-module with the steps of reading a single variable
//! of the dataset bundle: file name parsing, locating
//! requested date, shape validation and longitude wrapping.

use super::time::TimeAxis;
use super::{GridSource, TimeSelection, Variable};
use crate::analysis::region::LonConvention;
use crate::errors::InputError;
use crate::Float;
use chrono::Datelike;
use log::debug;
use ndarray::{concatenate, s, Array4, Axis};
use std::path::Path;

/// Parses the year from file name following
/// `<variable>.<year>.<ext>` convention, eg. `hgt.2020.nc`.
pub fn parse_year(path: &Path) -> Result<i32, InputError> {
    let err = || InputError::UnparsableYear(path.to_path_buf());

    let name = path.file_name().and_then(|n| n.to_str()).ok_or_else(err)?;
    let parts: Vec<&str> = name.split('.').collect();

    if parts.len() < 3 {
        return Err(err());
    }

    parts[parts.len() - 2].parse::<i32>().map_err(|_| err())
}

/// Finds the index of the time step to read,
/// `None` means that whole record is read.
pub fn locate_time(
    time: &TimeAxis,
    selection: TimeSelection,
    path: &Path,
) -> Result<Option<usize>, InputError> {
    match selection {
        TimeSelection::All => Ok(None),
        TimeSelection::Date(date) => {
            let index = time
                .position_of(date)?
                .ok_or_else(|| InputError::DateNotFound(date, path.to_path_buf()))?;

            debug!("Date {} found at time index {} of {}", date, index, path.display());
            Ok(Some(index))
        }
    }
}

/// Reads the additional (wind) variable and checks that
/// it belongs to the same year and has the same shape as height.
pub fn read_secondary<S: GridSource>(
    source: &S,
    path: &Path,
    variable: Variable,
    year: i32,
    selection: TimeSelection,
    expected_shape: &[usize],
) -> Result<Array4<Float>, InputError> {
    let found_year = parse_year(path)?;

    if found_year != year {
        return Err(InputError::DateMismatch {
            variable: variable.name(),
            found: found_year,
            expected: year,
        });
    }

    if let TimeSelection::Date(date) = selection {
        if date.year() != found_year {
            return Err(InputError::DateMismatch {
                variable: variable.name(),
                found: found_year,
                expected: date.year(),
            });
        }
    }

    debug!("Reading {} from {}", variable.label(), path.display());

    let time = source.read_time(path)?;
    let time_index = locate_time(&time, selection, path)?;

    let grid = source.read_variable(path, variable.name(), time_index)?;

    if grid.shape() != expected_shape {
        return Err(InputError::ShapeMismatch {
            variable: variable.name(),
            found: grid.shape().to_vec(),
            expected: expected_shape.to_vec(),
        });
    }

    Ok(grid)
}

/// Checks that coordinate axes fit the trailing grid dimensions.
pub fn check_axes(grid: &Array4<Float>, lats: usize, lons: usize) -> Result<(), InputError> {
    let shape = grid.shape();

    if shape[2] != lats {
        return Err(InputError::AxisLengthMismatch {
            axis: "lat",
            found: lats,
            expected: shape[2],
        });
    }

    if shape[3] != lons {
        return Err(InputError::AxisLengthMismatch {
            axis: "lon",
            found: lons,
            expected: shape[3],
        });
    }

    Ok(())
}

/// Converts longitudes to the convention and rotates the axis
/// so that it is ascending again. Returns the new axis and
/// the index of original axis at which the new axis starts.
pub fn wrap_longitudes(lons: &[Float], convention: LonConvention) -> (Vec<Float>, usize) {
    let wrapped: Vec<Float> = lons.iter().map(|&lon| convention.wrap(lon)).collect();

    if wrapped.as_slice() == lons {
        return (wrapped, 0);
    }

    let split = wrapped
        .windows(2)
        .position(|pair| pair[1] < pair[0])
        .map_or(0, |i| i + 1);

    let mut rotated = wrapped[split..].to_vec();
    rotated.extend_from_slice(&wrapped[..split]);

    (rotated, split)
}

/// Rotates the grid along longitude dimension to
/// follow the axis returned by [`wrap_longitudes`].
pub fn rotate_longitudes(grid: Array4<Float>, split: usize) -> Array4<Float> {
    if split == 0 {
        return grid;
    }

    let east = grid.slice(s![.., .., .., split..]);
    let west = grid.slice(s![.., .., .., ..split]);

    concatenate![Axis(3), east, west]
}
