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

//! Module with fields derived from the base grids.
//!
//! All functions are pure and take the base grids explicitly,
//! so derived fields can be computed for full or localized
//! grids alike.

use crate::errors::DerivedError;
use crate::Float;
use ndarray::{concatenate, s, Array, Array2, ArrayView, ArrayView2, Axis, Dimension, Zip};

/// Computes wind speed `sqrt(u^2 + v^2)` elementwise.
pub fn wind_speed<D: Dimension>(
    u_wind: ArrayView<Float, D>,
    v_wind: ArrayView<Float, D>,
) -> Result<Array<Float, D>, DerivedError> {
    if u_wind.shape() != v_wind.shape() {
        return Err(DerivedError::ShapeMismatch(
            u_wind.shape().to_vec(),
            v_wind.shape().to_vec(),
        ));
    }

    let speed = Zip::from(&u_wind)
        .and(&v_wind)
        .map_collect(|&u, &v| (u * u + v * v).sqrt());

    Ok(speed)
}

/// Computes the magnitude of horizontal gradient of a 2D (lat, lon) field.
///
/// Differences are computed with `[-1, 0, 1]` kernel along both axes,
/// which is a central difference not divided by the grid spacing.
/// At the grid edges the missing neighbour is replaced with
/// the edge value itself (edge replication), so the difference
/// there is one-sided.
pub fn gradient_magnitude(field: ArrayView2<Float>) -> Array2<Float> {
    if field.is_empty() {
        return Array2::zeros(field.raw_dim());
    }

    let padded_lon = concatenate![
        Axis(1),
        field.slice(s![.., 0..1]),
        field,
        field.slice(s![.., -1..])
    ];

    let padded_lat = concatenate![
        Axis(0),
        field.slice(s![0..1, ..]),
        field,
        field.slice(s![-1.., ..])
    ];

    let d_lon = &padded_lon.slice(s![.., 2..]) - &padded_lon.slice(s![.., ..-2]);
    let d_lat = &padded_lat.slice(s![2.., ..]) - &padded_lat.slice(s![..-2, ..]);

    Zip::from(&d_lon)
        .and(&d_lat)
        .map_collect(|&dx, &dy| (dx * dx + dy * dy).sqrt())
}

/// Linearly rescales the array to `[0, 1]` with `(x - min) / (max - min)`.
///
/// Non-finite values are skipped when searching for the extremes and stay NaN.
/// Constant arrays (and arrays without any finite value) cannot be
/// rescaled and return an error.
pub fn normalize<D: Dimension>(array: ArrayView<Float, D>) -> Result<Array<Float, D>, DerivedError> {
    let (min, max) = finite_extremes(&array).ok_or(DerivedError::ConstantField)?;

    if !(max > min) {
        return Err(DerivedError::ConstantField);
    }

    let range = max - min;

    Ok(array.mapv(|v| {
        if v.is_finite() {
            (v - min) / range
        } else {
            Float::NAN
        }
    }))
}

/// Returns minimum and maximum of finite values.
pub fn finite_extremes<D: Dimension>(array: &ArrayView<Float, D>) -> Option<(Float, Float)> {
    array
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((min, max)) => Some((min.min(v), max.max(v))),
        })
}
