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

//! Sub-module reading gridded variables from netCDF files.
//!
//! Every read opens the file, copies requested arrays
//! into memory and closes the file when the handle is dropped.

use super::time::{TimeAxis, TimeUnits};
use super::GridSource;
use crate::errors::InputError;
use crate::Float;
use log::debug;
use ndarray::Array4;
use netcdf::{AttributeValue, Variable};
use std::path::Path;

/// Reader of NCEP/NCAR-like reanalysis files with
/// `lat`, `lon`, `time` coordinate variables.
#[derive(Copy, Clone, Debug, Default)]
pub struct NetcdfReader;

impl GridSource for NetcdfReader {
    fn read_axes(&self, path: &Path) -> Result<(Vec<Float>, Vec<Float>), InputError> {
        debug!("Reading coordinates from {}", path.display());

        let file = netcdf::open(path)?;

        let lats = find_variable(&file, "lat", path)?.get_values::<Float, _>(..)?;
        let lons = find_variable(&file, "lon", path)?.get_values::<Float, _>(..)?;

        Ok((lats, lons))
    }

    fn read_time(&self, path: &Path) -> Result<TimeAxis, InputError> {
        let file = netcdf::open(path)?;
        let time = find_variable(&file, "time", path)?;

        let values = time.get_values::<Float, _>(..)?;

        let units = match string_attribute(&time, "units") {
            Some(units) => Some(TimeUnits::parse(&units)?),
            None => None,
        };

        Ok(TimeAxis { values, units })
    }

    fn read_variable(
        &self,
        path: &Path,
        name: &str,
        time_index: Option<usize>,
    ) -> Result<Array4<Float>, InputError> {
        debug!("Reading {} from {}", name, path.display());

        let file = netcdf::open(path)?;
        let var = find_variable(&file, name, path)?;

        let dims: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

        // variables without level dimension get a level axis of length 1
        let (raw, shape) = match (dims.as_slice(), time_index) {
            (&[nt, nl, ny, nx], None) => (var.get_values::<Float, _>(..)?, (nt, nl, ny, nx)),
            (&[_, nl, ny, nx], Some(t)) => (
                var.get_values::<Float, _>((t, .., .., ..))?,
                (1, nl, ny, nx),
            ),
            (&[nt, ny, nx], None) => (var.get_values::<Float, _>(..)?, (nt, 1, ny, nx)),
            (&[_, ny, nx], Some(t)) => (var.get_values::<Float, _>((t, .., ..))?, (1, 1, ny, nx)),
            _ => return Err(InputError::IncorrectDimensions(name.to_string(), dims.len())),
        };

        let packing = Packing::of(&var);
        let values: Vec<Float> = raw.into_iter().map(|v| packing.unpack(v)).collect();

        Array4::from_shape_vec(shape, values)
            .map_err(|_| InputError::IncorrectShape(name.to_string()))
    }
}

fn find_variable<'f>(
    file: &'f netcdf::File,
    name: &str,
    path: &Path,
) -> Result<Variable<'f>, InputError> {
    file.variable(name)
        .ok_or_else(|| InputError::VariableNotFound(name.to_string(), path.to_path_buf()))
}

/// Packing attributes of a variable. Reanalysis files
/// commonly store data as scaled shorts.
#[derive(Copy, Clone, PartialEq, Debug)]
struct Packing {
    scale_factor: Float,
    add_offset: Float,
    fill_value: Option<Float>,
    missing_value: Option<Float>,
}

impl Packing {
    fn of(var: &Variable) -> Self {
        Packing {
            scale_factor: numeric_attribute(var, "scale_factor").unwrap_or(1.0),
            add_offset: numeric_attribute(var, "add_offset").unwrap_or(0.0),
            fill_value: numeric_attribute(var, "_FillValue"),
            missing_value: numeric_attribute(var, "missing_value"),
        }
    }

    fn unpack(&self, raw: Float) -> Float {
        if Some(raw) == self.fill_value || Some(raw) == self.missing_value {
            return Float::NAN;
        }

        raw * self.scale_factor + self.add_offset
    }
}

fn has_attribute(var: &Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn numeric_attribute(var: &Variable, name: &str) -> Option<Float> {
    if !has_attribute(var, name) {
        return None;
    }

    let value = var.attribute_value(name)?.ok()?;
    Float::try_from(value).ok()
}

fn string_attribute(var: &Variable, name: &str) -> Option<String> {
    if !has_attribute(var, name) {
        return None;
    }

    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(v) => Some(v),
        _ => None,
    }
}
