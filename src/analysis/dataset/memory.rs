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

//! In-memory grid source used by tests
//! in place of netCDF files.

use super::time::{TimeAxis, TimeUnits};
use super::GridSource;
use crate::errors::InputError;
use crate::Float;
use ndarray::{s, Array4};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct MemoryFile {
    pub lats: Vec<Float>,
    pub lons: Vec<Float>,
    pub time: TimeAxis,
    pub variables: HashMap<String, Array4<Float>>,
}

impl MemoryFile {
    /// Daily record of one variable starting on January 1st,
    /// values generated from `(time, level, lat, lon)` indices.
    pub fn daily<F>(
        year: i32,
        name: &str,
        shape: (usize, usize, usize, usize),
        lats: Vec<Float>,
        lons: Vec<Float>,
        values: F,
    ) -> Self
    where
        F: Fn((usize, usize, usize, usize)) -> Float,
    {
        let units = TimeUnits::parse(&format!("hours since {}-01-01 00:00:0.0", year))
            .expect("Test time units must be valid");

        let time = TimeAxis {
            values: (0..shape.0).map(|t| 24.0 * t as Float).collect(),
            units: Some(units),
        };

        let mut variables = HashMap::new();
        variables.insert(name.to_string(), Array4::from_shape_fn(shape, values));

        MemoryFile {
            lats,
            lons,
            time,
            variables,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    files: HashMap<PathBuf, MemoryFile>,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource::default()
    }

    pub fn insert<P: AsRef<Path>>(&mut self, path: P, file: MemoryFile) {
        self.files.insert(path.as_ref().to_path_buf(), file);
    }

    fn file(&self, path: &Path) -> Result<&MemoryFile, InputError> {
        self.files
            .get(path)
            .ok_or_else(|| InputError::VariableNotFound("*".to_string(), path.to_path_buf()))
    }
}

impl GridSource for MemorySource {
    fn read_axes(&self, path: &Path) -> Result<(Vec<Float>, Vec<Float>), InputError> {
        let file = self.file(path)?;
        Ok((file.lats.clone(), file.lons.clone()))
    }

    fn read_time(&self, path: &Path) -> Result<TimeAxis, InputError> {
        Ok(self.file(path)?.time.clone())
    }

    fn read_variable(
        &self,
        path: &Path,
        name: &str,
        time_index: Option<usize>,
    ) -> Result<Array4<Float>, InputError> {
        let grid = self
            .file(path)?
            .variables
            .get(name)
            .ok_or_else(|| InputError::VariableNotFound(name.to_string(), path.to_path_buf()))?;

        match time_index {
            None => Ok(grid.clone()),
            Some(t) => Ok(grid.slice(s![t..t + 1, .., .., ..]).to_owned()),
        }
    }
}
