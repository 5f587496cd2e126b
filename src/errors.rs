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

use crate::Float;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Error while reading config.yaml: {0}")]
    Config(#[from] ConfigError),

    #[error("Error while preparing input data: {0}")]
    Data(#[from] DataError),

    #[error("Error while creating ThreadPool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Error while handling output directory: {0}")]
    Output(#[from] std::io::Error),

    #[error("Output directory is not usable: {0}")]
    FaultyOutput(&'static str),

    #[error("Cannot set the memory limit of {0} MB")]
    MemoryLimit(usize),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot open config.yaml: {0}")]
    CantOpenFile(#[from] std::io::Error),

    #[error("Cannot deserialize config.yaml: {0}")]
    CantDeserialize(#[from] serde_yaml::Error),

    #[error("Configuration component is out of bounds: {0}")]
    OutOfBounds(&'static str),
}

/// Errors raised while building a dataset bundle.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Cannot read input: {0}")]
    Input(#[from] InputError),

    #[error("Cannot localize data: {0}")]
    Region(#[from] RegionError),

    #[error("Cannot derive field: {0}")]
    Derived(#[from] DerivedError),
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("NetCDF error: {0}")]
    Netcdf(#[from] netcdf::Error),

    #[error("Cannot read match list: {0}")]
    Csv(#[from] csv::Error),

    #[error("Variable {0} not found in {1}")]
    VariableNotFound(String, PathBuf),

    #[error("Attribute {0} of variable {1} not found or not readable")]
    AttributeNotFound(&'static str, String),

    #[error("Cannot parse the year from file name {0}, expected <variable>.<year>.<ext>")]
    UnparsableYear(PathBuf),

    #[error("Cannot parse time units: {0}")]
    UnparsableTimeUnits(String),

    #[error("Cannot parse date: {0}")]
    UnparsableDate(String),

    #[error("Variable {0} has {1} dimensions, expected (time, [level,] lat, lon)")]
    IncorrectDimensions(String, usize),

    #[error("Data of variable {0} does not fit its declared shape")]
    IncorrectShape(String),

    #[error("Axis {axis} has {found} values but grid dimension has {expected}")]
    AxisLengthMismatch {
        axis: &'static str,
        found: usize,
        expected: usize,
    },

    #[error("Shape of {variable} is {found:?} but height shape is {expected:?}")]
    ShapeMismatch {
        variable: &'static str,
        found: Vec<usize>,
        expected: Vec<usize>,
    },

    #[error("Year of {variable} is {found} but height year is {expected}")]
    DateMismatch {
        variable: &'static str,
        found: i32,
        expected: i32,
    },

    #[error("Date {0} not found in {1}")]
    DateNotFound(NaiveDate, PathBuf),
}

#[derive(Error, Debug)]
pub enum RegionError {
    #[error("No {axis} values between {lo} and {hi}")]
    EmptyRegion {
        axis: &'static str,
        lo: Float,
        hi: Float,
    },

    #[error("Values of {0} axis inside bounds do not form a contiguous range")]
    NonContiguousRegion(&'static str),
}

#[derive(Error, Debug)]
pub enum DerivedError {
    #[error("Operand shapes {0:?} and {1:?} differ")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    #[error("Field is constant or has no finite values, cannot normalize")]
    ConstantField,
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Requested field needs {0} which was not loaded")]
    MissingVariable(&'static str),

    #[error("{axis} {value} is out of range 1..={extent}")]
    IndexOutOfRange {
        axis: &'static str,
        value: usize,
        extent: usize,
    },

    #[error("{month}/{day} is not a valid date in {year}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("No matched day falls on {0}/{1}")]
    NoMatchingDay(u32, u32),

    #[error("Plot request needs a day selector")]
    DayNotSelected,
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Cannot render an empty grid")]
    EmptyGrid,

    #[error("Embedded font cannot be loaded")]
    FontUnavailable,

    #[error("Grid shape {grid:?} does not match axes lengths ({lats}, {lons})")]
    AxisMismatch {
        grid: (usize, usize),
        lats: usize,
        lons: usize,
    },

    #[error("Cannot render field: {0}")]
    Derived(#[from] DerivedError),

    #[error("Cannot write image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Searched array is empty")]
    EmptyArray,

    #[error("Searched value is out of array bounds")]
    OutOfBounds,
}

/// Errors of a single render job, reported
/// without stopping the other jobs.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Invalid query: {0}")]
    Query(#[from] QueryError),

    #[error("Cannot derive field: {0}")]
    Derived(#[from] DerivedError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),
}
