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

//! Module responsible for reading gridded reanalysis
//! variables and storing them as a dataset bundle.
//!
//! A bundle holds the height record with optional wind
//! components read from files of the same year, their
//! coordinate axes and the region computed for them.
//! It is built once and never mutated afterwards, all queries
//! return views into the stored arrays.

mod loader;
mod reader;
pub mod time;

#[cfg(test)]
pub mod memory;

pub use self::reader::NetcdfReader;

use self::time::{calendar_date, date_to_day, day_to_date, TimeAxis};
use super::derived;
use super::query::{DaySelector, Snapshot};
use super::region::{BoundingBox, LonConvention, Region};
use crate::errors::{DataError, InputError, QueryError};
use crate::Float;
use chrono::{Datelike, NaiveDate};
use log::debug;
use ndarray::{Array1, Array4, ArrayView3, Axis};
use std::path::{Path, PathBuf};

/// Source of gridded data, implemented for
/// netCDF files and (in tests) for in-memory arrays.
pub trait GridSource {
    /// Reads `(lat, lon)` coordinate axes.
    fn read_axes(&self, path: &Path) -> Result<(Vec<Float>, Vec<Float>), InputError>;

    fn read_time(&self, path: &Path) -> Result<TimeAxis, InputError>;

    /// Reads the variable as `(time, level, lat, lon)` array,
    /// whole record or a single time step.
    fn read_variable(
        &self,
        path: &Path,
        name: &str,
        time_index: Option<usize>,
    ) -> Result<Array4<Float>, InputError>;
}

/// Variables that can be read from input files.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Variable {
    Height,
    UWind,
    VWind,
}

impl Variable {
    /// Name of the variable inside the file.
    pub fn name(self) -> &'static str {
        match self {
            Variable::Height => "hgt",
            Variable::UWind => "uwnd",
            Variable::VWind => "vwnd",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Variable::Height => "height",
            Variable::UWind => "u-wind",
            Variable::VWind => "v-wind",
        }
    }

    /// Sub-directory of the yearly files archive.
    fn archive_dir(self) -> &'static str {
        match self {
            Variable::Height => "hgts",
            Variable::UWind => "u_winds",
            Variable::VWind => "v_winds",
        }
    }

    fn archive_path(self, root: &Path, year: i32) -> PathBuf {
        root.join(self.archive_dir())
            .join(format!("{}.{}.nc", self.name(), year))
    }
}

/// Time steps to read from files.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TimeSelection {
    /// Whole record.
    All,

    /// Single time step falling on the date.
    Date(NaiveDate),
}

/// Paths of files forming one bundle.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct DatasetPaths {
    pub height: PathBuf,
    pub u_wind: Option<PathBuf>,
    pub v_wind: Option<PathBuf>,
}

impl DatasetPaths {
    /// Paths of all three variables in the yearly
    /// archive, eg. `<root>/hgts/hgt.2020.nc`.
    pub fn archive(root: &Path, year: i32) -> Self {
        DatasetPaths {
            height: Variable::Height.archive_path(root, year),
            u_wind: Some(Variable::UWind.archive_path(root, year)),
            v_wind: Some(Variable::VWind.archive_path(root, year)),
        }
    }
}

/// Dataset bundle of gridded variables.
#[derive(Clone, Debug)]
pub struct Dataset {
    year: i32,
    first_day: u32,
    times: Array1<Float>,
    lats: Array1<Float>,
    lons: Array1<Float>,
    height: Array4<Float>,
    u_wind: Option<Array4<Float>>,
    v_wind: Option<Array4<Float>>,
    wind_speed: Option<Array4<Float>>,
    region: Region,
}

impl Dataset {
    /// Reads the bundle from files and localizes it.
    ///
    /// Coordinate axes and time are read from the height file.
    /// Wind files must come from the same year and have the same
    /// shape as height, wind speed is computed only when both
    /// wind components are present.
    pub fn load<S: GridSource>(
        source: &S,
        paths: &DatasetPaths,
        convention: LonConvention,
        bounds: BoundingBox,
        selection: TimeSelection,
    ) -> Result<Self, DataError> {
        debug!("Loading dataset from {}", paths.height.display());

        let year = loader::parse_year(&paths.height)?;

        if let TimeSelection::Date(date) = selection {
            if date.year() != year {
                return Err(InputError::DateMismatch {
                    variable: Variable::Height.name(),
                    found: year,
                    expected: date.year(),
                }
                .into());
            }
        }

        let time = source.read_time(&paths.height)?;
        let time_index = loader::locate_time(&time, selection, &paths.height)?;

        let height = source.read_variable(&paths.height, Variable::Height.name(), time_index)?;
        let (lats, lons) = source.read_axes(&paths.height)?;
        loader::check_axes(&height, lats.len(), lons.len())?;

        let shape = height.shape().to_vec();
        let read_wind = |path: &Option<PathBuf>, variable: Variable| match path {
            Some(path) => {
                loader::read_secondary(source, path, variable, year, selection, &shape).map(Some)
            }
            None => Ok(None),
        };

        let u_wind = read_wind(&paths.u_wind, Variable::UWind)?;
        let v_wind = read_wind(&paths.v_wind, Variable::VWind)?;

        debug!("Wrapping longitudes to {:?} convention", convention);
        let (lons, split) = loader::wrap_longitudes(&lons, convention);
        let height = loader::rotate_longitudes(height, split);
        let u_wind = u_wind.map(|grid| loader::rotate_longitudes(grid, split));
        let v_wind = v_wind.map(|grid| loader::rotate_longitudes(grid, split));

        let wind_speed = match (&u_wind, &v_wind) {
            (Some(u), Some(v)) => {
                debug!("Computing wind speed");
                Some(derived::wind_speed(u.view(), v.view())?)
            }
            _ => None,
        };

        let lats = Array1::from(lats);
        let lons = Array1::from(lons);
        let region = Region::new(lats.view(), lons.view(), bounds)?;

        let (times, first_day) = match selection {
            TimeSelection::All => {
                let first_day = match (time.units, time.values.first()) {
                    (Some(units), Some(&start)) => units.to_datetime(start)?.ordinal(),
                    _ => 1,
                };
                (time.normalized(), first_day)
            }
            TimeSelection::Date(date) => (Array1::zeros(1), date.ordinal()),
        };

        debug!(
            "Dataset loaded: year {}, {} days from day {}, grid {:?}",
            year,
            height.len_of(Axis(0)),
            first_day,
            height.shape()
        );

        Ok(Dataset {
            year,
            first_day,
            times,
            lats,
            lons,
            height,
            u_wind,
            v_wind,
            wind_speed,
            region,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Number of days in the bundle.
    pub fn days(&self) -> usize {
        self.height.len_of(Axis(0))
    }

    pub fn levels(&self) -> usize {
        self.height.len_of(Axis(1))
    }

    /// Time axis offsets from the first record.
    pub fn times(&self) -> &Array1<Float> {
        &self.times
    }

    pub fn lats(&self) -> &Array1<Float> {
        &self.lats
    }

    pub fn lons(&self) -> &Array1<Float> {
        &self.lons
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn has_winds(&self) -> bool {
        self.wind_speed.is_some()
    }

    /// Calendar date of the (1-based) day.
    pub fn date(&self, day: usize) -> Result<NaiveDate, QueryError> {
        self.check_day(day)?;
        calendar_date(self.year, self.first_day + day as u32 - 1)
    }

    /// `(month, day)` of the (1-based) day.
    pub fn month_day(&self, day: usize) -> Result<(u32, u32), QueryError> {
        self.check_day(day)?;
        day_to_date(self.year, self.first_day + day as u32 - 1)
    }

    /// Converts the day selector to the (1-based) day of the bundle.
    pub fn resolve_day(&self, selector: DaySelector) -> Result<usize, QueryError> {
        let day = match selector {
            DaySelector::Index(day) => day,
            DaySelector::Date(date) => {
                let day_of_year = date_to_day(self.year, date)? as usize;

                (day_of_year + 1)
                    .checked_sub(self.first_day as usize)
                    .filter(|&day| day >= 1)
                    .ok_or(QueryError::IndexOutOfRange {
                        axis: "day",
                        value: day_of_year,
                        extent: self.days(),
                    })?
            }
        };

        self.check_day(day)?;
        Ok(day)
    }

    /// Views of all variables on the (1-based) day,
    /// full grid or localized to the region.
    pub fn snapshot(&self, day: usize, localized: bool) -> Result<Snapshot<'_>, QueryError> {
        let date = self.date(day)?;
        let index = day - 1;

        let mut snapshot = Snapshot {
            date,
            lats: self.lats.view(),
            lons: self.lons.view(),
            height: day_view(&self.height, index),
            u_wind: self.u_wind.as_ref().map(|grid| day_view(grid, index)),
            v_wind: self.v_wind.as_ref().map(|grid| day_view(grid, index)),
            wind_speed: self.wind_speed.as_ref().map(|grid| day_view(grid, index)),
        };

        if localized {
            let region = self.region;
            let (lats, lons) = region.slice_axes(snapshot.lats, snapshot.lons);

            snapshot.lats = lats;
            snapshot.lons = lons;
            snapshot.height = region.localize(snapshot.height);
            snapshot.u_wind = snapshot.u_wind.map(|grid| region.localize(grid));
            snapshot.v_wind = snapshot.v_wind.map(|grid| region.localize(grid));
            snapshot.wind_speed = snapshot.wind_speed.map(|grid| region.localize(grid));
        }

        Ok(snapshot)
    }

    fn check_day(&self, day: usize) -> Result<(), QueryError> {
        if day == 0 || day > self.days() {
            return Err(QueryError::IndexOutOfRange {
                axis: "day",
                value: day,
                extent: self.days(),
            });
        }

        Ok(())
    }
}

fn day_view(grid: &Array4<Float>, index: usize) -> ArrayView3<'_, Float> {
    grid.index_axis(Axis(0), index)
}
