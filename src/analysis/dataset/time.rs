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

//! Sub-module handling time coordinates of the records
//! and conversions between days of year and calendar dates.

use crate::errors::{InputError, QueryError};
use crate::Float;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use ndarray::Array1;

/// Offsets beyond this cannot be a valid date anyway.
const MAX_OFFSET_MILLIS: Float = 1e17;

/// Decoded `units` attribute of a time variable,
/// eg. `hours since 1800-01-01 00:00:0.0`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TimeUnits {
    /// Length of one time unit in seconds.
    pub step_seconds: i64,
    pub origin: NaiveDateTime,
}

impl TimeUnits {
    /// Parses CF-style time units (standard calendar).
    pub fn parse(units: &str) -> Result<Self, InputError> {
        let err = || InputError::UnparsableTimeUnits(units.to_string());

        let (step, origin) = units.split_once(" since ").ok_or_else(err)?;

        let step_seconds = match step.trim().to_lowercase().as_str() {
            "days" | "day" | "d" => 86_400,
            "hours" | "hour" | "hrs" | "hr" | "h" => 3_600,
            "minutes" | "minute" | "mins" | "min" => 60,
            "seconds" | "second" | "secs" | "sec" | "s" => 1,
            _ => return Err(err()),
        };

        let origin = origin.trim().replace('T', " ");
        let mut parts = origin.split_whitespace();

        let date = parts.next().ok_or_else(err)?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| err())?;

        let time = match parts.next() {
            Some(time) => parse_clock(time).ok_or_else(err)?,
            None => NaiveTime::from_hms_opt(0, 0, 0).ok_or_else(err)?,
        };

        Ok(TimeUnits {
            step_seconds,
            origin: date.and_time(time),
        })
    }

    /// Converts the time coordinate value to datetime.
    ///
    /// Values that do not fit in the calendar range are an error.
    pub fn to_datetime(&self, value: Float) -> Result<NaiveDateTime, InputError> {
        let err = || {
            InputError::UnparsableTimeUnits(format!(
                "time value {} is outside the calendar range",
                value
            ))
        };

        let millis = (value * self.step_seconds as Float * 1000.0).round();

        if !millis.is_finite() || millis.abs() > MAX_OFFSET_MILLIS {
            return Err(err());
        }

        self.origin
            .checked_add_signed(Duration::milliseconds(millis as i64))
            .ok_or_else(err)
    }
}

/// Parses `HH:MM[:SS[.f]]`, seconds may have a single digit.
fn parse_clock(clock: &str) -> Option<NaiveTime> {
    let clock = clock.trim_end_matches('Z');
    let mut fields = clock.split(':');

    let hour: u32 = fields.next()?.parse().ok()?;
    let minute: u32 = fields.next().unwrap_or("0").parse().ok()?;
    let second: Float = fields.next().unwrap_or("0").parse().ok()?;

    let nanos = (second.fract() * 1e9).round() as u32;
    NaiveTime::from_hms_nano_opt(hour, minute, second.trunc() as u32, nanos)
}

/// Time coordinate of a record file.
#[derive(Clone, PartialEq, Debug)]
pub struct TimeAxis {
    pub values: Vec<Float>,
    pub units: Option<TimeUnits>,
}

impl TimeAxis {
    /// Time values shifted to start at zero, so
    /// that they represent offset from the record start.
    pub fn normalized(&self) -> Array1<Float> {
        let first = self.values.first().copied().unwrap_or(0.0);
        self.values.iter().map(|v| v - first).collect()
    }

    /// Finds the index of first time value falling on given date.
    pub fn position_of(&self, date: NaiveDate) -> Result<Option<usize>, InputError> {
        let units = match self.units {
            Some(units) => units,
            None => return Ok(None),
        };

        for (i, &value) in self.values.iter().enumerate() {
            if units.to_datetime(value)?.date() == date {
                return Ok(Some(i));
            }
        }

        Ok(None)
    }
}

/// Converts `(month, day)` to the (1-based) day of given year.
pub fn date_to_day(year: i32, date: (u32, u32)) -> Result<u32, QueryError> {
    let (month, day) = date;

    NaiveDate::from_ymd_opt(year, month, day)
        .map(|d| d.ordinal())
        .ok_or(QueryError::InvalidDate { year, month, day })
}

/// Converts the (1-based) day of given year to `(month, day)`.
pub fn day_to_date(year: i32, day: u32) -> Result<(u32, u32), QueryError> {
    let date = calendar_date(year, day)?;
    Ok((date.month(), date.day()))
}

/// Calendar date of the (1-based) day of given year.
pub fn calendar_date(year: i32, day: u32) -> Result<NaiveDate, QueryError> {
    NaiveDate::from_yo_opt(year, day).ok_or(QueryError::IndexOutOfRange {
        axis: "day of year",
        value: day as usize,
        extent: days_in_year(year) as usize,
    })
}

/// Formats the date the way it appears in plot titles, eg. `Mar 01 2020`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %d %Y").to_string()
}

fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}
