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

//! Module translating plot requests into 2-D grids:
//! selection of a day, a pressure level and a field.

use super::dataset::time::format_date;
use super::derived;
use crate::errors::QueryError;
use crate::Float;
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayView3, Axis};
use serde::Deserialize;

/// Selector of the day, either 1-based sequential
/// index or `[month, day]` of the bundle year.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Deserialize)]
#[serde(untagged)]
pub enum DaySelector {
    Index(usize),
    Date((u32, u32)),
}

/// Kinds of fields that can be plotted.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[serde(alias = "hgts")]
    Height,
    #[serde(alias = "uwnd")]
    UWind,
    #[serde(alias = "vwnd")]
    VWind,
    #[serde(alias = "wnd")]
    WindSpeed,
    #[serde(alias = "grad")]
    Gradient,
    #[serde(alias = "all")]
    HeightAndWindSpeed,
    Quiver,
}

impl FieldKind {
    /// Scalar fields drawn side by side, empty for quiver.
    pub fn panels(self) -> Vec<ScalarField> {
        match self {
            FieldKind::Height => vec![ScalarField::Height],
            FieldKind::UWind => vec![ScalarField::UWind],
            FieldKind::VWind => vec![ScalarField::VWind],
            FieldKind::WindSpeed => vec![ScalarField::WindSpeed],
            FieldKind::Gradient => vec![ScalarField::Gradient],
            FieldKind::HeightAndWindSpeed => vec![ScalarField::Height, ScalarField::WindSpeed],
            FieldKind::Quiver => vec![],
        }
    }

    /// Short name used in output file names.
    pub fn slug(self) -> &'static str {
        match self {
            FieldKind::Height => "hgt",
            FieldKind::UWind => "uwnd",
            FieldKind::VWind => "vwnd",
            FieldKind::WindSpeed => "wnd",
            FieldKind::Gradient => "grad",
            FieldKind::HeightAndWindSpeed => "all",
            FieldKind::Quiver => "quiver",
        }
    }
}

/// Single 2-D field of a panel.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ScalarField {
    Height,
    UWind,
    VWind,
    WindSpeed,
    Gradient,
}

impl ScalarField {
    pub fn title(self) -> &'static str {
        match self {
            ScalarField::Height => "Geopotential Heights",
            ScalarField::UWind => "U Winds",
            ScalarField::VWind => "V Winds",
            ScalarField::WindSpeed => "Total Wind",
            ScalarField::Gradient => "Pressure Gradient",
        }
    }

    pub fn is_wind(self) -> bool {
        matches!(
            self,
            ScalarField::UWind | ScalarField::VWind | ScalarField::WindSpeed
        )
    }
}

/// Views of all bundle variables on one day,
/// grids are `(level, lat, lon)`.
#[derive(Clone, Debug)]
pub struct Snapshot<'a> {
    pub date: NaiveDate,
    pub lats: ArrayView1<'a, Float>,
    pub lons: ArrayView1<'a, Float>,
    pub height: ArrayView3<'a, Float>,
    pub u_wind: Option<ArrayView3<'a, Float>>,
    pub v_wind: Option<ArrayView3<'a, Float>>,
    pub wind_speed: Option<ArrayView3<'a, Float>>,
}

impl<'a> Snapshot<'a> {
    pub fn level_count(&self) -> usize {
        self.height.len_of(Axis(0))
    }

    /// Grid of the field on (1-based) level.
    pub fn scalar(&self, field: ScalarField, level: usize) -> Result<Array2<Float>, QueryError> {
        let index = self.level_index(level)?;

        let grid = match field {
            ScalarField::Height => self.height.index_axis(Axis(0), index).to_owned(),
            ScalarField::UWind => level_of(self.u_wind, "u-wind", index)?.to_owned(),
            ScalarField::VWind => level_of(self.v_wind, "v-wind", index)?.to_owned(),
            ScalarField::WindSpeed => {
                level_of(self.wind_speed, "u-wind and v-wind", index)?.to_owned()
            }
            ScalarField::Gradient => {
                derived::gradient_magnitude(self.height.index_axis(Axis(0), index))
            }
        };

        Ok(grid)
    }

    /// Wind components `(u, v)` on (1-based) level.
    pub fn vectors(
        &self,
        level: usize,
    ) -> Result<(ArrayView2<'a, Float>, ArrayView2<'a, Float>), QueryError> {
        let index = self.level_index(level)?;

        Ok((
            level_of(self.u_wind, "u-wind", index)?,
            level_of(self.v_wind, "v-wind", index)?,
        ))
    }

    /// Plot title, eg. `Mar 01 2020 : Level 5 : Score 0.9812`.
    pub fn title(&self, level: usize, score: Option<Float>) -> String {
        let mut title = format!("{} : Level {}", format_date(self.date), level);

        if let Some(score) = score {
            let score = (score * 10_000.0).round() / 10_000.0;
            title.push_str(&format!(" : Score {}", score));
        }

        title
    }

    fn level_index(&self, level: usize) -> Result<usize, QueryError> {
        let extent = self.level_count();

        if level == 0 || level > extent {
            return Err(QueryError::IndexOutOfRange {
                axis: "level",
                value: level,
                extent,
            });
        }

        Ok(level - 1)
    }
}

fn level_of<'a>(
    grid: Option<ArrayView3<'a, Float>>,
    variable: &'static str,
    index: usize,
) -> Result<ArrayView2<'a, Float>, QueryError> {
    let grid = grid.ok_or(QueryError::MissingVariable(variable))?;
    Ok(grid.index_axis_move(Axis(0), index))
}
