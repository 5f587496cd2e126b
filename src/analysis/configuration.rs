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

//! Module responsible for parsing and checking the configuration file.
//!
//! To provide meaningful error messages. The configuration file uses
//! [YAML](https://en.wikipedia.org/wiki/YAML) and `serde` to enforce
//! strong typing and automatic type checking.
//!
//! The structures and their fields in this module directly correspond to
//! the fields inside `config.yaml` so you can check this documentation
//! for more details how to set the config file.

use super::query::{DaySelector, FieldKind};
use super::region::{BoundingBox, LonConvention};
use super::render::colormap::Colormap;
use crate::constants::{DPI, FIGSIZE, FILL_LEVELS, LINE_CONTOURS, MAX_LINE_CONTOURS};
use crate::errors::ConfigError;
use crate::Float;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Paths of one year record files.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Record {
    /// File with geopotential height, eg. `hgt.2020.nc`.
    pub hgt: PathBuf,

    /// _(Optional)_ File with u wind component of the same year.
    pub uwnd: Option<PathBuf>,

    /// _(Optional)_ File with v wind component of the same year.
    pub vwnd: Option<PathBuf>,
}

/// Matched days read from the yearly files archive.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct MatchList {
    /// Root of the archive with `hgts/`, `u_winds/`
    /// and `v_winds/` sub-directories.
    pub root: PathBuf,

    /// CSV file with `date` and `score` columns.
    pub list: PathBuf,
}

/// Source of the input data, exactly one must be set.
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Record(Record),
    Matches(MatchList),
}

/// _(Optional)_ Area to which the data is localized.
///
/// Missing bounds default to the United States sector
/// in the chosen longitude convention.
#[derive(Copy, Clone, PartialEq, Debug, Default, Deserialize)]
pub struct Area {
    /// _(Optional)_ Longitude convention of the bounds
    /// and of the plotted data, `signed` (default) or `positive`.
    #[serde(default)]
    pub convention: LonConvention,

    pub lat0: Option<Float>,
    pub lat1: Option<Float>,
    pub lon0: Option<Float>,
    pub lon1: Option<Float>,
}

impl Area {
    pub fn bounds(&self) -> BoundingBox {
        let default = self.convention.default_bounds();

        BoundingBox {
            lat0: self.lat0.unwrap_or(default.lat0),
            lat1: self.lat1.unwrap_or(default.lat1),
            lon0: self.lon0.unwrap_or(default.lon0),
            lon1: self.lon1.unwrap_or(default.lon1),
        }
    }

    /// Checks if bounds are valid coordinates
    /// in the chosen convention.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        let bounds = self.bounds();
        let (lon_min, lon_max) = self.convention.lon_range();

        if !(-90.0..=90.0).contains(&bounds.lat0) || !(-90.0..=90.0).contains(&bounds.lat1) {
            return Err(ConfigError::OutOfBounds(
                "Latitude bounds must be between -90 and 90",
            ));
        }

        if !(lon_min..=lon_max).contains(&bounds.lon0) || !(lon_min..=lon_max).contains(&bounds.lon1)
        {
            return Err(ConfigError::OutOfBounds(
                "Longitude bounds are outside the range of chosen convention",
            ));
        }

        if bounds.lon0 > bounds.lon1 {
            return Err(ConfigError::OutOfBounds(
                "Western longitude bound cannot be greater than eastern bound",
            ));
        }

        Ok(())
    }
}

/// _(Optional)_ Settings of rendered images.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Render {
    /// _(Optional)_ Number of line contours drawn over
    /// non-wind panels, `0` disables them. Defaults to `5`,
    /// cannot be more than `100`.
    #[serde(default = "Render::default_contours")]
    pub contours: u16,

    /// _(Optional)_ One of `YlOrRd` (default), `viridis`,
    /// `Blues`, `RdBu_r`, `coolwarm`.
    #[serde(default)]
    pub colormap: Colormap,

    /// _(Optional)_ Figure size in inches. Defaults to `[15, 4]`.
    #[serde(default = "Render::default_figsize")]
    pub figsize: (Float, Float),

    /// _(Optional)_ Pixels per inch. Defaults to `100`, cannot be less than `10`.
    #[serde(default = "Render::default_dpi")]
    pub dpi: u16,

    /// _(Optional)_ Number of filled colour bands. Defaults to `200`.
    #[serde(default = "Render::default_fill_levels")]
    pub fill_levels: u16,

    /// _(Optional)_ Directory for images, must be empty
    /// or not exist. Defaults to `./output/`.
    #[serde(default = "Render::default_output_dir")]
    pub output_dir: PathBuf,
}

impl Render {
    fn default_contours() -> u16 {
        LINE_CONTOURS
    }

    fn default_figsize() -> (Float, Float) {
        FIGSIZE
    }

    fn default_dpi() -> u16 {
        DPI
    }

    fn default_fill_levels() -> u16 {
        FILL_LEVELS
    }

    fn default_output_dir() -> PathBuf {
        PathBuf::from("./output/")
    }

    /// Figure size in pixels.
    pub fn pixels(&self, figsize: (Float, Float)) -> (u32, u32) {
        let dpi = Float::from(self.dpi);
        ((figsize.0 * dpi).round() as u32, (figsize.1 * dpi).round() as u32)
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.dpi < 10 {
            return Err(ConfigError::OutOfBounds("DPI cannot be less than 10"));
        }

        if !(self.figsize.0 > 0.0 && self.figsize.1 > 0.0) || self.figsize.0 * self.figsize.1 > 1e4
        {
            return Err(ConfigError::OutOfBounds(
                "Figure size must be positive and reasonably small",
            ));
        }

        if self.contours > MAX_LINE_CONTOURS {
            return Err(ConfigError::OutOfBounds(
                "Number of line contours cannot be more than 100",
            ));
        }

        if self.fill_levels < 2 {
            return Err(ConfigError::OutOfBounds(
                "Number of fill levels cannot be less than 2",
            ));
        }

        Ok(())
    }
}

impl Default for Render {
    fn default() -> Self {
        Render {
            contours: Render::default_contours(),
            colormap: Colormap::default(),
            figsize: Render::default_figsize(),
            dpi: Render::default_dpi(),
            fill_levels: Render::default_fill_levels(),
            output_dir: Render::default_output_dir(),
        }
    }
}

/// Single plot request.
#[derive(Copy, Clone, PartialEq, Debug, Deserialize)]
pub struct Plot {
    /// Field to draw: `height`, `u_wind`, `v_wind`, `wind_speed`,
    /// `gradient`, `height_and_wind_speed` or `quiver`.
    pub field: FieldKind,

    /// Day as 1-based index or `[month, day]`.
    ///
    /// Required for a record. For matched days it selects one match
    /// (by its 1-based position or date), when missing all matches are plotted.
    pub day: Option<DaySelector>,

    /// Pressure level as 1-based index.
    pub level: usize,

    /// _(Optional)_ Plot only the configured area. Defaults to `true`.
    #[serde(default = "Plot::default_localized")]
    pub localized: bool,

    /// _(Optional)_ Rescale values to `[0, 1]`. Defaults to `false`.
    #[serde(default)]
    pub normalized: bool,
}

impl Plot {
    fn default_localized() -> bool {
        true
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.level < 1 {
            return Err(ConfigError::OutOfBounds("Levels are counted from 1"));
        }

        if self.day == Some(DaySelector::Index(0)) {
            return Err(ConfigError::OutOfBounds("Days are counted from 1"));
        }

        Ok(())
    }
}

/// _(Optional)_ Fields with information about
/// resources available for the program.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Resources {
    /// _(Optional)_ Thread count used for rendering.
    ///
    /// Cannot be less than `1`. Defaults to `1`.
    #[serde(default = "Resources::default_threads")]
    pub threads: u16,

    /// _(Optional)_ Heap memory limit in MB.
    /// Useful for enabling meaningful Out-of-memory error messages
    /// when the requested data does not fit in the memory.
    ///
    /// Cannot be less than `128`. Defaults to whole addressable-space.
    #[serde(default = "Resources::default_memory")]
    pub memory: usize,
}

impl Resources {
    fn default_threads() -> u16 {
        1
    }

    fn default_memory() -> usize {
        usize::MAX / (1024 * 1024)
    }

    /// Checks if thread count and memory limit are
    /// above limits.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.threads < 1 {
            return Err(ConfigError::OutOfBounds(
                "Available threads cannot be less than 1",
            ));
        }

        if self.memory < 128 {
            return Err(ConfigError::OutOfBounds(
                "Available memory cannot be less than 128 MB",
            ));
        }

        Ok(())
    }
}

impl Default for Resources {
    fn default() -> Self {
        Resources {
            threads: Resources::default_threads(),
            memory: Resources::default_memory(),
        }
    }
}

/// Main config structure representing the fields in
/// configuration file.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Config {
    pub source: Source,

    #[serde(default)]
    pub region: Area,

    #[serde(default)]
    pub render: Render,

    pub plots: Vec<Plot>,

    #[serde(default)]
    pub resources: Resources,
}

impl Config {
    /// Config structure constructor, responsible for
    /// deserializing configuration and checking it.
    pub fn new_from_file(file_path: &Path) -> Result<Config, ConfigError> {
        let data = fs::read(file_path)?;
        Config::parse(data.as_slice())
    }

    fn parse(data: &[u8]) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_slice(data)?;

        config.region.check_bounds()?;
        config.render.check_bounds()?;
        config.resources.check_bounds()?;

        if config.plots.is_empty() {
            return Err(ConfigError::OutOfBounds("No plots requested"));
        }

        for plot in &config.plots {
            plot.check_bounds()?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_record_config() {
        let yaml = "
source:
  record:
    hgt: data/hgt.2020.nc
plots:
  - field: height
    day: [3, 1]
    level: 5
";
        let config = Config::parse(yaml.as_bytes()).unwrap();

        assert_eq!(
            config.source,
            Source::Record(Record {
                hgt: PathBuf::from("data/hgt.2020.nc"),
                uwnd: None,
                vwnd: None,
            })
        );
        assert_eq!(config.region.bounds(), LonConvention::Signed.default_bounds());
        assert_eq!(config.render, Render::default());
        assert_eq!(config.resources, Resources::default());

        let plot = config.plots[0];
        assert_eq!(plot.day, Some(DaySelector::Date((3, 1))));
        assert!(plot.localized);
        assert!(!plot.normalized);
    }

    #[test]
    fn full_matches_config() {
        let yaml = "
source:
  matches:
    root: /data/ncep
    list: matches.csv
region:
  convention: positive
  lat0: 25
  lon1: 300
render:
  contours: 0
  colormap: viridis
  figsize: [12, 5]
  dpi: 80
  output_dir: ./images/
plots:
  - field: all
    level: 3
  - field: quiver
    day: 2
    level: 1
    localized: false
resources:
  threads: 4
  memory: 2048
";
        let config = Config::parse(yaml.as_bytes()).unwrap();

        assert!(matches!(config.source, Source::Matches(_)));
        assert_eq!(
            config.region.bounds(),
            BoundingBox {
                lat0: 25.0,
                lat1: 70.0,
                lon0: 220.0,
                lon1: 300.0
            }
        );
        assert_eq!(config.render.colormap, Colormap::Viridis);
        assert_eq!(config.render.fill_levels, FILL_LEVELS);
        assert_eq!(config.render.pixels(config.render.figsize), (960, 400));
        assert_eq!(config.plots[0].field, FieldKind::HeightAndWindSpeed);
        assert_eq!(config.plots[0].day, None);
        assert!(!config.plots[1].localized);
        assert_eq!(config.resources.threads, 4);
    }

    #[test]
    fn out_of_bounds_values() {
        let bad_lat = "
source:
  record:
    hgt: hgt.2020.nc
region:
  lat1: 95
plots:
  - field: height
    day: 1
    level: 1
";
        let bad_convention = "
source:
  record:
    hgt: hgt.2020.nc
region:
  convention: signed
  lon0: 220
plots:
  - field: height
    day: 1
    level: 1
";
        let across_dateline = "
source:
  record:
    hgt: hgt.2020.nc
region:
  lon0: 170
  lon1: -170
plots:
  - field: height
    day: 1
    level: 1
";
        let bad_level = "
source:
  record:
    hgt: hgt.2020.nc
plots:
  - field: height
    day: 1
    level: 0
";
        let many_contours = "
source:
  record:
    hgt: hgt.2020.nc
render:
  contours: 65535
plots:
  - field: height
    day: 1
    level: 1
";
        let no_plots = "
source:
  record:
    hgt: hgt.2020.nc
plots: []
";

        for yaml in [
            bad_lat,
            bad_convention,
            across_dateline,
            bad_level,
            many_contours,
            no_plots,
        ] {
            assert!(matches!(
                Config::parse(yaml.as_bytes()),
                Err(ConfigError::OutOfBounds(_))
            ));
        }
    }

    #[test]
    fn unknown_names_rejected() {
        let yaml = "
source:
  record:
    hgt: hgt.2020.nc
render:
  colormap: jet
plots:
  - field: height
    day: 1
    level: 1
";
        assert!(matches!(
            Config::parse(yaml.as_bytes()),
            Err(ConfigError::CantDeserialize(_))
        ));
    }
}
