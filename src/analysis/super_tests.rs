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

//! This is a module for integration tests of the analysis,
//! but with access to private fields and methods.
//!
//! As most of the analysis steps need a dataset read from
//! netCDF files it would be tedious to write a dataset setup
//! for each unit test. So these "super-unit-tests" run the whole
//! pipeline on in-memory data instead.

use super::configuration::Config;
use super::dataset::memory::{MemoryFile, MemorySource};
use super::dataset::DatasetPaths;
use super::matches::{self, Match};
use super::region::LonConvention;
use super::{
    load_bundles, prepare_jobs, prepare_output_dir, render_snapshot, run_job, select_days, Bundle,
};
use crate::errors::{DerivedError, JobError, QueryError};
use crate::Float;
use chrono::NaiveDate;
use std::path::Path;

fn lats() -> Vec<Float> {
    (0..11).map(|i| 75.0 - 7.5 * i as Float).collect()
}

fn lons() -> Vec<Float> {
    (0..144).map(|i| 2.5 * i as Float).collect()
}

/// Height record with winds, height grows to the south
/// and the wind blows from south-west everywhere.
fn record_source(root: &Path, year: i32, days: usize) -> MemorySource {
    let shape = (days, 3, 11, 144);
    let paths = DatasetPaths::archive(root, year);
    let mut source = MemorySource::new();

    source.insert(
        &paths.height,
        MemoryFile::daily(year, "hgt", shape, lats(), lons(), |(t, l, y, x)| {
            5000.0 + 10.0 * t as Float + 1000.0 * l as Float + 20.0 * y as Float
                + (x as Float / 10.0).sin()
        }),
    );

    if let (Some(u_path), Some(v_path)) = (paths.u_wind, paths.v_wind) {
        source.insert(
            u_path,
            MemoryFile::daily(year, "uwnd", shape, lats(), lons(), |(_, l, ..)| {
                3.0 * (l + 1) as Float
            }),
        );
        source.insert(
            v_path,
            MemoryFile::daily(year, "vwnd", shape, lats(), lons(), |(_, l, ..)| {
                4.0 * (l + 1) as Float
            }),
        );
    }

    source
}

fn record_config(plots: &str) -> Config {
    let yaml = format!(
        "
source:
  record:
    hgt: data/hgts/hgt.2020.nc
    uwnd: data/u_winds/uwnd.2020.nc
    vwnd: data/v_winds/vwnd.2020.nc
render:
  figsize: [6, 2]
  dpi: 50
  fill_levels: 20
plots:
{}
",
        plots
    );

    serde_yaml::from_str(&yaml).unwrap()
}

fn matches_config(plots: &str) -> Config {
    let yaml = format!(
        "
source:
  matches:
    root: data
    list: data/matches.csv
region:
  convention: positive
render:
  figsize: [6, 2]
  dpi: 50
plots:
{}
",
        plots
    );

    serde_yaml::from_str(&yaml).unwrap()
}

fn matched_bundles(source: &MemorySource) -> Vec<Bundle> {
    let entries = vec![
        Match {
            date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            score: 0.981_234,
        },
        Match {
            date: NaiveDate::from_ymd_opt(2020, 1, 15).unwrap(),
            score: 0.75,
        },
    ];

    matches::load_matches(
        source,
        Path::new("data"),
        &entries,
        LonConvention::Positive,
        LonConvention::Positive.default_bounds(),
    )
    .unwrap()
    .into_iter()
    .map(|day| Bundle {
        dataset: day.dataset,
        score: Some(day.score),
    })
    .collect()
}

#[test]
fn record_pipeline() {
    let source = record_source(Path::new("data"), 2020, 70);
    let config = record_config(
        "
  - field: height
    day: [3, 1]
    level: 2
  - field: all
    day: 10
    level: 1
  - field: quiver
    day: 1
    level: 3
  - field: gradient
    day: 5
    level: 1
    localized: false
    normalized: true
",
    );

    let bundles = load_bundles(&source, &config).unwrap();
    assert_eq!(bundles.len(), 1);
    assert_eq!(bundles[0].dataset.days(), 70);

    // longitudes wrapped to -180..180, US sector is 49 x 7 gridpoints
    assert_eq!(bundles[0].dataset.region().shape(), (7, 49));

    let jobs = prepare_jobs(&config, &bundles);
    assert_eq!(jobs.len(), 4);
    assert_eq!(jobs[0].day, 61);

    let bundle = &bundles[0];
    let titles: Vec<String> = jobs
        .iter()
        .map(|job| {
            let snapshot = bundle.dataset.snapshot(job.day, job.plot.localized).unwrap();
            let figure = render_snapshot(&snapshot, &job.plot, bundle.score, &config).unwrap();

            if job.plot.field == super::FieldKind::Quiver {
                assert_eq!(figure.image.dimensions(), (600, 250));
            } else {
                assert_eq!(figure.image.dimensions(), (300, 100));
            }

            figure.title
        })
        .collect();

    assert_eq!(titles[0], "Mar 01 2020 : Level 2");
    assert_eq!(titles[1], "Jan 10 2020 : Level 1");
    assert_eq!(titles[3], "Jan 05 2020 : Level 1");
}

#[test]
fn record_requests_validated() {
    let source = record_source(Path::new("data"), 2020, 10);
    let config = record_config(
        "
  - field: height
    level: 1
  - field: height
    day: 11
    level: 1
  - field: height
    day: [2, 30]
    level: 1
  - field: height
    day: 1
    level: 1
",
    );

    let bundles = load_bundles(&source, &config).unwrap();

    assert!(matches!(
        select_days(&config.source, &bundles, &config.plots[0]),
        Err(QueryError::DayNotSelected)
    ));
    assert!(matches!(
        select_days(&config.source, &bundles, &config.plots[1]),
        Err(QueryError::IndexOutOfRange { axis: "day", .. })
    ));
    assert!(matches!(
        select_days(&config.source, &bundles, &config.plots[2]),
        Err(QueryError::InvalidDate { .. })
    ));

    // invalid requests are skipped
    assert_eq!(prepare_jobs(&config, &bundles).len(), 1);
}

#[test]
fn failing_renders_reported() {
    let mut source = record_source(Path::new("data"), 2020, 3);
    source.insert(
        "flat/hgt.2020.nc",
        MemoryFile::daily(2020, "hgt", (3, 1, 11, 144), lats(), lons(), |_| 5520.0),
    );

    let config = record_config(
        "
  - field: height
    day: 1
    level: 4
",
    );
    let bundles = load_bundles(&source, &config).unwrap();
    let snapshot = bundles[0].dataset.snapshot(1, true).unwrap();

    assert!(matches!(
        render_snapshot(&snapshot, &config.plots[0], None, &config),
        Err(JobError::Query(QueryError::IndexOutOfRange { axis: "level", .. }))
    ));

    let flat_config: Config = serde_yaml::from_str(
        "
source:
  record:
    hgt: flat/hgt.2020.nc
plots:
  - field: height
    day: 1
    level: 1
    normalized: true
  - field: wind_speed
    day: 1
    level: 1
",
    )
    .unwrap();
    let flat = load_bundles(&source, &flat_config).unwrap();
    let snapshot = flat[0].dataset.snapshot(1, true).unwrap();

    assert!(matches!(
        render_snapshot(&snapshot, &flat_config.plots[0], None, &flat_config),
        Err(JobError::Derived(DerivedError::ConstantField))
    ));
    assert!(matches!(
        render_snapshot(&snapshot, &flat_config.plots[1], None, &flat_config),
        Err(JobError::Query(QueryError::MissingVariable(_)))
    ));
}

#[test]
fn matched_days_selection() {
    let source = record_source(Path::new("data"), 2020, 90);
    let bundles = matched_bundles(&source);
    let config = matches_config(
        "
  - field: all
    level: 1
  - field: height
    day: 2
    level: 1
  - field: wind_speed
    day: [3, 1]
    level: 2
  - field: height
    day: [7, 4]
    level: 1
  - field: height
    day: 3
    level: 1
",
    );

    assert_eq!(
        select_days(&config.source, &bundles, &config.plots[0]).unwrap(),
        vec![(0, 1), (1, 1)]
    );
    assert_eq!(
        select_days(&config.source, &bundles, &config.plots[1]).unwrap(),
        vec![(1, 1)]
    );
    assert_eq!(
        select_days(&config.source, &bundles, &config.plots[2]).unwrap(),
        vec![(0, 1)]
    );
    assert!(matches!(
        select_days(&config.source, &bundles, &config.plots[3]),
        Err(QueryError::NoMatchingDay(7, 4))
    ));
    assert!(matches!(
        select_days(&config.source, &bundles, &config.plots[4]),
        Err(QueryError::IndexOutOfRange { axis: "match", .. })
    ));

    let jobs = prepare_jobs(&config, &bundles);
    assert_eq!(jobs.len(), 4);

    let bundle = &bundles[0];
    let snapshot = bundle.dataset.snapshot(1, true).unwrap();
    let figure = render_snapshot(&snapshot, &config.plots[2], bundle.score, &config).unwrap();

    assert_eq!(figure.title, "Mar 01 2020 : Level 2 : Score 0.9812");
}

#[test]
fn figures_written_to_output_dir() {
    let source = record_source(Path::new("data"), 2020, 3);
    let mut config = record_config(
        "
  - field: height
    day: 2
    level: 1
",
    );

    let out_dir = std::env::temp_dir().join(format!("uap-super-tests-{}", std::process::id()));
    config.render.output_dir = out_dir.clone();

    prepare_output_dir(&out_dir).unwrap();

    let bundles = load_bundles(&source, &config).unwrap();
    let jobs = prepare_jobs(&config, &bundles);
    let path = run_job(jobs[0], &config, &bundles).unwrap();

    assert_eq!(
        path.file_name().and_then(|name| name.to_str()),
        Some("001_hgt_jan_02_2020_level_1.png")
    );
    assert!(path.is_file());

    // directory with figures cannot be reused
    assert!(prepare_output_dir(&out_dir).is_err());

    std::fs::remove_dir_all(&out_dir).unwrap();
}
