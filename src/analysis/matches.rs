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

//! Module handling the list of matched days.
//!
//! Matched days are produced by an upstream pattern matching
//! step as a CSV file with `date` and `score` columns. Every
//! day is read from the yearly files archive as a separate
//! single-day bundle.

use super::dataset::{Dataset, DatasetPaths, GridSource, TimeSelection};
use super::region::{BoundingBox, LonConvention};
use crate::errors::{DataError, InputError};
use crate::Float;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use log::{debug, info};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Clone, PartialEq, Debug, Deserialize)]
struct MatchRecord {
    date: String,
    score: Float,
}

/// Date with its similarity score.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Match {
    pub date: NaiveDate,
    pub score: Float,
}

/// Single-day bundle of a matched date.
#[derive(Clone, Debug)]
pub struct MatchedDay {
    pub dataset: Dataset,
    pub score: Float,
}

/// Reads the match list from CSV file.
pub fn read_match_list(path: &Path) -> Result<Vec<Match>, InputError> {
    debug!("Reading match list from {}", path.display());

    let reader = csv::Reader::from_path(path)?;
    parse_match_list(reader)
}

fn parse_match_list<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<Match>, InputError> {
    let mut matches = vec![];

    for record in reader.deserialize() {
        let record: MatchRecord = record?;

        matches.push(Match {
            date: parse_date(&record.date)?,
            score: record.score,
        });
    }

    Ok(matches)
}

/// Accepts `YYYY-MM-DD` with optional `HH:MM:SS`.
fn parse_date(date: &str) -> Result<NaiveDate, InputError> {
    let date = date.trim();

    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .map_err(|_| InputError::UnparsableDate(date.to_string()))
}

/// Reads every matched day from the archive at `root`.
pub fn load_matches<S: GridSource>(
    source: &S,
    root: &Path,
    matches: &[Match],
    convention: LonConvention,
    bounds: BoundingBox,
) -> Result<Vec<MatchedDay>, DataError> {
    let mut days = Vec::with_capacity(matches.len());

    for matched in matches {
        let paths = DatasetPaths::archive(root, matched.date.year());
        let dataset = Dataset::load(
            source,
            &paths,
            convention,
            bounds,
            TimeSelection::Date(matched.date),
        )?;

        info!("Loaded matched day {} (score {})", matched.date, matched.score);

        days.push(MatchedDay {
            dataset,
            score: matched.score,
        });
    }

    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::dataset::memory::{MemoryFile, MemorySource};
    use crate::analysis::dataset::Variable;
    use float_cmp::approx_eq;

    #[test]
    fn match_list_parsing() {
        let csv = "date,score\n2020-03-01,0.98123\n1999-12-31 00:00:00,0.5\n";
        let matches = parse_match_list(csv::Reader::from_reader(csv.as_bytes())).unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].date, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        assert!(approx_eq!(Float, matches[0].score, 0.98123, ulps = 2));
        assert_eq!(matches[1].date, NaiveDate::from_ymd_opt(1999, 12, 31).unwrap());
    }

    #[test]
    fn malformed_match_list() {
        let bad_date = "date,score\n2020/03/01,0.9\n";
        let bad_score = "date,score\n2020-03-01,high\n";

        assert!(matches!(
            parse_match_list(csv::Reader::from_reader(bad_date.as_bytes())),
            Err(InputError::UnparsableDate(_))
        ));
        assert!(matches!(
            parse_match_list(csv::Reader::from_reader(bad_score.as_bytes())),
            Err(InputError::Csv(_))
        ));
    }

    #[test]
    fn matched_days_from_archive() {
        let root = Path::new("archive");
        let lats = vec![70.0, 45.0, 20.0];
        let lons = vec![220.0, 280.0, 340.0];

        let mut source = MemorySource::new();
        let paths = DatasetPaths::archive(root, 2020);

        for (variable, path) in [
            (Variable::Height, paths.height),
            (Variable::UWind, paths.u_wind.unwrap()),
            (Variable::VWind, paths.v_wind.unwrap()),
        ] {
            source.insert(
                path,
                MemoryFile::daily(
                    2020,
                    variable.name(),
                    (90, 1, 3, 3),
                    lats.clone(),
                    lons.clone(),
                    |(t, ..)| t as Float,
                ),
            );
        }

        let matches = vec![
            Match {
                date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
                score: 0.9,
            },
            Match {
                date: NaiveDate::from_ymd_opt(2020, 1, 5).unwrap(),
                score: 0.7,
            },
        ];

        let days = load_matches(
            &source,
            root,
            &matches,
            LonConvention::Positive,
            LonConvention::Positive.default_bounds(),
        )
        .unwrap();

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].dataset.days(), 1);
        assert_eq!(days[0].dataset.date(1).unwrap(), matches[0].date);

        let snapshot = days[0].dataset.snapshot(1, true).unwrap();
        assert_eq!(snapshot.height[[0, 0, 0]], 60.0);

        let missing = vec![Match {
            date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            score: 0.1,
        }];
        assert!(load_matches(
            &source,
            root,
            &missing,
            LonConvention::Positive,
            LonConvention::Positive.default_bounds(),
        )
        .is_err());
    }
}
