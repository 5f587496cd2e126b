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

//! Module containing the analysis code.
//!
//! The analysis reads the configuration and the gridded
//! reanalysis data into immutable dataset bundles, then
//! renders every requested plot as a separate job on the
//! threadpool. A failing job is reported and does not stop
//! the other jobs, a failure while reading the data stops
//! the whole program.

mod configuration;
mod dataset;
mod derived;
mod matches;
mod query;
mod region;
mod render;

#[cfg(test)]
mod super_tests;

use self::configuration::{Config, Plot, Source};
use self::dataset::{Dataset, DatasetPaths, GridSource, NetcdfReader, TimeSelection};
use self::query::{DaySelector, FieldKind, Snapshot};
use self::render::{Figure, Panel, Presenter};
use crate::errors::{AppError, DataError, JobError, QueryError};
use crate::{Float, ALLOCATOR};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
};

/// Main analysis function, responsible for all steps.
///
/// It reads the provided configuration and input data
/// and then deploys render jobs onto the threadpool
/// and checks for errors.
pub fn main() -> Result<(), AppError> {
    info!("Preparing the analysis core");

    let core = Core::new()?;
    prepare_output_dir(&core.config.render.output_dir)?;

    let jobs = prepare_jobs(&core.config, &core.bundles);
    let jobs_count = jobs.len();

    let config = Arc::new(core.config);
    let bundles = Arc::new(core.bundles);

    info!("Deploying {} render jobs", jobs_count);

    let jobs_bar = ProgressBar::new(jobs_count as u64);
    jobs_bar.set_style(
        ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .progress_chars("#>-"),
    );
    jobs_bar.set_prefix("Rendered plots");

    let (tx, rx) = mpsc::channel();

    for job in jobs {
        let tx = tx.clone();
        let config = Arc::clone(&config);
        let bundles = Arc::clone(&bundles);

        core.threadpool.spawn(move || {
            // receiver lives until all jobs report
            let _ = tx.send((job, run_job(job, &config, &bundles)));
        });
    }

    let mut failed = 0;

    for _ in 0..jobs_count {
        let (job, result) = match rx.recv() {
            Ok(received) => received,
            Err(_) => {
                error!("Render jobs stopped reporting before finishing");
                break;
            }
        };

        match result {
            Ok(path) => {
                debug!("Job {} written to {}", job.number, path.display());
            }
            Err(err) => {
                failed += 1;
                error!(
                    "Rendering of plot {} ({:?}) failed due to an error, check the details and rerun: {}",
                    job.plot_index + 1,
                    job.plot.field,
                    err
                );
                // this is neccessary to make sure that all error messages
                // are fully written to stdout before the progress bar updates
                println!();
            }
        }
        jobs_bar.inc(1);
    }

    jobs_bar.finish_with_message("All plots finished");

    if failed > 0 {
        error!("{} of {} plots failed", failed, jobs_count);
    }

    Ok(())
}

/// Dataset with the score of its match, if it comes
/// from the list of matched days.
#[derive(Clone, Debug)]
pub struct Bundle {
    pub dataset: Dataset,
    pub score: Option<Float>,
}

/// Structure containing analysis inputs.
///
/// Configuration and all input data are loaded and checked
/// before any plot is rendered, so that rendering can only
/// fail on invalid requests.
#[derive(Debug)]
pub struct Core {
    pub config: Config,
    pub threadpool: ThreadPool,
    pub bundles: Vec<Bundle>,
}

impl Core {
    pub fn new() -> Result<Self, AppError> {
        debug!("Reading configuration from config.yaml");
        let config = Config::new_from_file(Path::new("config.yaml"))?;

        debug!("Setting memory limit");
        ALLOCATOR
            .set_limit(config.resources.memory.saturating_mul(1024 * 1024))
            .map_err(|_| AppError::MemoryLimit(config.resources.memory))?;

        debug!("Setting up ThreadPool");
        let threadpool = ThreadPoolBuilder::new()
            .num_threads(config.resources.threads as usize)
            .stack_size(2 * 1024 * 1024)
            .build()?;

        debug!("Reading gridded data from netCDF files");
        let bundles = load_bundles(&NetcdfReader, &config)?;

        Ok(Core {
            config,
            threadpool,
            bundles,
        })
    }
}

/// Reads the record or all matched days from the source.
fn load_bundles<S: GridSource>(source: &S, config: &Config) -> Result<Vec<Bundle>, DataError> {
    let convention = config.region.convention;
    let bounds = config.region.bounds();

    match &config.source {
        Source::Record(record) => {
            let paths = DatasetPaths {
                height: record.hgt.clone(),
                u_wind: record.uwnd.clone(),
                v_wind: record.vwnd.clone(),
            };

            let dataset = Dataset::load(source, &paths, convention, bounds, TimeSelection::All)?;
            info!("Loaded record of {} with {} days", dataset.year(), dataset.days());
            describe_dataset(&dataset);

            Ok(vec![Bundle {
                dataset,
                score: None,
            }])
        }
        Source::Matches(list) => {
            let entries = matches::read_match_list(&list.list)?;
            info!("Loading {} matched days", entries.len());

            let days = matches::load_matches(source, &list.root, &entries, convention, bounds)?;

            Ok(days
                .into_iter()
                .map(|day| {
                    describe_dataset(&day.dataset);
                    Bundle {
                        dataset: day.dataset,
                        score: Some(day.score),
                    }
                })
                .collect())
        }
    }
}

fn describe_dataset(dataset: &Dataset) {
    let (region_lats, region_lons) = dataset.region().shape();

    debug!(
        "Dataset of {}: {} levels on {}x{} grid ({}x{} in region), time span {} hours, winds: {}",
        dataset.year(),
        dataset.levels(),
        dataset.lats().len(),
        dataset.lons().len(),
        region_lats,
        region_lons,
        dataset.times().iter().copied().fold(0.0, Float::max),
        dataset.has_winds()
    );
}

/// Checks if the output directory can be used and creates it if needed.
///
/// Existing files are never overwritten, so the directory must be empty.
fn prepare_output_dir(out_path: &Path) -> Result<(), AppError> {
    debug!("Checking and setting output directory");

    if out_path.is_dir() {
        if out_path.read_dir()?.next().is_none() {
            debug!("Output directory exists but is empty so continuing");
        } else {
            return Err(AppError::FaultyOutput(
                "Output directory exists and is not empty",
            ));
        }
    } else {
        debug!("Output directory does not exist so creating a new one");
        fs::create_dir_all(out_path)?;
    }

    Ok(())
}

/// Single plot of one day of one bundle.
#[derive(Copy, Clone, Debug)]
struct Job {
    number: usize,
    plot_index: usize,
    plot: Plot,
    bundle: usize,
    day: usize,
}

/// Expands plot requests into jobs, requests
/// that cannot be resolved are reported and skipped.
fn prepare_jobs(config: &Config, bundles: &[Bundle]) -> Vec<Job> {
    let mut jobs = vec![];

    for (plot_index, plot) in config.plots.iter().enumerate() {
        match select_days(&config.source, bundles, plot) {
            Ok(days) => {
                for (bundle, day) in days {
                    jobs.push(Job {
                        number: jobs.len() + 1,
                        plot_index,
                        plot: *plot,
                        bundle,
                        day,
                    });
                }
            }
            Err(err) => {
                error!("Plot {} cannot be rendered: {}", plot_index + 1, err);
            }
        }
    }

    jobs
}

/// Finds `(bundle, day)` pairs requested by the plot.
///
/// A record has a single bundle and the day is required. Matched days
/// are single-day bundles, the selector picks the match by its position
/// or date and missing selector means all matches.
fn select_days(
    source: &Source,
    bundles: &[Bundle],
    plot: &Plot,
) -> Result<Vec<(usize, usize)>, QueryError> {
    match source {
        Source::Record(_) => {
            let selector = plot.day.ok_or(QueryError::DayNotSelected)?;
            let record = bundles.first().ok_or(QueryError::MissingVariable("height"))?;

            Ok(vec![(0, record.dataset.resolve_day(selector)?)])
        }
        Source::Matches(_) => match plot.day {
            None => Ok((0..bundles.len()).map(|i| (i, 1)).collect()),
            Some(DaySelector::Index(index)) => {
                if index == 0 || index > bundles.len() {
                    return Err(QueryError::IndexOutOfRange {
                        axis: "match",
                        value: index,
                        extent: bundles.len(),
                    });
                }

                Ok(vec![(index - 1, 1)])
            }
            Some(DaySelector::Date((month, day))) => {
                let mut selected = vec![];

                for (i, bundle) in bundles.iter().enumerate() {
                    if bundle.dataset.month_day(1)? == (month, day) {
                        selected.push((i, 1));
                    }
                }

                if selected.is_empty() {
                    return Err(QueryError::NoMatchingDay(month, day));
                }

                Ok(selected)
            }
        },
    }
}

/// Renders the job and writes the figure to the output directory.
fn run_job(job: Job, config: &Config, bundles: &[Bundle]) -> Result<PathBuf, JobError> {
    let bundle = bundles
        .get(job.bundle)
        .ok_or(QueryError::IndexOutOfRange {
            axis: "match",
            value: job.bundle + 1,
            extent: bundles.len(),
        })?;

    let snapshot = bundle.dataset.snapshot(job.day, job.plot.localized)?;
    let figure = render_snapshot(&snapshot, &job.plot, bundle.score, config)?;

    let path = config
        .render
        .output_dir
        .join(file_name(job.number, job.plot.field, &figure.title));

    figure.save(&path)?;
    info!("Rendered {}", figure.title);

    Ok(path)
}

/// Draws the requested field of the snapshot.
///
/// Wind panels of matched days are drawn without line contours.
fn render_snapshot(
    snapshot: &Snapshot,
    plot: &Plot,
    score: Option<Float>,
    config: &Config,
) -> Result<Figure, JobError> {
    let title = snapshot.title(plot.level, score);
    let presenter = Presenter::new(&config.render);

    let lats = snapshot.lats.to_vec();
    let lons = snapshot.lons.to_vec();

    if plot.field == FieldKind::Quiver {
        let (u, v) = snapshot.vectors(plot.level)?;
        return Ok(presenter.render_quiver(&title, u, v, &lats, &lons)?);
    }

    let mut panels = vec![];

    for field in plot.field.panels() {
        let mut values = snapshot.scalar(field, plot.level)?;

        if plot.normalized {
            values = derived::normalize(values.view())?;
        }

        panels.push(Panel {
            title: field.title().to_string(),
            values,
            lats: lats.clone(),
            lons: lons.clone(),
            contours: config.render.contours > 0 && !(score.is_some() && field.is_wind()),
        });
    }

    Ok(presenter.render_panels(&title, &panels)?)
}

/// Output file name, eg. `003_hgt_mar_01_2020_level_5.png`.
fn file_name(number: usize, field: FieldKind, title: &str) -> String {
    let mut slug = String::with_capacity(title.len());

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }

    format!("{:03}_{}_{}.png", number, field.slug(), slug.trim_matches('_'))
}

#[cfg(test)]
mod tests {
    use super::file_name;
    use super::query::FieldKind;

    #[test]
    fn output_file_names() {
        assert_eq!(
            file_name(3, FieldKind::Height, "Mar 01 2020 : Level 5"),
            "003_hgt_mar_01_2020_level_5.png"
        );
        assert_eq!(
            file_name(12, FieldKind::HeightAndWindSpeed, "Jan 05 2020 : Level 1 : Score 0.9812"),
            "012_all_jan_05_2020_level_1_score_0_9812.png"
        );
    }
}
