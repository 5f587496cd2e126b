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

//! Upper Air Patterns (UAP) is a small tool for inspecting
//! daily upper-air reanalysis data (geopotential height and
//! wind components on pressure levels) over a chosen region.
//!
//! It reads yearly netCDF records (or single matched days from
//! a record archive), cuts them to a latitude-longitude box,
//! derives wind speed and height gradient, and renders the
//! requested fields as Plate Carrée maps in PNG files.
//!
//! Everything is driven by `config.yaml` in the working directory,
//! see [`analysis::configuration`] for the available fields.

mod analysis;
mod constants;
mod errors;

use cap::Cap;
use env_logger::Env;
use log::{error, info};
use std::alloc;

type Float = f64;

/// Global allocator used by the program.
///
/// Yearly records of pressure level data are large, so the heap
/// can be capped to the limit set by user in configuration file
/// to get an [OOM error](https://en.wikipedia.org/wiki/Out_of_memory)
/// instead of a system slowdown.
#[global_allocator]
static ALLOCATOR: Cap<alloc::System> = Cap::new(alloc::System, usize::MAX);

/// The main program function.
/// Prepares the runtime environment and calls the [`analysis::main`].
///
/// The `env_logger` is initiated first, so that all errors
/// occuring while reading the configuration and data
/// are reported in the log.
fn main() {
    #[cfg(not(feature = "debug"))]
    let logger_env = Env::new().filter_or("UAP_LOG_LEVEL", "info");

    #[cfg(feature = "debug")]
    let logger_env = Env::new().filter_or("UAP_LOG_LEVEL", "debug");

    env_logger::Builder::from_env(logger_env)
        .format_timestamp_millis()
        .init();

    match analysis::main() {
        Ok(_) => info!("Analysis finished. Check the output directory and log."),
        Err(err) => error!("Analysis failed with error: {}", err),
    }
}
