//! Cost-optimal investment and production pathways for a steelmaker under carbon-price scenarios.
//!
//! A [`snapshot::ParameterSnapshot`] is loaded once from a model directory. For every selected
//! [`scenario::Scenario`], the [`optimisation`] module builds a mixed-integer problem which is
//! dispatched to a [`solver::Solver`] backend. The [`batch`] module runs the whole scenario set,
//! isolating failures per scenario, and [`budget`] checks each solved emissions trajectory against
//! the firm's cumulative carbon budget.
use std::path::PathBuf;

pub mod allocation;
pub mod batch;
pub mod budget;
pub mod cli;
pub mod commodity;
pub mod config;
pub mod example;
pub mod id;
pub mod input;
pub mod log;
pub mod optimisation;
pub mod output;
pub mod results;
pub mod route;
pub mod scenario;
pub mod settings;
pub mod snapshot;
pub mod solver;
pub mod units;
pub mod validation;
pub mod year;

#[cfg(test)]
mod fixture;

/// Name of the program, used for config directories and log file names
pub const PROGRAM_NAME: &str = "steel-decarb";

/// Get the directory in which program-level configuration files are stored.
///
/// Falls back to the current directory if the platform config directory cannot be determined.
pub fn get_config_dir() -> PathBuf {
    let Some(mut dir) = dirs::config_dir() else {
        return PathBuf::new();
    };
    dir.push(PROGRAM_NAME);

    dir
}
