//! Selekta CLI library
//!
//! Command-line front end for the Selekta selection subsystem: list the
//! strategy registry, print the effective configuration, and run a selection
//! or a state check against a live page.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod error;
pub mod logging;
mod output;
pub mod runner;

pub use commands::{
    Cli, Commands, ConfigArgs, ControlsArgs, ListFormat, LogFormat, SelectArgs, VerifyArgs,
};
pub use error::{CliError, CliResult};
pub use output::{render_controls_json, render_controls_text, render_report, ProgressReporter};
