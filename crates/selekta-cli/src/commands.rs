//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Selekta: resolve ambiguous radio controls with prioritised selectors
#[derive(Parser, Debug)]
#[command(name = "selekta")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log line format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered controls and their selector strategies
    Controls(ControlsArgs),

    /// Select a radio control on a live page
    Select(SelectArgs),

    /// Report whether a selector's control is selected
    Verify(VerifyArgs),

    /// Print the effective configuration as YAML
    Config(ConfigArgs),
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Listing format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table
    #[default]
    Text,
    /// JSON document
    Json,
}

/// Arguments for the controls command
#[derive(Parser, Debug)]
pub struct ControlsArgs {
    /// YAML strategy overrides merged over the built-in tables
    #[arg(long)]
    pub strategies: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: ListFormat,
}

/// Arguments for the select command
#[derive(Parser, Debug)]
pub struct SelectArgs {
    /// Control name (e.g. product-dimension-yes)
    pub control: String,

    /// Page to open
    #[arg(long)]
    pub url: String,

    /// Configuration file
    #[arg(short, long, env = "SELEKTA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Attempts per selector
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Backoff base in milliseconds
    #[arg(long)]
    pub base_delay_ms: Option<u64>,

    /// Per-probe wait bound in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

/// Arguments for the verify command
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Selector addressing the control or its label
    pub selector: String,

    /// Page to open
    #[arg(long)]
    pub url: String,

    /// Configuration file
    #[arg(short, long, env = "SELEKTA_CONFIG")]
    pub config: Option<PathBuf>,

    /// How long to wait for the element to appear, in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Configuration file
    #[arg(short, long, env = "SELEKTA_CONFIG")]
    pub config: Option<PathBuf>,
}
