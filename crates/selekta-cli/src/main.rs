//! Selekta CLI: resolve and verify radio selections
//!
//! ## Usage
//!
//! ```bash
//! selekta controls                                        # List built-in strategies
//! selekta config --config selekta.yaml                    # Show effective config
//! selekta select product-dimension-yes --url https://...  # Select on a live page
//! selekta verify 'label:has(input[value="yes"])' --url https://...
//! ```

use clap::Parser;
use selekta_cli::{logging, runner, Cli, CliResult, Commands};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet, cli.log_format);

    let output = match &cli.command {
        Commands::Controls(args) => runner::run_controls(args)?,
        Commands::Select(args) => runner::run_select(args, cli.quiet)?,
        Commands::Verify(args) => runner::run_verify(args)?,
        Commands::Config(args) => runner::run_config(args)?,
    };

    println!("{}", output.trim_end());
    Ok(())
}
