//! Output formatting and progress reporting

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

use selekta::{SelectionReport, StrategyRegistry};

/// Spinner shown while a selection runs
#[derive(Debug)]
pub struct ProgressReporter {
    spinner: Option<ProgressBar>,
}

impl ProgressReporter {
    /// Start a spinner unless quiet
    #[must_use]
    pub fn start(message: &str, quiet: bool) -> Self {
        if quiet {
            return Self { spinner: None };
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self {
            spinner: Some(spinner),
        }
    }

    /// Stop and clear the spinner
    pub fn finish(self) {
        if let Some(spinner) = self.spinner {
            spinner.finish_and_clear();
        }
    }
}

#[derive(Serialize)]
struct StrategyRow<'a> {
    priority: u32,
    selector: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct ControlRow<'a> {
    name: &'a str,
    strategies: Vec<StrategyRow<'a>>,
}

/// Registry as JSON
pub fn render_controls_json(registry: &StrategyRegistry) -> serde_json::Result<String> {
    let rows: Vec<ControlRow<'_>> = registry
        .iter()
        .map(|(name, set)| ControlRow {
            name,
            strategies: set
                .iter()
                .map(|s| StrategyRow {
                    priority: s.priority,
                    selector: &s.selector,
                    description: &s.description,
                })
                .collect(),
        })
        .collect();
    serde_json::to_string_pretty(&rows)
}

/// Registry as an indented listing
#[must_use]
pub fn render_controls_text(registry: &StrategyRegistry) -> String {
    let mut out = String::new();
    for (name, set) in registry.iter() {
        out.push_str(&format!("{}\n", style(name).bold()));
        for strategy in set {
            out.push_str(&format!(
                "  {}. {}\n     {}\n",
                strategy.priority,
                strategy.selector,
                style(&strategy.description).dim()
            ));
        }
    }
    out
}

/// One-line success summary
#[must_use]
pub fn render_report(control: &str, report: &SelectionReport) -> String {
    format!(
        "{} {control} via {} (priority {}, {} attempt{}, {}ms)",
        style("selected").green().bold(),
        report.selector,
        report.priority,
        report.attempts,
        if report.attempts == 1 { "" } else { "s" },
        report.duration.as_millis()
    )
}
