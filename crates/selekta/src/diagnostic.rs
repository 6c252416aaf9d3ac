//! Diagnostic records for terminal selection failures.
//!
//! When every strategy is exhausted the caller gets one [`DiagnosticRecord`]:
//! the attempt log, the page location, a timestamp, the failure text and, if
//! capture worked, the path of a full-page screenshot. Building the record
//! never fails; each step that goes wrong is logged and its field left empty.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::driver::SelectionDriver;

/// Default directory for failure screenshots
pub const DEFAULT_DIAGNOSTICS_DIR: &str = "test-results/error-screenshots";

/// Everything known about a terminal selection failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    /// Every strategy tried, in attempt order
    pub attempted_selectors: Vec<String>,
    /// Page location at failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    /// RFC 3339 creation time
    pub timestamp: String,
    /// Screenshot file, when capture succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<PathBuf>,
    /// Summary of the failure
    pub error_message: String,
    /// Operation that failed
    pub function_name: String,
}

impl DiagnosticRecord {
    /// JSON for log aggregation
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for DiagnosticRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Radio Button Error in {} ===", self.function_name)?;
        writeln!(f, "Timestamp: {}", self.timestamp)?;
        writeln!(
            f,
            "Page URL: {}",
            self.page_url.as_deref().unwrap_or("unknown")
        )?;
        writeln!(f, "Error: {}", self.error_message)?;
        writeln!(f, "Attempted Selectors:")?;
        for (i, selector) in self.attempted_selectors.iter().enumerate() {
            writeln!(f, "  {}. {selector}", i + 1)?;
        }
        match &self.screenshot_path {
            Some(path) => writeln!(f, "Screenshot: {}", path.display())?,
            None => writeln!(f, "Screenshot: Not captured")?,
        }
        write!(f, "================================================")
    }
}

/// Builds diagnostic records and writes their screenshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticReporter {
    dir: PathBuf,
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new(DEFAULT_DIAGNOSTICS_DIR)
    }
}

impl DiagnosticReporter {
    /// Reporter writing screenshots under `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Screenshot directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Build, log and return a diagnostic record. Never fails.
    pub async fn build_diagnostic<D: SelectionDriver + ?Sized>(
        &self,
        driver: &D,
        function_name: &str,
        attempted_selectors: Vec<String>,
        error_message: impl Into<String>,
    ) -> DiagnosticRecord {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        let page_url = match driver.current_url().await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(error = %e, "could not read page location for diagnostic");
                None
            }
        };

        let screenshot_path = self
            .capture_screenshot(driver, function_name, &file_stamp(&timestamp))
            .await;

        let record = DiagnosticRecord {
            attempted_selectors,
            page_url,
            timestamp,
            screenshot_path,
            error_message: error_message.into(),
            function_name: function_name.to_string(),
        };

        error!(
            function_name = %record.function_name,
            page_url = record.page_url.as_deref().unwrap_or("unknown"),
            attempts = record.attempted_selectors.len(),
            screenshot = ?record.screenshot_path,
            "\n{record}\n"
        );
        record
    }

    async fn capture_screenshot<D: SelectionDriver + ?Sized>(
        &self,
        driver: &D,
        function_name: &str,
        stamp: &str,
    ) -> Option<PathBuf> {
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(dir = %self.dir.display(), error = %e, "could not create screenshot directory");
        }

        let path = self.dir.join(format!("{function_name}-error-{stamp}.png"));
        let data = match driver.screenshot().await {
            Ok(data) => data,
            Err(e) => {
                error!(error = %e, "failed to capture error screenshot");
                return None;
            }
        };

        match tokio::fs::write(&path, data).await {
            Ok(()) => Some(path),
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to write error screenshot");
                None
            }
        }
    }
}

/// Timestamp with `:` and `.` replaced so it is safe in file names
fn file_stamp(timestamp: &str) -> String {
    timestamp.replace([':', '.'], "-")
}
