//! Selection configuration.
//!
//! One [`SelectionConfig`] is built per run (from defaults, a YAML file, or
//! CLI flags) and handed to the orchestrator and page objects. Nothing reads
//! global state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::browser::BrowserConfig;
use crate::diagnostic::{DiagnosticReporter, DEFAULT_DIAGNOSTICS_DIR};
use crate::prober::DEFAULT_ELEMENT_TIMEOUT_MS;
use crate::registry::StrategyRegistry;
use crate::result::{SelektaError, SelektaResult};
use crate::retry::RetryPolicy;

/// Retry, diagnostics and browser settings for a selection run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Attempts per strategy
    pub max_retries: u32,
    /// Backoff base in milliseconds
    pub base_delay_ms: u64,
    /// Per-probe wait bound in milliseconds
    pub element_timeout_ms: u64,
    /// Where failure screenshots go
    pub diagnostics_dir: PathBuf,
    /// Optional YAML strategy overrides merged over the built-in tables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategies_file: Option<PathBuf>,
    /// Browser launch settings
    pub browser: BrowserConfig,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            element_timeout_ms: DEFAULT_ELEMENT_TIMEOUT_MS,
            diagnostics_dir: PathBuf::from(DEFAULT_DIAGNOSTICS_DIR),
            strategies_file: None,
            browser: BrowserConfig::default(),
        }
    }
}

impl SelectionConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate YAML
    pub fn from_yaml(yaml: &str) -> SelektaResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> SelektaResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            SelektaError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&yaml)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> SelektaResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject settings that cannot produce a selection
    pub fn validate(&self) -> SelektaResult<()> {
        if self.max_retries == 0 {
            return Err(SelektaError::config("max_retries must be at least 1"));
        }
        if self.element_timeout_ms == 0 {
            return Err(SelektaError::config("element_timeout_ms must be positive"));
        }
        Ok(())
    }

    /// Set attempts per strategy
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set backoff base
    #[must_use]
    pub const fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set per-probe wait bound
    #[must_use]
    pub const fn with_element_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.element_timeout_ms = timeout_ms;
        self
    }

    /// Set diagnostics directory
    #[must_use]
    pub fn with_diagnostics_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.diagnostics_dir = dir.into();
        self
    }

    /// Set strategy override file
    #[must_use]
    pub fn with_strategies_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.strategies_file = Some(path.into());
        self
    }

    /// Set browser settings
    #[must_use]
    pub fn with_browser(mut self, browser: BrowserConfig) -> Self {
        self.browser = browser;
        self
    }

    /// Retry policy for the orchestrator
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            element_timeout: Duration::from_millis(self.element_timeout_ms),
        }
    }

    /// Reporter writing into the diagnostics directory
    #[must_use]
    pub fn reporter(&self) -> DiagnosticReporter {
        DiagnosticReporter::new(&self.diagnostics_dir)
    }

    /// Built-in strategy tables with any override file merged on top
    pub fn registry(&self) -> SelektaResult<StrategyRegistry> {
        let builtin = StrategyRegistry::builtin();
        match &self.strategies_file {
            Some(path) => Ok(builtin.merged_with(StrategyRegistry::from_file(path)?)),
            None => Ok(builtin),
        }
    }
}
