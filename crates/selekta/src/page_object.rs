//! Dimension tab page object.
//!
//! Wraps the orchestrator with the product form's named radio operations.
//! Each operation logs its attempt, resolves the control's strategy set and,
//! when resolution fails, records a second diagnostic under its own name
//! before surfacing a [`SelektaError::ControlSelection`].

use tracing::info;

use crate::config::SelectionConfig;
use crate::diagnostic::DiagnosticReporter;
use crate::driver::SelectionDriver;
use crate::registry::{LogicalControl, StrategyRegistry};
use crate::result::{SelektaError, SelektaResult};
use crate::retry::{RetryPolicy, SelectionOrchestrator, SelectionReport};

/// Radio controls on the product form's dimension tab
#[derive(Debug)]
pub struct DimensionTab<'a, D: SelectionDriver + ?Sized> {
    driver: &'a D,
    registry: StrategyRegistry,
    policy: RetryPolicy,
    reporter: DiagnosticReporter,
}

impl<'a, D: SelectionDriver + ?Sized> DimensionTab<'a, D> {
    /// Page object with built-in strategies and default settings
    pub fn new(driver: &'a D) -> Self {
        Self {
            driver,
            registry: StrategyRegistry::builtin(),
            policy: RetryPolicy::default(),
            reporter: DiagnosticReporter::default(),
        }
    }

    /// Page object configured from a [`SelectionConfig`]
    pub fn from_config(driver: &'a D, config: &SelectionConfig) -> SelektaResult<Self> {
        config.validate()?;
        Ok(Self {
            driver,
            registry: config.registry()?,
            policy: config.retry_policy(),
            reporter: config.reporter(),
        })
    }

    /// Replace the strategy registry
    #[must_use]
    pub fn with_registry(mut self, registry: StrategyRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the retry policy
    #[must_use]
    pub const fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the diagnostic reporter
    #[must_use]
    pub fn with_reporter(mut self, reporter: DiagnosticReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Select "Yes" for product dimension
    pub async fn select_product_dimension_yes(&self) -> SelektaResult<SelectionReport> {
        self.select(LogicalControl::ProductDimensionYes).await
    }

    /// Select "No" for product dimension
    pub async fn select_product_dimension_no(&self) -> SelektaResult<SelectionReport> {
        self.select(LogicalControl::ProductDimensionNo).await
    }

    /// Select "Yes" for package dimension
    pub async fn select_package_dimension_yes(&self) -> SelektaResult<SelectionReport> {
        self.select(LogicalControl::PackageDimensionYes).await
    }

    /// Select "No" for package dimension
    pub async fn select_package_dimension_no(&self) -> SelektaResult<SelectionReport> {
        self.select(LogicalControl::PackageDimensionNo).await
    }

    /// Select a built-in control
    pub async fn select(&self, control: LogicalControl) -> SelektaResult<SelectionReport> {
        self.run(control.name(), control.function_name(), control.display_name())
            .await
    }

    /// Select any registered control by name, including ones loaded from YAML
    pub async fn select_named(&self, name: &str) -> SelektaResult<SelectionReport> {
        if let Ok(control) = name.parse::<LogicalControl>() {
            return self.select(control).await;
        }
        self.run(name, &derived_function_name(name), name).await
    }

    async fn run(
        &self,
        name: &str,
        function_name: &str,
        display_name: &str,
    ) -> SelektaResult<SelectionReport> {
        let strategies = self.registry.get(name)?;
        info!(control = name, "attempting to select {display_name}");

        let orchestrator = SelectionOrchestrator::new(self.driver)
            .with_policy(self.policy)
            .with_reporter(self.reporter.clone());

        match orchestrator.resolve_and_select(strategies).await {
            Ok(report) => {
                info!(
                    control = name,
                    selector = %report.selector,
                    attempts = report.attempts,
                    "successfully selected {display_name}"
                );
                Ok(report)
            }
            Err(e) => {
                let diagnostic = self
                    .reporter
                    .build_diagnostic(
                        self.driver,
                        function_name,
                        strategies.labels(),
                        format!("Failed to select {display_name}: {e}"),
                    )
                    .await;
                Err(SelektaError::ControlSelection {
                    function_name: function_name.to_string(),
                    message: e.to_string(),
                    diagnostic: Box::new(diagnostic),
                })
            }
        }
    }
}

/// `select_<name>` with anything outside `[A-Za-z0-9_]` replaced by `_`.
///
/// The result names the diagnostic screenshot file, so it must not carry path
/// separators or dots.
fn derived_function_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("select_{sanitized}")
}
