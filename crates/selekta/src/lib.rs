//! Selekta: resilient selector resolution for browser-driven e2e tests
//!
//! Some controls in a web form can be addressed by several selectors, none of
//! which is guaranteed to match in every build of the app. Selekta tries a
//! prioritised list of selectors, retries each with exponential backoff,
//! verifies that a click actually changed the control's state, and on total
//! failure hands back a diagnostic record with the page URL, the attempt log
//! and a screenshot.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    SELEKTA Architecture                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Strategy   │    │ Retry      │    │ Selection  │            │
//! │   │ Registry   │───►│ Orchestr-  │───►│ Driver     │            │
//! │   │            │    │ ator       │    │ (chromium) │            │
//! │   └────────────┘    └─────┬──────┘    └────────────┘            │
//! │                           │                                     │
//! │              ┌────────────┼────────────┐                        │
//! │              ▼            ▼            ▼                        │
//! │        ┌──────────┐ ┌──────────┐ ┌────────────┐                 │
//! │        │ Prober   │ │ Verifier │ │ Diagnostic │                 │
//! │        └──────────┘ └──────────┘ │ Reporter   │                 │
//! │                                  └────────────┘                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use selekta::{DimensionTab, MockDriver, MockElement, SelektaResult};
//!
//! # async fn run() -> SelektaResult<()> {
//! let driver = MockDriver::new().with_element(
//!     r#"label:has(input[data-testid="productPackage-hasSameDimension-yes"])"#,
//!     MockElement::label_with_radio(),
//! );
//! let report = DimensionTab::new(&driver).select_product_dimension_yes().await?;
//! assert_eq!(report.attempts, 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

#[allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]
mod browser;
#[allow(clippy::missing_errors_doc)]
mod config;
mod diagnostic;
#[allow(clippy::missing_errors_doc, clippy::cast_possible_truncation)]
mod driver;
mod page_object;
#[allow(clippy::cast_possible_truncation)]
mod prober;
#[allow(clippy::missing_errors_doc)]
mod registry;
mod result;
#[allow(clippy::cast_possible_truncation)]
mod retry;
#[allow(clippy::missing_errors_doc)]
mod strategy;
mod verifier;

pub use browser::{BrowserConfig, DEFAULT_NAVIGATION_TIMEOUT_MS};
#[cfg(feature = "browser")]
pub use browser::{Browser, ChromiumPage};
pub use config::SelectionConfig;
pub use diagnostic::{DiagnosticRecord, DiagnosticReporter, DEFAULT_DIAGNOSTICS_DIR};
pub use driver::{
    ClickBehavior, MockDriver, MockElement, SelectionDriver, DEFAULT_POLL_INTERVAL_MS,
};
pub use page_object::DimensionTab;
pub use prober::{ElementProber, DEFAULT_ELEMENT_TIMEOUT_MS};
pub use registry::{LogicalControl, StrategyRegistry};
pub use result::{SelektaError, SelektaResult};
pub use retry::{RetryPolicy, SelectionOrchestrator, SelectionReport};
pub use strategy::{SelectorStrategy, StrategySet};
pub use verifier::{linked_control_selector, ElementRole, StateVerifier, NESTED_CONTROL_SELECTOR};
