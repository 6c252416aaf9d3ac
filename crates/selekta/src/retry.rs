//! Retry orchestration across selector strategies.
//!
//! Strategies are tried in ascending priority. Each gets up to
//! `max_retries` attempts of probe-then-verify, with an exponential backoff of
//! `base_delay * 2^(attempt - 1)` between attempts of the same strategy. The
//! first verified selection wins; exhausting every strategy is the single
//! caller-visible failure and carries a [`DiagnosticRecord`].
//!
//! [`DiagnosticRecord`]: crate::DiagnosticRecord

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::diagnostic::DiagnosticReporter;
use crate::driver::SelectionDriver;
use crate::prober::{ElementProber, DEFAULT_ELEMENT_TIMEOUT_MS};
use crate::result::{SelektaError, SelektaResult};
use crate::strategy::StrategySet;
use crate::verifier::StateVerifier;

/// Retry bounds for one resolution call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts per strategy
    pub max_retries: u32,
    /// Backoff base; attempt `a` is followed by `base_delay * 2^(a-1)`
    pub base_delay: Duration,
    /// Wait bound for each probe
    pub element_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            element_timeout: Duration::from_millis(DEFAULT_ELEMENT_TIMEOUT_MS),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with default element timeout
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Self::default()
        }
    }

    /// Set attempts per strategy
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff base
    #[must_use]
    pub const fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Set the per-probe wait bound
    #[must_use]
    pub const fn with_element_timeout(mut self, timeout: Duration) -> Self {
        self.element_timeout = timeout;
        self
    }

    /// Delay after the 1-based `attempt` of a strategy
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// How a successful resolution went
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionReport {
    /// Selector that produced a verified selection
    pub selector: String,
    /// Its priority
    pub priority: u32,
    /// Probe attempts made across all strategies, including the winning one
    pub attempts: u32,
    /// Strategies tried, one label each, in order
    pub attempted_selectors: Vec<String>,
    /// Wall time of the whole call
    pub duration: Duration,
}

/// Drives prober and verifier across strategies and attempts
#[derive(Debug)]
pub struct SelectionOrchestrator<'a, D: SelectionDriver + ?Sized> {
    driver: &'a D,
    policy: RetryPolicy,
    reporter: DiagnosticReporter,
}

impl<'a, D: SelectionDriver + ?Sized> SelectionOrchestrator<'a, D> {
    /// Orchestrator with default policy and diagnostics directory
    pub fn new(driver: &'a D) -> Self {
        Self {
            driver,
            policy: RetryPolicy::default(),
            reporter: DiagnosticReporter::default(),
        }
    }

    /// Set the retry policy
    #[must_use]
    pub const fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the diagnostic reporter
    #[must_use]
    pub fn with_reporter(mut self, reporter: DiagnosticReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Leave the control selected, or fail with full diagnostics.
    pub async fn resolve_and_select(&self, strategies: &StrategySet) -> SelektaResult<SelectionReport> {
        let start = tokio::time::Instant::now();
        let prober = ElementProber::new(self.driver, self.policy.element_timeout);
        let verifier = StateVerifier::new(self.driver);
        let max_retries = self.policy.max_retries;

        let mut attempted_selectors = Vec::with_capacity(strategies.len());
        let mut attempts = 0u32;

        for strategy in strategies {
            let selector = strategy.selector.as_str();
            attempted_selectors.push(strategy.label());
            info!(selector, description = %strategy.description, "trying selector");

            for attempt in 1..=max_retries {
                attempts += 1;

                match prober.probe(selector).await {
                    Ok(()) => {
                        if verifier.verify_state(selector).await {
                            info!(selector, attempt, "selected radio button");
                            return Ok(SelectionReport {
                                selector: selector.to_string(),
                                priority: strategy.priority,
                                attempts,
                                attempted_selectors,
                                duration: start.elapsed(),
                            });
                        }
                        warn!(
                            selector,
                            attempt, max_retries, "click succeeded but verification failed"
                        );
                    }
                    Err(e) => {
                        warn!(selector, attempt, max_retries, error = %e, "attempt failed");
                    }
                }

                if attempt < max_retries {
                    let delay = self.policy.backoff_delay(attempt);
                    info!(delay_ms = delay.as_millis() as u64, "waiting before retry");
                    tokio::time::sleep(delay).await;
                } else {
                    warn!(selector, max_retries, "all attempts failed for selector");
                }
            }
        }

        let message = format!(
            "Failed to select radio button after trying {} selectors with {} retries each",
            strategies.len(),
            max_retries
        );
        let diagnostic = self
            .reporter
            .build_diagnostic(self.driver, "resolve_and_select", attempted_selectors, message)
            .await;

        Err(SelektaError::TerminalSelection {
            diagnostic: Box::new(diagnostic),
        })
    }
}
