//! Element prober: one bounded activation attempt for one selector.

use std::time::Duration;

use tracing::debug;

use crate::driver::SelectionDriver;
use crate::result::{SelektaError, SelektaResult};

/// Default wait bound for a probe (90 seconds)
pub const DEFAULT_ELEMENT_TIMEOUT_MS: u64 = 90_000;

/// Makes one candidate selector's element active.
///
/// Success only means the click went through without the driver raising; the
/// control's state may be unchanged, which is why verification is separate.
#[derive(Debug)]
pub struct ElementProber<'a, D: SelectionDriver + ?Sized> {
    driver: &'a D,
    timeout: Duration,
}

impl<'a, D: SelectionDriver + ?Sized> ElementProber<'a, D> {
    /// Create a prober with the given wait bound
    pub fn new(driver: &'a D, timeout: Duration) -> Self {
        Self { driver, timeout }
    }

    /// Wait bound applied to the visibility wait, the scroll and the click
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait for visibility, scroll into view, click.
    ///
    /// Fails with `NotFound`, `NotVisible`, `ActivationTimeout` or a driver error.
    pub async fn probe(&self, selector: &str) -> SelektaResult<()> {
        debug!(selector, timeout_ms = self.timeout.as_millis() as u64, "probing");

        self.driver.wait_for_selector(selector, self.timeout).await?;
        self.bounded(selector, self.driver.scroll_into_view(selector)).await?;
        self.bounded(selector, self.driver.click(selector)).await
    }

    async fn bounded(
        &self,
        selector: &str,
        step: impl std::future::Future<Output = SelektaResult<()>>,
    ) -> SelektaResult<()> {
        tokio::time::timeout(self.timeout, step)
            .await
            .unwrap_or_else(|_| {
                Err(SelektaError::ActivationTimeout {
                    selector: selector.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{ClickBehavior, MockDriver, MockElement};

    fn prober(driver: &MockDriver) -> ElementProber<'_, MockDriver> {
        ElementProber::new(driver, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_probe_clicks_visible_element() {
        let driver = MockDriver::new().with_element("#yes", MockElement::radio());
        prober(&driver).probe("#yes").await.unwrap();
        assert_eq!(
            driver.history(),
            vec!["wait:#yes", "scroll:#yes", "click:#yes"]
        );
    }

    #[tokio::test]
    async fn test_probe_missing_element_is_not_found() {
        let driver = MockDriver::new();
        let err = prober(&driver).probe("#missing").await.unwrap_err();
        assert!(matches!(err, SelektaError::NotFound { timeout_ms: 200, .. }));
        assert!(!driver.was_called("click"));
    }

    #[tokio::test]
    async fn test_probe_hidden_element_is_not_visible() {
        let driver = MockDriver::new().with_element("#yes", MockElement::radio().hidden());
        let err = prober(&driver).probe("#yes").await.unwrap_err();
        assert!(matches!(err, SelektaError::NotVisible { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_hanging_click_times_out() {
        let driver = MockDriver::new()
            .with_element("#yes", MockElement::radio().with_click(ClickBehavior::Hang));
        let start = tokio::time::Instant::now();
        let err = prober(&driver).probe("#yes").await.unwrap_err();
        assert!(matches!(
            err,
            SelektaError::ActivationTimeout { timeout_ms: 200, .. }
        ));
        assert_eq!(start.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_scroll_times_out_without_clicking() {
        let driver = MockDriver::new().with_element("#yes", MockElement::radio().hanging_scroll());
        let start = tokio::time::Instant::now();
        let err = prober(&driver).probe("#yes").await.unwrap_err();
        assert!(matches!(
            err,
            SelektaError::ActivationTimeout { timeout_ms: 200, .. }
        ));
        assert_eq!(start.elapsed(), Duration::from_millis(200));
        assert_eq!(driver.history(), vec!["wait:#yes", "scroll:#yes"]);
    }

    #[tokio::test]
    async fn test_probe_succeeds_even_if_click_is_swallowed() {
        let driver = MockDriver::new().with_element(
            "#yes",
            MockElement::radio().with_click(ClickBehavior::Swallow),
        );
        prober(&driver).probe("#yes").await.unwrap();
        assert!(!driver.element("#yes").unwrap().checked);
    }

    #[tokio::test]
    async fn test_probe_propagates_click_error() {
        let driver = MockDriver::new()
            .with_element("#yes", MockElement::radio().with_click(ClickBehavior::Fail));
        let err = prober(&driver).probe("#yes").await.unwrap_err();
        assert!(matches!(err, SelektaError::Driver { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_timeout_accessor() {
        let driver = MockDriver::new();
        assert_eq!(prober(&driver).timeout(), Duration::from_millis(200));
    }
}
