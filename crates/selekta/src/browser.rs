//! Browser control for real selection runs.
//!
//! With the `browser` feature this drives Chromium over the Chrome `DevTools`
//! Protocol via chromiumoxide. [`BrowserConfig`] is always available so
//! configuration files parse the same with or without the feature.

use serde::{Deserialize, Serialize};

/// Default navigation timeout (80 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 80_000;

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Bound on page loads
    pub navigation_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            chromium_path: None,
            sandbox: true,
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set the page load bound
    #[must_use]
    pub const fn with_navigation_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.navigation_timeout_ms = timeout_ms;
        self
    }
}

#[cfg(feature = "browser")]
#[allow(clippy::significant_drop_tightening, clippy::missing_errors_doc)]
mod cdp {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
    use chromiumoxide::element::Element;
    use chromiumoxide::page::{Page as CdpPage, ScreenshotParams};
    use futures::StreamExt;
    use serde::de::DeserializeOwned;
    use tokio::sync::Mutex;
    use tracing::{debug, info, warn};

    use super::BrowserConfig;
    use crate::driver::SelectionDriver;
    use crate::result::{SelektaError, SelektaResult};

    /// Chromium instance with a live CDP connection
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
        inner: Arc<Mutex<CdpBrowser>>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Browser {
        /// Launch Chromium
        pub async fn launch(config: BrowserConfig) -> SelektaResult<Self> {
            let mut builder =
                CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| SelektaError::BrowserLaunchError { message })?;

            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                SelektaError::BrowserLaunchError {
                    message: e.to_string(),
                }
            })?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            info!(headless = config.headless, "browser launched");
            Ok(Self {
                config,
                inner: Arc::new(Mutex::new(browser)),
                handle,
            })
        }

        /// Open a tab and load `url`
        pub async fn new_page(&self, url: &str) -> SelektaResult<ChromiumPage> {
            let timeout = Duration::from_millis(self.config.navigation_timeout_ms);
            let browser = self.inner.lock().await;
            let page = match tokio::time::timeout(timeout, browser.new_page(url)).await {
                Ok(Ok(page)) => page,
                Ok(Err(e)) => {
                    return Err(SelektaError::NavigationError {
                        url: url.to_string(),
                        message: e.to_string(),
                    })
                }
                Err(_) => {
                    return Err(SelektaError::NavigationError {
                        url: url.to_string(),
                        message: format!("timed out after {}ms", timeout.as_millis()),
                    })
                }
            };
            info!(url, "page opened");
            Ok(ChromiumPage { page })
        }

        /// Close the browser. The CDP handler task is stopped either way.
        pub async fn close(self) -> SelektaResult<()> {
            let closed = {
                let mut browser = self.inner.lock().await;
                match browser.close().await {
                    Ok(_) => {
                        if let Err(e) = browser.wait().await {
                            warn!(error = %e, "browser process did not exit cleanly");
                        }
                        Ok(())
                    }
                    Err(e) => Err(SelektaError::BrowserLaunchError {
                        message: e.to_string(),
                    }),
                }
            };
            self.handle.abort();
            closed
        }
    }

    /// A tab implementing [`SelectionDriver`]
    #[derive(Debug, Clone)]
    pub struct ChromiumPage {
        page: CdpPage,
    }

    impl ChromiumPage {
        async fn eval<T: DeserializeOwned>(&self, script: String) -> SelektaResult<T> {
            self.page
                .evaluate(script)
                .await
                .map_err(|e| SelektaError::driver(e.to_string()))?
                .into_value()
                .map_err(|e| SelektaError::driver(e.to_string()))
        }

        /// Evaluate a script producing a string or null; null survives as `None`
        async fn eval_optional(&self, script: String) -> SelektaResult<Option<String>> {
            let encoded: String = self.eval(format!("JSON.stringify({script})")).await?;
            serde_json::from_str(&encoded).map_err(|e| SelektaError::driver(e.to_string()))
        }

        async fn first_match(&self, selector: &str) -> SelektaResult<Element> {
            self.page
                .find_element(selector)
                .await
                .map_err(|e| SelektaError::driver(format!("{selector}: {e}")))
        }
    }

    /// JS string literal for a selector
    fn quoted(s: &str) -> String {
        serde_json::Value::from(s).to_string()
    }

    /// Script evaluating `body` with `el` bound to the first match of `selector`
    fn on_first(selector: &str, body: &str) -> String {
        format!(
            "(() => {{ const el = document.querySelector({}); {body} }})()",
            quoted(selector)
        )
    }

    #[async_trait]
    impl SelectionDriver for ChromiumPage {
        async fn count(&self, selector: &str) -> SelektaResult<usize> {
            self.eval(format!(
                "document.querySelectorAll({}).length",
                quoted(selector)
            ))
            .await
        }

        async fn is_visible(&self, selector: &str) -> SelektaResult<bool> {
            self.eval(on_first(
                selector,
                "if (!el) return false; \
                 const style = getComputedStyle(el); \
                 return style.visibility !== 'hidden' && style.display !== 'none' \
                   && el.getClientRects().length > 0;",
            ))
            .await
        }

        async fn scroll_into_view(&self, selector: &str) -> SelektaResult<()> {
            self.first_match(selector)
                .await?
                .scroll_into_view()
                .await
                .map_err(|e| SelektaError::driver(e.to_string()))?;
            Ok(())
        }

        async fn click(&self, selector: &str) -> SelektaResult<()> {
            debug!(selector, "cdp click");
            self.first_match(selector)
                .await?
                .click()
                .await
                .map_err(|e| SelektaError::driver(e.to_string()))?;
            Ok(())
        }

        async fn tag_name(&self, selector: &str) -> SelektaResult<Option<String>> {
            self.eval_optional(on_first(
                selector,
                "return el ? el.tagName.toLowerCase() : null;",
            ))
            .await
        }

        async fn attribute(&self, selector: &str, name: &str) -> SelektaResult<Option<String>> {
            self.eval_optional(on_first(
                selector,
                &format!("return el ? el.getAttribute({}) : null;", quoted(name)),
            ))
            .await
        }

        async fn is_checked(&self, selector: &str) -> SelektaResult<bool> {
            self.eval(on_first(selector, "return !!(el && el.checked);"))
                .await
        }

        async fn count_within(&self, scope: &str, selector: &str) -> SelektaResult<usize> {
            self.eval(on_first(
                scope,
                &format!(
                    "return el ? el.querySelectorAll({}).length : 0;",
                    quoted(selector)
                ),
            ))
            .await
        }

        async fn is_checked_within(&self, scope: &str, selector: &str) -> SelektaResult<bool> {
            self.eval(on_first(
                scope,
                &format!(
                    "const inner = el && el.querySelector({}); return !!(inner && inner.checked);",
                    quoted(selector)
                ),
            ))
            .await
        }

        async fn current_url(&self) -> SelektaResult<String> {
            self.page
                .url()
                .await
                .map_err(|e| SelektaError::driver(e.to_string()))?
                .ok_or_else(|| SelektaError::driver("page has no url"))
        }

        async fn screenshot(&self) -> SelektaResult<Vec<u8>> {
            let params = ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .full_page(true)
                .build();
            self.page
                .screenshot(params)
                .await
                .map_err(|e| SelektaError::ScreenshotError {
                    message: e.to_string(),
                })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_quoted_escapes() {
            assert_eq!(quoted(r#"input[value="yes"]"#), r#""input[value=\"yes\"]""#);
        }

        #[test]
        fn test_on_first_wraps_selector() {
            let script = on_first("#a", "return 1;");
            assert!(script.starts_with("(() => {"));
            assert!(script.contains(r##"document.querySelector("#a")"##));
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{Browser, ChromiumPage};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert!(config.sandbox);
        assert_eq!(config.navigation_timeout_ms, 80_000);
        assert!(config.chromium_path.is_none());
    }

    #[test]
    fn test_builders() {
        let config = BrowserConfig::default()
            .with_headless(false)
            .with_viewport(1920, 1080)
            .with_chromium_path("/usr/bin/chromium")
            .with_no_sandbox()
            .with_navigation_timeout_ms(5_000);
        assert!(!config.headless);
        assert_eq!((config.viewport_width, config.viewport_height), (1920, 1080));
        assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
        assert!(!config.sandbox);
        assert_eq!(config.navigation_timeout_ms, 5_000);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: BrowserConfig = serde_yaml_ng::from_str("headless: false\n").unwrap();
        assert!(!config.headless);
        assert_eq!(config.viewport_width, 1280);
    }
}
