//! Command handlers

use std::path::Path;
use std::time::Duration;

use selekta::{SelectionConfig, SelectionDriver, StateVerifier, StrategyRegistry};
#[cfg(feature = "browser")]
use selekta::{Browser, DimensionTab, SelectionReport, SelektaResult};

use crate::commands::{ConfigArgs, ControlsArgs, ListFormat, SelectArgs, VerifyArgs};
#[cfg(not(feature = "browser"))]
use crate::error::CliError;
use crate::error::CliResult;
use crate::output;
#[cfg(feature = "browser")]
use crate::output::ProgressReporter;

/// Configuration from a file, or defaults
pub fn load_config(path: Option<&Path>) -> CliResult<SelectionConfig> {
    match path {
        Some(path) => Ok(SelectionConfig::from_file(path)?),
        None => Ok(SelectionConfig::default()),
    }
}

/// Apply `select` flags over a loaded configuration
pub fn apply_select_overrides(
    mut config: SelectionConfig,
    args: &SelectArgs,
) -> CliResult<SelectionConfig> {
    if let Some(max_retries) = args.max_retries {
        config = config.with_max_retries(max_retries);
    }
    if let Some(base_delay_ms) = args.base_delay_ms {
        config = config.with_base_delay_ms(base_delay_ms);
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config = config.with_element_timeout_ms(timeout_ms);
    }
    if args.headed {
        config.browser = config.browser.with_headless(false);
    }
    config.validate()?;
    Ok(config)
}

/// Apply `verify` flags over a loaded configuration
pub fn apply_verify_overrides(
    mut config: SelectionConfig,
    args: &VerifyArgs,
) -> CliResult<SelectionConfig> {
    if let Some(timeout_ms) = args.timeout_ms {
        config = config.with_element_timeout_ms(timeout_ms);
    }
    if args.headed {
        config.browser = config.browser.with_headless(false);
    }
    config.validate()?;
    Ok(config)
}

/// Wait up to `timeout` for `selector` to be visible, then read its state.
///
/// An element that never shows up counts as not selected.
pub async fn verify_when_present<D: SelectionDriver + ?Sized>(
    driver: &D,
    selector: &str,
    timeout: Duration,
) -> bool {
    if let Err(e) = driver.wait_for_selector(selector, timeout).await {
        tracing::info!(selector, error = %e, "element never appeared");
        return false;
    }
    StateVerifier::new(driver).verify_state(selector).await
}

/// `selekta controls`
pub fn run_controls(args: &ControlsArgs) -> CliResult<String> {
    let mut registry = StrategyRegistry::builtin();
    if let Some(path) = &args.strategies {
        registry = registry.merged_with(StrategyRegistry::from_file(path)?);
    }
    Ok(match args.format {
        ListFormat::Text => output::render_controls_text(&registry),
        ListFormat::Json => output::render_controls_json(&registry)?,
    })
}

/// `selekta config`
pub fn run_config(args: &ConfigArgs) -> CliResult<String> {
    let config = load_config(args.config.as_deref())?;
    Ok(config.to_yaml()?)
}

/// `selekta select`
#[cfg(feature = "browser")]
pub fn run_select(args: &SelectArgs, quiet: bool) -> CliResult<String> {
    let config = apply_select_overrides(load_config(args.config.as_deref())?, args)?;
    // Fail on unknown names before starting a browser
    config.registry()?.get(&args.control)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(select_in_browser(args, &config, quiet))
}

#[cfg(feature = "browser")]
async fn select_in_browser(
    args: &SelectArgs,
    config: &SelectionConfig,
    quiet: bool,
) -> CliResult<String> {
    let progress = ProgressReporter::start(&format!("selecting {}", args.control), quiet);
    let browser = Browser::launch(config.browser.clone()).await?;
    let outcome = select_on_new_page(&browser, args, config).await;
    progress.finish();

    if let Err(e) = browser.close().await {
        tracing::warn!(error = %e, "browser did not close cleanly");
    }
    let report = outcome?;
    Ok(output::render_report(&args.control, &report))
}

#[cfg(feature = "browser")]
async fn select_on_new_page(
    browser: &Browser,
    args: &SelectArgs,
    config: &SelectionConfig,
) -> SelektaResult<SelectionReport> {
    let page = browser.new_page(&args.url).await?;
    DimensionTab::from_config(&page, config)?
        .select_named(&args.control)
        .await
}

/// `selekta select`
#[cfg(not(feature = "browser"))]
pub fn run_select(args: &SelectArgs, _quiet: bool) -> CliResult<String> {
    apply_select_overrides(load_config(args.config.as_deref())?, args)?;
    Err(CliError::FeatureDisabled { feature: "browser" })
}

/// `selekta verify`
#[cfg(feature = "browser")]
pub fn run_verify(args: &VerifyArgs) -> CliResult<String> {
    let config = apply_verify_overrides(load_config(args.config.as_deref())?, args)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let selected = runtime.block_on(verify_in_browser(args, &config))?;
    Ok(if selected { "selected" } else { "not selected" }.to_string())
}

#[cfg(feature = "browser")]
async fn verify_in_browser(args: &VerifyArgs, config: &SelectionConfig) -> SelektaResult<bool> {
    let browser = Browser::launch(config.browser.clone()).await?;
    let outcome = match browser.new_page(&args.url).await {
        Ok(page) => {
            let timeout = config.retry_policy().element_timeout;
            Ok(verify_when_present(&page, &args.selector, timeout).await)
        }
        Err(e) => Err(e),
    };
    if let Err(e) = browser.close().await {
        tracing::warn!(error = %e, "browser did not close cleanly");
    }
    outcome
}

/// `selekta verify`
#[cfg(not(feature = "browser"))]
pub fn run_verify(args: &VerifyArgs) -> CliResult<String> {
    apply_verify_overrides(load_config(args.config.as_deref())?, args)?;
    Err(CliError::FeatureDisabled { feature: "browser" })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn select_args() -> SelectArgs {
        SelectArgs {
            control: "product-dimension-yes".to_string(),
            url: "https://seller.test".to_string(),
            config: None,
            max_retries: None,
            base_delay_ms: None,
            timeout_ms: None,
            headed: false,
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_load_defaults_without_file() {
            assert_eq!(load_config(None).unwrap(), SelectionConfig::default());
        }

        #[test]
        fn test_load_missing_file_fails() {
            assert!(load_config(Some(Path::new("/nonexistent/selekta.yaml"))).is_err());
        }

        #[test]
        fn test_flags_override_file() {
            let args = SelectArgs {
                max_retries: Some(5),
                base_delay_ms: Some(20),
                timeout_ms: Some(3_000),
                headed: true,
                ..select_args()
            };
            let config = apply_select_overrides(SelectionConfig::default(), &args).unwrap();
            assert_eq!(config.max_retries, 5);
            assert_eq!(config.base_delay_ms, 20);
            assert_eq!(config.element_timeout_ms, 3_000);
            assert!(!config.browser.headless);
        }

        #[test]
        fn test_zero_retries_flag_rejected() {
            let args = SelectArgs {
                max_retries: Some(0),
                ..select_args()
            };
            let err = apply_select_overrides(SelectionConfig::default(), &args).unwrap_err();
            assert!(err.to_string().contains("max_retries must be at least 1"));
        }

        #[test]
        fn test_run_config_prints_yaml() {
            let yaml = run_config(&ConfigArgs { config: None }).unwrap();
            assert!(yaml.contains("max_retries: 3"));
            assert!(yaml.contains("test-results/error-screenshots"));
        }
    }

    mod verify_tests {
        use super::*;
        use async_trait::async_trait;
        use selekta::{MockDriver, MockElement, SelektaResult};
        use tokio::time::Instant;

        /// Page whose element is absent from every query until `appears_at`,
        /// so the default polling wait is exercised.
        struct LatePage {
            page: MockDriver,
            appears_at: Instant,
        }

        impl LatePage {
            fn new(element: MockElement, delay: Duration) -> Self {
                Self {
                    page: MockDriver::new().with_element("#yes", element),
                    appears_at: Instant::now() + delay,
                }
            }

            fn present(&self) -> bool {
                Instant::now() >= self.appears_at
            }
        }

        #[async_trait]
        impl SelectionDriver for LatePage {
            async fn count(&self, selector: &str) -> SelektaResult<usize> {
                if !self.present() {
                    return Ok(0);
                }
                self.page.count(selector).await
            }
            async fn is_visible(&self, selector: &str) -> SelektaResult<bool> {
                Ok(self.present() && self.page.is_visible(selector).await?)
            }
            async fn scroll_into_view(&self, selector: &str) -> SelektaResult<()> {
                self.page.scroll_into_view(selector).await
            }
            async fn click(&self, selector: &str) -> SelektaResult<()> {
                self.page.click(selector).await
            }
            async fn tag_name(&self, selector: &str) -> SelektaResult<Option<String>> {
                if !self.present() {
                    return Ok(None);
                }
                self.page.tag_name(selector).await
            }
            async fn attribute(&self, selector: &str, name: &str) -> SelektaResult<Option<String>> {
                if !self.present() {
                    return Ok(None);
                }
                self.page.attribute(selector, name).await
            }
            async fn is_checked(&self, selector: &str) -> SelektaResult<bool> {
                Ok(self.present() && self.page.is_checked(selector).await?)
            }
            async fn count_within(&self, scope: &str, selector: &str) -> SelektaResult<usize> {
                if !self.present() {
                    return Ok(0);
                }
                self.page.count_within(scope, selector).await
            }
            async fn is_checked_within(&self, scope: &str, selector: &str) -> SelektaResult<bool> {
                Ok(self.present() && self.page.is_checked_within(scope, selector).await?)
            }
            async fn current_url(&self) -> SelektaResult<String> {
                self.page.current_url().await
            }
            async fn screenshot(&self) -> SelektaResult<Vec<u8>> {
                self.page.screenshot().await
            }
        }

        fn verify_args(timeout_ms: Option<u64>) -> VerifyArgs {
            VerifyArgs {
                selector: "#yes".to_string(),
                url: "https://seller.test".to_string(),
                config: None,
                timeout_ms,
                headed: false,
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_waits_for_late_checked_control() {
            let page = LatePage::new(MockElement::radio().checked(true), Duration::from_millis(300));
            assert!(!StateVerifier::new(&page).verify_state("#yes").await);

            let start = Instant::now();
            assert!(verify_when_present(&page, "#yes", Duration::from_secs(1)).await);
            assert!(start.elapsed() >= Duration::from_millis(300));
            assert!(start.elapsed() < Duration::from_secs(1));
        }

        #[tokio::test(start_paused = true)]
        async fn test_control_that_never_appears_is_not_selected() {
            let page = LatePage::new(MockElement::radio().checked(true), Duration::from_secs(5));
            let start = Instant::now();
            assert!(!verify_when_present(&page, "#yes", Duration::from_millis(200)).await);
            assert_eq!(start.elapsed(), Duration::from_millis(200));
        }

        #[tokio::test]
        async fn test_present_unchecked_control_is_not_selected() {
            let page = LatePage::new(MockElement::radio(), Duration::ZERO);
            assert!(!verify_when_present(&page, "#yes", Duration::from_millis(200)).await);
        }

        #[test]
        fn test_timeout_flag_sets_wait_bound() {
            let config =
                apply_verify_overrides(SelectionConfig::default(), &verify_args(Some(1_500))).unwrap();
            assert_eq!(config.retry_policy().element_timeout, Duration::from_millis(1_500));
        }

        #[test]
        fn test_zero_timeout_flag_rejected() {
            let err = apply_verify_overrides(SelectionConfig::default(), &verify_args(Some(0)))
                .unwrap_err();
            assert!(err.to_string().contains("element_timeout_ms must be positive"));
        }
    }

    mod controls_tests {
        use super::*;

        #[test]
        fn test_controls_with_override_file() {
            let dir = tempfile::tempdir().unwrap();
            let path: PathBuf = dir.path().join("controls.yaml");
            std::fs::write(
                &path,
                "controls:\n  warranty-yes:\n    - selector: '#w'\n      description: id\n      priority: 1\n",
            )
            .unwrap();
            let out = run_controls(&ControlsArgs {
                strategies: Some(path),
                format: ListFormat::Json,
            })
            .unwrap();
            assert!(out.contains("warranty-yes"));
            assert!(out.contains("product-dimension-yes"));
        }
    }
}
