//! SelectionDriver - Abstract Browser Automation Trait
//!
//! The resolution subsystem never talks to a browser directly. Everything it
//! needs from the page goes through [`SelectionDriver`], so the orchestrator,
//! prober and verifier run unchanged against Chromium ([`crate::ChromiumPage`],
//! `browser` feature) or the in-memory [`MockDriver`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  SelectionDriver (Abstract Trait)                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐        ┌─────────────────────┐      │
//! │  │  ChromiumPage       │        │  MockDriver         │      │
//! │  │  CDP via            │        │  Scripted DOM for   │      │
//! │  │  chromiumoxide      │        │  unit tests         │      │
//! │  └─────────────────────┘        └─────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::result::{SelektaError, SelektaResult};

/// Default polling interval for element waits (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Abstract driver trait for the automation layer.
///
/// Selector arguments are opaque locator expressions. Single-element queries
/// (`is_visible`, `tag_name`, `attribute`, `is_checked`) address the first match.
#[async_trait]
pub trait SelectionDriver: Send + Sync {
    /// Number of elements matching the selector
    async fn count(&self, selector: &str) -> SelektaResult<usize>;

    /// Whether the first match is rendered and visible
    async fn is_visible(&self, selector: &str) -> SelektaResult<bool>;

    /// Scroll the first match into the viewport if needed
    async fn scroll_into_view(&self, selector: &str) -> SelektaResult<()>;

    /// Click the first match
    async fn click(&self, selector: &str) -> SelektaResult<()>;

    /// Lower-case tag name of the first match
    async fn tag_name(&self, selector: &str) -> SelektaResult<Option<String>>;

    /// Attribute value of the first match
    async fn attribute(&self, selector: &str, name: &str) -> SelektaResult<Option<String>>;

    /// Native checked state of the first match
    async fn is_checked(&self, selector: &str) -> SelektaResult<bool>;

    /// Number of elements matching `selector` inside the first match of `scope`
    async fn count_within(&self, scope: &str, selector: &str) -> SelektaResult<usize>;

    /// Checked state of the first `selector` match inside the first match of `scope`
    async fn is_checked_within(&self, scope: &str, selector: &str) -> SelektaResult<bool>;

    /// Current page location
    async fn current_url(&self) -> SelektaResult<String>;

    /// Full-page PNG screenshot
    async fn screenshot(&self) -> SelektaResult<Vec<u8>>;

    /// Wait until the first match exists and is visible.
    ///
    /// Fails with `NotFound` if nothing matched when the timeout elapsed and
    /// `NotVisible` if a match existed but stayed hidden.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> SelektaResult<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        let poll = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);
        loop {
            let present = self.count(selector).await? > 0;
            if present && self.is_visible(selector).await? {
                return Ok(());
            }

            let now = tokio::time::Instant::now();
            if now >= deadline {
                let timeout_ms = timeout.as_millis() as u64;
                let selector = selector.to_string();
                return Err(if present {
                    SelektaError::NotVisible {
                        selector,
                        timeout_ms,
                    }
                } else {
                    SelektaError::NotFound {
                        selector,
                        timeout_ms,
                    }
                });
            }
            tokio::time::sleep(poll.min(deadline - now)).await;
        }
    }
}

/// What a mock element does when clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickBehavior {
    /// Click checks the control (and any linked or nested control)
    #[default]
    Activate,
    /// Click is accepted but nothing changes
    Swallow,
    /// Click raises a driver error
    Fail,
    /// Click never completes
    Hang,
}

/// Element in the mock DOM
#[derive(Debug, Clone)]
pub struct MockElement {
    /// Lower-case tag name
    pub tag_name: String,
    /// Visibility
    pub visible: bool,
    /// Checked state
    pub checked: bool,
    /// Click behaviour
    pub click: ClickBehavior,
    /// Attributes
    pub attributes: HashMap<String, String>,
    /// Descendants keyed by the selector that finds them inside this element
    pub nested: HashMap<String, MockElement>,
    /// Every query except `count` fails
    pub broken: bool,
    /// Waits that report the element as missing before it appears
    pub absent_for_waits: u32,
    /// Scrolling never completes
    pub scroll_hangs: bool,
}

impl MockElement {
    /// Create an element with the given tag
    #[must_use]
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            visible: true,
            checked: false,
            click: ClickBehavior::Activate,
            attributes: HashMap::new(),
            nested: HashMap::new(),
            broken: false,
            absent_for_waits: 0,
            scroll_hangs: false,
        }
    }

    /// A radio input
    #[must_use]
    pub fn radio() -> Self {
        Self::new("input").with_attribute("type", "radio")
    }

    /// A label wrapping a radio input
    #[must_use]
    pub fn label_with_radio() -> Self {
        Self::new("label").with_nested(r#"input[type="radio"]"#, Self::radio())
    }

    /// Make the element invisible
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Set the checked state
    #[must_use]
    pub const fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    /// Set click behaviour
    #[must_use]
    pub const fn with_click(mut self, click: ClickBehavior) -> Self {
        self.click = click;
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Add a descendant
    #[must_use]
    pub fn with_nested(mut self, selector: impl Into<String>, element: Self) -> Self {
        self.nested.insert(selector.into(), element);
        self
    }

    /// Make every query except `count` fail
    #[must_use]
    pub const fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    /// Report the element as missing for the first `waits` waits
    #[must_use]
    pub const fn appearing_after(mut self, waits: u32) -> Self {
        self.absent_for_waits = waits;
        self
    }

    /// Make `scroll_into_view` hang
    #[must_use]
    pub const fn hanging_scroll(mut self) -> Self {
        self.scroll_hangs = true;
        self
    }
}

#[derive(Debug, Default)]
struct MockState {
    url: String,
    elements: HashMap<String, MockElement>,
    screenshot: Option<Vec<u8>>,
    history: Vec<String>,
}

/// Mock driver for unit testing.
///
/// Elements are keyed by the exact selector string that finds them. Waits
/// resolve immediately, so only explicit backoff delays consume time.
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page location
    #[must_use]
    pub fn with_url(self, url: impl Into<String>) -> Self {
        self.lock().url = url.into();
        self
    }

    /// Register an element under a selector
    #[must_use]
    pub fn with_element(self, selector: impl Into<String>, element: MockElement) -> Self {
        self.set_element(selector, element);
        self
    }

    /// Set screenshot bytes; without them screenshots fail
    #[must_use]
    pub fn with_screenshot(self, data: Vec<u8>) -> Self {
        self.lock().screenshot = Some(data);
        self
    }

    /// Register or replace an element
    pub fn set_element(&self, selector: impl Into<String>, element: MockElement) {
        self.lock().elements.insert(selector.into(), element);
    }

    /// Remove an element
    pub fn remove_element(&self, selector: &str) {
        self.lock().elements.remove(selector);
    }

    /// Snapshot of an element
    #[must_use]
    pub fn element(&self, selector: &str) -> Option<MockElement> {
        self.lock().elements.get(selector).cloned()
    }

    /// Call history, in order
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Entries of the history that start with `method:`
    #[must_use]
    pub fn calls(&self, method: &str) -> Vec<String> {
        let prefix = format!("{method}:");
        self.lock()
            .history
            .iter()
            .filter_map(|c| c.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.lock().history.iter().any(|c| c.starts_with(method))
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panic while holding the lock only happens inside a failing test
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn record(&self, entry: String) {
        self.lock().history.push(entry);
    }

    fn with_found<T>(
        &self,
        selector: &str,
        read: impl FnOnce(&MockElement) -> T,
    ) -> SelektaResult<Option<T>> {
        let state = self.lock();
        match state.elements.get(selector) {
            None => Ok(None),
            Some(el) if el.broken => Err(SelektaError::driver(format!(
                "element detached while reading {selector}"
            ))),
            Some(el) => Ok(Some(read(el))),
        }
    }

    fn require<T>(&self, selector: &str, read: impl FnOnce(&MockElement) -> T) -> SelektaResult<T> {
        self.with_found(selector, read)?
            .ok_or_else(|| SelektaError::driver(format!("no element matches {selector}")))
    }

    fn activate(state: &mut MockState, selector: &str) {
        let mut linked = None;
        if let Some(el) = state.elements.get_mut(selector) {
            el.checked = true;
            for child in el.nested.values_mut() {
                child.checked = true;
            }
            linked = el.attributes.get("for").cloned();
        }
        if let Some(id) = linked {
            if let Some(target) = state.elements.get_mut(&linked_selector(&id)) {
                target.checked = true;
            }
        }
    }
}

/// Selector the mock uses for `[id="..."]` lookups
fn linked_selector(id: &str) -> String {
    crate::verifier::linked_control_selector(id)
}

#[async_trait]
impl SelectionDriver for MockDriver {
    async fn count(&self, selector: &str) -> SelektaResult<usize> {
        Ok(usize::from(self.lock().elements.contains_key(selector)))
    }

    async fn is_visible(&self, selector: &str) -> SelektaResult<bool> {
        Ok(self.with_found(selector, |el| el.visible)?.unwrap_or(false))
    }

    async fn scroll_into_view(&self, selector: &str) -> SelektaResult<()> {
        self.record(format!("scroll:{selector}"));
        if self.require(selector, |el| el.scroll_hangs)? {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn click(&self, selector: &str) -> SelektaResult<()> {
        self.record(format!("click:{selector}"));
        let (visible, behavior) = self.require(selector, |el| (el.visible, el.click))?;
        if !visible {
            return Err(SelektaError::driver(format!("{selector} is not visible")));
        }
        match behavior {
            ClickBehavior::Activate => {
                Self::activate(&mut self.lock(), selector);
                Ok(())
            }
            ClickBehavior::Swallow => Ok(()),
            ClickBehavior::Fail => Err(SelektaError::driver(format!(
                "click on {selector} intercepted by another element"
            ))),
            ClickBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    async fn tag_name(&self, selector: &str) -> SelektaResult<Option<String>> {
        self.with_found(selector, |el| el.tag_name.clone())
    }

    async fn attribute(&self, selector: &str, name: &str) -> SelektaResult<Option<String>> {
        Ok(self
            .with_found(selector, |el| el.attributes.get(name).cloned())?
            .flatten())
    }

    async fn is_checked(&self, selector: &str) -> SelektaResult<bool> {
        self.require(selector, |el| el.checked)
    }

    async fn count_within(&self, scope: &str, selector: &str) -> SelektaResult<usize> {
        Ok(self
            .with_found(scope, |el| usize::from(el.nested.contains_key(selector)))?
            .unwrap_or(0))
    }

    async fn is_checked_within(&self, scope: &str, selector: &str) -> SelektaResult<bool> {
        self.require(scope, |el| el.nested.get(selector).map(|c| c.checked))?
            .ok_or_else(|| SelektaError::driver(format!("no {selector} inside {scope}")))
    }

    async fn current_url(&self) -> SelektaResult<String> {
        self.record("url:".to_string());
        Ok(self.lock().url.clone())
    }

    async fn screenshot(&self) -> SelektaResult<Vec<u8>> {
        self.record("screenshot:".to_string());
        self.lock()
            .screenshot
            .clone()
            .ok_or_else(|| SelektaError::ScreenshotError {
                message: "No mock screenshot set".to_string(),
            })
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> SelektaResult<()> {
        self.record(format!("wait:{selector}"));
        let timeout_ms = timeout.as_millis() as u64;
        {
            let mut state = self.lock();
            if let Some(el) = state.elements.get_mut(selector) {
                if el.absent_for_waits > 0 {
                    el.absent_for_waits -= 1;
                    return Err(SelektaError::NotFound {
                        selector: selector.to_string(),
                        timeout_ms,
                    });
                }
            }
        }
        match self.with_found(selector, |el| el.visible)? {
            None => Err(SelektaError::NotFound {
                selector: selector.to_string(),
                timeout_ms,
            }),
            Some(false) => Err(SelektaError::NotVisible {
                selector: selector.to_string(),
                timeout_ms,
            }),
            Some(true) => Ok(()),
        }
    }
}
