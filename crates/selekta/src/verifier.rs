//! State verifier: reads whether a radio control is actually selected.
//!
//! A click can succeed without changing anything (an overlay eats it, or the
//! framework wants the click on a different element). The verifier re-reads
//! the control's checked state independently of the click. Any ambiguity or
//! error reads as "not selected": a false negative costs a retry, a false
//! positive would silently accept a failed activation.

use tracing::{debug, warn};

use crate::driver::SelectionDriver;
use crate::result::SelektaResult;

/// Selector for a radio nested inside a label
pub const NESTED_CONTROL_SELECTOR: &str = r#"input[type="radio"]"#;

/// Selector addressing the element whose `id` a label's `for` names.
///
/// Ids like `productPackage.hasSameDimension` are not valid `#id` selectors,
/// so an attribute selector is used.
#[must_use]
pub fn linked_control_selector(id: &str) -> String {
    let escaped = id.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[id=\"{escaped}\"]")
}

/// Structural role of the element a selector resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRole {
    /// The control itself; its checked state is authoritative
    DirectControl,
    /// A label; the state lives on an associated control
    LabelWrapper,
    /// Anything else; state cannot be determined
    Unknown,
}

impl ElementRole {
    /// Classify by tag name
    #[must_use]
    pub fn from_tag(tag_name: &str) -> Self {
        match tag_name.to_ascii_lowercase().as_str() {
            "input" => Self::DirectControl,
            "label" => Self::LabelWrapper,
            _ => Self::Unknown,
        }
    }
}

/// Reads the logical selected state of a control
#[derive(Debug)]
pub struct StateVerifier<'a, D: SelectionDriver + ?Sized> {
    driver: &'a D,
}

impl<'a, D: SelectionDriver + ?Sized> StateVerifier<'a, D> {
    /// Create a verifier over a driver
    pub fn new(driver: &'a D) -> Self {
        Self { driver }
    }

    /// Whether the control addressed by `selector` is selected. Never fails.
    pub async fn verify_state(&self, selector: &str) -> bool {
        match self.read_state(selector).await {
            Ok(selected) => {
                debug!(selector, selected, "verified control state");
                selected
            }
            Err(e) => {
                warn!(selector, error = %e, "verification failed, treating as not selected");
                false
            }
        }
    }

    async fn read_state(&self, selector: &str) -> SelektaResult<bool> {
        if self.driver.count(selector).await? == 0 {
            return Ok(false);
        }

        let Some(tag) = self.driver.tag_name(selector).await? else {
            return Ok(false);
        };

        match ElementRole::from_tag(&tag) {
            ElementRole::DirectControl => self.driver.is_checked(selector).await,
            ElementRole::LabelWrapper => self.read_label_state(selector).await,
            ElementRole::Unknown => Ok(false),
        }
    }

    async fn read_label_state(&self, label: &str) -> SelektaResult<bool> {
        let linked_id = self
            .driver
            .attribute(label, "for")
            .await?
            .filter(|id| !id.is_empty());

        if let Some(id) = linked_id {
            let linked = linked_control_selector(&id);
            // Zero matches falls through to the nested search; a match is final
            if self.driver.count(&linked).await? > 0 {
                return self.driver.is_checked(&linked).await;
            }
        }

        if self
            .driver
            .count_within(label, NESTED_CONTROL_SELECTOR)
            .await?
            > 0
        {
            return self
                .driver
                .is_checked_within(label, NESTED_CONTROL_SELECTOR)
                .await;
        }

        Ok(false)
    }
}
