//! Result and error types for Selekta.

use thiserror::Error;

use crate::diagnostic::DiagnosticRecord;

/// Result type for Selekta operations
pub type SelektaResult<T> = Result<T, SelektaError>;

/// Errors that can occur in Selekta
#[derive(Debug, Error)]
pub enum SelektaError {
    /// No element matched the selector before the wait expired
    #[error("Element not found: {selector} (waited {timeout_ms}ms)")]
    NotFound {
        /// Selector that was probed
        selector: String,
        /// Wait bound in milliseconds
        timeout_ms: u64,
    },

    /// An element matched but never became visible
    #[error("Element not visible: {selector} (waited {timeout_ms}ms)")]
    NotVisible {
        /// Selector that was probed
        selector: String,
        /// Wait bound in milliseconds
        timeout_ms: u64,
    },

    /// The click did not complete within the wait bound
    #[error("Activation of {selector} timed out after {timeout_ms}ms")]
    ActivationTimeout {
        /// Selector that was clicked
        selector: String,
        /// Wait bound in milliseconds
        timeout_ms: u64,
    },

    /// The automation layer reported an error
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    ScreenshotError {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Strategy set violates its construction rules
    #[error("Invalid strategy set: {message}")]
    InvalidStrategySet {
        /// Error message
        message: String,
    },

    /// Control name not present in the registry
    #[error("Unknown control: {name}")]
    UnknownControl {
        /// Requested control name
        name: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Every strategy and every attempt was exhausted
    #[error(
        "{}. Attempted selectors: {}",
        .diagnostic.error_message,
        .diagnostic.attempted_selectors.join(", ")
    )]
    TerminalSelection {
        /// Diagnostic captured at the moment of exhaustion
        diagnostic: Box<DiagnosticRecord>,
    },

    /// A named control selection failed
    #[error("{function_name} failed: {message}. See logs for detailed error information.")]
    ControlSelection {
        /// Page-object operation that failed
        function_name: String,
        /// Message of the underlying failure
        message: String,
        /// Diagnostic captured by the page object
        diagnostic: Box<DiagnosticRecord>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl SelektaError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Diagnostic attached to a caller-visible selection failure
    #[must_use]
    pub fn diagnostic(&self) -> Option<&DiagnosticRecord> {
        match self {
            Self::TerminalSelection { diagnostic } | Self::ControlSelection { diagnostic, .. } => {
                Some(diagnostic.as_ref())
            }
            _ => None,
        }
    }

    /// Whether this is a per-attempt element failure that the orchestrator retries
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::NotVisible { .. }
                | Self::ActivationTimeout { .. }
                | Self::Driver { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn record() -> DiagnosticRecord {
        DiagnosticRecord {
            attempted_selectors: vec!["a (first)".into(), "b (second)".into()],
            page_url: Some("https://seller.test/product/new".into()),
            timestamp: "2026-10-18T10:00:00.000Z".into(),
            screenshot_path: None,
            error_message: "Failed to select radio button".into(),
            function_name: "resolve_and_select".into(),
        }
    }

    #[test]
    fn test_not_found_display() {
        let err = SelektaError::NotFound {
            selector: "#missing".into(),
            timeout_ms: 250,
        };
        assert_eq!(err.to_string(), "Element not found: #missing (waited 250ms)");
        assert!(err.is_transient());
    }

    #[test]
    fn test_terminal_selection_embeds_attempt_log() {
        let err = SelektaError::TerminalSelection {
            diagnostic: Box::new(record()),
        };
        let message = err.to_string();
        assert!(message.starts_with("Failed to select radio button. Attempted selectors: "));
        assert!(message.ends_with("a (first), b (second)"));
        assert!(!err.is_transient());
        assert_eq!(err.diagnostic().unwrap().function_name, "resolve_and_select");
    }

    #[test]
    fn test_control_selection_display() {
        let err = SelektaError::ControlSelection {
            function_name: "select_product_dimension_yes".into(),
            message: "boom".into(),
            diagnostic: Box::new(record()),
        };
        assert_eq!(
            err.to_string(),
            "select_product_dimension_yes failed: boom. See logs for detailed error information."
        );
        assert!(err.diagnostic().is_some());
    }

    #[test]
    fn test_helpers() {
        assert!(SelektaError::driver("x").to_string().contains("Driver error"));
        assert!(SelektaError::config("y").to_string().contains("Configuration"));
        assert!(SelektaError::config("y").diagnostic().is_none());
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SelektaError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
