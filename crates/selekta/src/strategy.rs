//! Selector strategies and validated strategy sets.
//!
//! A logical control (a "Yes" radio button, say) can be addressed by several
//! selectors that differ in how much they assume about the markup. Each
//! [`SelectorStrategy`] carries a priority; lower values are tried first.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::result::{SelektaError, SelektaResult};

/// One candidate selector for a logical control
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectorStrategy {
    /// Locator expression understood by the driver
    pub selector: String,
    /// Why this selector might work; diagnostics only
    pub description: String,
    /// Lower is tried first
    pub priority: u32,
}

impl SelectorStrategy {
    /// Create a new strategy
    #[must_use]
    pub fn new(selector: impl Into<String>, description: impl Into<String>, priority: u32) -> Self {
        Self {
            selector: selector.into(),
            description: description.into(),
            priority,
        }
    }

    /// Attempt-log entry: `selector (description)`
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({})", self.selector, self.description)
    }
}

/// Non-empty set of strategies with distinct, positive priorities.
///
/// Strategies are held in ascending priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StrategySet {
    strategies: Vec<SelectorStrategy>,
}

impl StrategySet {
    /// Validate and order a list of strategies
    pub fn new(mut strategies: Vec<SelectorStrategy>) -> SelektaResult<Self> {
        if strategies.is_empty() {
            return Err(SelektaError::InvalidStrategySet {
                message: "a control needs at least one selector strategy".to_string(),
            });
        }

        let mut seen = HashSet::with_capacity(strategies.len());
        for strategy in &strategies {
            if strategy.priority == 0 {
                return Err(SelektaError::InvalidStrategySet {
                    message: format!("priority of '{}' must be positive", strategy.selector),
                });
            }
            if !seen.insert(strategy.priority) {
                return Err(SelektaError::InvalidStrategySet {
                    message: format!("priority {} is used more than once", strategy.priority),
                });
            }
        }

        strategies.sort_by_key(|s| s.priority);
        Ok(Self { strategies })
    }

    /// Strategies in ascending priority
    pub fn iter(&self) -> std::slice::Iter<'_, SelectorStrategy> {
        self.strategies.iter()
    }

    /// Number of strategies
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Always false for a constructed set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Highest-priority strategy
    #[must_use]
    pub fn first(&self) -> &SelectorStrategy {
        &self.strategies[0]
    }

    /// Attempt-log labels of every strategy, in priority order
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.strategies.iter().map(SelectorStrategy::label).collect()
    }
}

impl<'a> IntoIterator for &'a StrategySet {
    type Item = &'a SelectorStrategy;
    type IntoIter = std::slice::Iter<'a, SelectorStrategy>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'de> Deserialize<'de> for StrategySet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let strategies = Vec::<SelectorStrategy>::deserialize(deserializer)?;
        Self::new(strategies).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_label_format() {
        let s = SelectorStrategy::new("input#yes", "by id", 1);
        assert_eq!(s.label(), "input#yes (by id)");
    }

    #[test]
    fn test_set_sorts_by_priority() {
        let set = StrategySet::new(vec![
            SelectorStrategy::new("c", "third", 30),
            SelectorStrategy::new("a", "first", 1),
            SelectorStrategy::new("b", "second", 7),
        ])
        .unwrap();
        let order: Vec<_> = set.iter().map(|s| s.selector.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(set.first().selector, "a");
        assert_eq!(set.len(), 3);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_empty_set_rejected() {
        let err = StrategySet::new(vec![]).unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn test_duplicate_priority_rejected() {
        let err = StrategySet::new(vec![
            SelectorStrategy::new("a", "", 2),
            SelectorStrategy::new("b", "", 2),
        ])
        .unwrap_err();
        assert!(matches!(err, SelektaError::InvalidStrategySet { .. }));
    }

    #[test]
    fn test_zero_priority_rejected() {
        assert!(StrategySet::new(vec![SelectorStrategy::new("a", "", 0)]).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: StrategySet = serde_json::from_str(
            r#"[{"selector":"b","description":"","priority":2},{"selector":"a","description":"","priority":1}]"#,
        )
        .unwrap();
        assert_eq!(ok.first().selector, "a");

        let dup = serde_json::from_str::<StrategySet>(
            r#"[{"selector":"a","description":"","priority":1},{"selector":"b","description":"","priority":1}]"#,
        );
        assert!(dup.is_err());
    }

    proptest! {
        #[test]
        fn prop_iteration_is_ascending(priorities in proptest::collection::hash_set(1u32..10_000, 1..12)) {
            let strategies = priorities
                .iter()
                .map(|p| SelectorStrategy::new(format!("#s{p}"), "", *p))
                .collect();
            let set = StrategySet::new(strategies).unwrap();
            let seen: Vec<u32> = set.iter().map(|s| s.priority).collect();
            let mut expected: Vec<u32> = priorities.into_iter().collect();
            expected.sort_unstable();
            prop_assert_eq!(seen, expected);
        }
    }
}
