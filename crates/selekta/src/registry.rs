//! Selector strategy registry for the product form's radio controls.
//!
//! The built-in tables cover the dimension tab's "same dimension" and "same
//! package dimension" Yes/No radios. Selector tables drift with app versions,
//! so a registry can be extended or overridden from YAML:
//!
//! ```yaml
//! controls:
//!   product-dimension-yes:
//!     - selector: 'label:has(input[value="yes"])'
//!       description: Label by value only
//!       priority: 1
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::result::{SelektaError, SelektaResult};
use crate::strategy::{SelectorStrategy, StrategySet};

/// Radio controls on the dimension tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogicalControl {
    /// Product dimension: all variants share one size
    ProductDimensionYes,
    /// Product dimension: sizes differ per variant
    ProductDimensionNo,
    /// Package dimension: all variants share one package
    PackageDimensionYes,
    /// Package dimension: packages differ per variant
    PackageDimensionNo,
}

impl LogicalControl {
    /// Every built-in control
    pub const ALL: [Self; 4] = [
        Self::ProductDimensionYes,
        Self::ProductDimensionNo,
        Self::PackageDimensionYes,
        Self::PackageDimensionNo,
    ];

    /// Registry key
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ProductDimensionYes => "product-dimension-yes",
            Self::ProductDimensionNo => "product-dimension-no",
            Self::PackageDimensionYes => "package-dimension-yes",
            Self::PackageDimensionNo => "package-dimension-no",
        }
    }

    /// Page-object operation name used for log correlation and screenshot files
    #[must_use]
    pub const fn function_name(self) -> &'static str {
        match self {
            Self::ProductDimensionYes => "select_product_dimension_yes",
            Self::ProductDimensionNo => "select_product_dimension_no",
            Self::PackageDimensionYes => "select_package_dimension_yes",
            Self::PackageDimensionNo => "select_package_dimension_no",
        }
    }

    /// Human-readable name for log lines
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::ProductDimensionYes => r#"product dimension "Yes" radio button"#,
            Self::ProductDimensionNo => r#"product dimension "No" radio button"#,
            Self::PackageDimensionYes => r#"package dimension "Yes" radio button"#,
            Self::PackageDimensionNo => r#"package dimension "No" radio button"#,
        }
    }

    /// Built-in strategy table
    #[must_use]
    pub fn builtin_strategies(self) -> Vec<SelectorStrategy> {
        fn s(selector: &str, description: &str, priority: u32) -> SelectorStrategy {
            SelectorStrategy::new(selector, description, priority)
        }

        match self {
            Self::ProductDimensionYes => vec![
                s(
                    r#"label:has(input[data-testid="productPackage-hasSameDimension-yes"])"#,
                    "Label containing data test ID input for product dimension (most reliable)",
                    1,
                ),
                s(
                    r#"label:has(input[name="productPackage.hasSameDimension"][value="yes"])"#,
                    "Label containing name and value attribute input for product dimension",
                    2,
                ),
                s(
                    r#"label:has(input[id="productPackage.hasSameDimension"][value="yes"])"#,
                    "Label containing ID and value attribute input for product dimension",
                    3,
                ),
            ],
            Self::ProductDimensionNo => vec![
                s(
                    r#"label:has(input[name="productPackage.hasSameDimension"][value="no"])"#,
                    "Label containing name and value attribute input for product dimension (most reliable)",
                    1,
                ),
                s(
                    r#"label:has(input[data-testid="productPackage-hasSameDimension-no"])"#,
                    "First label containing data test ID input for product dimension",
                    2,
                ),
                s(
                    r#"label:has(input[id="productPackage.hasSameDimension"][value="no"])"#,
                    "Label containing ID and value attribute input for product dimension",
                    3,
                ),
            ],
            Self::PackageDimensionYes => vec![
                s(
                    r#"label:has(input[name="productPackage.hasSamePackageDimension"][value="yes"])"#,
                    "Label containing name and value attribute input for package dimension",
                    1,
                ),
                s(
                    r#"label:has(input[id="productPackage.hasSamePackageDimension"][value="yes"])"#,
                    "Label containing ID and value attribute input for package dimension",
                    2,
                ),
            ],
            Self::PackageDimensionNo => vec![
                s(
                    r#"label:has(input[name="productPackage.hasSamePackageDimension"][value="no"])"#,
                    "Label containing name and value attribute input for package dimension",
                    1,
                ),
                s(
                    r#"label:has(input[id="productPackage.hasSamePackageDimension"][value="no"])"#,
                    "Label containing ID and value attribute input for package dimension",
                    2,
                ),
            ],
        }
    }
}

impl fmt::Display for LogicalControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogicalControl {
    type Err = SelektaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| SelektaError::UnknownControl {
                name: s.to_string(),
            })
    }
}

/// Control name → strategy set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyRegistry {
    #[serde(default)]
    controls: BTreeMap<String, StrategySet>,
}

impl StrategyRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in dimension-tab tables
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for control in LogicalControl::ALL {
            // Built-in tables have distinct positive priorities
            if let Ok(set) = StrategySet::new(control.builtin_strategies()) {
                registry.register(control.name(), set);
            }
        }
        registry
    }

    /// Parse a registry from YAML
    pub fn from_yaml(yaml: &str) -> SelektaResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a registry from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> SelektaResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Serialize the registry to YAML
    pub fn to_yaml(&self) -> SelektaResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Register or replace a control's strategy set
    pub fn register(&mut self, name: impl Into<String>, strategies: StrategySet) {
        self.controls.insert(name.into(), strategies);
    }

    /// Overlay another registry; its entries replace same-named ones
    #[must_use]
    pub fn merged_with(mut self, overrides: Self) -> Self {
        self.controls.extend(overrides.controls);
        self
    }

    /// Strategy set for a control name
    pub fn get(&self, name: &str) -> SelektaResult<&StrategySet> {
        self.controls
            .get(name)
            .ok_or_else(|| SelektaError::UnknownControl {
                name: name.to_string(),
            })
    }

    /// Strategy set for a built-in control
    pub fn strategies(&self, control: LogicalControl) -> SelektaResult<&StrategySet> {
        self.get(control.name())
    }

    /// Registered control names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.controls.keys().map(String::as_str)
    }

    /// (name, strategies) pairs, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StrategySet)> {
        self.controls.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of registered controls
    #[must_use]
    pub fn len(&self) -> usize {
        self.controls.len()
    }

    /// Whether no controls are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_every_control() {
        let registry = StrategyRegistry::builtin();
        assert_eq!(registry.len(), 4);
        for control in LogicalControl::ALL {
            let set = registry.strategies(control).unwrap();
            assert!(!set.is_empty());
        }
    }

    #[test]
    fn test_builtin_table_sizes() {
        let registry = StrategyRegistry::builtin();
        assert_eq!(
            registry.strategies(LogicalControl::ProductDimensionYes).unwrap().len(),
            3
        );
        assert_eq!(
            registry.strategies(LogicalControl::PackageDimensionNo).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_product_yes_prefers_test_id() {
        let registry = StrategyRegistry::builtin();
        let first = registry
            .strategies(LogicalControl::ProductDimensionYes)
            .unwrap()
            .first()
            .clone();
        assert!(first.selector.contains("data-testid"));
        assert_eq!(first.priority, 1);
    }

    #[test]
    fn test_control_names_round_trip() {
        for control in LogicalControl::ALL {
            assert_eq!(control.name().parse::<LogicalControl>().unwrap(), control);
            assert!(control.function_name().starts_with("select_"));
        }
        assert!(matches!(
            "warranty-yes".parse::<LogicalControl>(),
            Err(SelektaError::UnknownControl { .. })
        ));
    }

    #[test]
    fn test_unknown_lookup() {
        let err = StrategyRegistry::new().get("nope").unwrap_err();
        assert_eq!(err.to_string(), "Unknown control: nope");
    }

    #[test]
    fn test_yaml_override_replaces_builtin() {
        let yaml = r#"
controls:
  product-dimension-yes:
    - selector: 'label:has(input[value="yes"])'
      description: Label by value only
      priority: 1
  warranty-yes:
    - selector: '#warranty-yes'
      description: Warranty radio
      priority: 5
"#;
        let overrides = StrategyRegistry::from_yaml(yaml).unwrap();
        let registry = StrategyRegistry::builtin().merged_with(overrides);
        assert_eq!(registry.len(), 5);
        assert_eq!(
            registry.strategies(LogicalControl::ProductDimensionYes).unwrap().len(),
            1
        );
        assert_eq!(registry.get("warranty-yes").unwrap().first().priority, 5);
    }

    #[test]
    fn test_yaml_with_duplicate_priorities_rejected() {
        let yaml = r"
controls:
  bad:
    - selector: a
      description: a
      priority: 1
    - selector: b
      description: b
      priority: 1
";
        assert!(matches!(
            StrategyRegistry::from_yaml(yaml),
            Err(SelektaError::Yaml(_))
        ));
    }

    #[test]
    fn test_yaml_export_reloads() {
        let registry = StrategyRegistry::builtin();
        let yaml = registry.to_yaml().unwrap();
        assert_eq!(StrategyRegistry::from_yaml(&yaml).unwrap(), registry);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("controls.yaml");
        std::fs::write(
            &path,
            "controls:\n  x:\n    - selector: '#x'\n      description: x\n      priority: 1\n",
        )
        .unwrap();
        let registry = StrategyRegistry::from_file(&path).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["x"]);
    }
}
