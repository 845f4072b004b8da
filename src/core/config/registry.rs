//! core::config::registry
//!
//! The option registry: a tree of typed, validated settings addressed by
//! dotted path.
//!
//! # Invariants
//!
//! - Every node's current value satisfies its validator
//! - A node without a validator accepts only values of its default's kind
//! - Every path read or written must be registered first
//! - A path is never both a leaf and the namespace of another leaf
//! - A failed `set` leaves the old value in place
//! - A failed `set_many` leaves every value as it was before the call
//!
//! # Example
//!
//! ```
//! use optgate::core::config::{OptionRegistry, OptionSpec};
//! use optgate::core::types::OptionValue;
//!
//! let mut registry = OptionRegistry::new();
//! registry.register(OptionSpec::new("interactive", false)).unwrap();
//! registry
//!     .register(
//!         OptionSpec::new("sql.default_limit", 10_000)
//!             .with_validator(|v| v.is_none() || v.as_int().is_some_and(|n| n > 0)),
//!     )
//!     .unwrap();
//!
//! registry.set("interactive", true.into()).unwrap();
//! assert_eq!(registry.get("interactive").unwrap(), OptionValue::Bool(true));
//!
//! // Rejected values leave the old value in place
//! assert!(registry.set("sql.default_limit", (-1).into()).is_err());
//! assert_eq!(registry.get("sql.default_limit").unwrap(), OptionValue::Int(10_000));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::OptionError;
use crate::core::types::{OptionPath, OptionValue};

/// Validator predicate for an option node.
pub type Validator = Arc<dyn Fn(&OptionValue) -> bool + Send + Sync>;

/// Definition of an option to register.
#[derive(Clone)]
pub struct OptionSpec {
    path: String,
    default: OptionValue,
    validator: Option<Validator>,
    description: Option<String>,
}

impl OptionSpec {
    /// Define an option with a default value and no validator.
    pub fn new(path: impl Into<String>, default: impl Into<OptionValue>) -> Self {
        Self {
            path: path.into(),
            default: default.into(),
            validator: None,
            description: None,
        }
    }

    /// Attach a validator; values it rejects are refused by `set`.
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&OptionValue) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Attach a human-readable description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The path this spec will be registered under.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Debug for OptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionSpec")
            .field("path", &self.path)
            .field("default", &self.default)
            .field("validated", &self.validator.is_some())
            .field("description", &self.description)
            .finish()
    }
}

/// A registered option.
struct OptionNode {
    current: OptionValue,
    default: OptionValue,
    validator: Option<Validator>,
    description: Option<String>,
}

impl OptionNode {
    /// Check a candidate value, returning the rejection reason if any.
    fn check(&self, value: &OptionValue) -> Result<(), String> {
        match &self.validator {
            Some(validator) if validator(value) => Ok(()),
            Some(_) => Err("rejected by validator".to_string()),
            None if value.kind() == self.default.kind() => Ok(()),
            None => Err(format!(
                "expected {}, got {}",
                self.default.kind(),
                value.kind()
            )),
        }
    }
}

impl fmt::Debug for OptionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionNode")
            .field("current", &self.current)
            .field("default", &self.default)
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

/// Snapshot of a single option for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionInfo {
    /// The option path.
    pub path: OptionPath,
    /// Current (effective) value.
    pub value: OptionValue,
    /// Registered default.
    pub default: OptionValue,
    /// Description, if one was registered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OptionInfo {
    /// Whether the current value differs from the default.
    pub fn is_overridden(&self) -> bool {
        self.value != self.default
    }
}

/// Registry of options keyed by dotted path.
#[derive(Debug, Default)]
pub struct OptionRegistry {
    nodes: BTreeMap<OptionPath, OptionNode>,
}

impl OptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new option.
    ///
    /// # Errors
    ///
    /// - [`OptionError::Type`] if the path is malformed
    /// - [`OptionError::DuplicatePath`] if the path is already registered
    /// - [`OptionError::NamespaceConflict`] if the path is a namespace of an
    ///   existing option or an existing option is a namespace of it
    /// - [`OptionError::InvalidValue`] if the default fails the validator
    pub fn register(&mut self, spec: OptionSpec) -> Result<(), OptionError> {
        let path = OptionPath::new(spec.path)?;

        if self.nodes.contains_key(&path) {
            return Err(OptionError::DuplicatePath(path.to_string()));
        }

        if let Some(existing) = self
            .nodes
            .keys()
            .find(|p| p.is_under(path.as_str()) || path.is_under(p.as_str()))
        {
            return Err(OptionError::NamespaceConflict {
                path: path.to_string(),
                conflict: existing.to_string(),
            });
        }

        let node = OptionNode {
            current: spec.default.clone(),
            default: spec.default,
            validator: spec.validator,
            description: spec.description,
        };

        if let Err(reason) = node.check(&node.default) {
            return Err(OptionError::InvalidValue {
                path: path.to_string(),
                value: node.default,
                reason,
            });
        }

        self.nodes.insert(path, node);
        Ok(())
    }

    /// Register several options under a namespace prefix.
    ///
    /// Each spec's path is taken relative to `prefix`. Either all of them are
    /// registered or none are.
    pub fn register_prefixed(
        &mut self,
        prefix: &str,
        specs: Vec<OptionSpec>,
    ) -> Result<(), OptionError> {
        let mut added: Vec<OptionPath> = Vec::with_capacity(specs.len());

        for mut spec in specs {
            let path = match OptionPath::join(prefix, &spec.path) {
                Ok(path) => path,
                Err(e) => {
                    self.unregister_all(&added);
                    return Err(e.into());
                }
            };
            spec.path = path.to_string();

            if let Err(e) = self.register(spec) {
                self.unregister_all(&added);
                return Err(e);
            }
            added.push(path);
        }

        Ok(())
    }

    fn unregister_all(&mut self, paths: &[OptionPath]) {
        for path in paths {
            self.nodes.remove(path);
        }
    }

    fn node(&self, path: &str) -> Result<&OptionNode, OptionError> {
        self.nodes
            .get(path)
            .ok_or_else(|| OptionError::UnknownPath(path.to_string()))
    }

    /// Get the current value of an option.
    pub fn get(&self, path: &str) -> Result<OptionValue, OptionError> {
        self.node(path).map(|node| node.current.clone())
    }

    /// Set the value of an option, returning the previous value.
    ///
    /// # Errors
    ///
    /// - [`OptionError::UnknownPath`] if the option is not registered
    /// - [`OptionError::InvalidValue`] if the value fails validation; the
    ///   current value is left unchanged
    pub fn set(&mut self, path: &str, value: OptionValue) -> Result<OptionValue, OptionError> {
        let node = self
            .nodes
            .get_mut(path)
            .ok_or_else(|| OptionError::UnknownPath(path.to_string()))?;

        node.check(&value)
            .map_err(|reason| OptionError::InvalidValue {
                path: path.to_string(),
                value: value.clone(),
                reason,
            })?;

        Ok(std::mem::replace(&mut node.current, value))
    }

    /// Set several options at once.
    ///
    /// On the first failure, every entry already applied by this call is
    /// rolled back to its pre-call value and the error is returned.
    pub fn set_many<I, P, V>(&mut self, entries: I) -> Result<(), OptionError>
    where
        I: IntoIterator<Item = (P, V)>,
        P: AsRef<str>,
        V: Into<OptionValue>,
    {
        let mut applied: Vec<(String, OptionValue)> = Vec::new();

        for (path, value) in entries {
            let path = path.as_ref();
            match self.set(path, value.into()) {
                Ok(previous) => applied.push((path.to_string(), previous)),
                Err(e) => {
                    self.restore_all(applied);
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Restore `(path, value)` pairs in reverse order.
    fn restore_all(&mut self, applied: Vec<(String, OptionValue)>) {
        for (path, previous) in applied.into_iter().rev() {
            self.restore(&path, previous);
        }
    }

    /// Put back a value that was previously read from this registry.
    ///
    /// Skips validation: the value already passed it when it was stored.
    pub(crate) fn restore(&mut self, path: &str, value: OptionValue) {
        if let Some(node) = self.nodes.get_mut(path) {
            node.current = value;
        }
    }

    /// Reset an option to its default, returning the previous value.
    pub fn reset(&mut self, path: &str) -> Result<OptionValue, OptionError> {
        let node = self
            .nodes
            .get_mut(path)
            .ok_or_else(|| OptionError::UnknownPath(path.to_string()))?;
        let default = node.default.clone();
        Ok(std::mem::replace(&mut node.current, default))
    }

    /// Check whether an option is registered at exactly this path.
    pub fn contains(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    /// Check whether `prefix` is a namespace containing registered options.
    pub fn is_namespace(&self, prefix: &str) -> bool {
        self.nodes.keys().any(|p| p.is_under(prefix))
    }

    /// Describe a single option.
    pub fn describe(&self, path: &str) -> Result<OptionInfo, OptionError> {
        let (path, node) = self
            .nodes
            .get_key_value(path)
            .ok_or_else(|| OptionError::UnknownPath(path.to_string()))?;
        Ok(Self::info(path, node))
    }

    /// List options, optionally restricted to a subtree.
    ///
    /// With a prefix, returns the option at exactly that path (if any) and
    /// every option under it. Results are sorted by path.
    pub fn list(&self, prefix: Option<&str>) -> Vec<OptionInfo> {
        self.nodes
            .iter()
            .filter(|(path, _)| match prefix {
                Some(prefix) => path.as_str() == prefix || path.is_under(prefix),
                None => true,
            })
            .map(|(path, node)| Self::info(path, node))
            .collect()
    }

    fn info(path: &OptionPath, node: &OptionNode) -> OptionInfo {
        OptionInfo {
            path: path.clone(),
            value: node.current.clone(),
            default: node.default.clone(),
            description: node.description.clone(),
        }
    }

    /// Number of registered options.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no options are registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positive_or_none(v: &OptionValue) -> bool {
        v.is_none() || v.as_int().is_some_and(|n| n > 0)
    }

    fn registry() -> OptionRegistry {
        let mut registry = OptionRegistry::new();
        registry
            .register(OptionSpec::new("interactive", false).with_description("Execute on display"))
            .unwrap();
        registry
            .register(OptionSpec::new("sql.default_limit", 10_000).with_validator(positive_or_none))
            .unwrap();
        registry
            .register(OptionSpec::new("graphviz_repr", false))
            .unwrap();
        registry
    }

    mod register {
        use super::*;

        #[test]
        fn inserts_default() {
            let registry = registry();
            assert_eq!(registry.get("interactive").unwrap(), OptionValue::Bool(false));
            assert_eq!(registry.len(), 3);
        }

        #[test]
        fn duplicate_rejected() {
            let mut registry = registry();
            let err = registry
                .register(OptionSpec::new("interactive", true))
                .unwrap_err();
            assert_eq!(err, OptionError::DuplicatePath("interactive".into()));
            // Original node untouched
            assert_eq!(registry.get("interactive").unwrap(), OptionValue::Bool(false));
        }

        #[test]
        fn namespace_conflicts_rejected() {
            let mut registry = registry();
            assert!(matches!(
                registry.register(OptionSpec::new("sql", 1)),
                Err(OptionError::NamespaceConflict { .. })
            ));
            assert!(matches!(
                registry.register(OptionSpec::new("interactive.deep", 1)),
                Err(OptionError::NamespaceConflict { .. })
            ));
            // Sibling under an existing namespace is fine
            assert!(registry.register(OptionSpec::new("sql.dialect", "ansi")).is_ok());
        }

        #[test]
        fn invalid_default_rejected() {
            let mut registry = OptionRegistry::new();
            let err = registry
                .register(OptionSpec::new("limit", 0).with_validator(positive_or_none))
                .unwrap_err();
            assert!(matches!(err, OptionError::InvalidValue { .. }));
            assert!(!registry.contains("limit"));
        }

        #[test]
        fn malformed_path_rejected() {
            let mut registry = OptionRegistry::new();
            assert!(matches!(
                registry.register(OptionSpec::new("bad..path", 1)),
                Err(OptionError::Type(_))
            ));
        }

        #[test]
        fn prefixed_is_all_or_nothing() {
            let mut registry = registry();
            let err = registry
                .register_prefixed(
                    "mock",
                    vec![
                        OptionSpec::new("row_count", 0),
                        OptionSpec::new("row_count", 1),
                    ],
                )
                .unwrap_err();
            assert_eq!(err, OptionError::DuplicatePath("mock.row_count".into()));
            assert!(!registry.contains("mock.row_count"));

            registry
                .register_prefixed("mock", vec![OptionSpec::new("row_count", 0)])
                .unwrap();
            assert!(registry.contains("mock.row_count"));
        }
    }

    mod get_set {
        use super::*;

        #[test]
        fn unknown_path() {
            let mut registry = registry();
            assert_eq!(
                registry.get("nope").unwrap_err(),
                OptionError::UnknownPath("nope".into())
            );
            assert_eq!(
                registry.set("nope", true.into()).unwrap_err(),
                OptionError::UnknownPath("nope".into())
            );
        }

        #[test]
        fn set_returns_previous() {
            let mut registry = registry();
            let prev = registry.set("sql.default_limit", 50.into()).unwrap();
            assert_eq!(prev, OptionValue::Int(10_000));
            assert_eq!(registry.get("sql.default_limit").unwrap(), OptionValue::Int(50));
        }

        #[test]
        fn validator_rejection_keeps_old_value() {
            let mut registry = registry();
            let err = registry.set("sql.default_limit", 0.into()).unwrap_err();
            assert!(matches!(err, OptionError::InvalidValue { .. }));
            assert_eq!(
                registry.get("sql.default_limit").unwrap(),
                OptionValue::Int(10_000)
            );
        }

        #[test]
        fn validator_accepts_none_sentinel() {
            let mut registry = registry();
            registry.set("sql.default_limit", OptionValue::None).unwrap();
            assert!(registry.get("sql.default_limit").unwrap().is_none());
        }

        #[test]
        fn unvalidated_node_checks_kind() {
            let mut registry = registry();
            let err = registry.set("interactive", 1.into()).unwrap_err();
            match err {
                OptionError::InvalidValue { reason, .. } => {
                    assert_eq!(reason, "expected bool, got int")
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn reset_restores_default() {
            let mut registry = registry();
            registry.set("interactive", true.into()).unwrap();
            assert_eq!(registry.reset("interactive").unwrap(), OptionValue::Bool(true));
            assert_eq!(registry.get("interactive").unwrap(), OptionValue::Bool(false));
        }
    }

    mod set_many {
        use super::*;

        #[test]
        fn applies_all() {
            let mut registry = registry();
            registry
                .set_many([
                    ("interactive", OptionValue::Bool(true)),
                    ("sql.default_limit", OptionValue::Int(5)),
                ])
                .unwrap();
            assert_eq!(registry.get("interactive").unwrap(), OptionValue::Bool(true));
            assert_eq!(registry.get("sql.default_limit").unwrap(), OptionValue::Int(5));
        }

        #[test]
        fn rolls_back_on_failure() {
            let mut registry = registry();
            let err = registry
                .set_many([
                    ("interactive", OptionValue::Bool(true)),
                    ("sql.default_limit", OptionValue::Int(5)),
                    ("graphviz_repr", OptionValue::Str("yes".into())),
                ])
                .unwrap_err();
            assert!(matches!(err, OptionError::InvalidValue { .. }));
            assert_eq!(registry.get("interactive").unwrap(), OptionValue::Bool(false));
            assert_eq!(
                registry.get("sql.default_limit").unwrap(),
                OptionValue::Int(10_000)
            );
        }

        #[test]
        fn rolls_back_repeated_path_to_pre_call_value() {
            let mut registry = registry();
            let err = registry.set_many([
                ("sql.default_limit", OptionValue::Int(1)),
                ("sql.default_limit", OptionValue::Int(2)),
                ("missing", OptionValue::Int(3)),
            ]);
            assert!(err.is_err());
            assert_eq!(
                registry.get("sql.default_limit").unwrap(),
                OptionValue::Int(10_000)
            );
        }
    }

    mod introspection {
        use super::*;

        #[test]
        fn contains_and_namespace() {
            let registry = registry();
            assert!(registry.contains("sql.default_limit"));
            assert!(!registry.contains("sql"));
            assert!(registry.is_namespace("sql"));
            assert!(!registry.is_namespace("interactive"));
        }

        #[test]
        fn list_is_sorted_and_filtered() {
            let registry = registry();
            let all: Vec<String> = registry
                .list(None)
                .into_iter()
                .map(|i| i.path.to_string())
                .collect();
            assert_eq!(all, vec!["graphviz_repr", "interactive", "sql.default_limit"]);

            let sql = registry.list(Some("sql"));
            assert_eq!(sql.len(), 1);
            assert_eq!(sql[0].path.as_str(), "sql.default_limit");
        }

        #[test]
        fn describe_reports_override() {
            let mut registry = registry();
            registry.set("interactive", true.into()).unwrap();
            let info = registry.describe("interactive").unwrap();
            assert!(info.is_overridden());
            assert_eq!(info.default, OptionValue::Bool(false));
            assert_eq!(info.description.as_deref(), Some("Execute on display"));
        }
    }
}
