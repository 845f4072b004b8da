//! core::options
//!
//! Shared handle over the option registry and its scope stack.
//!
//! # Design
//!
//! [`Options`] is the one object components receive when they need
//! configuration. It is cheap to clone; all clones share the same registry
//! and scope stack. The internal lock is held only for the duration of a
//! single operation, never across the body of a scope.
//!
//! Scoped overrides come in three shapes:
//! - [`Options::enter`] / [`Options::exit`] - explicit pair
//! - [`Options::option_context`] / [`Options::scoped`] - RAII guard that
//!   exits on drop, including while unwinding from a panic
//! - [`Options::with_overrides`] - run a closure inside a scope
//!
//! # Example
//!
//! ```
//! use optgate::core::options::Options;
//!
//! let options = Options::with_core_options().unwrap();
//! assert!(!options.interactive().unwrap());
//!
//! {
//!     let _scope = options.option_context("interactive", true).unwrap();
//!     assert!(options.interactive().unwrap());
//! }
//!
//! assert!(!options.interactive().unwrap());
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::warn;

use super::config::schema::{GRAPHVIZ_REPR, INTERACTIVE, SQL_DEFAULT_LIMIT, VERBOSE};
use super::config::{
    ConfigError, OptionError, OptionInfo, OptionRegistry, OptionSpec, SettingsFile,
};
use super::scope::{FrameId, ScopeStack};
use super::types::{OptionValue, RowLimit};

#[derive(Debug)]
struct OptionsState {
    registry: OptionRegistry,
    scopes: ScopeStack,
}

/// Shared, cloneable handle to the option registry.
#[derive(Debug, Clone)]
pub struct Options {
    inner: Arc<Mutex<OptionsState>>,
}

impl Options {
    /// Wrap an initialized registry.
    pub fn new(registry: OptionRegistry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(OptionsState {
                registry,
                scopes: ScopeStack::new(),
            })),
        }
    }

    /// Create a handle over a registry holding the core options.
    pub fn with_core_options() -> Result<Self, OptionError> {
        OptionRegistry::with_core_options().map(Self::new)
    }

    /// Lock the shared state.
    ///
    /// A panic inside a scope body never holds this lock, so a poisoned
    /// mutex still guards consistent state.
    fn state(&self) -> MutexGuard<'_, OptionsState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Registry access
    // =========================================================================

    /// Register an additional option.
    pub fn register(&self, spec: OptionSpec) -> Result<(), OptionError> {
        self.state().registry.register(spec)
    }

    /// Register options under a namespace prefix, all or nothing.
    pub fn register_prefixed(&self, prefix: &str, specs: Vec<OptionSpec>) -> Result<(), OptionError> {
        self.state().registry.register_prefixed(prefix, specs)
    }

    /// Get the effective value of an option.
    pub fn get(&self, path: &str) -> Result<OptionValue, OptionError> {
        self.state().registry.get(path)
    }

    /// Set an option, returning the previous value.
    ///
    /// A value set inside an active scope is discarded when that scope exits.
    pub fn set(&self, path: &str, value: impl Into<OptionValue>) -> Result<OptionValue, OptionError> {
        self.state().registry.set(path, value.into())
    }

    /// Set several options, all or nothing.
    pub fn set_many<I, P, V>(&self, entries: I) -> Result<(), OptionError>
    where
        I: IntoIterator<Item = (P, V)>,
        P: AsRef<str>,
        V: Into<OptionValue>,
    {
        self.state().registry.set_many(entries)
    }

    /// Reset an option to its default.
    pub fn reset(&self, path: &str) -> Result<OptionValue, OptionError> {
        self.state().registry.reset(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.state().registry.contains(path)
    }

    pub fn is_namespace(&self, prefix: &str) -> bool {
        self.state().registry.is_namespace(prefix)
    }

    pub fn describe(&self, path: &str) -> Result<OptionInfo, OptionError> {
        self.state().registry.describe(path)
    }

    pub fn list(&self, prefix: Option<&str>) -> Vec<OptionInfo> {
        self.state().registry.list(prefix)
    }

    /// Apply a settings file, all or nothing.
    pub fn apply_settings(&self, settings: &SettingsFile) -> Result<(), ConfigError> {
        settings.apply(&mut self.state().registry)
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    /// Enter a scope overriding each `(path, value)` pair.
    pub fn enter<I, P, V>(&self, overrides: I) -> Result<FrameId, OptionError>
    where
        I: IntoIterator<Item = (P, V)>,
        P: AsRef<str>,
        V: Into<OptionValue>,
    {
        let mut state = self.state();
        let OptionsState { registry, scopes } = &mut *state;
        scopes.enter(registry, overrides)
    }

    /// Exit the innermost scope.
    ///
    /// # Errors
    ///
    /// Returns [`OptionError::ScopeOrder`] if `id` is not the innermost scope.
    pub fn exit(&self, id: FrameId) -> Result<(), OptionError> {
        let mut state = self.state();
        let OptionsState { registry, scopes } = &mut *state;
        scopes.exit(registry, id)
    }

    /// Number of active scopes.
    pub fn scope_depth(&self) -> usize {
        self.state().scopes.depth()
    }

    /// Override a single option until the returned guard is dropped.
    pub fn option_context(
        &self,
        path: &str,
        value: impl Into<OptionValue>,
    ) -> Result<ScopeGuard, OptionError> {
        self.scoped([(path, value.into())])
    }

    /// Override several options until the returned guard is dropped.
    pub fn scoped<I, P, V>(&self, overrides: I) -> Result<ScopeGuard, OptionError>
    where
        I: IntoIterator<Item = (P, V)>,
        P: AsRef<str>,
        V: Into<OptionValue>,
    {
        let id = self.enter(overrides)?;
        Ok(ScopeGuard {
            options: self.clone(),
            id,
            active: true,
        })
    }

    /// Run `body` with the given overrides in effect.
    ///
    /// The overrides are removed when `body` returns or panics.
    pub fn with_overrides<I, P, V, R>(
        &self,
        overrides: I,
        body: impl FnOnce() -> R,
    ) -> Result<R, OptionError>
    where
        I: IntoIterator<Item = (P, V)>,
        P: AsRef<str>,
        V: Into<OptionValue>,
    {
        let mut guard = self.scoped(overrides)?;
        let result = body();
        guard.exit()?;
        Ok(result)
    }

    // =========================================================================
    // Typed accessors
    // =========================================================================

    fn bool_option(&self, path: &str) -> Result<bool, OptionError> {
        let value = self.get(path)?;
        match value.as_bool() {
            Some(b) => Ok(b),
            None => Err(OptionError::InvalidValue {
                path: path.to_string(),
                value,
                reason: "expected bool".to_string(),
            }),
        }
    }

    /// Whether displaying a deferred expression executes it.
    pub fn interactive(&self) -> Result<bool, OptionError> {
        self.bool_option(INTERACTIVE)
    }

    /// Whether queries are logged before execution.
    pub fn verbose(&self) -> Result<bool, OptionError> {
        self.bool_option(VERBOSE)
    }

    /// Whether non-interactive display also renders a graph.
    pub fn graphviz_repr(&self) -> Result<bool, OptionError> {
        self.bool_option(GRAPHVIZ_REPR)
    }

    /// Row limit for displayed expressions without their own limit.
    pub fn default_limit(&self) -> Result<RowLimit, OptionError> {
        let value = self.get(SQL_DEFAULT_LIMIT)?;
        Ok(RowLimit::from_value(&value)?)
    }
}

/// An active scope that exits when dropped.
#[must_use = "the scope exits as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ScopeGuard {
    options: Options,
    id: FrameId,
    active: bool,
}

impl ScopeGuard {
    /// The frame this guard will exit.
    pub fn id(&self) -> FrameId {
        self.id
    }

    /// Exit the scope now, surfacing ordering errors instead of panicking.
    ///
    /// On [`OptionError::ScopeOrder`] the guard stays active, so it can be
    /// exited again (or dropped) once the inner scopes are gone. Exiting an
    /// already exited guard does nothing.
    pub fn exit(&mut self) -> Result<(), OptionError> {
        if !self.active {
            return Ok(());
        }
        self.options.exit(self.id)?;
        self.active = false;
        Ok(())
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(e) = self.options.exit(self.id) {
            if std::thread::panicking() {
                warn!(frame = %self.id, "failed to restore options while unwinding: {}", e);
            } else {
                panic!("failed to restore options: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn options() -> Options {
        Options::with_core_options().unwrap()
    }

    #[test]
    fn clones_share_state() {
        let a = options();
        let b = a.clone();
        a.set(INTERACTIVE, true).unwrap();
        assert!(b.interactive().unwrap());
    }

    #[test]
    fn guard_restores_on_drop() {
        let options = options();
        {
            let _guard = options
                .scoped([
                    (INTERACTIVE, OptionValue::Bool(true)),
                    (SQL_DEFAULT_LIMIT, OptionValue::None),
                ])
                .unwrap();
            assert!(options.interactive().unwrap());
            assert_eq!(options.default_limit().unwrap(), RowLimit::Unlimited);
            assert_eq!(options.scope_depth(), 1);
        }
        assert!(!options.interactive().unwrap());
        assert_eq!(options.default_limit().unwrap(), RowLimit::Rows(10_000));
        assert_eq!(options.scope_depth(), 0);
    }

    #[test]
    fn guard_restores_on_panic() {
        let options = options();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _guard = options.option_context(INTERACTIVE, true).unwrap();
            panic!("body failed");
        }));
        assert!(result.is_err());
        assert!(!options.interactive().unwrap());
        assert_eq!(options.scope_depth(), 0);
    }

    #[test]
    fn nested_guards_restore_in_order() {
        let options = options();
        let mut outer = options.option_context(SQL_DEFAULT_LIMIT, 50).unwrap();
        {
            let _inner = options.option_context(SQL_DEFAULT_LIMIT, 5).unwrap();
            assert_eq!(options.default_limit().unwrap(), RowLimit::Rows(5));
        }
        assert_eq!(options.default_limit().unwrap(), RowLimit::Rows(50));
        outer.exit().unwrap();
        assert_eq!(options.default_limit().unwrap(), RowLimit::Rows(10_000));
    }

    #[test]
    fn explicit_exit_out_of_order_errors() {
        let options = options();
        let mut outer = options.option_context(INTERACTIVE, true).unwrap();
        let mut inner = options.option_context(GRAPHVIZ_REPR, true).unwrap();

        let err = outer.exit().unwrap_err();
        assert!(matches!(err, OptionError::ScopeOrder { .. }));
        assert_eq!(options.scope_depth(), 2);

        // The outer guard is still usable once the inner scope is gone
        inner.exit().unwrap();
        assert!(options.interactive().unwrap());
        outer.exit().unwrap();
        assert_eq!(options.scope_depth(), 0);
        assert!(!options.interactive().unwrap());
        assert!(!options.graphviz_repr().unwrap());

        // Already exited
        outer.exit().unwrap();
        drop(outer);
        assert_eq!(options.scope_depth(), 0);
    }

    #[test]
    fn failed_exit_guard_restores_on_drop() {
        let options = options();
        let mut outer = options.option_context(INTERACTIVE, true).unwrap();
        let inner = options.option_context(GRAPHVIZ_REPR, true).unwrap();

        assert!(outer.exit().is_err());
        drop(inner);
        drop(outer);
        assert_eq!(options.scope_depth(), 0);
        assert!(!options.interactive().unwrap());
    }

    #[test]
    fn out_of_order_drop_while_unwinding_does_not_abort() {
        let options = options();
        let outer_id = std::cell::Cell::new(None);

        let result = catch_unwind(AssertUnwindSafe(|| {
            let outer = options.option_context(INTERACTIVE, true).unwrap();
            let inner = options.option_context(GRAPHVIZ_REPR, true).unwrap();
            outer_id.set(Some(outer.id()));
            // Tuple fields drop first to last: outer before inner
            let _guards = (outer, inner);
            panic!("body failed");
        }));

        // The original panic surfaces; the misordered drop only logged
        let payload = result.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"body failed"));

        // Inner restored; outer frame left for explicit cleanup
        assert_eq!(options.scope_depth(), 1);
        assert!(!options.graphviz_repr().unwrap());
        assert!(options.interactive().unwrap());

        options.exit(outer_id.get().unwrap()).unwrap();
        assert_eq!(options.scope_depth(), 0);
        assert!(!options.interactive().unwrap());
    }

    #[test]
    fn dropping_outer_guard_first_panics() {
        let options = options();
        let outer = options.option_context(INTERACTIVE, true).unwrap();
        let inner = options.option_context(GRAPHVIZ_REPR, true).unwrap();

        let result = catch_unwind(AssertUnwindSafe(|| drop(outer)));
        assert!(result.is_err());

        drop(inner);
    }

    #[test]
    fn with_overrides_returns_body_value() {
        let options = options();
        let seen = options
            .with_overrides([(INTERACTIVE, true)], || options.interactive().unwrap())
            .unwrap();
        assert!(seen);
        assert!(!options.interactive().unwrap());
    }

    #[test]
    fn with_overrides_rejects_invalid_value() {
        let options = options();
        let err = options
            .with_overrides([(SQL_DEFAULT_LIMIT, 0)], || ())
            .unwrap_err();
        assert!(matches!(err, OptionError::InvalidValue { .. }));
        assert_eq!(options.scope_depth(), 0);
    }
}
