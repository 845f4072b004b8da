//! core::scope
//!
//! Nested, strictly LIFO option overrides.
//!
//! # Architecture
//!
//! Entering a scope snapshots the current value of every path it overrides,
//! then applies the new values. Exiting restores the snapshot. Because each
//! frame snapshots the values in effect *when it was entered*, an inner frame
//! that overrides a path already overridden by an outer frame restores the
//! outer frame's value, not the registered default.
//!
//! # Invariants
//!
//! - A frame records each path's prior value exactly once, even if the path
//!   appears several times in one `enter` call (the last value wins)
//! - A failed `enter` leaves the registry untouched and pushes nothing
//! - Only the innermost frame may be exited; anything else is
//!   [`OptionError::ScopeOrder`] and leaves every frame in place
//! - Restoration runs in reverse capture order
//!
//! # Example
//!
//! ```
//! use optgate::core::config::OptionRegistry;
//! use optgate::core::scope::ScopeStack;
//! use optgate::core::types::OptionValue;
//!
//! let mut registry = OptionRegistry::with_core_options().unwrap();
//! let mut scopes = ScopeStack::new();
//!
//! let outer = scopes.enter(&mut registry, [("sql.default_limit", 100)]).unwrap();
//! let inner = scopes.enter(&mut registry, [("sql.default_limit", 5)]).unwrap();
//! assert_eq!(registry.get("sql.default_limit").unwrap(), OptionValue::Int(5));
//!
//! // Out-of-order exit fails loudly
//! assert!(scopes.exit(&mut registry, outer).is_err());
//!
//! scopes.exit(&mut registry, inner).unwrap();
//! assert_eq!(registry.get("sql.default_limit").unwrap(), OptionValue::Int(100));
//!
//! scopes.exit(&mut registry, outer).unwrap();
//! assert_eq!(registry.get("sql.default_limit").unwrap(), OptionValue::Int(10_000));
//! ```

use std::fmt;

use tracing::debug;

use super::config::{OptionError, OptionRegistry};
use super::types::OptionValue;

/// Identifier of an entered scope, used to exit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One entered scope and the values it must put back.
#[derive(Debug)]
struct OverrideFrame {
    id: FrameId,
    restore: Vec<(String, OptionValue)>,
}

/// Stack of active override frames.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<OverrideFrame>,
    next_id: u64,
}

impl ScopeStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a scope, applying `overrides` to `registry`.
    ///
    /// # Errors
    ///
    /// Returns the first [`OptionError`] raised by the registry. Every path
    /// already applied by this call is reverted before returning and no
    /// frame is pushed.
    pub fn enter<I, P, V>(
        &mut self,
        registry: &mut OptionRegistry,
        overrides: I,
    ) -> Result<FrameId, OptionError>
    where
        I: IntoIterator<Item = (P, V)>,
        P: AsRef<str>,
        V: Into<OptionValue>,
    {
        let mut restore: Vec<(String, OptionValue)> = Vec::new();

        for (path, value) in overrides {
            let path = path.as_ref();

            if !restore.iter().any(|(seen, _)| seen == path) {
                match registry.get(path) {
                    Ok(prior) => restore.push((path.to_string(), prior)),
                    Err(e) => {
                        Self::unwind(registry, restore);
                        return Err(e);
                    }
                }
            }

            if let Err(e) = registry.set(path, value.into()) {
                Self::unwind(registry, restore);
                return Err(e);
            }
        }

        self.next_id += 1;
        let id = FrameId(self.next_id);

        debug!(
            frame = %id,
            depth = self.frames.len() + 1,
            paths = ?restore.iter().map(|(p, _)| p.as_str()).collect::<Vec<_>>(),
            "entered option scope"
        );

        self.frames.push(OverrideFrame { id, restore });
        Ok(id)
    }

    /// Exit the innermost scope, restoring the values it replaced.
    ///
    /// # Errors
    ///
    /// Returns [`OptionError::ScopeOrder`] if `id` is not the innermost
    /// scope. Nothing is restored or popped in that case.
    pub fn exit(&mut self, registry: &mut OptionRegistry, id: FrameId) -> Result<(), OptionError> {
        match self.frames.last() {
            Some(top) if top.id == id => {}
            top => {
                return Err(OptionError::ScopeOrder {
                    requested: id,
                    innermost: top.map_or_else(|| "none".to_string(), |f| f.id.to_string()),
                })
            }
        }

        if let Some(frame) = self.frames.pop() {
            Self::unwind(registry, frame.restore);
            debug!(frame = %id, depth = self.frames.len(), "exited option scope");
        }

        Ok(())
    }

    fn unwind(registry: &mut OptionRegistry, restore: Vec<(String, OptionValue)>) {
        for (path, prior) in restore.into_iter().rev() {
            registry.restore(&path, prior);
        }
    }

    /// The innermost active scope.
    pub fn top(&self) -> Option<FrameId> {
        self.frames.last().map(|f| f.id)
    }

    /// Number of active scopes.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether no scope is active.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
