//! engine::gate
//!
//! Decides what displaying a deferred expression is allowed to do.
//!
//! # Design
//!
//! Gating is a pure function of a [`DisplaySettings`] snapshot and the
//! expression. It never talks to a backend; [`super::render::Renderer`]
//! carries out the resulting [`DisplayPlan`].
//!
//! ```text
//! START -> NonInteractive -> [GraphAttempt] -> Done
//! START -> Interactive -> CompileAttempt -> Execute -> Done
//!                                        -> Fallback (unsupported) -> Done
//!                                        -> Error
//! ```
//!
//! # Invariants
//!
//! - A non-interactive plan never compiles or executes
//! - An expression's own outermost limit always beats the default limit
//! - An unlimited default omits the limit entirely
//!
//! # Example
//!
//! ```
//! use optgate::core::types::RowLimit;
//! use optgate::engine::gate::{plan_display, DisplayPlan, DisplaySettings};
//! use optgate::expr::Expr;
//!
//! let settings = DisplaySettings {
//!     interactive: true,
//!     graphviz_repr: false,
//!     default_limit: RowLimit::Rows(10_000),
//! };
//!
//! let expr = Expr::table("functional_alltypes").limit(10);
//! assert_eq!(plan_display(&settings, &expr), DisplayPlan::Execute { limit: Some(10) });
//! ```

use thiserror::Error;

use crate::backend::BackendError;
use crate::core::config::OptionError;
use crate::core::options::Options;
use crate::core::types::RowLimit;
use crate::expr::Expr;

/// Errors from gated rendering and execution.
#[derive(Debug, Error)]
pub enum GateError {
    /// Reading a gating option failed.
    #[error(transparent)]
    Options(#[from] OptionError),

    /// The expression has no backend translation.
    ///
    /// Interactive textual rendering tolerates this; every other path
    /// reports it.
    #[error("unsupported expression: {0}")]
    Unsupported(String),

    #[error("compile failed: {0}")]
    Compile(#[source] BackendError),

    #[error("execution failed: {0}")]
    Execute(#[source] BackendError),

    #[error("graph rendering failed: {0}")]
    Render(#[source] BackendError),
}

/// The option values gating depends on, read once per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySettings {
    pub interactive: bool,
    pub graphviz_repr: bool,
    pub default_limit: RowLimit,
}

impl DisplaySettings {
    /// Snapshot the gating options from the effective view.
    pub fn read(options: &Options) -> Result<Self, OptionError> {
        Ok(Self {
            interactive: options.interactive()?,
            graphviz_repr: options.graphviz_repr()?,
            default_limit: options.default_limit()?,
        })
    }
}

/// What a textual display should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayPlan {
    /// Print the structure; optionally attempt a graph too.
    Structural { graph: bool },
    /// Compile with this limit and execute.
    Execute { limit: Option<u64> },
}

/// Caller's row limit for explicit execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LimitChoice {
    /// The expression's own limit, else `sql.default_limit`.
    #[default]
    Default,
    /// No default applied; the expression's own limit still holds.
    Unlimited,
    /// Exactly this many rows, replacing any limit on the expression.
    Rows(u64),
}

impl LimitChoice {
    /// The limit to hand the compiler.
    pub fn resolve(self, expr: &Expr, default: RowLimit) -> Option<u64> {
        match self {
            LimitChoice::Default => effective_limit(expr, default),
            LimitChoice::Unlimited => expr.explicit_limit(),
            LimitChoice::Rows(n) => Some(n),
        }
    }
}

/// Row limit for displaying `expr`: its own limit, else the default.
pub fn effective_limit(expr: &Expr, default: RowLimit) -> Option<u64> {
    expr.explicit_limit().or(default.rows())
}

/// Plan the textual display of `expr`.
pub fn plan_display(settings: &DisplaySettings, expr: &Expr) -> DisplayPlan {
    if settings.interactive {
        DisplayPlan::Execute {
            limit: effective_limit(expr, settings.default_limit),
        }
    } else {
        DisplayPlan::Structural {
            graph: settings.graphviz_repr,
        }
    }
}

/// Whether a graphical display should be attempted at all.
pub fn plan_graph(settings: &DisplaySettings) -> bool {
    !settings.interactive && settings.graphviz_repr
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(interactive: bool, graphviz_repr: bool, default_limit: RowLimit) -> DisplaySettings {
        DisplaySettings {
            interactive,
            graphviz_repr,
            default_limit,
        }
    }

    mod display {
        use super::*;

        #[test]
        fn non_interactive_is_structural() {
            let expr = Expr::table("t");
            assert_eq!(
                plan_display(&settings(false, false, RowLimit::Rows(5)), &expr),
                DisplayPlan::Structural { graph: false }
            );
            assert_eq!(
                plan_display(&settings(false, true, RowLimit::Rows(5)), &expr),
                DisplayPlan::Structural { graph: true }
            );
        }

        #[test]
        fn interactive_uses_default_limit() {
            let expr = Expr::table("t");
            assert_eq!(
                plan_display(&settings(true, true, RowLimit::Rows(10_000)), &expr),
                DisplayPlan::Execute {
                    limit: Some(10_000)
                }
            );
        }

        #[test]
        fn explicit_limit_wins() {
            let expr = Expr::table("t").limit(10);
            assert_eq!(
                plan_display(&settings(true, false, RowLimit::Rows(10_000)), &expr),
                DisplayPlan::Execute { limit: Some(10) }
            );
            assert_eq!(
                plan_display(&settings(true, false, RowLimit::Unlimited), &expr),
                DisplayPlan::Execute { limit: Some(10) }
            );
        }

        #[test]
        fn unlimited_default() {
            let expr = Expr::table("t").sum("x");
            assert_eq!(
                plan_display(&settings(true, false, RowLimit::Unlimited), &expr),
                DisplayPlan::Execute { limit: None }
            );
        }
    }

    mod graph {
        use super::*;

        #[test]
        fn only_when_non_interactive_and_enabled() {
            assert!(plan_graph(&settings(false, true, RowLimit::Unlimited)));
            assert!(!plan_graph(&settings(false, false, RowLimit::Unlimited)));
            assert!(!plan_graph(&settings(true, true, RowLimit::Unlimited)));
        }
    }

    mod limit_choice {
        use super::*;

        #[test]
        fn resolve() {
            let plain = Expr::table("t");
            let limited = Expr::table("t").limit(7);
            let default = RowLimit::Rows(100);

            assert_eq!(LimitChoice::Default.resolve(&plain, default), Some(100));
            assert_eq!(LimitChoice::Default.resolve(&limited, default), Some(7));
            assert_eq!(LimitChoice::Unlimited.resolve(&plain, default), None);
            assert_eq!(LimitChoice::Unlimited.resolve(&limited, default), Some(7));
            assert_eq!(LimitChoice::Rows(3).resolve(&limited, default), Some(3));
        }
    }

    #[test]
    fn settings_read_from_options() {
        let options = Options::with_core_options().unwrap();
        assert_eq!(
            DisplaySettings::read(&options).unwrap(),
            settings(false, false, RowLimit::Rows(10_000))
        );
    }
}
