//! engine::render
//!
//! Carries out gating decisions against a backend.
//!
//! # Design
//!
//! A [`Renderer`] pairs an [`Options`] handle with a [`Backend`]. Every call
//! snapshots the gating options first, so a scope entered before the call
//! governs the whole call.
//!
//! | Operation | Compiles | Executes | Reads `graphviz_repr` |
//! |-----------|----------|----------|-----------------------|
//! | [`Renderer::repr`] | when interactive | when interactive | when not interactive |
//! | [`Renderer::compile`] | yes | never | never |
//! | [`Renderer::repr_graph`] | never | never | yes |
//! | [`Renderer::verify`] | yes | never | never |
//! | [`Renderer::execute`] | yes | yes | never |
//!
//! # Example
//!
//! ```
//! use optgate::backend::mock::MockBackend;
//! use optgate::backend::Executor;
//! use optgate::core::options::Options;
//! use optgate::engine::{Renderer, Representation};
//! use optgate::expr::Expr;
//!
//! let options = Options::with_core_options().unwrap();
//! let renderer = Renderer::new(options.clone(), MockBackend::new());
//! let expr = Expr::table("functional_alltypes");
//!
//! let repr = renderer.repr(&expr).unwrap();
//! assert!(matches!(repr, Representation::Structural { .. }));
//! assert!(renderer.backend().executed_queries().is_empty());
//!
//! let _scope = options.option_context("interactive", true).unwrap();
//! let repr = renderer.repr(&expr).unwrap();
//! assert!(matches!(repr, Representation::Executed { .. }));
//! ```

use std::fmt;

use tracing::{debug, info};

use super::gate::{plan_display, plan_graph, DisplayPlan, DisplaySettings, GateError, LimitChoice};
use crate::backend::{Backend, CompileOutcome, GraphOutcome, QueryResult};
use crate::core::options::Options;
use crate::expr::Expr;

/// Outcome of a textual display.
#[derive(Debug, Clone, PartialEq)]
pub enum Representation {
    /// Structure only; nothing was compiled.
    Structural {
        text: String,
        /// Graph bytes, when requested and available.
        graph: Option<Vec<u8>>,
    },
    /// The expression was compiled and executed.
    Executed { query: String, result: QueryResult },
    /// Compilation was unsupported; structure shown instead.
    Fallback { text: String, reason: String },
}

impl Representation {
    /// The executed query, if any.
    pub fn query(&self) -> Option<&str> {
        match self {
            Representation::Executed { query, .. } => Some(query),
            _ => None,
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Representation::Structural { text, .. } | Representation::Fallback { text, .. } => {
                f.write_str(text)
            }
            Representation::Executed { result, .. } => write!(f, "{result}"),
        }
    }
}

/// Gated rendering and execution over one backend.
#[derive(Debug, Clone)]
pub struct Renderer<B> {
    options: Options,
    backend: B,
}

impl<B: Backend> Renderer<B> {
    pub fn new(options: Options, backend: B) -> Self {
        Self { options, backend }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Textual representation of `expr`.
    ///
    /// Non-interactive: structure, plus a graph when `graphviz_repr` is on.
    /// Interactive: compile with the effective limit and execute; an
    /// unsupported expression falls back to its structure.
    pub fn repr(&self, expr: &Expr) -> Result<Representation, GateError> {
        let settings = DisplaySettings::read(&self.options)?;
        let plan = plan_display(&settings, expr);
        debug!(?plan, root = expr.root_table(), "display");

        match plan {
            DisplayPlan::Structural { graph } => {
                let graph = if graph { self.graph_bytes(expr)? } else { None };
                Ok(Representation::Structural {
                    text: expr.to_string(),
                    graph,
                })
            }
            DisplayPlan::Execute { limit } => {
                match self.backend.compile(expr, limit).map_err(GateError::Compile)? {
                    CompileOutcome::Compiled(query) => {
                        let result = self.run(&query)?;
                        Ok(Representation::Executed { query, result })
                    }
                    CompileOutcome::Unsupported(reason) => {
                        debug!(%reason, "unsupported expression, showing structure");
                        Ok(Representation::Fallback {
                            text: expr.to_string(),
                            reason,
                        })
                    }
                }
            }
        }
    }

    /// Query text for `expr`, without executing it.
    pub fn compile(&self, expr: &Expr) -> Result<String, GateError> {
        match self.backend.compile(expr, None).map_err(GateError::Compile)? {
            CompileOutcome::Compiled(query) => Ok(query),
            CompileOutcome::Unsupported(reason) => Err(GateError::Unsupported(reason)),
        }
    }

    /// Graphical representation of `expr`.
    ///
    /// `None` when interactive, when `graphviz_repr` is off, or when the
    /// backend cannot render.
    pub fn repr_graph(&self, expr: &Expr) -> Result<Option<Vec<u8>>, GateError> {
        let settings = DisplaySettings::read(&self.options)?;
        if !plan_graph(&settings) {
            return Ok(None);
        }
        self.graph_bytes(expr)
    }

    /// Whether the backend can compile `expr`.
    pub fn verify(&self, expr: &Expr) -> Result<bool, GateError> {
        let outcome = self.backend.compile(expr, None).map_err(GateError::Compile)?;
        Ok(matches!(outcome, CompileOutcome::Compiled(_)))
    }

    /// Compile and execute `expr` regardless of `interactive`.
    pub fn execute(&self, expr: &Expr, limit: LimitChoice) -> Result<QueryResult, GateError> {
        let limit = limit.resolve(expr, self.options.default_limit()?);
        match self.backend.compile(expr, limit).map_err(GateError::Compile)? {
            CompileOutcome::Compiled(query) => self.run(&query),
            CompileOutcome::Unsupported(reason) => Err(GateError::Unsupported(reason)),
        }
    }

    fn run(&self, query: &str) -> Result<QueryResult, GateError> {
        if self.options.verbose()? {
            info!(backend = self.backend.name(), "{}", query);
        }
        self.backend.execute(query).map_err(GateError::Execute)
    }

    fn graph_bytes(&self, expr: &Expr) -> Result<Option<Vec<u8>>, GateError> {
        if !self.backend.available() {
            debug!("graph renderer unavailable");
            return Ok(None);
        }
        match self.backend.render(expr).map_err(GateError::Render)? {
            GraphOutcome::Rendered(bytes) => Ok(Some(bytes)),
            GraphOutcome::Unavailable => Ok(None),
        }
    }
}
