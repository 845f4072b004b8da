//! backend::traits
//!
//! Collaborator traits the execution gate drives.
//!
//! # Design
//!
//! A backend is three capabilities behind one object:
//! - [`Compiler`] - expression plus optional row limit to query text
//! - [`Executor`] - runs query text and keeps a log of what it ran
//! - [`GraphRenderer`] - draws an expression, or reports it cannot
//!
//! The traits are synchronous. Whatever blocking a real backend does is
//! opaque to the gate; there is no timeout, cancellation, or retry here.
//!
//! Compilation distinguishes "this expression has no translation"
//! ([`CompileOutcome::Unsupported`]) from genuine failures
//! ([`BackendError`]). Only the former may be tolerated by the gate.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::core::config::{OptionError, OptionSpec};
use crate::core::options::Options;
use crate::expr::Expr;

/// Errors from backend operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The expression references a table the backend does not know.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// The compiler failed for a reason other than an unsupported operation.
    #[error("compiler error: {0}")]
    Compile(String),

    /// The query failed to run.
    #[error("execution error: {0}")]
    Execution(String),

    /// Graph rendering failed.
    #[error("render error: {0}")]
    Render(String),
}

/// Result of asking a compiler for query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// Query text ready to execute.
    Compiled(String),
    /// The expression uses an operation with no backend translation.
    Unsupported(String),
}

/// Result of asking for a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphOutcome {
    /// Rendered graph bytes.
    Rendered(Vec<u8>),
    /// Rendering capability is not available.
    Unavailable,
}

/// Tabular query result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.columns.join("\t"))?;
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            write!(f, "\n{}", cells.join("\t"))?;
        }
        write!(f, "\n({} rows)", self.rows.len())
    }
}

/// Turns expressions into backend query text.
pub trait Compiler {
    /// Compile `expr`.
    ///
    /// When `limit` is `Some`, it replaces any limit on the outermost node;
    /// when `None`, the expression's own limit (if any) is used.
    fn compile(&self, expr: &Expr, limit: Option<u64>) -> Result<CompileOutcome, BackendError>;
}

/// Runs query text.
pub trait Executor {
    /// Execute a query, appending it to the executed-query log first.
    fn execute(&self, query: &str) -> Result<QueryResult, BackendError>;

    /// Every query executed so far, oldest first.
    fn executed_queries(&self) -> Vec<String>;
}

/// Draws expressions.
pub trait GraphRenderer {
    /// Whether rendering is possible at all.
    fn available(&self) -> bool {
        true
    }

    fn render(&self, expr: &Expr) -> Result<GraphOutcome, BackendError>;
}

/// A complete backend.
pub trait Backend: Compiler + Executor + GraphRenderer {
    /// Backend name, also the namespace of its options.
    fn name(&self) -> &str;

    /// Backend-specific options, relative to [`Backend::name`].
    fn option_specs(&self) -> Vec<OptionSpec> {
        Vec::new()
    }

    /// Register [`Backend::option_specs`] under `<name>.`.
    fn register_options(&self, options: &Options) -> Result<(), OptionError> {
        options.register_prefixed(self.name(), self.option_specs())
    }
}
