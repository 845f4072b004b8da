//! backend::mock
//!
//! In-memory backend for deterministic testing and demos.
//!
//! # Design
//!
//! The mock backend compiles expressions to SQL text, records every query it
//! is asked to execute, and returns canned or synthetic results. Failure
//! scenarios can be configured per operation, and graph rendering can be
//! switched off to simulate a missing rendering capability.
//!
//! `TopK` and `HistogramCounts` have no SQL translation here and compile to
//! [`CompileOutcome::Unsupported`].
//!
//! # Example
//!
//! ```
//! use optgate::backend::mock::MockBackend;
//! use optgate::backend::{CompileOutcome, Compiler, Executor};
//! use optgate::expr::Expr;
//!
//! let backend = MockBackend::new();
//! let expr = Expr::table("functional_alltypes");
//!
//! let outcome = backend.compile(&expr, Some(10)).unwrap();
//! assert_eq!(
//!     outcome,
//!     CompileOutcome::Compiled("SELECT *\nFROM functional_alltypes\nLIMIT 10".to_string())
//! );
//!
//! backend.execute("SELECT 1").unwrap();
//! assert_eq!(backend.executed_queries(), vec!["SELECT 1".to_string()]);
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::json;

use super::traits::{
    Backend, BackendError, CompileOutcome, Compiler, Executor, GraphOutcome, GraphRenderer,
    QueryResult,
};
use crate::core::config::schema::is_non_negative;
use crate::core::config::{OptionError, OptionSpec};
use crate::core::options::Options;
use crate::core::types::OptionValue;
use crate::expr::Expr;

/// Table every new mock backend knows about.
pub const DEFAULT_TABLE: &str = "functional_alltypes";

/// Backend name, and the namespace of its options.
pub const BACKEND_NAME: &str = "mock";

/// Option (under `mock.`) holding the number of synthetic result rows.
pub const ROW_COUNT: &str = "row_count";

/// Mock backend for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockBackend {
    inner: Arc<Mutex<MockBackendInner>>,
}

#[derive(Debug)]
struct MockBackendInner {
    tables: BTreeSet<String>,
    /// Canned results keyed by exact query text.
    results: HashMap<String, QueryResult>,
    fail_on: Option<FailOn>,
    graph_available: bool,
    /// Options handle, set by [`MockBackend::connect`].
    options: Option<Options>,
    operations: Vec<MockOperation>,
    executed: Vec<String>,
}

/// Which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    Compile(BackendError),
    Execute(BackendError),
    Render(BackendError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Compile { root: String, limit: Option<u64> },
    Execute { query: String },
    Render { root: String },
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a mock backend knowing only [`DEFAULT_TABLE`].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockBackendInner {
                tables: BTreeSet::from([DEFAULT_TABLE.to_string()]),
                results: HashMap::new(),
                fail_on: None,
                graph_available: true,
                options: None,
                operations: Vec::new(),
                executed: Vec::new(),
            })),
        }
    }

    /// Create a mock backend and register its options.
    ///
    /// The backend keeps the handle to read `mock.row_count` at execution
    /// time.
    pub fn connect(options: &Options) -> Result<Self, OptionError> {
        let backend = Self::new();
        backend.register_options(options)?;
        backend.lock().options = Some(options.clone());
        Ok(backend)
    }

    fn lock(&self) -> MutexGuard<'_, MockBackendInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a known table.
    pub fn with_table(self, name: impl Into<String>) -> Self {
        self.lock().tables.insert(name.into());
        self
    }

    /// Return `result` whenever exactly `query` is executed.
    pub fn with_result(self, query: impl Into<String>, result: QueryResult) -> Self {
        self.lock().results.insert(query.into(), result);
        self
    }

    /// Simulate a missing graph rendering capability.
    pub fn without_graphviz(self) -> Self {
        self.lock().graph_available = false;
        self
    }

    /// Configure the mock to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().fail_on = Some(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.lock().fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Forget recorded operations and executed queries.
    pub fn clear_history(&self) {
        let mut inner = self.lock();
        inner.operations.clear();
        inner.executed.clear();
    }

    fn synthetic_rows(options: Option<&Options>) -> usize {
        options
            .and_then(|o| o.get(&format!("{BACKEND_NAME}.{ROW_COUNT}")).ok())
            .and_then(|v| v.as_int())
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0)
    }
}

impl Compiler for MockBackend {
    fn compile(&self, expr: &Expr, limit: Option<u64>) -> Result<CompileOutcome, BackendError> {
        let tables = {
            let mut inner = self.lock();
            inner.operations.push(MockOperation::Compile {
                root: expr.root_table().to_string(),
                limit,
            });
            if let Some(FailOn::Compile(e)) = &inner.fail_on {
                return Err(e.clone());
            }
            inner.tables.clone()
        };

        let (base, own_limit) = expr.split_limit();
        let limit = limit.or(own_limit);

        match build(&tables, base) {
            Ok(mut select) => {
                if let Some(n) = limit {
                    if select.limit.is_some() {
                        select = select.into_subquery();
                    }
                    select.limit = Some(n);
                }
                Ok(CompileOutcome::Compiled(select.render()))
            }
            Err(BuildError::Unsupported(detail)) => Ok(CompileOutcome::Unsupported(detail)),
            Err(BuildError::Backend(e)) => Err(e),
        }
    }
}

impl Executor for MockBackend {
    fn execute(&self, query: &str) -> Result<QueryResult, BackendError> {
        let (canned, options) = {
            let mut inner = self.lock();
            inner.operations.push(MockOperation::Execute {
                query: query.to_string(),
            });
            inner.executed.push(query.to_string());
            if let Some(FailOn::Execute(e)) = &inner.fail_on {
                return Err(e.clone());
            }
            (inner.results.get(query).cloned(), inner.options.clone())
        };

        if let Some(result) = canned {
            return Ok(result);
        }

        let rows = (0..Self::synthetic_rows(options.as_ref()))
            .map(|i| vec![json!(i)])
            .collect();
        Ok(QueryResult::new(vec!["row".to_string()], rows))
    }

    fn executed_queries(&self) -> Vec<String> {
        self.lock().executed.clone()
    }
}

impl GraphRenderer for MockBackend {
    fn available(&self) -> bool {
        self.lock().graph_available
    }

    fn render(&self, expr: &Expr) -> Result<GraphOutcome, BackendError> {
        {
            let mut inner = self.lock();
            inner.operations.push(MockOperation::Render {
                root: expr.root_table().to_string(),
            });
            if let Some(FailOn::Render(e)) = &inner.fail_on {
                return Err(e.clone());
            }
            if !inner.graph_available {
                return Ok(GraphOutcome::Unavailable);
            }
        }

        Ok(GraphOutcome::Rendered(to_dot(expr).into_bytes()))
    }
}

impl Backend for MockBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn option_specs(&self) -> Vec<OptionSpec> {
        vec![OptionSpec::new(ROW_COUNT, OptionValue::Int(0))
            .with_validator(is_non_negative)
            .with_description("Synthetic rows returned for queries without a canned result")]
    }
}

/// Render an expression chain as a Graphviz digraph.
fn to_dot(expr: &Expr) -> String {
    let nodes = expr.chain();
    let mut dot = String::from("digraph expr {\n");
    for (i, node) in nodes.iter().enumerate() {
        dot.push_str(&format!(
            "  n{i} [label=\"{}\"];\n",
            node.label().replace('"', "\\\"")
        ));
    }
    // Edges point from input to consumer
    for i in 1..nodes.len() {
        dot.push_str(&format!("  n{i} -> n{};\n", i - 1));
    }
    dot.push('}');
    dot
}

enum BuildError {
    Unsupported(String),
    Backend(BackendError),
}

/// A single SELECT statement under construction.
#[derive(Debug)]
struct Select {
    columns: String,
    from: String,
    filters: Vec<String>,
    group_by: Option<String>,
    limit: Option<u64>,
}

impl Select {
    fn star(from: String) -> Self {
        Self {
            columns: "*".to_string(),
            from,
            filters: Vec::new(),
            group_by: None,
            limit: None,
        }
    }

    /// Whether further clauses can be added without changing meaning.
    fn is_open(&self) -> bool {
        self.columns == "*" && self.group_by.is_none() && self.limit.is_none()
    }

    fn into_subquery(self) -> Self {
        let inner = self
            .render()
            .lines()
            .map(|line| format!("  {line}"))
            .collect::<Vec<_>>()
            .join("\n");
        Self::star(format!("(\n{inner}\n) t0"))
    }

    fn render(&self) -> String {
        let mut sql = format!("SELECT {}\nFROM {}", self.columns, self.from);
        if !self.filters.is_empty() {
            sql.push_str(&format!("\nWHERE {}", self.filters.join(" AND ")));
        }
        if let Some(group_by) = &self.group_by {
            sql.push_str(&format!("\nGROUP BY {group_by}"));
        }
        if let Some(n) = self.limit {
            sql.push_str(&format!("\nLIMIT {n}"));
        }
        sql
    }
}

fn open(select: Select) -> Select {
    if select.is_open() {
        select
    } else {
        select.into_subquery()
    }
}

fn build(tables: &BTreeSet<String>, expr: &Expr) -> Result<Select, BuildError> {
    match expr {
        Expr::Table(name) => {
            if !tables.contains(name) {
                return Err(BuildError::Backend(BackendError::TableNotFound(name.clone())));
            }
            Ok(Select::star(name.clone()))
        }
        Expr::Limit { input, n } => {
            let mut select = build(tables, input)?;
            if select.limit.is_some() {
                select = select.into_subquery();
            }
            select.limit = Some(*n);
            Ok(select)
        }
        Expr::NotIn {
            input,
            column,
            values,
        } => {
            let mut select = open(build(tables, input)?);
            let values = values
                .iter()
                .map(|v| format!("'{}'", v.replace('\'', "''")))
                .collect::<Vec<_>>()
                .join(", ");
            select.filters.push(format!("`{column}` NOT IN ({values})"));
            Ok(select)
        }
        Expr::Aggregate {
            input,
            func,
            column,
        } => {
            let mut select = open(build(tables, input)?);
            select.columns = format!(
                "{}(`{column}`) AS `{}`",
                func.sql_name(),
                func.output_name()
            );
            Ok(select)
        }
        Expr::ValueCounts { input, column } => {
            let mut select = open(build(tables, input)?);
            select.columns = format!("`{column}`, count(*) AS `count`");
            select.group_by = Some("1".to_string());
            Ok(select)
        }
        Expr::TopK { input, column, .. } => {
            build(tables, input)?;
            Err(BuildError::Unsupported(format!(
                "TopK on `{column}` has no SQL translation"
            )))
        }
        Expr::HistogramCounts { input, column, .. } => {
            build(tables, input)?;
            Err(BuildError::Unsupported(format!(
                "HistogramCounts on `{column}` has no SQL translation"
            )))
        }
    }
}
