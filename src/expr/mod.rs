//! expr
//!
//! A small deferred-expression model.
//!
//! # Design
//!
//! Expressions describe a computation over a backend table without running
//! it. They are built fluently from a table reference and are immutable once
//! built. Whether and how an expression is compiled is up to the backend; the
//! expression only knows its own structure.
//!
//! The `Display` implementation produces the structural representation: an
//! indented operation tree that never contacts a backend.
//!
//! # Example
//!
//! ```
//! use optgate::expr::Expr;
//!
//! let expr = Expr::table("functional_alltypes").limit(10);
//! assert_eq!(expr.explicit_limit(), Some(10));
//! assert_eq!(expr.root_table(), "functional_alltypes");
//!
//! let text = Expr::table("functional_alltypes").sum("bigint_col").to_string();
//! assert_eq!(text, "Sum(bigint_col)\n  Table: functional_alltypes");
//! ```

use std::fmt;

/// Aggregation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregation {
    Sum,
    Mean,
    Min,
    Max,
    Count,
}

impl Aggregation {
    /// Lower-case SQL function name.
    pub fn sql_name(self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Mean => "avg",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Count => "count",
        }
    }

    /// Column alias for the aggregate's output.
    pub fn output_name(self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Mean => "mean",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Count => "count",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Aggregation::Sum => "Sum",
            Aggregation::Mean => "Mean",
            Aggregation::Min => "Min",
            Aggregation::Max => "Max",
            Aggregation::Count => "Count",
        };
        f.write_str(name)
    }
}

/// A deferred computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A named table.
    Table(String),

    /// At most `n` rows of the input.
    Limit { input: Box<Expr>, n: u64 },

    /// Rows whose `column` is not one of `values`.
    NotIn {
        input: Box<Expr>,
        column: String,
        values: Vec<String>,
    },

    /// A scalar aggregate over one column.
    Aggregate {
        input: Box<Expr>,
        func: Aggregation,
        column: String,
    },

    /// Row count per distinct value of `column`.
    ValueCounts { input: Box<Expr>, column: String },

    /// The `k` most frequent values of `column`.
    TopK {
        input: Box<Expr>,
        column: String,
        k: u64,
    },

    /// Row count per equal-width histogram bucket of `column`.
    HistogramCounts {
        input: Box<Expr>,
        column: String,
        bins: u32,
    },
}

impl Expr {
    /// Reference a table by name.
    pub fn table(name: impl Into<String>) -> Self {
        Expr::Table(name.into())
    }

    pub fn limit(self, n: u64) -> Self {
        Expr::Limit {
            input: Box::new(self),
            n,
        }
    }

    pub fn not_in<I, S>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expr::NotIn {
            input: Box::new(self),
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn aggregate(self, func: Aggregation, column: impl Into<String>) -> Self {
        Expr::Aggregate {
            input: Box::new(self),
            func,
            column: column.into(),
        }
    }

    pub fn sum(self, column: impl Into<String>) -> Self {
        self.aggregate(Aggregation::Sum, column)
    }

    pub fn value_counts(self, column: impl Into<String>) -> Self {
        Expr::ValueCounts {
            input: Box::new(self),
            column: column.into(),
        }
    }

    pub fn topk(self, column: impl Into<String>, k: u64) -> Self {
        Expr::TopK {
            input: Box::new(self),
            column: column.into(),
            k,
        }
    }

    pub fn histogram_counts(self, column: impl Into<String>, bins: u32) -> Self {
        Expr::HistogramCounts {
            input: Box::new(self),
            column: column.into(),
            bins,
        }
    }

    /// The input of this node, if it has one.
    pub fn input(&self) -> Option<&Expr> {
        match self {
            Expr::Table(_) => None,
            Expr::Limit { input, .. }
            | Expr::NotIn { input, .. }
            | Expr::Aggregate { input, .. }
            | Expr::ValueCounts { input, .. }
            | Expr::TopK { input, .. }
            | Expr::HistogramCounts { input, .. } => Some(&**input),
        }
    }

    /// The table at the bottom of the expression.
    pub fn root_table(&self) -> &str {
        match self {
            Expr::Table(name) => name,
            _ => self.input().map_or("", Expr::root_table),
        }
    }

    /// The row limit set on the outermost node, if any.
    pub fn explicit_limit(&self) -> Option<u64> {
        match self {
            Expr::Limit { n, .. } => Some(*n),
            _ => None,
        }
    }

    /// Split off an outermost limit: `(expression without it, limit)`.
    pub fn split_limit(&self) -> (&Expr, Option<u64>) {
        match self {
            Expr::Limit { input, n } => (&**input, Some(*n)),
            _ => (self, None),
        }
    }

    /// One-line label for this node alone.
    pub fn label(&self) -> String {
        match self {
            Expr::Table(name) => format!("Table: {name}"),
            Expr::Limit { n, .. } => format!("Limit[n={n}]"),
            Expr::NotIn { column, values, .. } => {
                let values = values
                    .iter()
                    .map(|v| format!("'{v}'"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Filter[{column} NOT IN ({values})]")
            }
            Expr::Aggregate { func, column, .. } => format!("{func}({column})"),
            Expr::ValueCounts { column, .. } => format!("ValueCounts({column})"),
            Expr::TopK { column, k, .. } => format!("TopK[{column}, k={k}]"),
            Expr::HistogramCounts { column, bins, .. } => {
                format!("HistogramCounts[{column}, bins={bins}]")
            }
        }
    }

    /// Nodes from outermost to the root table.
    pub fn chain(&self) -> Vec<&Expr> {
        let mut nodes = vec![self];
        let mut current = self;
        while let Some(input) = current.input() {
            nodes.push(input);
            current = input;
        }
        nodes
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, node) in self.chain().into_iter().enumerate() {
            if depth > 0 {
                writeln!(f)?;
            }
            write!(f, "{:indent$}{}", "", node.label(), indent = depth * 2)?;
        }
        Ok(())
    }
}
