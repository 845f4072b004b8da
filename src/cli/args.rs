//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Read settings from this file instead of searching
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Results only

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};

use crate::core::types::OptionValue;
use crate::expr::Expr;

/// optgate - scoped options and a gated display of deferred queries
#[derive(Parser, Debug)]
#[command(name = "optgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file to read instead of the standard locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Results only; no headers or warnings
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect registered options
    #[command(
        name = "options",
        after_help = "\
EXAMPLES:
    # Everything, with overridden values marked
    optgate options list

    # Only the sql namespace, as JSON
    optgate options list sql --json

    # One value
    optgate options get sql.default_limit"
    )]
    Options {
        #[command(subcommand)]
        action: OptionsAction,
    },

    /// Display an expression, executing it when interactive
    #[command(
        name = "render",
        long_about = "Display a deferred expression against the mock backend.\n\n\
            With interactive=false (the default) only the expression structure is \
            printed and nothing is executed. With interactive=true the expression is \
            compiled with its own limit, or sql.default_limit, and executed.",
        after_help = "\
EXAMPLES:
    # Structure only
    optgate render functional_alltypes

    # Execute with the default row limit
    optgate render functional_alltypes --set interactive=true

    # Execute without any limit
    optgate render functional_alltypes --sum bigint_col \\
        --set interactive=true --set sql.default_limit=none

    # Graph bytes instead of text
    optgate render functional_alltypes --set graphviz_repr=true --png"
    )]
    Render {
        #[command(flatten)]
        query: QueryArgs,

        /// Override an option for this command only
        #[arg(long = "set", value_name = "PATH=VALUE", value_parser = parse_override)]
        overrides: Vec<(String, OptionValue)>,

        /// Write the graphical representation to stdout instead of text
        #[arg(long)]
        png: bool,
    },

    /// Print the query an expression compiles to, without executing it
    #[command(name = "compile")]
    Compile {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash (add to ~/.bashrc)
    optgate completion bash >> ~/.bashrc

    # Zsh
    optgate completion zsh > ~/.zfunc/_optgate"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum OptionsAction {
    /// List options, optionally under a namespace
    List {
        /// Namespace prefix such as `sql`
        prefix: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print an option's current value
    Get {
        /// Dotted option path
        path: String,
    },
    /// Show an option's value, default and description
    Describe {
        /// Dotted option path
        path: String,
    },
}

/// Expression built from command-line selectors.
#[derive(Args, Debug, Clone)]
#[command(group(
    ArgGroup::new("operation").args(["sum", "value_counts", "topk", "histogram"])
))]
pub struct QueryArgs {
    /// Table to read
    pub table: String,

    /// Drop rows whose column holds one of the values
    #[arg(long, value_name = "COL=V1,V2", value_parser = parse_not_in)]
    pub not_in: Option<(String, Vec<String>)>,

    /// Sum a column
    #[arg(long, value_name = "COL")]
    pub sum: Option<String>,

    /// Count rows per distinct value of a column
    #[arg(long, value_name = "COL")]
    pub value_counts: Option<String>,

    /// Most frequent values of a column
    #[arg(long, num_args = 2, value_names = ["COL", "K"])]
    pub topk: Option<Vec<String>>,

    /// Equal-width histogram counts of a column
    #[arg(long, num_args = 2, value_names = ["COL", "BINS"])]
    pub histogram: Option<Vec<String>>,

    /// Limit placed on the expression itself
    #[arg(long, value_name = "N")]
    pub limit: Option<u64>,
}

impl QueryArgs {
    /// Build the expression these selectors describe.
    pub fn to_expr(&self) -> Result<Expr> {
        let mut expr = Expr::table(&self.table);

        if let Some((column, values)) = &self.not_in {
            expr = expr.not_in(column, values.iter().cloned());
        }

        if let Some(column) = &self.sum {
            expr = expr.sum(column);
        } else if let Some(column) = &self.value_counts {
            expr = expr.value_counts(column);
        } else if let Some(pair) = &self.topk {
            let (column, k) = column_and_count(pair, "--topk")?;
            expr = expr.topk(column, k);
        } else if let Some(pair) = &self.histogram {
            let (column, bins) = column_and_count(pair, "--histogram")?;
            let bins = u32::try_from(bins).context("--histogram BINS is too large")?;
            expr = expr.histogram_counts(column, bins);
        }

        if let Some(n) = self.limit {
            expr = expr.limit(n);
        }

        Ok(expr)
    }
}

fn column_and_count<'a>(pair: &'a [String], flag: &str) -> Result<(&'a str, u64)> {
    let [column, count] = pair else {
        bail!("{flag} takes a column and a count");
    };
    let count = count
        .parse::<u64>()
        .with_context(|| format!("{flag}: '{count}' is not a non-negative integer"))?;
    Ok((column.as_str(), count))
}

/// Parse `path=value` for `--set`.
fn parse_override(raw: &str) -> Result<(String, OptionValue), String> {
    let (path, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PATH=VALUE, got '{raw}'"))?;
    if path.is_empty() {
        return Err(format!("missing option path in '{raw}'"));
    }
    Ok((path.to_string(), OptionValue::parse(value)))
}

/// Parse `column=v1,v2` for `--not-in`.
fn parse_not_in(raw: &str) -> Result<(String, Vec<String>), String> {
    let (column, values) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected COL=V1,V2, got '{raw}'"))?;
    if column.is_empty() {
        return Err(format!("missing column in '{raw}'"));
    }
    let values = values
        .split(',')
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    Ok((column.to_string(), values))
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
