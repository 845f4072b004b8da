//! core::config::schema
//!
//! Built-in option definitions and the settings file format.
//!
//! # Core Options
//!
//! | Path                | Kind           | Default  |
//! |---------------------|----------------|----------|
//! | `interactive`       | bool           | `false`  |
//! | `verbose`           | bool           | `false`  |
//! | `graphviz_repr`     | bool           | `false`  |
//! | `sql.default_limit` | positive int or none | `10000` |
//!
//! Backends register their own options under their name, e.g.
//! `mock.row_count`.
//!
//! # Settings File
//!
//! ```toml
//! interactive = true
//!
//! [sql]
//! default_limit = "none"
//! ```
//!
//! Nested tables flatten to dotted paths. The string `"none"` stands for the
//! `none` value, which TOML cannot spell directly.

use super::registry::OptionSpec;
use super::ConfigError;
use crate::core::types::OptionValue;

/// Execute deferred expressions when they are displayed.
pub const INTERACTIVE: &str = "interactive";

/// Log every query sent to a backend.
pub const VERBOSE: &str = "verbose";

/// Render a graph of non-interactive expressions.
pub const GRAPHVIZ_REPR: &str = "graphviz_repr";

/// Row limit applied to displayed expressions without an explicit limit.
pub const SQL_DEFAULT_LIMIT: &str = "sql.default_limit";

/// Default value of [`SQL_DEFAULT_LIMIT`].
pub const DEFAULT_ROW_LIMIT: i64 = 10_000;

/// Accepts booleans only.
pub fn is_bool(value: &OptionValue) -> bool {
    value.as_bool().is_some()
}

/// Accepts positive integers and `none`.
pub fn is_row_limit(value: &OptionValue) -> bool {
    value.is_none() || value.as_int().is_some_and(|n| n > 0)
}

/// Accepts integers `>= 0`.
pub fn is_non_negative(value: &OptionValue) -> bool {
    value.as_int().is_some_and(|n| n >= 0)
}

/// The options every registry starts with.
pub fn core_options() -> Vec<OptionSpec> {
    vec![
        OptionSpec::new(INTERACTIVE, false)
            .with_validator(is_bool)
            .with_description("Execute deferred expressions when they are displayed"),
        OptionSpec::new(VERBOSE, false)
            .with_validator(is_bool)
            .with_description("Log every query before it is executed"),
        OptionSpec::new(GRAPHVIZ_REPR, false)
            .with_validator(is_bool)
            .with_description("Render a graph for non-interactive display"),
        OptionSpec::new(SQL_DEFAULT_LIMIT, DEFAULT_ROW_LIMIT)
            .with_validator(is_row_limit)
            .with_description("Rows fetched on display when no limit is set; none for unlimited"),
    ]
}

/// Flatten a parsed settings table into `(path, value)` pairs.
///
/// Pairs come out sorted by key within each table, nested tables
/// depth-first.
pub fn flatten(table: &toml::Table) -> Result<Vec<(String, OptionValue)>, ConfigError> {
    let mut entries = Vec::new();
    flatten_into(None, table, &mut entries)?;
    Ok(entries)
}

fn flatten_into(
    prefix: Option<&str>,
    table: &toml::Table,
    out: &mut Vec<(String, OptionValue)>,
) -> Result<(), ConfigError> {
    for (key, value) in table {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };

        let value = match value {
            toml::Value::Table(nested) => {
                flatten_into(Some(&path), nested, out)?;
                continue;
            }
            toml::Value::Boolean(b) => OptionValue::Bool(*b),
            toml::Value::Integer(n) => OptionValue::Int(*n),
            toml::Value::String(s) if s == "none" => OptionValue::None,
            toml::Value::String(s) => OptionValue::Str(s.clone()),
            other => {
                return Err(ConfigError::UnsupportedValue {
                    path,
                    kind: other.type_str().to_string(),
                })
            }
        };

        out.push((path, value));
    }

    Ok(())
}
