//! core::types
//!
//! Strong types for option paths and values.
//!
//! # Types
//!
//! - [`OptionPath`] - Validated dotted option path
//! - [`OptionValue`] - Dynamically typed option value
//! - [`ValueKind`] - The kind of an [`OptionValue`]
//! - [`RowLimit`] - Row limit as understood by the execution gate
//!
//! # Validation
//!
//! Paths are validated at construction time, so a malformed path can never
//! reach the registry. Values are validated by the registry node they are
//! written to, not here.
//!
//! # Examples
//!
//! ```
//! use optgate::core::types::{OptionPath, OptionValue};
//!
//! let path = OptionPath::new("sql.default_limit").unwrap();
//! assert_eq!(path.segments().collect::<Vec<_>>(), vec!["sql", "default_limit"]);
//!
//! assert!(OptionPath::new("sql..default_limit").is_err());
//! assert!(OptionPath::new("").is_err());
//!
//! assert_eq!(OptionValue::parse("none"), OptionValue::None);
//! assert_eq!(OptionValue::parse("42"), OptionValue::Int(42));
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid option path: {0}")]
    InvalidPath(String),

    #[error("invalid row limit: {0}")]
    InvalidLimit(String),
}

/// A validated, dotted option path such as `sql.default_limit`.
///
/// Path rules:
/// - Cannot be empty
/// - Segments are separated by `.` and cannot be empty
/// - Segments contain only ASCII letters, digits, and `_`
/// - Segments cannot start with a digit
///
/// Paths are case-sensitive.
///
/// # Example
///
/// ```
/// use optgate::core::types::OptionPath;
///
/// let path = OptionPath::new("interactive").unwrap();
/// assert_eq!(path.as_str(), "interactive");
/// assert!(path.namespace().is_none());
///
/// let nested = OptionPath::new("sql.default_limit").unwrap();
/// assert_eq!(nested.namespace(), Some("sql"));
/// assert_eq!(nested.leaf(), "default_limit");
///
/// assert!(OptionPath::new("sql.").is_err());
/// assert!(OptionPath::new("1st").is_err());
/// assert!(OptionPath::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OptionPath(String);

impl OptionPath {
    /// Create a new validated option path.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPath` if the path violates the path rules.
    pub fn new(path: impl Into<String>) -> Result<Self, TypeError> {
        let path = path.into();
        Self::validate(&path)?;
        Ok(Self(path))
    }

    /// Join a namespace prefix and a relative path.
    ///
    /// Used to place backend-owned options under the backend's name.
    pub fn join(prefix: &str, rest: &str) -> Result<Self, TypeError> {
        Self::new(format!("{prefix}.{rest}"))
    }

    fn validate(path: &str) -> Result<(), TypeError> {
        if path.is_empty() {
            return Err(TypeError::InvalidPath("path cannot be empty".into()));
        }

        for segment in path.split('.') {
            if segment.is_empty() {
                return Err(TypeError::InvalidPath(format!(
                    "'{path}' has an empty segment"
                )));
            }
            if segment.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(TypeError::InvalidPath(format!(
                    "segment '{segment}' cannot start with a digit"
                )));
            }
            if let Some(c) = segment
                .chars()
                .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
            {
                return Err(TypeError::InvalidPath(format!(
                    "segment '{segment}' cannot contain '{c}'"
                )));
            }
        }

        Ok(())
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the dot-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Everything before the last segment, if the path is nested.
    pub fn namespace(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(ns, _)| ns)
    }

    /// The last segment.
    pub fn leaf(&self) -> &str {
        self.0.rsplit_once('.').map_or(self.0.as_str(), |(_, leaf)| leaf)
    }

    /// Check whether this path lives under `prefix` (segment-wise).
    ///
    /// `sql.default_limit` is under `sql` but not under `sq`.
    pub fn is_under(&self, prefix: &str) -> bool {
        self.0
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
    }
}

impl fmt::Display for OptionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for OptionPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for OptionPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OptionPath {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for OptionPath {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for OptionPath {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<OptionPath> for String {
    fn from(path: OptionPath) -> Self {
        path.0
    }
}

/// The kind of an option value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Str,
    None,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Bool => write!(f, "bool"),
            ValueKind::Int => write!(f, "int"),
            ValueKind::Str => write!(f, "str"),
            ValueKind::None => write!(f, "none"),
        }
    }
}

/// A dynamically typed option value.
///
/// `None` doubles as the "unset" or "unlimited" sentinel, depending on the
/// option. Serializes untagged, so `true`, `500`, `"x"` and `null` map
/// directly onto the variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
    None,
}

impl OptionValue {
    /// Parse a value from its command-line spelling.
    ///
    /// `true`/`false` become booleans, anything that parses as an `i64`
    /// becomes an integer, `none`/`null` become [`OptionValue::None`], and
    /// everything else is kept as a string.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" => OptionValue::Bool(true),
            "false" => OptionValue::Bool(false),
            "none" | "null" => OptionValue::None,
            _ => raw
                .parse::<i64>()
                .map(OptionValue::Int)
                .unwrap_or_else(|_| OptionValue::Str(raw.to_string())),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            OptionValue::Bool(_) => ValueKind::Bool,
            OptionValue::Int(_) => ValueKind::Int,
            OptionValue::Str(_) => ValueKind::Str,
            OptionValue::None => ValueKind::None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, OptionValue::None)
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Int(n) => write!(f, "{n}"),
            OptionValue::Str(s) => write!(f, "{s:?}"),
            OptionValue::None => write!(f, "none"),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(i64::from(value))
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

impl<T: Into<OptionValue>> From<Option<T>> for OptionValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(OptionValue::None, Into::into)
    }
}

/// A row limit for queries issued on display.
///
/// Derived from the `sql.default_limit` option: a positive integer means
/// [`RowLimit::Rows`], `none` means [`RowLimit::Unlimited`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLimit {
    Rows(u64),
    Unlimited,
}

impl RowLimit {
    /// Interpret an option value as a row limit.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidLimit` for anything other than a positive
    /// integer or `none`.
    pub fn from_value(value: &OptionValue) -> Result<Self, TypeError> {
        match value {
            OptionValue::None => Ok(RowLimit::Unlimited),
            OptionValue::Int(n) if *n > 0 => Ok(RowLimit::Rows(*n as u64)),
            other => Err(TypeError::InvalidLimit(format!(
                "expected a positive integer or none, got {other}"
            ))),
        }
    }

    /// The limit as an optional row count, `None` meaning no limit clause.
    pub fn rows(self) -> Option<u64> {
        match self {
            RowLimit::Rows(n) => Some(n),
            RowLimit::Unlimited => None,
        }
    }
}

impl fmt::Display for RowLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowLimit::Rows(n) => write!(f, "{n}"),
            RowLimit::Unlimited => write!(f, "unlimited"),
        }
    }
}
