//! core::config
//!
//! The option registry, its built-in schema, and startup settings files.
//!
//! # Overview
//!
//! All settings live in a single [`OptionRegistry`], populated once with
//! [`OptionRegistry::with_core_options`] before first use. Values are
//! resolved in this order (later overrides earlier):
//! 1. Registered defaults
//! 2. Settings file
//! 3. Direct `set` calls and active scopes (see [`crate::core::scope`])
//!
//! # Settings File Locations
//!
//! Searched in order:
//! 1. `$OPTGATE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/optgate/config.toml`
//! 3. `~/.optgate/config.toml`
//!
//! Settings files are only ever read. Nothing is written back.
//!
//! # Example
//!
//! ```
//! use optgate::core::config::{schema, OptionRegistry};
//! use optgate::core::types::OptionValue;
//!
//! let mut registry = OptionRegistry::with_core_options().unwrap();
//! assert_eq!(registry.get(schema::INTERACTIVE).unwrap(), OptionValue::Bool(false));
//!
//! registry.set(schema::SQL_DEFAULT_LIMIT, OptionValue::None).unwrap();
//! ```

pub mod registry;
pub mod schema;

pub use registry::{OptionInfo, OptionRegistry, OptionSpec, Validator};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::scope::FrameId;
use crate::core::types::{OptionValue, TypeError};

/// Errors from the option registry and scope stack.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OptionError {
    /// The path was never registered.
    #[error("unknown option: {0}")]
    UnknownPath(String),

    /// The value failed the option's validator.
    #[error("invalid value {value} for option '{path}': {reason}")]
    InvalidValue {
        path: String,
        value: OptionValue,
        reason: String,
    },

    /// The path was already registered.
    #[error("option already registered: {0}")]
    DuplicatePath(String),

    /// The path would be both a leaf and a namespace.
    #[error("option '{path}' conflicts with existing option '{conflict}'")]
    NamespaceConflict { path: String, conflict: String },

    /// A scope was exited while it was not the innermost one.
    #[error("scope {requested} exited out of order (innermost scope: {innermost})")]
    ScopeOrder {
        requested: FrameId,
        innermost: String,
    },

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Errors from reading settings files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file '{}': {source}", path.display())]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse settings file '{}': {message}", path.display())]
    ParseError { path: PathBuf, message: String },

    #[error("unsupported {kind} value for '{path}'")]
    UnsupportedValue { path: String, kind: String },

    #[error("invalid settings in '{}': {source}", path.display())]
    Invalid { path: PathBuf, source: OptionError },
}

impl OptionRegistry {
    /// Create a registry holding the core options.
    pub fn with_core_options() -> Result<Self, OptionError> {
        let mut registry = Self::new();
        for spec in schema::core_options() {
            registry.register(spec)?;
        }
        Ok(registry)
    }
}

/// A settings file read at startup.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    /// Where the settings were read from.
    pub path: PathBuf,
    /// Flattened `(path, value)` entries, sorted by key within each table.
    pub entries: Vec<(String, OptionValue)>,
}

impl SettingsFile {
    /// Read and parse a settings file.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let table: toml::Table = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            entries: schema::flatten(&table)?,
        })
    }

    /// Find and read the settings file from the standard locations.
    ///
    /// Returns `Ok(None)` if no settings file exists. A missing file is not
    /// an error; defaults are used.
    pub fn discover() -> Result<Option<Self>, ConfigError> {
        match Self::locate() {
            Some(path) => Self::read(&path).map(Some),
            None => Ok(None),
        }
    }

    fn locate() -> Option<PathBuf> {
        // 1. $OPTGATE_CONFIG
        if let Ok(path) = std::env::var("OPTGATE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. $XDG_CONFIG_HOME/optgate/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("optgate/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. ~/.optgate/config.toml
        dirs::home_dir()
            .map(|home| home.join(".optgate/config.toml"))
            .filter(|path| path.exists())
    }

    /// Apply every entry to the registry, all or nothing.
    pub fn apply(&self, registry: &mut OptionRegistry) -> Result<(), ConfigError> {
        registry
            .set_many(self.entries.iter().map(|(p, v)| (p.as_str(), v.clone())))
            .map_err(|source| ConfigError::Invalid {
                path: self.path.clone(),
                source,
            })
    }
}
