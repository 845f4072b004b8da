//! core
//!
//! Core domain types and the scoped option store.
//!
//! # Modules
//!
//! - [`types`] - Strong types: OptionPath, OptionValue, RowLimit
//! - [`config`] - Option registry, built-in schema, settings files
//! - [`scope`] - Nested LIFO override frames
//! - [`options`] - Shared handle combining registry and scopes
//!
//! # Design Principles
//!
//! - Every path is registered before it is read or written
//! - Every stored value satisfies its node's validator
//! - Scopes restore exactly what they replaced, innermost first

pub mod config;
pub mod options;
pub mod scope;
pub mod types;
