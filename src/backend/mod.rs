//! backend
//!
//! Collaborators the execution gate drives.
//!
//! # Modules
//!
//! - [`traits`] - Compiler, Executor, GraphRenderer and Backend traits
//! - [`mock`] - In-memory backend recording every executed query
//!
//! # Design
//!
//! The gate only ever sees these traits. A backend owns its options under a
//! namespace equal to its name, registered through
//! [`Backend::register_options`].

pub mod mock;
pub mod traits;

pub use traits::{
    Backend, BackendError, CompileOutcome, Compiler, Executor, GraphOutcome, GraphRenderer,
    QueryResult,
};
