//! optgate - scoped options and a gated display of deferred queries
//!
//! optgate keeps a registry of typed, validated settings addressed by dotted
//! paths, lets callers override them for the duration of a scope, and uses
//! them to decide whether displaying a deferred expression should compile and
//! execute it against a backend.
//!
//! # Architecture
//!
//! - [`core`] - Option registry, scope stack, shared `Options` handle
//! - [`expr`] - Deferred expression model
//! - [`backend`] - Compiler, executor and graph renderer traits; mock backend
//! - [`engine`] - The execution gate and renderer
//! - [`cli`] - Command-line interface
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! 1. Every stored option value satisfies its validator
//! 2. Exiting a scope restores exactly the values it replaced
//! 3. Scopes exit in LIFO order or fail loudly
//! 4. Nothing executes on display unless `interactive` is on
//!
//! # Example
//!
//! ```
//! use optgate::backend::mock::MockBackend;
//! use optgate::backend::Executor;
//! use optgate::core::options::Options;
//! use optgate::engine::Renderer;
//! use optgate::expr::Expr;
//!
//! let options = Options::with_core_options().unwrap();
//! let backend = MockBackend::connect(&options).unwrap();
//! let renderer = Renderer::new(options.clone(), backend);
//!
//! let expr = Expr::table("functional_alltypes");
//! options
//!     .with_overrides([("interactive", true)], || renderer.repr(&expr))
//!     .unwrap()
//!     .unwrap();
//!
//! assert_eq!(
//!     renderer.backend().executed_queries(),
//!     vec!["SELECT *\nFROM functional_alltypes\nLIMIT 10000"]
//! );
//! ```

pub mod backend;
pub mod cli;
pub mod core;
pub mod engine;
pub mod expr;
pub mod ui;
