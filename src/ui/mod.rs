//! ui
//!
//! User-facing output.
//!
//! # Design
//!
//! Command handlers print through [`output`] so quiet and debug modes behave
//! the same everywhere. Structured logs go through `tracing` instead and are
//! controlled by `RUST_LOG`.

pub mod output;
