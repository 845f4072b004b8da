//! engine
//!
//! The execution gate: displaying a deferred expression either shows its
//! structure or compiles and runs it, depending on the active options.
//!
//! # Architecture
//!
//! ```text
//! Options -> DisplaySettings -> gate (pure plan) -> Renderer (backend calls)
//! ```
//!
//! - [`gate`] - Pure decisions: display plan, effective limit, graph rule
//! - [`render`] - Executes plans against a [`crate::backend::Backend`]
//!
//! # Invariants
//!
//! - Nothing is executed while `interactive` is false, except through
//!   [`Renderer::execute`]
//! - Compile-only requests never execute
//! - Only interactive textual display tolerates unsupported expressions

pub mod gate;
pub mod render;

pub use gate::{
    effective_limit, plan_display, plan_graph, DisplayPlan, DisplaySettings, GateError,
    LimitChoice,
};
pub use render::{Renderer, Representation};
