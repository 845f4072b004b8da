//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Builds its session from the [`Context`]
//! 2. Calls the engine renderer or the options handle
//! 3. Formats and displays output
//!
//! Handlers return `anyhow::Result`; library errors are wrapped with context
//! describing what the command was doing.

mod completion;
mod options_cmd;
mod render;

pub use completion::completion;
pub use options_cmd::{describe as options_describe, get as options_get, list as options_list};
pub use render::{compile, render};

use anyhow::Result;

use super::args::{Command, OptionsAction};
use super::Context;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Options { action } => match action {
            OptionsAction::List { prefix, json } => options_cmd::list(ctx, prefix.as_deref(), json),
            OptionsAction::Get { path } => options_cmd::get(ctx, &path),
            OptionsAction::Describe { path } => options_cmd::describe(ctx, &path),
        },
        Command::Render {
            query,
            overrides,
            png,
        } => render::render(ctx, &query, &overrides, png),
        Command::Compile { query } => render::compile(ctx, &query),
        Command::Completion { shell } => completion::completion(shell),
    }
}
