//! cli
//!
//! Command-line interface layer for optgate.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Build the session: options, settings file, backend
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and hands expressions
//! to the [`crate::engine`] renderer. Option changes made on the command line
//! live in a scope that ends with the command; nothing is persisted.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tracing::debug;

use crate::backend::mock::MockBackend;
use crate::core::config::SettingsFile;
use crate::core::options::Options;
use crate::engine::Renderer;
use crate::ui::output::Verbosity;

/// Flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Explicit settings file, bypassing discovery.
    pub config: Option<PathBuf>,
    pub verbosity: Verbosity,
}

impl Context {
    /// Options with core and backend options registered and the settings
    /// file applied, plus a renderer over the mock backend.
    ///
    /// The backend registers its options before the settings file is
    /// applied, so the file may set them too.
    pub fn session(&self) -> Result<Renderer<MockBackend>> {
        let options = Options::with_core_options().context("Failed to initialize options")?;
        let backend =
            MockBackend::connect(&options).context("Failed to register backend options")?;

        let settings = match &self.config {
            Some(path) => Some(SettingsFile::read(path)?),
            None => SettingsFile::discover()?,
        };
        if let Some(settings) = settings {
            debug!(path = %settings.path.display(), entries = settings.entries.len(), "applying settings");
            options.apply_settings(&settings)?;
        }

        Ok(Renderer::new(options, backend))
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context {
        config: cli.config.clone(),
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };

    commands::dispatch(cli.command, &ctx)
}
