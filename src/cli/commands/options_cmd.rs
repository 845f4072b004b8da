//! options command - List, get, or describe registered options

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::ui::output;

/// List options, optionally restricted to a namespace.
pub fn list(ctx: &Context, prefix: Option<&str>, json: bool) -> Result<()> {
    let options = ctx.session()?.options().clone();

    if let Some(prefix) = prefix {
        if !options.is_namespace(prefix) && !options.contains(prefix) {
            bail!("No options under '{}'", prefix);
        }
    }

    let infos = options.list(prefix);
    if json {
        let text = serde_json::to_string_pretty(&infos).context("Failed to serialize options")?;
        output::result(text);
    } else {
        output::print("# Options", ctx.verbosity);
        output::result(output::format_options(&infos));
    }
    Ok(())
}

/// Print an option's current value.
pub fn get(ctx: &Context, path: &str) -> Result<()> {
    let options = ctx.session()?.options().clone();
    let value = options
        .get(path)
        .with_context(|| format!("Failed to read option '{}'", path))?;
    output::result(value);
    Ok(())
}

/// Show value, default and description of one option.
pub fn describe(ctx: &Context, path: &str) -> Result<()> {
    let options = ctx.session()?.options().clone();
    let info = options
        .describe(path)
        .with_context(|| format!("Failed to describe option '{}'", path))?;

    output::result(format!("{} = {}", info.path, info.value));
    output::print(format!("  default: {}", info.default), ctx.verbosity);
    if let Some(description) = &info.description {
        output::print(format!("  {}", description), ctx.verbosity);
    }
    Ok(())
}
