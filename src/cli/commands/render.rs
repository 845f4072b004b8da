//! render and compile commands - Display or compile an expression

use std::io::Write;

use anyhow::{Context as _, Result};

use crate::backend::Executor;
use crate::cli::args::QueryArgs;
use crate::cli::Context;
use crate::core::types::OptionValue;
use crate::engine::Representation;
use crate::ui::output;

/// Display an expression under the given overrides.
///
/// The overrides form one scope around the display, so they are gone again
/// once the command finishes. The executed-query log follows the output.
pub fn render(
    ctx: &Context,
    query: &QueryArgs,
    overrides: &[(String, OptionValue)],
    png: bool,
) -> Result<()> {
    let renderer = ctx.session()?;
    let expr = query.to_expr()?;

    let mut scope = renderer
        .options()
        .scoped(overrides.iter().cloned())
        .context("Invalid --set override")?;
    output::debug(format!("entered scope {}", scope.id()), ctx.verbosity);

    if png {
        match renderer.repr_graph(&expr)? {
            Some(bytes) => {
                let mut stdout = std::io::stdout();
                stdout.write_all(&bytes).context("Failed to write graph")?;
                stdout.flush().context("Failed to write graph")?;
            }
            None => output::warn(
                "No graph: requires interactive=false, graphviz_repr=true and a renderer",
                ctx.verbosity,
            ),
        }
    } else {
        let repr = renderer.repr(&expr)?;
        output::result(&repr);
        match &repr {
            Representation::Fallback { reason, .. } => output::warn(reason, ctx.verbosity),
            Representation::Structural {
                graph: Some(bytes), ..
            } => output::debug(format!("graph rendered ({} bytes)", bytes.len()), ctx.verbosity),
            _ => {}
        }
    }

    scope.exit()?;

    let executed = renderer.backend().executed_queries();
    output::print(
        format!("\n-- executed queries: {}", executed.len()),
        ctx.verbosity,
    );
    for query in &executed {
        output::print(format!("{};", query), ctx.verbosity);
    }
    Ok(())
}

/// Print the query text of an expression without executing it.
pub fn compile(ctx: &Context, query: &QueryArgs) -> Result<()> {
    let renderer = ctx.session()?;
    let expr = query.to_expr()?;
    let text = renderer
        .compile(&expr)
        .with_context(|| format!("Failed to compile expression on '{}'", expr.root_table()))?;
    output::result(text);
    Ok(())
}
