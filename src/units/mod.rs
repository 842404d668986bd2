//! Built-in units
//!
//! Linked into every build so a fresh project has something to discover.

use serde_json::Value;

use crate::dispatch::ExecutionContext;
use crate::registry::catalog;
use crate::unit;

#[unit(
    category = "models",
    description = "Lists every linked unit with its argument schema"
)]
async fn orchestrate_schema(ctx: &ExecutionContext, _args: &[Value]) -> anyhow::Result<()> {
    for entry in catalog::linked_units() {
        let schema = entry.instantiate().args_schema().map(str::to_string);
        tracing::info!(
            project = ctx.project(),
            unit = %entry.qualified_name(),
            description = entry.description,
            schema = schema.as_deref().unwrap_or("none"),
            "Linked unit"
        );
    }
    Ok(())
}

#[unit(
    category = "services",
    description = "Reports the run id and the state of the shared channel"
)]
async fn orchestrate_status(ctx: &ExecutionContext, _args: &[Value]) -> anyhow::Result<()> {
    let channel = ctx.channel();
    anyhow::ensure!(!channel.is_closed(), "shared channel is already closed");
    tracing::info!(
        project = ctx.project(),
        run_id = ctx.run_id(),
        queued = channel.len(),
        capacity = ?channel.capacity(),
        services = ctx.services().len(),
        "Status"
    );
    Ok(())
}

#[unit(
    category = "utils",
    description = "Logs each string argument",
    args_schema = r#"{"type": "array", "items": {"type": "string"}}"#
)]
async fn orchestrate_echo(ctx: &ExecutionContext, args: &[Value]) -> anyhow::Result<()> {
    for arg in args {
        if let Value::String(text) = arg {
            tracing::info!(project = ctx.project(), "{text}");
        }
    }
    Ok(())
}
