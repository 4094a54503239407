//! Executes the executor's tool calls against the registry.
//!
//! Nothing here fails the run: an unknown tool, unparseable arguments, or a
//! tool error all become error results the model reads on its next call.

use std::time::Instant;

use artreal_core::{ToolCall, ToolResult};
use artreal_tools::{ToolContext, ToolRegistry};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

/// Run one call and convert its outcome into a [`ToolResult`].
#[instrument(skip_all, fields(tool_name = %call.name, call_id = %call.id))]
pub async fn execute_tool(
    call: &ToolCall,
    registry: &ToolRegistry,
    project_id: &str,
    working_directory: &str,
    cancel: &CancellationToken,
) -> ToolResult {
    let start = Instant::now();
    let failed = |content: String| ToolResult {
        call_id: call.id.clone(),
        name: call.name.clone(),
        content,
        is_error: true,
    };

    let Some(tool) = registry.get(&call.name) else {
        error!("tool not found");
        return failed(format!("Tool not found: {}", call.name));
    };

    let params: Value = if call.arguments.trim().is_empty() {
        Value::Object(serde_json::Map::new())
    } else {
        match serde_json::from_str(&call.arguments) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "tool arguments are not valid JSON");
                return failed(format!("Invalid arguments for {}: {e}", call.name));
            }
        }
    };

    let ctx = ToolContext {
        tool_call_id: call.id.clone(),
        project_id: project_id.to_owned(),
        working_directory: working_directory.to_owned(),
        cancellation: cancel.clone(),
    };

    match tool.execute(params, &ctx).await {
        Ok(output) => {
            debug!(
                is_error = output.is_error,
                elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                "tool finished"
            );
            ToolResult {
                call_id: call.id.clone(),
                name: call.name.clone(),
                content: output.content,
                is_error: output.is_error,
            }
        }
        Err(e) => {
            warn!(error = %e, category = e.category(), "tool failed");
            failed(format!("Error executing {}: {e}", call.name))
        }
    }
}

/// Run a batch of calls in order.
pub async fn execute_tool_calls(
    calls: &[ToolCall],
    registry: &ToolRegistry,
    project_id: &str,
    working_directory: &str,
    cancel: &CancellationToken,
) -> Vec<ToolResult> {
    let mut results = Vec::with_capacity(calls.len());
    for call in calls {
        results.push(execute_tool(call, registry, project_id, working_directory, cancel).await);
    }
    results
}
