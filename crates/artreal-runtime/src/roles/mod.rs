//! The two cooperating roles.
//!
//! Both roles share the request/response plumbing in [`Role`]; they differ in
//! capability. The [`Planner`] is text-only and never sees tool traffic. The
//! [`Executor`] is offered the tool schemas and may chain several model calls
//! per activation.

pub mod context;

use artreal_core::{RoleId, ToolDefinition, Turn, TurnBody};
use artreal_llm::chat::types::ChatMessage;
use artreal_llm::{CompletionRequest, CompletionResponse};

pub use context::BufferedContext;

/// Shared behavior of a conversation role.
///
/// Roles only shape requests and responses; the orchestrator makes the
/// model call without holding the conversation lock.
pub trait Role: Send + Sync {
    /// Which role this is.
    fn id(&self) -> RoleId;

    /// Whether tool schemas are offered to this role.
    fn can_call_tools(&self) -> bool;

    /// Model calls this role may chain in one activation.
    fn max_model_calls(&self) -> usize;

    /// System prompt sent first on every request.
    fn system_prompt(&self) -> &str;

    /// The role's buffered memory.
    fn context(&self) -> &BufferedContext;

    /// Mutable access to the role's buffered memory.
    fn context_mut(&mut self) -> &mut BufferedContext;

    /// Whether `turn` belongs in this role's memory.
    fn observes(&self, turn: &Turn) -> bool {
        self.can_call_tools() || matches!(turn.body, TurnBody::Text { .. })
    }

    /// Record a turn emitted by anyone in the conversation.
    fn observe(&mut self, turn: &Turn) {
        if self.observes(turn) {
            self.context_mut().push(turn.clone());
        }
    }

    /// Replace memory wholesale, filtering what this role would not have seen.
    fn restore(&mut self, turns: Vec<Turn>) {
        let kept: Vec<Turn> = turns.into_iter().filter(|t| self.observes(t)).collect();
        self.context_mut().replace(kept);
    }

    /// Build the next completion request from memory.
    fn build_request(&self, tools: &[ToolDefinition]) -> CompletionRequest {
        let mut messages = vec![ChatMessage::system(self.system_prompt())];
        messages.extend(self.context().to_messages(self.id()));
        CompletionRequest {
            messages,
            tools: if self.can_call_tools() {
                tools.to_vec()
            } else {
                Vec::new()
            },
        }
    }

    /// Convert a completion into a turn. This is the only place where the
    /// control signal is derived from model text.
    fn to_turn(&self, response: CompletionResponse) -> Turn {
        if self.can_call_tools() && !response.tool_calls.is_empty() {
            Turn::tool_calls(self.id(), response.tool_calls, response.text)
        } else {
            Turn::role_text(self.id(), response.text.unwrap_or_default())
        }
    }
}

/// Text-only role that decomposes the task and reviews progress.
#[derive(Clone, Debug)]
pub struct Planner {
    prompt: String,
    context: BufferedContext,
}

impl Planner {
    /// Planner with the given system prompt and buffer size.
    pub fn new(prompt: impl Into<String>, buffer_size: usize) -> Self {
        Self {
            prompt: prompt.into(),
            context: BufferedContext::new(buffer_size),
        }
    }
}

impl Role for Planner {
    fn id(&self) -> RoleId {
        RoleId::Planner
    }

    fn can_call_tools(&self) -> bool {
        false
    }

    fn max_model_calls(&self) -> usize {
        1
    }

    fn system_prompt(&self) -> &str {
        &self.prompt
    }

    fn context(&self) -> &BufferedContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut BufferedContext {
        &mut self.context
    }
}

/// Tool-capable role that carries out subtasks.
#[derive(Clone, Debug)]
pub struct Executor {
    prompt: String,
    context: BufferedContext,
    tool_iterations: usize,
}

impl Executor {
    /// Executor with the given prompt, buffer size, and model-call budget.
    pub fn new(prompt: impl Into<String>, buffer_size: usize, tool_iterations: usize) -> Self {
        Self {
            prompt: prompt.into(),
            context: BufferedContext::new(buffer_size),
            tool_iterations: tool_iterations.max(1),
        }
    }
}

impl Role for Executor {
    fn id(&self) -> RoleId {
        RoleId::Executor
    }

    fn can_call_tools(&self) -> bool {
        true
    }

    fn max_model_calls(&self) -> usize {
        self.tool_iterations
    }

    fn system_prompt(&self) -> &str {
        &self.prompt
    }

    fn context(&self) -> &BufferedContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut BufferedContext {
        &mut self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artreal_core::tools::ToolParameterSchema;
    use artreal_core::{ControlSignal, ToolCall, ToolResult, TurnKind};
    use artreal_llm::chat::types::ChatRole;

    fn tool_def() -> ToolDefinition {
        ToolDefinition {
            name: "write_file".into(),
            description: "Write a file".into(),
            parameters: ToolParameterSchema::object(serde_json::Map::new(), &[]),
        }
    }

    fn tool_exchange() -> (Turn, Turn) {
        let calls = Turn::tool_calls(
            RoleId::Executor,
            vec![ToolCall {
                id: "c1".into(),
                name: "write_file".into(),
                arguments: "{}".into(),
            }],
            None,
        );
        let results = Turn::tool_results(vec![ToolResult {
            call_id: "c1".into(),
            name: "write_file".into(),
            content: "ok".into(),
            is_error: false,
        }]);
        (calls, results)
    }

    #[test]
    fn planner_never_sees_tool_traffic() {
        let mut planner = Planner::new("plan", 10);
        let (calls, results) = tool_exchange();
        planner.observe(&Turn::user("build"));
        planner.observe(&calls);
        planner.observe(&results);
        planner.observe(&Turn::role_text(RoleId::Executor, "SUBTASK_DONE"));
        assert_eq!(planner.context().len(), 2);
    }

    #[test]
    fn executor_sees_everything() {
        let mut executor = Executor::new("exec", 10, 3);
        let (calls, results) = tool_exchange();
        executor.observe(&Turn::user("build"));
        executor.observe(&calls);
        executor.observe(&results);
        assert_eq!(executor.context().len(), 3);
    }

    #[test]
    fn only_executor_is_offered_tools() {
        let tools = vec![tool_def()];
        let planner = Planner::new("plan", 10);
        let executor = Executor::new("exec", 10, 3);

        let request = planner.build_request(&tools);
        assert!(request.tools.is_empty());
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert_eq!(request.messages[0].content.as_deref(), Some("plan"));

        assert_eq!(executor.build_request(&tools).tools.len(), 1);
    }

    #[test]
    fn planner_drops_stray_tool_calls() {
        let planner = Planner::new("plan", 10);
        let turn = planner.to_turn(CompletionResponse {
            text: Some("All subtasks complete. TERMINATE".into()),
            tool_calls: vec![ToolCall {
                id: "x".into(),
                name: "write_file".into(),
                arguments: "{}".into(),
            }],
            ..CompletionResponse::default()
        });
        assert_eq!(turn.kind(), TurnKind::Text);
        assert_eq!(turn.signal, ControlSignal::Terminate);
    }

    #[test]
    fn restore_filters_per_role() {
        let (calls, results) = tool_exchange();
        let history = vec![Turn::user("build"), calls, results];
        let mut planner = Planner::new("plan", 10);
        planner.restore(history.clone());
        assert_eq!(planner.context().len(), 1);

        let mut executor = Executor::new("exec", 2, 3);
        executor.restore(history);
        // Capacity 2 keeps the call/result pair.
        assert_eq!(executor.context().len(), 2);
    }
}
