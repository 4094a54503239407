//! Parameter validation and path guards.

use artreal_core::ToolOutput;
use artreal_core::tools::error_result;
use serde_json::Value;

/// File names that hold the agent's own session state.
pub const AGENT_STATE_FILES: [&str; 2] = [".agent_state.json", "agent_state.json"];

/// Read the first present string parameter among `keys`.
///
/// Returns an error result naming the primary key when none is present.
pub fn required_string(params: &Value, keys: &[&str], description: &str) -> Result<String, ToolOutput> {
    for key in keys {
        match params.get(*key) {
            Some(Value::String(s)) => return Ok(s.clone()),
            Some(Value::Null) | None => {}
            Some(_) => {
                return Err(error_result(format!(
                    "Invalid type for parameter: {key} (expected string)"
                )));
            }
        }
    }
    let primary = keys.first().copied().unwrap_or("value");
    Err(error_result(format!(
        "Missing required parameter: {primary} ({description})"
    )))
}

/// Whether a path names an agent state file.
pub fn is_agent_state_file(path: &str) -> bool {
    AGENT_STATE_FILES.iter().any(|name| path.contains(name))
}

/// Error result for a blocked state-file access.
pub fn state_file_blocked(path: &str, action: &str) -> ToolOutput {
    error_result(format!(
        "FILE BLOCKED: {path}\n\nAgent state files ({}) are internal session memory, \
         not part of the project, and must not be {action}.",
        AGENT_STATE_FILES.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_matching_key_wins() {
        let params = json!({"file_path": "b.txt", "target_file": "a.txt"});
        assert_eq!(
            required_string(&params, &["target_file", "file_path"], "path").unwrap(),
            "a.txt"
        );
        let params = json!({"file_path": "b.txt"});
        assert_eq!(
            required_string(&params, &["target_file", "file_path"], "path").unwrap(),
            "b.txt"
        );
    }

    #[test]
    fn missing_and_wrong_type() {
        let err = required_string(&json!({}), &["target_file"], "path to the file").unwrap_err();
        assert!(err.is_error);
        assert!(err.content.contains("target_file"));

        let err = required_string(&json!({"target_file": 3}), &["target_file"], "path").unwrap_err();
        assert!(err.content.contains("expected string"));
    }

    #[test]
    fn state_file_detection() {
        assert!(is_agent_state_file(".agent_state.json"));
        assert!(is_agent_state_file("sub/agent_state.json"));
        assert!(!is_agent_state_file("src/state.json"));
        assert!(state_file_blocked(".agent_state.json", "written").is_error);
    }
}
