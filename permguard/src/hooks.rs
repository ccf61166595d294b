use std::io::{Read, Write};

use claude_policy::PermissionRule;
use serde::{Deserialize, Serialize};

/// The hook input received from Claude Code via stdin.
///
/// Every field defaults so partial payloads still parse.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolUseHookInput {
    pub session_id: String,
    pub transcript_path: String,
    pub cwd: String,
    pub permission_mode: String,
    pub hook_event_name: String,
    pub tool_name: String,
    pub tool_input: serde_json::Value,
    pub tool_use_id: String,
}

impl ToolUseHookInput {
    /// Parse one hook payload from `reader`
    pub fn from_reader(reader: impl Read) -> anyhow::Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Get typed tool input based on tool_name
    pub fn typed_tool_input(&self) -> ToolInput {
        fn parse<T: for<'de> Deserialize<'de>>(
            value: &serde_json::Value,
            wrap: fn(T) -> ToolInput,
        ) -> ToolInput {
            serde_json::from_value(value.clone())
                .map(wrap)
                .unwrap_or_else(|_| ToolInput::Unknown(value.clone()))
        }

        let value = &self.tool_input;
        match self.tool_name.as_str() {
            "Bash" => parse(value, ToolInput::Bash),
            "Read" => parse(value, ToolInput::Read),
            "Edit" => parse(value, ToolInput::Edit),
            "Write" => parse(value, ToolInput::Write),
            "NotebookEdit" => parse(value, ToolInput::NotebookEdit),
            "Glob" => parse(value, ToolInput::Glob),
            "Grep" => parse(value, ToolInput::Grep),
            _ => ToolInput::Unknown(value.clone()),
        }
    }
}

/// Tool-specific input variants
#[derive(Debug, Clone)]
pub enum ToolInput {
    Bash(BashInput),
    Read(FileInput),
    Edit(FileInput),
    Write(FileInput),
    NotebookEdit(NotebookInput),
    Glob(SearchInput),
    Grep(SearchInput),
    Unknown(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct BashInput {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// `Read`, `Edit` and `Write` all name their target `file_path`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileInput {
    #[serde(default)]
    pub file_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotebookInput {
    #[serde(default)]
    pub notebook_path: String,
}

/// `Glob` and `Grep`; an absent `path` means the working directory.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchInput {
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub path: Option<String>,
}

/// Hook-specific output for PreToolUse
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreToolUseOutput {
    pub hook_event_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_decision: Option<PermissionRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_decision_reason: Option<String>,
}

/// The complete hook output sent to Claude Code via stdout
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookOutput {
    #[serde(rename = "continue")]
    pub should_continue: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<PreToolUseOutput>,
}

impl HookOutput {
    /// Create a "deny" response - prevents tool execution
    pub fn deny(reason: String) -> Self {
        Self {
            should_continue: true,
            hook_specific_output: Some(PreToolUseOutput {
                hook_event_name: "PreToolUse",
                permission_decision: Some(PermissionRule::Deny),
                permission_decision_reason: Some(reason),
            }),
        }
    }

    /// The decision carried by this output, if any.
    pub fn decision(&self) -> Option<PermissionRule> {
        self.hook_specific_output
            .as_ref()
            .and_then(|o| o.permission_decision)
    }

    /// Write the response as one JSON line
    pub fn write_to(&self, mut writer: impl Write) -> anyhow::Result<()> {
        serde_json::to_writer(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_hook_json() -> &'static str {
        r#"{
            "session_id": "test-session",
            "transcript_path": "/tmp/transcript.jsonl",
            "cwd": "/home/user/project",
            "permission_mode": "default",
            "hook_event_name": "PreToolUse",
            "tool_name": "Bash",
            "tool_input": {"command": "find ~ -name '*.pem'", "timeout": 120000},
            "tool_use_id": "toolu_01ABC"
        }"#
    }

    #[test]
    fn test_parse_hook_input() {
        let input = ToolUseHookInput::from_reader(sample_hook_json().as_bytes()).unwrap();
        assert_eq!(input.session_id, "test-session");
        assert_eq!(input.tool_name, "Bash");
        assert_eq!(input.cwd, "/home/user/project");
    }

    #[test]
    fn test_parse_partial_input() {
        let json = r#"{"tool_name": "Read", "tool_input": {"file_path": "/etc/hosts"}}"#;
        let input = ToolUseHookInput::from_reader(json.as_bytes()).unwrap();
        assert_eq!(input.cwd, "");
        match input.typed_tool_input() {
            ToolInput::Read(read) => assert_eq!(read.file_path, "/etc/hosts"),
            other => panic!("Expected Read input, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ToolUseHookInput::from_reader("not json".as_bytes()).is_err());
    }

    #[test]
    fn test_typed_bash_input() {
        let input = ToolUseHookInput::from_reader(sample_hook_json().as_bytes()).unwrap();
        match input.typed_tool_input() {
            ToolInput::Bash(bash) => assert_eq!(bash.command, "find ~ -name '*.pem'"),
            other => panic!("Expected Bash input, got {:?}", other),
        }
    }

    #[test]
    fn test_typed_search_and_notebook_inputs() {
        let input = ToolUseHookInput {
            tool_name: "Grep".into(),
            tool_input: serde_json::json!({"pattern": "TODO"}),
            ..Default::default()
        };
        match input.typed_tool_input() {
            ToolInput::Grep(grep) => {
                assert_eq!(grep.pattern, "TODO");
                assert_eq!(grep.path, None);
            }
            other => panic!("Expected Grep input, got {:?}", other),
        }

        let input = ToolUseHookInput {
            tool_name: "NotebookEdit".into(),
            tool_input: serde_json::json!({"notebook_path": "/n.ipynb"}),
            ..Default::default()
        };
        assert!(matches!(
            input.typed_tool_input(),
            ToolInput::NotebookEdit(nb) if nb.notebook_path == "/n.ipynb"
        ));
    }

    #[test]
    fn test_unknown_tool_input() {
        let input = ToolUseHookInput {
            tool_name: "WebFetch".into(),
            tool_input: serde_json::json!({"url": "https://x"}),
            ..Default::default()
        };
        assert!(matches!(input.typed_tool_input(), ToolInput::Unknown(_)));
    }

    #[test]
    fn test_output_deny() {
        let output = HookOutput::deny("Dangerous command".into());
        assert_eq!(output.decision(), Some(PermissionRule::Deny));
        let mut buf = Vec::new();
        output.write_to(&mut buf).unwrap();
        assert_eq!(buf.last(), Some(&b'\n'));

        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(json["continue"], true);
        assert_eq!(json["hookSpecificOutput"]["hookEventName"], "PreToolUse");
        assert_eq!(json["hookSpecificOutput"]["permissionDecision"], "deny");
        assert_eq!(
            json["hookSpecificOutput"]["permissionDecisionReason"],
            "Dangerous command"
        );
    }
}
