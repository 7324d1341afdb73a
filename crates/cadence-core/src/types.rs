use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// WorkflowStep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    Planning,
    Implementation,
    Validation,
    Review,
    Refinement,
    Integration,
}

impl WorkflowStep {
    pub fn all() -> &'static [WorkflowStep] {
        &[
            WorkflowStep::Planning,
            WorkflowStep::Implementation,
            WorkflowStep::Validation,
            WorkflowStep::Review,
            WorkflowStep::Refinement,
            WorkflowStep::Integration,
        ]
    }

    /// Fixed successor mapping. The six steps form a closed cycle;
    /// integration wraps back to planning (which signals sprint rollover,
    /// handled by the advancement controller).
    pub fn next(self) -> WorkflowStep {
        match self {
            WorkflowStep::Planning => WorkflowStep::Implementation,
            WorkflowStep::Implementation => WorkflowStep::Validation,
            WorkflowStep::Validation => WorkflowStep::Review,
            WorkflowStep::Review => WorkflowStep::Refinement,
            WorkflowStep::Refinement => WorkflowStep::Integration,
            WorkflowStep::Integration => WorkflowStep::Planning,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStep::Planning => "planning",
            WorkflowStep::Implementation => "implementation",
            WorkflowStep::Validation => "validation",
            WorkflowStep::Review => "review",
            WorkflowStep::Refinement => "refinement",
            WorkflowStep::Integration => "integration",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkflowStep {
    type Err = crate::error::CadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planning" => Ok(WorkflowStep::Planning),
            "implementation" => Ok(WorkflowStep::Implementation),
            "validation" => Ok(WorkflowStep::Validation),
            "review" => Ok(WorkflowStep::Review),
            "refinement" => Ok(WorkflowStep::Refinement),
            "integration" => Ok(WorkflowStep::Integration),
            _ => Err(crate::error::CadenceError::InvalidStep(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Setup,
    Active,
    Paused,
    Stopped,
    Completed,
    Error,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Setup => "setup",
            ProjectStatus::Active => "active",
            ProjectStatus::Paused => "paused",
            ProjectStatus::Stopped => "stopped",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Error => "error",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = crate::error::CadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "setup" => Ok(ProjectStatus::Setup),
            "active" => Ok(ProjectStatus::Active),
            "paused" => Ok(ProjectStatus::Paused),
            "stopped" => Ok(ProjectStatus::Stopped),
            "completed" => Ok(ProjectStatus::Completed),
            "error" => Ok(ProjectStatus::Error),
            _ => Err(crate::error::CadenceError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tool
// ---------------------------------------------------------------------------

/// Tagged tool identity. Unknown tool names never fail to parse; they land
/// in `Other` and fall through to each step's default-deny.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Tool {
    Read,
    Grep,
    Glob,
    Ls,
    Write,
    Edit,
    MultiEdit,
    Bash,
    TodoWrite,
    Git,
    Other(String),
}

impl Tool {
    pub fn from_name(name: &str) -> Tool {
        match name {
            "Read" => Tool::Read,
            "Grep" => Tool::Grep,
            "Glob" => Tool::Glob,
            "LS" => Tool::Ls,
            "Write" => Tool::Write,
            "Edit" => Tool::Edit,
            "MultiEdit" => Tool::MultiEdit,
            "Bash" => Tool::Bash,
            "TodoWrite" => Tool::TodoWrite,
            "Git" => Tool::Git,
            other => Tool::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Tool::Read => "Read",
            Tool::Grep => "Grep",
            Tool::Glob => "Glob",
            Tool::Ls => "LS",
            Tool::Write => "Write",
            Tool::Edit => "Edit",
            Tool::MultiEdit => "MultiEdit",
            Tool::Bash => "Bash",
            Tool::TodoWrite => "TodoWrite",
            Tool::Git => "Git",
            Tool::Other(name) => name,
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, Tool::Read | Tool::Grep | Tool::Glob | Tool::Ls)
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Tool::Write | Tool::Edit | Tool::MultiEdit)
    }

    pub fn is_exec(&self) -> bool {
        matches!(self, Tool::Bash)
    }

    pub fn is_git(&self) -> bool {
        matches!(self, Tool::Git)
    }

    /// True for names that identify a git-flavored tool without being the
    /// canonical `Git` tool, e.g. MCP git servers. Used by the
    /// step-completion detector.
    pub fn is_git_flavored_name(name: &str) -> bool {
        name.to_ascii_lowercase().contains("git")
    }
}

impl From<String> for Tool {
    fn from(s: String) -> Self {
        Tool::from_name(&s)
    }
}

impl From<Tool> for String {
    fn from(t: Tool) -> Self {
        t.name().to_string()
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// ToolEvent
// ---------------------------------------------------------------------------

/// Tool-specific input parameters. Schemas vary per tool; unknown keys are
/// carried in `extra` rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One tool invocation as reported by the hook layer. `exit_code` is only
/// present on post-check events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolEvent {
    #[serde(default)]
    pub cwd: PathBuf,

    pub tool: Tool,

    #[serde(default)]
    pub input: ToolInput,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl ToolEvent {
    pub fn new(tool: Tool) -> Self {
        Self {
            cwd: PathBuf::new(),
            tool,
            input: ToolInput::default(),
            exit_code: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.input.command = Some(command.into());
        self
    }

    /// Candidate text for emergency-override matching: the command of a
    /// Bash-like invocation, or a `message` field if one is present.
    pub fn command_text(&self) -> Option<&str> {
        if let Some(cmd) = self.input.command.as_deref() {
            return Some(cmd);
        }
        self.input.extra.get("message").and_then(|v| v.as_str())
    }

    /// True when this is a `Bash` invocation whose command runs git.
    pub fn is_git_command(&self) -> bool {
        self.tool == Tool::Bash
            && self
                .input
                .command
                .as_deref()
                .map(|c| {
                    let trimmed = c.trim_start();
                    trimmed == "git" || trimmed.starts_with("git ")
                })
                .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
