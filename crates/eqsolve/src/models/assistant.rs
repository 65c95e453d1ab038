use serde::{Deserialize, Serialize};
use std::fmt;

use crate::prompt_template::assistant_instructions;

pub const DEFAULT_ASSISTANT_NAME: &str = "수학 선생님";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// The kind of a tool, either declared on an assistant or reported by a run step
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolKind {
    CodeInterpreter,
    FileSearch,
    Function,
    Other(String),
}

impl ToolKind {
    pub fn as_str(&self) -> &str {
        match self {
            ToolKind::CodeInterpreter => "code_interpreter",
            ToolKind::FileSearch => "file_search",
            ToolKind::Function => "function",
            ToolKind::Other(kind) => kind,
        }
    }
}

impl From<&str> for ToolKind {
    fn from(kind: &str) -> Self {
        match kind {
            "code_interpreter" => ToolKind::CodeInterpreter,
            "file_search" => ToolKind::FileSearch,
            "function" => ToolKind::Function,
            other => ToolKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to provision a remote assistant
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantSpec {
    pub name: String,
    pub instructions: String,
    pub tools: Vec<ToolKind>,
    pub model: String,
}

impl AssistantSpec {
    /// The math tutor persona: fixed instructions with code execution enabled
    pub fn math_tutor<S: Into<String>, M: Into<String>>(name: S, model: M) -> Self {
        Self {
            name: name.into(),
            instructions: assistant_instructions(),
            tools: vec![ToolKind::CodeInterpreter],
            model: model.into(),
        }
    }
}

impl Default for AssistantSpec {
    fn default() -> Self {
        Self::math_tutor(DEFAULT_ASSISTANT_NAME, DEFAULT_MODEL)
    }
}

/// An assistant as created by the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assistant {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub model: String,
}
