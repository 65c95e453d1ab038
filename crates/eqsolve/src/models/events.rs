//! Incremental events emitted while a run executes.
//!
//! A run stream yields zero or more content events and terminates with exactly one
//! `End` or `Error`. Nothing is yielded after a terminal event.

use super::assistant::ToolKind;

/// One output item produced by the code interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum CodeOutput {
    Logs(String),
    Image { file_id: String },
}

/// Incremental data for one tool call of a run step
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallDelta {
    pub index: u32,
    pub kind: ToolKind,
    /// Fragment of the code being written, code interpreter only
    pub input: Option<String>,
    pub outputs: Vec<CodeOutput>,
}

impl ToolCallDelta {
    pub fn code_interpreter(index: u32, input: Option<&str>, outputs: Vec<CodeOutput>) -> Self {
        Self {
            index,
            kind: ToolKind::CodeInterpreter,
            input: input.map(str::to_string),
            outputs,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    TextCreated(String),
    TextDelta(String),
    ToolCallCreated(ToolKind),
    ToolCallDelta(ToolCallDelta),
    End,
    Error(String),
}

impl StreamEvent {
    /// Returns true if this event terminates the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End | Self::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_events() {
        assert!(StreamEvent::End.is_terminal());
        assert!(StreamEvent::Error("boom".into()).is_terminal());
        assert!(!StreamEvent::TextDelta("x".into()).is_terminal());
        assert!(!StreamEvent::ToolCallCreated(ToolKind::CodeInterpreter).is_terminal());
    }
}
