use tracing::debug;

use crate::errors::{SolveError, SolveResult};
use crate::models::assistant::ToolKind;
use crate::models::events::{CodeOutput, StreamEvent};

/// Whether the stream should keep being consumed after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Continue,
    Complete,
}

/// Collects the text of one run, strictly in arrival order
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    buffer: String,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: StreamEvent) -> SolveResult<Progress> {
        match event {
            StreamEvent::TextCreated(text) => {
                debug!(text = %text, "assistant text created");
                self.buffer.push_str(&text);
            }
            StreamEvent::TextDelta(text) => {
                self.buffer.push_str(&text);
            }
            StreamEvent::ToolCallCreated(kind) => {
                debug!(tool = %kind, "assistant tool call created");
            }
            StreamEvent::ToolCallDelta(delta) => {
                if delta.kind != ToolKind::CodeInterpreter {
                    return Ok(Progress::Continue);
                }
                if let Some(input) = delta.input {
                    debug!(input = %input, "code interpreter input");
                    self.buffer.push_str(&input);
                }
                for output in delta.outputs {
                    if let CodeOutput::Logs(logs) = output {
                        debug!(logs = %logs, "code interpreter output");
                        self.buffer.push_str(&logs);
                    }
                }
            }
            StreamEvent::End => return Ok(Progress::Complete),
            StreamEvent::Error(message) => return Err(SolveError::Stream(message)),
        }
        Ok(Progress::Continue)
    }

    pub fn into_response(self) -> String {
        self.buffer
    }
}
