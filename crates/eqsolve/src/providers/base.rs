use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::models::assistant::{Assistant, AssistantSpec};
use crate::models::events::StreamEvent;
use crate::models::thread::{NewMessage, Thread, ThreadMessage};

/// Lazy, finite sequence of run events. It cannot be restarted once consumed.
pub type EventStream = BoxStream<'static, Result<StreamEvent>>;

/// Base trait for assistant services (OpenAI Assistants, test doubles)
#[async_trait]
pub trait AssistantProvider: Send + Sync {
    /// Provision a remote assistant from the spec
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<Assistant>;

    /// Provision a new, empty thread
    async fn create_thread(&self) -> Result<Thread>;

    /// Append a message to an existing thread
    async fn create_message(&self, thread_id: &str, message: &NewMessage)
        -> Result<ThreadMessage>;

    /// Start a run of the assistant against the thread and stream its events
    async fn stream_run(&self, thread_id: &str, assistant_id: &str) -> Result<EventStream>;
}
