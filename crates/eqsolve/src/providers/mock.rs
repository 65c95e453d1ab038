use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::models::assistant::{Assistant, AssistantSpec};
use crate::models::events::StreamEvent;
use crate::models::thread::{NewMessage, Role, Thread, ThreadMessage};
use crate::providers::base::{AssistantProvider, EventStream};

/// The provider call a `MockProvider` should fail at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Assistant,
    Thread,
    Message,
    Run,
}

/// A mock provider that replays a scripted run stream for testing
pub struct MockProvider {
    events: Vec<Result<StreamEvent, String>>,
    fail_at: Option<FailAt>,
    /// Failures left at `fail_at`; `None` fails every time
    failures_left: Mutex<Option<usize>>,
    hang: bool,
    assistants_created: AtomicUsize,
    messages: Mutex<Vec<NewMessage>>,
}

impl MockProvider {
    /// Create a new mock provider whose runs emit `events` and then close
    pub fn new(events: Vec<StreamEvent>) -> Self {
        Self {
            events: events.into_iter().map(Ok).collect(),
            fail_at: None,
            failures_left: Mutex::new(None),
            hang: false,
            assistants_created: AtomicUsize::new(0),
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Fail the given setup step with a generic error
    pub fn failing_at(mut self, step: FailAt) -> Self {
        self.fail_at = Some(step);
        self
    }

    /// Fail the given setup step `times` times, then let it succeed
    pub fn failing_times(mut self, step: FailAt, times: usize) -> Self {
        self.fail_at = Some(step);
        self.failures_left = Mutex::new(Some(times));
        self
    }

    /// Keep the run stream open forever after the scripted events
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Append a transport failure to the scripted events
    pub fn with_stream_error<S: Into<String>>(mut self, message: S) -> Self {
        self.events.push(Err(message.into()));
        self
    }

    pub fn assistants_created(&self) -> usize {
        self.assistants_created.load(Ordering::SeqCst)
    }

    /// Messages appended to threads so far, oldest first
    pub fn messages(&self) -> Vec<NewMessage> {
        self.messages.lock().unwrap().clone()
    }

    fn check(&self, step: FailAt) -> Result<()> {
        if self.fail_at != Some(step) {
            return Ok(());
        }
        let mut failures_left = self.failures_left.lock().unwrap();
        match failures_left.as_mut() {
            Some(0) => Ok(()),
            Some(left) => {
                *left -= 1;
                Err(anyhow!("mock failure at {:?}", step))
            }
            None => Err(anyhow!("mock failure at {:?}", step)),
        }
    }
}

#[async_trait]
impl AssistantProvider for MockProvider {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<Assistant> {
        self.check(FailAt::Assistant)?;
        let n = self.assistants_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Assistant {
            id: format!("asst_mock_{}", n),
            name: Some(spec.name.clone()),
            model: spec.model.clone(),
        })
    }

    async fn create_thread(&self) -> Result<Thread> {
        self.check(FailAt::Thread)?;
        Ok(Thread {
            id: "thread_mock".to_string(),
        })
    }

    async fn create_message(
        &self,
        thread_id: &str,
        message: &NewMessage,
    ) -> Result<ThreadMessage> {
        self.check(FailAt::Message)?;
        let mut messages = self.messages.lock().unwrap();
        messages.push(message.clone());
        Ok(ThreadMessage {
            id: format!("msg_mock_{}", messages.len()),
            thread_id: thread_id.to_string(),
            role: Role::User,
        })
    }

    async fn stream_run(&self, _thread_id: &str, _assistant_id: &str) -> Result<EventStream> {
        self.check(FailAt::Run)?;
        let scripted = stream::iter(
            self.events
                .clone()
                .into_iter()
                .map(|event| event.map_err(|message| anyhow!(message))),
        );
        if self.hang {
            Ok(scripted.chain(stream::pending()).boxed())
        } else {
            Ok(scripted.boxed())
        }
    }
}
