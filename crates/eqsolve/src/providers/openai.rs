use anyhow::{anyhow, Result};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::time::Duration;

use super::base::{AssistantProvider, EventStream};
use super::configs::OpenAiProviderConfig;
use super::sse::{SseDecoder, SseFrame};
use crate::errors::ProviderError;
use crate::models::assistant::{Assistant, AssistantSpec, ToolKind};
use crate::models::events::{CodeOutput, StreamEvent, ToolCallDelta};
use crate::models::thread::{NewMessage, Thread, ThreadMessage};

const ASSISTANTS_BETA: &str = "assistants=v2";

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
        // No overall timeout: a streamed run stays open for as long as the assistant works
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, config })
    }

    fn api_key(&self) -> Result<&str> {
        match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ProviderError::MissingApiKey.into()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.host.trim_end_matches('/'), path)
    }

    async fn send(
        &self,
        path: &str,
        payload: Value,
        timeout: Option<Duration>,
    ) -> Result<Response> {
        let api_key = self.api_key()?;
        let mut request = self
            .client
            .post(self.url(path))
            .bearer_auth(api_key)
            .header("OpenAI-Beta", ASSISTANTS_BETA)
            .json(&payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::Api {
            status: status.as_u16(),
            message: api_error_message(&body),
        }
        .into())
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, payload: Value) -> Result<T> {
        let response = self
            .send(path, payload, Some(self.config.request_timeout))
            .await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AssistantProvider for OpenAiProvider {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<Assistant> {
        let tools: Vec<Value> = spec
            .tools
            .iter()
            .map(|tool| json!({ "type": tool.as_str() }))
            .collect();

        let payload = json!({
            "name": spec.name,
            "instructions": spec.instructions,
            "tools": tools,
            "model": spec.model,
        });

        self.post("assistants", payload).await
    }

    async fn create_thread(&self) -> Result<Thread> {
        self.post("threads", json!({})).await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        message: &NewMessage,
    ) -> Result<ThreadMessage> {
        self.post(
            &format!("threads/{}/messages", thread_id),
            serde_json::to_value(message)?,
        )
        .await
    }

    async fn stream_run(&self, thread_id: &str, assistant_id: &str) -> Result<EventStream> {
        let payload = json!({
            "assistant_id": assistant_id,
            "stream": true,
        });
        let response = self
            .send(&format!("threads/{}/runs", thread_id), payload, None)
            .await?;

        Ok(run_events(response))
    }
}

/// Turn the SSE body of a streamed run into stream events
fn run_events(response: Response) -> EventStream {
    let mut bytes = Box::pin(response.bytes_stream());

    Box::pin(try_stream! {
        let mut decoder = SseDecoder::new();
        let mut translator = EventTranslator::default();

        while !translator.is_finished() {
            let frames = match bytes.next().await {
                Some(chunk) => decoder.push(&chunk?),
                None => break,
            };
            for frame in frames {
                for event in translator.translate(&frame)? {
                    yield event;
                }
            }
        }

        if !translator.is_finished() {
            if let Some(frame) = decoder.finish() {
                for event in translator.translate(&frame)? {
                    yield event;
                }
            }
        }

        // The body closing without a `done` frame still completes the run
        if !translator.is_finished() {
            yield StreamEvent::End;
        }
    })
}

/// Maps assistant stream frames onto `StreamEvent`s.
///
/// Tool calls are announced with `ToolCallCreated` the first time a run step reports a
/// delta for them. Once a terminal event has been produced every later frame is dropped.
#[derive(Debug, Default)]
pub(crate) struct EventTranslator {
    seen_tool_calls: HashSet<(String, u64)>,
    finished: bool,
}

impl EventTranslator {
    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn translate(&mut self, frame: &SseFrame) -> Result<Vec<StreamEvent>> {
        if self.finished {
            return Ok(Vec::new());
        }

        let event = frame.event.as_deref().unwrap_or_default();
        if event == "done" || frame.data.trim() == "[DONE]" {
            self.finished = true;
            return Ok(vec![StreamEvent::End]);
        }

        let events = match event {
            "thread.message.created" => text_created(&parse_data(frame)?),
            "thread.message.delta" => text_deltas(&parse_data(frame)?),
            "thread.run.step.delta" => self.tool_call_deltas(&parse_data(frame)?),
            "thread.run.failed"
            | "thread.run.cancelled"
            | "thread.run.expired"
            | "thread.run.incomplete" => {
                let data = parse_data(frame)?;
                let message = data["last_error"]["message"]
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("run ended with {}", event));
                vec![StreamEvent::Error(message)]
            }
            "error" => {
                let message = serde_json::from_str::<Value>(&frame.data)
                    .ok()
                    .and_then(|data| {
                        data["error"]["message"]
                            .as_str()
                            .or_else(|| data["message"].as_str())
                            .map(str::to_string)
                    })
                    .unwrap_or_else(|| frame.data.clone());
                vec![StreamEvent::Error(message)]
            }
            _ => Vec::new(),
        };

        if events.iter().any(StreamEvent::is_terminal) {
            self.finished = true;
        }
        Ok(events)
    }

    fn tool_call_deltas(&mut self, data: &Value) -> Vec<StreamEvent> {
        let details = &data["delta"]["step_details"];
        if details["type"] != "tool_calls" {
            return Vec::new();
        }

        let step_id = data["id"].as_str().unwrap_or_default();
        let mut events = Vec::new();
        for call in details["tool_calls"].as_array().into_iter().flatten() {
            let index = call["index"].as_u64().unwrap_or_default();
            let kind = ToolKind::from(call["type"].as_str().unwrap_or_default());

            if self.seen_tool_calls.insert((step_id.to_string(), index)) {
                events.push(StreamEvent::ToolCallCreated(kind.clone()));
            }

            let interpreter = &call["code_interpreter"];
            let outputs = interpreter["outputs"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(code_output)
                .collect();

            events.push(StreamEvent::ToolCallDelta(ToolCallDelta {
                index: index as u32,
                kind,
                input: interpreter["input"].as_str().map(str::to_string),
                outputs,
            }));
        }
        events
    }
}

fn parse_data(frame: &SseFrame) -> Result<Value> {
    serde_json::from_str(&frame.data).map_err(|e| {
        anyhow!(ProviderError::InvalidEvent(format!(
            "{}: {}",
            frame.event.as_deref().unwrap_or("message"),
            e
        )))
    })
}

fn text_created(message: &Value) -> Vec<StreamEvent> {
    message["content"]
        .as_array()
        .into_iter()
        .flatten()
        .filter(|part| part["type"] == "text")
        .map(|part| {
            let text = part["text"]["value"].as_str().unwrap_or_default();
            StreamEvent::TextCreated(text.to_string())
        })
        .collect()
}

fn text_deltas(delta: &Value) -> Vec<StreamEvent> {
    delta["delta"]["content"]
        .as_array()
        .into_iter()
        .flatten()
        .filter(|part| part["type"] == "text")
        .filter_map(|part| part["text"]["value"].as_str())
        .map(|text| StreamEvent::TextDelta(text.to_string()))
        .collect()
}

fn code_output(output: &Value) -> Option<CodeOutput> {
    match output["type"].as_str()? {
        "logs" => Some(CodeOutput::Logs(output["logs"].as_str()?.to_string())),
        "image" => Some(CodeOutput::Image {
            file_id: output["image"]["file_id"].as_str()?.to_string(),
        }),
        _ => None,
    }
}

/// Pull the human readable message out of an API error body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
