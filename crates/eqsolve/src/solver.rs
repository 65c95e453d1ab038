use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::accumulator::{Progress, ResponseAccumulator};
use crate::errors::{SolveError, SolveResult};
use crate::models::assistant::AssistantSpec;
use crate::models::thread::NewMessage;
use crate::prompt_template::equation_message;
use crate::providers::base::{AssistantProvider, EventStream};

pub const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub assistant: AssistantSpec,
    /// Use this existing assistant instead of creating one
    pub assistant_id: Option<String>,
    /// Create the assistant once and share it across requests
    pub reuse_assistant: bool,
    /// `None` waits for the run to end indefinitely
    pub stream_timeout: Option<Duration>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            assistant: AssistantSpec::default(),
            assistant_id: None,
            reuse_assistant: false,
            stream_timeout: Some(DEFAULT_STREAM_TIMEOUT),
        }
    }
}

/// Solver forwards equations to an assistant and collects the streamed answer
pub struct Solver {
    provider: Arc<dyn AssistantProvider>,
    config: SolverConfig,
    cached_assistant: Mutex<Option<String>>,
}

impl Solver {
    pub fn new(provider: Arc<dyn AssistantProvider>, config: SolverConfig) -> Self {
        Self {
            provider,
            config,
            cached_assistant: Mutex::new(None),
        }
    }

    /// Ask the assistant to solve `equation`, returning all text of the run
    ///
    /// Each call gets its own thread and its own buffer. Unless an assistant id is configured
    /// or reuse is enabled, each call also provisions a fresh assistant.
    pub async fn solve(&self, equation: &str) -> SolveResult<String> {
        let assistant_id = self.assistant_id().await?;

        let thread = self.provider.create_thread().await.map_err(setup_error)?;
        debug!(thread_id = %thread.id, "thread created");

        let content = equation_message(equation).map_err(|e| SolveError::Setup(e.to_string()))?;
        self.provider
            .create_message(&thread.id, &NewMessage::user(content))
            .await
            .map_err(setup_error)?;

        // The watchdog covers starting the run as well as draining it
        let run = self.run(&thread.id, &assistant_id);
        match self.config.stream_timeout {
            Some(limit) => timeout(limit, run).await.map_err(|_| {
                warn!(thread_id = %thread.id, "run stream timed out after {:?}", limit);
                SolveError::Timeout(limit)
            })?,
            None => run.await,
        }
    }

    async fn run(&self, thread_id: &str, assistant_id: &str) -> SolveResult<String> {
        let events = self
            .provider
            .stream_run(thread_id, assistant_id)
            .await
            .map_err(setup_error)?;
        accumulate(events).await
    }

    async fn assistant_id(&self) -> SolveResult<String> {
        if let Some(id) = &self.config.assistant_id {
            return Ok(id.clone());
        }
        if !self.config.reuse_assistant {
            return self.create_assistant().await;
        }

        // Held across creation so concurrent first requests share one assistant
        let mut cached = self.cached_assistant.lock().await;
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }
        let id = self.create_assistant().await?;
        *cached = Some(id.clone());
        Ok(id)
    }

    async fn create_assistant(&self) -> SolveResult<String> {
        let assistant = self
            .provider
            .create_assistant(&self.config.assistant)
            .await
            .map_err(setup_error)?;
        debug!(assistant_id = %assistant.id, "assistant created");
        Ok(assistant.id)
    }
}

/// Drain a run stream into one response, stopping at its first terminal event
pub async fn accumulate(mut events: EventStream) -> SolveResult<String> {
    let mut accumulator = ResponseAccumulator::new();
    while let Some(event) = events.next().await {
        let event = event.map_err(|e| SolveError::Stream(format!("{:#}", e)))?;
        if accumulator.apply(event)? == Progress::Complete {
            break;
        }
    }
    Ok(accumulator.into_response())
}

fn setup_error(err: anyhow::Error) -> SolveError {
    SolveError::Setup(format!("{:#}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assistant::ToolKind;
    use crate::models::events::{CodeOutput, StreamEvent, ToolCallDelta};
    use crate::providers::mock::{FailAt, MockProvider};

    fn solver(provider: Arc<MockProvider>, config: SolverConfig) -> Solver {
        Solver::new(provider, config)
    }

    #[tokio::test]
    async fn test_solve_concatenates_text() {
        let provider = Arc::new(MockProvider::new(vec![
            StreamEvent::TextCreated("Let's solve:".into()),
            StreamEvent::TextDelta(" x = 2".into()),
            StreamEvent::End,
        ]));
        let solver = solver(provider.clone(), SolverConfig::default());

        let response = solver.solve("2x + 3 = 7").await.unwrap();

        assert_eq!(response, "Let's solve: x = 2");
        assert_eq!(
            provider.messages(),
            vec![NewMessage::user(
                "저는 방정식을 풀어야해요 `2x + 3 = 7`. 도와줄 수 있나요?"
            )]
        );
    }

    #[tokio::test]
    async fn test_solve_includes_code_and_logs() {
        let provider = Arc::new(MockProvider::new(vec![
            StreamEvent::TextCreated(String::new()),
            StreamEvent::ToolCallCreated(ToolKind::CodeInterpreter),
            StreamEvent::ToolCallDelta(ToolCallDelta::code_interpreter(
                0,
                Some("print(2+2)"),
                vec![],
            )),
            StreamEvent::ToolCallDelta(ToolCallDelta::code_interpreter(
                0,
                None,
                vec![CodeOutput::Logs("4".into())],
            )),
            StreamEvent::TextDelta(" so the answer is 4".into()),
            StreamEvent::End,
        ]));
        let solver = solver(provider, SolverConfig::default());

        let response = solver.solve("2 + 2").await.unwrap();
        assert_eq!(response, "print(2+2)4 so the answer is 4");
    }

    #[tokio::test]
    async fn test_events_after_end_are_ignored() {
        let provider = Arc::new(MockProvider::new(vec![
            StreamEvent::TextDelta("done".into()),
            StreamEvent::End,
            StreamEvent::TextDelta(" extra".into()),
        ]));
        let solver = solver(provider, SolverConfig::default());

        assert_eq!(solver.solve("x").await.unwrap(), "done");
    }

    #[tokio::test]
    async fn test_closed_stream_completes() {
        let provider = Arc::new(MockProvider::new(vec![StreamEvent::TextDelta("x = 1".into())]));
        let solver = solver(provider, SolverConfig::default());

        assert_eq!(solver.solve("x - 1 = 0").await.unwrap(), "x = 1");
    }

    #[tokio::test]
    async fn test_setup_failures() {
        for step in [FailAt::Assistant, FailAt::Thread, FailAt::Message, FailAt::Run] {
            let provider = Arc::new(MockProvider::new(vec![StreamEvent::End]).failing_at(step));
            let solver = solver(provider, SolverConfig::default());

            let err = solver.solve("1 = 1").await.unwrap_err();
            assert!(
                matches!(err, SolveError::Setup(_)),
                "expected setup error at {:?}, got {:?}",
                step,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_error_event_fails_solve() {
        let provider = Arc::new(MockProvider::new(vec![
            StreamEvent::TextDelta("partial".into()),
            StreamEvent::Error("run failed".into()),
        ]));
        let solver = solver(provider, SolverConfig::default());

        assert_eq!(
            solver.solve("x").await.unwrap_err(),
            SolveError::Stream("run failed".into())
        );
    }

    #[tokio::test]
    async fn test_transport_error_fails_solve() {
        let provider = Arc::new(
            MockProvider::new(vec![StreamEvent::TextDelta("partial".into())])
                .with_stream_error("connection reset"),
        );
        let solver = solver(provider, SolverConfig::default());

        let err = solver.solve("x").await.unwrap_err();
        assert_eq!(err, SolveError::Stream("connection reset".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_stream_times_out() {
        let provider =
            Arc::new(MockProvider::new(vec![StreamEvent::TextDelta("thinking".into())]).hanging());
        let config = SolverConfig {
            stream_timeout: Some(Duration::from_secs(5)),
            ..SolverConfig::default()
        };
        let solver = solver(provider, config);

        let err = solver.solve("x").await.unwrap_err();
        assert_eq!(err, SolveError::Timeout(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_fresh_assistant_per_request() {
        let provider = Arc::new(MockProvider::new(vec![StreamEvent::End]));
        let solver = solver(provider.clone(), SolverConfig::default());

        solver.solve("a").await.unwrap();
        solver.solve("b").await.unwrap();
        assert_eq!(provider.assistants_created(), 2);
    }

    #[tokio::test]
    async fn test_reused_assistant_is_created_once() {
        let provider = Arc::new(MockProvider::new(vec![StreamEvent::End]));
        let config = SolverConfig {
            reuse_assistant: true,
            ..SolverConfig::default()
        };
        let solver = solver(provider.clone(), config);

        solver.solve("a").await.unwrap();
        solver.solve("b").await.unwrap();
        assert_eq!(provider.assistants_created(), 1);
    }

    #[tokio::test]
    async fn test_failed_creation_is_not_cached() {
        let provider = Arc::new(
            MockProvider::new(vec![StreamEvent::TextDelta("x = 1".into()), StreamEvent::End])
                .failing_times(FailAt::Assistant, 1),
        );
        let config = SolverConfig {
            reuse_assistant: true,
            ..SolverConfig::default()
        };
        let solver = solver(provider.clone(), config);

        assert!(matches!(
            solver.solve("x - 1 = 0").await,
            Err(SolveError::Setup(_))
        ));
        assert_eq!(provider.assistants_created(), 0);

        assert_eq!(solver.solve("x - 1 = 0").await.unwrap(), "x = 1");
        assert_eq!(solver.solve("x - 1 = 0").await.unwrap(), "x = 1");
        assert_eq!(provider.assistants_created(), 1);
    }

    #[tokio::test]
    async fn test_configured_assistant_id_skips_creation() {
        let provider = Arc::new(MockProvider::new(vec![StreamEvent::End]));
        let config = SolverConfig {
            assistant_id: Some("asst_existing".into()),
            ..SolverConfig::default()
        };
        let solver = solver(provider.clone(), config);

        solver.solve("a").await.unwrap();
        assert_eq!(provider.assistants_created(), 0);
    }
}
