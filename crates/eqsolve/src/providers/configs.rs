use std::time::Duration;

pub const OPENAI_HOST: &str = "https://api.openai.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    /// Requests fail with `ProviderError::MissingApiKey` while this is unset
    pub api_key: Option<String>,
    /// Limit for the assistant, thread and message calls. Streamed runs are not bound by it.
    pub request_timeout: Duration,
}

impl OpenAiProviderConfig {
    pub fn new<S: Into<String>>(host: S, api_key: Option<String>) -> Self {
        Self {
            host: host.into(),
            api_key,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

impl Default for OpenAiProviderConfig {
    fn default() -> Self {
        Self::new(OPENAI_HOST, None)
    }
}
