use crate::error::ConfigError;
use config::{Config, Environment, File};
use eqsolve::{
    models::assistant::{AssistantSpec, DEFAULT_ASSISTANT_NAME, DEFAULT_MODEL},
    providers::configs::{OpenAiProviderConfig, DEFAULT_REQUEST_TIMEOUT, OPENAI_HOST},
    solver::SolverConfig,
};
use serde::Deserialize;
use std::{env, net::SocketAddr, time::Duration};

pub const DEFAULT_ALLOWED_ORIGIN: &str =
    "https://web-math-front-backup-ly9ixsuqeb5112cb.sel5.cloudtype.app";

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|source| ConfigError::InvalidAddress { addr, source })
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_openai_host")]
    pub host: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            host: default_openai_host(),
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ProviderSettings {
    pub fn into_config(self) -> OpenAiProviderConfig {
        OpenAiProviderConfig::new(self.host, self.api_key)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
    }
}

#[derive(Debug, Deserialize)]
pub struct AssistantSettings {
    #[serde(default = "default_assistant_name")]
    pub name: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub reuse: bool,
    /// Zero disables the watchdog
    #[serde(default = "default_stream_timeout_secs")]
    pub stream_timeout_secs: u64,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            name: default_assistant_name(),
            model: default_model(),
            id: None,
            reuse: false,
            stream_timeout_secs: default_stream_timeout_secs(),
        }
    }
}

impl AssistantSettings {
    pub fn into_solver_config(self) -> SolverConfig {
        SolverConfig {
            assistant: AssistantSpec::math_tutor(self.name, self.model),
            assistant_id: self.id.filter(|id| !id.is_empty()),
            reuse_assistant: self.reuse,
            stream_timeout: match self.stream_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CorsSettings {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub assistant: AssistantSettings,
    #[serde(default)]
    pub cors: CorsSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // An optional eqsolve.toml next to the binary's working directory
            .add_source(File::with_name("eqsolve").required(false))
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix("EQSOLVE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins"),
            )
            // The conventional variables win over the prefixed ones
            .set_override_option("server.port", port_from_env().map(i64::from))?
            .set_override_option("provider.api_key", env::var("OPENAI_API_KEY").ok())?
            .build()?;

        let settings: Self = config.try_deserialize()?;
        tracing::debug!(
            host = %settings.server.host,
            port = settings.server.port,
            api_key_set = settings.provider.api_key.is_some(),
            "configuration loaded"
        );
        Ok(settings)
    }
}

/// `PORT` falls back to the default when it does not hold a valid port number
fn port_from_env() -> Option<u16> {
    env::var("PORT").ok()?.trim().parse().ok()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_openai_host() -> String {
    OPENAI_HOST.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_assistant_name() -> String {
    DEFAULT_ASSISTANT_NAME.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_stream_timeout_secs() -> u64 {
    300
}

fn default_allowed_origins() -> Vec<String> {
    vec![DEFAULT_ALLOWED_ORIGIN.to_string()]
}
