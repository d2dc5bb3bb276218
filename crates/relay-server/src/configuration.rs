use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment};
use relay::coordinator::PollPolicy;
use relay::providers::configs::{OpenAiProviderConfig, OPENAI_HOST, OPENAI_MODEL};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Debug, Deserialize)]
pub struct OpenAiSettings {
    #[serde(default = "default_openai_host")]
    pub host: String,
    pub api_key: String,
    pub assistant_id: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl OpenAiSettings {
    pub fn provider_config(&self) -> OpenAiProviderConfig {
        OpenAiProviderConfig::new(self.api_key.clone())
            .with_host(self.host.clone())
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
    }
}

#[derive(Debug, Deserialize)]
pub struct PollingSettings {
    pub interval_ms: u64,
    pub max_interval_ms: u64,
    pub backoff_factor: f64,
    pub timeout_secs: u64,
    pub max_polls: u32,
    pub max_transient_retries: u32,
}

impl Default for PollingSettings {
    fn default() -> Self {
        let policy = PollPolicy::default();
        Self {
            interval_ms: policy.interval.as_millis() as u64,
            max_interval_ms: policy.max_interval.as_millis() as u64,
            backoff_factor: policy.backoff_factor,
            timeout_secs: policy.timeout.as_secs(),
            max_polls: policy.max_polls,
            max_transient_retries: policy.max_transient_retries,
        }
    }
}

impl PollingSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(ConfigError::InvalidValue {
                env_var: to_env_var("polling.backoff_factor"),
                reason: format!("expected a finite factor >= 1.0, got {}", self.backoff_factor),
            });
        }
        if self.max_polls == 0 {
            return Err(ConfigError::InvalidValue {
                env_var: to_env_var("polling.max_polls"),
                reason: "at least one poll is required".to_string(),
            });
        }
        Ok(())
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.interval_ms),
            max_interval: Duration::from_millis(self.max_interval_ms),
            backoff_factor: self.backoff_factor,
            timeout: Duration::from_secs(self.timeout_secs),
            max_polls: self.max_polls,
            max_transient_retries: self.max_transient_retries,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub openai: OpenAiSettings,
    #[serde(default)]
    pub polling: PollingSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let polling = PollingSettings::default();

        // Start with default configuration
        let mut builder = Config::builder()
            // Server defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            // OpenAI defaults
            .set_default("openai.host", default_openai_host())?
            .set_default("openai.model", default_model())?
            .set_default("openai.request_timeout_secs", default_request_timeout_secs())?
            // Polling defaults
            .set_default("polling.interval_ms", polling.interval_ms)?
            .set_default("polling.max_interval_ms", polling.max_interval_ms)?
            .set_default("polling.backoff_factor", polling.backoff_factor)?
            .set_default("polling.timeout_secs", polling.timeout_secs)?
            .set_default("polling.max_polls", polling.max_polls)?
            .set_default("polling.max_transient_retries", polling.max_transient_retries)?;

        // The deployment's own variable names seed the credentials
        for (env_var, key) in [
            ("OPENAI_API_KEY", "openai.api_key"),
            ("OPENAI_ASSISTANT_ID", "openai.assistant_id"),
        ] {
            if let Ok(value) = std::env::var(env_var) {
                builder = builder.set_default(key, value)?;
            }
        }

        // Layer on the environment variables
        let config = builder
            .add_source(
                Environment::with_prefix("RELAY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        // Try to deserialize the configuration
        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        // Handle missing field errors specially
        match result {
            Ok(settings) => {
                settings.polling.validate()?;
                Ok(settings)
            }
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                // Handle both NotFound and missing field message variants
                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    // Extract field name from error message "missing field `api_key`"
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .split('`')
                        .next()
                        .unwrap_or_default();
                    let env_var = to_env_var(field);
                    Err(ConfigError::MissingEnvVar { env_var })
                } else if let config::ConfigError::NotFound(field) = &err {
                    let env_var = to_env_var(field);
                    Err(ConfigError::MissingEnvVar { env_var })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_model() -> String {
    OPENAI_MODEL.to_string()
}

fn default_openai_host() -> String {
    OPENAI_HOST.to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}
