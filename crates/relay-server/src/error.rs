use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Invalid value for {env_var}: {reason}")]
    InvalidValue { env_var: String, reason: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Name of the environment variable that sets a configuration field
///
/// The credential and assistant id keep the names the deployment already uses,
/// everything else lives under the `RELAY_` prefix.
pub fn to_env_var(field: &str) -> String {
    match field {
        "api_key" | "openai.api_key" => "OPENAI_API_KEY".to_string(),
        "assistant_id" | "openai.assistant_id" => "OPENAI_ASSISTANT_ID".to_string(),
        other => format!("RELAY_{}", other.replace('.', "__").to_uppercase()),
    }
}
