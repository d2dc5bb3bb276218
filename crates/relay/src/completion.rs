use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::coordinator::{until_cancelled, NO_REPLY};
use crate::errors::{ExchangeError, ExchangeResult};
use crate::models::message::ThreadMessage;
use crate::providers::base::ChatCompletionApi;

/// Single-shot exchange over chat completions, with no thread or run to wait on
pub struct CompletionExchange {
    api: Arc<dyn ChatCompletionApi>,
    model: String,
}

impl CompletionExchange {
    pub fn new<S: Into<String>>(api: Arc<dyn ChatCompletionApi>, model: S) -> Self {
        Self {
            api,
            model: model.into(),
        }
    }

    pub async fn complete_exchange(
        &self,
        user_message: &str,
        cancel: &CancellationToken,
    ) -> ExchangeResult<String> {
        if user_message.trim().is_empty() {
            return Err(ExchangeError::InvalidInput);
        }

        let messages = vec![ThreadMessage::user().with_text(user_message)];
        let reply = until_cancelled(cancel, self.api.complete(&self.model, &messages))
            .await?
            .map_err(ExchangeError::remote("complete chat"))?;
        debug!(model = %self.model, "chat completion returned");

        match reply.first_text().filter(|text| !text.is_empty()) {
            Some(text) => Ok(text.to_string()),
            None => {
                warn!(model = %self.model, "chat completion returned no text");
                Ok(NO_REPLY.to_string())
            }
        }
    }
}
