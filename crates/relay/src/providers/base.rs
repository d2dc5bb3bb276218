use async_trait::async_trait;

use super::errors::ApiResult;
use crate::models::message::ThreadMessage;
use crate::models::role::Role;
use crate::models::run::RunState;

/// The thread/run half of an assistants service (OpenAI, or a fake in tests)
///
/// Each call is one network round trip and a suspension point for the caller.
/// Only `get_run` and `list_messages` are safe to repeat.
#[async_trait]
pub trait AssistantsApi: Send + Sync {
    /// Create an empty thread and return its id
    async fn create_thread(&self) -> ApiResult<String>;

    /// Append a message to a thread
    async fn append_message(&self, thread_id: &str, role: Role, content: &str) -> ApiResult<()>;

    /// Start a run of the given assistant on a thread and return the run id
    async fn start_run(&self, thread_id: &str, assistant_id: &str) -> ApiResult<String>;

    /// Fetch the current state of a run
    async fn get_run(&self, thread_id: &str, run_id: &str) -> ApiResult<RunState>;

    /// List the messages of a thread, most recent first
    async fn list_messages(&self, thread_id: &str) -> ApiResult<Vec<ThreadMessage>>;
}

/// Single-shot chat completion, without any thread state on the service
#[async_trait]
pub trait ChatCompletionApi: Send + Sync {
    /// Generate the next assistant message for the given conversation
    async fn complete(&self, model: &str, messages: &[ThreadMessage]) -> ApiResult<ThreadMessage>;
}
