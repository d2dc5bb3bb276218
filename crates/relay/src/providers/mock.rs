use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::base::{AssistantsApi, ChatCompletionApi};
use super::errors::{ApiError, ApiResult};
use crate::models::message::ThreadMessage;
use crate::models::role::Role;
use crate::models::run::{RunState, RunStatus};

/// A remote call as seen by the fake
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateThread,
    AppendMessage { thread_id: String, content: String },
    StartRun { thread_id: String, assistant_id: String },
    GetRun { thread_id: String, run_id: String },
    ListMessages { thread_id: String },
    Complete { model: String },
}

/// A fake service that replays pre-configured responses and records every call
///
/// Polls are answered from the queue of run states; once the queue is empty the
/// run stays `in_progress` forever.
#[derive(Default)]
pub struct ScriptedApi {
    polls: Mutex<VecDeque<ApiResult<RunState>>>,
    messages: Mutex<VecDeque<ApiResult<Vec<ThreadMessage>>>>,
    create_thread_error: Mutex<Option<ApiError>>,
    completion: Mutex<Option<ApiResult<ThreadMessage>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `pending` in-progress polls followed by the given terminal state
    pub fn finishing_after(pending: usize, terminal: RunState) -> Self {
        let api = Self::new();
        for _ in 0..pending {
            api.push_poll(Ok(RunState::new("run_1", RunStatus::InProgress)));
        }
        api.push_poll(Ok(terminal));
        api
    }

    pub fn push_poll(&self, poll: ApiResult<RunState>) {
        self.polls.lock().unwrap().push_back(poll);
    }

    pub fn push_messages(&self, messages: ApiResult<Vec<ThreadMessage>>) {
        self.messages.lock().unwrap().push_back(messages);
    }

    pub fn fail_create_thread(&self, error: ApiError) {
        *self.create_thread_error.lock().unwrap() = Some(error);
    }

    pub fn set_completion(&self, completion: ApiResult<ThreadMessage>) {
        *self.completion.lock().unwrap() = Some(completion);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn poll_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::GetRun { .. }))
            .count()
    }

    pub fn list_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::ListMessages { .. }))
            .count()
    }

    fn record(&self, call: Call) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        calls.len()
    }
}

/// A transient failure, as a 503 from the service
pub fn unavailable() -> ApiError {
    ApiError::Status {
        status: 503,
        code: None,
        message: "Service Unavailable".to_string(),
    }
}

#[async_trait]
impl AssistantsApi for ScriptedApi {
    async fn create_thread(&self) -> ApiResult<String> {
        let n = self.record(Call::CreateThread);
        match self.create_thread_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(format!("thread_{}", n)),
        }
    }

    async fn append_message(&self, thread_id: &str, role: Role, content: &str) -> ApiResult<()> {
        assert_eq!(role, Role::User);
        self.record(Call::AppendMessage {
            thread_id: thread_id.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn start_run(&self, thread_id: &str, assistant_id: &str) -> ApiResult<String> {
        self.record(Call::StartRun {
            thread_id: thread_id.to_string(),
            assistant_id: assistant_id.to_string(),
        });
        Ok("run_1".to_string())
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> ApiResult<RunState> {
        self.record(Call::GetRun {
            thread_id: thread_id.to_string(),
            run_id: run_id.to_string(),
        });
        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RunState::new(run_id, RunStatus::InProgress)))
    }

    async fn list_messages(&self, thread_id: &str) -> ApiResult<Vec<ThreadMessage>> {
        self.record(Call::ListMessages {
            thread_id: thread_id.to_string(),
        });
        self.messages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[async_trait]
impl ChatCompletionApi for ScriptedApi {
    async fn complete(&self, model: &str, _messages: &[ThreadMessage]) -> ApiResult<ThreadMessage> {
        self.record(Call::Complete {
            model: model.to_string(),
        });
        self.completion
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(ThreadMessage::assistant()))
    }
}
