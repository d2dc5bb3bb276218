use serde_json::{json, Value};

use super::errors::{ApiError, ApiResult};
use crate::models::content::MessageContent;
use crate::models::message::ThreadMessage;
use crate::models::role::Role;
use crate::models::run::{RunState, RunStatus};

/// Convert internal messages to OpenAI's chat completion message specification
///
/// Unsupported content items are dropped, the text items of a message are joined
pub fn messages_to_openai_spec(messages: &[ThreadMessage]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            let text: Vec<&str> = message
                .content
                .iter()
                .filter_map(MessageContent::as_text)
                .collect();
            json!({
                "role": message.role,
                "content": text.join("\n"),
            })
        })
        .collect()
}

/// Extract the `id` of a freshly created object (thread, run)
pub fn object_id(response: &Value, object: &str) -> ApiResult<String> {
    response
        .get("id")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| ApiError::Decode(format!("{} response has no id", object)))
}

/// Convert an OpenAI run object into a RunState
pub fn run_state_from_response(response: &Value) -> ApiResult<RunState> {
    let id = object_id(response, "run")?;
    let status = response
        .get("status")
        .cloned()
        .ok_or_else(|| ApiError::Decode(format!("run {} has no status", id)))?;
    let status: RunStatus = serde_json::from_value(status)
        .map_err(|e| ApiError::Decode(format!("run {} has an invalid status: {}", id, e)))?;

    let mut state = RunState::new(id, status);
    if let Some(reason) = run_failure_reason(response) {
        state = state.with_failure_reason(reason);
    }
    Ok(state)
}

fn run_failure_reason(response: &Value) -> Option<String> {
    let non_empty = |v: &Value| v.as_str().filter(|s| !s.is_empty()).map(String::from);

    let last_error = response.get("last_error");
    last_error
        .and_then(|e| e.get("code"))
        .and_then(non_empty)
        .or_else(|| last_error.and_then(|e| e.get("message")).and_then(non_empty))
        .or_else(|| {
            response
                .get("incomplete_details")
                .and_then(|d| d.get("reason"))
                .and_then(non_empty)
        })
}

/// Convert an OpenAI message list into ThreadMessages, keeping the service's order
///
/// Messages with a role we don't relay are skipped.
pub fn thread_messages_from_response(response: &Value) -> ApiResult<Vec<ThreadMessage>> {
    let data = response
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::Decode("message list has no data".to_string()))?;

    let messages = data
        .iter()
        .filter_map(|entry| {
            let role = Role::parse(entry.get("role")?.as_str()?)?;
            let created = entry
                .get("created_at")
                .and_then(Value::as_i64)
                .unwrap_or_default();
            let content = entry
                .get("content")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(content_from_spec).collect())
                .unwrap_or_default();
            Some(ThreadMessage::new(role, created, content))
        })
        .collect();

    Ok(messages)
}

fn content_from_spec(item: &Value) -> MessageContent {
    let kind = item.get("type").and_then(Value::as_str).unwrap_or("unknown");
    match (kind, item["text"]["value"].as_str()) {
        ("text", Some(text)) => MessageContent::text(text),
        _ => MessageContent::unsupported(kind),
    }
}

/// Convert OpenAI's chat completion response to an internal message
pub fn completion_message_from_response(response: &Value) -> ApiResult<ThreadMessage> {
    let original = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| ApiError::Decode("completion response has no choices".to_string()))?;

    let mut message = ThreadMessage::assistant();
    if let Some(text) = original.get("content").and_then(Value::as_str) {
        message = message.with_text(text);
    }
    Ok(message)
}

/// Build an ApiError from a non-success response body
///
/// OpenAI reports errors as `{"error": {"message", "type", "code"}}`; anything
/// else is kept verbatim as the message.
pub fn api_error_from_response(status: u16, body: &str) -> ApiError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));

    let code = error
        .and_then(|e| e.get("code"))
        .and_then(Value::as_str)
        .map(String::from);
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| {
            if body.is_empty() {
                "empty response body".to_string()
            } else {
                body.to_string()
            }
        });

    ApiError::Status {
        status,
        code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPENAI_MESSAGE_LIST: &str = r#"{
        "object": "list",
        "data": [
            {
                "id": "msg_abc123",
                "object": "thread.message",
                "created_at": 1699016383,
                "thread_id": "thread_abc123",
                "role": "assistant",
                "content": [{
                    "type": "text",
                    "text": {"value": "How does AI work? Explain it in simple terms.", "annotations": []}
                }]
            },
            {
                "id": "msg_abc456",
                "object": "thread.message",
                "created_at": 1699016380,
                "thread_id": "thread_abc123",
                "role": "user",
                "content": [{
                    "type": "text",
                    "text": {"value": "Hello, what is AI?", "annotations": []}
                }]
            }
        ],
        "first_id": "msg_abc123",
        "last_id": "msg_abc456",
        "has_more": false
    }"#;

    #[test]
    fn test_messages_to_openai_spec() {
        let message = ThreadMessage::user().with_text("Hello");
        let spec = messages_to_openai_spec(&[message]);

        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["role"], "user");
        assert_eq!(spec[0]["content"], "Hello");
    }

    #[test]
    fn test_object_id() {
        assert_eq!(
            object_id(&json!({"id": "thread_abc123", "object": "thread"}), "thread").unwrap(),
            "thread_abc123"
        );
        let err = object_id(&json!({"object": "thread"}), "thread").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected response: thread response has no id");
    }

    #[test]
    fn test_run_state_from_response_in_progress() {
        let state = run_state_from_response(&json!({
            "id": "run_abc123",
            "object": "thread.run",
            "status": "in_progress",
            "last_error": null
        }))
        .unwrap();

        assert_eq!(state.id, "run_abc123");
        assert_eq!(state.status, RunStatus::InProgress);
        assert_eq!(state.failure_reason, None);
    }

    #[test]
    fn test_run_state_from_response_failed() {
        let state = run_state_from_response(&json!({
            "id": "run_abc123",
            "status": "failed",
            "last_error": {"code": "rate_limit_exceeded", "message": "Rate limit reached"}
        }))
        .unwrap();
        assert_eq!(state.status, RunStatus::Failed);
        assert_eq!(state.failure_reason.as_deref(), Some("rate_limit_exceeded"));

        let state = run_state_from_response(&json!({
            "id": "run_abc123",
            "status": "failed",
            "last_error": {"code": "", "message": "Something went wrong"}
        }))
        .unwrap();
        assert_eq!(state.failure_reason.as_deref(), Some("Something went wrong"));

        let state = run_state_from_response(&json!({
            "id": "run_abc123",
            "status": "incomplete",
            "incomplete_details": {"reason": "max_completion_tokens"}
        }))
        .unwrap();
        assert_eq!(state.failure_reason.as_deref(), Some("max_completion_tokens"));
    }

    #[test]
    fn test_run_state_from_response_missing_status() {
        let result = run_state_from_response(&json!({"id": "run_abc123"}));
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_thread_messages_from_response() {
        let response: Value = serde_json::from_str(OPENAI_MESSAGE_LIST).unwrap();
        let messages = thread_messages_from_response(&response).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::Assistant);
        assert_eq!(messages[0].created, 1699016383);
        assert_eq!(
            messages[0].first_text(),
            Some("How does AI work? Explain it in simple terms.")
        );
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn test_thread_messages_from_response_non_text_content() {
        let response = json!({
            "data": [
                {"role": "system", "content": []},
                {
                    "role": "assistant",
                    "content": [
                        {"type": "image_file", "image_file": {"file_id": "file-abc"}},
                        {"type": "text", "text": {"value": "see above"}}
                    ]
                }
            ]
        });
        let messages = thread_messages_from_response(&response).unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].content[0],
            MessageContent::unsupported("image_file")
        );
        assert_eq!(messages[0].first_text(), None);
    }

    #[test]
    fn test_completion_message_from_response() {
        let response = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello! How can I assist you today?"},
                "finish_reason": "stop"
            }]
        });
        let message = completion_message_from_response(&response).unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.first_text(), Some("Hello! How can I assist you today?"));

        let result = completion_message_from_response(&json!({"choices": []}));
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_api_error_from_response() {
        let body = r#"{"error": {"message": "You exceeded your current quota", "type": "insufficient_quota", "code": "insufficient_quota"}}"#;
        match api_error_from_response(429, body) {
            ApiError::Status {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 429);
                assert_eq!(code.as_deref(), Some("insufficient_quota"));
                assert_eq!(message, "You exceeded your current quota");
            }
            other => panic!("Expected Status error, got {:?}", other),
        }

        match api_error_from_response(502, "Bad Gateway") {
            ApiError::Status { code, message, .. } => {
                assert_eq!(code, None);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("Expected Status error, got {:?}", other),
        }
    }
}
