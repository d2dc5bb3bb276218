use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

use super::base::{AssistantsApi, ChatCompletionApi};
use super::configs::OpenAiProviderConfig;
use super::errors::ApiResult;
use super::utils::{
    api_error_from_response, completion_message_from_response, messages_to_openai_spec,
    object_id, run_state_from_response, thread_messages_from_response,
};
use crate::models::message::ThreadMessage;
use crate::models::role::Role;
use crate::models::run::RunState;

const ASSISTANTS_BETA: &str = "assistants=v2";

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> ApiResult<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.host.trim_end_matches('/'), path)
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Value> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(api_error_from_response(status.as_u16(), &body))
    }

    async fn assistants_post(&self, path: &str, payload: Value) -> ApiResult<Value> {
        let request = self
            .client
            .post(self.url(path))
            .header("OpenAI-Beta", ASSISTANTS_BETA)
            .json(&payload);
        self.send(request).await
    }

    async fn assistants_get(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<Value> {
        let request = self
            .client
            .get(self.url(path))
            .header("OpenAI-Beta", ASSISTANTS_BETA)
            .query(query);
        self.send(request).await
    }
}

#[async_trait]
impl AssistantsApi for OpenAiProvider {
    async fn create_thread(&self) -> ApiResult<String> {
        let response = self.assistants_post("threads", json!({})).await?;
        object_id(&response, "thread")
    }

    async fn append_message(&self, thread_id: &str, role: Role, content: &str) -> ApiResult<()> {
        let payload = json!({
            "role": role,
            "content": content,
        });
        self.assistants_post(&format!("threads/{}/messages", thread_id), payload)
            .await?;
        Ok(())
    }

    async fn start_run(&self, thread_id: &str, assistant_id: &str) -> ApiResult<String> {
        let payload = json!({ "assistant_id": assistant_id });
        let response = self
            .assistants_post(&format!("threads/{}/runs", thread_id), payload)
            .await?;
        object_id(&response, "run")
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> ApiResult<RunState> {
        let response = self
            .assistants_get(&format!("threads/{}/runs/{}", thread_id, run_id), &[])
            .await?;
        run_state_from_response(&response)
    }

    async fn list_messages(&self, thread_id: &str) -> ApiResult<Vec<ThreadMessage>> {
        let response = self
            .assistants_get(
                &format!("threads/{}/messages", thread_id),
                &[("order", "desc")],
            )
            .await?;
        thread_messages_from_response(&response)
    }
}

#[async_trait]
impl ChatCompletionApi for OpenAiProvider {
    async fn complete(&self, model: &str, messages: &[ThreadMessage]) -> ApiResult<ThreadMessage> {
        let payload = json!({
            "model": model,
            "messages": messages_to_openai_spec(messages),
        });
        let request = self
            .client
            .post(self.url("chat/completions"))
            .json(&payload);
        let response = self.send(request).await?;

        // Some compatible endpoints report errors inside a 200 body
        if let Some(error) = response.get("error") {
            return Err(api_error_from_response(200, &json!({ "error": error }).to_string()));
        }

        completion_message_from_response(&response)
    }
}
