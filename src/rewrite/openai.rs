use super::RewriteService;
use crate::config::LlmConfig;
use crate::error::RewriteError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, trace, warn};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    /// Tuning parameters from config (temperature, max_tokens, ...)
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Rewrite service backed by an OpenAI-compatible chat completions endpoint
pub struct OpenAiRewriter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    headers: BTreeMap<String, String>,
    body: Map<String, Value>,
}

impl OpenAiRewriter {
    pub fn new(config: &LlmConfig, api_key: &str) -> Result<Self, RewriteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let body = match serde_json::to_value(&config.body) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => {
                warn!("Ignoring llm.body, not representable as JSON: {}", e);
                Map::new()
            }
        };

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            headers: config.headers.clone(),
            body,
        })
    }

    fn request_body<'a>(&'a self, system: &'a str, task: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: task,
                },
            ],
            extra: &self.body,
        }
    }
}

impl RewriteService for OpenAiRewriter {
    async fn rewrite(&self, system: &str, task: &str) -> Result<String, RewriteError> {
        trace!(
            "Request: model={}, system_len={}, task_len={}",
            self.model,
            system.len(),
            task.len()
        );

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(system, task));
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RewriteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| RewriteError::InvalidResponse(e.to_string()))?;
        debug!("Response has {} choices", chat_response.choices.len());

        // First choice is the primary response
        let content = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RewriteError::InvalidResponse("no choices in response".into()))?
            .message
            .content
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(RewriteError::EmptyResponse);
        }
        Ok(content)
    }
}
