use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use bidwright_core::config::LlmConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// Function the model may call with structured arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub function: Option<FunctionSpec>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the raw text the model produced: function-call arguments when
    /// the model used the function, otherwise the message content.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Chat-completions client for OpenAI and OpenAI-compatible servers (Ollama).
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl OpenAiCompatibleClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build llm http client")?;

        Ok(Self {
            http,
            base_url: config.effective_base_url().trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

pub(crate) fn request_body(model: &str, request: &CompletionRequest) -> Value {
    let mut body = json!({
        "model": model,
        "temperature": 0,
        "top_p": 0.1,
        "messages": request.messages,
    });

    if let Some(function) = &request.function {
        body["tools"] = json!([{
            "type": "function",
            "function": {
                "name": function.name,
                "description": function.description,
                "parameters": function.parameters,
            }
        }]);
        body["tool_choice"] = json!("auto");
    }

    body
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let endpoint = self.endpoint();
        debug!(
            event_name = "agent.llm.request",
            model = %self.model,
            message_count = request.messages.len(),
            "sending chat completion request"
        );

        let mut builder = self.http.post(&endpoint).json(&request_body(&self.model, request));
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("chat completion request to `{endpoint}` failed"))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("chat completion endpoint returned {status}: {detail}");
        }

        let payload: ChatCompletionResponse =
            response.json().await.context("failed to decode chat completion response")?;
        response_payload(payload)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    arguments: String,
}

pub(crate) fn response_payload(response: ChatCompletionResponse) -> Result<String> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| anyhow!("chat completion response contained no choices"))?;

    if let Some(call) = message.tool_calls.and_then(|calls| calls.into_iter().next()) {
        return Ok(call.function.arguments);
    }
    if let Some(call) = message.function_call {
        return Ok(call.arguments);
    }
    match message.content {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => bail!("chat completion response contained neither a function call nor content"),
    }
}
