use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clients::http;
use crate::clients::service::{Service, ServiceError};
use crate::clients::tools::FunctionDefinition;
use crate::config::{LlmConfig, OPENAI_API_KEY};

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallPayload>,
}

#[derive(Debug, Deserialize)]
struct ToolCallPayload {
    function: FunctionCallPayload,
}

#[derive(Debug, Deserialize)]
struct FunctionCallPayload {
    name: String,
    arguments: String,
}

/// Chat-completions client bound to one model.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
}

impl ChatClient {
    pub fn new(config: &LlmConfig, timeout_secs: Option<u64>) -> Result<Self, ServiceError> {
        let service = Service::Openai;
        let api_key = config
            .api_key
            .as_ref()
            .ok_or(ServiceError::MissingSetting {
                service,
                key_env: OPENAI_API_KEY,
            })?
            .expose()
            .to_string();

        Ok(Self {
            http: http::build_client(service, timeout_secs)?,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Returns the assistant's text reply.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ServiceError> {
        let message = self.request(messages, None).await?;
        message
            .content
            .filter(|content| !content.trim().is_empty())
            .ok_or(ServiceError::EmptyResponse {
                service: Service::Openai,
            })
    }

    /// Forces a call to `function` and returns its decoded arguments.
    pub async fn call_function(
        &self,
        messages: &[ChatMessage],
        function: &FunctionDefinition,
    ) -> Result<Value, ServiceError> {
        let service = Service::Openai;
        let message = self.request(messages, Some(function)).await?;
        let call = message
            .tool_calls
            .into_iter()
            .find(|call| call.function.name == function.name)
            .ok_or_else(|| ServiceError::InvalidResponse {
                service,
                detail: format!("model did not call {}", function.name),
            })?;

        serde_json::from_str(&call.function.arguments).map_err(|err| {
            ServiceError::InvalidResponse {
                service,
                detail: format!("{} arguments are not JSON ({err})", function.name),
            }
        })
    }

    async fn request(
        &self,
        messages: &[ChatMessage],
        function: Option<&FunctionDefinition>,
    ) -> Result<AssistantMessage, ServiceError> {
        let service = Service::Openai;
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            tools: function.map(|function| vec![function.to_tool_json()]),
            tool_choice: function.map(FunctionDefinition::forced_choice),
        };

        log::debug!(
            "{service} request model={} messages={} function={}",
            self.model,
            messages.len(),
            function.map_or("none", |function| function.name.as_str())
        );

        let request = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload);
        let response = http::send(service, request).await?;

        let body: ChatCompletionResponse = http::read_body(service, response).await?;
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(ServiceError::EmptyResponse { service })
    }
}
