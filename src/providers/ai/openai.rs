//! OpenAI-compatible chat completions provider.
//!
//! Works with OpenAI itself and with any server exposing
//! `POST {base_url}/chat/completions` (Ollama, vLLM, LM Studio).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::traits::{
    CompletionRequest, CompletionResponse, LlmError, LlmProvider, LlmResult, Message, Role,
    TokenUsage,
};

/// Default base URL for the OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a Message> for ChatMessage<'a> {
    fn from(msg: &'a Message) -> Self {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self {
            role,
            content: &msg.content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    code: Option<String>,
}

/// Provider for OpenAI-compatible chat endpoints.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatibleProvider {
    /// Provider for api.openai.com.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::custom(OPENAI_BASE_URL, Some(api_key.into()), model)
    }

    /// Provider for a custom endpoint; local servers usually need no key.
    pub fn custom(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(ref api_key) = self.api_key {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", api_key)) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        headers
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: request.messages.iter().map(ChatMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    async fn error_from(response: reqwest::Response) -> LlmError {
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return LlmError::RateLimited { retry_after_secs };
        }

        match response.json::<ApiErrorBody>().await {
            Ok(body) if status == 401 || body.error.code.as_deref() == Some("invalid_api_key") => {
                LlmError::Authentication(body.error.message)
            }
            Ok(body) => LlmError::Api {
                status,
                message: body.error.message,
            },
            Err(_) => LlmError::Api {
                status,
                message: format!("HTTP {}", status),
            },
        }
    }

    fn into_completion(response: ChatResponse) -> LlmResult<CompletionResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?;

        let tokens_used = response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            text: choice.message.content.unwrap_or_default(),
            tokens_used,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> LlmResult<CompletionResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(&self.body(request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("failed to parse response: {}", e)))?;

        let completion = Self::into_completion(parsed)?;
        tracing::debug!(
            model = %self.model,
            total_tokens = completion.tokens_used.total_tokens,
            "completion received"
        );
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_model_and_messages() {
        let provider = OpenAiCompatibleProvider::openai("key", "gpt-4o-mini");
        let request = CompletionRequest::prompt("Hello").with_max_tokens(Some(50));

        let json = serde_json::to_string(&provider.body(&request)).unwrap();
        assert!(json.contains("\"model\":\"gpt-4o-mini\""));
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"content\":\"Hello\""));
        assert!(json.contains("\"max_tokens\":50"));
    }

    #[test]
    fn body_omits_unset_max_tokens() {
        let provider = OpenAiCompatibleProvider::openai("key", "gpt-4o-mini");
        let request = CompletionRequest::prompt("Hi");

        let json = serde_json::to_string(&provider.body(&request)).unwrap();
        assert!(!json.contains("max_tokens"));
    }

    #[test]
    fn headers_include_bearer_token() {
        let provider = OpenAiCompatibleProvider::openai("sk-test", "gpt-4o");
        let headers = provider.headers();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer sk-test");
    }

    #[test]
    fn keyless_endpoint_sends_no_authorization() {
        let provider = OpenAiCompatibleProvider::custom("http://localhost:11434/v1", None, "llama3");
        assert!(provider.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let provider = OpenAiCompatibleProvider::custom("http://localhost:11434/v1/", None, "llama3");
        assert_eq!(provider.base_url(), "http://localhost:11434/v1");
    }

    #[test]
    fn response_parsing_takes_first_choice() {
        let json = r#"{
            "choices": [{"message": {"content": "Client ||| New Project ||| Billing ||| 85"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;

        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        let completion = OpenAiCompatibleProvider::into_completion(parsed).unwrap();
        assert_eq!(completion.text, "Client ||| New Project ||| Billing ||| 85");
        assert_eq!(completion.tokens_used.total_tokens, 15);
    }

    #[test]
    fn response_without_choices_is_invalid() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        let err = OpenAiCompatibleProvider::into_completion(parsed).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn provider_identity() {
        let provider = OpenAiCompatibleProvider::openai("k", "gpt-4o");
        assert_eq!(provider.name(), "openai-compatible");
        assert_eq!(provider.model(), "gpt-4o");
    }
}
