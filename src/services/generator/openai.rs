/// OpenAI-compatible chat completions backend
///
/// Works against any endpoint speaking the `/chat/completions` dialect
/// (OpenAI, OpenRouter, local gateways).
use crate::{
    error::{AppError, AppResult},
    services::generator::TextGenerator,
};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiGenerator {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, api_url: Option<String>, model: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let url = format!("{}/chat/completions", self.api_url.trim_end_matches('/'));
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("Chat completion request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::Generation(format!("Chat completion response unreadable: {}", e))
        })?;

        if !status.is_success() {
            let hint = match status.as_u16() {
                401 | 403 => "check GENERATOR_API_KEY",
                429 => "rate limited or out of quota",
                _ => "upstream error",
            };
            return Err(AppError::Generation(format!(
                "Chat completion API returned status {} ({}): {}",
                status, hint, body
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::Generation(format!("Failed to decode chat completion response: {}", e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::Generation("Chat completion returned no content".to_string()))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            model: "gpt-test",
            messages: vec![Message {
                role: "user",
                content: "recommend something",
            }],
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-test");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["stream"], false);
    }

    #[test]
    fn test_chat_response_first_choice_content() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": "{}"}}], "usage": {}}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        let content = parsed.choices.into_iter().next().and_then(|c| c.message.content);
        assert_eq!(content, Some("{}".to_string()));
    }

    #[test]
    fn test_defaults_apply_when_unset() {
        let generator = OpenAiGenerator::new("key".to_string(), None, None);
        assert_eq!(generator.api_url, DEFAULT_API_URL);
        assert_eq!(generator.model, DEFAULT_MODEL);
    }
}
