//! OpenAI-compatible chat-completions client used for summarization.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::prompt::PromptPair;

#[derive(Serialize, Deserialize, Debug)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize, Debug)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Client for one chat API endpoint and model.
#[derive(Clone)]
pub struct SummaryClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl SummaryClient {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// Send a system + user prompt pair and return the model's reply text.
    pub async fn summarize(&self, prompts: &PromptPair) -> Result<String> {
        let request_body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: prompts.system.clone(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: prompts.user.clone(),
                },
            ],
        };

        let endpoint = format!("{}/chat/completions", self.base_url);
        debug!(%endpoint, model = %self.model, "requesting summary");

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body_truncated: String = body.chars().take(1000).collect();
            return Err(Error::Summarization(format!(
                "chat API returned {status}: {body_truncated}"
            )));
        }

        let bytes = response.bytes().await?;
        let body: ChatResponse = serde_json::from_slice(&bytes)?;
        let summary = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::Summarization("chat API response has no choices".into()))?;

        info!(chars = summary.len(), "summary received");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = SummaryClient::new("https://api.openai.com/v1/", "sk-x", "gpt-4");
        assert_eq!(client.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_chat_response_parses_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "ok");
    }

    #[test]
    fn test_chat_response_empty_choices() {
        let raw = r#"{"choices":[]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.choices.is_empty());
    }

    #[test]
    fn test_malformed_response_body_maps_to_json_error() {
        let parse_err = serde_json::from_slice::<ChatResponse>(b"not json").unwrap_err();
        assert!(matches!(Error::from(parse_err), Error::Json(_)));
    }
}
