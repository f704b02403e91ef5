use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::DialogueConfig;

/// API version header required by the Messages endpoint
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Environment variable holding the API credential
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// The two request shapes a round can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundKind {
    Casual,
    Existential,
}

/// Client for the hosted text-generation endpoint. One line of dialogue per
/// call; no retries, no caching, no backoff.
#[derive(Debug, Clone)]
pub struct DialogueClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
    stream: bool,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub text: Option<String>,
}

impl DialogueClient {
    pub fn new(config: &DialogueConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    /// Generate one short line spoken by `speaker` toward `addressee`.
    pub async fn generate_line(
        &self,
        speaker: &str,
        addressee: &str,
        kind: RoundKind,
    ) -> Result<String> {
        let api_key = std::env::var(API_KEY_VAR)
            .map_err(|_| anyhow!("{} is not set", API_KEY_VAR))?;

        let (system, prompt) = round_prompt(speaker, addressee, kind);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .context("request to text generation endpoint failed")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "API request failed with status {}",
                response.status()
            ));
        }

        let body: MessagesResponse = response
            .json()
            .await
            .context("failed to decode text generation response")?;

        extract_reply(&body)
    }
}

/// Pull the first content block's text out of a Messages response.
pub fn extract_reply(body: &MessagesResponse) -> Result<String> {
    body.content
        .first()
        .and_then(|block| block.text.as_deref())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| anyhow!("unexpected API response structure"))
}

/// Build the system instruction and user prompt for one side of a round.
fn round_prompt(speaker: &str, addressee: &str, kind: RoundKind) -> (String, String) {
    let system = format!(
        "You are {}, one of many circles drifting on a shared canvas. \
         You speak in single short sentences addressed to another circle.",
        speaker
    );
    let prompt = match kind {
        RoundKind::Casual => format!(
            "Generate a single sentence response to {}. Choose a random \
             personality trait and emotional tone for your character. \
             Keep it under 15 words.",
            addressee
        ),
        RoundKind::Existential => format!(
            "Respond to {} with a single sentence of quiet existential doubt \
             about being a circle on a canvas that could be cleared at any \
             moment. Keep it under 15 words.",
            addressee
        ),
    };
    (system, prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_is_first_content_block_text() {
        let body: MessagesResponse = serde_json::from_str(
            r#"{
                "id": "msg_01",
                "type": "message",
                "role": "assistant",
                "content": [{"type": "text", "text": "  Hello over there.  "}],
                "stop_reason": "end_turn"
            }"#,
        )
        .unwrap();
        assert_eq!(extract_reply(&body).unwrap(), "Hello over there.");
    }

    #[test]
    fn empty_or_malformed_content_is_an_error() {
        let body: MessagesResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert!(extract_reply(&body).is_err());

        let body: MessagesResponse =
            serde_json::from_str(r#"{"content": [{"type": "tool_use"}]}"#).unwrap();
        assert!(extract_reply(&body).is_err());

        let body: MessagesResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(extract_reply(&body).is_err());
    }

    #[test]
    fn prompts_name_both_sides_of_the_exchange() {
        let (system, prompt) = round_prompt("Mira", "Omar", RoundKind::Casual);
        assert!(system.contains("Mira"));
        assert!(prompt.contains("Omar"));

        let (_, existential) = round_prompt("Mira", "Omar", RoundKind::Existential);
        assert_ne!(prompt, existential);
    }
}
