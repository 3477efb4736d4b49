//! Response generation over an OpenAI-compatible chat completions API
//!
//! Works against any endpoint speaking the `/v1/chat/completions` shape; the
//! default config points at a local Ollama.

use async_trait::async_trait;

use crate::adapters::{GenerateError, ResponseGenerator};
use crate::config::LlmConfig;
use crate::dialog::{ConversationHistory, Speaker};

#[derive(serde::Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(serde::Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Generates assistant replies carrying status markers
pub struct ChatGenerator {
    client: reqwest::Client,
    config: LlmConfig,
    system_prompt: String,
}

impl ChatGenerator {
    /// Create a generator against the configured chat endpoint
    #[must_use]
    pub fn new(config: LlmConfig, system_prompt: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            system_prompt,
        }
    }

    /// Map the conversation so far into the chat message list
    fn build_messages(&self, history: &ConversationHistory, user_text: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage {
            role: "system",
            content: self.system_prompt.clone(),
        });

        // The latest caller utterance is already the last history entry; it
        // is sent as the closing user message instead.
        let entries = history.entries();
        let context = if entries
            .last()
            .is_some_and(|e| e.speaker == Speaker::Caller && e.text == user_text)
        {
            &entries[..entries.len() - 1]
        } else {
            entries
        };

        for entry in context {
            messages.push(ChatMessage {
                role: match entry.speaker {
                    Speaker::Caller => "user",
                    Speaker::Assistant => "assistant",
                },
                content: entry.text.clone(),
            });
        }

        messages.push(ChatMessage {
            role: "user",
            content: user_text.to_string(),
        });
        messages
    }
}

#[async_trait(?Send)]
impl ResponseGenerator for ChatGenerator {
    async fn generate(
        &self,
        history: &ConversationHistory,
        user_text: &str,
    ) -> std::result::Result<String, GenerateError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: self.build_messages(history, user_text),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        tracing::debug!(url = %url, model = %self.config.model, "requesting completion");

        let mut builder = self.client.post(&url).json(&request);
        if let Some(ref key) = self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, "chat request failed");
            GenerateError::Service(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat API error");
            return Err(GenerateError::Service(format!(
                "chat API error {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Service(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenerateError::Service("empty completion".to_string()))?;

        tracing::debug!(reply_len = text.len(), "completion received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;

    #[test]
    fn test_messages_include_system_and_latest_user() {
        let generator = ChatGenerator::new(LlmConfig::default(), "persona".to_string());
        let mut history = ConversationHistory::new();
        history.push_caller("हाँ interest है");
        history.push_assistant("आपका नाम क्या है?");
        history.push_caller("Ravi");

        let messages = generator.build_messages(&history, "Ravi");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[3].role, "user");
        assert_eq!(messages[3].content, "Ravi");
    }

    #[test]
    fn test_latest_utterance_not_duplicated() {
        let generator = ChatGenerator::new(LlmConfig::default(), "persona".to_string());
        let mut history = ConversationHistory::new();
        history.push_caller("hello");

        let messages = generator.build_messages(&history, "hello");
        let user_turns = messages.iter().filter(|m| m.role == "user").count();
        assert_eq!(user_turns, 1);
    }
}
