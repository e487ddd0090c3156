//! Chat responder: completion-service call with an offline fallback.
//!
//! The backend behind [`Responder`] is a trait object so the process
//! wires it up once at startup and tests substitute mocks. Exactly one
//! completion attempt is made per request; any failure (missing key,
//! network, non-success status, malformed body) drops to a deterministic
//! templated reply that never touches the service again.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::config::CompletionConfig;
use crate::context;
use crate::models::UserData;

/// Instruction prompt for the general assistant mode.
pub const GENERAL_SYSTEM_PROMPT: &str = "You are Insightmate, a helpful AI assistant. You can help with:\n\
     - General questions and conversation\n\
     - Programming and coding help\n\
     - Writing assistance\n\
     - Productivity tips\n\
     - Technical explanations\n\
     Be friendly, helpful, and concise in your responses.";

/// Instruction prompt for the personalized mode; the assembled user
/// context is appended below it.
pub const PERSONALIZED_SYSTEM_PROMPT: &str = "You are Insightmate, a personalized AI assistant with access to the user's \
     portfolio, resume, and personal data. Use this information to provide \
     context-aware, personalized responses about:\n\
     - Career advice based on their background\n\
     - Resume feedback and improvements\n\
     - Job application guidance\n\
     - Portfolio analysis\n\
     - Professional development suggestions\n\
     Always reference specific details from their data when relevant.\n\
     Be encouraging and provide actionable advice.";

/// Chat mode requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    General,
    Personalized,
}

impl ChatMode {
    /// `"general"` selects general mode; anything else is personalized.
    pub fn parse(mode: &str) -> Self {
        if mode == "general" {
            ChatMode::General
        } else {
            ChatMode::Personalized
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::General => "general",
            ChatMode::Personalized => "personalized",
        }
    }
}

/// A text-completion service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn name(&self) -> &str;
    /// One completion attempt. No retries happen at any layer.
    async fn complete(&self, system_prompt: &str, message: &str) -> Result<String>;
}

// ============ OpenAI-compatible backend ============

/// Calls an OpenAI-compatible `POST /chat/completions` endpoint with the
/// API key taken from the configured environment variable.
pub struct OpenAiBackend {
    config: CompletionConfig,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            config: config.clone(),
            client,
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, system_prompt: &str, message: &str) -> Result<String> {
        let api_key = std::env::var(&self.config.api_key_env)
            .map_err(|_| anyhow::anyhow!("{} environment variable not set", self.config.api_key_env))?;

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": message},
            ],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Completion API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_completion_response(&json)
    }
}

/// Extract `choices[0].message.content` from a chat-completions response.
fn parse_completion_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid completion response: missing message content"))
}

// ============ Disabled backend ============

/// Always fails, so every request takes the offline fallback path.
pub struct DisabledBackend;

#[async_trait]
impl CompletionBackend for DisabledBackend {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _system_prompt: &str, _message: &str) -> Result<String> {
        bail!("Completion provider is disabled")
    }
}

/// Create the backend matching the configuration.
pub fn create_backend(config: &CompletionConfig) -> Result<Box<dyn CompletionBackend>> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiBackend::new(config)?)),
        "disabled" => Ok(Box::new(DisabledBackend)),
        other => bail!("Unknown completion provider: {}", other),
    }
}

// ============ Responder ============

pub struct Responder {
    backend: Box<dyn CompletionBackend>,
}

impl Responder {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        Ok(Self {
            backend: create_backend(config)?,
        })
    }

    /// Build a responder around an explicit backend (used by tests).
    pub fn with_backend(backend: Box<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Answer a chat message. Infallible: completion failures degrade to
    /// the offline fallback.
    pub async fn respond(
        &self,
        message: &str,
        mode: ChatMode,
        user_data: Option<&UserData>,
    ) -> String {
        let system_prompt = match mode {
            ChatMode::General => GENERAL_SYSTEM_PROMPT.to_string(),
            ChatMode::Personalized => {
                let user_context = user_data
                    .map(context::build_context)
                    .unwrap_or_else(|| context::NO_DATA.to_string());
                format!(
                    "{}\n\nUser Context:\n{}",
                    PERSONALIZED_SYSTEM_PROMPT, user_context
                )
            }
        };

        match self.backend.complete(&system_prompt, message).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    backend = %self.backend.name(),
                    error = %e,
                    "completion failed, serving offline fallback"
                );
                fallback_response(message, mode, user_data)
            }
        }
    }
}

/// Deterministic reply used when the completion service is unreachable.
pub fn fallback_response(message: &str, mode: ChatMode, user_data: Option<&UserData>) -> String {
    match mode {
        ChatMode::General => format!(
            "I understand you're asking: \"{}\"\n\
             I'm currently running in fallback mode. Here are some ways I can help:\n\
             - Answer general questions about programming, career advice, and productivity\n\
             - Help with writing and communication\n\
             - Provide technical explanations\n\
             - Assist with project planning\n\
             Please note: To get full AI-powered responses, make sure your completion \
             service API key is set in the environment.",
            message
        ),
        ChatMode::Personalized => {
            let mut user_info = String::new();
            if let Some(data) = user_data {
                if !data.portfolio_links.is_empty() {
                    user_info.push_str(&format!(
                        "I can see you have {} portfolio links. ",
                        data.portfolio_links.len()
                    ));
                }
                if !data.files.is_empty() {
                    user_info.push_str(&format!("You've uploaded {} files. ", data.files.len()));
                }
            }
            format!(
                "I understand you're asking: \"{}\"\n\
                 {}I'm currently running in fallback mode, but I can still help with:\n\
                 - General career advice based on your uploaded information\n\
                 - Resume and portfolio feedback\n\
                 - Job application guidance\n\
                 - Professional development suggestions\n\
                 To get personalized AI-powered insights, please set up your completion \
                 service API key.",
                message, user_info
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileEntry, PortfolioLinkEntry};
    use chrono::Utc;
    use std::sync::{Arc, Mutex};

    struct MockBackend {
        reply: String,
    }

    #[async_trait]
    impl CompletionBackend for MockBackend {
        fn name(&self) -> &str {
            "mock"
        }
        async fn complete(&self, _system_prompt: &str, _message: &str) -> Result<String> {
            Ok(self.reply.clone())
        }
    }

    struct CapturingBackend {
        seen_prompt: Arc<Mutex<String>>,
    }

    #[async_trait]
    impl CompletionBackend for CapturingBackend {
        fn name(&self) -> &str {
            "capturing"
        }
        async fn complete(&self, system_prompt: &str, _message: &str) -> Result<String> {
            *self.seen_prompt.lock().unwrap() = system_prompt.to_string();
            Ok("ok".into())
        }
    }

    fn sample_data() -> UserData {
        let mut data = UserData::empty();
        data.portfolio_links.push(PortfolioLinkEntry {
            id: "1".into(),
            url: "https://github.com/x".into(),
            link_type: "github".into(),
            description: None,
            content: "repo list".into(),
            added_at: Utc::now(),
        });
        data.files.insert(
            "r.pdf".into(),
            FileEntry {
                filename: "r.pdf".into(),
                content: "resume".into(),
                file_type: "pdf".into(),
                uploaded_at: Utc::now(),
            },
        );
        data
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(ChatMode::parse("general"), ChatMode::General);
        assert_eq!(ChatMode::parse("personalized"), ChatMode::Personalized);
        // Anything that is not "general" takes the personalized path.
        assert_eq!(ChatMode::parse("anything"), ChatMode::Personalized);
    }

    #[tokio::test]
    async fn test_failed_completion_falls_back_without_error() {
        let responder = Responder::with_backend(Box::new(DisabledBackend));
        let reply = responder.respond("hi", ChatMode::General, None).await;
        assert!(reply.contains("\"hi\""));
        assert!(reply.contains("fallback mode"));
    }

    #[tokio::test]
    async fn test_personalized_fallback_mentions_counts() {
        let data = sample_data();
        let responder = Responder::with_backend(Box::new(DisabledBackend));
        let reply = responder
            .respond("how is my resume?", ChatMode::Personalized, Some(&data))
            .await;
        assert!(reply.contains("1 portfolio links"));
        assert!(reply.contains("1 files"));
        assert!(reply.contains("\"how is my resume?\""));
    }

    #[tokio::test]
    async fn test_successful_completion_passes_through() {
        let responder = Responder::with_backend(Box::new(MockBackend {
            reply: "Sure, here's an idea.".into(),
        }));
        let reply = responder.respond("hi", ChatMode::General, None).await;
        assert_eq!(reply, "Sure, here's an idea.");
    }

    #[tokio::test]
    async fn test_personalized_prompt_carries_user_context() {
        let seen = Arc::new(Mutex::new(String::new()));
        let responder = Responder::with_backend(Box::new(CapturingBackend {
            seen_prompt: seen.clone(),
        }));
        let data = sample_data();
        responder
            .respond("advice?", ChatMode::Personalized, Some(&data))
            .await;

        let prompt = seen.lock().unwrap().clone();
        assert!(prompt.contains("User Context:"));
        assert!(prompt.contains("github: https://github.com/x"));
        assert!(prompt.contains(" - r.pdf"));
    }

    #[tokio::test]
    async fn test_general_prompt_omits_user_context() {
        let seen = Arc::new(Mutex::new(String::new()));
        let responder = Responder::with_backend(Box::new(CapturingBackend {
            seen_prompt: seen.clone(),
        }));
        responder.respond("hi", ChatMode::General, None).await;

        let prompt = seen.lock().unwrap().clone();
        assert_eq!(prompt, GENERAL_SYSTEM_PROMPT);
    }

    #[test]
    fn test_parse_completion_response() {
        let json = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "hello there"}}]
        });
        assert_eq!(parse_completion_response(&json).unwrap(), "hello there");

        let bad = serde_json::json!({"choices": []});
        assert!(parse_completion_response(&bad).is_err());
    }
}
