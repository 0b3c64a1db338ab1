//! Language-model collaborators for the distraction classifier.

use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;
use serde_json::json;

use crate::error::{CoreError, Result};

pub type CompleteFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// Opaque chat-completion collaborator: one system/user exchange in, free
/// text out. The core never inspects the reply beyond the `"OK"` sentinel.
pub trait LanguageModel: Send + Sync {
    fn complete<'a>(&'a self, system: &'a str, user: &'a str) -> CompleteFuture<'a>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatModel {
    base_url: String,
    api_key: String,
    model: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl ChatModel {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            http: reqwest::Client::new(),
        }
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Classifier(format!(
                "model endpoint returned {status}"
            )));
        }

        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| CoreError::Classifier("model response had no choices".to_string()))
    }
}

impl LanguageModel for ChatModel {
    fn complete<'a>(&'a self, system: &'a str, user: &'a str) -> CompleteFuture<'a> {
        Box::pin(self.chat(system, user))
    }
}
