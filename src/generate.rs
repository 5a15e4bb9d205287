//! Generation stage: a filled prompt in, answer text out.
//!
//! [`OllamaGenerator`] calls `POST /api/chat` without streaming:
//!
//! ```text
//! → { "model": "llama3.2:3b", "stream": false,
//!     "messages": [{ "role": "user", "content": "<prompt>" }],
//!     "options": { "temperature": 0.0 } }
//! ← { "message": { "role": "assistant", "content": "<answer>" }, ... }
//! ```

use async_trait::async_trait;
use serde_json::Value;

use crate::config::Config;
use crate::error::{RagError, Result};
use crate::ollama;

const SERVICE: &str = "generation";

#[async_trait]
pub trait Generator: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String>;
}

pub struct OllamaGenerator {
    client: reqwest::Client,
    url: String,
    model: String,
    temperature: f32,
}

impl OllamaGenerator {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: ollama::build_client(&config.ollama)?,
            url: config.ollama.url.clone(),
            model: config.generation.model.clone(),
            temperature: config.generation.temperature,
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
            "options": { "temperature": self.temperature },
        });
        let json = ollama::post_json(&self.client, &self.url, "api/chat", &body, SERVICE).await?;
        parse_chat_response(&json)
    }
}

fn parse_chat_response(json: &Value) -> Result<String> {
    json.get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| RagError::malformed(SERVICE, "missing message.content"))
}
