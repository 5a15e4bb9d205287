//! HTTP plumbing shared by the Ollama embedding and chat clients.
//!
//! Failures are classified once here: transport errors and non-success
//! statuses become [`RagError::ServiceUnavailable`], undecodable bodies
//! become [`RagError::MalformedResponse`]. Nothing is retried.

use std::time::Duration;

use serde_json::Value;

use crate::config::OllamaConfig;
use crate::error::{RagError, Result};

/// Build a client honouring `ollama.timeout_secs` (`0` means no timeout).
pub(crate) fn build_client(config: &OllamaConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if config.timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(config.timeout_secs));
    }
    builder
        .build()
        .map_err(|e| RagError::unavailable("ollama", format!("failed to build HTTP client: {}", e)))
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// POST a JSON body and return the decoded JSON response.
pub(crate) async fn post_json(
    client: &reqwest::Client,
    base_url: &str,
    path: &str,
    body: &Value,
    service: &'static str,
) -> Result<Value> {
    let url = endpoint(base_url, path);
    tracing::debug!(%url, service, "POST");

    let response = client.post(&url).json(body).send().await.map_err(|e| {
        RagError::unavailable(
            service,
            format!("connection error (is Ollama running at {}?): {}", base_url, e),
        )
    })?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        return Err(RagError::unavailable(
            service,
            format!("Ollama API error {}: {}", status, body_text),
        ));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| RagError::malformed(service, format!("response is not JSON: {}", e)))
}
