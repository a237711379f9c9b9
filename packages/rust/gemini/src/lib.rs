//! Gemini `generateContent` client.
//!
//! Sends a single-turn text prompt and returns the concatenated text of the
//! first candidate. No streaming, no retries, and no timeout unless one is
//! configured.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use promptpage_shared::{EditorConfig, PromptPageError, Result, Secret, error_chain};

const USER_AGENT: &str = concat!("promptpage/", env!("CARGO_PKG_VERSION"));

const API_KEY_HEADER: &str = "x-goog-api-key";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, `None` when there is none or it is empty.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    endpoint: String,
    model: String,
    api_key: Secret,
}

impl GeminiClient {
    pub fn new(config: &EditorConfig) -> Result<Self> {
        let gemini = &config.settings.gemini;

        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(secs) = gemini.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(|e| {
            PromptPageError::Generation(format!("failed to build HTTP client: {}", error_chain(&e)))
        })?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}/models/{}:generateContent",
                gemini.api_base.trim_end_matches('/'),
                gemini.model
            ),
            model: gemini.model.clone(),
            api_key: config.gemini_api_key.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `prompt` and return the model's text.
    #[instrument(skip_all, fields(model = %self.model, prompt_bytes = prompt.len()))]
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .header(API_KEY_HEADER, self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| PromptPageError::Generation(error_chain(&e)))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| {
                PromptPageError::Generation(format!("failed to read body: {}", error_chain(&e)))
            })?;
        if !status.is_success() {
            return Err(PromptPageError::Generation(format!(
                "HTTP {status}: {}",
                text.trim()
            )));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| PromptPageError::Generation(format!("unexpected response: {e}")))?;
        let completion = parsed
            .into_text()
            .ok_or_else(|| PromptPageError::Generation("no completion returned".into()))?;

        debug!(bytes = completion.len(), "received completion");
        Ok(completion)
    }
}
