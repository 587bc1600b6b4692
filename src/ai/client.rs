//! HTTP client for the hosted generative-text API.
//!
//! One request shape: a single text prompt, optionally constrained to a
//! structured JSON response schema. The API key is read from the
//! environment at call time, never cached, so rotating it needs no restart.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Errors from the generative-text boundary.
#[derive(Debug)]
pub enum GenError {
    /// No API key in the environment.
    MissingKey,
    /// Transport-level failure.
    Http(String),
    /// The service answered with a non-success status.
    Api(String),
    /// The response body had no usable text.
    Decode(String),
}

impl std::fmt::Display for GenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenError::MissingKey => {
                write!(f, "Generative API key not set ({} is empty)", API_KEY_ENV)
            }
            GenError::Http(e) => write!(f, "Generative API request failed: {}", e),
            GenError::Api(e) => write!(f, "Generative API error: {}", e),
            GenError::Decode(e) => write!(f, "Unusable generative API response: {}", e),
        }
    }
}

impl std::error::Error for GenError {}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    #[serde(rename = "responseSchema")]
    response_schema: Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Client for the generative-text service.
#[derive(Debug, Clone)]
pub struct GenClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl Default for GenClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GenClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Overrides the service endpoint, for a self-hosted proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn api_key(&self) -> Result<String, GenError> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => Err(GenError::MissingKey),
        }
    }

    /// Sends a plain-text prompt, returns the model's text.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, GenError> {
        self.generate(prompt, None).await
    }

    /// Sends a prompt constrained to a JSON schema, returns the parsed
    /// JSON value.
    pub async fn generate_json(&self, prompt: &str, schema: Value) -> Result<Value, GenError> {
        let text = self.generate(prompt, Some(schema)).await?;
        serde_json::from_str(&text).map_err(|e| GenError::Decode(e.to_string()))
    }

    async fn generate(&self, prompt: &str, schema: Option<Value>) -> Result<String, GenError> {
        let key = self.api_key()?;
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, key
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: schema.map(|response_schema| GenerationConfig {
                response_mime_type: "application/json",
                response_schema,
            }),
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GenError::Api(format!(
                "status {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenError::Decode(e.to_string()))?;

        let text: String = body
            .candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GenError::Decode("empty candidate text".to_string()));
        }
        Ok(text)
    }
}
