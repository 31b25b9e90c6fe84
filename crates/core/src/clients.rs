use crate::error::QaError;
use crate::traits::{EmbeddingProvider, GenerationProvider};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

fn require_api_key(api_key: Option<&str>, client_kind: &str) -> Result<String, QaError> {
    match api_key {
        Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(QaError::MissingCredential(format!(
            "GOOGLE_API_KEY missing for {client_kind} client"
        ))),
    }
}

/// Blocking embeddings client for the Gemini batch-embedding endpoint.
pub struct GeminiEmbedder {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

impl GeminiEmbedder {
    /// Fails immediately when the credential is absent; this is the only
    /// point at which a missing key becomes fatal.
    pub fn new(api_key: Option<&str>, model: impl Into<String>) -> Result<Self, QaError> {
        let api_key = require_api_key(api_key, "embedding")?;
        Ok(Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            api_key,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl EmbeddingProvider for GeminiEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, QaError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let payload = BatchEmbedRequest {
            requests: batch
                .iter()
                .map(|text| EmbedRequest {
                    model: format!("models/{}", self.model),
                    content: Content {
                        parts: vec![Part { text: text.as_str() }],
                    },
                })
                .collect(),
        };

        let response = self
            .client
            .post(format!(
                "{}/models/{}:batchEmbedContents",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()?;

        if !response.status().is_success() {
            return Err(QaError::BackendResponse {
                backend: "gemini-embeddings".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: BatchEmbedResponse = response.json()?;
        if parsed.embeddings.len() != batch.len() {
            return Err(QaError::BackendResponse {
                backend: "gemini-embeddings".to_string(),
                details: format!(
                    "{} embeddings returned for {} inputs",
                    parsed.embeddings.len(),
                    batch.len()
                ),
            });
        }

        Ok(parsed
            .embeddings
            .into_iter()
            .map(|embedding| embedding.values)
            .collect())
    }
}

/// Blocking completion client for the Gemini generateContent endpoint.
pub struct GeminiGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiGenerator {
    pub fn new(api_key: Option<&str>, model: impl Into<String>) -> Result<Self, QaError> {
        let api_key = require_api_key(api_key, "generation")?;
        Ok(Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            api_key,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl GenerationProvider for GeminiGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str) -> Result<String, QaError> {
        let payload = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()?;

        if !response.status().is_success() {
            return Err(QaError::BackendResponse {
                backend: "gemini-generation".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: GenerateResponse = response.json()?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(text)
    }
}
