use crate::models::IngestionOptions;
use std::path::PathBuf;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_CACHE_PATH: &str = ".cache/embeddings.json";

/// Runtime configuration. Everything has a fixed default; `from_env`
/// overlays environment overrides. A missing API key is only a problem
/// once a network client is actually constructed.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub embedding_model: String,
    pub generation_model: String,
    pub chunk_chars: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub max_chunks_per_doc: usize,
    pub cache_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            chunk_chars: 1_200,
            chunk_overlap: 150,
            top_k: 3,
            max_chunks_per_doc: 1_000,
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.api_key = non_empty_env("GOOGLE_API_KEY");

        if let Some(model) = non_empty_env("PDF_QA_EMBEDDING_MODEL") {
            settings.embedding_model = model;
        }
        if let Some(model) = non_empty_env("PDF_QA_GENERATION_MODEL") {
            settings.generation_model = model;
        }
        if let Some(path) = non_empty_env("PDF_QA_CACHE_PATH") {
            settings.cache_path = PathBuf::from(path);
        }

        settings
    }

    pub fn ingestion_options(&self) -> IngestionOptions {
        IngestionOptions {
            window_chars: self.chunk_chars,
            overlap_chars: self.chunk_overlap,
            max_chunks_per_doc: self.max_chunks_per_doc,
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
