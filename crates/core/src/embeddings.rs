use crate::error::QaError;
use crate::traits::{EmbeddingProvider, GenerationProvider};

const DEFAULT: usize = 128;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = DEFAULT;

/// Deterministic offline embedder: hashed character trigrams, L2-normalized.
/// Stands in for the network client in tests and `--offline` runs.
#[derive(Debug, Clone)]
pub struct CharacterNgramEmbedder {
    pub dimensions: usize,
    model: String,
}

impl Default for CharacterNgramEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            model: format!("char-ngram-{DEFAULT_EMBEDDING_DIMENSIONS}"),
        }
    }
}

impl CharacterNgramEmbedder {
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            model: format!("char-ngram-{dimensions}"),
        }
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return vector;
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

impl EmbeddingProvider for CharacterNgramEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, QaError> {
        Ok(batch.iter().map(|text| self.embed(text)).collect())
    }
}

/// Fixed-reply generator for offline runs and tests.
#[derive(Debug, Clone)]
pub struct StubGenerator {
    pub reply: String,
}

impl Default for StubGenerator {
    fn default() -> Self {
        Self {
            reply: "Placeholder answer (offline generator).".to_string(),
        }
    }
}

impl GenerationProvider for StubGenerator {
    fn model(&self) -> &str {
        "stub-generator"
    }

    fn generate(&self, _prompt: &str) -> Result<String, QaError> {
        Ok(self.reply.clone())
    }
}
