use crate::error::QaError;

/// Batch embedding capability: list in, list out, order preserving, one
/// vector per input string.
pub trait EmbeddingProvider {
    /// Model identifier, also used to key the embedding cache.
    fn model(&self) -> &str;

    fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, QaError>;
}

/// Text generation capability: prompt in, completion out.
pub trait GenerationProvider {
    fn model(&self) -> &str;

    fn generate(&self, prompt: &str) -> Result<String, QaError>;
}
