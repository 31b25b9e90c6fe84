use serde::{Deserialize, Serialize};

/// A bounded window of one page's extracted text, the unit of retrieval.
/// The embedding is attached once, after the first index pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub doc_id: String,
    pub filename: String,
    pub page: u32,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Pointer from an answer back to the passage that grounds it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    pub doc_id: String,
    pub filename: String,
    pub page: u32,
    pub excerpt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub used_model: String,
    pub num_docs: usize,
    pub retrieval_k: usize,
    pub latency_ms: u64,
    /// min(1.0, citations / max(1, k)). A coverage ratio of the requested
    /// retrieval depth, not a calibrated probability.
    pub confidence: f32,
}

/// Final structured answer for one question, immutable once assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaResponse {
    pub query: String,
    pub answer: String,
    pub citations: Vec<Citation>,
    pub meta: ResponseMeta,
    pub logs: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct IngestionOptions {
    pub window_chars: usize,
    pub overlap_chars: usize,
    pub max_chunks_per_doc: usize,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            window_chars: 1_200,
            overlap_chars: 150,
            max_chunks_per_doc: 1_000,
        }
    }
}
