pub mod answer;
pub mod cache;
pub mod chunking;
pub mod clients;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod retrieval;
pub mod settings;
pub mod traits;

pub use answer::{answer_query, build_prompt, enforce_citation, NOT_FOUND_ANSWER};
pub use cache::EmbeddingCache;
pub use chunking::{chunk_page, ChunkingConfig};
pub use clients::{GeminiEmbedder, GeminiGenerator};
pub use embeddings::{CharacterNgramEmbedder, StubGenerator, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{IngestError, QaError};
pub use extractor::{LopdfExtractor, PageText, PdfExtractor};
pub use ingest::{discover_pdf_files, ingest_documents, short_name};
pub use models::{Chunk, Citation, IngestionOptions, QaResponse, ResponseMeta};
pub use orchestrator::QaPipeline;
pub use retrieval::{cosine_similarity, index_embeddings, search};
pub use settings::Settings;
pub use traits::{EmbeddingProvider, GenerationProvider};
