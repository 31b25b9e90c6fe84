use thiserror::Error;

/// Failures on the document side of the pipeline. These are caught per
/// document during ingestion and turn into diagnostics, never into a
/// failed request.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),
}

/// Failures on the model-client and pipeline side. These propagate to the
/// caller; there is no retry policy anywhere in the system.
#[derive(Debug, Error)]
pub enum QaError {
    #[error("missing credential: {0}")]
    MissingCredential(String),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request failed: {0}")]
    Request(String),
}

pub type Result<T, E = QaError> = std::result::Result<T, E>;
