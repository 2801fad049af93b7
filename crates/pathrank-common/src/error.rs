use thiserror::Error;

use crate::entities::{DiseaseId, GeneId};

/// Failure of a single remote lookup (pathway list, KGML document,
/// co-expression table or symbol search).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Unexpected response from {source_name}: {detail}")]
    Malformed { source_name: &'static str, detail: String },

    #[error("Network capabilities capped: domain not in allowlist for URL {0}")]
    Disallowed(String),

    #[error("Lookup cancelled")]
    Cancelled,
}

impl FetchError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Malformed { .. } | FetchError::Disallowed(_) | FetchError::Cancelled => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum PathrankError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Gene symbol could not be resolved: {0}")]
    UnknownGene(String),

    #[error("Reference gene {0} belongs to no pathway; similarity scoring is meaningless")]
    NoCandidatePathways(GeneId),

    #[error("No pathway document could be retrieved for gene {0}")]
    NoDocuments(GeneId),

    #[error("Disease {0} lists no pathways to compare")]
    NoDiseasePathways(DiseaseId),

    #[error("Run cancelled before any data was gathered")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PathrankError>;
