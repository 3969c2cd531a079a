//! Error Taxonomy
//!
//! Separates failures that only cost some data (a dropped backfill page, a broken
//! feed session) from failures that make live ingestion impossible.
//!
//! - [`ProviderError`]: anything the remote content provider can do wrong.
//! - [`IngestError`]: what the ingestors report upwards. Only
//!   [`IngestError::FatalConfiguration`] should ever stop the process.

use thiserror::Error;

/// Failure talking to the remote search/stream provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed provider payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("provider rejected request: {0}")]
    Rejected(String),

    #[error("feed closed")]
    FeedClosed,

    #[error("feed sent no data for {0:?}")]
    Stalled(std::time::Duration),

    #[error("feed line longer than {limit} bytes")]
    LineTooLong { limit: usize },
}

#[derive(Debug, Error)]
pub enum IngestError {
    /// The filter rule set could not be installed. No relevant live events will
    /// ever arrive, so the caller should halt.
    #[error("fatal configuration error: {context}: {source}")]
    FatalConfiguration {
        context: String,
        #[source]
        source: ProviderError,
    },

    #[error("transient provider error: {0}")]
    Transient(#[from] ProviderError),
}

impl IngestError {
    pub fn fatal(context: impl Into<String>, source: ProviderError) -> Self {
        Self::FatalConfiguration {
            context: context.into(),
            source,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FatalConfiguration { .. })
    }
}
