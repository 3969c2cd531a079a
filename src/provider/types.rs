//! Provider Data Types
//!
//! What the ingestors see of the remote provider, independent of its wire format.

use crate::error::ProviderError;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// One page of historical search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    /// Raw tweet texts, in provider order.
    pub documents: Vec<String>,
    /// Continuation token for the next page. `None` (or empty) means this was the last page.
    pub next_cursor: Option<String>,
}

/// A filter rule currently active on the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub value: String,
    #[serde(default)]
    pub tag: Option<String>,
}

/// A filter rule to be installed. The provider assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRule {
    pub value: String,
    pub tag: String,
}

impl NewRule {
    /// The single rule derived from the configured filter: value and tag are both the filter.
    pub fn from_filter(filter: &str) -> Self {
        Self {
            value: filter.to_string(),
            tag: filter.to_string(),
        }
    }
}

/// One receive on a live feed: either a document's text or the error that ended the session.
pub type FeedEvent = Result<String, ProviderError>;

/// Receiving side of one live feed session.
pub type FeedReceiver = mpsc::Receiver<FeedEvent>;
