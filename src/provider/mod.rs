//! Content Provider Module
//!
//! The remote search/streaming service, seen from the ingestors.
//!
//! The ingestors are written against the three traits below rather than against
//! HTTP, so tests can script pages, rule sets and feed sessions without a network.
//!
//! ## Submodules
//! - **`twitter`**: `TwitterClient`, the reqwest implementation of all three traits.
//! - **`protocol`**: Endpoints and JSON bodies of the provider API.
//! - **`types`**: Provider-independent pages, rules and feed events.

pub mod protocol;
pub mod twitter;
pub mod types;


use crate::error::ProviderError;
use std::future::Future;
use types::{FeedReceiver, NewRule, Rule, SearchPage};

/// Paginated historical search.
pub trait SearchProvider: Send + Sync {
    /// Fetches one page of matches for `query`, starting at `cursor` (`None` for the first page).
    fn search_recent(
        &self,
        query: &str,
        cursor: Option<&str>,
    ) -> impl Future<Output = Result<SearchPage, ProviderError>> + Send;
}

/// Server-side filter rules that decide what the live feed delivers.
pub trait RuleProvider: Send + Sync {
    fn list_rules(&self) -> impl Future<Output = Result<Vec<Rule>, ProviderError>> + Send;

    fn delete_rules(&self, ids: &[String])
    -> impl Future<Output = Result<(), ProviderError>> + Send;

    fn add_rule(&self, rule: &NewRule) -> impl Future<Output = Result<(), ProviderError>> + Send;
}

/// The live feed of documents matching the installed rules.
pub trait StreamProvider: Send + Sync {
    /// Opens a new feed session. The receiver yields documents until one `Err`
    /// (or the channel closing) ends the session.
    fn open_stream(&self) -> impl Future<Output = Result<FeedReceiver, ProviderError>> + Send;
}
