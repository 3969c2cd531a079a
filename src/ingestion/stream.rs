//! Live Stream Ingestion
//!
//! Keeps the process fed with new tweets for as long as it runs.
//!
//! ## Lifecycle
//! 1. **Rule installation** (`Unconfigured -> RuleInstalled`): every rule currently
//!    active on the provider is deleted and exactly one rule, value and tag both set
//!    to the filter, is added. Any failure here is fatal: with a broken rule set no
//!    relevant event will ever arrive, and nothing later retries it.
//! 2. **Streaming**: a feed session is opened and each document is passed to the
//!    processing callback in delivery order, one consumer per session.
//! 3. **Reconnecting**: the first error (or the feed closing) ends the session. The
//!    feed is re-opened after the delay given by the [`RetryPolicy`]. Sessions that
//!    die before `stable_after` count as failures and keep the backoff growing. Rules
//!    are not re-installed and documents missed in the gap are not recovered.

use super::types::{RetryPolicy, STABLE_SESSION, StreamState, StreamStats};
use crate::error::IngestError;
use crate::provider::types::{FeedReceiver, NewRule};
use crate::provider::{RuleProvider, StreamProvider};
use crate::words::DocumentHandler;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

pub struct StreamIngestor<P> {
    provider: Arc<P>,
    filter: String,
    handler: DocumentHandler,
    retry: RetryPolicy,
    stable_after: Duration,
    session_limit: Option<u64>,
    state: watch::Sender<StreamState>,
    stats: Arc<StreamStats>,
}

impl<P> StreamIngestor<P>
where
    P: RuleProvider + StreamProvider,
{
    pub fn new(provider: Arc<P>, filter: &str, handler: DocumentHandler) -> Self {
        let (state, _) = watch::channel(StreamState::Unconfigured);
        Self {
            provider,
            filter: filter.to_string(),
            handler,
            retry: RetryPolicy::default(),
            stable_after: STABLE_SESSION,
            session_limit: None,
            state,
            stats: Arc::new(StreamStats::default()),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// How long a session must stay up before the backoff starts over.
    pub fn with_stable_session(mut self, stable_after: Duration) -> Self {
        self.stable_after = stable_after;
        self
    }

    /// Stops after `limit` feed sessions instead of reconnecting forever.
    pub fn with_session_limit(mut self, limit: u64) -> Self {
        self.session_limit = Some(limit);
        self
    }

    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<StreamState> {
        self.state.subscribe()
    }

    pub fn stats(&self) -> Arc<StreamStats> {
        self.stats.clone()
    }

    /// Installs the filter rule, then streams forever.
    ///
    /// Only returns early with a fatal configuration error, or `Ok` once the
    /// session limit (if any) is used up.
    pub async fn run(&self) -> Result<(), IngestError> {
        self.install_rule().await?;
        self.consume().await;
        Ok(())
    }

    /// Replaces whatever rules are active with the single rule for our filter.
    pub async fn install_rule(&self) -> Result<(), IngestError> {
        let existing = self
            .provider
            .list_rules()
            .await
            .map_err(|e| IngestError::fatal("unable to list stream rules", e))?;

        if !existing.is_empty() {
            let ids: Vec<String> = existing.into_iter().map(|rule| rule.id).collect();
            tracing::info!("Deleting {} existing stream rules", ids.len());
            self.provider
                .delete_rules(&ids)
                .await
                .map_err(|e| IngestError::fatal(format!("unable to delete rules {:?}", ids), e))?;
        }

        let rule = NewRule::from_filter(&self.filter);
        self.provider.add_rule(&rule).await.map_err(|e| {
            IngestError::fatal(format!("unable to add search filter rule {}", self.filter), e)
        })?;

        tracing::info!("Installed stream rule {}", rule.value);
        self.set_state(StreamState::RuleInstalled);
        Ok(())
    }

    /// The reconnect loop. Never returns unless a session limit is set.
    pub async fn consume(&self) {
        let mut consecutive_failures: u32 = 0;

        loop {
            let session = self.stats.session_opened();

            match self.provider.open_stream().await {
                Ok(mut feed) => {
                    let opened = Instant::now();
                    self.set_state(StreamState::Streaming);
                    tracing::info!("Stream session {} opened", session);

                    self.receive(&mut feed).await;
                    if opened.elapsed() >= self.stable_after {
                        consecutive_failures = 0;
                    } else {
                        consecutive_failures = consecutive_failures.saturating_add(1);
                    }
                }
                Err(e) => {
                    tracing::warn!("Unable to open stream (session {}): {}", session, e);
                    consecutive_failures = consecutive_failures.saturating_add(1);
                }
            }

            if self.session_limit.is_some_and(|limit| session >= limit) {
                tracing::info!("Stream session limit of {} reached", session);
                return;
            }

            self.set_state(StreamState::Reconnecting);
            self.stats.reconnecting();

            let delay = self.retry.delay(consecutive_failures);
            if !delay.is_zero() {
                tracing::info!("Reconnecting to stream in {:?}", delay);
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Drains one session. Returns how many documents it delivered.
    async fn receive(&self, feed: &mut FeedReceiver) -> u64 {
        let mut delivered = 0;

        while let Some(event) = feed.recv().await {
            match event {
                Ok(text) => {
                    (self.handler)(text.as_str());
                    self.stats.document_processed();
                    delivered += 1;
                }
                Err(e) => {
                    tracing::warn!("Stream session ended after {} documents: {}", delivered, e);
                    return delivered;
                }
            }
        }

        tracing::warn!("Stream session closed after {} documents", delivered);
        delivered
    }

    fn set_state(&self, state: StreamState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::debug!("Stream state {:?} -> {:?}", previous, state);
        }
    }
}
