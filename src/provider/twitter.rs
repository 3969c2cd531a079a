//! Twitter v2 Client
//!
//! Implements the provider traits over HTTP with a bearer token.
//!
//! ## Live feed
//! `open_stream` returns as soon as the stream response headers arrive. A
//! background task then reads the body chunk by chunk, splits it into lines and
//! forwards each tweet's text into the session channel. When the connection
//! ends, fails or stays silent past the idle timeout, the task sends one final
//! `Err` and exits.

use super::protocol::*;
use super::types::{FeedEvent, FeedReceiver, NewRule, Rule, SearchPage};
use super::{RuleProvider, SearchProvider, StreamProvider};
use crate::error::ProviderError;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::mpsc;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// The provider sends a keep-alive newline every 20s.
pub const STREAM_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const FEED_BUFFER: usize = 256;

#[derive(Clone)]
pub struct TwitterClient {
    http_client: reqwest::Client,
    base_url: String,
    bearer_token: String,
    stream_idle_timeout: Duration,
}

impl TwitterClient {
    pub fn new(base_url: &str, bearer_token: &str) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.to_string(),
            stream_idle_timeout: STREAM_IDLE_TIMEOUT,
        }
    }

    /// How long the live feed may stay silent before the session is treated as dead.
    pub fn with_stream_idle_timeout(mut self, timeout: Duration) -> Self {
        self.stream_idle_timeout = timeout;
        self
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let response = self
            .http_client
            .get(self.url(endpoint))
            .bearer_auth(&self.bearer_token)
            .query(query)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        let response = self
            .http_client
            .post(self.url(endpoint))
            .bearer_auth(&self.bearer_token)
            .json(body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

impl SearchProvider for TwitterClient {
    async fn search_recent(
        &self,
        query: &str,
        cursor: Option<&str>,
    ) -> Result<SearchPage, ProviderError> {
        let mut params = vec![("query", query), ("max_results", SEARCH_PAGE_SIZE)];
        if let Some(token) = cursor {
            params.push(("next_token", token));
        }

        let response: SearchResponse = self.get_json(ENDPOINT_SEARCH_RECENT, &params).await?;
        tracing::debug!(
            "Search page returned {} tweets (next token: {:?})",
            response.meta.result_count,
            response.meta.next_token
        );

        Ok(SearchPage {
            documents: response.data.into_iter().map(|tweet| tweet.text).collect(),
            next_cursor: response.meta.next_token,
        })
    }
}

impl RuleProvider for TwitterClient {
    async fn list_rules(&self) -> Result<Vec<Rule>, ProviderError> {
        let response: RulesResponse = self.get_json(ENDPOINT_STREAM_RULES, &[]).await?;
        response.into_result()
    }

    async fn delete_rules(&self, ids: &[String]) -> Result<(), ProviderError> {
        let request = DeleteRulesRequest {
            delete: DeleteIds { ids: ids.to_vec() },
        };
        let response: RulesResponse = self.post_json(ENDPOINT_STREAM_RULES, &request).await?;
        response.into_result().map(|_| ())
    }

    async fn add_rule(&self, rule: &NewRule) -> Result<(), ProviderError> {
        let request = AddRulesRequest {
            add: vec![rule.clone()],
        };
        let response: RulesResponse = self.post_json(ENDPOINT_STREAM_RULES, &request).await?;
        response.into_result().map(|_| ())
    }
}

impl StreamProvider for TwitterClient {
    async fn open_stream(&self) -> Result<FeedReceiver, ProviderError> {
        // No request timeout: the body never ends on its own. Silence is
        // caught per chunk in `read_feed` instead.
        let response = self
            .http_client
            .get(self.url(ENDPOINT_STREAM))
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        let idle_timeout = self.stream_idle_timeout;
        tokio::spawn(async move {
            read_feed(response, tx, idle_timeout).await;
        });

        Ok(rx)
    }
}

async fn read_feed(
    mut response: reqwest::Response,
    tx: mpsc::Sender<FeedEvent>,
    idle_timeout: Duration,
) {
    let mut lines = LineBuffer::new(MAX_STREAM_LINE);

    loop {
        let chunk = match tokio::time::timeout(idle_timeout, response.chunk()).await {
            Ok(Ok(Some(chunk))) => chunk,
            Ok(Ok(None)) => {
                if let Some(tail) = lines.finish() {
                    if !forward_line(&tail, &tx).await {
                        return;
                    }
                }
                let _ = tx.send(Err(ProviderError::FeedClosed)).await;
                return;
            }
            Ok(Err(e)) => {
                let _ = tx.send(Err(ProviderError::Transport(e))).await;
                return;
            }
            Err(_) => {
                let _ = tx.send(Err(ProviderError::Stalled(idle_timeout))).await;
                return;
            }
        };

        for line in lines.push(&chunk) {
            if !forward_line(&line, &tx).await {
                return;
            }
        }

        if let Err(e) = lines.check_limit() {
            let _ = tx.send(Err(e)).await;
            return;
        }
    }
}

/// Parses one line and forwards its tweet. Returns `false` when the session must end.
async fn forward_line(line: &[u8], tx: &mpsc::Sender<FeedEvent>) -> bool {
    match parse_stream_line(line) {
        // A closed channel means the consumer went away, drop the connection.
        Ok(Some(text)) => tx.send(Ok(text)).await.is_ok(),
        Ok(None) => true,
        Err(ProviderError::Payload(e)) => {
            tracing::warn!("Skipping malformed stream line: {}", e);
            true
        }
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            false
        }
    }
}
