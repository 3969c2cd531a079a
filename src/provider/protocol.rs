//! Provider Wire Protocol
//!
//! Endpoints and JSON bodies of the Twitter v2 API that the client speaks.

use super::types::{NewRule, Rule};
use crate::error::ProviderError;
use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Historical search over the last 7 days.
pub const ENDPOINT_SEARCH_RECENT: &str = "/2/tweets/search/recent";
/// List (GET) and modify (POST) filtered-stream rules.
pub const ENDPOINT_STREAM_RULES: &str = "/2/tweets/search/stream/rules";
/// Long-lived filtered stream, newline-delimited JSON.
pub const ENDPOINT_STREAM: &str = "/2/tweets/search/stream";

/// Largest page the recent search endpoint accepts.
pub const SEARCH_PAGE_SIZE: &str = "100";

/// Upper bound for one stream line. Tweets are a few KB at most.
pub const MAX_STREAM_LINE: usize = 1024 * 1024;

// --- Data Transfer Objects ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchMeta {
    #[serde(default)]
    pub next_token: Option<String>,
    #[serde(default)]
    pub result_count: u32,
}

/// Response of `GET /2/tweets/search/recent`. `data` is absent on empty pages.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<Tweet>,
    #[serde(default)]
    pub meta: SearchMeta,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiError {
    pub fn describe(&self) -> String {
        [&self.title, &self.detail, &self.message]
            .into_iter()
            .flatten()
            .cloned()
            .collect::<Vec<_>>()
            .join(": ")
    }
}

/// Response of both rule endpoints. A non-empty `errors` means the request was refused.
#[derive(Debug, Deserialize)]
pub struct RulesResponse {
    #[serde(default)]
    pub data: Vec<Rule>,
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

impl RulesResponse {
    pub fn into_result(self) -> Result<Vec<Rule>, ProviderError> {
        if self.errors.is_empty() {
            return Ok(self.data);
        }
        let reasons: Vec<String> = self.errors.iter().map(ApiError::describe).collect();
        Err(ProviderError::Rejected(reasons.join("; ")))
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteIds {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteRulesRequest {
    pub delete: DeleteIds,
}

#[derive(Debug, Serialize)]
pub struct AddRulesRequest {
    pub add: Vec<NewRule>,
}

/// One line of the filtered stream.
#[derive(Debug, Deserialize)]
pub struct StreamLine {
    #[serde(default)]
    pub data: Option<Tweet>,
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

/// Parses one line of the stream body.
///
/// Blank keep-alive lines give `Ok(None)`. A line carrying only `errors` is the
/// provider announcing a disconnect and is returned as `Rejected`.
pub fn parse_stream_line(line: &[u8]) -> Result<Option<String>, ProviderError> {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let parsed: StreamLine = serde_json::from_slice(trimmed)?;
    match parsed.data {
        Some(tweet) => Ok(Some(tweet.text)),
        None if !parsed.errors.is_empty() => {
            let reasons: Vec<String> = parsed.errors.iter().map(ApiError::describe).collect();
            Err(ProviderError::Rejected(reasons.join("; ")))
        }
        None => Ok(None),
    }
}

/// Splits the stream body into lines as chunks arrive.
#[derive(Debug)]
pub struct LineBuffer {
    pending: Vec<u8>,
    limit: usize,
}

impl LineBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            pending: Vec::new(),
            limit,
        }
    }

    /// Appends `chunk` and returns every line it completed, newline included.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            lines.push(self.pending.drain(..=pos).collect());
        }
        lines
    }

    /// Fails once the unterminated tail grows past the limit.
    pub fn check_limit(&mut self) -> Result<(), ProviderError> {
        if self.pending.len() > self.limit {
            self.pending.clear();
            return Err(ProviderError::LineTooLong { limit: self.limit });
        }
        Ok(())
    }

    /// The unterminated tail left when the body ends, if any.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}
