//! Process Configuration
//!
//! Everything is read once at startup from the environment (with command-line
//! overrides applied by the binary). Nothing is reloaded afterwards.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FILTER: &str = "\"terraform cloud\"";
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_SEED_FILE: &str = "seed.conf";
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";
pub const DEFAULT_LANGUAGE: &str = "en";

/// 10 minutes between snapshots.
pub const DEFAULT_SAVE_INTERVAL: Duration = Duration::from_secs(10 * 60);
/// 450 requests / 15 minutes is one request every 2s.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(2);

/// Words that match the filter itself, plus URL leftovers.
pub const DEFAULT_DENYLIST: &[&str] = &["terraform", "'terraform", "cloud", "hashicorp", "https"];

#[derive(Debug, Clone)]
pub struct Config {
    pub bearer_token: String,
    pub filter: String,
    pub bind_addr: SocketAddr,
    pub seed_file: PathBuf,
    pub save_interval: Duration,
    pub page_delay: Duration,
    pub language: String,
    pub denylist: HashSet<String>,
    pub api_base: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't have to touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bearer_token = lookup("TWITTER_BEARER_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .context("TWITTER_BEARER_TOKEN is not set")?;

        let bind_addr = lookup("WORDS_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .context("WORDS_BIND is not a valid socket address")?;

        let save_interval = match lookup("WORDS_SAVE_INTERVAL_SECS") {
            Some(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .context("WORDS_SAVE_INTERVAL_SECS is not a number")?;
                anyhow::ensure!(secs > 0, "WORDS_SAVE_INTERVAL_SECS must be > 0");
                Duration::from_secs(secs)
            }
            None => DEFAULT_SAVE_INTERVAL,
        };

        let page_delay = match lookup("WORDS_PAGE_DELAY_MS") {
            Some(raw) => {
                Duration::from_millis(raw.parse::<u64>().context("WORDS_PAGE_DELAY_MS is not a number")?)
            }
            None => DEFAULT_PAGE_DELAY,
        };

        let denylist = match lookup("WORDS_DENYLIST") {
            Some(raw) => parse_denylist(&raw),
            None => DEFAULT_DENYLIST.iter().map(|w| w.to_string()).collect(),
        };

        Ok(Self {
            bearer_token,
            filter: lookup("WORDS_FILTER").unwrap_or_else(|| DEFAULT_FILTER.to_string()),
            bind_addr,
            seed_file: lookup("WORDS_SEED_FILE")
                .unwrap_or_else(|| DEFAULT_SEED_FILE.to_string())
                .into(),
            save_interval,
            page_delay,
            language: lookup("WORDS_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            denylist,
            api_base: lookup("TWITTER_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

fn parse_denylist(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|word| word.trim().to_lowercase())
        .filter(|word| !word.is_empty())
        .collect()
}
