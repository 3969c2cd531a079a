//! Live Tweet Word Frequency Service
//!
//! This library crate defines the modules behind the word-cloud backend binary (`main.rs`).
//! Tweets matching a filter are pulled from the provider, split into normalized
//! words and counted in one shared table, which is served over HTTP and
//! periodically persisted.
//!
//! ## Architecture Modules
//! - **`words`**: The aggregation core. Tokenizer, the concurrent `FrequencyTable`
//!   and the `GET /words` handler.
//! - **`ingestion`**: The two intake paths. A one-off paginated backfill and the
//!   endless live stream with rule installation and reconnects.
//! - **`provider`**: The remote search/stream service behind three small traits,
//!   plus the reqwest client implementing them.
//! - **`snapshot`**: Restore-or-backfill at startup and the periodic save loop.
//! - **`config`** / **`error`**: Startup configuration and the error taxonomy.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod provider;
pub mod snapshot;
pub mod words;
