//! Ingestion Module
//!
//! Moves tweets from the remote provider into the word counting pipeline.
//!
//! ## Workflow
//! 1. **Backfill**: Run once at startup when there is no snapshot. Walks the recent
//!    search pages for the filter, rate limited between pages.
//! 2. **Stream**: Installs the filter rule, then consumes the live feed forever,
//!    reconnecting whenever a session breaks.
//!
//! Both hand each document's text to a `DocumentHandler` callback, normally the
//! tokenizer + frequency table pipeline from `words`.

pub mod backfill;
pub mod stream;
pub mod types;
