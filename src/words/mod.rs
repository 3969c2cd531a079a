//! Word Counting Module
//!
//! The aggregation core of the service: raw tweets go in, a live word → count
//! table comes out.
//!
//! ## Submodules
//! - **`tokenizer`**: Mention stripping, stopword removal, lowercasing and length/denylist filtering.
//! - **`table`**: The lock-guarded `FrequencyTable` shared by every other component.
//! - **`handlers`**: The `GET /words` endpoint for the Axum web server.
//! - **`types`**: The serializable `WordValues` document.

pub mod handlers;
pub mod table;
pub mod tokenizer;
pub mod types;


use std::sync::Arc;

use table::FrequencyTable;
use tokenizer::Tokenizer;

/// Tokenizes `text` and counts every surviving token.
pub fn count_document(tokenizer: &Tokenizer, table: &FrequencyTable, text: &str) {
    table.increment_all(tokenizer.tokenize(text));
}

/// Callback type fed with every ingested document.
pub type DocumentHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// The default pipeline: tokenizer into frequency table.
pub fn counting_handler(tokenizer: Arc<Tokenizer>, table: Arc<FrequencyTable>) -> DocumentHandler {
    Arc::new(move |text: &str| count_document(&tokenizer, &table, text))
}
