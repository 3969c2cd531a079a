//! Historical Backfill
//!
//! Seeds the frequency table from the provider's recent-search endpoint when no
//! snapshot exists. Pages are walked with the provider's cursor until a page comes
//! back without one.
//!
//! The search endpoint allows 450 requests per 15 minutes, so consecutive requests
//! are spaced by `page_delay` (2s by default). A failed request ends the backfill:
//! whatever was counted so far is kept and the live stream fills in the rest.

use super::types::BackfillReport;
use crate::provider::SearchProvider;
use crate::words::DocumentHandler;

use std::sync::Arc;
use std::time::Duration;

pub struct BackfillIngestor<P> {
    provider: Arc<P>,
    filter: String,
    handler: DocumentHandler,
    page_delay: Duration,
}

impl<P: SearchProvider> BackfillIngestor<P> {
    pub fn new(
        provider: Arc<P>,
        filter: &str,
        handler: DocumentHandler,
        page_delay: Duration,
    ) -> Self {
        Self {
            provider,
            filter: filter.to_string(),
            handler,
            page_delay,
        }
    }

    /// Walks every page once. Never fails; see [`BackfillReport::completed`].
    pub async fn run(&self) -> BackfillReport {
        tracing::info!("Backfilling from recent search for {}", self.filter);

        let mut report = BackfillReport::default();
        let mut cursor: Option<String> = None;

        loop {
            let page = match self
                .provider
                .search_recent(&self.filter, cursor.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(
                        "Could not seed data after {} pages, keeping {} documents: {}",
                        report.pages,
                        report.documents,
                        e
                    );
                    return report;
                }
            };

            report.pages += 1;
            tracing::debug!(
                "Backfill page {} with {} documents",
                report.pages,
                page.documents.len()
            );

            for text in &page.documents {
                (self.handler)(text.as_str());
                report.documents += 1;
            }

            match page.next_cursor.filter(|next| !next.is_empty()) {
                Some(next) => cursor = Some(next),
                None => break,
            }

            tokio::time::sleep(self.page_delay).await;
        }

        report.completed = true;
        tracing::info!(
            "Backfill finished: {} pages, {} documents",
            report.pages,
            report.documents
        );
        report
    }
}
