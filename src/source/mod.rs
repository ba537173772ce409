//! Source document retrieval.
//!
//! Pages are fetched over HTTP and reduced to plain text whose paragraphs
//! are separated by blank lines, ready for the chunker.

pub mod fetcher;
pub mod site;

use crate::error::AnalysisError;
use async_trait::async_trait;
use tracing::warn;

pub use fetcher::{html_to_text, HttpSourceFetcher};
pub use site::{BankSite, Document};

/// Supplies page content given a URL.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Download the raw HTML of a page.
    async fn fetch_html(&self, url: &str) -> Result<String, AnalysisError>;

    /// Fetch a page as plain text, or `None` on failure.
    async fn fetch(&self, url: &str) -> Option<String> {
        match self.fetch_html(url).await {
            Ok(html) => Some(html_to_text(&html)),
            Err(e) => {
                warn!("Error fetching content from {}: {}", url, e);
                None
            }
        }
    }
}
