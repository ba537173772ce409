//! HTTP page fetching and HTML to text conversion.

use crate::error::AnalysisError;
use crate::source::SourceFetcher;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::debug;

/// Elements whose content is page chrome, not document text.
const SKIPPED_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "noscript"];

/// Elements that become one paragraph each.
const BLOCK_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "li",
    "blockquote",
];

/// Fetches pages over HTTP.
pub struct HttpSourceFetcher {
    http_client: reqwest::Client,
}

impl HttpSourceFetcher {
    pub fn new(timeout: Duration) -> Result<Self, AnalysisError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bocwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AnalysisError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String, AnalysisError> {
        debug!("Fetching {}", url);

        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AnalysisError::Transport(format!(
                "HTTP error {} for {}",
                response.status(),
                url
            )));
        }

        Ok(response.text().await?)
    }
}

/// Convert an HTML page to plain text.
///
/// Block elements become paragraphs joined by a blank line. Pages without
/// any block element fall back to all visible text, one phrase per line.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);

    if let Ok(selector) = Selector::parse(&BLOCK_TAGS.join(", ")) {
        let paragraphs: Vec<String> = document
            .select(&selector)
            .filter(|el| !has_ancestor(el, SKIPPED_TAGS) && !has_ancestor(el, BLOCK_TAGS))
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|text| !text.is_empty())
            .collect();

        if !paragraphs.is_empty() {
            return paragraphs.join("\n\n");
        }
    }

    let mut raw = String::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| SKIPPED_TAGS.contains(&e.name()))
        });
        if !hidden {
            raw.push_str(text);
            raw.push('\n');
        }
    }

    raw.lines()
        .flat_map(|line| line.trim().split("  "))
        .map(str::trim)
        .filter(|phrase| !phrase.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn has_ancestor(element: &ElementRef, tags: &[&str]) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|e| tags.contains(&e.name()))
    })
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
