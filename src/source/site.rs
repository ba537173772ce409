//! Document discovery on the central bank website.

use crate::config::SourcesConfig;
use crate::source::fetcher::collapse_whitespace;
use crate::source::SourceFetcher;
use anyhow::{Context, Result};
use scraper::{Html, Selector};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

const POLICY_RATE_PATH: &str = "/core/monetary-policy/key-interest-rate/";
const NEWS_PATH: &str = "/news/";
const MPR_PATH: &str = "/publications/mpr/";
const SPEECHES_PATH: &str = "/news/speeches-and-webcasts/";

const PRESS_RELEASE_PATTERNS: &[&str] = &["press-release", "statement"];
const SPEECH_PATTERNS: &[&str] = &["/speech"];

/// Kind of central bank publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    PolicyRatePage,
    PressRelease,
    MonetaryPolicyReport,
    Speech,
}

impl SourceType {
    pub fn label(&self) -> &'static str {
        match self {
            SourceType::PolicyRatePage => "Policy Rate Page",
            SourceType::PressRelease => "Press Release",
            SourceType::MonetaryPolicyReport => "Monetary Policy Report",
            SourceType::Speech => "Speech",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A link found on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLink {
    pub title: String,
    pub url: String,
    pub source_type: SourceType,
}

/// A document ready for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: Option<String>,
    /// Page URL or file path.
    pub location: String,
    pub source_type: String,
    pub content: String,
}

impl Document {
    /// Read a local text file.
    pub fn from_file(path: &Path, source_type: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read document: {}", path.display()))?;

        Ok(Self {
            title: path.file_name().map(|n| n.to_string_lossy().into_owned()),
            location: path.display().to_string(),
            source_type: source_type.to_string(),
            content,
        })
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Finds and fetches publications from the bank's website.
pub struct BankSite {
    fetcher: Arc<dyn SourceFetcher>,
    config: SourcesConfig,
}

impl BankSite {
    pub fn new(fetcher: Arc<dyn SourceFetcher>, config: SourcesConfig) -> Self {
        Self { fetcher, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn page(&self, path: &str, source_type: SourceType) -> Option<Document> {
        let url = self.url(path);
        let content = self.fetcher.fetch(&url).await?;

        Some(Document {
            title: None,
            location: url,
            source_type: source_type.label().to_string(),
            content,
        })
    }

    async fn links(
        &self,
        path: &str,
        patterns: &[&str],
        limit: usize,
        source_type: SourceType,
    ) -> Vec<DocumentLink> {
        let url = self.url(path);
        match self.fetcher.fetch_html(&url).await {
            Ok(html) => extract_links(&html, &self.config.base_url, patterns, limit)
                .into_iter()
                .map(|(title, url)| DocumentLink {
                    title,
                    url,
                    source_type,
                })
                .collect(),
            Err(e) => {
                warn!("Error fetching {} listing: {}", source_type, e);
                Vec::new()
            }
        }
    }

    pub async fn policy_rate_page(&self) -> Option<Document> {
        self.page(POLICY_RATE_PATH, SourceType::PolicyRatePage).await
    }

    pub async fn monetary_policy_report(&self) -> Option<Document> {
        self.page(MPR_PATH, SourceType::MonetaryPolicyReport).await
    }

    pub async fn press_releases(&self) -> Vec<DocumentLink> {
        self.links(
            NEWS_PATH,
            PRESS_RELEASE_PATTERNS,
            self.config.max_press_releases,
            SourceType::PressRelease,
        )
        .await
    }

    pub async fn speeches(&self) -> Vec<DocumentLink> {
        self.links(
            SPEECHES_PATH,
            SPEECH_PATTERNS,
            self.config.max_speeches,
            SourceType::Speech,
        )
        .await
    }

    /// Fetch the page behind a listing link.
    pub async fn open(&self, link: &DocumentLink) -> Option<Document> {
        let content = self.fetcher.fetch(&link.url).await?;

        Some(Document {
            title: Some(link.title.clone()),
            location: link.url.clone(),
            source_type: link.source_type.label().to_string(),
            content,
        })
    }

    /// Fetch an arbitrary page.
    pub async fn fetch_url(&self, url: &str, source_type: &str) -> Option<Document> {
        let content = self.fetcher.fetch(url).await?;

        Some(Document {
            title: None,
            location: url.to_string(),
            source_type: source_type.to_string(),
            content,
        })
    }

    /// Collect the standard document set: policy rate page, the leading
    /// press releases, the Monetary Policy Report and, optionally, speeches.
    pub async fn collect(&self, include_speeches: bool) -> Vec<Document> {
        let mut documents = Vec::new();

        info!("Fetching policy rate announcement...");
        documents.extend(self.policy_rate_page().await);

        info!("Fetching recent press releases...");
        let releases = self.press_releases().await;
        debug!("Found {} press release links", releases.len());
        for release in releases.iter().take(self.config.analyze_press_releases) {
            documents.extend(self.open(release).await);
        }

        info!("Fetching Monetary Policy Report...");
        documents.extend(self.monetary_policy_report().await);

        if include_speeches {
            info!("Fetching recent speeches...");
            for speech in self.speeches().await {
                documents.extend(self.open(&speech).await);
            }
        }

        documents.retain(|d| !d.is_blank());
        documents
    }
}

/// Links whose href contains any of `patterns`, as `(title, absolute url)`.
///
/// Repeated hrefs are reported once.
pub fn extract_links(html: &str, base_url: &str, patterns: &[&str], limit: usize) -> Vec<(String, String)> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    let mut links: Vec<(String, String)> = Vec::new();
    for anchor in document.select(&selector) {
        if links.len() >= limit {
            break;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !patterns.iter().any(|p| href.contains(p)) {
            continue;
        }

        let url = resolve_url(base_url, href);
        if links.iter().any(|(_, seen)| *seen == url) {
            continue;
        }

        let title = collapse_whitespace(&anchor.text().collect::<String>());
        links.push((title, url));
    }

    links
}

fn resolve_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    let base = base_url.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{}{}", base, href)
    } else {
        format!("{}/{}", base, href)
    }
}
