use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// A normalized marketplace listing, ready for classification.
///
/// Serializes to the `{id, marketplace_listing_title}` shape used as the
/// hand-off artifact between classification and detail scraping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    #[serde(rename = "marketplace_listing_title")]
    pub title: String,
}

impl Listing {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// A listing plus its classification verdict.
#[derive(Debug, Clone)]
pub struct ClassifiedListing {
    pub listing: Listing,
    pub is_match: bool,
}

/// Outcome of scraping one listing's detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    Success,
    Failed,
}

/// Immutable record of one detail-scrape attempt.
#[derive(Debug, Clone)]
pub struct ScrapedDetail {
    pub id: String,
    pub title: String,
    pub description_text: String,
    pub phone_numbers: Vec<String>,
    pub status: ItemStatus,
}

impl ScrapedDetail {
    pub fn failed(listing: &Listing) -> Self {
        Self {
            id: listing.id.clone(),
            title: listing.title.clone(),
            description_text: String::new(),
            phone_numbers: Vec::new(),
            status: ItemStatus::Failed,
        }
    }
}

/// The recovered contact-bearing text field from a detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactedDescription {
    pub text: String,
}

/// Per-item artifact written for each successfully scraped listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailDescription {
    pub id: String,
    pub title: String,
    pub redacted_description: RedactedDescription,
    pub phone_numbers: Vec<String>,
}

/// Final report for a detail-scraping run, persisted once at the end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_items: usize,
    pub successful: usize,
    pub failed: usize,
    pub failed_items: Vec<Listing>,
    pub phone_numbers: HashMap<String, Vec<String>>,
}

/// Configuration for a scraping run.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub feed_url: String,
    pub item_url_template: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    /// Delay between detail-page fetches, applied after every item
    /// regardless of outcome. Rate-limiting policy, not an implementation
    /// detail; set to zero in tests.
    pub item_delay_ms: u64,
    /// Soft sanity check on the extracted feed; mismatch only warns.
    pub expected_edge_count: usize,
    pub output_dir: PathBuf,
    pub classifier_model: String,
    pub extraction_model: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            feed_url: "https://www.facebook.com/marketplace/111663698852329/propertyforsale"
                .to_string(),
            item_url_template: "https://www.facebook.com/marketplace/item/{id}/".to_string(),
            user_agent: "Marketplace-Scraper/1.0".to_string(),
            timeout_seconds: 30,
            max_retries: 2,
            retry_delay_seconds: 5,
            item_delay_ms: 2000,
            expected_edge_count: 24,
            output_dir: PathBuf::from("output"),
            classifier_model: "llama3-8b-8192".to_string(),
            extraction_model: "llama3-70b-8192".to_string(),
        }
    }
}

impl ScrapeConfig {
    /// Build the detail-page URL for a listing id.
    pub fn item_url(&self, id: &str) -> String {
        self.item_url_template.replace("{id}", id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Input shape error: {0}")]
    InputShape(String),

    #[error("Text service error: {0}")]
    Service(String),

    #[error("Pattern not found: {0}")]
    ExtractionMiss(String),

    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Missing required credential: {0}")]
    MissingCredential(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, ScraperError>;
