use crate::artifacts::ArtifactStore;
use crate::fetcher::PageFetcher;
use crate::phone::PhoneNumberExtractor;
use crate::summary::RunSummaryAggregator;
use crate::types::{
    DetailDescription, ItemStatus, Listing, RedactedDescription, Result, ScrapeConfig,
    ScrapedDetail,
};
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Fragment pattern: a JSON-object-shaped `redacted_description` carrying a
/// nested `text` field, matched non-greedily up to its closing brace.
const DESCRIPTION_FRAGMENT_PATTERN: &str =
    r#"("redacted_description"\s*:\s*\{\s*"text"\s*:\s*".*?"\s*\})"#;

/// Second stage: the `text` value itself, allowing embedded line breaks.
const DESCRIPTION_TEXT_PATTERN: &str = r#"(?s)"text"\s*:\s*"(.*?)"\s*\}"#;

/// Seam for recovering the redacted description from detail page markup.
///
/// Keeps the fragile pattern matching behind an interface so parsing logic
/// is testable without live markup.
pub trait DescriptionExtractor: Send + Sync {
    /// Get the name of this extractor implementation
    fn extractor_name(&self) -> String;

    /// Recover the description text, or `None` when either stage misses
    fn extract(&self, html: &str) -> Option<String>;
}

/// Pattern-based extractor matching the page's embedded JSON fragments.
pub struct PatternDescriptionExtractor {
    fragment_pattern: Regex,
    text_pattern: Regex,
}

impl PatternDescriptionExtractor {
    pub fn new() -> Self {
        Self {
            fragment_pattern: Regex::new(DESCRIPTION_FRAGMENT_PATTERN)
                .expect("fragment pattern is valid"),
            text_pattern: Regex::new(DESCRIPTION_TEXT_PATTERN).expect("text pattern is valid"),
        }
    }
}

impl Default for PatternDescriptionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptionExtractor for PatternDescriptionExtractor {
    fn extractor_name(&self) -> String {
        "pattern".to_string()
    }

    fn extract(&self, html: &str) -> Option<String> {
        let fragment = self.fragment_pattern.captures(html)?.get(1)?.as_str();

        let text = self
            .text_pattern
            .captures(fragment)?
            .get(1)?
            .as_str()
            .to_string();

        Some(text)
    }
}

/// Test double returning a canned description for any markup.
pub struct CannedDescriptionExtractor {
    text: Option<String>,
}

impl CannedDescriptionExtractor {
    pub fn returning(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    pub fn missing() -> Self {
        Self { text: None }
    }
}

impl DescriptionExtractor for CannedDescriptionExtractor {
    fn extractor_name(&self) -> String {
        "canned".to_string()
    }

    fn extract(&self, _html: &str) -> Option<String> {
        self.text.clone()
    }
}

/// Scrapes each surviving listing's detail page, one at a time.
///
/// Sequential on purpose: concurrent fan-out against the target site risks
/// anti-automation defenses, so fetches are serialized with a fixed delay
/// between items.
pub struct DetailScraper {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Box<dyn DescriptionExtractor>,
    phone_extractor: PhoneNumberExtractor,
    store: ArtifactStore,
    config: ScrapeConfig,
}

impl DetailScraper {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: Box<dyn DescriptionExtractor>,
        phone_extractor: PhoneNumberExtractor,
        store: ArtifactStore,
        config: ScrapeConfig,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            phone_extractor,
            store,
            config,
        }
    }

    /// Process a batch of listings and persist the final summary.
    ///
    /// The fetcher session is released on every exit path, including an
    /// error escaping the loop.
    pub async fn run(&self, listings: &[Listing]) -> Result<RunSummary> {
        let result = self.scrape_all(listings).await;

        if let Err(e) = self.fetcher.close().await {
            warn!("Failed to close fetcher session: {}", e);
        }

        result
    }

    async fn scrape_all(&self, listings: &[Listing]) -> Result<RunSummary> {
        info!("Scraping {} listings", listings.len());

        let mut aggregator = RunSummaryAggregator::new();

        for listing in listings {
            let detail = self.scrape_item(listing).await;

            match detail.status {
                ItemStatus::Success => {
                    info!("Successfully processed item: {}", listing.title);
                    aggregator.record_success(listing, detail.phone_numbers);
                }
                ItemStatus::Failed => {
                    aggregator.record_failure(listing);
                }
            }

            // Mandatory inter-item throttle, applied regardless of outcome.
            if self.config.item_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.item_delay_ms)).await;
            }
        }

        let summary = aggregator.finalize();
        self.store.write_summary(&summary)?;

        info!(
            "Scraping completed. Successful: {}, Failed: {}",
            summary.successful, summary.failed
        );

        Ok(summary)
    }

    /// Scrape one listing. Every failure mode is absorbed here so one bad
    /// item never aborts the batch.
    async fn scrape_item(&self, listing: &Listing) -> ScrapedDetail {
        let url = self.config.item_url(&listing.id);
        info!("Scraping: {} - {}", listing.title, url);

        let page = match self.fetcher.fetch(&url).await {
            Ok(page) => page,
            Err(e) => {
                error!("Error scraping {}: {}", listing.title, e);
                return ScrapedDetail::failed(listing);
            }
        };

        // Diagnostic artifacts, written whether or not extraction succeeds.
        if let Err(e) = self.store.write_item_markdown(&listing.id, &page.markdown) {
            warn!("Failed to save markdown for {}: {}", listing.id, e);
        }
        if let Err(e) = self.store.write_item_html(&listing.id, &page.html) {
            warn!("Failed to save markup for {}: {}", listing.id, e);
        }

        let text = match self.extractor.extract(&page.html) {
            Some(text) => text,
            None => {
                warn!("Pattern not found for item: {}", listing.title);
                return ScrapedDetail::failed(listing);
            }
        };

        let phone_numbers = self.phone_extractor.extract(&text).await;

        let description = DetailDescription {
            id: listing.id.clone(),
            title: listing.title.clone(),
            redacted_description: RedactedDescription { text: text.clone() },
            phone_numbers: phone_numbers.clone(),
        };

        if let Err(e) = self.store.write_item_description(&description) {
            error!("Failed to save description for {}: {}", listing.id, e);
            return ScrapedDetail::failed(listing);
        }

        ScrapedDetail {
            id: listing.id.clone(),
            title: listing.title.clone(),
            description_text: text,
            phone_numbers,
            status: ItemStatus::Success,
        }
    }
}
