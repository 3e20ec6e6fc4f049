use crate::artifacts::ArtifactStore;
use crate::classifier::ListingClassifier;
use crate::detail::{DetailScraper, PatternDescriptionExtractor};
use crate::feed::FeedExtractor;
use crate::fetcher::PageFetcher;
use crate::phone::PhoneNumberExtractor;
use crate::text_service::TextService;
use crate::types::{Listing, Result, RunSummary, ScrapeConfig};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Coordinates the three pipeline stages over shared collaborators.
///
/// Each stage consumes the previous stage's persisted artifact, so stages
/// can also be run individually across separate invocations.
pub struct MarketplaceScraper {
    config: ScrapeConfig,
    store: ArtifactStore,
    fetcher: Arc<dyn PageFetcher>,
    text_service: Arc<dyn TextService>,
    run_id: Uuid,
}

impl MarketplaceScraper {
    pub fn new(
        config: ScrapeConfig,
        fetcher: Arc<dyn PageFetcher>,
        text_service: Arc<dyn TextService>,
    ) -> Self {
        let store = ArtifactStore::new(config.output_dir.clone());

        Self {
            config,
            store,
            fetcher,
            text_service,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Stage 1: fetch the feed page and persist the extracted edges array.
    ///
    /// Returns the number of parsed edges; zero covers both a missing anchor
    /// and an unparseable capture.
    pub async fn run_feed_stage(&self) -> Result<usize> {
        info!(run_id = %self.run_id, "Extracting feed edges from {}", self.config.feed_url);

        let page = self.fetcher.fetch(&self.config.feed_url).await?;

        let extractor = FeedExtractor::new(self.store.clone(), self.config.expected_edge_count);
        let edges = extractor.extract_edges(&page.html)?;

        Ok(edges.len())
    }

    /// Stage 2: normalize and classify the persisted edges.
    ///
    /// Malformed persisted JSON degrades to an empty listing set rather than
    /// an error; only a missing artifact (stage run out of order) is fatal.
    pub async fn run_classify_stage(&self) -> Result<Vec<Listing>> {
        let raw = self.store.read_raw_edges()?;

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Invalid JSON format in persisted edges: {}", e);
                Value::Null
            }
        };

        let classifier =
            ListingClassifier::new(self.text_service.clone(), self.config.classifier_model.clone());
        let listings = classifier.filter_listings(&value).await;

        self.store.write_listings(&listings)?;
        info!(run_id = %self.run_id, "Persisted {} classified listings", listings.len());

        Ok(listings)
    }

    /// Stage 3: scrape each classified listing's detail page and persist
    /// per-item artifacts plus the final summary.
    pub async fn run_scrape_stage(&self) -> Result<RunSummary> {
        let listings = self.store.read_listings()?;

        let phone_extractor = PhoneNumberExtractor::new(
            self.text_service.clone(),
            self.config.extraction_model.clone(),
        );

        let scraper = DetailScraper::new(
            self.fetcher.clone(),
            Box::new(PatternDescriptionExtractor::new()),
            phone_extractor,
            self.store.clone(),
            self.config.clone(),
        );

        scraper.run(&listings).await
    }

    /// Run all three stages back to back.
    pub async fn run_all(&self) -> Result<RunSummary> {
        let edge_count = self.run_feed_stage().await?;
        info!(run_id = %self.run_id, "Feed stage extracted {} edges", edge_count);

        let listings = self.run_classify_stage().await?;
        info!(run_id = %self.run_id, "Classify stage kept {} listings", listings.len());

        self.run_scrape_stage().await
    }
}
