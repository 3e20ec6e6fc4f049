pub mod artifacts;
pub mod classifier;
pub mod detail;
pub mod feed;
pub mod fetcher;
pub mod phone;
pub mod pipeline;
pub mod summary;
pub mod text_service;
pub mod types;

pub use artifacts::ArtifactStore;
pub use classifier::{normalize_listings, ListingClassifier};
pub use detail::{
    CannedDescriptionExtractor, DescriptionExtractor, DetailScraper, PatternDescriptionExtractor,
};
pub use feed::FeedExtractor;
pub use fetcher::{FetchedPage, HttpPageFetcher, MockPageFetcher, PageFetcher};
pub use phone::PhoneNumberExtractor;
pub use pipeline::MarketplaceScraper;
pub use summary::RunSummaryAggregator;
pub use text_service::{CompletionRequest, GroqClient, MockTextService, TextService};
pub use types::*;
