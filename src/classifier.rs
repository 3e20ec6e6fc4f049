use crate::text_service::{CompletionRequest, TextService};
use crate::types::{ClassifiedListing, Listing};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The exact token the classifier must return for a positive verdict.
/// Comparison is exact equality after trimming; anything else is negative.
const AFFIRMATIVE_TOKEN: &str = "True";

/// Collection keys recognized when the raw input is an object, in priority order.
const COLLECTION_KEYS: [&str; 3] = ["results", "listings", "items"];

const CLASSIFIER_SYSTEM_PROMPT: &str = "You are a classifier for marketplace listings.";

/// Normalizes raw feed JSON into listings and filters them to the real
/// estate category through the text service.
pub struct ListingClassifier {
    text_service: Arc<dyn TextService>,
    model: String,
}

impl ListingClassifier {
    pub fn new(text_service: Arc<dyn TextService>, model: impl Into<String>) -> Self {
        Self {
            text_service,
            model: model.into(),
        }
    }

    /// Classify every normalized listing and keep the affirmative ones,
    /// preserving input order.
    pub async fn filter_listings(&self, raw: &Value) -> Vec<Listing> {
        let candidates = normalize_listings(raw);
        info!("Classifying {} candidate listings", candidates.len());

        let mut matches = Vec::new();

        for listing in candidates {
            let is_match = self.is_real_estate(&listing.title).await;
            let classified = ClassifiedListing { listing, is_match };

            if classified.is_match {
                debug!(
                    "Listing matched category: {} ({})",
                    classified.listing.title, classified.listing.id
                );
                matches.push(classified.listing);
            }
        }

        info!("{} listings classified as real estate", matches.len());
        matches
    }

    /// Ask the text service for a strict binary verdict on one title.
    ///
    /// Fail-closed: a service error, a non-affirmative token, or any other
    /// anomaly yields `false`. A batch never aborts on one bad verdict.
    pub async fn is_real_estate(&self, title: &str) -> bool {
        let prompt = format!(
            "Classify the following marketplace listing title as related to real estate or not. \
             Real estate includes properties like villas, apartments, houses, or land. \
             Return only 'True' or 'False'.\n\nTitle: {}",
            title
        );

        let request = CompletionRequest {
            system: CLASSIFIER_SYSTEM_PROMPT.to_string(),
            user: prompt,
            model: self.model.clone(),
            temperature: 0.0,
            max_tokens: 10,
            top_p: None,
            json_response: false,
        };

        match self.text_service.complete(&request).await {
            Ok(reply) => reply.trim() == AFFIRMATIVE_TOKEN,
            Err(e) => {
                warn!("Error querying text service for title '{}': {}", title, e);
                false
            }
        }
    }
}

/// Normalize an arbitrary JSON value into candidate listings.
///
/// Shape-sniffing, in priority order: a bare array is used directly; an
/// object is checked for the recognized collection keys; any other object is
/// treated as a single one-item batch. Items missing an id or a usable title
/// after all fallbacks are dropped silently.
pub fn normalize_listings(raw: &Value) -> Vec<Listing> {
    let items: Vec<&Value> = match raw {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => {
            match COLLECTION_KEYS
                .iter()
                .find_map(|key| map.get(*key))
            {
                Some(Value::Array(items)) => items.iter().collect(),
                Some(other) => vec![other],
                None => vec![raw],
            }
        }
        _ => {
            warn!("Unrecognized top-level JSON shape, no listings extracted");
            Vec::new()
        }
    };

    let mut listings = Vec::new();

    for item in items {
        match extract_listing(item) {
            Some(listing) => listings.push(listing),
            None => debug!("Skipping item without id or title"),
        }
    }

    listings
}

/// Ordered strategies for locating the listing node within one raw item.
/// Adding a new input shape means adding a variant here, not another branch.
#[derive(Debug, Clone, Copy)]
enum ListingPath {
    NodeListing,
    Listing,
    ItemItself,
}

const LISTING_PATHS: [ListingPath; 3] =
    [ListingPath::NodeListing, ListingPath::Listing, ListingPath::ItemItself];

impl ListingPath {
    fn locate<'a>(&self, item: &'a Value) -> Option<&'a Value> {
        match self {
            ListingPath::NodeListing => item.get("node")?.get("listing"),
            ListingPath::Listing => item.get("listing"),
            ListingPath::ItemItself => Some(item),
        }
    }
}

/// Pull an `{id, title}` pair out of one raw item.
///
/// Each listing path is attempted in order until one yields a valid pair;
/// the title falls back from `marketplace_listing_title` to `title`.
fn extract_listing(item: &Value) -> Option<Listing> {
    LISTING_PATHS
        .iter()
        .filter_map(|path| path.locate(item))
        .find_map(listing_fields)
}

fn listing_fields(listing: &Value) -> Option<Listing> {
    let id = listing.get("id").and_then(Value::as_str)?;

    let title = listing
        .get("marketplace_listing_title")
        .and_then(Value::as_str)
        .or_else(|| listing.get("title").and_then(Value::as_str))?;

    if id.is_empty() || title.is_empty() {
        return None;
    }

    Some(Listing::new(id, title))
}
