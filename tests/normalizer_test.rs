use marketplace_scraper::{normalize_listings, Listing, ListingClassifier, MockTextService};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

fn sample_listing(id: &str, title: &str) -> serde_json::Value {
    json!({"id": id, "marketplace_listing_title": title})
}

#[test]
fn test_normalize_bare_array() {
    let raw = json!([
        sample_listing("1", "Villa near the beach"),
        sample_listing("2", "Used bicycle"),
    ]);

    let listings = normalize_listings(&raw);
    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0], Listing::new("1", "Villa near the beach"));
    assert_eq!(listings[1], Listing::new("2", "Used bicycle"));
}

#[test]
fn test_normalize_recognized_collection_keys() {
    // Each recognized key wraps the same logical listings and must recover
    // the same result.
    let expected = vec![Listing::new("1", "Apartment downtown")];

    for key in ["results", "listings", "items"] {
        let raw = json!({ key: [sample_listing("1", "Apartment downtown")] });
        let listings = normalize_listings(&raw);
        assert_eq!(listings, expected, "key '{}' should be recognized", key);
    }
}

#[test]
fn test_normalize_object_without_collection_keys() {
    // An object with none of the recognized keys is a single one-item batch.
    let raw = sample_listing("9", "Land plot 500m2");

    let listings = normalize_listings(&raw);
    assert_eq!(listings, vec![Listing::new("9", "Land plot 500m2")]);
}

#[test]
fn test_normalize_nested_listing_paths() {
    let raw = json!([
        {"node": {"listing": sample_listing("1", "From node.listing")}},
        {"listing": sample_listing("2", "From listing")},
        sample_listing("3", "From item itself"),
    ]);

    let listings = normalize_listings(&raw);
    assert_eq!(listings.len(), 3);
    assert_eq!(listings[0].title, "From node.listing");
    assert_eq!(listings[1].title, "From listing");
    assert_eq!(listings[2].title, "From item itself");
}

#[test]
fn test_normalize_title_fallback_field() {
    let raw = json!([{"id": "5", "title": "Fallback title"}]);

    let listings = normalize_listings(&raw);
    assert_eq!(listings, vec![Listing::new("5", "Fallback title")]);
}

#[test]
fn test_items_missing_id_or_title_are_excluded() {
    let raw = json!([
        {"marketplace_listing_title": "No id here"},
        {"id": "7"},
        {"id": "", "marketplace_listing_title": "Empty id"},
        {"id": "8", "marketplace_listing_title": ""},
        sample_listing("ok", "Survives"),
    ]);

    let listings = normalize_listings(&raw);
    assert_eq!(listings, vec![Listing::new("ok", "Survives")]);
}

#[test]
fn test_malformed_top_level_shapes_yield_empty() {
    // No top-level shape may escape as a panic or error, only as emptiness.
    for raw in [
        json!("just a string"),
        json!(42),
        json!(true),
        json!(null),
    ] {
        let listings = normalize_listings(&raw);
        assert!(listings.is_empty(), "shape {:?} should yield no listings", raw);
    }
}

#[tokio::test]
async fn test_classifier_is_fail_closed() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    // Service failure resolves to a negative verdict.
    let failing = Arc::new(MockTextService::new("outage").failing());
    let classifier = ListingClassifier::new(failing, "test-model");
    assert!(
        !classifier.is_real_estate("Villa with pool").await,
        "service failure must never classify as true"
    );

    // Garbled or non-exact tokens are all negative.
    for reply in ["true", "TRUE", "Yes", "True.", "It is True", "False"] {
        let garbled = Arc::new(MockTextService::new("garbled").with_fallback(reply));
        let classifier = ListingClassifier::new(garbled, "test-model");
        assert!(
            !classifier.is_real_estate("Villa with pool").await,
            "reply '{}' must not classify as true",
            reply
        );
    }

    // Only the exact affirmative token, after trimming, is positive.
    let exact = Arc::new(MockTextService::new("exact").with_fallback("  True\n"));
    let classifier = ListingClassifier::new(exact, "test-model");
    assert!(classifier.is_real_estate("Villa with pool").await);
}

#[tokio::test]
async fn test_scenario_b_only_matching_listing_survives() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let service = Arc::new(
        MockTextService::new("classifier")
            .with_rule("Modern 3-bedroom villa for sale", "True")
            .with_rule("iPhone 13 for sale", "False"),
    );
    let classifier = ListingClassifier::new(service, "test-model");

    let raw = serde_json::json!([
        {"id": "villa-1", "marketplace_listing_title": "Modern 3-bedroom villa for sale"},
        {"id": "phone-1", "marketplace_listing_title": "iPhone 13 for sale"},
    ]);

    let survivors = classifier.filter_listings(&raw).await;
    info!("Survivors: {:?}", survivors);

    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].id, "villa-1");
    assert_eq!(survivors[0].title, "Modern 3-bedroom villa for sale");
}

#[tokio::test]
async fn test_batch_continues_past_individual_service_failures() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    // First title errors out, second still gets classified.
    let service = Arc::new(
        MockTextService::new("partial")
            .with_rule("House in the suburbs", "True")
            .failing(),
    );
    let classifier = ListingClassifier::new(service, "test-model");

    let raw = serde_json::json!([
        {"id": "a", "marketplace_listing_title": "Mystery item"},
        {"id": "b", "marketplace_listing_title": "House in the suburbs"},
    ]);

    let survivors = classifier.filter_listings(&raw).await;
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].id, "b");
}
