mod common;

use common::{detail_markup, edges_array, feed_markup};
use marketplace_scraper::{
    ArtifactStore, CannedDescriptionExtractor, DescriptionExtractor, DetailDescription,
    FeedExtractor, MockTextService, PatternDescriptionExtractor, PhoneNumberExtractor,
    RedactedDescription,
};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::info;

#[test]
fn test_scenario_a_feed_extraction_with_24_edges() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let dir = TempDir::new().expect("temp dir");
    let store = ArtifactStore::new(dir.path());

    let edges_json = edges_array(24);
    let markup = feed_markup(&edges_json);

    let extractor = FeedExtractor::new(store.clone(), 24);
    let edges = extractor.extract_edges(&markup).expect("extraction");

    assert_eq!(edges.len(), 24, "should parse exactly 24 edges");

    // Raw substring persisted byte-for-byte, before any parsing.
    let raw = store.read_raw_edges().expect("raw edges file");
    assert_eq!(raw, edges_json);

    info!("Scenario A extracted {} edges", edges.len());
}

#[test]
fn test_feed_extraction_without_anchor_is_empty() {
    let dir = TempDir::new().expect("temp dir");
    let store = ArtifactStore::new(dir.path());

    let extractor = FeedExtractor::new(store.clone(), 24);
    let edges = extractor
        .extract_edges("<html><body>nothing embedded here</body></html>")
        .expect("missing anchor is not fatal");

    assert!(edges.is_empty());
    assert!(
        store.read_raw_edges().is_err(),
        "no raw artifact should exist without a match"
    );
}

#[test]
fn test_feed_extraction_persists_unparseable_capture() {
    let dir = TempDir::new().expect("temp dir");
    let store = ArtifactStore::new(dir.path());

    // Anchored but not valid JSON; still persisted for inspection.
    let markup = feed_markup(r#"[{"node": {"listing": }]"#);

    let extractor = FeedExtractor::new(store.clone(), 24);
    let edges = extractor.extract_edges(&markup).expect("parse failure is not fatal");

    assert!(edges.is_empty());
    let raw = store.read_raw_edges().expect("raw artifact persisted despite parse failure");
    assert!(raw.starts_with('['));
}

#[test]
fn test_feed_extraction_spanning_newlines() {
    let dir = TempDir::new().expect("temp dir");
    let store = ArtifactStore::new(dir.path());

    let edges_json = edges_array(2);
    let markup = format!(
        "<html>\n<body>\n{}\n</body>\n</html>",
        feed_markup(&edges_json)
    );

    let extractor = FeedExtractor::new(store, 24);
    let edges = extractor.extract_edges(&markup).expect("extraction");
    assert_eq!(edges.len(), 2);
}

#[test]
fn test_description_pattern_extraction() {
    let extractor = PatternDescriptionExtractor::new();

    let markup = detail_markup("Call +216 22 123 456 for details");
    let text = extractor.extract(&markup);
    assert_eq!(text.as_deref(), Some("Call +216 22 123 456 for details"));

    // Whitespace between the fragment's tokens is tolerated.
    let spaced = r#"{"redacted_description" : { "text" : "Spacious flat" } }"#;
    assert_eq!(extractor.extract(spaced).as_deref(), Some("Spacious flat"));
}

#[test]
fn test_description_pattern_miss() {
    let extractor = PatternDescriptionExtractor::new();

    assert!(extractor.extract("<html><body>No description</body></html>").is_none());
    // Fragment present but without a text sub-field.
    assert!(extractor
        .extract(r#"{"redacted_description":{"other":"x"}}"#)
        .is_none());
}

#[test]
fn test_canned_extractor_doubles() {
    let canned = CannedDescriptionExtractor::returning("canned text");
    assert_eq!(canned.extract("ignored").as_deref(), Some("canned text"));

    let missing = CannedDescriptionExtractor::missing();
    assert!(missing.extract("ignored").is_none());
}

#[tokio::test]
async fn test_scenario_c_phone_extraction() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let service = Arc::new(
        MockTextService::new("phones")
            .with_rule("Call +216 22 123 456", r#"{"sms_numbers": ["22123456"]}"#),
    );
    let extractor = PhoneNumberExtractor::new(service, "test-model");

    let numbers = extractor.extract("Call +216 22 123 456 for details").await;
    assert_eq!(numbers, vec!["22123456".to_string()]);
}

#[tokio::test]
async fn test_phone_extraction_failure_modes_yield_empty() {
    let cases: Vec<(&str, MockTextService)> = vec![
        ("service failure", MockTextService::new("outage").failing()),
        ("non-JSON reply", MockTextService::new("garbled").with_fallback("not json at all")),
        (
            "missing key",
            MockTextService::new("wrong-key").with_fallback(r#"{"numbers": ["22123456"]}"#),
        ),
        (
            "non-list value",
            MockTextService::new("scalar").with_fallback(r#"{"sms_numbers": "22123456"}"#),
        ),
    ];

    for (label, service) in cases {
        let extractor = PhoneNumberExtractor::new(Arc::new(service), "test-model");
        let numbers = extractor.extract("Call 22 123 456").await;
        assert!(numbers.is_empty(), "{} should yield an empty list", label);
    }
}

#[tokio::test]
async fn test_phone_extraction_skips_non_string_entries() {
    let service = Arc::new(
        MockTextService::new("mixed")
            .with_fallback(r#"{"sms_numbers": ["22123456", 98765432, "55555555"]}"#),
    );
    let extractor = PhoneNumberExtractor::new(service, "test-model");

    let numbers = extractor.extract("several numbers").await;
    assert_eq!(numbers, vec!["22123456".to_string(), "55555555".to_string()]);
}

#[test]
fn test_description_artifact_round_trip() {
    let dir = TempDir::new().expect("temp dir");
    let store = ArtifactStore::new(dir.path());

    let description = DetailDescription {
        id: "villa-1".to_string(),
        title: "Modern 3-bedroom villa for sale".to_string(),
        redacted_description: RedactedDescription {
            text: "Call +216 22 123 456 for details".to_string(),
        },
        phone_numbers: vec!["22123456".to_string()],
    };

    store.write_item_description(&description).expect("write artifact");
    let restored = store.read_item_description("villa-1").expect("read artifact");

    assert_eq!(restored, description);
}
