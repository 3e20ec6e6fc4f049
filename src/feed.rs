use crate::artifacts::ArtifactStore;
use crate::types::Result;
use regex::Regex;
use serde_json::Value;
use tracing::{error, info, warn};

/// Anchor preceding the embedded listing array in the rendered feed page.
const EDGES_PATTERN: &str =
    r#"(?s)"result":\{"data":\{"viewer":\{"marketplace_feed_stories":\{"edges":(\[.*?\}\])"#;

/// Extracts the raw JSON array of listing edges embedded in feed page markup.
pub struct FeedExtractor {
    store: ArtifactStore,
    edges_pattern: Regex,
    expected_edge_count: usize,
}

impl FeedExtractor {
    pub fn new(store: ArtifactStore, expected_edge_count: usize) -> Self {
        let edges_pattern = Regex::new(EDGES_PATTERN).expect("edges pattern is valid");

        Self {
            store,
            edges_pattern,
            expected_edge_count,
        }
    }

    /// Locate, persist and parse the embedded edges array.
    ///
    /// A missing anchor or unparseable capture yields an empty result and a
    /// log line; neither is fatal to the caller. The captured substring is
    /// persisted verbatim before any parse is attempted.
    pub fn extract_edges(&self, html: &str) -> Result<Vec<Value>> {
        let capture = match self.edges_pattern.captures(html) {
            Some(captures) => captures
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            None => {
                warn!("No match found for the edges array");
                return Ok(Vec::new());
            }
        };

        info!("Found potential match for edges ({} bytes)", capture.len());

        // Save before parsing so a malformed capture is still on disk for
        // operator inspection.
        self.store.write_raw_edges(&capture)?;

        let edges: Vec<Value> = match serde_json::from_str(&capture) {
            Ok(edges) => edges,
            Err(e) => {
                error!("Error parsing extracted edges as JSON: {}", e);
                return Ok(Vec::new());
            }
        };

        info!("Found {} edge nodes", edges.len());

        // Operator signal only, never pipeline-blocking.
        if edges.len() != self.expected_edge_count {
            warn!(
                "Only {} nodes found. Expected {}.",
                edges.len(),
                self.expected_edge_count
            );
        } else {
            info!("Successfully extracted {} nodes", edges.len());
        }

        Ok(edges)
    }
}
