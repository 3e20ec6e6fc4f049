#![allow(dead_code)]

use serde_json::json;

/// Build a compact JSON array of `count` listing edges in the feed's
/// nested `node.listing` shape.
pub fn edges_array(count: usize) -> String {
    let edges: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            json!({
                "node": {
                    "listing": {
                        "id": format!("10{}", i),
                        "marketplace_listing_title": format!("Listing {}", i)
                    }
                }
            })
        })
        .collect();

    serde_json::to_string(&edges).expect("edges serialize")
}

/// Wrap an edges array in feed-page markup carrying the embedded anchor.
pub fn feed_markup(edges_json: &str) -> String {
    format!(
        r#"<html><head><title>Marketplace</title></head><body><script type="application/json">{{"result":{{"data":{{"viewer":{{"marketplace_feed_stories":{{"edges":{},"page_info":{{"has_next_page":false}}}}}}}}}}}}</script></body></html>"#,
        edges_json
    )
}

/// Build detail-page markup carrying an embedded redacted description.
pub fn detail_markup(text: &str) -> String {
    format!(
        r#"<html><body><script>{{"viewer":{{"marketplace_product_details_page":{{"target":{{"redacted_description":{{"text":"{}"}},"creation_time":1700000000}}}}}}}}</script></body></html>"#,
        text
    )
}
