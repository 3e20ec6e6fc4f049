use crate::text_service::{CompletionRequest, TextService};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// The single key the service is instructed to return matches under.
const PHONE_NUMBERS_KEY: &str = "sms_numbers";

const PHONE_SYSTEM_PROMPT: &str = "You are a data specialist focusing on scraping the web.\n\
    - Extract all Tunisian mobile phone numbers from the provided HTML.\n\
    - Tunisian mobile numbers are 8 digits long, starting with 2, 4, 5, or 9, \
    and may be prefixed with +216 or 00216 (optionally followed by a space).\n\
    - Output ONLY the numbers in a JSON format with a single key 'sms_numbers'.";

/// Extracts phone numbers from recovered description text via the text
/// service's structured-output mode.
pub struct PhoneNumberExtractor {
    text_service: Arc<dyn TextService>,
    model: String,
}

impl PhoneNumberExtractor {
    pub fn new(text_service: Arc<dyn TextService>, model: impl Into<String>) -> Self {
        Self {
            text_service,
            model: model.into(),
        }
    }

    /// Extract all matching numbers from a description text.
    ///
    /// Never fatal to the caller: a service error, an unparseable response,
    /// or a missing key all resolve to an empty list plus a diagnostic log.
    pub async fn extract(&self, description: &str) -> Vec<String> {
        let request = CompletionRequest {
            system: PHONE_SYSTEM_PROMPT.to_string(),
            user: format!("The HTML that contain the phone numbers : \"{}\".", description),
            model: self.model.clone(),
            temperature: 0.2,
            max_tokens: 39,
            top_p: Some(0.9),
            json_response: true,
        };

        let reply = match self.text_service.complete(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Error extracting phone numbers: {}", e);
                return Vec::new();
            }
        };

        debug!("Phone extraction response: {}", reply);
        parse_phone_response(&reply)
    }
}

/// Parse the structured response and read the recognized key.
fn parse_phone_response(reply: &str) -> Vec<String> {
    let parsed: Value = match serde_json::from_str(reply) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Error parsing phone extraction response: {}", e);
            return Vec::new();
        }
    };

    let numbers = match parsed.get(PHONE_NUMBERS_KEY).and_then(Value::as_array) {
        Some(numbers) => numbers,
        None => {
            warn!("Phone extraction response missing '{}' list", PHONE_NUMBERS_KEY);
            return Vec::new();
        }
    };

    numbers
        .iter()
        .filter_map(|value| match value.as_str() {
            Some(number) => Some(number.to_string()),
            None => {
                warn!("Skipping non-string entry in phone number list: {}", value);
                None
            }
        })
        .collect()
}
