use crate::types::{Listing, RunSummary};
use std::collections::HashMap;
use tracing::debug;

/// Accumulates per-item outcomes across a detail-scraping run and finalizes
/// them into one immutable report.
///
/// Nothing is persisted mid-run; an interrupted run loses the summary while
/// per-item artifacts already on disk survive.
#[derive(Debug, Default)]
pub struct RunSummaryAggregator {
    total: usize,
    successful: usize,
    failed_items: Vec<Listing>,
    phone_numbers: HashMap<String, Vec<String>>,
}

impl RunSummaryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, listing: &Listing, phone_numbers: Vec<String>) {
        self.total += 1;
        self.successful += 1;
        self.phone_numbers.insert(listing.id.clone(), phone_numbers);
        debug!("Recorded success for listing {}", listing.id);
    }

    pub fn record_failure(&mut self, listing: &Listing) {
        self.total += 1;
        self.failed_items.push(listing.clone());
        debug!("Recorded failure for listing {}", listing.id);
    }

    pub fn finalize(self) -> RunSummary {
        let failed = self.failed_items.len();

        RunSummary {
            total_items: self.total,
            successful: self.successful,
            failed,
            failed_items: self.failed_items,
            phone_numbers: self.phone_numbers,
        }
    }
}
