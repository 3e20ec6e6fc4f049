use crate::types::{DetailDescription, Listing, Result, RunSummary};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const RAW_EDGES_FILE: &str = "edges_output.json";
const LISTINGS_FILE: &str = "real_estate_listings.json";
const SUMMARY_FILE: &str = "scraping_summary.json";

/// Flat-file store for every artifact the pipeline persists.
///
/// Rooted at the configured output directory so tests can point it at a
/// temporary one.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    fn write_text(&self, name: &str, content: &str) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.root.join(name);
        fs::write(&path, content)?;
        debug!("Wrote artifact: {}", path.display());
        Ok(path)
    }

    /// Persist the verbatim extracted edges substring, valid JSON or not
    pub fn write_raw_edges(&self, raw: &str) -> Result<PathBuf> {
        let path = self.write_text(RAW_EDGES_FILE, raw)?;
        info!("Saved raw extracted edges to {}", path.display());
        Ok(path)
    }

    pub fn read_raw_edges(&self) -> Result<String> {
        let content = fs::read_to_string(self.root.join(RAW_EDGES_FILE))?;
        Ok(content)
    }

    /// Persist the classified listings hand-off artifact
    pub fn write_listings(&self, listings: &[Listing]) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(listings)?;
        self.write_text(LISTINGS_FILE, &json)
    }

    pub fn read_listings(&self) -> Result<Vec<Listing>> {
        let content = fs::read_to_string(self.root.join(LISTINGS_FILE))?;
        let listings = serde_json::from_str(&content)?;
        Ok(listings)
    }

    /// Persist the text rendering of a detail page (diagnostic, unconditional)
    pub fn write_item_markdown(&self, id: &str, markdown: &str) -> Result<PathBuf> {
        self.write_text(&format!("{}_data.md", id), markdown)
    }

    /// Persist the raw markup of a detail page (diagnostic, unconditional)
    pub fn write_item_html(&self, id: &str, html: &str) -> Result<PathBuf> {
        self.write_text(&format!("{}_data.html", id), html)
    }

    /// Persist the per-item description artifact, written only on success
    pub fn write_item_description(&self, description: &DetailDescription) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(description)?;
        self.write_text(&format!("{}_description.json", description.id), &json)
    }

    pub fn read_item_description(&self, id: &str) -> Result<DetailDescription> {
        let content = fs::read_to_string(self.root.join(format!("{}_description.json", id)))?;
        let description = serde_json::from_str(&content)?;
        Ok(description)
    }

    /// Persist the final run summary, once per run
    pub fn write_summary(&self, summary: &RunSummary) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(summary)?;
        let path = self.write_text(SUMMARY_FILE, &json)?;
        info!("Saved run summary to {}", path.display());
        Ok(path)
    }

    pub fn read_summary(&self) -> Result<RunSummary> {
        let content = fs::read_to_string(self.root.join(SUMMARY_FILE))?;
        let summary = serde_json::from_str(&content)?;
        Ok(summary)
    }
}
