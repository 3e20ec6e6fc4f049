use crate::types::{Result, ScrapeConfig, ScraperError};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use url::Url;

/// A fetched page in both raw and text-oriented renderings.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub html: String,
    pub markdown: String,
    pub fetched_at: DateTime<Utc>,
    pub response_time_ms: u64,
    pub http_status: Option<u16>,
}

/// Capability for fetching rendered pages.
///
/// One session is opened for a scraping phase and must be released via
/// `close` on every exit path.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Get the name of this fetcher implementation
    fn fetcher_name(&self) -> String;

    /// Fetch a single page and return its rendered content
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;

    /// Release the underlying session
    async fn close(&self) -> Result<()>;
}

/// HTTP-backed page fetcher with retries and per-host rate limiting.
pub struct HttpPageFetcher {
    client: Client,
    config: ScrapeConfig,
    rate_limiter: Arc<RwLock<HashMap<String, Instant>>>,
    closed: AtomicBool,
}

impl HttpPageFetcher {
    pub fn new(config: ScrapeConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            config,
            rate_limiter: Arc::new(RwLock::new(HashMap::new())),
            closed: AtomicBool::new(false),
        })
    }

    async fn apply_rate_limit(&self, url: &str) -> Result<()> {
        let parsed_url = Url::parse(url)?;
        let host = parsed_url.host_str().unwrap_or("").to_string();

        let now = Instant::now();
        let min_interval = Duration::from_secs(1); // Minimum 1 second between requests to same host

        {
            let mut rate_limiter = self.rate_limiter.write().await;

            if let Some(last_request) = rate_limiter.get(&host) {
                let elapsed = now.duration_since(*last_request);
                if elapsed < min_interval {
                    let wait_time = min_interval - elapsed;
                    debug!("Rate limiting {}: waiting {:?}", host, wait_time);
                    tokio::time::sleep(wait_time).await;
                }
            }

            rate_limiter.insert(host, now);
        }

        Ok(())
    }

    async fn fetch_once(&self, url: &str) -> Result<(String, u16)> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(ScraperError::Fetch {
                url: url.to_string(),
                reason: format!(
                    "HTTP {}: {}",
                    status,
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            });
        }

        let body = response.text().await?;
        Ok((body, status.as_u16()))
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    fn fetcher_name(&self) -> String {
        "http".to_string()
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ScraperError::General("Fetcher session is closed".to_string()));
        }

        let start_time = Instant::now();
        let fetched_at = Utc::now();

        debug!("Fetching page: {}", url);

        self.apply_rate_limit(url).await?;

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 32),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 60)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.fetch_once(url).await {
                Ok((html, status)) => {
                    let response_time_ms = start_time.elapsed().as_millis() as u64;
                    info!("Fetched {} ({} bytes)", url, html.len());

                    let markdown = html_to_markdown(&html);

                    return Ok(FetchedPage {
                        url: url.to_string(),
                        html,
                        markdown,
                        fetched_at,
                        response_time_ms,
                        http_status: Some(status),
                    });
                }
                Err(e) => {
                    last_error = Some(e);

                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, delay);
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                }
            }
        }

        error!(
            "Failed to fetch page after {} attempts: {}",
            self.config.max_retries + 1,
            url
        );

        Err(last_error.unwrap_or_else(|| ScraperError::Fetch {
            url: url.to_string(),
            reason: "Unknown error".to_string(),
        }))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        debug!("Closed HTTP fetcher session");
        Ok(())
    }
}

/// Derive a rough text rendering from raw markup.
///
/// A browser-backed fetcher would produce real markdown; over plain HTTP we
/// strip scripts, styles and tags and collapse whitespace.
fn html_to_markdown(html: &str) -> String {
    let script_pattern = Regex::new(r"(?s)<(script|style)[^>]*>.*?</(script|style)>")
        .expect("static pattern");
    let tag_pattern = Regex::new(r"<[^>]+>").expect("static pattern");

    let without_scripts = script_pattern.replace_all(html, " ");
    let without_tags = tag_pattern.replace_all(&without_scripts, " ");

    without_tags
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// In-memory page fetcher for development and testing.
pub struct MockPageFetcher {
    pages: RwLock<HashMap<String, String>>,
    fail_urls: RwLock<HashSet<String>>,
    closed: AtomicBool,
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self {
            pages: RwLock::new(HashMap::new()),
            fail_urls: RwLock::new(HashSet::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Register canned markup for a URL
    pub async fn insert_page(&self, url: impl Into<String>, html: impl Into<String>) {
        let mut pages = self.pages.write().await;
        pages.insert(url.into(), html.into());
    }

    /// Make fetches of this URL fail with a network-style error
    pub async fn fail_on(&self, url: impl Into<String>) {
        let mut fail_urls = self.fail_urls.write().await;
        fail_urls.insert(url.into());
    }

    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for MockPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for MockPageFetcher {
    fn fetcher_name(&self) -> String {
        "mock".to_string()
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let fail_urls = self.fail_urls.read().await;
        if fail_urls.contains(url) {
            return Err(ScraperError::Fetch {
                url: url.to_string(),
                reason: "Simulated network failure".to_string(),
            });
        }
        drop(fail_urls);

        let pages = self.pages.read().await;
        let html = pages.get(url).cloned().ok_or_else(|| ScraperError::Fetch {
            url: url.to_string(),
            reason: "No canned page registered".to_string(),
        })?;

        let markdown = html_to_markdown(&html);

        Ok(FetchedPage {
            url: url.to_string(),
            html,
            markdown,
            fetched_at: Utc::now(),
            response_time_ms: 0,
            http_status: Some(200),
        })
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
