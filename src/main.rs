use clap::{Parser, Subcommand};
use marketplace_scraper::{
    GroqClient, HttpPageFetcher, MarketplaceScraper, ScrapeConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "marketplace-scraper")]
#[command(about = "Extracts, classifies and scrapes marketplace listings")]
struct Cli {
    /// Directory artifacts are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Feed page URL to extract edges from
    #[arg(long)]
    feed_url: Option<String>,

    /// Delay between detail-page fetches, in milliseconds
    #[arg(long)]
    item_delay_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the feed page and extract the raw edges array
    Feed,
    /// Normalize the extracted edges and classify them by category
    Classify,
    /// Scrape detail pages for classified listings and extract phone numbers
    Scrape,
    /// Run all three stages back to back
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = ScrapeConfig::default();
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(feed_url) = cli.feed_url {
        config.feed_url = feed_url;
    }
    if let Some(item_delay_ms) = cli.item_delay_ms {
        config.item_delay_ms = item_delay_ms;
    }

    // Missing credential aborts here, before any work begins.
    let text_service = Arc::new(GroqClient::from_env()?);
    let fetcher = Arc::new(HttpPageFetcher::new(config.clone())?);

    let scraper = MarketplaceScraper::new(config, fetcher, text_service);

    match cli.command {
        Command::Feed => {
            let count = scraper.run_feed_stage().await?;
            info!("Extracted {} feed edges", count);
        }
        Command::Classify => {
            let listings = scraper.run_classify_stage().await?;
            info!("Kept {} classified listings", listings.len());
            for listing in &listings {
                info!("ID: {}, Title: {}", listing.id, listing.title);
            }
        }
        Command::Scrape => {
            let summary = scraper.run_scrape_stage().await?;
            info!(
                "Scraping completed. Successful: {}, Failed: {}",
                summary.successful, summary.failed
            );
        }
        Command::Run => {
            let summary = scraper.run_all().await?;
            info!(
                "Pipeline completed. Total: {}, Successful: {}, Failed: {}",
                summary.total_items, summary.successful, summary.failed
            );
        }
    }

    Ok(())
}
