mod aggregate;
mod config;
mod error;
mod features;
mod fetcher;
mod report;
mod sentiment;
mod store;
mod types;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::Result;

#[derive(Parser)]
#[command(
    name = "pulse",
    version,
    about = "News-sentiment and price pipeline for a DAX equity basket"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch news articles via NewsAPI and merge them into the article table
    ScrapeNews,
    /// Fetch news articles from the Google News RSS feed (no API key needed)
    ScrapeRss,
    /// Fetch daily closing prices, resuming from the last stored date
    ScrapePrices,
    /// Score not-yet-scored articles and append them to the sentiment table
    Score,
    /// Write the daily/weekly/monthly aggregated sentiment tables
    Aggregate,
    /// Join daily sentiment with prices and rebuild per-company feature tables
    Features,
    /// Render a text report over one company's feature table
    Report {
        company: String,
        /// Sentiment-change threshold for the alert table
        #[arg(long)]
        alert_threshold: Option<f64>,
        /// Z-score threshold for the z-score alert table
        #[arg(long)]
        zscore_threshold: Option<f64>,
    },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cli.command, cfg).await {
        error!("Stage failed: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Command, cfg: Config) -> Result<()> {
    match command {
        Command::ScrapeNews => {
            fetcher::news::run(&cfg).await?;
        }
        Command::ScrapeRss => {
            fetcher::rss::run(&cfg).await?;
        }
        Command::ScrapePrices => {
            fetcher::prices::run(&cfg).await?;
        }
        Command::Score => {
            sentiment::scorer::run(&cfg)?;
        }
        Command::Aggregate => {
            aggregate::run(&cfg)?;
        }
        Command::Features => {
            features::builder::run(&cfg)?;
        }
        Command::Report {
            company,
            alert_threshold,
            zscore_threshold,
        } => {
            report::run(&cfg, &company, alert_threshold, zscore_threshold)?;
        }
    }
    Ok(())
}
