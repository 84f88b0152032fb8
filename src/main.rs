//! # catalog-harvest CLI
//!
//! Harvests one catalog site into `categories.csv` and `products.csv`.
//!
//! ## Key Components
//!
//! - CLI argument parsing with clap
//! - Telemetry setup (stderr, optional log file, optional OTLP spans)
//! - Progress bar fed by the harvester's progress events
//!
//! Exits non-zero only when nothing could be discovered or the tables could
//! not be written; pages that fail individually are reported and skipped.

mod telemetry;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::bail;
use catalog_harvest::harvest::{DEFAULT_SITE, HarvestConfig, Harvester, Limit, Progress};
use catalog_harvest::http::{DEFAULT_USER_AGENT, FetchConfig, HttpFetcher};
use catalog_harvest::sitemap::SitemapConfig;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Harvest a retail catalog into categories.csv and products.csv", long_about = None)]
struct Cli {
    /// Site root to harvest
    #[arg(long, default_value = DEFAULT_SITE)]
    site: String,

    /// Maximum number of products to extract, or "unbounded"
    #[arg(short, long, default_value = "200")]
    limit: Limit,

    /// Directory the CSV files are written to
    #[arg(short, long, default_value = ".")]
    outdir: PathBuf,

    /// Seconds to pause after each product page before fetching the next
    #[arg(short, long, default_value_t = 0.35)]
    delay: f64,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    ua: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 25)]
    timeout: u64,

    /// Retries for transient failures
    #[arg(long, default_value_t = 4)]
    retries: u32,

    /// Keep only entries of the entry sitemap containing this; empty keeps all
    #[arg(long, default_value = "product")]
    sitemap_filter: String,

    /// Root categories marked popular (comma-separated)
    #[arg(long, value_delimiter = ',')]
    featured: Option<Vec<String>>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn harvest_config(cli: &Cli) -> anyhow::Result<HarvestConfig> {
    if !cli.delay.is_finite() || cli.delay < 0.0 {
        bail!("--delay must be a non-negative number of seconds, got {}", cli.delay);
    }

    let fetch = FetchConfig {
        user_agent: cli.ua.clone(),
        timeout: Duration::from_secs(cli.timeout),
        max_retries: cli.retries,
        ..FetchConfig::default()
    };
    let sitemap = SitemapConfig {
        child_filter: (!cli.sitemap_filter.is_empty()).then(|| cli.sitemap_filter.clone()),
        ..SitemapConfig::default()
    };

    let mut builder = HarvestConfig::builder()
        .site(&cli.site)
        .limit(cli.limit)
        .delay(Duration::from_secs_f64(cli.delay))
        .outdir(&cli.outdir)
        .fetch(fetch)
        .sitemap(sitemap);
    if let Some(featured) = &cli.featured {
        builder = builder.featured(featured.iter().map(|s| s.trim().to_string()).collect());
    }
    Ok(builder.build())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _otel = telemetry::init_tracing_subscriber(cli.log_file.as_deref())?;

    let config = harvest_config(&cli)?;
    info!(
        "Harvesting {} (limit {}, delay {:?}) into {}",
        config.site,
        config.limit,
        config.delay,
        config.outdir.display()
    );

    let fetcher = HttpFetcher::new(&config.fetch)?;
    let (progress_sender, mut progress_receiver) = mpsc::channel::<Progress>(64);
    let harvester = Harvester::new(fetcher, config)?.with_progress(progress_sender);

    let progress_bar = ProgressBar::new_spinner();
    progress_bar.enable_steady_tick(Duration::from_millis(120));
    progress_bar.set_message("Resolving sitemaps...");
    let bar_style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")?
        .progress_chars("##-");

    // Spawn a task to process progress updates
    let progress_handle = tokio::spawn({
        let progress_bar = progress_bar.clone();
        async move {
            while let Some(event) = progress_receiver.recv().await {
                match event {
                    Progress::Discovered { target, .. } => {
                        progress_bar.set_style(bar_style.clone());
                        progress_bar.set_length(target as u64);
                        progress_bar.set_message("Harvesting products...");
                    }
                    Progress::Extracted { url, .. } => {
                        progress_bar.inc(1);
                        progress_bar.set_message(url);
                    }
                    Progress::Skipped { url, .. } => {
                        progress_bar.set_message(format!("skipped {}", url));
                    }
                    Progress::Exporting => progress_bar.set_message("Writing tables..."),
                }
            }
            progress_bar.finish_and_clear();
        }
    });

    let result = harvester.run().await;
    drop(harvester);
    progress_handle.await?;

    let summary = result?;
    println!("{}", summary.line());
    println!("  {}", summary.export.categories_path.display());
    println!("  {}", summary.export.products_path.display());

    Ok(())
}
