//! Crawl a user's two-hop friend network from VK and save it as JSON.

use anyhow::Result;
use clap::Parser;
use friendgraph::graph::summarize;
use friendgraph::{Config, EgoCrawler, UserId, VkClient};
use std::path::PathBuf;
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(name = "crawl")]
#[command(about = "Fetch a user's friends and friends-of-friends from VK")]
struct Args {
    /// VK id of the user whose ego network to crawl
    #[arg(long)]
    seed: UserId,

    /// Where to write the graph (defaults to graph.path from config.toml)
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load_or_default()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", &config.log_level),
    )
    .init();

    let out = args.out.unwrap_or_else(|| config.graph_path().to_path_buf());
    log::info!("Starting crawl of {} -> {}", args.seed, out.display());
    log::info!(
        "Request delay: {} ms, retries: {}, fail fast: {}",
        config.crawl.request_delay_ms,
        config.crawl.max_retries,
        config.crawl.fail_fast
    );

    let client = VkClient::new(&config.vk, config.access_token()?)?;
    let crawler = EgoCrawler::new(client, config.crawl.clone()).with_store(&out);

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Ctrl+C received, stopping after the current request");
            let _ = tx.send(true);
        }
    });

    let report = crawler.crawl_until(args.seed, rx).await?;

    let summary = summarize(&report.graph);
    let elapsed = report.finished_at - report.started_at;
    log::info!("=== Crawl {} ===", if report.cancelled { "Cancelled" } else { "Complete" });
    log::info!("Requests: {}", report.fetched);
    log::info!("Users: {} ({} placeholders)", summary.users, summary.placeholders);
    log::info!("Unique edges: {}", summary.unique_edges);
    log::info!("Time: {}s", elapsed.num_seconds());
    for failure in &report.failures {
        log::warn!("Recorded empty: {} ({})", failure.user_id, failure.reason);
    }

    if report.graph.is_empty() {
        println!("Nothing crawled, {} left untouched", out.display());
    } else {
        println!("Saved {} users to {}", report.graph.len(), out.display());
    }
    Ok(())
}
