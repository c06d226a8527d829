//! Ego-network crawler: a seed user, their friends, and their friends' friends.
//!
//! Requests go out one at a time through a [`RateLimiter`]. Friends of the
//! seed are expanded in the order VK listed them; everyone they mention is
//! recorded as a placeholder. A failure for one friend is downgraded to an
//! empty list unless `fail_fast` is set.

mod rate_limit;

pub use rate_limit::RateLimiter;

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::config::CrawlConfig;
use crate::error::Result;
use crate::graph::{save_graph, FriendGraph, UserId};
use crate::vk::FriendSource;

/// A friend whose list could not be fetched.
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub user_id: UserId,
    pub reason: String,
}

/// Outcome of one crawl.
#[derive(Debug)]
pub struct CrawlReport {
    pub seed: UserId,
    pub graph: FriendGraph,
    /// Users whose friend list was requested, seed included
    pub fetched: usize,
    /// Friends recorded with an empty list because their fetch failed
    pub failures: Vec<FetchFailure>,
    /// The crawl stopped early on request; `graph` holds what was gathered
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Two-hop crawler over a [`FriendSource`].
pub struct EgoCrawler<S> {
    source: S,
    config: CrawlConfig,
    store_path: Option<PathBuf>,
}

impl<S: FriendSource> EgoCrawler<S> {
    pub fn new(source: S, config: CrawlConfig) -> Self {
        Self {
            source,
            config,
            store_path: None,
        }
    }

    /// Persist checkpoints and the final graph to `path`.
    pub fn with_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    pub fn store_path(&self) -> Option<&Path> {
        self.store_path.as_deref()
    }

    /// Crawl the ego network of `seed` to completion.
    pub async fn crawl(&self, seed: UserId) -> Result<CrawlReport> {
        let (_keep_open, shutdown) = watch::channel(false);
        self.crawl_until(seed, shutdown).await
    }

    /// Crawl the ego network of `seed`, stopping early once `shutdown` turns true.
    ///
    /// On shutdown the partial graph is saved (when a store is configured) and
    /// returned with `cancelled` set. A failed seed fetch is returned as an error.
    pub async fn crawl_until(
        &self,
        seed: UserId,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<CrawlReport> {
        let started_at = Utc::now();
        let mut limiter = RateLimiter::new(self.config.request_delay());
        let mut graph = FriendGraph::new();
        let mut failures = Vec::new();
        let mut fetched = 0;

        log::info!("Fetching friends of seed user {}", seed);
        let seed_friends = match self.fetch(&mut limiter, seed, &mut shutdown).await {
            Some(result) => result?,
            None => {
                log::info!("Crawl cancelled before the seed was fetched");
                return Ok(CrawlReport {
                    seed,
                    graph,
                    fetched,
                    failures,
                    cancelled: true,
                    started_at,
                    finished_at: Utc::now(),
                });
            }
        };
        fetched += 1;

        // Friends waiting to be expanded show up as placeholders in checkpoints
        for &friend_id in &seed_friends {
            graph.insert_placeholder(friend_id);
        }
        graph.insert_friends(seed, seed_friends.clone());
        log::info!("Seed {} has {} friends, expanding each", seed, seed_friends.len());

        let mut expanded: HashSet<UserId> = HashSet::from([seed]);
        let total = seed_friends.len();
        let mut cancelled = false;

        for (idx, &friend_id) in seed_friends.iter().enumerate() {
            if !expanded.insert(friend_id) {
                continue;
            }

            let result = match self.fetch(&mut limiter, friend_id, &mut shutdown).await {
                Some(result) => result,
                None => {
                    cancelled = true;
                    break;
                }
            };
            fetched += 1;

            match result {
                Ok(friends_of_friend) => {
                    log::info!(
                        "[{}/{}] {} has {} friends",
                        idx + 1,
                        total,
                        friend_id,
                        friends_of_friend.len()
                    );
                    for &id in &friends_of_friend {
                        graph.insert_placeholder(id);
                    }
                    graph.insert_friends(friend_id, friends_of_friend);
                }
                Err(e) if self.config.fail_fast => {
                    log::error!("✗ {}: {} (aborting crawl)", friend_id, e);
                    self.checkpoint(&graph);
                    return Err(e);
                }
                Err(e) => {
                    log::warn!("✗ [{}/{}] {}: {}", idx + 1, total, friend_id, e);
                    failures.push(FetchFailure {
                        user_id: friend_id,
                        reason: e.to_string(),
                    });
                    graph.insert_friends(friend_id, Vec::new());
                }
            }

            let done = expanded.len() - 1;
            if self.config.checkpoint_every > 0 && done % self.config.checkpoint_every == 0 {
                self.checkpoint(&graph);
            }
        }

        if cancelled {
            log::info!("Crawl cancelled after {} requests, saving partial graph", fetched);
            self.checkpoint(&graph);
        } else if let Some(path) = &self.store_path {
            save_graph(path, &graph)?;
            log::info!("Saved graph with {} users to {}", graph.len(), path.display());
        }

        if !failures.is_empty() {
            log::warn!("{} friend(s) could not be fetched and were recorded empty", failures.len());
        }

        Ok(CrawlReport {
            seed,
            graph,
            fetched,
            failures,
            cancelled,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// One rate-limited fetch with retries; `None` if shutdown was requested first.
    async fn fetch(
        &self,
        limiter: &mut RateLimiter,
        user_id: UserId,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<Result<Vec<UserId>>> {
        let mut attempt = 0;
        let mut backoff = self.config.request_delay();

        loop {
            until_shutdown(shutdown, limiter.acquire()).await?;

            match until_shutdown(shutdown, self.source.fetch_friends(user_id)).await? {
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    log::warn!(
                        "Retry {}/{} for {} after error: {}",
                        attempt,
                        self.config.max_retries,
                        user_id,
                        e
                    );
                    until_shutdown(shutdown, tokio::time::sleep(backoff)).await?;
                    backoff = next_backoff(backoff);
                }
                result => return Some(result),
            }
        }
    }

    /// Best-effort save; a failed checkpoint does not stop the crawl.
    fn checkpoint(&self, graph: &FriendGraph) {
        if let Some(path) = &self.store_path {
            match save_graph(path, graph) {
                Ok(()) => log::debug!("Checkpoint: {} users -> {}", graph.len(), path.display()),
                Err(e) => log::warn!("Checkpoint to {} failed: {}", path.display(), e),
            }
        }
    }
}

/// Longest pause between two attempts at the same request
const MAX_BACKOFF: Duration = Duration::from_secs(60);

fn next_backoff(current: Duration) -> Duration {
    current.saturating_mul(2).min(MAX_BACKOFF)
}

/// Drive `fut` unless shutdown is (or becomes) requested first.
async fn until_shutdown<F: Future>(shutdown: &mut watch::Receiver<bool>, fut: F) -> Option<F::Output> {
    if *shutdown.borrow() {
        return None;
    }

    tokio::select! {
        out = fut => Some(out),
        _ = shutdown_requested(shutdown) => None,
    }
}

async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|&stop| stop).await.is_err() {
        // Sender gone: nobody can cancel any more
        std::future::pending::<()>().await;
    }
}
