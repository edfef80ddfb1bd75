//! Crawl store trait for persistence abstraction
//!
//! Decouples the crawl driver from database implementation details.

use anyhow::Result;
use std::future::Future;

use crate::model::TreeNode;

use super::types::{CrawlInfo, CrawlStatus};

/// Persistence layer for crawl results
///
/// This trait abstracts the database operations needed by the crawler,
/// allowing the crawl logic to be tested without a real database.
pub trait CrawlStore: Send + Sync {
    /// Start a fresh index: drop previously stored nodes and record the repository.
    fn begin_crawl(&self, info: &CrawlInfo) -> impl Future<Output = Result<()>> + Send;

    /// Persist one listing batch atomically: all rows or none.
    fn commit_batch(&self, nodes: &[TreeNode]) -> impl Future<Output = Result<()>> + Send;

    /// Record how the crawl ended
    fn finish_crawl(&self, status: CrawlStatus) -> impl Future<Output = Result<()>> + Send;
}
