//! Database implementation of CrawlStore

use anyhow::Result;

use crate::model::TreeNode;
use crate::repository::Database;
use crate::repository::database::{
    KEY_REPOSITORY_URL, KEY_REVISION, KEY_ROOT_MARKER, KEY_STARTED_AT, KEY_STATUS,
};

use super::store::CrawlStore;
use super::types::{CrawlInfo, CrawlStatus};

impl CrawlStore for Database {
    async fn begin_crawl(&self, info: &CrawlInfo) -> Result<()> {
        self.clear_nodes().await?;
        self.set_metadata(KEY_REPOSITORY_URL, &info.repository_url).await?;
        self.set_metadata(KEY_REVISION, &info.revision).await?;
        self.set_metadata(KEY_ROOT_MARKER, &info.root_marker).await?;
        self.set_metadata(KEY_STARTED_AT, &info.started_at.to_string()).await?;
        self.set_metadata(KEY_STATUS, CrawlStatus::Running.as_str()).await
    }

    async fn commit_batch(&self, nodes: &[TreeNode]) -> Result<()> {
        if nodes.is_empty() {
            return Ok(());
        }
        self.insert_nodes(nodes).await
    }

    async fn finish_crawl(&self, status: CrawlStatus) -> Result<()> {
        self.set_metadata(KEY_STATUS, status.as_str()).await
    }
}
