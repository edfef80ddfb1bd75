//! Domain types for crawling
//!
//! These types form the data contract between the crawl layers.

use std::fmt;
use std::str::FromStr;

use crate::config::CrawlConfig;

/// One pending directory on the work stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub url: String,
    pub depth: u32,
}

/// Mutable state of a single crawl, owned by the driver.
///
/// Marker and depth limit are fixed once the crawl has started.
#[derive(Debug, Clone)]
pub struct CrawlState {
    pub root_marker: String,
    pub max_level: u32,
    pub work_stack: Vec<WorkItem>,
    pub cancelled: bool,
}

impl CrawlState {
    /// Fresh state with the repository root queued at depth 0
    pub fn new(config: &CrawlConfig) -> Self {
        Self {
            root_marker: config.root_marker.clone(),
            max_level: config.max_level,
            work_stack: vec![WorkItem {
                url: config.repository_url.clone(),
                depth: 0,
            }],
            cancelled: false,
        }
    }

    pub fn pop(&mut self) -> Option<WorkItem> {
        self.work_stack.pop()
    }

    /// Whether a directory at `depth` is listed recursively
    #[inline]
    pub fn is_recursive(&self, depth: u32) -> bool {
        depth >= self.max_level
    }

    /// Queue every folder entry of a normalized listing at `depth`.
    ///
    /// Entries are pushed in reverse so pops follow the listing's forward order.
    pub fn push_folders(&mut self, server_url: &str, entries: &[String], depth: u32) {
        for entry in entries.iter().rev() {
            if crate::util::is_folder_entry(entry) {
                self.work_stack.push(WorkItem {
                    url: format!("{server_url}{entry}"),
                    depth,
                });
            }
        }
    }
}

/// Raw result of a successful listing call
#[derive(Debug, Clone)]
pub struct RawListing {
    /// Exact directory URL that was listed
    pub url: String,
    pub payload: Vec<u8>,
}

/// What one invocation of the listing source produced
#[derive(Debug, Clone)]
pub enum CallOutput {
    Completed {
        success: bool,
        stdout: Vec<u8>,
        stderr: String,
    },
    /// The call was killed because cancellation was requested
    Interrupted,
}

/// Lifecycle status persisted alongside the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStatus {
    Running,
    Finished,
    Cancelled,
    Failed,
}

impl CrawlStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CrawlStatus::Running => "running",
            CrawlStatus::Finished => "finished",
            CrawlStatus::Cancelled => "cancelled",
            CrawlStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrawlStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(CrawlStatus::Running),
            "finished" => Ok(CrawlStatus::Finished),
            "cancelled" => Ok(CrawlStatus::Cancelled),
            "failed" => Ok(CrawlStatus::Failed),
            other => Err(format!("unknown crawl status: {other}")),
        }
    }
}

/// Repository description recorded when a crawl starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlInfo {
    pub repository_url: String,
    pub revision: String,
    pub root_marker: String,
    pub started_at: i64,
}

/// Counters reported with the terminal event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub directories_listed: u64,
    pub nodes_inserted: u64,
    pub last_id: u64,
}

/// Non-error terminal states of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    Finished(CrawlSummary),
    /// Stopped on request; every committed batch is intact but the index is partial
    Cancelled(CrawlSummary),
}

impl CrawlOutcome {
    pub fn status(&self) -> CrawlStatus {
        match self {
            CrawlOutcome::Finished(_) => CrawlStatus::Finished,
            CrawlOutcome::Cancelled(_) => CrawlStatus::Cancelled,
        }
    }

    pub fn summary(&self) -> &CrawlSummary {
        match self {
            CrawlOutcome::Finished(s) | CrawlOutcome::Cancelled(s) => s,
        }
    }
}
