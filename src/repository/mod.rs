pub mod crawler;
mod database;

pub use crawler::{
    spawn_crawl, CancellationToken, CrawlEvent, CrawlHandle, CrawlOutcome, CrawlStatus,
    CrawlStore, CrawlSummary, Crawler, FailureKind, ListingSource, SvnCli,
};
pub use database::Database;

// Re-export the schema version for callers who need it
pub const SCHEMA_VERSION: &str = "1";
