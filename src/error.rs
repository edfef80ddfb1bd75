//! Error types for listing and crawling.

use thiserror::Error;

use crate::model::NodeKind;
use crate::repository::FailureKind;

/// Failure returned by the listing client after its retry policy has run.
///
/// Transient failures never surface here directly: they are retried and
/// escalate to [`ListError::RetryExhausted`].
#[derive(Debug, Error)]
pub enum ListError {
    #[error("This revision is not valid: {revision}")]
    InvalidRevision { revision: String },

    #[error("Couldn't find this folder: {url}")]
    PathNotFound { url: String },

    #[error("The url is not correct or the repository is incorrectly configured: {url}")]
    InvalidUrl { url: String },

    /// Host lookup and connection setup both failed on the very first call
    #[error("Check the url and the network connection and try again: {url}")]
    UnreachableHost { url: String },

    #[error("Couldn't connect to the server even after {max_tries} tries (last failure: {last})")]
    RetryExhausted { max_tries: u32, last: FailureKind },

    #[error("Listing {url} failed: {message}")]
    Unknown { url: String, message: String },

    #[error("Failed to run {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Listing was cancelled")]
    Cancelled,
}

/// Coarse classification used by observers to present a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    FatalConfiguration,
    RetryExhausted,
    Inconsistency,
    Store,
    Unknown,
    Cancelled,
}

impl ListError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ListError::InvalidRevision { .. }
            | ListError::PathNotFound { .. }
            | ListError::InvalidUrl { .. }
            | ListError::UnreachableHost { .. } => ErrorClass::FatalConfiguration,
            ListError::RetryExhausted { .. } => ErrorClass::RetryExhausted,
            ListError::Unknown { .. } | ListError::Spawn { .. } => ErrorClass::Unknown,
            ListError::Cancelled => ErrorClass::Cancelled,
        }
    }
}

/// Failure of a crawl as a whole
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Listing(#[from] ListError),

    #[error("Inconsistent listing: segment '{segment}' of '{path}' was already indexed as a {indexed_as}")]
    Inconsistency {
        path: String,
        segment: String,
        indexed_as: NodeKind,
    },

    #[error("Root marker '{marker}' is not a path segment of {url}")]
    RootMarkerMissing { url: String, marker: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),

    /// The crawl task panicked or was aborted
    #[error("Crawl worker stopped unexpectedly: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl CrawlError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CrawlError::Listing(e) => e.class(),
            CrawlError::Inconsistency { .. } => ErrorClass::Inconsistency,
            CrawlError::RootMarkerMissing { .. } | CrawlError::Config(_) => {
                ErrorClass::FatalConfiguration
            }
            CrawlError::Store(_) => ErrorClass::Store,
            CrawlError::Worker(_) => ErrorClass::Unknown,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.class() == ErrorClass::Cancelled
    }
}
