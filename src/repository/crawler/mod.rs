//! Remote repository crawler
//!
//! Lists a remote repository directory by directory and folds the results
//! into a flat node table.
//!
//! # Architecture
//!
//! The crawler is organized into layers:
//!
//! - **types**: Domain types (WorkItem, CrawlState, CrawlOutcome, etc.)
//! - **classify**: Maps listing error output to a closed set of failure kinds
//! - **listing**: Listing source trait and the retrying listing client
//! - **svn**: `svn list` subprocess listing source
//! - **normalize**: Raw payload -> ordered repository-relative paths
//! - **folder**: Path folding into node rows with a per-crawl id index
//! - **progress**: Progress event stream
//! - **store**: Persistence layer trait
//! - **db_store**: Database implementation of CrawlStore
//! - **Crawler**: Main crawl driver (this module)

mod classify;
mod db_store;
mod folder;
mod listing;
mod normalize;
mod progress;
mod store;
mod svn;
mod types;

pub use classify::{FailureKind, classify};
pub use folder::{IdIndex, IndexEntry, NodeSink, fold};
pub use listing::{ListingClient, ListingSource};
pub use normalize::{decode_payload, normalize};
pub use progress::{ChannelProgress, CrawlEvent, ProgressReporter, SpinnerProgress};
pub use store::CrawlStore;
pub use svn::SvnCli;
pub use tokio_util::sync::CancellationToken;
pub use types::{
    CallOutput, CrawlInfo, CrawlOutcome, CrawlState, CrawlStatus, CrawlSummary, RawListing,
    WorkItem,
};

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CrawlConfig;
use crate::error::{CrawlError, ListError};
use crate::model::TreeNode;
use crate::util::{split_at_root, unix_now};

/// Crawl driver: walks the remote hierarchy with an explicit work stack
pub struct Crawler<S: ListingSource> {
    source: S,
    config: CrawlConfig,
}

impl<S: ListingSource> Crawler<S> {
    pub fn new(source: S, config: CrawlConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run one complete crawl into `store`.
    ///
    /// Emits exactly one terminal event on `progress`. A cancellation request
    /// is not an error: it ends the crawl with [`CrawlOutcome::Cancelled`]
    /// after the batch in flight has been committed or discarded whole.
    pub async fn run(
        &self,
        store: &impl CrawlStore,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<CrawlOutcome, CrawlError> {
        let result = match self.crawl(store, progress, cancel).await {
            Ok(outcome) => store
                .finish_crawl(outcome.status())
                .await
                .map(|_| outcome)
                .map_err(CrawlError::from),
            Err(e) => {
                if let Err(store_err) = store.finish_crawl(CrawlStatus::Failed).await {
                    warn!(error = %store_err, "failed to record crawl failure");
                }
                Err(e)
            }
        };

        match &result {
            Ok(CrawlOutcome::Finished(summary)) => {
                info!(
                    directories = summary.directories_listed,
                    nodes = summary.nodes_inserted,
                    "crawl finished"
                );
                progress.report(CrawlEvent::Finished(*summary));
            }
            Ok(CrawlOutcome::Cancelled(summary)) => {
                info!(nodes = summary.nodes_inserted, "crawl cancelled, index is partial");
                progress.report(CrawlEvent::Cancelled(*summary));
            }
            Err(e) => {
                warn!(error = %e, "crawl failed");
                progress.report(CrawlEvent::Failed {
                    reason: e.to_string(),
                    class: e.class(),
                });
            }
        }

        result
    }

    async fn crawl(
        &self,
        store: &impl CrawlStore,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<CrawlOutcome, CrawlError> {
        self.config.validate()?;
        let (server_url, _) = split_at_root(&self.config.repository_url, &self.config.root_marker)
            .ok_or_else(|| CrawlError::RootMarkerMissing {
                url: self.config.repository_url.clone(),
                marker: self.config.root_marker.clone(),
            })?;

        let info = CrawlInfo {
            repository_url: self.config.repository_url.clone(),
            revision: self.config.revision.clone(),
            root_marker: self.config.root_marker.clone(),
            started_at: unix_now(),
        };
        store.begin_crawl(&info).await?;

        info!(url = %info.repository_url, revision = %info.revision, max_level = self.config.max_level, "crawl started");
        progress.report(CrawlEvent::Started {
            url: info.repository_url.clone(),
            revision: info.revision.clone(),
        });

        let mut state = CrawlState::new(&self.config);
        let mut client = ListingClient::new(&self.source, &self.config);
        let mut index = IdIndex::new();
        let mut summary = CrawlSummary::default();
        let mut batch: Vec<TreeNode> = Vec::new();

        loop {
            // Observed between batches only, never mid-batch
            if cancel.is_cancelled() {
                state.cancelled = true;
                break;
            }
            let Some(WorkItem { url, depth }) = state.pop() else {
                break;
            };

            progress.report(CrawlEvent::Visiting {
                url: url.clone(),
                depth,
            });
            let recursive = state.is_recursive(depth);
            debug!(%url, depth, recursive, "listing directory");

            let listing = match client.list(&url, recursive, cancel, progress).await {
                Ok(listing) => listing,
                Err(ListError::Cancelled) => {
                    state.cancelled = true;
                    break;
                }
                Err(e) => return Err(e.into()),
            };
            summary.directories_listed += 1;

            let paths = normalize(&listing.url, &state.root_marker, &listing.payload)?;
            if paths.is_empty() {
                continue;
            }

            if !recursive {
                state.push_folders(server_url, &paths, depth + 1);
            }

            batch.clear();
            let inserted = fold(&paths, &mut index, &mut batch)?;
            store.commit_batch(&batch).await?;

            summary.nodes_inserted += inserted;
            summary.last_id = index.last_id();
            debug!(%url, nodes = inserted, pending = state.work_stack.len(), "batch committed");
            progress.report(CrawlEvent::BatchCommitted { url, nodes: inserted });
        }

        Ok(if state.cancelled {
            CrawlOutcome::Cancelled(summary)
        } else {
            CrawlOutcome::Finished(summary)
        })
    }
}

/// Handle to a crawl running on its own task
pub struct CrawlHandle {
    cancel: CancellationToken,
    events: mpsc::UnboundedReceiver<CrawlEvent>,
    task: JoinHandle<Result<CrawlOutcome, CrawlError>>,
}

impl CrawlHandle {
    /// Request cooperative cancellation (idempotent); kills the in-flight listing
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Next progress event; `None` once the worker is done and the stream is drained
    pub async fn next_event(&mut self) -> Option<CrawlEvent> {
        self.events.recv().await
    }

    /// Wait for the worker and return the crawl's final result
    pub async fn join(self) -> Result<CrawlOutcome, CrawlError> {
        self.task.await?
    }
}

/// Start a crawl on a dedicated task.
///
/// The store is shared through an `Arc` so the caller can read the index
/// afterwards; it must not be written by anyone else while the crawl runs.
pub fn spawn_crawl<S, St>(crawler: Crawler<S>, store: Arc<St>) -> CrawlHandle
where
    S: ListingSource + 'static,
    St: CrawlStore + 'static,
{
    let (tx, events) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let worker_cancel = cancel.clone();

    let task = tokio::spawn(async move {
        let progress = ChannelProgress::new(tx);
        crawler.run(store.as_ref(), &progress, &worker_cancel).await
    });

    CrawlHandle {
        cancel,
        events,
        task,
    }
}
