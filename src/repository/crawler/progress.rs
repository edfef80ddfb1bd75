//! Progress reporting abstraction
//!
//! Decouples the crawl worker from whoever observes it (CLI spinner, tests).
//! Events flow one way, from the worker to the observer.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::ErrorClass;
use crate::util::format_count;

use super::classify::FailureKind;
use super::types::CrawlSummary;

/// Notification emitted by a running crawl
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    Started {
        url: String,
        revision: String,
    },
    /// A directory is about to be listed
    Visiting {
        url: String,
        depth: u32,
    },
    /// Pid of the listing subprocess that is now in flight
    Process {
        pid: u32,
    },
    Retrying {
        url: String,
        attempt: u32,
        max_tries: u32,
        kind: FailureKind,
    },
    BatchCommitted {
        url: String,
        nodes: u64,
    },
    Finished(CrawlSummary),
    Cancelled(CrawlSummary),
    Failed {
        reason: String,
        class: ErrorClass,
    },
}

impl CrawlEvent {
    /// Exactly one terminal event is emitted per crawl
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CrawlEvent::Finished(_) | CrawlEvent::Cancelled(_) | CrawlEvent::Failed { .. }
        )
    }
}

/// Sink for crawl notifications
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: CrawlEvent);
}

/// Forwards events over an unbounded channel
pub struct ChannelProgress {
    tx: mpsc::UnboundedSender<CrawlEvent>,
}

impl ChannelProgress {
    pub fn new(tx: mpsc::UnboundedSender<CrawlEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressReporter for ChannelProgress {
    fn report(&self, event: CrawlEvent) {
        // The observer may have gone away; the crawl carries on regardless
        let _ = self.tx.send(event);
    }
}

/// Indicatif spinner showing the directory being listed and the node count
pub struct SpinnerProgress {
    pb: ProgressBar,
}

impl SpinnerProgress {
    pub fn new(visible: bool) -> Self {
        let pb = if visible {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} nodes  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Self { pb }
    }
}

impl ProgressReporter for SpinnerProgress {
    fn report(&self, event: CrawlEvent) {
        match event {
            CrawlEvent::Started { url, revision } => {
                self.pb.println(format!("Crawling {url}@{revision}"));
            }
            CrawlEvent::Visiting { url, .. } => self.pb.set_message(url),
            CrawlEvent::Process { .. } => {}
            CrawlEvent::Retrying {
                attempt,
                max_tries,
                kind,
                ..
            } => {
                self.pb.println(format!(
                    "Encountered connection problems ({kind}), retry {attempt}/{max_tries}"
                ));
            }
            CrawlEvent::BatchCommitted { nodes, .. } => self.pb.inc(nodes),
            CrawlEvent::Finished(summary) => {
                self.pb.finish_and_clear();
                eprintln!(
                    "Finished: {} directories listed, {} nodes indexed",
                    format_count(summary.directories_listed),
                    format_count(summary.nodes_inserted)
                );
            }
            CrawlEvent::Cancelled(summary) => {
                self.pb.finish_and_clear();
                eprintln!(
                    "Cancelled after {} nodes. The index is usable but incomplete; run the crawl again for a complete index.",
                    format_count(summary.nodes_inserted)
                );
            }
            CrawlEvent::Failed { reason, .. } => {
                self.pb.finish_and_clear();
                eprintln!("Crawl failed: {reason}");
            }
        }
    }
}
