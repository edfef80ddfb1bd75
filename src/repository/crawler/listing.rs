//! Listing client: one remote "list directory" call plus the retry policy.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::CrawlConfig;
use crate::error::ListError;

use super::classify::{FailureKind, classify};
use super::progress::{CrawlEvent, ProgressReporter};
use super::types::{CallOutput, RawListing};

/// A way of invoking the remote listing once.
///
/// Implementations report the pid of any subprocess they start through
/// `progress` and return [`CallOutput::Interrupted`] if `cancel` fires while
/// the call is in flight.
pub trait ListingSource: Send + Sync {
    /// Program name used in error messages
    fn program(&self) -> &str;

    fn run(
        &self,
        url: &str,
        revision: &str,
        recursive: bool,
        cancel: &CancellationToken,
        progress: &dyn ProgressReporter,
    ) -> impl Future<Output = std::io::Result<CallOutput>> + Send;
}

/// Applies classification and the retry policy on top of a [`ListingSource`].
///
/// One client is used per crawl; it remembers whether the first call has
/// already happened.
pub struct ListingClient<'a, S: ListingSource> {
    source: &'a S,
    revision: &'a str,
    max_tries: u32,
    retry_delay: Duration,
    first_call: bool,
}

impl<'a, S: ListingSource> ListingClient<'a, S> {
    pub fn new(source: &'a S, config: &'a CrawlConfig) -> Self {
        Self {
            source,
            revision: &config.revision,
            max_tries: config.max_tries,
            retry_delay: config.retry_delay,
            first_call: true,
        }
    }

    /// List one directory, shallow or recursive.
    ///
    /// Fatal failures return immediately. Transient failures are retried up
    /// to `max_tries` times with a fixed delay, then become
    /// [`ListError::RetryExhausted`].
    pub async fn list(
        &mut self,
        url: &str,
        recursive: bool,
        cancel: &CancellationToken,
        progress: &dyn ProgressReporter,
    ) -> Result<RawListing, ListError> {
        let first = std::mem::replace(&mut self.first_call, false);
        let mut retries = 0u32;

        loop {
            let output = self
                .source
                .run(url, self.revision, recursive, cancel, progress)
                .await
                .map_err(|source| ListError::Spawn {
                    program: self.source.program().to_string(),
                    source,
                })?;

            let (stdout, stderr) = match output {
                CallOutput::Interrupted => return Err(ListError::Cancelled),
                CallOutput::Completed {
                    success: true,
                    stdout,
                    stderr,
                } => {
                    if !stderr.trim().is_empty() {
                        warn!(%url, stderr = stderr.trim(), "listing succeeded with warnings");
                    }
                    return Ok(RawListing {
                        url: url.to_string(),
                        payload: stdout,
                    });
                }
                CallOutput::Completed {
                    success: false,
                    stdout,
                    stderr,
                } => (stdout, stderr),
            };

            // A call killed on request fails like any other; don't misreport it
            if cancel.is_cancelled() {
                debug!(%url, "listing failed after cancellation was requested");
                return Err(ListError::Cancelled);
            }

            let kind = classify(&stderr);
            debug!(%url, %kind, stdout_len = stdout.len(), "listing failed");

            match kind {
                FailureKind::InvalidRevision => {
                    return Err(ListError::InvalidRevision {
                        revision: self.revision.to_string(),
                    });
                }
                FailureKind::PathNotFound => {
                    return Err(ListError::PathNotFound {
                        url: url.to_string(),
                    });
                }
                FailureKind::InvalidUrl => {
                    return Err(ListError::InvalidUrl {
                        url: url.to_string(),
                    });
                }
                // Only the very first attempt of a crawl; its retries are ordinary
                FailureKind::HostLookupFailed if first && retries == 0 => {
                    return Err(ListError::UnreachableHost {
                        url: url.to_string(),
                    });
                }
                _ if !kind.is_transient() => {
                    return Err(ListError::Unknown {
                        url: url.to_string(),
                        message: stderr.trim().to_string(),
                    });
                }
                _ => {}
            }

            if retries >= self.max_tries {
                return Err(ListError::RetryExhausted {
                    max_tries: self.max_tries,
                    last: kind,
                });
            }
            retries += 1;

            warn!(
                %url,
                %kind,
                attempt = retries,
                max_tries = self.max_tries,
                "connection problem, retrying in {:?}",
                self.retry_delay
            );
            progress.report(CrawlEvent::Retrying {
                url: url.to_string(),
                attempt: retries,
                max_tries: self.max_tries,
                kind,
            });

            tokio::select! {
                _ = tokio::time::sleep(self.retry_delay) => {}
                _ = cancel.cancelled() => return Err(ListError::Cancelled),
            }
        }
    }
}
