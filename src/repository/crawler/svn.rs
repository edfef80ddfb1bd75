//! `svn list` subprocess implementation of [`ListingSource`]

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use tokio_util::sync::CancellationToken;
use super::listing::ListingSource;
use super::progress::{CrawlEvent, ProgressReporter};
use super::types::CallOutput;

/// Runs `svn list [-R] --non-interactive <url>@<revision>`
#[derive(Debug, Clone)]
pub struct SvnCli {
    program: String,
}

impl SvnCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for one listing call (peg revision syntax)
    pub fn args(url: &str, revision: &str, recursive: bool) -> Vec<String> {
        let mut args = vec!["list".to_string(), "--non-interactive".to_string()];
        if recursive {
            args.push("-R".to_string());
        }
        args.push(format!("{url}@{revision}"));
        args
    }
}

impl Default for SvnCli {
    fn default() -> Self {
        Self::new("svn")
    }
}

impl ListingSource for SvnCli {
    fn program(&self) -> &str {
        &self.program
    }

    async fn run(
        &self,
        url: &str,
        revision: &str,
        recursive: bool,
        cancel: &CancellationToken,
        progress: &dyn ProgressReporter,
    ) -> std::io::Result<CallOutput> {
        let mut command = Command::new(&self.program);
        command
            .args(Self::args(url, revision, recursive))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group: a terminal Ctrl-C must reach only us, never the child
        #[cfg(unix)]
        command.process_group(0);
        let child = command.spawn()?;

        let pid = child.id();
        if let Some(pid) = pid {
            progress.report(CrawlEvent::Process { pid });
        }

        // Dropping the wait future drops the child, which kills it
        tokio::select! {
            output = child.wait_with_output() => {
                let output = output?;
                Ok(CallOutput::Completed {
                    success: output.status.success(),
                    stdout: output.stdout,
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
            _ = cancel.cancelled() => {
                debug!(?pid, %url, "killing in-flight listing");
                Ok(CallOutput::Interrupted)
            }
        }
    }
}
