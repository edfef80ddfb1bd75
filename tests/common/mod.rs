// Shared test fixtures for integration tests
// Functions here are used across different test files
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use svnindex::config::{CrawlConfig, Settings};
use svnindex::repository::Database;
use svnindex::repository::crawler::{
    CallOutput, CancellationToken, CrawlEvent, ListingSource, ProgressReporter,
};

pub const ROOT_URL: &str = "https://host/svn/repo/";

/// Create an in-memory test database
pub async fn create_test_db() -> Database {
    Database::new(":memory:").await.unwrap()
}

/// In-memory database with the schema in place
pub async fn setup_db() -> Database {
    let db = create_test_db().await;
    db.init_schema().await.unwrap();
    db
}

/// Crawl config for `ROOT_URL` with no delay between retries
pub fn test_config(max_level: u32, max_tries: u32) -> CrawlConfig {
    let settings = Settings {
        max_level,
        max_tries,
        retry_delay_secs: 0,
        ..Settings::default()
    };
    CrawlConfig::new(ROOT_URL, "HEAD", &settings)
}

pub fn ok(payload: &str) -> CallOutput {
    CallOutput::Completed {
        success: true,
        stdout: payload.as_bytes().to_vec(),
        stderr: String::new(),
    }
}

pub fn fail(stderr: &str) -> CallOutput {
    CallOutput::Completed {
        success: false,
        stdout: Vec::new(),
        stderr: stderr.to_string(),
    }
}

pub const TIMEOUT: &str = "svn: E175012: Connection timed out";
pub const HOST_LOOKUP: &str =
    "svn: E170013: Unable to connect to a repository at URL\nsvn: E731001: No such host is known.";
pub const NOT_FOUND: &str = "svn: E200009: Could not list all targets because some targets don't exist";

/// One recorded listing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub url: String,
    pub recursive: bool,
}

/// Scripted stand-in for the remote listing.
///
/// Scripted outputs for a URL are consumed first; after that the URL's
/// fixed listing is returned. Unknown URLs fail with "path not found".
#[derive(Default)]
pub struct FakeSource {
    listings: HashMap<String, String>,
    scripted: Mutex<HashMap<String, VecDeque<CallOutput>>>,
    calls: Mutex<Vec<Call>>,
    cancel_on_call: Option<(usize, CancellationToken)>,
    delay: Duration,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// The small fixture repository most crawl tests use
    pub fn fixture() -> Self {
        Self::new()
            .listing(ROOT_URL, "trunk/\ntags/\nREADME.txt\n")
            .listing("https://host/svn/repo/tags/", "v1/\nv1/notes.txt\n")
            .listing(
                "https://host/svn/repo/trunk/",
                "src/\nsrc/main.c\nsrc/lib/\nsrc/lib/util.c\nMakefile\n",
            )
    }

    pub fn listing(mut self, url: &str, payload: &str) -> Self {
        self.listings.insert(url.to_string(), payload.to_string());
        self
    }

    pub fn script(self, url: &str, outputs: Vec<CallOutput>) -> Self {
        self.scripted
            .lock()
            .unwrap()
            .insert(url.to_string(), outputs.into());
        self
    }

    /// Cancel `token` while the `n`th call (1-based) is in flight
    pub fn cancel_on_call(mut self, n: usize, token: &CancellationToken) -> Self {
        self.cancel_on_call = Some((n, token.clone()));
        self
    }

    /// Make every call take `delay` unless cancelled first
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn respond(&self, url: &str) -> CallOutput {
        if let Some(output) = self
            .scripted
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front())
        {
            return output;
        }
        match self.listings.get(url) {
            Some(payload) => ok(payload),
            None => fail(NOT_FOUND),
        }
    }
}

impl ListingSource for FakeSource {
    fn program(&self) -> &str {
        "fake-svn"
    }

    async fn run(
        &self,
        url: &str,
        _revision: &str,
        recursive: bool,
        cancel: &CancellationToken,
        progress: &dyn ProgressReporter,
    ) -> std::io::Result<CallOutput> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call {
                url: url.to_string(),
                recursive,
            });
            calls.len()
        };
        progress.report(CrawlEvent::Process { pid: n as u32 });

        if !self.delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(self.delay) => {}
                _ = cancel.cancelled() => return Ok(CallOutput::Interrupted),
            }
        }

        if let Some((at, token)) = &self.cancel_on_call {
            if *at == n {
                token.cancel();
            }
        }
        Ok(self.respond(url))
    }
}

/// Keeps every reported event
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<CrawlEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CrawlEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn terminal_events(&self) -> Vec<CrawlEvent> {
        self.events()
            .into_iter()
            .filter(CrawlEvent::is_terminal)
            .collect()
    }

    pub fn retries(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, CrawlEvent::Retrying { .. }))
            .count()
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, event: CrawlEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Every stored node as (id, parent_id, is_file, name), in id order
pub async fn dump_nodes(db: &Database) -> Vec<(u64, i64, bool, String)> {
    let mut nodes = Vec::new();
    for id in 1..=db.max_id().await.unwrap() {
        if let Some(node) = db.node_by_id(id).await.unwrap() {
            nodes.push((node.id, node.parent_id, node.is_file, node.name));
        }
    }
    nodes
}
