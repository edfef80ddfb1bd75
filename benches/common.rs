// Shared benchmark helpers
// Functions here are used across different benchmark files
#![allow(dead_code)]

use criterion::async_executor::AsyncExecutor;
use svnindex::model::TreeNode;
use svnindex::repository::Database;
use svnindex::repository::crawler::{IdIndex, fold};
use tokio::runtime::Runtime;

pub struct TokioExecutor(pub Runtime);

impl AsyncExecutor for TokioExecutor {
    fn block_on<T>(&self, future: impl std::future::Future<Output = T>) -> T {
        self.0.block_on(future)
    }
}

/// Generate N normalized listing paths, folders first as the normalizer emits them
pub fn generate_paths(num_paths: usize) -> Vec<String> {
    let dirs = ["src", "lib", "test", "pkg", "mod"];
    let mut folders = Vec::new();
    let mut files = Vec::new();

    for i in 0..num_paths {
        let depth = (i % 5) + 1;
        let prefix: String = (0..depth)
            .map(|d| format!("{}_{}/", dirs[d], i / 1000))
            .collect();
        folders.push(format!("repo/{prefix}"));
        files.push(format!("repo/{prefix}file_{i}.c"));
    }
    folders.sort();
    folders.dedup();
    folders.extend(files);
    folders
}

/// Raw `svn list` payload with N entries in listing (not natural) order
pub fn generate_payload(num_entries: usize) -> Vec<u8> {
    let mut payload = String::new();
    for i in (0..num_entries).rev() {
        if i % 4 == 0 {
            payload.push_str(&format!("Dir{i}/\n"));
        } else {
            payload.push_str(&format!("file{i}.txt\n"));
        }
    }
    payload.into_bytes()
}

/// Node rows for N paths, as one crawl batch would produce them
pub fn generate_nodes(num_paths: usize) -> Vec<TreeNode> {
    let paths = generate_paths(num_paths);
    let mut index = IdIndex::new();
    let mut nodes = Vec::new();
    fold(&paths, &mut index, &mut nodes).unwrap();
    nodes
}

/// Create in-memory database for benchmarks
pub async fn setup_bench_db() -> Database {
    let db = Database::new(":memory:").await.unwrap();
    db.init_schema().await.unwrap();
    db
}
