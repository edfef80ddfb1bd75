use anyhow::{Context, Result, bail};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow}, Pool, QueryBuilder, Row, Sqlite, Transaction};
use std::str::FromStr;

use crate::model::{ROOT_PARENT_ID, TreeNode};

use super::SCHEMA_VERSION;
use super::crawler::{CrawlInfo, CrawlStatus};

pub(crate) const KEY_REPOSITORY_URL: &str = "repository_url";
pub(crate) const KEY_REVISION: &str = "revision";
pub(crate) const KEY_ROOT_MARKER: &str = "root_marker";
pub(crate) const KEY_STARTED_AT: &str = "crawl_started_at";
pub(crate) const KEY_STATUS: &str = "crawl_status";

/// Database abstraction for SQLite operations
pub struct Database {
    pool: Pool<Sqlite>,
}

fn node_from_row(row: &SqliteRow) -> TreeNode {
    TreeNode {
        id: row.get::<i64, _>("id") as u64,
        parent_id: row.get("parent_id"),
        is_file: row.get("is_file"),
        name: row.get("name"),
    }
}

impl Database {
    /// Create a new database connection
    pub async fn new(db_path: &str) -> Result<Self> {
        // Configure connection options with PRAGMAs applied to every connection
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", db_path))?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .pragma("temp_store", "MEMORY")
            .pragma("cache_size", "-64000"); // 64MB cache

        // One connection: the crawl worker owns the store for the crawl's duration
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        Ok(Self { pool })
    }

    /// Initialize database schema, returns true if schema was rebuilt
    pub async fn init_schema(&self) -> Result<bool> {
        // Create metadata table first (needed to check version)
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )"
        ).execute(&self.pool).await?;

        // Check schema version
        let stored_version: Option<String> = sqlx::query("SELECT value FROM metadata WHERE key = 'schema_version'")
            .fetch_optional(&self.pool)
            .await?
            .map(|row| row.get("value"));

        let needs_rebuild = stored_version.as_deref() != Some(SCHEMA_VERSION);

        if needs_rebuild {
            if let Some(old) = &stored_version {
                tracing::warn!(from = %old, to = SCHEMA_VERSION, "schema version changed, rebuilding index");
            }
            sqlx::query("DROP TABLE IF EXISTS nodes").execute(&self.pool).await?;
            sqlx::query("DELETE FROM metadata").execute(&self.pool).await?;
        }

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS nodes (
                id INTEGER PRIMARY KEY,
                parent_id INTEGER NOT NULL,
                is_file INTEGER NOT NULL,
                name TEXT NOT NULL
            )"
        ).execute(&self.pool).await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_nodes_parent ON nodes (parent_id)")
            .execute(&self.pool)
            .await?;

        // Store current schema version
        if needs_rebuild {
            sqlx::query("INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?)")
                .bind(SCHEMA_VERSION)
                .execute(&self.pool)
                .await?;
        }

        Ok(needs_rebuild)
    }

    /// Get metadata value by key
    pub async fn get_metadata(&self, key: &str) -> Option<String> {
        sqlx::query("SELECT value FROM metadata WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .ok()
            .flatten()
            .map(|row| row.get("value"))
    }

    /// Set metadata value
    pub async fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO metadata (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Repository recorded by the last crawl, if any
    pub async fn crawl_info(&self) -> Option<CrawlInfo> {
        Some(CrawlInfo {
            repository_url: self.get_metadata(KEY_REPOSITORY_URL).await?,
            revision: self.get_metadata(KEY_REVISION).await?,
            root_marker: self.get_metadata(KEY_ROOT_MARKER).await.unwrap_or_default(),
            started_at: self
                .get_metadata(KEY_STARTED_AT)
                .await
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        })
    }

    /// How the last crawl ended (or `Running` if it never recorded an end)
    pub async fn crawl_status(&self) -> Option<CrawlStatus> {
        self.get_metadata(KEY_STATUS).await?.parse().ok()
    }

    /// Remove every node (a new crawl starts from scratch)
    pub async fn clear_nodes(&self) -> Result<()> {
        sqlx::query("DELETE FROM nodes").execute(&self.pool).await?;
        Ok(())
    }

    /// Insert a batch of nodes in ONE transaction using multi-row INSERT
    pub async fn insert_nodes(&self, nodes: &[TreeNode]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        self.insert_nodes_in_tx(&mut tx, nodes).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_nodes_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        nodes: &[TreeNode],
    ) -> Result<()> {
        // 4 bound parameters per row keeps each statement well under SQLite's limit
        const BATCH_SIZE: usize = 2000;

        for chunk in nodes.chunks(BATCH_SIZE) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO nodes (id, parent_id, is_file, name) "
            );
            qb.push_values(chunk, |mut row, node| {
                row.push_bind(node.id as i64)
                    .push_bind(node.parent_id)
                    .push_bind(node.is_file)
                    .push_bind(node.name.as_str());
            });
            qb.build().execute(&mut **tx).await?;
        }

        Ok(())
    }

    /// Children of a node in insertion order
    pub async fn children_of(&self, parent_id: i64) -> Result<Vec<TreeNode>> {
        let rows = sqlx::query("SELECT id, parent_id, is_file, name FROM nodes WHERE parent_id = ? ORDER BY id")
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(node_from_row).collect())
    }

    /// Top-level nodes (normally the single repository root)
    pub async fn roots(&self) -> Result<Vec<TreeNode>> {
        self.children_of(ROOT_PARENT_ID).await
    }

    pub async fn node_by_id(&self, id: u64) -> Result<Option<TreeNode>> {
        let row = sqlx::query("SELECT id, parent_id, is_file, name FROM nodes WHERE id = ?")
            .bind(id as i64)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(node_from_row))
    }

    pub async fn has_children(&self, id: u64) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM nodes WHERE parent_id = ? LIMIT 1")
            .bind(id as i64)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Files whose name contains `pattern` (case-insensitive for ASCII, SQLite LIKE)
    pub async fn search_files(&self, pattern: &str) -> Result<Vec<TreeNode>> {
        let escaped = pattern
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let rows = sqlx::query(
            "SELECT id, parent_id, is_file, name FROM nodes \
             WHERE is_file = 1 AND name LIKE ? ESCAPE '\\' ORDER BY id"
        )
        .bind(format!("%{}%", escaped))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(node_from_row).collect())
    }

    /// Every node with exactly this name
    pub async fn nodes_named(&self, name: &str) -> Result<Vec<TreeNode>> {
        let rows = sqlx::query("SELECT id, parent_id, is_file, name FROM nodes WHERE name = ? ORDER BY id")
            .bind(name)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(node_from_row).collect())
    }

    /// Path segments from the root down to `id`
    pub async fn path_segments(&self, id: u64) -> Result<Vec<String>> {
        let mut segments = Vec::new();
        let mut current = Some(id);
        // A well-formed table never needs more steps than it has rows
        let limit = self.node_count().await?;

        while let Some(node_id) = current {
            if segments.len() as u64 > limit {
                bail!("Cycle detected while resolving path of node {}", id);
            }
            let node = self
                .node_by_id(node_id)
                .await?
                .with_context(|| format!("Node {} is missing (while resolving path of {})", node_id, id))?;
            current = (!node.is_root()).then_some(node.parent_id as u64);
            segments.push(node.name);
        }

        segments.reverse();
        Ok(segments)
    }

    /// Full path of a node, rebuilt by walking parent links
    pub async fn path_of(&self, id: u64) -> Result<String> {
        Ok(self.path_segments(id).await?.join("/"))
    }

    pub async fn node_count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM nodes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    /// Highest id stored (0 for an empty table)
    pub async fn max_id(&self) -> Result<u64> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(id) FROM nodes")
            .fetch_one(&self.pool)
            .await?;
        Ok(max.unwrap_or(0) as u64)
    }
}
