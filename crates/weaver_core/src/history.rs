//! Run history store - SQLite-backed record of completed runs.
//!
//! Records are written once on run completion and never updated. Ids are
//! SQLite rowids, monotonically increasing. Every `persist` is one atomic
//! insert. Store failures are reported to the caller as errors and must be
//! surfaced as warnings, never abort the orchestration that produced the
//! data.

use crate::orchestrator::RunResult;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    intent TEXT NOT NULL,
    iterations INTEGER NOT NULL,
    variants INTEGER NOT NULL,
    top_score REAL NOT NULL,
    top_variant_components TEXT NOT NULL, -- JSON object
    reflection_summary TEXT NOT NULL,
    reflection_json TEXT NOT NULL -- JSON payload as decoded
);

CREATE INDEX IF NOT EXISTS idx_runs_timestamp ON runs(timestamp);
"#;

/// Persisted summary of one orchestration run.
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub intent: String,
    pub iterations: u32,
    pub variants: u32,
    pub top_score: f64,
    pub top_variant_components: String,
    pub reflection_summary: String,
    pub reflection_json: String,
}

/// SQLite-backed run history.
pub struct RunHistory {
    conn: Connection,
}

impl RunHistory {
    /// Open or create the history database at the default location
    /// (`$XDG_DATA_HOME/weaver/history.db`).
    pub fn open_default() -> Result<Self> {
        let dir = dirs::data_dir()
            .context("no data directory available")?
            .join("weaver");
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        Self::open_at(dir.join("history.db"))
    }

    /// Open at a specific path (testing, or a configured override).
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).with_context(|| {
            format!("failed to open history db {}", path.as_ref().display())
        })?;

        // WAL for concurrent readers while another run persists
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self { conn })
    }

    /// Resolve the configured path or fall back to the default location.
    pub fn open_configured(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::open_at(path),
            None => Self::open_default(),
        }
    }

    /// Persist one completed run. One atomic insert; returns the new id.
    pub fn persist(&self, run: &RunResult) -> Result<i64> {
        let components = run
            .top_variant
            .final_pattern
            .components()
            .map(|c| serde_json::to_string(c))
            .transpose()?
            .unwrap_or_else(|| "{}".to_string());

        self.conn
            .execute(
                "INSERT INTO runs (timestamp, intent, iterations, variants, top_score,
                                   top_variant_components, reflection_summary, reflection_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    Utc::now(),
                    &run.intent,
                    run.iterations,
                    run.variants,
                    run.top_variant.ranking_score,
                    components,
                    &run.reflection.summary,
                    run.reflection.raw.to_string(),
                ],
            )
            .context("failed to insert run record")?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent runs, newest first.
    pub fn list_recent(&self, limit: u32) -> Result<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, intent, iterations, variants, top_score,
                    top_variant_components, reflection_summary, reflection_json
             FROM runs ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt
            .query_map(params![limit], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to read run records")?;

        Ok(rows)
    }

    /// Fetch one record by id; `None` when it does not exist.
    pub fn fetch(&self, id: i64) -> Result<Option<RunRecord>> {
        self.conn
            .query_row(
                "SELECT id, timestamp, intent, iterations, variants, top_score,
                        top_variant_components, reflection_summary, reflection_json
                 FROM runs WHERE id = ?1",
                params![id],
                row_to_record,
            )
            .optional()
            .context("failed to fetch run record")
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        intent: row.get(2)?,
        iterations: row.get(3)?,
        variants: row.get(4)?,
        top_score: row.get(5)?,
        top_variant_components: row.get(6)?,
        reflection_summary: row.get(7)?,
        reflection_json: row.get(8)?,
    })
}
