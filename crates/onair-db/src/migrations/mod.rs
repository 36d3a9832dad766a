//! Embedded schema migrations.
//!
//! Each step is a SQL script compiled into the binary. Applied steps are
//! recorded in `schema_migrations`; a step and its bookkeeping row commit
//! together.

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Schema step {version} ({name}) failed: {source}")]
    Step {
        version: u32,
        name: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

struct SchemaStep {
    version: u32,
    name: &'static str,
    script: &'static str,
}

const STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "catalog",
        script: include_str!("001_catalog.sql"),
    },
    SchemaStep {
        version: 2,
        name: "playback_state",
        script: include_str!("002_playback_state.sql"),
    },
];

const BOOKKEEPING: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
)";

/// Highest step recorded in `schema_migrations`, or 0 for a fresh database.
pub fn current_version(conn: &Connection) -> Result<u32, MigrationError> {
    conn.execute_batch(BOOKKEEPING)?;
    let version = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get::<_, Option<u32>>(0)
        })
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}

/// Version the binary's schema ends at.
pub fn latest_version() -> u32 {
    STEPS.iter().map(|s| s.version).max().unwrap_or(0)
}

/// Bring the schema up to [`latest_version`], returning how many steps ran.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    let from = current_version(conn)?;

    let mut applied = 0;
    for step in STEPS.iter().filter(|s| s.version > from) {
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(step.script)
            .and_then(|_| {
                tx.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    params![step.version, step.name],
                )
            })
            .map_err(|source| MigrationError::Step {
                version: step.version,
                name: step.name,
                source,
            })?;
        tx.commit()?;

        tracing::info!(version = step.version, name = step.name, "Applied schema step");
        applied += 1;
    }

    Ok(applied)
}
