//! Database schema migrations for SQLite.
//!
//! A simple versioned migration system. Each migration is a SQL batch that
//! transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema, stamping applied versions
/// with `now` (Unix ms).
///
/// Idempotent: it can be called any number of times.
pub fn migrate(conn: &mut Connection, now: i64) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now],
            )?;
        }

        tx.commit()?;
        tracing::info!(from = current, to = CURRENT_VERSION, "schema migrated");
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: ACL side table and API keys.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One grant per (archetype, scope)
        CREATE TABLE acl_entries (
            archetype_id BLOB NOT NULL,       -- 16 bytes
            scope TEXT NOT NULL,              -- 'public' or a root uuid
            level INTEGER NOT NULL,           -- AccessLevel as i8 (-1..=2)
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (archetype_id, scope)
        );

        -- API keys; the plaintext secret is never stored
        CREATE TABLE api_keys (
            key_id BLOB PRIMARY KEY,          -- 16 bytes, derived from secret
            root_id BLOB NOT NULL,            -- 16 bytes
            name TEXT NOT NULL,
            secret_hash BLOB NOT NULL UNIQUE, -- 32 bytes, keyed Blake3
            created_at INTEGER NOT NULL,
            expires_at INTEGER                -- NULL = permanent
        );

        CREATE INDEX idx_api_keys_root ON api_keys(root_id, created_at);
        "#,
    )?;

    Ok(())
}
