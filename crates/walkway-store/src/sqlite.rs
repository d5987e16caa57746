//! SQLite implementation of the store traits.
//!
//! The durable backend. Uses rusqlite with bundled SQLite; the connection
//! sits behind a mutex, so each method body is one atomic unit.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;
use uuid::Uuid;
use walkway_core::{
    AccessLevel, AclEntry, AclScope, ApiKeyId, ArchetypeId, Clock, RootId, SecretHash,
    SharedClock, SystemClock,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{
    AclReader, AclWriter, ApiKeyRecord, ApiKeyStore, DeleteOutcome, UpsertOutcome,
};

const PUBLIC_SCOPE: &str = "public";

/// SQLite-based store implementation.
///
/// Implements ACL and API key persistence. It is not a graph store, so it
/// offers no [`ArchetypeDirectory`](crate::ArchetypeDirectory).
///
/// Row timestamps (`updated_at`, `applied_at`) come from the store's clock.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    clock: SharedClock,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    /// [`SqliteStore::open`] with an explicit clock.
    pub fn open_with_clock(path: impl AsRef<Path>, clock: SharedClock) -> Result<Self> {
        Self::from_connection(Connection::open(path)?, clock)
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        Self::open_memory_with_clock(Arc::new(SystemClock))
    }

    /// [`SqliteStore::open_memory`] with an explicit clock.
    pub fn open_memory_with_clock(clock: SharedClock) -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, clock)
    }

    fn from_connection(mut conn: Connection, clock: SharedClock) -> Result<Self> {
        migration::migrate(&mut conn, clock.now_millis())?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            clock,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Poisoned(format!("sqlite connection: {e}")))
    }
}

fn encode_scope(scope: &AclScope) -> String {
    match scope {
        AclScope::Public => PUBLIC_SCOPE.to_string(),
        AclScope::Root(root) => root.0.hyphenated().to_string(),
    }
}

fn decode_scope(raw: &str) -> Result<AclScope> {
    if raw == PUBLIC_SCOPE {
        return Ok(AclScope::Public);
    }
    Uuid::parse_str(raw)
        .map(|id| AclScope::Root(RootId(id)))
        .map_err(|e| StoreError::InvalidData(format!("acl scope {raw:?}: {e}")))
}

fn decode_level(raw: i64) -> Result<AccessLevel> {
    i8::try_from(raw)
        .ok()
        .and_then(AccessLevel::from_i8)
        .ok_or_else(|| StoreError::InvalidData(format!("access level {raw}")))
}

fn fixed<const N: usize>(bytes: Vec<u8>, column: &str) -> Result<[u8; N]> {
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| StoreError::InvalidData(format!("{column}: {} bytes", b.len())))
}

/// Raw api_keys row before validation.
type KeyRow = (Vec<u8>, Vec<u8>, String, Vec<u8>, i64, Option<i64>);

const KEY_COLUMNS: &str = "key_id, root_id, name, secret_hash, created_at, expires_at";

fn read_key_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<KeyRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn key_from_row(row: KeyRow) -> Result<ApiKeyRecord> {
    let (key_id, root_id, name, secret_hash, created_at, expires_at) = row;
    Ok(ApiKeyRecord {
        id: ApiKeyId::from_bytes(fixed(key_id, "key_id")?),
        root: RootId::from_bytes(fixed(root_id, "root_id")?),
        name,
        secret_hash: SecretHash::from_bytes(fixed(secret_hash, "secret_hash")?),
        created_at,
        expires_at,
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl AclReader for SqliteStore {
    fn acl_entries(&self, archetype: &ArchetypeId) -> Result<Vec<AclEntry>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT scope, level FROM acl_entries
             WHERE archetype_id = ?1
             ORDER BY scope <> 'public', scope",
        )?;

        let rows = stmt
            .query_map(params![archetype.as_bytes().as_slice()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(scope, level)| Ok(AclEntry::new(decode_scope(&scope)?, decode_level(level)?)))
            .collect()
    }

    fn acl_level(&self, archetype: &ArchetypeId, scope: &AclScope) -> Result<Option<AccessLevel>> {
        let conn = self.lock()?;

        let level: Option<i64> = conn
            .query_row(
                "SELECT level FROM acl_entries WHERE archetype_id = ?1 AND scope = ?2",
                params![archetype.as_bytes().as_slice(), encode_scope(scope)],
                |row| row.get(0),
            )
            .optional()?;

        level.map(decode_level).transpose()
    }
}

impl AclWriter for SqliteStore {
    fn upsert_acl(&self, archetype: &ArchetypeId, entry: AclEntry) -> Result<UpsertOutcome> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let scope = encode_scope(&entry.scope);

        let previous: Option<i64> = tx
            .query_row(
                "SELECT level FROM acl_entries WHERE archetype_id = ?1 AND scope = ?2",
                params![archetype.as_bytes().as_slice(), &scope],
                |row| row.get(0),
            )
            .optional()?;

        let outcome = match previous.map(decode_level).transpose()? {
            None => UpsertOutcome::Inserted,
            Some(prev) if prev == entry.level => UpsertOutcome::Unchanged,
            Some(prev) => UpsertOutcome::Replaced { previous: prev },
        };

        if outcome != UpsertOutcome::Unchanged {
            tx.execute(
                "INSERT INTO acl_entries (archetype_id, scope, level, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(archetype_id, scope) DO UPDATE SET
                    level = excluded.level,
                    updated_at = excluded.updated_at",
                params![
                    archetype.as_bytes().as_slice(),
                    &scope,
                    entry.level.to_i8() as i64,
                    self.clock.now_millis(),
                ],
            )?;
        }

        tx.commit()?;
        debug!(%archetype, scope = %entry.scope, level = %entry.level, ?outcome, "acl upsert");
        Ok(outcome)
    }

    fn remove_acl(&self, archetype: &ArchetypeId, scope: &AclScope) -> Result<Option<AccessLevel>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let encoded = encode_scope(scope);

        let previous: Option<i64> = tx
            .query_row(
                "SELECT level FROM acl_entries WHERE archetype_id = ?1 AND scope = ?2",
                params![archetype.as_bytes().as_slice(), &encoded],
                |row| row.get(0),
            )
            .optional()?;

        if previous.is_some() {
            tx.execute(
                "DELETE FROM acl_entries WHERE archetype_id = ?1 AND scope = ?2",
                params![archetype.as_bytes().as_slice(), &encoded],
            )?;
        }

        tx.commit()?;
        previous.map(decode_level).transpose()
    }
}

impl ApiKeyStore for SqliteStore {
    fn insert_api_key(&self, record: &ApiKeyRecord) -> Result<()> {
        let conn = self.lock()?;

        let inserted = conn.execute(
            "INSERT INTO api_keys (key_id, root_id, name, secret_hash, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id.as_bytes().as_slice(),
                record.root.as_bytes().as_slice(),
                &record.name,
                record.secret_hash.as_bytes().as_slice(),
                record.created_at,
                record.expires_at,
            ],
        );

        match inserted {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => {
                Err(StoreError::Duplicate(format!("api key {}", record.id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn api_key_by_hash(&self, hash: &SecretHash) -> Result<Option<ApiKeyRecord>> {
        let conn = self.lock()?;

        conn.query_row(
            &format!("SELECT {KEY_COLUMNS} FROM api_keys WHERE secret_hash = ?1"),
            params![hash.as_bytes().as_slice()],
            read_key_row,
        )
        .optional()?
        .map(key_from_row)
        .transpose()
    }

    fn api_key(&self, id: &ApiKeyId) -> Result<Option<ApiKeyRecord>> {
        let conn = self.lock()?;

        conn.query_row(
            &format!("SELECT {KEY_COLUMNS} FROM api_keys WHERE key_id = ?1"),
            params![id.as_bytes().as_slice()],
            read_key_row,
        )
        .optional()?
        .map(key_from_row)
        .transpose()
    }

    fn api_keys_for(&self, root: &RootId) -> Result<Vec<ApiKeyRecord>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {KEY_COLUMNS} FROM api_keys WHERE root_id = ?1 ORDER BY created_at, key_id"
        ))?;

        let rows = stmt
            .query_map(params![root.as_bytes().as_slice()], read_key_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(key_from_row).collect()
    }

    fn delete_api_key(&self, id: &ApiKeyId, requester: &RootId) -> Result<DeleteOutcome> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let owner: Option<Vec<u8>> = tx
            .query_row(
                "SELECT root_id FROM api_keys WHERE key_id = ?1",
                params![id.as_bytes().as_slice()],
                |row| row.get(0),
            )
            .optional()?;

        let outcome = match owner {
            None => DeleteOutcome::NotFound,
            Some(owner) if owner.as_slice() != requester.as_bytes().as_slice() => {
                DeleteOutcome::NotOwner
            }
            Some(_) => {
                tx.execute(
                    "DELETE FROM api_keys WHERE key_id = ?1",
                    params![id.as_bytes().as_slice()],
                )?;
                DeleteOutcome::Deleted
            }
        };

        tx.commit()?;
        Ok(outcome)
    }
}
