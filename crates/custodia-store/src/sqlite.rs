//! SQLite-backed document store.
//!
//! One database file, one connection behind a mutex. Entities are stored
//! as rows with JSON columns for nested data and rewritten wholesale on
//! save — the later write wins in full.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::record::{RecordMetadata, StorageRecord};
use crate::schema::SCHEMA_SQL;
use crate::types::*;
use custodia_core::{Error, Result};

/// Index (table) name profiles are loaded from, carried on record metadata.
pub const PROFILE_INDEX: &str = "profile";

pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create the store.
    ///
    /// `db_dir` is the directory (e.g., `data/store/`). The file will be
    /// `db_dir/custodia.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("custodia.db");

        let conn = Self::create_connection(&db_path)?;
        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        let profiles = store.count_profiles()?;
        let flows = store.count_flows()?;
        info!(
            "SqliteStore initialized: {} profiles, {} flows, path={}",
            profiles,
            flows,
            store.db_path.display()
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // ---------------------------------------------------------------
    // Profiles
    // ---------------------------------------------------------------

    /// Load a profile as a raw record with attached metadata.
    pub fn load_profile_record(&self, id: &str) -> Result<Option<StorageRecord>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached(
                "SELECT id, consents_json, aux_json, created_at, updated_at
                 FROM profiles WHERE id = ?1",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Option<i64>>(4)?,
                ))
            })
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        let Some((id, consents_json, aux_json, created_at, updated_at)) = row else {
            return Ok(None);
        };

        let consents: serde_json::Value = serde_json::from_str(&consents_json)
            .map_err(|e| Error::Mapping(format!("profile {} consents: {}", id, e)))?;
        let aux: serde_json::Value = serde_json::from_str(&aux_json)
            .map_err(|e| Error::Mapping(format!("profile {} aux: {}", id, e)))?;

        let mut record = StorageRecord::new();
        record.insert("id".into(), serde_json::json!(id));
        record.insert("consents".into(), consents);
        record.insert("aux".into(), aux);
        record.insert("created_at".into(), serde_json::json!(created_at));
        if let Some(updated_at) = updated_at {
            record.insert("updated_at".into(), serde_json::json!(updated_at));
        }
        record.set_metadata(RecordMetadata::new(id, PROFILE_INDEX));
        Ok(Some(record))
    }

    /// Load a profile mapped into its domain entity.
    pub fn load_profile(&self, id: &str) -> Result<Option<Profile>> {
        match self.load_profile_record(id)? {
            Some(record) => Ok(Some(record.to_entity()?)),
            None => Ok(None),
        }
    }

    /// Persist a profile wholesale, overwriting any stored state.
    pub fn save_profile(&self, profile: &Profile) -> Result<WriteResult> {
        let now = now_millis();
        let created_at = if profile.created_at > 0 {
            profile.created_at
        } else {
            now
        };
        let consents = serde_json::to_string(&profile.consents)?;
        let aux = serde_json::to_string(&profile.aux)?;

        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO profiles (id, consents_json, aux_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 consents_json = excluded.consents_json,
                 aux_json = excluded.aux_json,
                 updated_at = ?6",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![
            profile.id,
            consents,
            aux,
            created_at,
            profile.updated_at,
            now
        ])
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(WriteResult::one(&profile.id))
    }

    pub fn count_profiles(&self) -> Result<i64> {
        self.count_rows("SELECT COUNT(*) FROM profiles")
    }

    // ---------------------------------------------------------------
    // Sessions
    // ---------------------------------------------------------------

    pub fn load_session(&self, id: &str) -> Result<Option<Session>> {
        let conn = self.conn.lock();
        let result = conn
            .prepare_cached(
                "SELECT id, profile_id, metadata_json, created_at FROM sessions WHERE id = ?1",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], |row| {
                Ok(Session {
                    id: row.get(0)?,
                    profile_id: row.get(1)?,
                    metadata: row
                        .get::<_, Option<String>>(2)?
                        .and_then(|s| serde_json::from_str(&s).ok()),
                    created_at: row.get(3)?,
                })
            })
            .optional()
            .map_err(|e| Error::Database(e.to_string()));
        result
    }

    pub fn save_session(&self, session: &Session) -> Result<WriteResult> {
        let metadata = session
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO sessions (id, profile_id, metadata_json, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                 profile_id = excluded.profile_id,
                 metadata_json = excluded.metadata_json",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![
            session.id,
            session.profile_id,
            metadata,
            session.created_at
        ])
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(WriteResult::one(&session.id))
    }

    // ---------------------------------------------------------------
    // Event sources
    // ---------------------------------------------------------------

    pub fn load_event_source(&self, id: &str) -> Result<Option<EventSource>> {
        let conn = self.conn.lock();
        let result = conn
            .prepare_cached(
                "SELECT id, name, type, enabled, created_at FROM event_sources WHERE id = ?1",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], |row| {
                Ok(EventSource {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    source_type: row.get(2)?,
                    enabled: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })
            .optional()
            .map_err(|e| Error::Database(e.to_string()));
        result
    }

    pub fn save_event_source(&self, source: &EventSource) -> Result<WriteResult> {
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO event_sources (id, name, type, enabled, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 type = excluded.type,
                 enabled = excluded.enabled",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![
            source.id,
            source.name,
            source.source_type,
            source.enabled,
            source.created_at
        ])
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(WriteResult::one(&source.id))
    }

    // ---------------------------------------------------------------
    // Consent-type catalog
    // ---------------------------------------------------------------

    pub fn load_consent_type(&self, id: &str) -> Result<Option<ConsentType>> {
        let conn = self.conn.lock();
        let result = conn
            .prepare_cached(
                "SELECT id, name, description, auto_revoke FROM consent_types WHERE id = ?1",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], Self::row_to_consent_type)
            .optional()
            .map_err(|e| Error::Database(e.to_string()));
        result
    }

    pub fn load_all_consent_types(&self) -> Result<Vec<ConsentType>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, name, description, auto_revoke FROM consent_types ORDER BY id",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], Self::row_to_consent_type)
            .map_err(|e| Error::Database(e.to_string()))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows)
    }

    pub fn save_consent_type(&self, consent_type: &ConsentType) -> Result<WriteResult> {
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO consent_types (id, name, description, auto_revoke)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 description = excluded.description,
                 auto_revoke = excluded.auto_revoke",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![
            consent_type.id,
            consent_type.name,
            consent_type.description,
            consent_type.auto_revoke
        ])
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(WriteResult::one(&consent_type.id))
    }

    pub fn delete_consent_type(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let deleted = conn
            .prepare_cached("DELETE FROM consent_types WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .execute(params![id])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(deleted > 0)
    }

    pub fn count_consent_types(&self) -> Result<i64> {
        self.count_rows("SELECT COUNT(*) FROM consent_types")
    }

    fn row_to_consent_type(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConsentType> {
        Ok(ConsentType {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            auto_revoke: row.get(3)?,
        })
    }

    // ---------------------------------------------------------------
    // Flows
    // ---------------------------------------------------------------

    pub fn load_flow(&self, id: &str) -> Result<Option<Flow>> {
        let conn = self.conn.lock();
        let result = conn
            .prepare_cached(
                "SELECT id, name, description, enabled, projects_json, lock, draft_json, production_json
                 FROM flows WHERE id = ?1",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], Self::row_to_flow)
            .optional()
            .map_err(|e| Error::Database(e.to_string()));
        result
    }

    /// List all flows, newest first, with the total count.
    pub fn list_flows(&self) -> Result<(Vec<Flow>, i64)> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, name, description, enabled, projects_json, lock, draft_json, production_json
                 FROM flows ORDER BY created_at DESC",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let flows = stmt
            .query_map([], Self::row_to_flow)
            .map_err(|e| Error::Database(e.to_string()))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::Database(e.to_string()))?;
        let total = flows.len() as i64;
        Ok((flows, total))
    }

    /// Create a flow or update its metadata. On update the graph payloads
    /// and the lock flag are preserved.
    pub fn upsert_flow_metadata(&self, flow: &Flow) -> Result<WriteResult> {
        let now = now_millis();
        let projects = serde_json::to_string(&flow.projects)?;

        let conn = self.conn.lock();
        let updated = conn
            .prepare_cached(
                "UPDATE flows SET name = ?2, description = ?3, enabled = ?4,
                     projects_json = ?5, updated_at = ?6
                 WHERE id = ?1",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .execute(params![
                flow.id,
                flow.name,
                flow.description,
                flow.enabled,
                projects,
                now
            ])
            .map_err(|e| Error::Database(e.to_string()))?;

        if updated == 0 {
            let draft = flow.draft.as_ref().map(serde_json::to_string).transpose()?;
            let production = flow
                .production
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            conn.prepare_cached(
                "INSERT INTO flows (id, name, description, enabled, projects_json, lock,
                     draft_json, production_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .execute(params![
                flow.id,
                flow.name,
                flow.description,
                flow.enabled,
                projects,
                flow.lock,
                draft,
                production,
                now
            ])
            .map_err(|e| Error::Database(e.to_string()))?;
        }

        Ok(WriteResult::one(&flow.id))
    }

    /// Persist a full flow, graph payloads included.
    pub fn save_flow(&self, flow: &Flow) -> Result<WriteResult> {
        let now = now_millis();
        let projects = serde_json::to_string(&flow.projects)?;
        let draft = flow.draft.as_ref().map(serde_json::to_string).transpose()?;
        let production = flow
            .production
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO flows (id, name, description, enabled, projects_json, lock,
                 draft_json, production_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 description = excluded.description,
                 enabled = excluded.enabled,
                 projects_json = excluded.projects_json,
                 lock = excluded.lock,
                 draft_json = excluded.draft_json,
                 production_json = excluded.production_json,
                 updated_at = ?9",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![
            flow.id,
            flow.name,
            flow.description,
            flow.enabled,
            projects,
            flow.lock,
            draft,
            production,
            now
        ])
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(WriteResult::one(&flow.id))
    }

    pub fn set_flow_lock(&self, id: &str, lock: bool) -> Result<WriteResult> {
        let conn = self.conn.lock();
        let updated = conn
            .prepare_cached("UPDATE flows SET lock = ?2, updated_at = ?3 WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .execute(params![id, lock, now_millis()])
            .map_err(|e| Error::Database(e.to_string()))?;
        if updated == 0 {
            return Err(Error::NotFound(format!("flow {}", id)));
        }
        Ok(WriteResult::one(id))
    }

    pub fn delete_flow(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let deleted = conn
            .prepare_cached("DELETE FROM flows WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .execute(params![id])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(deleted > 0)
    }

    pub fn count_flows(&self) -> Result<i64> {
        self.count_rows("SELECT COUNT(*) FROM flows")
    }

    fn row_to_flow(row: &rusqlite::Row<'_>) -> rusqlite::Result<Flow> {
        Ok(Flow {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            enabled: row.get(3)?,
            projects: row
                .get::<_, String>(4)
                .map(|s| serde_json::from_str(&s).unwrap_or_default())?,
            lock: row.get(5)?,
            draft: row
                .get::<_, Option<String>>(6)?
                .and_then(|s| serde_json::from_str(&s).ok()),
            production: row
                .get::<_, Option<String>>(7)?
                .and_then(|s| serde_json::from_str(&s).ok()),
        })
    }

    // ---------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------

    fn count_rows(&self, sql: &str) -> Result<i64> {
        let conn = self.conn.lock();
        let result = conn
            .prepare_cached(sql)
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row([], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()));
        result
    }
}
