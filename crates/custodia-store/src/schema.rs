//! Database schema SQL.

/// Core tables: profiles, sessions, event sources, consent types, flows.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    consents_json TEXT NOT NULL DEFAULT '{}',
    aux_json TEXT NOT NULL DEFAULT '{}',
    created_at INTEGER NOT NULL,
    updated_at INTEGER
);

CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    profile_id TEXT,
    metadata_json TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_profile ON sessions(profile_id);

CREATE TABLE IF NOT EXISTS event_sources (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    enabled INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS consent_types (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    auto_revoke TEXT
);

CREATE TABLE IF NOT EXISTS flows (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    enabled INTEGER NOT NULL DEFAULT 1,
    projects_json TEXT NOT NULL DEFAULT '[]',
    lock INTEGER NOT NULL DEFAULT 0,
    draft_json TEXT,
    production_json TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER
);
"#;
