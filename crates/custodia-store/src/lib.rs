//! Custodia Store — SQLite-backed document store for customer data.
//!
//! Profiles, sessions, event sources, the consent-type catalog, and flows
//! live in one database file behind a narrow load/save API. Records are
//! rewritten wholesale; last write wins.

pub mod cache;
pub mod record;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use cache::{cache_key, EntityCache};
pub use record::{RecordMetadata, StorageRecord};
pub use sqlite::{SqliteStore, PROFILE_INDEX};
pub use types::{
    ConsentRevoke, ConsentType, EventSource, Flow, Profile, Session, WriteResult,
};
