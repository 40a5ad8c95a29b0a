//! Raw store rows as dict-like records with attached record metadata.

use std::ops::{Deref, DerefMut};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use custodia_core::{Error, Result};

/// Where a record came from: its id and the logical index (table) name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub id: String,
    pub index: String,
}

impl RecordMetadata {
    pub fn new(id: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            index: index.into(),
        }
    }
}

/// A raw store row: a JSON object plus out-of-band record metadata.
///
/// Derefs to the underlying map, so fields can be read, assigned, and
/// removed like on a plain object before mapping into a domain entity.
#[derive(Debug, Clone, Default)]
pub struct StorageRecord {
    fields: serde_json::Map<String, serde_json::Value>,
    metadata: Option<RecordMetadata>,
}

impl StorageRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_metadata(&mut self, metadata: RecordMetadata) {
        self.metadata = Some(metadata);
    }

    pub fn get_metadata(&self) -> Option<&RecordMetadata> {
        self.metadata.as_ref()
    }

    /// Map the raw fields into a domain entity.
    pub fn to_entity<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(serde_json::Value::Object(self.fields.clone()))
            .map_err(|e| Error::Mapping(e.to_string()))
    }

    /// Expose the raw fields as a JSON value.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::Value::Object(self.fields.clone())
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for StorageRecord {
    fn from(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            fields,
            metadata: None,
        }
    }
}

impl Deref for StorageRecord {
    type Target = serde_json::Map<String, serde_json::Value>;

    fn deref(&self) -> &Self::Target {
        &self.fields
    }
}

impl DerefMut for StorageRecord {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.fields
    }
}

impl Serialize for StorageRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_and_read_values() {
        let mut record = StorageRecord::new();
        record.insert("test".into(), serde_json::json!("sss"));
        assert_eq!(record["test"], serde_json::json!("sss"));

        record.remove("test");
        assert!(!record.contains_key("test"));
    }

    #[test]
    fn test_from_map() {
        let mut fields = serde_json::Map::new();
        fields.insert("test".into(), serde_json::json!("sss"));

        let mut record = StorageRecord::from(fields);
        assert_eq!(record["test"], serde_json::json!("sss"));
        record.remove("test");
        assert!(!record.contains_key("test"));
    }

    #[test]
    fn test_assign_metadata() {
        let mut record = StorageRecord::new();
        record.insert("test".into(), serde_json::json!("sss"));
        record.set_metadata(RecordMetadata::new("test", "index"));

        let meta = record.get_metadata().unwrap();
        assert_eq!(meta.id, "test");
        assert_eq!(meta.index, "index");
    }

    #[test]
    fn test_to_entity() {
        use crate::types::Profile;

        let mut record = StorageRecord::new();
        record.insert("id".into(), serde_json::json!("p1"));
        record.insert("consents".into(), serde_json::json!({"news": {}}));

        let profile: Profile = record.to_entity().unwrap();
        assert_eq!(profile.id, "p1");
        assert!(profile.has_consent("news"));

        record.insert("consents".into(), serde_json::json!("not-a-map"));
        assert!(record.to_entity::<Profile>().is_err());
    }
}
