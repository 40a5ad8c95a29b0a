//! Data types for profiles, sessions, sources, consent types, and flows.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A granted consent's validity window.
///
/// `revoke = None` means the consent persists indefinitely; a timestamp
/// means the consent is treated as withdrawn after that instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsentRevoke {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoke: Option<DateTime<Utc>>,
}

impl ConsentRevoke {
    /// Consent with no expiry.
    pub fn indefinite() -> Self {
        Self { revoke: None }
    }

    /// Consent valid until the given instant.
    pub fn until(revoke: DateTime<Utc>) -> Self {
        Self {
            revoke: Some(revoke),
        }
    }
}

/// A customer profile row.
///
/// `consents` only ever contains *granted* consents: revoking removes the
/// key. `grant` and `withdraw` are the mutation paths that keep it so.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub consents: HashMap<String, ConsentRevoke>,
    #[serde(default)]
    pub aux: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Profile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            consents: HashMap::new(),
            aux: serde_json::Map::new(),
            created_at: now_millis(),
            updated_at: None,
        }
    }

    /// Record a granted consent, replacing any previous revoke window.
    pub fn grant(&mut self, consent_id: impl Into<String>, revoke: ConsentRevoke) {
        self.consents.insert(consent_id.into(), revoke);
    }

    /// Remove a granted consent. Absent ids are a no-op.
    pub fn withdraw(&mut self, consent_id: &str) {
        self.consents.remove(consent_id);
    }

    pub fn has_consent(&self, consent_id: &str) -> bool {
        self.consents.contains_key(consent_id)
    }
}

/// A tracking session row. The reconciler only checks that it exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: i64,
}

impl Session {
    pub fn new(id: impl Into<String>, profile_id: Option<String>) -> Self {
        Self {
            id: id.into(),
            profile_id,
            metadata: None,
            created_at: now_millis(),
        }
    }
}

/// An event source row — where tracked events come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub created_at: i64,
}

impl EventSource {
    pub fn new(id: impl Into<String>, name: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source_type: source_type.into(),
            enabled: true,
            created_at: now_millis(),
        }
    }
}

/// A consent-type catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentType {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Human-readable duration after which a granted consent expires,
    /// e.g. "30 days". Absent or unparseable means no expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_revoke: Option<String>,
}

/// A workflow definition row. Draft and production graphs are opaque
/// payloads owned by the flow editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub lock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production: Option<serde_json::Value>,
}

/// Store write acknowledgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteResult {
    pub saved: u32,
    pub errors: Vec<String>,
    pub ids: Vec<String>,
}

impl WriteResult {
    /// Acknowledgment for a single saved record.
    pub fn one(id: impl Into<String>) -> Self {
        Self {
            saved: 1,
            errors: Vec::new(),
            ids: vec![id.into()],
        }
    }
}

fn default_true() -> bool {
    true
}

pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consent_map_only_holds_grants() {
        let mut profile = Profile::new("p1");
        profile.grant("newsletter", ConsentRevoke::indefinite());
        assert!(profile.has_consent("newsletter"));

        profile.withdraw("newsletter");
        assert!(!profile.has_consent("newsletter"));
        assert!(profile.consents.is_empty());

        // Withdrawing something never granted is a no-op.
        profile.withdraw("sms");
        assert!(profile.consents.is_empty());
    }

    #[test]
    fn test_grant_overwrites_revoke_window() {
        let mut profile = Profile::new("p1");
        profile.grant("ads", ConsentRevoke::until(Utc::now()));
        profile.grant("ads", ConsentRevoke::indefinite());
        assert_eq!(profile.consents["ads"], ConsentRevoke::indefinite());
    }

    #[test]
    fn test_consent_revoke_serde_shape() {
        let json = serde_json::to_value(ConsentRevoke::indefinite()).unwrap();
        assert_eq!(json, serde_json::json!({}));

        let parsed: ConsentRevoke = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(parsed, ConsentRevoke::indefinite());
    }
}
