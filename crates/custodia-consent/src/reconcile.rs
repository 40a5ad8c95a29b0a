//! Reconciles a profile's consent map against a requested change-set.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use tracing::debug;

use custodia_core::{parse_duration, Error, Result};
use custodia_store::{ConsentRevoke, Profile, SqliteStore};

/// How a consent change-set is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentMode {
    /// Grant every consent type in the catalog, stamping each with its
    /// auto-revoke window.
    CatalogWide,
    /// Apply only the explicitly listed consent flags.
    Listed,
}

impl ConsentMode {
    /// Mode selected by the endpoint's `all` query flag.
    pub fn from_apply_all(all: bool) -> Self {
        if all {
            Self::CatalogWide
        } else {
            Self::Listed
        }
    }
}

pub struct ConsentReconciler<'a> {
    store: &'a SqliteStore,
}

impl<'a> ConsentReconciler<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    /// Compute and persist the profile's updated consent map.
    ///
    /// Session, profile, and source must all resolve; a miss on any of
    /// them fails with `AccessDenied` before anything is mutated. In
    /// catalog-wide mode `requested` is ignored entirely. A consent
    /// type's unparseable `auto_revoke` is absorbed into "no expiry",
    /// never surfaced.
    pub fn reconcile(
        &self,
        profile_id: &str,
        session_id: &str,
        source_id: &str,
        mode: ConsentMode,
        requested: &HashMap<String, bool>,
    ) -> Result<Profile> {
        let session = self.store.load_session(session_id)?;
        let record = self.store.load_profile_record(profile_id)?;
        let source = self.store.load_event_source(source_id)?;

        let (Some(_), Some(record), Some(_)) = (session, record, source) else {
            return Err(Error::AccessDenied);
        };

        let mut profile: Profile = record.to_entity()?;

        match mode {
            ConsentMode::CatalogWide => {
                for consent_type in self.store.load_all_consent_types()? {
                    let revoke = consent_type
                        .auto_revoke
                        .as_deref()
                        .and_then(parse_duration)
                        .map(|seconds| {
                            ConsentRevoke::until(Utc::now() + Duration::seconds(seconds))
                        })
                        .unwrap_or_else(ConsentRevoke::indefinite);
                    profile.grant(consent_type.id, revoke);
                }
            }
            ConsentMode::Listed => {
                for (consent_id, granted) in requested {
                    if *granted {
                        profile.grant(consent_id.clone(), ConsentRevoke::indefinite());
                    } else {
                        profile.withdraw(consent_id);
                    }
                }
            }
        }

        profile.aux.insert(
            "consents".into(),
            serde_json::json!({"displayed": true}),
        );

        self.store.save_profile(&profile)?;
        debug!(
            "Reconciled consents for profile {}: {} granted",
            profile.id,
            profile.consents.len()
        );
        Ok(profile)
    }
}
