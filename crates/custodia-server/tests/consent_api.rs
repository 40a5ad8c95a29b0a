//! API contract tests — validates response shapes the HTTP clients rely
//! on, and exercises the consent/flow sequences end to end against a
//! throwaway store (direct calls, no HTTP server needed).

use std::collections::HashMap;

use custodia_consent::{ConsentMode, ConsentReconciler};
use custodia_store::{
    ConsentRevoke, ConsentType, EventSource, Flow, Profile, Session, SqliteStore, WriteResult,
};
use tempfile::TempDir;
use uuid::Uuid;

fn seeded_store() -> (SqliteStore, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(dir.path()).unwrap();
    store.save_profile(&Profile::new("p1")).unwrap();
    store
        .save_session(&Session::new("s1", Some("p1".into())))
        .unwrap();
    store
        .save_event_source(&EventSource::new("src1", "Web tracker", "rest"))
        .unwrap();
    (store, dir)
}

/// The 403 body for unresolvable session/profile/source:
/// `{"detail": "Access denied"}`.
#[test]
fn test_access_denied_response_shape() {
    let body = serde_json::json!({ "detail": "Access denied" });
    assert_eq!(body["detail"], "Access denied");
    assert!(body.get("error").is_none());
}

/// Write acknowledgments serialize as `{saved, errors, ids}` — the shape
/// flow clients assert on.
#[test]
fn test_write_ack_shape() {
    let id = Uuid::new_v4().to_string();
    let ack = serde_json::to_value(WriteResult::one(&id)).unwrap();
    assert_eq!(
        ack,
        serde_json::json!({ "saved": 1, "errors": [], "ids": [id] })
    );
}

/// The consent endpoint's 200 body is the persisted profile: id, consents
/// map (granted entries only, optional revoke timestamps), aux hints.
#[test]
fn test_profile_response_shape() {
    let (store, _dir) = seeded_store();

    let profile = ConsentReconciler::new(&store)
        .reconcile(
            "p1",
            "s1",
            "src1",
            ConsentMode::Listed,
            &HashMap::from([("news".to_string(), true)]),
        )
        .unwrap();

    let body = serde_json::to_value(&profile).unwrap();
    assert_eq!(body["id"], "p1");
    assert!(body["consents"].is_object());
    // Granted with no expiry serializes as an empty object
    assert_eq!(body["consents"]["news"], serde_json::json!({}));
    assert_eq!(body["aux"]["consents"]["displayed"], true);
}

/// Listed then catalog-wide application, verified via subsequent reads.
#[test]
fn test_consent_endpoint_sequence() {
    let (store, _dir) = seeded_store();
    let reconciler = ConsentReconciler::new(&store);

    // all=false: grant news, revoke sms (which was granted before)
    let mut profile = store.load_profile("p1").unwrap().unwrap();
    profile.grant("sms", ConsentRevoke::indefinite());
    store.save_profile(&profile).unwrap();

    reconciler
        .reconcile(
            "p1",
            "s1",
            "src1",
            ConsentMode::Listed,
            &HashMap::from([("news".to_string(), true), ("sms".to_string(), false)]),
        )
        .unwrap();

    let loaded = store.load_profile("p1").unwrap().unwrap();
    assert!(loaded.has_consent("news"));
    assert!(!loaded.has_consent("sms"));

    // all=true: every catalog entry lands on the profile
    store
        .save_consent_type(&ConsentType {
            id: "marketing".into(),
            name: "Marketing".into(),
            description: None,
            auto_revoke: Some("30 days".into()),
        })
        .unwrap();

    reconciler
        .reconcile("p1", "s1", "src1", ConsentMode::CatalogWide, &HashMap::new())
        .unwrap();

    let loaded = store.load_profile("p1").unwrap().unwrap();
    assert!(loaded.consents["marketing"].revoke.is_some());
    // Grants outside the catalog survive a catalog-wide apply
    assert!(loaded.has_consent("news"));
}

/// A failed authorization leaves the profile untouched.
#[test]
fn test_denied_request_mutates_nothing() {
    let (store, _dir) = seeded_store();

    let result = ConsentReconciler::new(&store).reconcile(
        "p1",
        &Uuid::new_v4().to_string(),
        "src1",
        ConsentMode::Listed,
        &HashMap::from([("news".to_string(), true)]),
    );
    assert!(result.is_err());

    let loaded = store.load_profile("p1").unwrap().unwrap();
    assert!(loaded.consents.is_empty());
}

fn flow_metadata(id: &str, name: &str, desc: &str) -> Flow {
    Flow {
        id: id.into(),
        name: name.into(),
        description: Some(desc.into()),
        enabled: true,
        projects: vec!["General".into(), "Test".into()],
        lock: false,
        draft: None,
        production: None,
    }
}

/// Create → read → toggle lock → update metadata → delete, as the flow
/// editor drives it.
#[test]
fn test_flow_endpoint_sequence() {
    let (store, _dir) = seeded_store();
    let id = Uuid::new_v4().to_string();

    // Missing flow reads and deletes are misses
    assert!(store.load_flow(&id).unwrap().is_none());
    assert!(!store.delete_flow(&id).unwrap());

    let ack = store
        .upsert_flow_metadata(&flow_metadata(&id, "Test flow", "Opis"))
        .unwrap();
    assert_eq!(ack.saved, 1);
    assert_eq!(ack.ids, vec![id.clone()]);

    let flow = store.load_flow(&id).unwrap().unwrap();
    assert_eq!(flow.name, "Test flow");

    // Lock on, then off
    store.set_flow_lock(&id, true).unwrap();
    assert!(store.load_flow(&id).unwrap().unwrap().lock);
    store.set_flow_lock(&id, false).unwrap();
    assert!(!store.load_flow(&id).unwrap().unwrap().lock);

    // Metadata update
    let mut update = flow_metadata(&id, "New name", "New Description");
    update.enabled = false;
    update.projects = vec!["New".into()];
    store.upsert_flow_metadata(&update).unwrap();

    let flow = store.load_flow(&id).unwrap().unwrap();
    assert_eq!(flow.name, "New name");
    assert!(flow.projects.contains(&"New".to_string()));

    // Delete, then the read misses
    assert!(store.delete_flow(&id).unwrap());
    assert!(store.load_flow(&id).unwrap().is_none());
}

/// Flow list responses carry `{total, result}`.
#[test]
fn test_flow_list_shape() {
    let (store, _dir) = seeded_store();
    store
        .upsert_flow_metadata(&flow_metadata("f1", "Test flow", "Opis"))
        .unwrap();

    let (flows, total) = store.list_flows().unwrap();
    let body = serde_json::json!({ "total": total, "result": flows });
    assert_eq!(body["total"], 1);
    assert!(body["result"].is_array());
    assert_eq!(body["result"][0]["id"], "f1");
    assert_eq!(body["result"][0]["lock"], false);
}

/// Saving a draft keeps the graph payload readable.
#[test]
fn test_flow_draft_roundtrip() {
    let (store, _dir) = seeded_store();
    let id = Uuid::new_v4().to_string();

    let mut flow = flow_metadata(&id, "Test wf as a code", "");
    flow.draft = Some(serde_json::json!({
        "nodes": [{"id": "start"}, {"id": "end"}],
        "edges": [{"from": "start", "to": "end"}],
    }));
    let ack = store.save_flow(&flow).unwrap();
    assert_eq!(ack.saved, 1);
    assert!(ack.ids.contains(&id));

    let loaded = store.load_flow(&id).unwrap().unwrap();
    let draft = loaded.draft.unwrap();
    assert_eq!(draft["nodes"][0]["id"], "start");
}
