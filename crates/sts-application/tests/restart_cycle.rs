//! Save, restart, prune and prime against a real on-disk store.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use sts_application::CastingApp;
use sts_core::clock::Clock;
use sts_core::config::CastingConfig;
use sts_core::session::{MetadataFields, SessionPatch, VoiceFields};
use sts_infrastructure::{FileKeyValueStorage, InMemoryCastingBackend};
use tempfile::TempDir;

const HOUR_MS: i64 = 3_600_000;
const START: i64 = 1_700_000_000_000;

struct TestClock(Arc<AtomicI64>);

impl TestClock {
    fn new() -> Self {
        Self(Arc::new(AtomicI64::new(START)))
    }

    fn clock(&self) -> Clock {
        let now = self.0.clone();
        Arc::new(move || now.load(Ordering::SeqCst))
    }

    fn advance(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

async fn open(
    dir: &TempDir,
    clock: &TestClock,
    backend: Arc<InMemoryCastingBackend>,
) -> CastingApp {
    CastingApp::open_with_clock(
        CastingConfig::default(),
        Arc::new(FileKeyValueStorage::new(dir.path())),
        backend,
        clock.clock(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_assignments_survive_restart() {
    let dir = TempDir::new().unwrap();
    let clock = TestClock::new();
    let backend = Arc::new(InMemoryCastingBackend::new());

    let app = open(&dir, &clock, backend.clone()).await;
    app.store().select_or_create_session(
        "heist",
        Some(
            SessionPatch::new()
                .screenplay_name("Heist")
                .screenplay_json_path("/scripts/heist.json"),
        ),
    );
    app.controller()
        .set_character_voice("JOHN", VoiceFields::library("openai", "alloy"))
        .await
        .unwrap();
    app.controller()
        .set_character_metadata("JOHN", MetadataFields::role("lead"))
        .await
        .unwrap();
    app.store().add_recent_project("/scripts/heist.json");
    app.store().toggle_starred_voice("openai", "alloy");
    app.persist().await.unwrap();
    drop(app);

    clock.advance(HOUR_MS);
    let app = open(&dir, &clock, backend.clone()).await;

    let session = app.store().get_active_session().unwrap();
    assert_eq!(session.session_id, "heist");
    assert_eq!(session.screenplay_json_path, "/scripts/heist.json");
    assert_eq!(session.version_id, 3);
    let john = &session.assignments["JOHN"];
    assert_eq!(john.sts_id.as_deref(), Some("alloy"));
    assert_eq!(john.role.as_deref(), Some("lead"));
    assert!(session.yaml_content.contains("Role: lead"));

    let prefs = app.store().preferences();
    assert_eq!(prefs.recent_projects, vec!["/scripts/heist.json".to_string()]);
    assert!(prefs.is_starred("openai", "alloy"));

    // The restored version token is still accepted by the server.
    app.controller()
        .set_character_voice("JANE", VoiceFields::library("openai", "nova"))
        .await
        .unwrap();
    assert_eq!(app.store().get_active_session().unwrap().version_id, 4);
}

#[tokio::test]
async fn test_restart_prunes_stale_and_excess_sessions() {
    let dir = TempDir::new().unwrap();
    let clock = TestClock::new();
    let backend = Arc::new(InMemoryCastingBackend::new());

    let app = open(&dir, &clock, backend.clone()).await;
    app.store().select_or_create_session("stale", None);
    clock.advance(2 * HOUR_MS);
    for i in 0..12 {
        clock.advance(60_000);
        app.store().select_or_create_session(&format!("s-{:02}", i), None);
    }
    app.persist().await.unwrap();
    drop(app);

    // "stale" is now 12.5h old, the others are all inside the window.
    clock.advance(10 * HOUR_MS + HOUR_MS / 2);
    let app = open(&dir, &clock, backend).await;

    let ids: Vec<String> = app
        .store()
        .get_recent_sessions(usize::MAX)
        .into_iter()
        .map(|s| s.session_id)
        .collect();
    let expected: Vec<String> = (2..12).rev().map(|i| format!("s-{:02}", i)).collect();
    assert_eq!(ids, expected);
    assert_eq!(app.store().active_session_id().as_deref(), Some("s-11"));
}

#[tokio::test]
async fn test_active_pointer_cleared_when_its_session_expires() {
    let dir = TempDir::new().unwrap();
    let clock = TestClock::new();
    let backend = Arc::new(InMemoryCastingBackend::new());

    let app = open(&dir, &clock, backend.clone()).await;
    app.store().select_or_create_session("keep", None);
    app.store().select_or_create_session("expire", None);
    clock.advance(HOUR_MS);
    app.store().update_session("keep", |_| ()).unwrap();
    assert_eq!(app.store().active_session_id().as_deref(), Some("expire"));
    app.persist().await.unwrap();
    drop(app);

    clock.advance(12 * HOUR_MS - HOUR_MS / 2);
    let app = open(&dir, &clock, backend).await;

    assert!(app.store().session("expire").is_none());
    assert!(app.store().session("keep").is_some());
    assert!(app.store().active_session_id().is_none());
    assert!(app.store().get_active_session().is_none());
}

#[tokio::test]
async fn test_corrupt_file_starts_fresh() {
    let dir = TempDir::new().unwrap();
    let storage = FileKeyValueStorage::new(dir.path());
    std::fs::write(
        storage.path_for(CastingConfig::DEFAULT_STORAGE_KEY),
        "{\"version\":\"1.1.0\",\"sessions\":",
    )
    .unwrap();

    let app = open(&dir, &TestClock::new(), Arc::new(InMemoryCastingBackend::new())).await;

    assert!(app.store().sessions().is_empty());
    assert!(app.store().active_session_id().is_none());

    app.store().select_or_create_session("fresh", None);
    app.persist().await.unwrap();
    let app = open(&dir, &TestClock::new(), Arc::new(InMemoryCastingBackend::new())).await;
    assert_eq!(app.store().active_session_id().as_deref(), Some("fresh"));
}
