use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

use sts_core::Result;
use sts_core::backend::CastingBackend;
use sts_core::clock::{Clock, system_clock};
use sts_core::config::CastingConfig;
use sts_core::state::KeyValueStorage;
use sts_infrastructure::PersistenceLayer;

use crate::casting::CastingController;
use crate::session::SessionStore;

/// Wires the store, controller and persistence around one storage medium.
pub struct CastingApp {
    config: CastingConfig,
    store: Arc<SessionStore>,
    controller: Arc<CastingController>,
    persistence: Arc<PersistenceLayer>,
    /// Store revision covered by the last successful save.
    saved_revision: AtomicU64,
}

impl CastingApp {
    /// Loads (and prunes) the persisted state, then primes a fresh store with it.
    pub async fn open(
        config: CastingConfig,
        storage: Arc<dyn KeyValueStorage>,
        backend: Arc<dyn CastingBackend>,
    ) -> Result<Self> {
        Self::open_with_clock(config, storage, backend, system_clock()).await
    }

    pub async fn open_with_clock(
        config: CastingConfig,
        storage: Arc<dyn KeyValueStorage>,
        backend: Arc<dyn CastingBackend>,
        clock: Clock,
    ) -> Result<Self> {
        let persistence = PersistenceLayer::new(storage, &config)?.with_clock(clock.clone());
        let persisted = persistence.load().await;

        let store = Arc::new(
            SessionStore::new()
                .with_clock(clock)
                .with_recent_projects_limit(config.recent_projects_limit),
        );
        store.prime(persisted);
        let controller = Arc::new(CastingController::new(store.clone(), backend));

        tracing::info!(
            "[CastingApp] Opened with {} session(s), active: {:?}",
            store.sessions().len(),
            store.active_session_id()
        );

        Ok(Self {
            saved_revision: AtomicU64::new(store.revision()),
            config,
            store,
            controller,
            persistence: Arc::new(persistence),
        })
    }

    pub fn config(&self) -> &CastingConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn controller(&self) -> &Arc<CastingController> {
        &self.controller
    }

    pub fn persistence(&self) -> &Arc<PersistenceLayer> {
        &self.persistence
    }

    /// Whether the store changed since the last successful save.
    pub fn is_dirty(&self) -> bool {
        self.store.revision() != self.saved_revision.load(Ordering::SeqCst)
    }

    /// Saves the current persistable projection.
    pub async fn persist(&self) -> Result<()> {
        // Read the revision first: a change racing the snapshot stays dirty.
        let revision = self.store.revision();
        let snapshot = self.store.snapshot();
        self.persistence.save_persisted(&snapshot).await?;
        self.saved_revision.store(revision, Ordering::SeqCst);
        tracing::debug!("[CastingApp] Persisted revision {}", revision);
        Ok(())
    }

    /// Spawns a task that persists whenever the store is dirty.
    ///
    /// Save failures are logged and retried on the next tick. Abort the
    /// returned handle to stop it.
    pub fn spawn_autosave(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let app = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            tracing::info!(target: "autosave", "Autosave started ({:?} interval)", interval);

            loop {
                ticker.tick().await;
                if !app.is_dirty() {
                    continue;
                }
                if let Err(e) = app.persist().await {
                    tracing::error!(target: "autosave", "Autosave failed: {}", e);
                }
            }
        })
    }

    /// [`Self::spawn_autosave`] at the configured interval.
    pub fn spawn_configured_autosave(self: &Arc<Self>) -> JoinHandle<()> {
        self.spawn_autosave(Duration::from_secs(self.config.autosave_interval_secs.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicBool;
    use sts_core::CastingError;
    use sts_core::session::{SessionPatch, VoiceFields};
    use sts_infrastructure::{InMemoryCastingBackend, InMemoryKeyValueStorage};

    const NOW: i64 = 1_700_000_000_000;

    fn clock() -> Clock {
        Arc::new(|| NOW)
    }

    async fn open(storage: Arc<dyn KeyValueStorage>) -> CastingApp {
        CastingApp::open_with_clock(
            CastingConfig::default(),
            storage,
            Arc::new(InMemoryCastingBackend::new()),
            clock(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_open_empty_storage() {
        let app = open(Arc::new(InMemoryKeyValueStorage::new())).await;

        assert!(app.store().sessions().is_empty());
        assert!(app.store().get_active_session().is_none());
        assert!(!app.is_dirty());
    }

    #[tokio::test]
    async fn test_persist_and_reopen() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(InMemoryKeyValueStorage::new());
        let app = open(storage.clone()).await;
        app.store()
            .select_or_create_session("s-1", Some(SessionPatch::new().screenplay_name("Heist")));
        app.controller()
            .set_character_voice("JOHN", VoiceFields::library("openai", "alloy"))
            .await
            .unwrap();
        app.store().set_last_error(Some("transient".into()));
        assert!(app.is_dirty());

        app.persist().await.unwrap();
        assert!(!app.is_dirty());

        let reopened = open(storage).await;
        let session = reopened.store().get_active_session().unwrap();
        assert_eq!(session.session_id, "s-1");
        assert_eq!(session.version_id, 2);
        assert!(session.assignments["JOHN"].has_voice());
        assert!(reopened.store().ui().last_error.is_none());
    }

    #[tokio::test]
    async fn test_autosave_writes_dirty_state() {
        let storage = Arc::new(InMemoryKeyValueStorage::new());
        let app = Arc::new(open(storage.clone()).await);
        let handle = app.spawn_autosave(Duration::from_millis(10));

        app.store().select_or_create_session("s-1", None);
        tokio::time::sleep(Duration::from_millis(60)).await;
        handle.abort();

        assert!(!app.is_dirty());
        let stored = storage
            .get(CastingConfig::DEFAULT_STORAGE_KEY)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.contains("s-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_autosave_waits_for_interval() {
        let storage = Arc::new(InMemoryKeyValueStorage::new());
        let config = CastingConfig {
            autosave_interval_secs: 30,
            ..CastingConfig::default()
        };
        let app = Arc::new(
            CastingApp::open_with_clock(
                config,
                storage,
                Arc::new(InMemoryCastingBackend::new()),
                clock(),
            )
            .await
            .unwrap(),
        );
        let handle = app.spawn_configured_autosave();
        tokio::time::sleep(Duration::from_secs(1)).await;

        app.store().select_or_create_session("s-1", None);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(app.is_dirty());

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert!(!app.is_dirty());
        handle.abort();
    }

    struct FlakyStorage {
        fail: AtomicBool,
        inner: InMemoryKeyValueStorage,
    }

    #[async_trait]
    impl KeyValueStorage for FlakyStorage {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(CastingError::io("disk full"));
            }
            self.inner.set(key, value).await
        }
    }

    #[tokio::test]
    async fn test_failed_save_stays_dirty() {
        let storage = Arc::new(FlakyStorage {
            fail: AtomicBool::new(true),
            inner: InMemoryKeyValueStorage::new(),
        });
        let app = open(storage.clone()).await;
        app.store().select_or_create_session("s-1", None);

        assert!(app.persist().await.is_err());
        assert!(app.is_dirty());

        storage.fail.store(false, Ordering::SeqCst);
        app.persist().await.unwrap();
        assert!(!app.is_dirty());
    }
}
