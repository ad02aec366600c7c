use std::sync::Arc;

use sts_core::backend::VoiceMetadataService;
use sts_core::session::{VoiceRecord, voice_cache_key};
use sts_core::{CastingError, Result};

use crate::session::SessionStore;

/// Read-through cache of provider voice metadata, scoped to the active session.
pub struct VoiceCatalog {
    store: Arc<SessionStore>,
    service: Arc<dyn VoiceMetadataService>,
}

impl VoiceCatalog {
    pub fn new(store: Arc<SessionStore>, service: Arc<dyn VoiceMetadataService>) -> Self {
        Self { store, service }
    }

    /// Cached record for `provider:voice_id` in the active session, if any.
    pub fn cached(&self, provider: &str, voice_id: &str) -> Option<VoiceRecord> {
        self.store
            .get_active_session()?
            .voice_cache
            .get(&voice_cache_key(provider, voice_id))
            .cloned()
    }

    /// Returns the cached record, fetching and caching it on a miss.
    ///
    /// The record is cached into the session that was active when the lookup
    /// started. A fetch failure leaves the cache untouched.
    pub async fn voice(&self, provider: &str, voice_id: &str) -> Result<VoiceRecord> {
        let session = self
            .store
            .get_active_session()
            .ok_or(CastingError::NoActiveSession)?;
        let key = voice_cache_key(provider, voice_id);
        if let Some(record) = session.voice_cache.get(&key) {
            return Ok(record.clone());
        }

        tracing::debug!("[VoiceCatalog] Cache miss for {}", key);
        let record = self.service.fetch_voice(provider, voice_id).await?;

        let cached = self.store.update_session(&session.session_id, |s| {
            s.voice_cache.insert(key.clone(), record.clone());
        });
        if let Err(e) = cached {
            tracing::warn!("[VoiceCatalog] Not caching {}: {}", key, e);
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingService {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VoiceMetadataService for CountingService {
        async fn fetch_voice(&self, provider: &str, voice_id: &str) -> Result<VoiceRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if voice_id == "missing" {
                return Err(CastingError::not_found("Voice", voice_id));
            }
            Ok(VoiceRecord {
                provider: provider.to_string(),
                sts_id: voice_id.to_string(),
                display_name: Some(voice_id.to_uppercase()),
                description: None,
                tags: HashSet::from(["warm".to_string()]),
            })
        }
    }

    fn catalog() -> (Arc<SessionStore>, Arc<CountingService>, VoiceCatalog) {
        let store = Arc::new(SessionStore::new());
        let service = Arc::new(CountingService {
            calls: AtomicUsize::new(0),
        });
        let catalog = VoiceCatalog::new(store.clone(), service.clone());
        (store, service, catalog)
    }

    #[tokio::test]
    async fn test_fetches_once_then_serves_from_cache() {
        let (store, service, catalog) = catalog();
        store.select_or_create_session("s-1", None);

        let first = catalog.voice("openai", "alloy").await.unwrap();
        let second = catalog.voice("openai", "alloy").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(catalog.cached("openai", "alloy"), Some(first));
    }

    #[tokio::test]
    async fn test_cache_is_per_session() {
        let (store, service, catalog) = catalog();
        store.select_or_create_session("s-1", None);
        catalog.voice("openai", "alloy").await.unwrap();

        store.select_or_create_session("s-2", None);
        assert!(catalog.cached("openai", "alloy").is_none());
        catalog.voice("openai", "alloy").await.unwrap();

        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_not_cached() {
        let (store, _service, catalog) = catalog();
        store.select_or_create_session("s-1", None);

        let err = catalog.voice("openai", "missing").await.unwrap_err();

        assert!(err.is_not_found());
        assert!(store.get_active_session().unwrap().voice_cache.is_empty());
    }

    #[tokio::test]
    async fn test_requires_active_session() {
        let (_store, service, catalog) = catalog();

        let err = catalog.voice("openai", "alloy").await.unwrap_err();

        assert!(err.is_no_active_session());
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }
}
