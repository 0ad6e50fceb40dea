//! The VerseCache: one store, one source, one coordinator.
//!
//! Brings storage, sync and queries together behind a single handle. The
//! store is constructed once and shared by the coordinator (writes) and the
//! query facade (reads).

use std::sync::Arc;

use tokio::sync::watch;

use versecache_store::{ContentStore, PreferenceStore, SqliteStore};
use versecache_sync::{HttpSource, Source, SyncCoordinator, SyncPhase, SyncReport};

use crate::config::CacheConfig;
use crate::error::Result;
use crate::preferences::ViewPreferences;
use crate::query::QueryFacade;

/// Offline-first cache of the corpus published at one URL.
pub struct VerseCache<S: ContentStore + PreferenceStore, R: Source> {
    config: CacheConfig,
    coordinator: SyncCoordinator<S, R>,
    query: QueryFacade<S>,
}

impl VerseCache<SqliteStore, HttpSource> {
    /// Open the SQLite database and HTTP client described by `config`.
    ///
    /// Does not sync; the previously committed snapshot, if any, is
    /// queryable straight away.
    pub fn open(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        let path = config.database_path()?;
        let store = Arc::new(SqliteStore::open(&path)?);
        let source = HttpSource::new(config.request_timeout())?;

        tracing::info!(path = %path.display(), source = %config.source_url, "opened verse cache");
        Ok(Self::new(store, source, config))
    }
}

impl<S: ContentStore + PreferenceStore + 'static, R: Source> VerseCache<S, R> {
    /// Assemble a cache from an existing store and source.
    pub fn new(store: Arc<S>, source: R, config: CacheConfig) -> Self {
        let query = QueryFacade::new(Arc::clone(&store));
        let coordinator = SyncCoordinator::new(store, source, config.sync.clone());

        Self {
            config,
            coordinator,
            query,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        self.coordinator.store()
    }

    pub fn coordinator(&self) -> &SyncCoordinator<S, R> {
        &self.coordinator
    }

    pub fn query(&self) -> &QueryFacade<S> {
        &self.query
    }

    /// Sync against the configured source URL.
    pub async fn refresh(&self) -> Result<SyncReport> {
        self.ensure_fresh(&self.config.source_url).await
    }

    /// Sync against `url`, waiting for any attempt already running.
    pub async fn ensure_fresh(&self, url: &str) -> Result<SyncReport> {
        Ok(self.coordinator.ensure_fresh(url).await?)
    }

    /// Sync against `url` unless an attempt is already running.
    pub async fn try_ensure_fresh(&self, url: &str) -> Result<SyncReport> {
        Ok(self.coordinator.try_ensure_fresh(url).await?)
    }

    /// Watch sync phases.
    pub fn subscribe(&self) -> watch::Receiver<SyncPhase> {
        self.coordinator.subscribe()
    }

    /// The stored view preferences, or the defaults.
    pub async fn preferences(&self) -> Result<ViewPreferences> {
        Ok(ViewPreferences::load(self.store().as_ref()).await?)
    }

    pub async fn save_preferences(&self, prefs: &ViewPreferences) -> Result<()> {
        prefs.save(self.store().as_ref()).await
    }

    /// Drop the committed snapshot. The next sync is a first load.
    pub async fn reset(&self) -> Result<()> {
        self.store().clear().await?;
        tracing::info!("verse cache reset");
        Ok(())
    }
}
