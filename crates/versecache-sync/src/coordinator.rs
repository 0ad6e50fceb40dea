//! Sync coordinator.
//!
//! Decides whether the locally committed snapshot is stale by comparing
//! fingerprints, and replaces it atomically when it is.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex, OwnedMutexGuard};

use versecache_core::{validate_snapshot, Fingerprint, Snapshot};
use versecache_store::{ContentStore, Integrity, StoreError, StoreExt};

use crate::error::{Result, SyncError};
use crate::phase::SyncPhase;
use crate::source::Source;

/// Configuration for sync behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Refuse remote snapshots with fewer books than this. Zero accepts
    /// anything, including an empty corpus.
    pub min_books: usize,
    /// Whether to validate snapshots before storing.
    pub validate_snapshots: bool,
    /// Compare against a fingerprint recomputed from the stored books
    /// instead of trusting the stored record.
    pub recompute_local: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            min_books: 0,
            validate_snapshots: true,
            recompute_local: false,
        }
    }
}

/// What a successful attempt did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The remote snapshot differed and is now committed.
    Replaced,
    /// The remote snapshot matched the committed one; nothing was written.
    Skipped,
}

/// Result of a successful sync attempt.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    /// Fingerprint of the fetched snapshot.
    pub remote_fingerprint: Fingerprint,
    /// The local fingerprint the remote one was compared against.
    pub previous_fingerprint: Option<Fingerprint>,
    /// Number of books in the fetched snapshot.
    pub book_count: usize,
    /// Every phase the attempt went through, in order.
    pub phases: Vec<SyncPhase>,
}

impl SyncReport {
    pub fn replaced(&self) -> bool {
        self.outcome == SyncOutcome::Replaced
    }
}

/// Keeps one store fresh against a remote source.
///
/// At most one attempt runs at a time per coordinator.
///
/// Once an attempt reaches `Committing` the write runs to completion on its
/// own task, even if the caller stops waiting. That task publishes the final
/// phase and keeps the next attempt out until the store has settled.
pub struct SyncCoordinator<S: ContentStore, R: Source> {
    store: Arc<S>,
    source: R,
    config: SyncConfig,
    /// Held for the whole of an attempt, including a detached commit.
    running: Arc<Mutex<()>>,
    phase: Arc<watch::Sender<SyncPhase>>,
}

impl<S: ContentStore + 'static, R: Source> SyncCoordinator<S, R> {
    /// Create a coordinator over a shared store.
    pub fn new(store: Arc<S>, source: R, config: SyncConfig) -> Self {
        let (phase, _) = watch::channel(SyncPhase::Idle);
        Self {
            store,
            source,
            config,
            running: Arc::new(Mutex::new(())),
            phase: Arc::new(phase),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn source(&self) -> &R {
        &self.source
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The phase of the current or most recent attempt.
    pub fn phase(&self) -> SyncPhase {
        *self.phase.borrow()
    }

    /// Watch phase changes as they happen.
    pub fn subscribe(&self) -> watch::Receiver<SyncPhase> {
        self.phase.subscribe()
    }

    /// Bring the store up to date with the document at `url`.
    ///
    /// Waits for any attempt already in flight to finish first. On error the
    /// store is unchanged.
    pub async fn ensure_fresh(&self, url: &str) -> Result<SyncReport> {
        let running = Arc::clone(&self.running).lock_owned().await;
        self.run(url, running).await
    }

    /// Like [`ensure_fresh`](Self::ensure_fresh), but fails with
    /// [`SyncError::InProgress`] instead of waiting.
    pub async fn try_ensure_fresh(&self, url: &str) -> Result<SyncReport> {
        let running = Arc::clone(&self.running)
            .try_lock_owned()
            .map_err(|_| SyncError::InProgress)?;
        self.run(url, running).await
    }

    async fn run(&self, url: &str, running: OwnedMutexGuard<()>) -> Result<SyncReport> {
        let mut running = Some(running);
        let mut attempt = Attempt::new(&self.phase);

        match self.attempt(url, &mut attempt, &mut running).await {
            Ok(report) => Ok(report),
            Err(e) => {
                attempt.advance(SyncPhase::Failed);
                tracing::warn!(url, kind = ?e.kind(), error = %e, "sync failed, keeping committed snapshot");
                Err(e)
            }
        }
    }

    async fn attempt(
        &self,
        url: &str,
        attempt: &mut Attempt<'_>,
        running: &mut Option<OwnedMutexGuard<()>>,
    ) -> Result<SyncReport> {
        attempt.advance(SyncPhase::Fetching);
        let remote = self.fetch_snapshot(url).await?;

        attempt.advance(SyncPhase::Fingerprinting);
        let remote_fingerprint = remote.fingerprint()?;

        attempt.advance(SyncPhase::Comparing);
        let previous_fingerprint = self.local_fingerprint().await?;

        if previous_fingerprint == Some(remote_fingerprint) {
            attempt.advance(SyncPhase::Skipping);
            tracing::info!(url, fingerprint = %remote_fingerprint, "snapshot unchanged");
            attempt.advance(SyncPhase::Skipped);

            return Ok(attempt.report(
                SyncOutcome::Skipped,
                remote_fingerprint,
                previous_fingerprint,
                remote.len(),
            ));
        }

        let book_count = remote.len();
        attempt.advance(SyncPhase::Committing);
        self.commit(remote, remote_fingerprint, running).await?;
        attempt.advance(SyncPhase::Committed);

        tracing::info!(
            url,
            fingerprint = %remote_fingerprint,
            previous = ?previous_fingerprint,
            books = book_count,
            "committed new snapshot"
        );

        Ok(attempt.report(
            SyncOutcome::Replaced,
            remote_fingerprint,
            previous_fingerprint,
            book_count,
        ))
    }

    /// Replace the stored snapshot from a detached task.
    ///
    /// The task owns the attempt lock and publishes `Committed` or `Failed`
    /// itself. If this future is dropped, the write still finishes and the
    /// lock is released only after the phase matches the store. If it is
    /// awaited, the lock comes back so the caller finishes its bookkeeping
    /// before the next attempt starts.
    async fn commit(
        &self,
        snapshot: Snapshot,
        fingerprint: Fingerprint,
        running: &mut Option<OwnedMutexGuard<()>>,
    ) -> Result<()> {
        let store = Arc::clone(&self.store);
        let phase = Arc::clone(&self.phase);
        let guard = running.take();

        let task = tokio::spawn(async move {
            let result = store.replace_all(&snapshot, &fingerprint).await;
            phase.send_replace(if result.is_ok() {
                SyncPhase::Committed
            } else {
                SyncPhase::Failed
            });
            (result, guard)
        });

        let (result, guard) = task
            .await
            .map_err(|e| StoreError::Task(format!("commit task failed: {}", e)))?;
        *running = guard;
        Ok(result?)
    }

    /// Fetch, parse and check the remote snapshot.
    async fn fetch_snapshot(&self, url: &str) -> Result<Snapshot> {
        let body = self.source.fetch(url).await?;
        let snapshot: Snapshot = serde_json::from_slice(&body)?;

        if self.config.validate_snapshots {
            validate_snapshot(&snapshot)?;
        }

        for book in snapshot.books().iter().filter(|b| b.has_chapter_count_mismatch()) {
            tracing::warn!(
                book_id = book.book_id,
                total_chapters = book.total_chapters,
                chapters = book.chapters.len(),
                "totalChapters disagrees with chapters present"
            );
        }

        if snapshot.len() < self.config.min_books {
            return Err(SyncError::Rejected(format!(
                "remote snapshot has {} books, at least {} required",
                snapshot.len(),
                self.config.min_books
            )));
        }

        Ok(snapshot)
    }

    /// The fingerprint the remote one is compared against.
    async fn local_fingerprint(&self) -> Result<Option<Fingerprint>> {
        if !self.config.recompute_local {
            return Ok(self.store.get_fingerprint().await?);
        }

        match self.store.verify_integrity().await? {
            Integrity::Verified(fingerprint) => Ok(Some(fingerprint)),
            Integrity::Empty => Ok(None),
            other => {
                tracing::warn!(integrity = ?other, "stored fingerprint does not match stored books");
                Ok(None)
            }
        }
    }
}

/// Phase bookkeeping for one attempt.
struct Attempt<'a> {
    channel: &'a watch::Sender<SyncPhase>,
    trace: Vec<SyncPhase>,
}

impl<'a> Attempt<'a> {
    fn new(channel: &'a watch::Sender<SyncPhase>) -> Self {
        Self {
            channel,
            trace: Vec::new(),
        }
    }

    fn current(&self) -> SyncPhase {
        self.trace.last().copied().unwrap_or(SyncPhase::Idle)
    }

    fn advance(&mut self, next: SyncPhase) {
        debug_assert!(
            self.current().can_transition_to(next),
            "illegal sync transition {} -> {}",
            self.current(),
            next
        );
        tracing::debug!(phase = %next, "sync phase");
        self.trace.push(next);
        self.channel.send_replace(next);
    }

    fn report(
        &mut self,
        outcome: SyncOutcome,
        remote_fingerprint: Fingerprint,
        previous_fingerprint: Option<Fingerprint>,
        book_count: usize,
    ) -> SyncReport {
        SyncReport {
            outcome,
            remote_fingerprint,
            previous_fingerprint,
            book_count,
            phases: std::mem::take(&mut self.trace),
        }
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        // An attempt dropped before committing wrote nothing. One dropped
        // while committing leaves the final phase to the commit task.
        let current = self.current();
        if !self.trace.is_empty() && !current.is_terminal() && current != SyncPhase::Committing {
            self.channel.send_replace(SyncPhase::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FailureKind, FetchError};
    use crate::source::memory::MemorySource;
    use std::time::Duration;
    use tokio::sync::Semaphore;
    use versecache_core::{Book, BookSummary, Chapter, Verse};
    use versecache_store::{Committed, MemoryStore, SqliteStore};

    const URL: &str = "mem://books.json";

    /// SQLite store whose `replace_all` waits for a permit.
    struct GatedStore {
        inner: SqliteStore,
        gate: Semaphore,
    }

    impl GatedStore {
        fn closed() -> Self {
            Self {
                inner: SqliteStore::open_memory().unwrap(),
                gate: Semaphore::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl ContentStore for GatedStore {
        async fn count(&self) -> versecache_store::Result<usize> {
            self.inner.count().await
        }

        async fn get_all_books(&self) -> versecache_store::Result<Snapshot> {
            self.inner.get_all_books().await
        }

        async fn list_books(&self) -> versecache_store::Result<Vec<BookSummary>> {
            self.inner.list_books().await
        }

        async fn get_book(&self, book_id: u32) -> versecache_store::Result<Option<Book>> {
            self.inner.get_book(book_id).await
        }

        async fn find_book_by_name(&self, name: &str) -> versecache_store::Result<Option<Book>> {
            self.inner.find_book_by_name(name).await
        }

        async fn get_fingerprint(&self) -> versecache_store::Result<Option<Fingerprint>> {
            self.inner.get_fingerprint().await
        }

        async fn load_committed(&self) -> versecache_store::Result<Committed> {
            self.inner.load_committed().await
        }

        async fn replace_all(
            &self,
            snapshot: &Snapshot,
            fingerprint: &Fingerprint,
        ) -> versecache_store::Result<()> {
            let _permit = self.gate.acquire().await.expect("gate closed");
            self.inner.replace_all(snapshot, fingerprint).await
        }

        async fn clear(&self) -> versecache_store::Result<()> {
            self.inner.clear().await
        }
    }

    fn john(text: &str) -> Snapshot {
        Snapshot::new(vec![Book::new(
            1,
            "John",
            "Jn",
            vec![Chapter::new(1, vec![Verse::new(1, text)])],
        )])
    }

    async fn setup(
        remote: &Snapshot,
        config: SyncConfig,
    ) -> SyncCoordinator<MemoryStore, Arc<MemorySource>> {
        let source = Arc::new(MemorySource::new());
        source.publish_json(URL, remote).await.unwrap();
        SyncCoordinator::new(Arc::new(MemoryStore::new()), source, config)
    }

    #[tokio::test]
    async fn test_first_sync_replaces() {
        let remote = john("In the beginning...");
        let coordinator = setup(&remote, SyncConfig::default()).await;

        let report = coordinator.ensure_fresh(URL).await.unwrap();

        assert_eq!(report.outcome, SyncOutcome::Replaced);
        assert_eq!(report.previous_fingerprint, None);
        assert_eq!(report.remote_fingerprint, remote.fingerprint().unwrap());
        assert_eq!(report.book_count, 1);
        assert_eq!(
            report.phases,
            vec![
                SyncPhase::Fetching,
                SyncPhase::Fingerprinting,
                SyncPhase::Comparing,
                SyncPhase::Committing,
                SyncPhase::Committed,
            ]
        );
        assert_eq!(coordinator.store().get_all_books().await.unwrap(), remote);
        assert_eq!(coordinator.phase(), SyncPhase::Committed);
    }

    #[tokio::test]
    async fn test_unchanged_remote_skips() {
        let remote = john("In the beginning...");
        let coordinator = setup(&remote, SyncConfig::default()).await;

        assert!(coordinator.ensure_fresh(URL).await.unwrap().replaced());
        let second = coordinator.ensure_fresh(URL).await.unwrap();

        assert_eq!(second.outcome, SyncOutcome::Skipped);
        assert_eq!(second.previous_fingerprint, Some(second.remote_fingerprint));
        assert_eq!(second.phases.last(), Some(&SyncPhase::Skipped));
        assert_eq!(coordinator.store().get_all_books().await.unwrap(), remote);
    }

    #[tokio::test]
    async fn test_changed_verse_replaces() {
        let coordinator = setup(&john("In the beginning..."), SyncConfig::default()).await;
        let first = coordinator.ensure_fresh(URL).await.unwrap();

        let changed = john("In the beginning was...");
        coordinator.source().publish_json(URL, &changed).await.unwrap();
        let second = coordinator.ensure_fresh(URL).await.unwrap();

        assert!(second.replaced());
        assert_eq!(second.previous_fingerprint, Some(first.remote_fingerprint));
        assert_ne!(second.remote_fingerprint, first.remote_fingerprint);
        assert_eq!(
            coordinator.store().get_fingerprint().await.unwrap(),
            Some(second.remote_fingerprint)
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_store() {
        let remote = john("In the beginning...");
        let coordinator = setup(&remote, SyncConfig::default()).await;
        let committed = coordinator.ensure_fresh(URL).await.unwrap();

        coordinator
            .source()
            .fail(URL, FetchError::from_status(URL, 500, "Internal Server Error"))
            .await;
        let err = coordinator.ensure_fresh(URL).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::Fetch);
        assert_eq!(coordinator.phase(), SyncPhase::Failed);
        assert_eq!(coordinator.store().get_all_books().await.unwrap(), remote);
        assert_eq!(
            coordinator.store().get_fingerprint().await.unwrap(),
            Some(committed.remote_fingerprint)
        );
    }

    #[tokio::test]
    async fn test_malformed_document_is_parse_failure() {
        let coordinator = setup(&Snapshot::empty(), SyncConfig::default()).await;
        coordinator.source().publish(URL, "{\"not\": \"books\"}").await;

        let err = coordinator.ensure_fresh(URL).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Parse);
        assert_eq!(coordinator.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_snapshot_rejected_before_store() {
        let duplicate = Snapshot::new(vec![Book::new(1, "A", "", vec![]), Book::new(1, "B", "", vec![])]);
        let coordinator = setup(&duplicate, SyncConfig::default()).await;

        let err = coordinator.ensure_fresh(URL).await.unwrap_err();
        assert!(matches!(err, SyncError::Invalid(_)));
        assert_eq!(coordinator.store().get_fingerprint().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_storage_failure_kind() {
        // With validation off the duplicate reaches the store, which refuses it.
        let duplicate = Snapshot::new(vec![Book::new(1, "A", "", vec![]), Book::new(1, "B", "", vec![])]);
        let config = SyncConfig {
            validate_snapshots: false,
            ..SyncConfig::default()
        };
        let coordinator = setup(&duplicate, config).await;

        let err = coordinator.ensure_fresh(URL).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Storage);
        assert_eq!(coordinator.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_remote_accepted_by_default() {
        let coordinator = setup(&john("x"), SyncConfig::default()).await;
        coordinator.ensure_fresh(URL).await.unwrap();

        coordinator.source().publish(URL, "[]").await;
        let report = coordinator.ensure_fresh(URL).await.unwrap();

        assert!(report.replaced());
        assert_eq!(coordinator.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_min_books_guard() {
        let config = SyncConfig {
            min_books: 2,
            ..SyncConfig::default()
        };
        let coordinator = setup(&john("x"), config).await;

        let err = coordinator.ensure_fresh(URL).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Rejected);
        assert_eq!(coordinator.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_recompute_local_repairs_mismatched_record() {
        let remote = john("In the beginning...");
        let store = Arc::new(MemoryStore::new());
        // Books and record disagree: the record claims the remote fingerprint.
        store
            .replace_all(&john("tampered"), &remote.fingerprint().unwrap())
            .await
            .unwrap();

        let source = Arc::new(MemorySource::new());
        source.publish_json(URL, &remote).await.unwrap();

        let trusting = SyncCoordinator::new(Arc::clone(&store), Arc::clone(&source), SyncConfig::default());
        assert_eq!(trusting.ensure_fresh(URL).await.unwrap().outcome, SyncOutcome::Skipped);

        let config = SyncConfig {
            recompute_local: true,
            ..SyncConfig::default()
        };
        let verifying = SyncCoordinator::new(Arc::clone(&store), source, config);
        let report = verifying.ensure_fresh(URL).await.unwrap();

        assert!(report.replaced());
        assert_eq!(report.previous_fingerprint, None);
        assert_eq!(store.get_all_books().await.unwrap(), remote);
    }

    #[tokio::test]
    async fn test_try_ensure_fresh_rejects_concurrent_attempt() {
        let remote = john("In the beginning...");
        let coordinator = Arc::new(setup(&remote, SyncConfig::default()).await);
        coordinator
            .source()
            .set_latency(Some(Duration::from_millis(200)))
            .await;

        let mut phases = coordinator.subscribe();
        let running = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.ensure_fresh(URL).await })
        };
        phases
            .wait_for(|phase| *phase == SyncPhase::Fetching)
            .await
            .unwrap();

        let err = coordinator.try_ensure_fresh(URL).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Busy);

        let report = running.await.unwrap().unwrap();
        assert!(report.replaced());
        assert_eq!(coordinator.source().fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_ensure_fresh_calls_serialize() {
        let remote = john("In the beginning...");
        let coordinator = Arc::new(setup(&remote, SyncConfig::default()).await);
        coordinator
            .source()
            .set_latency(Some(Duration::from_millis(20)))
            .await;

        let (a, b) = tokio::join!(coordinator.ensure_fresh(URL), coordinator.ensure_fresh(URL));
        let mut outcomes = vec![a.unwrap().outcome, b.unwrap().outcome];
        outcomes.sort_by_key(|o| *o == SyncOutcome::Skipped);

        assert_eq!(outcomes, vec![SyncOutcome::Replaced, SyncOutcome::Skipped]);
    }

    #[tokio::test]
    async fn test_cancelled_attempt_still_commits() {
        let remote = john("In the beginning...");
        let store = Arc::new(GatedStore::closed());
        let source = Arc::new(MemorySource::new());
        source.publish_json(URL, &remote).await.unwrap();
        let coordinator = Arc::new(SyncCoordinator::new(
            Arc::clone(&store),
            source,
            SyncConfig::default(),
        ));

        let mut phases = coordinator.subscribe();
        let running = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.ensure_fresh(URL).await })
        };
        phases
            .wait_for(|phase| *phase == SyncPhase::Committing)
            .await
            .unwrap();

        running.abort();
        assert!(running.await.unwrap_err().is_cancelled());

        // The write is still pending: not reported as failed, and it keeps
        // the next attempt out.
        assert_eq!(coordinator.phase(), SyncPhase::Committing);
        let err = coordinator.try_ensure_fresh(URL).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Busy);

        store.gate.add_permits(1);
        phases.wait_for(|phase| phase.is_terminal()).await.unwrap();

        assert_eq!(coordinator.phase(), SyncPhase::Committed);
        assert_eq!(
            store.get_fingerprint().await.unwrap(),
            Some(remote.fingerprint().unwrap())
        );
        assert_eq!(store.get_all_books().await.unwrap(), remote);

        let next = coordinator.ensure_fresh(URL).await.unwrap();
        assert_eq!(next.outcome, SyncOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_whole_number_floats_match_committed_snapshot() {
        let coordinator = setup(&john("In the beginning..."), SyncConfig::default()).await;
        coordinator.ensure_fresh(URL).await.unwrap();

        coordinator
            .source()
            .publish(
                URL,
                r#"[{"bookId": 1.0, "name": "John", "abbreviation": "Jn", "totalChapters": 1.0,
                     "chapters": [{"chapterNumber": 1.0,
                                   "verses": [{"verseNumber": 1.0, "text": "In the beginning..."}]}]}]"#,
            )
            .await;
        let report = coordinator.ensure_fresh(URL).await.unwrap();

        assert_eq!(report.outcome, SyncOutcome::Skipped);
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: SyncConfig = serde_json::from_str(r#"{"min_books": 66}"#).unwrap();
        assert_eq!(config.min_books, 66);
        assert!(config.validate_snapshots);
        assert!(!config.recompute_local);
    }
}
