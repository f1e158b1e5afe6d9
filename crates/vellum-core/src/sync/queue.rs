//! Offline sync queue engine
//!
//! Local storage is authoritative for edit survival: a save always lands in
//! the local database first, then a queue item is collapsed in behind it.
//! Draining reconciles queued mutations against the remote store with
//! exponential backoff; divergence is surfaced as a conflict and never
//! resolved silently.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::fingerprint;
use super::remote::SyncRemote;
use super::retry::RetrySchedule;
use crate::config::SyncQueueConfig;
use crate::error::Error;
use crate::models::{
    now_ms, Article, ArticleId, SyncAction, SyncQueueItem, SyncStatus,
};
use crate::services::DatabaseService;
use crate::Result;

/// User-visible sync lifecycle events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncSignal {
    /// A save happened while offline; it will sync later
    QueuedOffline,
    /// Connectivity came back; draining resumes
    Reconnected,
    /// An entity was reconciled with the server
    Synced { entity_client_id: String },
    /// An entity exhausted its retry budget
    SyncFailed {
        entity_client_id: String,
        error: String,
    },
    /// Remote divergence detected; resolution required
    ConflictDetected { entity_client_id: String },
}

/// Sink for sync lifecycle events
pub trait SyncObserver: Send + Sync {
    fn signal(&self, signal: SyncSignal);
}

/// Observer that writes to the tracing log, the default sink
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl SyncObserver for LogObserver {
    fn signal(&self, signal: SyncSignal) {
        match signal {
            SyncSignal::QueuedOffline => tracing::info!("Offline; changes queued for later sync"),
            SyncSignal::Reconnected => tracing::info!("Back online; syncing queued changes"),
            SyncSignal::Synced { entity_client_id } => {
                tracing::info!("Synced {entity_client_id}");
            }
            SyncSignal::SyncFailed {
                entity_client_id,
                error,
            } => tracing::warn!("Sync of {entity_client_id} gave up: {error}"),
            SyncSignal::ConflictDetected { entity_client_id } => {
                tracing::warn!("Sync conflict on {entity_client_id}; resolution required");
            }
        }
    }
}

/// A remote article state observed outside the queue's own push path,
/// e.g. from a pull or a server push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSnapshot {
    pub entity_client_id: String,
    pub server_id: String,
    pub version: i64,
    pub content: String,
    pub content_hash: String,
    /// Server-side update timestamp (unix ms)
    pub server_updated_at: i64,
}

/// How to settle a surfaced conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Push the local version back out, discarding the remote divergence
    KeepLocal,
    /// Adopt the remote content and version, discarding local edits
    KeepRemote,
}

/// The client-side sync engine.
#[derive(Clone)]
pub struct SyncQueue {
    db: DatabaseService,
    remote: Arc<dyn SyncRemote>,
    observer: Arc<dyn SyncObserver>,
    config: SyncQueueConfig,
    online: Arc<AtomicBool>,
    retries: Arc<Mutex<RetrySchedule>>,
}

/// Handle to the background retry loop spawned by [`SyncQueue::start`]
pub struct SyncQueueHandle {
    retry_loop: JoinHandle<()>,
}

impl SyncQueueHandle {
    pub fn stop(self) {
        self.retry_loop.abort();
        tracing::info!("Sync queue stopped");
    }
}

impl SyncQueue {
    pub fn new(
        db: DatabaseService,
        remote: Arc<dyn SyncRemote>,
        observer: Arc<dyn SyncObserver>,
        config: SyncQueueConfig,
    ) -> Self {
        Self {
            db,
            remote,
            observer,
            config,
            online: Arc::new(AtomicBool::new(true)),
            retries: Arc::new(Mutex::new(RetrySchedule::new())),
        }
    }

    /// Spawn the background loop that releases due retries.
    pub fn start(&self) -> SyncQueueHandle {
        let queue = self.clone();
        let retry_loop = tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if let Err(e) = queue.run_due_retries(now_ms()).await {
                    tracing::error!("Retry sweep failed: {e}");
                }
            }
        });
        SyncQueueHandle { retry_loop }
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Record a connectivity transition. Going online drains immediately;
    /// going offline pauses draining and tells the user their edits are safe.
    pub async fn set_online(&self, online: bool) -> Result<()> {
        let was_online = self.online.swap(online, Ordering::SeqCst);
        if online && !was_online {
            self.observer.signal(SyncSignal::Reconnected);
            self.drain(now_ms()).await?;
        } else if !online && was_online {
            self.observer.signal(SyncSignal::QueuedOffline);
        }
        Ok(())
    }

    /// Persist a local edit and queue it for reconciliation.
    ///
    /// The article lands in local storage unconditionally; the queue item
    /// collapses onto any un-sent predecessor, keeping its backoff state.
    pub async fn record_local_save(&self, article: &mut Article) -> Result<()> {
        let now = now_ms();
        article.content_hash = fingerprint::content_hash(&article.content);
        article.local_version += 1;
        article.local_updated_at = now;
        article.sync_status = SyncStatus::Pending;
        self.db.save_article(article).await?;

        let action = if article.server_id.is_none() {
            SyncAction::Create
        } else {
            SyncAction::Update
        };
        let mut item = SyncQueueItem::article(
            article.id.as_str(),
            action,
            serde_json::to_string(article)?,
        );
        item.entity_id = article.server_id.clone();
        self.db.upsert_queue_item(&item).await?;

        if self.is_online() {
            self.drain(now).await?;
        } else {
            self.observer.signal(SyncSignal::QueuedOffline);
        }
        Ok(())
    }

    /// Reconcile up to one batch of eligible items, oldest first.
    /// Returns how many items synced successfully. A no-op while offline.
    pub async fn drain(&self, now: i64) -> Result<usize> {
        if !self.is_online() {
            return Ok(0);
        }

        let batch = self
            .db
            .due_queue_items(now, self.config.drain_batch_size)
            .await?;
        let mut synced = 0;
        for item in batch {
            if self.sync_one(item, now).await? {
                synced += 1;
            }
        }
        Ok(synced)
    }

    /// Release retries whose deadline has passed, then drain.
    ///
    /// The in-memory schedule only suppresses redundant drains while it
    /// knows a future deadline; the persisted `next_attempt_at`
    /// on each queue row is the source of truth, so backed-off items from
    /// a previous process still drain here after a restart.
    pub async fn run_due_retries(&self, now: i64) -> Result<usize> {
        let released = self.lock_retries().pop_due(now);
        if released.is_empty() && self.next_retry_deadline().is_some() {
            return Ok(0);
        }
        self.drain(now).await
    }

    /// The earliest pending retry deadline, if any
    #[must_use]
    pub fn next_retry_deadline(&self) -> Option<i64> {
        self.lock_retries().next_deadline()
    }

    /// Every queued item, oldest first
    pub async fn list_items(&self) -> Result<Vec<SyncQueueItem>> {
        self.db.list_queue_items().await
    }

    async fn sync_one(&self, item: SyncQueueItem, now: i64) -> Result<bool> {
        let Some(mut article) = self.load_article(&item.entity_client_id).await? else {
            // The entity vanished locally; the mutation has nothing to apply to
            self.db.remove_queue_item(&item.entity_client_id).await?;
            self.lock_retries().clear(&item.entity_client_id);
            return Ok(false);
        };

        article.sync_status = SyncStatus::Syncing;
        self.db.save_article(&article).await?;

        match self.remote.reconcile(&item).await {
            Ok(ack) => {
                article.server_id = Some(ack.server_id);
                article.remote_version = ack.version;
                article.server_updated_at = Some(ack.server_updated_at);
                article.remote_content_hash = Some(article.content_hash.clone());
                article.sync_status = SyncStatus::Synced;
                article.last_sync_error = None;
                self.db.save_article(&article).await?;

                self.db.remove_queue_item(&item.entity_client_id).await?;
                self.lock_retries().clear(&item.entity_client_id);
                self.observer.signal(SyncSignal::Synced {
                    entity_client_id: item.entity_client_id,
                });
                Ok(true)
            }
            Err(e) => {
                let retry_count = item.retry_count + 1;
                if retry_count >= self.config.max_retries {
                    article.sync_status = SyncStatus::Error;
                    article.last_sync_error = Some(e.message.clone());
                    self.db.save_article(&article).await?;

                    self.db.remove_queue_item(&item.entity_client_id).await?;
                    self.lock_retries().clear(&item.entity_client_id);
                    tracing::warn!(
                        "Giving up on {} after {} attempts: {}",
                        item.entity_client_id,
                        retry_count,
                        e.message
                    );
                    self.observer.signal(SyncSignal::SyncFailed {
                        entity_client_id: item.entity_client_id,
                        error: e.message,
                    });
                } else {
                    let next_attempt_at = now + SyncQueueConfig::backoff_ms(retry_count);
                    article.sync_status = SyncStatus::Pending;
                    article.last_sync_error = Some(e.message.clone());
                    self.db.save_article(&article).await?;

                    self.db
                        .record_queue_failure(
                            &item.entity_client_id,
                            &e.message,
                            retry_count,
                            next_attempt_at,
                        )
                        .await?;
                    self.lock_retries()
                        .schedule(item.entity_client_id.clone(), next_attempt_at);
                    tracing::debug!(
                        "Sync attempt {}/{} for {} failed, next at {}: {}",
                        retry_count,
                        self.config.max_retries,
                        item.entity_client_id,
                        next_attempt_at,
                        e.message
                    );
                }
                Ok(false)
            }
        }
    }

    /// Fold an observed remote state into the local store.
    ///
    /// A diverging snapshot for an entity with no pending local mutation is
    /// a conflict: the remote body is retained alongside the local one and
    /// sync halts for that entity until resolved. Local content is never
    /// overwritten here.
    pub async fn apply_remote_snapshot(&self, snapshot: &RemoteSnapshot) -> Result<()> {
        let Some(mut article) = self.load_article(&snapshot.entity_client_id).await? else {
            tracing::debug!(
                "Ignoring remote snapshot for unknown entity {}",
                snapshot.entity_client_id
            );
            return Ok(());
        };

        // A pending local mutation will hit the server on its own; let the
        // push path settle first rather than flagging a conflict early.
        if self
            .db
            .get_queue_item(&snapshot.entity_client_id)
            .await?
            .is_some()
        {
            article.remote_content_hash = Some(snapshot.content_hash.clone());
            self.db.save_article(&article).await?;
            return Ok(());
        }

        if article.diverges_from(&snapshot.content_hash) {
            article.has_conflict = true;
            article.sync_status = SyncStatus::Conflict;
            article.conflict_remote_content = Some(snapshot.content.clone());
            article.remote_content_hash = Some(snapshot.content_hash.clone());
            article.remote_version = snapshot.version;
            article.server_id = Some(snapshot.server_id.clone());
            article.server_updated_at = Some(snapshot.server_updated_at);
            self.db.save_article(&article).await?;
            self.observer.signal(SyncSignal::ConflictDetected {
                entity_client_id: snapshot.entity_client_id.clone(),
            });
        } else {
            article.remote_content_hash = Some(snapshot.content_hash.clone());
            article.remote_version = snapshot.version;
            article.server_id = Some(snapshot.server_id.clone());
            article.server_updated_at = Some(snapshot.server_updated_at);
            article.sync_status = SyncStatus::Synced;
            self.db.save_article(&article).await?;
        }
        Ok(())
    }

    /// Settle a surfaced conflict in the stated direction.
    pub async fn resolve_conflict(
        &self,
        article_id: &ArticleId,
        resolution: ConflictResolution,
    ) -> Result<Article> {
        let mut article = self
            .db
            .get_article(article_id)
            .await?
            .ok_or_else(|| Error::ArticleNotFound(article_id.to_string()))?;

        if !article.has_conflict {
            return Err(Error::NoConflict(article_id.to_string()));
        }

        match resolution {
            ConflictResolution::KeepLocal => {
                article.has_conflict = false;
                article.conflict_remote_content = None;
                // Re-enqueue the local version; the push path carries it out
                self.record_local_save(&mut article).await?;
            }
            ConflictResolution::KeepRemote => {
                let remote_content = article.conflict_remote_content.take().ok_or_else(|| {
                    Error::NoConflict(article_id.to_string())
                })?;
                article.content = remote_content;
                article.content_hash = fingerprint::content_hash(&article.content);
                article.has_conflict = false;
                article.sync_status = SyncStatus::Synced;
                article.last_sync_error = None;
                article.local_updated_at = now_ms();
                self.db.save_article(&article).await?;
                self.db.remove_queue_item(&article.id.as_str()).await?;
                self.lock_retries().clear(&article.id.as_str());
            }
        }
        Ok(article)
    }

    async fn load_article(&self, entity_client_id: &str) -> Result<Option<Article>> {
        let id = ArticleId::from_str(entity_client_id)
            .map_err(|e| Error::InvalidInput(format!("bad entity id {entity_client_id}: {e}")))?;
        self.db.get_article(&id).await
    }

    fn lock_retries(&self) -> std::sync::MutexGuard<'_, RetrySchedule> {
        self.retries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    use pretty_assertions::assert_eq;

    use super::super::remote::{RemoteAck, RemoteError};
    use super::*;
    use crate::models::UserId;

    struct ScriptedRemote {
        script: Mutex<VecDeque<std::result::Result<RemoteAck, RemoteError>>>,
        calls: AtomicUsize,
        payloads: Mutex<Vec<String>>,
    }

    impl ScriptedRemote {
        fn new(
            script: impl IntoIterator<Item = std::result::Result<RemoteAck, RemoteError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into_iter().collect()),
                calls: AtomicUsize::new(0),
                payloads: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl SyncRemote for ScriptedRemote {
        async fn reconcile(
            &self,
            item: &SyncQueueItem,
        ) -> std::result::Result<RemoteAck, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payloads.lock().unwrap().push(item.payload.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("remote called more times than scripted")
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        signals: Mutex<Vec<SyncSignal>>,
    }

    impl SyncObserver for RecordingObserver {
        fn signal(&self, signal: SyncSignal) {
            self.signals.lock().unwrap().push(signal);
        }
    }

    struct Fixture {
        queue: SyncQueue,
        db: DatabaseService,
        remote: Arc<ScriptedRemote>,
        observer: Arc<RecordingObserver>,
    }

    fn fixture_with(script: Vec<std::result::Result<RemoteAck, RemoteError>>) -> Fixture {
        let db = DatabaseService::open_in_memory().unwrap();
        let remote = ScriptedRemote::new(script);
        let observer = Arc::new(RecordingObserver::default());
        let queue = SyncQueue::new(
            db.clone(),
            remote.clone(),
            observer.clone(),
            SyncQueueConfig::default(),
        );
        Fixture {
            queue,
            db,
            remote,
            observer,
        }
    }

    fn ack(server_id: &str, version: i64) -> std::result::Result<RemoteAck, RemoteError> {
        Ok(RemoteAck {
            server_id: server_id.to_string(),
            version,
            server_updated_at: 1_700_000_000_000,
        })
    }

    async fn draft(db: &DatabaseService) -> Article {
        let article = Article::new(UserId::from("u1"), "Draft", "first version");
        db.insert_article(&article).await.unwrap();
        article
    }

    fn signals(observer: &RecordingObserver) -> Vec<SyncSignal> {
        observer.signals.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn offline_edits_collapse_to_single_reconcile() {
        let f = fixture_with(vec![ack("srv-1", 1)]);
        let mut article = draft(&f.db).await;

        f.queue.set_online(false).await.unwrap();
        for body in ["one", "two", "three"] {
            article.content = body.to_string();
            f.queue.record_local_save(&mut article).await.unwrap();
        }

        // One collapsed item carrying only the newest payload
        let items = f.queue.list_items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].payload.contains("three"));
        assert_eq!(f.remote.calls(), 0);

        f.queue.set_online(true).await.unwrap();
        assert_eq!(f.remote.calls(), 1);
        assert!(f.queue.list_items().await.unwrap().is_empty());

        let stored = f.db.get_article(&article.id).await.unwrap().unwrap();
        assert_eq!(stored.sync_status, SyncStatus::Synced);
        assert_eq!(stored.server_id.as_deref(), Some("srv-1"));
        assert_eq!(stored.remote_version, 1);

        let observed = signals(&f.observer);
        assert_eq!(
            observed.last(),
            Some(&SyncSignal::Synced {
                entity_client_id: article.id.as_str()
            })
        );
        assert!(observed.contains(&SyncSignal::QueuedOffline));
        assert!(observed.contains(&SyncSignal::Reconnected));
    }

    #[tokio::test]
    async fn save_bumps_version_and_hash() {
        let f = fixture_with(vec![ack("srv-1", 1)]);
        let mut article = draft(&f.db).await;
        let original_hash = article.content_hash.clone();

        article.content = "rewritten".to_string();
        f.queue.record_local_save(&mut article).await.unwrap();

        assert_eq!(article.local_version, 2);
        assert_ne!(article.content_hash, original_hash);
    }

    #[tokio::test]
    async fn failure_backs_off_exponentially() {
        let f = fixture_with(vec![
            Err(RemoteError::new("connection refused")),
            Err(RemoteError::new("connection refused")),
            ack("srv-1", 1),
        ]);
        let mut article = draft(&f.db).await;
        f.queue.record_local_save(&mut article).await.unwrap();
        assert_eq!(f.remote.calls(), 1);

        let item = f
            .queue
            .list_items()
            .await
            .unwrap()
            .into_iter()
            .next()
            .unwrap();
        assert_eq!(item.retry_count, 1);
        assert_eq!(item.last_error.as_deref(), Some("connection refused"));
        let first_deadline = f.queue.next_retry_deadline().unwrap();
        // 2^1 seconds after the failed attempt
        assert_eq!(item.next_attempt_at, first_deadline);

        // Not eligible before the deadline
        assert_eq!(
            f.queue.run_due_retries(first_deadline - 1).await.unwrap(),
            0
        );
        assert_eq!(f.remote.calls(), 1);

        // Second failure doubles the delay
        f.queue.run_due_retries(first_deadline).await.unwrap();
        assert_eq!(f.remote.calls(), 2);
        let item = f
            .queue
            .list_items()
            .await
            .unwrap()
            .into_iter()
            .next()
            .unwrap();
        assert_eq!(item.retry_count, 2);
        assert_eq!(
            item.next_attempt_at - first_deadline,
            SyncQueueConfig::backoff_ms(2)
        );

        // Third attempt succeeds
        f.queue
            .run_due_retries(item.next_attempt_at)
            .await
            .unwrap();
        assert_eq!(f.remote.calls(), 3);
        assert!(f.queue.list_items().await.unwrap().is_empty());
        let stored = f.db.get_article(&article.id).await.unwrap().unwrap();
        assert_eq!(stored.sync_status, SyncStatus::Synced);
    }

    #[tokio::test]
    async fn backed_off_item_drains_after_restart() {
        let f = fixture_with(vec![Err(RemoteError::new("connection refused"))]);
        let mut article = draft(&f.db).await;
        f.queue.record_local_save(&mut article).await.unwrap();

        let item = f
            .queue
            .list_items()
            .await
            .unwrap()
            .into_iter()
            .next()
            .unwrap();
        assert_eq!(item.retry_count, 1);

        // A new process sees the persisted row but starts with an empty
        // in-memory schedule
        let remote = ScriptedRemote::new(vec![ack("srv-1", 1)]);
        let observer = Arc::new(RecordingObserver::default());
        let restarted = SyncQueue::new(
            f.db.clone(),
            remote.clone(),
            observer.clone(),
            SyncQueueConfig::default(),
        );
        assert!(restarted.next_retry_deadline().is_none());

        // Still gated by the stored deadline
        assert_eq!(
            restarted
                .run_due_retries(item.next_attempt_at - 1)
                .await
                .unwrap(),
            0
        );
        assert_eq!(remote.calls(), 0);

        // Once the deadline passes the row reconciles
        assert_eq!(
            restarted
                .run_due_retries(item.next_attempt_at + 60_000)
                .await
                .unwrap(),
            1
        );
        assert_eq!(remote.calls(), 1);
        assert!(restarted.list_items().await.unwrap().is_empty());
        let stored = f.db.get_article(&article.id).await.unwrap().unwrap();
        assert_eq!(stored.sync_status, SyncStatus::Synced);
        assert_eq!(
            signals(&observer).last(),
            Some(&SyncSignal::Synced {
                entity_client_id: article.id.as_str()
            })
        );
    }

    #[tokio::test]
    async fn retry_cap_marks_error_and_drops_item() {
        let f = fixture_with(vec![
            Err(RemoteError::new("boom 1")),
            Err(RemoteError::new("boom 2")),
            Err(RemoteError::new("boom 3")),
        ]);
        let mut article = draft(&f.db).await;
        f.queue.record_local_save(&mut article).await.unwrap();

        for _ in 0..2 {
            let deadline = f.queue.next_retry_deadline().unwrap();
            f.queue.run_due_retries(deadline).await.unwrap();
        }

        assert_eq!(f.remote.calls(), 3);
        assert!(f.queue.list_items().await.unwrap().is_empty());
        assert!(f.queue.next_retry_deadline().is_none());

        let stored = f.db.get_article(&article.id).await.unwrap().unwrap();
        assert_eq!(stored.sync_status, SyncStatus::Error);
        assert_eq!(stored.last_sync_error.as_deref(), Some("boom 3"));

        assert_eq!(
            signals(&f.observer).last(),
            Some(&SyncSignal::SyncFailed {
                entity_client_id: article.id.as_str(),
                error: "boom 3".to_string()
            })
        );
    }

    #[tokio::test]
    async fn diverging_snapshot_surfaces_conflict_without_overwriting() {
        let f = fixture_with(vec![]);
        let article = draft(&f.db).await;

        let snapshot = RemoteSnapshot {
            entity_client_id: article.id.as_str(),
            server_id: "srv-1".to_string(),
            version: 4,
            content: "remote body".to_string(),
            content_hash: fingerprint::content_hash("remote body"),
            server_updated_at: 1_700_000_000_000,
        };
        f.queue.apply_remote_snapshot(&snapshot).await.unwrap();

        let stored = f.db.get_article(&article.id).await.unwrap().unwrap();
        assert!(stored.has_conflict);
        assert_eq!(stored.sync_status, SyncStatus::Conflict);
        assert_eq!(stored.content, "first version");
        assert_eq!(
            stored.conflict_remote_content.as_deref(),
            Some("remote body")
        );
        assert_eq!(
            signals(&f.observer).last(),
            Some(&SyncSignal::ConflictDetected {
                entity_client_id: article.id.as_str()
            })
        );
    }

    #[tokio::test]
    async fn matching_snapshot_adopts_version_quietly() {
        let f = fixture_with(vec![]);
        let article = draft(&f.db).await;

        let snapshot = RemoteSnapshot {
            entity_client_id: article.id.as_str(),
            server_id: "srv-1".to_string(),
            version: 2,
            content: article.content.clone(),
            content_hash: article.content_hash.clone(),
            server_updated_at: 1_700_000_000_000,
        };
        f.queue.apply_remote_snapshot(&snapshot).await.unwrap();

        let stored = f.db.get_article(&article.id).await.unwrap().unwrap();
        assert!(!stored.has_conflict);
        assert_eq!(stored.sync_status, SyncStatus::Synced);
        assert_eq!(stored.remote_version, 2);
        assert!(signals(&f.observer).is_empty());
    }

    #[tokio::test]
    async fn snapshot_defers_to_pending_local_mutation() {
        let f = fixture_with(vec![]);
        let mut article = draft(&f.db).await;

        f.queue.set_online(false).await.unwrap();
        article.content = "local edit".to_string();
        f.queue.record_local_save(&mut article).await.unwrap();

        let snapshot = RemoteSnapshot {
            entity_client_id: article.id.as_str(),
            server_id: "srv-1".to_string(),
            version: 4,
            content: "remote body".to_string(),
            content_hash: fingerprint::content_hash("remote body"),
            server_updated_at: 1_700_000_000_000,
        };
        f.queue.apply_remote_snapshot(&snapshot).await.unwrap();

        let stored = f.db.get_article(&article.id).await.unwrap().unwrap();
        assert!(!stored.has_conflict);
        assert_eq!(stored.sync_status, SyncStatus::Pending);
    }

    #[tokio::test]
    async fn resolve_keep_remote_adopts_remote_state() {
        let f = fixture_with(vec![]);
        let article = draft(&f.db).await;

        let remote_hash = fingerprint::content_hash("remote body");
        let snapshot = RemoteSnapshot {
            entity_client_id: article.id.as_str(),
            server_id: "srv-1".to_string(),
            version: 4,
            content: "remote body".to_string(),
            content_hash: remote_hash.clone(),
            server_updated_at: 1_700_000_000_000,
        };
        f.queue.apply_remote_snapshot(&snapshot).await.unwrap();

        let resolved = f
            .queue
            .resolve_conflict(&article.id, ConflictResolution::KeepRemote)
            .await
            .unwrap();
        assert_eq!(resolved.content, "remote body");
        assert_eq!(resolved.content_hash, remote_hash);
        assert!(!resolved.has_conflict);
        assert_eq!(resolved.sync_status, SyncStatus::Synced);
        assert!(resolved.conflict_remote_content.is_none());
        assert_eq!(f.remote.calls(), 0);
    }

    #[tokio::test]
    async fn resolve_keep_local_reenqueues_local_version() {
        let f = fixture_with(vec![ack("srv-1", 5)]);
        let article = draft(&f.db).await;

        let snapshot = RemoteSnapshot {
            entity_client_id: article.id.as_str(),
            server_id: "srv-1".to_string(),
            version: 4,
            content: "remote body".to_string(),
            content_hash: fingerprint::content_hash("remote body"),
            server_updated_at: 1_700_000_000_000,
        };
        f.queue.apply_remote_snapshot(&snapshot).await.unwrap();

        let resolved = f
            .queue
            .resolve_conflict(&article.id, ConflictResolution::KeepLocal)
            .await
            .unwrap();
        assert_eq!(resolved.content, "first version");
        assert!(!resolved.has_conflict);

        // The local version went back out through the push path
        assert_eq!(f.remote.calls(), 1);
        let stored = f.db.get_article(&article.id).await.unwrap().unwrap();
        assert_eq!(stored.sync_status, SyncStatus::Synced);
        assert_eq!(stored.remote_version, 5);
    }

    #[tokio::test]
    async fn resolve_without_conflict_is_rejected() {
        let f = fixture_with(vec![]);
        let article = draft(&f.db).await;

        let err = f
            .queue
            .resolve_conflict(&article.id, ConflictResolution::KeepRemote)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoConflict(_)));
    }
}
