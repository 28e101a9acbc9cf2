//! List Synchronizer
//!
//! Keeps the local [`WishList`] converged with the remote table: an initial
//! fetch, a push-channel subscription for row changes and the user's own
//! mutations. Each `start` begins a new epoch; results and events that
//! belong to an older epoch are dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use super::list::{ListEvent, WishList};
use super::snapshot::MutationOutcome;
use crate::domain::{DomainResult, Identity, NewWish, WishId, WishItem, WishPatch};
use crate::repository::{ChangeEvent, ChangeFeed, ChangeReceiver, WishRepository};

/// Point reads per insert event before falling back to the raw row
const ENRICH_ATTEMPTS: u32 = 2;
const RECONNECT_INITIAL: Duration = Duration::from_secs(1);
const RECONNECT_MAX: Duration = Duration::from_secs(30);

#[derive(Default)]
struct Lifecycle {
    identity: Option<Identity>,
    feed_task: Option<JoinHandle<()>>,
}

pub struct ListSynchronizer<R, F> {
    repo: Arc<R>,
    feed: Arc<F>,
    state: watch::Sender<WishList>,
    epoch: AtomicU64,
    lifecycle: Mutex<Lifecycle>,
}

impl<R: WishRepository, F: ChangeFeed> ListSynchronizer<R, F> {
    pub fn new(repo: Arc<R>, feed: Arc<F>) -> Arc<Self> {
        let (state, _) = watch::channel(WishList::new());
        Arc::new(Self {
            repo,
            feed,
            state,
            epoch: AtomicU64::new(0),
            lifecycle: Mutex::new(Lifecycle::default()),
        })
    }

    /// Receive every new snapshot
    pub fn subscribe(&self) -> watch::Receiver<WishList> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> WishList {
        self.state.borrow().clone()
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.lifecycle.lock().await.identity.clone()
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.current_epoch() == epoch
    }

    /// Reduce `event` into the list unless `epoch` is stale.
    /// Subscribers are only woken when the list actually changed.
    fn dispatch(&self, epoch: u64, event: ListEvent) -> bool {
        if !self.is_current(epoch) {
            log::debug!("[SYNC] dropping stale {} from epoch {}", event.name(), epoch);
            return false;
        }
        self.state.send_if_modified(|list| {
            let next = list.clone().apply(event);
            if next == *list {
                false
            } else {
                *list = next;
                true
            }
        })
    }

    // ========================
    // Lifecycle
    // ========================

    /// Tear down any previous subscription, reload the list and subscribe
    /// again on behalf of `identity` (`None` = signed out, read-only).
    pub async fn start(self: &Arc<Self>, identity: Option<Identity>) {
        let epoch = {
            let mut lifecycle = self.lifecycle.lock().await;
            let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(task) = lifecycle.feed_task.take() {
                task.abort();
            }
            log::info!(
                "[SYNC] starting epoch {} as {}",
                epoch,
                identity.as_ref().map(|i| i.id.as_str()).unwrap_or("<signed out>")
            );
            lifecycle.identity = identity;
            epoch
        };

        // Subscribe before fetching so rows committed during the fetch are
        // delivered; the reducer tolerates seeing them twice.
        self.dispatch(epoch, ListEvent::Reset);
        let receiver = self.open_feed().await;
        self.load(epoch, true).await;

        let mut lifecycle = self.lifecycle.lock().await;
        if !self.is_current(epoch) {
            return;
        }
        let task = tokio::spawn(Arc::clone(self).run_feed(epoch, receiver));
        lifecycle.feed_task = Some(task);
    }

    /// Tear down the subscription. Late results are discarded.
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(task) = lifecycle.feed_task.take() {
            task.abort();
            log::info!("[SYNC] stopped, now at epoch {}", epoch);
        }
    }

    /// Re-run the full fetch in the current epoch. The rows already shown
    /// stay visible until the new ones arrive.
    pub async fn refresh(&self) {
        self.load(self.current_epoch(), false).await;
    }

    async fn load(&self, epoch: u64, show_loading: bool) {
        if show_loading {
            self.dispatch(epoch, ListEvent::FetchStarted);
        }
        match self.repo.list().await {
            Ok(items) => {
                log::info!("[SYNC] loaded {} wishes", items.len());
                self.dispatch(epoch, ListEvent::Loaded(items));
            }
            Err(e) => {
                log::error!("[SYNC] fetching wishes failed: {}", e);
                self.dispatch(epoch, ListEvent::LoadFailed);
            }
        }
    }

    async fn open_feed(&self) -> Option<ChangeReceiver> {
        match self.feed.subscribe().await {
            Ok(receiver) => Some(receiver),
            Err(e) => {
                log::warn!("[SYNC] subscribing to changes failed: {}", e);
                None
            }
        }
    }

    /// Drain the subscription; when it ends, resubscribe with backoff and
    /// reload to catch up on anything missed in between.
    async fn run_feed(self: Arc<Self>, epoch: u64, mut receiver: Option<ChangeReceiver>) {
        let mut backoff = RECONNECT_INITIAL;
        loop {
            if let Some(mut rx) = receiver.take() {
                backoff = RECONNECT_INITIAL;
                while let Some(event) = rx.recv().await {
                    if !self.is_current(epoch) {
                        return;
                    }
                    self.handle_change(epoch, event).await;
                }
                log::warn!("[SYNC] change feed closed");
            }

            if !self.is_current(epoch) {
                return;
            }
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(RECONNECT_MAX);
            if !self.is_current(epoch) {
                return;
            }

            receiver = self.open_feed().await;
            if receiver.is_some() {
                log::info!("[SYNC] change feed reconnected");
                self.load(epoch, false).await;
            }
        }
    }

    // ========================
    // Remote changes
    // ========================

    async fn handle_change(&self, epoch: u64, event: ChangeEvent) {
        match event {
            ChangeEvent::Insert { id, row } => {
                let known = self.state.borrow().get(id).is_some();
                if known {
                    // Already listed (usually our own add): treat as a point update
                    if let Some(row) = row {
                        self.dispatch(epoch, ListEvent::Inserted(row));
                    }
                    return;
                }
                match self.enrich(id).await {
                    Some(item) => {
                        self.dispatch(epoch, ListEvent::Inserted(item));
                    }
                    None => match row {
                        Some(row) => {
                            log::warn!("[SYNC] showing wish {} without creator details", id);
                            self.dispatch(epoch, ListEvent::Inserted(row));
                        }
                        None => log::warn!("[SYNC] dropping insert of wish {}: no row available", id),
                    },
                }
            }
            ChangeEvent::Update { id, patch } => {
                self.dispatch(epoch, ListEvent::RemoteUpdated { id, patch });
            }
            ChangeEvent::Delete { id } => {
                self.dispatch(epoch, ListEvent::Removed(id));
            }
        }
    }

    /// Read the joined row for an insert event
    async fn enrich(&self, id: WishId) -> Option<WishItem> {
        for attempt in 1..=ENRICH_ATTEMPTS {
            match self.repo.find_by_id(id).await {
                Ok(Some(item)) => return Some(item),
                Ok(None) => log::debug!("[SYNC] wish {} not readable yet (attempt {})", id, attempt),
                Err(e) => log::warn!("[SYNC] reading wish {} failed (attempt {}): {}", id, attempt, e),
            }
        }
        None
    }

    // ========================
    // User mutations
    // ========================

    pub async fn add(&self, text: &str) -> MutationOutcome {
        let Some(identity) = self.identity().await else {
            return MutationOutcome::Ignored;
        };
        let Ok(draft) = NewWish::for_owner(text, &identity) else {
            return MutationOutcome::Ignored;
        };
        let epoch = self.current_epoch();

        match self.repo.create(&draft).await {
            Ok(mut item) => {
                if item.creator_email.is_none() {
                    item.creator_email = identity.email.clone();
                }
                log::info!("[SYNC] added wish {}", item.id);
                self.dispatch(epoch, ListEvent::Inserted(item));
                MutationOutcome::Applied
            }
            Err(e) => {
                log::error!("[SYNC] adding wish failed: {}", e);
                MutationOutcome::Failed(e.to_string())
            }
        }
    }

    pub async fn toggle_completed(&self, id: WishId) -> MutationOutcome {
        let Some(identity) = self.identity().await else {
            return MutationOutcome::Ignored;
        };
        let Some(completed) = self.state.borrow().get(id).map(|e| e.item.completed) else {
            return MutationOutcome::Ignored;
        };
        let epoch = self.current_epoch();

        self.dispatch(epoch, ListEvent::OptimisticToggle(id));
        let result = self
            .repo
            .update_owned(id, &identity.id, &WishPatch::completed(!completed))
            .await;
        self.settle(epoch, id, result, "toggling")
    }

    pub async fn edit_text(&self, id: WishId, text: &str) -> MutationOutcome {
        let Some(identity) = self.identity().await else {
            return MutationOutcome::Ignored;
        };
        let text = text.trim();
        if text.is_empty() {
            return MutationOutcome::Ignored;
        }
        let Some(current) = self.state.borrow().get(id).map(|e| e.item.text.clone()) else {
            return MutationOutcome::Ignored;
        };
        if current == text {
            return MutationOutcome::Ignored;
        }
        let epoch = self.current_epoch();

        self.dispatch(
            epoch,
            ListEvent::OptimisticEdit {
                id,
                text: text.to_string(),
            },
        );
        let result = self
            .repo
            .update_owned(id, &identity.id, &WishPatch::text(text))
            .await;
        self.settle(epoch, id, result, "editing")
    }

    pub async fn remove(&self, id: WishId) -> MutationOutcome {
        let Some(identity) = self.identity().await else {
            return MutationOutcome::Ignored;
        };
        if self.state.borrow().get(id).is_none() {
            return MutationOutcome::Ignored;
        }
        let epoch = self.current_epoch();

        match self.repo.delete_owned(id, &identity.id).await {
            Ok(()) => {
                log::info!("[SYNC] removed wish {}", id);
                self.dispatch(epoch, ListEvent::Removed(id));
                MutationOutcome::Applied
            }
            Err(e) => {
                log::error!("[SYNC] removing wish {} failed: {}", id, e);
                MutationOutcome::Failed(e.to_string())
            }
        }
    }

    fn settle(
        &self,
        epoch: u64,
        id: WishId,
        result: DomainResult<WishItem>,
        action: &str,
    ) -> MutationOutcome {
        match result {
            Ok(row) => {
                self.dispatch(epoch, ListEvent::WriteConfirmed { id, row });
                MutationOutcome::Applied
            }
            Err(e) => {
                log::error!("[SYNC] {} wish {} failed, rolling back: {}", action, id, e);
                self.dispatch(epoch, ListEvent::WriteRolledBack(id));
                MutationOutcome::Failed(e.to_string())
            }
        }
    }
}
