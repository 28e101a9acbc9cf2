//! In-Memory Remote
//!
//! Stands in for the hosted backend in tests: a wish table with owner
//! filtering, a creator-email join, a push channel the test drives by hand
//! and switches for injecting failures.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::{mpsc, Notify};

use super::change::ChangeEvent;
use super::traits::{ChangeFeed, ChangeReceiver, OwnedRepository, Repository};
use crate::domain::{newest_first, DomainError, DomainResult, NewWish, WishId, WishItem, WishPatch};

/// Base of the fake clock; each created row is one second newer
const CLOCK_BASE: i64 = 1_700_000_000;

#[derive(Default)]
struct Inner {
    rows: Vec<WishItem>,
    next_id: WishId,
    emails: HashMap<String, String>,
    subscribers: Vec<mpsc::UnboundedSender<ChangeEvent>>,
    subscribe_calls: usize,
    list_calls: usize,
    lookup_calls: usize,
    fail_list: bool,
    fail_writes: bool,
    fail_subscribe: bool,
    lookup_failures: u32,
    echo: bool,
    /// Rows that land while the next subscription is still joining
    commit_on_subscribe: Vec<WishItem>,
}

#[derive(Default)]
pub struct MemoryRemote {
    inner: Mutex<Inner>,
    write_gate: Mutex<Option<Arc<Notify>>>,
    list_gate: Mutex<Option<Arc<Notify>>>,
}

impl MemoryRemote {
    pub fn new() -> Arc<Self> {
        let remote = Self::default();
        remote.lock().next_id = 1;
        Arc::new(remote)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory remote poisoned")
    }

    /// Build a raw row the way the server would stamp it
    pub fn row(id: WishId, text: &str, user_id: &str, created_secs: i64) -> WishItem {
        WishItem {
            id,
            text: text.to_string(),
            completed: false,
            user_id: user_id.to_string(),
            creator_email: None,
            created_at: Utc.timestamp_opt(CLOCK_BASE + created_secs, 0).single(),
        }
    }

    pub fn seed(&self, rows: Vec<WishItem>) {
        let mut inner = self.lock();
        for row in rows {
            inner.next_id = inner.next_id.max(row.id + 1);
            inner.rows.push(row);
        }
    }

    pub fn set_email(&self, user_id: &str, email: &str) {
        self.lock()
            .emails
            .insert(user_id.to_string(), email.to_string());
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.lock().fail_list = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    pub fn set_fail_subscribe(&self, fail: bool) {
        self.lock().fail_subscribe = fail;
    }

    /// Make the next `count` point reads fail
    pub fn fail_lookups(&self, count: u32) {
        self.lock().lookup_failures = count;
    }

    /// Broadcast each successful write back through the push channel
    pub fn set_echo(&self, echo: bool) {
        self.lock().echo = echo;
    }

    /// Hold every update until the returned gate is notified
    pub fn gate_writes(&self) -> Arc<Notify> {
        Self::install_gate(&self.write_gate)
    }

    /// Hold every full read until the returned gate is notified.
    /// `list_calls` counts a held read as soon as it arrives.
    pub fn gate_lists(&self) -> Arc<Notify> {
        Self::install_gate(&self.list_gate)
    }

    /// Commit `row` during the next `subscribe`, before it is joined,
    /// so no event for it is ever pushed
    pub fn commit_on_subscribe(&self, row: WishItem) {
        self.lock().commit_on_subscribe.push(row);
    }

    /// Deliver an event to every live subscription
    pub fn push(&self, event: ChangeEvent) {
        let mut inner = self.lock();
        inner.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Drop all subscriptions as if the socket went away
    pub fn disconnect_all(&self) {
        self.lock().subscribers.clear();
    }

    pub fn live_subscribers(&self) -> usize {
        let mut inner = self.lock();
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.len()
    }

    pub fn subscribe_calls(&self) -> usize {
        self.lock().subscribe_calls
    }

    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    pub fn lookup_calls(&self) -> usize {
        self.lock().lookup_calls
    }

    pub fn stored(&self, id: WishId) -> Option<WishItem> {
        self.lock().rows.iter().find(|r| r.id == id).cloned()
    }

    fn joined(inner: &Inner, row: &WishItem) -> WishItem {
        WishItem {
            creator_email: inner.emails.get(&row.user_id).cloned(),
            ..row.clone()
        }
    }

    fn broadcast(inner: &mut Inner, event: ChangeEvent) {
        if inner.echo {
            inner.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }

    fn install_gate(slot: &Mutex<Option<Arc<Notify>>>) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *slot.lock().expect("gate poisoned") = Some(Arc::clone(&gate));
        gate
    }

    async fn pass_gate(slot: &Mutex<Option<Arc<Notify>>>) {
        let gate = slot.lock().expect("gate poisoned").clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl Repository<WishItem> for MemoryRemote {
    async fn list(&self) -> DomainResult<Vec<WishItem>> {
        self.lock().list_calls += 1;
        Self::pass_gate(&self.list_gate).await;
        let inner = self.lock();
        if inner.fail_list {
            return Err(DomainError::Transport("list unavailable".to_string()));
        }
        let mut rows: Vec<WishItem> = inner.rows.iter().map(|r| Self::joined(&inner, r)).collect();
        rows.sort_by(newest_first);
        Ok(rows)
    }

    async fn find_by_id(&self, id: WishId) -> DomainResult<Option<WishItem>> {
        let mut inner = self.lock();
        inner.lookup_calls += 1;
        if inner.lookup_failures > 0 {
            inner.lookup_failures -= 1;
            return Err(DomainError::Transport("lookup unavailable".to_string()));
        }
        Ok(inner
            .rows
            .iter()
            .find(|r| r.id == id)
            .map(|r| Self::joined(&inner, r)))
    }
}

#[async_trait]
impl OwnedRepository<WishItem> for MemoryRemote {
    type Draft = NewWish;
    type Patch = WishPatch;

    async fn create(&self, draft: &NewWish) -> DomainResult<WishItem> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(DomainError::Remote("insert rejected".to_string()));
        }
        let id = inner.next_id;
        inner.next_id += 1;
        let row = WishItem {
            completed: draft.completed,
            ..Self::row(id, &draft.text, &draft.user_id, id)
        };
        inner.rows.push(row.clone());
        Self::broadcast(&mut inner, ChangeEvent::Insert { id, row: Some(row.clone()) });
        Ok(row)
    }

    async fn update_owned(
        &self,
        id: WishId,
        owner_id: &str,
        patch: &WishPatch,
    ) -> DomainResult<WishItem> {
        Self::pass_gate(&self.write_gate).await;
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(DomainError::Remote("update rejected".to_string()));
        }
        let row = inner
            .rows
            .iter_mut()
            .find(|r| r.id == id && r.user_id == owner_id)
            .ok_or_else(|| DomainError::NotFound(format!("wish {} not found for this user", id)))?;
        row.apply_patch(patch);
        let row = row.clone();
        Self::broadcast(&mut inner, ChangeEvent::Update { id, patch: patch.clone() });
        Ok(row)
    }

    async fn delete_owned(&self, id: WishId, owner_id: &str) -> DomainResult<()> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(DomainError::Remote("delete rejected".to_string()));
        }
        let before = inner.rows.len();
        inner.rows.retain(|r| !(r.id == id && r.user_id == owner_id));
        if inner.rows.len() == before {
            return Err(DomainError::NotFound(format!("wish {} not found for this user", id)));
        }
        Self::broadcast(&mut inner, ChangeEvent::Delete { id });
        Ok(())
    }
}

#[async_trait]
impl ChangeFeed for MemoryRemote {
    async fn subscribe(&self) -> DomainResult<ChangeReceiver> {
        let mut inner = self.lock();
        inner.subscribe_calls += 1;
        if inner.fail_subscribe {
            return Err(DomainError::Transport("realtime unavailable".to_string()));
        }
        let late = std::mem::take(&mut inner.commit_on_subscribe);
        for row in late {
            inner.next_id = inner.next_id.max(row.id + 1);
            inner.rows.push(row);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        inner.subscribers.push(tx);
        Ok(rx)
    }
}
