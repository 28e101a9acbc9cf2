//! Wish List State
//!
//! The list the UI renders, as an immutable value. Every change goes through
//! [`WishList::apply`], which takes the current list and one event and returns
//! the next list. Entries stay unique by id and sorted newest first.

use im::Vector;

use crate::domain::{newest_first, WishId, WishItem, WishPatch};

/// Values to restore if an optimistic write is rejected
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    previous_text: String,
    previous_completed: bool,
    in_flight: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WishEntry {
    pub item: WishItem,
    pub pending: Option<PendingWrite>,
}

impl WishEntry {
    fn settled(item: WishItem) -> Self {
        Self {
            item,
            pending: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn begin_write(&mut self) {
        match &mut self.pending {
            Some(pending) => pending.in_flight += 1,
            None => {
                self.pending = Some(PendingWrite {
                    previous_text: self.item.text.clone(),
                    previous_completed: self.item.completed,
                    in_flight: 1,
                })
            }
        }
    }
}

/// Inputs to the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent {
    /// Drop everything and wait for a fresh load
    Reset,
    FetchStarted,
    Loaded(Vec<WishItem>),
    LoadFailed,
    /// New row, or a full replacement of a known one
    Inserted(WishItem),
    RemoteUpdated { id: WishId, patch: WishPatch },
    Removed(WishId),
    OptimisticToggle(WishId),
    OptimisticEdit { id: WishId, text: String },
    WriteConfirmed { id: WishId, row: WishItem },
    WriteRolledBack(WishId),
}

impl ListEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ListEvent::Reset => "reset",
            ListEvent::FetchStarted => "fetch-started",
            ListEvent::Loaded(_) => "loaded",
            ListEvent::LoadFailed => "load-failed",
            ListEvent::Inserted(_) => "inserted",
            ListEvent::RemoteUpdated { .. } => "remote-updated",
            ListEvent::Removed(_) => "removed",
            ListEvent::OptimisticToggle(_) => "optimistic-toggle",
            ListEvent::OptimisticEdit { .. } => "optimistic-edit",
            ListEvent::WriteConfirmed { .. } => "write-confirmed",
            ListEvent::WriteRolledBack(_) => "write-rolled-back",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WishList {
    entries: Vector<WishEntry>,
    loading: bool,
}

impl Default for WishList {
    fn default() -> Self {
        Self {
            entries: Vector::new(),
            loading: true,
        }
    }
}

impl WishList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &Vector<WishEntry> {
        &self.entries
    }

    pub fn items(&self) -> impl Iterator<Item = &WishItem> + '_ {
        self.entries.iter().map(|e| &e.item)
    }

    pub fn get(&self, id: WishId) -> Option<&WishEntry> {
        self.entries.iter().find(|e| e.item.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn position(&self, id: WishId) -> Option<usize> {
        self.entries.iter().position(|e| e.item.id == id)
    }

    fn insert_sorted(&mut self, entry: WishEntry) {
        let at = self
            .entries
            .binary_search_by(|other| newest_first(&other.item, &entry.item))
            .unwrap_or_else(|at| at);
        self.entries.insert(at, entry);
    }

    fn update_entry(&mut self, id: WishId, f: impl FnOnce(&mut WishEntry)) {
        if let Some(index) = self.position(id) {
            if let Some(entry) = self.entries.get_mut(index) {
                f(entry);
            }
        }
    }

    /// Reduce one event into the next list
    pub fn apply(mut self, event: ListEvent) -> Self {
        match event {
            ListEvent::Reset => return Self::new(),
            ListEvent::FetchStarted => self.loading = true,
            ListEvent::Loaded(items) => {
                let mut items = items;
                items.sort_by(newest_first);
                let mut entries: Vector<WishEntry> = Vector::new();
                for item in items {
                    if entries.iter().any(|e| e.item.id == item.id) {
                        continue;
                    }
                    entries.push_back(WishEntry::settled(item));
                }
                self.entries = entries;
                self.loading = false;
            }
            ListEvent::LoadFailed => self.loading = false,
            ListEvent::Inserted(item) => match self.position(item.id) {
                Some(index) => {
                    let mut entry = self.entries.remove(index);
                    entry.item.merge_from(item);
                    entry.pending = None;
                    self.insert_sorted(entry);
                }
                None => self.insert_sorted(WishEntry::settled(item)),
            },
            ListEvent::RemoteUpdated { id, patch } => self.update_entry(id, |entry| {
                entry.item.apply_patch(&patch);
                entry.pending = None;
            }),
            ListEvent::Removed(id) => {
                if let Some(index) = self.position(id) {
                    self.entries.remove(index);
                }
            }
            ListEvent::OptimisticToggle(id) => self.update_entry(id, |entry| {
                entry.begin_write();
                entry.item.completed = !entry.item.completed;
            }),
            ListEvent::OptimisticEdit { id, text } => self.update_entry(id, |entry| {
                entry.begin_write();
                entry.item.text = text;
            }),
            ListEvent::WriteConfirmed { id, row } => self.update_entry(id, |entry| {
                let Some(pending) = &mut entry.pending else {
                    return;
                };
                if pending.in_flight > 1 {
                    // Later writes are still out; the confirmed row is the new fallback
                    pending.in_flight -= 1;
                    pending.previous_text = row.text;
                    pending.previous_completed = row.completed;
                } else {
                    entry.pending = None;
                    entry.item.merge_from(row);
                }
            }),
            ListEvent::WriteRolledBack(id) => self.update_entry(id, |entry| {
                if let Some(pending) = entry.pending.take() {
                    entry.item.text = pending.previous_text;
                    entry.item.completed = pending.previous_completed;
                }
            }),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn wish(id: WishId, created_secs: i64) -> WishItem {
        WishItem {
            id,
            text: format!("wish {}", id),
            completed: false,
            user_id: "u1".to_string(),
            creator_email: Some("u1@example.com".to_string()),
            created_at: Utc.timestamp_opt(created_secs, 0).single(),
        }
    }

    fn ids(list: &WishList) -> Vec<WishId> {
        list.items().map(|w| w.id).collect()
    }

    fn loaded(items: Vec<WishItem>) -> WishList {
        WishList::new().apply(ListEvent::Loaded(items))
    }

    #[test]
    fn test_starts_loading_until_loaded() {
        let list = WishList::new();
        assert!(list.is_loading());
        assert!(list.is_empty());

        let list = list.apply(ListEvent::Loaded(vec![wish(1, 10)]));
        assert!(!list.is_loading());
        assert_eq!(list.len(), 1);

        let failed = WishList::new().apply(ListEvent::LoadFailed);
        assert!(!failed.is_loading());
        assert!(failed.is_empty());
    }

    #[test]
    fn test_loaded_sorts_and_dedupes() {
        let list = loaded(vec![wish(1, 10), wish(2, 30), wish(3, 20), wish(2, 30)]);
        assert_eq!(ids(&list), vec![2, 3, 1]);
    }

    #[test]
    fn test_insert_keeps_order_and_uniqueness() {
        let list = loaded(vec![wish(1, 10), wish(3, 30)]);
        let list = list.apply(ListEvent::Inserted(wish(2, 20)));
        assert_eq!(ids(&list), vec![3, 2, 1]);

        let list = list.apply(ListEvent::Inserted(wish(4, 40)));
        assert_eq!(ids(&list), vec![4, 3, 2, 1]);

        // Same id again replaces in place
        let mut again = wish(4, 40);
        again.text = "changed".to_string();
        again.creator_email = None;
        let list = list.apply(ListEvent::Inserted(again));
        assert_eq!(ids(&list), vec![4, 3, 2, 1]);
        let entry = list.get(4).unwrap();
        assert_eq!(entry.item.text, "changed");
        assert_eq!(entry.item.creator_email.as_deref(), Some("u1@example.com"));
    }

    #[test]
    fn test_same_timestamp_breaks_tie_by_id() {
        let list = loaded(vec![wish(1, 10)]).apply(ListEvent::Inserted(wish(2, 10)));
        assert_eq!(ids(&list), vec![2, 1]);
    }

    #[test]
    fn test_remote_update_is_idempotent() {
        let list = loaded(vec![wish(1, 10)]);
        let patch = WishPatch::completed(true);
        let once = list.apply(ListEvent::RemoteUpdated { id: 1, patch: patch.clone() });
        let twice = once.clone().apply(ListEvent::RemoteUpdated { id: 1, patch });
        assert!(once.get(1).unwrap().item.completed);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unknown_ids_are_no_ops() {
        let list = loaded(vec![wish(1, 10)]);
        let before = list.clone();
        let list = list
            .apply(ListEvent::RemoteUpdated { id: 9, patch: WishPatch::text("x") })
            .apply(ListEvent::Removed(9))
            .apply(ListEvent::OptimisticToggle(9))
            .apply(ListEvent::WriteRolledBack(9));
        assert_eq!(list, before);
    }

    #[test]
    fn test_remove_twice_is_no_op() {
        let list = loaded(vec![wish(1, 10), wish(2, 20)]);
        let once = list.apply(ListEvent::Removed(1));
        let twice = once.clone().apply(ListEvent::Removed(1));
        assert_eq!(ids(&once), vec![2]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_optimistic_toggle_then_rollback() {
        let list = loaded(vec![wish(1, 10)]).apply(ListEvent::OptimisticToggle(1));
        let entry = list.get(1).unwrap();
        assert!(entry.item.completed);
        assert!(entry.is_pending());

        let list = list.apply(ListEvent::WriteRolledBack(1));
        let entry = list.get(1).unwrap();
        assert!(!entry.item.completed);
        assert!(!entry.is_pending());
    }

    #[test]
    fn test_optimistic_edit_then_confirm() {
        let list = loaded(vec![wish(1, 10)]).apply(ListEvent::OptimisticEdit {
            id: 1,
            text: "new text".to_string(),
        });
        assert_eq!(list.get(1).unwrap().item.text, "new text");

        let mut row = wish(1, 10);
        row.text = "new text".to_string();
        row.creator_email = None;
        let list = list.apply(ListEvent::WriteConfirmed { id: 1, row });
        let entry = list.get(1).unwrap();
        assert!(!entry.is_pending());
        assert_eq!(entry.item.text, "new text");
        assert_eq!(entry.item.creator_email.as_deref(), Some("u1@example.com"));
    }

    #[test]
    fn test_rollback_after_remote_update_keeps_remote_state() {
        let list = loaded(vec![wish(1, 10)])
            .apply(ListEvent::OptimisticToggle(1))
            .apply(ListEvent::RemoteUpdated { id: 1, patch: WishPatch::completed(true) })
            .apply(ListEvent::WriteRolledBack(1));
        let entry = list.get(1).unwrap();
        assert!(entry.item.completed);
        assert!(!entry.is_pending());
    }

    #[test]
    fn test_overlapping_writes_roll_back_to_last_confirmed() {
        // toggle twice, first confirmed, second rejected
        let list = loaded(vec![wish(1, 10)])
            .apply(ListEvent::OptimisticToggle(1))
            .apply(ListEvent::OptimisticToggle(1));
        assert!(!list.get(1).unwrap().item.completed);

        let mut confirmed = wish(1, 10);
        confirmed.completed = true;
        let list = list
            .apply(ListEvent::WriteConfirmed { id: 1, row: confirmed })
            .apply(ListEvent::WriteRolledBack(1));
        let entry = list.get(1).unwrap();
        assert!(entry.item.completed);
        assert!(!entry.is_pending());
    }

    #[test]
    fn test_reload_replaces_entries() {
        let list = loaded(vec![wish(1, 10), wish(2, 20)])
            .apply(ListEvent::OptimisticToggle(1))
            .apply(ListEvent::FetchStarted);
        assert!(list.is_loading());
        let list = list.apply(ListEvent::Loaded(vec![wish(3, 30)]));
        assert_eq!(ids(&list), vec![3]);
        assert!(!list.entries().iter().any(WishEntry::is_pending));
    }

    #[test]
    fn test_failed_reload_keeps_entries() {
        let list = loaded(vec![wish(1, 10)])
            .apply(ListEvent::FetchStarted)
            .apply(ListEvent::LoadFailed);
        assert!(!list.is_loading());
        assert_eq!(ids(&list), vec![1]);
    }

    #[test]
    fn test_reset_then_failed_load_is_empty() {
        let list = loaded(vec![wish(1, 10)])
            .apply(ListEvent::OptimisticToggle(1))
            .apply(ListEvent::Reset);
        assert!(list.is_loading());
        assert!(list.is_empty());
        let list = list.apply(ListEvent::FetchStarted).apply(ListEvent::LoadFailed);
        assert!(!list.is_loading());
        assert!(list.is_empty());
    }
}
