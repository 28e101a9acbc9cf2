//! Global Application State Store
//!
//! Uses Leptos reactive_stores for fine-grained reactivity.

use leptos::prelude::*;
use reactive_stores::Store;

use crate::models::{ConfigStatus, Identity, Wish, WishListSnapshot};

/// A wish plus UI-only state
#[derive(Clone, Debug, PartialEq)]
pub struct WishView {
    pub wish: Wish,
    pub editing: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub id: u32,
    pub kind: NoticeKind,
    pub text: String,
}

/// Global application state with field-level reactivity
#[derive(Clone, Debug, Store)]
pub struct AppState {
    /// Wish list in display order
    pub wishes: Vec<WishView>,
    /// Initial fetch still running
    pub loading: bool,
    /// Signed-in user
    pub identity: Option<Identity>,
    /// Remote backend status (None until first loaded)
    pub config: Option<ConfigStatus>,
    /// Banner message
    pub notice: Option<Notice>,
    /// Last notice id handed out
    pub notice_seq: u32,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            wishes: Vec::new(),
            loading: true,
            identity: None,
            config: None,
            notice: None,
            notice_seq: 0,
        }
    }
}

/// Type alias for the store
pub type AppStore = Store<AppState>;

/// Get the app store from context
pub fn use_app_store() -> AppStore {
    expect_context::<AppStore>()
}

// ========================
// Store Helper Functions
// ========================

/// Replace the list with a backend snapshot, keeping edit mode for rows
/// that are still present
pub fn store_apply_snapshot(store: &AppStore, snapshot: WishListSnapshot) {
    let editing: Vec<i64> = store
        .wishes()
        .read_untracked()
        .iter()
        .filter(|view| view.editing)
        .map(|view| view.wish.id)
        .collect();
    let next: Vec<WishView> = snapshot
        .items
        .into_iter()
        .map(|wish| WishView {
            editing: editing.contains(&wish.id),
            wish,
        })
        .collect();
    store.wishes().set(next);
    store.loading().set(snapshot.loading);
}

/// Enter or leave edit mode for a wish
pub fn store_set_editing(store: &AppStore, wish_id: i64, editing: bool) {
    if let Some(view) = store.wishes().write().iter_mut().find(|view| view.wish.id == wish_id) {
        view.editing = editing;
    }
}

pub fn store_set_identity(store: &AppStore, identity: Option<Identity>) {
    let signed_out = identity.is_none();
    store.identity().set(identity);
    if signed_out {
        // Nothing is editable without an owner
        store.wishes().write().iter_mut().for_each(|view| view.editing = false);
    }
}

/// Show a banner; returns its id so the caller can dismiss exactly this one
pub fn store_show_notice(store: &AppStore, kind: NoticeKind, text: impl Into<String>) -> u32 {
    let id = store.notice_seq().get_untracked() + 1;
    store.notice_seq().set(id);
    store.notice().set(Some(Notice {
        id,
        kind,
        text: text.into(),
    }));
    id
}

pub fn store_dismiss_notice(store: &AppStore, notice_id: u32) {
    let current = store.notice().read_untracked().as_ref().map(|n| n.id);
    if current == Some(notice_id) {
        store.notice().set(None);
    }
}
