//! Wish Row Component
//!
//! One wish: completion toggle, text (or inline editor), creator badge and
//! owner-only edit/delete actions.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::commands;
use crate::components::RemoveWishButton;
use crate::context::use_app_context;
use crate::store::{store_set_editing, use_app_store, AppStateStoreFields};

#[component]
pub fn WishRow(wish_id: i64) -> impl IntoView {
    let store = use_app_store();
    let ctx = use_app_context();
    let input_ref = NodeRef::<leptos::html::Input>::new();

    let row = Memo::new(move |_| {
        store
            .wishes()
            .read()
            .iter()
            .find(|view| view.wish.id == wish_id)
            .cloned()
    });

    let text = move || row.get().map(|v| v.wish.text).unwrap_or_default();
    let completed = move || row.get().map(|v| v.wish.completed).unwrap_or(false);
    let pending = move || row.get().map(|v| v.wish.pending).unwrap_or(false);
    let editing = move || row.get().map(|v| v.editing).unwrap_or(false);
    let signed_in = move || store.identity().read().is_some();
    let is_owner = move || {
        let owner = row.get().map(|v| v.wish.user_id);
        let me = store.identity().read().as_ref().map(|i| i.id.clone());
        owner.is_some() && owner == me
    };

    // Focus the editor when it opens
    Effect::new(move |_| {
        if editing() {
            if let Some(input) = input_ref.get() {
                let _ = input.focus();
            }
        }
    });

    let toggle = move |_| {
        if !signed_in() {
            return;
        }
        spawn_local(async move {
            ctx.report("更新", commands::toggle_wish(wish_id).await);
        });
    };

    let commit_edit = move |value: String| {
        if !editing() {
            return;
        }
        store_set_editing(&store, wish_id, false);
        let value = value.trim().to_string();
        if value.is_empty() || value == text() {
            return;
        }
        spawn_local(async move {
            ctx.report("编辑", commands::edit_wish(wish_id, &value).await);
        });
    };

    let row_class = move || {
        let mut class = String::from("wish-row");
        if completed() {
            class.push_str(" completed");
        }
        if pending() {
            class.push_str(" pending");
        }
        class
    };

    view! {
        <div class=row_class>
            <button
                class="toggle-btn"
                title=move || if completed() { "标记为未完成" } else { "标记为完成" }
                disabled=move || !signed_in()
                on:click=toggle
            >
                {move || if completed() { "✔" } else { "○" }}
            </button>

            <Show
                when=editing
                fallback=move || view! { <span class="wish-text">{text}</span> }
            >
                <input
                    type="text"
                    class="wish-edit-input"
                    node_ref=input_ref
                    prop:value=text
                    on:blur=move |ev| commit_edit(event_target_value(&ev))
                    on:keydown=move |ev: web_sys::KeyboardEvent| {
                        match ev.key().as_str() {
                            "Enter" => commit_edit(event_target_value(&ev)),
                            "Escape" => store_set_editing(&store, wish_id, false),
                            _ => {}
                        }
                    }
                />
            </Show>

            <div class="creator">
                <span class="avatar">{move || row.get().map(|v| v.wish.initial()).unwrap_or_default()}</span>
                <Show
                    when=is_owner
                    fallback=move || view! {
                        <span class="creator-email">
                            {move || row.get().and_then(|v| v.wish.creator_email).unwrap_or_default()}
                        </span>
                    }
                >
                    <span class="mine-badge">"我的"</span>
                </Show>
            </div>

            <Show when=is_owner>
                <div class="row-actions">
                    <button
                        class="edit-btn"
                        title=move || if editing() { "保存" } else { "编辑" }
                        on:mousedown=move |ev| ev.prevent_default()
                        on:click=move |_| {
                            if editing() {
                                let value = input_ref
                                    .get_untracked()
                                    .map(|input| input.value())
                                    .unwrap_or_default();
                                commit_edit(value);
                            } else {
                                store_set_editing(&store, wish_id, true);
                            }
                        }
                    >
                        {move || if editing() { "💾" } else { "✎" }}
                    </button>
                    <RemoveWishButton wish_id=wish_id pending=Signal::derive(pending) />
                </div>
            </Show>
        </div>
    }
}
