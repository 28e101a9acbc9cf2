//! Remove Wish Button Component
//!
//! Two-step removal for the owner's own wishes: 🗑, then "删除?" ✓/✗.
//! The removal waits for the server, so the row stays until it is confirmed.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::commands;
use crate::context::use_app_context;

#[component]
pub fn RemoveWishButton(
    wish_id: i64,
    /// Blocks removal while another write on the row is unresolved
    #[prop(into)] pending: Signal<bool>,
) -> impl IntoView {
    let ctx = use_app_context();
    let (asking, set_asking) = signal(false);
    let (removing, set_removing) = signal(false);

    let confirm = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        if removing.get_untracked() {
            return;
        }
        set_removing.set(true);
        spawn_local(async move {
            ctx.report("删除", commands::remove_wish(wish_id).await);
            // Still mounted only if the removal failed
            let _ = set_removing.try_set(false);
            let _ = set_asking.try_set(false);
        });
    };

    view! {
        <Show
            when=move || asking.get()
            fallback=move || view! {
                <button
                    class="delete-btn"
                    title="删除"
                    disabled=move || pending.get()
                    on:click=move |ev| {
                        ev.stop_propagation();
                        set_asking.set(true);
                    }
                >
                    "🗑"
                </button>
            }
        >
            <span class="delete-confirm">
                <span class="delete-confirm-text">
                    {move || if removing.get() { "删除中..." } else { "删除?" }}
                </span>
                <button class="confirm-btn" disabled=move || removing.get() on:click=confirm>"✓"</button>
                <button
                    class="cancel-btn"
                    disabled=move || removing.get()
                    on:click=move |ev| {
                        ev.stop_propagation();
                        set_asking.set(false);
                    }
                >
                    "✗"
                </button>
            </span>
        </Show>
    }
}
