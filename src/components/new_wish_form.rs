//! New Wish Form Component
//!
//! Single-line form for adding a wish as the signed-in user.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::commands;
use crate::context::use_app_context;
use crate::models::MutationOutcome;

#[component]
pub fn NewWishForm() -> impl IntoView {
    let ctx = use_app_context();

    let (new_text, set_new_text) = signal(String::new());
    let (submitting, set_submitting) = signal(false);

    let add_wish = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let text = new_text.get();
        if text.trim().is_empty() || submitting.get() {
            return;
        }
        set_submitting.set(true);

        spawn_local(async move {
            let outcome = commands::add_wish(&text).await;
            if matches!(outcome, Ok(MutationOutcome::Applied)) {
                set_new_text.set(String::new());
            }
            ctx.report("添加", outcome);
            set_submitting.set(false);
        });
    };

    view! {
        <form class="new-wish-form" on:submit=add_wish>
            <input
                type="text"
                placeholder="添加新愿望..."
                prop:value=move || new_text.get()
                on:input=move |ev| set_new_text.set(event_target_value(&ev))
            />
            <button type="submit" disabled=move || submitting.get()>"＋ 添加"</button>
        </form>
    }
}
