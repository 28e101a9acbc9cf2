//! Wish List Component
//!
//! Loading indicator, empty state and the rows, in backend order.

use leptos::prelude::*;

use crate::components::WishRow;
use crate::store::{use_app_store, AppStateStoreFields};

#[component]
pub fn WishList() -> impl IntoView {
    let store = use_app_store();

    let ids = move || {
        store
            .wishes()
            .read()
            .iter()
            .map(|view| view.wish.id)
            .collect::<Vec<_>>()
    };
    let is_empty = move || store.wishes().read().is_empty();

    view! {
        <div class="wish-list">
            <Show
                when=move || !store.loading().get()
                fallback=|| view! { <div class="list-placeholder">"加载中..."</div> }
            >
                <For
                    each=ids
                    key=|id| *id
                    children=move |id| view! { <WishRow wish_id=id /> }
                />
                <Show when=is_empty>
                    <div class="list-placeholder">
                        {move || if store.identity().read().is_some() {
                            "还没有愿望哦，快来添加第一个吧！✨"
                        } else {
                            "暂时没有愿望清单"
                        }}
                    </div>
                </Show>
            </Show>
        </div>
    }
}
