//! Wish Pool Frontend App
//!
//! Main application component: header, banners and the routed main column.

use leptos::prelude::*;
use leptos::task::spawn_local;
use reactive_stores::Store;

use crate::commands;
use crate::components::{
    AuthForm, AuthMode, ConfigPanel, ConfigWarning, HeaderBar, NewWishForm, NoticeBanner, WishList,
};
use crate::context::{AppContext, Route};
use crate::store::{store_apply_snapshot, store_set_identity, AppState, AppStateStoreFields};

#[component]
pub fn App() -> impl IntoView {
    let store = Store::new(AppState::new());
    let (route, set_route) = signal(Route::List);

    // Provide context to all children
    provide_context(store);
    let ctx = AppContext::new((route, set_route), store);
    provide_context(ctx);

    // Backend pushes
    spawn_local(async move {
        let subscribed = commands::on_wishes_changed(move |snapshot| {
            store_apply_snapshot(&store, snapshot);
        })
        .await;
        if let Err(e) = subscribed {
            web_sys::console::error_1(&format!("[APP] listening for wishes failed: {}", e).into());
        }
    });
    spawn_local(async move {
        let subscribed = commands::on_session_changed(move |identity| {
            web_sys::console::log_1(&format!("[APP] session changed: {:?}", identity.as_ref().map(|i| &i.id)).into());
            store_set_identity(&store, identity);
        })
        .await;
        if let Err(e) = subscribed {
            web_sys::console::error_1(&format!("[APP] listening for session failed: {}", e).into());
        }
    });

    // Initial state
    spawn_local(async move {
        match commands::get_config_status().await {
            Ok(status) => store.config().set(Some(status)),
            Err(e) => web_sys::console::error_1(&format!("[APP] config status: {}", e).into()),
        }
        if let Ok(identity) = commands::current_identity().await {
            store_set_identity(&store, identity);
        }
        match commands::list_wishes().await {
            Ok(snapshot) => {
                web_sys::console::log_1(&format!("[APP] Loaded {} wishes", snapshot.items.len()).into());
                store_apply_snapshot(&store, snapshot);
            }
            Err(e) => {
                web_sys::console::log_1(&format!("[APP] Loading wishes failed: {}", e).into());
                store.loading().set(false);
            }
        }
    });

    // Leave the auth pages once a session exists
    Effect::new(move |_| {
        if store.identity().read().is_some()
            && matches!(route.get_untracked(), Route::SignIn | Route::SignUp)
        {
            ctx.navigate(Route::List);
        }
    });

    view! {
        <div class="app-layout">
            <HeaderBar />
            <NoticeBanner />
            <main class="main-content">
                {move || match route.get() {
                    Route::List => view! {
                        <ConfigWarning />
                        <Show when=move || store.identity().read().is_some()>
                            <NewWishForm />
                        </Show>
                        <WishList />
                        <p class="item-count">{move || format!("{} 个愿望", store.wishes().read().len())}</p>
                    }.into_any(),
                    Route::SignIn => view! { <AuthForm mode=AuthMode::SignIn /> }.into_any(),
                    Route::SignUp => view! { <AuthForm mode=AuthMode::SignUp /> }.into_any(),
                    Route::Settings => view! { <ConfigPanel /> }.into_any(),
                }}
            </main>
        </div>
    }
}
