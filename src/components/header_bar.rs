//! Header Bar Component
//!
//! Title, signed-in user and the session/settings controls.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::commands;
use crate::context::{use_app_context, Route};
use crate::store::{store_set_identity, use_app_store, AppStateStoreFields, NoticeKind};

#[component]
pub fn HeaderBar() -> impl IntoView {
    let store = use_app_store();
    let ctx = use_app_context();

    let email = move || {
        store
            .identity()
            .read()
            .as_ref()
            .map(|i| i.email.clone().unwrap_or_else(|| i.id.clone()))
    };

    let sign_out = move |_| {
        spawn_local(async move {
            match commands::sign_out().await {
                Ok(()) => {
                    store_set_identity(&store, None);
                    ctx.navigate(Route::List);
                }
                Err(e) => ctx.notify_error(format!("退出失败: {}", e)),
            }
        });
    };

    let refresh = move |_| {
        spawn_local(async move {
            if let Err(e) = commands::refresh_wishes().await {
                ctx.notify_error(format!("刷新失败: {}", e));
            }
        });
    };

    view! {
        <header class="header-bar">
            <h1 class="app-title" on:click=move |_| ctx.navigate(Route::List)>"✨ 愿望池"</h1>
            <div class="header-controls">
                {move || match email() {
                    Some(email) => view! {
                        <span class="user-email">{email}</span>
                        <button class="header-btn" on:click=sign_out>"退出"</button>
                    }.into_any(),
                    None => view! {
                        <button class="header-btn" on:click=move |_| ctx.navigate(Route::SignIn)>"登录"</button>
                        <button class="header-btn" on:click=move |_| ctx.navigate(Route::SignUp)>"注册"</button>
                    }.into_any(),
                }}
                <button class="header-btn icon" title="刷新" on:click=refresh>"⟳"</button>
                <button class="header-btn icon" title="设置" on:click=move |_| ctx.navigate(Route::Settings)>"⚙"</button>
            </div>
        </header>
    }
}

#[component]
pub fn NoticeBanner() -> impl IntoView {
    let store = use_app_store();

    view! {
        {move || store.notice().get().map(|notice| {
            let class = match notice.kind {
                NoticeKind::Info => "notice info",
                NoticeKind::Error => "notice error",
            };
            view! {
                <div class=class on:click=move |_| store.notice().set(None)>{notice.text}</div>
            }
        })}
    }
}
