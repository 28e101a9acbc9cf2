//! Config Panel Component
//!
//! Remote backend settings, plus a recent-log viewer for diagnostics.
//! `ConfigWarning` is the banner shown on the list page when the backend
//! is missing or broken.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::commands;
use crate::context::{use_app_context, Route};
use crate::store::{use_app_store, AppStateStoreFields, NoticeKind};

const LOG_LINES: usize = 100;

#[component]
pub fn ConfigWarning() -> impl IntoView {
    let store = use_app_store();
    let ctx = use_app_context();

    let problem = move || {
        store.config().read().as_ref().and_then(|status| {
            if status.is_usable() {
                None
            } else {
                Some(
                    status
                        .error
                        .clone()
                        .unwrap_or_else(|| "尚未配置远程后端".to_string()),
                )
            }
        })
    };

    view! {
        {move || problem().map(|message| view! {
            <div class="config-warning">
                <span>{message}</span>
                <button class="link-btn" on:click=move |_| ctx.navigate(Route::Settings)>"去设置"</button>
            </div>
        })}
    }
}

#[component]
pub fn ConfigPanel() -> impl IntoView {
    let store = use_app_store();
    let ctx = use_app_context();

    let (url, set_url) = signal(String::new());
    let (anon_key, set_anon_key) = signal(String::new());
    let (saving, set_saving) = signal(false);
    let (logs, set_logs) = signal::<Option<Vec<String>>>(None);

    let current = move || {
        store
            .config()
            .read()
            .as_ref()
            .map(|status| match (&status.host, status.source.as_str()) {
                (Some(host), "environment") => format!("{}（环境变量）", host),
                (Some(host), _) => host.clone(),
                (None, _) => "未配置".to_string(),
            })
            .unwrap_or_else(|| "未配置".to_string())
    };

    let save = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if saving.get() {
            return;
        }
        set_saving.set(true);
        let (url, anon_key) = (url.get(), anon_key.get());

        spawn_local(async move {
            match commands::save_remote_config(&url, &anon_key).await {
                Ok(status) => {
                    let ok = status.is_usable();
                    store.config().set(Some(status));
                    if ok {
                        set_anon_key.set(String::new());
                        ctx.notify(NoticeKind::Info, "已保存，请重新登录");
                        ctx.navigate(Route::List);
                    }
                }
                Err(e) => ctx.notify_error(format!("保存失败: {}", e)),
            }
            set_saving.set(false);
        });
    };

    let load_logs = move |_| {
        spawn_local(async move {
            match commands::recent_logs(Some(LOG_LINES)).await {
                Ok(lines) => set_logs.set(Some(lines)),
                Err(e) => ctx.notify_error(format!("读取日志失败: {}", e)),
            }
        });
    };

    view! {
        <div class="config-panel">
            <h2>"设置"</h2>
            <p class="config-current">"当前后端: " {current}</p>
            <form class="config-form" on:submit=save>
                <label>
                    "项目 URL"
                    <input
                        type="url"
                        placeholder="https://xxxx.supabase.co"
                        required=true
                        prop:value=move || url.get()
                        on:input=move |ev| set_url.set(event_target_value(&ev))
                    />
                </label>
                <label>
                    "Anon Key"
                    <input
                        type="password"
                        required=true
                        prop:value=move || anon_key.get()
                        on:input=move |ev| set_anon_key.set(event_target_value(&ev))
                    />
                </label>
                <div class="form-actions">
                    <button type="submit" class="primary-btn" disabled=move || saving.get()>"保存"</button>
                    <button type="button" class="link-btn" on:click=move |_| ctx.navigate(Route::List)>"返回"</button>
                </div>
            </form>

            <div class="log-viewer">
                <button type="button" class="link-btn" on:click=load_logs>"查看最近日志"</button>
                {move || logs.get().map(|lines| view! {
                    <pre class="log-lines">{lines.join("\n")}</pre>
                })}
            </div>
        </div>
    }
}
