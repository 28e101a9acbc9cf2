//! Auth Form Component
//!
//! Email/password sign-in and sign-up.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::commands;
use crate::context::{use_app_context, Route};
use crate::models::SignUpResult;
use crate::store::{store_set_identity, use_app_store, NoticeKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    SignUp,
}

#[component]
pub fn AuthForm(mode: AuthMode) -> impl IntoView {
    let store = use_app_store();
    let ctx = use_app_context();

    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (confirm, set_confirm) = signal(String::new());
    let (error, set_error) = signal::<Option<String>>(None);
    let (busy, set_busy) = signal(false);

    let submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let (email, password, confirm) = (email.get(), password.get(), confirm.get());
        if mode == AuthMode::SignUp && password != confirm {
            set_error.set(Some("两次输入的密码不一致".to_string()));
            return;
        }
        set_error.set(None);
        set_busy.set(true);

        spawn_local(async move {
            match mode {
                AuthMode::SignIn => match commands::sign_in(&email, &password).await {
                    Ok(identity) => {
                        store_set_identity(&store, Some(identity));
                        ctx.navigate(Route::List);
                    }
                    Err(e) => set_error.set(Some(e)),
                },
                AuthMode::SignUp => match commands::sign_up(&email, &password, &confirm).await {
                    Ok(SignUpResult::SignedIn { identity }) => {
                        store_set_identity(&store, Some(identity));
                        ctx.navigate(Route::List);
                    }
                    Ok(SignUpResult::ConfirmationRequired { email }) => {
                        ctx.notify(NoticeKind::Info, format!("确认邮件已发送至 {}，确认后即可登录", email));
                        ctx.navigate(Route::SignIn);
                    }
                    Err(e) => set_error.set(Some(e)),
                },
            }
            set_busy.set(false);
        });
    };

    let (title, action) = match mode {
        AuthMode::SignIn => ("登录", "登录"),
        AuthMode::SignUp => ("注册", "创建账号"),
    };

    view! {
        <form class="auth-form" on:submit=submit>
            <h2>{title}</h2>
            <label>
                "邮箱"
                <input
                    type="email"
                    required=true
                    prop:value=move || email.get()
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                />
            </label>
            <label>
                "密码"
                <input
                    type="password"
                    required=true
                    prop:value=move || password.get()
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                />
            </label>
            {(mode == AuthMode::SignUp).then(|| view! {
                <label>
                    "确认密码"
                    <input
                        type="password"
                        required=true
                        prop:value=move || confirm.get()
                        on:input=move |ev| set_confirm.set(event_target_value(&ev))
                    />
                </label>
            })}
            {move || error.get().map(|message| view! { <p class="form-error">{message}</p> })}
            <button type="submit" class="primary-btn" disabled=move || busy.get()>{action}</button>
            <p class="auth-switch">
                {match mode {
                    AuthMode::SignIn => view! {
                        "还没有账号？"
                        <a href="#" on:click=move |ev| { ev.prevent_default(); ctx.navigate(Route::SignUp); }>"注册"</a>
                    }.into_any(),
                    AuthMode::SignUp => view! {
                        "已有账号？"
                        <a href="#" on:click=move |ev| { ev.prevent_default(); ctx.navigate(Route::SignIn); }>"登录"</a>
                    }.into_any(),
                }}
            </p>
        </form>
    }
}
