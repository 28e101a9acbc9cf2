//! Application Context
//!
//! Shared state provided via Leptos Context API.

use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::models::MutationOutcome;
use crate::store::{store_dismiss_notice, store_show_notice, AppStore, NoticeKind};

const NOTICE_MILLIS: u32 = 4_000;

/// Which page the main column shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    List,
    SignIn,
    SignUp,
    Settings,
}

/// App-wide signals provided via context
#[derive(Clone, Copy)]
pub struct AppContext {
    /// Current page - read
    pub route: ReadSignal<Route>,
    /// Current page - write
    set_route: WriteSignal<Route>,
    store: AppStore,
}

impl AppContext {
    pub fn new(route: (ReadSignal<Route>, WriteSignal<Route>), store: AppStore) -> Self {
        Self {
            route: route.0,
            set_route: route.1,
            store,
        }
    }

    pub fn navigate(&self, route: Route) {
        self.set_route.set(route);
    }

    /// Show a banner that dismisses itself
    pub fn notify(&self, kind: NoticeKind, text: impl Into<String>) {
        let store = self.store;
        let id = store_show_notice(&store, kind, text);
        spawn_local(async move {
            TimeoutFuture::new(NOTICE_MILLIS).await;
            store_dismiss_notice(&store, id);
        });
    }

    pub fn notify_error(&self, text: impl Into<String>) {
        self.notify(NoticeKind::Error, text);
    }

    /// Surface failed mutations; applied and ignored ones are silent
    pub fn report(&self, action: &str, outcome: Result<MutationOutcome, String>) {
        match outcome {
            Ok(MutationOutcome::Failed(message)) | Err(message) => {
                web_sys::console::log_1(&format!("[APP] {} failed: {}", action, message).into());
                self.notify_error(format!("{}失败: {}", action, message));
            }
            Ok(_) => {}
        }
    }
}

pub fn use_app_context() -> AppContext {
    use_context::<AppContext>().expect("AppContext should be provided")
}
