//! Session Commands

use serde::Serialize;
use wasm_bindgen::prelude::*;

use super::{call, listen_event};
use crate::models::{Identity, SignUpResult};

pub const SESSION_CHANGED: &str = "session-changed";

#[derive(Serialize)]
struct SignInArgs<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpArgs<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(rename = "confirmPassword")]
    confirm_password: &'a str,
}

pub async fn sign_in(email: &str, password: &str) -> Result<Identity, String> {
    let js_args = serde_wasm_bindgen::to_value(&SignInArgs { email, password })
        .map_err(|e| e.to_string())?;
    call("sign_in", js_args).await
}

pub async fn sign_up(email: &str, password: &str, confirm_password: &str) -> Result<SignUpResult, String> {
    let js_args = serde_wasm_bindgen::to_value(&SignUpArgs {
        email,
        password,
        confirm_password,
    })
    .map_err(|e| e.to_string())?;
    call("sign_up", js_args).await
}

pub async fn sign_out() -> Result<(), String> {
    call("sign_out", JsValue::NULL).await
}

pub async fn current_identity() -> Result<Option<Identity>, String> {
    call("current_identity", JsValue::NULL).await
}

pub async fn on_session_changed(handler: impl FnMut(Option<Identity>) + 'static) -> Result<(), String> {
    listen_event(SESSION_CHANGED, handler).await
}
