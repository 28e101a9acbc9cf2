//! Wish Commands
//!
//! Frontend bindings for the wish list.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use super::{call, listen_event};
use crate::models::{MutationOutcome, WishListSnapshot};

pub const WISHES_CHANGED: &str = "wishes-changed";

// ========================
// Argument Structs
// ========================

#[derive(Serialize)]
struct TextArgs<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct IdArgs {
    id: i64,
}

#[derive(Serialize)]
struct EditArgs<'a> {
    id: i64,
    text: &'a str,
}

// ========================
// Commands
// ========================

pub async fn list_wishes() -> Result<WishListSnapshot, String> {
    call("list_wishes", JsValue::NULL).await
}

pub async fn add_wish(text: &str) -> Result<MutationOutcome, String> {
    let js_args = serde_wasm_bindgen::to_value(&TextArgs { text }).map_err(|e| e.to_string())?;
    call("add_wish", js_args).await
}

pub async fn toggle_wish(id: i64) -> Result<MutationOutcome, String> {
    let js_args = serde_wasm_bindgen::to_value(&IdArgs { id }).map_err(|e| e.to_string())?;
    call("toggle_wish", js_args).await
}

pub async fn remove_wish(id: i64) -> Result<MutationOutcome, String> {
    let js_args = serde_wasm_bindgen::to_value(&IdArgs { id }).map_err(|e| e.to_string())?;
    call("remove_wish", js_args).await
}

pub async fn edit_wish(id: i64, text: &str) -> Result<MutationOutcome, String> {
    let js_args = serde_wasm_bindgen::to_value(&EditArgs { id, text }).map_err(|e| e.to_string())?;
    call("edit_wish", js_args).await
}

pub async fn refresh_wishes() -> Result<(), String> {
    call("refresh_wishes", JsValue::NULL).await
}

pub async fn on_wishes_changed(handler: impl FnMut(WishListSnapshot) + 'static) -> Result<(), String> {
    listen_event(WISHES_CHANGED, handler).await
}
