//! Configuration Commands

use serde::Serialize;
use wasm_bindgen::prelude::*;

use super::call;
use crate::models::ConfigStatus;

#[derive(Serialize)]
struct SaveConfigArgs<'a> {
    url: &'a str,
    #[serde(rename = "anonKey")]
    anon_key: &'a str,
}

#[derive(Serialize)]
struct LogArgs {
    limit: Option<usize>,
}

pub async fn get_config_status() -> Result<ConfigStatus, String> {
    call("get_config_status", JsValue::NULL).await
}

pub async fn save_remote_config(url: &str, anon_key: &str) -> Result<ConfigStatus, String> {
    let js_args = serde_wasm_bindgen::to_value(&SaveConfigArgs { url, anon_key })
        .map_err(|e| e.to_string())?;
    call("save_remote_config", js_args).await
}

pub async fn recent_logs(limit: Option<usize>) -> Result<Vec<String>, String> {
    let js_args = serde_wasm_bindgen::to_value(&LogArgs { limit }).map_err(|e| e.to_string())?;
    call("recent_logs", js_args).await
}
