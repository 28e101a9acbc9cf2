//! Tauri Command Wrappers
//!
//! Frontend bindings to backend commands, organized by domain.

mod config;
mod session;
mod wish;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "core"], catch)]
    async fn invoke(cmd: &str, args: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "event"], catch)]
    async fn listen(event: &str, handler: &Closure<dyn FnMut(JsValue)>) -> Result<JsValue, JsValue>;
}

// Re-export all public items
pub use config::*;
pub use session::*;
pub use wish::*;

fn js_error(e: JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{:?}", e))
}

/// Invoke `cmd` and decode its result. Backend `Err(String)` comes back as the error.
async fn call<T: DeserializeOwned>(cmd: &str, args: JsValue) -> Result<T, String> {
    let result = invoke(cmd, args).await.map_err(js_error)?;
    serde_wasm_bindgen::from_value(result).map_err(|e| e.to_string())
}

#[derive(Deserialize)]
struct TauriEvent<T> {
    payload: T,
}

/// Listen to a backend event for the lifetime of the app
pub async fn listen_event<T, F>(event: &'static str, mut on_payload: F) -> Result<(), String>
where
    T: DeserializeOwned + 'static,
    F: FnMut(T) + 'static,
{
    let handler = Closure::<dyn FnMut(JsValue)>::new(move |raw: JsValue| {
        match serde_wasm_bindgen::from_value::<TauriEvent<T>>(raw) {
            Ok(message) => on_payload(message.payload),
            Err(e) => web_sys::console::error_1(
                &format!("[EVENT] bad {} payload: {}", event, e).into(),
            ),
        }
    });
    listen(event, &handler).await.map_err(js_error)?;
    // The app never unlistens
    handler.forget();
    Ok(())
}
