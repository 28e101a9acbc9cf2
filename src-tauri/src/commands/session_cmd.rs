//! Tauri Commands for Authentication

use tauri::State;

use crate::domain::Identity;
use crate::session::SignUpResult;
use crate::AppState;

#[tauri::command]
pub async fn sign_in(
    state: State<'_, AppState>,
    email: String,
    password: String,
) -> Result<Identity, String> {
    let services = state.services().await?;
    services
        .session
        .sign_in(&email, &password)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn sign_up(
    state: State<'_, AppState>,
    email: String,
    password: String,
    confirm_password: String,
) -> Result<SignUpResult, String> {
    let services = state.services().await?;
    services
        .session
        .sign_up(&email, &password, &confirm_password)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn sign_out(state: State<'_, AppState>) -> Result<(), String> {
    let services = state.services().await?;
    services.session.sign_out().await.map_err(|e| e.to_string())
}

/// Signed-in user, if any. Unconfigured backends have nobody signed in.
#[tauri::command]
pub async fn current_identity(state: State<'_, AppState>) -> Result<Option<Identity>, String> {
    let services = state.services.lock().await.clone();
    Ok(services.and_then(|s| s.session.identity()))
}
