//! Tauri Commands for the Wish List
//!
//! Exposes the synchronizer to the frontend via Tauri IPC. Mutations report
//! a `MutationOutcome`; the updated list itself arrives through the
//! `wishes-changed` event.

use tauri::State;

use crate::domain::WishId;
use crate::sync::{MutationOutcome, WishListSnapshot};
use crate::AppState;

/// Current list
#[tauri::command]
pub async fn list_wishes(state: State<'_, AppState>) -> Result<WishListSnapshot, String> {
    let services = state.services().await?;
    let list = services.synchronizer.snapshot();
    Ok(WishListSnapshot::from(&list))
}

/// Add a wish owned by the signed-in user
#[tauri::command]
pub async fn add_wish(state: State<'_, AppState>, text: String) -> Result<MutationOutcome, String> {
    let services = state.services().await?;
    Ok(services.synchronizer.add(&text).await)
}

/// Flip the completed flag
#[tauri::command]
pub async fn toggle_wish(state: State<'_, AppState>, id: WishId) -> Result<MutationOutcome, String> {
    let services = state.services().await?;
    Ok(services.synchronizer.toggle_completed(id).await)
}

#[tauri::command]
pub async fn remove_wish(state: State<'_, AppState>, id: WishId) -> Result<MutationOutcome, String> {
    let services = state.services().await?;
    Ok(services.synchronizer.remove(id).await)
}

#[tauri::command]
pub async fn edit_wish(
    state: State<'_, AppState>,
    id: WishId,
    text: String,
) -> Result<MutationOutcome, String> {
    let services = state.services().await?;
    Ok(services.synchronizer.edit_text(id, &text).await)
}

/// Re-run the full fetch
#[tauri::command]
pub async fn refresh_wishes(state: State<'_, AppState>) -> Result<(), String> {
    let services = state.services().await?;
    services.synchronizer.refresh().await;
    Ok(())
}
