//! Tauri Commands for Remote Configuration

use std::sync::Arc;

use tauri::{AppHandle, State};

use crate::config::{save_config, ConfigSource, ConfigStatus, RemoteConfig};
use crate::services::Services;
use crate::AppState;

#[tauri::command]
pub async fn get_config_status(state: State<'_, AppState>) -> Result<ConfigStatus, String> {
    Ok(state.config_status.lock().await.clone())
}

/// Validate, persist and switch to a new backend. Signs the user out.
#[tauri::command]
pub async fn save_remote_config(
    app: AppHandle,
    state: State<'_, AppState>,
    url: String,
    anon_key: String,
) -> Result<ConfigStatus, String> {
    let config = RemoteConfig::new(&url, &anon_key).map_err(|e| e.to_string())?;
    save_config(&state.data_dir, &config).map_err(|e| e.to_string())?;

    let mut services = state.services.lock().await;
    if let Some(previous) = services.take() {
        previous.shutdown().await;
    }

    let host = config.masked_url();
    let launched = Services::launch(config, &app);
    let status = match launched {
        Ok(next) => {
            *services = Some(Arc::new(next));
            log::info!("[CONFIG] switched backend to {}", host);
            ConfigStatus {
                source: ConfigSource::File,
                host: Some(host),
                error: None,
            }
        }
        Err(e) => {
            log::error!("[CONFIG] starting services failed: {}", e);
            ConfigStatus {
                source: ConfigSource::File,
                host: Some(host),
                error: Some(e.to_string()),
            }
        }
    };

    *state.config_status.lock().await = status.clone();
    Ok(status)
}
