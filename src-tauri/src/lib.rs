//! Wish Pool Backend
//!
//! Layered architecture:
//! - domain: Core entities and business rules
//! - repository: Remote data access (REST, realtime, auth)
//! - sync: Local list state and the synchronizer
//! - commands: Tauri command handlers

use std::path::PathBuf;
use std::sync::Arc;

use tauri::Manager;
use tokio::sync::Mutex;

mod commands;
mod config;
mod domain;
mod repository;
mod services;
mod session;
mod sync;

use config::{ConfigSource, ConfigStatus};
use services::Services;

/// Application state shared across commands
pub struct AppState {
    pub data_dir: PathBuf,
    /// `None` until a remote backend is configured
    pub services: Mutex<Option<Arc<Services>>>,
    pub config_status: Mutex<ConfigStatus>,
}

impl AppState {
    pub async fn services(&self) -> Result<Arc<Services>, String> {
        self.services
            .lock()
            .await
            .clone()
            .ok_or_else(|| "Remote backend is not configured".to_string())
    }
}

/// Resolve the remote config and start services when it is usable
fn start_services(app_handle: &tauri::AppHandle, data_dir: &std::path::Path) -> (Option<Services>, ConfigStatus) {
    let (loaded, source) = config::load_config(data_dir);
    match loaded {
        Ok(Some(remote)) => {
            let host = Some(remote.masked_url());
            match Services::launch(remote, app_handle) {
                Ok(services) => {
                    let _ = rolling_logger::info("Remote services started");
                    (Some(services), ConfigStatus { source, host, error: None })
                }
                Err(e) => {
                    let _ = rolling_logger::error(&format!("Starting remote services failed: {}", e));
                    (None, ConfigStatus { source, host, error: Some(e.to_string()) })
                }
            }
        }
        Ok(None) => {
            log::warn!("[APP] no remote backend configured");
            (None, ConfigStatus { source: ConfigSource::None, host: None, error: None })
        }
        Err(e) => {
            log::error!("[APP] remote config unusable: {}", e);
            (None, ConfigStatus { source, host: None, error: Some(e.to_string()) })
        }
    }
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .setup(|app| {
            // Single instance check - must be first!
            #[cfg(desktop)]
            app.handle().plugin(tauri_plugin_single_instance::init(|_app, _args, _cwd| {
                // Focus the existing window when a new instance tries to start
                if let Some(window) = _app.get_webview_window("main") {
                    let _ = window.set_focus();
                }
            }))?;

            let app_handle = app.handle().clone();

            // Initialize logging
            rolling_logger::init_logger(app_handle.path().app_log_dir()?, "WishPool")?;

            let data_dir = app_handle.path().app_data_dir()?;
            std::fs::create_dir_all(&data_dir)?;
            log::info!("[APP] data dir {}", data_dir.display());

            let (services, status) = start_services(&app_handle, &data_dir);

            app.manage(AppState {
                data_dir,
                services: Mutex::new(services.map(Arc::new)),
                config_status: Mutex::new(status),
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Wish list
            commands::list_wishes,
            commands::add_wish,
            commands::toggle_wish,
            commands::remove_wish,
            commands::edit_wish,
            commands::refresh_wishes,
            // Session
            commands::sign_in,
            commands::sign_up,
            commands::sign_out,
            commands::current_identity,
            // Configuration
            commands::get_config_status,
            commands::save_remote_config,
            // Diagnostics
            commands::recent_logs,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
