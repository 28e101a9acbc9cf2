//! Tauri Commands for Diagnostics

const DEFAULT_LOG_LINES: usize = 200;

/// Most recent log lines, oldest first
#[tauri::command]
pub fn recent_logs(limit: Option<usize>) -> Vec<String> {
    rolling_logger::recent_lines(limit.unwrap_or(DEFAULT_LOG_LINES))
}
