//! Commands Layer
//!
//! Tauri command handlers that bridge frontend to backend services.

mod config_cmd;
mod log_cmd;
mod session_cmd;
mod wish_cmd;

pub use config_cmd::*;
pub use log_cmd::*;
pub use session_cmd::*;
pub use wish_cmd::*;
