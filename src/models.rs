//! Frontend Models
//!
//! Data structures matching backend DTOs.

use serde::{Deserialize, Serialize};

/// Wish row as pushed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wish {
    pub id: i64,
    pub text: String,
    pub completed: bool,
    pub user_id: String,
    #[serde(default)]
    pub creator_email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// A write for this row is still in flight
    #[serde(default)]
    pub pending: bool,
}

impl Wish {
    /// First letter of the creator's email for the avatar bubble
    pub fn initial(&self) -> String {
        self.creator_email
            .as_deref()
            .and_then(|email| email.chars().next())
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WishListSnapshot {
    pub items: Vec<Wish>,
    pub loading: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum MutationOutcome {
    Applied,
    Ignored,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignUpResult {
    SignedIn { identity: Identity },
    ConfirmationRequired { email: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigStatus {
    /// "file", "environment" or "none"
    pub source: String,
    pub host: Option<String>,
    pub error: Option<String>,
}

impl ConfigStatus {
    pub fn is_usable(&self) -> bool {
        self.source != "none" && self.error.is_none()
    }
}
