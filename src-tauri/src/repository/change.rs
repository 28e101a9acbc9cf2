//! Change Events
//!
//! Row-level notifications from the push channel. Inserts carry the key and,
//! when the server sent it, the raw `todos` row (never the joined email).

use serde_json::Value;

use crate::domain::{DomainError, DomainResult, WishId, WishItem, WishPatch};

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    Insert { id: WishId, row: Option<WishItem> },
    Update { id: WishId, patch: WishPatch },
    Delete { id: WishId },
}

impl ChangeEvent {
    pub fn id(&self) -> WishId {
        match self {
            ChangeEvent::Insert { id, .. }
            | ChangeEvent::Update { id, .. }
            | ChangeEvent::Delete { id } => *id,
        }
    }

    /// Decode the `data` object of a `postgres_changes` message.
    ///
    /// Accepts the wire names (`type`, `record`, `old_record`) as well as the
    /// client-library names (`eventType`, `new`, `old`).
    pub fn from_postgres_change(data: &Value) -> DomainResult<Self> {
        let kind = data
            .get("type")
            .or_else(|| data.get("eventType"))
            .and_then(Value::as_str)
            .ok_or_else(|| DomainError::Decode("change without type".to_string()))?;
        let record = data.get("record").or_else(|| data.get("new"));
        let old_record = data.get("old_record").or_else(|| data.get("old"));

        match kind {
            "INSERT" => {
                let record = record
                    .ok_or_else(|| DomainError::Decode("INSERT without record".to_string()))?;
                let id = row_id(record)?;
                let row = serde_json::from_value::<WishItem>(record.clone()).ok();
                Ok(ChangeEvent::Insert { id, row })
            }
            "UPDATE" => {
                let record = record
                    .ok_or_else(|| DomainError::Decode("UPDATE without record".to_string()))?;
                let id = row_id(record)?;
                let patch = WishPatch {
                    text: record.get("text").and_then(Value::as_str).map(str::to_string),
                    completed: record.get("completed").and_then(Value::as_bool),
                };
                Ok(ChangeEvent::Update { id, patch })
            }
            "DELETE" => {
                let old = old_record
                    .ok_or_else(|| DomainError::Decode("DELETE without old_record".to_string()))?;
                Ok(ChangeEvent::Delete { id: row_id(old)? })
            }
            other => Err(DomainError::Decode(format!("unknown change type `{}`", other))),
        }
    }
}

fn row_id(record: &Value) -> DomainResult<WishId> {
    let id = record
        .get("id")
        .ok_or_else(|| DomainError::Decode(format!("row without id: {}", record)))?;
    // bigint columns can arrive as strings
    id.as_i64()
        .or_else(|| id.as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| DomainError::Decode(format!("bad row id: {}", id)))
}
