//! Snapshot DTOs
//!
//! The serialized shape of the list pushed to the frontend.

use serde::Serialize;

use super::list::WishList;
use crate::domain::WishItem;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WishRow {
    #[serde(flatten)]
    pub item: WishItem,
    pub pending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WishListSnapshot {
    pub items: Vec<WishRow>,
    pub loading: bool,
}

impl From<&WishList> for WishListSnapshot {
    fn from(list: &WishList) -> Self {
        Self {
            items: list
                .entries()
                .iter()
                .map(|entry| WishRow {
                    item: entry.item.clone(),
                    pending: entry.is_pending(),
                })
                .collect(),
            loading: list.is_loading(),
        }
    }
}

/// Outcome of a user mutation. Failures are reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum MutationOutcome {
    Applied,
    /// Nothing to do: signed out, blank text, unknown id
    Ignored,
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::ListEvent;
    use serde_json::json;

    #[test]
    fn test_snapshot_flattens_rows() {
        let item = WishItem {
            id: 1,
            text: "A".to_string(),
            completed: false,
            user_id: "u1".to_string(),
            creator_email: None,
            created_at: None,
        };
        let list = WishList::new()
            .apply(ListEvent::Loaded(vec![item]))
            .apply(ListEvent::OptimisticToggle(1));
        let json = serde_json::to_value(WishListSnapshot::from(&list)).unwrap();
        assert_eq!(
            json,
            json!({
                "items": [{
                    "id": 1, "text": "A", "completed": true, "user_id": "u1",
                    "creator_email": null, "created_at": null, "pending": true
                }],
                "loading": false
            })
        );
    }

    #[test]
    fn test_outcome_wire_shape() {
        assert_eq!(
            serde_json::to_value(MutationOutcome::Applied).unwrap(),
            json!({ "status": "applied" })
        );
        assert_eq!(
            serde_json::to_value(MutationOutcome::Failed("boom".to_string())).unwrap(),
            json!({ "status": "failed", "message": "boom" })
        );
    }
}
