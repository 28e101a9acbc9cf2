//! Wish Entity
//!
//! A row of the shared wish list. Only persisted fields live here; UI-only
//! state (editing) belongs to the frontend view-model and pending-write
//! bookkeeping belongs to the synchronizer.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{DomainError, DomainResult, Entity, Owned};
use super::identity::Identity;

pub type WishId = i64;

/// A wish as stored remotely (`todos` row, optionally joined with the
/// creator's email from `todos_with_profiles`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishItem {
    pub id: WishId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    /// Owner (creating user) ID
    pub user_id: String,
    /// Display only; absent on raw `todos` rows
    #[serde(default)]
    pub creator_email: Option<String>,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl WishItem {
    /// Apply changed fields; untouched fields keep their values
    pub fn apply_patch(&mut self, patch: &WishPatch) {
        if let Some(text) = &patch.text {
            self.text = text.clone();
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }

    /// Take the persisted fields of `newer` while keeping a known creator
    /// email when `newer` lacks one.
    pub fn merge_from(&mut self, newer: WishItem) {
        let email = newer.creator_email.or_else(|| self.creator_email.take());
        let created_at = newer.created_at.or(self.created_at);
        *self = WishItem {
            creator_email: email,
            created_at,
            ..newer
        };
    }
}

impl Entity for WishItem {
    type Id = WishId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Owned for WishItem {
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

/// List order: newest first, ties broken by higher id first. Rows with no
/// timestamp yet sort ahead of every dated row.
pub fn newest_first(a: &WishItem, b: &WishItem) -> Ordering {
    match (a.created_at, b.created_at) {
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (x, y) => y.cmp(&x).then_with(|| b.id.cmp(&a.id)),
    }
}

/// Insert payload for a new wish
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewWish {
    pub text: String,
    pub completed: bool,
    pub user_id: String,
    pub profile_id: String,
}

impl NewWish {
    /// Build an insert for `owner`, rejecting blank text
    pub fn for_owner(text: &str, owner: &Identity) -> DomainResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::InvalidInput("wish text is empty".to_string()));
        }
        Ok(Self {
            text: text.to_string(),
            completed: false,
            user_id: owner.id.clone(),
            profile_id: owner.id.clone(),
        })
    }
}

/// Changed fields of an update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WishPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl WishPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Default::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.completed.is_none()
    }
}

/// Timestamps arrive as RFC 3339 from the REST API but without an offset
/// from realtime payloads of `timestamp` columns; both are read as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        use serde::de::Error;

        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        parse(&raw).map(Some).ok_or_else(|| D::Error::custom(format!("bad timestamp `{raw}`")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        // Postgres may render `+00` rather than `+00:00`
        if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
            return Some(ts.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn wish(id: WishId, created_secs: Option<i64>) -> WishItem {
        WishItem {
            id,
            text: format!("wish {}", id),
            completed: false,
            user_id: "u1".to_string(),
            creator_email: None,
            created_at: created_secs.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
        }
    }

    #[test]
    fn test_new_wish_trims_and_rejects_blank() {
        let owner = Identity::new("u1", None);
        let draft = NewWish::for_owner("  make a wish ", &owner).unwrap();
        assert_eq!(draft.text, "make a wish");
        assert!(!draft.completed);
        assert_eq!(draft.user_id, "u1");
        assert_eq!(draft.profile_id, "u1");

        assert!(matches!(
            NewWish::for_owner("   ", &owner),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_newest_first_ordering() {
        let mut items = vec![wish(1, Some(100)), wish(3, Some(100)), wish(2, Some(200)), wish(4, None)];
        items.sort_by(newest_first);
        let ids: Vec<_> = items.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![4, 2, 3, 1]);
    }

    #[test]
    fn test_patch_and_merge() {
        let mut item = wish(1, Some(10));
        item.creator_email = Some("me@example.com".to_string());

        item.apply_patch(&WishPatch::completed(true));
        assert!(item.completed);
        assert_eq!(item.text, "wish 1");

        let mut newer = wish(1, None);
        newer.text = "renamed".to_string();
        item.merge_from(newer);
        assert_eq!(item.text, "renamed");
        assert_eq!(item.creator_email.as_deref(), Some("me@example.com"));
        assert!(item.created_at.is_some());
    }

    #[test]
    fn test_deserialize_rest_and_realtime_rows() {
        let rest: WishItem = serde_json::from_str(
            r#"{"id":7,"text":"A","completed":false,"user_id":"u1",
                "creator_email":"a@x.io","created_at":"2024-05-01T10:00:00.123+00:00"}"#,
        )
        .unwrap();
        assert_eq!(rest.creator_email.as_deref(), Some("a@x.io"));
        assert!(rest.created_at.is_some());

        let realtime: WishItem = serde_json::from_str(
            r#"{"id":8,"text":"B","completed":true,"user_id":"u2",
                "created_at":"2024-05-01T10:00:00.123456"}"#,
        )
        .unwrap();
        assert_eq!(realtime.creator_email, None);
        assert_eq!(realtime.created_at, timestamp::parse("2024-05-01T10:00:00.123456Z"));
    }

    #[test]
    fn test_patch_serializes_only_changed_fields() {
        let json = serde_json::to_value(WishPatch::text("hi")).unwrap();
        assert_eq!(json, serde_json::json!({ "text": "hi" }));
    }
}
