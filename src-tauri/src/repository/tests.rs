//! Repository Integration Tests
//!
//! Exercises the repository contract against the in-memory remote.

#[cfg(test)]
mod tests {
    use crate::domain::{DomainError, Identity, NewWish, WishPatch};
    use crate::repository::memory::MemoryRemote;
    use crate::repository::{ChangeEvent, ChangeFeed, OwnedRepository, Repository};

    fn owner() -> Identity {
        Identity::new("u1", Some("u1@example.com".to_string()))
    }

    #[tokio::test]
    async fn test_create_and_find_by_id() {
        let repo = MemoryRemote::new();
        repo.set_email("u1", "u1@example.com");

        let draft = NewWish::for_owner("Find me", &owner()).unwrap();
        let created = repo.create(&draft).await.expect("Failed to create");
        assert!(created.id > 0);
        assert!(created.creator_email.is_none());

        let found = repo.find_by_id(created.id).await.expect("Find failed");
        let found = found.unwrap();
        assert_eq!(found.text, "Find me");
        assert_eq!(found.creator_email.as_deref(), Some("u1@example.com"));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let repo = MemoryRemote::new();
        repo.seed(vec![
            MemoryRemote::row(1, "old", "u1", 1),
            MemoryRemote::row(2, "new", "u2", 2),
        ]);

        let items = repo.list().await.expect("List failed");
        let ids: Vec<_> = items.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_owner_filter_on_writes() {
        let repo = MemoryRemote::new();
        repo.seed(vec![MemoryRemote::row(1, "theirs", "u2", 1)]);

        let err = repo
            .update_owned(1, "u1", &WishPatch::completed(true))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        assert!(!repo.stored(1).unwrap().completed);

        let err = repo.delete_owned(1, "u1").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        assert!(repo.stored(1).is_some());

        let updated = repo
            .update_owned(1, "u2", &WishPatch::text("mine now"))
            .await
            .unwrap();
        assert_eq!(updated.text, "mine now");
        repo.delete_owned(1, "u2").await.unwrap();
        assert!(repo.stored(1).is_none());
    }

    #[tokio::test]
    async fn test_echo_reaches_subscribers() {
        let repo = MemoryRemote::new();
        repo.set_echo(true);
        let mut rx = repo.subscribe().await.unwrap();

        let created = repo
            .create(&NewWish::for_owner("hello", &owner()).unwrap())
            .await
            .unwrap();
        match rx.recv().await.unwrap() {
            ChangeEvent::Insert { id, row } => {
                assert_eq!(id, created.id);
                assert_eq!(row.unwrap().text, "hello");
            }
            other => panic!("unexpected {:?}", other),
        }

        repo.delete_owned(created.id, "u1").await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), ChangeEvent::Delete { id: created.id });
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_not_live() {
        let repo = MemoryRemote::new();
        let rx = repo.subscribe().await.unwrap();
        assert_eq!(repo.live_subscribers(), 1);
        drop(rx);
        assert_eq!(repo.live_subscribers(), 0);
    }
}
