//! Remote Services
//!
//! Everything that exists only once a remote backend is configured: the
//! session provider, the synchronizer and the background tasks that keep
//! the session fresh and forward changes to the frontend.

use std::sync::Arc;

use tauri::async_runtime::JoinHandle;
use tauri::{AppHandle, Emitter};

use crate::config::RemoteConfig;
use crate::domain::{DomainResult, Identity};
use crate::repository::{AuthClient, RealtimeFeed, SupabaseRepository};
use crate::session::{follow_session, SessionProvider};
use crate::sync::{ListSynchronizer, WishListSnapshot};

pub const WISHES_CHANGED: &str = "wishes-changed";
pub const SESSION_CHANGED: &str = "session-changed";

pub type LiveSynchronizer = ListSynchronizer<SupabaseRepository, RealtimeFeed>;

pub struct Services {
    pub session: Arc<SessionProvider<AuthClient>>,
    pub synchronizer: Arc<LiveSynchronizer>,
    tasks: Vec<JoinHandle<()>>,
}

impl Services {
    /// Build the remote clients for `config` and start syncing
    pub fn launch(config: RemoteConfig, app: &AppHandle) -> DomainResult<Self> {
        log::info!("[SERVICES] connecting to {}", config.masked_url());

        let session = Arc::new(SessionProvider::new(AuthClient::new(config.clone())?));
        let repo = Arc::new(SupabaseRepository::new(config.clone(), session.watch())?);
        let feed = Arc::new(RealtimeFeed::new(config, session.watch()));
        let synchronizer = ListSynchronizer::new(repo, feed);

        let renew = tauri::async_runtime::spawn(Arc::clone(&session).keep_fresh());

        let follow = {
            let app = app.clone();
            tauri::async_runtime::spawn(follow_session(
                Arc::clone(&synchronizer),
                session.watch(),
                move |identity: Option<Identity>| {
                    if let Err(e) = app.emit(SESSION_CHANGED, identity) {
                        log::warn!("[SERVICES] emitting {} failed: {}", SESSION_CHANGED, e);
                    }
                },
            ))
        };

        let forward = {
            let app = app.clone();
            let mut snapshots = synchronizer.subscribe();
            tauri::async_runtime::spawn(async move {
                loop {
                    let snapshot = WishListSnapshot::from(&*snapshots.borrow_and_update());
                    if let Err(e) = app.emit(WISHES_CHANGED, snapshot) {
                        log::warn!("[SERVICES] emitting {} failed: {}", WISHES_CHANGED, e);
                    }
                    if snapshots.changed().await.is_err() {
                        break;
                    }
                }
            })
        };

        Ok(Self {
            session,
            synchronizer,
            tasks: vec![renew, follow, forward],
        })
    }

    pub async fn shutdown(&self) {
        for task in &self.tasks {
            task.abort();
        }
        self.synchronizer.stop().await;
        log::info!("[SERVICES] shut down");
    }
}
