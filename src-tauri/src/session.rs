//! Session Provider
//!
//! Holds the current session and publishes changes on a watch channel.
//! The remote clients read the access token from it, the synchronizer
//! restarts whenever the identity behind it changes. `keep_fresh` renews
//! the access token shortly before it expires.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

use crate::domain::{DomainError, DomainResult, Identity, Session};
use crate::repository::{Authenticator, ChangeFeed, SignUpOutcome, WishRepository};
use crate::sync::ListSynchronizer;

pub type SessionWatch = watch::Receiver<Option<Session>>;

const MIN_PASSWORD_LEN: usize = 6;
/// Renew this long before the access token expires
const REFRESH_MARGIN: Duration = Duration::from_secs(60);
const REFRESH_MIN_DELAY: Duration = Duration::from_secs(5);
/// Wait before retrying a refresh that failed in transit
const REFRESH_RETRY: Duration = Duration::from_secs(30);

/// What the sign-up form needs to know
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignUpResult {
    SignedIn { identity: Identity },
    ConfirmationRequired { email: String },
}

pub struct SessionProvider<A> {
    auth: A,
    current: watch::Sender<Option<Session>>,
}

impl<A: Authenticator> SessionProvider<A> {
    pub fn new(auth: A) -> Self {
        let (current, _) = watch::channel(None);
        Self { auth, current }
    }

    pub fn watch(&self) -> SessionWatch {
        self.current.subscribe()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.current.borrow().as_ref().map(|s| s.identity.clone())
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> DomainResult<Identity> {
        let email = validate_email(email)?;
        if password.is_empty() {
            return Err(DomainError::InvalidInput("password is required".to_string()));
        }
        let session = self.auth.sign_in(email, password).await?;
        let identity = session.identity.clone();
        log::info!("[SESSION] signed in as {}", identity.id);
        self.current.send_replace(Some(session));
        Ok(identity)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> DomainResult<SignUpResult> {
        let email = validate_email(email)?;
        if password != confirm_password {
            return Err(DomainError::InvalidInput("passwords do not match".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::InvalidInput(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        match self.auth.sign_up(email, password).await? {
            SignUpOutcome::SignedIn(session) => {
                let identity = session.identity.clone();
                log::info!("[SESSION] signed up and in as {}", identity.id);
                self.current.send_replace(Some(session));
                Ok(SignUpResult::SignedIn { identity })
            }
            SignUpOutcome::ConfirmationRequired => {
                log::info!("[SESSION] sign-up awaiting email confirmation");
                Ok(SignUpResult::ConfirmationRequired {
                    email: email.to_string(),
                })
            }
        }
    }

    /// Clears the local session even when the remote call fails
    pub async fn sign_out(&self) -> DomainResult<()> {
        let Some(previous) = self.current.send_replace(None) else {
            return Ok(());
        };
        log::info!("[SESSION] signed out {}", previous.identity.id);
        if let Err(e) = self.auth.sign_out(&previous).await {
            log::warn!("[SESSION] remote sign-out failed: {}", e);
        }
        Ok(())
    }

    /// Renew each session before its access token expires. Runs until the
    /// provider is dropped; spawn it once next to the provider.
    pub async fn keep_fresh(self: Arc<Self>) {
        let mut sessions = self.current.subscribe();
        loop {
            let session = sessions.borrow_and_update().clone();
            let Some(mut delay) = session.as_ref().and_then(refresh_delay) else {
                if sessions.changed().await.is_err() {
                    return;
                }
                continue;
            };

            loop {
                let due = tokio::select! {
                    changed = sessions.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        false
                    }
                    _ = tokio::time::sleep(delay) => true,
                };
                if !due {
                    break;
                }
                let Some(stale) = session.as_ref() else {
                    break;
                };
                match self.renew(stale).await {
                    Some(retry) => delay = retry,
                    None => break,
                }
            }
        }
    }

    /// Refresh `stale` and publish the result. Returns the retry delay when
    /// the refresh should be attempted again.
    async fn renew(&self, stale: &Session) -> Option<Duration> {
        match self.auth.refresh(stale).await {
            Ok(fresh) => {
                let replaced = self.replace_if_current(stale, Some(fresh));
                if replaced {
                    log::info!("[SESSION] refreshed token for {}", stale.identity.id);
                }
                None
            }
            Err(e @ (DomainError::Unauthorized(_) | DomainError::InvalidInput(_))) => {
                log::warn!("[SESSION] refresh rejected, signing out: {}", e);
                self.replace_if_current(stale, None);
                None
            }
            Err(e) => {
                log::warn!(
                    "[SESSION] refresh failed, retrying in {}s: {}",
                    REFRESH_RETRY.as_secs(),
                    e
                );
                Some(REFRESH_RETRY)
            }
        }
    }

    /// Swap in `next` unless the user signed in, out or was refreshed
    /// while the request was in flight
    fn replace_if_current(&self, stale: &Session, next: Option<Session>) -> bool {
        self.current.send_if_modified(|current| {
            let unchanged = current
                .as_ref()
                .is_some_and(|active| active.access_token == stale.access_token);
            if unchanged {
                *current = next;
            }
            unchanged
        })
    }
}

fn refresh_delay(session: &Session) -> Option<Duration> {
    session.refresh_token.as_ref()?;
    let lifetime = Duration::from_secs(session.expires_in?);
    Some(lifetime.saturating_sub(REFRESH_MARGIN).max(REFRESH_MIN_DELAY))
}

fn validate_email(email: &str) -> DomainResult<&str> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(DomainError::InvalidInput("a valid email is required".to_string()));
    }
    Ok(email)
}

/// Restart `synchronizer` for the current identity and again each time the
/// identity behind the session changes. Token-only refreshes are ignored.
/// Returns when the session channel closes.
pub async fn follow_session<R, F>(
    synchronizer: Arc<ListSynchronizer<R, F>>,
    mut sessions: SessionWatch,
    on_change: impl Fn(Option<Identity>) + Send,
) where
    R: WishRepository,
    F: ChangeFeed,
{
    let mut identity = sessions
        .borrow_and_update()
        .as_ref()
        .map(|s| s.identity.clone());
    synchronizer.start(identity.clone()).await;
    on_change(identity.clone());

    while sessions.changed().await.is_ok() {
        let next = sessions
            .borrow_and_update()
            .as_ref()
            .map(|s| s.identity.clone());
        if next == identity {
            continue;
        }
        identity = next;
        synchronizer.start(identity.clone()).await;
        on_change(identity.clone());
    }
    synchronizer.stop().await;
}
