//! Authentication Client
//!
//! Email/password sessions against the hosted auth service (GoTrue).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::supabase_repo::{build_http_client, check_status};
use crate::config::RemoteConfig;
use crate::domain::{DomainError, DomainResult, Identity, Session};

/// Result of a sign-up; projects with email confirmation return no session
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    SignedIn(Session),
    ConfirmationRequired,
}

#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    async fn sign_in(&self, email: &str, password: &str) -> DomainResult<Session>;

    async fn sign_up(&self, email: &str, password: &str) -> DomainResult<SignUpOutcome>;

    async fn sign_out(&self, session: &Session) -> DomainResult<()>;

    /// Trade the refresh token for a new session
    async fn refresh(&self, session: &Session) -> DomainResult<Session>;
}

#[derive(Deserialize)]
struct UserDto {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserDto> for Identity {
    fn from(user: UserDto) -> Self {
        Identity::new(user.id, user.email)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    user: UserDto,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        Session {
            identity: token.user.into(),
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
        }
    }
}

pub struct AuthClient {
    client: Client,
    config: RemoteConfig,
}

impl AuthClient {
    pub fn new(config: RemoteConfig) -> DomainResult<Self> {
        Ok(Self {
            client: build_http_client(&config)?,
            config,
        })
    }
}

#[async_trait]
impl Authenticator for AuthClient {
    async fn sign_in(&self, email: &str, password: &str) -> DomainResult<Session> {
        let response = self
            .client
            .post(self.config.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.config.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let token: TokenResponse = check_status(response).await?.json().await?;
        Ok(token.into())
    }

    async fn sign_up(&self, email: &str, password: &str) -> DomainResult<SignUpOutcome> {
        let response = self
            .client
            .post(self.config.auth_url("signup"))
            .header("apikey", &self.config.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body: serde_json::Value = check_status(response).await?.json().await?;
        parse_sign_up(body)
    }

    async fn sign_out(&self, session: &Session) -> DomainResult<()> {
        let response = self
            .client
            .post(self.config.auth_url("logout"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;
        // An expired token is as good as signed out
        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        check_status(response).await?;
        Ok(())
    }

    async fn refresh(&self, session: &Session) -> DomainResult<Session> {
        let refresh_token = session
            .refresh_token
            .as_deref()
            .ok_or_else(|| DomainError::Unauthorized("session has no refresh token".to_string()))?;
        let response = self
            .client
            .post(self.config.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.config.anon_key)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        let token: TokenResponse = check_status(response).await?.json().await?;
        Ok(token.into())
    }
}

/// Sign-up answers with a full token response when the session starts
/// immediately, or with the bare user when the email must be confirmed.
fn parse_sign_up(body: serde_json::Value) -> DomainResult<SignUpOutcome> {
    if body.get("access_token").is_some() {
        let token: TokenResponse =
            serde_json::from_value(body).map_err(|e| DomainError::Decode(e.to_string()))?;
        return Ok(SignUpOutcome::SignedIn(token.into()));
    }
    if body.get("id").is_some() || body.get("user").is_some() {
        return Ok(SignUpOutcome::ConfirmationRequired);
    }
    Err(DomainError::Decode(format!("unexpected sign-up response: {}", body)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_with_session() {
        let body = json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r",
            "user": { "id": "u1", "email": "a@x.io" }
        });
        match parse_sign_up(body).unwrap() {
            SignUpOutcome::SignedIn(session) => {
                assert_eq!(session.identity, Identity::new("u1", Some("a@x.io".to_string())));
                assert_eq!(session.access_token, "jwt");
                assert_eq!(session.refresh_token.as_deref(), Some("r"));
                assert_eq!(session.expires_in, Some(3600));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_is_unauthorized() {
        let config = RemoteConfig::new("https://proj.supabase.co", "anon").unwrap();
        let client = AuthClient::new(config).unwrap();
        let session = Session {
            identity: Identity::new("u1", None),
            access_token: "jwt".to_string(),
            refresh_token: None,
            expires_in: Some(3600),
        };
        assert!(matches!(
            client.refresh(&session).await,
            Err(DomainError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_sign_up_needing_confirmation() {
        let body = json!({ "id": "u1", "email": "a@x.io", "confirmation_sent_at": "2024-05-01T10:00:00Z" });
        assert_eq!(parse_sign_up(body).unwrap(), SignUpOutcome::ConfirmationRequired);
        assert!(parse_sign_up(json!({})).is_err());
    }
}
