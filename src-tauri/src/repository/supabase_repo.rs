//! Hosted Wish Repository
//!
//! PostgREST access to the `todos` table. Reads go through the
//! `todos_with_profiles` view so rows carry the creator's email.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::traits::{OwnedRepository, Repository};
use crate::config::RemoteConfig;
use crate::domain::{DomainError, DomainResult, NewWish, WishId, WishItem, WishPatch};
use crate::session::SessionWatch;

const TABLE: &str = "todos";
const READ_VIEW: &str = "todos_with_profiles";

impl From<reqwest::Error> for DomainError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            DomainError::Decode(e.to_string())
        } else {
            DomainError::Transport(e.to_string())
        }
    }
}

pub(crate) fn build_http_client(config: &RemoteConfig) -> DomainResult<Client> {
    Client::builder()
        .connect_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
        .build()
        .map_err(|e| DomainError::Internal(format!("http client: {}", e)))
}

/// Turn a non-success response into the matching `DomainError`
pub(crate) async fn check_status(response: Response) -> DomainResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| format!("{}: {}", status, body));
    Err(match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            DomainError::InvalidInput(message)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DomainError::Unauthorized(message),
        StatusCode::NOT_FOUND => DomainError::NotFound(message),
        _ => DomainError::Remote(message),
    })
}

/// PostgREST says `message`, GoTrue says `msg` or `error_description`
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

pub struct SupabaseRepository {
    client: Client,
    config: RemoteConfig,
    session: SessionWatch,
}

impl SupabaseRepository {
    pub fn new(config: RemoteConfig, session: SessionWatch) -> DomainResult<Self> {
        Ok(Self {
            client: build_http_client(&config)?,
            config,
            session,
        })
    }

    /// Session token when signed in, otherwise the anon key
    fn bearer(&self) -> String {
        self.session
            .borrow()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.config.anon_key.clone())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.config.rest_url(path))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(self.bearer())
    }

    async fn rows<T: DeserializeOwned>(request: RequestBuilder) -> DomainResult<Vec<T>> {
        let response = check_status(request.send().await?).await?;
        Ok(response.json::<Vec<T>>().await?)
    }
}

#[async_trait]
impl Repository<WishItem> for SupabaseRepository {
    async fn list(&self) -> DomainResult<Vec<WishItem>> {
        let request = self
            .request(Method::GET, READ_VIEW)
            .query(&[("select", "*"), ("order", "created_at.desc,id.desc")]);
        let items = Self::rows(request).await?;
        log::debug!("[REPO] fetched {} wishes", items.len());
        Ok(items)
    }

    async fn find_by_id(&self, id: WishId) -> DomainResult<Option<WishItem>> {
        let request = self.request(Method::GET, READ_VIEW).query(&[
            ("select", "*".to_string()),
            ("id", format!("eq.{}", id)),
            ("limit", "1".to_string()),
        ]);
        let rows: Vec<WishItem> = Self::rows(request).await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl OwnedRepository<WishItem> for SupabaseRepository {
    type Draft = NewWish;
    type Patch = WishPatch;

    async fn create(&self, draft: &NewWish) -> DomainResult<WishItem> {
        let request = self
            .request(Method::POST, TABLE)
            .header("Prefer", "return=representation")
            .json(&[draft]);
        let rows: Vec<WishItem> = Self::rows(request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DomainError::Remote("insert returned no row".to_string()))
    }

    async fn update_owned(
        &self,
        id: WishId,
        owner_id: &str,
        patch: &WishPatch,
    ) -> DomainResult<WishItem> {
        if patch.is_empty() {
            return Err(DomainError::InvalidInput("empty update".to_string()));
        }
        let request = self
            .request(Method::PATCH, TABLE)
            .query(&[("id", format!("eq.{}", id)), ("user_id", format!("eq.{}", owner_id))])
            .header("Prefer", "return=representation")
            .json(patch);
        let rows: Vec<WishItem> = Self::rows(request).await?;
        // Row-level security turns a foreign row into "zero rows updated"
        rows.into_iter()
            .next()
            .ok_or_else(|| DomainError::NotFound(format!("wish {} not found for this user", id)))
    }

    async fn delete_owned(&self, id: WishId, owner_id: &str) -> DomainResult<()> {
        let request = self
            .request(Method::DELETE, TABLE)
            .query(&[("id", format!("eq.{}", id)), ("user_id", format!("eq.{}", owner_id))])
            .header("Prefer", "return=representation");
        let rows: Vec<WishItem> = Self::rows(request).await?;
        if rows.is_empty() {
            return Err(DomainError::NotFound(format!(
                "wish {} not found for this user",
                id
            )));
        }
        Ok(())
    }
}
