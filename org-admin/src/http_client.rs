//! REST collaborator for the staging engine.
//!
//! Every resource lives at `{base_url}/{path}`: `POST` creates and answers
//! `{"id": ..}`, `PUT /{id}` updates, `DELETE /{id}` removes and `GET`
//! lists, optionally filtered by a scope query parameter.

use crate::config::ApiConfig;
use anyhow::Result;
use async_trait::async_trait;
use grid_staging::{Entity, RemoteCollection, RemoteError, RemoteErrorKind, ServerId};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::time::Duration;

/// An entity the REST API exposes as a collection.
pub trait Resource: Entity + Serialize + DeserializeOwned + 'static {
    const PATH: &'static str;
    /// Query parameter naming the master row for scoped listings.
    const SCOPE_PARAM: Option<&'static str> = None;
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
    auth_token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            auth_token: config.auth_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn collection<E: Resource>(&self) -> RestCollection<E> {
        RestCollection {
            api: self.clone(),
            _entity: PhantomData,
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        log::debug!("{method} {url}");
        let request = self.client.request(method, url);
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

pub struct RestCollection<E> {
    api: ApiClient,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Resource> RestCollection<E> {
    pub fn new(api: ApiClient) -> Self {
        api.collection()
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.api.base_url, E::PATH)
    }

    fn row_url(&self, id: &ServerId) -> String {
        format!("{}/{}/{}", self.api.base_url, E::PATH, id)
    }
}

// Backends disagree on whether ids are numbers or strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

impl From<WireId> for ServerId {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(id) => ServerId::new(id),
            WireId::Number(id) => ServerId::new(id.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct Created {
    id: WireId,
}

#[derive(Deserialize)]
#[serde(bound = "E: DeserializeOwned")]
struct Listed<E> {
    id: WireId,
    #[serde(flatten)]
    entity: E,
}

fn transport(error: reqwest::Error) -> RemoteError {
    RemoteError::transport(error.to_string())
}

fn status_kind(status: StatusCode) -> RemoteErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteErrorKind::Unauthorized,
        StatusCode::NOT_FOUND => RemoteErrorKind::NotFound,
        StatusCode::CONFLICT => RemoteErrorKind::Conflict,
        _ => RemoteErrorKind::Rejected,
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        format!("HTTP request failed with status: {status}")
    } else {
        format!("HTTP {status}: {}", body.trim())
    };
    log::error!("{message}");
    Err(RemoteError::new(status_kind(status), message))
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RemoteError> {
    response
        .json::<T>()
        .await
        .map_err(|e| RemoteError::transport(format!("Failed to parse response: {e}")))
}

#[async_trait]
impl<E: Resource> RemoteCollection<E> for RestCollection<E> {
    async fn create(&self, entity: &E) -> Result<ServerId, RemoteError> {
        let response = self
            .api
            .request(Method::POST, &self.collection_url())
            .json(entity)
            .send()
            .await
            .map_err(transport)?;
        let created: Created = read_json(check(response).await?).await?;
        Ok(created.id.into())
    }

    async fn update(&self, id: &ServerId, entity: &E) -> Result<(), RemoteError> {
        let response = self
            .api
            .request(Method::PUT, &self.row_url(id))
            .json(entity)
            .send()
            .await
            .map_err(transport)?;
        check(response).await?;
        Ok(())
    }

    async fn remove(&self, id: &ServerId) -> Result<(), RemoteError> {
        let response = self
            .api
            .request(Method::DELETE, &self.row_url(id))
            .send()
            .await
            .map_err(transport)?;
        check(response).await?;
        Ok(())
    }

    async fn list(&self, scope: Option<&ServerId>) -> Result<Vec<(ServerId, E)>, RemoteError> {
        let mut request = self.api.request(Method::GET, &self.collection_url());
        if let (Some(param), Some(scope)) = (E::SCOPE_PARAM, scope) {
            request = request.query(&[(param, scope.as_str())]);
        }
        let response = request.send().await.map_err(transport)?;
        let rows: Vec<Listed<E>> = read_json(check(response).await?).await?;
        log::info!("Fetched {} {} rows", rows.len(), E::KIND);
        Ok(rows.into_iter().map(|row| (row.id.into(), row.entity)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_error_kinds() {
        assert_eq!(status_kind(StatusCode::FORBIDDEN), RemoteErrorKind::Unauthorized);
        assert_eq!(status_kind(StatusCode::CONFLICT), RemoteErrorKind::Conflict);
        assert_eq!(status_kind(StatusCode::NOT_FOUND), RemoteErrorKind::NotFound);
        assert_eq!(status_kind(StatusCode::UNPROCESSABLE_ENTITY), RemoteErrorKind::Rejected);
        assert_eq!(status_kind(StatusCode::BAD_GATEWAY), RemoteErrorKind::Rejected);
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let api = ApiClient::new(&ApiConfig {
            base_url: "http://localhost:8080/api/".to_string(),
            ..ApiConfig::default()
        })
        .unwrap();
        let roles = api.collection::<crate::entities::Role>();
        assert_eq!(roles.collection_url(), "http://localhost:8080/api/roles");
        assert_eq!(roles.row_url(&ServerId::new("7")), "http://localhost:8080/api/roles/7");
    }
}
