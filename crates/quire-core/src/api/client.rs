//! HTTP client for the workspace REST API.
//!
//! Every request carries the configured bearer token. A `401` response is
//! published on [`SessionEvents`] before it is returned, so the session owner
//! hears about it no matter which caller tripped over it.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::models::{ChildId, ChildRecord, CreatePayload, ParentId, ParentRecord};
use crate::session::SessionEvents;
use crate::util::{compact_text, normalize_base_url};

use super::remote::{ChildRemote, ParentRemote};
use super::{ApiError, ApiResult};

/// HTTP client for the workspace API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
    session: SessionEvents,
}

impl ApiClient {
    /// Builds a client for an explicit API base URL.
    pub fn new(base_url: impl Into<String>, session: SessionEvents) -> ApiResult<Self> {
        Self::build(&base_url.into(), None, None, session)
    }

    /// Builds a client from validated client configuration.
    pub fn from_config(config: &ClientConfig, session: SessionEvents) -> ApiResult<Self> {
        Self::build(
            &config.api_base_url,
            config.api_token.clone(),
            Some(config.request_timeout()),
            session,
        )
    }

    fn build(
        base_url: &str,
        token: Option<String>,
        timeout: Option<Duration>,
        session: SessionEvents,
    ) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url).map_err(ApiError::InvalidConfiguration)?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            base_url,
            token: crate::util::normalize_text_option(token),
            client: builder.build()?,
            session,
        })
    }

    /// Returns a copy of this client that authenticates with `token`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = crate::util::normalize_text_option(Some(token.into()));
        self
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.session.expired();
            return Err(ApiError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message: parse_api_error(status, &body),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        Ok(self.send(request).await?.json::<T>().await?)
    }
}

impl<C: ChildRecord> ChildRemote<C> for ApiClient {
    async fn list_children(&self, parent_id: &ParentId) -> ApiResult<Vec<C>> {
        let url = children_url(
            &self.base_url,
            C::PARENT_COLLECTION,
            parent_id,
            C::SEGMENT,
        );
        tracing::debug!("GET {}", url);
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn create_child(&self, parent_id: &ParentId, draft: &C::Draft) -> ApiResult<C> {
        let url = children_url(
            &self.base_url,
            C::PARENT_COLLECTION,
            parent_id,
            C::SEGMENT,
        );
        tracing::debug!("POST {}", url);
        let request = match C::create_payload(draft) {
            CreatePayload::Json(body) => self.request(Method::POST, url).json(&body),
            CreatePayload::File {
                file_name,
                content_type,
                bytes,
            } => {
                let part = reqwest::multipart::Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(&content_type)?;
                let form = reqwest::multipart::Form::new().part("file", part);
                self.request(Method::POST, url).multipart(form)
            }
        };
        self.send_json(request).await
    }

    async fn update_child(
        &self,
        parent_id: &ParentId,
        id: &ChildId,
        patch: &C::Patch,
    ) -> ApiResult<C> {
        let url = child_url(
            &self.base_url,
            C::PARENT_COLLECTION,
            parent_id,
            C::SEGMENT,
            id,
        );
        tracing::debug!("PUT {}", url);
        self.send_json(self.request(Method::PUT, url).json(patch))
            .await
    }

    async fn delete_child(&self, parent_id: &ParentId, id: &ChildId) -> ApiResult<()> {
        let url = child_url(
            &self.base_url,
            C::PARENT_COLLECTION,
            parent_id,
            C::SEGMENT,
            id,
        );
        tracing::debug!("DELETE {}", url);
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

impl<P: ParentRecord> ParentRemote<P> for ApiClient {
    async fn list_parents(&self) -> ApiResult<Vec<P>> {
        let url = collection_url(&self.base_url, P::COLLECTION);
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn create_parent(&self, draft: &P::Draft) -> ApiResult<P> {
        let url = collection_url(&self.base_url, P::COLLECTION);
        self.send_json(self.request(Method::POST, url).json(draft))
            .await
    }

    async fn update_parent(&self, id: &ParentId, draft: &P::Draft) -> ApiResult<P> {
        let url = record_url(&self.base_url, P::COLLECTION, id);
        self.send_json(self.request(Method::PUT, url).json(draft))
            .await
    }

    async fn delete_parent(&self, id: &ParentId) -> ApiResult<()> {
        let url = record_url(&self.base_url, P::COLLECTION, id);
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

fn collection_url(base_url: &str, collection: &str) -> String {
    format!("{base_url}/{collection}")
}

fn record_url(base_url: &str, collection: &str, id: &ParentId) -> String {
    format!(
        "{base_url}/{collection}/{}",
        urlencoding::encode(id.as_str())
    )
}

fn children_url(base_url: &str, collection: &str, parent_id: &ParentId, segment: &str) -> String {
    format!("{}/{segment}", record_url(base_url, collection, parent_id))
}

fn child_url(
    base_url: &str,
    collection: &str,
    parent_id: &ParentId,
    segment: &str,
    id: &ChildId,
) -> String {
    format!(
        "{}/{}",
        children_url(base_url, collection, parent_id, segment),
        urlencoding::encode(id.as_str())
    )
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            let message = message.trim();
            if !message.is_empty() {
                return message.to_string();
            }
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        trimmed
    }
}
