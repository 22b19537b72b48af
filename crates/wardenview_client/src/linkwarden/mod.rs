//! HTTP adapter for the Linkwarden REST API.

use crate::error::ClientError;
use crate::service::BookmarkService;
use crate::wire::{
    overlay_folder_update, Envelope, NewCollectionRequest, NewLinkRequest, RemoteCollection,
    RemoteLink, RemoteTag, UpdateLinkRequest,
};
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};
use wardenview_core::constants::MAX_LINK_PAGES;
use wardenview_core::models::{Folder, FolderId, Link, LinkDraft, Tag};
use wardenview_core::{ApiResult, Config, Credentials};

/// Client for one Linkwarden instance.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct LinkwardenClient {
    http: reqwest::Client,
    base: Arc<Url>,
    token: Arc<str>,
    log_payloads: bool,
}

impl std::fmt::Debug for LinkwardenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkwardenClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

/// Extract a human-readable message from an error response body.
///
/// Linkwarden wraps messages as `{"response": "..."}`; other servers in
/// front of it may use `{"error": "..."}` or plain text.
pub fn error_message_for_response(status: StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value
            .get("response")
            .or_else(|| value.get("error"))
            .and_then(Value::as_str)
        {
            return message.to_string();
        }
    }

    body.trim().to_string()
}

/// Log and convert an adapter outcome into the result contract.
fn finish<T>(action: &str, result: Result<T, ClientError>) -> ApiResult<T> {
    match result {
        Ok(data) => ApiResult::Success(data),
        Err(err) => {
            error!("Error trying to {}: {}", action, err);
            ApiResult::Failure(format!("Could not {}: {}", action, err))
        }
    }
}

impl LinkwardenClient {
    /// Build a client for `credentials` using timeouts from `config`.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidHost`] when the host is not an absolute
    /// http(s) URL, or [`ClientError::Transport`] if the HTTP client cannot be
    /// built.
    pub fn new(credentials: &Credentials, config: &Config) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Self::with_http(http, credentials, config.log_payloads)
    }

    /// Build a client around an existing `reqwest::Client`.
    pub fn with_http(
        http: reqwest::Client,
        credentials: &Credentials,
        log_payloads: bool,
    ) -> Result<Self, ClientError> {
        let base = Url::parse(&credentials.host).map_err(|err| ClientError::InvalidHost {
            host: credentials.host.clone(),
            reason: err.to_string(),
        })?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(ClientError::InvalidHost {
                host: credentials.host.clone(),
                reason: "expected an http(s) base URL".to_string(),
            });
        }
        Ok(Self {
            http,
            base: Arc::new(base),
            token: Arc::from(credentials.token.as_str()),
            log_payloads,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = (*self.base).clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidHost {
                    host: self.base.to_string(),
                    reason: "cannot be used as an API base".to_string(),
                })?;
            path.pop_if_empty();
            path.extend(["api", "v1"]);
            path.extend(segments);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url).bearer_auth(&*self.token)
    }

    fn with_body<B: Serialize>(&self, builder: RequestBuilder, label: &str, body: &B) -> RequestBuilder {
        if self.log_payloads {
            match serde_json::to_string(body) {
                Ok(encoded) => debug!("{}: {}", label, encoded),
                Err(err) => debug!("{}: <unencodable body: {}>", label, err),
            }
        }
        builder.json(body)
    }

    /// Send a request and unwrap the `response` envelope.
    ///
    /// Anything but `200 OK` is a failure, whatever the body looks like.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(ClientError::Status {
                status,
                message: error_message_for_response(status, &body),
            });
        }
        serde_json::from_str::<Envelope<T>>(&body)
            .map(|envelope| envelope.response)
            .map_err(|err| ClientError::Decode(err.to_string()))
    }

    async fn try_fetch_folders(&self) -> Result<Vec<Folder>, ClientError> {
        let url = self.endpoint(&["collections"])?;
        let remote: Vec<RemoteCollection> = self.send(self.request(Method::GET, url)).await?;
        let folders: Vec<Folder> = remote.into_iter().map(Folder::from).collect();
        debug!("Got {} folders", folders.len());
        Ok(folders)
    }

    /// The folder exactly as the server stores it.
    pub async fn fetch_folder_raw(&self, id: FolderId) -> Result<Value, ClientError> {
        let url = self.endpoint(&["collections", &id.to_string()])?;
        self.send(self.request(Method::GET, url)).await
    }

    async fn fetch_link_page(&self, folder_id: FolderId, cursor: i64) -> Result<Vec<Link>, ClientError> {
        let mut url = self.endpoint(&["links"])?;
        url.query_pairs_mut()
            .append_pair("collectionId", &folder_id.to_string())
            .append_pair("cursor", &cursor.to_string());
        let remote: Vec<RemoteLink> = self.send(self.request(Method::GET, url)).await?;
        Ok(remote.into_iter().map(Link::from).collect())
    }

    /// Follow cursor pagination until an empty page or the page cap.
    ///
    /// Pages are requested strictly in sequence since each cursor is the last
    /// id of the previous page.
    async fn try_fetch_links(&self, folder_id: FolderId) -> Result<Vec<Link>, ClientError> {
        let mut links: Vec<Link> = Vec::new();
        let mut cursor = 0;

        for _ in 0..MAX_LINK_PAGES {
            let page = self.fetch_link_page(folder_id, cursor).await?;
            let Some(last) = page.last() else {
                debug!("Got {} links for folder {}", links.len(), folder_id);
                return Ok(links);
            };
            cursor = last.id;
            links.extend(page);
        }

        warn!(
            "Stopped fetching links for folder {} after {} pages ({} links); results may be incomplete",
            folder_id,
            MAX_LINK_PAGES,
            links.len()
        );
        Ok(links)
    }

    async fn try_fetch_tags(&self) -> Result<Vec<Tag>, ClientError> {
        let url = self.endpoint(&["tags"])?;
        let remote: Vec<RemoteTag> = self.send(self.request(Method::GET, url)).await?;
        Ok(remote.into_iter().map(Tag::from).collect())
    }

    async fn try_save_link(&self, draft: &LinkDraft) -> Result<Value, ClientError> {
        let url = self.endpoint(&["links"])?;
        let body = NewLinkRequest::from_draft(draft);
        let builder = self.with_body(self.request(Method::POST, url), "saveLink", &body);
        self.send(builder).await
    }

    async fn try_update_link(&self, draft: &LinkDraft, owner_id: i64) -> Result<Value, ClientError> {
        let url = self.endpoint(&["links", &draft.id.to_string()])?;
        let body = UpdateLinkRequest::from_draft(draft, owner_id);
        let builder = self.with_body(self.request(Method::PUT, url), "updateLink", &body);
        self.send(builder).await
    }

    async fn try_delete(&self, resource: &str, id: i64) -> Result<Value, ClientError> {
        let url = self.endpoint(&[resource, &id.to_string()])?;
        self.send(self.request(Method::DELETE, url)).await
    }

    async fn try_create_folder(&self, name: &str, parent_id: FolderId) -> Result<Value, ClientError> {
        let url = self.endpoint(&["collections"])?;
        let body = NewCollectionRequest { name, parent_id };
        let builder = self.with_body(self.request(Method::POST, url), "createFolder", &body);
        self.send(builder).await
    }

    async fn try_update_folder(
        &self,
        id: FolderId,
        name: &str,
        parent_id: FolderId,
    ) -> Result<Value, ClientError> {
        let current = self.fetch_folder_raw(id).await?;
        let body = overlay_folder_update(current, id, name, parent_id)?;
        let url = self.endpoint(&["collections", &id.to_string()])?;
        let builder = self.with_body(self.request(Method::PUT, url), "updateFolder", &body);
        self.send(builder).await
    }
}

impl BookmarkService for LinkwardenClient {
    async fn fetch_folders(&self) -> ApiResult<Vec<Folder>> {
        finish("fetch folders", self.try_fetch_folders().await)
    }

    async fn fetch_links(&self, folder_id: FolderId) -> ApiResult<Vec<Link>> {
        finish("fetch links", self.try_fetch_links(folder_id).await)
    }

    async fn fetch_tags(&self) -> ApiResult<Vec<Tag>> {
        finish("fetch tags", self.try_fetch_tags().await)
    }

    async fn save_link(&self, draft: &LinkDraft) -> ApiResult<Value> {
        finish("save link", self.try_save_link(draft).await)
    }

    async fn update_link(&self, draft: &LinkDraft, collection_owner_id: i64) -> ApiResult<Value> {
        finish(
            "update link",
            self.try_update_link(draft, collection_owner_id).await,
        )
    }

    async fn delete_link(&self, id: i64) -> ApiResult<Value> {
        finish("delete link", self.try_delete("links", id).await)
    }

    async fn create_folder(&self, name: &str, parent_id: FolderId) -> ApiResult<Value> {
        finish("create folder", self.try_create_folder(name, parent_id).await)
    }

    async fn update_folder(&self, id: FolderId, name: &str, parent_id: FolderId) -> ApiResult<Value> {
        finish(
            "update folder",
            self.try_update_folder(id, name, parent_id).await,
        )
    }

    async fn delete_folder(&self, id: FolderId) -> ApiResult<Value> {
        finish("delete folder", self.try_delete("collections", id).await)
    }
}
