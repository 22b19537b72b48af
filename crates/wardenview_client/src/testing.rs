//! In-process stand-in for a Linkwarden server.
//!
//! Serves the subset of `/api/v1` the adapter uses over a real socket so the
//! full reqwest path is exercised. State is inspected and seeded through
//! [`MockRemote`] helpers.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use wardenview_core::constants::{LINK_PAGE_SIZE, UNORGANIZED_FOLDER_NAME};
use wardenview_core::Credentials;

/// Bearer token the mock accepts.
pub const MOCK_TOKEN: &str = "mock-token";

const CREATED_AT: &str = "2024-01-01T00:00:00.000Z";

/// A request as the mock saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct MockState {
    collections: Vec<Value>,
    links: Vec<Value>,
    tags: Vec<Value>,
    next_id: i64,
    fail_collections: bool,
    fail_links_for: HashSet<i64>,
    endless_links: bool,
    link_page_requests: HashMap<i64, usize>,
    requests: Vec<RecordedRequest>,
}

impl MockState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&mut self, method: Method, path: String, body: Option<Value>) {
        self.requests.push(RecordedRequest {
            method: method.to_string(),
            path,
            body,
        });
    }

    fn collection_summary(&self, id: i64) -> Value {
        let found = self.collections.iter().find(|c| c["id"] == id);
        json!({
            "id": id,
            "name": found.map(|c| c["name"].clone()).unwrap_or(Value::from("")),
            "ownerId": found.map(|c| c["ownerId"].clone()).unwrap_or(Value::from(1)),
        })
    }

    fn resolve_tags(&mut self, requested: &Value) -> Vec<Value> {
        let names: Vec<String> = requested
            .as_array()
            .map(|tags| {
                tags.iter()
                    .filter_map(|tag| tag["name"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        names
            .into_iter()
            .map(|name| {
                if let Some(existing) = self.tags.iter().find(|tag| tag["name"] == name.as_str()) {
                    return existing.clone();
                }
                let tag = json!({"id": self.allocate_id(), "name": name});
                self.tags.push(tag.clone());
                tag
            })
            .collect()
    }

    fn unorganized_id(&mut self) -> i64 {
        if let Some(existing) = self
            .collections
            .iter()
            .find(|c| c["name"] == UNORGANIZED_FOLDER_NAME)
        {
            return existing["id"].as_i64().unwrap_or_default();
        }
        let id = self.allocate_id();
        self.collections
            .push(collection_json(id, UNORGANIZED_FOLDER_NAME, None));
        id
    }

    fn descendants_of(&self, id: i64) -> HashSet<i64> {
        let mut found = HashSet::from([id]);
        loop {
            let before = found.len();
            for collection in &self.collections {
                let parent = collection["parentId"].as_i64();
                let child = collection["id"].as_i64();
                if let (Some(parent), Some(child)) = (parent, child) {
                    if found.contains(&parent) {
                        found.insert(child);
                    }
                }
            }
            if found.len() == before {
                return found;
            }
        }
    }
}

fn collection_json(id: i64, name: &str, parent: Option<i64>) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "",
        "color": "#0EA5E9",
        "icon": null,
        "iconWeight": null,
        "ownerId": 1,
        "parentId": parent,
        "isPublic": false,
        "createdAt": CREATED_AT,
        "members": []
    })
}

fn link_json(id: i64, name: &str, url: &str, collection: Value, tags: Vec<Value>) -> Value {
    json!({
        "id": id,
        "name": name,
        "type": "url",
        "url": url,
        "createdAt": CREATED_AT,
        "importDate": null,
        "tags": tags,
        "collection": collection
    })
}

type Shared = Arc<Mutex<MockState>>;
type Reply = (StatusCode, Json<Value>);

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn ok(value: Value) -> Reply {
    (StatusCode::OK, Json(json!({ "response": value })))
}

fn fail(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({ "response": message })))
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {}", MOCK_TOKEN))
}

fn unauthorized() -> Reply {
    fail(StatusCode::UNAUTHORIZED, "You must be logged in.")
}

async fn list_collections(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let mut state = lock(&state);
    state.record(Method::GET, "/api/v1/collections".to_string(), None);
    if !authorized(&headers) {
        return unauthorized();
    }
    if state.fail_collections {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Collections unavailable");
    }
    ok(Value::Array(state.collections.clone()))
}

async fn create_collection(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = lock(&state);
    state.record(
        Method::POST,
        "/api/v1/collections".to_string(),
        Some(body.clone()),
    );
    if !authorized(&headers) {
        return unauthorized();
    }
    let Some(name) = body["name"].as_str().filter(|name| !name.trim().is_empty()) else {
        return fail(StatusCode::BAD_REQUEST, "Please enter a valid collection.");
    };
    let parent = body["parentId"].as_i64().filter(|id| *id != 0);
    let id = state.allocate_id();
    let collection = collection_json(id, name, parent);
    state.collections.push(collection.clone());
    ok(collection)
}

async fn get_collection(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    let mut state = lock(&state);
    state.record(Method::GET, format!("/api/v1/collections/{}", id), None);
    if !authorized(&headers) {
        return unauthorized();
    }
    match state.collections.iter().find(|c| c["id"] == id) {
        Some(collection) => ok(collection.clone()),
        None => fail(StatusCode::NOT_FOUND, "Collection not found."),
    }
}

async fn update_collection(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = lock(&state);
    state.record(
        Method::PUT,
        format!("/api/v1/collections/{}", id),
        Some(body.clone()),
    );
    if !authorized(&headers) {
        return unauthorized();
    }
    let Value::Object(mut fields) = body else {
        return fail(StatusCode::BAD_REQUEST, "Invalid body.");
    };
    let parent = match fields.get("parentId") {
        Some(Value::String(sentinel)) if sentinel == "root" => Value::Null,
        Some(Value::Number(number)) => Value::Number(number.clone()),
        _ => return fail(StatusCode::BAD_REQUEST, "Invalid parent."),
    };
    fields.insert("parentId".to_string(), parent);
    let Some(slot) = state.collections.iter_mut().find(|c| c["id"] == id) else {
        return fail(StatusCode::NOT_FOUND, "Collection not found.");
    };
    *slot = Value::Object(fields);
    ok(slot.clone())
}

async fn delete_collection(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    let mut state = lock(&state);
    state.record(Method::DELETE, format!("/api/v1/collections/{}", id), None);
    if !authorized(&headers) {
        return unauthorized();
    }
    if !state.collections.iter().any(|c| c["id"] == id) {
        return fail(StatusCode::NOT_FOUND, "Collection not found.");
    }
    let doomed = state.descendants_of(id);
    let in_doomed = |value: &Value| value.as_i64().is_some_and(|id| doomed.contains(&id));
    state.collections.retain(|c| !in_doomed(&c["id"]));
    state.links.retain(|l| !in_doomed(&l["collection"]["id"]));
    ok(json!({ "id": id }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinksQuery {
    collection_id: i64,
    #[serde(default)]
    cursor: i64,
}

async fn list_links(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<LinksQuery>,
) -> Reply {
    let mut state = lock(&state);
    state.record(
        Method::GET,
        format!(
            "/api/v1/links?collectionId={}&cursor={}",
            query.collection_id, query.cursor
        ),
        None,
    );
    if !authorized(&headers) {
        return unauthorized();
    }
    *state
        .link_page_requests
        .entry(query.collection_id)
        .or_default() += 1;
    if state.fail_links_for.contains(&query.collection_id) {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Links unavailable");
    }

    let page_size = LINK_PAGE_SIZE as i64;
    if state.endless_links {
        let collection = state.collection_summary(query.collection_id);
        let page: Vec<Value> = (query.cursor + 1..=query.cursor + page_size)
            .map(|id| {
                link_json(
                    id,
                    &format!("Link {}", id),
                    &format!("https://endless.example/{}", id),
                    collection.clone(),
                    Vec::new(),
                )
            })
            .collect();
        return ok(Value::Array(page));
    }

    let mut matching: Vec<Value> = state
        .links
        .iter()
        .filter(|link| link["collection"]["id"] == query.collection_id)
        .filter(|link| link["id"].as_i64().is_some_and(|id| id > query.cursor))
        .cloned()
        .collect();
    matching.sort_by_key(|link| link["id"].as_i64());
    matching.truncate(LINK_PAGE_SIZE);
    ok(Value::Array(matching))
}

async fn create_link(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = lock(&state);
    state.record(Method::POST, "/api/v1/links".to_string(), Some(body.clone()));
    if !authorized(&headers) {
        return unauthorized();
    }
    let Some(url) = body["url"].as_str().filter(|url| !url.is_empty()) else {
        return fail(StatusCode::BAD_REQUEST, "Link URL is required.");
    };
    let url = url.to_string();
    let requested = body["collection"]["id"].as_i64().unwrap_or_default();
    let collection_id = if requested == 0 {
        state.unorganized_id()
    } else if state.collections.iter().any(|c| c["id"] == requested) {
        requested
    } else {
        return fail(StatusCode::NOT_FOUND, "Collection not found.");
    };
    let tags = state.resolve_tags(&body["tags"]);
    let collection = state.collection_summary(collection_id);
    let id = state.allocate_id();
    let name = body["name"].as_str().unwrap_or_default();
    let link = link_json(id, name, &url, collection, tags);
    state.links.push(link.clone());
    ok(link)
}

async fn update_link(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = lock(&state);
    state.record(
        Method::PUT,
        format!("/api/v1/links/{}", id),
        Some(body.clone()),
    );
    if !authorized(&headers) {
        return unauthorized();
    }
    if body["collection"]["ownerId"].as_i64().is_none() {
        return fail(StatusCode::BAD_REQUEST, "Collection owner is required.");
    }
    let collection_id = body["collection"]["id"].as_i64().unwrap_or_default();
    if !state.collections.iter().any(|c| c["id"] == collection_id) {
        return fail(StatusCode::NOT_FOUND, "Collection not found.");
    }
    let tags = state.resolve_tags(&body["tags"]);
    let collection = state.collection_summary(collection_id);
    let Some(link) = state.links.iter_mut().find(|l| l["id"] == id) else {
        return fail(StatusCode::NOT_FOUND, "Link not found.");
    };
    link["name"] = body["name"].clone();
    link["url"] = body["url"].clone();
    link["collection"] = collection;
    link["tags"] = Value::Array(tags);
    ok(link.clone())
}

async fn delete_link(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    let mut state = lock(&state);
    state.record(Method::DELETE, format!("/api/v1/links/{}", id), None);
    if !authorized(&headers) {
        return unauthorized();
    }
    let Some(index) = state.links.iter().position(|l| l["id"] == id) else {
        return fail(StatusCode::NOT_FOUND, "Link not found.");
    };
    ok(state.links.remove(index))
}

async fn list_tags(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let mut state = lock(&state);
    state.record(Method::GET, "/api/v1/tags".to_string(), None);
    if !authorized(&headers) {
        return unauthorized();
    }
    ok(Value::Array(state.tags.clone()))
}

fn router(state: Shared) -> Router {
    Router::new()
        .route(
            "/api/v1/collections",
            get(list_collections).post(create_collection),
        )
        .route(
            "/api/v1/collections/:id",
            get(get_collection)
                .put(update_collection)
                .delete(delete_collection),
        )
        .route("/api/v1/links", get(list_links).post(create_link))
        .route(
            "/api/v1/links/:id",
            axum::routing::put(update_link).delete(delete_link),
        )
        .route("/api/v1/tags", get(list_tags))
        .with_state(state)
}

/// A running mock server. Stops when dropped.
pub struct MockRemote {
    base_url: String,
    state: Shared,
    server: JoinHandle<()>,
}

impl MockRemote {
    /// Bind an ephemeral local port and start serving.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state: Shared = Arc::new(Mutex::new(MockState {
            next_id: 1_000,
            ..MockState::default()
        }));
        let app = router(Arc::clone(&state));
        let server = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                tracing::error!("mock remote stopped: {}", err);
            }
        });
        Ok(Self {
            base_url: format!("http://{}", addr),
            state,
            server,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Credentials that authenticate against this mock.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            host: self.base_url.clone(),
            token: MOCK_TOKEN.to_string(),
        }
    }

    pub fn add_folder(&self, id: i64, name: &str, parent: Option<i64>) {
        lock(&self.state)
            .collections
            .push(collection_json(id, name, parent));
    }

    /// Replace a folder's color as the server stores it.
    pub fn set_folder_color(&self, id: i64, color: &str) {
        let mut state = lock(&self.state);
        if let Some(collection) = state.collections.iter_mut().find(|c| c["id"] == id) {
            collection["color"] = Value::from(color);
        }
    }

    /// Add one link with explicit id, name, url and tag names.
    pub fn add_link(&self, folder_id: i64, id: i64, name: &str, url: &str, tags: &[&str]) {
        let mut state = lock(&self.state);
        let tags = state.resolve_tags(&json!(tags
            .iter()
            .map(|name| json!({ "name": name }))
            .collect::<Vec<_>>()));
        let collection = state.collection_summary(folder_id);
        state.links.push(link_json(id, name, url, collection, tags));
    }

    /// Add `count` generated links to `folder_id` with ids from `first_id`.
    pub fn add_links(&self, folder_id: i64, first_id: i64, count: usize) {
        for offset in 0..count as i64 {
            let id = first_id + offset;
            self.add_link(
                folder_id,
                id,
                &format!("Link {}", id),
                &format!("https://example.com/{}", id),
                &[],
            );
        }
    }

    pub fn add_tag(&self, id: i64, name: &str) {
        lock(&self.state)
            .tags
            .push(json!({ "id": id, "name": name }));
    }

    pub fn set_fail_collections(&self, fail: bool) {
        lock(&self.state).fail_collections = fail;
    }

    pub fn fail_links_for(&self, folder_id: i64) {
        lock(&self.state).fail_links_for.insert(folder_id);
    }

    /// Make every link page full so pagination never ends on its own.
    pub fn set_endless_links(&self, endless: bool) {
        lock(&self.state).endless_links = endless;
    }

    /// Link pages served for `folder_id` so far.
    pub fn link_page_requests(&self, folder_id: i64) -> usize {
        lock(&self.state)
            .link_page_requests
            .get(&folder_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn collection(&self, id: i64) -> Option<Value> {
        lock(&self.state)
            .collections
            .iter()
            .find(|c| c["id"] == id)
            .cloned()
    }

    pub fn links_in(&self, folder_id: i64) -> Vec<Value> {
        lock(&self.state)
            .links
            .iter()
            .filter(|l| l["collection"]["id"] == folder_id)
            .cloned()
            .collect()
    }

    pub fn tags(&self) -> Vec<Value> {
        lock(&self.state).tags.clone()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// Number of requests with `method` whose path starts with `prefix`.
    pub fn count_requests(&self, method: &str, prefix: &str) -> usize {
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| r.method == method && r.path.starts_with(prefix))
            .count()
    }

    /// Body of the most recent `method` request to exactly `path`.
    pub fn last_body(&self, method: &str, path: &str) -> Option<Value> {
        lock(&self.state)
            .requests
            .iter()
            .rev()
            .find(|r| r.method == method && r.path == path)
            .and_then(|r| r.body.clone())
    }
}

impl Drop for MockRemote {
    fn drop(&mut self) {
        self.server.abort();
    }
}
