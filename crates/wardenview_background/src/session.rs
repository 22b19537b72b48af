//! UI-side controller over the background worker and the cache.
//!
//! A [`ViewSession`] holds what a popup or terminal view shows: the cached
//! tree, open folders, tags and preferences. Remote work goes through the
//! [`BackgroundHandle`]; results are written back to the cache here, on the UI
//! side, so the worker stays stateless apart from credentials.

use crate::protocol::{Request, Response, UNCONFIGURED_MESSAGE};
use crate::scheduler::{needs_refresh, now_ms, Refresh};
use crate::worker::{BackgroundHandle, ChannelError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};
use wardenview_core::folder_ops::{self, FolderChoice};
use wardenview_core::models::{Folder, FolderId, Link, LinkDraft, LinksByFolder, SortOrder, Tag};
use wardenview_core::view::{filter_tag_names, merge_new_tags, search_links, sort_folders, sort_links};
use wardenview_core::{ApiResult, AppError, Cache, Config, KeyValueStore, UNORGANIZED_FOLDER_NAME};

/// Display preferences persisted alongside the cached tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub sort_links: SortOrder,
    pub sort_folders: SortOrder,
    pub open_new_tab: bool,
}

/// Everything a view renders.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub configured: bool,
    pub folders: Vec<Folder>,
    pub links_by_folder: LinksByFolder,
    pub tags: Vec<Tag>,
    pub open_folders: BTreeSet<FolderId>,
    pub preferences: Preferences,
    pub last_update: Option<i64>,
    /// Last failure shown to the user, cleared by the next full refresh.
    pub status: Option<String>,
}

/// One row of the folder tree, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderView {
    pub folder: Folder,
    pub depth: usize,
    pub is_open: bool,
    /// Cached links in this folder, whether or not it is open.
    pub link_count: usize,
    /// Sorted links; empty unless the folder is open.
    pub links: Vec<Link>,
}

pub struct ViewSession<S> {
    background: BackgroundHandle,
    cache: Cache<S>,
    refresh_interval_ms: u64,
    state: Arc<Mutex<ViewState>>,
}

impl<S> Clone for ViewSession<S> {
    fn clone(&self) -> Self {
        Self {
            background: self.background.clone(),
            cache: self.cache.clone(),
            refresh_interval_ms: self.refresh_interval_ms,
            state: Arc::clone(&self.state),
        }
    }
}

fn push_folder(
    state: &ViewState,
    folder: Folder,
    depth: usize,
    visited: &mut HashSet<FolderId>,
    out: &mut Vec<FolderView>,
) {
    if !visited.insert(folder.id) {
        return;
    }
    let is_open = state.open_folders.contains(&folder.id);
    let cached = state.links_by_folder.get(&folder.id);
    let link_count = cached.map_or(0, Vec::len);
    let mut links = if is_open {
        cached.cloned().unwrap_or_default()
    } else {
        Vec::new()
    };
    sort_links(&mut links, state.preferences.sort_links);

    let mut children: Vec<Folder> = if is_open {
        folder_ops::subfolders(&state.folders, folder.id)
            .into_iter()
            .cloned()
            .collect()
    } else {
        Vec::new()
    };
    sort_folders(&mut children, state.preferences.sort_folders);

    out.push(FolderView {
        folder,
        depth,
        is_open,
        link_count,
        links,
    });
    for child in children {
        push_folder(state, child, depth + 1, visited, out);
    }
}

impl<S: KeyValueStore + 'static> ViewSession<S> {
    pub fn new(background: BackgroundHandle, cache: Cache<S>, config: &Config) -> Self {
        Self {
            background,
            cache,
            refresh_interval_ms: config.refresh_interval_ms,
            state: Arc::new(Mutex::new(ViewState::default())),
        }
    }

    pub fn cache(&self) -> &Cache<S> {
        &self.cache
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ViewState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// A copy of the current view state.
    pub fn state(&self) -> ViewState {
        self.with_state(|state| state.clone())
    }

    pub fn status(&self) -> Option<String> {
        self.with_state(|state| state.status.clone())
    }

    fn fail<T>(&self, message: String) -> ApiResult<T> {
        warn!("{}", message);
        self.with_state(|state| state.status = Some(message.clone()));
        ApiResult::Failure(message)
    }

    fn persist(&self, key: &str, result: Result<(), AppError>) {
        if let Err(err) = result {
            warn!("Could not cache {}: {}", key, err);
        }
    }

    async fn call<T>(&self, request: Request, extract: fn(Response) -> ApiResult<T>) -> ApiResult<T> {
        match self.background.request(request).await {
            Ok(response) => extract(response),
            Err(err) => ApiResult::failure(err),
        }
    }

    async fn mutate(&self, request: Request) -> ApiResult<()> {
        match self.call(request, Response::into_mutation).await {
            ApiResult::Success(_) => ApiResult::Success(()),
            ApiResult::Failure(message) => self.fail(message),
        }
    }

    /// Populate the view from the cache.
    ///
    /// Cached links, folders and `lastUpdate` are read strictly in that order.
    ///
    /// # Returns
    /// Whether the cached tree is stale and a full refresh should follow.
    /// Always `false` while unconfigured.
    pub async fn initial_load(&self) -> Result<bool, ChannelError> {
        let configured = self
            .background
            .request(Request::HasValidConfiguration)
            .await?
            .flag()
            .unwrap_or(false);
        let preferences = Preferences {
            sort_links: self.cache.sort_links().await,
            sort_folders: self.cache.sort_folders().await,
            open_new_tab: self.cache.open_new_tab().await,
        };
        let open_folders = self.cache.open_folders().await;
        let links = self.cache.links_by_folder().await;
        let folders = self.cache.all_folders().await;
        let last_update = self.cache.last_update().await;

        self.with_state(|state| {
            state.configured = configured;
            state.preferences = preferences;
            state.open_folders = open_folders;
            state.links_by_folder = links.unwrap_or_default();
            state.folders = folders.unwrap_or_default();
            state.last_update = last_update;
            state.status = (!configured).then(|| UNCONFIGURED_MESSAGE.to_string());
        });

        Ok(configured && needs_refresh(last_update, now_ms(), self.refresh_interval_ms))
    }

    /// Full refresh: every folder's links, then the folder list.
    ///
    /// Each half replaces state and cache only when it succeeds, so a failure
    /// leaves the previous tree on screen.
    pub async fn load_all_links(&self) -> ApiResult<()> {
        let links = match self
            .call(
                Request::FetchAllLinksFromAllFolders,
                Response::into_links_by_folder,
            )
            .await
        {
            ApiResult::Success(links) => links,
            ApiResult::Failure(message) => return self.fail(message),
        };
        self.with_state(|state| state.links_by_folder = links.clone());
        self.persist("linksByFolder", self.cache.set_links_by_folder(&links).await);
        match self.cache.record_refresh(now_ms()).await {
            Ok(stamp) => self.with_state(|state| state.last_update = Some(stamp)),
            Err(err) => warn!("Could not record refresh time: {}", err),
        }

        let folders = match self.call(Request::FetchFolders, Response::into_folders).await {
            ApiResult::Success(folders) => folders,
            ApiResult::Failure(message) => return self.fail(message),
        };
        self.with_state(|state| {
            state.folders = folders.clone();
            state.status = None;
        });
        self.persist("allFolders", self.cache.set_all_folders(&folders).await);
        info!(
            "Loaded {} folders, {} links",
            folders.len(),
            links.values().map(Vec::len).sum::<usize>()
        );
        ApiResult::Success(())
    }

    /// Reload one folder's links without touching the rest of the tree.
    pub async fn load_links_for_folder(&self, folder_id: FolderId) -> ApiResult<()> {
        let links = match self
            .call(
                Request::FetchLinks {
                    collection_id: folder_id,
                },
                Response::into_links,
            )
            .await
        {
            ApiResult::Success(links) => links,
            ApiResult::Failure(message) => return self.fail(message),
        };
        let map = self.with_state(|state| {
            state.links_by_folder.insert(folder_id, links);
            state.links_by_folder.clone()
        });
        self.persist("linksByFolder", self.cache.set_links_by_folder(&map).await);
        ApiResult::Success(())
    }

    /// Open or close a folder; opening also reloads its links.
    ///
    /// # Returns
    /// Whether the folder is now open.
    pub async fn toggle_folder(&self, folder_id: FolderId) -> ApiResult<bool> {
        let (now_open, open) = self.with_state(|state| {
            let now_open = if state.open_folders.remove(&folder_id) {
                false
            } else {
                state.open_folders.insert(folder_id);
                true
            };
            (now_open, state.open_folders.clone())
        });
        self.persist("openFolders", self.cache.set_open_folders(&open).await);

        if now_open {
            if let ApiResult::Failure(message) = self.load_links_for_folder(folder_id).await {
                return ApiResult::Failure(message);
            }
        }
        ApiResult::Success(now_open)
    }

    /// A draft for `url`, filed under `Unorganized` when that folder exists.
    pub fn new_link_draft(&self, url: &str, title: &str) -> LinkDraft {
        let collection_id = self.with_state(|state| {
            state
                .folders
                .iter()
                .find(|folder| folder.name == UNORGANIZED_FOLDER_NAME)
                .or_else(|| state.folders.first())
                .map_or(0, |folder| folder.id)
        });
        LinkDraft {
            id: 0,
            url: url.to_string(),
            title: title.to_string(),
            collection_id,
            tags: Vec::new(),
        }
    }

    pub async fn fetch_tags(&self) -> ApiResult<Vec<Tag>> {
        match self.call(Request::FetchTags, Response::into_tags).await {
            ApiResult::Success(tags) => {
                self.with_state(|state| state.tags = tags.clone());
                ApiResult::Success(tags)
            }
            ApiResult::Failure(message) => self.fail(message),
        }
    }

    /// Set the draft's tags, dropping names the server would reject.
    ///
    /// Unknown names join the tag list as pending tags.
    ///
    /// # Returns
    /// The number of pending tags added.
    pub fn set_draft_tags(&self, draft: &mut LinkDraft, names: Vec<String>) -> usize {
        draft.tags = filter_tag_names(names);
        self.with_state(|state| merge_new_tags(&mut state.tags, &draft.tags))
    }

    /// Create a link, then reload only its folder when one was chosen.
    pub async fn save_new_link(&self, draft: &LinkDraft) -> ApiResult<()> {
        if let ApiResult::Failure(message) = self
            .mutate(Request::SaveLink {
                link: draft.clone(),
            })
            .await
        {
            return ApiResult::Failure(message);
        }
        if draft.collection_id > 0 {
            self.load_links_for_folder(draft.collection_id).await
        } else {
            self.load_all_links().await
        }
    }

    /// Update a link; its destination folder must be a known folder.
    pub async fn save_edited_link(&self, draft: &LinkDraft) -> ApiResult<()> {
        let owner_id = self.with_state(|state| {
            state
                .folders
                .iter()
                .find(|folder| folder.id == draft.collection_id)
                .map(|folder| folder.owner_id)
        });
        let Some(collection_owner_id) = owner_id else {
            return self.fail(format!(
                "Could not update link: unknown folder {}",
                draft.collection_id
            ));
        };
        if let ApiResult::Failure(message) = self
            .mutate(Request::UpdateLink {
                data: draft.clone(),
                collection_owner_id,
            })
            .await
        {
            return ApiResult::Failure(message);
        }
        self.load_all_links().await
    }

    pub async fn delete_link(&self, id: i64) -> ApiResult<()> {
        if let ApiResult::Failure(message) = self.mutate(Request::DeleteLink { id }).await {
            return ApiResult::Failure(message);
        }
        self.load_all_links().await
    }

    pub async fn create_folder(&self, name: &str, parent_id: FolderId) -> ApiResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return self.fail("Could not create folder: name is empty".to_string());
        }
        let known_parent = parent_id == 0
            || self.with_state(|state| state.folders.iter().any(|f| f.id == parent_id));
        if !known_parent {
            return self.fail(format!(
                "Could not create folder: unknown parent folder {}",
                parent_id
            ));
        }
        if let ApiResult::Failure(message) = self
            .mutate(Request::CreateFolder {
                name: name.to_string(),
                parent_id,
            })
            .await
        {
            return ApiResult::Failure(message);
        }
        self.load_all_links().await
    }

    /// Rename and/or move a folder.
    ///
    /// A parent that would make the folder its own ancestor is rejected
    /// before anything is sent.
    pub async fn save_edited_folder(
        &self,
        id: FolderId,
        name: &str,
        parent_id: FolderId,
    ) -> ApiResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return self.fail("Could not update folder: name is empty".to_string());
        }
        let checked = self.with_state(|state| {
            folder_ops::ensure_valid_parent(&state.folders, id, parent_id)
        });
        match checked {
            Ok(()) => {}
            Err(AppError::NotFound) => {
                return self.fail(format!(
                    "Could not update folder: unknown parent folder {}",
                    parent_id
                ));
            }
            Err(err) => return self.fail(format!("Could not update folder: {}", err)),
        }
        if let ApiResult::Failure(message) = self
            .mutate(Request::UpdateFolder {
                id,
                name: name.to_string(),
                parent_id,
            })
            .await
        {
            return ApiResult::Failure(message);
        }
        self.load_all_links().await
    }

    pub async fn delete_folder(&self, id: FolderId) -> ApiResult<()> {
        if let ApiResult::Failure(message) = self.mutate(Request::DeleteFolder { id }).await {
            return ApiResult::Failure(message);
        }
        let open = self.with_state(|state| {
            state
                .open_folders
                .remove(&id)
                .then(|| state.open_folders.clone())
        });
        if let Some(open) = open {
            self.persist("openFolders", self.cache.set_open_folders(&open).await);
        }
        self.load_all_links().await
    }

    /// Parent candidates for `editing_id` (0 for a new folder).
    pub fn folder_choices(&self, editing_id: FolderId) -> Vec<FolderChoice> {
        self.with_state(|state| folder_ops::folder_choices(&state.folders, editing_id))
    }

    /// Cached links matching `query`, sorted by the link preference.
    pub fn search(&self, query: &str) -> Vec<Link> {
        self.with_state(|state| {
            let mut found = search_links(&state.links_by_folder, query);
            sort_links(&mut found, state.preferences.sort_links);
            found
        })
    }

    /// The folder tree in display order.
    ///
    /// Children and links are listed only under open folders.
    pub fn tree(&self) -> Vec<FolderView> {
        self.with_state(|state| {
            let mut roots: Vec<Folder> = folder_ops::root_folders(&state.folders)
                .into_iter()
                .cloned()
                .collect();
            sort_folders(&mut roots, state.preferences.sort_folders);

            let mut visited = HashSet::new();
            let mut out = Vec::new();
            for root in roots {
                push_folder(state, root, 0, &mut visited, &mut out);
            }
            out
        })
    }

    /// Store new settings, then have the worker reload its credentials.
    ///
    /// Settings are written in a fixed order: host, token, link sort, folder
    /// sort, new-tab flag.
    ///
    /// # Returns
    /// Whether the worker now considers itself configured.
    pub async fn save_options(
        &self,
        host: &str,
        token: &str,
        preferences: Preferences,
    ) -> ApiResult<bool> {
        let written = async {
            self.cache.set_host(host).await?;
            self.cache.set_token(token).await?;
            self.cache.set_sort_links(preferences.sort_links).await?;
            self.cache.set_sort_folders(preferences.sort_folders).await?;
            self.cache.set_open_new_tab(preferences.open_new_tab).await
        }
        .await;
        if let Err(err) = written {
            return self.fail(format!("Could not save options: {}", err));
        }

        let configured = async {
            self.background.request(Request::Reload).await?;
            self.background
                .request(Request::HasValidConfiguration)
                .await
                .map(|response| response.flag().unwrap_or(false))
        }
        .await;
        match configured {
            Ok(configured) => {
                self.with_state(|state| {
                    state.configured = configured;
                    state.preferences = preferences;
                });
                ApiResult::Success(configured)
            }
            Err(err) => self.fail(format!("Could not save options: {}", err)),
        }
    }

    /// Clear the error flag, run a full refresh and report the flag.
    ///
    /// # Returns
    /// `true` when any remote call failed during the refresh.
    pub async fn refresh_from_options(&self) -> Result<bool, ChannelError> {
        self.background.request(Request::ClearErrorFlag).await?;
        let _ = self.load_all_links().await;
        let flag = self.background.request(Request::GetErrorFlag).await?;
        Ok(flag.flag().unwrap_or(false))
    }
}

impl<S: KeyValueStore + 'static> Refresh for ViewSession<S> {
    async fn last_update(&self) -> Option<i64> {
        self.cache.last_update().await
    }

    async fn refresh(&self) -> bool {
        self.load_all_links().await.is_success()
    }
}
