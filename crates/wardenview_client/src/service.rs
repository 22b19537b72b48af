//! The operation set every bookmark backend exposes.

use serde_json::Value;
use std::future::Future;
use wardenview_core::models::{Folder, FolderId, Link, LinkDraft, Tag};
use wardenview_core::ApiResult;

/// Remote bookmark operations.
///
/// Implementations never fail their future: transport and status errors are
/// returned as [`ApiResult::Failure`].
pub trait BookmarkService: Send + Sync {
    /// All folders, colors normalized.
    fn fetch_folders(&self) -> impl Future<Output = ApiResult<Vec<Folder>>> + Send;

    /// Every link in `folder_id`, following pagination to the end.
    fn fetch_links(&self, folder_id: FolderId)
        -> impl Future<Output = ApiResult<Vec<Link>>> + Send;

    fn fetch_tags(&self) -> impl Future<Output = ApiResult<Vec<Tag>>> + Send;

    /// Create a link; tag names are resolved server-side.
    fn save_link(&self, draft: &LinkDraft) -> impl Future<Output = ApiResult<Value>> + Send;

    /// Replace a link's name, url, folder and tags.
    ///
    /// `collection_owner_id` is the owner of the destination folder, which
    /// the server requires when a link moves between owners.
    fn update_link(
        &self,
        draft: &LinkDraft,
        collection_owner_id: i64,
    ) -> impl Future<Output = ApiResult<Value>> + Send;

    fn delete_link(&self, id: i64) -> impl Future<Output = ApiResult<Value>> + Send;

    /// Create a folder; `parent_id == 0` creates a root folder.
    fn create_folder(
        &self,
        name: &str,
        parent_id: FolderId,
    ) -> impl Future<Output = ApiResult<Value>> + Send;

    /// Rename and/or move a folder, preserving every other remote field.
    fn update_folder(
        &self,
        id: FolderId,
        name: &str,
        parent_id: FolderId,
    ) -> impl Future<Output = ApiResult<Value>> + Send;

    fn delete_folder(&self, id: FolderId) -> impl Future<Output = ApiResult<Value>> + Send;
}
