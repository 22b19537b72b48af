//! Full-tree refresh built from per-folder fetches.

use crate::service::BookmarkService;
use tokio::task::JoinSet;
use tracing::{error, info};
use wardenview_core::models::LinksByFolder;
use wardenview_core::ApiResult;

/// Fetch every folder, then every folder's links concurrently.
///
/// A folder-list failure is returned as-is without touching links. Link
/// fetches run unordered on a [`JoinSet`]; the first failure aborts the rest
/// and is returned, discarding whatever already arrived. Partial trees are
/// never reported as success.
pub async fn fetch_all_links_from_all_folders<S>(service: &S) -> ApiResult<LinksByFolder>
where
    S: BookmarkService + Clone + 'static,
{
    let folders = match service.fetch_folders().await {
        ApiResult::Success(folders) => folders,
        ApiResult::Failure(message) => return ApiResult::Failure(message),
    };

    let mut tasks = JoinSet::new();
    for folder in &folders {
        let service = service.clone();
        let folder_id = folder.id;
        tasks.spawn(async move { (folder_id, service.fetch_links(folder_id).await) });
    }

    let mut links_by_folder = LinksByFolder::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((folder_id, ApiResult::Success(links))) => {
                links_by_folder.insert(folder_id, links);
            }
            Ok((folder_id, ApiResult::Failure(message))) => {
                error!("Refresh aborted by folder {}: {}", folder_id, message);
                tasks.abort_all();
                return ApiResult::Failure(message);
            }
            Err(err) => {
                error!("Link fetch task failed: {}", err);
                tasks.abort_all();
                return ApiResult::Failure(format!("Could not fetch links: {}", err));
            }
        }
    }

    info!(
        "Fetched links for {} folders ({} links)",
        links_by_folder.len(),
        links_by_folder.values().map(Vec::len).sum::<usize>()
    );
    ApiResult::Success(links_by_folder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use wardenview_core::models::{Folder, FolderId, FolderRef, Link, LinkDraft, Tag};

    /// Serves canned folders and links, counting calls.
    #[derive(Clone, Default)]
    struct ScriptedService {
        folder_ids: Vec<FolderId>,
        fail_folders: bool,
        fail_links_for: HashSet<FolderId>,
        link_calls: Arc<AtomicUsize>,
    }

    impl ScriptedService {
        fn with_folders(ids: &[FolderId]) -> Self {
            Self {
                folder_ids: ids.to_vec(),
                ..Self::default()
            }
        }

        fn link_calls(&self) -> usize {
            self.link_calls.load(Ordering::SeqCst)
        }
    }

    fn folder(id: FolderId) -> Folder {
        Folder {
            id,
            name: format!("F{}", id),
            owner_id: 1,
            parent_id: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            icon: None,
            icon_weight: None,
            color: "#0ea5e9".to_string(),
        }
    }

    fn link(id: i64, folder_id: FolderId) -> Link {
        Link {
            id,
            name: format!("L{}", id),
            url: format!("https://example.com/{}", id),
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            tags: Vec::new(),
            folder: FolderRef {
                id: folder_id,
                name: format!("F{}", folder_id),
                owner_id: 1,
            },
        }
    }

    impl BookmarkService for ScriptedService {
        async fn fetch_folders(&self) -> ApiResult<Vec<Folder>> {
            if self.fail_folders {
                return ApiResult::failure("Could not fetch folders: offline");
            }
            ApiResult::Success(self.folder_ids.iter().copied().map(folder).collect())
        }

        async fn fetch_links(&self, folder_id: FolderId) -> ApiResult<Vec<Link>> {
            self.link_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_links_for.contains(&folder_id) {
                return ApiResult::failure(format!("Could not fetch links: folder {}", folder_id));
            }
            ApiResult::Success(vec![link(folder_id * 10, folder_id)])
        }

        async fn fetch_tags(&self) -> ApiResult<Vec<Tag>> {
            ApiResult::Success(Vec::new())
        }

        async fn save_link(&self, _draft: &LinkDraft) -> ApiResult<Value> {
            ApiResult::Success(Value::Null)
        }

        async fn update_link(&self, _draft: &LinkDraft, _owner: i64) -> ApiResult<Value> {
            ApiResult::Success(Value::Null)
        }

        async fn delete_link(&self, _id: i64) -> ApiResult<Value> {
            ApiResult::Success(Value::Null)
        }

        async fn create_folder(&self, _name: &str, _parent_id: FolderId) -> ApiResult<Value> {
            ApiResult::Success(Value::Null)
        }

        async fn update_folder(&self, _id: FolderId, _name: &str, _parent_id: FolderId) -> ApiResult<Value> {
            ApiResult::Success(Value::Null)
        }

        async fn delete_folder(&self, _id: FolderId) -> ApiResult<Value> {
            ApiResult::Success(Value::Null)
        }
    }

    #[tokio::test]
    async fn collects_one_entry_per_folder() {
        let service = ScriptedService::with_folders(&[1, 2, 3]);
        let links = fetch_all_links_from_all_folders(&service)
            .await
            .into_result()
            .expect("links");
        assert_eq!(links.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(links[&2][0].id, 20);
        assert_eq!(service.link_calls(), 3);
    }

    #[tokio::test]
    async fn folder_failure_skips_link_fetches() {
        let service = ScriptedService {
            fail_folders: true,
            ..ScriptedService::with_folders(&[1, 2])
        };
        let result = fetch_all_links_from_all_folders(&service).await;
        assert_eq!(
            result.error_message(),
            Some("Could not fetch folders: offline")
        );
        assert_eq!(service.link_calls(), 0);
    }

    #[tokio::test]
    async fn any_link_failure_discards_partial_results() {
        let service = ScriptedService {
            fail_links_for: HashSet::from([2]),
            ..ScriptedService::with_folders(&[1, 2, 3])
        };
        let result = fetch_all_links_from_all_folders(&service).await;
        assert_eq!(
            result.error_message(),
            Some("Could not fetch links: folder 2")
        );
    }

    #[tokio::test]
    async fn no_folders_is_an_empty_success() {
        let service = ScriptedService::default();
        let links = fetch_all_links_from_all_folders(&service)
            .await
            .into_result()
            .expect("links");
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn works_against_the_http_adapter() {
        let remote = crate::testing::MockRemote::start().await.expect("mock");
        remote.add_folder(1, "A", None);
        remote.add_folder(2, "B", Some(1));
        remote.add_links(1, 1, 3);
        remote.add_links(2, 10, 60);
        let client = crate::LinkwardenClient::new(
            &remote.credentials(),
            &wardenview_core::Config::default(),
        )
        .expect("client");

        let links = fetch_all_links_from_all_folders(&client)
            .await
            .into_result()
            .expect("links");
        assert_eq!(links[&1].len(), 3);
        assert_eq!(links[&2].len(), 60);

        remote.fail_links_for(2);
        assert!(!fetch_all_links_from_all_folders(&client).await.is_success());
    }
}
