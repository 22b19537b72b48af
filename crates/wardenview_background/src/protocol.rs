//! Messages exchanged between UI surfaces and the background worker.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wardenview_core::models::{Folder, FolderId, Link, LinkDraft, LinksByFolder, Tag};
use wardenview_core::ApiResult;

/// Failure text reported when host or token is missing.
pub const UNCONFIGURED_MESSAGE: &str = "Host and API token are not configured";

/// Actions a UI surface can ask the background worker to perform.
///
/// On the wire each request is an object tagged by `action`, for example
/// `{"action": "fetchLinks", "collectionId": 4}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    FetchAllLinksFromAllFolders,
    FetchFolders,
    #[serde(rename_all = "camelCase")]
    FetchLinks {
        collection_id: FolderId,
    },
    FetchTags,
    SaveLink {
        link: LinkDraft,
    },
    #[serde(rename_all = "camelCase")]
    UpdateLink {
        data: LinkDraft,
        collection_owner_id: i64,
    },
    DeleteLink {
        id: i64,
    },
    /// `parent_id == 0` creates a root folder.
    #[serde(rename_all = "camelCase")]
    CreateFolder {
        name: String,
        parent_id: FolderId,
    },
    #[serde(rename_all = "camelCase")]
    UpdateFolder {
        id: FolderId,
        name: String,
        parent_id: FolderId,
    },
    DeleteFolder {
        id: FolderId,
    },
    /// Whether both host and token are present.
    HasValidConfiguration,
    /// Re-read credentials from the cache.
    Reload,
    /// Whether any remote call failed since the flag was last cleared.
    GetErrorFlag,
    ClearErrorFlag,
}

impl Request {
    /// Wire name of the action.
    pub fn action(&self) -> &'static str {
        match self {
            Self::FetchAllLinksFromAllFolders => "fetchAllLinksFromAllFolders",
            Self::FetchFolders => "fetchFolders",
            Self::FetchLinks { .. } => "fetchLinks",
            Self::FetchTags => "fetchTags",
            Self::SaveLink { .. } => "saveLink",
            Self::UpdateLink { .. } => "updateLink",
            Self::DeleteLink { .. } => "deleteLink",
            Self::CreateFolder { .. } => "createFolder",
            Self::UpdateFolder { .. } => "updateFolder",
            Self::DeleteFolder { .. } => "deleteFolder",
            Self::HasValidConfiguration => "hasValidConfiguration",
            Self::Reload => "reload",
            Self::GetErrorFlag => "getErrorFlag",
            Self::ClearErrorFlag => "clearErrorFlag",
        }
    }

    /// True for actions that reach the remote service.
    pub fn is_remote(&self) -> bool {
        !matches!(
            self,
            Self::HasValidConfiguration | Self::Reload | Self::GetErrorFlag | Self::ClearErrorFlag
        )
    }
}

/// Replies from the background worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "camelCase")]
pub enum Response {
    Configured(bool),
    Reloaded,
    ErrorFlag(bool),
    ErrorFlagCleared,
    /// A remote action was requested before host and token were set.
    Unconfigured,
    LinksByFolder(ApiResult<LinksByFolder>),
    Folders(ApiResult<Vec<Folder>>),
    Links(ApiResult<Vec<Link>>),
    Tags(ApiResult<Vec<Tag>>),
    /// Outcome of a create, update or delete.
    Mutation(ApiResult<Value>),
}

impl Response {
    /// True when a remote result failed or the worker was unconfigured.
    pub fn is_failure(&self) -> bool {
        match self {
            Self::Unconfigured => true,
            Self::LinksByFolder(result) => !result.is_success(),
            Self::Folders(result) => !result.is_success(),
            Self::Links(result) => !result.is_success(),
            Self::Tags(result) => !result.is_success(),
            Self::Mutation(result) => !result.is_success(),
            Self::Configured(_) | Self::Reloaded | Self::ErrorFlag(_) | Self::ErrorFlagCleared => {
                false
            }
        }
    }

    fn mismatch<T>(self, expected: &str) -> ApiResult<T> {
        match self {
            Self::Unconfigured => ApiResult::failure(UNCONFIGURED_MESSAGE),
            other => ApiResult::Failure(format!("expected {} reply, got {:?}", expected, other)),
        }
    }

    pub fn into_links_by_folder(self) -> ApiResult<LinksByFolder> {
        match self {
            Self::LinksByFolder(result) => result,
            other => other.mismatch("linksByFolder"),
        }
    }

    pub fn into_folders(self) -> ApiResult<Vec<Folder>> {
        match self {
            Self::Folders(result) => result,
            other => other.mismatch("folders"),
        }
    }

    pub fn into_links(self) -> ApiResult<Vec<Link>> {
        match self {
            Self::Links(result) => result,
            other => other.mismatch("links"),
        }
    }

    pub fn into_tags(self) -> ApiResult<Vec<Tag>> {
        match self {
            Self::Tags(result) => result,
            other => other.mismatch("tags"),
        }
    }

    pub fn into_mutation(self) -> ApiResult<Value> {
        match self {
            Self::Mutation(result) => result,
            other => other.mismatch("mutation"),
        }
    }

    /// The boolean carried by `Configured` or `ErrorFlag`.
    pub fn flag(&self) -> Option<bool> {
        match self {
            Self::Configured(value) | Self::ErrorFlag(value) => Some(*value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requests_use_action_tags_and_camel_case_fields() {
        let request: Request = serde_json::from_value(json!({
            "action": "updateLink",
            "data": {"id": 3, "url": "https://a", "title": "A", "collectionId": 2, "tags": ["x"]},
            "collectionOwnerId": 9
        }))
        .expect("request");
        let Request::UpdateLink {
            data,
            collection_owner_id,
        } = &request
        else {
            panic!("unexpected request {:?}", request);
        };
        assert_eq!(data.collection_id, 2);
        assert_eq!(*collection_owner_id, 9);
        assert_eq!(request.action(), "updateLink");

        let encoded = serde_json::to_value(Request::CreateFolder {
            name: "N".to_string(),
            parent_id: 0,
        })
        .expect("encode");
        assert_eq!(
            encoded,
            json!({"action": "createFolder", "name": "N", "parentId": 0})
        );
        assert_eq!(
            serde_json::to_value(Request::FetchAllLinksFromAllFolders).expect("encode"),
            json!({"action": "fetchAllLinksFromAllFolders"})
        );
    }

    #[test]
    fn unknown_actions_do_not_decode() {
        let err = serde_json::from_value::<Request>(json!({"action": "formatDisk"}));
        assert!(err.is_err());
    }

    #[test]
    fn action_names_match_serde_tags() {
        let requests = [
            Request::FetchAllLinksFromAllFolders,
            Request::FetchFolders,
            Request::FetchLinks { collection_id: 1 },
            Request::FetchTags,
            Request::SaveLink {
                link: LinkDraft::default(),
            },
            Request::UpdateLink {
                data: LinkDraft::default(),
                collection_owner_id: 1,
            },
            Request::DeleteLink { id: 1 },
            Request::CreateFolder {
                name: String::new(),
                parent_id: 0,
            },
            Request::UpdateFolder {
                id: 1,
                name: String::new(),
                parent_id: 0,
            },
            Request::DeleteFolder { id: 1 },
            Request::HasValidConfiguration,
            Request::Reload,
            Request::GetErrorFlag,
            Request::ClearErrorFlag,
        ];
        for request in requests {
            let encoded = serde_json::to_value(&request).expect("encode");
            assert_eq!(encoded["action"], request.action());
        }
    }

    #[test]
    fn unconfigured_converts_to_a_failure() {
        let result = Response::Unconfigured.into_tags();
        assert_eq!(result.error_message(), Some(UNCONFIGURED_MESSAGE));
        assert!(Response::Unconfigured.is_failure());
        assert!(!Response::Reloaded.is_failure());
        assert!(Response::Reloaded.into_folders().error_message().is_some());
    }

    #[test]
    fn responses_carry_the_result_envelope() {
        let encoded = serde_json::to_value(Response::Mutation(ApiResult::Failure(
            "Could not delete link: gone".to_string(),
        )))
        .expect("encode");
        assert_eq!(
            encoded,
            json!({"kind": "mutation", "payload": {"success": false, "data": "Could not delete link: gone"}})
        );
    }
}
