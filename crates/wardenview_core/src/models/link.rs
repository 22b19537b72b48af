//! Link, tag and link-draft models.

use super::folder::{FolderId, FolderRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cached links grouped by their folder id.
pub type LinksByFolder = BTreeMap<FolderId, Vec<Link>>;

/// A tag shared across links by name. `id == 0` means not created remotely yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

impl Tag {
    /// A tag known only locally, awaiting server-side creation.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.id == 0
    }
}

/// A bookmarked URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: i64,
    pub name: String,
    pub url: String,
    /// Original save time: the import date when the link was migrated in.
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub folder: FolderRef,
}

impl Link {
    /// Editable projection of this link.
    pub fn to_draft(&self) -> LinkDraft {
        LinkDraft {
            id: self.id,
            url: self.url.clone(),
            title: self.name.clone(),
            collection_id: self.folder.id,
            tags: self.tags.iter().map(|tag| tag.name.clone()).collect(),
        }
    }
}

/// The editable form of a link before or after a remote save.
///
/// Tags are plain names; the server resolves them to tag ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDraft {
    #[serde(default)]
    pub id: i64,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub collection_id: FolderId,
    #[serde(default)]
    pub tags: Vec<String>,
}
