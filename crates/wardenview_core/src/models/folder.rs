//! Folder (remote "collection") models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Remote folder identifier. `0` never names a real folder.
pub type FolderId = i64;

/// A folder as cached locally.
///
/// `color` is always normalized (see [`crate::color::normalize_color`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub owner_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<FolderId>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_weight: Option<String>,
    pub color: String,
}

impl Folder {
    /// Declared parent id, with `0` read as "no parent".
    pub fn parent(&self) -> Option<FolderId> {
        self.parent_id.filter(|id| *id != 0)
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    pub fn to_ref(&self) -> FolderRef {
        FolderRef {
            id: self.id,
            name: self.name.clone(),
            owner_id: self.owner_id,
        }
    }
}

/// Folder summary embedded in each link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRef {
    pub id: FolderId,
    pub name: String,
    #[serde(default)]
    pub owner_id: i64,
}
