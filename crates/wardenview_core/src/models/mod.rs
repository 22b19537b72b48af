//! Data models for cached folders, links and tags.

pub mod folder;
pub mod link;

pub use folder::{Folder, FolderId, FolderRef};
pub use link::{Link, LinkDraft, LinksByFolder, Tag};

use serde::{Deserialize, Serialize};

/// Sort preference for folders and links.
///
/// Wire values match the option strings stored under `sortLinks` and
/// `sortFolders`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NameAscending,
    NameDescending,
    DateAscending,
    DateDescending,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NameAscending => "name_ascending",
            Self::NameDescending => "name_descending",
            Self::DateAscending => "date_ascending",
            Self::DateDescending => "date_descending",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "name_ascending" => Ok(Self::NameAscending),
            "name_descending" => Ok(Self::NameDescending),
            "date_ascending" => Ok(Self::DateAscending),
            "date_descending" => Ok(Self::DateDescending),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests;
