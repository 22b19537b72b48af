//! Local cache contract shared by UI surfaces and the background dispatcher.
//!
//! The cache is a non-authoritative projection of the remote service: any key
//! may be missing (first run, cleared storage, undecodable value) and every
//! reader falls back to a default. It is always rebuildable by a refresh.

mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore};

use crate::config::Credentials;
use crate::error::AppError;
use crate::models::{Folder, FolderId, LinksByFolder, SortOrder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Keys persisted in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Host,
    Token,
    SortLinks,
    SortFolders,
    OpenNewTab,
    OpenFolders,
    LinksByFolder,
    AllFolders,
    LastUpdate,
}

impl CacheKey {
    pub const ALL: [CacheKey; 9] = [
        CacheKey::Host,
        CacheKey::Token,
        CacheKey::SortLinks,
        CacheKey::SortFolders,
        CacheKey::OpenNewTab,
        CacheKey::OpenFolders,
        CacheKey::LinksByFolder,
        CacheKey::AllFolders,
        CacheKey::LastUpdate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Token => "token",
            Self::SortLinks => "sortLinks",
            Self::SortFolders => "sortFolders",
            Self::OpenNewTab => "openNewTab",
            Self::OpenFolders => "openFolders",
            Self::LinksByFolder => "linksByFolder",
            Self::AllFolders => "allFolders",
            Self::LastUpdate => "lastUpdate",
        }
    }
}

/// Everything the cache holds, with defaults applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    pub host: Option<String>,
    pub token: Option<String>,
    pub all_folders: Vec<Folder>,
    pub links_by_folder: LinksByFolder,
    pub last_update: Option<i64>,
    pub open_folders: BTreeSet<FolderId>,
    pub sort_links: SortOrder,
    pub sort_folders: SortOrder,
    pub open_new_tab: bool,
}

/// Typed view over a [`KeyValueStore`].
pub struct Cache<S> {
    store: Arc<S>,
}

impl<S> Clone for Cache<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KeyValueStore> Cache<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Read and decode `key`.
    ///
    /// Store failures and values of the wrong shape are logged and reported
    /// as absent.
    async fn read<T: DeserializeOwned>(&self, key: CacheKey) -> Option<T> {
        let value = match self.store.get(key.as_str()).await {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!("Cache read of '{}' failed: {}", key.as_str(), err);
                return None;
            }
        };
        if value.is_null() {
            return None;
        }
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                tracing::warn!("Ignoring undecodable cache value '{}': {}", key.as_str(), err);
                None
            }
        }
    }

    async fn write<T: Serialize + ?Sized>(&self, key: CacheKey, value: &T) -> Result<(), AppError> {
        let encoded = serde_json::to_value(value)?;
        self.store.set(key.as_str(), encoded).await
    }

    pub async fn host(&self) -> Option<String> {
        self.read(CacheKey::Host).await
    }

    pub async fn set_host(&self, host: &str) -> Result<(), AppError> {
        self.write(CacheKey::Host, host).await
    }

    pub async fn token(&self) -> Option<String> {
        self.read(CacheKey::Token).await
    }

    pub async fn set_token(&self, token: &str) -> Result<(), AppError> {
        self.write(CacheKey::Token, token).await
    }

    /// Host and token, when both are configured.
    pub async fn credentials(&self) -> Option<Credentials> {
        let host = self.host().await;
        let token = self.token().await;
        Credentials::from_parts(host, token)
    }

    pub async fn links_by_folder(&self) -> Option<LinksByFolder> {
        self.read(CacheKey::LinksByFolder).await
    }

    pub async fn set_links_by_folder(&self, links: &LinksByFolder) -> Result<(), AppError> {
        self.write(CacheKey::LinksByFolder, links).await
    }

    pub async fn all_folders(&self) -> Option<Vec<Folder>> {
        self.read(CacheKey::AllFolders).await
    }

    pub async fn set_all_folders(&self, folders: &[Folder]) -> Result<(), AppError> {
        self.write(CacheKey::AllFolders, folders).await
    }

    /// Milliseconds since the Unix epoch of the last successful full refresh.
    pub async fn last_update(&self) -> Option<i64> {
        self.read(CacheKey::LastUpdate).await
    }

    /// Record a successful full refresh at `now_ms`.
    ///
    /// `lastUpdate` never moves backwards: an older timestamp (for example
    /// from a slow overlapping refresh) leaves the stored value in place.
    ///
    /// # Returns
    /// The value stored after the call.
    pub async fn record_refresh(&self, now_ms: i64) -> Result<i64, AppError> {
        if let Some(previous) = self.last_update().await {
            if previous >= now_ms {
                return Ok(previous);
            }
        }
        self.write(CacheKey::LastUpdate, &now_ms).await?;
        Ok(now_ms)
    }

    pub async fn open_folders(&self) -> BTreeSet<FolderId> {
        self.read(CacheKey::OpenFolders).await.unwrap_or_default()
    }

    pub async fn set_open_folders(&self, open: &BTreeSet<FolderId>) -> Result<(), AppError> {
        self.write(CacheKey::OpenFolders, open).await
    }

    pub async fn sort_links(&self) -> SortOrder {
        self.read(CacheKey::SortLinks).await.unwrap_or_default()
    }

    pub async fn set_sort_links(&self, order: SortOrder) -> Result<(), AppError> {
        self.write(CacheKey::SortLinks, &order).await
    }

    pub async fn sort_folders(&self) -> SortOrder {
        self.read(CacheKey::SortFolders).await.unwrap_or_default()
    }

    pub async fn set_sort_folders(&self, order: SortOrder) -> Result<(), AppError> {
        self.write(CacheKey::SortFolders, &order).await
    }

    pub async fn open_new_tab(&self) -> bool {
        self.read(CacheKey::OpenNewTab).await.unwrap_or(false)
    }

    pub async fn set_open_new_tab(&self, enabled: bool) -> Result<(), AppError> {
        self.write(CacheKey::OpenNewTab, &enabled).await
    }

    /// Read every key, applying defaults for anything missing.
    pub async fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            host: self.host().await,
            token: self.token().await,
            all_folders: self.all_folders().await.unwrap_or_default(),
            links_by_folder: self.links_by_folder().await.unwrap_or_default(),
            last_update: self.last_update().await,
            open_folders: self.open_folders().await,
            sort_links: self.sort_links().await,
            sort_folders: self.sort_folders().await,
            open_new_tab: self.open_new_tab().await,
        }
    }

    /// Remove every cached key.
    pub async fn clear(&self) -> Result<(), AppError> {
        for key in CacheKey::ALL {
            self.store.remove(key.as_str()).await?;
        }
        Ok(())
    }
}
