//! Root crate facade for WardenView: the core cache and tree model, the remote
//! client and the background worker.

pub use wardenview_background;
pub use wardenview_client;
pub use wardenview_core;

pub use wardenview_background::{
    spawn_background, BackgroundHandle, Dispatcher, RefreshScheduler, Request, Response,
    ViewSession,
};
pub use wardenview_client::{fetch_all_links_from_all_folders, BookmarkService, LinkwardenClient};
pub use wardenview_core::{ApiResult, AppError, Cache, Config, FileStore, MemoryStore};
