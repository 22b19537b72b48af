//! Core domain library for WardenView (models, cache contract, tree ops, config).

/// Key-value cache contract and typed accessors.
pub mod cache;
/// Folder color normalization.
pub mod color;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants used across WardenView crates.
pub mod constants;
/// Process-global environment mutation helpers.
pub mod env;
/// Application error types (storage/domain).
pub mod error;
/// Folder tree operations shared by the session and the CLI.
pub mod folder_ops;
/// Data models mirrored from the remote bookmark service.
pub mod models;
/// Success/failure result contract used across the message boundary.
pub mod result;
/// Sorting, searching and tag helpers for presenting cached data.
pub mod view;

pub use cache::{Cache, CacheKey, CacheSnapshot, FileStore, KeyValueStore, MemoryStore};
pub use config::{Config, Credentials};
pub use constants::*;
pub use error::AppError;
pub use result::ApiResult;
