//! Shared constants used across WardenView crates.

/// Links requested per page by the remote API.
pub const LINK_PAGE_SIZE: usize = 50;

/// Hard cap on link pages fetched for a single folder.
///
/// The remote API exposes no total count, so pagination stops here even if
/// pages keep coming back non-empty (200 x 50 = 10,000 links).
pub const MAX_LINK_PAGES: usize = 200;

/// Maximum length of a tag name accepted by the remote service.
pub const MAX_TAG_NAME_LEN: usize = 50;

/// Default refresh interval in milliseconds.
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 60_000;

/// Delay before the first refresh so credentials can load.
pub const DEFAULT_STARTUP_DELAY_MS: u64 = 100;

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Color used when a folder carries no usable color.
pub const DEFAULT_FOLDER_COLOR: &str = "#0ea5e9";

/// Name of the folder new links default to when it exists.
pub const UNORGANIZED_FOLDER_NAME: &str = "Unorganized";

/// Sentinel the remote API expects for "no parent" on folder updates.
pub const ROOT_PARENT_SENTINEL: &str = "root";

/// Store file name inside the default cache directory.
pub const STORE_FILE_NAME: &str = "store.json";
