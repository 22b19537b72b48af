//! Remote client adapter for the Linkwarden bookmark API.
//!
//! [`LinkwardenClient`] turns domain operations into HTTP calls and every
//! outcome into an [`ApiResult`]; nothing raised by the transport escapes.
//! [`aggregate::fetch_all_links_from_all_folders`] builds a full refresh on top.

pub mod aggregate;
pub mod error;
pub mod linkwarden;
pub mod service;
mod wire;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use aggregate::fetch_all_links_from_all_folders;
pub use error::ClientError;
pub use linkwarden::LinkwardenClient;
pub use service::BookmarkService;
pub use wardenview_core::ApiResult;
