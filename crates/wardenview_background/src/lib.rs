//! Background side of WardenView: the message boundary, the refresh timer and
//! the UI-side session that drives both.
//!
//! A typical front end builds a [`Dispatcher`] over the shared cache, spawns
//! it with [`spawn_background`], wraps the returned handle in a
//! [`ViewSession`] and hands a clone of the session to
//! [`RefreshScheduler::start`].

pub mod dispatch;
pub mod protocol;
pub mod scheduler;
pub mod session;
pub mod worker;

pub use dispatch::{Dispatcher, RemoteCall, Routed};
pub use protocol::{Request, Response, UNCONFIGURED_MESSAGE};
pub use scheduler::{needs_refresh, Refresh, RefreshScheduler, SchedulerHandle, SchedulerState};
pub use session::{FolderView, Preferences, ViewSession, ViewState};
pub use worker::{spawn_background, BackgroundHandle, ChannelError};
