//! Background worker task serving protocol requests.

use crate::dispatch::{Dispatcher, Routed};
use crate::protocol::{Request, Response};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use wardenview_core::KeyValueStore;

const REQUEST_QUEUE_DEPTH: usize = 64;

/// The worker went away before answering.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    #[error("background worker is not running")]
    Closed,
    #[error("background worker dropped the request without replying")]
    NoReply,
}

struct Envelope {
    request: Request,
    reply: oneshot::Sender<Response>,
}

/// Handle for sending requests to the background worker.
///
/// Cheap to clone. The worker exits once every handle is dropped.
#[derive(Clone)]
pub struct BackgroundHandle {
    tx: mpsc::Sender<Envelope>,
}

impl BackgroundHandle {
    /// Send `request` and wait for its reply.
    ///
    /// # Errors
    /// Returns [`ChannelError`] if the worker has stopped.
    pub async fn request(&self, request: Request) -> Result<Response, ChannelError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope { request, reply })
            .await
            .map_err(|_| ChannelError::Closed)?;
        rx.await.map_err(|_| ChannelError::NoReply)
    }
}

/// Spawn the worker task that owns `dispatcher`.
///
/// Control requests are answered in arrival order on the worker itself;
/// remote requests each run on their own task, so a slow refresh never
/// blocks a `getErrorFlag` or a second fetch.
///
/// Must be called from within a tokio runtime.
pub fn spawn_background<S>(dispatcher: Dispatcher<S>) -> BackgroundHandle
where
    S: KeyValueStore + 'static,
{
    let (tx, mut rx) = mpsc::channel::<Envelope>(REQUEST_QUEUE_DEPTH);

    tokio::spawn(async move {
        let mut dispatcher = dispatcher;
        while let Some(Envelope { request, reply }) = rx.recv().await {
            debug!("Received {}", request.action());
            match dispatcher.route(request).await {
                Routed::Done(response) => {
                    let _ = reply.send(response);
                }
                Routed::Remote(call) => {
                    debug!("Running {} on its own task", call.request().action());
                    tokio::spawn(async move {
                        let _ = reply.send(call.run().await);
                    });
                }
            }
        }
        info!("Background worker stopped");
    });

    BackgroundHandle { tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wardenview_client::testing::MockRemote;
    use wardenview_core::{Cache, Config, MemoryStore};

    async fn spawn_with(remote: Option<&MockRemote>) -> BackgroundHandle {
        let cache = Cache::new(Arc::new(MemoryStore::new()));
        if let Some(remote) = remote {
            let creds = remote.credentials();
            cache.set_host(&creds.host).await.expect("host");
            cache.set_token(&creds.token).await.expect("token");
        }
        let dispatcher = Dispatcher::start(cache, Config::default())
            .await
            .expect("dispatcher");
        spawn_background(dispatcher)
    }

    #[tokio::test]
    async fn answers_control_requests() {
        let handle = spawn_with(None).await;
        assert_eq!(
            handle.request(Request::HasValidConfiguration).await,
            Ok(Response::Configured(false))
        );
        assert_eq!(
            handle.request(Request::FetchTags).await,
            Ok(Response::Unconfigured)
        );
    }

    #[tokio::test]
    async fn serves_concurrent_remote_requests() {
        let remote = MockRemote::start().await.expect("mock");
        for id in 1..=4 {
            remote.add_folder(id, &format!("F{}", id), None);
            remote.add_links(id, id * 100, 3);
        }
        let handle = spawn_with(Some(&remote)).await;

        let requests = (1..=4).map(|id| {
            let handle = handle.clone();
            async move {
                handle
                    .request(Request::FetchLinks { collection_id: id })
                    .await
                    .map(Response::into_links)
            }
        });
        let mut tasks = tokio::task::JoinSet::new();
        for request in requests {
            tasks.spawn(request);
        }
        let mut total = 0;
        while let Some(joined) = tasks.join_next().await {
            let links = joined
                .expect("task")
                .expect("reply")
                .into_result()
                .expect("links");
            total += links.len();
        }
        assert_eq!(total, 12);
    }

    #[tokio::test]
    async fn reports_a_stopped_worker() {
        let (tx, rx) = mpsc::channel::<Envelope>(1);
        drop(rx);
        let handle = BackgroundHandle { tx };
        assert_eq!(
            handle.request(Request::Reload).await,
            Err(ChannelError::Closed)
        );
    }
}
