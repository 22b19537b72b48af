//! Routes protocol requests to the remote adapter.

use crate::protocol::{Request, Response, UNCONFIGURED_MESSAGE};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use wardenview_client::{fetch_all_links_from_all_folders, BookmarkService, ClientError, LinkwardenClient};
use wardenview_core::{ApiResult, Cache, Config, Credentials, KeyValueStore};

/// Owns the credentials and the remote client for one background worker.
///
/// Credentials come from the cache and are only re-read by
/// [`Dispatcher::reload_configuration`], never per request.
pub struct Dispatcher<S> {
    cache: Cache<S>,
    config: Config,
    http: reqwest::Client,
    credentials: Option<Credentials>,
    client: Option<LinkwardenClient>,
    error_flag: Arc<AtomicBool>,
}

/// Where a request ends up after routing.
pub enum Routed {
    /// Answered locally.
    Done(Response),
    /// Needs the remote service; run it with [`RemoteCall::run`].
    Remote(RemoteCall),
}

/// A remote request bound to the client that will serve it.
///
/// Detached from the dispatcher so several can run at once.
pub struct RemoteCall {
    client: LinkwardenClient,
    error_flag: Arc<AtomicBool>,
    request: Request,
}

impl<S: KeyValueStore> Dispatcher<S> {
    /// Build a dispatcher with no credentials loaded yet.
    ///
    /// # Errors
    /// Returns [`ClientError::Transport`] if the HTTP client cannot be built.
    pub fn new(cache: Cache<S>, config: Config) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            cache,
            config,
            http,
            credentials: None,
            client: None,
            error_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Build a dispatcher and load credentials from the cache.
    pub async fn start(cache: Cache<S>, config: Config) -> Result<Self, ClientError> {
        let mut dispatcher = Self::new(cache, config)?;
        dispatcher.reload_configuration().await;
        Ok(dispatcher)
    }

    /// Re-read host and token from the cache and rebuild the client.
    ///
    /// A host that does not parse as an http(s) URL leaves the dispatcher
    /// unconfigured.
    pub async fn reload_configuration(&mut self) {
        self.credentials = self.cache.credentials().await;
        self.client = match &self.credentials {
            None => {
                info!("No host/token configured");
                None
            }
            Some(credentials) => {
                match LinkwardenClient::with_http(
                    self.http.clone(),
                    credentials,
                    self.config.log_payloads,
                ) {
                    Ok(client) => {
                        info!("Using bookmark service at {}", credentials.host);
                        Some(client)
                    }
                    Err(err) => {
                        warn!("Ignoring configured host: {}", err);
                        None
                    }
                }
            }
        };
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    pub fn error_flag(&self) -> bool {
        self.error_flag.load(Ordering::SeqCst)
    }

    /// Answer control requests and bind remote ones to the current client.
    pub async fn route(&mut self, request: Request) -> Routed {
        match request {
            Request::HasValidConfiguration => Routed::Done(Response::Configured(self.is_configured())),
            Request::Reload => {
                self.reload_configuration().await;
                Routed::Done(Response::Reloaded)
            }
            Request::GetErrorFlag => Routed::Done(Response::ErrorFlag(self.error_flag())),
            Request::ClearErrorFlag => {
                self.error_flag.store(false, Ordering::SeqCst);
                Routed::Done(Response::ErrorFlagCleared)
            }
            remote => match &self.client {
                None => {
                    warn!("{}: {}", remote.action(), UNCONFIGURED_MESSAGE);
                    Routed::Done(Response::Unconfigured)
                }
                Some(client) => Routed::Remote(RemoteCall {
                    client: client.clone(),
                    error_flag: Arc::clone(&self.error_flag),
                    request: remote,
                }),
            },
        }
    }

    /// Route and run a request to completion.
    pub async fn dispatch(&mut self, request: Request) -> Response {
        match self.route(request).await {
            Routed::Done(response) => response,
            Routed::Remote(call) => call.run().await,
        }
    }
}

impl RemoteCall {
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Perform the request, raising the error flag on failure.
    pub async fn run(self) -> Response {
        let Self {
            client,
            error_flag,
            request,
        } = self;
        let action = request.action();
        debug!("Running {}", action);

        let response = match request {
            Request::FetchAllLinksFromAllFolders => {
                Response::LinksByFolder(fetch_all_links_from_all_folders(&client).await)
            }
            Request::FetchFolders => Response::Folders(client.fetch_folders().await),
            Request::FetchLinks { collection_id } => {
                Response::Links(client.fetch_links(collection_id).await)
            }
            Request::FetchTags => Response::Tags(client.fetch_tags().await),
            Request::SaveLink { link } => Response::Mutation(client.save_link(&link).await),
            Request::UpdateLink {
                data,
                collection_owner_id,
            } => Response::Mutation(client.update_link(&data, collection_owner_id).await),
            Request::DeleteLink { id } => Response::Mutation(client.delete_link(id).await),
            Request::CreateFolder { name, parent_id } => {
                Response::Mutation(client.create_folder(&name, parent_id).await)
            }
            Request::UpdateFolder {
                id,
                name,
                parent_id,
            } => Response::Mutation(client.update_folder(id, &name, parent_id).await),
            Request::DeleteFolder { id } => Response::Mutation(client.delete_folder(id).await),
            Request::HasValidConfiguration
            | Request::Reload
            | Request::GetErrorFlag
            | Request::ClearErrorFlag => {
                error!("{} is answered by the dispatcher, not the remote", action);
                Response::Mutation(ApiResult::Failure(format!(
                    "{} is not a remote action",
                    action
                )))
            }
        };

        if response.is_failure() {
            error_flag.store(true, Ordering::SeqCst);
        }
        response
    }
}
