//! Install and activate handlers.
//!
//! ```text
//! Parsed ─install─▶ Installing ─▶ Installed ─activate─▶ Activating ─▶ Activated
//!                        │
//!                        └─ any asset fetch fails ─▶ Redundant
//! ```
//!
//! Install fetches both pinned lists in full before writing anything, so a
//! single failed asset leaves the partitions exactly as they were.

use std::sync::atomic::Ordering;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info};
use url::Url;

use crate::cache::storage::fetch_all;
use crate::error::{Result, WorkerError};
use crate::net::request::Request;
use crate::worker::ServiceWorker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; the worker will never control a page.
    Redundant,
}

impl WorkerState {
    /// Whether fetch events should be routed to the worker.
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Activating | WorkerState::Activated)
    }
}

impl ServiceWorker {
    pub fn state(&self) -> WorkerState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: WorkerState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Move from `from` to `to`, or fail without changing state.
    fn transition(&self, from: WorkerState, to: WorkerState, action: &'static str) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state != from {
            return Err(WorkerError::InvalidState {
                action,
                state: *state,
            });
        }
        *state = to;
        Ok(())
    }

    /// Ask the host to activate this worker without waiting for old pages to close.
    pub fn skip_waiting(&self) {
        if !self.skip_waiting.swap(true, Ordering::SeqCst) {
            debug!("Skip waiting requested");
        }
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Resolve an asset path against the configured origin.
    pub(crate) fn resolve(&self, path: &str) -> Result<Url> {
        let origin = &self.config().server.origin;
        Url::parse(origin)
            .and_then(|base| base.join(path))
            .map_err(|e| WorkerError::InvalidUrl {
                url: format!("{origin}{path}"),
                reason: e.to_string(),
            })
    }

    fn asset_requests(&self, paths: &[String]) -> Result<Vec<Request>> {
        paths
            .iter()
            .map(|p| self.resolve(p).map(Request::get))
            .collect()
    }

    /// Populate both partitions from the pinned lists.
    ///
    /// On success the worker is `Installed` and has requested skip-waiting.
    /// On failure nothing is written, the worker is `Redundant` and the fetch
    /// error is returned to the host.
    pub async fn install(&self) -> Result<()> {
        self.transition(WorkerState::Parsed, WorkerState::Installing, "install")?;

        let worker = &self.config().worker;
        let static_name = worker.static_cache_name();
        let dynamic_name = worker.dynamic_cache_name();
        info!(version = %worker.version, "Installing worker");

        let requests = self
            .asset_requests(&worker.static_assets)
            .and_then(|s| self.asset_requests(&worker.dynamic_assets).map(|d| (s, d)));
        let (static_requests, dynamic_requests) = match requests {
            Ok(reqs) => reqs,
            Err(e) => {
                error!(error = %e, "Install failed");
                self.set_state(WorkerState::Redundant);
                return Err(e);
            }
        };

        self.storage().open(&static_name).await;
        self.storage().open(&dynamic_name).await;

        debug!(
            static_assets = static_requests.len(),
            dynamic_assets = dynamic_requests.len(),
            "Caching pinned assets"
        );
        let fetched = futures::try_join!(
            fetch_all(self.network(), static_requests),
            fetch_all(self.network(), dynamic_requests),
        );

        match fetched {
            Ok((static_entries, dynamic_entries)) => {
                let stored_static = self.storage().put_all(&static_name, static_entries).await;
                let stored_dynamic = self.storage().put_all(&dynamic_name, dynamic_entries).await;
                self.set_state(WorkerState::Installed);
                info!(stored_static, stored_dynamic, "Install complete");
                self.skip_waiting();
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Install failed");
                self.set_state(WorkerState::Redundant);
                Err(WorkerError::InstallFailed(e))
            }
        }
    }

    /// Treat partitions restored from a previous run as this version's
    /// install, so a restart does not need the origin to be reachable.
    ///
    /// Succeeds only from `Parsed` when both current partitions exist and the
    /// static one is non-empty.
    pub async fn adopt_existing_install(&self) -> bool {
        if self.state() != WorkerState::Parsed {
            return false;
        }
        let worker = &self.config().worker;
        let static_name = worker.static_cache_name();
        let populated = self
            .storage()
            .stats()
            .await
            .iter()
            .any(|s| s.name == static_name && (s.entries > 0 || worker.static_assets.is_empty()));
        if !populated || !self.storage().has(&worker.dynamic_cache_name()).await {
            return false;
        }
        if self
            .transition(WorkerState::Parsed, WorkerState::Installed, "adopt install")
            .is_err()
        {
            return false;
        }
        info!(version = %worker.version, "Adopted existing install");
        self.skip_waiting();
        true
    }

    /// Delete every partition except the two current ones, then claim open
    /// clients. Returns the names deleted.
    pub async fn activate(&self) -> Result<Vec<String>> {
        self.transition(WorkerState::Installed, WorkerState::Activating, "activate")?;
        info!("Activating worker");

        let worker = &self.config().worker;
        let current = [worker.static_cache_name(), worker.dynamic_cache_name()];

        let stale: Vec<String> = self
            .storage()
            .keys()
            .await
            .into_iter()
            .filter(|name| !current.contains(name))
            .collect();

        for name in &stale {
            info!(partition = %name, "Removing stale partition");
        }
        join_all(stale.iter().map(|name| self.storage().delete(name))).await;

        self.clients().claim().await;
        self.set_state(WorkerState::Activated);
        info!(removed = stale.len(), "Activation complete");

        Ok(stale)
    }
}
