//! The offline cache worker.
//!
//! The worker owns no I/O of its own: it reads and writes partitions through
//! [`SharedStorage`], reaches the origin through a [`Network`], and asks the
//! host for side effects through [`Clients`] and [`Notifier`]. Each event kind
//! has its own handler:
//! - [`lifecycle`]: install / activate / skip-waiting
//! - [`strategy`]: fetch classification and the four cache strategies
//! - [`message`]: control messages from pages
//! - [`push`]: push messages and notification clicks
//! - [`events`]: a single dispatch entry point over all of the above
//! - [`host`]: host-side traits and their in-memory implementations

pub mod events;
pub mod host;
pub mod lifecycle;
pub mod message;
pub mod push;
pub mod strategy;

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use crate::cache::storage::SharedStorage;
use crate::config::Config;
use crate::net::fetcher::Network;
use crate::worker::host::{ClientRegistry, Clients, NotificationCenter, Notifier};
use crate::worker::lifecycle::WorkerState;

pub struct ServiceWorker {
    config: Arc<Config>,
    storage: SharedStorage,
    network: Arc<dyn Network>,
    clients: Arc<dyn Clients>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<WorkerState>,
    skip_waiting: AtomicBool,
}

impl ServiceWorker {
    /// Create a worker in the `Parsed` state with in-memory client and
    /// notification hosts.
    pub fn new(config: Arc<Config>, storage: SharedStorage, network: Arc<dyn Network>) -> Self {
        Self {
            config,
            storage,
            network,
            clients: Arc::new(ClientRegistry::new()),
            notifier: Arc::new(NotificationCenter::new()),
            state: Mutex::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
        }
    }

    pub fn with_clients(mut self, clients: Arc<dyn Clients>) -> Self {
        self.clients = clients;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    pub(crate) fn network(&self) -> &dyn Network {
        self.network.as_ref()
    }

    pub(crate) fn clients(&self) -> &dyn Clients {
        self.clients.as_ref()
    }

    pub(crate) fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }
}
