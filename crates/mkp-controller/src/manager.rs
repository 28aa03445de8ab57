//! ---
//! mkp_section: "04-configuration-orchestration"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Manager seam and the in-memory controller host."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use mkp_common::config::Scope;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use mkp_common::gvk::GroupVersionKind;

/// Host runtime that owns and schedules attached controllers.
pub trait Manager: Send + Sync {
    /// Attach a controller. Attaching the same name twice must fail rather than
    /// replace the existing controller.
    fn add_controller(&self, registration: ControllerRegistration) -> Result<(), ManagerError>;
}

/// Shared handle to the running manager, passed by reference into every registration.
pub type ManagerHandle = Arc<dyn Manager>;

/// Everything a manager needs to run one controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerRegistration {
    pub name: String,
    pub scope: Scope,
    pub gvk: GroupVersionKind,
    pub poll_interval: Duration,
    /// Period of the full resync that revisits every resource regardless of events.
    pub sync_interval: Duration,
    pub max_concurrent_reconciles: usize,
    pub management_policies: bool,
    pub change_logs: bool,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ManagerError {
    #[error("controller {name} is already registered")]
    AlreadyRegistered { name: String },
    #[error("controller {name} is invalid: {reason}")]
    InvalidRegistration { name: String, reason: String },
    #[error("manager is already running")]
    AlreadyStarted,
    #[error("manager must be started from within a tokio runtime")]
    NoRuntime,
}

#[derive(Debug)]
struct ControllerEntry {
    registration: ControllerRegistration,
    polls: Arc<AtomicU64>,
    resyncs: Arc<AtomicU64>,
}

#[derive(Debug)]
struct RuntimeState {
    handle: Handle,
    shutdown: broadcast::Sender<()>,
    tasks: Vec<(String, JoinHandle<()>)>,
}

impl RuntimeState {
    fn spawn(&mut self, entry: &ControllerEntry) {
        let task = spawn_controller_task(
            &self.handle,
            &entry.registration,
            entry.polls.clone(),
            entry.resyncs.clone(),
            self.shutdown.subscribe(),
        );
        self.tasks.push((entry.registration.name.clone(), task));
    }
}

/// In-memory manager keeping controllers in attachment order.
///
/// Once [`ControllerManager::start`] has been called every controller, including
/// ones attached later, runs as a tokio task ticking at its poll interval.
/// Lock order is `runtime` then `controllers`.
#[derive(Default)]
pub struct ControllerManager {
    controllers: Mutex<IndexMap<String, ControllerEntry>>,
    runtime: Mutex<Option<RuntimeState>>,
}

impl fmt::Debug for ControllerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerManager")
            .field("controllers", &self.len())
            .field("running", &self.is_running())
            .finish()
    }
}

impl ControllerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrations in the order they were attached.
    pub fn controllers(&self) -> Vec<ControllerRegistration> {
        self.controllers
            .lock()
            .values()
            .map(|entry| entry.registration.clone())
            .collect()
    }

    pub fn controller_names(&self) -> Vec<String> {
        self.controllers.lock().keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.controllers.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.controllers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Poll cycles a running controller has completed so far.
    pub fn poll_count(&self, name: &str) -> Option<u64> {
        self.controllers
            .lock()
            .get(name)
            .map(|entry| entry.polls.load(Ordering::Relaxed))
    }

    /// Full resyncs a running controller has completed so far.
    pub fn resync_count(&self, name: &str) -> Option<u64> {
        self.controllers
            .lock()
            .get(name)
            .map(|entry| entry.resyncs.load(Ordering::Relaxed))
    }

    pub fn is_running(&self) -> bool {
        self.runtime.lock().is_some()
    }

    /// Start every attached controller on the current tokio runtime.
    pub fn start(&self) -> Result<(), ManagerError> {
        let handle = Handle::try_current().map_err(|_| ManagerError::NoRuntime)?;
        let mut runtime = self.runtime.lock();
        if runtime.is_some() {
            return Err(ManagerError::AlreadyStarted);
        }
        let (shutdown, _) = broadcast::channel(4);
        let mut state = RuntimeState {
            handle,
            shutdown,
            tasks: Vec::new(),
        };
        let controllers = self.controllers.lock();
        for entry in controllers.values() {
            state.spawn(entry);
        }
        info!(controllers = controllers.len(), "manager started");
        *runtime = Some(state);
        Ok(())
    }

    /// Stop every controller task and wait for them to exit. A no-op when not running.
    pub async fn shutdown(&self) {
        let state = self.runtime.lock().take();
        let Some(state) = state else {
            return;
        };
        let _ = state.shutdown.send(());
        for (name, task) in state.tasks {
            if let Err(err) = task.await {
                warn!(controller = %name, error = %err, "controller join error");
            }
        }
        info!("manager shutdown complete");
    }
}

impl Manager for ControllerManager {
    fn add_controller(&self, registration: ControllerRegistration) -> Result<(), ManagerError> {
        if registration.max_concurrent_reconciles == 0 {
            return Err(ManagerError::InvalidRegistration {
                name: registration.name,
                reason: "max_concurrent_reconciles must be greater than zero".to_owned(),
            });
        }
        if registration.poll_interval.is_zero() {
            return Err(ManagerError::InvalidRegistration {
                name: registration.name,
                reason: "poll_interval must be greater than zero".to_owned(),
            });
        }
        if registration.sync_interval.is_zero() {
            return Err(ManagerError::InvalidRegistration {
                name: registration.name,
                reason: "sync_interval must be greater than zero".to_owned(),
            });
        }

        let mut runtime = self.runtime.lock();
        let mut controllers = self.controllers.lock();
        if controllers.contains_key(&registration.name) {
            return Err(ManagerError::AlreadyRegistered {
                name: registration.name,
            });
        }
        let name = registration.name.clone();
        debug!(controller = %name, scope = %registration.scope, gvk = %registration.gvk, "controller attached");
        let entry = ControllerEntry {
            registration,
            polls: Arc::new(AtomicU64::new(0)),
            resyncs: Arc::new(AtomicU64::new(0)),
        };
        if let Some(state) = runtime.as_mut() {
            state.spawn(&entry);
        }
        controllers.insert(name, entry);
        Ok(())
    }
}

fn spawn_controller_task(
    handle: &Handle,
    registration: &ControllerRegistration,
    polls: Arc<AtomicU64>,
    resyncs: Arc<AtomicU64>,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    let name = registration.name.clone();
    let poll_interval = registration.poll_interval;
    let sync_interval = registration.sync_interval;
    handle.spawn(async move {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first resync is due one full period after start.
        let mut resync = interval_at(Instant::now() + sync_interval, sync_interval);
        resync.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!(controller = %name, "controller shutdown received");
                    break;
                }
                _ = ticker.tick() => {
                    let cycle = polls.fetch_add(1, Ordering::Relaxed) + 1;
                    trace!(controller = %name, cycle, "poll cycle");
                }
                _ = resync.tick() => {
                    let cycle = resyncs.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(controller = %name, cycle, "full resync");
                }
            }
        }
        debug!(controller = %name, "controller loop exited");
    })
}
