//! ---
//! mkp_section: "04-configuration-orchestration"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Readiness gate deferring gated controller setup."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
use std::collections::HashSet;
use std::fmt;

use parking_lot::Mutex;
use tracing::debug;

use mkp_common::gvk::GroupVersionKind;

type Callback = Box<dyn FnOnce() + Send + 'static>;

struct Pending {
    requires: Vec<GroupVersionKind>,
    callback: Callback,
}

#[derive(Default)]
struct GateState {
    ready: HashSet<GroupVersionKind>,
    pending: Vec<Pending>,
}

/// Holds deferred callbacks until every resource kind they depend on is ready.
///
/// A callback fires exactly once. Callbacks never run while the gate's lock is held,
/// so a callback may register further callbacks on the same gate.
#[derive(Default)]
pub struct Gate {
    state: Mutex<GateState>,
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Gate")
            .field("ready", &state.ready.len())
            .field("pending", &state.pending.len())
            .finish()
    }
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` to run once all of `requires` are ready.
    ///
    /// Runs the callback immediately when the requirements are already met.
    pub fn register<F, I>(&self, callback: F, requires: I)
    where
        F: FnOnce() + Send + 'static,
        I: IntoIterator<Item = GroupVersionKind>,
    {
        let requires: Vec<GroupVersionKind> = requires.into_iter().collect();
        {
            let mut state = self.state.lock();
            if !requires.iter().all(|gvk| state.ready.contains(gvk)) {
                state.pending.push(Pending {
                    requires,
                    callback: Box::new(callback),
                });
                return;
            }
        }
        callback();
    }

    /// Mark `gvk` ready or not ready, firing every callback that became satisfied.
    ///
    /// Marking a kind not ready does not retract callbacks that already fired.
    pub fn set(&self, gvk: GroupVersionKind, ready: bool) {
        let fired: Vec<Callback> = {
            let mut state = self.state.lock();
            if !ready {
                state.ready.remove(&gvk);
                return;
            }
            debug!(gvk = %gvk, "gate kind ready");
            state.ready.insert(gvk);
            let GateState {
                ready: ready_kinds,
                pending,
            } = &mut *state;
            let (satisfied, waiting): (Vec<Pending>, Vec<Pending>) = pending
                .drain(..)
                .partition(|p| p.requires.iter().all(|kind| ready_kinds.contains(kind)));
            *pending = waiting;
            satisfied.into_iter().map(|p| p.callback).collect()
        };
        for callback in fired {
            callback();
        }
    }

    pub fn is_ready(&self, gvk: &GroupVersionKind) -> bool {
        self.state.lock().ready.contains(gvk)
    }

    /// Number of callbacks still waiting on the gate.
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }
}
