//! ---
//! mkp_section: "04-configuration-orchestration"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Options shared by every controller unit during a registration pass."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::Duration;

use mkp_common::config::{ControllerConfig, FeaturesConfig};

use crate::gate::Gate;

/// Feature toggles evaluated inside the controller units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    pub management_policies: bool,
    pub change_logs: bool,
}

impl From<&FeaturesConfig> for FeatureFlags {
    fn from(config: &FeaturesConfig) -> Self {
        Self {
            management_policies: config.management_policies,
            change_logs: config.change_logs,
        }
    }
}

/// Read-only configuration passed to every registration call of a pass.
///
/// The orchestrator never looks inside; only controller units interpret the fields.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub poll_interval: Duration,
    pub sync_interval: Duration,
    pub max_concurrent_reconciles: usize,
    pub features: FeatureFlags,
    pub gate: Arc<Gate>,
}

impl ControllerOptions {
    pub fn from_config(controller: &ControllerConfig, features: &FeaturesConfig) -> Self {
        Self {
            poll_interval: controller.poll_interval,
            sync_interval: controller.sync_interval,
            max_concurrent_reconciles: controller.max_concurrent_reconciles,
            features: FeatureFlags::from(features),
            gate: Arc::new(Gate::new()),
        }
    }

    /// Share an existing gate instead of the one created by [`ControllerOptions::from_config`].
    pub fn with_gate(mut self, gate: Arc<Gate>) -> Self {
        self.gate = gate;
        self
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from_config(&ControllerConfig::default(), &FeaturesConfig::default())
    }
}
