//! ---
//! mkp_section: "02-resource-controllers"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Controller unit attaching one MetaKube resource kind to the manager."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
use std::sync::Arc;

use mkp_common::config::Scope;
use mkp_controller::{
    ControllerOptions, ControllerRegistration, ControllerUnit, GroupVersionKind, ManagerHandle,
    RegistrationError,
};
use mkp_logging::{mkp_error, LogContext};

/// API group every MetaKube resource lives under.
pub const ROOT_GROUP: &str = "metakube.syseleven.de";
/// Infix marking the namespaced variant of a group.
pub const NAMESPACED_INFIX: &str = "m";

pub const MANAGED_API_VERSION: &str = "v1alpha1";
pub const PROVIDER_CONFIG_API_VERSION: &str = "v1beta1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerKind {
    /// Reconciles a managed resource against the remote API.
    Managed,
    /// Tracks provider credentials and their usages.
    ProviderConfig,
}

impl ControllerKind {
    fn prefix(&self) -> &'static str {
        match self {
            ControllerKind::Managed => "managed",
            ControllerKind::ProviderConfig => "providerconfig",
        }
    }
}

/// Full API group for a short group name in `scope`.
///
/// An empty short group addresses the root group itself.
pub fn api_group(scope: Scope, short_group: &str) -> String {
    match (scope, short_group.is_empty()) {
        (Scope::Cluster, true) => ROOT_GROUP.to_owned(),
        (Scope::Cluster, false) => format!("{}.{}", short_group, ROOT_GROUP),
        (Scope::Namespaced, true) => format!("{}.{}", NAMESPACED_INFIX, ROOT_GROUP),
        (Scope::Namespaced, false) => {
            format!("{}.{}.{}", short_group, NAMESPACED_INFIX, ROOT_GROUP)
        }
    }
}

/// Controller unit for one resource kind in one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceController {
    scope: Scope,
    kind: ControllerKind,
    gvk: GroupVersionKind,
    name: String,
}

impl ResourceController {
    pub fn new(scope: Scope, kind: ControllerKind, gvk: GroupVersionKind) -> Self {
        let name = format!("{}/{}", kind.prefix(), gvk);
        Self {
            scope,
            kind,
            gvk,
            name,
        }
    }

    /// Managed resource `kind` in short group `short_group`.
    pub fn managed(scope: Scope, short_group: &str, kind: &str) -> Self {
        let gvk = GroupVersionKind::new(api_group(scope, short_group), MANAGED_API_VERSION, kind);
        Self::new(scope, ControllerKind::Managed, gvk)
    }

    /// The scope's `ProviderConfig` controller.
    pub fn provider_config(scope: Scope) -> Self {
        let gvk = GroupVersionKind::new(
            api_group(scope, ""),
            PROVIDER_CONFIG_API_VERSION,
            "ProviderConfig",
        );
        Self::new(scope, ControllerKind::ProviderConfig, gvk)
    }

    pub fn into_unit(self) -> Arc<dyn ControllerUnit> {
        Arc::new(self)
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn gvk(&self) -> &GroupVersionKind {
        &self.gvk
    }

    fn registration(&self, options: &ControllerOptions) -> ControllerRegistration {
        let managed = self.kind == ControllerKind::Managed;
        ControllerRegistration {
            name: self.name.clone(),
            scope: self.scope,
            gvk: self.gvk.clone(),
            poll_interval: options.poll_interval,
            sync_interval: options.sync_interval,
            max_concurrent_reconciles: options.max_concurrent_reconciles,
            management_policies: managed && options.features.management_policies,
            change_logs: managed && options.features.change_logs,
        }
    }
}

impl ControllerUnit for ResourceController {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(
        &self,
        manager: &ManagerHandle,
        options: &ControllerOptions,
    ) -> Result<(), RegistrationError> {
        manager.add_controller(self.registration(options))?;
        Ok(())
    }

    /// Defers [`ResourceController::setup`] until the gate reports this unit's kind ready.
    ///
    /// Errors raised when the deferred setup finally runs are logged; the pass that
    /// registered the callback has already returned.
    fn setup_gated(
        &self,
        manager: &ManagerHandle,
        options: &ControllerOptions,
    ) -> Result<(), RegistrationError> {
        let manager = manager.clone();
        let registration = self.registration(options);
        let scope = self.scope;
        options.gate.register(
            move || {
                let name = registration.name.clone();
                if let Err(err) = manager.add_controller(registration) {
                    let ctx = LogContext::new()
                        .with_scope(scope.as_ref())
                        .with_controller(&name)
                        .with_mode("gated");
                    mkp_error!(context = ctx, "unable to set up gated controller: {}", err);
                }
            },
            [self.gvk.clone()],
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use mkp_controller::{ControllerManager, ManagerError};

    #[test]
    fn groups_follow_scope() {
        assert_eq!(api_group(Scope::Cluster, "node"), "node.metakube.syseleven.de");
        assert_eq!(
            api_group(Scope::Namespaced, "node"),
            "node.m.metakube.syseleven.de"
        );
        assert_eq!(api_group(Scope::Cluster, ""), "metakube.syseleven.de");
        assert_eq!(api_group(Scope::Namespaced, ""), "m.metakube.syseleven.de");
    }

    #[test]
    fn controller_names_carry_prefix_and_gvk() {
        let unit = ResourceController::managed(Scope::Cluster, "metakube", "SSHKey");
        assert_eq!(
            unit.name(),
            "managed/metakube.metakube.syseleven.de/v1alpha1, Kind=SSHKey"
        );
        let pc = ResourceController::provider_config(Scope::Namespaced);
        assert_eq!(
            pc.name(),
            "providerconfig/m.metakube.syseleven.de/v1beta1, Kind=ProviderConfig"
        );
    }

    #[test]
    fn setup_attaches_registration_built_from_options() {
        let concrete = Arc::new(ControllerManager::new());
        let manager: ManagerHandle = concrete.clone();
        let mut options = ControllerOptions::default();
        options.max_concurrent_reconciles = 4;
        options.sync_interval = Duration::from_secs(90);
        options.features.change_logs = true;

        let unit = ResourceController::managed(Scope::Cluster, "node", "Deployment");
        unit.setup(&manager, &options).expect("setup");

        let attached = concrete.controllers();
        assert_eq!(attached.len(), 1);
        assert_eq!(attached[0].name, unit.name());
        assert_eq!(attached[0].max_concurrent_reconciles, 4);
        assert_eq!(attached[0].sync_interval, Duration::from_secs(90));
        assert!(attached[0].management_policies);
        assert!(attached[0].change_logs);
    }

    #[test]
    fn provider_config_ignores_managed_features() {
        let concrete = Arc::new(ControllerManager::new());
        let manager: ManagerHandle = concrete.clone();
        let unit = ResourceController::provider_config(Scope::Cluster);
        unit.setup(&manager, &ControllerOptions::default())
            .expect("setup");
        assert!(!concrete.controllers()[0].management_policies);
    }

    #[test]
    fn second_setup_on_same_manager_errors() {
        let manager: ManagerHandle = Arc::new(ControllerManager::new());
        let options = ControllerOptions::default();
        let unit = ResourceController::managed(Scope::Cluster, "role", "Binding");
        unit.setup(&manager, &options).expect("first");
        let err = unit.setup(&manager, &options).expect_err("duplicate");
        assert_eq!(
            err,
            RegistrationError::Manager(ManagerError::AlreadyRegistered {
                name: unit.name().to_owned()
            })
        );
    }

    #[test]
    fn gated_setup_waits_for_gate() {
        let concrete = Arc::new(ControllerManager::new());
        let manager: ManagerHandle = concrete.clone();
        let options = ControllerOptions::default();
        let unit = ResourceController::managed(Scope::Namespaced, "metakube", "Cluster");

        unit.setup_gated(&manager, &options).expect("gated setup");
        assert!(concrete.is_empty());
        assert_eq!(options.gate.pending(), 1);

        options.gate.set(unit.gvk().clone(), true);
        assert_eq!(concrete.controller_names(), vec![unit.name().to_owned()]);
    }
}
