//! ---
//! mkp_section: "02-resource-controllers"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Namespace-scoped controller registry."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
use mkp_common::config::Scope;
use mkp_controller::{
    ControllerOptions, ManagerHandle, RegistrationError, RegistryList, ScopeInstance,
};

use crate::resource::ResourceController;

/// Namespace-scoped controllers, in registration order.
pub fn controllers() -> Vec<ResourceController> {
    let scope = Scope::Namespaced;
    vec![
        ResourceController::managed(scope, "cluster", "RoleBinding"),
        ResourceController::managed(scope, "maintenance", "CronJob"),
        ResourceController::managed(scope, "metakube", "Cluster"),
        ResourceController::managed(scope, "metakube", "SSHKey"),
        ResourceController::managed(scope, "node", "Deployment"),
        ResourceController::provider_config(scope),
        ResourceController::managed(scope, "role", "Binding"),
    ]
}

pub fn registry() -> RegistryList {
    RegistryList::new(
        Scope::Namespaced,
        controllers().into_iter().map(ResourceController::into_unit),
    )
}

pub fn scope() -> ScopeInstance {
    ScopeInstance::new(registry())
}

/// Creates all namespace-scoped controllers and adds them to `manager`.
pub fn setup(
    manager: &ManagerHandle,
    options: &ControllerOptions,
) -> Result<(), RegistrationError> {
    scope().setup(manager, options)
}

/// Creates all namespace-scoped controllers behind the feature gate in `options`.
pub fn setup_gated(
    manager: &ManagerHandle,
    options: &ControllerOptions,
) -> Result<(), RegistrationError> {
    scope().setup_gated(manager, options)
}
