//! ---
//! mkp_section: "02-resource-controllers"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Composition roots binding controller units to their scopes."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
pub mod cluster;
pub mod namespaced;

use mkp_common::config::Scope;
use mkp_controller::{GroupVersionKind, ScopeInstance};

use crate::resource::ResourceController;

/// Controllers of `scope`, in registration order.
pub fn controllers(scope: Scope) -> Vec<ResourceController> {
    match scope {
        Scope::Cluster => cluster::controllers(),
        Scope::Namespaced => namespaced::controllers(),
    }
}

/// Resource kinds the controllers of `scope` reconcile.
pub fn resource_kinds(scope: Scope) -> Vec<GroupVersionKind> {
    controllers(scope)
        .iter()
        .map(|controller| controller.gvk().clone())
        .collect()
}

/// The scope instance serving `scope`.
pub fn scope_instance(scope: Scope) -> ScopeInstance {
    match scope {
        Scope::Cluster => cluster::scope(),
        Scope::Namespaced => namespaced::scope(),
    }
}
