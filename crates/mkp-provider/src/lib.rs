//! ---
//! mkp_section: "02-resource-controllers"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "MetaKube controller units and scope registries."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
//! Controller units for the MetaKube resource kinds and the cluster and
//! namespaced registries composed from them, plus the startup sequence
//! that registers the enabled scopes and releases the gate.

pub mod controller;
pub mod resource;
pub mod startup;

pub use controller::{resource_kinds, scope_instance};
pub use resource::{api_group, ControllerKind, ResourceController, ROOT_GROUP};
pub use startup::{bootstrap, established_kinds, register_scopes, release_gate};
