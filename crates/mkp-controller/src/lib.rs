//! ---
//! mkp_section: "04-configuration-orchestration"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Controller registration kernel coordinating scopes and activation modes."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
//! Registration core: attaches the controller units of a scope to a manager,
//! in order, stopping at the first failure.

pub mod gate;
pub mod manager;
pub mod options;
pub mod registration;
pub mod registry;
pub mod scope;

pub use gate::Gate;
pub use mkp_common::gvk::{GroupVersionKind, ParseGvkError};
pub use manager::{ControllerManager, ControllerRegistration, Manager, ManagerError, ManagerHandle};
pub use mkp_common::config::{ActivationMode, Scope};
pub use options::{ControllerOptions, FeatureFlags};
pub use registration::{
    run_sequential, run_sequential_with_progress, Registration, RegistrationError,
    RegistrationProgress,
};
pub use registry::{ControllerUnit, RegistryList, UnitRegistration};
pub use scope::{RegistrationReport, ScopeInstance};
