//! ---
//! mkp_section: "01-core-functionality"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Shared primitives and utilities for the provider runtime."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
//! Shared primitives for the MetaKube provider workspace.
//! This crate exposes configuration loading, resource kind identifiers and tracing setup consumed
//! by the registration core and the daemon.

pub mod config;
pub mod gvk;
pub mod logging;

pub use config::{
    ActivationMode, ControllerConfig, FeaturesConfig, GateConfig, LoadedProviderConfig,
    LoggingConfig, MetricsConfig, ProviderConfig, Scope, ScopesConfig,
};
pub use gvk::{GroupVersionKind, ParseGvkError};
pub use logging::{init_tracing, LogFormat};
