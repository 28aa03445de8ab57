//! ---
//! mkp_section: "04-configuration-orchestration"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Per-scope entry points over a fixed registry."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
use std::time::{Duration, Instant};

use mkp_common::config::{ActivationMode, Scope};
use mkp_logging::{log_system_event, LogContext, SystemEventOutcome};

use crate::manager::ManagerHandle;
use crate::options::ControllerOptions;
use crate::registration::{run_sequential, run_sequential_with_progress, RegistrationError};
use crate::registry::RegistryList;

/// Outcome of one registration pass over a scope, naming the units involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationReport {
    pub scope: Scope,
    pub mode: ActivationMode,
    /// Units whose registration returned `Ok`, in invocation order.
    pub registered: Vec<String>,
    /// The unit that failed and its error, if the pass was cut short.
    pub failure: Option<(String, RegistrationError)>,
    /// Wall-clock time the pass took.
    pub elapsed: Duration,
}

impl RegistrationReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    pub fn into_result(self) -> Result<(), RegistrationError> {
        match self.failure {
            Some((_, err)) => Err(err),
            None => Ok(()),
        }
    }
}

/// Binds the registration entry points of one operating scope to its registry.
///
/// Stateless between calls; every call is an independent pass.
#[derive(Debug, Clone)]
pub struct ScopeInstance {
    registry: RegistryList,
}

impl ScopeInstance {
    pub fn new(registry: RegistryList) -> Self {
        Self { registry }
    }

    pub fn scope(&self) -> Scope {
        self.registry.scope()
    }

    pub fn registry(&self) -> &RegistryList {
        &self.registry
    }

    /// Register every controller of the scope unconditionally.
    pub fn setup(
        &self,
        manager: &ManagerHandle,
        options: &ControllerOptions,
    ) -> Result<(), RegistrationError> {
        self.activate(ActivationMode::Unconditional, manager, options)
    }

    /// Register every controller of the scope through its gated entry point.
    pub fn setup_gated(
        &self,
        manager: &ManagerHandle,
        options: &ControllerOptions,
    ) -> Result<(), RegistrationError> {
        self.activate(ActivationMode::Gated, manager, options)
    }

    pub fn activate(
        &self,
        mode: ActivationMode,
        manager: &ManagerHandle,
        options: &ControllerOptions,
    ) -> Result<(), RegistrationError> {
        run_sequential(manager, options, self.registry.registrations(mode))
    }

    /// Run a pass like [`ScopeInstance::activate`] and report which units registered.
    pub fn register(
        &self,
        mode: ActivationMode,
        manager: &ManagerHandle,
        options: &ControllerOptions,
    ) -> RegistrationReport {
        let scope = self.scope();
        let started = Instant::now();
        let progress =
            run_sequential_with_progress(manager, options, self.registry.registrations(mode));
        let names = self.registry.names();
        let registered: Vec<String> = names[..progress.registered]
            .iter()
            .map(|name| (*name).to_owned())
            .collect();
        let failure = progress
            .error
            .map(|err| (names[progress.registered].to_owned(), err));
        let elapsed = started.elapsed();

        let ctx = LogContext::new()
            .with_scope(scope.as_ref())
            .with_mode(mode.as_ref());
        match &failure {
            None => log_system_event(
                Some(&ctx),
                "registration.pass",
                &format!("registered {} controllers", registered.len()),
                SystemEventOutcome::Success,
            ),
            Some((unit, err)) => {
                let ctx = ctx
                    .with_controller(unit)
                    .with_position(progress.registered as u64 + 1);
                log_system_event(
                    Some(&ctx),
                    "registration.pass",
                    &format!("registration aborted: {}", err),
                    SystemEventOutcome::Fault,
                );
            }
        }

        RegistrationReport {
            scope,
            mode,
            registered,
            failure,
            elapsed,
        }
    }
}
