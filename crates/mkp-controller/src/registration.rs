//! ---
//! mkp_section: "04-configuration-orchestration"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Sequential fail-fast registration primitive."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
use mkp_logging::{mkp_debug, mkp_error, LogContext};
use thiserror::Error;

use crate::manager::{ManagerError, ManagerHandle};
use crate::options::ControllerOptions;

/// Failure reported by a controller unit's registration function.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error(transparent)]
    Manager(#[from] ManagerError),
    #[error("cannot set up controller {controller}: {reason}")]
    Setup { controller: String, reason: String },
}

/// One registration function: attaches a controller to `manager` or reports why not.
pub trait Registration {
    fn register(
        &self,
        manager: &ManagerHandle,
        options: &ControllerOptions,
    ) -> Result<(), RegistrationError>;
}

impl<F> Registration for F
where
    F: Fn(&ManagerHandle, &ControllerOptions) -> Result<(), RegistrationError>,
{
    fn register(
        &self,
        manager: &ManagerHandle,
        options: &ControllerOptions,
    ) -> Result<(), RegistrationError> {
        self(manager, options)
    }
}

/// How far a registration pass got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationProgress {
    /// Registrations that returned `Ok`, counted from the start of the sequence.
    pub registered: usize,
    /// The first error encountered; later registrations were not attempted.
    pub error: Option<RegistrationError>,
}

impl RegistrationProgress {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<(), RegistrationError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Invoke every registration in order and stop at the first failure.
///
/// The failing registration's error is returned unchanged. Registrations that
/// already succeeded stay attached to the manager.
pub fn run_sequential<I, R>(
    manager: &ManagerHandle,
    options: &ControllerOptions,
    registrations: I,
) -> Result<(), RegistrationError>
where
    I: IntoIterator<Item = R>,
    R: Registration,
{
    run_sequential_with_progress(manager, options, registrations).into_result()
}

/// Same pass as [`run_sequential`], additionally reporting how many registrations succeeded.
pub fn run_sequential_with_progress<I, R>(
    manager: &ManagerHandle,
    options: &ControllerOptions,
    registrations: I,
) -> RegistrationProgress
where
    I: IntoIterator<Item = R>,
    R: Registration,
{
    let mut registered = 0usize;
    for registration in registrations {
        let ctx = LogContext::new().with_position(registered as u64 + 1);
        if let Err(error) = registration.register(manager, options) {
            mkp_error!(context = ctx, "registration failed: {}", error);
            return RegistrationProgress {
                registered,
                error: Some(error),
            };
        }
        mkp_debug!(context = ctx, "registration succeeded");
        registered += 1;
    }
    RegistrationProgress {
        registered,
        error: None,
    }
}
