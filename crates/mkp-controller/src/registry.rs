//! ---
//! mkp_section: "04-configuration-orchestration"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Controller units and the fixed per-scope registry."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
use std::fmt;
use std::sync::Arc;

use mkp_common::config::{ActivationMode, Scope};

use crate::manager::ManagerHandle;
use crate::options::ControllerOptions;
use crate::registration::{Registration, RegistrationError};

/// A controller for one resource kind, seen only through its two entry points.
///
/// Both functions may be called once per manager; calling either twice against the
/// same manager must fail instead of attaching a second controller.
pub trait ControllerUnit: Send + Sync {
    /// Stable name used in logs and reports.
    fn name(&self) -> &str;

    /// Attach the controller unconditionally.
    fn setup(
        &self,
        manager: &ManagerHandle,
        options: &ControllerOptions,
    ) -> Result<(), RegistrationError>;

    /// Attach the controller once the unit's own feature gate allows it.
    fn setup_gated(
        &self,
        manager: &ManagerHandle,
        options: &ControllerOptions,
    ) -> Result<(), RegistrationError>;
}

/// Pairs a unit with the activation mode that selects which of its functions runs.
#[derive(Clone, Copy)]
pub struct UnitRegistration<'a> {
    unit: &'a dyn ControllerUnit,
    mode: ActivationMode,
}

impl<'a> UnitRegistration<'a> {
    pub fn new(unit: &'a dyn ControllerUnit, mode: ActivationMode) -> Self {
        Self { unit, mode }
    }
}

impl Registration for UnitRegistration<'_> {
    fn register(
        &self,
        manager: &ManagerHandle,
        options: &ControllerOptions,
    ) -> Result<(), RegistrationError> {
        match self.mode {
            ActivationMode::Unconditional => self.unit.setup(manager, options),
            ActivationMode::Gated => self.unit.setup_gated(manager, options),
        }
    }
}

/// Ordered, immutable list of the controller units of one scope.
#[derive(Clone)]
pub struct RegistryList {
    scope: Scope,
    units: Arc<[Arc<dyn ControllerUnit>]>,
}

impl fmt::Debug for RegistryList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryList")
            .field("scope", &self.scope)
            .field("units", &self.names())
            .finish()
    }
}

impl RegistryList {
    pub fn new<I>(scope: Scope, units: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn ControllerUnit>>,
    {
        Self {
            scope,
            units: units.into_iter().collect(),
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> impl Iterator<Item = &dyn ControllerUnit> + '_ {
        self.units.iter().map(|unit| unit.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.units().map(|unit| unit.name()).collect()
    }

    /// Registrations for `mode`, in list order.
    pub fn registrations(
        &self,
        mode: ActivationMode,
    ) -> impl Iterator<Item = UnitRegistration<'_>> + '_ {
        self.units()
            .map(move |unit| UnitRegistration::new(unit, mode))
    }
}
