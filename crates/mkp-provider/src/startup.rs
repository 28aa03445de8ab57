//! ---
//! mkp_section: "02-resource-controllers"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Startup registration across scopes and gate release."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
use indexmap::IndexSet;
use mkp_common::config::{ActivationMode, GateConfig, ProviderConfig, Scope};
use mkp_controller::{
    ControllerOptions, Gate, GroupVersionKind, ManagerHandle, RegistrationReport, ScopeInstance,
};
use tracing::info;

use crate::controller::{resource_kinds, scope_instance};

/// Run one pass per scope instance, in order, stopping after the first failed pass.
///
/// The last report carries the failure when a pass was cut short.
pub fn register_scopes<I>(
    instances: I,
    mode: ActivationMode,
    manager: &ManagerHandle,
    options: &ControllerOptions,
) -> Vec<RegistrationReport>
where
    I: IntoIterator<Item = ScopeInstance>,
{
    let mut reports = Vec::new();
    for instance in instances {
        let report = instance.register(mode, manager, options);
        let complete = report.is_complete();
        reports.push(report);
        if !complete {
            break;
        }
    }
    reports
}

/// Kinds reported as established: every kind of `scopes` when
/// `assume_established` is set, followed by the explicit list.
pub fn established_kinds(gate: &GateConfig, scopes: &[Scope]) -> IndexSet<GroupVersionKind> {
    let mut kinds = IndexSet::new();
    if gate.assume_established {
        for scope in scopes {
            kinds.extend(resource_kinds(*scope));
        }
    }
    kinds.extend(gate.established.iter().cloned());
    kinds
}

/// Mark `kinds` ready on `gate`, returning how many were not ready before.
pub fn release_gate<I>(gate: &Gate, kinds: I) -> usize
where
    I: IntoIterator<Item = GroupVersionKind>,
{
    let mut released = 0;
    for gvk in kinds {
        if gate.is_ready(&gvk) {
            continue;
        }
        gate.set(gvk, true);
        released += 1;
    }
    released
}

/// Register the enabled scopes of `config`, cluster first.
///
/// In gated mode the configured kinds are released on `options.gate` once every
/// pass has completed; a failed pass leaves the gate untouched.
pub fn bootstrap(
    config: &ProviderConfig,
    manager: &ManagerHandle,
    options: &ControllerOptions,
) -> Vec<RegistrationReport> {
    let scopes = config.enabled_scopes();
    let mode = config.controller.activation;
    let reports = register_scopes(
        scopes.iter().copied().map(scope_instance),
        mode,
        manager,
        options,
    );
    if mode == ActivationMode::Gated && reports.iter().all(RegistrationReport::is_complete) {
        let released = release_gate(&options.gate, established_kinds(&config.gate, &scopes));
        info!(
            released,
            pending = options.gate.pending(),
            "established resource kinds released"
        );
    }
    reports
}
