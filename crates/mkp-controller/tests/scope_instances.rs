//! ---
//! mkp_section: "04-configuration-orchestration"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Registration pass behaviour across modes and scopes."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
use std::sync::Arc;

use mkp_controller::{
    ActivationMode, ControllerManager, ControllerOptions, ControllerUnit, ManagerHandle,
    RegistrationError, RegistryList, Scope, ScopeInstance,
};
use parking_lot::Mutex;

type Trace = Arc<Mutex<Vec<(String, ActivationMode)>>>;

struct RecordingUnit {
    name: String,
    fail_in: Option<ActivationMode>,
    trace: Trace,
}

impl RecordingUnit {
    fn new(name: &str, trace: &Trace) -> Arc<dyn ControllerUnit> {
        Arc::new(Self {
            name: name.to_owned(),
            fail_in: None,
            trace: trace.clone(),
        })
    }

    fn failing(name: &str, mode: ActivationMode, trace: &Trace) -> Arc<dyn ControllerUnit> {
        Arc::new(Self {
            name: name.to_owned(),
            fail_in: Some(mode),
            trace: trace.clone(),
        })
    }

    fn record(&self, mode: ActivationMode) -> Result<(), RegistrationError> {
        self.trace.lock().push((self.name.clone(), mode));
        if self.fail_in == Some(mode) {
            return Err(error_for(&self.name));
        }
        Ok(())
    }
}

impl ControllerUnit for RecordingUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&self, _: &ManagerHandle, _: &ControllerOptions) -> Result<(), RegistrationError> {
        self.record(ActivationMode::Unconditional)
    }

    fn setup_gated(
        &self,
        _: &ManagerHandle,
        _: &ControllerOptions,
    ) -> Result<(), RegistrationError> {
        self.record(ActivationMode::Gated)
    }
}

fn error_for(name: &str) -> RegistrationError {
    RegistrationError::Setup {
        controller: name.to_owned(),
        reason: "remote kind unavailable".to_owned(),
    }
}

fn manager() -> ManagerHandle {
    Arc::new(ControllerManager::new())
}

fn names(trace: &Trace) -> Vec<String> {
    trace.lock().iter().map(|(name, _)| name.clone()).collect()
}

#[test]
fn empty_registry_succeeds_without_invoking_anything() {
    let scope = ScopeInstance::new(RegistryList::new(Scope::Cluster, Vec::new()));
    let options = ControllerOptions::default();
    scope.setup(&manager(), &options).expect("empty setup");
    scope.setup_gated(&manager(), &options).expect("empty gated setup");
    let report = scope.register(ActivationMode::Unconditional, &manager(), &options);
    assert!(report.is_complete());
    assert!(report.registered.is_empty());
}

#[test]
fn failing_unit_stops_the_pass_and_surfaces_its_error() {
    let trace = Trace::default();
    let scope = ScopeInstance::new(RegistryList::new(
        Scope::Cluster,
        vec![
            RecordingUnit::new("a", &trace),
            RecordingUnit::failing("b", ActivationMode::Unconditional, &trace),
            RecordingUnit::new("c", &trace),
        ],
    ));

    let err = scope
        .setup(&manager(), &ControllerOptions::default())
        .expect_err("b fails");
    assert_eq!(err, error_for("b"));
    assert_eq!(names(&trace), vec!["a", "b"]);
}

#[test]
fn successful_pass_invokes_each_unit_once_in_order() {
    let trace = Trace::default();
    let scope = ScopeInstance::new(RegistryList::new(
        Scope::Namespaced,
        vec![RecordingUnit::new("a", &trace), RecordingUnit::new("b", &trace)],
    ));
    scope
        .setup(&manager(), &ControllerOptions::default())
        .expect("all succeed");
    assert_eq!(names(&trace), vec!["a", "b"]);
}

#[test]
fn modes_select_the_matching_entry_point() {
    let trace = Trace::default();
    let scope = ScopeInstance::new(RegistryList::new(
        Scope::Cluster,
        vec![
            RecordingUnit::new("a", &trace),
            RecordingUnit::new("b", &trace),
            RecordingUnit::new("c", &trace),
        ],
    ));
    let options = ControllerOptions::default();

    scope.setup_gated(&manager(), &options).expect("gated");
    assert!(trace
        .lock()
        .iter()
        .all(|(_, mode)| *mode == ActivationMode::Gated));

    trace.lock().clear();
    scope.setup(&manager(), &options).expect("unconditional");
    assert!(trace
        .lock()
        .iter()
        .all(|(_, mode)| *mode == ActivationMode::Unconditional));
}

#[test]
fn failure_in_one_mode_does_not_affect_the_other() {
    let trace = Trace::default();
    let scope = ScopeInstance::new(RegistryList::new(
        Scope::Cluster,
        vec![
            RecordingUnit::failing("a", ActivationMode::Gated, &trace),
            RecordingUnit::new("b", &trace),
        ],
    ));
    let options = ControllerOptions::default();
    scope.setup(&manager(), &options).expect("unconditional is fine");
    assert_eq!(
        scope.setup_gated(&manager(), &options),
        Err(error_for("a"))
    );
}

#[test]
fn scopes_never_invoke_each_other() {
    let cluster_trace = Trace::default();
    let namespaced_trace = Trace::default();
    let cluster = ScopeInstance::new(RegistryList::new(
        Scope::Cluster,
        vec![RecordingUnit::new("cluster-a", &cluster_trace)],
    ));
    let namespaced = ScopeInstance::new(RegistryList::new(
        Scope::Namespaced,
        vec![RecordingUnit::new("namespaced-a", &namespaced_trace)],
    ));

    cluster
        .setup(&manager(), &ControllerOptions::default())
        .expect("cluster");
    assert_eq!(names(&cluster_trace), vec!["cluster-a"]);
    assert!(namespaced_trace.lock().is_empty());

    namespaced
        .setup_gated(&manager(), &ControllerOptions::default())
        .expect("namespaced");
    assert_eq!(names(&cluster_trace), vec!["cluster-a"]);
    assert_eq!(names(&namespaced_trace), vec!["namespaced-a"]);
}

#[test]
fn report_names_registered_and_failing_units() {
    let trace = Trace::default();
    let scope = ScopeInstance::new(RegistryList::new(
        Scope::Namespaced,
        vec![
            RecordingUnit::new("a", &trace),
            RecordingUnit::new("b", &trace),
            RecordingUnit::failing("c", ActivationMode::Gated, &trace),
            RecordingUnit::new("d", &trace),
        ],
    ));
    let report = scope.register(ActivationMode::Gated, &manager(), &ControllerOptions::default());
    assert_eq!(report.scope, Scope::Namespaced);
    assert_eq!(report.mode, ActivationMode::Gated);
    assert_eq!(report.registered, vec!["a", "b"]);
    assert_eq!(report.failure, Some(("c".to_owned(), error_for("c"))));
    assert_eq!(names(&trace), vec!["a", "b", "c"]);
    assert_eq!(report.into_result(), Err(error_for("c")));
}

#[test]
fn passes_are_independent_across_managers() {
    let trace = Trace::default();
    let scope = ScopeInstance::new(RegistryList::new(
        Scope::Cluster,
        vec![RecordingUnit::new("a", &trace)],
    ));
    let options = ControllerOptions::default();
    scope.setup(&manager(), &options).expect("first pass");
    scope.setup(&manager(), &options).expect("second pass");
    assert_eq!(names(&trace), vec!["a", "a"]);
}
