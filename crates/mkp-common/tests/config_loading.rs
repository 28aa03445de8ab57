//! ---
//! mkp_section: "01-core-functionality"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Provider configuration model and loader."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
use std::time::Duration;

use mkp_common::config::{ActivationMode, ProviderConfig, Scope};
use mkp_common::{GroupVersionKind, LogFormat};
use tempfile::tempdir;

#[test]
fn first_existing_candidate_wins() {
    let temp = tempdir().expect("tempdir");
    let missing = temp.path().join("missing.toml");
    let present = temp.path().join("provider.toml");
    std::fs::write(
        &present,
        r#"
            [controller]
            poll_interval = 60
            max_concurrent_reconciles = 3
            activation = "gated"

            [scopes]
            namespaced = false

            [logging]
            format = "pretty"
        "#,
    )
    .expect("write config");

    let loaded = ProviderConfig::load_with_source(&[missing, present.clone()]).expect("load");
    assert_eq!(loaded.source, present);
    assert_eq!(loaded.config.controller.poll_interval, Duration::from_secs(60));
    assert_eq!(loaded.config.controller.max_concurrent_reconciles, 3);
    assert_eq!(loaded.config.controller.activation, ActivationMode::Gated);
    assert_eq!(loaded.config.enabled_scopes(), vec![Scope::Cluster]);
    assert_eq!(loaded.config.logging.format, LogFormat::Pretty);
}

#[test]
fn missing_candidates_are_reported() {
    let temp = tempdir().expect("tempdir");
    let a = temp.path().join("a.toml");
    let b = temp.path().join("b.toml");
    let err = ProviderConfig::load(&[a, b]).expect_err("nothing to load");
    let message = err.to_string();
    assert!(message.contains("no configuration files found"));
    assert!(message.contains("a.toml"));
    assert!(message.contains("b.toml"));
}

#[test]
fn invalid_file_surfaces_path_in_error() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("broken.toml");
    std::fs::write(&path, "[controller]\npoll_interval = 0\n").expect("write config");
    let err = ProviderConfig::load(&[path]).expect_err("zero poll interval is invalid");
    let chain = format!("{:#}", err);
    assert!(chain.contains("broken.toml"));
    assert!(chain.contains("poll_interval"));
}

#[test]
fn gate_section_lists_established_kinds() {
    let config: ProviderConfig = r#"
        [gate]
        assume_established = false
        established = ["cluster.metakube.syseleven.de/v1alpha1, Kind=Cluster"]
    "#
    .parse()
    .expect("valid config");
    assert!(!config.gate.assume_established);
    let kinds: Vec<&GroupVersionKind> = config.gate.established.iter().collect();
    assert_eq!(
        kinds,
        vec![&GroupVersionKind::new(
            "cluster.metakube.syseleven.de",
            "v1alpha1",
            "Cluster"
        )]
    );
}
