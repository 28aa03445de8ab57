//! ---
//! mkp_section: "01-core-functionality"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Provider configuration model and loader."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, DurationSeconds};
use strum::{AsRefStr, Display, EnumString};
use tracing::debug;

use crate::gvk::GroupVersionKind;
use crate::logging::LogFormat;

fn default_poll_interval() -> Duration {
    Duration::from_secs(600)
}

fn default_sync_interval() -> Duration {
    Duration::from_secs(3600)
}

fn default_max_concurrent_reconciles() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_metrics_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Operating scope partitioning the controller registries.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Scope {
    /// Cluster-wide managed resources.
    Cluster,
    /// Namespace-scoped managed resources.
    Namespaced,
}

/// Which registration function of every controller unit a pass invokes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ActivationMode {
    /// Attach every controller immediately.
    #[default]
    Unconditional,
    /// Defer attachment until the unit's feature gate opens.
    Gated,
}

/// Primary configuration object for the provider process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub scopes: ScopesConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Metadata describing where a [`ProviderConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedProviderConfig {
    pub config: ProviderConfig,
    pub source: PathBuf,
}

impl ProviderConfig {
    pub const ENV_CONFIG_PATH: &'static str = "MKP_CONFIG";

    /// Load configuration from disk, respecting the `MKP_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedProviderConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedProviderConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(&path)?;
                return Ok(LoadedProviderConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        contents
            .parse::<ProviderConfig>()
            .with_context(|| format!("failed to load config file {}", path.display()))
    }

    /// Scopes whose registries should be activated, cluster scope first.
    pub fn enabled_scopes(&self) -> Vec<Scope> {
        let mut scopes = Vec::with_capacity(2);
        if self.scopes.cluster {
            scopes.push(Scope::Cluster);
        }
        if self.scopes.namespaced {
            scopes.push(Scope::Namespaced);
        }
        scopes
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.controller.validate()?;
        if !self.scopes.cluster && !self.scopes.namespaced {
            return Err(anyhow!("configuration must enable at least one scope"));
        }
        Ok(())
    }
}

impl std::str::FromStr for ProviderConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: ProviderConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Options handed to every controller unit during registration.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default = "default_poll_interval")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub poll_interval: Duration,
    #[serde(default = "default_sync_interval")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub sync_interval: Duration,
    #[serde(default = "default_max_concurrent_reconciles")]
    pub max_concurrent_reconciles: usize,
    #[serde(default)]
    pub activation: ActivationMode,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            sync_interval: default_sync_interval(),
            max_concurrent_reconciles: default_max_concurrent_reconciles(),
            activation: ActivationMode::default(),
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(anyhow!("controller.poll_interval must be greater than zero"));
        }
        if self.sync_interval.is_zero() {
            return Err(anyhow!("controller.sync_interval must be greater than zero"));
        }
        if self.max_concurrent_reconciles == 0 {
            return Err(anyhow!(
                "controller.max_concurrent_reconciles must be greater than zero"
            ));
        }
        Ok(())
    }
}

/// Feature toggles interpreted by individual controller units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default = "default_true")]
    pub management_policies: bool,
    #[serde(default)]
    pub change_logs: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            management_policies: true,
            change_logs: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopesConfig {
    #[serde(default = "default_true")]
    pub cluster: bool,
    #[serde(default = "default_true")]
    pub namespaced: bool,
}

impl Default for ScopesConfig {
    fn default() -> Self {
        Self {
            cluster: true,
            namespaced: true,
        }
    }
}

/// Which resource kinds the host reports as established for gated activation.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Treat every kind known to the enabled scopes as established.
    #[serde(default = "default_true")]
    pub assume_established: bool,
    /// Explicit kinds, formatted as `group/version, Kind=Kind`.
    #[serde_as(as = "IndexSet<DisplayFromStr>")]
    #[serde(default)]
    pub established: IndexSet<GroupVersionKind>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            assume_established: true,
            established: IndexSet::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_metrics_listen")]
    pub listen: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: default_metrics_listen(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: ProviderConfig = "".parse().expect("defaults are valid");
        assert_eq!(config.controller.poll_interval, Duration::from_secs(600));
        assert_eq!(config.controller.max_concurrent_reconciles, 10);
        assert_eq!(config.controller.activation, ActivationMode::Unconditional);
        assert!(config.features.management_policies);
        assert_eq!(
            config.enabled_scopes(),
            vec![Scope::Cluster, Scope::Namespaced]
        );
    }

    #[test]
    fn durations_are_parsed_as_seconds() {
        let config: ProviderConfig = r#"
            [controller]
            poll_interval = 30
            sync_interval = 120
            activation = "gated"
        "#
        .parse()
        .expect("valid config");
        assert_eq!(config.controller.poll_interval, Duration::from_secs(30));
        assert_eq!(config.controller.sync_interval, Duration::from_secs(120));
        assert_eq!(config.controller.activation, ActivationMode::Gated);
    }

    #[test]
    fn rejects_zero_concurrency() {
        let err = r#"
            [controller]
            max_concurrent_reconciles = 0
        "#
        .parse::<ProviderConfig>()
        .expect_err("zero concurrency must be rejected");
        assert!(err.to_string().contains("max_concurrent_reconciles"));
    }

    #[test]
    fn rejects_all_scopes_disabled() {
        let err = r#"
            [scopes]
            cluster = false
            namespaced = false
        "#
        .parse::<ProviderConfig>()
        .expect_err("at least one scope is required");
        assert!(err.to_string().contains("at least one scope"));
    }

    #[test]
    fn rejects_malformed_established_kind() {
        let err = r#"
            [controller]
            activation = "gated"

            [gate]
            established = ["definitely not a gvk"]
        "#
        .parse::<ProviderConfig>()
        .expect_err("established kinds must parse");
        assert!(format!("{:#}", err).contains("definitely not a gvk"));
    }

    #[test]
    fn scope_and_mode_parse_from_cli_strings() {
        assert_eq!("Namespaced".parse::<Scope>().unwrap(), Scope::Namespaced);
        assert_eq!("gated".parse::<ActivationMode>().unwrap(), ActivationMode::Gated);
        assert_eq!(Scope::Cluster.to_string(), "cluster");
        assert!("regional".parse::<Scope>().is_err());
    }
}
