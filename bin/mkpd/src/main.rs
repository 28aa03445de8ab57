//! ---
//! mkp_section: "04-configuration-orchestration"
//! mkp_subsection: "binary"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Binary entrypoint for the provider daemon."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use mkp_common::config::{ActivationMode, ProviderConfig, Scope};
use mkp_common::logging::init_tracing;
use mkp_controller::{ControllerManager, ControllerOptions, ManagerHandle, RegistrationReport};
use mkp_logging::{log_system_event, LogContext, SystemEventOutcome};
use mkp_metrics::{new_registry, spawn_http_server, DaemonMetrics, RegistrationMetrics};
use mkp_provider::{bootstrap, scope_instance};
use tokio::signal;
use tracing::{error, info, warn};

const PROFILE: &str = if cfg!(debug_assertions) {
    "debug"
} else {
    "release"
};

#[derive(Debug, Parser)]
#[command(
    author,
    disable_version_flag = true,
    version = env!("CARGO_PKG_VERSION"),
    about = "MetaKube provider daemon",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(
        short = 'V',
        long = "version",
        action = ArgAction::SetTrue,
        help = "Print version information and exit"
    )]
    version: bool,

    #[arg(long, value_enum, help = "Override the activation mode")]
    mode: Option<CliMode>,

    #[arg(long, value_enum, help = "Restrict registration to one scope")]
    scope: Option<CliScope>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    Unconditional,
    Gated,
}

impl From<CliMode> for ActivationMode {
    fn from(value: CliMode) -> Self {
        match value {
            CliMode::Unconditional => ActivationMode::Unconditional,
            CliMode::Gated => ActivationMode::Gated,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliScope {
    All,
    Cluster,
    Namespaced,
}

impl CliScope {
    fn apply(self, config: &mut ProviderConfig) {
        let (cluster, namespaced) = match self {
            CliScope::All => (true, true),
            CliScope::Cluster => (true, false),
            CliScope::Namespaced => (false, true),
        };
        config.scopes.cluster = cluster;
        config.scopes.namespaced = namespaced;
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Register controllers and run the manager")]
    Run,
    #[command(about = "Print the controllers of each enabled scope in registration order")]
    List,
    #[command(about = "Load and validate the configuration, then exit")]
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("mkpd {} ({})", env!("CARGO_PKG_VERSION"), PROFILE);
        return Ok(());
    }
    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/provider.toml"));

    let load_started = Instant::now();
    let loaded_config = ProviderConfig::load_with_source(&candidates)?;
    let mut config = loaded_config.config;
    let config_path = loaded_config.source;
    let load_duration = load_started.elapsed();

    if let Some(mode) = cli.mode {
        config.controller.activation = mode.into();
    }
    if let Some(scope) = cli.scope {
        scope.apply(&mut config);
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let metrics_registry = new_registry();
            let daemon_metrics = DaemonMetrics::new(metrics_registry.clone())?;
            daemon_metrics.observe_config_load(load_duration.as_secs_f64());
            daemon_metrics.inc_start();
            daemon_metrics.set_build_info(env!("CARGO_PKG_VERSION"), PROFILE);

            init_tracing("mkpd", &config.logging)?;
            info!(config_path = %config_path.display(), "configuration loaded");
            run_daemon(config, RegistrationMetrics::new(metrics_registry.clone())?).await?
        }
        Commands::List => render_registries(&config),
        Commands::CheckConfig => {
            println!(
                "{}: ok (activation: {}, scopes: {})",
                config_path.display(),
                config.controller.activation,
                config
                    .enabled_scopes()
                    .iter()
                    .map(Scope::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }

    Ok(())
}

async fn run_daemon(config: ProviderConfig, metrics: RegistrationMetrics) -> Result<()> {
    let metrics_server = if config.metrics.enabled {
        info!(address = %config.metrics.listen, "metrics exporter enabled");
        Some(spawn_http_server(metrics.registry(), config.metrics.listen)?)
    } else {
        info!("metrics exporter disabled by configuration");
        None
    };

    let manager = Arc::new(ControllerManager::new());
    let handle: ManagerHandle = manager.clone();
    let options = ControllerOptions::from_config(&config.controller, &config.features);
    let mode = config.controller.activation;

    for report in bootstrap(&config, &handle, &options) {
        metrics.observe_pass(report.scope, report.mode, report.elapsed.as_secs_f64());
        record_report(&metrics, &report);
        if let Some((controller, err)) = report.failure {
            error!(
                scope = %report.scope,
                mode = %mode,
                controller = %controller,
                error = %err,
                "controller registration failed"
            );
            return Err(anyhow::Error::new(err)
                .context(format!("cannot set up {} controllers", report.scope)));
        }
    }
    if options.gate.pending() > 0 {
        warn!(
            pending = options.gate.pending(),
            "gated controllers waiting for their resource kinds"
        );
    }

    manager.start()?;
    let ctx = LogContext::new().with_mode(mode.as_ref());
    log_system_event(
        Some(&ctx),
        "manager.start",
        &format!("{} controllers running", manager.len()),
        SystemEventOutcome::Success,
    );

    info!("daemon running; waiting for termination signal");
    signal::ctrl_c().await?;
    info!("ctrl-c received; shutting down");
    manager.shutdown().await;

    if let Some(server) = metrics_server {
        server.shutdown().await?;
    }

    Ok(())
}

fn record_report(metrics: &RegistrationMetrics, report: &RegistrationReport) {
    metrics.set_registered(report.scope, report.mode, report.registered.len());
    if let Some((controller, _)) = &report.failure {
        metrics.record_failure(report.scope, report.mode, controller);
    }
}

fn render_registries(config: &ProviderConfig) {
    for scope in config.enabled_scopes() {
        let instance = scope_instance(scope);
        println!("{} ({} controllers)", scope, instance.registry().len());
        for (position, name) in instance.registry().names().iter().enumerate() {
            println!("  {:>2}. {}", position + 1, name);
        }
    }
}
