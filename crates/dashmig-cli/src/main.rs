//! dashmig - bulk-migrate Grafana dashboards to Perses.
//!
//! Starts Grafana and Perses containers, round-trips every dashboard through
//! Grafana to bring it to the latest schema, converts the results with
//! `percli`, and prints a per-stage summary.

use anyhow::Result;
use clap::{ArgAction, Parser};
use dashmig_core::config::{DefaultsConfig, PathsConfig};
use dashmig_core::{GrafanaClient, MigrateError, MigrationConfig, MigrationRun};
use dashmig_tools::{DockerRuntime, Percli};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "dashmig", version)]
#[command(about = "Migrate Grafana dashboards to Perses")]
struct Args {
    /// Directory containing Grafana dashboard JSON files
    #[arg(short, long)]
    input_dir: PathBuf,

    /// Output root (defaults to <input-dir>/.migrated)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Search subdirectories for dashboards
    #[arg(short, long)]
    recursive: bool,

    /// Host port for the Grafana container
    #[arg(long, default_value_t = DefaultsConfig::GRAFANA_PORT)]
    grafana_port: u16,

    /// Host port for the Perses container
    #[arg(long, default_value_t = DefaultsConfig::PERSES_PORT)]
    perses_port: u16,

    /// How long to wait after starting a container (e.g. 10s, 500ms, 2m)
    #[arg(long, default_value = "10s", value_parser = parse_wait)]
    wait: Duration,

    /// percli release to install
    #[arg(long, default_value = DefaultsConfig::PERCLI_VERSION)]
    perses_version: String,

    /// Perses container image
    #[arg(long, default_value = DefaultsConfig::PERSES_IMAGE)]
    perses_docker_image: String,

    /// Grafana container image
    #[arg(long, default_value = DefaultsConfig::GRAFANA_IMAGE)]
    grafana_docker_image: String,

    /// Grafana admin user
    #[arg(long, env = "GRAFANA_USER", default_value = DefaultsConfig::GRAFANA_USER)]
    grafana_user: String,

    /// Grafana admin password
    #[arg(
        long,
        env = "GRAFANA_PASSWORD",
        default_value = DefaultsConfig::GRAFANA_PASSWORD,
        hide_env_values = true
    )]
    grafana_password: String,

    /// Drop datasource names from migrated queries so Perses uses its default
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    use_default_perses_datasource: bool,

    /// Let the Perses server resolve plugin migrations
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    online_migration: bool,

    /// Remove the containers when the run ends
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    cleanup: bool,

    /// Where percli is installed
    #[arg(long, default_value = PathsConfig::TOOL_DIR_NAME)]
    tool_dir: PathBuf,

    /// Use this percli (a path or a command on PATH) instead of installing one
    #[arg(long)]
    percli_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

/// Parse a wait duration: `500ms`, `10s`, `2m`, or bare seconds.
fn parse_wait(value: &str) -> std::result::Result<Duration, String> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);

    let amount: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration '{}'", value))?;
    match unit.trim() {
        "ms" => Ok(Duration::from_millis(amount)),
        "" | "s" => Ok(Duration::from_secs(amount)),
        "m" => Ok(Duration::from_secs(amount * 60)),
        other => Err(format!(
            "invalid duration unit '{}' (expected ms, s or m)",
            other
        )),
    }
}

fn build_config(args: &Args) -> dashmig_core::Result<MigrationConfig> {
    MigrationConfig::builder(&args.input_dir)
        .output_dir(args.output_dir.clone())
        .recursive(args.recursive)
        .grafana_port(args.grafana_port)
        .perses_port(args.perses_port)
        .startup_wait(args.wait)
        .percli_version(&args.perses_version)
        .grafana_image(&args.grafana_docker_image)
        .perses_image(&args.perses_docker_image)
        .grafana_credentials(&args.grafana_user, &args.grafana_password)
        .use_default_datasource(args.use_default_perses_datasource)
        .online_migration(args.online_migration)
        .cleanup(args.cleanup)
        .tool_dir(&args.tool_dir)
        .build()
}

fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();
}

async fn run(args: Args) -> Result<()> {
    let config = build_config(&args)?;

    info!("Input directory: {}", config.input_dir.display());
    info!("Output directory: {}", config.output_dir.display());

    let grafana = GrafanaClient::from_config(&config)?;
    let docker = DockerRuntime::new();
    let mut percli = Percli::from_config(&config);
    if let Some(path) = args.percli_path {
        percli = percli.with_binary(path);
    }

    let report = MigrationRun::new(&config, &docker, &grafana, &percli)
        .execute()
        .await?;

    println!("{}", report.summary);
    println!();
    println!(
        "Grafana dashboards (latest schema): {}",
        report.schema_dir.display()
    );
    println!("Perses dashboards: {}", report.migrated_dir.display());

    Ok(())
}

/// Exit code for a failed run.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<MigrateError>()
        .map(MigrateError::exit_code)
        .and_then(|code| u8::try_from(code).ok())
        .unwrap_or(1)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    info!("Starting dashmig {}", dashmig_core::VERSION);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}
