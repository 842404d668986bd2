use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use titanoboa::core::telemetry::init_tracing;
use titanoboa::{Framework, FrameworkConfig};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "titanoboa")]
#[command(about = "Discover, register and run orchestration units")]
struct Cli {
    /// Command to execute (only `init` is supported)
    command: String,
    /// Name of the project
    project_name: String,
    /// YAML configuration file
    #[arg(long, env = "TITANOBOA_CONFIG")]
    config: Option<PathBuf>,
    /// Discover units from this directory instead of the linked catalog
    #[arg(long)]
    units_dir: Option<PathBuf>,
}

impl Cli {
    fn load_config(&self) -> Result<FrameworkConfig> {
        let mut config = match &self.config {
            Some(path) => FrameworkConfig::from_yaml_file(path)?,
            None => FrameworkConfig::default(),
        };
        if let Some(dir) = &self.units_dir {
            config.discovery.root = Some(dir.clone());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing("titanoboa=info");
    let cli = Cli::parse();

    if cli.command != "init" {
        error!(command = %cli.command, stage = "startup", "Unknown command");
        return ExitCode::FAILURE;
    }

    match run_init(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(stage = "startup", error = %e, "Initialization failed");
            ExitCode::FAILURE
        }
    }
}

async fn run_init(cli: &Cli) -> Result<()> {
    let config = cli.load_config()?;
    let report = Framework::init(cli.project_name.clone(), config).await?;

    info!(
        project = %report.project,
        run_id = %report.run_id,
        registered = report.discovery.registered.len(),
        load_failures = report.discovery.load_failures.len(),
        succeeded = report.run.succeeded.len(),
        failed = report.run.failed.len(),
        acknowledged = report.exchange.producer.received(),
        sent = report.exchange.producer.sent(),
        "Project initialized"
    );
    Ok(())
}
