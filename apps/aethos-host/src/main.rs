use anyhow::Result;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use aethos_bootstrap::{AppConfig, CliArgs};
use aethos_container::{
    run, AppContext, FolderLoader, ModuleCatalog, ModuleLoader, RunOptions, ShutdownOptions,
};

use std::path::{Path, PathBuf};
use std::sync::Arc;

mod registered_modules;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Aethos Host - boots the service container with every linked module
#[derive(Parser)]
#[command(name = "aethos-host")]
#[command(about = "Aethos Host - dependency-aware service container")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder whose file names select modules (overrides container.service_folder)
    #[arg(long)]
    service_folder: Option<String>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install and start all services, then wait for a shutdown signal
    Run,
    /// Validate configuration and module selection, then exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        service_folder: cli.service_folder.clone(),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (APP__*) -> 4) CLI overrides
    // Also normalizes + creates host.home_dir.
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    aethos_bootstrap::init_logging_unified(&logging_config, Path::new(&config.host.home_dir));

    tracing::info!("Aethos Host starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_host(config).await,
        Commands::Check => check_config(config),
    }
}

/// Folder-driven selection when `container.service_folder` is set; every
/// linked module otherwise.
fn select_loader(config: &AppConfig) -> Box<dyn ModuleLoader> {
    let catalog = ModuleCatalog::discover();
    match &config.container.service_folder {
        Some(folder) => {
            tracing::info!(folder = %folder, "Using folder loader");
            Box::new(FolderLoader::new(catalog))
        }
        None => {
            tracing::info!(modules = catalog.len(), "Using linked module catalog");
            Box::new(catalog)
        }
    }
}

async fn run_host(config: AppConfig) -> Result<()> {
    tracing::info!("Initializing services…");

    let loader = select_loader(&config);
    let run_options = RunOptions {
        config: Arc::new(config),
        app: AppContext::empty(),
        loader,
        shutdown: ShutdownOptions::Signals,
    };

    run(run_options).await
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration…");

    let config = Arc::new(config);
    let mut registry = aethos_container::ServiceRegistry::new(Arc::clone(&config));
    let modules = select_loader(&config).load(&AppContext::empty(), &mut registry)?;

    println!("Configuration is valid");
    println!("Modules configured: {modules}");
    for name in registry.service_names() {
        println!("  service: {name}");
    }
    Ok(())
}
