use anyhow::{Context, Result};
use clap::Parser;
use stampede_config::domains::logging::LogFormat;
use stampede_config::{ConfigLoader, StampedeConfig};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, ConfigCommands, ProvisionCommands, SeedCommands};

/// Load configuration from file or environment
fn load_config(config_path: Option<&PathBuf>) -> Result<StampedeConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) => {
            if path.exists() {
                info!("Loading configuration from: {:?}", path);
                loader
                    .from_file(path)
                    .context(format!("Failed to load configuration from {:?}", path))
            } else {
                warn!("Configuration file not found: {:?}. Using defaults.", path);
                loader
                    .from_env()
                    .context("Failed to load configuration from environment")
            }
        }
        None => {
            debug!("No configuration file specified. Loading from environment or defaults.");
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
    }
}

/// Initialize tracing with CLI override, environment override, then config defaults
fn init_tracing(config: &StampedeConfig, log_level: Option<&String>) -> Result<()> {
    let env_filter = match log_level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| {
            eprintln!("Invalid log level '{}', falling back to 'info'", level);
            EnvFilter::new("info")
        }),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_filter_str())),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_file(config.logging.include_location)
        .with_line_number(config.logging.include_location);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => {
            eprintln!("JSON log format is not compiled in, using text");
            builder.init()
        }
        LogFormat::Text => builder.init(),
    }

    debug!("Tracing initialized");
    Ok(())
}

/// Handle configuration file validation
fn handle_config_validate(config_file: &PathBuf) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        return Err(anyhow::anyhow!(
            "Configuration file not found: {:?}",
            config_file
        ));
    }

    match load_config(Some(config_file)).and_then(|config| {
        config
            .validate_all()
            .context("Configuration failed validation")
    }) {
        Ok(()) => {
            println!("✅ Configuration file is valid");
            info!("Configuration validation passed");
            Ok(())
        }
        Err(e) => {
            println!("❌ Configuration validation failed: {}", e);
            error!("Configuration validation failed: {}", e);
            Err(e)
        }
    }
}

/// Handle sample configuration generation
fn handle_config_generate(output: &PathBuf, force: bool) -> Result<()> {
    info!("Generating sample configuration at: {:?}", output);

    if output.exists() && !force {
        return Err(anyhow::anyhow!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        ));
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    let sample = StampedeConfig::generate_sample();
    fs::write(output, sample).context(format!("Failed to write config to {:?}", output))?;

    println!("✅ Sample configuration written to {:?}", output);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first so logging defaults come from it
    let config = load_config(cli.config.as_ref())?;
    init_tracing(&config, cli.log_level.as_ref())?;

    info!("Stampede CLI starting");
    config
        .validate_all()
        .context("Configuration failed validation")?;

    match &cli.command {
        Some(Commands::Run { scenario }) => commands::run::execute(&config, scenario).await,
        Some(Commands::Scenarios) => {
            for name in stampede_scenarios::SCENARIO_NAMES {
                println!("{}", name);
            }
            Ok(())
        }
        Some(Commands::Provision { provision_cmd }) => match provision_cmd {
            ProvisionCommands::Members {
                community_index,
                count,
            } => commands::provision::members(&config, *community_index, *count).await,
            ProvisionCommands::Content {
                community_index,
                count,
            } => commands::provision::content(&config, *community_index, *count).await,
            ProvisionCommands::Quizzes {
                group_id,
                count,
                out,
            } => commands::provision::quizzes(&config, group_id, *count, out).await,
        },
        Some(Commands::Seed { seed_cmd }) => match seed_cmd {
            SeedCommands::Export { out, count } => commands::seed::export(&config, out, *count),
        },
        Some(Commands::Config { config_cmd }) => match config_cmd {
            ConfigCommands::Validate { config_file } => handle_config_validate(config_file),
            ConfigCommands::Generate { output, force } => handle_config_generate(output, *force),
        },
        None => {
            // If no subcommand is provided, print help
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().context("Failed to print help")?;
            println!();
            Ok(())
        }
    }
}
