//! adpc-gem - Main entry point

use clap::Parser;
use gem_common::logging::{init_logging, LogConfig, LogLevel};
use gem_publisher::commands::countries;
use gem_publisher::commands::preview::{self, PreviewOptions};
use gem_publisher::commands::publish::{self, PublishOptions};
use gem_publisher::config::ExtraParams;
use gem_publisher::template::DatasetTemplate;
use gem_publisher::{Cli, Commands};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A .env file is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    if cli.command.is_none() {
        eprintln!("Error: A subcommand is required");
        eprintln!();
        eprintln!("For more information, try '--help'.");
        process::exit(2);
    }

    let mut log_config = LogConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Warning: ignoring logging settings: {}", e);
        LogConfig::default()
    });
    if cli.verbose {
        log_config.level = LogLevel::Debug;
    }

    // The CLI works without logging, so a failed init is not fatal
    let guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        },
    };

    info!(version = env!("CARGO_PKG_VERSION"), "hdx-scraper-adpc-gem starting");

    let code = match execute_command(&cli).await {
        Ok(()) => 0,
        Err(e) => {
            error!(error_kind = e.kind(), error = %e, "Command failed");
            eprintln!("Error: {}", e);
            1
        },
    };

    // Flush file logs before exiting
    drop(guard);
    process::exit(code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> gem_publisher::Result<()> {
    let Some(ref command) = cli.command else {
        return Ok(());
    };

    let extra = ExtraParams::parse(cli.extra_params.as_deref().unwrap_or_default())?;

    match command {
        Commands::Publish {
            data,
            timeout_secs,
            dry_run,
        } => {
            let data = data.merged(&extra);
            publish::run(PublishOptions {
                countries: data.countries.clone(),
                data_dir: data.data_dir_or_default(),
                config_dir: data.config_dir.clone(),
                timeout_secs: *timeout_secs,
                dry_run: *dry_run,
                credentials: cli.credential_sources(&extra),
            })
            .await
        },

        Commands::Preview { data } => {
            let data = data.merged(&extra);
            preview::run(PreviewOptions {
                countries: data.countries.clone(),
                data_dir: data.data_dir_or_default(),
                config_dir: data.config_dir.clone(),
            })
            .await
        },

        Commands::Countries { data } => {
            let data = data.merged(&extra);
            let template = DatasetTemplate::resolve(data.config_dir.as_deref())?;
            countries::run(&data.data_dir_or_default(), &template.name_suffix).await
        },
    }
}
