//! Mailflow CLI - Entry Point
//!
//! Validate, export, push and restore marketing automations against the
//! automation API.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use tracing::{debug, error};

use mailflow::cli::{self, Command};
use mailflow::filesys::file::File;
use mailflow::gateway::HttpGateway;
use mailflow::logs::{init_logging, LogOptions};
use mailflow::storage::layout::StorageLayout;
use mailflow::storage::settings::Settings;
use mailflow::utils::version_info;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let cli_args = cli::parse_args(env::args().skip(1));
    let command = Command::from_args(&cli_args)?;

    // Print version and exit
    if command == Command::Version {
        let version = version_info();
        println!("{}", serde_json::to_string_pretty(&version)?);
        return Ok(());
    }

    // Retrieve the settings file
    let layout = StorageLayout::default();
    let settings_file = match cli_args.get("settings") {
        Some(path) => File::new(path),
        None => layout.settings_file(),
    };
    let settings = Settings::load(&settings_file)
        .await
        .with_context(|| format!("Unable to read {}", settings_file.path().display()))?;

    // Initialize logging
    let log_dir = if settings.logging.to_file {
        layout
            .setup()
            .await
            .context("Unable to create the logs directory")?;
        Some(layout.logs_dir().path().to_path_buf())
    } else {
        None
    };
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        json_format: settings.logging.json,
        log_dir,
        ..Default::default()
    };
    let _guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    if !command.needs_gateway() {
        if let Command::Validate(path) = &command {
            cli::validate_file(path)
                .await
                .with_context(|| format!("{} is not a valid automation", path.display()))?;
        } else {
            println!("{}", cli::USAGE);
        }
        return Ok(());
    }

    debug!("Using automation API at {}", settings.gateway.base_url);
    let gateway = HttpGateway::from_settings(&settings.gateway)?;
    cli::execute(command, Arc::new(gateway)).await?;

    Ok(())
}
