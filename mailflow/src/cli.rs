//! Command line handling

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use tracing::debug;

use crate::errors::AutomationError;
use crate::filesys::file::File;
use crate::gateway::AutomationGateway;
use crate::models::action::RemoteRef;
use crate::models::automation::AutomationId;
use crate::session::EditorSession;
use crate::transfer;
use crate::validation;

/// Collect `--key=value` pairs and bare `--flag`s into a map
pub fn parse_args<I>(args: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = String>,
{
    let mut cli_args = HashMap::new();
    for arg in args {
        if let Some((key, value)) = arg.split_once('=') {
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }
    cli_args
}

/// Numeric ids stay numeric so they serialize the way the server sent them
pub fn parse_id(raw: &str) -> AutomationId {
    raw.parse::<i64>()
        .map(RemoteRef::Number)
        .unwrap_or_else(|_| RemoteRef::Text(raw.to_string()))
}

/// What the user asked for
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Version,
    Help,
    Validate(PathBuf),
    List,
    Export {
        id: AutomationId,
        out: Option<PathBuf>,
    },
    Push(PathBuf),
    History(AutomationId),
    Restore {
        id: AutomationId,
        version: u32,
        local: bool,
    },
    Duplicate(AutomationId),
    Start(AutomationId),
    Pause(AutomationId),
}

impl Command {
    pub fn from_args(args: &HashMap<String, String>) -> Result<Self, AutomationError> {
        let id_arg = |key: &str| args.get(key).map(|raw| parse_id(raw));

        if args.contains_key("version") {
            return Ok(Command::Version);
        }
        if let Some(path) = args.get("validate") {
            return Ok(Command::Validate(PathBuf::from(path)));
        }
        if args.contains_key("list") {
            return Ok(Command::List);
        }
        if let Some(id) = id_arg("export") {
            return Ok(Command::Export {
                id,
                out: args.get("out").map(PathBuf::from),
            });
        }
        if let Some(path) = args.get("push") {
            return Ok(Command::Push(PathBuf::from(path)));
        }
        if let Some(id) = id_arg("history") {
            return Ok(Command::History(id));
        }
        if let Some(id) = id_arg("restore") {
            let raw = args.get("to").ok_or_else(|| {
                AutomationError::ConfigError("--restore needs --to=<version>".to_string())
            })?;
            let version = raw.parse().map_err(|_| {
                AutomationError::ConfigError(format!("Invalid version number: {}", raw))
            })?;
            return Ok(Command::Restore {
                id,
                version,
                local: args.contains_key("local"),
            });
        }
        if let Some(id) = id_arg("duplicate") {
            return Ok(Command::Duplicate(id));
        }
        if let Some(id) = id_arg("start") {
            return Ok(Command::Start(id));
        }
        if let Some(id) = id_arg("pause") {
            return Ok(Command::Pause(id));
        }
        Ok(Command::Help)
    }

    /// Whether the command talks to the automation API
    pub fn needs_gateway(&self) -> bool {
        !matches!(
            self,
            Command::Version | Command::Help | Command::Validate(_)
        )
    }
}

pub const USAGE: &str = "\
Usage: mailflow [--settings=<path>] <command>

Commands:
  --version                          Print build information
  --validate=<file>                  Check an exported automation file
  --list                             List automations
  --export=<id> [--out=<file>]       Export an automation as JSON
  --push=<file>                      Create or update an automation from a file
  --history=<id>                     Show saved versions, newest first
  --restore=<id> --to=<n> [--local]  Restore a version (locally prints the result)
  --duplicate=<id>                   Copy an automation on the server
  --start=<id> | --pause=<id>        Switch an automation on or off";

/// Check a file without contacting the server
pub async fn validate_file(path: &Path) -> Result<(), AutomationError> {
    let text = File::new(path).read_string().await?;
    let doc = transfer::import_json(&text)?;

    let warnings = validation::save_errors(&doc);
    if warnings.is_empty() {
        println!("{} {}", "✓".green(), doc.name.bold());
    } else {
        println!("{} {} imports but cannot be saved yet:", "!".yellow(), doc.name.bold());
        for warning in warnings {
            println!("  - {}", warning);
        }
    }
    Ok(())
}

/// Run a gateway-backed command
pub async fn execute(
    command: Command,
    gateway: Arc<dyn AutomationGateway>,
) -> Result<(), AutomationError> {
    debug!("Executing {:?}", command);
    match command {
        Command::Version | Command::Help => {
            println!("{}", USAGE);
        }
        Command::Validate(path) => validate_file(&path).await?,
        Command::List => {
            let automations = gateway.list().await?;
            if automations.is_empty() {
                println!("No automations");
            }
            for automation in automations {
                let state = if automation.is_active {
                    "active".green()
                } else {
                    "paused".yellow()
                };
                println!(
                    "{:>8}  {:<8}  {}  {}",
                    automation.id.to_string().trim_matches('"'),
                    state,
                    automation.name.bold(),
                    automation.trigger_type.unwrap_or_default().dimmed()
                );
            }
        }
        Command::Export { id, out } => {
            let session = EditorSession::load(gateway, &id).await?;
            let json = session.export_json().await?;
            match out {
                Some(path) => {
                    File::new(&path).write_atomic(json.as_bytes()).await?;
                    println!("{} Exported to {}", "✓".green(), path.display());
                }
                None => println!("{}", json),
            }
        }
        Command::Push(path) => {
            let text = File::new(&path).read_string().await?;
            let session = EditorSession::new(gateway);
            session.import_json(&text).await?;
            let saved = session.save().await?;
            println!(
                "{} Saved {} ({})",
                "✓".green(),
                saved.name.bold(),
                saved.id.map(|id| id.to_string()).unwrap_or_default()
            );
        }
        Command::History(id) => {
            let session = EditorSession::load(gateway, &id).await?;
            let versions = session.history().await;
            if versions.is_empty() {
                println!("No saved versions");
            }
            for snapshot in versions {
                println!(
                    "v{:<4} {}  {}",
                    snapshot.version.to_string().bold(),
                    snapshot.created_at.format("%Y-%m-%d %H:%M"),
                    snapshot.user
                );
            }
        }
        Command::Restore { id, version, local } => {
            let session = EditorSession::load(gateway, &id).await?;
            if local {
                session.restore_local(version).await?;
                println!("{}", session.export_json().await?);
            } else {
                session.restore_and_save(version).await?;
                println!("{} Restored version {}", "✓".green(), version);
            }
        }
        Command::Duplicate(id) => {
            let session = EditorSession::load(gateway, &id).await?;
            let copy = session.duplicate().await?;
            println!(
                "{} Duplicated as {} ({})",
                "✓".green(),
                copy.name.bold(),
                copy.id.map(|id| id.to_string()).unwrap_or_default()
            );
        }
        Command::Start(id) => {
            let session = EditorSession::load(gateway, &id).await?;
            session.start().await?;
            println!("{} Started {}", "✓".green(), id);
        }
        Command::Pause(id) => {
            let session = EditorSession::load(gateway, &id).await?;
            session.pause().await?;
            println!("{} Paused {}", "✓".green(), id);
        }
    }
    Ok(())
}
