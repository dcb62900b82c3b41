use af_core::model::Automation;
use af_core::{LintSeverity, lint_graph, validate_structure};
use af_store::{BackendConfig, HttpBackend, PersistenceGate, StoreError};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

/// Check and sync automation graphs with the automation backend
#[derive(Parser, Debug)]
#[command(name = "autoflow", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// API root; overrides AUTOFLOW_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Account email; overrides AUTOFLOW_USER_EMAIL
    #[arg(long, global = true)]
    email: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate an automation file and print lint findings
    Check { path: PathBuf },
    /// Validate and save an automation file
    Push { path: PathBuf },
    /// List the account's automations
    List,
    /// Switch an automation on or off
    Toggle { id: String, state: Switch },
    /// Delete an automation
    Delete { id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("{path} is not a valid automation: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn read_automation(path: &Path) -> Result<Automation, CliError> {
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Parse {
        path: display,
        source,
    })
}

/// Print structure errors and lint findings. Returns whether the file may be saved.
fn check(automation: &Automation) -> bool {
    let ok = match validate_structure(&automation.graph) {
        Ok(()) => {
            println!(
                "{}: {} blocks, {} connections",
                automation.name,
                automation.graph.nodes.len(),
                automation.graph.edges.len()
            );
            true
        }
        Err(e) => {
            println!("error: {e}");
            false
        }
    };
    for diag in lint_graph(&automation.graph) {
        let level = match diag.severity {
            LintSeverity::Warning => "warning",
            LintSeverity::Info => "info",
        };
        println!("{level}[{}] {}: {}", diag.rule, diag.node_id, diag.message);
    }
    ok
}

async fn run(cli: Cli) -> Result<bool, CliError> {
    let mut config = BackendConfig::from_env();
    if let Some(url) = cli.api_url {
        config.base_url = url;
    }
    if let Some(email) = cli.email {
        config.user_email = email;
    }
    log::debug!("backend {} as {}", config.base_url, config.user_email);
    let gate = PersistenceGate::new(HttpBackend::new(&config), config.user_email.clone());

    match cli.command {
        Command::Check { path } => return Ok(check(&read_automation(&path)?)),
        Command::Push { path } => {
            let automation = read_automation(&path)?;
            if !check(&automation) {
                return Ok(false);
            }
            gate.save(&automation).await?;
            println!("saved {}", automation.id);
        }
        Command::List => {
            for automation in gate.list().await? {
                let state = if automation.active { "on " } else { "off" };
                println!(
                    "{state} {:<16} {} ({} blocks)",
                    automation.id,
                    automation.name,
                    automation.graph.nodes.len()
                );
            }
        }
        Command::Toggle { id, state } => {
            let mut automation = gate.load(&id).await?;
            gate.toggle(&mut automation, matches!(state, Switch::On)).await?;
            println!("{id} is {}", if automation.active { "on" } else { "off" });
        }
        Command::Delete { id } => {
            gate.delete(&id).await?;
            println!("deleted {id}");
        }
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("autoflow: {e}");
            ExitCode::FAILURE
        }
    }
}
