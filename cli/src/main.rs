//! looker-bindings: drive additive Looker bindings from the command line.
//!
//! Each subcommand performs one lifecycle step for one binding and prints
//! the resulting state (or write plan, with `--dry-run`) as JSON on stdout.
//! Logs go to stderr; `RUST_LOG` controls verbosity.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use looker_bindings::{
    BindingConfig, BindingKind, BindingResource, BindingState, BindingsConfig, Change,
    LookerClient, LookerStore,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = "looker.toml";

#[derive(Parser)]
#[command(
    name = "looker-bindings",
    version,
    about = "Grant roles and groups in Looker without clobbering grants made elsewhere"
)]
struct Cli {
    /// Path to looker.toml [default: ./looker.toml or ~/.config/looker-bindings/looker.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Target {
    /// Binding kind: role-groups, user-roles or group-roles
    #[arg(long)]
    kind: BindingKind,
    /// Id of the parent role, user or group
    #[arg(long)]
    parent: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Grant the declared ids, keeping every existing grant
    Create {
        #[command(flatten)]
        target: Target,
        /// Comma-separated ids to grant
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,
        /// Print the write that would be issued without issuing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Report which declared ids the parent currently holds
    Read {
        #[command(flatten)]
        target: Target,
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,
    },
    /// Move a binding from its previous ids to new ones
    Update {
        #[command(flatten)]
        target: Target,
        /// Comma-separated ids previously declared
        #[arg(long, value_delimiter = ',', required = true)]
        old: Vec<String>,
        /// Comma-separated ids to declare now
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Revoke the declared ids, keeping grants made elsewhere
    Delete {
        #[command(flatten)]
        target: Target,
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Adopt an existing binding from its id (<parent_id>_<id>[_<id>...])
    Import {
        #[arg(long)]
        kind: BindingKind,
        id: String,
    },
}

impl Commands {
    fn kind(&self) -> BindingKind {
        match self {
            Commands::Create { target, .. }
            | Commands::Read { target, .. }
            | Commands::Update { target, .. }
            | Commands::Delete { target, .. } => target.kind,
            Commands::Import { kind, .. } => *kind,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with env filter (RUST_LOG controls verbosity)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cancel = CancellationToken::new();

    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("interrupted, abandoning in-flight request");
        cancel_for_signal.cancel();
    });

    let config = match resolve_config(cli.config) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            BindingsConfig::load(&path)?
        }
        None => {
            tracing::debug!("no config file found, using LOOKERSDK_* environment");
            BindingsConfig::default()
        }
    };
    let settings = config.resolve().context("failed to resolve Looker settings")?;
    let client = LookerClient::new(&settings)?;
    let resource = BindingResource::looker(cli.command.kind(), client);

    tokio::select! {
        result = run(&resource, cli.command) => result,
        _ = cancel.cancelled() => Err(anyhow::anyhow!("cancelled")),
    }
}

async fn run(resource: &BindingResource<LookerStore>, command: Commands) -> Result<()> {
    match command {
        Commands::Create {
            target,
            ids,
            dry_run,
        } => {
            let config = BindingConfig::new(target.kind, target.parent, ids)?;
            if dry_run {
                let change = Change::Create {
                    declared: &config.associations,
                };
                let plan = resource.reconciler().plan(&config.parent_id, &change).await?;
                return print_json(&plan);
            }
            let state = resource.create(&config).await?;
            print_json(&state)
        }
        Commands::Read { target, ids } => {
            let config = BindingConfig::new(target.kind, target.parent, ids)?;
            let refreshed = resource.read(&state_of(config)).await?;
            if refreshed.is_none() {
                tracing::warn!("parent no longer exists; the binding is gone");
            }
            print_json(&refreshed)
        }
        Commands::Update {
            target,
            old,
            ids,
            dry_run,
        } => {
            let previous = BindingConfig::new(target.kind, target.parent.clone(), old)?;
            let next = BindingConfig::new(target.kind, target.parent, ids)?;
            if dry_run {
                let change = Change::Update {
                    old: &previous.associations,
                    new: &next.associations,
                };
                let plan = resource.reconciler().plan(&next.parent_id, &change).await?;
                return print_json(&plan);
            }
            let state = resource.update(&state_of(previous), &next).await?;
            print_json(&state)
        }
        Commands::Delete {
            target,
            ids,
            dry_run,
        } => {
            let config = BindingConfig::new(target.kind, target.parent, ids)?;
            if dry_run {
                let change = Change::Delete {
                    declared: &config.associations,
                };
                let plan = resource.reconciler().plan(&config.parent_id, &change).await?;
                return print_json(&plan);
            }
            resource.delete(&state_of(config)).await?;
            tracing::info!(kind = %resource.kind(), "binding deleted");
            Ok(())
        }
        Commands::Import { id, .. } => {
            let state = resource.import(&id).await?;
            if state.is_none() {
                tracing::warn!(id = %id, "nothing to import; the parent does not exist");
            }
            print_json(&state)
        }
    }
}

/// State as last declared, used as the starting point for read/update/delete.
fn state_of(config: BindingConfig) -> BindingState {
    BindingState {
        id: config.binding_id(),
        kind: config.kind,
        parent_id: config.parent_id,
        associations: config.associations,
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Resolve config file path: explicit flag → ./looker.toml → ~/.config/looker-bindings/looker.toml.
///
/// Returns `None` when no file exists; settings then come from the environment.
fn resolve_config(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }

    let local = Path::new(CONFIG_FILE);
    if local.exists() {
        return Some(local.to_path_buf());
    }

    dirs::config_dir()
        .map(|dir| dir.join("looker-bindings").join(CONFIG_FILE))
        .filter(|path| path.exists())
}
