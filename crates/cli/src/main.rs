mod config;
mod render;

use anyhow::{bail, Context, Result};
use bridge_core::{CancelToken, Handler, OperationRunner, Operations, Properties};
use clap::{Parser, Subcommand};
use compose::ComposeBackend;
use config::BridgeConfig;
use handler::schema::{CANCEL, COMMAND_KEY, DETACH, PROJECT_FILES, PROJECT_NAME};
use handler::{
    CommandHandler, MonitorHandler, COMMAND_GET, COMMAND_LIST, MONITOR_LOGS, MONITOR_PS,
};
use render::ConsoleReporter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "compose-bridge")]
#[command(about = "Monitor compose projects through bridge operations", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory holding compose-bridge.toml
    #[arg(short = 'C', long)]
    dir: Option<PathBuf>,

    /// Override the configured project name
    #[arg(short, long)]
    project: Option<String>,

    /// Override the configured definition files
    #[arg(short, long = "file")]
    files: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the operations available to callers
    Ops,
    /// List running containers
    Ps,
    /// Show container logs
    Logs {
        /// Print current logs and exit instead of following
        #[arg(short, long)]
        detach: bool,
    },
    /// Inspect project command definitions
    Commands {
        #[command(subcommand)]
        action: CommandAction,
    },
}

#[derive(Subcommand)]
enum CommandAction {
    List,
    Get { key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let dir = match &cli.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let config = BridgeConfig::load(&dir).await?;
    tracing::debug!(project = config.project_name(), dir = %dir.display(), "Configuration loaded");

    let backend: Arc<dyn ComposeBackend> = Arc::new(config.backend(&dir));
    let mut operations = MonitorHandler::new(backend.clone(), config.schema()).operations();
    operations.merge(
        CommandHandler::new(backend, config.schema(), Arc::new(config.commands.clone()))
            .operations(),
    );

    let mut values = Properties::new();
    if let Some(name) = &cli.project {
        values.add(PROJECT_NAME.bind(name.clone()));
    }
    if !cli.files.is_empty() {
        values.add(PROJECT_FILES.bind(cli.files.clone()));
    }

    let id = match cli.command {
        Commands::Ops => {
            render::render_operations(operations.external().iter().map(|op| op.as_ref()));
            return Ok(());
        }
        Commands::Ps => MONITOR_PS,
        Commands::Logs { detach } => {
            values.add(DETACH.bind(detach));
            MONITOR_LOGS
        }
        Commands::Commands { action } => match action {
            CommandAction::List => COMMAND_LIST,
            CommandAction::Get { key } => {
                values.add(COMMAND_KEY.bind(key));
                COMMAND_GET
            }
        },
    };

    run(&operations, id, values).await
}

async fn run(operations: &Operations, id: &str, mut values: Properties) -> Result<()> {
    let operation = operations
        .get(id)
        .with_context(|| format!("Unknown operation: {}", id))?;

    let cancel = CancelToken::new();
    values.add(CANCEL.bind(cancel.clone()));
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling");
            cancel.cancel();
        }
    });

    let runner = OperationRunner::new(Arc::new(ConsoleReporter));
    let invocation = runner.run(operation.as_ref(), values).await;
    render::render_result(operation.as_ref(), &invocation.result);

    if !invocation.result.success() {
        bail!("{} failed", operation.id());
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}
