use anyhow::Result;
use clap::{Parser, Subcommand};
use socialnet_core::config::Config;
use socialnet_core::logging::init_logging_with_config;
use socialnet_core::rpc::RpcServer;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

mod error;
mod services;

use error::StartupError;
use services::ServiceKind;

#[derive(Parser, Debug)]
#[command(name = "socialnet-api")]
#[command(author, version, about = "Runs one socialnet backend service", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured bind address
    #[arg(short, long, global = true)]
    bind: Option<SocketAddr>,

    /// Override the configured log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Accounts, follow graph, posts, likes and comments
    UserAndPost,
    /// Newsfeed generation
    Newsfeed,
}

impl From<Command> for ServiceKind {
    fn from(command: Command) -> Self {
        match command {
            Command::UserAndPost => ServiceKind::UserAndPost,
            Command::Newsfeed => ServiceKind::Newsfeed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run(Args::parse()).await?;
    Ok(())
}

async fn run(args: Args) -> Result<(), StartupError> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    let log_config = config.logging.log_config()?.with_thread_names(true);
    init_logging_with_config(log_config)?;

    let kind = ServiceKind::from(args.command);
    info!(service = kind.name(), "socialnet-api starting");

    let metrics = services::install_metrics(&config.metrics)?;
    let store = services::open_store(&config.store)?;
    let handler = services::build_handler(kind, &config, store, metrics)?;

    let addr = config.server.bind_address;
    let server = RpcServer::bind(addr, handler)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?
        .with_max_connections(config.server.max_connections);

    tokio::select! {
        result = server.serve() => result.map_err(StartupError::Serve)?,
        _ = tokio::signal::ctrl_c() => info!("shutdown signal received"),
    }

    info!(service = kind.name(), "socialnet-api stopped");
    Ok(())
}
