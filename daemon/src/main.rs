//! meetpoll daemon: entry point for running the poll API.

mod config;
mod shutdown;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use config::DaemonConfig;
use meetpoll_crypto::{CredentialHasher, RandomIds};
use meetpoll_ledger::{IdentityPolicy, PollService};
use meetpoll_rpc::RpcServer;
use meetpoll_store_lmdb::{check_data_dir, check_integrity, LmdbEnvironment};
use meetpoll_types::SystemClock;
use meetpoll_utils::{init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "meetpoll-daemon", about = "Meeting scheduling poll server")]
struct Cli {
    /// Data directory for poll storage.
    #[arg(long, env = "MEETPOLL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// IP address to bind the API server to.
    #[arg(long, env = "MEETPOLL_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// API server port.
    #[arg(long, env = "MEETPOLL_PORT")]
    port: Option<u16>,

    /// Log format: "human" or "json".
    #[arg(long, env = "MEETPOLL_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "MEETPOLL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Reject reuse of names that were created without a password.
    #[arg(long, env = "MEETPOLL_STRICT_IDENTITIES")]
    strict_identities: bool,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "MEETPOLL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Serve the HTTP API.
    Run,
    /// Verify the database and exit.
    Check,
    /// Print the effective configuration as TOML.
    PrintConfig,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<DaemonConfig> {
        let mut config = match &self.config {
            Some(path) => DaemonConfig::from_toml_file(path)?,
            None => DaemonConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(addr) = &self.bind_address {
            config.bind_address = addr.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if self.strict_identities {
            config.identity_policy = IdentityPolicy::Strict;
        }
        Ok(config)
    }
}

fn open_store(config: &DaemonConfig) -> anyhow::Result<LmdbEnvironment> {
    check_data_dir(&config.data_dir).map_err(anyhow::Error::msg)?;
    let env = LmdbEnvironment::open(&config.data_dir, config.map_size_bytes())
        .with_context(|| format!("opening {}", config.data_dir.display()))?;

    let report = check_integrity(&env)?;
    tracing::info!(
        databases = report.databases_checked,
        entries = report.total_entries,
        "integrity check complete"
    );
    if !report.is_healthy() {
        for error in &report.errors {
            tracing::error!(%error, "integrity violation");
        }
        anyhow::bail!("database failed integrity check ({} errors)", report.errors.len());
    }
    Ok(env)
}

async fn run(config: DaemonConfig) -> anyhow::Result<()> {
    let env = open_store(&config)?;
    let hasher = CredentialHasher::new(config.credential)?;
    let service = PollService::new(
        Arc::new(env),
        hasher,
        Arc::new(SystemClock),
        Arc::new(RandomIds::default()),
    )
    .with_policy(config.identity_policy)
    .with_share_link_prefix(config.share_link_prefix.clone());

    tracing::info!(
        data_dir = %config.data_dir.display(),
        policy = ?config.identity_policy,
        "starting meetpoll"
    );
    RpcServer::new(config.socket_addr()?)
        .serve(service, shutdown::shutdown_signal())
        .await?;

    tracing::info!("meetpoll daemon exited cleanly");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    if let Command::PrintConfig = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    init_logging(config.log_format, &config.log_level);

    match cli.command {
        Command::Run => run(config).await,
        Command::Check => {
            open_store(&config)?;
            tracing::info!("database is healthy");
            Ok(())
        }
        Command::PrintConfig => Ok(()),
    }
}
