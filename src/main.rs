use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use svnman::apache::{ApacheCtl, RestartCoordinator};
use svnman::config::ServerConfig;
use svnman::manager::SvnMan;
use svnman::server::{AppState, create_router, serve};
use svnman::store::{RepoPaths, RepoStore, SvnAdmin};
use svnman::{APP_NAME, APP_VERSION};

/// Exit status when graceful shutdown takes longer than allowed.
const EXIT_SHUTDOWN_TIMEOUT: i32 = 2;

#[derive(Parser)]
#[command(name = "svnman", version)]
#[command(about = "HTTP API for managing Subversion repositories served by Apache", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. "[::]:8085"
    #[arg(long)]
    listen: Option<String>,

    /// Root directory of the repositories
    #[arg(long = "repo")]
    repo_root: Option<PathBuf>,

    /// Directory for the Apache configuration files
    #[arg(long = "apache")]
    apache_config_dir: Option<PathBuf>,

    /// Log at info level
    #[arg(long, short)]
    verbose: bool,

    /// Log at debug level
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn server_config(&self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        if let Some(listen) = &self.listen {
            config.listen.clone_from(listen);
        }
        if let Some(repo_root) = &self.repo_root {
            config.repo_root.clone_from(repo_root);
        }
        if let Some(apache_config_dir) = &self.apache_config_dir {
            config.apache_config_dir.clone_from(apache_config_dir);
        }
        Ok(config)
    }

    fn env_filter(&self) -> anyhow::Result<EnvFilter> {
        let level = if self.debug {
            Some("debug")
        } else if self.verbose {
            Some("info")
        } else {
            None
        };
        let filter = match level {
            Some(level) => EnvFilter::from_default_env().add_directive(format!("svnman={level}").parse()?),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("svnman=warn")),
        };
        Ok(filter)
    }
}

/// Resolves on SIGINT or SIGTERM, then arms a watchdog that kills the process
/// if the remaining shutdown work hangs.
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT"),
        () = terminate => info!("received SIGTERM"),
    }

    info!("shutting down, waiting at most {}s", timeout.as_secs());
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        tracing::error!("shutdown took longer than {}s, exiting", timeout.as_secs());
        std::process::exit(EXIT_SHUTDOWN_TIMEOUT);
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.env_filter()?)
        .with_writer(std::io::stderr)
        .init();

    // Shown with the default filter too.
    tracing::warn!("starting {APP_NAME} {APP_VERSION}");
    let config = cli.server_config()?;
    let addr = config.socket_addr()?;

    let apachectl = ApacheCtl::new(config.apachectl.clone(), config.command_timeout())?;
    let restarter = RestartCoordinator::new(Arc::new(apachectl), config.restart_delay())
        .await
        .context("Apache configuration test failed, refusing to start")?;

    let svnadmin = SvnAdmin::new(
        config.svnadmin.clone(),
        config.fs_type.clone(),
        config.command_timeout(),
    );
    let store = RepoStore::new(
        RepoPaths::new(&config.repo_root, &config.apache_config_dir),
        Arc::new(svnadmin),
        Arc::new(restarter.clone()),
        config.store_options(),
    );
    let state = Arc::new(AppState::new(Arc::new(SvnMan::new(store))));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("unable to listen on {addr}"))?;
    info!("Starting server on {}", addr);

    serve(
        listener,
        app,
        shutdown_signal(config.shutdown_timeout()),
        &restarter,
    )
    .await?;
    info!("shut down");
    Ok(())
}
