//! lightpanel - wall-panel light controller with a web settings server.
//!
//! `lightpanel serve` loads the configuration file, starts the panel loop
//! that polls and toggles lights, and serves the settings pages. Saving from
//! the web publishes the new configuration to the panel without a restart.
//!
//! `lightpanel hash-password` reads a password from stdin and prints a bcrypt
//! hash suitable for `web_password_hash`.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lightpanel_auth::{hash_password, SessionConfig, SessionManager, DEFAULT_COST};
use lightpanel_control::{HotReloadCoordinator, HttpConnector, LoggingView, Panel, PanelConfig};
use lightpanel_gateway::{create_router, GatewayConfig, GatewayState};
use lightpanel_store::ConfigStore;

#[derive(Debug, Parser)]
#[command(name = "lightpanel", version, about = "Light panel controller")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the panel and the settings server.
    Serve {
        /// Configuration file.
        #[arg(long, env = "LIGHTPANEL_CONFIG", default_value = "/etc/ha_lights.conf")]
        config: PathBuf,

        /// Settings server listen address.
        #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
        listen: String,

        /// Seconds between polls of every light.
        #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = 5)]
        poll_interval: u64,
    },

    /// Read a password from stdin and print its bcrypt hash.
    HashPassword {
        /// bcrypt cost factor.
        #[arg(long, default_value_t = DEFAULT_COST)]
        cost: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::HashPassword { cost } => hash_from_stdin(cost),
        Command::Serve {
            config,
            listen,
            poll_interval,
        } => serve(config, listen, poll_interval).await,
    }
}

fn hash_from_stdin(cost: u32) -> Result<(), Box<dyn std::error::Error>> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err("empty password".into());
    }
    println!("{}", hash_password(password, cost)?);
    Ok(())
}

async fn serve(
    config_path: PathBuf,
    listen_addr: String,
    poll_interval: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lightpanel=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        config = %config_path.display(),
        listen_addr = %listen_addr,
        poll_interval,
        "Starting lightpanel"
    );

    let store = Arc::new(ConfigStore::new());
    store.set_path(config_path)?;

    let (reloader, reloads) = HotReloadCoordinator::new(Arc::clone(&store));
    let initial = reloader.reload()?;

    if initial.config().web_password_hash().is_none() {
        tracing::warn!("No web_password_hash configured - web login is disabled (see `lightpanel hash-password`)");
    }
    if initial.config().remote().is_none() {
        tracing::warn!("Remote URL or token not configured - lights will show unknown");
    }

    let panel_config = PanelConfig {
        poll_interval: Duration::from_secs(poll_interval.max(1)),
        ..PanelConfig::default()
    };
    let (panel, _taps) = Panel::new(
        initial,
        LoggingView::new(),
        reloads,
        Arc::new(HttpConnector::new(panel_config.remote)),
        panel_config,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let panel_task = tokio::spawn(panel.run(shutdown_rx.clone()));

    let gateway_config = GatewayConfig {
        listen_addr,
        ..GatewayConfig::default()
    };
    let sessions = Arc::new(SessionManager::new(&SessionConfig::default()));
    let state = GatewayState::new(
        reloader,
        sessions,
        panel_config.remote,
        gateway_config.clone(),
    );
    let app = create_router(state);

    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Shutdown requested");
        let _ = shutdown_tx.send(true);
    });

    tracing::info!(listen_addr = %gateway_config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&gateway_config.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_rx))
        .await?;

    panel_task.await?;
    tracing::info!("Stopped");
    Ok(())
}

async fn shutdown_signal(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
