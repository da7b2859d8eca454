//! authwatchd - KBase session expiration monitor
//!
//! This is the main entry point for the monitor.
//! It wires together all the components:
//! - Configuration loading
//! - Credential lookup and the Auth2 token source
//! - Expiration monitor (core)
//! - Console dialogs and login navigation

mod console;

use anyhow::{Context, Result};
use authwatch_config::{load_config_or_default, Settings};
use authwatch_core::{classify, Monitor, Phase};
use authwatch_host_api::{CredentialStore, TokenSource};
use authwatch_host_kbase::{
    build_http_client, Auth2Reauth, Auth2TokenSource, AuthEndpoints, CookieCredentials,
};
use authwatch_util::{
    default_config_path, duration_from_ms, format_duration, format_timestamp_ms, Clock,
    SystemClock,
};
use clap::Parser;
use console::{ConsoleDialogs, ConsoleNavigator};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// authwatchd - warns before a KBase session token expires
#[derive(Parser, Debug)]
#[command(name = "authwatchd")]
#[command(about = "Warns before a KBase session token expires and sends the user back through login", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/authwatch/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Auth service origin override (or set KBASE_ORIGIN env var)
    #[arg(long, env = "KBASE_ORIGIN")]
    origin: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Check the token once, print its status and exit
    #[arg(long)]
    once: bool,
}

/// Collaborators built from the settings
struct Service {
    settings: Settings,
    credentials: Arc<dyn CredentialStore>,
    source: Arc<dyn TokenSource>,
    reauth: Arc<Auth2Reauth>,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        let mut settings = load_config_or_default(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        if let Some(origin) = &args.origin {
            settings.auth.origin = origin.trim_end_matches('/').to_string();
        }

        info!(
            config_path = %args.config.display(),
            origin = %settings.auth.origin,
            warning_lead = %format_duration(settings.timing.warning_lead),
            poll_interval = %format_duration(settings.timing.poll_interval),
            "Configuration loaded"
        );

        let endpoints =
            AuthEndpoints::from_settings(&settings.auth).context("Invalid auth endpoints")?;
        let client = build_http_client(settings.auth.request_timeout)?;
        let credentials: Arc<dyn CredentialStore> =
            Arc::new(CookieCredentials::new(&settings.credential));

        let source = Arc::new(Auth2TokenSource::new(
            client.clone(),
            &endpoints,
            credentials.clone(),
        ));
        let navigator = Arc::new(ConsoleNavigator::new(
            settings.navigation.open_command.clone(),
        ));
        let reauth = Arc::new(Auth2Reauth::new(
            client,
            &endpoints,
            credentials.clone(),
            navigator,
        ));

        Ok(Self {
            settings,
            credentials,
            source,
            reauth,
        })
    }

    /// Fetch and classify the token once
    async fn check_once(&self) -> ExitCode {
        if self.credentials.credential().is_none() {
            println!("No KBase session token found");
            return ExitCode::from(1);
        }

        let token = match self.source.fetch_token().await {
            Ok(token) => token,
            Err(e) => {
                println!("Token check failed: {e}");
                return ExitCode::from(1);
            }
        };

        let now = SystemClock.now_ms();
        let classification = classify(
            now,
            token.expires_at_ms,
            None,
            self.settings.timing.warning_lead_ms(),
            self.settings.timing.cooldown_ms(),
        );

        println!("User:    {}", token.subject);
        println!("Expires: {}", format_timestamp_ms(token.expires_at_ms));
        match classification.phase {
            Phase::Valid | Phase::Warning => {
                let label = if classification.phase == Phase::Valid {
                    "valid"
                } else {
                    "expiring soon"
                };
                println!(
                    "Status:  {label} ({} left)",
                    format_duration(duration_from_ms(token.remaining_ms(now)))
                );
                ExitCode::SUCCESS
            }
            Phase::Blocked => {
                println!("Status:  expired");
                ExitCode::from(1)
            }
        }
    }

    async fn run(self) -> Result<ExitCode> {
        let monitor = Monitor::new(
            self.settings.timing,
            self.source,
            Arc::new(ConsoleDialogs::stdin()),
            self.reauth,
            Arc::new(SystemClock),
        );
        let monitor_id = monitor.machine().id();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut monitor_task = tokio::spawn(monitor.run(shutdown_rx));

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup =
            signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        info!(%monitor_id, "Monitor running");

        let status = loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    let _ = shutdown_tx.send(true);
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    let _ = shutdown_tx.send(true);
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, shutting down gracefully");
                    let _ = shutdown_tx.send(true);
                }
                result = &mut monitor_task => {
                    break result.context("Monitor task failed")?;
                }
            }
        };

        match status.state {
            Some(state) => info!(%monitor_id, %state, "Monitor finished"),
            None => warn!(%monitor_id, "Monitor finished before starting"),
        }

        Ok(if status.is_blocked() {
            ExitCode::from(3)
        } else {
            ExitCode::SUCCESS
        })
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if args.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "authwatchd starting");

    #[cfg(debug_assertions)]
    {
        if authwatch_util::is_mock_time_active() {
            warn!(
                now = %authwatch_util::now(),
                "Mock time is active; token expiry is judged against it"
            );
        }
    }

    let service = Service::new(&args)?;
    if args.once {
        return Ok(service.check_once().await);
    }
    service.run().await
}
