//! Bunk Booking - CLI Server
//!
//! Headless slot reservation service suitable for deployment as a systemd
//! service, Docker container, or standalone process.
//!
//! ```sh
//! # Run with default config (~/.config/bunk-booking/config.toml)
//! bunk-booking
//!
//! # Custom config path
//! bunk-booking --config /etc/bunk-booking/config.toml
//!
//! # Override port and database
//! bunk-booking --api-port 8081 --database-url sqlite://./dev.db?mode=rwc
//!
//! # Validate config without starting
//! bunk-booking --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use bunk_booking::config::AppConfig;
use bunk_booking::server::{init_tracing, ServerHandle, ServerOptions};

/// Bunk Booking - charging slot reservations for EV stations.
#[derive(Parser, Debug)]
#[command(
    name = "bunk-booking",
    version,
    about = "Slot reservation service for EV charging stations",
    long_about = "Bunk Booking - REST API server for listing, booking, cancelling and \
                  rescheduling fixed-length charging slots.\n\n\
                  Default config: ~/.config/bunk-booking/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "BUNK_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the database URL.
    #[arg(long)]
    database_url: Option<String>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .unwrap_or_else(bunk_booking::default_config_path);

    let loaded = AppConfig::load(&config_path);
    if cli.check {
        if let Err(e) = &loaded {
            eprintln!("❌ Invalid configuration in {}: {}", config_path.display(), e);
            std::process::exit(1);
        }
    }

    let mut config = match loaded {
        Ok(mut cfg) => {
            if let Some(ref level) = cli.log_level {
                cfg.logging.level = level.clone();
            }
            init_tracing(&cfg);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new(
                    cli.log_level.as_deref().unwrap_or("info"),
                ))
                .init();
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
            AppConfig::default()
        }
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.api_port {
        info!("CLI override: api_port = {}", port);
        config.server.api_port = port;
    }
    if let Some(url) = cli.database_url {
        info!("CLI override: database_url = {}", url);
        config.database.url = url;
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        config.validate()?;
        println!("✅ Configuration is valid");
        println!("   Config file   : {}", config_path.display());
        println!("   API address   : {}", config.server.api_address());
        println!("   Database      : {}", config.database.connection_url());
        println!("   Slot length   : {} min", config.booking.slot_duration_minutes);
        println!(
            "   Default hours : {}-{}",
            config.booking.default_open, config.booking.default_close
        );
        println!("   Log level     : {}", config.logging.level);
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await?;

    // Install OS signal handlers (SIGTERM, SIGINT)
    handle.install_signal_handler();

    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
