//! Reusable booking server runtime.
//!
//! Provides [`ServerHandle`] that encapsulates the full server lifecycle:
//! database init, migrations, REST API, completion sweep, metrics and
//! graceful shutdown. Both binaries start the service through it.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use crate::application::{start_completion_sweep_task, BookingService, StationService};
use crate::config::AppConfig;
use crate::domain::RepositoryProvider;
use crate::infrastructure::database::migrator::Migrator;
use crate::interfaces::http::modules::health::HealthState;
use crate::interfaces::http::{create_api_router, ApiState};
use crate::shared::errors::InfraError;
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the booking service.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running booking service.
///
/// # Examples
///
/// ```rust,no_run
/// use bunk_booking::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     // ... wait for shutdown signal ...
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// Repository provider for data access.
    pub repos: Arc<dyn RepositoryProvider>,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// API port the server is listening on.
    pub api_port: u16,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
    sweep_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Start the booking service with the given options.
    ///
    /// This will:
    /// 1. Install Prometheus metrics recorder
    /// 2. Connect to database and run migrations
    /// 3. Start the booking completion sweep
    /// 4. Start REST API server (with Swagger UI)
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting Bunk Booking Service...");

        // ── Prometheus metrics recorder ────────────────────────
        // The global metrics recorder can only be installed once per process.
        use std::sync::OnceLock;
        static PROM_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> =
            OnceLock::new();

        let prometheus_handle = PROM_HANDLE
            .get_or_init(|| {
                let h = metrics_exporter_prometheus::PrometheusBuilder::new()
                    .install_recorder()
                    .expect("Failed to install Prometheus metrics recorder");
                info!("📊 Prometheus metrics recorder installed");
                h
            })
            .clone();

        // ── Booking policy ─────────────────────────────────────
        let generator = app_cfg.booking.slot_generator()?;
        let default_hours = app_cfg.booking.default_hours()?;
        info!(
            slot_minutes = generator.duration().minutes(),
            default_open = %default_hours.open(),
            default_close = %default_hours.close(),
            "Booking policy configured"
        );

        // ── Database ───────────────────────────────────────────
        let db_config = DatabaseConfig {
            url: app_cfg.database.connection_url(),
            max_connections: app_cfg.database.max_connections,
        };
        let db = init_database(&db_config).await.map_err(InfraError::from)?;

        if opts.auto_migrate {
            info!("Running database migrations...");
            Migrator::up(&db, None).await.map_err(InfraError::from)?;
            info!("Migrations completed");
        }

        // ── Repositories & Services ────────────────────────────
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        let state = ApiState {
            stations: Arc::new(StationService::new(repos.clone(), default_hours)),
            bookings: Arc::new(BookingService::new(
                repos.clone(),
                generator,
                app_cfg.booking.hide_elapsed_slots,
            )),
        };

        // ── Shutdown coordinator ───────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        // ── Background tasks ───────────────────────────────────
        let sweep_task = start_completion_sweep_task(
            repos.clone(),
            shutdown_signal.clone(),
            app_cfg.booking.completion_sweep_interval_secs,
        );

        // ── REST API server ────────────────────────────────────
        let api_router = create_api_router(
            state,
            HealthState::new(Some(db.clone())),
            Some(prometheus_handle),
        );

        let api_port = app_cfg.server.api_port;
        let api_addr = app_cfg.server.api_address();
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        info!("REST API server listening on http://{}", api_addr);
        info!("Swagger UI available at http://{}/docs/", api_addr);

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("🛑 REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        info!("🚀 Bunk Booking Service started.");

        Ok(Self {
            repos,
            config: app_cfg,
            api_port,
            db,
            shutdown,
            api_task,
            sweep_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the server to fully stop after shutdown has been triggered.
    ///
    /// In-flight requests and the sweep get `server.shutdown_timeout`
    /// seconds to finish before the database connection is closed anyway.
    pub async fn wait(self) {
        info!("⏳ Waiting for server tasks to complete...");

        let Self {
            db,
            shutdown,
            api_task,
            sweep_task,
            ..
        } = self;

        shutdown
            .drain(async move {
                match api_task.await {
                    Ok(()) => info!("REST API server stopped"),
                    Err(e) => error!("REST API server task panicked: {}", e),
                }
                match sweep_task.await {
                    Ok(()) => info!("Completion sweep stopped"),
                    Err(e) => error!("Completion sweep task panicked: {}", e),
                }
            })
            .await;

        if let Err(e) = db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("✅ Database connection closed");
        }

        info!("👋 Bunk Booking Service shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("🛑 Shutting down Bunk Booking Service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    /// Check if the server is still running.
    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished() || !self.sweep_task.is_finished()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ServerOptions {
        let mut config = AppConfig::default();
        config.server.api_host = "127.0.0.1".to_string();
        config.server.api_port = 0;
        config.server.shutdown_timeout = 5;
        config.database.url = "sqlite::memory:".to_string();
        config.database.max_connections = 1;
        ServerOptions {
            config,
            auto_migrate: true,
        }
    }

    #[tokio::test]
    async fn starts_and_shuts_down() {
        if std::env::var("DATABASE_URL").is_ok() {
            return;
        }
        let handle = ServerHandle::start(options()).await.unwrap();
        assert!(handle.is_running());
        assert!(handle.repos.stations().find_all().await.unwrap().is_empty());

        tokio::time::timeout(std::time::Duration::from_secs(10), handle.shutdown())
            .await
            .expect("shutdown timed out");
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_binding() {
        let mut opts = options();
        opts.config.booking.slot_duration_minutes = 0;
        assert!(ServerHandle::start(opts).await.is_err());
    }
}
