//! Long-running service: store, engine, and sweep scheduler wired together.

use std::sync::Arc;

use tracing;

use alerthub_core::SystemClock;
use alerthub_core::config::AppConfig;
use alerthub_core::error::AppError;
use alerthub_database::DatabasePool;
use alerthub_database::migration::run_migrations;
use alerthub_database::repositories::postgres_stores;
use alerthub_service::Engine;

use crate::scheduler::SweepScheduler;
use crate::sweeps::{ReminderSweep, SnoozeResetSweep};

/// Options for [`run_service`].
#[derive(Debug, Clone, Copy)]
pub struct ServeOptions {
    /// Apply pending migrations before starting. `database.auto_migrate`
    /// can veto this; without migrating, a stale schema refuses to start.
    pub auto_migrate: bool,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self { auto_migrate: true }
    }
}

/// Build both sweeps over one engine.
pub fn build_sweeps(engine: &Engine) -> (Arc<ReminderSweep>, Arc<SnoozeResetSweep>) {
    let reminders = ReminderSweep::new(
        engine.stores.alerts.clone(),
        engine.orchestrator.clone(),
        engine.clock.clone(),
        engine.store_timeout(),
    );
    let snooze_reset = SnoozeResetSweep::new(
        engine.stores.preferences.clone(),
        engine.clock.clone(),
        engine.store_timeout(),
    );
    (Arc::new(reminders), Arc::new(snooze_reset))
}

/// Run the delivery service until Ctrl+C or SIGTERM.
pub async fn run_service(config: AppConfig, options: ServeOptions) -> Result<(), AppError> {
    tracing::info!("Starting AlertHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database).await?;
    if options.auto_migrate && config.database.auto_migrate {
        run_migrations(db.pool()).await?;
    } else {
        let health = db.health().await?;
        if !health.is_ready() {
            return Err(AppError::configuration(format!(
                "Database schema has {} pending migration(s); run `alerthub-cli migrate run`",
                health.schema.pending.len()
            )));
        }
    }

    // ── Step 2: Stores and services ──────────────────────────────
    let stores = postgres_stores(db.pool());
    let engine = Engine::build(stores, Arc::new(SystemClock), &config.delivery)?;
    tracing::info!(
        utc_offset = %config.delivery.utc_offset,
        dispatch_timeout_ms = config.delivery.dispatch_timeout_ms,
        store_timeout_ms = config.delivery.store_timeout_ms,
        "Delivery engine ready"
    );

    // ── Step 3: Sweep scheduler ──────────────────────────────────
    let scheduler = if config.scheduler.enabled {
        let (reminders, snooze_reset) = build_sweeps(&engine);
        let mut scheduler = SweepScheduler::new().await?;
        scheduler
            .register_default_sweeps(reminders, snooze_reset, &config.scheduler)
            .await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::warn!("Sweep scheduler disabled by configuration");
        None
    };

    // ── Step 4: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");

    if let Some(scheduler) = scheduler {
        if let Err(e) = scheduler.shutdown().await {
            tracing::error!("Scheduler shutdown failed: {}", e);
        }
    }
    db.close().await;

    tracing::info!("AlertHub shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
