use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::backend::{connect_store, BackendBuildError};
use crate::config::{AppConfig, ConfigError};
use crate::http::build_router;
use crate::scheduler::{ScheduleError, Scheduler};
use crate::store::{DocumentStore, StoreError};
use crate::writer::{LogWriter, WriteStats};

/// Everything the process owns, built once at startup.
///
/// The store client is shared by the push job only; the HTTP side never
/// touches it, and the two share no lock.
pub struct App {
    config: AppConfig,
    store: Arc<dyn DocumentStore>,
    scheduler: Scheduler,
    listener: TcpListener,
    write_stats: Arc<WriteStats>,
}

impl App {
    /// Connect and ping the configured store, then bind the liveness port
    /// and start the push job.
    ///
    /// Any failure here is fatal; nothing is left running on error.
    pub async fn start(config: AppConfig) -> Result<Self, StartupError> {
        let backend = config.backend().map_err(ConfigError::from)?;
        let store = connect_store(&backend).await?;
        store.ping().await?;
        info!(store = %store.describe(), "connected to document store");

        Self::start_with_store(config, store).await
    }

    /// Like [`App::start`] with an already-built store. No ping is made.
    pub async fn start_with_store(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Self, StartupError> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| StartupError::Bind { addr, source })?;

        let writer = LogWriter::new(
            Arc::clone(&store),
            config.username.clone(),
            config.write_timeout,
        );
        let write_stats = writer.stats();

        let mut scheduler = Scheduler::new();
        scheduler.schedule(config.interval, Arc::new(writer))?;

        Ok(App {
            config,
            store,
            scheduler,
            listener,
            write_stats,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.store)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn write_stats(&self) -> Arc<WriteStats> {
        Arc::clone(&self.write_stats)
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve the liveness endpoint until `shutdown` resolves, then stop
    /// the scheduler.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), StartupError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let App {
            config,
            listener,
            mut scheduler,
            ..
        } = self;

        let addr = listener.local_addr().map_err(StartupError::Serve)?;
        info!(
            %addr,
            interval_secs = config.interval.as_secs_f64(),
            "app is running with scheduled log pushing"
        );
        let served = axum::serve(listener, build_router())
            .with_graceful_shutdown(shutdown)
            .await;

        scheduler.shutdown().await;
        info!("shut down");
        served.map_err(StartupError::Serve)
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
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
    info!("shutdown signal received");
}

/// Fatal error while bringing the process up or serving.
#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not build document store: {0}")]
    Backend(#[from] BackendBuildError),

    #[error("document store is not usable: {0}")]
    Store(#[from] StoreError),

    #[error("could not bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("could not schedule log push: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("liveness server failed: {0}")]
    Serve(io::Error),

    #[error("could not install tracing subscriber: {0}")]
    Tracing(#[from] tracing::subscriber::SetGlobalDefaultError),
}
