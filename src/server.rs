//! HTTP server lifecycle
//!
//! Wires configuration into the runner, the artifact store and the studio
//! service, performs startup checks and serves the API until the shutdown
//! signal fires. Shutdown cancels the runner's token, so in-flight CLI
//! processes are killed instead of outliving the server.

use crate::api::build_app;
use crate::artifacts::{ArtifactIndex, FsArtifactStore};
use crate::config::QqlConfig;
use crate::error::Result;
use crate::process::ProcessRunner;
use crate::studio::{Studio, StudioState};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// QQL Studio HTTP server
pub struct Server {
    studio: Arc<Studio>,
    shutdown: CancellationToken,
}

impl Server {
    /// Build the server from a validated configuration
    pub fn new(config: QqlConfig) -> Result<Self> {
        config.validate()?;

        let shutdown = CancellationToken::new();
        let runner = ProcessRunner::with_shutdown(shutdown.clone());
        let store: Arc<dyn ArtifactIndex> =
            Arc::new(FsArtifactStore::new(&config.storage.output_dir));
        let studio = Arc::new(Studio::new(config, runner, store));

        Ok(Self { studio, shutdown })
    }

    pub fn config(&self) -> &QqlConfig {
        self.studio.config()
    }

    /// Token cancelled when the server shuts down
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// The complete HTTP application
    pub fn app(&self) -> Router {
        let config = self.config();
        build_app(
            StudioState {
                studio: self.studio.clone(),
            },
            config.storage.static_dir.as_deref(),
            &config.server.cors_origins,
        )
    }

    /// Startup checks. Problems are logged, never fatal.
    pub async fn prepare(&self) {
        let config = self.config();

        match self.studio.artifacts().ensure_directory().await {
            Ok(()) => tracing::info!(
                output_dir = %config.storage.output_dir.display(),
                "Output directory ready"
            ),
            Err(e) => tracing::error!(
                output_dir = %config.storage.output_dir.display(),
                error = %e,
                "Failed to create output directory"
            ),
        }

        if tokio::fs::try_exists(&config.cli.path).await.unwrap_or(false) {
            tracing::info!(cli = %config.cli.path.display(), "qql-cli found");
        } else {
            tracing::warn!(
                cli = %config.cli.path.display(),
                "qql-cli not found; build it first (cargo build --release)"
            );
        }

        if let Some(dir) = &config.storage.static_dir {
            let is_dir = tokio::fs::metadata(dir)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false);
            if !is_dir {
                tracing::warn!(static_dir = %dir.display(), "Static directory missing");
            }
        }
    }

    /// Bind the configured listen address
    pub async fn bind(&self) -> Result<TcpListener> {
        let server = &self.config().server;
        let listener = TcpListener::bind((server.host.as_str(), server.port)).await?;
        Ok(listener)
    }

    /// Serve on `listener` until `signal` resolves
    pub async fn serve<F>(self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.app();
        let shutdown = self.shutdown.clone();

        tracing::info!(addr = %listener.local_addr()?, "QQL Studio listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signal.await;
                tracing::info!("Shutting down, stopping in-flight renders");
                shutdown.cancel();
            })
            .await?;

        tracing::info!("QQL Studio stopped");
        Ok(())
    }
}
