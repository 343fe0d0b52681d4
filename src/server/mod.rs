// src/server/mod.rs

//! Development server: static files from `app/`, plus live reload over
//! Server-Sent Events.

pub mod reload;
pub mod routes;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ServerSection;
use crate::errors::Result;
use crate::watch::watcher::spawn_watcher;

pub use reload::{ReloadEvent, ReloadHub};
pub use routes::{create_router, ServerState};

#[derive(Debug, Clone)]
pub struct DevServer {
    dir: PathBuf,
    options: ServerSection,
    hub: ReloadHub,
}

impl DevServer {
    pub fn new(dir: impl Into<PathBuf>, options: ServerSection) -> Self {
        Self {
            dir: dir.into(),
            options,
            hub: ReloadHub::new(),
        }
    }

    pub fn hub(&self) -> &ReloadHub {
        &self.hub
    }

    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = format!("{}:{}", self.options.host, self.options.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("binding dev server to {addr}"))?;
        Ok(listener)
    }

    /// Bind, then serve until `cancel` fires.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener, cancel).await
    }

    /// Serve on an already bound listener, watching the served directory
    /// for changes.
    pub async fn serve(&self, listener: TcpListener, cancel: &CancellationToken) -> Result<()> {
        let (watcher, changes) = spawn_watcher(&self.dir)?;
        let root = watcher.root().to_path_buf();
        let result = self.serve_with_changes(listener, root, changes, cancel).await;
        drop(watcher);
        result
    }

    /// Serve on `listener`, publishing reloads for paths arriving on
    /// `changes` (absolute below `root`, or already relative to it).
    pub async fn serve_with_changes(
        &self,
        listener: TcpListener,
        root: PathBuf,
        changes: mpsc::UnboundedReceiver<PathBuf>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let addr = listener.local_addr().context("reading dev server address")?;
        info!(dir = %self.dir.display(), "serving at http://{addr}");

        let state = ServerState::new(self.dir.clone(), self.hub.clone(), cancel.clone());
        let app = create_router(state);
        let shutdown = cancel.clone().cancelled_owned();
        let server = async move { axum::serve(listener, app).with_graceful_shutdown(shutdown).await };

        let debouncer = reload::run_debouncer(
            root,
            changes,
            self.hub.clone(),
            Duration::from_millis(self.options.debounce_ms),
            cancel.clone(),
        );

        let (served, ()) = tokio::join!(server, debouncer);
        served.context("dev server")?;
        info!("dev server stopped");
        Ok(())
    }
}
