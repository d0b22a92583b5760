//! Accept loop with bounded admission.
use crate::config::ServerConfig;
use crate::error::Result;
use crate::registry::SessionRegistry;
use crate::session::SessionHandler;
use crate::version::VersionStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// The sync server: a TCP listener handing each connection to a
/// [`SessionHandler`] task.
///
/// Admission is bounded by a semaphore of `max_sessions` permits; further
/// connections queue in the listener backlog until a session finishes.
pub struct SyncServer {
    listener: TcpListener,
    handler: Arc<SessionHandler>,
    registry: SessionRegistry,
    permits: Arc<Semaphore>,
}

impl SyncServer {
    /// Bind the listener and prepare shared state.
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.storage.data_dir).await?;

        let listener = TcpListener::bind(config.bind_addr()).await?;
        info!(addr = %listener.local_addr()?, "listening");

        let registry = SessionRegistry::new();
        let versions = Arc::new(VersionStore::new(config.storage.data_dir.clone()));
        let handler = Arc::new(SessionHandler::new(
            registry.clone(),
            versions,
            config.storage.data_dir.clone(),
            config.io_timeout(),
        ));

        Ok(Self {
            listener,
            handler,
            registry,
            permits: Arc::new(Semaphore::new(config.limits.max_sessions)),
        })
    }

    /// The bound address (useful when the configured port is 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The shared session registry
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Accept connections forever.
    pub async fn serve(self) -> Result<()> {
        loop {
            let permit = match Arc::clone(&self.permits).acquire_owned().await {
                Ok(permit) => permit,
                // The semaphore is never closed; treat it as shutdown anyway
                Err(_) => return Ok(()),
            };

            let (stream, addr) = self.listener.accept().await?;
            debug!(%addr, "connection accepted");

            let handler = Arc::clone(&self.handler);
            tokio::spawn(async move {
                let _permit = permit;
                // Terminal for this connection only; authenticated failures
                // are already logged with their username by the handler
                if let Err(e) = handler.handle(stream).await {
                    debug!(%addr, error = %e, "connection ended with error");
                }
            });
        }
    }
}
