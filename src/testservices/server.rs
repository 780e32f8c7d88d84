//! Simulated service bound to a real socket.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::lifecycle::Shutdown;
use crate::testservices::http::router;
use crate::testservices::nova::Nova;

/// Serve `nova` on `listener` until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    nova: Arc<Nova>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Simulated nova service starting");

    axum::serve(listener, router(nova))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Simulated nova service received shutdown signal");
        })
        .await?;

    tracing::info!(address = %addr, "Simulated nova service stopped");
    Ok(())
}

/// Handle to a background server task.
pub struct SimulatedServer {
    addr: SocketAddr,
    nova: Arc<Nova>,
    shutdown: Shutdown,
    task: JoinHandle<Result<(), std::io::Error>>,
}

impl SimulatedServer {
    /// Spawn a server on an already-bound listener.
    pub fn start(listener: TcpListener, nova: Arc<Nova>) -> Result<Self, std::io::Error> {
        let addr = listener.local_addr()?;
        let shutdown = Shutdown::new();
        let task = tokio::spawn(serve(listener, nova.clone(), shutdown.subscribe()));
        Ok(Self {
            addr,
            nova,
            shutdown,
            task,
        })
    }

    /// Bind `addr` (use port 0 for an ephemeral port) and spawn a server.
    pub async fn bind(addr: &str, nova: Arc<Nova>) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind(addr).await?;
        Self::start(listener, nova)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL for `HttpTransport`.
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn nova(&self) -> &Arc<Nova> {
        &self.nova
    }

    /// Trigger graceful shutdown and wait for the task to finish.
    pub async fn stop(self) -> Result<(), std::io::Error> {
        self.shutdown.trigger();
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(std::io::Error::other(e)),
        }
    }
}
