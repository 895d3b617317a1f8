//! TCP listener accepting farm clients.

use crate::config::ServerConfig;
use crate::registry::PlayerRegistry;
use crate::scheduler::GrowthScheduler;
use crate::session::Session;
use log::{error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;

/// Accept loop handing every connection to its own session task.
pub struct FarmServer {
    listener: TcpListener,
    registry: Arc<PlayerRegistry>,
}

impl FarmServer {
    /// Binds the configured address and sets up the shared growth scheduler
    /// on the current runtime.
    pub async fn bind(config: &ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(config.address()).await?;
        let scheduler =
            GrowthScheduler::new(Handle::current(), config.ripen_workers, config.growth_delay);
        let registry = Arc::new(PlayerRegistry::new(scheduler));

        info!(
            "Farm server listening on {} (growth {:?}, {} ripen workers)",
            listener.local_addr()?,
            config.growth_delay,
            config.ripen_workers
        );

        Ok(Self { listener, registry })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> Arc<PlayerRegistry> {
        Arc::clone(&self.registry)
    }

    /// Accepts connections until the task is dropped.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let registry = Arc::clone(&self.registry);
                    tokio::spawn(handle_connection(stream, addr, registry));
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, addr: SocketAddr, registry: Arc<PlayerRegistry>) {
    info!("Client connected from {}", addr);
    let (reader, writer) = stream.into_split();

    match Session::new(registry, addr.to_string()).run(reader, writer).await {
        Ok(()) => info!("Client {} disconnected", addr),
        Err(e) => warn!("Connection to {} lost: {}", addr, e),
    }
}
