//! Shutdown coordination across the origin and relay servers.
//!
//! `meter-relay all` runs both servers in one process; each takes a receiver
//! tagged with its service name, and a single trigger drains them together.

use tokio::sync::broadcast;

pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Register a server for the shutdown signal.
    pub fn subscribe(&self, service: &'static str) -> broadcast::Receiver<()> {
        tracing::debug!(service, "Registered for shutdown");
        self.tx.subscribe()
    }

    /// Notify every registered server that still listens.
    ///
    /// Returns how many were reached; servers that already exited are not counted.
    pub fn trigger(&self) -> usize {
        let notified = self.tx.send(()).unwrap_or(0);
        tracing::info!(servers = notified, "Shutdown triggered");
        notified
    }

    /// Servers still holding a receiver.
    pub fn active_servers(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
