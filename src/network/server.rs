//! TCP Server
//!
//! Accepts connections and runs one handler thread per connection.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::sync::WaitGroup;

use crate::config::Config;
use crate::error::Result;
use crate::network::connection::Connection;
use crate::network::supervisor::{ConnectionRegistry, ShutdownSignal};

/// TCP server for tabwire
pub struct Server {
    config: Config,
    listener: TcpListener,
    shutdown: ShutdownSignal,
    registry: Arc<ConnectionRegistry>,
}

/// Cloneable remote control for a running [`Server`]
#[derive(Debug, Clone)]
pub struct ServerHandle {
    shutdown: ShutdownSignal,
    registry: Arc<ConnectionRegistry>,
}

impl ServerHandle {
    /// Signal the server to shutdown gracefully
    ///
    /// Stops accepting and wakes every handler blocked in a read. `run`
    /// returns once all handlers have exited.
    pub fn shutdown(&self) {
        self.shutdown.trigger();
        self.registry.close_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_triggered()
    }

    /// Number of connections currently being handled
    pub fn active_connections(&self) -> usize {
        self.registry.len()
    }
}

impl Server {
    /// Bind the listener described by `config`
    pub fn bind(config: Config) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.addr)?;
        // Non-blocking so the accept loop can observe shutdown
        listener.set_nonblocking(true)?;

        tracing::info!(
            role = "server",
            id = 0u64,
            addr = %listener.local_addr()?,
            "got listener for the server"
        );

        Ok(Self {
            config,
            listener,
            shutdown: ShutdownSignal::new(),
            registry: Arc::new(ConnectionRegistry::new()),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shutdown: self.shutdown.clone(),
            registry: Arc::clone(&self.registry),
        }
    }

    /// Start the server (blocking)
    ///
    /// Accept failures are logged and never stop the loop. Returns after
    /// [`ServerHandle::shutdown`] once every handler has drained.
    pub fn run(&self) -> Result<()> {
        let poll = Duration::from_millis(self.config.accept_poll_ms.max(1));
        let drain = WaitGroup::new();
        let mut next_id: u64 = 0;

        while !self.shutdown.is_triggered() {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    next_id += 1;
                    self.dispatch(next_id, stream, peer, drain.clone());
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(poll),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::error!(role = "server", id = 0u64, error = %e, "accept error");
                    // Back off so a persistent failure (e.g. EMFILE) doesn't spin
                    thread::sleep(poll);
                }
            }
        }

        // Catch connections registered after the first close_all()
        self.registry.close_all();
        if !self.registry.is_empty() {
            tracing::info!(
                role = "server",
                id = 0u64,
                active = self.registry.len(),
                "waiting for handlers to drain"
            );
        }
        drain.wait();
        tracing::info!(role = "server", id = 0u64, "server stopped");

        Ok(())
    }

    fn dispatch(&self, id: u64, stream: TcpStream, peer: SocketAddr, drain: WaitGroup) {
        if self.registry.len() >= self.config.max_connections {
            tracing::warn!(
                role = "server",
                id = 0u64,
                %peer,
                max = self.config.max_connections,
                "connection limit reached, dropping connection"
            );
            return;
        }

        tracing::info!(
            role = "server",
            id,
            %peer,
            "established a connection with a client application"
        );

        let registration = match stream
            .set_nonblocking(false)
            .and_then(|_| stream.try_clone())
        {
            Ok(clone) => self.registry.register(id, clone),
            Err(e) => {
                tracing::warn!(
                    role = "server",
                    id,
                    %peer,
                    error = %e,
                    "failed to prepare connection"
                );
                return;
            }
        };

        let connection = match Connection::new(
            id,
            stream,
            self.config.delimiter,
            Duration::from_millis(self.config.read_timeout_ms),
            self.shutdown.clone(),
        ) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    role = "server",
                    id,
                    %peer,
                    error = %e,
                    "failed to set up connection"
                );
                return;
            }
        };

        let spawned = thread::Builder::new()
            .name(format!("tabwire-conn-{}", id))
            .spawn(move || {
                // Dropped in reverse: deregister before signalling the drain
                let _drain = drain;
                let _registration = registration;
                connection.handle();
            });

        if let Err(e) = spawned {
            tracing::error!(role = "server", id, error = %e, "failed to spawn handler thread");
        }
    }
}
