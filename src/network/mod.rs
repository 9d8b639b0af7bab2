//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread polling a non-blocking listener
//! - One handler thread per connection, tracked in a registry
//! - Shutdown wakes blocked handlers and drains them before `run` returns

mod client;
mod connection;
mod server;
mod supervisor;

pub use client::{random_requests, Client, Exchange};
pub use connection::{CloseReason, Connection};
pub use server::{Server, ServerHandle};
pub use supervisor::{ConnectionRegistry, Registration, ShutdownSignal};
