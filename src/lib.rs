//! # tabwire
//!
//! A small TCP request/response service over delimiter-framed text:
//! - Messages are UTF-8 payloads terminated by a single reserved byte (`\t`)
//! - The server answers each integer request with its cube root
//! - Invalid requests get an error message back; the connection stays open
//! - Graceful shutdown drains every connection handler
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐                               ┌──────────────────────┐
//! │    Client    │        frames over TCP        │   Server (acceptor)  │
//! │ send batch → ├──────────────────────────────►│          │           │
//! │ ← read batch │◄──────────────────────────────┤  one handler thread  │
//! └──────┬───────┘                               │   per connection     │
//!        │                                       └──────────┬───────────┘
//!        ▼                                                  ▼
//!  ┌─────────────┐                                 ┌─────────────────┐
//!  │   Channel   │                                 │ validate → cbrt │
//!  │ (framing)   │                                 │   → format      │
//!  └─────────────┘                                 └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod compute;
pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, ValidationError, WireError};
pub use config::Config;
pub use network::{Client, Server, ServerHandle};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of tabwire
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
