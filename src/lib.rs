//! Vetclix – record server protocol core
//!
//! This crate implements the wire side of the Vetclix record server:
//! - A tiny s-expression codec (strings, integers, floats, lists)
//! - An ordered connection permission model (`none < read < write`)
//! - A permission-gated command dispatcher with an in-band error vocabulary
//! - Reference collaborators: an in-memory record store with tag search, a
//!   credential table, and a line-framed session loop / TCP listener

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Credential lookup for the `auth` command.
pub mod auth;
/// Server configuration file.
pub mod config;
/// Commands, permissions and request dispatch.
pub mod protocol;
/// Session loop and TCP listener.
pub mod server;
/// S-expression wire codec.
pub mod sexp;
/// Record store and search collaborators.
pub mod store;

// Re-export key types for convenience
pub use config::ServerConfig;
pub use protocol::{Command, Context, Dispatcher, Permission};
pub use sexp::{ParseError, Value, dump, parse};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol version reported by the `version?` command
pub const PROTOCOL_VERSION: i64 = 1;
