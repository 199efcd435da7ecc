//! Serena client - session-aware MCP client, CLI and HTTP proxy
//!
//! This library talks to a Serena semantic code navigation server over the
//! MCP streamable HTTP transport. It negotiates a session once, persists it
//! for later invocations, and exposes Serena's tools as typed async
//! operations.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `mcp`: session store, JSON-RPC codec, HTTP transport and the client
//! - `ops`: typed operations (symbols, memory, editing, onboarding, recipes)
//! - `connector`: circuit breaker and health tracking around a client
//! - `format`: terminal and JSON rendering
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli` / `commands`: command-line interface and handlers
//! - `server`: HTTP proxy (feature `server`)
//!
//! # Example
//!
//! ```no_run
//! use serena_client::{Config, FindSymbolOptions, SerenaClient, SymbolKind};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let client = SerenaClient::new(config.server.clone(), config.session.store());
//!     client.connect().await?;
//!     let opts = FindSymbolOptions {
//!         kind: Some(SymbolKind::Class),
//!         ..Default::default()
//!     };
//!     let classes = client.find_symbol("Customer", &opts).await?;
//!     println!("{} matches", classes.len());
//!     client.close();
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod connector;
pub mod error;
pub mod format;
pub mod mcp;
pub mod ops;
#[cfg(feature = "server")]
pub mod server;
pub mod symbols;

// Re-export commonly used types
pub use config::Config;
pub use connector::{CircuitBreaker, CircuitState, SerenaConnector};
pub use error::{Result, SerenaError};
pub use mcp::client::SerenaClient;
pub use mcp::session::{Session, SessionStore};
pub use ops::FindSymbolOptions;
pub use symbols::SymbolKind;
