//! MCP (Model Context Protocol) client support
//!
//! Serena speaks MCP over streamable HTTP: every message is a POST to one
//! endpoint, and replies come back as plain JSON or as server-sent events.
//!
//! # Module Layout
//!
//! - `types`     -- JSON-RPC primitives and the MCP messages the client uses
//! - `codec`     -- request encoding, reply decoding and result unwrapping
//! - `transport` -- `Transport` trait, the reqwest implementation and a fake
//! - `session`   -- per-user session store
//! - `client`    -- session-aware `SerenaClient`

pub mod client;
pub mod codec;
pub mod session;
pub mod transport;
pub mod types;

pub use types::*;
