//! REST API server for the character table.
//!
//! Provides HTTP routing, the CRUD and query endpoints, and the JSON
//! response envelope.

pub mod handlers;
pub mod router;
pub mod server;
