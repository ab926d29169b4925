//! mesh-node library: HTTP plumbing around the mesh-core engine.
//!
//! Exposed as a library so integration tests can run real servers.

pub mod cli;
pub mod client;
pub mod server;

pub use cli::NodeArgs;
pub use client::HttpTransport;
pub use server::{router, AppState};
