//! ExchangeTransport trait for gossip round-trips.
//!
//! Implementations:
//! - HTTP: reqwest client posting to `<address>/exchange` (mesh-node)
//! - In-memory: test transports routing to in-process nodes

use crate::{PeerRecord, RegistrySnapshot, Signature};
use async_trait::async_trait;
use thiserror::Error;

/// Path of the exchange endpoint on every node.
pub const EXCHANGE_PATH: &str = "/exchange";

/// Header carrying the sender's signature.
pub const SIGNATURE_HEADER: &str = "X-Signature";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Exchange timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Peer answered with status {0}")]
    Status(u16),

    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    #[error("Transport error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Request/response channel used by the exchanger.
#[async_trait]
pub trait ExchangeTransport: Send + Sync {
    /// Send our signed identity to `address` and return its registry snapshot.
    async fn exchange(
        &self,
        address: &str,
        signature: &Signature,
        identity: &PeerRecord,
    ) -> Result<RegistrySnapshot>;
}
