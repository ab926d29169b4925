//! mesh-core: membership and gossip engine for a coordinator-free peer mesh.
//!
//! This crate provides:
//! - Node identity and the ordered peer registry
//! - Shared-secret signatures for admitting peers
//! - Pull-gossip discovery and the liveness sweep
//! - Change notifications carrying full registry snapshots
//!
//! Networking is abstracted behind [`ExchangeTransport`]; `mesh-node` supplies
//! the HTTP implementation.

pub mod auth;
pub mod config;
pub mod events;
pub mod membership;
pub mod peer_id;
pub mod record;
pub mod registry;
pub mod transport;

pub use auth::{AuthError, Authenticator, Signature};
pub use config::{ConfigError, MembershipConfig};
pub use events::{Notifier, Subscription};
pub use membership::{ExchangeOutcome, Membership, MembershipTasks, RoundReport};
pub use peer_id::{PeerId, PeerIdError};
pub use record::{PeerRecord, RegistrySnapshot};
pub use registry::PeerRegistry;
pub use transport::{ExchangeTransport, TransportError, EXCHANGE_PATH, SIGNATURE_HEADER};
