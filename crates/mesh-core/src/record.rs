//! Peer records and registry snapshots.
//!
//! Both are sent as JSON between nodes and handed to subscribers, so field
//! names follow the camelCase wire format.

use crate::PeerId;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A node's description of itself, as held in a peer registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerRecord {
    /// Stable id, generated once per process
    pub id: PeerId,
    /// Operator-supplied display name
    pub name: String,
    /// Reachable endpoint, also the registry key
    #[serde(alias = "addr")]
    pub address: String,
    /// ISO-8601, set by the record owner
    pub created_at: String,
    /// ISO-8601, set by the record owner
    pub updated_at: String,
    /// Last successful exchange involving this peer. Local only.
    #[serde(skip)]
    pub refreshed_at: Option<Instant>,
}

impl PeerRecord {
    /// Create a fresh record for the local node.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        let now = iso_now();
        Self {
            id: PeerId::generate(),
            name: name.into(),
            address: address.into(),
            created_at: now.clone(),
            updated_at: now,
            refreshed_at: Some(Instant::now()),
        }
    }

    /// Whether the wire-visible fields match. `refreshed_at` is ignored.
    pub fn same_as(&self, other: &PeerRecord) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.address == other.address
            && self.created_at == other.created_at
            && self.updated_at == other.updated_at
    }
}

impl PartialEq for PeerRecord {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for PeerRecord {}

/// Point-in-time view of a registry plus the local identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub current: PeerRecord,
    pub clients: Vec<PeerRecord>,
}

impl RegistrySnapshot {
    /// Addresses of all clients, in registry order.
    pub fn addresses(&self) -> Vec<&str> {
        self.clients.iter().map(|c| c.address.as_str()).collect()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.clients.iter().any(|c| c.address == address)
    }

    /// The sender followed by everything it knows, the order used when merging.
    pub fn into_records(self) -> impl Iterator<Item = PeerRecord> {
        std::iter::once(self.current).chain(self.clients)
    }
}

/// Current UTC time with millisecond precision and a `Z` suffix.
pub fn iso_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
