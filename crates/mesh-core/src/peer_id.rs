//! PeerId: Stable identifier for a node in the mesh.
//!
//! Generated once per process as a UUID v4. Ids received from other nodes are
//! carried opaquely, so any non-empty string is accepted when parsing.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeerIdError {
    #[error("Peer ID cannot be empty")]
    Empty,
}

/// A unique identifier for a node in the mesh.
///
/// # Examples
/// ```
/// use mesh_core::PeerId;
///
/// let peer_id = PeerId::generate();
/// let parsed: PeerId = peer_id.to_string().parse().unwrap();
/// assert_eq!(peer_id, parsed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerId(String);

impl PeerId {
    /// Generate a new random peer ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PeerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PeerId {
    type Err = PeerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PeerIdError::Empty);
        }
        Ok(Self(s.to_string()))
    }
}

// Serialize as a bare string so the wire shape stays `"id": "<uuid>"`
impl serde::Serialize for PeerId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PeerId {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_uuid() {
        let peer_id = PeerId::generate();
        assert!(uuid::Uuid::parse_str(peer_id.as_str()).is_ok());
    }

    #[test]
    fn test_generate_unique() {
        assert_ne!(PeerId::generate(), PeerId::generate());
    }

    #[test]
    fn test_parse_opaque() {
        let peer_id: PeerId = "node-b".parse().unwrap();
        assert_eq!(peer_id.to_string(), "node-b");
    }

    #[test]
    fn test_reject_empty() {
        assert_eq!("".parse::<PeerId>(), Err(PeerIdError::Empty));
    }

    #[test]
    fn test_serde_as_string() {
        let peer_id: PeerId = "abc".parse().unwrap();
        assert_eq!(serde_json::to_string(&peer_id).unwrap(), "\"abc\"");
        assert!(serde_json::from_str::<PeerId>("\"\"").is_err());
    }
}
