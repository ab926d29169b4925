//! Peer registry: the local view of who else is alive.
//!
//! Records are keyed by address and kept in insertion order. The registry
//! owns the local identity and the notifier, so every mutation path can
//! publish a snapshot. Each operation takes the data lock once and releases
//! it before subscribers run. A separate ordering lock is held from mutation
//! through delivery, so subscribers see snapshots in the order they were
//! taken. Callbacks may read the registry but must not mutate it.

use crate::events::{Notifier, Subscription};
use crate::{PeerRecord, RegistrySnapshot};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Ordered address → record map guarded for multi-threaded Tokio use.
pub struct PeerRegistry {
    identity: PeerRecord,
    peers: RwLock<Vec<PeerRecord>>,
    notifier: Arc<Notifier>,
    publish_order: Mutex<()>,
}

impl PeerRegistry {
    pub fn new(identity: PeerRecord) -> Self {
        Self {
            identity,
            peers: RwLock::new(Vec::new()),
            notifier: Arc::new(Notifier::new()),
            publish_order: Mutex::new(()),
        }
    }

    pub fn identity(&self) -> &PeerRecord {
        &self.identity
    }

    /// Insert or overwrite a peer and publish.
    ///
    /// Returns false (and publishes nothing) for our own address.
    pub fn save(&self, record: PeerRecord) -> bool {
        self.save_at(record, Instant::now())
    }

    /// `save` with an explicit refresh time.
    pub fn save_at(&self, record: PeerRecord, now: Instant) -> bool {
        let _order = self.order();
        let snapshot = {
            let mut peers = self.peers.write().unwrap_or_else(|e| e.into_inner());
            if !self.upsert(&mut peers, record, now) {
                return false;
            }
            self.snapshot_of(&peers)
        };
        self.notifier.publish(&snapshot);
        true
    }

    /// Save many records without publishing. Returns how many were stored.
    ///
    /// The caller is responsible for publishing once the batch is done.
    pub fn merge(&self, records: impl IntoIterator<Item = PeerRecord>) -> usize {
        let now = Instant::now();
        let mut peers = self.peers.write().unwrap_or_else(|e| e.into_inner());
        let mut stored = 0;
        for record in records {
            if self.upsert(&mut peers, record, now) {
                stored += 1;
            }
        }
        stored
    }

    /// Remove a peer and publish if it was present.
    pub fn evict(&self, address: &str) -> bool {
        let _order = self.order();
        let snapshot = {
            let mut peers = self.peers.write().unwrap_or_else(|e| e.into_inner());
            if !Self::remove(&mut peers, address) {
                return false;
            }
            self.snapshot_of(&peers)
        };
        info!("Evicted peer {}", address);
        self.notifier.publish(&snapshot);
        true
    }

    /// Remove a peer without publishing.
    pub fn forget(&self, address: &str) -> bool {
        let mut peers = self.peers.write().unwrap_or_else(|e| e.into_inner());
        Self::remove(&mut peers, address)
    }

    /// Evict every peer not refreshed within `stale_after` of `now`.
    ///
    /// Publishes one snapshot if anything was evicted. Returns the evicted records.
    pub fn sweep(&self, stale_after: Duration, now: Instant) -> Vec<PeerRecord> {
        let _order = self.order();
        let (evicted, snapshot) = {
            let mut peers = self.peers.write().unwrap_or_else(|e| e.into_inner());
            let (stale, fresh): (Vec<_>, Vec<_>) = peers
                .drain(..)
                .partition(|peer| is_stale(peer, stale_after, now));
            *peers = fresh;
            if stale.is_empty() {
                return stale;
            }
            (stale, self.snapshot_of(&peers))
        };
        for peer in &evicted {
            info!("Evicted stale peer {} ({})", peer.address, peer.name);
        }
        self.notifier.publish(&snapshot);
        evicted
    }

    /// Consistent point-in-time copy of identity and peers.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let peers = self.peers.read().unwrap_or_else(|e| e.into_inner());
        self.snapshot_of(&peers)
    }

    /// Publish the current snapshot to all subscribers.
    pub fn publish(&self) {
        let _order = self.order();
        let snapshot = self.snapshot();
        self.notifier.publish(&snapshot);
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&RegistrySnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        self.notifier.subscribe(callback)
    }

    pub fn get(&self, address: &str) -> Option<PeerRecord> {
        self.peers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|p| p.address == address)
            .cloned()
    }

    /// Known addresses, in registry order.
    pub fn addresses(&self) -> Vec<String> {
        self.peers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|p| p.address.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.peers.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn order(&self) -> MutexGuard<'_, ()> {
        self.publish_order.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn upsert(&self, peers: &mut Vec<PeerRecord>, mut record: PeerRecord, now: Instant) -> bool {
        if record.address == self.identity.address {
            return false;
        }
        record.refreshed_at = Some(now);
        match peers.iter_mut().find(|p| p.address == record.address) {
            Some(existing) => *existing = record,
            None => {
                debug!("New peer {} ({})", record.address, record.name);
                peers.push(record);
            }
        }
        true
    }

    fn remove(peers: &mut Vec<PeerRecord>, address: &str) -> bool {
        match peers.iter().position(|p| p.address == address) {
            Some(index) => {
                peers.remove(index);
                true
            }
            None => false,
        }
    }

    fn snapshot_of(&self, peers: &[PeerRecord]) -> RegistrySnapshot {
        RegistrySnapshot {
            current: self.identity.clone(),
            clients: peers.to_vec(),
        }
    }
}

fn is_stale(peer: &PeerRecord, stale_after: Duration, now: Instant) -> bool {
    peer.refreshed_at
        .map(|at| now.saturating_duration_since(at) > stale_after)
        .unwrap_or(false)
}
