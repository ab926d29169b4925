//! Membership engine: gossip exchanges, discovery rounds, and liveness sweeps.
//!
//! **Discovery (pull gossip):**
//! 1. Each round, pick targets: the bootstrap address while the registry is
//!    empty, otherwise every known peer
//! 2. Send our signed identity, receive the peer's full snapshot
//! 3. Merge the sender and everything it knows into our registry
//! 4. On any failure, evict the target; the next round is the retry
//!
//! **Liveness:** a separate timer evicts peers not refreshed within the
//! staleness threshold.
//!
//! **Registration:** inbound exchanges are admitted only with a valid signature.

use crate::auth::{AuthError, Authenticator, Signature};
use crate::config::{ConfigError, MembershipConfig};
use crate::events::Subscription;
use crate::registry::PeerRegistry;
use crate::transport::{ExchangeTransport, TransportError};
use crate::{PeerRecord, RegistrySnapshot};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Result of one exchange with a peer.
#[derive(Debug)]
pub enum ExchangeOutcome {
    /// Peer answered; `stored` records were merged
    Merged { address: String, stored: usize },
    /// Peer was unreachable or answered badly and has been evicted
    Failed {
        address: String,
        error: TransportError,
    },
}

impl ExchangeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }
}

/// Summary of one discovery round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundReport {
    pub attempted: usize,
    pub failed: usize,
}

/// A node's membership engine.
///
/// Wrap in `Arc` to run the background timers via [`Membership::start`].
pub struct Membership {
    config: MembershipConfig,
    registry: PeerRegistry,
    auth: Authenticator,
    transport: Arc<dyn ExchangeTransport>,
}

impl Membership {
    /// Validate `config` and create the local identity.
    pub fn new(
        config: MembershipConfig,
        transport: Arc<dyn ExchangeTransport>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let identity = PeerRecord::new(config.name.clone(), config.address.clone());
        info!(
            "Node {} ({}) at {}",
            identity.id, identity.name, identity.address
        );
        Ok(Self {
            auth: Authenticator::new(config.secret.clone()),
            registry: PeerRegistry::new(identity),
            config,
            transport,
        })
    }

    pub fn identity(&self) -> &PeerRecord {
        self.registry.identity()
    }

    pub fn config(&self) -> &MembershipConfig {
        &self.config
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.registry.snapshot()
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&RegistrySnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        self.registry.subscribe(callback)
    }

    /// Admit an inbound peer and return our snapshot for the response.
    ///
    /// The registry is untouched if the signature does not verify.
    pub fn register(
        &self,
        signature: &Signature,
        record: PeerRecord,
    ) -> Result<RegistrySnapshot, AuthError> {
        if let Err(e) = self.auth.verify(signature, &record) {
            warn!(
                "Rejected registration from {} ({}): {}",
                record.address, record.name, e
            );
            return Err(e);
        }
        debug!("Registered {} ({})", record.address, record.name);
        self.registry.save(record);
        Ok(self.registry.snapshot())
    }

    /// Pull `address`'s view and merge it, or evict `address` on failure.
    ///
    /// Publishes exactly one snapshot either way.
    pub async fn exchange(&self, address: &str) -> ExchangeOutcome {
        let identity = self.registry.identity();
        let signature = self.auth.sign(identity);

        let result = match tokio::time::timeout(
            self.config.exchange_timeout,
            self.transport.exchange(address, &signature, identity),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        };

        let outcome = match result {
            Ok(snapshot) => {
                let stored = self.registry.merge(snapshot.into_records());
                info!("Connected peer {} ({} record(s) merged)", address, stored);
                ExchangeOutcome::Merged {
                    address: address.to_string(),
                    stored,
                }
            }
            Err(error) => {
                warn!("Disconnected peer {}: {}", address, error);
                self.registry.forget(address);
                ExchangeOutcome::Failed {
                    address: address.to_string(),
                    error,
                }
            }
        };

        self.registry.publish();
        outcome
    }

    /// One discovery round.
    ///
    /// Exchanges run one at a time; a failing peer never stops the rest.
    pub async fn run_round(&self) -> RoundReport {
        let mut report = RoundReport::default();
        // Passive nodes rely on inbound registrations and the sweeper
        if !self.config.active_scan {
            return report;
        }

        let addresses = self.registry.addresses();
        if addresses.is_empty() {
            if let Some(bootstrap) = &self.config.bootstrap_address {
                debug!("Registry empty, joining via {}", bootstrap);
                report.attempted = 1;
                if !self.exchange(bootstrap).await.is_success() {
                    report.failed = 1;
                }
            }
            return report;
        }

        debug!("Scanning {} peer(s)", addresses.len());
        for address in addresses {
            report.attempted += 1;
            if !self.exchange(&address).await.is_success() {
                report.failed += 1;
            }
        }
        report
    }

    /// Evict peers older than the staleness threshold.
    pub fn run_sweep(&self) -> Vec<PeerRecord> {
        self.registry.sweep(self.config.stale_after, Instant::now())
    }

    /// Spawn the discovery timer and, if enabled, the sweep timer.
    pub fn start(self: &Arc<Self>) -> MembershipTasks {
        info!(
            "Starting membership timers (scan every {:?}, sweep {})",
            self.config.scan_interval,
            if self.config.sweep_enabled {
                format!("every {:?}", self.config.sweep_interval)
            } else {
                "disabled".to_string()
            }
        );

        let scan = {
            let membership = Arc::clone(self);
            tokio::spawn(async move { membership.scan_loop().await })
        };

        let sweep = self.config.sweep_enabled.then(|| {
            let membership = Arc::clone(self);
            tokio::spawn(async move { membership.sweep_loop().await })
        });

        MembershipTasks { scan, sweep }
    }

    async fn scan_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.scan_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let report = self.run_round().await;
            if report.attempted > 0 {
                debug!(
                    "Round finished: {} attempted, {} failed",
                    report.attempted, report.failed
                );
            }
        }
    }

    async fn sweep_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.sweep_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.run_sweep();
        }
    }
}

/// Handles to the background timers. Dropping stops them.
pub struct MembershipTasks {
    scan: JoinHandle<()>,
    sweep: Option<JoinHandle<()>>,
}

impl MembershipTasks {
    /// Stop both timers. In-flight exchanges are abandoned.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for MembershipTasks {
    fn drop(&mut self) {
        self.scan.abort();
        if let Some(sweep) = &self.sweep {
            sweep.abort();
        }
    }
}
