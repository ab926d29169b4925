//! Command-line and environment configuration.

use anyhow::{Context, Result};
use clap::Parser;
use mesh_core::MembershipConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "mesh-node")]
#[command(about = "Peer discovery node with shared-secret gossip")]
pub struct NodeArgs {
    /// JSON config file; flags below override its values
    #[arg(long, env = "MESH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Display name
    #[arg(long, env = "MESH_NAME")]
    pub name: Option<String>,

    /// Address other nodes use to reach us (e.g. http://10.0.0.5:3000)
    #[arg(long, env = "MESH_ADDR")]
    pub addr: Option<String>,

    /// Shared secret for the membership group
    #[arg(long, env = "MESH_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Seed peer contacted while we know nobody
    #[arg(long, env = "MESH_BOOTSTRAP")]
    pub bootstrap: Option<String>,

    /// Address to bind the HTTP server to
    #[arg(long, default_value = "0.0.0.0:3000", env = "MESH_LISTEN")]
    pub listen: String,

    /// Only answer inbound exchanges; never contact known peers
    #[arg(long)]
    pub no_scan: bool,

    /// Disable the liveness sweep
    #[arg(long)]
    pub no_sweep: bool,

    #[arg(long)]
    pub scan_interval_secs: Option<u64>,

    #[arg(long)]
    pub sweep_interval_secs: Option<u64>,

    #[arg(long)]
    pub stale_after_secs: Option<u64>,

    #[arg(long)]
    pub exchange_timeout_secs: Option<u64>,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,
}

impl NodeArgs {
    /// Build the engine configuration: file first, then flags.
    ///
    /// Missing required values surface later as a `ConfigError` from validation.
    pub fn membership_config(&self) -> Result<MembershipConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {:?}", path))?
            }
            None => MembershipConfig::new("", "", ""),
        };

        if let Some(name) = &self.name {
            config.name = name.clone();
        }
        if let Some(addr) = &self.addr {
            config.address = addr.clone();
        }
        if let Some(key) = &self.key {
            config.secret = key.clone();
        }
        if let Some(bootstrap) = &self.bootstrap {
            config.bootstrap_address = Some(bootstrap.clone());
        }
        if self.no_scan {
            config.active_scan = false;
        }
        if self.no_sweep {
            config.sweep_enabled = false;
        }
        if let Some(secs) = self.scan_interval_secs {
            config.scan_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.sweep_interval_secs {
            config.sweep_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.stale_after_secs {
            config.stale_after = Duration::from_secs(secs);
        }
        if let Some(secs) = self.exchange_timeout_secs {
            config.exchange_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
