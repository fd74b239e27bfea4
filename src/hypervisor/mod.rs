//! The hypervisor boundary: enumeration of running virtual machines together
//! with their raw counter snapshots.
//!
//! The connection itself (URI handling, authentication, the actual wire
//! protocol) lives outside this crate. A backend implements [`Hypervisor`]
//! and hands each domain over as a [`Domain`]: a stable UUID, an owned
//! [`DomainStats`] snapshot valid for one scrape pass, and the command
//! channel to that machine's guest agent.

use std::sync::Arc;

use crate::agent::AgentChannel;
use crate::machine::MachineId;

/// Provider of the per-scrape batch of domains and their raw counters.
///
/// One call per scrape pass; implementations fetch everything in a single
/// batch so that machines share one consistent enumeration.
pub trait Hypervisor: Send + Sync {
    /// Enumerates all active domains with a fresh statistics snapshot.
    ///
    /// # Errors
    ///
    /// [`HypervisorError::Connection`] if the hypervisor cannot be reached at
    /// all (fatal to the scrape invocation), [`HypervisorError::Enumeration`]
    /// if the connection stands but the batch stats query failed (the scrape
    /// degrades to zero machines).
    fn domains(&self) -> Result<Vec<Domain>>;
}

/// One virtual machine as handed out by the hypervisor for a single scrape.
pub struct Domain {
    pub id: MachineId,
    pub stats: DomainStats,
    pub agent: Arc<dyn AgentChannel>,
}

/// Hypervisor-reported counter snapshot for one domain.
///
/// Read-only once fetched; the scrape orchestrator shares it across that
/// machine's collector workers and drops it at the end of the pass.
#[derive(Debug, Clone, Default)]
pub struct DomainStats {
    /// Number of virtual CPUs assigned to the domain.
    pub vcpus: u32,
    pub cpu: CpuCounters,
    pub balloon: BalloonCounters,
    pub blocks: Vec<BlockCounters>,
    pub interfaces: Vec<InterfaceCounters>,
}

/// Cumulative CPU time counters, in nanoseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuCounters {
    pub time: u64,
    pub user: u64,
    pub system: u64,
}

/// Memory balloon counters, in KiB.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalloonCounters {
    /// Memory usable by the domain (balloon target).
    pub available: u64,
    /// Memory left completely unused by the guest.
    pub unused: u64,
    /// Memory the guest can reclaim without swapping.
    pub usable: u64,
}

/// I/O counters for one block device.
#[derive(Debug, Clone, Default)]
pub struct BlockCounters {
    /// Target device name inside the domain definition (e.g. `vda`).
    pub name: String,
    pub rd_reqs: u64,
    pub wr_reqs: u64,
    pub rd_bytes: u64,
    pub wr_bytes: u64,
}

/// Traffic counters for one virtual network interface.
#[derive(Debug, Clone, Default)]
pub struct InterfaceCounters {
    pub name: String,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errs: u64,
    pub rx_drop: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errs: u64,
    pub tx_drop: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum HypervisorError {
    #[error("failed to connect to hypervisor at `{uri}`: {message}")]
    Connection { uri: String, message: String },

    #[error("failed to enumerate domain stats: {message}")]
    Enumeration { message: String },
}

pub type Result<T> = std::result::Result<T, HypervisorError>;
