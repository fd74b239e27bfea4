//! Per-machine metric collectors.
//!
//! Each collector turns one machine's hypervisor counter snapshot, plus
//! guest-agent-sourced data where the negotiated capabilities allow it, into
//! labeled samples. A collector failure is contained at this boundary: it
//! costs the machine its success gauge but never aborts sibling collectors
//! or machines.
//!
//! Collectors are constructed explicitly and handed to the
//! [`Scraper`](crate::scrape::Scraper); there is no process-wide registry.

use std::sync::Arc;

use crate::agent::{AgentError, Capabilities, GuestAgent};
use crate::guest::ParseError;
use crate::hypervisor::DomainStats;
use crate::machine::MachineId;
use crate::sample::Sample;

mod cpu;
mod disk;
mod memory;
mod network;

pub use cpu::CpuCollector;
pub use disk::DiskCollector;
pub use memory::MemoryCollector;
pub use network::NetworkCollector;

/// One metric collector for one concern (cpu, memory, disk, network).
///
/// `update` runs on a worker thread of the scrape fan-out; implementations
/// must be freely shareable across machines and scrapes.
pub trait Collector: Send + Sync {
    /// Short name used in logs and for attributing failures.
    fn name(&self) -> &'static str;

    /// Appends this collector's samples for one machine.
    ///
    /// Hypervisor-sourced samples are always emitted; guest-sourced samples
    /// only when the relevant capability flag is set (a missing capability
    /// narrows the sample set, it is not an error).
    ///
    /// # Errors
    ///
    /// Agent or parse failures; the orchestrator records them against the
    /// machine's success gauge.
    fn update(
        &self,
        stats: &DomainStats,
        machine: &MachineId,
        agent: &GuestAgent,
        capabilities: &Capabilities,
        out: &mut Vec<Sample>,
    ) -> Result<()>;
}

/// The four standard collectors.
pub fn default_set() -> Vec<Arc<dyn Collector>> {
    vec![
        Arc::new(CpuCollector::new()),
        Arc::new(MemoryCollector::new()),
        Arc::new(DiskCollector::new()),
        Arc::new(NetworkCollector::new()),
    ]
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
