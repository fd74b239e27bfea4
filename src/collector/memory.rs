//! Memory collector: balloon counters reported by the hypervisor, in KiB.

use crate::agent::{Capabilities, GuestAgent};
use crate::hypervisor::DomainStats;
use crate::machine::MachineId;
use crate::sample::{Desc, Sample};

use super::{Collector, Result};

const SUBSYSTEM: &str = "mem";

pub struct MemoryCollector {
    total: Desc,
    used: Desc,
    available: Desc,
}

impl MemoryCollector {
    pub fn new() -> Self {
        let uuid: &'static [&'static str] = &["uuid"];
        Self {
            total: Desc::new(SUBSYSTEM, "total", "Memory available to the domain, in KiB.", uuid),
            used: Desc::new(SUBSYSTEM, "used", "Used memory including buff/cache, in KiB.", uuid),
            available: Desc::new(
                SUBSYSTEM,
                "available",
                "Reclaimable memory excluding buff/cache, in KiB.",
                uuid,
            ),
        }
    }
}

impl Default for MemoryCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for MemoryCollector {
    fn name(&self) -> &'static str {
        "mem"
    }

    fn update(
        &self,
        stats: &DomainStats,
        machine: &MachineId,
        _agent: &GuestAgent,
        _capabilities: &Capabilities,
        out: &mut Vec<Sample>,
    ) -> Result<()> {
        let uuid = machine.as_ref();
        let balloon = stats.balloon;
        out.push(Sample::new(&self.total, balloon.available as f64, &[uuid]));
        out.push(Sample::new(
            &self.used,
            balloon.available.saturating_sub(balloon.unused) as f64,
            &[uuid],
        ));
        out.push(Sample::new(&self.available, balloon.usable as f64, &[uuid]));
        Ok(())
    }
}
