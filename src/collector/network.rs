//! Network collector: per-interface traffic counters reported by the
//! hypervisor.

use crate::agent::{Capabilities, GuestAgent};
use crate::hypervisor::DomainStats;
use crate::machine::MachineId;
use crate::sample::{Desc, Sample};

use super::{Collector, Result};

const SUBSYSTEM: &str = "network";

const LABELS: &[&str] = &["uuid", "target_device"];

pub struct NetworkCollector {
    receive_bytes: Desc,
    receive_packets: Desc,
    receive_errors: Desc,
    receive_drops: Desc,
    transmit_bytes: Desc,
    transmit_packets: Desc,
    transmit_errors: Desc,
    transmit_drops: Desc,
}

impl NetworkCollector {
    pub fn new() -> Self {
        Self {
            receive_bytes: Desc::new(SUBSYSTEM, "receive_bytes", "Bytes received.", LABELS),
            receive_packets: Desc::new(SUBSYSTEM, "receive_packets", "Packets received.", LABELS),
            receive_errors: Desc::new(SUBSYSTEM, "receive_errors", "Receive errors.", LABELS),
            receive_drops: Desc::new(SUBSYSTEM, "receive_drops", "Dropped inbound packets.", LABELS),
            transmit_bytes: Desc::new(SUBSYSTEM, "transmit_bytes", "Bytes transmitted.", LABELS),
            transmit_packets: Desc::new(SUBSYSTEM, "transmit_packets", "Packets transmitted.", LABELS),
            transmit_errors: Desc::new(SUBSYSTEM, "transmit_errors", "Transmit errors.", LABELS),
            transmit_drops: Desc::new(SUBSYSTEM, "transmit_drops", "Dropped outbound packets.", LABELS),
        }
    }
}

impl Default for NetworkCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for NetworkCollector {
    fn name(&self) -> &'static str {
        "network"
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
        for iface in &stats.interfaces {
            let labels = &[uuid, iface.name.as_str()];
            out.push(Sample::new(&self.receive_bytes, iface.rx_bytes as f64, labels));
            out.push(Sample::new(&self.receive_packets, iface.rx_packets as f64, labels));
            out.push(Sample::new(&self.receive_errors, iface.rx_errs as f64, labels));
            out.push(Sample::new(&self.receive_drops, iface.rx_drop as f64, labels));
            out.push(Sample::new(&self.transmit_bytes, iface.tx_bytes as f64, labels));
            out.push(Sample::new(&self.transmit_packets, iface.tx_packets as f64, labels));
            out.push(Sample::new(&self.transmit_errors, iface.tx_errs as f64, labels));
            out.push(Sample::new(&self.transmit_drops, iface.tx_drop as f64, labels));
        }
        Ok(())
    }
}
