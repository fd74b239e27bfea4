//! CPU collector: hypervisor CPU time counters and vcpu count, plus guest
//! CPU accounting and load averages read through the agent.

use crate::agent::{Capabilities, GuestAgent};
use crate::guest::{LoadAvg, Stat};
use crate::hypervisor::DomainStats;
use crate::machine::MachineId;
use crate::sample::{Desc, Sample};

use super::{Collector, Result};

const SUBSYSTEM: &str = "cpu";

pub struct CpuCollector {
    cores: Desc,
    cpu_time: Desc,
    system_time: Desc,
    user_time: Desc,
    load1: Desc,
    load5: Desc,
    load15: Desc,
    qga_system_time: Desc,
    qga_user_time: Desc,
    qga_steal_time: Desc,
}

impl CpuCollector {
    pub fn new() -> Self {
        let uuid: &'static [&'static str] = &["uuid"];
        Self {
            cores: Desc::new(SUBSYSTEM, "cores", "Number of virtual CPUs.", uuid),
            cpu_time: Desc::new(SUBSYSTEM, "cpu_time", "Total CPU time used, in nanoseconds.", uuid),
            system_time: Desc::new(
                SUBSYSTEM,
                "system_time",
                "CPU time used in system mode, in nanoseconds.",
                uuid,
            ),
            user_time: Desc::new(
                SUBSYSTEM,
                "user_time",
                "CPU time used in user mode, in nanoseconds.",
                uuid,
            ),
            load1: Desc::new(SUBSYSTEM, "load1", "Guest 1m load average.", uuid),
            load5: Desc::new(SUBSYSTEM, "load5", "Guest 5m load average.", uuid),
            load15: Desc::new(SUBSYSTEM, "load15", "Guest 15m load average.", uuid),
            qga_system_time: Desc::new(
                SUBSYSTEM,
                "qga_system_time",
                "Guest-reported system CPU seconds.",
                uuid,
            ),
            qga_user_time: Desc::new(
                SUBSYSTEM,
                "qga_user_time",
                "Guest-reported user CPU seconds.",
                uuid,
            ),
            qga_steal_time: Desc::new(
                SUBSYSTEM,
                "qga_steal_time",
                "Guest-reported steal CPU seconds.",
                uuid,
            ),
        }
    }
}

impl Default for CpuCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for CpuCollector {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn update(
        &self,
        stats: &DomainStats,
        machine: &MachineId,
        agent: &GuestAgent,
        capabilities: &Capabilities,
        out: &mut Vec<Sample>,
    ) -> Result<()> {
        let uuid = machine.as_ref();
        out.push(Sample::new(&self.system_time, stats.cpu.system as f64, &[uuid]));
        out.push(Sample::new(&self.cpu_time, stats.cpu.time as f64, &[uuid]));
        out.push(Sample::new(&self.user_time, stats.cpu.user as f64, &[uuid]));
        out.push(Sample::new(&self.cores, f64::from(stats.vcpus), &[uuid]));

        if !capabilities.guest_file_read {
            return Ok(());
        }

        let stat = Stat::parse(&agent.read_file("/proc/stat")?)?;
        out.push(Sample::new(&self.qga_system_time, stat.total.system, &[uuid]));
        out.push(Sample::new(&self.qga_steal_time, stat.total.steal, &[uuid]));
        out.push(Sample::new(&self.qga_user_time, stat.total.user, &[uuid]));

        let load = LoadAvg::parse(&agent.read_file("/proc/loadavg")?)?;
        out.push(Sample::new(&self.load1, load.one, &[uuid]));
        out.push(Sample::new(&self.load5, load.five, &[uuid]));
        out.push(Sample::new(&self.load15, load.fifteen, &[uuid]));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;

    use crate::agent::testing::ScriptedChannel;
    use crate::agent::{AgentChannel, Capabilities, GuestAgent, TransportError};
    use crate::hypervisor::{CpuCounters, DomainStats};
    use crate::machine::MachineId;
    use crate::sample::Sample;

    use super::*;

    fn machine() -> MachineId {
        MachineId::new("11111111-2222-3333-4444-555555555555").unwrap()
    }

    fn stats() -> DomainStats {
        DomainStats {
            vcpus: 4,
            cpu: CpuCounters {
                time: 900,
                user: 600,
                system: 300,
            },
            ..DomainStats::default()
        }
    }

    fn value_of<'a>(samples: &'a [Sample], name: &str) -> Option<&'a Sample> {
        samples.iter().find(|s| s.name() == name)
    }

    fn file_reply(content: &[u8]) -> Vec<std::result::Result<String, TransportError>> {
        vec![
            ScriptedChannel::reply(serde_json::json!(1)),
            ScriptedChannel::reply(serde_json::json!({
                "count": content.len(),
                "buf-b64": BASE64.encode(content),
                "eof": true,
            })),
            ScriptedChannel::reply(serde_json::json!({})),
        ]
    }

    #[test]
    fn test_hypervisor_samples_without_capability() {
        let channel = ScriptedChannel::new([]);
        let agent = GuestAgent::new(Arc::clone(&channel) as Arc<dyn AgentChannel>, Duration::from_secs(3));

        let mut out = Vec::new();
        CpuCollector::new()
            .update(&stats(), &machine(), &agent, &Capabilities::NONE, &mut out)
            .unwrap();

        assert_eq!(out.len(), 4);
        assert_eq!(value_of(&out, "libvirt_cpu_cores").unwrap().value(), 4.0);
        assert_eq!(value_of(&out, "libvirt_cpu_cpu_time").unwrap().value(), 900.0);
        assert!(value_of(&out, "libvirt_cpu_load1").is_none());
        assert_eq!(channel.executed("guest-file-open"), 0);
    }

    #[test]
    fn test_guest_samples_with_file_read_capability() {
        let mut replies = file_reply(b"cpu  100 0 300 400 0 0 0 800 0 0\n");
        replies.extend(file_reply(b"0.50 0.25 0.10 1/100 42\n"));
        let channel = ScriptedChannel::new(replies);
        let agent = GuestAgent::new(channel as Arc<dyn AgentChannel>, Duration::from_secs(3));
        let caps = Capabilities {
            guest_file_read: true,
            guest_exec: false,
        };

        let mut out = Vec::new();
        CpuCollector::new()
            .update(&stats(), &machine(), &agent, &caps, &mut out)
            .unwrap();

        assert_eq!(value_of(&out, "libvirt_cpu_qga_user_time").unwrap().value(), 1.0);
        assert_eq!(value_of(&out, "libvirt_cpu_qga_system_time").unwrap().value(), 3.0);
        assert_eq!(value_of(&out, "libvirt_cpu_qga_steal_time").unwrap().value(), 8.0);
        assert_eq!(value_of(&out, "libvirt_cpu_load1").unwrap().value(), 0.5);
        assert_eq!(value_of(&out, "libvirt_cpu_load15").unwrap().value(), 0.1);

        let sample = value_of(&out, "libvirt_cpu_cores").unwrap();
        assert_eq!(sample.label_values(), &[machine().to_string()]);
    }

    #[test]
    fn test_unparsable_guest_stat_is_an_error() {
        let channel = ScriptedChannel::new(file_reply(b"cpu garbage\n"));
        let agent = GuestAgent::new(channel as Arc<dyn AgentChannel>, Duration::from_secs(3));
        let caps = Capabilities {
            guest_file_read: true,
            guest_exec: false,
        };

        let mut out = Vec::new();
        let err = CpuCollector::new()
            .update(&stats(), &machine(), &agent, &caps, &mut out)
            .unwrap_err();
        assert!(matches!(err, super::super::Error::Parse(_)));
    }
}
