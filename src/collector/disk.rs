//! Disk collector: per-block-device I/O counters from the hypervisor, plus
//! filesystem usage gathered by running `df` inside the guest.

use crate::agent::{Capabilities, GuestAgent};
use crate::guest;
use crate::hypervisor::DomainStats;
use crate::machine::MachineId;
use crate::sample::{Desc, Sample};

use super::{Collector, Result};

const SUBSYSTEM: &str = "disk";

const DEVICE_LABELS: &[&str] = &["uuid", "target_device"];
const FILESYSTEM_LABELS: &[&str] = &["uuid", "target_device", "fstype", "mountpoint"];

const DF_PATH: &str = "/usr/bin/df";
const DF_OUTPUT_COLUMNS: &str = "--output=source,fstype,target,itotal,iavail,size,avail";

pub struct DiskCollector {
    read_requests: Desc,
    write_requests: Desc,
    read_bytes: Desc,
    write_bytes: Desc,
    size_bytes: Desc,
    avail_bytes: Desc,
    inodes: Desc,
    avail_inodes: Desc,
}

impl DiskCollector {
    pub fn new() -> Self {
        Self {
            read_requests: Desc::new(SUBSYSTEM, "read_requests", "Read requests issued.", DEVICE_LABELS),
            write_requests: Desc::new(SUBSYSTEM, "write_requests", "Write requests issued.", DEVICE_LABELS),
            read_bytes: Desc::new(SUBSYSTEM, "read_bytes", "Bytes read.", DEVICE_LABELS),
            write_bytes: Desc::new(SUBSYSTEM, "write_bytes", "Bytes written.", DEVICE_LABELS),
            size_bytes: Desc::new(SUBSYSTEM, "size_bytes", "Filesystem size in bytes.", FILESYSTEM_LABELS),
            avail_bytes: Desc::new(SUBSYSTEM, "avail_bytes", "Filesystem bytes available.", FILESYSTEM_LABELS),
            inodes: Desc::new(SUBSYSTEM, "inodes", "Filesystem inode count.", FILESYSTEM_LABELS),
            avail_inodes: Desc::new(SUBSYSTEM, "avail_inodes", "Filesystem inodes available.", FILESYSTEM_LABELS),
        }
    }
}

impl Default for DiskCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for DiskCollector {
    fn name(&self) -> &'static str {
        "disk"
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
        for block in &stats.blocks {
            let labels = &[uuid, block.name.as_str()];
            out.push(Sample::new(&self.read_requests, block.rd_reqs as f64, labels));
            out.push(Sample::new(&self.write_requests, block.wr_reqs as f64, labels));
            out.push(Sample::new(&self.read_bytes, block.rd_bytes as f64, labels));
            out.push(Sample::new(&self.write_bytes, block.wr_bytes as f64, labels));
        }

        if !capabilities.guest_exec {
            return Ok(());
        }

        let output = agent.exec(DF_PATH, &[DF_OUTPUT_COLUMNS], true)?;
        for fs in guest::parse_filesystems(&output)? {
            let labels = &[uuid, fs.device.as_str(), fs.fs_type.as_str(), fs.mount_point.as_str()];
            out.push(Sample::new(&self.size_bytes, fs.size_bytes, labels));
            out.push(Sample::new(&self.avail_bytes, fs.avail_bytes, labels));
            out.push(Sample::new(&self.inodes, fs.inodes, labels));
            out.push(Sample::new(&self.avail_inodes, fs.inodes_avail, labels));
        }

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
    use crate::agent::{AgentChannel, Capabilities, GuestAgent};
    use crate::hypervisor::{BlockCounters, DomainStats};
    use crate::machine::MachineId;
    use crate::sample::Sample;

    use super::*;

    fn stats() -> DomainStats {
        DomainStats {
            blocks: vec![BlockCounters {
                name: "vda".to_owned(),
                rd_reqs: 5,
                wr_reqs: 6,
                rd_bytes: 7,
                wr_bytes: 8,
            }],
            ..DomainStats::default()
        }
    }

    fn find<'a>(samples: &'a [Sample], name: &str) -> &'a Sample {
        samples
            .iter()
            .find(|s| s.name() == name)
            .unwrap_or_else(|| panic!("missing sample {name}"))
    }

    #[test]
    fn test_block_counters_without_exec_capability() {
        let channel = ScriptedChannel::new([]);
        let agent = GuestAgent::new(Arc::clone(&channel) as Arc<dyn AgentChannel>, Duration::from_secs(3));

        let mut out = Vec::new();
        DiskCollector::new()
            .update(
                &stats(),
                &MachineId::new("m1").unwrap(),
                &agent,
                &Capabilities::NONE,
                &mut out,
            )
            .unwrap();

        assert_eq!(out.len(), 4);
        assert_eq!(find(&out, "libvirt_disk_read_requests").value(), 5.0);
        assert_eq!(find(&out, "libvirt_disk_write_bytes").value(), 8.0);
        assert_eq!(channel.executed("guest-exec"), 0);
    }

    #[test]
    fn test_filesystem_samples_with_exec_capability() {
        let df = b"/dev/vda1 ext4 / 100 50 2048 1024\n";
        let channel = ScriptedChannel::new([
            ScriptedChannel::reply(serde_json::json!({ "pid": 77 })),
            ScriptedChannel::reply(serde_json::json!({
                "exited": true,
                "exitcode": 0,
                "out-data": BASE64.encode(df),
            })),
        ]);
        let agent = GuestAgent::new(Arc::clone(&channel) as Arc<dyn AgentChannel>, Duration::from_secs(3));
        let caps = Capabilities {
            guest_file_read: false,
            guest_exec: true,
        };

        let mut out = Vec::new();
        DiskCollector::new()
            .update(&stats(), &MachineId::new("m1").unwrap(), &agent, &caps, &mut out)
            .unwrap();

        let size = find(&out, "libvirt_disk_size_bytes");
        assert_eq!(size.value(), 2048.0 * 1024.0);
        assert_eq!(
            size.label_values(),
            &["m1".to_owned(), "/dev/vda1".to_owned(), "ext4".to_owned(), "/".to_owned()]
        );
        assert_eq!(find(&out, "libvirt_disk_avail_inodes").value(), 50.0 * 1024.0);

        let commands = channel.commands();
        let exec = commands.iter().find(|c| c["execute"] == "guest-exec").unwrap();
        assert_eq!(exec["arguments"]["path"], "/usr/bin/df");
    }

    #[test]
    fn test_failed_exec_is_contained_as_collector_error() {
        let channel = ScriptedChannel::new([
            ScriptedChannel::reply(serde_json::json!({ "pid": 77 })),
            ScriptedChannel::reply(serde_json::json!({
                "exited": true,
                "exitcode": 1,
                "err-data": BASE64.encode(b"df: permission denied"),
            })),
        ]);
        let agent = GuestAgent::new(channel as Arc<dyn AgentChannel>, Duration::from_secs(3));
        let caps = Capabilities {
            guest_file_read: false,
            guest_exec: true,
        };

        let mut out = Vec::new();
        let err = DiskCollector::new()
            .update(&stats(), &MachineId::new("m1").unwrap(), &agent, &caps, &mut out)
            .unwrap_err();
        assert!(matches!(err, super::super::Error::Agent(_)));
        // Hypervisor-sourced samples were already appended before the failure.
        assert_eq!(out.len(), 4);
    }
}
