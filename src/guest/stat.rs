//! Parser for `/proc/stat`-style CPU accounting as read out of a guest.
//!
//! Only the `cpu*` lines are consumed: the bare `cpu` token is the aggregate
//! across all cores, `cpuN` lines carry a numeric core index. Each line holds
//! up to ten tick counters (user, nice, system, idle, iowait, irq, softirq,
//! steal, guest, guest-nice) which are converted from USER_HZ ticks into
//! seconds. Missing trailing counters (older kernels) default to zero.

use super::error::{ParseError, Result};

/// Kernel ticks per second; divides raw `/proc/stat` counters into seconds.
const USER_HZ: f64 = 100.0;

/// CPU time accounting for one core (or the aggregate), in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CpuTimes {
    pub user: f64,
    pub nice: f64,
    pub system: f64,
    pub idle: f64,
    pub iowait: f64,
    pub irq: f64,
    pub softirq: f64,
    pub steal: f64,
    pub guest: f64,
    pub guest_nice: f64,
}

impl CpuTimes {
    fn parse_fields<'a>(fields: impl Iterator<Item = &'a str>, line: &str) -> Result<Self> {
        let mut counters = [0.0f64; 10];
        let mut seen = 0;
        for (slot, field) in counters.iter_mut().zip(fields) {
            *slot = field
                .parse::<f64>()
                .map_err(|source| ParseError::InvalidCpuCounter {
                    line: line.to_owned(),
                    source,
                })?
                / USER_HZ;
            seen += 1;
        }
        if seen == 0 {
            return Err(ParseError::EmptyCpuLine {
                line: line.to_owned(),
            });
        }

        let [user, nice, system, idle, iowait, irq, softirq, steal, guest, guest_nice] = counters;
        Ok(Self {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
            guest,
            guest_nice,
        })
    }
}

/// Parsed CPU accounting from a `/proc/stat` snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stat {
    /// Summed statistics across all cores (the bare `cpu` line).
    pub total: CpuTimes,
    /// Per-core statistics, indexed by core id. Gaps are zero-filled.
    pub per_cpu: Vec<CpuTimes>,
}

impl Stat {
    /// Parses the raw bytes of a `/proc/stat` file.
    ///
    /// Lines not starting with a `cpu` token (interrupt counts, context
    /// switches, boot time, ...) are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the data is not UTF-8, a cpu line carries
    /// no counters, or a counter or core index fails to parse.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data).map_err(|source| ParseError::NotUtf8 { source })?;
        let mut stat = Stat::default();

        for line in text.lines() {
            let mut fields = line.split_whitespace();
            let Some(token) = fields.next() else {
                continue;
            };
            if !token.starts_with("cpu") {
                continue;
            }

            let times = CpuTimes::parse_fields(fields, line)?;
            if token == "cpu" {
                stat.total = times;
                continue;
            }

            let index: usize =
                token[3..]
                    .parse()
                    .map_err(|source| ParseError::InvalidCpuIndex {
                        line: line.to_owned(),
                        source,
                    })?;
            if stat.per_cpu.len() <= index {
                stat.per_cpu.resize(index + 1, CpuTimes::default());
            }
            stat.per_cpu[index] = times;
        }

        Ok(stat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aggregate_line() {
        let data = b"cpu  100 200 300 400 500 600 700 800 900 1000\n";
        let stat = Stat::parse(data).unwrap();
        assert_eq!(stat.total.user, 1.0);
        assert_eq!(stat.total.nice, 2.0);
        assert_eq!(stat.total.system, 3.0);
        assert_eq!(stat.total.idle, 4.0);
        assert_eq!(stat.total.iowait, 5.0);
        assert_eq!(stat.total.irq, 6.0);
        assert_eq!(stat.total.softirq, 7.0);
        assert_eq!(stat.total.steal, 8.0);
        assert_eq!(stat.total.guest, 9.0);
        assert_eq!(stat.total.guest_nice, 10.0);
        assert!(stat.per_cpu.is_empty());
    }

    #[test]
    fn test_parse_per_core_lines() {
        let data = b"\
cpu  30 0 20 50 0 0 0 0 0 0
cpu0 10 0 10 25 0 0 0 0 0 0
cpu1 20 0 10 25 0 0 0 0 0 0
intr 12345 0 1
ctxt 999
";
        let stat = Stat::parse(data).unwrap();
        assert_eq!(stat.per_cpu.len(), 2);
        assert_eq!(stat.per_cpu[0].user, 0.1);
        assert_eq!(stat.per_cpu[1].user, 0.2);
        assert_eq!(stat.total.idle, 0.5);
    }

    #[test]
    fn test_missing_trailing_counters_default_to_zero() {
        // Older kernels report fewer than ten fields.
        let data = b"cpu 100 0 50 25\n";
        let stat = Stat::parse(data).unwrap();
        assert_eq!(stat.total.user, 1.0);
        assert_eq!(stat.total.idle, 0.25);
        assert_eq!(stat.total.steal, 0.0);
        assert_eq!(stat.total.guest_nice, 0.0);
    }

    #[test]
    fn test_invalid_counter_errors() {
        let data = b"cpu abc 0 0 0\n";
        let err = Stat::parse(data).unwrap_err();
        assert!(matches!(err, ParseError::InvalidCpuCounter { .. }));
    }

    #[test]
    fn test_bare_cpu_line_without_counters_errors() {
        let data = b"cpu\n";
        let err = Stat::parse(data).unwrap_err();
        assert!(matches!(err, ParseError::EmptyCpuLine { .. }));
    }

    #[test]
    fn test_invalid_core_index_errors() {
        let data = b"cpux 1 2 3\n";
        let err = Stat::parse(data).unwrap_err();
        assert!(matches!(err, ParseError::InvalidCpuIndex { .. }));
    }
}
