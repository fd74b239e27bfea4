//! The scrape orchestrator: concurrent fan-out over machines and collectors.
//!
//! One scrape pass enumerates all domains in a single batch, then spawns one
//! worker thread per machine. Each worker negotiates the guest agent
//! capabilities once and fans out again, one thread per collector, so a slow
//! guest agent on one machine never delays another machine's samples. Results
//! travel back over channels; there is no shared mutable scrape state.
//!
//! Every machine is additionally reported through two meta-samples,
//! `libvirt_scrape_collector_duration_seconds` and
//! `libvirt_scrape_collector_success`. Success is 1.0 only if every collector
//! returned `Ok` within the machine deadline; a stuck collector flips it to
//! 0.0 without stalling the pass, its thread left to finish against a
//! disconnected channel.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::agent::GuestAgent;
use crate::collector::Collector;
use crate::config::ScrapeConfig;
use crate::hypervisor::{Domain, Hypervisor, HypervisorError};
use crate::machine::MachineId;
use crate::sample::{Desc, Sample};

/// Slack on top of the machine deadline for workers to deliver the failure
/// report they produce when their own deadline fires.
const REPORT_GRACE: Duration = Duration::from_millis(250);

pub struct Scraper {
    hypervisor: Arc<dyn Hypervisor>,
    collectors: Vec<Arc<dyn Collector>>,
    config: ScrapeConfig,
    duration: Desc,
    success: Desc,
}

struct MachineReport {
    machine: MachineId,
    samples: Vec<Sample>,
    success: bool,
    duration: Duration,
}

impl Scraper {
    pub fn new(
        hypervisor: Arc<dyn Hypervisor>,
        collectors: Vec<Arc<dyn Collector>>,
        config: ScrapeConfig,
    ) -> Self {
        let domain: &'static [&'static str] = &["domain"];
        Self {
            hypervisor,
            collectors,
            config,
            duration: Desc::new(
                "scrape",
                "collector_duration_seconds",
                "Wall-clock duration of one machine's collection.",
                domain,
            ),
            success: Desc::new(
                "scrape",
                "collector_success",
                "1 if every collector for the machine succeeded in time.",
                domain,
            ),
        }
    }

    /// Runs one scrape pass over all active machines.
    ///
    /// # Errors
    ///
    /// [`HypervisorError::Connection`] is fatal to the invocation. An
    /// enumeration failure degrades to zero machines and an empty sample set.
    pub fn scrape(&self) -> Result<Vec<Sample>, HypervisorError> {
        let domains = match self.hypervisor.domains() {
            Ok(domains) => domains,
            Err(err @ HypervisorError::Connection { .. }) => return Err(err),
            Err(err @ HypervisorError::Enumeration { .. }) => {
                log::warn!(target: "scrape", "domain enumeration failed: {err}");
                Vec::new()
            }
        };

        let started = Instant::now();
        let deadline = started + self.config.machine_deadline;
        let mut pending: HashSet<MachineId> = domains.iter().map(|d| d.id.clone()).collect();

        let (tx, rx) = mpsc::channel();
        for domain in domains {
            let tx = tx.clone();
            let collectors = self.collectors.clone();
            let config = self.config;
            thread::spawn(move || {
                let _ = tx.send(scrape_machine(domain, &collectors, config));
            });
        }
        drop(tx);

        let mut samples = Vec::new();
        while !pending.is_empty() {
            let remaining = (deadline + REPORT_GRACE).saturating_duration_since(Instant::now());
            let Ok(report) = rx.recv_timeout(remaining) else {
                break;
            };
            pending.remove(&report.machine);
            self.append_report(report, &mut samples);
        }

        // Machines whose worker never reported (e.g. capability negotiation
        // wedged on the transport) still get their meta-samples.
        for machine in pending {
            log::warn!(
                target: "scrape",
                "machine {machine} missed the scrape deadline without reporting"
            );
            self.append_report(
                MachineReport {
                    machine,
                    samples: Vec::new(),
                    success: false,
                    duration: started.elapsed(),
                },
                &mut samples,
            );
        }

        Ok(samples)
    }

    fn append_report(&self, report: MachineReport, samples: &mut Vec<Sample>) {
        samples.extend(report.samples);
        let uuid = report.machine.as_ref();
        samples.push(Sample::new(&self.duration, report.duration.as_secs_f64(), &[uuid]));
        samples.push(Sample::new(
            &self.success,
            if report.success { 1.0 } else { 0.0 },
            &[uuid],
        ));
    }
}

/// Collects one machine: negotiates capabilities, runs every collector on its
/// own thread, and drains their results against the machine deadline.
fn scrape_machine(
    domain: Domain,
    collectors: &[Arc<dyn Collector>],
    config: ScrapeConfig,
) -> MachineReport {
    let started = Instant::now();
    let deadline = started + config.machine_deadline;

    let machine = domain.id;
    let agent = Arc::new(GuestAgent::new(domain.agent, config.agent_timeout));
    let capabilities = agent.capabilities();
    let stats = Arc::new(domain.stats);

    let (tx, rx) = mpsc::channel();
    for collector in collectors {
        let tx = tx.clone();
        let collector = Arc::clone(collector);
        let agent = Arc::clone(&agent);
        let stats = Arc::clone(&stats);
        let machine = machine.clone();
        thread::spawn(move || {
            let mut samples = Vec::new();
            let result = collector.update(&stats, &machine, &agent, &capabilities, &mut samples);
            let _ = tx.send((collector.name(), result, samples));
        });
    }
    drop(tx);

    let mut success = true;
    let mut samples = Vec::new();
    for _ in 0..collectors.len() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((_, Ok(()), collected)) => samples.extend(collected),
            Ok((name, Err(err), _)) => {
                log::warn!(target: "scrape", "collector {name} failed for machine {machine}: {err}");
                success = false;
            }
            Err(_) => {
                log::warn!(
                    target: "scrape",
                    "machine {machine} hit the collection deadline with collectors outstanding"
                );
                success = false;
                break;
            }
        }
    }

    MachineReport {
        machine,
        samples,
        success,
        duration: started.elapsed(),
    }
}
