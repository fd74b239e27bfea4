//! virtstat: per-virtual-machine telemetry for libvirt-style hypervisors.
//!
//! The crate scrapes every active domain of a hypervisor in one concurrent
//! pass, merging the hypervisor's own counter snapshots (CPU time, balloon,
//! block and interface counters) with OS-level metrics read from inside the
//! guest through its agent (`/proc/stat`, `/proc/loadavg`, `df`). Samples are
//! exposed over HTTP in Prometheus text format.
//!
//! The hypervisor connection is not part of this crate: a backend implements
//! [`hypervisor::Hypervisor`] and [`agent::AgentChannel`] (e.g. on top of
//! libvirt FFI bindings) and hands the trait object to [`run`].

pub mod agent;
pub mod collector;
pub mod config;
pub mod expose;
pub mod guest;
pub mod hypervisor;
pub mod machine;
pub mod sample;
pub mod scrape;

use std::sync::Arc;

use config::ScrapeConfig;
use hypervisor::Hypervisor;
use scrape::Scraper;

/// Runs the exporter against the given hypervisor until the process exits.
///
/// Builds the standard collector set, reads the scrape tunables from the
/// environment, and serves `GET /metrics` (one scrape pass per request) and
/// a small index page on `addr`.
pub async fn run(hypervisor: Arc<dyn Hypervisor>, addr: impl tokio::net::ToSocketAddrs) {
    let config = ScrapeConfig::from_env();
    log::debug!(
        "agent timeout: {:?}, machine deadline: {:?}",
        config.agent_timeout,
        config.machine_deadline
    );
    let scraper = Arc::new(Scraper::new(hypervisor, collector::default_set(), config));
    expose::MetricsServer::new(scraper).listen(addr).await
}
