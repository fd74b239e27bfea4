//! The outward-facing telemetry unit: a metric descriptor plus one
//! `(name, label set, value)` sample.
//!
//! Collectors build their [`Desc`]s once at construction and stamp out
//! [`Sample`]s against them on every scrape. Samples are immutable once
//! produced and carry everything the exposition layer needs; ordering across
//! collectors or machines is deliberately unspecified.

/// Metric namespace prefixed to every fully qualified metric name.
pub const NAMESPACE: &str = "libvirt";

/// A metric descriptor: fully qualified name, help text and label names.
///
/// Mirrors the shape of a Prometheus metric family; one `Desc` maps to one
/// family in the exposition output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desc {
    name: String,
    help: &'static str,
    label_names: &'static [&'static str],
}

impl Desc {
    /// Builds a descriptor with the fully qualified name
    /// `<namespace>_<subsystem>_<name>`.
    pub fn new(subsystem: &str, name: &str, help: &'static str, label_names: &'static [&'static str]) -> Self {
        Self {
            name: format!("{NAMESPACE}_{subsystem}_{name}"),
            help,
            label_names,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &'static str {
        self.help
    }

    pub fn label_names(&self) -> &'static [&'static str] {
        self.label_names
    }
}

/// One immutable telemetry data point.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    name: String,
    help: &'static str,
    label_names: &'static [&'static str],
    label_values: Vec<String>,
    value: f64,
}

impl Sample {
    /// Creates a sample for the given descriptor.
    ///
    /// The number of `label_values` must match the descriptor's label names;
    /// a mismatch is a programming error in the calling collector.
    pub fn new(desc: &Desc, value: f64, label_values: &[&str]) -> Self {
        debug_assert_eq!(desc.label_names.len(), label_values.len());
        Self {
            name: desc.name.clone(),
            help: desc.help,
            label_names: desc.label_names,
            label_values: label_values.iter().map(|v| (*v).to_owned()).collect(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &'static str {
        self.help
    }

    pub fn label_names(&self) -> &'static [&'static str] {
        self.label_names
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}
