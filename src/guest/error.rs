use std::num::{ParseFloatError, ParseIntError};
use std::str::Utf8Error;

use thiserror::Error;

/// Errors produced while parsing guest-sourced text.
///
/// Every variant that rejects input carries the offending line so a failed
/// scrape can be diagnosed from the logs alone.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("guest data is not valid UTF-8: {source}")]
    NotUtf8 {
        #[source]
        source: Utf8Error,
    },

    #[error("couldn't parse cpu line {line:?}: no counter fields")]
    EmptyCpuLine { line: String },

    #[error("couldn't parse cpu counter in line {line:?}: {source}")]
    InvalidCpuCounter {
        line: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("couldn't parse cpu index in line {line:?}: {source}")]
    InvalidCpuIndex {
        line: String,
        #[source]
        source: ParseIntError,
    },

    #[error("unexpected loadavg content {line:?}: fewer than three fields")]
    TruncatedLoadAvg { line: String },

    #[error("couldn't parse load average {value:?}: {source}")]
    InvalidLoadAvg {
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("malformed mount point information: {line:?}")]
    MalformedMountLine { line: String },

    #[error("couldn't parse mount point information {line:?}: {source}")]
    InvalidMountValue {
        line: String,
        #[source]
        source: ParseIntError,
    },
}

pub type Result<T> = std::result::Result<T, ParseError>;
