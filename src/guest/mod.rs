//! Pure parsers for text fetched out of a guest through the agent: CPU
//! accounting from `/proc/stat`, load averages from `/proc/loadavg`, and
//! filesystem usage from captured `df` output.
//!
//! No I/O happens here; the agent protocols in [`crate::agent`] deliver raw
//! bytes and the collectors feed them through these functions. Parse failures
//! carry the offending line so that a failing guest can be diagnosed without
//! reproducing the scrape.

mod error;
mod filesystem;
mod loadavg;
mod stat;

pub use error::ParseError;
pub use filesystem::{FilesystemStats, parse as parse_filesystems};
pub use loadavg::LoadAvg;
pub use stat::{CpuTimes, Stat};
