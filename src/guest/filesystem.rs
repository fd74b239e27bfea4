//! Parser for header-less `df` output as produced by
//! `df --output=source,fstype,target,itotal,iavail,size,avail`.
//!
//! Lines whose first field does not start with `/dev/` are skipped; this is
//! how bind mounts and pseudo-filesystems (tmpfs, overlay, ...) are filtered
//! out. The four numeric fields are reported by `df` in 1024-byte blocks and
//! scaled to bytes here.

use super::error::{ParseError, Result};

/// Only real block devices are reported.
const DEVICE_PREFIX: &str = "/dev/";

/// The minimum field count of a reportable `df` line.
const MIN_FIELDS: usize = 7;

/// Usage of one mounted filesystem inside the guest.
#[derive(Debug, Clone, PartialEq)]
pub struct FilesystemStats {
    pub device: String,
    pub fs_type: String,
    pub mount_point: String,
    pub inodes: f64,
    pub inodes_avail: f64,
    pub size_bytes: f64,
    pub avail_bytes: f64,
}

/// Parses captured `df` output into per-device usage records.
///
/// # Errors
///
/// Returns a [`ParseError`] if the data is not UTF-8, or a device line has
/// fewer than seven fields or non-numeric trailing fields. The error names
/// the offending line.
pub fn parse(data: &[u8]) -> Result<Vec<FilesystemStats>> {
    let text = std::str::from_utf8(data).map_err(|source| ParseError::NotUtf8 { source })?;
    let mut out = Vec::new();

    for line in text.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.first() {
            Some(device) if device.starts_with(DEVICE_PREFIX) => device,
            _ => continue,
        };
        if fields.len() < MIN_FIELDS {
            return Err(ParseError::MalformedMountLine {
                line: line.to_owned(),
            });
        }

        let mut blocks = [0.0f64; 4];
        for (slot, field) in blocks.iter_mut().zip(&fields[3..MIN_FIELDS]) {
            let value: i64 = field
                .parse()
                .map_err(|source| ParseError::InvalidMountValue {
                    line: line.to_owned(),
                    source,
                })?;
            *slot = (value * 1024) as f64;
        }

        let [inodes, inodes_avail, size_bytes, avail_bytes] = blocks;
        out.push(FilesystemStats {
            device: fields[0].to_owned(),
            fs_type: fields[1].to_owned(),
            mount_point: fields[2].to_owned(),
            inodes,
            inodes_avail,
            size_bytes,
            avail_bytes,
        });
    }

    Ok(out)
}
