//! Parser for `/proc/loadavg`-style content: the first three whitespace
//! separated fields are the 1, 5 and 15 minute load averages.

use super::error::{ParseError, Result};

/// Load averages reported by the guest kernel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoadAvg {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

impl LoadAvg {
    /// Parses the raw bytes of a `/proc/loadavg` file.
    ///
    /// Trailing fields (runnable counts, last pid) are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the data is not UTF-8, holds fewer than
    /// three fields, or a field is not a float.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data).map_err(|source| ParseError::NotUtf8 { source })?;
        let mut fields = text.split_whitespace();

        let mut next = || -> Result<f64> {
            let value = fields
                .next()
                .ok_or_else(|| ParseError::TruncatedLoadAvg {
                    line: text.trim_end().to_owned(),
                })?;
            value
                .parse()
                .map_err(|source| ParseError::InvalidLoadAvg {
                    value: value.to_owned(),
                    source,
                })
        };

        Ok(Self {
            one: next()?,
            five: next()?,
            fifteen: next()?,
        })
    }
}
