use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The maximum allowed length for a [`MachineId`].
///
/// Hypervisors report domain UUIDs in the canonical hyphenated form
/// (36 characters); the bound leaves room for vendor-prefixed forms.
const MACHINE_ID_MAX_LEN: usize = 64;

/// A validated virtual machine identifier (the domain UUID string).
///
/// Cloning is cheap; the id is shared between the scrape orchestrator and the
/// per-collector workers of one scrape pass.
///
/// # Examples
///
/// ```
/// # use virtstat::machine::MachineId;
/// let id = MachineId::new("7a1f9d2c-4b6e-4f0a-9c3d-2e8b5a6f1c70").unwrap();
/// assert_eq!(id.as_ref(), "7a1f9d2c-4b6e-4f0a-9c3d-2e8b5a6f1c70");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MachineId(Arc<str>);

impl MachineId {
    /// Creates a new `MachineId` from the given raw UUID string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMachineId`] if the input is empty or exceeds
    /// [`MACHINE_ID_MAX_LEN`].
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.is_empty() || src.len() > MACHINE_ID_MAX_LEN {
            return Err(Error::InvalidMachineId(src.to_owned()));
        }

        Ok(Self(src.into()))
    }

    pub fn to_arc(&self) -> Arc<str> {
        Arc::clone(&self.0)
    }
}

impl AsRef<str> for MachineId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MachineId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for MachineId {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        MachineId::new(s)
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid machine id: {0:?}")]
    InvalidMachineId(String),
}

pub type Result<T> = std::result::Result<T, Error>;
