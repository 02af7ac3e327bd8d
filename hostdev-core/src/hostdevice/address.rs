//! PCI address codec.

use crate::error::{HostDevError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Canonical `domain:bus:slot.function` form: 0000:01:00.0
static PCI_ADDRESS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9a-fA-F]{4}):([0-9a-fA-F]{2}):([0-9a-fA-F]{2})\.([0-7])$")
        .expect("Invalid PCI address regex")
});

/// Structured PCI address. Each field is a `0x`-prefixed hex string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PciAddress {
    domain: String,
    bus: String,
    slot: String,
    function: String,
}

impl PciAddress {
    /// Parse a `dddd:bb:ss.f` string.
    pub fn parse(address: &str) -> Result<Self> {
        let caps = PCI_ADDRESS_REGEX
            .captures(address)
            .ok_or_else(|| HostDevError::InvalidPciAddress { address: address.to_string() })?;

        Ok(Self {
            domain: format!("0x{}", &caps[1]),
            bus: format!("0x{}", &caps[2]),
            slot: format!("0x{}", &caps[3]),
            function: format!("0x{}", &caps[4]),
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn bus(&self) -> &str {
        &self.bus
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn function(&self) -> &str {
        &self.function
    }
}

impl FromStr for PciAddress {
    type Err = HostDevError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for PciAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}.{}",
            self.domain.trim_start_matches("0x"),
            self.bus.trim_start_matches("0x"),
            self.slot.trim_start_matches("0x"),
            self.function.trim_start_matches("0x")
        )
    }
}

/// Validate PCI address format.
pub fn is_valid_pci_address(address: &str) -> bool {
    PCI_ADDRESS_REGEX.is_match(address)
}
