//! Address pools.
//!
//! A pool hands out host identities (PCI addresses or mdev UUIDs) one at a
//! time. Pools live for a single build and are rebuilt from an
//! [`EnvSnapshot`] each time a device list is produced.

use crate::error::{HostDevError, Result};
use crate::hostdevice::env::{split_address_list, EnvSnapshot};
use crate::observability::metrics;
use std::collections::VecDeque;
use tracing::debug;

/// Source of host device identities, keyed by the name of the requesting device.
///
/// The key is the interface or claim name for keyed pools; the legacy pool
/// ignores it.
pub trait AddressPool {
    /// Remove and return the next identity available for `key`.
    fn pop(&mut self, key: &str) -> Result<String>;
}

/// Addresses published by an out-of-tree device plugin under a variable-name prefix.
///
/// Every variable whose name starts with the prefix contributes its
/// comma-separated value; values are concatenated in snapshot order and
/// allocated first-in first-out.
#[derive(Debug, Clone, Default)]
pub struct LegacyAddressPool {
    addresses: VecDeque<String>,
}

impl LegacyAddressPool {
    /// Collect addresses from every variable named `prefix*`.
    pub fn from_env(env: &EnvSnapshot, prefix: &str) -> Self {
        let addresses: VecDeque<String> =
            env.with_prefix(prefix).flat_map(|(_, value)| split_address_list(value)).collect();

        debug!(prefix = %prefix, addresses = ?addresses, "Discovered passthrough addresses");

        Self { addresses }
    }

    /// Pool over an explicit address list.
    pub fn from_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { addresses: addresses.into_iter().map(Into::into).collect() }
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Remove and return the first address.
    pub fn pop(&mut self) -> Result<String> {
        match self.addresses.pop_front() {
            Some(address) => {
                metrics::record_allocation("legacy");
                Ok(address)
            }
            None => {
                metrics::record_pool_exhausted("legacy");
                Err(HostDevError::PoolExhausted)
            }
        }
    }
}

impl AddressPool for LegacyAddressPool {
    fn pop(&mut self, _key: &str) -> Result<String> {
        LegacyAddressPool::pop(self)
    }
}
