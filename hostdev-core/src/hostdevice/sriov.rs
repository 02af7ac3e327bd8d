//! SR-IOV interface passthrough.
//!
//! Each SR-IOV interface is backed by a virtual function that the SR-IOV
//! device plugin assigned to the pod. The plugin publishes two variables:
//!
//! - `KUBEVIRT_RESOURCE_NAME_<iface>`: the resource the interface draws from
//! - `PCIDEVICE_<RESOURCE>`: the VF addresses allocated for that resource
//!
//! Several interfaces may draw from the same resource, so an address handed
//! to one interface is withdrawn from all of them.

use crate::config::Config;
use crate::error::{HostDevError, Result};
use crate::hostdevice::address::PciAddress;
use crate::hostdevice::env::{resource_name_to_env_var, split_address_list, EnvSnapshot};
use crate::hostdevice::pool::AddressPool;
use crate::observability::metrics;
use crate::types::{Alias, HostDevice, Interface, Managed, VmSpec};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument, warn};

/// Alias prefix identifying SR-IOV host devices.
pub const ALIAS_PREFIX: &str = "sriov-";

/// Per-network pool of SR-IOV VF addresses.
#[derive(Debug, Clone, Default)]
pub struct SriovPciPool {
    networks: HashMap<String, Vec<String>>,
}

impl SriovPciPool {
    /// Discover the addresses assigned to each interface.
    ///
    /// Interfaces without a resource name, or whose resource has no
    /// addresses, get an empty list.
    pub fn from_env<'a, I>(env: &EnvSnapshot, config: &Config, ifaces: I) -> Self
    where
        I: IntoIterator<Item = &'a Interface>,
    {
        let mut networks = HashMap::new();

        for iface in ifaces {
            let resource_var = format!("{}{}", config.sriov_resource_name_prefix, iface.name);
            let Some(resource_name) = env.get(&resource_var) else {
                warn!(
                    interface = %iface.name,
                    variable = %resource_var,
                    "Unable to find resource name for SR-IOV interface"
                );
                networks.entry(iface.name.clone()).or_insert_with(Vec::new);
                continue;
            };

            let addresses = lookup_resource_addresses(env, config, resource_name);
            if addresses.is_empty() {
                warn!(
                    interface = %iface.name,
                    resource = %resource_name,
                    "No PCI addresses found for SR-IOV resource"
                );
            }
            debug!(
                interface = %iface.name,
                resource = %resource_name,
                addresses = ?addresses,
                "Discovered SR-IOV addresses"
            );
            networks.insert(iface.name.clone(), addresses);
        }

        Self { networks }
    }

    /// Pool over explicit per-network address lists.
    pub fn from_map(networks: HashMap<String, Vec<String>>) -> Self {
        Self { networks }
    }

    /// Addresses still available for `network`.
    pub fn available(&self, network: &str) -> &[String] {
        self.networks.get(network).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Take the first address for `network` and withdraw it from every network.
    pub fn pop(&mut self, network: &str) -> Result<String> {
        let address = match self.networks.get(network).and_then(|list| list.first()) {
            Some(address) => address.clone(),
            None => {
                metrics::record_pool_exhausted("sriov");
                return Err(HostDevError::SriovPoolExhausted { network: network.to_string() });
            }
        };

        for list in self.networks.values_mut() {
            list.retain(|a| a != &address);
        }

        metrics::record_allocation("sriov");
        Ok(address)
    }
}

impl AddressPool for SriovPciPool {
    fn pop(&mut self, key: &str) -> Result<String> {
        SriovPciPool::pop(self, key)
    }
}

fn lookup_resource_addresses(
    env: &EnvSnapshot,
    config: &Config,
    resource_name: &str,
) -> Vec<String> {
    let canonical = resource_name_to_env_var(&config.pci_resource_env_prefix, resource_name);
    let literal = format!("{}_{}", config.pci_resource_env_prefix, resource_name);

    env.get(&canonical)
        .or_else(|| env.get(&literal))
        .map(split_address_list)
        .unwrap_or_default()
}

/// SR-IOV interfaces served by the device plugin (not by a DRA claim), in spec order.
pub fn sriov_interfaces(spec: &VmSpec) -> Vec<&Interface> {
    let claim_networks: HashSet<&str> = spec
        .networks
        .iter()
        .filter(|n| n.resource_claim.is_some())
        .map(|n| n.name.as_str())
        .collect();

    spec.domain
        .devices
        .interfaces
        .iter()
        .filter(|iface| iface.is_sriov() && !claim_networks.contains(iface.name.as_str()))
        .collect()
}

/// Build SR-IOV descriptors for the VM's plugin-backed SR-IOV interfaces.
#[instrument(skip_all)]
pub fn create_host_devices(
    spec: &VmSpec,
    env: &EnvSnapshot,
    config: &Config,
) -> Result<Vec<HostDevice>> {
    let ifaces = sriov_interfaces(spec);
    if ifaces.is_empty() {
        return Ok(Vec::new());
    }

    let mut pool = SriovPciPool::from_env(env, config, ifaces.iter().copied());
    create_host_devices_from_ifaces_and_pool(ifaces, &mut pool)
}

/// Build one unmanaged PCI descriptor per interface, popping the pool by interface name.
pub fn create_host_devices_from_ifaces_and_pool<'a, I, P>(
    ifaces: I,
    pool: &mut P,
) -> Result<Vec<HostDevice>>
where
    I: IntoIterator<Item = &'a Interface>,
    P: AddressPool + ?Sized,
{
    let mut devices = Vec::new();

    for iface in ifaces {
        let host_address = pool
            .pop(&iface.name)
            .map_err(|e| HostDevError::for_device(iface.name.clone(), e))?;
        let host_address = PciAddress::parse(&host_address)
            .map_err(|e| HostDevError::for_device(iface.name.clone(), e))?;

        let mut device = HostDevice::pci(host_address, Managed::No)
            .with_alias(Alias::with_prefix(ALIAS_PREFIX, &iface.name));

        if let Some(guest_address) = &iface.pci_address {
            let guest_address = PciAddress::parse(guest_address)
                .map_err(|e| HostDevError::for_device(iface.name.clone(), e))?;
            device.address = Some(guest_address);
        }
        device.boot_order = iface.boot_order;

        debug!(interface = %iface.name, source = ?device.source, "Created SR-IOV host device");
        devices.push(device);
    }

    metrics::record_descriptors_built("sriov", devices.len());
    Ok(devices)
}

/// Descriptors whose alias marks them as SR-IOV devices.
pub fn filter_host_devices(devices: &[HostDevice]) -> Vec<HostDevice> {
    devices
        .iter()
        .filter(|d| d.alias_name().is_some_and(|name| name.starts_with(ALIAS_PREFIX)))
        .cloned()
        .collect()
}

/// Members of `devices` whose alias name does not appear in `remove`.
pub fn difference_host_devices_by_alias(
    devices: &[HostDevice],
    remove: &[HostDevice],
) -> Vec<HostDevice> {
    let removed: HashSet<Option<&str>> = remove.iter().map(HostDevice::alias_name).collect();
    devices.iter().filter(|d| !removed.contains(&d.alias_name())).cloned().collect()
}
