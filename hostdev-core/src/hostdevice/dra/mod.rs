//! Dynamic Resource Allocation backends.
//!
//! GPUs and generic host devices are resolved from VM status entries that a
//! controller fills in from the allocated claims. SR-IOV interfaces on claim
//! networks are resolved from the runtime's metadata files.

pub mod generic;
pub mod gpu;
pub mod metadata;
pub mod sriov;

pub use generic::{create_dra_host_devices, HOST_DEVICE_ALIAS_PREFIX};
pub use gpu::{create_dra_gpu_host_devices, GPU_ALIAS_PREFIX};
pub use metadata::{DeviceMetadata, DraMetadataResolver, MDEV_UUID_ATTRIBUTE, PCI_BUS_ID_ATTRIBUTE};
pub use sriov::{create_dra_sriov_host_devices, dra_sriov_interfaces, ClaimAddressPool};

use crate::error::{HostDevError, Result};
use crate::hostdevice::address::PciAddress;
use crate::types::{Alias, DeviceStatusInfo, Gpu, HostDevice, HostDeviceSpec, Managed, VmStatus};
use tracing::debug;

/// A GPU is DRA-backed when it names no device-plugin resource but carries a claim request.
pub fn is_gpu_dra(gpu: &Gpu) -> bool {
    gpu.device_name.is_empty() && gpu.claim_request.is_some()
}

pub fn is_host_device_dra(device: &HostDeviceSpec) -> bool {
    device.device_name.is_empty() && device.claim_request.is_some()
}

/// True when every DRA GPU in `gpus` has a complete status entry.
pub fn is_all_dra_gpus_reconciled(gpus: &[Gpu], status: &VmStatus) -> bool {
    let names = gpus.iter().filter(|g| is_gpu_dra(g)).map(|g| g.name.as_str());
    let statuses = status.device_status.as_ref().map(|s| s.gpu_statuses.as_slice());
    all_reconciled(names, statuses.unwrap_or_default())
}

/// True when every DRA host device in `devices` has a complete status entry.
pub fn is_all_dra_host_devices_reconciled(devices: &[HostDeviceSpec], status: &VmStatus) -> bool {
    let names = devices.iter().filter(|d| is_host_device_dra(d)).map(|d| d.name.as_str());
    let statuses = status.device_status.as_ref().map(|s| s.host_device_statuses.as_slice());
    all_reconciled(names, statuses.unwrap_or_default())
}

fn all_reconciled<'a>(
    mut names: impl Iterator<Item = &'a str>,
    statuses: &[DeviceStatusInfo],
) -> bool {
    names.all(|name| statuses.iter().any(|st| st.name == name && is_reconciled(st)))
}

fn is_reconciled(status: &DeviceStatusInfo) -> bool {
    let Some(claim) = &status.device_resource_claim_status else {
        return false;
    };
    let has_identity = claim
        .attributes
        .as_ref()
        .is_some_and(|a| a.pci_address.is_some() || a.mdev_uuid.is_some());

    claim.name.is_some() && claim.resource_claim_name.is_some() && has_identity
}

/// Descriptors built from status entries, split by pass.
pub(crate) struct StatusDevices<'a> {
    pub pci: Vec<HostDevice>,
    /// mdev descriptors paired with the status entry they came from
    pub mdev: Vec<(&'a DeviceStatusInfo, HostDevice)>,
}

/// Two passes over `statuses`: PCI-addressed entries first, then entries
/// carrying only an mdev UUID. Entries with neither are skipped.
pub(crate) fn build_from_statuses<'a>(
    statuses: &'a [DeviceStatusInfo],
    alias_prefix: &str,
) -> Result<StatusDevices<'a>> {
    let mut pci = Vec::new();
    for status in statuses {
        let Some(raw) = status.attributes().and_then(|a| a.pci_address.as_deref()) else {
            continue;
        };
        let address =
            PciAddress::parse(raw).map_err(|e| HostDevError::for_device(status.name.clone(), e))?;
        debug!(device = %status.name, address = %address, "Creating DRA PCI host device");
        pci.push(
            HostDevice::pci(address, Managed::No)
                .with_alias(Alias::with_prefix(alias_prefix, &status.name)),
        );
    }

    let mut mdev = Vec::new();
    for status in statuses {
        let Some(attrs) = status.attributes() else {
            continue;
        };
        if attrs.pci_address.is_some() {
            continue;
        }
        let Some(uuid) = attrs.mdev_uuid.as_deref() else {
            debug!(
                device = %status.name,
                "Skipping DRA status entry without PCI address or mdev UUID"
            );
            continue;
        };
        debug!(device = %status.name, uuid = %uuid, "Creating DRA mediated device");
        let device =
            HostDevice::mdev(uuid).with_alias(Alias::with_prefix(alias_prefix, &status.name));
        mdev.push((status, device));
    }

    Ok(StatusDevices { pci, mdev })
}
