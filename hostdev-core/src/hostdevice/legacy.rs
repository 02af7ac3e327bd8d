//! GPU and vGPU passthrough from device-plugin environment variables.

use crate::config::Config;
use crate::error::{HostDevError, Result};
use crate::hostdevice::address::PciAddress;
use crate::hostdevice::env::EnvSnapshot;
use crate::hostdevice::pool::LegacyAddressPool;
use crate::observability::metrics;
use crate::types::{HostDevice, Managed};
use tracing::{debug, instrument};

/// Drain a pool of PCI addresses into managed PCI descriptors.
///
/// Any address that fails to parse aborts the whole build.
pub fn create_host_devices_from_pci_pool(pool: &mut LegacyAddressPool) -> Result<Vec<HostDevice>> {
    let mut devices = Vec::with_capacity(pool.len());
    while !pool.is_empty() {
        let raw = pool.pop()?;
        let address = PciAddress::parse(&raw)
            .map_err(|e| HostDevError::for_device(raw.clone(), e))?;
        debug!(address = %address, "Creating PCI passthrough device");
        devices.push(HostDevice::pci(address, Managed::Yes));
    }
    Ok(devices)
}

/// Drain a pool of mdev UUIDs into mediated device descriptors.
pub fn create_host_devices_from_mdev_pool(
    pool: &mut LegacyAddressPool,
) -> Result<Vec<HostDevice>> {
    let mut devices = Vec::with_capacity(pool.len());
    while !pool.is_empty() {
        let uuid = pool.pop()?;
        debug!(uuid = %uuid, "Creating mediated device");
        devices.push(HostDevice::mdev(uuid));
    }
    Ok(devices)
}

/// Build GPU (PCI) and vGPU (mdev) descriptors from the environment.
///
/// vGPU descriptors come first, followed by GPU descriptors.
#[instrument(skip_all)]
pub fn create_legacy_gpu_host_devices(
    env: &EnvSnapshot,
    config: &Config,
) -> Result<Vec<HostDevice>> {
    let mut vgpu_pool = LegacyAddressPool::from_env(env, &config.vgpu_env_prefix);
    let mut gpu_pool = LegacyAddressPool::from_env(env, &config.gpu_env_prefix);

    let mut devices = create_host_devices_from_mdev_pool(&mut vgpu_pool)?;
    devices.extend(create_host_devices_from_pci_pool(&mut gpu_pool)?);

    metrics::record_descriptors_built("legacy", devices.len());
    Ok(devices)
}
