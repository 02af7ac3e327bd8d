//! Generic DRA host devices.

use super::{build_from_statuses, is_host_device_dra};
use crate::error::{DeviceKind, HostDevError, Result};
use crate::hostdevice::validate::validate_count;
use crate::observability::metrics;
use crate::types::{HostDevice, VmSpec, VmStatus};
use tracing::{debug, instrument};

pub const HOST_DEVICE_ALIAS_PREFIX: &str = "dra-hostdevice-";

/// Build descriptors for the VM's DRA host devices from status.
///
/// Returns no devices when none are declared. Otherwise the number of
/// descriptors must match the number of declared devices.
#[instrument(skip_all)]
pub fn create_dra_host_devices(spec: &VmSpec, status: &VmStatus) -> Result<Vec<HostDevice>> {
    let requested: Vec<&str> = spec
        .domain
        .devices
        .host_devices
        .iter()
        .filter(|d| is_host_device_dra(d))
        .map(|d| d.name.as_str())
        .collect();
    if requested.is_empty() {
        return Ok(Vec::new());
    }

    let device_status = status.device_status.as_ref().ok_or(HostDevError::NoDeviceStatus)?;
    let built = build_from_statuses(&device_status.host_device_statuses, HOST_DEVICE_ALIAS_PREFIX)?;

    let mut devices = built.pci;
    devices.extend(built.mdev.into_iter().map(|(_, device)| device));

    validate_count(DeviceKind::HostDevice, &requested, &devices)?;

    debug!(count = devices.len(), "Created DRA host devices");
    metrics::record_descriptors_built("dra_hostdevice", devices.len());
    Ok(devices)
}
