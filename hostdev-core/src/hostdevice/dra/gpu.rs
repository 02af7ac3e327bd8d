//! DRA GPUs and vGPUs.
//!
//! Same two passes as generic host devices, plus vGPU display handling: a
//! VM gets exactly one display by default. When no GPU configures display
//! options, the first mediated GPU gets `display=on,ramfb=on`.

use super::{build_from_statuses, is_gpu_dra};
use crate::error::{DeviceKind, HostDevError, Result};
use crate::hostdevice::validate::validate_count;
use crate::observability::metrics;
use crate::types::{Gpu, HostDevice, Switch, VgpuDisplayOptions, VmSpec, VmStatus};
use tracing::{debug, instrument};

pub const GPU_ALIAS_PREFIX: &str = "dra-gpu-";

/// Build descriptors for the VM's DRA GPUs from status.
#[instrument(skip_all)]
pub fn create_dra_gpu_host_devices(spec: &VmSpec, status: &VmStatus) -> Result<Vec<HostDevice>> {
    let gpus = &spec.domain.devices.gpus;
    let requested: Vec<&str> =
        gpus.iter().filter(|g| is_gpu_dra(g)).map(|g| g.name.as_str()).collect();
    if requested.is_empty() {
        return Ok(Vec::new());
    }

    let device_status = status.device_status.as_ref().ok_or(HostDevError::NoDeviceStatus)?;
    let built = build_from_statuses(&device_status.gpu_statuses, GPU_ALIAS_PREFIX)?;

    let mut mdevs = Vec::with_capacity(built.mdev.len());
    for (entry, mut device) in built.mdev {
        if let Some(display) = display_options(gpus.iter().find(|g| g.name == entry.name)) {
            apply_display(&mut device, display);
        }
        mdevs.push(device);
    }

    let display_configured = gpus.iter().any(|g| display_options(Some(g)).is_some());
    if !display_configured {
        if let Some(first) = mdevs.first_mut() {
            debug!(device = %first.label(), "Enabling default display on first vGPU");
            first.display = Some(Switch::On);
            first.ramfb = Some(Switch::On);
        }
    }

    let mut devices = built.pci;
    devices.extend(mdevs);

    validate_count(DeviceKind::Gpu, &requested, &devices)?;

    debug!(count = devices.len(), "Created DRA GPU host devices");
    metrics::record_descriptors_built("dra_gpu", devices.len());
    Ok(devices)
}

fn display_options(gpu: Option<&Gpu>) -> Option<&VgpuDisplayOptions> {
    gpu?.virtual_gpu_options.as_ref()?.display.as_ref()
}

/// `enabled` and `ramFB.enabled` both default to true.
fn apply_display(device: &mut HostDevice, display: &VgpuDisplayOptions) {
    if !display.enabled.unwrap_or(true) {
        return;
    }
    device.display = Some(Switch::On);

    let ramfb = display.ram_fb.as_ref().and_then(|r| r.enabled).unwrap_or(true);
    if ramfb {
        device.ramfb = Some(Switch::On);
    }
}
