//! Full device list for one VM.

use crate::config::Config;
use crate::error::Result;
use crate::hostdevice::dra::{self, DraMetadataResolver};
use crate::hostdevice::env::EnvSnapshot;
use crate::hostdevice::{legacy, sriov};
use crate::types::{HostDevice, VmSpec, VmStatus};
use tracing::{info, instrument};

/// Resolve every host device class, in order: legacy GPU/vGPU, SR-IOV,
/// DRA SR-IOV, DRA host devices, DRA GPUs.
///
/// The first failing class fails the whole resolution.
#[instrument(
    skip_all,
    fields(
        gpus = spec.domain.devices.gpus.len(),
        host_devices = spec.domain.devices.host_devices.len()
    )
)]
pub fn resolve_host_devices(
    config: &Config,
    env: &EnvSnapshot,
    spec: &VmSpec,
    status: &VmStatus,
) -> Result<Vec<HostDevice>> {
    let mut devices = legacy::create_legacy_gpu_host_devices(env, config)?;
    devices.extend(sriov::create_host_devices(spec, env, config)?);

    if !dra::dra_sriov_interfaces(spec).is_empty() {
        let resolver =
            DraMetadataResolver::from_claims(&config.dra_metadata_dir, &spec.resource_claims)?;
        devices.extend(dra::create_dra_sriov_host_devices(spec, &resolver)?);
    }

    devices.extend(dra::create_dra_host_devices(spec, status)?);
    devices.extend(dra::create_dra_gpu_host_devices(spec, status)?);

    info!(count = devices.len(), "Resolved host devices");
    Ok(devices)
}
