//! Count validation shared by the builders.

use crate::error::{DeviceKind, HostDevError, Result};
use crate::observability::metrics;
use crate::types::HostDevice;
use tracing::warn;

/// Fail unless exactly one descriptor was built per requested device.
///
/// A mismatch means spec and status have drifted apart; the caller must not
/// attach a partial list.
pub fn validate_count<S: AsRef<str>>(
    kind: DeviceKind,
    requested: &[S],
    built: &[HostDevice],
) -> Result<()> {
    if requested.len() == built.len() {
        return Ok(());
    }

    let requested: Vec<String> = requested.iter().map(|s| s.as_ref().to_string()).collect();
    let built: Vec<String> = built.iter().map(HostDevice::label).collect();

    warn!(kind = %kind, requested = ?requested, built = ?built, "Device count mismatch");
    metrics::record_count_mismatch(kind_label(kind));

    Err(HostDevError::CountMismatch { kind, requested, built })
}

pub(crate) fn kind_label(kind: DeviceKind) -> &'static str {
    match kind {
        DeviceKind::Gpu => "gpu",
        DeviceKind::HostDevice => "hostdevice",
        DeviceKind::SriovInterface => "sriov",
    }
}
