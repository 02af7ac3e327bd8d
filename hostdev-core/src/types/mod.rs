//! Core domain types for host device resolution.

pub mod descriptor;
pub mod status;
pub mod vm;

// Re-exports
pub use descriptor::{Alias, HostDevice, HostDeviceSource, HostDeviceType, Managed, Switch};
pub use status::{
    DeviceAttribute, DeviceResourceClaimStatus, DeviceStatus, DeviceStatusInfo, VmStatus,
};
pub use vm::{
    ClaimRequest, Devices, DomainSpec, FeatureState, Gpu, HostDeviceSpec, Interface,
    InterfaceSriov, Network, PodResourceClaim, VgpuDisplayOptions, VgpuOptions, VmSpec,
};
