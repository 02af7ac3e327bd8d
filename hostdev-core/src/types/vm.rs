//! VM specification types consumed by the device builders.
//!
//! These mirror the subset of the VM API that declares devices. Defaulting and
//! validation happen upstream; the builders read them as snapshots.

use serde::{Deserialize, Serialize};

/// VM specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VmSpec {
    pub domain: DomainSpec,

    /// Networks referenced by `domain.devices.interfaces[].name`
    pub networks: Vec<Network>,

    /// Pod-level resource claim references (DRA)
    pub resource_claims: Vec<PodResourceClaim>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomainSpec {
    pub devices: Devices,
}

/// Devices declared by the VM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Devices {
    pub gpus: Vec<Gpu>,
    pub host_devices: Vec<HostDeviceSpec>,
    pub interfaces: Vec<Interface>,
}

/// Reference to a request within a pod resource claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    /// Name of the pod resource claim reference (`spec.resourceClaims[].name`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_name: Option<String>,

    /// Name of the request inside that claim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_name: Option<String>,
}

/// GPU declared by the VM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gpu {
    pub name: String,

    /// Device-plugin resource name; empty for DRA-backed GPUs
    #[serde(default)]
    pub device_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_request: Option<ClaimRequest>,

    #[serde(default, rename = "virtualGPUOptions", skip_serializing_if = "Option::is_none")]
    pub virtual_gpu_options: Option<VgpuOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VgpuOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<VgpuDisplayOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VgpuDisplayOptions {
    /// Defaults to true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Boot framebuffer until the guest loads a GPU driver. Defaults to enabled.
    #[serde(default, rename = "ramFB", skip_serializing_if = "Option::is_none")]
    pub ram_fb: Option<FeatureState>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Generic host device declared by the VM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostDeviceSpec {
    pub name: String,

    /// Device-plugin resource name; empty for DRA-backed devices
    #[serde(default)]
    pub device_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_request: Option<ClaimRequest>,
}

/// Network interface declared by the VM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    /// Logical name, also the name of the associated network
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sriov: Option<InterfaceSriov>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masquerade: Option<InterfaceMasquerade>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<InterfaceBridge>,

    /// Guest-visible PCI address (e.g., "0000:01:01.0")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pci_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot_order: Option<u32>,
}

impl Interface {
    /// Whether this interface is bound through SR-IOV.
    pub fn is_sriov(&self) -> bool {
        self.sriov.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSriov {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceMasquerade {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceBridge {}

/// Network backing one or more interfaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<PodNetwork>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multus: Option<MultusNetwork>,

    /// DRA-backed network: the device comes from a resource claim request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_claim: Option<ClaimRequest>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodNetwork {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultusNetwork {
    pub network_name: String,
}

/// Pod resource claim reference.
///
/// Exactly one of `resource_claim_name` (pre-existing claim) or
/// `resource_claim_template_name` (claim generated per pod) is expected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodResourceClaim {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_claim_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_claim_template_name: Option<String>,
}
