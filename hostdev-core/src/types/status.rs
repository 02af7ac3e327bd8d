//! VM status types populated upstream by the DRA status controller.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VmStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_status: Option<DeviceStatus>,
}

/// Resolved device identities, one entry per DRA-backed spec device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceStatus {
    pub gpu_statuses: Vec<DeviceStatusInfo>,
    pub host_device_statuses: Vec<DeviceStatusInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusInfo {
    /// Name of the spec device this entry belongs to
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_resource_claim_status: Option<DeviceResourceClaimStatus>,
}

impl DeviceStatusInfo {
    /// Attributes resolved for this device, if the controller got that far.
    pub fn attributes(&self) -> Option<&DeviceAttribute> {
        self.device_resource_claim_status.as_ref().and_then(|s| s.attributes.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResourceClaimStatus {
    /// Allocated device name within the driver's pool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Actual resource claim backing the pod claim reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_claim_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<DeviceAttribute>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAttribute {
    #[serde(default, rename = "pciAddress", skip_serializing_if = "Option::is_none")]
    pub pci_address: Option<String>,

    #[serde(default, rename = "mDevUUID", skip_serializing_if = "Option::is_none")]
    pub mdev_uuid: Option<String>,
}
