//! Host device descriptors handed to the hypervisor configuration layer.

use crate::hostdevice::address::PciAddress;
use serde::{Deserialize, Serialize};

/// libvirt mode for mediated devices.
pub const MDEV_MODE_SUBSYSTEM: &str = "subsystem";

/// libvirt model for mediated devices.
pub const MDEV_MODEL_VFIO_PCI: &str = "vfio-pci";

/// Device alias, unique within one VM.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alias(String);

impl Alias {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Alias built from a class prefix and the spec device name.
    pub fn with_prefix(prefix: &str, name: &str) -> Self {
        Self(format!("{}{}", prefix, name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Alias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host device type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostDeviceType {
    Pci,
    Mdev,
}

impl std::fmt::Display for HostDeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pci => write!(f, "pci"),
            Self::Mdev => write!(f, "mdev"),
        }
    }
}

/// Where the device comes from on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostDeviceSource {
    /// Physical function or virtual function at a host PCI address
    Pci(PciAddress),
    /// Mediated device
    Mdev { uuid: String },
}

/// libvirt `managed` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Managed {
    Yes,
    No,
}

/// Switch for `display` and `ramfb`. Unset means the hypervisor default (off).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Switch {
    On,
}

/// One hypervisor-attachable device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostDevice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<Alias>,

    pub source: HostDeviceSource,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed: Option<Managed>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<Switch>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ramfb: Option<Switch>,

    /// Guest-visible PCI address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<PciAddress>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_order: Option<u32>,
}

impl HostDevice {
    /// PCI passthrough device.
    pub fn pci(address: PciAddress, managed: Managed) -> Self {
        Self {
            alias: None,
            source: HostDeviceSource::Pci(address),
            managed: Some(managed),
            mode: None,
            model: None,
            display: None,
            ramfb: None,
            address: None,
            boot_order: None,
        }
    }

    /// Mediated device in subsystem mode.
    pub fn mdev(uuid: impl Into<String>) -> Self {
        Self {
            alias: None,
            source: HostDeviceSource::Mdev { uuid: uuid.into() },
            managed: None,
            mode: Some(MDEV_MODE_SUBSYSTEM.to_string()),
            model: Some(MDEV_MODEL_VFIO_PCI.to_string()),
            display: None,
            ramfb: None,
            address: None,
            boot_order: None,
        }
    }

    pub fn with_alias(mut self, alias: Alias) -> Self {
        self.alias = Some(alias);
        self
    }

    pub fn device_type(&self) -> HostDeviceType {
        match self.source {
            HostDeviceSource::Pci(_) => HostDeviceType::Pci,
            HostDeviceSource::Mdev { .. } => HostDeviceType::Mdev,
        }
    }

    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_ref().map(Alias::name)
    }

    /// Label used in diagnostics: the alias, else the host identity.
    pub fn label(&self) -> String {
        match (&self.alias, &self.source) {
            (Some(alias), _) => alias.to_string(),
            (None, HostDeviceSource::Pci(address)) => address.to_string(),
            (None, HostDeviceSource::Mdev { uuid }) => uuid.clone(),
        }
    }
}
