//! Host device resolution library.
//!
//! Maps the passthrough devices a VM declares to the host devices assigned to
//! its pod, whether allocated by a device plugin or through DRA claims.

pub mod config;
pub mod error;
pub mod hostdevice;
pub mod observability;
pub mod types;

// Re-export commonly used items
pub use config::Config;
pub use error::{DeviceKind, HostDevError, Result};
pub use hostdevice::{resolve_host_devices, EnvSnapshot, PciAddress};
pub use observability::init as init_observability;
pub use types::{HostDevice, VmSpec, VmStatus};
