//! Host device resolution for VM launch.
//!
//! Turns the devices a VM declares (GPUs, generic host devices, SR-IOV
//! interfaces) into concrete host identities for the hypervisor: PCI
//! addresses for passthrough, UUIDs for mediated devices.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Host Device Resolution                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Device plugin (environment)                                │
//! │  ├── LegacyAddressPool - GPU_/VGPU_PASSTHROUGH_DEVICES*     │
//! │  └── SriovPciPool - KUBEVIRT_RESOURCE_NAME_* / PCIDEVICE_*  │
//! │                                                             │
//! │  DRA (claims)                                               │
//! │  ├── DraMetadataResolver - <base>/<claim>/<req>/*.json      │
//! │  ├── ClaimAddressPool - SR-IOV VFs from claim metadata      │
//! │  └── VM status - GPU and host device identities             │
//! │                                                             │
//! │  Builders                                                   │
//! │  └── pool / status -> HostDevice, count checked per class   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every build runs against an [`EnvSnapshot`] and a point-in-time spec and
//! status. Nothing is cached between builds.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hostdev_core::hostdevice::{resolve_host_devices, EnvSnapshot};
//!
//! let env = EnvSnapshot::from_process();
//! let devices = resolve_host_devices(&config, &env, &vm.spec, &vm.status)?;
//! ```

pub mod address;
pub mod dra;
pub mod env;
pub mod legacy;
pub mod pool;
pub mod resolve;
pub mod sriov;
pub mod validate;

// Re-exports
pub use address::{is_valid_pci_address, PciAddress};
pub use env::EnvSnapshot;
pub use legacy::create_legacy_gpu_host_devices;
pub use pool::{AddressPool, LegacyAddressPool};
pub use resolve::resolve_host_devices;
pub use sriov::{difference_host_devices_by_alias, filter_host_devices, SriovPciPool};
pub use validate::validate_count;
