//! Error types for host device resolution.
//!
//! Builders never log and swallow: every failure reaches the caller, wrapped
//! with the name of the device it concerns.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for host device operations.
pub type Result<T> = std::result::Result<T, HostDevError>;

/// Device class a descriptor list was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Gpu,
    HostDevice,
    SriovInterface,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gpu => write!(f, "GPU"),
            Self::HostDevice => write!(f, "host device"),
            Self::SriovInterface => write!(f, "SR-IOV interface"),
        }
    }
}

/// Main error type for host device resolution.
#[derive(Error, Debug)]
pub enum HostDevError {
    // Malformed input
    #[error("failed to parse PCI address {address:?} (expected: 0000:01:00.0)")]
    InvalidPciAddress { address: String },

    #[error("failed to read DRA metadata at {path:?}: {source}")]
    MetadataRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse DRA metadata at {path:?}: {source}")]
    MetadataParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // Pool exhaustion
    #[error("no more PCI addresses to allocate")]
    PoolExhausted,

    #[error("no more SR-IOV PCI addresses to allocate for network {network}")]
    SriovPoolExhausted { network: String },

    // Missing upstream state
    #[error("no device status found")]
    NoDeviceStatus,

    #[error("metadata not found for claim {claim}")]
    MetadataNotFound { claim: String },

    #[error("request {request} not found in metadata for claim {claim}")]
    RequestNotFound { claim: String, request: String },

    #[error("{attribute} not found for claim {claim} request {request}")]
    AttributeNotFound { attribute: &'static str, claim: String, request: String },

    #[error(
        "claim {claim} request {request} has {count} devices: device count > 1 is not supported"
    )]
    MultipleDevices { claim: String, request: String, count: usize },

    // Count mismatch
    #[error(
        "{kind} count mismatch: requested {} {requested:?}, built {} {built:?}",
        requested.len(),
        built.len()
    )]
    CountMismatch { kind: DeviceKind, requested: Vec<String>, built: Vec<String> },

    // Context
    #[error("failed to create host device for {device}: {source}")]
    HostDevice {
        device: String,
        #[source]
        source: Box<HostDevError>,
    },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("I/O error at {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HostDevError {
    /// Wrap an error with the name of the device it was raised for.
    pub fn for_device(device: impl Into<String>, err: HostDevError) -> Self {
        Self::HostDevice { device: device.into(), source: Box::new(err) }
    }
}
