//! DRA device metadata resolution.
//!
//! The container runtime mounts one JSON file per claim request and driver:
//!
//! ```text
//! <base>/<claimName>/<requestName>/<driver>-metadata.json
//! ```
//!
//! A pod claim reference either names an existing claim directly, or names a
//! claim template. Template-generated claims get a generated name, so they are
//! found by scanning every file for a matching `podClaimName`.

use crate::error::{HostDevError, Result};
use crate::types::PodResourceClaim;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Attribute carrying the PCI bus ID of an allocated device.
pub const PCI_BUS_ID_ATTRIBUTE: &str = "resource.kubernetes.io/pciBusID";

/// Attribute carrying the UUID of an allocated mediated device.
pub const MDEV_UUID_ATTRIBUTE: &str = "mdevUUID";

const METADATA_FILE_SUFFIX: &str = "-metadata.json";

/// Device metadata for one claim, as written by the runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default)]
    pub metadata: ObjectMeta,

    /// Pod claim reference a template-generated claim was created for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_claim_name: Option<String>,

    #[serde(default)]
    pub requests: Vec<DeviceMetadataRequest>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMetadataRequest {
    pub name: String,

    #[serde(default)]
    pub devices: Vec<Device>,
}

/// One allocated device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(default)]
    pub driver: String,

    #[serde(default)]
    pub pool: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub attributes: HashMap<String, DeviceAttributeValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_data: Option<NetworkDeviceData>,
}

impl Device {
    /// String value of attribute `key`, if present and string-typed.
    pub fn string_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.string.as_deref())
    }
}

/// Typed attribute value. Exactly one field is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAttributeValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bool: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl DeviceAttributeValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self { string: Some(value.into()), ..Default::default() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDeviceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ips: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_address: Option<String>,
}

impl DeviceMetadata {
    /// Fold another file's requests for the same claim into this one.
    fn merge(&mut self, other: DeviceMetadata) {
        for request in other.requests {
            match self.requests.iter_mut().find(|r| r.name == request.name) {
                Some(existing) => existing.devices.extend(request.devices),
                None => self.requests.push(request),
            }
        }
    }

    fn request(&self, name: &str) -> Option<&DeviceMetadataRequest> {
        self.requests.iter().find(|r| r.name == name)
    }
}

/// Lookup table from pod claim reference name to its device metadata.
#[derive(Debug, Clone, Default)]
pub struct DraMetadataResolver {
    resolved: HashMap<String, DeviceMetadata>,
}

impl DraMetadataResolver {
    /// Resolve metadata for every claim reference under `base`.
    ///
    /// A reference with no metadata on disk stays unresolved; only unreadable
    /// or malformed files are errors.
    pub fn from_claims(base: &Path, claims: &[PodResourceClaim]) -> Result<Self> {
        let mut resolved = HashMap::new();
        let mut generated: Option<Vec<DeviceMetadata>> = None;

        for claim in claims {
            let metadata = match (&claim.resource_claim_name, &claim.resource_claim_template_name) {
                (Some(claim_name), _) => load_claim_dir(&base.join(claim_name))?,
                (None, Some(_)) => {
                    if generated.is_none() {
                        generated = Some(scan_all(base)?);
                    }
                    generated
                        .iter()
                        .flatten()
                        .filter(|md| md.pod_claim_name.as_deref() == Some(claim.name.as_str()))
                        .cloned()
                        .reduce(|mut acc, md| {
                            acc.merge(md);
                            acc
                        })
                }
                (None, None) => {
                    warn!(
                        claim = %claim.name,
                        "Pod resource claim has neither claim name nor template name"
                    );
                    None
                }
            };

            match metadata {
                Some(md) => {
                    debug!(
                        claim = %claim.name,
                        resource_claim = %md.metadata.name,
                        requests = md.requests.len(),
                        "Resolved DRA metadata"
                    );
                    resolved.insert(claim.name.clone(), md);
                }
                None => debug!(claim = %claim.name, "No DRA metadata found for claim"),
            }
        }

        Ok(Self { resolved })
    }

    /// Resolver over already-loaded metadata, keyed by claim reference name.
    pub fn from_metadata(resolved: HashMap<String, DeviceMetadata>) -> Self {
        Self { resolved }
    }

    pub fn metadata(&self, claim: &str) -> Option<&DeviceMetadata> {
        self.resolved.get(claim)
    }

    pub fn is_resolved(&self, claim: &str) -> bool {
        self.resolved.contains_key(claim)
    }

    /// PCI bus ID of the single device allocated for `claim`/`request`.
    ///
    /// The value is returned verbatim; callers parse it.
    pub fn get_pci_address_for_claim(&self, claim: &str, request: &str) -> Result<String> {
        self.string_attribute(claim, request, PCI_BUS_ID_ATTRIBUTE, "pciBusID")
    }

    /// UUID of the single mediated device allocated for `claim`/`request`.
    pub fn get_mdev_uuid_for_claim(&self, claim: &str, request: &str) -> Result<String> {
        self.string_attribute(claim, request, MDEV_UUID_ATTRIBUTE, "mdevUUID")
    }

    fn string_attribute(
        &self,
        claim: &str,
        request: &str,
        key: &str,
        label: &'static str,
    ) -> Result<String> {
        let metadata = self
            .resolved
            .get(claim)
            .ok_or_else(|| HostDevError::MetadataNotFound { claim: claim.to_string() })?;

        let req = metadata.request(request).ok_or_else(|| HostDevError::RequestNotFound {
            claim: claim.to_string(),
            request: request.to_string(),
        })?;

        if req.devices.len() > 1 {
            return Err(HostDevError::MultipleDevices {
                claim: claim.to_string(),
                request: request.to_string(),
                count: req.devices.len(),
            });
        }

        req.devices
            .first()
            .and_then(|device| device.string_attribute(key))
            .map(str::to_string)
            .ok_or_else(|| HostDevError::AttributeNotFound {
                attribute: label,
                claim: claim.to_string(),
                request: request.to_string(),
            })
    }
}

/// Load and merge every `*-metadata.json` under `<claim_dir>/<request>/`.
fn load_claim_dir(claim_dir: &Path) -> Result<Option<DeviceMetadata>> {
    if !claim_dir.is_dir() {
        return Ok(None);
    }

    let mut merged: Option<DeviceMetadata> = None;
    for request_dir in sorted_entries(claim_dir)?.into_iter().filter(|p| p.is_dir()) {
        for file in sorted_entries(&request_dir)? {
            let is_metadata = file
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(METADATA_FILE_SUFFIX));
            if !is_metadata || !file.is_file() {
                continue;
            }

            let md = load_file(&file)?;
            match merged.as_mut() {
                Some(acc) => acc.merge(md),
                None => merged = Some(md),
            }
        }
    }

    Ok(merged)
}

/// Load every `<base>/*/*/*.json` file.
fn scan_all(base: &Path) -> Result<Vec<DeviceMetadata>> {
    if !base.is_dir() {
        return Ok(Vec::new());
    }

    let mut all = Vec::new();
    for claim_dir in sorted_entries(base)?.into_iter().filter(|p| p.is_dir()) {
        for request_dir in sorted_entries(&claim_dir)?.into_iter().filter(|p| p.is_dir()) {
            for file in sorted_entries(&request_dir)? {
                if file.is_file() && file.extension().is_some_and(|e| e == "json") {
                    all.push(load_file(&file)?);
                }
            }
        }
    }

    debug!(base = %base.display(), files = all.len(), "Scanned DRA metadata");
    Ok(all)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)
        .map_err(|e| HostDevError::MetadataRead { path: dir.to_path_buf(), source: e })?
    {
        let entry =
            entry.map_err(|e| HostDevError::MetadataRead { path: dir.to_path_buf(), source: e })?;
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

fn load_file(path: &Path) -> Result<DeviceMetadata> {
    let content = fs::read_to_string(path)
        .map_err(|e| HostDevError::MetadataRead { path: path.to_path_buf(), source: e })?;
    serde_json::from_str(&content)
        .map_err(|e| HostDevError::MetadataParse { path: path.to_path_buf(), source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DRIVER: &str = "gpu.example.com";

    fn device_with(key: &str, value: &str) -> Device {
        Device {
            driver: DRIVER.to_string(),
            pool: "default".to_string(),
            name: "dev-0".to_string(),
            attributes: HashMap::from([(key.to_string(), DeviceAttributeValue::string(value))]),
            network_data: None,
        }
    }

    fn metadata(
        claim: &str,
        pod_claim: Option<&str>,
        request: &str,
        devices: Vec<Device>,
    ) -> DeviceMetadata {
        DeviceMetadata {
            metadata: ObjectMeta { name: claim.to_string(), ..Default::default() },
            pod_claim_name: pod_claim.map(str::to_string),
            requests: vec![DeviceMetadataRequest { name: request.to_string(), devices }],
            ..Default::default()
        }
    }

    fn write_metadata(base: &Path, claim: &str, request: &str, md: &DeviceMetadata) {
        let dir = base.join(claim).join(request);
        fs::create_dir_all(&dir).unwrap();
        let data = serde_json::to_string(md).unwrap();
        fs::write(dir.join(format!("{DRIVER}{METADATA_FILE_SUFFIX}")), data).unwrap();
    }

    fn direct(name: &str, claim: &str) -> PodResourceClaim {
        PodResourceClaim {
            name: name.to_string(),
            resource_claim_name: Some(claim.to_string()),
            resource_claim_template_name: None,
        }
    }

    fn templated(name: &str, template: &str) -> PodResourceClaim {
        PodResourceClaim {
            name: name.to_string(),
            resource_claim_name: None,
            resource_claim_template_name: Some(template.to_string()),
        }
    }

    #[test]
    fn test_preexisting_claim_pci_address() {
        let dir = TempDir::new().unwrap();
        let devices = vec![device_with(PCI_BUS_ID_ATTRIBUTE, "0000:02:00.0")];
        let md = metadata("pci-claim", None, "req1", devices);
        write_metadata(dir.path(), "pci-claim", "req1", &md);

        let claims = [direct("my-claim", "pci-claim")];
        let resolver = DraMetadataResolver::from_claims(dir.path(), &claims).unwrap();

        assert!(resolver.is_resolved("my-claim"));
        assert_eq!(resolver.get_pci_address_for_claim("my-claim", "req1").unwrap(), "0000:02:00.0");
    }

    #[test]
    fn test_template_claim_resolves_by_pod_claim_name() {
        let dir = TempDir::new().unwrap();
        let uuid = "123e4567-e89b-12d3-a456-426614174000";
        let md = metadata(
            "generated-claim-abc123",
            Some("vmi-template-ref"),
            "vgpu-request",
            vec![device_with(MDEV_UUID_ATTRIBUTE, uuid)],
        );
        write_metadata(dir.path(), "generated-claim-abc123", "vgpu-request", &md);

        let resolver =
            DraMetadataResolver::from_claims(dir.path(), &[templated("vmi-template-ref", "tmpl")])
                .unwrap();

        let resolved = resolver.get_mdev_uuid_for_claim("vmi-template-ref", "vgpu-request");
        assert_eq!(resolved.unwrap(), uuid);
        let md = resolver.metadata("vmi-template-ref").unwrap();
        assert_eq!(md.metadata.name, "generated-claim-abc123");
    }

    #[test]
    fn test_missing_metadata_is_not_an_error_until_lookup() {
        let dir = TempDir::new().unwrap();
        let claims =
            [direct("missing-claim", "nonexistent"), templated("missing-template", "tmpl")];

        let resolver = DraMetadataResolver::from_claims(dir.path(), &claims).unwrap();
        assert!(!resolver.is_resolved("missing-claim"));
        assert!(!resolver.is_resolved("missing-template"));

        let err = resolver.get_pci_address_for_claim("missing-template", "req1").unwrap_err();
        assert!(err.to_string().contains("metadata not found"));
    }

    #[test]
    fn test_missing_base_dir() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("absent");
        let resolver = DraMetadataResolver::from_claims(&base, &[templated("t", "tmpl")]).unwrap();
        assert!(!resolver.is_resolved("t"));
    }

    #[test]
    fn test_request_not_found() {
        let dir = TempDir::new().unwrap();
        let md = DeviceMetadata {
            metadata: ObjectMeta { name: "claim1".to_string(), ..Default::default() },
            ..Default::default()
        };
        write_metadata(dir.path(), "claim1", "placeholder", &md);

        let claims = [direct("my-claim", "claim1")];
        let resolver = DraMetadataResolver::from_claims(dir.path(), &claims).unwrap();
        let err = resolver.get_pci_address_for_claim("my-claim", "missing-req").unwrap_err();
        assert!(err.to_string().contains("not found in metadata"));
    }

    #[test]
    fn test_attribute_not_found() {
        let resolver = DraMetadataResolver::from_metadata(HashMap::from([(
            "my-claim".to_string(),
            metadata("c", None, "req1", vec![device_with(PCI_BUS_ID_ATTRIBUTE, "0000:01:00.0")]),
        )]));

        let err = resolver.get_mdev_uuid_for_claim("my-claim", "req1").unwrap_err();
        assert!(err.to_string().contains("mdevUUID not found"));

        let empty = DraMetadataResolver::from_metadata(HashMap::from([(
            "my-claim".to_string(),
            metadata("c", None, "req1", vec![Device::default()]),
        )]));
        let err = empty.get_pci_address_for_claim("my-claim", "req1").unwrap_err();
        assert!(err.to_string().contains("pciBusID not found"));
    }

    #[test]
    fn test_multiple_devices_not_supported() {
        let resolver = DraMetadataResolver::from_metadata(HashMap::from([(
            "my-claim".to_string(),
            metadata(
                "c",
                None,
                "req1",
                vec![
                    device_with(PCI_BUS_ID_ATTRIBUTE, "0000:03:00.0"),
                    device_with(PCI_BUS_ID_ATTRIBUTE, "0000:04:00.0"),
                ],
            ),
        )]));

        let err = resolver.get_pci_address_for_claim("my-claim", "req1").unwrap_err();
        assert!(err.to_string().contains("count > 1 is not supported"));
    }

    #[test]
    fn test_requests_from_several_directories_are_merged() {
        let dir = TempDir::new().unwrap();
        write_metadata(
            dir.path(),
            "multi",
            "gpu-req",
            &metadata(
                "multi",
                None,
                "gpu-req",
                vec![device_with(PCI_BUS_ID_ATTRIBUTE, "0000:04:00.0")],
            ),
        );
        write_metadata(
            dir.path(),
            "multi",
            "vgpu-req",
            &metadata("multi", None, "vgpu-req", vec![device_with(MDEV_UUID_ATTRIBUTE, "uuid-1")]),
        );

        let claims = [direct("ref", "multi")];
        let resolver = DraMetadataResolver::from_claims(dir.path(), &claims).unwrap();
        assert_eq!(resolver.get_pci_address_for_claim("ref", "gpu-req").unwrap(), "0000:04:00.0");
        assert_eq!(resolver.get_mdev_uuid_for_claim("ref", "vgpu-req").unwrap(), "uuid-1");
    }

    #[test]
    fn test_mixed_claims() {
        let dir = TempDir::new().unwrap();
        write_metadata(
            dir.path(),
            "preexisting-claim",
            "pci-req",
            &metadata(
                "preexisting-claim",
                None,
                "pci-req",
                vec![device_with(PCI_BUS_ID_ATTRIBUTE, "0000:06:00.0")],
            ),
        );
        write_metadata(
            dir.path(),
            "generated-claim-def456",
            "vgpu-req",
            &metadata(
                "generated-claim-def456",
                Some("my-template-claim"),
                "vgpu-req",
                vec![device_with(MDEV_UUID_ATTRIBUTE, "12121212-3434-5656-7878-909090909090")],
            ),
        );

        let claims =
            [direct("existing-ref", "preexisting-claim"), templated("my-template-claim", "t")];
        let resolver = DraMetadataResolver::from_claims(dir.path(), &claims).unwrap();

        assert_eq!(
            resolver.get_pci_address_for_claim("existing-ref", "pci-req").unwrap(),
            "0000:06:00.0"
        );
        assert_eq!(
            resolver.get_mdev_uuid_for_claim("my-template-claim", "vgpu-req").unwrap(),
            "12121212-3434-5656-7878-909090909090"
        );
    }

    #[test]
    fn test_malformed_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let req_dir = dir.path().join("broken").join("req");
        fs::create_dir_all(&req_dir).unwrap();
        fs::write(req_dir.join(format!("{DRIVER}{METADATA_FILE_SUFFIX}")), "{").unwrap();

        let claims = [direct("ref", "broken")];
        let err = DraMetadataResolver::from_claims(dir.path(), &claims).unwrap_err();
        assert!(matches!(err, HostDevError::MetadataParse { .. }));
    }

    #[test]
    fn test_metadata_json_shape() {
        let md: DeviceMetadata = serde_json::from_str(
            r#"{
                "apiVersion": "metadata.resource.k8s.io/v1alpha1",
                "kind": "DeviceMetadata",
                "metadata": {"name": "sriov-claim"},
                "requests": [{"name": "vf", "devices": [{
                    "driver": "sriovnetwork.k8snetworkplumbingwg.io",
                    "pool": "node1",
                    "name": "0000-81-01-0",
                    "attributes": {"resource.kubernetes.io/pciBusID": {"string": "0000:81:01.0"}},
                    "networkData": {"interfaceName": "net1", "ips": ["10.0.0.5/24"]}
                }]}]
            }"#,
        )
        .unwrap();

        let device = &md.requests[0].devices[0];
        assert_eq!(device.string_attribute(PCI_BUS_ID_ATTRIBUTE), Some("0000:81:01.0"));
        assert_eq!(device.network_data.as_ref().unwrap().ips, vec!["10.0.0.5/24"]);
        assert_eq!(md.pod_claim_name, None);
    }
}
