//! SR-IOV interfaces on DRA resource-claim networks.

use super::metadata::DraMetadataResolver;
use crate::error::{HostDevError, Result};
use crate::hostdevice::pool::AddressPool;
use crate::hostdevice::sriov::create_host_devices_from_ifaces_and_pool;
use crate::observability::metrics;
use crate::types::{HostDevice, Interface, VmSpec};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// Pool answering interface names with the VF address recorded in claim metadata.
#[derive(Debug)]
pub struct ClaimAddressPool<'a> {
    resolver: &'a DraMetadataResolver,
    /// interface name -> (claim reference, request)
    claims: HashMap<String, (String, String)>,
}

impl<'a> ClaimAddressPool<'a> {
    /// Map the network of every claim-backed SR-IOV interface to its claim request.
    ///
    /// Claim networks serving other interface types are not inspected.
    pub fn new(resolver: &'a DraMetadataResolver, spec: &VmSpec) -> Result<Self> {
        let sriov_names: HashSet<&str> =
            dra_sriov_interfaces(spec).into_iter().map(|iface| iface.name.as_str()).collect();
        let mut claims = HashMap::new();

        for network in spec.networks.iter().filter(|n| sriov_names.contains(n.name.as_str())) {
            let Some(claim) = &network.resource_claim else {
                continue;
            };
            match (&claim.claim_name, &claim.request_name) {
                (Some(claim_name), Some(request_name)) => {
                    claims.insert(network.name.clone(), (claim_name.clone(), request_name.clone()));
                }
                _ => {
                    return Err(HostDevError::InvalidConfig {
                        reason: format!(
                            "network {} resourceClaim needs both claimName and requestName",
                            network.name
                        ),
                    })
                }
            }
        }

        Ok(Self { resolver, claims })
    }
}

impl AddressPool for ClaimAddressPool<'_> {
    fn pop(&mut self, key: &str) -> Result<String> {
        let (claim, request) = self
            .claims
            .get(key)
            .ok_or_else(|| HostDevError::MetadataNotFound { claim: key.to_string() })?;

        let address = self.resolver.get_pci_address_for_claim(claim, request)?;
        debug!(
            interface = %key,
            claim = %claim,
            request = %request,
            address = %address,
            "Resolved SR-IOV VF from DRA metadata"
        );
        metrics::record_allocation("dra_sriov");
        Ok(address)
    }
}

/// SR-IOV interfaces whose network is a DRA resource claim, in spec order.
pub fn dra_sriov_interfaces(spec: &VmSpec) -> Vec<&Interface> {
    spec.domain
        .devices
        .interfaces
        .iter()
        .filter(|iface| {
            iface.is_sriov()
                && spec.networks.iter().any(|n| n.name == iface.name && n.resource_claim.is_some())
        })
        .collect()
}

/// Build SR-IOV descriptors for claim-backed interfaces.
#[instrument(skip_all)]
pub fn create_dra_sriov_host_devices(
    spec: &VmSpec,
    resolver: &DraMetadataResolver,
) -> Result<Vec<HostDevice>> {
    let ifaces = dra_sriov_interfaces(spec);
    if ifaces.is_empty() {
        return Ok(Vec::new());
    }

    let mut pool = ClaimAddressPool::new(resolver, spec)?;
    create_host_devices_from_ifaces_and_pool(ifaces, &mut pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hostdevice::dra::metadata::{
        Device, DeviceAttributeValue, DeviceMetadata, DeviceMetadataRequest, PCI_BUS_ID_ATTRIBUTE,
    };
    use crate::hostdevice::dra::testing::claim_request;
    use crate::types::{ClaimRequest, HostDeviceSource, InterfaceSriov, Managed, Network};

    fn sriov_iface(name: &str) -> Interface {
        Interface { name: name.to_string(), sriov: Some(InterfaceSriov {}), ..Default::default() }
    }

    fn resolver_with(claim: &str, request: &str, address: &str) -> DraMetadataResolver {
        let device = Device {
            attributes: HashMap::from([(
                PCI_BUS_ID_ATTRIBUTE.to_string(),
                DeviceAttributeValue::string(address),
            )]),
            ..Default::default()
        };
        let md = DeviceMetadata {
            requests: vec![DeviceMetadataRequest {
                name: request.to_string(),
                devices: vec![device],
            }],
            ..Default::default()
        };
        DraMetadataResolver::from_metadata(HashMap::from([(claim.to_string(), md)]))
    }

    fn claim_spec() -> VmSpec {
        let mut spec = VmSpec::default();
        spec.domain.devices.interfaces = vec![sriov_iface("net1"), sriov_iface("plugin-net")];
        spec.networks = vec![
            Network {
                name: "net1".to_string(),
                resource_claim: claim_request("sriov-claim", "vf"),
                ..Default::default()
            },
            Network { name: "plugin-net".to_string(), ..Default::default() },
        ];
        spec
    }

    #[test]
    fn test_only_claim_networks_selected() {
        let spec = claim_spec();
        let names: Vec<&str> =
            dra_sriov_interfaces(&spec).iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["net1"]);
    }

    #[test]
    fn test_builds_from_claim_metadata() {
        let spec = claim_spec();
        let resolver = resolver_with("sriov-claim", "vf", "0000:81:02.3");

        let devices = create_dra_sriov_host_devices(&spec, &resolver).unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].alias_name(), Some("sriov-net1"));
        assert_eq!(devices[0].managed, Some(Managed::No));
        match &devices[0].source {
            HostDeviceSource::Pci(addr) => {
                assert_eq!(addr.slot(), "0x02");
                assert_eq!(addr.function(), "0x3");
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn test_unresolved_claim_fails() {
        let spec = claim_spec();
        let resolver = DraMetadataResolver::default();

        let err = create_dra_sriov_host_devices(&spec, &resolver).unwrap_err();
        assert!(err.to_string().contains("metadata not found"));
    }

    #[test]
    fn test_incomplete_claim_request_rejected() {
        let mut spec = claim_spec();
        spec.networks[0].resource_claim.as_mut().unwrap().request_name = None;

        let err = ClaimAddressPool::new(&DraMetadataResolver::default(), &spec).unwrap_err();
        assert!(matches!(err, HostDevError::InvalidConfig { .. }));
    }

    #[test]
    fn test_incomplete_claim_on_non_sriov_network_ignored() {
        let mut spec = claim_spec();
        spec.domain.devices.interfaces.push(Interface {
            name: "net2".to_string(),
            bridge: Some(Default::default()),
            ..Default::default()
        });
        spec.networks.push(Network {
            name: "net2".to_string(),
            resource_claim: Some(ClaimRequest {
                claim_name: Some("bridge-claim".to_string()),
                request_name: None,
            }),
            ..Default::default()
        });
        let resolver = resolver_with("sriov-claim", "vf", "0000:81:02.3");

        let devices = create_dra_sriov_host_devices(&spec, &resolver).unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].alias_name(), Some("sriov-net1"));
    }
}
