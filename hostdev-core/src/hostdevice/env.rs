//! Environment snapshot read by the address pools.
//!
//! Device plugins publish assigned addresses through environment variables.
//! Pools never read the process environment directly; they are handed a
//! snapshot taken once per build.

/// Ordered, read-only copy of environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: Vec<(String, String)>,
}

impl EnvSnapshot {
    /// Snapshot the current process environment.
    ///
    /// Variables whose name or value is not valid unicode are skipped.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    /// Build a snapshot from explicit pairs, keeping their order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self { vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }

    /// Value of the first variable named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// Variables whose name starts with `prefix`, in snapshot order.
    pub fn with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.vars
            .iter()
            .filter(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Environment variable name carrying a device-plugin resource's addresses.
///
/// The resource name is upper-cased and `/` and `.` become `_`:
/// `intel.com/sriov_net` -> `PCIDEVICE_INTEL_COM_SRIOV_NET`.
pub fn resource_name_to_env_var(prefix: &str, resource_name: &str) -> String {
    let name = resource_name.to_uppercase().replace(['/', '.'], "_");
    format!("{}_{}", prefix, name)
}

/// Split a comma-separated address list.
///
/// Entries are trimmed of surrounding whitespace. Entries that are empty
/// after trimming (trailing comma, blank value) are not addresses.
pub fn split_address_list(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}
