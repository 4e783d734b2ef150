//! Addressing of processor objects on a (possibly remote) host

use log::warn;

/// Namespace holding the Win32 hardware classes
pub const DEFAULT_NAMESPACE: &str = "root\\cimv2";

/// Moniker prefix used in log lines and error messages
const MONIKER_PREFIX: &str = "winmgmts:{impersonationLevel=impersonate}";

/// Name of the local host, or `"."` (the WMI alias for the local machine)
/// when it cannot be resolved
pub fn local_hostname() -> String {
    match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            warn!("Could not resolve local host name, using \".\": {}", e);
            ".".to_string()
        }
    }
}

/// A host plus a zero-based processor index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub cpu: u32,
}

impl ConnectionTarget {
    pub fn new(host: impl Into<String>, cpu: u32) -> Self {
        Self {
            host: host.into(),
            cpu,
        }
    }

    /// Fill in defaults for an optional host (the local host) and processor
    /// index (0)
    pub fn resolve(host: Option<&str>, cpu: Option<u32>) -> Self {
        let host = host.map(str::to_string).unwrap_or_else(local_hostname);
        Self::new(host, cpu.unwrap_or(0))
    }

    /// Network path of `namespace` on this host, e.g. `\\srv01\root\cimv2`
    pub fn namespace_path(&self, namespace: &str) -> String {
        format!("\\\\{}\\{}", self.host, namespace)
    }

    /// Object path of this target's processor
    pub fn processor_path(&self) -> String {
        format!("Win32_Processor.DeviceID='CPU{}'", self.cpu)
    }

    /// Object path of the host's computer-system object
    pub fn computer_system_path(&self) -> String {
        format!("Win32_ComputerSystem.Name='{}'", self.host)
    }

    /// Full moniker for an object path (or the bare namespace when `None`)
    pub fn moniker(&self, namespace: &str, object_path: Option<&str>) -> String {
        let namespace = namespace.replace('\\', "/");
        match object_path {
            Some(path) => format!("{}//{}/{}:{}", MONIKER_PREFIX, self.host, namespace, path),
            None => format!("{}//{}/{}", MONIKER_PREFIX, self.host, namespace),
        }
    }
}
