//! Management-instrumentation backend
//!
//! Reads `Win32_Processor` and `Win32_ComputerSystem` objects from a WMI
//! namespace on a local or remote host. Every query opens its own connection;
//! nothing is cached and nothing is retried. Connection failures and faults
//! raised by the service are translated into [`CpuError`] carrying the
//! service's message.
//!
//! The service itself is reached through [`ManagementService`], implemented by
//! [`crate::platform::windows::WmiService`] on Windows.

use crate::config::Config;
use crate::error::{CpuError, Result};
use crate::record::{LoadSample, ProcessorRecord, PropertyBag, Value};
use crate::target::{ConnectionTarget, DEFAULT_NAMESPACE};
use crate::{codes, BackendKind, CpuInfo};
use log::debug;
use thiserror::Error;

/// Class enumerated by [`ManagementBackend::processors`]
pub const PROCESSOR_CLASS: &str = "Win32_Processor";

/// A runtime fault raised by the management service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ServiceFault(pub String);

impl ServiceFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Sequence of instances produced by [`Namespace::instances_of`]
pub type Instances<'a> =
    Box<dyn Iterator<Item = std::result::Result<PropertyBag, ServiceFault>> + 'a>;

/// Entry point of a management-instrumentation service
pub trait ManagementService {
    type Namespace: Namespace;

    /// Open a namespace, e.g. `\\host\root\cimv2`
    fn connect(&self, namespace_path: &str) -> std::result::Result<Self::Namespace, ServiceFault>;
}

/// An open namespace
pub trait Namespace {
    /// Read all properties of the object at `object_path`
    fn get_object(&self, object_path: &str) -> std::result::Result<PropertyBag, ServiceFault>;

    /// Enumerate the instances of `class` in service order
    fn instances_of(&self, class: &str) -> std::result::Result<Instances<'_>, ServiceFault>;
}

/// CPU queries against a management-instrumentation service
#[derive(Debug)]
pub struct ManagementBackend<S> {
    service: S,
    namespace: String,
    default_host: Option<String>,
}

impl<S: ManagementService> ManagementBackend<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            namespace: DEFAULT_NAMESPACE.to_string(),
            default_host: None,
        }
    }

    /// Apply namespace and default host from `config`
    pub fn with_config(service: S, config: &Config) -> Self {
        Self {
            service,
            namespace: config.management.namespace.clone(),
            default_host: config.management.default_host.clone(),
        }
    }

    fn target(&self, host: Option<&str>, cpu: Option<u32>) -> ConnectionTarget {
        ConnectionTarget::resolve(host.or(self.default_host.as_deref()), cpu)
    }

    fn open(&self, target: &ConnectionTarget, object_path: Option<&str>) -> Result<S::Namespace> {
        let moniker = target.moniker(&self.namespace, object_path);
        debug!("Connecting to {}", moniker);
        self.service
            .connect(&target.namespace_path(&self.namespace))
            .map_err(|fault| {
                CpuError::connection(format!("failed to connect to {}: {}", moniker, fault))
            })
    }

    fn object(&self, target: &ConnectionTarget, object_path: &str) -> Result<PropertyBag> {
        let namespace = self.open(target, Some(object_path))?;
        namespace.get_object(object_path).map_err(|fault| {
            CpuError::service_fault(format!(
                "{}: {}",
                target.moniker(&self.namespace, Some(object_path)),
                fault
            ))
        })
    }

    fn processor(&self, host: Option<&str>, cpu: Option<u32>) -> Result<(ConnectionTarget, PropertyBag)> {
        let target = self.target(host, cpu);
        let props = self.object(&target, &target.processor_path())?;
        Ok((target, props))
    }

    fn required<'a>(
        &self,
        target: &ConnectionTarget,
        object_path: &str,
        props: &'a PropertyBag,
        name: &str,
    ) -> Result<&'a Value> {
        props.value(name).ok_or_else(|| {
            CpuError::service_fault(format!(
                "{}: property {} is not set",
                target.moniker(&self.namespace, Some(object_path)),
                name
            ))
        })
    }

    fn required_u32(
        &self,
        target: &ConnectionTarget,
        object_path: &str,
        props: &PropertyBag,
        name: &str,
    ) -> Result<u32> {
        let value = self.required(target, object_path, props, name)?;
        value.as_u32().ok_or_else(|| {
            CpuError::service_fault(format!("{} is not an integer: {:?}", name, value))
        })
    }

    fn required_string(
        &self,
        target: &ConnectionTarget,
        object_path: &str,
        props: &PropertyBag,
        name: &str,
    ) -> Result<String> {
        let value = self.required(target, object_path, props, name)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CpuError::service_fault(format!("{} is not a string: {:?}", name, value)))
    }

    /// Architecture of processor 0, or `None` when the code is not recognised
    pub fn architecture(&self, host: Option<&str>) -> Result<Option<String>> {
        let (_, props) = self.processor(host, None)?;
        Ok(props
            .value("Architecture")
            .and_then(Value::as_u32)
            .and_then(codes::architecture)
            .map(str::to_string))
    }

    /// Current clock speed of processor `cpu` in MHz
    pub fn frequency(&self, cpu: Option<u32>, host: Option<&str>) -> Result<u32> {
        let (target, props) = self.processor(host, cpu)?;
        self.required_u32(&target, &target.processor_path(), &props, "CurrentClockSpeed")
    }

    /// Load percentage of processor `cpu`, averaged over the last second.
    /// `None` when the service does not report it.
    pub fn load_average(&self, cpu: Option<u32>, host: Option<&str>) -> Result<Option<u16>> {
        let (_, props) = self.processor(host, cpu)?;
        Ok(props.value("LoadPercentage").and_then(Value::as_u16))
    }

    /// Model name of processor 0, e.g. `Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz`
    pub fn model(&self, host: Option<&str>) -> Result<String> {
        let (target, props) = self.processor(host, None)?;
        self.required_string(&target, &target.processor_path(), &props, "Name")
    }

    /// Manufacturer id of processor 0, e.g. `GenuineIntel`
    pub fn processor_type(&self, host: Option<&str>) -> Result<String> {
        let (target, props) = self.processor(host, None)?;
        self.required_string(&target, &target.processor_path(), &props, "Manufacturer")
    }

    /// Number of processors reported by the computer-system object
    pub fn num_cpu(&self, host: Option<&str>) -> Result<u32> {
        let target = self.target(host, None);
        let path = target.computer_system_path();
        let props = self.object(&target, &path)?;
        self.required_u32(&target, &path, &props, "NumberOfProcessors")
    }

    /// Call `f` once per processor, in the order the service returns them.
    ///
    /// A fault part-way through stops the enumeration and is returned.
    pub fn each_processor<F>(&self, host: Option<&str>, mut f: F) -> Result<()>
    where
        F: FnMut(ProcessorRecord),
    {
        let target = self.target(host, None);
        let moniker = target.moniker(&self.namespace, None);
        let namespace = self.open(&target, None)?;

        debug!("Enumerating {} on {}", PROCESSOR_CLASS, target.host);
        let fault = |fault: ServiceFault| {
            CpuError::service_fault(format!("{} ({}): {}", moniker, PROCESSOR_CLASS, fault))
        };

        for instance in namespace.instances_of(PROCESSOR_CLASS).map_err(fault)? {
            let props = instance.map_err(fault)?;
            f(ProcessorRecord::from_properties(&props));
        }
        Ok(())
    }

    /// All processors on `host`. Either every record or an error.
    pub fn processors(&self, host: Option<&str>) -> Result<Vec<ProcessorRecord>> {
        let mut records = Vec::new();
        self.each_processor(host, |record| records.push(record))?;
        Ok(records)
    }
}

impl<S: ManagementService> CpuInfo for ManagementBackend<S> {
    fn kind(&self) -> BackendKind {
        BackendKind::Management
    }

    fn architecture(&self) -> Result<Option<String>> {
        ManagementBackend::architecture(self, None)
    }

    fn frequency(&self, cpu: u32) -> Result<u32> {
        ManagementBackend::frequency(self, Some(cpu), None)
    }

    fn load_average(&self, cpu: u32) -> Result<Option<LoadSample>> {
        Ok(ManagementBackend::load_average(self, Some(cpu), None)?.map(LoadSample::Percentage))
    }

    fn model(&self) -> Result<String> {
        ManagementBackend::model(self, None)
    }

    fn num_cpu(&self) -> Result<u32> {
        ManagementBackend::num_cpu(self, None)
    }
}
