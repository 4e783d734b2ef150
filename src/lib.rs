//! # sys-cpu
//!
//! CPU metadata (architecture, clock speed, model, load, processor count)
//! straight from the operating system's own management interfaces.
//!
//! Two backends implement the [`CpuInfo`] facade:
//!
//! - [`ManagementBackend`] reads `Win32_Processor` through WMI, on the local
//!   host or a remote one, and enumerates full [`ProcessorRecord`]s.
//! - [`KernelBackend`] reads the local kernel through `sysctl` (BSD, macOS) or
//!   the `sysinfo`/`processor_info` family (Solaris, illumos), whichever the
//!   running kernel provides.
//!
//! Every call is a single blocking round-trip. Nothing is cached apart from
//! the kernel backend's one-time symbol probe.
//!
//! ## Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cpu = sys_cpu::local()?;
//! println!("{} x {}", cpu.num_cpu()?, cpu.model()?);
//! if let Some(arch) = cpu.architecture()? {
//!     println!("Architecture: {}", arch);
//! }
//! println!("Clock: {} MHz", cpu.frequency(0)?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Remote hosts (Windows)
//!
//! ```ignore
//! use sys_cpu::{platform::windows::WmiService, ManagementBackend};
//!
//! let wmi = ManagementBackend::new(WmiService::new());
//! wmi.each_processor(Some("build-01"), |cpu| {
//!     println!("{:?}: {:?} {:?}", cpu.device_id, cpu.name, cpu.family);
//! })?;
//! ```
//!
//! ## Platform Support
//!
//! | Platform        | Backend    | Mechanism                              |
//! |-----------------|------------|----------------------------------------|
//! | Windows         | Management | WMI `root\cimv2`                       |
//! | FreeBSD, NetBSD, OpenBSD, macOS | Kernel | `sysctl(CTL_HW, ...)`    |
//! | Solaris, illumos | Kernel    | `sysinfo`, `sysconf`, `processor_info`, `getloadavg` |
//! | Linux (glibc ≥ 2.32) | Kernel | `getloadavg` only; other queries fail |

pub mod codes;
pub mod config;
pub mod error;
pub mod kernel;
pub mod management;
pub mod platform;
pub mod record;
pub mod target;

pub use config::Config;
pub use error::{CpuError, ErrorCause, Result};
pub use kernel::{Capabilities, KernelBackend, KernelInterface};
pub use management::{ManagementBackend, ManagementService, Namespace, ServiceFault};
pub use record::{LoadSample, ProcessorRecord, PropertyBag, Value};
pub use target::ConnectionTarget;

/// Which backend answers [`CpuInfo`] queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// WMI (Windows)
    Management,
    /// sysctl / sysinfo (Unix)
    Kernel,
}

impl BackendKind {
    /// Backend compiled for the target platform, if any
    pub const fn current() -> Option<Self> {
        if cfg!(windows) {
            Some(BackendKind::Management)
        } else if cfg!(unix) {
            Some(BackendKind::Kernel)
        } else {
            None
        }
    }
}

/// Queries common to both backends.
///
/// Management-backend calls address the configured default host (or the
/// local host); the kernel backend always reads the local kernel.
pub trait CpuInfo {
    fn kind(&self) -> BackendKind;

    /// Architecture name, or `None` when the platform code is not recognised
    fn architecture(&self) -> Result<Option<String>>;

    /// Clock speed of processor `cpu` in MHz
    fn frequency(&self, cpu: u32) -> Result<u32>;

    /// Load of processor `cpu`; the shape depends on the backend
    fn load_average(&self, cpu: u32) -> Result<Option<LoadSample>>;

    /// Model name
    fn model(&self) -> Result<String>;

    /// Number of processors
    fn num_cpu(&self) -> Result<u32>;
}

/// Backend for the running platform
pub fn local() -> Result<Box<dyn CpuInfo>> {
    #[cfg(windows)]
    {
        let config = Config::load()?;
        Ok(Box::new(ManagementBackend::with_config(
            platform::windows::WmiService::new(),
            &config,
        )))
    }

    #[cfg(unix)]
    {
        Ok(Box::new(KernelBackend::new(platform::unix::LibcKernel::new())))
    }

    #[cfg(not(any(unix, windows)))]
    {
        Err(CpuError::unsupported(
            "CPU queries are not implemented for this platform",
        ))
    }
}
