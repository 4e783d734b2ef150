//! Kernel-interface backend
//!
//! Queries the local kernel through one of two mechanisms:
//!
//! - **control variables**: the BSD-style `sysctl(CTL_HW, ...)` reader
//! - **system information**: the SVR4-style family `sysinfo`, `sysconf`,
//!   `processor_info` and `getloadavg`
//!
//! Which of them the running kernel exposes is probed once (see
//! [`crate::platform::unix`]) and reported through
//! [`KernelInterface::capabilities`]. Control variables are preferred when
//! both are present. `getloadavg` is probed separately: most kernels that
//! lack the SVR4 family still provide it.
//!
//! Raw results land in fixed-size byte buffers and are decoded explicitly:
//! strings are cut at the first NUL and stripped of trailing whitespace,
//! integers are read in host byte order from fixed offsets.

use crate::error::{CpuError, ErrorCause, Result};
use crate::record::LoadSample;
use crate::{BackendKind, CpuInfo};
use log::debug;

/// sysctl top-level identifier for generic hardware/cpu
pub const CTL_HW: i32 = 6;
/// Machine class
pub const HW_MACHINE: i32 = 1;
/// Specific machine model
pub const HW_MODEL: i32 = 2;
/// Number of CPUs
pub const HW_NCPU: i32 = 3;
/// Machine architecture
pub const HW_MACHINE_ARCH: i32 = 12;
/// CPU frequency in Hz
pub const HW_CPU_FREQ: i32 = 15;

/// sysinfo command for the machine (kernel) class
pub const SI_MACHINE: i32 = 5;
/// sysinfo command for the instruction-set architecture
pub const SI_ARCHITECTURE: i32 = 6;
/// sysconf name for the number of online processors
pub const SC_NPROCESSORS_ONLN: i32 = 15;

const ARCHITECTURE_BUF: usize = 64;
const MODEL_BUF: usize = 64;
const MACHINE_BUF: usize = 32;
const FREQUENCY_BUF: usize = 16;
const NCPU_BUF: usize = 4;
const SYSINFO_BUF: usize = 257;

/// Which query mechanisms the running kernel exposes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// `sysctl` resolved
    pub control_variables: bool,
    /// `processor_info`, `sysconf` and `sysinfo` all resolved
    pub system_info: bool,
    /// `getloadavg` resolved
    pub load_average: bool,
}

impl Capabilities {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Raw kernel entry points.
///
/// Each call mirrors its C counterpart: it fills the caller's buffer and
/// returns the C status, negative on failure. Implementations are only called
/// for mechanisms reported by [`capabilities`](Self::capabilities).
pub trait KernelInterface {
    /// Mechanisms available on this kernel; must not change between calls
    fn capabilities(&self) -> Capabilities;

    /// `sysctl(mib, buf, &len, NULL, 0)`. `len` holds the buffer size on entry
    /// and the number of bytes written on return.
    fn sysctl(&self, mib: &[i32], buf: &mut [u8], len: &mut usize) -> i32;

    /// `sysinfo(command, buf, buf.len())`
    fn sysinfo(&self, command: i32, buf: &mut [u8]) -> i64;

    /// `sysconf(name)`
    fn sysconf(&self, name: i32) -> i64;

    /// `processor_info(processor, &info)` into a raw `processor_info_t`
    fn processor_info(&self, processor: i32, buf: &mut [u8; PROCESSOR_INFO_SIZE]) -> i32;

    /// `getloadavg(loadavg, 3)`
    fn getloadavg(&self, loadavg: &mut [f64; 3]) -> i32;
}

/// Size of `processor_info_t`
pub const PROCESSOR_INFO_SIZE: usize = 56;

/// Field layout of `processor_info_t` as `(offset, width)`
mod layout {
    pub const STATE: (usize, usize) = (0, 4);
    pub const PROCESSOR_TYPE: (usize, usize) = (4, 16);
    pub const FPU_TYPES: (usize, usize) = (20, 32);
    pub const CLOCK: (usize, usize) = (52, 4);
}

/// Decoded `processor_info_t`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorInfo {
    pub state: i32,
    pub processor_type: String,
    pub fpu_types: String,
    /// Clock speed in MHz
    pub clock: i32,
}

impl ProcessorInfo {
    pub fn decode(buf: &[u8; PROCESSOR_INFO_SIZE]) -> Self {
        Self {
            state: read_i32(buf, layout::STATE),
            processor_type: trim_c_string(field(buf, layout::PROCESSOR_TYPE)),
            fpu_types: trim_c_string(field(buf, layout::FPU_TYPES)),
            clock: read_i32(buf, layout::CLOCK),
        }
    }
}

fn field(buf: &[u8], (offset, width): (usize, usize)) -> &[u8] {
    &buf[offset..offset + width]
}

fn read_i32(buf: &[u8], at: (usize, usize)) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(field(buf, at));
    i32::from_ne_bytes(raw)
}

/// Decode a C string buffer: stop at the first NUL, drop trailing whitespace
pub fn trim_c_string(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).trim_end().to_string()
}

/// CPU queries against the local kernel
#[derive(Debug)]
pub struct KernelBackend<K> {
    kernel: K,
}

impl<K: KernelInterface> KernelBackend<K> {
    pub fn new(kernel: K) -> Self {
        Self { kernel }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.kernel.capabilities()
    }

    /// Read `CTL_HW.<variable>` into a buffer of `size` bytes
    fn sysctl_raw(&self, variable: i32, size: usize) -> Result<Vec<u8>> {
        debug!("sysctl CTL_HW.{} ({} bytes)", variable, size);
        let mut buf = vec![0u8; size];
        let mut len = size;
        if self.kernel.sysctl(&[CTL_HW, variable], &mut buf, &mut len) < 0 {
            return Err(CpuError::system_call("sysctl"));
        }
        buf.truncate(len.min(size));
        Ok(buf)
    }

    fn sysctl_string(&self, variable: i32, size: usize) -> Result<String> {
        Ok(trim_c_string(&self.sysctl_raw(variable, size)?))
    }

    fn sysinfo_string(&self, command: i32) -> Result<String> {
        debug!("sysinfo command {}", command);
        let mut buf = vec![0u8; SYSINFO_BUF];
        if self.kernel.sysinfo(command, &mut buf) < 0 {
            return Err(CpuError::system_call("sysinfo"));
        }
        Ok(trim_c_string(&buf))
    }

    /// processor_info for processor 0, then processor 1. Kernels disagree on
    /// whether processor ids start at 0 or 1.
    fn processor_info(&self) -> Result<ProcessorInfo> {
        let mut buf = [0u8; PROCESSOR_INFO_SIZE];
        for id in [0, 1] {
            buf.fill(0);
            if self.kernel.processor_info(id, &mut buf) >= 0 {
                return Ok(ProcessorInfo::decode(&buf));
            }
            debug!("processor_info({}) failed", id);
        }
        Err(CpuError::new(
            ErrorCause::ProcessorInfo,
            "processor_info function failed",
        ))
    }

    fn unavailable(&self, control: &str, fallback: &str) -> CpuError {
        CpuError::new(
            ErrorCause::SystemCall,
            format!("neither {} nor {} is available", control, fallback),
        )
    }

    /// Machine architecture, e.g. `amd64` or `sparc`
    pub fn architecture(&self) -> Result<String> {
        let caps = self.capabilities();
        if caps.control_variables {
            self.sysctl_string(HW_MACHINE_ARCH, ARCHITECTURE_BUF)
        } else if caps.system_info {
            self.sysinfo_string(SI_ARCHITECTURE)
        } else {
            Err(self.unavailable("sysctl", "sysinfo"))
        }
    }

    /// Number of processors
    pub fn num_cpu(&self) -> Result<u32> {
        let caps = self.capabilities();
        if caps.control_variables {
            let buf = self.sysctl_raw(HW_NCPU, NCPU_BUF)?;
            Ok(buf.first().copied().map_or(0, u32::from))
        } else if caps.system_info {
            let num = self.kernel.sysconf(SC_NPROCESSORS_ONLN);
            if num < 0 {
                return Err(CpuError::system_call("sysconf"));
            }
            u32::try_from(num).map_err(|_| CpuError::system_call("sysconf"))
        } else {
            Err(self.unavailable("sysctl", "sysconf"))
        }
    }

    /// Machine class, e.g. `amd64` or `sun4u`
    pub fn machine_class(&self) -> Result<String> {
        let caps = self.capabilities();
        if caps.control_variables {
            self.sysctl_string(HW_MACHINE, MACHINE_BUF)
        } else if caps.system_info {
            self.sysinfo_string(SI_MACHINE)
        } else {
            Err(self.unavailable("sysctl", "sysinfo"))
        }
    }

    /// CPU model string
    pub fn model(&self) -> Result<String> {
        let caps = self.capabilities();
        if caps.control_variables {
            self.sysctl_string(HW_MODEL, MODEL_BUF)
        } else if caps.system_info {
            Ok(self.processor_info()?.processor_type)
        } else {
            Err(self.unavailable("sysctl", "processor_info"))
        }
    }

    /// CPU frequency in MHz
    pub fn frequency(&self) -> Result<u32> {
        let caps = self.capabilities();
        if caps.control_variables {
            let buf = self.sysctl_raw(HW_CPU_FREQ, FREQUENCY_BUF)?;
            let mut raw = [0u8; 4];
            let n = buf.len().min(4);
            raw[..n].copy_from_slice(&buf[..n]);
            Ok(u32::from_ne_bytes(raw) / 1_000_000)
        } else if caps.system_info {
            let clock = self.processor_info()?.clock;
            u32::try_from(clock).map_err(|_| {
                CpuError::new(
                    ErrorCause::ProcessorInfo,
                    format!("processor_info reported clock {}", clock),
                )
            })
        } else {
            Err(self.unavailable("sysctl", "processor_info"))
        }
    }

    /// 1, 5 and 15 minute load averages.
    ///
    /// Returns `Ok(None)` rather than an error when `getloadavg` is not
    /// available; every other query fails when its mechanism is missing.
    pub fn load_average(&self) -> Result<Option<[f64; 3]>> {
        if !self.capabilities().load_average {
            return Ok(None);
        }
        let mut loadavg = [0f64; 3];
        if self.kernel.getloadavg(&mut loadavg) < 0 {
            return Err(CpuError::system_call("getloadavg"));
        }
        Ok(Some(loadavg))
    }
}

impl<K: KernelInterface> CpuInfo for KernelBackend<K> {
    fn kind(&self) -> BackendKind {
        BackendKind::Kernel
    }

    fn architecture(&self) -> Result<Option<String>> {
        Ok(Some(KernelBackend::architecture(self)?).filter(|arch| !arch.is_empty()))
    }

    /// The kernel reports one clock for the whole package; `cpu` is ignored.
    fn frequency(&self, _cpu: u32) -> Result<u32> {
        KernelBackend::frequency(self)
    }

    fn load_average(&self, _cpu: u32) -> Result<Option<LoadSample>> {
        Ok(KernelBackend::load_average(self)?.map(LoadSample::Averages))
    }

    fn model(&self) -> Result<String> {
        KernelBackend::model(self)
    }

    fn num_cpu(&self) -> Result<u32> {
        KernelBackend::num_cpu(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory kernel recording every call it receives
    #[derive(Default)]
    struct FakeKernel {
        caps: Capabilities,
        sysctl: HashMap<i32, Vec<u8>>,
        sysinfo: HashMap<i32, Vec<u8>>,
        online: i64,
        /// processor ids that answer processor_info
        processors: HashMap<i32, (String, i32)>,
        loadavg: Option<[f64; 3]>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeKernel {
        fn control_variables() -> Self {
            let mut kernel = Self {
                caps: Capabilities {
                    control_variables: true,
                    system_info: false,
                    load_average: true,
                },
                loadavg: Some([1.5, 1.25, 0.5]),
                ..Self::default()
            };
            let mut arch = b"x86".to_vec();
            arch.resize(64, 0);
            kernel.sysctl.insert(HW_MACHINE_ARCH, arch);
            kernel.sysctl.insert(HW_NCPU, vec![4, 0, 0, 0]);
            kernel.sysctl.insert(HW_MACHINE, b"amd64\0".to_vec());
            kernel
                .sysctl
                .insert(HW_MODEL, b"Intel(R) Core(TM) i5-7500 CPU @ 3.40GHz  \0\0".to_vec());
            kernel
                .sysctl
                .insert(HW_CPU_FREQ, 3_400_000_000u32.to_ne_bytes().to_vec());
            kernel
        }

        fn system_info() -> Self {
            let mut kernel = Self {
                caps: Capabilities {
                    control_variables: false,
                    system_info: true,
                    load_average: true,
                },
                online: 8,
                loadavg: Some([0.25, 0.5, 0.75]),
                ..Self::default()
            };
            kernel.sysinfo.insert(SI_ARCHITECTURE, b"sparc\0".to_vec());
            kernel.sysinfo.insert(SI_MACHINE, b"sun4u\0".to_vec());
            kernel.processors.insert(0, ("sparcv9".to_string(), 1200));
            kernel
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn record(&self, call: String) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl KernelInterface for FakeKernel {
        fn capabilities(&self) -> Capabilities {
            self.caps
        }

        fn sysctl(&self, mib: &[i32], buf: &mut [u8], len: &mut usize) -> i32 {
            assert_eq!(mib[0], CTL_HW);
            self.record(format!("sysctl({})", mib[1]));
            match self.sysctl.get(&mib[1]) {
                Some(value) => {
                    let n = value.len().min(*len);
                    buf[..n].copy_from_slice(&value[..n]);
                    *len = n;
                    0
                }
                None => -1,
            }
        }

        fn sysinfo(&self, command: i32, buf: &mut [u8]) -> i64 {
            self.record(format!("sysinfo({})", command));
            match self.sysinfo.get(&command) {
                Some(value) => {
                    buf[..value.len()].copy_from_slice(value);
                    value.len() as i64
                }
                None => -1,
            }
        }

        fn sysconf(&self, name: i32) -> i64 {
            self.record(format!("sysconf({})", name));
            self.online
        }

        fn processor_info(&self, processor: i32, buf: &mut [u8; PROCESSOR_INFO_SIZE]) -> i32 {
            self.record(format!("processor_info({})", processor));
            match self.processors.get(&processor) {
                Some((kind, clock)) => {
                    buf[0..4].copy_from_slice(&1i32.to_ne_bytes());
                    buf[4..4 + kind.len()].copy_from_slice(kind.as_bytes());
                    buf[20..25].copy_from_slice(b"sparc");
                    buf[52..56].copy_from_slice(&clock.to_ne_bytes());
                    0
                }
                None => -1,
            }
        }

        fn getloadavg(&self, loadavg: &mut [f64; 3]) -> i32 {
            self.record("getloadavg".to_string());
            match self.loadavg {
                Some(values) => {
                    *loadavg = values;
                    3
                }
                None => -1,
            }
        }
    }

    #[test]
    fn test_trim_c_string() {
        let mut buf = b"x86".to_vec();
        buf.resize(64, 0);
        assert_eq!(trim_c_string(&buf), "x86");
        assert_eq!(trim_c_string(b"amd64 \t\n\0junk"), "amd64");
        assert_eq!(trim_c_string(&[0u8; 16]), "");
        assert_eq!(trim_c_string(b"no terminator"), "no terminator");
    }

    #[test]
    fn test_decode_processor_info() {
        let mut buf = [0u8; PROCESSOR_INFO_SIZE];
        buf[0..4].copy_from_slice(&2i32.to_ne_bytes());
        buf[4..11].copy_from_slice(b"sparcv9");
        buf[20..28].copy_from_slice(b"sparcv9 ");
        buf[52..56].copy_from_slice(&1593i32.to_ne_bytes());

        let info = ProcessorInfo::decode(&buf);
        assert_eq!(info.state, 2);
        assert_eq!(info.processor_type, "sparcv9");
        assert_eq!(info.fpu_types, "sparcv9");
        assert_eq!(info.clock, 1593);
    }

    #[test]
    fn test_control_variable_path() {
        let backend = KernelBackend::new(FakeKernel::control_variables());
        assert_eq!(backend.architecture().unwrap(), "x86");
        assert_eq!(backend.num_cpu().unwrap(), 4);
        assert_eq!(backend.machine_class().unwrap(), "amd64");
        assert_eq!(
            backend.model().unwrap(),
            "Intel(R) Core(TM) i5-7500 CPU @ 3.40GHz"
        );
        assert_eq!(backend.frequency().unwrap(), 3400);

        let calls = backend.kernel.calls();
        assert!(calls.iter().all(|c| c.starts_with("sysctl")), "{:?}", calls);
    }

    #[test]
    fn test_load_average_without_processor_info() {
        // BSD, macOS and Linux: getloadavg exists, the SVR4 family does not
        let backend = KernelBackend::new(FakeKernel::control_variables());
        assert!(!backend.capabilities().system_info);
        assert_eq!(backend.load_average().unwrap(), Some([1.5, 1.25, 0.5]));
        assert_eq!(backend.kernel.calls(), vec!["getloadavg"]);

        let cpu: &dyn CpuInfo = &backend;
        assert_eq!(
            cpu.load_average(0).unwrap(),
            Some(LoadSample::Averages([1.5, 1.25, 0.5]))
        );
    }

    #[test]
    fn test_load_average_missing() {
        let mut kernel = FakeKernel::system_info();
        kernel.caps.load_average = false;
        let backend = KernelBackend::new(kernel);
        assert_eq!(backend.load_average().unwrap(), None);
        assert!(backend.kernel.calls().is_empty());
    }

    #[test]
    fn test_control_variables_preferred() {
        let mut kernel = FakeKernel::system_info();
        kernel.caps.control_variables = true;
        kernel.sysctl.insert(HW_MACHINE, b"i386\0".to_vec());
        let backend = KernelBackend::new(kernel);
        assert_eq!(backend.machine_class().unwrap(), "i386");
        assert_eq!(backend.kernel.calls(), vec!["sysctl(1)"]);
    }

    #[test]
    fn test_sysctl_failure() {
        let mut kernel = FakeKernel::control_variables();
        kernel.sysctl.remove(&HW_CPU_FREQ);
        let backend = KernelBackend::new(kernel);
        let err = backend.frequency().unwrap_err();
        assert_eq!(err.cause(), ErrorCause::SystemCall);
        assert_eq!(err.message(), "sysctl function failed");
    }

    #[test]
    fn test_system_info_path() {
        let backend = KernelBackend::new(FakeKernel::system_info());
        assert_eq!(backend.architecture().unwrap(), "sparc");
        assert_eq!(backend.num_cpu().unwrap(), 8);
        assert_eq!(backend.machine_class().unwrap(), "sun4u");
        assert_eq!(backend.model().unwrap(), "sparcv9");
        assert_eq!(backend.frequency().unwrap(), 1200);
        assert_eq!(backend.load_average().unwrap(), Some([0.25, 0.5, 0.75]));

        let calls = backend.kernel.calls();
        assert!(!calls.iter().any(|c| c.starts_with("sysctl")), "{:?}", calls);
    }

    #[test]
    fn test_processor_info_index_zero_first() {
        let backend = KernelBackend::new(FakeKernel::system_info());
        backend.model().unwrap();
        assert_eq!(backend.kernel.calls(), vec!["processor_info(0)"]);
    }

    #[test]
    fn test_processor_info_falls_back_to_one() {
        let mut kernel = FakeKernel::system_info();
        let cpu = kernel.processors.remove(&0).unwrap();
        kernel.processors.insert(1, cpu);
        let backend = KernelBackend::new(kernel);

        assert_eq!(backend.frequency().unwrap(), 1200);
        assert_eq!(
            backend.kernel.calls(),
            vec!["processor_info(0)", "processor_info(1)"]
        );
    }

    #[test]
    fn test_processor_info_both_fail() {
        let mut kernel = FakeKernel::system_info();
        kernel.processors.clear();
        let backend = KernelBackend::new(kernel);

        let err = backend.model().unwrap_err();
        assert_eq!(err.cause(), ErrorCause::ProcessorInfo);
        assert_eq!(err.message(), "processor_info function failed");
        assert!(backend.frequency().is_err());
    }

    #[test]
    fn test_sysinfo_and_sysconf_failures() {
        let mut kernel = FakeKernel::system_info();
        kernel.sysinfo.clear();
        kernel.online = -1;
        kernel.loadavg = None;
        let backend = KernelBackend::new(kernel);

        assert_eq!(
            backend.architecture().unwrap_err().message(),
            "sysinfo function failed"
        );
        assert_eq!(
            backend.num_cpu().unwrap_err().message(),
            "sysconf function failed"
        );
        assert_eq!(
            backend.load_average().unwrap_err().message(),
            "getloadavg function failed"
        );
    }

    #[test]
    fn test_no_mechanism() {
        let backend = KernelBackend::new(FakeKernel::default());
        assert_eq!(backend.capabilities(), Capabilities::none());
        for err in [
            backend.architecture().unwrap_err(),
            backend.machine_class().unwrap_err(),
            backend.model().unwrap_err(),
        ] {
            assert_eq!(err.cause(), ErrorCause::SystemCall);
        }
        assert!(backend.num_cpu().is_err());
        assert!(backend.frequency().is_err());
        // load average is the one query that reports absence instead
        assert_eq!(backend.load_average().unwrap(), None);
        assert!(backend.kernel.calls().is_empty());
    }

    #[test]
    fn test_cpu_info_facade() {
        let backend = KernelBackend::new(FakeKernel::system_info());
        let cpu: &dyn CpuInfo = &backend;
        assert_eq!(cpu.kind(), BackendKind::Kernel);
        assert_eq!(cpu.num_cpu().unwrap(), 8);
        assert_eq!(cpu.architecture().unwrap().as_deref(), Some("sparc"));
        assert_eq!(
            cpu.load_average(0).unwrap(),
            Some(LoadSample::Averages([0.25, 0.5, 0.75]))
        );
    }

    #[test]
    fn test_empty_architecture_is_none() {
        let mut kernel = FakeKernel::control_variables();
        kernel.sysctl.insert(HW_MACHINE_ARCH, vec![0; 64]);
        let backend = KernelBackend::new(kernel);
        assert_eq!(CpuInfo::architecture(&backend).unwrap(), None);
    }
}
