//! Unix kernel entry points, resolved at runtime
//!
//! `sysctl` only exists on the BSDs and macOS (glibc dropped it), while the
//! `sysinfo`/`processor_info` family only exists on Solaris and illumos. Both
//! are looked up in the running process image with `dlsym` on first use and
//! the outcome is kept for the life of the process. `getloadavg` is looked up
//! on its own since nearly every libc has it.

use crate::kernel::{Capabilities, KernelInterface, PROCESSOR_INFO_SIZE};
use libc::{c_char, c_double, c_int, c_long, c_uint, c_void, size_t};
use libloading::os::unix::Library;
use log::{debug, info};
use std::ptr;
use std::sync::OnceLock;

type SysctlFn =
    unsafe extern "C" fn(*mut c_int, c_uint, *mut c_void, *mut size_t, *mut c_void, size_t) -> c_int;
type GetloadavgFn = unsafe extern "C" fn(*mut c_double, c_int) -> c_int;
type ProcessorInfoFn = unsafe extern "C" fn(c_int, *mut c_void) -> c_int;
type SysconfFn = unsafe extern "C" fn(c_int) -> c_long;
type SysinfoFn = unsafe extern "C" fn(c_int, *mut c_char, c_long) -> c_int;

/// The SVR4 system-information family; present only as a whole. glibc
/// exports an unrelated `sysinfo`, so it alone proves nothing.
#[derive(Clone, Copy)]
struct SystemInfoFns {
    processor_info: ProcessorInfoFn,
    sysconf: SysconfFn,
    sysinfo: SysinfoFn,
}

struct Symbols {
    _library: Library,
    sysctl: Option<SysctlFn>,
    getloadavg: Option<GetloadavgFn>,
    system_info: Option<SystemInfoFns>,
}

static SYMBOLS: OnceLock<Symbols> = OnceLock::new();

fn symbols() -> &'static Symbols {
    SYMBOLS.get_or_init(Symbols::probe)
}

/// Look up `name` (NUL-terminated) in `library`.
///
/// # Safety
///
/// `T` must be the correct function pointer type for the symbol.
unsafe fn resolve<T: Copy>(library: &Library, name: &[u8]) -> Option<T> {
    match library.get::<T>(name) {
        Ok(symbol) => Some(*symbol),
        Err(e) => {
            debug!("{} not resolved: {}", String::from_utf8_lossy(&name[..name.len() - 1]), e);
            None
        }
    }
}

impl Symbols {
    fn probe() -> Self {
        let library = Library::this();

        // SAFETY: every type alias above matches the C prototype of the symbol
        // it is used with, and `library` (the process image) outlives the
        // pointers because it is stored next to them in a static.
        let (sysctl, getloadavg, system_info) = unsafe {
            let sysctl = resolve::<SysctlFn>(&library, b"sysctl\0");
            // exported by every mainstream libc, independent of either mechanism
            let getloadavg = resolve::<GetloadavgFn>(&library, b"getloadavg\0");
            let system_info = (|| {
                Some(SystemInfoFns {
                    processor_info: resolve(&library, b"processor_info\0")?,
                    sysconf: resolve(&library, b"sysconf\0")?,
                    sysinfo: resolve(&library, b"sysinfo\0")?,
                })
            })();
            (sysctl, getloadavg, system_info)
        };

        info!(
            "Kernel interface probe: sysctl={}, sysinfo family={}, getloadavg={}",
            sysctl.is_some(),
            system_info.is_some(),
            getloadavg.is_some()
        );

        Self {
            _library: library,
            sysctl,
            getloadavg,
            system_info,
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            control_variables: self.sysctl.is_some(),
            system_info: self.system_info.is_some(),
            load_average: self.getloadavg.is_some(),
        }
    }
}

/// The running kernel, reached through libc
#[derive(Debug, Clone, Copy, Default)]
pub struct LibcKernel;

impl LibcKernel {
    pub fn new() -> Self {
        Self
    }
}

impl KernelInterface for LibcKernel {
    fn capabilities(&self) -> Capabilities {
        symbols().capabilities()
    }

    fn sysctl(&self, mib: &[i32], buf: &mut [u8], len: &mut usize) -> i32 {
        let Some(sysctl) = symbols().sysctl else {
            return -1;
        };
        let mut mib = mib.to_vec();
        let mut size: size_t = (*len).min(buf.len());

        // SAFETY: mib and buf are live for the call and size never exceeds
        // the length of buf; no new value is written.
        let status = unsafe {
            sysctl(
                mib.as_mut_ptr(),
                mib.len() as c_uint,
                buf.as_mut_ptr().cast(),
                &mut size,
                ptr::null_mut(),
                0,
            )
        };
        *len = size;
        status
    }

    fn sysinfo(&self, command: i32, buf: &mut [u8]) -> i64 {
        let Some(fns) = symbols().system_info else {
            return -1;
        };
        // SAFETY: sysinfo writes at most buf.len() bytes
        let status = unsafe { (fns.sysinfo)(command, buf.as_mut_ptr().cast(), buf.len() as c_long) };
        i64::from(status)
    }

    fn sysconf(&self, name: i32) -> i64 {
        let Some(fns) = symbols().system_info else {
            return -1;
        };
        // SAFETY: sysconf takes no pointers
        unsafe { (fns.sysconf)(name) as i64 }
    }

    fn processor_info(&self, processor: i32, buf: &mut [u8; PROCESSOR_INFO_SIZE]) -> i32 {
        let Some(fns) = symbols().system_info else {
            return -1;
        };
        // SAFETY: buf is exactly sizeof(processor_info_t)
        unsafe { (fns.processor_info)(processor, buf.as_mut_ptr().cast()) }
    }

    fn getloadavg(&self, loadavg: &mut [f64; 3]) -> i32 {
        let Some(getloadavg) = symbols().getloadavg else {
            return -1;
        };
        // SAFETY: loadavg holds the 3 samples requested
        unsafe { getloadavg(loadavg.as_mut_ptr(), 3) }
    }
}
