//! Error type for CPU queries

use std::fmt;
use thiserror::Error;

/// Result type alias for sys-cpu operations
pub type Result<T> = std::result::Result<T, CpuError>;

/// Where a failure originated.
///
/// This is informational only: every failure surfaces as a [`CpuError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCause {
    /// Could not open the management namespace
    Connection,
    /// The management service raised a fault during a property or instance call
    ServiceFault,
    /// A kernel system call returned a negative status or was not available
    SystemCall,
    /// Both processor_info indices (0 and 1) failed
    ProcessorInfo,
    /// No backend exists for the running platform
    Unsupported,
    /// Configuration could not be read, parsed or written
    Config,
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCause::Connection => "connection",
            ErrorCause::ServiceFault => "service fault",
            ErrorCause::SystemCall => "system call",
            ErrorCause::ProcessorInfo => "processor info",
            ErrorCause::Unsupported => "unsupported",
            ErrorCause::Config => "config",
        };
        f.write_str(s)
    }
}

/// The single error kind raised by every CPU query
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CpuError {
    cause: ErrorCause,
    message: String,
}

impl CpuError {
    /// Create an error with an explicit cause
    pub fn new(cause: ErrorCause, message: impl Into<String>) -> Self {
        Self {
            cause,
            message: message.into(),
        }
    }

    /// Failure to open a management namespace
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorCause::Connection, message)
    }

    /// Runtime fault reported by the management service
    pub fn service_fault(message: impl Into<String>) -> Self {
        Self::new(ErrorCause::ServiceFault, message)
    }

    /// A failed kernel call, named by its function
    pub fn system_call(function: &str) -> Self {
        Self::new(ErrorCause::SystemCall, format!("{} function failed", function))
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorCause::Unsupported, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCause::Config, message)
    }

    /// Cause tag of this error
    pub fn cause(&self) -> ErrorCause {
        self.cause
    }

    /// Human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for CpuError {
    fn from(err: std::io::Error) -> Self {
        CpuError::config(format!("I/O error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_call_message() {
        let err = CpuError::system_call("sysinfo");
        assert_eq!(err.cause(), ErrorCause::SystemCall);
        assert_eq!(err.to_string(), "sysinfo function failed");
    }

    #[test]
    fn test_message_is_display() {
        let err = CpuError::service_fault("OLE error code:80041002");
        assert_eq!(err.message(), "OLE error code:80041002");
        assert_eq!(format!("{}", err), "OLE error code:80041002");
    }
}
