//! Platform-specific collaborators for the query backends

#[cfg(unix)]
pub mod unix;

#[cfg(windows)]
pub mod windows;
