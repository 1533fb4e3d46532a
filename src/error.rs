//! Failure taxonomy. There is exactly one way this driver can fail.

use thiserror::Error;

/// Load-time failure surfaced to the host. Detected at the allocation call
/// site and returned immediately; the host treats it as terminal for that
/// load attempt.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    /// The paged pool could not satisfy the registry-path allocation.
    #[error("paged pool exhausted while duplicating the registry path")]
    ResourceExhausted,
}

#[cfg(feature = "kernel")]
impl LoadError {
    /// NTSTATUS handed back to the loader from `DriverEntry`.
    pub fn to_ntstatus(self) -> wdk_sys::NTSTATUS {
        match self {
            Self::ResourceExhausted => wdk_sys::STATUS_NO_MEMORY,
        }
    }
}
