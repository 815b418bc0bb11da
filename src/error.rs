//! Error types for HostProbe
//!
//! Every fallible operation in the crate returns [`Result`]. The public
//! four-call contract in [`crate::api`] flattens these into plain values
//! (booleans, options, JSON payloads) so nothing escapes to the caller as
//! a panic.

use std::path::PathBuf;
use thiserror::Error;

#[cfg(unix)]
pub use nix::errno::Errno;

/// Stand-in errno type on platforms without a POSIX scheduler.
#[cfg(not(unix))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Errno(pub i32);

#[cfg(not(unix))]
impl Errno {
    /// Operation not permitted
    pub const EPERM: Errno = Errno(1);
    /// No such process
    pub const ESRCH: Errno = Errno(3);
    /// Invalid argument
    pub const EINVAL: Errno = Errno(22);
    /// Function not implemented
    pub const ENOSYS: Errno = Errno(38);
}

#[cfg(not(unix))]
impl std::fmt::Display for Errno {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "errno {}", self.0)
    }
}

#[cfg(not(unix))]
impl std::error::Error for Errno {}

/// Main error type for HostProbe operations
#[derive(Error, Debug)]
pub enum HostProbeError {
    /// A scheduler call (set/get affinity) was rejected by the kernel
    #[error("{operation} failed for thread {tid}: {source}")]
    Scheduler {
        /// Which scheduler call failed
        operation: &'static str,
        /// Kernel thread id the call targeted
        tid: i32,
        /// errno reported by the kernel
        #[source]
        source: Errno,
    },

    /// The Vulkan loader library could not be found or loaded
    #[error("Vulkan loader unavailable: {0}")]
    LoaderUnavailable(String),

    /// vkCreateInstance failed
    #[error("Failed to create Vulkan instance: {0}")]
    InstanceCreation(String),

    /// A query against an already selected device failed
    #[error("Device query failed: {0}")]
    DeviceQuery(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error while reading host topology
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Report serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        /// What was being attempted
        context: String,
        /// Underlying error
        #[source]
        source: Box<HostProbeError>,
    },
}

impl HostProbeError {
    /// Create a scheduler error
    pub fn scheduler(operation: &'static str, tid: i32, source: Errno) -> Self {
        Self::Scheduler {
            operation,
            tid,
            source,
        }
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Raw OS error code carried by this error, if any
    pub fn os_error_code(&self) -> Option<i32> {
        match self {
            #[cfg(unix)]
            Self::Scheduler { source, .. } => Some(*source as i32),
            #[cfg(not(unix))]
            Self::Scheduler { source, .. } => Some(source.0),
            Self::Io { source, .. } => source.raw_os_error(),
            Self::WithContext { source, .. } => source.os_error_code(),
            _ => None,
        }
    }

    /// Check if this error is a permission issue
    pub fn is_permission_error(&self) -> bool {
        match self {
            #[cfg(unix)]
            Self::Scheduler { source, .. } => *source == Errno::EPERM,
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::PermissionDenied,
            Self::WithContext { source, .. } => source.is_permission_error(),
            _ => false,
        }
    }

    /// Whether the failure happened before a usable graphics instance
    /// existed, as opposed to a query against a live instance
    pub fn is_setup_failure(&self) -> bool {
        match self {
            Self::LoaderUnavailable(_) | Self::InstanceCreation(_) | Self::ConfigError(_) => true,
            Self::WithContext { source, .. } => source.is_setup_failure(),
            _ => false,
        }
    }
}

/// Result type alias for HostProbe operations
pub type Result<T> = std::result::Result<T, HostProbeError>;

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| HostProbeError::io(path, e))
    }
}
