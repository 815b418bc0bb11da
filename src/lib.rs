//! # HostProbe - Thread Affinity and GPU Capability Probing
//!
//! HostProbe exposes two host capabilities a benchmark harness needs before
//! it starts measuring: pinning the calling thread to CPU cores, and a
//! one-shot description of the first Vulkan device as JSON.
//!
//! ## Features
//!
//! - **Thread Affinity**: Pin, query and reset the calling thread's CPU mask
//! - **big.LITTLE Topology**: Classify cores by max frequency from sysfs
//! - **Device Probing**: Properties, memory heaps and types, extensions and
//!   every Vulkan 1.0 feature flag of the first physical device
//! - **Failure as Data**: A missing driver or device still yields valid JSON
//!
//! ## Quick Start
//!
//! ```no_run
//! use hostprobe::api;
//!
//! if api::set_affinity(2) {
//!     println!("Now running on {:?}", api::get_affinity());
//! }
//! api::reset_affinity();
//!
//! println!("{}", api::probe_device_capabilities());
//! ```
//!
//! ## Pinning to Big Cores
//!
//! ```no_run
//! use hostprobe::config::ProbeConfig;
//! use hostprobe::system::{AffinityController, CoreTopology};
//!
//! let config = ProbeConfig::default();
//! let topology = CoreTopology::detect(&config);
//! topology.print_summary();
//!
//! let controller = AffinityController::current_thread();
//! if !controller.pin_to_big_cores(&topology) {
//!     eprintln!("pinning failed: {:?}", controller.last_os_error());
//! }
//! ```
//!
//! ## Typed Device Report
//!
//! ```no_run
//! use hostprobe::config::ProbeConfig;
//! use hostprobe::gpu::DeviceProber;
//!
//! let response = DeviceProber::new(ProbeConfig::default()).probe();
//! if let Some(report) = &response.report {
//!     report.print_summary();
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod error;
pub mod gpu;
pub mod system;

// Re-export commonly used types
pub use config::ProbeConfig;
pub use error::{HostProbeError, Result};
pub use gpu::{CapabilityReport, DeviceProber, ProbeResponse};
pub use system::{AffinityController, AffinityMask, CoreTopology};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use hostprobe::prelude::*;
    //! ```

    pub use crate::api::{get_affinity, probe_device_capabilities, reset_affinity, set_affinity};
    pub use crate::config::{ApiBaseline, ProbeConfig};
    pub use crate::error::{HostProbeError, Result};
    pub use crate::gpu::{CapabilityReport, DeviceProber, FeatureSet, ProbeResponse};
    pub use crate::system::{AffinityController, AffinityMask, CoreClass, CoreTopology, ThreadTarget};
}
