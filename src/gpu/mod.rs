//! Graphics device capability probing
//!
//! Enumerates the first Vulkan physical device and reports its properties,
//! memory layout, extensions and Vulkan 1.0 feature flags as JSON.

pub mod backend;
pub mod features;
pub mod probe;
pub mod report;
pub mod version;

pub use backend::{DeviceSnapshot, GraphicsBackend, GraphicsInstance, VulkanBackend, VulkanInstance};
pub use features::{FeatureSet, FEATURE_TABLE};
pub use probe::DeviceProber;
pub use report::{CapabilityReport, DeviceType, ProbeResponse, NO_DEVICES_FOUND};
pub use version::{ApiVersion, DriverVersion, Vendor};
