//! One-shot device capability probe
//!
//! Creates an instance, takes the first physical device in platform order,
//! reads everything into a [`CapabilityReport`] and drops the instance
//! before returning. Failures become data in the [`ProbeResponse`].

use crate::config::ProbeConfig;
use crate::error::Result;
use crate::gpu::backend::{GraphicsBackend, GraphicsInstance, VulkanBackend};
use crate::gpu::report::{CapabilityReport, ProbeResponse};
use tracing::{debug, warn};

/// Runs the probe protocol against a backend
#[derive(Debug, Clone)]
pub struct DeviceProber<B: GraphicsBackend = VulkanBackend> {
    backend: B,
    config: ProbeConfig,
}

impl DeviceProber<VulkanBackend> {
    /// Prober for the system Vulkan loader
    pub fn new(config: ProbeConfig) -> Self {
        Self::with_backend(VulkanBackend, config)
    }
}

impl<B: GraphicsBackend> DeviceProber<B> {
    /// Prober over a custom backend
    pub fn with_backend(backend: B, config: ProbeConfig) -> Self {
        Self { backend, config }
    }

    /// Configuration in use
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Probe the first device
    pub fn probe(&self) -> ProbeResponse {
        match self.collect() {
            Ok(Some(report)) => {
                debug!(
                    device = %report.physical_device_name,
                    extensions = report.device_extensions.len(),
                    "Probed device capabilities"
                );
                ProbeResponse::success(report)
            }
            Ok(None) => {
                debug!("Instance reports no physical devices");
                ProbeResponse::no_devices()
            }
            Err(e) if e.is_setup_failure() => {
                warn!(error = %e, "Graphics API unavailable");
                ProbeResponse::unsupported(e.to_string())
            }
            Err(e) => {
                warn!(error = %e, "Device query failed after instance creation");
                ProbeResponse::failed_after_setup(e.to_string())
            }
        }
    }

    /// Create an instance, read the first device and release the instance
    fn collect(&self) -> Result<Option<CapabilityReport>> {
        let application_name = self.config.application_name_cstr()?;
        let instance = self
            .backend
            .create_instance(&application_name, self.config.api_version.packed())?;
        collect_report(&instance)
    }

    /// Probe the first device and serialize the result
    pub fn probe_json(&self) -> String {
        self.probe().to_json()
    }
}

fn collect_report<I: GraphicsInstance>(instance: &I) -> Result<Option<CapabilityReport>> {
    let devices = instance.physical_devices()?;
    let Some(&device) = devices.first() else {
        return Ok(None);
    };
    debug!(count = devices.len(), selected = ?device, "Enumerated physical devices");

    let snapshot = instance
        .snapshot(device)
        .map_err(|e| e.with_context(format!("reading device {:?}", device)))?;
    let instance_extensions = instance.instance_extensions()?;
    Ok(Some(CapabilityReport::from_snapshot(
        snapshot,
        instance_extensions,
    )))
}
