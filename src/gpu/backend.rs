//! Graphics driver access
//!
//! [`GraphicsBackend`] creates a transient instance; the instance type owns
//! the native handle and releases it in `Drop`, so every exit path of a
//! probe tears it down. [`VulkanBackend`] is the real implementation on top
//! of a runtime-loaded Vulkan loader.

use crate::error::{HostProbeError, Result};
use crate::gpu::report::fixed_str;
use ash::vk;
use std::ffi::CStr;
use tracing::debug;

/// Raw driver data for one physical device
#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    /// vkGetPhysicalDeviceProperties
    pub properties: vk::PhysicalDeviceProperties,
    /// vkGetPhysicalDeviceMemoryProperties
    pub memory: vk::PhysicalDeviceMemoryProperties,
    /// vkGetPhysicalDeviceFeatures
    pub features: vk::PhysicalDeviceFeatures,
    /// vkEnumerateDeviceExtensionProperties
    pub device_extensions: Vec<String>,
}

/// Entry point to a graphics driver stack
pub trait GraphicsBackend {
    /// Live instance; dropping it releases the native handle
    type Instance: GraphicsInstance;

    /// Create an instance for `application_name` at `api_version`
    fn create_instance(&self, application_name: &CStr, api_version: u32) -> Result<Self::Instance>;
}

/// Queries against a live instance
pub trait GraphicsInstance {
    /// Physical device handle, owned by the instance
    type Device: Copy + std::fmt::Debug;

    /// Physical devices in platform order
    fn physical_devices(&self) -> Result<Vec<Self::Device>>;

    /// Extensions supported at instance level
    fn instance_extensions(&self) -> Result<Vec<String>>;

    /// Properties, memory layout, features and extensions of `device`
    fn snapshot(&self, device: Self::Device) -> Result<DeviceSnapshot>;
}

/// Vulkan through the system loader
#[derive(Debug, Clone, Copy, Default)]
pub struct VulkanBackend;

impl GraphicsBackend for VulkanBackend {
    type Instance = VulkanInstance;

    fn create_instance(&self, application_name: &CStr, api_version: u32) -> Result<VulkanInstance> {
        // SAFETY: loading libvulkan runs its initializers; nothing else in
        // this process depends on loader state.
        let entry = unsafe { ash::Entry::load() }
            .map_err(|e| HostProbeError::LoaderUnavailable(e.to_string()))?;

        let app_info = vk::ApplicationInfo::default()
            .application_name(application_name)
            .api_version(api_version);
        let create_info = vk::InstanceCreateInfo::default().application_info(&app_info);

        // SAFETY: create_info and app_info outlive the call.
        let instance = unsafe { entry.create_instance(&create_info, None) }
            .map_err(|r| HostProbeError::InstanceCreation(format!("{:?}", r)))?;

        debug!(application = ?application_name, "Created Vulkan instance");
        Ok(VulkanInstance { entry, instance })
    }
}

/// Owned Vulkan instance, destroyed on drop
pub struct VulkanInstance {
    entry: ash::Entry,
    instance: ash::Instance,
}

impl std::fmt::Debug for VulkanInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VulkanInstance")
            .field("handle", &self.instance.handle())
            .finish()
    }
}

impl GraphicsInstance for VulkanInstance {
    type Device = vk::PhysicalDevice;

    fn physical_devices(&self) -> Result<Vec<vk::PhysicalDevice>> {
        // SAFETY: the instance is alive for the lifetime of self.
        unsafe { self.instance.enumerate_physical_devices() }
            .map_err(|r| HostProbeError::DeviceQuery(format!("vkEnumeratePhysicalDevices: {:?}", r)))
    }

    fn instance_extensions(&self) -> Result<Vec<String>> {
        // SAFETY: no layer name is passed.
        let extensions = unsafe { self.entry.enumerate_instance_extension_properties(None) }
            .map_err(|r| {
                HostProbeError::DeviceQuery(format!(
                    "vkEnumerateInstanceExtensionProperties: {:?}",
                    r
                ))
            })?;
        Ok(extensions
            .iter()
            .map(|ext| fixed_str(&ext.extension_name))
            .collect())
    }

    fn snapshot(&self, device: vk::PhysicalDevice) -> Result<DeviceSnapshot> {
        // SAFETY: `device` was enumerated from this instance, which is still alive.
        let (properties, memory, features, extensions) = unsafe {
            (
                self.instance.get_physical_device_properties(device),
                self.instance.get_physical_device_memory_properties(device),
                self.instance.get_physical_device_features(device),
                self.instance.enumerate_device_extension_properties(device),
            )
        };
        let extensions = extensions.map_err(|r| {
            HostProbeError::DeviceQuery(format!("vkEnumerateDeviceExtensionProperties: {:?}", r))
        })?;

        Ok(DeviceSnapshot {
            properties,
            memory,
            features,
            device_extensions: extensions
                .iter()
                .map(|ext| fixed_str(&ext.extension_name))
                .collect(),
        })
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        // SAFETY: no child objects were created; physical devices are owned
        // by the instance and need no separate destruction.
        unsafe { self.instance.destroy_instance(None) };
        debug!("Destroyed Vulkan instance");
    }
}
