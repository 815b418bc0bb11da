//! Device capability report
//!
//! Typed form of the probe result. [`ProbeResponse`] is what gets
//! serialized: `supported`, an optional `error`, and, on success, the
//! flattened [`CapabilityReport`] fields.

use crate::error::{HostProbeError, Result};
use crate::gpu::backend::DeviceSnapshot;
use crate::gpu::features::FeatureSet;
use crate::gpu::version::{ApiVersion, DriverVersion};
use ash::vk;
use serde::Serialize;
use std::ffi::c_char;

/// Error text for an instance with zero physical devices
pub const NO_DEVICES_FOUND: &str = "no devices found";

/// Physical device category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeviceType {
    /// GPU sharing memory with the host
    #[serde(rename = "Integrated GPU")]
    IntegratedGpu,
    /// Separate GPU
    #[serde(rename = "Discrete GPU")]
    DiscreteGpu,
    /// GPU exposed through virtualization
    #[serde(rename = "Virtual GPU")]
    VirtualGpu,
    /// Software rasterizer on the host CPU
    #[serde(rename = "CPU")]
    Cpu,
    /// Anything else
    #[serde(rename = "Other")]
    Other,
}

impl From<vk::PhysicalDeviceType> for DeviceType {
    fn from(ty: vk::PhysicalDeviceType) -> Self {
        match ty {
            vk::PhysicalDeviceType::INTEGRATED_GPU => Self::IntegratedGpu,
            vk::PhysicalDeviceType::DISCRETE_GPU => Self::DiscreteGpu,
            vk::PhysicalDeviceType::VIRTUAL_GPU => Self::VirtualGpu,
            vk::PhysicalDeviceType::CPU => Self::Cpu,
            _ => Self::Other,
        }
    }
}

impl DeviceType {
    /// Label used in the report
    pub fn label(&self) -> &'static str {
        match self {
            Self::IntegratedGpu => "Integrated GPU",
            Self::DiscreteGpu => "Discrete GPU",
            Self::VirtualGpu => "Virtual GPU",
            Self::Cpu => "CPU",
            Self::Other => "Other",
        }
    }
}

/// One memory heap
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryHeapEntry {
    /// Position in the heap array
    pub index: u32,
    /// Size in bytes
    pub size: u64,
    /// Comma-separated heap flag names
    pub flags: String,
}

/// One memory type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryTypeEntry {
    /// Position in the type array
    pub index: u32,
    /// Heap this type allocates from
    pub heap_index: u32,
    /// Raw `VkMemoryPropertyFlags`
    pub property_flags: u32,
}

/// Render heap flags as `"DEVICE_LOCAL, MULTI_INSTANCE"`
pub fn heap_flags_to_string(flags: vk::MemoryHeapFlags) -> String {
    let mut names = Vec::new();
    if flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL) {
        names.push("DEVICE_LOCAL");
    }
    if flags.contains(vk::MemoryHeapFlags::MULTI_INSTANCE) {
        names.push("MULTI_INSTANCE");
    }
    names.join(", ")
}

/// Read a NUL-terminated fixed-size driver string
pub fn fixed_str(chars: &[c_char]) -> String {
    let bytes: Vec<u8> = chars
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Capabilities of the first physical device
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityReport {
    /// Highest API version the device supports
    pub api_version: ApiVersion,
    /// Driver version, 10/10/12-bit decoding
    pub driver_version: DriverVersion,
    /// Driver version exactly as reported
    pub driver_version_raw: u32,
    /// Device name
    pub physical_device_name: String,
    /// Device category
    pub physical_device_type: DeviceType,
    /// PCI vendor id
    pub vendor_id: u32,
    /// Vendor-specific device id
    pub device_id: u32,
    /// Memory heaps in driver order
    pub memory_heaps: Vec<MemoryHeapEntry>,
    /// Memory types in driver order
    pub memory_types: Vec<MemoryTypeEntry>,
    /// Instance-level extensions
    pub instance_extensions: Vec<String>,
    /// Device-level extensions
    pub device_extensions: Vec<String>,
    /// Vulkan 1.0 feature flags
    pub features: FeatureSet,
}

impl CapabilityReport {
    /// Build the report from raw driver structures
    pub fn from_snapshot(snapshot: DeviceSnapshot, instance_extensions: Vec<String>) -> Self {
        let props = &snapshot.properties;
        let memory = &snapshot.memory;

        let heap_count = (memory.memory_heap_count as usize).min(memory.memory_heaps.len());
        let memory_heaps = memory.memory_heaps[..heap_count]
            .iter()
            .enumerate()
            .map(|(i, heap)| MemoryHeapEntry {
                index: i as u32,
                size: heap.size,
                flags: heap_flags_to_string(heap.flags),
            })
            .collect();

        let type_count = (memory.memory_type_count as usize).min(memory.memory_types.len());
        let memory_types = memory.memory_types[..type_count]
            .iter()
            .enumerate()
            .map(|(i, ty)| MemoryTypeEntry {
                index: i as u32,
                heap_index: ty.heap_index,
                property_flags: ty.property_flags.as_raw(),
            })
            .collect();

        Self {
            api_version: ApiVersion::from_packed(props.api_version),
            driver_version: DriverVersion::new(props.driver_version),
            driver_version_raw: props.driver_version,
            physical_device_name: fixed_str(&props.device_name),
            physical_device_type: props.device_type.into(),
            vendor_id: props.vendor_id,
            device_id: props.device_id,
            memory_heaps,
            memory_types,
            instance_extensions,
            device_extensions: snapshot.device_extensions,
            features: FeatureSet::from_vk(&snapshot.features),
        }
    }

    /// Total bytes across device-local heaps
    pub fn device_local_bytes(&self) -> u64 {
        self.memory_heaps
            .iter()
            .filter(|h| h.flags.contains("DEVICE_LOCAL"))
            .map(|h| h.size)
            .sum()
    }

    /// Print a human-readable summary
    pub fn print_summary(&self) {
        println!("=== Vulkan Device ===\n");
        println!("Name:           {}", self.physical_device_name);
        println!("Type:           {}", self.physical_device_type.label());
        println!("API version:    {}", self.api_version);
        println!(
            "Driver version: {} (raw 0x{:08x})",
            self.driver_version, self.driver_version_raw
        );
        println!("Vendor/Device:  0x{:04x} / 0x{:04x}", self.vendor_id, self.device_id);

        println!("\nMemory heaps:");
        for heap in &self.memory_heaps {
            println!(
                "  [{}] {} {}",
                heap.index,
                humansize::format_size(heap.size, humansize::BINARY),
                heap.flags
            );
        }
        println!("Memory types:   {}", self.memory_types.len());

        println!("\nInstance extensions: {}", self.instance_extensions.len());
        println!("Device extensions:   {}", self.device_extensions.len());
        println!(
            "Features:            {} / {} supported",
            self.features.supported().count(),
            self.features.len()
        );
    }
}

/// Serialized probe outcome
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResponse {
    /// Whether the graphics API is usable at all
    pub supported: bool,
    /// Reason for an early exit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Device data, present only on full success
    #[serde(flatten)]
    pub report: Option<CapabilityReport>,
}

impl ProbeResponse {
    /// The graphics API could not be initialized
    pub fn unsupported(error: impl Into<String>) -> Self {
        Self {
            supported: false,
            error: Some(error.into()),
            report: None,
        }
    }

    /// The API works but exposes no physical device
    pub fn no_devices() -> Self {
        Self::failed_after_setup(NO_DEVICES_FOUND)
    }

    /// The API works but a later query failed
    pub fn failed_after_setup(error: impl Into<String>) -> Self {
        Self {
            supported: true,
            error: Some(error.into()),
            report: None,
        }
    }

    /// Full report
    pub fn success(report: CapabilityReport) -> Self {
        Self {
            supported: true,
            error: None,
            report: Some(report),
        }
    }

    /// Serialize to compact JSON, reporting serializer failures
    pub fn try_to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON, reporting serializer failures
    pub fn try_to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize to compact JSON
    ///
    /// A serializer failure still yields an object with `supported: false`.
    pub fn to_json(&self) -> String {
        self.try_to_json().unwrap_or_else(Self::serialization_failure)
    }

    /// Serialize to indented JSON
    pub fn to_json_pretty(&self) -> String {
        self.try_to_json_pretty()
            .unwrap_or_else(Self::serialization_failure)
    }

    fn serialization_failure(e: HostProbeError) -> String {
        serde_json::json!({ "supported": false, "error": e.to_string() }).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::testing::sample_snapshot;
    use serde_json::Value;

    #[test]
    fn test_heap_flags_rendering() {
        assert_eq!(heap_flags_to_string(vk::MemoryHeapFlags::empty()), "");
        assert_eq!(
            heap_flags_to_string(vk::MemoryHeapFlags::DEVICE_LOCAL),
            "DEVICE_LOCAL"
        );
        assert_eq!(
            heap_flags_to_string(
                vk::MemoryHeapFlags::DEVICE_LOCAL | vk::MemoryHeapFlags::MULTI_INSTANCE
            ),
            "DEVICE_LOCAL, MULTI_INSTANCE"
        );
    }

    #[test]
    fn test_device_type_labels() {
        let cases = [
            (vk::PhysicalDeviceType::INTEGRATED_GPU, "Integrated GPU"),
            (vk::PhysicalDeviceType::DISCRETE_GPU, "Discrete GPU"),
            (vk::PhysicalDeviceType::VIRTUAL_GPU, "Virtual GPU"),
            (vk::PhysicalDeviceType::CPU, "CPU"),
            (vk::PhysicalDeviceType::OTHER, "Other"),
            (vk::PhysicalDeviceType::from_raw(99), "Other"),
        ];
        for (raw, label) in cases {
            let ty = DeviceType::from(raw);
            assert_eq!(ty.label(), label);
            assert_eq!(serde_json::to_value(ty).unwrap(), Value::from(label));
        }
    }

    #[test]
    fn test_report_from_snapshot() {
        let report = CapabilityReport::from_snapshot(
            sample_snapshot("Adreno (TM) 630"),
            vec!["VK_KHR_surface".to_string()],
        );

        assert_eq!(report.physical_device_name, "Adreno (TM) 630");
        assert_eq!(report.physical_device_type, DeviceType::IntegratedGpu);
        assert_eq!(report.api_version.to_string(), "1.1.128");
        assert_eq!(report.driver_version.to_string(), "512.415.0");
        assert_eq!(report.memory_heaps.len(), 2);
        assert_eq!(report.memory_types.len(), 3);
        assert_eq!(report.device_local_bytes(), 4 << 30);
        assert!(report
            .memory_types
            .iter()
            .all(|t| (t.heap_index as usize) < report.memory_heaps.len()));
    }

    #[test]
    fn test_success_json_shape() {
        let report = CapabilityReport::from_snapshot(sample_snapshot("Mali-G78"), Vec::new());
        let value: Value = serde_json::from_str(&ProbeResponse::success(report).to_json()).unwrap();

        assert_eq!(value["supported"], Value::Bool(true));
        assert!(value.get("error").is_none());
        assert_eq!(value["physicalDeviceName"], "Mali-G78");
        assert_eq!(value["physicalDeviceType"], "Integrated GPU");
        assert_eq!(value["vendorId"], 0x5143);
        assert_eq!(value["driverVersion"], "512.415.0");
        assert_eq!(value["driverVersionRaw"], 0x8019_f000u32);
        assert_eq!(value["memoryHeaps"][0]["flags"], "DEVICE_LOCAL");
        assert_eq!(value["memoryTypes"][1]["heapIndex"], 0);
        assert_eq!(value["memoryTypes"][1]["propertyFlags"], 7);
        assert_eq!(value["deviceExtensions"][0], "VK_KHR_swapchain");
        assert_eq!(value["features"]["geometryShader"], Value::Bool(true));
        assert_eq!(value["features"].as_object().unwrap().len(), 55);
    }

    #[test]
    fn test_device_name_is_escaped() {
        let report =
            CapabilityReport::from_snapshot(sample_snapshot("GPU \"Turbo\"\tEdition"), Vec::new());
        let json = ProbeResponse::success(report).to_json();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["physicalDeviceName"], "GPU \"Turbo\"\tEdition");
    }

    #[test]
    fn test_early_exit_payloads() {
        assert_eq!(
            ProbeResponse::no_devices().to_json(),
            r#"{"supported":true,"error":"no devices found"}"#
        );

        let value: Value =
            serde_json::from_str(&ProbeResponse::unsupported("loader missing").to_json()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["supported"], Value::Bool(false));
        assert_eq!(object["error"], "loader missing");
    }

    #[test]
    fn test_serializer_failure_becomes_unsupported_payload() {
        let err: HostProbeError = serde_json::from_str::<Value>("{").unwrap_err().into();
        assert!(matches!(err, HostProbeError::Serialization(_)));

        let value: Value = serde_json::from_str(&ProbeResponse::serialization_failure(err)).unwrap();
        assert_eq!(value["supported"], Value::Bool(false));
        assert!(value["error"].as_str().unwrap().starts_with("Serialization error"));
        assert_eq!(
            ProbeResponse::no_devices().try_to_json().unwrap(),
            ProbeResponse::no_devices().to_json()
        );
    }

    #[test]
    fn test_fixed_str_stops_at_nul() {
        let raw: Vec<c_char> = b"abc\0def".iter().map(|&b| b as c_char).collect();
        assert_eq!(fixed_str(&raw), "abc");
        let unterminated: Vec<c_char> = b"xyz".iter().map(|&b| b as c_char).collect();
        assert_eq!(fixed_str(&unterminated), "xyz");
    }
}
