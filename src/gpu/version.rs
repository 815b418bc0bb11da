//! Packed version decoding
//!
//! The API version uses the standard Vulkan packing. Driver versions are
//! vendor-defined; [`DriverVersion`] applies the 10/10/12-bit layout and
//! keeps the raw value so callers can re-decode for other vendors.

use serde::{Serialize, Serializer};
use std::fmt;

/// Vulkan API version (`VK_API_VERSION_*` packing)
///
/// The top three variant bits are not part of `major`: a packed value with
/// a nonzero variant decodes to the same `major.minor.patch` as variant 0.
/// The deprecated `VK_VERSION_MAJOR` macro would fold those bits into the
/// major number instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ApiVersion {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Patch version
    pub patch: u32,
}

impl ApiVersion {
    /// Decode a packed API version
    pub fn from_packed(packed: u32) -> Self {
        use ash::vk;
        Self {
            major: vk::api_version_major(packed),
            minor: vk::api_version_minor(packed),
            patch: vk::api_version_patch(packed),
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for ApiVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// PCI vendors seen on Vulkan devices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    /// 0x1002
    Amd,
    /// 0x10DE
    Nvidia,
    /// 0x8086
    Intel,
    /// 0x13B5 (Mali)
    Arm,
    /// 0x5143 (Adreno)
    Qualcomm,
    /// 0x1010 (PowerVR)
    Imagination,
    /// 0x106B
    Apple,
    /// Anything else
    Other(u32),
}

impl Vendor {
    /// Classify a PCI vendor id
    pub fn from_id(id: u32) -> Self {
        match id {
            0x1002 => Self::Amd,
            0x10DE => Self::Nvidia,
            0x8086 => Self::Intel,
            0x13B5 => Self::Arm,
            0x5143 => Self::Qualcomm,
            0x1010 => Self::Imagination,
            0x106B => Self::Apple,
            other => Self::Other(other),
        }
    }

    /// Whether this vendor's drivers follow the 10/10/12 driver version layout
    ///
    /// NVIDIA packs 10/8/8/6 and Intel's Windows drivers 18/14, so the
    /// decoded string is wrong for them; use the raw value instead.
    pub fn uses_standard_driver_layout(&self) -> bool {
        !matches!(self, Self::Nvidia | Self::Intel)
    }
}

/// Vendor-encoded driver version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverVersion {
    raw: u32,
}

impl DriverVersion {
    /// Wrap a raw driver version
    pub fn new(raw: u32) -> Self {
        Self { raw }
    }

    /// Undecoded value as reported by the driver
    pub fn raw(&self) -> u32 {
        self.raw
    }

    /// Bits 22..31
    pub fn major(&self) -> u32 {
        (self.raw >> 22) & 0x3ff
    }

    /// Bits 12..21
    pub fn minor(&self) -> u32 {
        (self.raw >> 12) & 0x3ff
    }

    /// Bits 0..11
    pub fn patch(&self) -> u32 {
        self.raw & 0xfff
    }
}

impl fmt::Display for DriverVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}

impl Serialize for DriverVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_api_version() {
        assert_eq!(ApiVersion::from_packed(ash::vk::API_VERSION_1_0).to_string(), "1.0.0");
        let packed = ash::vk::make_api_version(0, 1, 3, 231);
        assert_eq!(ApiVersion::from_packed(packed).to_string(), "1.3.231");
    }

    #[test]
    fn test_api_version_ignores_variant_bits() {
        let packed = ash::vk::make_api_version(1, 1, 2, 3);
        assert_eq!(packed >> 22, 129);
        assert_eq!(ApiVersion::from_packed(packed).to_string(), "1.2.3");
    }

    #[test]
    fn test_driver_version_samples() {
        // Adreno 630, driver 512.415.0
        assert_eq!(DriverVersion::new(0x8019_f000).to_string(), "512.415.0");
        // Mali-G78, r32p1
        assert_eq!(DriverVersion::new((32 << 22) | (1 << 12)).to_string(), "32.1.0");
        // Mesa RADV 23.1.4
        assert_eq!(DriverVersion::new(0x05C0_1004).to_string(), "23.1.4");
    }

    #[test]
    fn test_driver_layout_differs_from_api_layout() {
        // Bit 31 belongs to the driver major but to the API variant field
        let raw = 0x8040_1003;
        assert_eq!(DriverVersion::new(raw).major(), 513);
        assert_eq!(ApiVersion::from_packed(raw).major, 1);
    }

    #[test]
    fn test_vendor_layout_support() {
        assert!(Vendor::from_id(0x5143).uses_standard_driver_layout());
        assert!(Vendor::from_id(0x1002).uses_standard_driver_layout());
        assert!(!Vendor::from_id(0x10DE).uses_standard_driver_layout());
        assert_eq!(Vendor::from_id(0xBEEF), Vendor::Other(0xBEEF));
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&DriverVersion::new(0x05C0_1004)).unwrap();
        assert_eq!(json, "\"23.1.4\"");
    }

    proptest! {
        #[test]
        fn prop_driver_fields_match_bit_layout(v in any::<u32>()) {
            let d = DriverVersion::new(v);
            prop_assert_eq!(d.major(), (v >> 22) & 0x3FF);
            prop_assert_eq!(d.minor(), (v >> 12) & 0x3FF);
            prop_assert_eq!(d.patch(), v & 0xFFF);
            prop_assert_eq!((d.major() << 22) | (d.minor() << 12) | d.patch(), v);
        }
    }
}
