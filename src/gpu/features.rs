//! Vulkan 1.0 device feature table
//!
//! One row per `VkPhysicalDeviceFeatures` member, in declaration order.
//! The report reads features through this table only, so a feature added
//! here shows up in every serialized report.

use ash::vk;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A named accessor into `VkPhysicalDeviceFeatures`
pub struct FeatureEntry {
    /// Name used in the serialized report
    pub name: &'static str,
    read: fn(&vk::PhysicalDeviceFeatures) -> vk::Bool32,
}

impl FeatureEntry {
    /// Whether the feature is supported
    pub fn is_supported(&self, features: &vk::PhysicalDeviceFeatures) -> bool {
        (self.read)(features) != vk::FALSE
    }
}

macro_rules! feature_table {
    ($($name:literal => $field:ident),* $(,)?) => {
        /// Every Vulkan 1.0 feature flag
        pub static FEATURE_TABLE: &[FeatureEntry] = &[
            $(FeatureEntry { name: $name, read: |f| f.$field },)*
        ];
    };
}

feature_table! {
    "robustBufferAccess" => robust_buffer_access,
    "fullDrawIndexUint32" => full_draw_index_uint32,
    "imageCubeArray" => image_cube_array,
    "independentBlend" => independent_blend,
    "geometryShader" => geometry_shader,
    "tessellationShader" => tessellation_shader,
    "sampleRateShading" => sample_rate_shading,
    "dualSrcBlend" => dual_src_blend,
    "logicOp" => logic_op,
    "multiDrawIndirect" => multi_draw_indirect,
    "drawIndirectFirstInstance" => draw_indirect_first_instance,
    "depthClamp" => depth_clamp,
    "depthBiasClamp" => depth_bias_clamp,
    "fillModeNonSolid" => fill_mode_non_solid,
    "depthBounds" => depth_bounds,
    "wideLines" => wide_lines,
    "largePoints" => large_points,
    "alphaToOne" => alpha_to_one,
    "multiViewport" => multi_viewport,
    "samplerAnisotropy" => sampler_anisotropy,
    "textureCompressionETC2" => texture_compression_etc2,
    "textureCompressionASTC_LDR" => texture_compression_astc_ldr,
    "textureCompressionBC" => texture_compression_bc,
    "occlusionQueryPrecise" => occlusion_query_precise,
    "pipelineStatisticsQuery" => pipeline_statistics_query,
    "vertexPipelineStoresAndAtomics" => vertex_pipeline_stores_and_atomics,
    "fragmentStoresAndAtomics" => fragment_stores_and_atomics,
    "shaderTessellationAndGeometryPointSize" => shader_tessellation_and_geometry_point_size,
    "shaderImageGatherExtended" => shader_image_gather_extended,
    "shaderStorageImageExtendedFormats" => shader_storage_image_extended_formats,
    "shaderStorageImageMultisample" => shader_storage_image_multisample,
    "shaderStorageImageReadWithoutFormat" => shader_storage_image_read_without_format,
    "shaderStorageImageWriteWithoutFormat" => shader_storage_image_write_without_format,
    "shaderUniformBufferArrayDynamicIndexing" => shader_uniform_buffer_array_dynamic_indexing,
    "shaderSampledImageArrayDynamicIndexing" => shader_sampled_image_array_dynamic_indexing,
    "shaderStorageBufferArrayDynamicIndexing" => shader_storage_buffer_array_dynamic_indexing,
    "shaderStorageImageArrayDynamicIndexing" => shader_storage_image_array_dynamic_indexing,
    "shaderClipDistance" => shader_clip_distance,
    "shaderCullDistance" => shader_cull_distance,
    "shaderFloat64" => shader_float64,
    "shaderInt64" => shader_int64,
    "shaderInt16" => shader_int16,
    "shaderResourceResidency" => shader_resource_residency,
    "shaderResourceMinLod" => shader_resource_min_lod,
    "sparseBinding" => sparse_binding,
    "sparseResidencyBuffer" => sparse_residency_buffer,
    "sparseResidencyImage2D" => sparse_residency_image2_d,
    "sparseResidencyImage3D" => sparse_residency_image3_d,
    "sparseResidency2Samples" => sparse_residency2_samples,
    "sparseResidency4Samples" => sparse_residency4_samples,
    "sparseResidency8Samples" => sparse_residency8_samples,
    "sparseResidency16Samples" => sparse_residency16_samples,
    "sparseResidencyAliased" => sparse_residency_aliased,
    "variableMultisampleRate" => variable_multisample_rate,
    "inheritedQueries" => inherited_queries,
}

/// Feature flags of one device, in table order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSet {
    flags: Vec<(&'static str, bool)>,
}

impl FeatureSet {
    /// Read every table entry from `features`
    pub fn from_vk(features: &vk::PhysicalDeviceFeatures) -> Self {
        Self {
            flags: FEATURE_TABLE
                .iter()
                .map(|entry| (entry.name, entry.is_supported(features)))
                .collect(),
        }
    }

    /// Look up a feature by report name
    pub fn get(&self, name: &str) -> Option<bool> {
        self.flags
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, supported)| supported)
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// `(name, supported)` pairs in table order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        self.flags.iter().copied()
    }

    /// Names of supported features
    pub fn supported(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.iter().filter(|&(_, on)| on).map(|(name, _)| name)
    }
}

impl Serialize for FeatureSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.flags.len()))?;
        for (name, supported) in &self.flags {
            map.serialize_entry(name, supported)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_covers_vulkan_1_0() {
        assert_eq!(FEATURE_TABLE.len(), 55);
        let names: HashSet<_> = FEATURE_TABLE.iter().map(|e| e.name).collect();
        assert_eq!(names.len(), FEATURE_TABLE.len());
        assert_eq!(FEATURE_TABLE[0].name, "robustBufferAccess");
        assert_eq!(FEATURE_TABLE[54].name, "inheritedQueries");
    }

    #[test]
    fn test_reads_each_field() {
        let features = vk::PhysicalDeviceFeatures {
            geometry_shader: vk::TRUE,
            texture_compression_astc_ldr: vk::TRUE,
            sparse_residency_image3_d: vk::TRUE,
            ..Default::default()
        };
        let set = FeatureSet::from_vk(&features);

        assert_eq!(set.get("geometryShader"), Some(true));
        assert_eq!(set.get("textureCompressionASTC_LDR"), Some(true));
        assert_eq!(set.get("sparseResidencyImage3D"), Some(true));
        assert_eq!(set.get("sparseResidencyImage2D"), Some(false));
        assert_eq!(set.get("noSuchFeature"), None);
        assert_eq!(set.supported().count(), 3);
    }

    #[test]
    fn test_serializes_literal_booleans_in_order() {
        let features = vk::PhysicalDeviceFeatures {
            robust_buffer_access: vk::TRUE,
            ..Default::default()
        };
        let json = serde_json::to_string(&FeatureSet::from_vk(&features)).unwrap();
        assert!(json.starts_with("{\"robustBufferAccess\":true,\"fullDrawIndexUint32\":false,"));
        assert!(json.ends_with("\"inheritedQueries\":false}"));
    }
}
