//! Performance benchmarks for HostProbe
//!
//! Run with: cargo bench

use ash::vk;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hostprobe::gpu::{CapabilityReport, DeviceSnapshot, FeatureSet, ProbeResponse};
use hostprobe::system::{AffinityController, AffinityMask, CoreTopology};

/// Snapshot with `extensions` device extensions and a typical heap layout
fn build_snapshot(extensions: usize) -> DeviceSnapshot {
    let mut properties = vk::PhysicalDeviceProperties {
        api_version: vk::make_api_version(0, 1, 3, 250),
        driver_version: 0x05C0_1004,
        vendor_id: 0x1002,
        device_id: 0x73bf,
        device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
        ..Default::default()
    };
    for (dst, src) in properties.device_name.iter_mut().zip(b"Bench GPU".iter()) {
        *dst = *src as std::ffi::c_char;
    }

    let mut memory = vk::PhysicalDeviceMemoryProperties {
        memory_heap_count: 3,
        memory_type_count: 8,
        ..Default::default()
    };
    memory.memory_heaps[0] = vk::MemoryHeap {
        size: 16 << 30,
        flags: vk::MemoryHeapFlags::DEVICE_LOCAL,
    };
    memory.memory_heaps[1] = vk::MemoryHeap {
        size: 32 << 30,
        flags: vk::MemoryHeapFlags::empty(),
    };
    memory.memory_heaps[2] = vk::MemoryHeap {
        size: 256 << 20,
        flags: vk::MemoryHeapFlags::DEVICE_LOCAL | vk::MemoryHeapFlags::MULTI_INSTANCE,
    };
    for i in 0..8 {
        memory.memory_types[i] = vk::MemoryType {
            property_flags: vk::MemoryPropertyFlags::from_raw(i as u32 & 0x7),
            heap_index: (i % 3) as u32,
        };
    }

    DeviceSnapshot {
        properties,
        memory,
        features: vk::PhysicalDeviceFeatures {
            geometry_shader: vk::TRUE,
            sampler_anisotropy: vk::TRUE,
            shader_float64: vk::TRUE,
            ..Default::default()
        },
        device_extensions: (0..extensions).map(|i| format!("VK_EXT_bench_{}", i)).collect(),
    }
}

fn bench_report_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("report_serialization");

    for extensions in [16, 128, 512] {
        let snapshot = build_snapshot(extensions);
        let instance_extensions: Vec<String> =
            (0..24).map(|i| format!("VK_KHR_instance_{}", i)).collect();

        group.bench_with_input(
            BenchmarkId::new("build_and_serialize", extensions),
            &snapshot,
            |b, snapshot| {
                b.iter(|| {
                    let report =
                        CapabilityReport::from_snapshot(snapshot.clone(), instance_extensions.clone());
                    black_box(ProbeResponse::success(report).to_json())
                });
            },
        );
    }

    group.finish();
}

fn bench_feature_table(c: &mut Criterion) {
    let features = build_snapshot(0).features;

    c.bench_function("feature_set_from_vk", |b| {
        b.iter(|| black_box(FeatureSet::from_vk(black_box(&features))));
    });
}

fn bench_affinity(c: &mut Criterion) {
    let controller = AffinityController::current_thread();

    c.bench_function("get_affinity", |b| {
        b.iter(|| black_box(controller.get_affinity()));
    });

    c.bench_function("cpu_list_parse", |b| {
        b.iter(|| black_box(CoreTopology::parse_cpu_list(black_box("0-3,4-7,8,10-63"))));
    });

    c.bench_function("mask_restrict", |b| {
        let mask = AffinityMask::all(256);
        b.iter(|| black_box(mask.restricted_to(black_box(64))));
    });
}

criterion_group!(
    benches,
    bench_report_serialization,
    bench_feature_table,
    bench_affinity
);
criterion_main!(benches);
