//! Caller-facing entry points
//!
//! Flat functions over [`AffinityController`] and [`DeviceProber`] for
//! callers that only need booleans, core lists and a JSON string. Affinity
//! calls act on the calling thread.
//!
//! Each affinity call uses a fresh controller, so the errno of a failed
//! call is only written to the log. Keep an [`AffinityController`] and read
//! [`AffinityController::last_os_error`] when the cause matters.
//!
//! | Function | Result on failure |
//! |----------|-------------------|
//! | [`set_affinity`] | `false` |
//! | [`reset_affinity`] | `false` |
//! | [`get_affinity`] | `None` |
//! | [`probe_device_capabilities`] | JSON with `"supported": false` |

use crate::config::ProbeConfig;
use crate::gpu::DeviceProber;
use crate::system::AffinityController;

/// Pin the calling thread to `core_id`
///
/// The index is handed to the kernel as-is; an index the kernel rejects
/// returns `false` and leaves the current affinity untouched.
pub fn set_affinity(core_id: i32) -> bool {
    AffinityController::current_thread().set_affinity(core_id)
}

/// Allow the calling thread on every configured core
pub fn reset_affinity() -> bool {
    AffinityController::current_thread().reset_affinity()
}

/// Cores the calling thread may run on, ascending
pub fn get_affinity() -> Option<Vec<i32>> {
    AffinityController::current_thread().get_affinity().map(|mask| {
        mask.iter()
            .filter_map(|core| i32::try_from(core).ok())
            .collect()
    })
}

/// Capability report of the first graphics device, as JSON
pub fn probe_device_capabilities() -> String {
    probe_device_capabilities_with(&ProbeConfig::default())
}

/// Same as [`probe_device_capabilities`] with a custom configuration
pub fn probe_device_capabilities_with(config: &ProbeConfig) -> String {
    DeviceProber::new(config.clone()).probe_json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_probe_returns_json_object() {
        let value: Value = serde_json::from_str(&probe_device_capabilities()).unwrap();
        let object = value.as_object().expect("top level must be an object");
        assert!(object["supported"].is_boolean());
    }

    #[test]
    fn test_probe_with_invalid_name_is_unsupported() {
        let config = ProbeConfig {
            application_name: "nul\0inside".to_string(),
            ..Default::default()
        };
        let value: Value = serde_json::from_str(&probe_device_capabilities_with(&config)).unwrap();
        assert_eq!(value["supported"], Value::Bool(false));
        assert!(value["error"].is_string());
    }

    #[cfg(unix)]
    #[test]
    fn test_errno_available_through_controller() {
        use crate::error::Errno;

        assert!(!set_affinity(-1));

        let controller = AffinityController::current_thread();
        assert!(!controller.set_affinity(-1));
        assert_eq!(controller.last_os_error(), Some(Errno::EINVAL));
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    #[test]
    fn test_affinity_round_trip_on_host() {
        std::thread::spawn(|| {
            let initial = get_affinity().expect("affinity query on own thread");
            assert!(!initial.is_empty());
            assert!(initial.windows(2).all(|w| w[0] < w[1]));

            let core = initial[0];
            assert!(set_affinity(core));
            assert_eq!(get_affinity(), Some(vec![core]));

            assert!(!set_affinity(-1));
            assert_eq!(get_affinity(), Some(vec![core]));

            // A restricted cpuset may reject the full mask; either way the
            // thread must keep at least its original cores.
            if reset_affinity() {
                let after = get_affinity().unwrap();
                assert!(initial.iter().all(|c| after.contains(c)));
            }
        })
        .join()
        .unwrap();
    }
}
