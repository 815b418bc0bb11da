//! Host scheduler access
//!
//! Thread affinity control and CPU core topology detection.

pub mod affinity;
pub mod topology;

pub use affinity::{
    configured_cores, AffinityController, AffinityMask, OsScheduler, SchedulerBindings,
    ThreadTarget,
};
pub use topology::{CoreClass, CoreInfo, CoreTopology};
