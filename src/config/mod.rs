//! Configuration module for HostProbe
//!
//! Provides CLI arguments and the runtime settings shared by the
//! affinity, topology and probe commands.

mod settings;

pub use settings::*;
