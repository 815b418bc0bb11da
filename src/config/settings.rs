//! Configuration settings for HostProbe
//!
//! Defines the CLI arguments, subcommands, and the runtime configuration
//! consumed by the affinity controller, topology reader and device prober.

use crate::error::{HostProbeError, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::ffi::CString;
use std::path::PathBuf;

/// Application identifier handed to the Vulkan driver
pub const DEFAULT_APPLICATION_NAME: &str = "FinalBenchmark2";

/// Max frequency (kHz) above which a core is classified as "big"
pub const DEFAULT_BIG_CORE_THRESHOLD_KHZ: u64 = 2_000_000;

/// Linux sysfs directory holding per-core entries
pub const DEFAULT_SYSFS_CPU_ROOT: &str = "/sys/devices/system/cpu";

/// HostProbe - thread affinity control and GPU capability probing
#[derive(Parser, Debug, Clone)]
#[command(name = "hostprobe")]
#[command(author = "HostProbe Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pin threads to CPU cores and probe Vulkan device capabilities")]
#[command(long_about = r#"
HostProbe exposes the host capabilities a benchmark run depends on.

Examples:
  hostprobe affinity get              # Cores the current thread may run on
  hostprobe affinity set 2            # Pin the current thread to core 2
  hostprobe affinity reset            # Allow all configured cores again
  hostprobe cores                     # big.LITTLE core classification
  hostprobe probe --pretty            # Vulkan capability report as JSON
"#)]
pub struct CliArgs {
    /// Application name reported to the Vulkan driver
    #[arg(long, env = "HOSTPROBE_APP_NAME", default_value = DEFAULT_APPLICATION_NAME, value_name = "NAME")]
    pub app_name: String,

    /// Vulkan API baseline requested at instance creation
    #[arg(long, env = "HOSTPROBE_API_VERSION", value_enum, default_value = "1.0")]
    pub api_version: ApiBaseline,

    /// Max frequency in kHz above which a core counts as a big core
    #[arg(long, env = "HOSTPROBE_BIG_CORE_KHZ", default_value_t = DEFAULT_BIG_CORE_THRESHOLD_KHZ, value_name = "KHZ")]
    pub big_core_khz: u64,

    /// sysfs directory with per-core cpufreq entries
    #[arg(long, default_value = DEFAULT_SYSFS_CPU_ROOT, value_name = "PATH")]
    pub sysfs_root: PathBuf,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Query or change the CPU affinity of this process's main thread
    #[command(name = "affinity")]
    Affinity {
        /// Affinity operation to run
        #[command(subcommand)]
        action: AffinityAction,
    },

    /// Show per-core max frequency and big/little classification
    #[command(name = "cores")]
    Cores,

    /// Probe the first Vulkan device and print its capability report
    #[command(name = "probe")]
    Probe {
        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
        /// Print a human-readable summary instead of JSON
        #[arg(long, conflicts_with = "pretty")]
        summary: bool,
    },
}

/// Affinity subcommand actions
#[derive(Subcommand, Debug, Clone)]
pub enum AffinityAction {
    /// Print the cores the thread may run on
    Get,
    /// Pin the thread to a single core
    Set {
        /// Core index (not validated; the kernel rejects bad values)
        #[arg(allow_negative_numbers = true)]
        core: i32,
    },
    /// Allow the thread on every configured core
    Reset,
    /// Pin the thread to a set of cores
    Pin {
        /// Core indices
        #[arg(required = true, num_args = 1..)]
        cores: Vec<usize>,
    },
    /// Pin the thread to the detected big cores
    Big,
}

/// Vulkan API baseline
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ApiBaseline {
    /// Vulkan 1.0
    #[default]
    #[value(name = "1.0")]
    #[serde(rename = "1.0")]
    V1_0,
    /// Vulkan 1.1
    #[value(name = "1.1")]
    #[serde(rename = "1.1")]
    V1_1,
    /// Vulkan 1.2
    #[value(name = "1.2")]
    #[serde(rename = "1.2")]
    V1_2,
    /// Vulkan 1.3
    #[value(name = "1.3")]
    #[serde(rename = "1.3")]
    V1_3,
}

impl ApiBaseline {
    /// Packed Vulkan version number
    pub fn packed(&self) -> u32 {
        use ash::vk;
        match self {
            Self::V1_0 => vk::API_VERSION_1_0,
            Self::V1_1 => vk::API_VERSION_1_1,
            Self::V1_2 => vk::API_VERSION_1_2,
            Self::V1_3 => vk::API_VERSION_1_3,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Application name reported at instance creation
    pub application_name: String,
    /// Requested API baseline
    pub api_version: ApiBaseline,
    /// Big core frequency threshold in kHz
    pub big_core_threshold_khz: u64,
    /// sysfs cpu directory
    pub sysfs_root: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
            api_version: ApiBaseline::V1_0,
            big_core_threshold_khz: DEFAULT_BIG_CORE_THRESHOLD_KHZ,
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_CPU_ROOT),
        }
    }
}

impl ProbeConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let config = Self {
            application_name: args.app_name.clone(),
            api_version: args.api_version,
            big_core_threshold_khz: args.big_core_khz,
            sysfs_root: args.sysfs_root.clone(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the values the driver and sysfs reader will rely on
    pub fn validate(&self) -> Result<()> {
        if self.application_name.as_bytes().contains(&0) {
            return Err(HostProbeError::config(
                "application name must not contain NUL bytes",
            ));
        }
        if self.big_core_threshold_khz == 0 {
            return Err(HostProbeError::config(
                "big core threshold must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Application name as a C string for the driver
    pub fn application_name_cstr(&self) -> Result<CString> {
        CString::new(self.application_name.as_str())
            .map_err(|e| HostProbeError::config(format!("invalid application name: {}", e)))
    }
}
