//! Core topology for heterogeneous (big.LITTLE) CPUs
//!
//! Mobile SoCs mix high- and low-frequency clusters. Benchmarks usually want
//! to pin to the fast cluster, so cores are classified by the maximum
//! frequency the kernel reports in
//! `cpuN/cpufreq/cpuinfo_max_freq` under the sysfs cpu directory.

use crate::config::ProbeConfig;
use crate::error::{IoResultExt, Result};
use crate::system::affinity::configured_cores;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Upper bound on core indices read from sysfs lists (kernel `NR_CPUS` limit)
pub const MAX_CPU_INDEX: usize = 8192;

/// Frequency class of a core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoreClass {
    /// Max frequency above the threshold
    Big,
    /// Max frequency at or below the threshold
    Little,
    /// cpufreq entry missing or unreadable
    Unknown,
}

/// Per-core frequency information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreInfo {
    /// Logical core index
    pub id: usize,
    /// cpuinfo_max_freq in kHz
    pub max_freq_khz: Option<u64>,
    /// Classification against the threshold
    pub class: CoreClass,
}

/// Host core layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreTopology {
    /// One entry per configured core
    pub cores: Vec<CoreInfo>,
    /// Cores listed in the `online` file (all cores if unreadable)
    pub online: Vec<usize>,
    /// Threshold used for classification
    pub threshold_khz: u64,
}

impl CoreTopology {
    /// Detect the topology using the configured sysfs root and threshold
    pub fn detect(config: &ProbeConfig) -> Self {
        Self::detect_at(
            &config.sysfs_root,
            configured_cores(),
            config.big_core_threshold_khz,
        )
    }

    /// Detect the topology of `total` cores under `root`
    pub fn detect_at(root: &Path, total: usize, threshold_khz: u64) -> Self {
        let cores = (0..total)
            .map(|id| {
                let max_freq_khz = match Self::read_max_freq(root, id) {
                    Ok(khz) => Some(khz),
                    Err(e) => {
                        debug!(core = id, error = %e, "No cpufreq data for core");
                        None
                    }
                };
                let class = match max_freq_khz {
                    Some(khz) if khz > threshold_khz => CoreClass::Big,
                    Some(_) => CoreClass::Little,
                    None => CoreClass::Unknown,
                };
                CoreInfo {
                    id,
                    max_freq_khz,
                    class,
                }
            })
            .collect();

        let online = std::fs::read_to_string(root.join("online"))
            .map(|content| Self::parse_cpu_list(content.trim()))
            .unwrap_or_else(|_| (0..total).collect());

        Self {
            cores,
            online,
            threshold_khz,
        }
    }

    fn read_max_freq(root: &Path, id: usize) -> Result<u64> {
        let path = root
            .join(format!("cpu{}", id))
            .join("cpufreq")
            .join("cpuinfo_max_freq");
        let content = std::fs::read_to_string(&path).with_path(&path)?;
        content.trim().parse::<u64>().map_err(|e| {
            crate::error::HostProbeError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })
    }

    /// Parse the kernel CPU list format (e.g., "0-3,8-11" -> [0,1,2,3,8,9,10,11])
    ///
    /// Indices at or above [`MAX_CPU_INDEX`] and malformed or reversed
    /// ranges are dropped. The result is sorted and deduplicated.
    pub fn parse_cpu_list(s: &str) -> Vec<usize> {
        let mut cpus: Vec<usize> = s
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .flat_map(|item| {
                let (first, last) = match item.split_once('-') {
                    Some((a, b)) => (a.trim().parse::<usize>(), b.trim().parse::<usize>()),
                    None => (item.parse::<usize>(), item.parse::<usize>()),
                };
                match (first, last) {
                    (Ok(first), Ok(last)) if first <= last && first < MAX_CPU_INDEX => {
                        first..last.min(MAX_CPU_INDEX - 1) + 1
                    }
                    _ => 0..0,
                }
            })
            .collect();
        cpus.sort_unstable();
        cpus.dedup();
        cpus
    }

    /// Number of configured cores
    pub fn total_cores(&self) -> usize {
        self.cores.len()
    }

    /// Cores above the frequency threshold
    pub fn big_cores(&self) -> Vec<usize> {
        self.of_class(CoreClass::Big)
    }

    /// Cores at or below the frequency threshold
    pub fn little_cores(&self) -> Vec<usize> {
        self.of_class(CoreClass::Little)
    }

    /// Cores currently online
    pub fn online_cores(&self) -> &[usize] {
        &self.online
    }

    fn of_class(&self, class: CoreClass) -> Vec<usize> {
        self.cores
            .iter()
            .filter(|c| c.class == class)
            .map(|c| c.id)
            .collect()
    }

    /// Print topology summary
    pub fn print_summary(&self) {
        println!("Core Topology:");
        println!("  Configured cores: {}", self.total_cores());
        println!("  Online: {:?}", self.online);
        println!("  Big core threshold: {} MHz", self.threshold_khz / 1000);

        for core in &self.cores {
            match core.max_freq_khz {
                Some(khz) => println!("  CPU{}: {} MHz ({:?})", core.id, khz / 1000, core.class),
                None => println!("  CPU{}: unknown frequency", core.id),
            }
        }

        println!("  Big cores: {:?}", self.big_cores());
        println!("  Little cores: {:?}", self.little_cores());
    }
}
