//! Thread CPU affinity control
//!
//! Pins, resets and queries the scheduler affinity mask of a single kernel
//! thread. Affinity is a per-thread attribute: a controller built with
//! [`ThreadTarget::Current`] affects whichever thread calls it, so callers
//! using thread pools must make sure the call site is the thread they mean
//! to pin. Name a thread explicitly with [`ThreadTarget::Tid`] otherwise.
//!
//! All kernel calls go through [`SchedulerBindings`], which keeps the
//! controller logic independent of the host it runs on.

use crate::error::{Errno, HostProbeError, Result};
use crate::system::topology::CoreTopology;
use std::cell::Cell;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Set of logical core indices a thread may be scheduled on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffinityMask {
    cores: BTreeSet<usize>,
}

impl AffinityMask {
    /// Empty mask
    pub fn new() -> Self {
        Self::default()
    }

    /// Mask holding a single core
    pub fn single(core: usize) -> Self {
        Self::from_cores([core])
    }

    /// Mask holding cores `0..total`
    pub fn all(total: usize) -> Self {
        Self::from_cores(0..total)
    }

    /// Mask from arbitrary core indices (duplicates collapse)
    pub fn from_cores(cores: impl IntoIterator<Item = usize>) -> Self {
        Self {
            cores: cores.into_iter().collect(),
        }
    }

    /// Add a core to the mask
    pub fn insert(&mut self, core: usize) {
        self.cores.insert(core);
    }

    /// Whether `core` is enabled
    pub fn contains(&self, core: usize) -> bool {
        self.cores.contains(&core)
    }

    /// Number of enabled cores
    pub fn len(&self) -> usize {
        self.cores.len()
    }

    /// Whether no core is enabled
    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }

    /// Enabled cores in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.cores.iter().copied()
    }

    /// Enabled cores in ascending order
    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }

    /// Drop every index `>= total`
    pub fn restricted_to(&self, total: usize) -> Self {
        Self {
            cores: self.cores.range(..total).copied().collect(),
        }
    }

    /// Whether every core of `other` is also in `self`
    pub fn is_superset(&self, other: &AffinityMask) -> bool {
        self.cores.is_superset(&other.cores)
    }
}

impl FromIterator<usize> for AffinityMask {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self::from_cores(iter)
    }
}

/// Which kernel thread an operation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadTarget {
    /// The thread invoking the operation, resolved at call time
    #[default]
    Current,
    /// An explicit kernel thread id
    Tid(i32),
}

/// Kernel scheduler calls used by [`AffinityController`]
pub trait SchedulerBindings: std::fmt::Debug {
    /// Kernel thread id of the calling thread
    fn current_tid(&self) -> i32;

    /// Number of configured logical cores
    fn configured_cores(&self) -> usize;

    /// sched_setaffinity() for `tid`
    fn set_affinity(&self, tid: i32, mask: &AffinityMask) -> std::result::Result<(), Errno>;

    /// sched_getaffinity() for `tid`
    fn get_affinity(&self, tid: i32) -> std::result::Result<AffinityMask, Errno>;
}

/// Scheduler bindings backed by the host kernel
#[derive(Debug, Clone, Copy, Default)]
pub struct OsScheduler;

/// Number of logical cores configured on the host
///
/// Uses `_SC_NPROCESSORS_CONF` rather than the online or allowed count so
/// that a reset restores cores this thread is currently barred from.
pub fn configured_cores() -> usize {
    #[cfg(unix)]
    {
        // SAFETY: sysconf has no memory-safety preconditions.
        let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_CONF) };
        if n > 0 {
            return n as usize;
        }
    }
    num_cpus::get()
}

#[cfg(any(target_os = "linux", target_os = "android"))]
impl SchedulerBindings for OsScheduler {
    fn current_tid(&self) -> i32 {
        nix::unistd::gettid().as_raw()
    }

    fn configured_cores(&self) -> usize {
        configured_cores()
    }

    fn set_affinity(&self, tid: i32, mask: &AffinityMask) -> std::result::Result<(), Errno> {
        use nix::sched::{sched_setaffinity, CpuSet};
        use nix::unistd::Pid;

        let mut set = CpuSet::new();
        for core in mask.iter() {
            set.set(core)?;
        }
        sched_setaffinity(Pid::from_raw(tid), &set)
    }

    fn get_affinity(&self, tid: i32) -> std::result::Result<AffinityMask, Errno> {
        use nix::sched::{sched_getaffinity, CpuSet};
        use nix::unistd::Pid;

        let set = sched_getaffinity(Pid::from_raw(tid))?;
        Ok((0..CpuSet::count())
            .filter(|&core| set.is_set(core).unwrap_or(false))
            .collect())
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
impl SchedulerBindings for OsScheduler {
    fn current_tid(&self) -> i32 {
        0
    }

    fn configured_cores(&self) -> usize {
        configured_cores()
    }

    fn set_affinity(&self, _tid: i32, _mask: &AffinityMask) -> std::result::Result<(), Errno> {
        Err(Errno::ENOSYS)
    }

    fn get_affinity(&self, _tid: i32) -> std::result::Result<AffinityMask, Errno> {
        Err(Errno::ENOSYS)
    }
}

/// Pins, resets and queries the affinity of one thread
///
/// The boolean/option methods implement the caller-facing contract: they
/// never fail loudly, they log and keep the errno in
/// [`last_os_error`](Self::last_os_error). The `try_` variants return the
/// full [`HostProbeError`].
#[derive(Debug)]
pub struct AffinityController<B: SchedulerBindings = OsScheduler> {
    bindings: B,
    target: ThreadTarget,
    last_error: Cell<Option<Errno>>,
}

impl AffinityController<OsScheduler> {
    /// Controller for whichever thread calls it
    pub fn current_thread() -> Self {
        Self::with_bindings(OsScheduler, ThreadTarget::Current)
    }

    /// Controller for an explicit kernel thread id
    pub fn for_thread(tid: i32) -> Self {
        Self::with_bindings(OsScheduler, ThreadTarget::Tid(tid))
    }
}

impl<B: SchedulerBindings> AffinityController<B> {
    /// Controller over custom scheduler bindings
    pub fn with_bindings(bindings: B, target: ThreadTarget) -> Self {
        Self {
            bindings,
            target,
            last_error: Cell::new(None),
        }
    }

    /// Thread this controller applies to
    pub fn target(&self) -> ThreadTarget {
        self.target
    }

    /// Kernel thread id the next operation will hit
    pub fn resolve_tid(&self) -> i32 {
        match self.target {
            ThreadTarget::Current => self.bindings.current_tid(),
            ThreadTarget::Tid(tid) => tid,
        }
    }

    /// Number of configured logical cores
    pub fn total_cores(&self) -> usize {
        self.bindings.configured_cores()
    }

    /// errno of the most recent failed operation, cleared on success
    pub fn last_os_error(&self) -> Option<Errno> {
        self.last_error.get()
    }

    /// Restrict the thread to `core_id`
    ///
    /// The index is not checked against the core count; the kernel is the
    /// judge. Negative indices cannot be expressed in a CPU set and fail
    /// with `EINVAL` without a system call.
    pub fn try_set_affinity(&self, core_id: i32) -> Result<()> {
        let tid = self.resolve_tid();
        let result = match usize::try_from(core_id) {
            Ok(core) => self.bindings.set_affinity(tid, &AffinityMask::single(core)),
            Err(_) => Err(Errno::EINVAL),
        };
        self.record(result)
            .map_err(|errno| HostProbeError::scheduler("sched_setaffinity", tid, errno))?;

        info!(tid, core = core_id, "Pinned thread to CPU core");
        Ok(())
    }

    /// Allow the thread on every configured core, returning the core count
    pub fn try_reset_affinity(&self) -> Result<usize> {
        let tid = self.resolve_tid();
        let total = self.total_cores();
        let result = self.bindings.set_affinity(tid, &AffinityMask::all(total));
        self.record(result)
            .map_err(|errno| HostProbeError::scheduler("sched_setaffinity", tid, errno))?;

        info!(tid, cores = total, "Reset thread affinity to all cores");
        Ok(total)
    }

    /// Current mask, limited to configured core indices
    pub fn try_get_affinity(&self) -> Result<AffinityMask> {
        let tid = self.resolve_tid();
        let result = self.bindings.get_affinity(tid);
        let mask = self
            .record(result)
            .map_err(|errno| HostProbeError::scheduler("sched_getaffinity", tid, errno))?
            .restricted_to(self.total_cores());

        debug!(tid, cores = ?mask.to_vec(), "Current thread affinity");
        Ok(mask)
    }

    /// Restrict the thread to a set of cores
    pub fn try_pin_to_cores(&self, cores: &[usize]) -> Result<()> {
        let tid = self.resolve_tid();
        let result = if cores.is_empty() {
            Err(Errno::EINVAL)
        } else {
            self.bindings
                .set_affinity(tid, &AffinityMask::from_cores(cores.iter().copied()))
        };
        self.record(result)
            .map_err(|errno| HostProbeError::scheduler("sched_setaffinity", tid, errno))?;

        info!(tid, cores = ?cores, "Pinned thread to CPU cores");
        Ok(())
    }

    /// Pin to `core_id`; `false` on any failure
    pub fn set_affinity(&self, core_id: i32) -> bool {
        self.try_set_affinity(core_id)
            .map_err(|e| warn!(error = %e, core = core_id, "Failed to set CPU affinity"))
            .is_ok()
    }

    /// Allow all configured cores; `false` on any failure
    pub fn reset_affinity(&self) -> bool {
        self.try_reset_affinity()
            .map_err(|e| warn!(error = %e, "Failed to reset CPU affinity"))
            .is_ok()
    }

    /// Current mask, or `None` if the kernel query failed
    pub fn get_affinity(&self) -> Option<AffinityMask> {
        self.try_get_affinity()
            .map_err(|e| warn!(error = %e, "Failed to get CPU affinity"))
            .ok()
    }

    /// Pin to a set of cores; `false` on any failure
    pub fn pin_to_cores(&self, cores: &[usize]) -> bool {
        self.try_pin_to_cores(cores)
            .map_err(|e| warn!(error = %e, cores = ?cores, "Failed to pin to CPU cores"))
            .is_ok()
    }

    /// Pin to the big cores of `topology`, or reset when none were detected
    pub fn pin_to_big_cores(&self, topology: &CoreTopology) -> bool {
        let big = topology.big_cores();
        if big.is_empty() {
            debug!("No big cores detected, allowing all cores");
            return self.reset_affinity();
        }
        self.pin_to_cores(&big)
    }

    fn record<T>(&self, result: std::result::Result<T, Errno>) -> std::result::Result<T, Errno> {
        self.last_error.set(result.as_ref().err().copied());
        result
    }
}
