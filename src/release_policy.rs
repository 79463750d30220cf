//! Resource-pressure policy for manually released surfaces.
//!
//! Decoded buffers returned by uncached lookups are released by the caller.
//! After every `interval` releases the policy runs a sweep action, letting the
//! host trim allocator or GPU texture pools that do not shrink on their own.

use crate::config::DEFAULT_RELEASE_SWEEP_INTERVAL;
use log::debug;

type SweepAction = Box<dyn FnMut() + Send>;

/// Counts releases and runs a sweep every `interval` of them.
pub struct ReleasePolicy {
    interval: u32,
    pending: u32,
    sweeps: u64,
    sweep: SweepAction,
}

impl ReleasePolicy {
    /// Policy whose sweep only logs a debug line and counts itself in
    /// [`sweeps`](Self::sweeps). Hosts that own a real reclaim step (trimming
    /// allocator arenas, dropping idle GPU textures) pass it to
    /// [`with_sweep`](Self::with_sweep) instead. An interval of 0 disables
    /// sweeping.
    pub fn new(interval: u32) -> Self {
        Self::with_sweep(interval, || debug!("Release sweep threshold reached"))
    }

    pub fn with_sweep(interval: u32, sweep: impl FnMut() + Send + 'static) -> Self {
        Self {
            interval,
            pending: 0,
            sweeps: 0,
            sweep: Box::new(sweep),
        }
    }

    /// Records one release, sweeping when the interval is reached.
    pub fn record_release(&mut self) {
        if self.interval == 0 {
            return;
        }
        self.pending += 1;
        if self.pending >= self.interval {
            self.pending = 0;
            self.sweeps += 1;
            (self.sweep)();
        }
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Sweeps run so far.
    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }
}

impl Default for ReleasePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RELEASE_SWEEP_INTERVAL)
    }
}

impl std::fmt::Debug for ReleasePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleasePolicy")
            .field("interval", &self.interval)
            .field("pending", &self.pending)
            .field("sweeps", &self.sweeps)
            .finish()
    }
}
