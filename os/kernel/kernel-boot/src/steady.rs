//! # Kernel Steady-State Loop
//!
//! The terminal state after the handoff. Interrupt handling, scheduling and
//! system-call dispatch will be driven from here; for now each pass only
//! counts, and every [`BootConfig::heartbeat_interval`](crate::BootConfig)
//! passes a heartbeat goes out on the diagnostic channel.
//!
//! Whatever gets added to [`SteadyState::poll`] must not block: the loop has
//! to stay live forever and never returns to the firmware.

use core::hint::spin_loop;
use log::{debug, info};

/// The kernel's main loop.
#[derive(Debug)]
pub struct SteadyState {
    interval: u64,
    iterations: u64,
    heartbeats: u64,
}

impl SteadyState {
    /// A loop emitting one heartbeat every `interval` passes (at least 1).
    #[must_use]
    pub const fn new(interval: u64) -> Self {
        Self {
            interval: if interval == 0 { 1 } else { interval },
            iterations: 0,
            heartbeats: 0,
        }
    }

    #[must_use]
    pub const fn heartbeats(&self) -> u64 {
        self.heartbeats
    }

    /// One pass of the loop body. Returns `true` if it emitted a heartbeat.
    pub fn poll(&mut self) -> bool {
        self.iterations = self.iterations.wrapping_add(1);
        if !self.iterations.is_multiple_of(self.interval) {
            return false;
        }

        self.heartbeats = self.heartbeats.wrapping_add(1);
        debug!(target: "kernel", "heartbeat {}", self.heartbeats);
        true
    }

    /// Runs the loop. Never returns.
    pub fn run(mut self) -> ! {
        info!(target: "kernel", "entering steady state");
        loop {
            self.poll();
            spin_loop();
        }
    }
}
