//! # Build-Time Boot Configuration
//!
//! The bootstrap has no runtime configuration surface. All tunables are
//! compile-time constants, checked by `const` assertions below.

use log::LevelFilter;

/// Bootstrap tunables.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BootConfig {
    /// Most verbose level the boot loggers emit.
    pub max_level: LevelFilter,

    /// Upper bound on snapshot + exit rounds. Each stale map key or
    /// regrown snapshot buffer consumes one round.
    pub max_exit_attempts: usize,

    /// Extra descriptor slots allocated on top of the probed map size.
    /// Allocating the snapshot buffer can itself add descriptors.
    pub mmap_slack_descriptors: usize,

    /// Steady-state loop iterations between two heartbeat diagnostics.
    pub heartbeat_interval: u64,
}

impl BootConfig {
    pub const DEFAULT: Self = Self {
        max_level: LevelFilter::Debug,
        max_exit_attempts: 8,
        mmap_slack_descriptors: 8,
        heartbeat_interval: 1 << 24,
    };
}

impl Default for BootConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

const _: () = assert!(
    BootConfig::DEFAULT.max_exit_attempts > 0,
    "at least one exit attempt is required"
);

const _: () = assert!(
    BootConfig::DEFAULT.heartbeat_interval > 0,
    "heartbeat interval must be non-zero"
);
