//! # Boot-Service Exit Protocol
//!
//! Leaving the firmware environment is a two-phase handshake:
//!
//! 1. **Size probe.** Query the memory map with an empty buffer. The firmware
//!    must answer `BUFFER_TOO_SMALL` along with the required size. Anything
//!    else, success included, aborts the boot.
//! 2. **Snapshot + exit.** Allocate a buffer (with slack, since the
//!    allocation itself may add descriptors), query the map into it, and
//!    call `ExitBootServices` with the key of *that* query.
//!
//! If the exit call rejects the key as stale, the map changed between
//! snapshot and exit. The only correct reaction is a fresh query followed by
//! a fresh exit call; retrying exit with the old key would never succeed.
//! Rounds are bounded by [`BootConfig::max_exit_attempts`].
//!
//! From the first exit call on, boot services are treated as gone no matter
//! what the firmware answers: only the serial channel is used for output and
//! nothing is allocated. A re-query that no longer fits the buffer is fatal.

use crate::config::BootConfig;
use crate::env::{FirmwareEnv, ImageHandle, KernelEnv};
use crate::error::BootError;
use crate::firmware::{BootServices, MapMeta};
use crate::memory_map::{MapBuffer, MemoryMapSnapshot};
use core::mem::size_of;
use log::{debug, error, info, warn};
use uefi_raw::Status;
use uefi_raw::table::boot::MemoryDescriptor;

/// Sizes reported by the probe query.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MapProbe {
    pub required_size: usize,
    pub desc_size: usize,
}

impl MapProbe {
    /// Buffer size for the snapshot: the required size plus `slack` spare
    /// descriptors.
    #[must_use]
    pub const fn buffer_size(&self, slack: usize) -> usize {
        self.required_size + slack * self.desc_size
    }
}

/// Exits boot services, consuming the firmware environment.
///
/// # Errors
/// Any [`BootError`] other than [`BootError::FatalModule`]; all of them
/// abort the boot with a device error.
pub fn exit_boot_services<B: BootServices>(
    env: FirmwareEnv<B>,
    config: &BootConfig,
) -> Result<(KernelEnv, MemoryMapSnapshot), BootError> {
    let (system_table, image, mut services) = env.into_parts();

    info!(target: "boot", "exiting boot services ...");
    let mut probe = probe_map_size(&mut services)?;
    debug!(
        target: "boot",
        "memory map needs {} bytes ({} byte descriptors)",
        probe.required_size,
        probe.desc_size
    );

    let mut buffer = MapBuffer::with_size(probe.buffer_size(config.mmap_slack_descriptors));
    let mut exit_attempted = false;
    let mut last_round_regrew = false;

    for attempt in 1..=config.max_exit_attempts {
        let meta = match services.get_memory_map(buffer.as_bytes_mut()) {
            Ok(meta) => meta,
            Err(err) if err.is_buffer_too_small() && !exit_attempted => {
                // Our own allocation grew the map past the slack.
                debug!(
                    target: "boot",
                    "memory map grew to {} bytes, regrowing buffer",
                    err.required_size
                );
                probe = MapProbe {
                    required_size: err.required_size,
                    desc_size: normalize_desc_size(err.desc_size),
                };
                buffer = MapBuffer::with_size(probe.buffer_size(config.mmap_slack_descriptors));
                last_round_regrew = true;
                continue;
            }
            Err(err) => {
                error!(target: "boot", "memory map snapshot failed: {:?}", err.status);
                return Err(BootError::SnapshotFailed(err.status));
            }
        };

        last_round_regrew = false;
        exit_attempted = true;
        if try_exit(&mut services, image, &meta)? {
            info!(target: "boot", "boot services exited after {attempt} attempt(s)");
            let snapshot = MemoryMapSnapshot::new(buffer, meta);
            return Ok((KernelEnv::new(system_table, image), snapshot));
        }

        warn!(target: "boot", "memory map key {:?} went stale, querying again", meta.key);
    }

    if last_round_regrew {
        error!(
            target: "boot",
            "memory map still outgrows its buffer after {} attempts",
            config.max_exit_attempts
        );
        return Err(BootError::SnapshotFailed(Status::BUFFER_TOO_SMALL));
    }

    error!(
        target: "boot",
        "giving up on exiting boot services after {} attempts",
        config.max_exit_attempts
    );
    Err(BootError::StaleMapKey {
        attempts: config.max_exit_attempts,
    })
}

/// Phase one: learn the map size from an empty query.
///
/// # Errors
/// [`BootError::ProbeUnexpectedSuccess`] if the empty query succeeds, or
/// [`BootError::ProbeFailed`] for any status besides `BUFFER_TOO_SMALL`.
pub fn probe_map_size<B: BootServices>(services: &mut B) -> Result<MapProbe, BootError> {
    match services.get_memory_map(&mut []) {
        Ok(meta) => {
            // A firmware could legitimately report an empty map here. We
            // still refuse: there is nothing to hand the kernel in that case.
            error!(
                target: "boot",
                "zero-sized memory map query succeeded (map size {}); refusing to continue",
                meta.map_size
            );
            Err(BootError::ProbeUnexpectedSuccess)
        }
        Err(err) if err.is_buffer_too_small() => Ok(MapProbe {
            required_size: err.required_size,
            desc_size: normalize_desc_size(err.desc_size),
        }),
        Err(err) => {
            error!(target: "boot", "memory map size probe failed: {:?}", err.status);
            Err(BootError::ProbeFailed(err.status))
        }
    }
}

/// Calls `ExitBootServices` with the key of `meta`.
///
/// Returns `Ok(false)` when the key was stale and the map must be queried
/// again.
fn try_exit<B: BootServices>(
    services: &mut B,
    image: ImageHandle,
    meta: &MapMeta,
) -> Result<bool, BootError> {
    // SAFETY: nothing derived from boot services outlives this call; the
    // snapshot buffer is ours and the environment has been consumed.
    let status = unsafe { services.exit_boot_services(image, meta.key) };
    match status {
        Status::SUCCESS => Ok(true),
        Status::INVALID_PARAMETER => Ok(false),
        other => {
            error!(target: "boot", "ExitBootServices failed: {other:?}");
            Err(BootError::ExitFailed(other))
        }
    }
}

fn normalize_desc_size(reported: usize) -> usize {
    reported.max(size_of::<MemoryDescriptor>())
}
