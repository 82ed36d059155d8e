use crate::config::BootConfig;
use crate::env::{FirmwareEnv, KernelEnv};
use crate::error::{AbortSignal, BootError};
use crate::exit::exit_boot_services;
use crate::firmware::BootServices;
use crate::init_table::InitTable;
use crate::memory_map::MemoryMapSnapshot;
use crate::module::ModuleDescriptor;
use crate::sequencer::{BootReport, Sequencer};
use log::{info, warn};
use uefi_raw::Status;

/// Everything the kernel owns after a successful bootstrap.
#[derive(Debug)]
pub struct Handoff {
    pub env: KernelEnv,
    pub memory_map: MemoryMapSnapshot,
    pub report: BootReport,
}

/// Result of the bootstrap sequence.
#[derive(Debug)]
pub enum BootOutcome {
    /// Enter the steady-state loop.
    Proceed(Handoff),
    /// Return the signal's status code to the firmware loader.
    Abort(AbortSignal),
}

impl BootOutcome {
    /// Firmware status to return, or `None` when the boot proceeds.
    #[must_use]
    pub const fn status(&self) -> Option<Status> {
        match self {
            Self::Proceed(_) => None,
            Self::Abort(signal) => Some(signal.status()),
        }
    }
}

/// Runs the bootstrap: constructors, module bring-up, boot-service exit.
///
/// On abort the destructors run before this returns, since the boot body
/// is then handing control back to the firmware.
pub fn boot<B: BootServices>(
    env: FirmwareEnv<B>,
    init: &InitTable<'_>,
    modules: &mut [ModuleDescriptor<'_>],
    config: &BootConfig,
) -> BootOutcome {
    init.run_constructors();

    match bring_up(env, modules, config) {
        Ok(handoff) => BootOutcome::Proceed(handoff),
        Err(err) => {
            // The failure itself was reported where it happened.
            let signal = err.abort_signal();
            info!(target: "boot", "aborting boot, returning {:?} to the firmware", signal.status());
            init.run_destructors();
            BootOutcome::Abort(signal)
        }
    }
}

fn bring_up<B: BootServices>(
    env: FirmwareEnv<B>,
    modules: &mut [ModuleDescriptor<'_>],
    config: &BootConfig,
) -> Result<Handoff, BootError> {
    let report = Sequencer::new().run(modules)?;
    if report.is_degraded() {
        warn!(target: "boot", "booting degraded, not ready: {:?}", report.degraded);
    } else {
        info!(target: "boot", "all {} modules ready", report.ready.len());
    }

    let (env, memory_map) = exit_boot_services(env, config)?;
    Ok(Handoff {
        env,
        memory_map,
        report,
    })
}
