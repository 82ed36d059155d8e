//! # UEFI Kernel Entry
//!
//! The firmware loads this image and calls [`efi_main`]. From there the
//! kernel bootstraps itself in place, with no separate loader stage:
//!
//! ```text
//! UEFI Firmware
//!         ↓  efi_main(image, system table)
//! ┌─────────────────────────────────────────────┐
//! │  1. Capture the firmware environment        │
//! │  2. Constructors                            │
//! │     • UART bring-up                         │
//! │     • Logger (serial + firmware console)    │
//! │     • Firmware banner                       │
//! │  3. Module bootstrap                        │
//! │     memory → devices → filesystem →         │
//! │     graphics → hot-services                 │
//! │  4. Exit boot services                      │
//! │     probe → snapshot → exit (re-query on    │
//! │     stale key)                              │
//! └─────────────────────────────────────────────┘
//!         ↓                          ↓
//!   steady-state loop         abort: destructors,
//!   (never returns)           status to firmware
//! ```
//!
//! A fatal module failure returns `OUT_OF_RESOURCES` (memory) or
//! `DEVICE_ERROR` (everything else) to the firmware. Null entry references
//! also end in `DEVICE_ERROR`. After boot services are gone, all output goes
//! to COM1 only.
//!
//! ## Running
//!
//! ```bash
//! qemu-system-x86_64 -bios OVMF.fd -drive format=raw,file=fat:rw:esp -serial stdio
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![no_main]
#![allow(unsafe_code)]

mod logger;
mod memory;
mod services;
mod tracing;

use crate::logger::UefiLogger;
use crate::services::UefiBootServices;
use crate::tracing::trace_handoff;
use core::ptr::{self, NonNull};
use kernel_boot::subsystems::Subsystems;
use kernel_boot::{
    AbortSignal, BootConfig, BootOutcome, FirmwareEnv, InitFn, InitTable, SteadyState,
};
use kernel_serial::{SerialLogger, serial_trace};
use log::info;
use uefi::prelude::*;

const CONFIG: BootConfig = BootConfig::DEFAULT;

// SAFETY: COM1 is the platform's diagnostic UART and nothing else drives it.
static LOGGER: UefiLogger = UefiLogger::new(unsafe { SerialLogger::com1(CONFIG.max_level) });

static CONSTRUCTORS: [Option<InitFn>; 3] =
    [Some(init_serial), Some(install_logger), Some(announce_firmware)];
static DESTRUCTORS: [Option<InitFn>; 1] = [Some(announce_return)];
static INIT: InitTable<'static> = InitTable::new(&CONSTRUCTORS, &DESTRUCTORS);

fn init_serial() {
    LOGGER.serial().port().init();
}

fn install_logger() {
    if LOGGER.init().is_err() {
        serial_trace!("[boot] WARN: a logger was already installed\n");
    }
}

fn announce_firmware() {
    info!(
        target: "boot",
        "firmware {} rev {:#x}, UEFI {}",
        uefi::system::firmware_vendor(),
        uefi::system::firmware_revision(),
        uefi::system::uefi_revision()
    );
}

fn announce_return() {
    info!(target: "boot", "returning control to the firmware");
}

/// The status an abort hands back to the firmware.
const fn abort(signal: AbortSignal) -> Status {
    Status(signal.status().0)
}

#[entry]
fn efi_main() -> Status {
    let system_table = uefi::table::system_table_raw();
    // SAFETY: the entry macro installed the table the firmware passed in;
    // boot services are active, so reading its fields is sound.
    let boot_services = system_table
        .and_then(|table| NonNull::new(unsafe { (*table.as_ptr()).boot_services }))
        .map(|table| UefiBootServices::new(table, &LOGGER));
    let env = match FirmwareEnv::try_capture(
        system_table.map_or(ptr::null_mut(), |table| table.as_ptr().cast()),
        boot::image_handle().as_ptr(),
        boot_services,
    ) {
        Ok(env) => env,
        Err(signal) => return abort(signal),
    };

    if uefi::helpers::init().is_err() {
        return abort(AbortSignal::DeviceError);
    }
    uefi::println!("hello");

    let mut subsystems = Subsystems::default();
    match kernel_boot::boot(env, &INIT, &mut subsystems.descriptors(), &CONFIG) {
        BootOutcome::Proceed(handoff) => {
            trace_handoff(&handoff);
            SteadyState::new(CONFIG.heartbeat_interval).run()
        }
        BootOutcome::Abort(signal) => abort(signal),
    }
}

#[cfg(not(test))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    serial_trace!("[kernel] PANIC: {info}\n");
    loop {
        core::hint::spin_loop();
    }
}
