//! # Kernel Bootstrap
//!
//! This crate is the earliest-boot handoff layer of the kernel: everything
//! between the firmware calling our entry point and the kernel owning the
//! machine. It is written against a small firmware abstraction
//! ([`BootServices`]) so the whole sequence runs, and is tested, on the host.
//!
//! ## Boot Sequence
//!
//! ```text
//! UEFI Firmware
//!         ↓  efi_main(image, system table)
//! ┌─────────────────────────────────────────────┐
//! │  1. Firmware Service Capture                │
//! │     • FirmwareEnv::capture                  │
//! │  2. Static Initialization                   │
//! │     • InitTable::run_constructors           │
//! │  3. Module Bootstrap                        │
//! │     • memory → devices → filesystem         │
//! │       → graphics → hot-services             │
//! │     • fatal failure: abort to firmware      │
//! │     • recoverable failure: warn, continue   │
//! │  4. Boot-Service Exit                       │
//! │     • size probe (expects BUFFER_TOO_SMALL) │
//! │     • snapshot + ExitBootServices(key)      │
//! │     • stale key: re-query, then retry       │
//! │  5. Steady State                            │
//! │     • never returns                         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Execution is single-threaded and strictly sequential. Nothing here yields,
//! and nothing but the stale-map-key path retries.
//!
//! ## Outcomes
//!
//! [`boot`] yields a [`BootOutcome`]: either a [`Handoff`] to enter the
//! steady-state loop with, or an [`AbortSignal`] that the entry routine
//! converts into a firmware status code:
//!
//! | Failure                                   | Signal                |
//! |-------------------------------------------|-----------------------|
//! | memory manager initializer                | `OUT_OF_RESOURCES`    |
//! | hot-services initializer                  | `DEVICE_ERROR`        |
//! | unexpected memory-map or exit result      | `DEVICE_ERROR`        |
//!
//! ## Environment Lifetime
//!
//! The firmware references live in a [`FirmwareEnv`] that is passed along
//! explicitly. The exit protocol consumes it and hands back a [`KernelEnv`]
//! which has no access to boot services anymore, so using boot services
//! after the handoff does not type-check.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

extern crate alloc;

mod bootstrap;
pub mod config;
pub mod env;
mod error;
pub mod exit;
pub mod firmware;
pub mod init_table;
pub mod memory_map;
pub mod module;
pub mod sequencer;
pub mod steady;
pub mod subsystems;

pub use bootstrap::{BootOutcome, Handoff, boot};
pub use config::BootConfig;
pub use env::{FirmwareEnv, ImageHandle, KernelEnv, SystemTableRef};
pub use error::{AbortSignal, BootError};
pub use firmware::{BootServices, MapKey, MapMeta, MapQueryError};
pub use init_table::{InitFn, InitTable};
pub use memory_map::MemoryMapSnapshot;
pub use module::{ModuleDescriptor, Readiness, Severity, Subsystem};
pub use sequencer::{BootReport, Sequencer, SequencerState};
pub use steady::SteadyState;
pub use uefi_raw::Status;
