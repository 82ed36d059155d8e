#![allow(dead_code)]

use kernel_boot::{
    BootServices, FirmwareEnv, ImageHandle, MapKey, MapMeta, MapQueryError, Status,
    SystemTableRef,
};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::Once;
use uefi_raw::table::boot::{MemoryAttribute, MemoryDescriptor, MemoryType};

/// A captured log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub level: Level,
    pub target: String,
    pub message: String,
}

thread_local! {
    static LINES: RefCell<Vec<Line>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        LINES.with(|lines| {
            lines.borrow_mut().push(Line {
                level: record.level(),
                target: record.target().to_owned(),
                message: record.args().to_string(),
            });
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INSTALL: Once = Once::new();

/// Routes log records of the current test thread into a buffer.
pub fn capture_logs() {
    INSTALL.call_once(|| {
        log::set_logger(&LOGGER).expect("no other logger in tests");
        log::set_max_level(LevelFilter::Trace);
    });
    LINES.with(|lines| lines.borrow_mut().clear());
}

pub fn logged() -> Vec<Line> {
    LINES.with(|lines| lines.borrow().clone())
}

pub fn logged_at(level: Level) -> Vec<Line> {
    logged().into_iter().filter(|l| l.level == level).collect()
}

/// Firmware calls, in the order they were made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    /// Zero-sized query.
    Probe,
    /// Query into a buffer that turned out too small.
    SnapshotTooSmall,
    /// Successful query returning this key.
    Snapshot(MapKey),
    /// Exit attempt with this key.
    Exit(MapKey),
}

/// How the firmware answers the zero-sized probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeAnswer {
    BufferTooSmall,
    Success,
    Fail(Status),
}

/// A deterministic UEFI double.
///
/// Keys start at 1 and change whenever the map changes. `churn` makes the
/// map change right before the next N exit calls, so the keys they are
/// given are stale.
pub struct ScriptedFirmware {
    pub descriptors: Vec<MemoryDescriptor>,
    pub desc_size: usize,
    pub key: usize,
    pub probe: ProbeAnswer,
    pub churn: usize,
    /// Descriptors added by the firmware before the first snapshot.
    pub growth_before_snapshot: usize,
    pub exit_failure: Option<Status>,
    pub snapshot_failure: Option<Status>,
    pub exited: bool,
    pub calls: Vec<Call>,
}

/// OVMF-style descriptor stride.
pub const DESC_SIZE: usize = 48;

impl ScriptedFirmware {
    pub fn new() -> Self {
        Self {
            descriptors: vec![
                descriptor(MemoryType::BOOT_SERVICES_CODE, 0x0, 160),
                descriptor(MemoryType::CONVENTIONAL, 0x10_0000, 0x700),
                descriptor(MemoryType::LOADER_DATA, 0x80_0000, 64),
                descriptor(MemoryType::ACPI_NON_VOLATILE, 0x7fe0_0000, 32),
            ],
            desc_size: DESC_SIZE,
            key: 1,
            probe: ProbeAnswer::BufferTooSmall,
            churn: 0,
            growth_before_snapshot: 0,
            exit_failure: None,
            snapshot_failure: None,
            exited: false,
            calls: Vec::new(),
        }
    }

    pub fn map_size(&self) -> usize {
        self.descriptors.len() * self.desc_size
    }

    fn change_map(&mut self) {
        self.descriptors
            .push(descriptor(MemoryType::LOADER_DATA, 0x1000_0000, 1));
        self.key += 1;
    }

    fn too_small(&self) -> MapQueryError {
        MapQueryError {
            status: Status::BUFFER_TOO_SMALL,
            required_size: self.map_size(),
            desc_size: self.desc_size,
        }
    }

    fn meta(&self) -> MapMeta {
        MapMeta {
            map_size: self.map_size(),
            key: MapKey(self.key),
            desc_size: self.desc_size,
            desc_version: 1,
        }
    }

    pub fn exits(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Exit(_)))
            .count()
    }

    pub fn snapshots(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Snapshot(_)))
            .count()
    }
}

impl BootServices for ScriptedFirmware {
    fn get_memory_map(&mut self, buffer: &mut [u8]) -> Result<MapMeta, MapQueryError> {
        assert!(!self.exited, "memory map queried after boot services exited");

        if buffer.is_empty() {
            self.calls.push(Call::Probe);
            return match self.probe {
                ProbeAnswer::BufferTooSmall => Err(self.too_small()),
                ProbeAnswer::Success => Ok(self.meta()),
                ProbeAnswer::Fail(status) => Err(MapQueryError {
                    status,
                    required_size: 0,
                    desc_size: 0,
                }),
            };
        }

        if let Some(status) = self.snapshot_failure {
            return Err(MapQueryError {
                status,
                required_size: 0,
                desc_size: 0,
            });
        }

        while self.growth_before_snapshot > 0 {
            self.growth_before_snapshot -= 1;
            self.change_map();
        }

        if buffer.len() < self.map_size() {
            self.calls.push(Call::SnapshotTooSmall);
            return Err(self.too_small());
        }

        for (i, desc) in self.descriptors.iter().enumerate() {
            let slot = &mut buffer[i * self.desc_size..(i + 1) * self.desc_size];
            unsafe {
                std::ptr::write_unaligned(slot.as_mut_ptr().cast::<MemoryDescriptor>(), *desc);
            }
        }

        self.calls.push(Call::Snapshot(MapKey(self.key)));
        Ok(self.meta())
    }

    unsafe fn exit_boot_services(&mut self, _image: ImageHandle, key: MapKey) -> Status {
        assert!(!self.exited, "boot services exited twice");
        self.calls.push(Call::Exit(key));

        if self.churn > 0 {
            self.churn -= 1;
            self.change_map();
        }
        if let Some(status) = self.exit_failure {
            return status;
        }
        if key != MapKey(self.key) {
            return Status::INVALID_PARAMETER;
        }

        self.exited = true;
        Status::SUCCESS
    }
}

pub fn descriptor(ty: MemoryType, phys_start: u64, page_count: u64) -> MemoryDescriptor {
    MemoryDescriptor {
        ty,
        phys_start,
        virt_start: 0,
        page_count,
        att: MemoryAttribute::WRITE_BACK,
    }
}

/// Captures an environment that borrows `firmware`, so the journal can be
/// inspected once the environment is consumed.
pub fn firmware_env(firmware: &mut ScriptedFirmware) -> FirmwareEnv<&mut ScriptedFirmware> {
    FirmwareEnv::capture(
        SystemTableRef::new(NonNull::<c_void>::dangling()),
        ImageHandle::new(NonNull::<c_void>::dangling()),
        firmware,
    )
}
