//! # Kernel Subsystems
//!
//! The subsystems brought up at boot, in dependency order. Memory comes
//! first because every later initializer may assume a working allocator.
//! Memory and hot-services are boot-critical; devices, filesystem and
//! graphics are not.
//!
//! Apart from the memory manager's allocator check these are placeholders:
//! they report ready and log what they will eventually do.

use crate::error::AbortSignal;
use crate::module::{ModuleDescriptor, Readiness, Subsystem};
use alloc::vec::Vec;
use log::{debug, info};

pub const MEMORY: &str = "memory";
pub const DEVICES: &str = "devices";
pub const FILESYSTEM: &str = "filesystem";
pub const GRAPHICS: &str = "graphics";
pub const HOT_SERVICES: &str = "hot-services";

/// Boot order of the subsystems.
pub const BOOT_ORDER: [&str; 5] = [MEMORY, DEVICES, FILESYSTEM, GRAPHICS, HOT_SERVICES];

/// Bytes the memory manager reserves to prove the allocator works.
const ALLOCATOR_PROBE_BYTES: usize = 64 * 1024;

/// Memory manager.
#[derive(Debug)]
pub struct MemoryManager {
    probe_bytes: usize,
}

impl MemoryManager {
    #[must_use]
    pub const fn new(probe_bytes: usize) -> Self {
        Self { probe_bytes }
    }
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self::new(ALLOCATOR_PROBE_BYTES)
    }
}

impl Subsystem for MemoryManager {
    fn initialize(&mut self) -> Readiness {
        let mut probe: Vec<u8> = Vec::new();
        if probe.try_reserve_exact(self.probe_bytes).is_err() {
            return Readiness::NotReady("boot allocator refused the probe reservation");
        }
        info!(target: MEMORY, "boot allocator serves {} byte reservations", self.probe_bytes);
        Readiness::Ready
    }
}

/// Device drivers.
#[derive(Debug, Default)]
pub struct DeviceManager;

impl Subsystem for DeviceManager {
    fn initialize(&mut self) -> Readiness {
        debug!(target: DEVICES, "no drivers registered");
        Readiness::Ready
    }
}

/// Filesystem layer.
#[derive(Debug, Default)]
pub struct FileSystem;

impl Subsystem for FileSystem {
    fn initialize(&mut self) -> Readiness {
        debug!(target: FILESYSTEM, "no volumes mounted");
        Readiness::Ready
    }
}

/// Graphics stack.
#[derive(Debug, Default)]
pub struct Graphics;

impl Subsystem for Graphics {
    fn initialize(&mut self) -> Readiness {
        debug!(target: GRAPHICS, "text mode only");
        Readiness::Ready
    }
}

/// Scheduler, interrupts and system calls.
#[derive(Debug, Default)]
pub struct HotServices;

impl Subsystem for HotServices {
    fn initialize(&mut self) -> Readiness {
        debug!(target: HOT_SERVICES, "scheduler idle, interrupts masked, no syscalls");
        Readiness::Ready
    }
}

/// All kernel subsystems.
#[derive(Debug, Default)]
pub struct Subsystems {
    pub memory: MemoryManager,
    pub devices: DeviceManager,
    pub filesystem: FileSystem,
    pub graphics: Graphics,
    pub hot_services: HotServices,
}

impl Subsystems {
    /// Module descriptors in [`BOOT_ORDER`].
    pub fn descriptors(&mut self) -> [ModuleDescriptor<'_>; 5] {
        [
            ModuleDescriptor::fatal(MEMORY, AbortSignal::ResourceExhaustion, &mut self.memory),
            ModuleDescriptor::recoverable(DEVICES, &mut self.devices),
            ModuleDescriptor::recoverable(FILESYSTEM, &mut self.filesystem),
            ModuleDescriptor::recoverable(GRAPHICS, &mut self.graphics),
            ModuleDescriptor::fatal(HOT_SERVICES, AbortSignal::DeviceError, &mut self.hot_services),
        ]
    }
}
