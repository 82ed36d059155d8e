//! # UEFI Memory Map Snapshot
//!
//! The descriptor buffer obtained by the last successful memory-map query,
//! together with its key. Descriptors are read at the firmware-reported
//! stride, which can be larger than [`MemoryDescriptor`] itself.

use crate::firmware::{MapKey, MapMeta};
use alloc::vec;
use alloc::vec::Vec;
use core::mem::size_of;
use uefi_raw::table::boot::{MemoryDescriptor, MemoryType};

/// UEFI pages are 4 KiB regardless of the CPU page size.
pub const UEFI_PAGE_SIZE: u64 = 4096;

/// An 8-byte aligned byte buffer for the firmware to fill with descriptors.
#[derive(Debug, Default)]
pub struct MapBuffer {
    words: Vec<u64>,
}

impl MapBuffer {
    /// A zeroed buffer of at least `bytes` bytes.
    #[must_use]
    pub fn with_size(bytes: usize) -> Self {
        Self {
            words: vec![0; bytes.div_ceil(size_of::<u64>())],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len() * size_of::<u64>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: u64 has no padding and every bit pattern is a valid u8 sequence.
        unsafe { core::slice::from_raw_parts(self.words.as_ptr().cast::<u8>(), self.len()) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let len = self.len();
        // SAFETY: as above; any bytes written form valid u64 values.
        unsafe { core::slice::from_raw_parts_mut(self.words.as_mut_ptr().cast::<u8>(), len) }
    }
}

/// The memory map the kernel took ownership with.
#[derive(Debug)]
pub struct MemoryMapSnapshot {
    buffer: MapBuffer,
    meta: MapMeta,
}

impl MemoryMapSnapshot {
    #[must_use]
    pub fn new(buffer: MapBuffer, meta: MapMeta) -> Self {
        debug_assert!(meta.map_size <= buffer.len());
        Self { buffer, meta }
    }

    #[must_use]
    pub const fn key(&self) -> MapKey {
        self.meta.key
    }

    #[must_use]
    pub const fn meta(&self) -> &MapMeta {
        &self.meta
    }

    /// The raw descriptor bytes as written by the firmware.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        let len = self.meta.map_size.min(self.buffer.len());
        &self.buffer.as_bytes()[..len]
    }

    /// Number of complete descriptors in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.meta.desc_size < size_of::<MemoryDescriptor>() {
            return 0;
        }
        self.as_bytes().len() / self.meta.desc_size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn descriptors(&self) -> Descriptors<'_> {
        Descriptors {
            bytes: self.as_bytes(),
            stride: self.meta.desc_size,
            index: 0,
            count: self.len(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> MemoryMapSummary {
        let mut summary = MemoryMapSummary::default();
        for desc in self.descriptors() {
            summary.descriptors += 1;
            summary.total_pages += desc.page_count;
            if is_usable_after_exit(desc.ty) {
                summary.usable_pages += desc.page_count;
            }
        }
        summary
    }
}

/// Iterator over the descriptors of a [`MemoryMapSnapshot`].
pub struct Descriptors<'a> {
    bytes: &'a [u8],
    stride: usize,
    index: usize,
    count: usize,
}

impl Iterator for Descriptors<'_> {
    type Item = MemoryDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }
        let offset = self.index * self.stride;
        self.index += 1;

        let record = &self.bytes[offset..offset + size_of::<MemoryDescriptor>()];
        // SAFETY: `record` spans a full descriptor; the read tolerates any alignment.
        Some(unsafe { core::ptr::read_unaligned(record.as_ptr().cast::<MemoryDescriptor>()) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count - self.index;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Descriptors<'_> {}

/// Page totals of a memory map.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct MemoryMapSummary {
    pub descriptors: usize,
    pub total_pages: u64,
    /// Pages free for the kernel once boot services are gone.
    pub usable_pages: u64,
}

impl MemoryMapSummary {
    #[must_use]
    pub const fn usable_bytes(&self) -> u64 {
        self.usable_pages * UEFI_PAGE_SIZE
    }
}

/// Conventional memory plus everything the loader and boot services held.
#[must_use]
pub fn is_usable_after_exit(ty: MemoryType) -> bool {
    matches!(
        ty,
        MemoryType::CONVENTIONAL
            | MemoryType::LOADER_CODE
            | MemoryType::LOADER_DATA
            | MemoryType::BOOT_SERVICES_CODE
            | MemoryType::BOOT_SERVICES_DATA
    )
}

/// Human-readable name of a UEFI memory type.
#[must_use]
pub fn memory_type_name(ty: MemoryType) -> &'static str {
    match ty {
        MemoryType::RESERVED => "Reserved",
        MemoryType::LOADER_CODE => "LoaderCode",
        MemoryType::LOADER_DATA => "LoaderData",
        MemoryType::BOOT_SERVICES_CODE => "BootServicesCode",
        MemoryType::BOOT_SERVICES_DATA => "BootServicesData",
        MemoryType::RUNTIME_SERVICES_CODE => "RuntimeServicesCode",
        MemoryType::RUNTIME_SERVICES_DATA => "RuntimeServicesData",
        MemoryType::CONVENTIONAL => "Conventional",
        MemoryType::UNUSABLE => "Unusable",
        MemoryType::ACPI_RECLAIM => "AcpiReclaim",
        MemoryType::ACPI_NON_VOLATILE => "AcpiNvs",
        MemoryType::MMIO => "Mmio",
        MemoryType::MMIO_PORT_SPACE => "MmioPortSpace",
        MemoryType::PAL_CODE => "PalCode",
        MemoryType::PERSISTENT_MEMORY => "Persistent",
        _ => "Unknown",
    }
}
