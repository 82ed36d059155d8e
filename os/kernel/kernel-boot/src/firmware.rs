//! # Firmware Memory-Map Boundary
//!
//! The two boot-service calls the exit protocol depends on, in the shape the
//! UEFI specification gives them. Status codes and the descriptor layout are
//! the firmware's wire contract and are passed through untouched.

use crate::env::ImageHandle;
use uefi_raw::Status;

/// Freshness token of a memory map.
///
/// Changes whenever the firmware's memory bookkeeping changes. Only the key
/// of the most recent successful query is accepted by
/// [`BootServices::exit_boot_services`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MapKey(pub usize);

/// Result of a successful memory-map query.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MapMeta {
    /// Bytes of the buffer filled with descriptors.
    pub map_size: usize,
    /// Key identifying this snapshot.
    pub key: MapKey,
    /// Stride between two descriptors. May exceed the declared record size.
    pub desc_size: usize,
    pub desc_version: u32,
}

/// A failed memory-map query.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MapQueryError {
    pub status: Status,
    /// Required buffer size in bytes; meaningful for `BUFFER_TOO_SMALL`.
    pub required_size: usize,
    /// Descriptor stride; meaningful for `BUFFER_TOO_SMALL`.
    pub desc_size: usize,
}

impl MapQueryError {
    #[must_use]
    pub const fn is_buffer_too_small(&self) -> bool {
        self.status.0 == Status::BUFFER_TOO_SMALL.0
    }
}

/// Boot services consumed by the bootstrap.
pub trait BootServices {
    /// `GetMemoryMap`: fills `buffer` with the current memory map.
    ///
    /// # Errors
    /// `BUFFER_TOO_SMALL` with the required size if `buffer` cannot hold
    /// the map, or any other firmware status.
    fn get_memory_map(&mut self, buffer: &mut [u8]) -> Result<MapMeta, MapQueryError>;

    /// `ExitBootServices`: hands the machine over to the kernel.
    ///
    /// Returns `INVALID_PARAMETER` if `key` is no longer current.
    ///
    /// Implementations must stop every consumer of boot services (the
    /// firmware console mirror, the pool allocator) before calling into the
    /// firmware, whether or not the call then succeeds.
    ///
    /// # Safety
    /// On success the firmware reclaims all boot-services memory. No
    /// reference obtained from boot services may be used afterwards.
    unsafe fn exit_boot_services(&mut self, image: ImageHandle, key: MapKey) -> Status;
}

impl<B: BootServices + ?Sized> BootServices for &mut B {
    fn get_memory_map(&mut self, buffer: &mut [u8]) -> Result<MapMeta, MapQueryError> {
        (**self).get_memory_map(buffer)
    }

    unsafe fn exit_boot_services(&mut self, image: ImageHandle, key: MapKey) -> Status {
        // SAFETY: forwarded; the caller upholds the contract.
        unsafe { (**self).exit_boot_services(image, key) }
    }
}
