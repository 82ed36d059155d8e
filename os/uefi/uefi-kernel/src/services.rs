//! # Firmware Boot Services
//!
//! [`BootServices`] on top of the raw UEFI boot-services table. The safe
//! `uefi::boot` wrappers are not used here: they allocate their own map
//! buffer and hide the key, while the exit protocol needs both in hand.

use crate::logger::UefiLogger;
use crate::memory;
use core::ptr::{self, NonNull};
use kernel_boot::{BootServices, ImageHandle, MapKey, MapMeta, MapQueryError, Status};
use uefi_raw::table::boot::BootServices as RawBootServices;

/// The boot-services table, read once from the system table at entry.
pub struct UefiBootServices {
    boot_services: NonNull<RawBootServices>,
    logger: &'static UefiLogger,
}

impl UefiBootServices {
    #[must_use]
    pub const fn new(
        boot_services: NonNull<RawBootServices>,
        logger: &'static UefiLogger,
    ) -> Self {
        Self {
            boot_services,
            logger,
        }
    }
}

impl BootServices for UefiBootServices {
    fn get_memory_map(&mut self, buffer: &mut [u8]) -> Result<MapMeta, MapQueryError> {
        let mut map_size = buffer.len();
        let mut key = 0usize;
        let mut desc_size = 0usize;
        let mut desc_version = 0u32;
        let map = if buffer.is_empty() {
            ptr::null_mut()
        } else {
            buffer.as_mut_ptr().cast()
        };

        // SAFETY: the table stays valid while boot services are active,
        // which the environment guarantees; `map` spans `map_size` bytes.
        let raw = unsafe {
            (self.boot_services.as_ref().get_memory_map)(
                &raw mut map_size,
                map,
                &raw mut key,
                &raw mut desc_size,
                &raw mut desc_version,
            )
        };

        let status = Status(raw.0);
        if status == Status::SUCCESS {
            Ok(MapMeta {
                map_size,
                key: MapKey(key),
                desc_size,
                desc_version,
            })
        } else {
            Err(MapQueryError {
                status,
                required_size: map_size,
                desc_size,
            })
        }
    }

    unsafe fn exit_boot_services(&mut self, image: ImageHandle, key: MapKey) -> Status {
        // Console mirror and pool go quiet before the first attempt.
        self.logger.exit_boot_services();
        memory::retire();

        // SAFETY: forwarded from the caller.
        let raw = unsafe {
            (self.boot_services.as_ref().exit_boot_services)(image.as_ptr(), key.0)
        };

        Status(raw.0)
    }
}
