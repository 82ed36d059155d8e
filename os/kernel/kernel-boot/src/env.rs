//! # Firmware Service Capture
//!
//! The firmware hands us two opaque references at entry. They are captured
//! once into a [`FirmwareEnv`] which is then passed along explicitly, rather
//! than parked in a global. Exiting boot services consumes the environment
//! and produces a [`KernelEnv`], which no longer carries boot services.

use crate::error::AbortSignal;
use crate::firmware::BootServices;
use core::ffi::c_void;
use core::ptr::NonNull;

/// The firmware system table, as received at entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SystemTableRef(NonNull<c_void>);

impl SystemTableRef {
    #[must_use]
    pub const fn new(ptr: NonNull<c_void>) -> Self {
        Self(ptr)
    }

    #[must_use]
    pub const fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// The identity handle of the running image.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ImageHandle(NonNull<c_void>);

impl ImageHandle {
    #[must_use]
    pub const fn new(ptr: NonNull<c_void>) -> Self {
        Self(ptr)
    }

    #[must_use]
    pub const fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// Firmware references valid until boot services are exited.
///
/// There is exactly one of these per boot. It is not `Clone`: the exit
/// protocol takes it by value, which ends every borrow of the boot services.
pub struct FirmwareEnv<B> {
    system_table: SystemTableRef,
    image: ImageHandle,
    services: B,
}

impl<B: BootServices> FirmwareEnv<B> {
    /// Captures the firmware references. Must be the first action at entry.
    #[must_use]
    pub const fn capture(system_table: SystemTableRef, image: ImageHandle, services: B) -> Self {
        Self {
            system_table,
            image,
            services,
        }
    }

    /// Captures the raw entry arguments together with the boot-services
    /// table adapter.
    ///
    /// # Errors
    /// [`AbortSignal::DeviceError`] if a firmware reference is null; the
    /// firmware broke its entry contract.
    pub fn try_capture(
        system_table: *mut c_void,
        image: *mut c_void,
        services: Option<B>,
    ) -> Result<Self, AbortSignal> {
        match (NonNull::new(system_table), NonNull::new(image), services) {
            (Some(system_table), Some(image), Some(services)) => Ok(Self::capture(
                SystemTableRef::new(system_table),
                ImageHandle::new(image),
                services,
            )),
            _ => Err(AbortSignal::DeviceError),
        }
    }

    #[must_use]
    pub const fn system_table(&self) -> SystemTableRef {
        self.system_table
    }

    #[must_use]
    pub const fn image(&self) -> ImageHandle {
        self.image
    }

    pub const fn services(&mut self) -> &mut B {
        &mut self.services
    }

    pub(crate) fn into_parts(self) -> (SystemTableRef, ImageHandle, B) {
        (self.system_table, self.image, self.services)
    }
}

/// What remains of the firmware environment once the kernel owns the machine.
///
/// Runtime services stay reachable through the system table; boot services
/// do not.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KernelEnv {
    system_table: SystemTableRef,
    image: ImageHandle,
}

impl KernelEnv {
    pub(crate) const fn new(system_table: SystemTableRef, image: ImageHandle) -> Self {
        Self {
            system_table,
            image,
        }
    }

    #[must_use]
    pub const fn system_table(&self) -> SystemTableRef {
        self.system_table
    }

    #[must_use]
    pub const fn image(&self) -> ImageHandle {
        self.image
    }
}
