//! # x86 I/O Port Access

/// Byte access to the legacy I/O port space.
pub trait PortIo {
    /// Read one byte from `port`.
    ///
    /// # Safety
    /// `port` must be a readable register of a present device, and the caller
    /// must run with I/O privilege (CPL0 or a permitting IOPL/bitmap).
    unsafe fn read_u8(&self, port: u16) -> u8;

    /// Write one byte to `port`.
    ///
    /// # Safety
    /// Same requirements as [`read_u8`](Self::read_u8); additionally, the
    /// written value must be valid for the device's register protocol.
    unsafe fn write_u8(&self, port: u16, value: u8);
}

/// Port I/O through the `in`/`out` instructions.
#[derive(Debug, Default, Copy, Clone)]
pub struct Pio;

impl PortIo for Pio {
    #[inline]
    unsafe fn read_u8(&self, port: u16) -> u8 {
        let value: u8;
        unsafe {
            core::arch::asm!("in al, dx", in("dx") port, out("al") value, options(nomem, nostack, preserves_flags));
        }
        value
    }

    #[inline]
    unsafe fn write_u8(&self, port: u16, value: u8) {
        unsafe {
            core::arch::asm!("out dx, al", in("dx") port, in("al") value, options(nomem, nostack, preserves_flags));
        }
    }
}
