//! # 16550 UART

use crate::port::{Pio, PortIo};
use core::ffi::CStr;
use core::fmt;
use core::hint::spin_loop;

/// I/O base of the first legacy serial port.
pub const COM1: u16 = 0x3F8;

/// Register offsets relative to the UART base.
const DATA: u16 = 0;
const INTERRUPT_ENABLE: u16 = 1;
const FIFO_CONTROL: u16 = 2;
const LINE_CONTROL: u16 = 3;
const MODEM_CONTROL: u16 = 4;
const LINE_STATUS: u16 = 5;

/// LSR bit 5: transmit holding register empty.
const LSR_THR_EMPTY: u8 = 1 << 5;

/// LCR bit 7: divisor latch access.
const LCR_DLAB: u8 = 1 << 7;
/// LCR: 8 data bits, no parity, one stop bit.
const LCR_8N1: u8 = 0b0000_0011;
/// FCR: enable, clear both FIFOs, 14-byte receive threshold.
const FCR_ENABLE_CLEAR_14: u8 = 0xC7;
/// MCR: DTR, RTS and OUT2.
const MCR_DTR_RTS_OUT2: u8 = 0x0B;
/// Divisor for 115200 baud from the 1.8432 MHz reference clock.
const DIVISOR_115200: u16 = 1;

/// A polling 16550 UART.
///
/// All output busy-waits on the line status register; there is no buffering
/// and no failure path. Emission never allocates.
#[derive(Debug)]
pub struct SerialPort<P = Pio> {
    base: u16,
    io: P,
}

impl SerialPort<Pio> {
    /// Creates a port at `base` using real port I/O.
    ///
    /// # Safety
    /// `base` must be the I/O base of a 16550-compatible UART, and every use
    /// must happen with I/O privilege.
    #[must_use]
    pub const unsafe fn new(base: u16) -> Self {
        Self { base, io: Pio }
    }
}

impl<P: PortIo> SerialPort<P> {
    /// Creates a port at `base` over the given port accessor.
    ///
    /// # Safety
    /// `base` must be valid for `io` in the sense of [`SerialPort::new`].
    #[must_use]
    pub const unsafe fn with_io(base: u16, io: P) -> Self {
        Self { base, io }
    }

    #[must_use]
    pub const fn base(&self) -> u16 {
        self.base
    }

    #[must_use]
    pub const fn io(&self) -> &P {
        &self.io
    }

    /// Programs the UART for 115200 baud, 8N1, FIFOs on, interrupts off.
    pub fn init(&self) {
        let [divisor_lo, divisor_hi] = DIVISOR_115200.to_le_bytes();
        self.write_reg(INTERRUPT_ENABLE, 0x00);
        self.write_reg(LINE_CONTROL, LCR_DLAB);
        self.write_reg(DATA, divisor_lo);
        self.write_reg(INTERRUPT_ENABLE, divisor_hi);
        self.write_reg(LINE_CONTROL, LCR_8N1);
        self.write_reg(FIFO_CONTROL, FCR_ENABLE_CLEAR_14);
        self.write_reg(MODEM_CONTROL, MCR_DTR_RTS_OUT2);
    }

    /// Writes one byte, waiting for the transmitter first.
    ///
    /// A line feed is followed by a carriage return.
    pub fn emit_char(&self, byte: u8) {
        self.transmit(byte);
        if byte == b'\n' {
            self.transmit(b'\r');
        }
    }

    /// Writes every byte of `s` in order.
    pub fn emit_str(&self, s: &str) {
        self.emit_bytes(s.as_bytes());
    }

    /// Writes a NUL-terminated string, excluding the terminator.
    pub fn emit_cstr(&self, s: &CStr) {
        self.emit_bytes(s.to_bytes());
    }

    /// Writes every byte of `bytes` in order.
    pub fn emit_bytes(&self, bytes: &[u8]) {
        for &byte in bytes {
            self.emit_char(byte);
        }
    }

    /// A [`fmt::Write`] adapter over this port.
    #[must_use]
    pub const fn writer(&self) -> SerialWriter<'_, P> {
        SerialWriter { port: self }
    }

    fn transmit(&self, byte: u8) {
        while !self.transmit_empty() {
            spin_loop();
        }
        self.write_reg(DATA, byte);
    }

    fn transmit_empty(&self) -> bool {
        // SAFETY: the base was validated at construction.
        let lsr = unsafe { self.io.read_u8(self.base + LINE_STATUS) };
        lsr & LSR_THR_EMPTY != 0
    }

    fn write_reg(&self, offset: u16, value: u8) {
        // SAFETY: the base was validated at construction.
        unsafe { self.io.write_u8(self.base + offset, value) }
    }
}

/// Formatting sink borrowing a [`SerialPort`].
pub struct SerialWriter<'a, P = Pio> {
    port: &'a SerialPort<P>,
}

impl<P: PortIo> fmt::Write for SerialWriter<'_, P> {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.port.emit_str(s);
        Ok(())
    }
}
