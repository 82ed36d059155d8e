//! # Serial Diagnostic Channel
//!
//! The lowest-level output path the kernel has: a polling, blocking,
//! byte-at-a-time writer on top of a 16550-compatible UART. It works before
//! the firmware console is up, while it is up, and after boot services have
//! been exited, which makes it the place every bootstrap diagnostic ends up.
//!
//! ## Overview
//!
//! The channel deliberately has no buffering, no interrupts and no allocation.
//! Each byte is written only after the UART reports an empty transmit holding
//! register:
//!
//! ```text
//! serial_trace! / log::info!
//!     ↓
//! SerialWriter (fmt::Write)
//!     ↓
//! SerialPort::emit_char()
//!     ↓  spin until LSR.THRE
//! I/O port COM1 + 0 (THR)
//!     ↓
//! Host terminal (-serial stdio)
//! ```
//!
//! A line feed is always followed by a carriage return, so the output reads
//! correctly on raw terminals.
//!
//! ## Components
//!
//! * [`PortIo`]: access to the I/O port space, with [`Pio`] as the real
//!   `in`/`out` implementation. Test code swaps in a scripted double.
//! * [`SerialPort`]: UART bring-up and the `emit_*` primitives.
//! * [`SerialLogger`]: a `log::Log` backend rendering
//!   `[<tag>] <message>` lines, where the tag is the record's target.
//! * [`serial_trace!`]: `format_args!`-style direct output to COM1.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kernel_serial::SerialLogger;
//! use log::{LevelFilter, info};
//!
//! static LOGGER: SerialLogger = unsafe { SerialLogger::com1(LevelFilter::Debug) };
//!
//! LOGGER.init().expect("logger installed once");
//! info!(target: "memory", "allocator ready");
//! ```
//!
//! ## Host-Side Configuration
//!
//! ```bash
//! qemu-system-x86_64 ... -serial stdio
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod logger;
mod port;
mod uart;

pub use logger::{SerialLogger, write_record};
pub use port::{Pio, PortIo};
pub use uart::{COM1, SerialPort, SerialWriter};

#[doc(hidden)]
pub mod serial_fmt {
    use crate::{COM1, SerialPort};
    use core::fmt;

    /// The diagnostic UART.
    // SAFETY: COM1 is the fixed diagnostic port of the platform.
    static DIAGNOSTIC_PORT: SerialPort = unsafe { SerialPort::new(COM1) };

    #[doc(hidden)]
    #[inline]
    pub fn serial_write(args: fmt::Arguments) {
        // The channel itself cannot fail; formatting errors are dropped.
        let _ = fmt::write(&mut DIAGNOSTIC_PORT.writer(), args);
    }
}

/// Write formatted text straight to the diagnostic UART, bypassing the logger.
#[macro_export]
macro_rules! serial_trace {
    ($($arg:tt)*) => {{
        $crate::serial_fmt::serial_write(core::format_args!($($arg)*));
    }};
}
