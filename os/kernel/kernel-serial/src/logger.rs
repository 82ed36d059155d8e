use crate::port::{Pio, PortIo};
use crate::uart::{COM1, SerialPort};
use core::fmt;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// `log` backend on the serial diagnostic channel.
pub struct SerialLogger<P = Pio> {
    port: SerialPort<P>,
    max_level: LevelFilter,
}

impl SerialLogger<Pio> {
    /// Logger on [`COM1`].
    ///
    /// # Safety
    /// See [`SerialPort::new`].
    #[must_use]
    pub const unsafe fn com1(max_level: LevelFilter) -> Self {
        Self {
            port: unsafe { SerialPort::new(COM1) },
            max_level,
        }
    }
}

impl<P: PortIo> SerialLogger<P> {
    #[must_use]
    pub const fn new(port: SerialPort<P>, max_level: LevelFilter) -> Self {
        Self { port, max_level }
    }

    #[must_use]
    pub const fn port(&self) -> &SerialPort<P> {
        &self.port
    }

    #[must_use]
    pub const fn max_level(&self) -> LevelFilter {
        self.max_level
    }
}

impl<P: PortIo + Send + Sync> SerialLogger<P> {
    /// Installs this logger. Call once during early init.
    #[allow(clippy::missing_errors_doc)]
    pub fn init(&'static self) -> Result<(), SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(self.max_level);
        Ok(())
    }
}

impl<P: PortIo + Send + Sync> Log for SerialLogger<P> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let _ = write_record(&mut self.port.writer(), record);
    }

    fn flush(&self) {
        // every byte is already on the wire
    }
}

/// Renders a log record as one diagnostic line.
///
/// Warnings and errors carry their level; everything else is just the
/// bracketed target followed by the message.
///
/// # Errors
/// Propagates errors of the underlying writer.
pub fn write_record<W: fmt::Write>(out: &mut W, record: &Record) -> fmt::Result {
    match record.level() {
        Level::Error | Level::Warn => writeln!(
            out,
            "[{}] {}: {}",
            record.target(),
            record.level(),
            record.args()
        ),
        Level::Info | Level::Debug | Level::Trace => {
            writeln!(out, "[{}] {}", record.target(), record.args())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturePort {
        data: Mutex<Vec<u8>>,
    }

    impl PortIo for CapturePort {
        unsafe fn read_u8(&self, _port: u16) -> u8 {
            0xFF
        }

        unsafe fn write_u8(&self, port: u16, value: u8) {
            if port == COM1 {
                self.data.lock().unwrap().push(value);
            }
        }
    }

    fn render(level: Level, target: &str, args: fmt::Arguments) -> String {
        let mut line = String::new();
        let record = Record::builder()
            .level(level)
            .target(target)
            .args(args)
            .build();
        write_record(&mut line, &record).unwrap();
        line
    }

    #[test]
    fn info_lines_carry_only_the_tag() {
        assert_eq!(
            render(Level::Info, "memory", format_args!("ready")),
            "[memory] ready\n"
        );
    }

    #[test]
    fn warnings_carry_their_level() {
        assert_eq!(
            render(Level::Warn, "graphics", format_args!("not ready")),
            "[graphics] WARN: not ready\n"
        );
        assert_eq!(
            render(Level::Error, "boot", format_args!("aborted")),
            "[boot] ERROR: aborted\n"
        );
    }

    #[test]
    fn logger_writes_enabled_records_to_the_port() {
        let port = unsafe { SerialPort::with_io(COM1, CapturePort::default()) };
        let logger = SerialLogger::new(port, LevelFilter::Info);

        logger.log(
            &Record::builder()
                .level(Level::Info)
                .target("devices")
                .args(format_args!("up"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Debug)
                .target("devices")
                .args(format_args!("filtered"))
                .build(),
        );

        let data = logger.port().io().data.lock().unwrap().clone();
        assert_eq!(data, b"[devices] up\n\r");
    }
}
