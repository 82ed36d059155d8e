use core::sync::atomic::{AtomicBool, Ordering};
use kernel_serial::{SerialLogger, write_record};
use log::{Log, Metadata, Record, SetLoggerError};

/// Logs to the serial channel, mirrored to the firmware console until boot
/// services go away.
pub struct UefiLogger {
    serial: SerialLogger,
    console_available: AtomicBool,
}

impl UefiLogger {
    #[must_use]
    pub const fn new(serial: SerialLogger) -> Self {
        Self {
            serial,
            console_available: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub const fn serial(&self) -> &SerialLogger {
        &self.serial
    }

    /// Call this once during early init.
    #[allow(clippy::missing_errors_doc)]
    pub fn init(&'static self) -> Result<(), SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(self.serial.max_level());
        Ok(())
    }

    /// Stops mirroring to the firmware console. Output continues on serial.
    pub fn exit_boot_services(&self) {
        self.console_available.store(false, Ordering::Release);
    }
}

impl Log for UefiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.serial.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        self.serial.log(record);

        if self.console_available.load(Ordering::Acquire) {
            uefi::system::with_stdout(|stdout| {
                let _ = write_record(stdout, record);
            });
        }
    }

    fn flush(&self) {}
}
