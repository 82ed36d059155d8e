use uefi_raw::Status;

/// The abort signal handed back to the firmware loader.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AbortSignal {
    /// A boot-critical resource (the allocator) could not be brought up.
    ResourceExhaustion,
    /// A boot-critical device, or the firmware itself, misbehaved.
    DeviceError,
}

impl AbortSignal {
    /// The firmware status code for this signal.
    #[must_use]
    pub const fn status(self) -> Status {
        match self {
            Self::ResourceExhaustion => Status::OUT_OF_RESOURCES,
            Self::DeviceError => Status::DEVICE_ERROR,
        }
    }
}

impl From<AbortSignal> for Status {
    fn from(signal: AbortSignal) -> Self {
        signal.status()
    }
}

/// Fatal bootstrap failures.
#[derive(Debug, thiserror::Error)]
pub enum BootError {
    #[error("boot-critical module `{module}` failed to initialize")]
    FatalModule {
        module: &'static str,
        signal: AbortSignal,
    },
    #[error("zero-sized memory map query succeeded instead of reporting BUFFER_TOO_SMALL")]
    ProbeUnexpectedSuccess,
    #[error("memory map size probe failed with {0:?}")]
    ProbeFailed(Status),
    #[error("memory map snapshot failed with {0:?}")]
    SnapshotFailed(Status),
    #[error("exiting boot services failed with {0:?}")]
    ExitFailed(Status),
    #[error("memory map key still stale after {attempts} attempts")]
    StaleMapKey { attempts: usize },
}

impl BootError {
    /// The signal this failure aborts the boot with.
    #[must_use]
    pub const fn abort_signal(&self) -> AbortSignal {
        match self {
            Self::FatalModule { signal, .. } => *signal,
            Self::ProbeUnexpectedSuccess
            | Self::ProbeFailed(_)
            | Self::SnapshotFailed(_)
            | Self::ExitFailed(_)
            | Self::StaleMapKey { .. } => AbortSignal::DeviceError,
        }
    }
}
