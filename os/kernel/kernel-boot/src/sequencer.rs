//! # Module Bootstrap Sequencer
//!
//! Brings subsystems up in a fixed order and applies each module's severity
//! to a failing initializer:
//!
//! ```text
//! NotStarted ──▶ Running(0) ──▶ Running(1) ──▶ … ──▶ Completed
//!                    │               │
//!                    └───────────────┴──(fatal failure)──▶ AbortedFatal(i)
//! ```
//!
//! A recoverable failure is logged as a warning and the sequence moves on;
//! the module stays not ready and is listed in the [`BootReport`]. A fatal
//! failure stops the sequence on the spot: no later initializer runs.

use crate::error::BootError;
use crate::module::{ModuleDescriptor, Readiness, Severity};
use alloc::vec::Vec;
use log::{error, info, warn};

/// Progress of the module bootstrap.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SequencerState {
    NotStarted,
    /// Initializing the module at this index.
    Running(usize),
    Completed,
    /// Stopped on a fatal failure of the module at this index.
    AbortedFatal(usize),
}

/// Modules brought up, and those that came up degraded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootReport {
    /// Modules whose initializer succeeded.
    pub ready: Vec<&'static str>,
    /// Recoverable modules whose initializer failed.
    pub degraded: Vec<&'static str>,
}

impl BootReport {
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Runs module initializers in order.
#[derive(Debug)]
pub struct Sequencer {
    state: SequencerState,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SequencerState::NotStarted,
        }
    }

    #[must_use]
    pub const fn state(&self) -> SequencerState {
        self.state
    }

    /// Initializes `modules` in slice order.
    ///
    /// # Errors
    /// [`BootError::FatalModule`] on the first failing module with
    /// [`Severity::Fatal`].
    pub fn run(&mut self, modules: &mut [ModuleDescriptor<'_>]) -> Result<BootReport, BootError> {
        debug_assert_eq!(self.state, SequencerState::NotStarted, "modules are brought up once");

        let mut report = BootReport::default();
        for (index, module) in modules.iter_mut().enumerate() {
            self.state = SequencerState::Running(index);
            let name = module.name();

            let Readiness::NotReady(reason) = module.initialize() else {
                info!(target: name, "ready");
                report.ready.push(name);
                continue;
            };

            match module.severity() {
                Severity::Fatal(signal) => {
                    self.state = SequencerState::AbortedFatal(index);
                    error!(target: name, "initialization failed ({reason}), cannot continue boot");
                    return Err(BootError::FatalModule { module: name, signal });
                }
                Severity::Recoverable => {
                    warn!(target: name, "initialization failed ({reason}), continuing without it");
                    report.degraded.push(name);
                }
            }
        }

        self.state = SequencerState::Completed;
        Ok(report)
    }
}
