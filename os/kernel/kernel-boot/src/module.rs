//! # Module Descriptors
//!
//! A kernel subsystem, as seen by the bootstrap sequencer: a name, an
//! initializer, and how bad it is if that initializer fails.

use crate::error::AbortSignal;

/// What a failing initializer means for the boot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Severity {
    /// The boot aborts with the given signal.
    Fatal(AbortSignal),
    /// The boot continues with the module not ready.
    Recoverable,
}

/// Outcome of a subsystem initializer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    NotReady(&'static str),
}

impl Readiness {
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// A subsystem the bootstrap brings up.
///
/// Initializers may leave partial side effects behind when they fail; the
/// subsystem owns cleaning those up, the sequencer does not roll back.
pub trait Subsystem {
    fn initialize(&mut self) -> Readiness;
}

/// Any `FnMut() -> bool` is an initializer with no failure detail.
impl<F> Subsystem for F
where
    F: FnMut() -> bool,
{
    fn initialize(&mut self) -> Readiness {
        if self() {
            Readiness::Ready
        } else {
            Readiness::NotReady("initializer reported failure")
        }
    }
}

/// A named subsystem with its severity classification.
pub struct ModuleDescriptor<'a> {
    name: &'static str,
    severity: Severity,
    subsystem: &'a mut dyn Subsystem,
}

impl<'a> ModuleDescriptor<'a> {
    pub fn new(name: &'static str, severity: Severity, subsystem: &'a mut dyn Subsystem) -> Self {
        Self {
            name,
            severity,
            subsystem,
        }
    }

    /// A boot-critical module aborting with `signal` on failure.
    pub fn fatal(name: &'static str, signal: AbortSignal, subsystem: &'a mut dyn Subsystem) -> Self {
        Self::new(name, Severity::Fatal(signal), subsystem)
    }

    /// An optional module the kernel can run without.
    pub fn recoverable(name: &'static str, subsystem: &'a mut dyn Subsystem) -> Self {
        Self::new(name, Severity::Recoverable, subsystem)
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Runs the initializer.
    ///
    /// The sequencer decides on [`Readiness::is_ready`] alone; the reason of
    /// a failure only ends up in its diagnostic.
    pub fn initialize(&mut self) -> Readiness {
        self.subsystem.initialize()
    }
}

impl core::fmt::Debug for ModuleDescriptor<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}
